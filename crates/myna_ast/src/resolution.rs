// myna_ast/resolution - resolver-produced declarations and reference outcomes
use crate::types::{Modifiers, SemanticType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index of a declaration in the unit's [`DeclTable`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct DeclId(pub u32);

/// What a reference resolved to, decided by the external resolver before
/// generation starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResolvedTarget {
    Unresolved,
    Method(DeclId),
    Field(DeclId),
    Variable(DeclId),
    Class(DeclId),
    /// A property only known dynamically; carries the property name.
    DynamicProperty(String),
}

/// Resolution outcome for one syntactic reference: target, generic-parameter
/// substitution, and whether the reference used property syntax over an
/// accessor method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRef {
    pub target: ResolvedTarget,
    pub substitution: BTreeMap<String, SemanticType>,
    pub via_property: bool,
}

impl ResolvedRef {
    pub fn unresolved() -> Self {
        Self {
            target: ResolvedTarget::Unresolved,
            substitution: BTreeMap::new(),
            via_property: false,
        }
    }

    pub fn method(id: DeclId) -> Self {
        Self {
            target: ResolvedTarget::Method(id),
            substitution: BTreeMap::new(),
            via_property: false,
        }
    }

    /// An accessor method reached through property syntax.
    pub fn property(accessor: DeclId) -> Self {
        Self {
            target: ResolvedTarget::Method(accessor),
            substitution: BTreeMap::new(),
            via_property: true,
        }
    }

    pub fn field(id: DeclId) -> Self {
        Self {
            target: ResolvedTarget::Field(id),
            substitution: BTreeMap::new(),
            via_property: false,
        }
    }

    pub fn variable(id: DeclId) -> Self {
        Self {
            target: ResolvedTarget::Variable(id),
            substitution: BTreeMap::new(),
            via_property: false,
        }
    }

    pub fn class(id: DeclId) -> Self {
        Self {
            target: ResolvedTarget::Class(id),
            substitution: BTreeMap::new(),
            via_property: false,
        }
    }

    pub fn dynamic(name: &str) -> Self {
        Self {
            target: ResolvedTarget::DynamicProperty(name.to_string()),
            substitution: BTreeMap::new(),
            via_property: false,
        }
    }

    pub fn with_substitution(mut self, substitution: BTreeMap<String, SemanticType>) -> Self {
        self.substitution = substitution;
        self
    }

    pub fn method_id(&self) -> Option<DeclId> {
        match self.target {
            ResolvedTarget::Method(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self.target, ResolvedTarget::Unresolved)
    }
}

/// Accessor classification of a resolved method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessorKind {
    None,
    Getter,
    Setter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    /// `None` for untyped parameters; the effective type comes from
    /// call-site inference.
    pub declared_type: Option<SemanticType>,
    pub has_default: bool,
}

impl ParamDecl {
    pub fn new(name: &str, declared_type: Option<SemanticType>) -> Self {
        Self {
            name: name.to_string(),
            declared_type,
            has_default: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub owner: Option<DeclId>,
    pub parameters: Vec<ParamDecl>,
    /// `None` for untyped methods; defaults to the root object type.
    pub return_type: Option<SemanticType>,
    pub is_varargs: bool,
    pub is_constructor: bool,
    pub accessor: AccessorKind,
    pub modifiers: Modifiers,
}

impl MethodDecl {
    pub fn new(name: &str, parameters: Vec<ParamDecl>, return_type: Option<SemanticType>) -> Self {
        Self {
            name: name.to_string(),
            owner: None,
            parameters,
            return_type,
            is_varargs: false,
            is_constructor: false,
            accessor: AccessorKind::None,
            modifiers: Modifiers::default(),
        }
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.is_static
    }

    /// Property name behind a `getFoo`/`setFoo`/`isFoo` accessor.
    pub fn property_name(&self) -> Option<String> {
        let stripped = self
            .name
            .strip_prefix("get")
            .or_else(|| self.name.strip_prefix("set"))
            .or_else(|| self.name.strip_prefix("is"))?;
        let mut chars = stripped.chars();
        let first = chars.next()?;
        Some(first.to_lowercase().collect::<String>() + chars.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub owner: Option<DeclId>,
    pub declared_type: Option<SemanticType>,
    pub modifiers: Modifiers,
}

impl FieldDecl {
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDecl {
    pub name: String,
    pub declared_type: Option<SemanticType>,
    pub is_final: bool,
}

impl VariableDecl {
    pub fn new(name: &str, declared_type: Option<SemanticType>) -> Self {
        Self {
            name: name.to_string(),
            declared_type,
            is_final: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Class,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    pub qualified_name: String,
    pub kind: TypeKind,
    pub type_parameters: Vec<String>,
    pub super_class: Option<SemanticType>,
    pub interfaces: Vec<SemanticType>,
    /// Member signatures, for method-by-name/arity lookup.
    pub methods: Vec<DeclId>,
    pub fields: Vec<DeclId>,
    pub modifiers: Modifiers,
}

impl ClassDecl {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            qualified_name: name.to_string(),
            kind: TypeKind::Class,
            type_parameters: vec![],
            super_class: None,
            interfaces: vec![],
            methods: vec![],
            fields: vec![],
            modifiers: Modifiers::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Declaration {
    Class(ClassDecl),
    Method(MethodDecl),
    Field(FieldDecl),
    Variable(VariableDecl),
    Parameter(ParamDecl),
}

/// Arena of declarations referenced by [`DeclId`]. Nodes never alias, so a
/// plain vector indexed by id is enough.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeclTable {
    decls: Vec<Declaration>,
}

impl DeclTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, decl: Declaration) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(decl);
        id
    }

    pub fn get(&self, id: DeclId) -> Option<&Declaration> {
        self.decls.get(id.0 as usize)
    }

    pub fn method(&self, id: DeclId) -> Option<&MethodDecl> {
        match self.get(id) {
            Some(Declaration::Method(method)) => Some(method),
            _ => None,
        }
    }

    pub fn class(&self, id: DeclId) -> Option<&ClassDecl> {
        match self.get(id) {
            Some(Declaration::Class(class)) => Some(class),
            _ => None,
        }
    }

    pub fn field(&self, id: DeclId) -> Option<&FieldDecl> {
        match self.get(id) {
            Some(Declaration::Field(field)) => Some(field),
            _ => None,
        }
    }

    pub fn variable(&self, id: DeclId) -> Option<&VariableDecl> {
        match self.get(id) {
            Some(Declaration::Variable(variable)) => Some(variable),
            _ => None,
        }
    }

    pub fn parameter(&self, id: DeclId) -> Option<&ParamDecl> {
        match self.get(id) {
            Some(Declaration::Parameter(parameter)) => Some(parameter),
            _ => None,
        }
    }

    /// Declared name of any declaration kind.
    pub fn name_of(&self, id: DeclId) -> Option<&str> {
        match self.get(id)? {
            Declaration::Class(class) => Some(&class.name),
            Declaration::Method(method) => Some(&method.name),
            Declaration::Field(field) => Some(&field.name),
            Declaration::Variable(variable) => Some(&variable.name),
            Declaration::Parameter(parameter) => Some(&parameter.name),
        }
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}
