// Effective type signatures, including call-site inference for untyped
// declarations.
use myna_ast::{
    CompilationUnit, DeclId, DeclTable, Expression, PrimitiveKind, SemanticType,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::trace;

/// Supplies the effective Java-side type of resolved members. Explicit
/// declared types win; a parameter with no declared type is inferred once by
/// unifying the argument types observed at every call site of its method,
/// and the result is memoized for the lifetime of the run. Parameter types
/// do not affect call-site discovery, so a single scan suffices.
#[derive(Debug)]
pub struct TypeProvider {
    decls: Rc<DeclTable>,
    call_sites: HashMap<DeclId, Vec<Vec<SemanticType>>>,
    inferred: RefCell<HashMap<(DeclId, usize), SemanticType>>,
}

impl TypeProvider {
    pub fn empty() -> Self {
        Self {
            decls: Rc::new(DeclTable::new()),
            call_sites: HashMap::new(),
            inferred: RefCell::new(HashMap::new()),
        }
    }

    pub fn new(unit: &CompilationUnit, decls: Rc<DeclTable>) -> Self {
        let mut call_sites: HashMap<DeclId, Vec<Vec<SemanticType>>> = HashMap::new();
        unit.walk_expressions(&mut |expr| match expr {
            Expression::Call { resolved, args, .. } => {
                if let Some(id) = resolved.method_id() {
                    call_sites
                        .entry(id)
                        .or_default()
                        .push(args.iter().map(Expression::semantic_type).collect());
                }
            }
            Expression::New {
                constructor: Some(resolved),
                args,
                ..
            } => {
                if let Some(id) = resolved.method_id() {
                    call_sites
                        .entry(id)
                        .or_default()
                        .push(args.iter().map(Expression::semantic_type).collect());
                }
            }
            _ => {}
        });

        trace!(methods = call_sites.len(), "collected call sites");
        Self {
            decls,
            call_sites,
            inferred: RefCell::new(HashMap::new()),
        }
    }

    /// Effective type of a method parameter. Declared type wins; untyped
    /// parameters fall back to call-site inference, then the object type.
    pub fn parameter_type(&self, method: DeclId, index: usize) -> SemanticType {
        if let Some(decl) = self.decls.method(method) {
            if let Some(parameter) = decl.parameters.get(index) {
                if let Some(declared) = &parameter.declared_type {
                    return declared.clone();
                }
            }
        }
        if let Some(cached) = self.inferred.borrow().get(&(method, index)) {
            return cached.clone();
        }
        let inferred = self.infer_parameter(method, index);
        self.inferred
            .borrow_mut()
            .insert((method, index), inferred.clone());
        inferred
    }

    fn infer_parameter(&self, method: DeclId, index: usize) -> SemanticType {
        let Some(sites) = self.call_sites.get(&method) else {
            return SemanticType::object();
        };
        let mut joined: Option<SemanticType> = None;
        for args in sites {
            if let Some(arg_type) = args.get(index) {
                joined = Some(match joined {
                    Some(current) => Self::least_upper_bound(&current, arg_type),
                    None => arg_type.clone(),
                });
            }
        }
        joined.unwrap_or_else(SemanticType::object)
    }

    /// Effective return type: declared, or void for constructors and
    /// setters, or the object type.
    pub fn return_type(&self, method: DeclId) -> SemanticType {
        match self.decls.method(method) {
            Some(decl) => {
                if let Some(declared) = &decl.return_type {
                    declared.clone()
                } else if decl.is_constructor {
                    SemanticType::Void
                } else {
                    SemanticType::object()
                }
            }
            None => SemanticType::object(),
        }
    }

    /// Effective type of a local variable: declared, else the initializer's
    /// semantic type, else the object type.
    pub fn variable_type(
        &self,
        variable: DeclId,
        initializer: Option<&Expression>,
    ) -> SemanticType {
        if let Some(decl) = self.decls.variable(variable) {
            if let Some(declared) = &decl.declared_type {
                return declared.clone();
            }
        }
        match initializer.map(Expression::semantic_type) {
            Some(SemanticType::Null) | None => SemanticType::object(),
            Some(inferred) => inferred,
        }
    }

    /// Effective type of a closure parameter declaration.
    pub fn closure_parameter_type(&self, parameter: DeclId) -> SemanticType {
        self.decls
            .parameter(parameter)
            .and_then(|decl| decl.declared_type.clone())
            .unwrap_or_else(SemanticType::object)
    }

    /// Least upper bound over observed argument types: identical types join
    /// to themselves, numerics widen, null joins to the boxed form,
    /// everything else joins to the object type.
    pub fn least_upper_bound(left: &SemanticType, right: &SemanticType) -> SemanticType {
        if left == right {
            return left.clone();
        }
        match (left, right) {
            (SemanticType::Null, other) | (other, SemanticType::Null) => match other {
                SemanticType::Primitive(kind) => SemanticType::Boxed(*kind),
                _ => other.clone(),
            },
            (SemanticType::Primitive(a), SemanticType::Primitive(b)) => {
                match Self::wider(*a, *b) {
                    Some(kind) => SemanticType::Primitive(kind),
                    None => SemanticType::object(),
                }
            }
            (SemanticType::Primitive(a), SemanticType::Boxed(b))
            | (SemanticType::Boxed(a), SemanticType::Primitive(b))
            | (SemanticType::Boxed(a), SemanticType::Boxed(b)) => match Self::wider(*a, *b) {
                Some(kind) => SemanticType::Boxed(kind),
                None => SemanticType::object(),
            },
            _ => SemanticType::object(),
        }
    }

    fn wider(a: PrimitiveKind, b: PrimitiveKind) -> Option<PrimitiveKind> {
        if a == b {
            return Some(a);
        }
        let rank_a = a.widening_rank()?;
        let rank_b = b.widening_rank()?;
        Some(if rank_a >= rank_b { a } else { b })
    }
}
