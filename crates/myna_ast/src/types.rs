// myna_ast/types - spans, literals, operators, and semantic types
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Source region in line/column coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Span {
    pub fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Span for nodes synthesized after parsing.
    pub fn dummy() -> Self {
        Self::default()
    }
}

/// Quoting form the literal used in myna source. All forms render to one
/// canonical double-quoted Java literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteStyle {
    Single,
    Double,
    Triple,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    String { value: String, quote: QuoteStyle },
    /// Numeric literal kept in source text form so bases and suffixes survive.
    Number(String),
    Boolean(bool),
    Character(char),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    pub fn boxed_name(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Char => "Character",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::Short => "Short",
            PrimitiveKind::Int => "Integer",
            PrimitiveKind::Long => "Long",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Double => "Double",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, PrimitiveKind::Boolean | PrimitiveKind::Char)
    }

    /// Position in the numeric widening chain, for least-upper-bound joins.
    pub fn widening_rank(&self) -> Option<u8> {
        match self {
            PrimitiveKind::Byte => Some(0),
            PrimitiveKind::Short => Some(1),
            PrimitiveKind::Int => Some(2),
            PrimitiveKind::Long => Some(3),
            PrimitiveKind::Float => Some(4),
            PrimitiveKind::Double => Some(5),
            PrimitiveKind::Boolean | PrimitiveKind::Char => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WildcardKind {
    Unbounded,
    Extends,
    Super,
}

/// Resolver-computed type of an expression or declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SemanticType {
    Primitive(PrimitiveKind),
    Boxed(PrimitiveKind),
    Class {
        name: String,
        type_args: Vec<SemanticType>,
    },
    Array(Box<SemanticType>),
    Wildcard {
        kind: WildcardKind,
        bound: Option<Box<SemanticType>>,
    },
    Range(Box<SemanticType>),
    Function {
        params: Vec<SemanticType>,
        return_type: Box<SemanticType>,
    },
    Void,
    /// Type of the `null` literal.
    Null,
}

impl SemanticType {
    pub fn object() -> Self {
        SemanticType::Class {
            name: "java.lang.Object".to_string(),
            type_args: vec![],
        }
    }

    pub fn string() -> Self {
        SemanticType::Class {
            name: "java.lang.String".to_string(),
            type_args: vec![],
        }
    }

    pub fn class(name: &str) -> Self {
        SemanticType::Class {
            name: name.to_string(),
            type_args: vec![],
        }
    }

    pub fn generic(name: &str, type_args: Vec<SemanticType>) -> Self {
        SemanticType::Class {
            name: name.to_string(),
            type_args,
        }
    }

    pub fn int() -> Self {
        SemanticType::Primitive(PrimitiveKind::Int)
    }

    pub fn boolean() -> Self {
        SemanticType::Primitive(PrimitiveKind::Boolean)
    }

    pub fn array(element: SemanticType) -> Self {
        SemanticType::Array(Box::new(element))
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, SemanticType::Primitive(PrimitiveKind::Boolean))
    }

    pub fn is_boxed_boolean(&self) -> bool {
        matches!(self, SemanticType::Boxed(PrimitiveKind::Boolean))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, SemanticType::Array(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, SemanticType::Class { name, .. } if name == "java.lang.String" || name == "String")
    }

    pub fn is_numeric_primitive(&self) -> bool {
        matches!(self, SemanticType::Primitive(kind) if kind.is_numeric())
    }

    pub fn element_type(&self) -> Option<&SemanticType> {
        match self {
            SemanticType::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Replace type-parameter references by name according to a resolved
    /// generic substitution.
    pub fn substitute(&self, substitution: &BTreeMap<String, SemanticType>) -> SemanticType {
        if substitution.is_empty() {
            return self.clone();
        }
        match self {
            SemanticType::Class { name, type_args } => {
                if type_args.is_empty() {
                    if let Some(replacement) = substitution.get(name) {
                        return replacement.clone();
                    }
                }
                SemanticType::Class {
                    name: name.clone(),
                    type_args: type_args
                        .iter()
                        .map(|arg| arg.substitute(substitution))
                        .collect(),
                }
            }
            SemanticType::Array(element) => {
                SemanticType::Array(Box::new(element.substitute(substitution)))
            }
            SemanticType::Wildcard { kind, bound } => SemanticType::Wildcard {
                kind: kind.clone(),
                bound: bound
                    .as_ref()
                    .map(|inner| Box::new(inner.substitute(substitution))),
            },
            SemanticType::Range(element) => {
                SemanticType::Range(Box::new(element.substitute(substitution)))
            }
            SemanticType::Function {
                params,
                return_type,
            } => SemanticType::Function {
                params: params
                    .iter()
                    .map(|param| param.substitute(substitution))
                    .collect(),
                return_type: Box::new(return_type.substitute(substitution)),
            },
            other => other.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    // Comparison
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    // Logical
    And,
    Or,
    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    LeftShift,
    RightShift,
}

impl BinaryOp {
    /// Ordering comparisons that rewrite to `compareTo` when the operator
    /// resolves to a method.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual
        )
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, BinaryOp::Equal | BinaryOp::NotEqual)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Minus,
    Plus,
    BitNot,
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Protected,
    Private,
    Package,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            visibility: Visibility::Public,
            is_static: false,
            is_final: false,
            is_abstract: false,
        }
    }
}
