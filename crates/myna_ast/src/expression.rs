// myna_ast/expression - resolved expression tree consumed by code generation
use crate::resolution::{DeclId, ResolvedRef};
use crate::statement::Block;
use crate::types::{BinaryOp, Literal, PrimitiveKind, SemanticType, Span, UnaryOp};
use serde::{Deserialize, Serialize};

/// Fully resolved expression node. Every value-producing variant carries the
/// semantic type the resolver computed for it; the generator never infers
/// types from this tree, it only consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Literal {
        value: Literal,
        semantic_type: SemanticType,
        span: Span,
    },

    StringTemplate {
        parts: Vec<TemplatePart>,
        span: Span,
    },

    /// Identifier or dotted reference, resolved to its read-side target.
    Reference {
        qualifier: Option<Box<Expression>>,
        name: String,
        resolved: ResolvedRef,
        null_safe: bool,
        semantic_type: SemanticType,
        span: Span,
    },

    Binary {
        left: Box<Expression>,
        op: BinaryOp,
        right: Box<Expression>,
        /// `Some` when the operator resolved to a user/library method.
        op_method: Option<ResolvedRef>,
        semantic_type: SemanticType,
        span: Span,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
        op_method: Option<ResolvedRef>,
        /// Setter for increment/decrement over a property-style operand.
        write_ref: Option<ResolvedRef>,
        prefix: bool,
        semantic_type: SemanticType,
        span: Span,
    },

    /// Plain (`op` is `None`) or compound assignment. `target` carries the
    /// read-side resolution; `write_ref` carries the setter/put-style method
    /// when the target is a property or index access.
    Assignment {
        target: Box<Expression>,
        op: Option<BinaryOp>,
        op_method: Option<ResolvedRef>,
        write_ref: Option<ResolvedRef>,
        value: Box<Expression>,
        semantic_type: SemanticType,
        span: Span,
    },

    Call {
        receiver: Option<Box<Expression>>,
        name: String,
        resolved: ResolvedRef,
        args: Vec<Expression>,
        null_safe: bool,
        semantic_type: SemanticType,
        span: Span,
    },

    /// `a[i]` read form. `resolved` is the `getAt`/`get` candidate, `None`
    /// when static types guarantee a native array index.
    Index {
        collection: Box<Expression>,
        index: Box<Expression>,
        resolved: Option<ResolvedRef>,
        semantic_type: SemanticType,
        span: Span,
    },

    /// Conditional. `then_expr == None` is the elvis form `cond ?: else`.
    Ternary {
        condition: Box<Expression>,
        then_expr: Option<Box<Expression>>,
        else_expr: Box<Expression>,
        semantic_type: SemanticType,
        span: Span,
    },

    TypeCheck {
        operand: Box<Expression>,
        target: SemanticType,
        negated: bool,
        span: Span,
    },

    Cast {
        operand: Box<Expression>,
        target: SemanticType,
        /// Declaration of the target type when the resolver knows it, used
        /// for map-literal-to-anonymous-class instantiation.
        target_class: Option<DeclId>,
        safe: bool,
        /// User conversion method a safe cast resolved to, if any.
        conversion: Option<ResolvedRef>,
        span: Span,
    },

    ListLiteral {
        elements: Vec<Expression>,
        semantic_type: SemanticType,
        span: Span,
    },

    MapLiteral {
        entries: Vec<MapEntry>,
        semantic_type: SemanticType,
        span: Span,
    },

    Range {
        from: Box<Expression>,
        to: Box<Expression>,
        inclusive: bool,
        semantic_type: SemanticType,
        span: Span,
    },

    Closure(ClosureExpression),

    /// `new Type(args)` plus named-argument field initializers.
    New {
        class_type: SemanticType,
        constructor: Option<ResolvedRef>,
        args: Vec<Expression>,
        initializers: Vec<FieldInitializer>,
        span: Span,
    },

    Parenthesized {
        inner: Box<Expression>,
        span: Span,
    },

    SelfRef {
        kind: SelfKind,
        qualifier: Option<String>,
        semantic_type: SemanticType,
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemplatePart {
    Text(String),
    Interpolation(Expression),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEntry {
    pub key: Expression,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInitializer {
    pub name: String,
    /// Setter method or field the named argument resolved to; `None` routes
    /// through the dynamic property protocol.
    pub write_ref: Option<ResolvedRef>,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosureParameter {
    pub decl: DeclId,
    pub default_value: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosureExpression {
    pub parameters: Vec<ClosureParameter>,
    pub body: Block,
    pub return_type: SemanticType,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelfKind {
    This,
    Super,
}

impl Expression {
    pub fn span(&self) -> &Span {
        match self {
            Expression::Literal { span, .. }
            | Expression::StringTemplate { span, .. }
            | Expression::Reference { span, .. }
            | Expression::Binary { span, .. }
            | Expression::Unary { span, .. }
            | Expression::Assignment { span, .. }
            | Expression::Call { span, .. }
            | Expression::Index { span, .. }
            | Expression::Ternary { span, .. }
            | Expression::TypeCheck { span, .. }
            | Expression::Cast { span, .. }
            | Expression::ListLiteral { span, .. }
            | Expression::MapLiteral { span, .. }
            | Expression::Range { span, .. }
            | Expression::New { span, .. }
            | Expression::Parenthesized { span, .. }
            | Expression::SelfRef { span, .. } => span,
            Expression::Closure(closure) => &closure.span,
        }
    }

    /// Semantic type of the value this expression produces.
    pub fn semantic_type(&self) -> SemanticType {
        match self {
            Expression::Literal { semantic_type, .. }
            | Expression::Reference { semantic_type, .. }
            | Expression::Binary { semantic_type, .. }
            | Expression::Unary { semantic_type, .. }
            | Expression::Assignment { semantic_type, .. }
            | Expression::Call { semantic_type, .. }
            | Expression::Index { semantic_type, .. }
            | Expression::Ternary { semantic_type, .. }
            | Expression::ListLiteral { semantic_type, .. }
            | Expression::MapLiteral { semantic_type, .. }
            | Expression::Range { semantic_type, .. }
            | Expression::SelfRef { semantic_type, .. } => semantic_type.clone(),
            Expression::StringTemplate { .. } => SemanticType::string(),
            Expression::TypeCheck { .. } => SemanticType::Primitive(PrimitiveKind::Boolean),
            Expression::Cast { target, .. } => target.clone(),
            Expression::Closure(closure) => SemanticType::Function {
                params: vec![],
                return_type: Box::new(closure.return_type.clone()),
            },
            Expression::New { class_type, .. } => class_type.clone(),
            Expression::Parenthesized { inner, .. } => inner.semantic_type(),
        }
    }

    /// Depth-first visit of this expression and every child expression,
    /// including expressions nested inside closure bodies.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Expression)) {
        visit(self);
        match self {
            Expression::Literal { .. } | Expression::SelfRef { .. } => {}
            Expression::StringTemplate { parts, .. } => {
                for part in parts {
                    if let TemplatePart::Interpolation(expr) = part {
                        expr.walk(visit);
                    }
                }
            }
            Expression::Reference { qualifier, .. } => {
                if let Some(expr) = qualifier {
                    expr.walk(visit);
                }
            }
            Expression::Binary { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Expression::Unary { operand, .. } => operand.walk(visit),
            Expression::Assignment { target, value, .. } => {
                target.walk(visit);
                value.walk(visit);
            }
            Expression::Call { receiver, args, .. } => {
                if let Some(expr) = receiver {
                    expr.walk(visit);
                }
                for arg in args {
                    arg.walk(visit);
                }
            }
            Expression::Index {
                collection, index, ..
            } => {
                collection.walk(visit);
                index.walk(visit);
            }
            Expression::Ternary {
                condition,
                then_expr,
                else_expr,
                ..
            } => {
                condition.walk(visit);
                if let Some(expr) = then_expr {
                    expr.walk(visit);
                }
                else_expr.walk(visit);
            }
            Expression::TypeCheck { operand, .. } => operand.walk(visit),
            Expression::Cast { operand, .. } => operand.walk(visit),
            Expression::ListLiteral { elements, .. } => {
                for element in elements {
                    element.walk(visit);
                }
            }
            Expression::MapLiteral { entries, .. } => {
                for entry in entries {
                    entry.key.walk(visit);
                    entry.value.walk(visit);
                }
            }
            Expression::Range { from, to, .. } => {
                from.walk(visit);
                to.walk(visit);
            }
            Expression::Closure(closure) => {
                for parameter in &closure.parameters {
                    if let Some(default) = &parameter.default_value {
                        default.walk(visit);
                    }
                }
                closure.body.walk_expressions(visit);
            }
            Expression::New {
                args, initializers, ..
            } => {
                for arg in args {
                    arg.walk(visit);
                }
                for initializer in initializers {
                    initializer.value.walk(visit);
                }
            }
            Expression::Parenthesized { inner, .. } => inner.walk(visit),
        }
    }
}
