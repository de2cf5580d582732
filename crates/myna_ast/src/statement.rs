// myna_ast/statement - resolved statements, members, and compilation units
use crate::expression::Expression;
use crate::resolution::{DeclId, DeclTable};
use crate::types::{SemanticType, Span};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Expression {
        expr: Expression,
        span: Span,
    },

    VariableDeclaration {
        decl: DeclId,
        initializer: Option<Expression>,
        span: Span,
    },

    If {
        condition: Expression,
        then_stmt: Box<Statement>,
        else_stmt: Option<Box<Statement>>,
        span: Span,
    },

    While {
        condition: Expression,
        body: Box<Statement>,
        span: Span,
    },

    ForEach {
        variable: DeclId,
        iterable: Expression,
        body: Box<Statement>,
        span: Span,
    },

    Return {
        value: Option<Expression>,
        span: Span,
    },

    Throw {
        value: Expression,
        span: Span,
    },

    Block(Block),

    TryCatch {
        body: Block,
        catches: Vec<CatchClause>,
        finally_block: Option<Block>,
        span: Span,
    },

    Break {
        span: Span,
    },

    Continue {
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            statements,
            span: Span::dummy(),
        }
    }

    pub fn walk_expressions<'a>(&'a self, visit: &mut dyn FnMut(&'a Expression)) {
        for statement in &self.statements {
            statement.walk_expressions(visit);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    pub parameter: DeclId,
    pub exception_type: SemanticType,
    pub body: Block,
}

impl Statement {
    pub fn span(&self) -> &Span {
        match self {
            Statement::Expression { span, .. }
            | Statement::VariableDeclaration { span, .. }
            | Statement::If { span, .. }
            | Statement::While { span, .. }
            | Statement::ForEach { span, .. }
            | Statement::Return { span, .. }
            | Statement::Throw { span, .. }
            | Statement::TryCatch { span, .. }
            | Statement::Break { span }
            | Statement::Continue { span } => span,
            Statement::Block(block) => &block.span,
        }
    }

    pub fn walk_expressions<'a>(&'a self, visit: &mut dyn FnMut(&'a Expression)) {
        match self {
            Statement::Expression { expr, .. } => expr.walk(visit),
            Statement::VariableDeclaration { initializer, .. } => {
                if let Some(expr) = initializer {
                    expr.walk(visit);
                }
            }
            Statement::If {
                condition,
                then_stmt,
                else_stmt,
                ..
            } => {
                condition.walk(visit);
                then_stmt.walk_expressions(visit);
                if let Some(stmt) = else_stmt {
                    stmt.walk_expressions(visit);
                }
            }
            Statement::While {
                condition, body, ..
            } => {
                condition.walk(visit);
                body.walk_expressions(visit);
            }
            Statement::ForEach { iterable, body, .. } => {
                iterable.walk(visit);
                body.walk_expressions(visit);
            }
            Statement::Return { value, .. } => {
                if let Some(expr) = value {
                    expr.walk(visit);
                }
            }
            Statement::Throw { value, .. } => value.walk(visit),
            Statement::Block(block) => block.walk_expressions(visit),
            Statement::TryCatch {
                body,
                catches,
                finally_block,
                ..
            } => {
                body.walk_expressions(visit);
                for clause in catches {
                    clause.body.walk_expressions(visit);
                }
                if let Some(block) = finally_block {
                    block.walk_expressions(visit);
                }
            }
            Statement::Break { .. } | Statement::Continue { .. } => {}
        }
    }
}

/// A method or constructor with its body, referencing its signature in the
/// declaration table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodNode {
    pub decl: DeclId,
    /// `None` for abstract/interface members.
    pub body: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Member {
    Field {
        decl: DeclId,
        initializer: Option<Expression>,
        span: Span,
    },
    Method(MethodNode),
    Constructor(MethodNode),
    Initializer {
        is_static: bool,
        body: Block,
        span: Span,
    },
}

/// One class/interface being converted, with its member bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    pub decl: DeclId,
    pub members: Vec<Member>,
    pub span: Span,
}

/// One resolved unit handed to the generator: type declarations plus, for
/// script-like units, loose top-level statements and methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub package: Option<String>,
    pub imports: Vec<String>,
    pub types: Vec<TypeDeclaration>,
    pub script_statements: Vec<Statement>,
    pub script_methods: Vec<MethodNode>,
    pub script_class_name: Option<String>,
    pub decls: DeclTable,
}

impl CompilationUnit {
    pub fn new(decls: DeclTable) -> Self {
        Self {
            package: None,
            imports: vec![],
            types: vec![],
            script_statements: vec![],
            script_methods: vec![],
            script_class_name: None,
            decls,
        }
    }

    /// Ids of the classes converted by this unit, for name qualification
    /// decisions.
    pub fn converted_class_ids(&self) -> HashSet<DeclId> {
        self.types.iter().map(|decl| decl.decl).collect()
    }

    /// Visit every expression in the unit, including member bodies and
    /// closure bodies.
    pub fn walk_expressions<'a>(&'a self, visit: &mut dyn FnMut(&'a Expression)) {
        for statement in &self.script_statements {
            statement.walk_expressions(visit);
        }
        for method in &self.script_methods {
            if let Some(body) = &method.body {
                body.walk_expressions(visit);
            }
        }
        for type_decl in &self.types {
            for member in &type_decl.members {
                match member {
                    Member::Field { initializer, .. } => {
                        if let Some(expr) = initializer {
                            expr.walk(visit);
                        }
                    }
                    Member::Method(node) | Member::Constructor(node) => {
                        if let Some(body) = &node.body {
                            body.walk_expressions(visit);
                        }
                    }
                    Member::Initializer { body, .. } => body.walk_expressions(visit),
                }
            }
        }
    }
}
