// Capture analysis: which locals must move into reference cells before
// closures can mutate them.
use myna_ast::{
    Block, ClosureExpression, CompilationUnit, DeclId, Expression, ResolvedTarget, Statement,
    UnaryOp,
};
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// Result of [`LocalVarAnalyzer`]: every wrapped variable mapped to the name
/// of its synthesized reference cell.
#[derive(Debug, Clone, Default)]
pub struct CaptureAnalysis {
    cells: HashMap<DeclId, String>,
}

impl CaptureAnalysis {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn cell_name(&self, variable: DeclId) -> Option<&str> {
        self.cells.get(&variable).map(String::as_str)
    }

    pub fn is_wrapped(&self, variable: DeclId) -> bool {
        self.cells.contains_key(&variable)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Scans a unit for locals written inside a closure but declared outside it.
/// Such variables cannot become plain Java locals (anonymous classes capture
/// by value), so each one is assigned a reference-cell name; every read and
/// write in the wrapped scope then goes through `get()`/`set()`.
pub struct LocalVarAnalyzer;

impl LocalVarAnalyzer {
    pub fn analyze(unit: &CompilationUnit) -> CaptureAnalysis {
        let mut closures: Vec<&ClosureExpression> = Vec::new();
        unit.walk_expressions(&mut |expr| {
            if let Expression::Closure(closure) = expr {
                closures.push(closure);
            }
        });

        let mut cells = HashMap::new();
        let mut used_names = HashSet::new();
        for closure in &closures {
            let mut written = HashSet::new();
            collect_writes(&closure.body, &mut written);

            let mut declared = HashSet::new();
            for parameter in &closure.parameters {
                declared.insert(parameter.decl);
            }
            collect_declared(&closure.body, &mut declared);

            for variable in written.difference(&declared) {
                if cells.contains_key(variable) {
                    continue;
                }
                let base = unit.decls.name_of(*variable).unwrap_or("captured");
                let cell = unique_cell_name(base, &mut used_names);
                cells.insert(*variable, cell);
            }
        }

        trace!(
            closures = closures.len(),
            wrapped = cells.len(),
            "capture analysis complete"
        );
        CaptureAnalysis { cells }
    }
}

fn unique_cell_name(base: &str, used: &mut HashSet<String>) -> String {
    let mut candidate = format!("{}$ref", base);
    let mut counter = 1;
    while used.contains(&candidate) {
        candidate = format!("{}$ref{}", base, counter);
        counter += 1;
    }
    used.insert(candidate.clone());
    candidate
}

fn collect_writes<'a>(block: &'a Block, out: &mut HashSet<DeclId>) {
    block.walk_expressions(&mut |expr| match expr {
        Expression::Assignment { target, .. } => {
            if let Expression::Reference { resolved, .. } = target.as_ref() {
                if let ResolvedTarget::Variable(id) = resolved.target {
                    out.insert(id);
                }
            }
        }
        Expression::Unary {
            op: UnaryOp::Increment | UnaryOp::Decrement,
            operand,
            ..
        } => {
            if let Expression::Reference { resolved, .. } = operand.as_ref() {
                if let ResolvedTarget::Variable(id) = resolved.target {
                    out.insert(id);
                }
            }
        }
        _ => {}
    });
}

fn collect_declared(block: &Block, out: &mut HashSet<DeclId>) {
    for statement in &block.statements {
        declared_in_statement(statement, out);
    }
}

fn declared_in_statement(statement: &Statement, out: &mut HashSet<DeclId>) {
    match statement {
        Statement::VariableDeclaration { decl, .. } => {
            out.insert(*decl);
        }
        Statement::ForEach { variable, body, .. } => {
            out.insert(*variable);
            declared_in_statement(body, out);
        }
        Statement::If {
            then_stmt,
            else_stmt,
            ..
        } => {
            declared_in_statement(then_stmt, out);
            if let Some(stmt) = else_stmt {
                declared_in_statement(stmt, out);
            }
        }
        Statement::While { body, .. } => declared_in_statement(body, out),
        Statement::Block(block) => collect_declared(block, out),
        Statement::TryCatch {
            body,
            catches,
            finally_block,
            ..
        } => {
            collect_declared(body, out);
            for clause in catches {
                out.insert(clause.parameter);
                collect_declared(&clause.body, out);
            }
            if let Some(block) = finally_block {
                collect_declared(block, out);
            }
        }
        _ => {}
    }

    // Declarations inside nested closures shadow the outer scope for the
    // purposes of this closure's wrap set.
    statement.walk_expressions(&mut |expr| {
        if let Expression::Closure(closure) = expr {
            for parameter in &closure.parameters {
                out.insert(parameter.decl);
            }
            collect_declared(&closure.body, out);
        }
    });
}
