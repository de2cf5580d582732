use crate::analysis::LocalVarAnalyzer;
use crate::builder::{GeneratedUnit, JavaSourceBuilder, SourceEdit};
use crate::config::CodeGenConfig;
use crate::context::{ExpressionContext, SharedState};
use crate::error::{CodeGenError, ConversionCaveat};
use crate::provider::TypeProvider;
use myna_ast::{
    BinaryOp, CompilationUnit, DeclId, DeclTable, Expression, Literal, ResolvedRef,
    ResolvedTarget, SemanticType, Span,
};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

mod arguments;
mod closures;
mod declarations;
mod expressions;
mod helpers;
mod statements;
mod types;

pub use helpers::is_java_keyword;

/// Main generator: one instance converts resolved compilation units to Java
/// source, one unit at a time. All per-run state is reset at the start of
/// every unit, so a failed unit never leaks into the next one.
pub struct JavaCodeGenerator {
    config: CodeGenConfig,
    imports: HashMap<String, String>,
    caveats: Vec<ConversionCaveat>,
    decls: Rc<DeclTable>,
    provider: TypeProvider,
    shared: Rc<SharedState>,
}

impl JavaCodeGenerator {
    pub fn new() -> Self {
        Self::with_config(CodeGenConfig::default())
    }

    pub fn with_config(config: CodeGenConfig) -> Self {
        Self {
            config,
            imports: HashMap::new(),
            caveats: Vec::new(),
            decls: Rc::new(DeclTable::new()),
            provider: TypeProvider::empty(),
            shared: Rc::new(SharedState::default()),
        }
    }

    pub fn config(&self) -> &CodeGenConfig {
        &self.config
    }

    /// Render one resolved unit as a Java compilation unit.
    pub fn generate_compilation_unit(
        &mut self,
        unit: &CompilationUnit,
    ) -> Result<GeneratedUnit, CodeGenError> {
        self.prepare(unit);

        let mut generated = GeneratedUnit::new();
        generated.package_declaration = unit.package.clone();

        for type_decl in &unit.types {
            let code = self.generate_type_declaration(type_decl)?;
            generated.type_declarations.push(code);
        }

        if !unit.script_statements.is_empty() || !unit.script_methods.is_empty() {
            let code = self.generate_script_class(unit)?;
            generated.type_declarations.push(code);
        }

        generated.imports = self.collect_imports(unit);
        generated.caveats = std::mem::take(&mut self.caveats);
        Ok(generated)
    }

    /// Produce `(range, replacement)` edits for in-place conversion of the
    /// unit's existing type declarations.
    pub fn generate_type_edits(
        &mut self,
        unit: &CompilationUnit,
    ) -> Result<Vec<SourceEdit>, CodeGenError> {
        self.prepare(unit);

        let mut edits = Vec::new();
        for type_decl in &unit.types {
            let replacement = self.generate_type_declaration(type_decl)?;
            edits.push(SourceEdit {
                span: type_decl.span.clone(),
                replacement,
            });
        }
        Ok(edits)
    }

    pub(crate) fn prepare(&mut self, unit: &CompilationUnit) {
        self.imports.clear();
        self.caveats.clear();
        self.decls = Rc::new(unit.decls.clone());
        self.provider = TypeProvider::new(unit, Rc::clone(&self.decls));
        let captures = LocalVarAnalyzer::analyze(unit);
        debug!(
            types = unit.types.len(),
            script_statements = unit.script_statements.len(),
            wrapped_locals = captures.len(),
            "converting unit"
        );
        self.shared = Rc::new(SharedState::new(captures, unit.converted_class_ids()));
    }

    pub(crate) fn builder(&self) -> JavaSourceBuilder {
        JavaSourceBuilder::new(self.config.indent.clone())
    }

    pub(crate) fn root_context(&self) -> ExpressionContext {
        ExpressionContext::new(Rc::clone(&self.shared))
    }

    pub(crate) fn provider(&self) -> &TypeProvider {
        &self.provider
    }

    pub(crate) fn caveat(&mut self, message: String, span: Option<Span>) {
        self.caveats.push(ConversionCaveat { message, span });
    }

    /// Register an import and return the name to use at the reference site:
    /// the simple name when it is unambiguous, the qualified name otherwise.
    pub(crate) fn add_import(&mut self, qualified: &str) -> String {
        let simple = qualified.rsplit('.').next().unwrap_or(qualified);
        if let Some(package) = qualified.strip_suffix(simple) {
            if package == "java.lang." {
                return simple.to_string();
            }
        }
        match self.imports.get(simple) {
            Some(existing) if existing == qualified => simple.to_string(),
            Some(_) => qualified.to_string(),
            None => {
                self.imports
                    .insert(simple.to_string(), qualified.to_string());
                simple.to_string()
            }
        }
    }

    pub(crate) fn runtime_class(&mut self, simple_name: &str) -> String {
        let qualified = format!("{}.{}", self.config.runtime_package, simple_name);
        self.add_import(&qualified)
    }

    fn collect_imports(&self, unit: &CompilationUnit) -> Vec<String> {
        let mut imports: Vec<String> = unit.imports.clone();
        imports.extend(self.imports.values().cloned());
        imports.sort();
        imports.dedup();
        imports
    }

    /// Name text for a class declaration reference: simple for classes being
    /// converted in this unit, imported/qualified otherwise.
    pub(crate) fn class_reference_text(
        &mut self,
        class: DeclId,
        span: &Span,
    ) -> Result<String, CodeGenError> {
        let Some(decl) = self.decls.class(class) else {
            return Err(CodeGenError::InternalInconsistency {
                message: format!("reference resolved to non-class declaration {:?}", class),
                span: Some(span.clone()),
            });
        };
        if self.shared.converted.contains(&class) || !decl.qualified_name.contains('.') {
            return Ok(decl.name.clone());
        }
        let qualified = decl.qualified_name.clone();
        Ok(self.add_import(&qualified))
    }

    /// Resolved method declaration behind a reference, or a contract
    /// violation if the reference does not point at a method.
    pub(crate) fn resolved_method(
        &self,
        resolved: &ResolvedRef,
        span: &Span,
    ) -> Result<(DeclId, myna_ast::MethodDecl), CodeGenError> {
        let Some(id) = resolved.method_id() else {
            return Err(CodeGenError::InternalInconsistency {
                message: "expected a method resolution".to_string(),
                span: Some(span.clone()),
            });
        };
        match self.decls.method(id) {
            Some(method) => Ok((id, method.clone())),
            None => Err(CodeGenError::InternalInconsistency {
                message: format!("method id {:?} is not a method declaration", id),
                span: Some(span.clone()),
            }),
        }
    }
}

impl Default for JavaCodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}
