use super::*;
use crate::builder::JavaSourceBuilder;
use crate::context::SetterHelper;
use myna_ast::{ClassDecl, Member, MethodNode, TypeDeclaration, TypeKind};

impl JavaCodeGenerator {
    /// Render one converted class or interface, member by member.
    pub fn generate_type_declaration(
        &mut self,
        type_decl: &TypeDeclaration,
    ) -> Result<String, CodeGenError> {
        let class = self.decls.class(type_decl.decl).cloned().ok_or_else(|| {
            CodeGenError::InternalInconsistency {
                message: format!("type declaration {:?} is not a class", type_decl.decl),
                span: Some(type_decl.span.clone()),
            }
        })?;

        let mut builder = self.builder();
        let mut header = String::new();
        let modifiers_str = Self::modifiers_text(&class.modifiers);
        if !modifiers_str.is_empty() {
            header.push_str(&modifiers_str);
            header.push(' ');
        }
        header.push_str(match class.kind {
            TypeKind::Class => "class ",
            TypeKind::Interface => "interface ",
        });
        header.push_str(&class.name);
        if !class.type_parameters.is_empty() {
            header.push('<');
            header.push_str(&class.type_parameters.join(", "));
            header.push('>');
        }
        if let Some(super_type) = &class.super_class {
            let rendered = self.write_type(super_type)?;
            if rendered != "Object" {
                header.push_str(" extends ");
                header.push_str(&rendered);
            }
        }
        if !class.interfaces.is_empty() {
            let mut rendered = Vec::new();
            for interface in &class.interfaces {
                rendered.push(self.write_type(interface)?);
            }
            let clause = match class.kind {
                TypeKind::Class => " implements ",
                TypeKind::Interface => " extends ",
            };
            header.push_str(clause);
            header.push_str(&rendered.join(", "));
        }

        builder.push_line(&format!("{} {{", header));
        builder.indent();

        let setter_start = self.shared.setters.borrow().entries.len();
        let mut first_member = true;
        for member in &type_decl.members {
            match member {
                Member::Field {
                    decl,
                    initializer,
                    span,
                } => {
                    self.generate_field_member(
                        &mut builder,
                        type_decl.decl,
                        *decl,
                        initializer.as_ref(),
                        span,
                    )?;
                }
                Member::Constructor(node) => {
                    if !first_member {
                        builder.push_line("");
                    }
                    let code = self.generate_constructor(node, type_decl.decl, &class)?;
                    Self::push_lines(&mut builder, &code);
                }
                Member::Method(node) => {
                    if !first_member {
                        builder.push_line("");
                    }
                    let code = self.generate_method_node(node, Some(type_decl.decl))?;
                    Self::push_lines(&mut builder, &code);
                }
                Member::Initializer {
                    is_static, body, ..
                } => {
                    if !first_member {
                        builder.push_line("");
                    }
                    let mut ctx = self
                        .root_context()
                        .with_class(Some(type_decl.decl))
                        .with_static(*is_static);
                    self.reserve_block_names(body, &mut ctx);
                    builder.push_line(if *is_static { "static {" } else { "{" });
                    builder.indent();
                    self.generate_block_statements(&body.statements, &mut builder, &mut ctx)?;
                    builder.dedent();
                    builder.push_line("}");
                }
            }
            first_member = false;
        }

        self.emit_setter_helpers(&mut builder, setter_start)?;

        builder.dedent();
        builder.push_line("}");
        Ok(builder.build())
    }

    fn generate_field_member(
        &mut self,
        builder: &mut JavaSourceBuilder,
        class_id: DeclId,
        field_id: DeclId,
        initializer: Option<&Expression>,
        span: &Span,
    ) -> Result<(), CodeGenError> {
        let field = self.decls.field(field_id).cloned().ok_or_else(|| {
            CodeGenError::InternalInconsistency {
                message: format!("member {:?} is not a field declaration", field_id),
                span: Some(span.clone()),
            }
        })?;
        let field_type = field
            .declared_type
            .clone()
            .or_else(|| initializer.map(Expression::semantic_type))
            .unwrap_or_else(SemanticType::object);
        let type_text = self.write_type(&field_type)?;
        let name = Self::safe_identifier(&field.name);
        let modifiers_str = Self::modifiers_text(&field.modifiers);
        let prefix = if modifiers_str.is_empty() {
            String::new()
        } else {
            format!("{} ", modifiers_str)
        };

        let mut ctx = self
            .root_context()
            .with_class(Some(class_id))
            .with_static(field.is_static());
        ctx.reserve(&name);
        let init_text = match initializer {
            Some(expr) => Some(self.generate_expression(expr, &mut ctx)?),
            None => None,
        };

        if ctx.has_helpers() {
            // The initializer needed helper statements; move the assignment
            // into an initializer block.
            builder.push_line(&format!("{}{} {};", prefix, type_text, name));
            builder.push_line(if field.is_static() { "static {" } else { "{" });
            builder.indent();
            for helper in ctx.take_helpers() {
                builder.push_line(&helper);
            }
            if let Some(init) = init_text {
                builder.push_line(&format!("{} = {};", name, init));
            }
            builder.dedent();
            builder.push_line("}");
        } else {
            match init_text {
                Some(init) => {
                    builder.push_line(&format!("{}{} {} = {};", prefix, type_text, name, init))
                }
                None => builder.push_line(&format!("{}{} {};", prefix, type_text, name)),
            }
        }
        Ok(())
    }

    fn generate_constructor(
        &mut self,
        node: &MethodNode,
        class_id: DeclId,
        class: &ClassDecl,
    ) -> Result<String, CodeGenError> {
        let method = self.decls.method(node.decl).cloned().ok_or_else(|| {
            CodeGenError::InternalInconsistency {
                message: format!("constructor {:?} is not a method declaration", node.decl),
                span: Some(node.span.clone()),
            }
        })?;
        let mut ctx = self.root_context().with_class(Some(class_id));

        let mut signature = String::new();
        let modifiers_str = Self::modifiers_text(&method.modifiers);
        if !modifiers_str.is_empty() {
            signature.push_str(&modifiers_str);
            signature.push(' ');
        }
        signature.push_str(&class.name);
        signature.push('(');
        signature.push_str(&self.render_member_parameters(node.decl, &method, &mut ctx)?);
        signature.push(')');

        let mut builder = self.builder();
        match &node.body {
            Some(block) => {
                self.reserve_block_names(block, &mut ctx);
                builder.push_line(&format!("{} {{", signature));
                builder.indent();
                self.generate_block_statements(&block.statements, &mut builder, &mut ctx)?;
                builder.dedent();
                builder.push_line("}");
            }
            None => builder.push_line(&format!("{};", signature)),
        }
        Ok(builder.build())
    }

    /// Render one method declaration with its body; used for class members
    /// and script-level methods alike.
    pub(crate) fn generate_method_node(
        &mut self,
        node: &MethodNode,
        class_id: Option<DeclId>,
    ) -> Result<String, CodeGenError> {
        let method = self.decls.method(node.decl).cloned().ok_or_else(|| {
            CodeGenError::InternalInconsistency {
                message: format!("member {:?} is not a method declaration", node.decl),
                span: Some(node.span.clone()),
            }
        })?;
        let mut ctx = self
            .root_context()
            .with_class(class_id)
            .with_static(method.is_static());

        let return_type = self.provider().return_type(node.decl);
        let is_void = matches!(return_type, SemanticType::Void);

        let mut signature = String::new();
        let modifiers_str = Self::modifiers_text(&method.modifiers);
        if !modifiers_str.is_empty() {
            signature.push_str(&modifiers_str);
            signature.push(' ');
        }
        signature.push_str(&self.write_type(&return_type)?);
        signature.push(' ');
        signature.push_str(&Self::safe_identifier(&method.name));
        signature.push('(');
        signature.push_str(&self.render_member_parameters(node.decl, &method, &mut ctx)?);
        signature.push(')');

        let mut builder = self.builder();
        match &node.body {
            Some(block) => {
                self.reserve_block_names(block, &mut ctx);
                builder.push_line(&format!("{} {{", signature));
                builder.indent();
                self.write_closure_body(&mut builder, block, is_void, &mut ctx)?;
                builder.dedent();
                builder.push_line("}");
            }
            None => builder.push_line(&format!("{};", signature)),
        }
        Ok(builder.build())
    }

    fn render_member_parameters(
        &mut self,
        method_id: DeclId,
        method: &myna_ast::MethodDecl,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        let mut rendered = Vec::new();
        let count = method.parameters.len();
        for (index, parameter) in method.parameters.iter().enumerate() {
            let semantic_type = self.provider().parameter_type(method_id, index);
            let is_last = index + 1 == count;
            let type_text =
                self.write_parameter_type(&semantic_type, method.is_varargs && is_last)?;
            let name = Self::safe_identifier(&parameter.name);
            ctx.reserve(&name);
            rendered.push(format!("{} {}", type_text, name));
        }
        Ok(rendered.join(", "))
    }

    /// Synthesized static setter helpers registered while generating this
    /// type's members: each wraps one resolved setter so a property
    /// assignment can be used as a value.
    fn emit_setter_helpers(
        &mut self,
        builder: &mut JavaSourceBuilder,
        start: usize,
    ) -> Result<(), CodeGenError> {
        let entries: Vec<SetterHelper> = self.shared.setters.borrow().entries[start..].to_vec();
        for helper in entries {
            let setter = self.decls.method(helper.setter).cloned().ok_or_else(|| {
                CodeGenError::InternalInconsistency {
                    message: format!("setter helper target {:?} is not a method", helper.setter),
                    span: None,
                }
            })?;
            let value_type = self.provider().parameter_type(helper.setter, 0);
            let value_text = self.write_type(&value_type)?;
            let owner_text = match setter.owner {
                Some(owner) => self.class_reference_text(owner, &Span::dummy())?,
                None => "Object".to_string(),
            };

            builder.push_line("");
            if setter.is_static() {
                builder.push_line(&format!(
                    "private static {} {}({} value) {{",
                    value_text, helper.name, value_text
                ));
                builder.indent();
                builder.push_line(&format!("{}.{}(value);", owner_text, setter.name));
            } else {
                builder.push_line(&format!(
                    "private static {} {}({} owner, {} value) {{",
                    value_text, helper.name, owner_text, value_text
                ));
                builder.indent();
                builder.push_line(&format!("owner.{}(value);", setter.name));
            }
            builder.push_line("return value;");
            builder.dedent();
            builder.push_line("}");
        }
        Ok(())
    }

    /// Script units wrap their loose statements in a generated class
    /// extending the runtime script base (which supplies the
    /// `getProperty`/`setProperty`/`invokeMethod` binding protocol), with a
    /// `main` entry point that instantiates and runs it.
    pub(crate) fn generate_script_class(
        &mut self,
        unit: &CompilationUnit,
    ) -> Result<String, CodeGenError> {
        let class_name = unit
            .script_class_name
            .clone()
            .unwrap_or_else(|| self.config.script_main_class.clone());
        let script_base = self.runtime_class("Script");

        let mut builder = self.builder();
        builder.push_line(&format!(
            "public class {} extends {} {{",
            class_name, script_base
        ));
        builder.indent();

        let setter_start = self.shared.setters.borrow().entries.len();

        builder.push_line("");
        builder.push_line("public static void main(String[] args) {");
        builder.indent();
        builder.push_line(&format!("new {}().run();", class_name));
        builder.dedent();
        builder.push_line("}");

        builder.push_line("");
        builder.push_line("public Object run() {");
        builder.indent();
        let mut ctx = self.root_context();
        let body = myna_ast::Block::new(unit.script_statements.clone());
        self.reserve_block_names(&body, &mut ctx);
        self.write_closure_body(&mut builder, &body, false, &mut ctx)?;
        builder.dedent();
        builder.push_line("}");

        for method in &unit.script_methods {
            builder.push_line("");
            let code = self.generate_method_node(method, None)?;
            Self::push_lines(&mut builder, &code);
        }

        self.emit_setter_helpers(&mut builder, setter_start)?;

        builder.dedent();
        builder.push_line("}");
        Ok(builder.build())
    }
}
