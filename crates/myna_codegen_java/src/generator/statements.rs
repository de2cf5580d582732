use super::*;
use myna_ast::{Block, Statement};

impl JavaCodeGenerator {
    /// Render one statement, prefixed by any helper statements the
    /// contained expressions hoisted into the context.
    pub fn generate_statement(
        &mut self,
        stmt: &Statement,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        match stmt {
            Statement::Expression { expr, .. } => {
                let text = self.generate_statement_expression(expr, ctx)?;
                let mut lines = ctx.take_helpers();
                if !text.is_empty() {
                    lines.push(format!("{};", text));
                }
                Ok(lines.join("\n"))
            }
            Statement::VariableDeclaration {
                decl,
                initializer,
                span,
            } => self.generate_variable_declaration(*decl, initializer.as_ref(), span, ctx),
            Statement::If {
                condition,
                then_stmt,
                else_stmt,
                ..
            } => {
                let condition_text = self.render_condition(condition, ctx)?;
                let mut builder = self.builder();
                for helper in ctx.take_helpers() {
                    builder.push_line(&helper);
                }
                builder.push_line(&format!("if ({}) {{", condition_text));
                builder.indent();
                self.generate_embedded(then_stmt, &mut builder, ctx)?;
                builder.dedent();
                if let Some(else_stmt) = else_stmt {
                    builder.push_line("} else {");
                    builder.indent();
                    self.generate_embedded(else_stmt, &mut builder, ctx)?;
                    builder.dedent();
                }
                builder.push_line("}");
                Ok(builder.build())
            }
            Statement::While {
                condition, body, ..
            } => {
                let condition_text = self.render_condition(condition, ctx)?;
                let mut builder = self.builder();
                for helper in ctx.take_helpers() {
                    builder.push_line(&helper);
                }
                builder.push_line(&format!("while ({}) {{", condition_text));
                builder.indent();
                self.generate_embedded(body, &mut builder, ctx)?;
                builder.dedent();
                builder.push_line("}");
                Ok(builder.build())
            }
            Statement::ForEach {
                variable,
                iterable,
                body,
                span,
            } => self.generate_for_each(*variable, iterable, body, span, ctx),
            Statement::Return { value, .. } => {
                let text = match value {
                    Some(expr) => {
                        let rendered = self.generate_expression(expr, ctx)?;
                        format!("return {};", rendered)
                    }
                    None => "return;".to_string(),
                };
                let mut lines = ctx.take_helpers();
                lines.push(text);
                Ok(lines.join("\n"))
            }
            Statement::Throw { value, .. } => {
                let rendered = self.generate_expression(value, ctx)?;
                let mut lines = ctx.take_helpers();
                lines.push(format!("throw {};", rendered));
                Ok(lines.join("\n"))
            }
            Statement::Block(block) => {
                let mut builder = self.builder();
                builder.push_line("{");
                builder.indent();
                self.generate_block_statements(&block.statements, &mut builder, ctx)?;
                builder.dedent();
                builder.push_line("}");
                Ok(builder.build())
            }
            Statement::TryCatch {
                body,
                catches,
                finally_block,
                ..
            } => {
                let mut builder = self.builder();
                builder.push_line("try {");
                builder.indent();
                self.generate_block_statements(&body.statements, &mut builder, ctx)?;
                builder.dedent();
                for clause in catches {
                    let parameter_name = self
                        .decls
                        .name_of(clause.parameter)
                        .unwrap_or("e")
                        .to_string();
                    let exception_text = self.write_type(&clause.exception_type)?;
                    builder.push_line(&format!(
                        "}} catch ({} {}) {{",
                        exception_text,
                        Self::safe_identifier(&parameter_name)
                    ));
                    builder.indent();
                    self.generate_block_statements(&clause.body.statements, &mut builder, ctx)?;
                    builder.dedent();
                }
                if let Some(block) = finally_block {
                    builder.push_line("} finally {");
                    builder.indent();
                    self.generate_block_statements(&block.statements, &mut builder, ctx)?;
                    builder.dedent();
                }
                builder.push_line("}");
                Ok(builder.build())
            }
            Statement::Break { .. } => Ok("break;".to_string()),
            Statement::Continue { .. } => Ok("continue;".to_string()),
        }
    }

    pub(crate) fn generate_block_statements(
        &mut self,
        statements: &[Statement],
        builder: &mut crate::builder::JavaSourceBuilder,
        ctx: &mut ExpressionContext,
    ) -> Result<(), CodeGenError> {
        for statement in statements {
            let code = self.generate_statement(statement, ctx)?;
            Self::push_lines(builder, &code);
        }
        Ok(())
    }

    /// Body of an `if`/`while`/`for`: a block inlines its statements, any
    /// other statement stands alone inside the braces.
    fn generate_embedded(
        &mut self,
        stmt: &Statement,
        builder: &mut crate::builder::JavaSourceBuilder,
        ctx: &mut ExpressionContext,
    ) -> Result<(), CodeGenError> {
        match stmt {
            Statement::Block(block) => {
                self.generate_block_statements(&block.statements, builder, ctx)
            }
            other => {
                let code = self.generate_statement(other, ctx)?;
                Self::push_lines(builder, &code);
                Ok(())
            }
        }
    }

    fn generate_variable_declaration(
        &mut self,
        decl: DeclId,
        initializer: Option<&Expression>,
        span: &Span,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        let variable = self.decls.variable(decl).cloned().ok_or_else(|| {
            CodeGenError::InternalInconsistency {
                message: format!("variable id {:?} is not a variable declaration", decl),
                span: Some(span.clone()),
            }
        })?;
        let variable_type = self.provider().variable_type(decl, initializer);
        let init_text = match initializer {
            Some(expr) => Some(self.generate_expression(expr, ctx)?),
            None => None,
        };

        let text = if let Some(cell) = ctx.cell_name(decl) {
            // This local is mutated from a closure; box it in a reference
            // cell so all scopes observe the same slot.
            let atomic = self.add_import("java.util.concurrent.atomic.AtomicReference");
            let boxed = self.write_boxed_type(&variable_type)?;
            ctx.reserve(&cell);
            format!(
                "final {0}<{1}> {2} = new {0}<{1}>({3});",
                atomic,
                boxed,
                cell,
                init_text.unwrap_or_default()
            )
        } else {
            let type_text = self.write_type(&variable_type)?;
            let name = Self::safe_identifier(&variable.name);
            ctx.reserve(&name);
            let prefix = if variable.is_final { "final " } else { "" };
            match init_text {
                Some(init) => format!("{}{} {} = {};", prefix, type_text, name, init),
                None => format!("{}{} {};", prefix, type_text, name),
            }
        };

        let mut lines = ctx.take_helpers();
        lines.push(text);
        Ok(lines.join("\n"))
    }

    fn generate_for_each(
        &mut self,
        variable: DeclId,
        iterable: &Expression,
        body: &Statement,
        span: &Span,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        let declared = self.decls.variable(variable).cloned().ok_or_else(|| {
            CodeGenError::InternalInconsistency {
                message: format!("loop variable id {:?} is not a variable declaration", variable),
                span: Some(span.clone()),
            }
        })?;
        let element_type = declared
            .declared_type
            .clone()
            .unwrap_or_else(|| Self::iteration_element_type(&iterable.semantic_type()));
        let iterable_text = self.generate_expression(iterable, ctx)?;

        let mut builder = self.builder();
        for helper in ctx.take_helpers() {
            builder.push_line(&helper);
        }

        let name = Self::safe_identifier(&declared.name);
        if let Some(cell) = ctx.cell_name(variable) {
            // Wrapped loop variable: iterate under a shadow name and rebind
            // the cell each pass.
            let item = ctx.fresh_name(&format!("{}$item", declared.name));
            let atomic = self.add_import("java.util.concurrent.atomic.AtomicReference");
            let boxed = self.write_boxed_type(&element_type)?;
            let element_text = self.write_type(&element_type)?;
            builder.push_line(&format!(
                "for ({} {} : {}) {{",
                element_text, item, iterable_text
            ));
            builder.indent();
            builder.push_line(&format!(
                "final {0}<{1}> {2} = new {0}<{1}>({3});",
                atomic, boxed, cell, item
            ));
            self.generate_embedded(body, &mut builder, ctx)?;
            builder.dedent();
            builder.push_line("}");
        } else {
            ctx.reserve(&name);
            let element_text = self.write_type(&element_type)?;
            builder.push_line(&format!(
                "for ({} {} : {}) {{",
                element_text, name, iterable_text
            ));
            builder.indent();
            self.generate_embedded(body, &mut builder, ctx)?;
            builder.dedent();
            builder.push_line("}");
        }
        Ok(builder.build())
    }

    /// Seed the context's used-name set with every identifier the block
    /// will declare, so fresh names never collide with a local declared
    /// further down. Closure bodies are skipped; they open their own scope.
    pub(crate) fn reserve_block_names(&self, block: &Block, ctx: &mut ExpressionContext) {
        for statement in &block.statements {
            self.reserve_statement_names(statement, ctx);
        }
    }

    pub(crate) fn reserve_statement_names(
        &self,
        statement: &Statement,
        ctx: &mut ExpressionContext,
    ) {
        match statement {
            Statement::VariableDeclaration { decl, .. } => {
                if let Some(name) = self.decls.name_of(*decl) {
                    ctx.reserve(&Self::safe_identifier(name));
                }
            }
            Statement::ForEach { variable, body, .. } => {
                if let Some(name) = self.decls.name_of(*variable) {
                    ctx.reserve(&Self::safe_identifier(name));
                }
                self.reserve_statement_names(body, ctx);
            }
            Statement::If {
                then_stmt,
                else_stmt,
                ..
            } => {
                self.reserve_statement_names(then_stmt, ctx);
                if let Some(stmt) = else_stmt {
                    self.reserve_statement_names(stmt, ctx);
                }
            }
            Statement::While { body, .. } => self.reserve_statement_names(body, ctx),
            Statement::Block(block) => self.reserve_block_names(block, ctx),
            Statement::TryCatch {
                body,
                catches,
                finally_block,
                ..
            } => {
                self.reserve_block_names(body, ctx);
                for clause in catches {
                    if let Some(name) = self.decls.name_of(clause.parameter) {
                        ctx.reserve(&Self::safe_identifier(name));
                    }
                    self.reserve_block_names(&clause.body, ctx);
                }
                if let Some(block) = finally_block {
                    self.reserve_block_names(block, ctx);
                }
            }
            _ => {}
        }
    }

    /// Element type produced by iterating a value of the given type.
    fn iteration_element_type(iterable: &SemanticType) -> SemanticType {
        match iterable {
            SemanticType::Array(element) => element.as_ref().clone(),
            SemanticType::Range(element) => element.as_ref().clone(),
            SemanticType::Class { type_args, .. } if type_args.len() == 1 => type_args[0].clone(),
            _ => SemanticType::object(),
        }
    }
}
