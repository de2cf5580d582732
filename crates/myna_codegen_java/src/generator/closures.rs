use super::*;
use myna_ast::{Block, ClosureExpression, ClosureParameter, MapEntry, Statement};
use std::collections::BTreeMap;

impl JavaCodeGenerator {
    /// Render a closure literal as an anonymous subclass of the runtime
    /// closure type. The constructor receives the enclosing owner reference
    /// twice (owner and delegate views onto the same instance); parameters
    /// with default values produce one `call` overload per truncated arity.
    pub(crate) fn generate_closure(
        &mut self,
        closure: &ClosureExpression,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        let closure_class = self.runtime_class("Closure");
        let is_void = matches!(closure.return_type, SemanticType::Void);
        let return_text = if is_void {
            "void".to_string()
        } else {
            self.write_boxed_type(&closure.return_type)?
        };
        let generic_arg = if is_void {
            "Void".to_string()
        } else {
            return_text.clone()
        };
        let owner = if ctx.is_static() {
            "null, null"
        } else {
            "this, this"
        };

        let parameters = self.closure_parameter_list(&closure.parameters)?;

        let mut builder = self.builder();
        builder.push_line(&format!(
            "new {}<{}>({}) {{",
            closure_class, generic_arg, owner
        ));
        builder.indent();

        let max_arity = parameters.len();
        let min_arity = Self::minimum_arity(&closure.parameters);

        let mut inner = ctx.extend_synthetic();
        for (name, _, _) in &parameters {
            inner.reserve(name);
        }
        self.reserve_block_names(&closure.body, &mut inner);

        self.emit_call_method(
            &mut builder,
            "public",
            &return_text,
            is_void,
            "call",
            &parameters,
            max_arity,
            &closure.body,
            &mut inner,
        )?;

        for arity in (min_arity..max_arity).rev() {
            builder.push_line("");
            self.emit_forwarding_method(
                &mut builder,
                "public",
                &return_text,
                is_void,
                "call",
                "call",
                &parameters,
                &closure.parameters,
                arity,
                ctx,
            )?;
        }

        builder.dedent();
        builder.push_line("}");
        Ok(builder.build().trim_end().to_string())
    }

    /// Render a map literal cast onto an interface or abstract class as an
    /// anonymous subclass whose methods come from the map's named closure
    /// entries.
    pub(crate) fn generate_anonymous_from_map(
        &mut self,
        class_id: DeclId,
        target: &SemanticType,
        entries: &[MapEntry],
        span: &Span,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        let class_decl = self.decls.class(class_id).cloned().ok_or_else(|| {
            CodeGenError::InternalInconsistency {
                message: format!("cast target {:?} is not a class declaration", class_id),
                span: Some(span.clone()),
            }
        })?;
        let type_text = self.write_type(target)?;

        // Substitution of the target's type parameters by the cast's type
        // arguments, applied to reused method signatures.
        let mut substitution = BTreeMap::new();
        if let SemanticType::Class { type_args, .. } = target {
            for (parameter, argument) in class_decl.type_parameters.iter().zip(type_args) {
                substitution.insert(parameter.clone(), argument.clone());
            }
        }

        let mut builder = self.builder();
        builder.push_line(&format!("new {}() {{", type_text));
        builder.indent();

        let mut first = true;
        for entry in entries {
            let name = match &entry.key {
                Expression::Literal {
                    value: Literal::String { value, .. },
                    ..
                } => value.clone(),
                _ => {
                    return Err(CodeGenError::UnsupportedConstruct {
                        construct: "anonymous-class map entry with a non-literal key".to_string(),
                        span: Some(span.clone()),
                    })
                }
            };
            let Expression::Closure(closure) = &entry.value else {
                return Err(CodeGenError::UnsupportedConstruct {
                    construct: format!(
                        "anonymous-class map entry '{}' whose value is not a closure",
                        name
                    ),
                    span: Some(span.clone()),
                });
            };

            let parameters = self.closure_parameter_list(&closure.parameters)?;
            let max_arity = parameters.len();
            let min_arity = Self::minimum_arity(&closure.parameters);

            for arity in (min_arity..=max_arity).rev() {
                if !first {
                    builder.push_line("");
                }
                first = false;

                // Reuse the target type's signature at this arity when one
                // exists; otherwise fall back to public plus the closure's
                // own inferred return type.
                let (modifiers_text, return_type) =
                    match self.find_method_by_arity(&class_decl, &name, arity) {
                        Some(method_id) => {
                            let declared = self
                                .provider()
                                .return_type(method_id)
                                .substitute(&substitution);
                            let modifiers = self
                                .decls
                                .method(method_id)
                                .map(|m| {
                                    let mut reused = m.modifiers.clone();
                                    reused.is_abstract = false;
                                    Self::modifiers_text(&reused)
                                })
                                .filter(|text| !text.is_empty())
                                .unwrap_or_else(|| "public".to_string());
                            (modifiers, declared)
                        }
                        None => ("public".to_string(), closure.return_type.clone()),
                    };
                let is_void = matches!(return_type, SemanticType::Void);
                let return_text = if is_void {
                    "void".to_string()
                } else {
                    self.write_boxed_type(&return_type)?
                };

                if arity == max_arity {
                    let mut inner = ctx.extend_synthetic();
                    for (param_name, _, _) in &parameters {
                        inner.reserve(param_name);
                    }
                    self.reserve_block_names(&closure.body, &mut inner);
                    self.emit_call_method(
                        &mut builder,
                        &modifiers_text,
                        &return_text,
                        is_void,
                        &name,
                        &parameters,
                        max_arity,
                        &closure.body,
                        &mut inner,
                    )?;
                } else {
                    self.emit_forwarding_method(
                        &mut builder,
                        &modifiers_text,
                        &return_text,
                        is_void,
                        &name,
                        &format!("this.{}", name),
                        &parameters,
                        &closure.parameters,
                        arity,
                        ctx,
                    )?;
                }
            }
        }

        builder.dedent();
        builder.push_line("}");
        Ok(builder.build().trim_end().to_string())
    }

    fn closure_parameter_list(
        &mut self,
        parameters: &[ClosureParameter],
    ) -> Result<Vec<(String, String, SemanticType)>, CodeGenError> {
        let mut rendered = Vec::new();
        for parameter in parameters {
            let name = self
                .decls
                .name_of(parameter.decl)
                .unwrap_or("it")
                .to_string();
            let semantic_type = self.provider().closure_parameter_type(parameter.decl);
            let type_text = self.write_type(&semantic_type)?;
            rendered.push((Self::safe_identifier(&name), type_text, semantic_type));
        }
        Ok(rendered)
    }

    fn minimum_arity(parameters: &[ClosureParameter]) -> usize {
        parameters
            .iter()
            .take_while(|parameter| parameter.default_value.is_none())
            .count()
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_call_method(
        &mut self,
        builder: &mut crate::builder::JavaSourceBuilder,
        modifiers_text: &str,
        return_text: &str,
        is_void: bool,
        name: &str,
        parameters: &[(String, String, SemanticType)],
        arity: usize,
        body: &Block,
        ctx: &mut ExpressionContext,
    ) -> Result<(), CodeGenError> {
        let signature = parameters[..arity]
            .iter()
            .map(|(param_name, type_text, _)| format!("{} {}", type_text, param_name))
            .collect::<Vec<_>>()
            .join(", ");
        builder.push_line(&format!(
            "{} {} {}({}) {{",
            modifiers_text, return_text, name, signature
        ));
        builder.indent();
        self.write_closure_body(builder, body, is_void, ctx)?;
        builder.dedent();
        builder.push_line("}");
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_forwarding_method(
        &mut self,
        builder: &mut crate::builder::JavaSourceBuilder,
        modifiers_text: &str,
        return_text: &str,
        is_void: bool,
        name: &str,
        delegate: &str,
        parameters: &[(String, String, SemanticType)],
        declared: &[ClosureParameter],
        arity: usize,
        ctx: &mut ExpressionContext,
    ) -> Result<(), CodeGenError> {
        let signature = parameters[..arity]
            .iter()
            .map(|(param_name, type_text, _)| format!("{} {}", type_text, param_name))
            .collect::<Vec<_>>()
            .join(", ");

        let mut arguments: Vec<String> = parameters[..arity]
            .iter()
            .map(|(param_name, _, _)| param_name.clone())
            .collect();
        let mut default_ctx = ctx.copy();
        for parameter in &declared[arity..] {
            let Some(default) = &parameter.default_value else {
                return Err(CodeGenError::InternalInconsistency {
                    message: format!(
                        "parameter beyond arity {} has no default value",
                        arity
                    ),
                    span: None,
                });
            };
            arguments.push(self.generate_expression(default, &mut default_ctx)?);
        }

        builder.push_line(&format!(
            "{} {} {}({}) {{",
            modifiers_text, return_text, name, signature
        ));
        builder.indent();
        let invocation = format!("{}({})", delegate, arguments.join(", "));
        if is_void {
            builder.push_line(&format!("{};", invocation));
        } else {
            builder.push_line(&format!("return {};", invocation));
        }
        builder.dedent();
        builder.push_line("}");
        Ok(())
    }

    /// Closure/method body with the dynamic language's implicit return of
    /// the trailing expression made explicit. A void-typed trailing call
    /// stays a statement and the body falls back to `return null;`.
    pub(crate) fn write_closure_body(
        &mut self,
        builder: &mut crate::builder::JavaSourceBuilder,
        body: &Block,
        is_void: bool,
        ctx: &mut ExpressionContext,
    ) -> Result<(), CodeGenError> {
        let count = body.statements.len();
        let mut needs_trailing_null = !is_void && count == 0;
        for (index, statement) in body.statements.iter().enumerate() {
            let is_last = index + 1 == count;
            if is_last && !is_void {
                match statement {
                    Statement::Expression { expr, .. }
                        if !matches!(expr.semantic_type(), SemanticType::Void) =>
                    {
                        let text = self.generate_expression(expr, ctx)?;
                        for helper in ctx.take_helpers() {
                            builder.push_line(&helper);
                        }
                        builder.push_line(&format!("return {};", text));
                        continue;
                    }
                    Statement::Expression { .. }
                    | Statement::VariableDeclaration { .. }
                    | Statement::ForEach { .. }
                    | Statement::Break { .. }
                    | Statement::Continue { .. } => {
                        needs_trailing_null = true;
                    }
                    _ => {}
                }
            }
            let code = self.generate_statement(statement, ctx)?;
            Self::push_lines(builder, &code);
        }
        if needs_trailing_null {
            builder.push_line("return null;");
        }
        Ok(())
    }

    fn find_method_by_arity(
        &self,
        class_decl: &myna_ast::ClassDecl,
        name: &str,
        arity: usize,
    ) -> Option<DeclId> {
        class_decl.methods.iter().copied().find(|id| {
            self.decls
                .method(*id)
                .map(|method| method.name == name && method.parameters.len() == arity)
                .unwrap_or(false)
        })
    }
}
