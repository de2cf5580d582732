use super::*;
use myna_ast::{
    FieldInitializer, MapEntry, MethodDecl, SelfKind, TemplatePart, UnaryOp,
};

impl JavaCodeGenerator {
    /// Render one expression as Java text. Constructs Java cannot express
    /// inline (map literals, named-argument construction, hoisted null-safe
    /// qualifiers) push helper statements into the context; the enclosing
    /// statement emits them first.
    pub fn generate_expression(
        &mut self,
        expr: &Expression,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        match expr {
            Expression::Literal { value, .. } => Ok(Self::literal_to_string(value)),
            Expression::StringTemplate { parts, .. } => self.generate_string_template(parts, ctx),
            Expression::Reference {
                qualifier,
                name,
                resolved,
                null_safe,
                span,
                ..
            } => self.generate_reference(
                qualifier.as_deref(),
                name,
                resolved,
                *null_safe,
                span,
                ctx,
            ),
            Expression::Binary {
                left,
                op,
                right,
                op_method,
                span,
                ..
            } => self.generate_binary(left, *op, right, op_method.as_ref(), span, ctx),
            Expression::Unary {
                op,
                operand,
                op_method,
                write_ref,
                prefix,
                span,
                ..
            } => match op {
                UnaryOp::Increment | UnaryOp::Decrement => self.generate_increment(
                    *op,
                    operand,
                    op_method.as_ref(),
                    write_ref.as_ref(),
                    *prefix,
                    span,
                    ctx,
                    false,
                ),
                _ => self.generate_simple_unary(*op, operand, op_method.as_ref(), span, ctx),
            },
            Expression::Assignment {
                target,
                op,
                op_method,
                write_ref,
                value,
                span,
                ..
            } => self.generate_assignment(
                target,
                *op,
                op_method.as_ref(),
                write_ref.as_ref(),
                value,
                span,
                ctx,
                false,
            ),
            Expression::Call {
                receiver,
                name,
                resolved,
                args,
                null_safe,
                span,
                ..
            } => self.generate_call(
                receiver.as_deref(),
                name,
                resolved,
                args,
                *null_safe,
                span,
                ctx,
            ),
            Expression::Index {
                collection,
                index,
                resolved,
                span,
                ..
            } => self.generate_index_read(collection, index, resolved.as_ref(), span, ctx),
            Expression::Ternary {
                condition,
                then_expr,
                else_expr,
                ..
            } => self.generate_ternary(condition, then_expr.as_deref(), else_expr, ctx),
            Expression::TypeCheck {
                operand,
                target,
                negated,
                ..
            } => {
                let operand_text = self.generate_expression(operand, ctx)?;
                let operand_text = Self::parenthesized_operand(operand, operand_text);
                let target_text = self.write_type(target)?;
                if *negated {
                    Ok(format!("!({} instanceof {})", operand_text, target_text))
                } else {
                    Ok(format!("{} instanceof {}", operand_text, target_text))
                }
            }
            Expression::Cast {
                operand,
                target,
                target_class,
                safe,
                conversion,
                span,
            } => self.generate_cast(
                operand,
                target,
                *target_class,
                *safe,
                conversion.as_ref(),
                span,
                ctx,
            ),
            Expression::ListLiteral {
                elements,
                semantic_type,
                ..
            } => self.generate_list_literal(elements, semantic_type, ctx),
            Expression::MapLiteral {
                entries,
                semantic_type,
                ..
            } => self.generate_map_literal(entries, semantic_type, ctx),
            Expression::Range {
                from,
                to,
                inclusive,
                semantic_type,
                ..
            } => {
                let from_text = self.generate_expression(from, ctx)?;
                let to_text = self.generate_expression(to, ctx)?;
                let element = match semantic_type {
                    SemanticType::Range(element) => element.as_ref().clone(),
                    _ => SemanticType::object(),
                };
                let range_class = self.range_type_name(&element);
                Ok(format!(
                    "new {}({}, {}, {})",
                    range_class, from_text, to_text, inclusive
                ))
            }
            Expression::Closure(closure) => self.generate_closure(closure, ctx),
            Expression::New {
                class_type,
                constructor,
                args,
                initializers,
                span,
            } => self.generate_new(
                class_type,
                constructor.as_ref(),
                args,
                initializers,
                span,
                ctx,
            ),
            Expression::Parenthesized { inner, .. } => {
                Ok(format!("({})", self.generate_expression(inner, ctx)?))
            }
            Expression::SelfRef { kind, qualifier, .. } => {
                Ok(self.self_ref_text(*kind, qualifier.as_deref(), ctx))
            }
        }
    }

    /// Statement-position rendering. Returns text without a trailing
    /// semicolon; an empty string means the statement is fully carried by
    /// the helper statements already pushed.
    pub(crate) fn generate_statement_expression(
        &mut self,
        expr: &Expression,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        match expr {
            Expression::Assignment {
                target,
                op,
                op_method,
                write_ref,
                value,
                span,
                ..
            } => self.generate_assignment(
                target,
                *op,
                op_method.as_ref(),
                write_ref.as_ref(),
                value,
                span,
                ctx,
                true,
            ),
            Expression::Unary {
                op: op @ (UnaryOp::Increment | UnaryOp::Decrement),
                operand,
                op_method,
                write_ref,
                prefix,
                span,
                ..
            } => self.generate_increment(
                *op,
                operand,
                op_method.as_ref(),
                write_ref.as_ref(),
                *prefix,
                span,
                ctx,
                true,
            ),
            Expression::Call { .. } => self.generate_expression(expr, ctx),
            Expression::New { .. } => {
                let text = self.generate_expression(expr, ctx)?;
                // Named-argument construction desugars to helpers and leaves
                // only the fresh local's name behind.
                if Self::is_identifier_text(&text) {
                    Ok(String::new())
                } else {
                    Ok(text)
                }
            }
            _ => {
                let text = self.generate_expression(expr, ctx)?;
                if Self::is_identifier_text(&text) {
                    // Desugared literals leave only their fresh local name;
                    // the helper statements carry the effect.
                    return Ok(String::new());
                }
                let name = ctx.fresh_name("ignored");
                Ok(format!("final Object {} = {}", name, text))
            }
        }
    }

    fn is_identifier_text(text: &str) -> bool {
        !text.is_empty()
            && text
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$')
    }

    /// Hoist an already-rendered expression into a fresh local and return
    /// the local's name.
    pub(crate) fn hoist_to_local(
        &mut self,
        text: String,
        semantic_type: &SemanticType,
        base: &str,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        let type_text = self.write_boxed_type(semantic_type)?;
        let name = ctx.fresh_name(base);
        ctx.push_helper(format!("final {} {} = {};", type_text, name, text));
        Ok(name)
    }

    // === References ===

    #[allow(clippy::too_many_arguments)]
    fn generate_reference(
        &mut self,
        qualifier: Option<&Expression>,
        name: &str,
        resolved: &ResolvedRef,
        null_safe: bool,
        span: &Span,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        if null_safe {
            let Some(qualifier) = qualifier else {
                return Err(CodeGenError::InternalInconsistency {
                    message: "null-safe reference without a qualifier".to_string(),
                    span: Some(span.clone()),
                });
            };
            // The qualifier is always hoisted so it is evaluated exactly
            // once, on both sides of the null test.
            let text = self.generate_expression(qualifier, ctx)?;
            let subject = self.hoist_to_local(text, &qualifier.semantic_type(), "tmp", ctx)?;
            let member = self.member_access_text(&subject, name, resolved, span)?;
            return Ok(format!("({} == null ? null : {})", subject, member));
        }

        match &resolved.target {
            ResolvedTarget::Class(id) => {
                // A class used as a value becomes a class literal.
                let class_text = self.class_reference_text(*id, span)?;
                Ok(format!("{}.class", class_text))
            }
            ResolvedTarget::Method(_) => {
                let (_, method) = self.resolved_method(resolved, span)?;
                let prefix = match qualifier {
                    Some(expr) => {
                        let text = self.generate_qualifier(expr, ctx)?;
                        format!("{}.", text)
                    }
                    None => self.member_prefix(method.owner, method.is_static(), span, ctx)?,
                };
                Ok(format!(
                    "{}{}()",
                    prefix,
                    Self::safe_identifier(&method.name)
                ))
            }
            ResolvedTarget::Field(id) => {
                let field = self.decls.field(*id).cloned().ok_or_else(|| {
                    CodeGenError::InternalInconsistency {
                        message: format!("field id {:?} is not a field declaration", id),
                        span: Some(span.clone()),
                    }
                })?;
                let prefix = match qualifier {
                    Some(expr) => format!("{}.", self.generate_qualifier(expr, ctx)?),
                    None => self.member_prefix(field.owner, field.is_static(), span, ctx)?,
                };
                Ok(format!("{}{}", prefix, Self::safe_identifier(&field.name)))
            }
            ResolvedTarget::Variable(id) => {
                if let Some(cell) = ctx.cell_name(*id) {
                    return Ok(format!("{}.get()", cell));
                }
                let declared = self.decls.name_of(*id).unwrap_or(name);
                Ok(Self::safe_identifier(declared))
            }
            ResolvedTarget::DynamicProperty(property) => {
                self.caveat(
                    format!("property '{}' is only known dynamically", property),
                    Some(span.clone()),
                );
                match qualifier {
                    Some(expr) => {
                        let text = self.generate_qualifier(expr, ctx)?;
                        Ok(format!("{}.getProperty(\"{}\")", text, property))
                    }
                    None => Ok(format!("getProperty(\"{}\")", property)),
                }
            }
            ResolvedTarget::Unresolved => match qualifier {
                Some(expr) => {
                    self.caveat(
                        format!("unresolved member '{}' rendered as a plain access", name),
                        Some(span.clone()),
                    );
                    let text = self.generate_qualifier(expr, ctx)?;
                    Ok(format!("{}.{}", text, Self::safe_identifier(name)))
                }
                None => {
                    // Script-level bare names go through the binding
                    // protocol; myna tolerates this at run time.
                    self.caveat(
                        format!("unresolved name '{}' routed through getProperty", name),
                        Some(span.clone()),
                    );
                    Ok(format!("getProperty(\"{}\")", name))
                }
            },
        }
    }

    fn member_access_text(
        &mut self,
        subject: &str,
        name: &str,
        resolved: &ResolvedRef,
        span: &Span,
    ) -> Result<String, CodeGenError> {
        match &resolved.target {
            ResolvedTarget::Method(_) => {
                let (_, method) = self.resolved_method(resolved, span)?;
                Ok(format!(
                    "{}.{}()",
                    subject,
                    Self::safe_identifier(&method.name)
                ))
            }
            ResolvedTarget::Field(id) => {
                let field_name = self
                    .decls
                    .name_of(*id)
                    .unwrap_or(name)
                    .to_string();
                Ok(format!("{}.{}", subject, Self::safe_identifier(&field_name)))
            }
            ResolvedTarget::DynamicProperty(property) => {
                self.caveat(
                    format!("property '{}' is only known dynamically", property),
                    Some(span.clone()),
                );
                Ok(format!("{}.getProperty(\"{}\")", subject, property))
            }
            _ => Ok(format!("{}.{}", subject, Self::safe_identifier(name))),
        }
    }

    /// Implicit receiver prefix for an unqualified member reference.
    fn member_prefix(
        &mut self,
        owner: Option<DeclId>,
        is_static: bool,
        span: &Span,
        ctx: &ExpressionContext,
    ) -> Result<String, CodeGenError> {
        if is_static {
            return Ok(match owner {
                Some(class) => format!("{}.", self.class_reference_text(class, span)?),
                None => String::new(),
            });
        }
        if ctx.in_synthetic_scope() {
            if let (Some(owner), Some(containing)) = (owner, ctx.containing_class()) {
                if owner == containing || ctx.is_converted(owner) {
                    if let Some(decl) = self.decls.class(containing) {
                        return Ok(format!("{}.this.", decl.name));
                    }
                }
            }
        }
        Ok(String::new())
    }

    /// Qualifier rendering: a class reference renders as the type name, not
    /// a class literal.
    pub(crate) fn generate_qualifier(
        &mut self,
        expr: &Expression,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        if let Expression::Reference { resolved, span, .. } = expr {
            if let ResolvedTarget::Class(id) = resolved.target {
                return self.class_reference_text(id, span);
            }
        }
        let text = self.generate_expression(expr, ctx)?;
        Ok(Self::parenthesized_operand(expr, text))
    }

    // === Calls ===

    #[allow(clippy::too_many_arguments)]
    fn generate_call(
        &mut self,
        receiver: Option<&Expression>,
        name: &str,
        resolved: &ResolvedRef,
        args: &[Expression],
        null_safe: bool,
        span: &Span,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        let method_name = match resolved.method_id() {
            Some(_) => {
                let (_, method) = self.resolved_method(resolved, span)?;
                Self::safe_identifier(&method.name)
            }
            None => Self::safe_identifier(name),
        };

        if null_safe {
            let Some(receiver) = receiver else {
                return Err(CodeGenError::InternalInconsistency {
                    message: "null-safe call without a receiver".to_string(),
                    span: Some(span.clone()),
                });
            };
            let text = self.generate_expression(receiver, ctx)?;
            let subject = self.hoist_to_local(text, &receiver.semantic_type(), "tmp", ctx)?;
            let rendered_args = self.render_call_arguments(args, Some(resolved), ctx)?;
            return Ok(format!(
                "({0} == null ? null : {0}.{1}({2}))",
                subject, method_name, rendered_args
            ));
        }

        if resolved.is_unresolved() && receiver.is_none() {
            self.caveat(
                format!("unresolved call '{}' routed through invokeMethod", name),
                Some(span.clone()),
            );
            let rendered_args = self.render_arguments(args, ctx)?;
            return Ok(format!(
                "invokeMethod(\"{}\", new Object[]{{{}}})",
                name, rendered_args
            ));
        }

        let prefix = match receiver {
            Some(Expression::SelfRef {
                kind: SelfKind::Super,
                qualifier,
                ..
            }) => format!(
                "{}.",
                self.self_ref_text(SelfKind::Super, qualifier.as_deref(), ctx)
            ),
            Some(expr) => format!("{}.", self.generate_qualifier(expr, ctx)?),
            None => match resolved.method_id() {
                Some(_) => {
                    let (_, method) = self.resolved_method(resolved, span)?;
                    self.member_prefix(method.owner, method.is_static(), span, ctx)?
                }
                None => String::new(),
            },
        };

        let rendered_args = self.render_call_arguments(args, Some(resolved), ctx)?;
        Ok(format!("{}{}({})", prefix, method_name, rendered_args))
    }

    // === Operators ===

    fn generate_binary(
        &mut self,
        left: &Expression,
        op: BinaryOp,
        right: &Expression,
        op_method: Option<&ResolvedRef>,
        span: &Span,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        if let Some(resolved) = op_method {
            let (_, method) = self.resolved_method(resolved, span)?;
            let left_text = self.generate_expression(left, ctx)?;
            let left_text = Self::parenthesized_operand(left, left_text);
            let right_text = self.generate_expression(right, ctx)?;
            let call = format!("{}.{}({})", left_text, method.name, right_text);
            return Ok(if op.is_ordering() {
                // Ordering over an operator method becomes a compareTo
                // comparison against zero.
                format!("{} {} 0", call, Self::binary_op_token(op))
            } else if op == BinaryOp::NotEqual {
                format!("!{}", call)
            } else {
                call
            });
        }

        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            let left_text = self.condition_operand(left, ctx)?;
            let right_text = self.condition_operand(right, ctx)?;
            return Ok(format!(
                "{} {} {}",
                left_text,
                Self::binary_op_token(op),
                right_text
            ));
        }

        let left_text = self.generate_expression(left, ctx)?;
        let right_text = self.generate_expression(right, ctx)?;
        Ok(format!(
            "{} {} {}",
            left_text,
            Self::binary_op_token(op),
            right_text
        ))
    }

    fn generate_simple_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expression,
        op_method: Option<&ResolvedRef>,
        span: &Span,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        if let Some(resolved) = op_method {
            let (_, method) = self.resolved_method(resolved, span)?;
            let text = self.generate_expression(operand, ctx)?;
            let text = Self::parenthesized_operand(operand, text);
            return Ok(format!("{}.{}()", text, method.name));
        }
        match op {
            UnaryOp::Not => {
                if operand.semantic_type().is_boolean() {
                    let text = self.generate_expression(operand, ctx)?;
                    Ok(format!("!{}", Self::parenthesized_operand(operand, text)))
                } else {
                    let condition = self.render_condition(operand, ctx)?;
                    Ok(format!("!({})", condition))
                }
            }
            UnaryOp::Minus => {
                let text = self.generate_expression(operand, ctx)?;
                Ok(format!("-{}", Self::parenthesized_operand(operand, text)))
            }
            UnaryOp::Plus => {
                let text = self.generate_expression(operand, ctx)?;
                Ok(format!("+{}", Self::parenthesized_operand(operand, text)))
            }
            UnaryOp::BitNot => {
                let text = self.generate_expression(operand, ctx)?;
                Ok(format!("~{}", Self::parenthesized_operand(operand, text)))
            }
            UnaryOp::Increment | UnaryOp::Decrement => Err(CodeGenError::InternalInconsistency {
                message: "increment handled by generate_increment".to_string(),
                span: Some(span.clone()),
            }),
        }
    }

    /// Pre/post increment and decrement, expanded to
    /// read-then-operate-then-write wherever the target is not a plain
    /// native variable.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn generate_increment(
        &mut self,
        op: UnaryOp,
        operand: &Expression,
        op_method: Option<&ResolvedRef>,
        write_ref: Option<&ResolvedRef>,
        prefix: bool,
        span: &Span,
        ctx: &mut ExpressionContext,
        as_statement: bool,
    ) -> Result<String, CodeGenError> {
        let native_token = if op == UnaryOp::Increment { "+" } else { "-" };
        let op_method_name = match op_method {
            Some(resolved) => Some(self.resolved_method(resolved, span)?.1.name),
            None => None,
        };
        let apply = |read: &str| -> String {
            match &op_method_name {
                Some(name) => format!("{}.{}()", read, name),
                None => format!("{} {} 1", read, native_token),
            }
        };
        let value_type = operand.semantic_type();

        // Reference-cell variable: reads and writes go through the cell.
        if let Expression::Reference { resolved, .. } = operand {
            if let ResolvedTarget::Variable(id) = resolved.target {
                if let Some(cell) = ctx.cell_name(id) {
                    let read = format!("{}.get()", cell);
                    if as_statement {
                        return Ok(format!("{}.set({})", cell, apply(&read)));
                    }
                    if prefix {
                        let tmp = self.hoist_to_local(apply(&read), &value_type, "tmp", ctx)?;
                        ctx.push_helper(format!("{}.set({});", cell, tmp));
                        return Ok(tmp);
                    }
                    let old = self.hoist_to_local(read, &value_type, "old", ctx)?;
                    ctx.push_helper(format!("{}.set({});", cell, apply(&old)));
                    return Ok(old);
                }
            }
        }

        // Property accessor target: getter, operator, setter.
        if let Some(write_ref) = write_ref {
            let (setter_id, setter) = self.resolved_method(write_ref, span)?;
            let _ = setter_id;
            let Expression::Reference {
                qualifier, resolved, ..
            } = operand
            else {
                return Err(CodeGenError::InternalInconsistency {
                    message: "property increment over a non-reference operand".to_string(),
                    span: Some(span.clone()),
                });
            };
            let (_, getter) = self.resolved_method(resolved, span)?;
            let receiver_prefix = match qualifier.as_deref() {
                Some(expr) => {
                    let text = self.generate_qualifier(expr, ctx)?;
                    let is_class_qualifier = matches!(
                        expr,
                        Expression::Reference { resolved, .. }
                            if matches!(resolved.target, ResolvedTarget::Class(_))
                    );
                    let text = if Self::is_simple_expression(expr) || is_class_qualifier {
                        text
                    } else {
                        self.hoist_to_local(text, &expr.semantic_type(), "tmp", ctx)?
                    };
                    format!("{}.", text)
                }
                None => self.member_prefix(setter.owner, setter.is_static(), span, ctx)?,
            };
            let read = format!("{}{}()", receiver_prefix, getter.name);
            let write = |value: &str| format!("{}{}({})", receiver_prefix, setter.name, value);
            if as_statement {
                return Ok(write(&apply(&read)));
            }
            if prefix {
                let tmp = self.hoist_to_local(apply(&read), &value_type, "tmp", ctx)?;
                ctx.push_helper(format!("{};", write(&tmp)));
                return Ok(tmp);
            }
            let old = self.hoist_to_local(read, &value_type, "old", ctx)?;
            ctx.push_helper(format!("{};", write(&apply(&old))));
            return Ok(old);
        }

        // Operator overload on a plain variable or field.
        if op_method_name.is_some() {
            let write = self.generate_write_reference(operand, false, span, ctx)?;
            if as_statement {
                return Ok(format!("{} = {}", write, apply(&write)));
            }
            if prefix {
                ctx.push_helper(format!("{} = {};", write, apply(&write)));
                return Ok(write);
            }
            let old = self.hoist_to_local(write.clone(), &value_type, "old", ctx)?;
            ctx.push_helper(format!("{} = {};", write, apply(&old)));
            return Ok(old);
        }

        // Native numeric target.
        let target_text = match operand {
            Expression::Index {
                collection,
                index,
                resolved: None,
                ..
            } => {
                let collection_text = self.generate_expression(collection, ctx)?;
                let index_text = self.generate_expression(index, ctx)?;
                format!("{}[{}]", collection_text, index_text)
            }
            _ => self.generate_write_reference(operand, false, span, ctx)?,
        };
        let token = if op == UnaryOp::Increment { "++" } else { "--" };
        Ok(if prefix {
            format!("{}{}", token, target_text)
        } else {
            format!("{}{}", target_text, token)
        })
    }

    // === Assignment ===

    /// Assignment desugaring: property setters, dynamic properties,
    /// reference cells, indexed `putAt`, and plain native assignment, in
    /// both statement and value position.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn generate_assignment(
        &mut self,
        target: &Expression,
        op: Option<BinaryOp>,
        op_method: Option<&ResolvedRef>,
        write_ref: Option<&ResolvedRef>,
        value: &Expression,
        span: &Span,
        ctx: &mut ExpressionContext,
        as_statement: bool,
    ) -> Result<String, CodeGenError> {
        match target {
            Expression::Reference {
                qualifier,
                name,
                resolved,
                ..
            } => self.generate_reference_assignment(
                qualifier.as_deref(),
                name,
                resolved,
                op,
                op_method,
                write_ref,
                value,
                span,
                ctx,
                as_statement,
            ),
            Expression::Index {
                collection,
                index,
                resolved,
                ..
            } => self.generate_index_assignment(
                collection,
                index,
                resolved.as_ref(),
                op,
                op_method,
                write_ref,
                value,
                span,
                ctx,
                as_statement,
            ),
            _ => Err(CodeGenError::InternalInconsistency {
                message: "assignment target is neither a reference nor an index".to_string(),
                span: Some(span.clone()),
            }),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn generate_reference_assignment(
        &mut self,
        qualifier: Option<&Expression>,
        name: &str,
        resolved: &ResolvedRef,
        op: Option<BinaryOp>,
        op_method: Option<&ResolvedRef>,
        write_ref: Option<&ResolvedRef>,
        value: &Expression,
        span: &Span,
        ctx: &mut ExpressionContext,
        as_statement: bool,
    ) -> Result<String, CodeGenError> {
        // Property target: write through the resolved setter.
        if let Some(setter_ref) = write_ref {
            if let Some(setter_id) = setter_ref.method_id() {
                let (_, setter) = self.resolved_method(setter_ref, span)?;
                let needs_reuse = op.is_some();
                let (call_prefix, receiver_expr) = self.assignment_receiver(
                    qualifier,
                    &setter,
                    needs_reuse,
                    span,
                    ctx,
                )?;
                let value_text = self.assignment_value(
                    op,
                    op_method,
                    resolved,
                    &call_prefix,
                    value,
                    span,
                    ctx,
                )?;
                let setter_call =
                    format!("{}{}({})", call_prefix, setter.name, value_text);
                if as_statement {
                    return Ok(setter_call);
                }
                if op.is_none() && Self::is_simple_expression(value) {
                    // The right-hand value is already available; hoist the
                    // setter call and reuse the value text directly.
                    ctx.push_helper(format!("{};", setter_call));
                    return Ok(value_text);
                }
                let hint = setter
                    .property_name()
                    .unwrap_or_else(|| setter.name.clone());
                let helper = ctx.setter_name(setter_id, &hint);
                return Ok(if setter.is_static() {
                    format!("{}({})", helper, value_text)
                } else {
                    format!("{}({}, {})", helper, receiver_expr, value_text)
                });
            }
        }

        let dynamic_name = match write_ref.map(|r| &r.target) {
            Some(ResolvedTarget::DynamicProperty(property)) => Some(property.clone()),
            _ if resolved.is_unresolved() && write_ref.is_none() => Some(name.to_string()),
            _ => None,
        };
        if let Some(property) = dynamic_name {
            return self.generate_dynamic_property_assignment(
                qualifier, &property, op, op_method, value, span, ctx, as_statement,
            );
        }

        // Reference-cell variable.
        if let ResolvedTarget::Variable(id) = resolved.target {
            if let Some(cell) = ctx.cell_name(id) {
                let read = format!("{}.get()", cell);
                let value_text =
                    self.combined_value(op, op_method, &read, value, span, ctx)?;
                let set_call = format!("{}.set({})", cell, value_text);
                if as_statement {
                    return Ok(set_call);
                }
                if op.is_none() && Self::is_simple_expression(value) {
                    ctx.push_helper(format!("{};", set_call));
                    return Ok(value_text);
                }
                let tmp =
                    self.hoist_to_local(value_text, &value.semantic_type(), "tmp", ctx)?;
                ctx.push_helper(format!("{}.set({});", cell, tmp));
                return Ok(tmp);
            }
        }

        // Plain native variable or field.
        let write = self.generate_write_reference_parts(
            qualifier,
            name,
            resolved,
            op.is_some(),
            span,
            ctx,
        )?;
        let text = match op {
            None => {
                let value_text = self.generate_expression(value, ctx)?;
                format!("{} = {}", write, value_text)
            }
            Some(binop) => {
                if let Some(op_ref) = op_method {
                    let (_, method) = self.resolved_method(op_ref, span)?;
                    let value_text = self.generate_expression(value, ctx)?;
                    format!("{0} = {0}.{1}({2})", write, method.name, value_text)
                } else if let Some(token) = Self::compound_op_token(binop) {
                    let value_text = self.generate_expression(value, ctx)?;
                    format!("{} {} {}", write, token, value_text)
                } else {
                    let value_text = self.generate_expression(value, ctx)?;
                    format!(
                        "{0} = {0} {1} {2}",
                        write,
                        Self::binary_op_token(binop),
                        value_text
                    )
                }
            }
        };
        Ok(if as_statement {
            text
        } else {
            format!("({})", text)
        })
    }

    /// Receiver for a setter call: `(call prefix with trailing dot, receiver
    /// expression usable as a helper-method argument)`.
    fn assignment_receiver(
        &mut self,
        qualifier: Option<&Expression>,
        setter: &MethodDecl,
        needs_reuse: bool,
        span: &Span,
        ctx: &mut ExpressionContext,
    ) -> Result<(String, String), CodeGenError> {
        match qualifier {
            Some(expr) => {
                let mut text = self.generate_qualifier(expr, ctx)?;
                if needs_reuse && !Self::is_simple_expression(expr) {
                    text = self.hoist_to_local(text, &expr.semantic_type(), "tmp", ctx)?;
                }
                Ok((format!("{}.", text), text))
            }
            None => {
                if setter.is_static() {
                    let prefix = self.member_prefix(setter.owner, true, span, ctx)?;
                    Ok((prefix, String::new()))
                } else {
                    let prefix = self.member_prefix(setter.owner, false, span, ctx)?;
                    let receiver = self.self_ref_text(SelfKind::This, None, ctx);
                    Ok((prefix, receiver))
                }
            }
        }
    }

    /// Value expression of a property assignment: the plain right-hand side,
    /// or read-operate for compound operators.
    #[allow(clippy::too_many_arguments)]
    fn assignment_value(
        &mut self,
        op: Option<BinaryOp>,
        op_method: Option<&ResolvedRef>,
        read_resolution: &ResolvedRef,
        call_prefix: &str,
        value: &Expression,
        span: &Span,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        let Some(binop) = op else {
            return self.generate_expression(value, ctx);
        };
        let (_, getter) = self.resolved_method(read_resolution, span)?;
        let read = format!("{}{}()", call_prefix, getter.name);
        self.combined_value(Some(binop), op_method, &read, value, span, ctx)
    }

    fn combined_value(
        &mut self,
        op: Option<BinaryOp>,
        op_method: Option<&ResolvedRef>,
        read: &str,
        value: &Expression,
        span: &Span,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        let value_text = self.generate_expression(value, ctx)?;
        let Some(binop) = op else {
            return Ok(value_text);
        };
        if let Some(op_ref) = op_method {
            let (_, method) = self.resolved_method(op_ref, span)?;
            Ok(format!("{}.{}({})", read, method.name, value_text))
        } else {
            Ok(format!(
                "{} {} {}",
                read,
                Self::binary_op_token(binop),
                value_text
            ))
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn generate_dynamic_property_assignment(
        &mut self,
        qualifier: Option<&Expression>,
        property: &str,
        op: Option<BinaryOp>,
        op_method: Option<&ResolvedRef>,
        value: &Expression,
        span: &Span,
        ctx: &mut ExpressionContext,
        as_statement: bool,
    ) -> Result<String, CodeGenError> {
        self.caveat(
            format!("assignment to '{}' routed through setProperty", property),
            Some(span.clone()),
        );
        let prefix = match qualifier {
            Some(expr) => {
                let mut text = self.generate_qualifier(expr, ctx)?;
                if op.is_some() && !Self::is_simple_expression(expr) {
                    text = self.hoist_to_local(text, &expr.semantic_type(), "tmp", ctx)?;
                }
                format!("{}.", text)
            }
            None => String::new(),
        };
        let value_text = match op {
            None => self.generate_expression(value, ctx)?,
            Some(_) => {
                let read = format!("{}getProperty(\"{}\")", prefix, property);
                let Some(op_ref) = op_method else {
                    // Native operators do not apply to a dynamically typed
                    // property read.
                    return Err(CodeGenError::UnsupportedConstruct {
                        construct: format!(
                            "compound assignment to dynamic property '{}' without a resolved operator method",
                            property
                        ),
                        span: Some(span.clone()),
                    });
                };
                let (_, method) = self.resolved_method(op_ref, span)?;
                let rhs = self.generate_expression(value, ctx)?;
                format!("{}.{}({})", read, method.name, rhs)
            }
        };
        let call = format!("{}setProperty(\"{}\", {})", prefix, property, value_text);
        if as_statement {
            return Ok(call);
        }
        if op.is_none() && Self::is_simple_expression(value) {
            ctx.push_helper(format!("{};", call));
            return Ok(value_text);
        }
        let tmp = self.hoist_to_local(value_text, &value.semantic_type(), "tmp", ctx)?;
        ctx.push_helper(format!(
            "{}setProperty(\"{}\", {});",
            prefix, property, tmp
        ));
        Ok(tmp)
    }

    #[allow(clippy::too_many_arguments)]
    fn generate_index_assignment(
        &mut self,
        collection: &Expression,
        index: &Expression,
        read_ref: Option<&ResolvedRef>,
        op: Option<BinaryOp>,
        op_method: Option<&ResolvedRef>,
        write_ref: Option<&ResolvedRef>,
        value: &Expression,
        span: &Span,
        ctx: &mut ExpressionContext,
        as_statement: bool,
    ) -> Result<String, CodeGenError> {
        if let Some(put_ref) = write_ref {
            let (_, put) = self.resolved_method(put_ref, span)?;
            let mut collection_text = self.generate_expression(collection, ctx)?;
            collection_text = Self::parenthesized_operand(collection, collection_text);
            let mut index_text = self.generate_expression(index, ctx)?;
            if op.is_some() {
                if !Self::is_simple_expression(collection) {
                    collection_text = self.hoist_to_local(
                        collection_text,
                        &collection.semantic_type(),
                        "tmp",
                        ctx,
                    )?;
                }
                if !Self::is_simple_expression(index) {
                    index_text =
                        self.hoist_to_local(index_text, &index.semantic_type(), "tmp", ctx)?;
                }
            }
            let value_text = match op {
                None => self.generate_expression(value, ctx)?,
                Some(binop) => {
                    let Some(get_ref) = read_ref else {
                        return Err(CodeGenError::InternalInconsistency {
                            message: "compound index assignment without a read candidate"
                                .to_string(),
                            span: Some(span.clone()),
                        });
                    };
                    let (_, get) = self.resolved_method(get_ref, span)?;
                    let read = format!("{}.{}({})", collection_text, get.name, index_text);
                    self.combined_value(Some(binop), op_method, &read, value, span, ctx)?
                }
            };
            let put_call = format!(
                "{}.{}({}, {})",
                collection_text, put.name, index_text, value_text
            );
            if as_statement {
                return Ok(put_call);
            }
            if op.is_none() && Self::is_simple_expression(value) {
                ctx.push_helper(format!("{};", put_call));
                return Ok(value_text);
            }
            let tmp = self.hoist_to_local(value_text, &value.semantic_type(), "tmp", ctx)?;
            ctx.push_helper(format!(
                "{}.{}({}, {});",
                collection_text, put.name, index_text, tmp
            ));
            return Ok(tmp);
        }

        // Native array element assignment.
        let collection_text = self.generate_expression(collection, ctx)?;
        let index_text = self.generate_expression(index, ctx)?;
        let element = format!("{}[{}]", collection_text, index_text);
        let text = match op {
            None => {
                let value_text = self.generate_expression(value, ctx)?;
                format!("{} = {}", element, value_text)
            }
            Some(binop) => {
                let value_text = self.generate_expression(value, ctx)?;
                match Self::compound_op_token(binop) {
                    Some(token) => format!("{} {} {}", element, token, value_text),
                    None => format!(
                        "{0} = {0} {1} {2}",
                        element,
                        Self::binary_op_token(binop),
                        value_text
                    ),
                }
            }
        };
        Ok(if as_statement {
            text
        } else {
            format!("({})", text)
        })
    }

    /// Write-position text of a reference target: no cell unwrap and no
    /// getter rewriting.
    fn generate_write_reference(
        &mut self,
        target: &Expression,
        reuse_qualifier: bool,
        span: &Span,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        match target {
            Expression::Reference {
                qualifier,
                name,
                resolved,
                ..
            } => self.generate_write_reference_parts(
                qualifier.as_deref(),
                name,
                resolved,
                reuse_qualifier,
                span,
                ctx,
            ),
            _ => Err(CodeGenError::InternalInconsistency {
                message: "write target is not a reference".to_string(),
                span: Some(span.clone()),
            }),
        }
    }

    fn generate_write_reference_parts(
        &mut self,
        qualifier: Option<&Expression>,
        name: &str,
        resolved: &ResolvedRef,
        reuse_qualifier: bool,
        span: &Span,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        match &resolved.target {
            ResolvedTarget::Variable(id) => {
                let declared = self.decls.name_of(*id).unwrap_or(name);
                Ok(Self::safe_identifier(declared))
            }
            ResolvedTarget::Field(id) => {
                let field = self.decls.field(*id).cloned().ok_or_else(|| {
                    CodeGenError::InternalInconsistency {
                        message: format!("field id {:?} is not a field declaration", id),
                        span: Some(span.clone()),
                    }
                })?;
                let prefix = match qualifier {
                    Some(expr) => {
                        let mut text = self.generate_qualifier(expr, ctx)?;
                        if reuse_qualifier && !Self::is_simple_expression(expr) {
                            text =
                                self.hoist_to_local(text, &expr.semantic_type(), "tmp", ctx)?;
                        }
                        format!("{}.", text)
                    }
                    None => self.member_prefix(field.owner, field.is_static(), span, ctx)?,
                };
                Ok(format!("{}{}", prefix, Self::safe_identifier(&field.name)))
            }
            ResolvedTarget::Unresolved => match qualifier {
                Some(expr) => {
                    self.caveat(
                        format!("unresolved member '{}' rendered as a plain access", name),
                        Some(span.clone()),
                    );
                    let text = self.generate_qualifier(expr, ctx)?;
                    Ok(format!("{}.{}", text, Self::safe_identifier(name)))
                }
                None => Err(CodeGenError::InternalInconsistency {
                    message: format!("bare unresolved write target '{}'", name),
                    span: Some(span.clone()),
                }),
            },
            _ => Err(CodeGenError::InternalInconsistency {
                message: format!("'{}' is not writable", name),
                span: Some(span.clone()),
            }),
        }
    }

    // === Indexing, conditionals, truthiness ===

    fn generate_index_read(
        &mut self,
        collection: &Expression,
        index: &Expression,
        resolved: Option<&ResolvedRef>,
        span: &Span,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        let collection_text = self.generate_expression(collection, ctx)?;
        let collection_text = Self::parenthesized_operand(collection, collection_text);
        let index_text = self.generate_expression(index, ctx)?;
        match resolved {
            Some(get_ref) => {
                let (_, get) = self.resolved_method(get_ref, span)?;
                Ok(format!(
                    "{}.{}({})",
                    collection_text, get.name, index_text
                ))
            }
            None => Ok(format!("{}[{}]", collection_text, index_text)),
        }
    }

    fn generate_ternary(
        &mut self,
        condition: &Expression,
        then_expr: Option<&Expression>,
        else_expr: &Expression,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        match then_expr {
            Some(then_expr) => {
                let condition_text = self.render_condition(condition, ctx)?;
                let mut then_ctx = ctx.copy();
                let then_text = self.generate_expression(then_expr, &mut then_ctx)?;
                let mut else_ctx = ctx.copy();
                let else_text = self.generate_expression(else_expr, &mut else_ctx)?;
                Ok(format!(
                    "{} ? {} : {}",
                    condition_text, then_text, else_text
                ))
            }
            None => {
                // Elvis: hoist the subject so it is evaluated once, then
                // test its truthiness.
                let subject_type = condition.semantic_type();
                let text = self.generate_expression(condition, ctx)?;
                let subject = self.hoist_to_local(text, &subject_type, "tmp", ctx)?;
                let truth = Self::truthiness_text(&subject, &subject_type);
                let mut else_ctx = ctx.copy();
                let else_text = self.generate_expression(else_expr, &mut else_ctx)?;
                Ok(format!("({} ? {} : {})", truth, subject, else_text))
            }
        }
    }

    /// Condition rendering with the truthiness rewrite applied to
    /// non-boolean static types.
    pub(crate) fn render_condition(
        &mut self,
        expr: &Expression,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        let semantic_type = expr.semantic_type();
        if semantic_type.is_boolean() {
            return self.generate_expression(expr, ctx);
        }
        let text = self.generate_expression(expr, ctx)?;
        let subject = if Self::is_simple_expression(expr) {
            text
        } else {
            self.hoist_to_local(text, &semantic_type, "tmp", ctx)?
        };
        Ok(Self::truthiness_text(&subject, &semantic_type))
    }

    fn condition_operand(
        &mut self,
        expr: &Expression,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        let semantic_type = expr.semantic_type();
        let condition = self.render_condition(expr, ctx)?;
        if semantic_type.is_boolean() {
            Ok(Self::parenthesized_operand(expr, condition))
        } else {
            Ok(format!("({})", condition))
        }
    }

    pub(crate) fn truthiness_text(subject: &str, semantic_type: &SemanticType) -> String {
        match semantic_type {
            SemanticType::Primitive(kind) if kind.keyword() == "boolean" => subject.to_string(),
            SemanticType::Primitive(_) => format!("{} != 0", subject),
            SemanticType::Boxed(kind) if kind.keyword() == "boolean" => {
                format!("{0} != null && {0}.booleanValue()", subject)
            }
            _ => format!("{0} != null && {0}.asBoolean()", subject),
        }
    }

    // === Casts ===

    #[allow(clippy::too_many_arguments)]
    fn generate_cast(
        &mut self,
        operand: &Expression,
        target: &SemanticType,
        target_class: Option<DeclId>,
        safe: bool,
        conversion: Option<&ResolvedRef>,
        span: &Span,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        if let Expression::MapLiteral { entries, .. } = operand {
            if let Some(class_id) = target_class {
                let is_anonymous_target = self
                    .decls
                    .class(class_id)
                    .map(|decl| {
                        decl.kind == myna_ast::TypeKind::Interface || decl.modifiers.is_abstract
                    })
                    .unwrap_or(false);
                if is_anonymous_target {
                    return self.generate_anonymous_from_map(class_id, target, entries, span, ctx);
                }
            }
        }

        if safe {
            if let (Expression::ListLiteral { elements, .. }, SemanticType::Array(element)) =
                (operand, target)
            {
                let element_text = self.write_type(element)?;
                let rendered = self.render_arguments(elements, ctx)?;
                return Ok(format!("new {}[]{{{}}}", element_text, rendered));
            }
            if let Some(conversion_ref) = conversion {
                let (_, method) = self.resolved_method(conversion_ref, span)?;
                let text = self.generate_expression(operand, ctx)?;
                let text = Self::parenthesized_operand(operand, text);
                return Ok(format!("{}.{}()", text, method.name));
            }
        }

        let target_text = self.write_type(target)?;
        let text = self.generate_expression(operand, ctx)?;
        // Parenthesize operands the cast would otherwise capture only
        // partially; equality operands are the grammar-ambiguous case.
        let text = Self::parenthesized_operand(operand, text);
        Ok(format!("({}) {}", target_text, text))
    }

    // === Literals with structure ===

    fn generate_string_template(
        &mut self,
        parts: &[TemplatePart],
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        let has_interpolation = parts
            .iter()
            .any(|part| matches!(part, TemplatePart::Interpolation(_)));
        if !has_interpolation {
            let text: String = parts
                .iter()
                .map(|part| match part {
                    TemplatePart::Text(text) => text.as_str(),
                    TemplatePart::Interpolation(_) => "",
                })
                .collect();
            return Ok(format!("\"{}\"", Self::escape_string(&text)));
        }

        let mut format_string = String::new();
        let mut args = Vec::new();
        for part in parts {
            match part {
                TemplatePart::Text(text) => format_string.push_str(&Self::escape_format_text(text)),
                TemplatePart::Interpolation(expr) => {
                    format_string.push_str("%s");
                    args.push(self.generate_expression(expr, ctx)?);
                }
            }
        }
        Ok(format!(
            "String.format(\"{}\", {})",
            format_string,
            args.join(", ")
        ))
    }

    fn generate_list_literal(
        &mut self,
        elements: &[Expression],
        semantic_type: &SemanticType,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        // Array-context use renders an array initializer.
        if let SemanticType::Array(element) = semantic_type {
            let element_text = self.write_type(element)?;
            let rendered = self.render_arguments(elements, ctx)?;
            return Ok(format!("new {}[]{{{}}}", element_text, rendered));
        }

        let element_type = match semantic_type {
            SemanticType::Class { type_args, .. } if !type_args.is_empty() => {
                self.write_boxed_type(&type_args[0])?
            }
            _ => "Object".to_string(),
        };
        let array_list = self.add_import("java.util.ArrayList");
        if elements.is_empty() {
            return Ok(format!("new {}<{}>()", array_list, element_type));
        }
        let arrays = self.add_import("java.util.Arrays");
        let rendered = self.render_arguments(elements, ctx)?;
        Ok(format!(
            "new {}<{}>({}.asList({}))",
            array_list, element_type, arrays, rendered
        ))
    }

    /// Map literals cannot be expressed inline: declare a fresh map local
    /// sized by entry count, emit one put per entry, and use the local as
    /// the expression value.
    fn generate_map_literal(
        &mut self,
        entries: &[MapEntry],
        semantic_type: &SemanticType,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        let (key_type, value_type) = match semantic_type {
            SemanticType::Class { type_args, .. } if type_args.len() == 2 => (
                self.write_boxed_type(&type_args[0])?,
                self.write_boxed_type(&type_args[1])?,
            ),
            _ => ("Object".to_string(), "Object".to_string()),
        };
        let map_class = self.add_import("java.util.LinkedHashMap");
        let name = ctx.fresh_name("map");
        ctx.push_helper(format!(
            "final {0}<{1}, {2}> {3} = new {0}<{1}, {2}>({4});",
            map_class,
            key_type,
            value_type,
            name,
            entries.len()
        ));
        for entry in entries {
            let key_text = self.generate_expression(&entry.key, ctx)?;
            let value_text = self.generate_expression(&entry.value, ctx)?;
            ctx.push_helper(format!("{}.put({}, {});", name, key_text, value_text));
        }
        Ok(name)
    }

    /// Named-argument construction splits into a plain constructor call plus
    /// one write per named argument, in declaration order.
    fn generate_new(
        &mut self,
        class_type: &SemanticType,
        constructor: Option<&ResolvedRef>,
        args: &[Expression],
        initializers: &[FieldInitializer],
        span: &Span,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        let type_text = self.write_type(class_type)?;
        let rendered_args = self.render_call_arguments(args, constructor, ctx)?;
        let construction = format!("new {}({})", type_text, rendered_args);
        if initializers.is_empty() {
            return Ok(construction);
        }

        let base = match class_type {
            SemanticType::Class { name, .. } => {
                let simple = name.rsplit('.').next().unwrap_or(name);
                let mut chars = simple.chars();
                match chars.next() {
                    Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
                    None => "instance".to_string(),
                }
            }
            _ => "instance".to_string(),
        };
        let name = ctx.fresh_name(&base);
        ctx.push_helper(format!("final {} {} = {};", type_text, name, construction));

        for initializer in initializers {
            let value_text = self.generate_expression(&initializer.value, ctx)?;
            match initializer.write_ref.as_ref() {
                Some(write_ref) if write_ref.method_id().is_some() => {
                    let (_, setter) = self.resolved_method(write_ref, span)?;
                    ctx.push_helper(format!("{}.{}({});", name, setter.name, value_text));
                }
                Some(ResolvedRef {
                    target: ResolvedTarget::Field(id),
                    ..
                }) => {
                    let field_name = self
                        .decls
                        .name_of(*id)
                        .unwrap_or(&initializer.name)
                        .to_string();
                    ctx.push_helper(format!(
                        "{}.{} = {};",
                        name,
                        Self::safe_identifier(&field_name),
                        value_text
                    ));
                }
                _ => {
                    self.caveat(
                        format!(
                            "named argument '{}' routed through setProperty",
                            initializer.name
                        ),
                        Some(span.clone()),
                    );
                    ctx.push_helper(format!(
                        "{}.setProperty(\"{}\", {});",
                        name, initializer.name, value_text
                    ));
                }
            }
        }
        Ok(name)
    }
}
