use super::*;

impl JavaCodeGenerator {
    /// Render a plain comma-separated argument list.
    pub(crate) fn render_arguments(
        &mut self,
        args: &[Expression],
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        let mut rendered = Vec::new();
        for arg in args {
            rendered.push(self.generate_expression(arg, ctx)?);
        }
        Ok(rendered.join(", "))
    }

    /// Render an argument list against a resolved call signature, wrapping
    /// trailing arguments into an array when the callee is varargs and the
    /// call shape does not already match.
    pub(crate) fn render_call_arguments(
        &mut self,
        args: &[Expression],
        resolved: Option<&ResolvedRef>,
        ctx: &mut ExpressionContext,
    ) -> Result<String, CodeGenError> {
        let Some(resolved) = resolved else {
            return self.render_arguments(args, ctx);
        };
        let Some(method_id) = resolved.method_id() else {
            return self.render_arguments(args, ctx);
        };
        let Some(method) = self.decls.method(method_id).cloned() else {
            return self.render_arguments(args, ctx);
        };

        if !method.is_varargs || method.parameters.is_empty() {
            return self.render_arguments(args, ctx);
        }

        let fixed = method.parameters.len() - 1;
        if fixed > args.len() {
            return self.render_arguments(args, ctx);
        }

        // One trailing argument that is already an array passes through.
        if args.len() == method.parameters.len() {
            if let Some(last) = args.last() {
                if last.semantic_type().is_array() {
                    return self.render_arguments(args, ctx);
                }
            }
        }

        let mut rendered = Vec::new();
        for arg in &args[..fixed] {
            rendered.push(self.generate_expression(arg, ctx)?);
        }

        let variadic_type = self
            .provider()
            .parameter_type(method_id, fixed)
            .substitute(&resolved.substitution);
        let element_type = match variadic_type.element_type() {
            Some(element) => element.clone(),
            None => SemanticType::object(),
        };
        let element_text = self.write_type(&element_type)?;

        let mut tail = Vec::new();
        for arg in &args[fixed..] {
            tail.push(self.generate_expression(arg, ctx)?);
        }
        rendered.push(format!("new {}[]{{{}}}", element_text, tail.join(", ")));

        Ok(rendered.join(", "))
    }
}
