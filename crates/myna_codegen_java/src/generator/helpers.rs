use super::*;
use myna_ast::{Modifiers, SelfKind, Visibility};
use once_cell::sync::Lazy;
use std::collections::HashSet;

static JAVA_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class",
        "const", "continue", "default", "do", "double", "else", "enum", "extends", "final",
        "finally", "float", "for", "goto", "if", "implements", "import", "instanceof", "int",
        "interface", "long", "native", "new", "package", "private", "protected", "public",
        "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this",
        "throw", "throws", "transient", "try", "void", "volatile", "while", "true", "false",
        "null",
    ]
    .into_iter()
    .collect()
});

pub fn is_java_keyword(name: &str) -> bool {
    JAVA_KEYWORDS.contains(name)
}

impl JavaCodeGenerator {
    /// Identifier usable in Java output; reserved words get a trailing
    /// underscore.
    pub(crate) fn safe_identifier(name: &str) -> String {
        if is_java_keyword(name) {
            format!("{}_", name)
        } else {
            name.to_string()
        }
    }

    pub(crate) fn literal_to_string(literal: &Literal) -> String {
        match literal {
            // Every myna quoting form renders as one canonical double-quoted
            // Java literal.
            Literal::String { value, .. } => format!("\"{}\"", Self::escape_string(value)),
            Literal::Number(value) => value.clone(),
            Literal::Boolean(value) => value.to_string(),
            Literal::Null => "null".to_string(),
            Literal::Character(value) => {
                let escaped = match value {
                    '\\' => "\\\\".to_string(),
                    '\n' => "\\n".to_string(),
                    '\r' => "\\r".to_string(),
                    '\t' => "\\t".to_string(),
                    '\'' => "\\'".to_string(),
                    ch => ch.to_string(),
                };
                format!("'{}'", escaped)
            }
        }
    }

    pub(crate) fn escape_string(value: &str) -> String {
        value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    /// Escape literal text for use inside a `String.format` pattern.
    pub(crate) fn escape_format_text(value: &str) -> String {
        Self::escape_string(&value.replace('%', "%%"))
    }

    pub(crate) fn binary_op_token(op: BinaryOp) -> &'static str {
        match op {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::LeftShift => "<<",
            BinaryOp::RightShift => ">>",
        }
    }

    pub(crate) fn compound_op_token(op: BinaryOp) -> Option<&'static str> {
        match op {
            BinaryOp::Add => Some("+="),
            BinaryOp::Subtract => Some("-="),
            BinaryOp::Multiply => Some("*="),
            BinaryOp::Divide => Some("/="),
            BinaryOp::Modulo => Some("%="),
            BinaryOp::BitAnd => Some("&="),
            BinaryOp::BitOr => Some("|="),
            BinaryOp::BitXor => Some("^="),
            BinaryOp::LeftShift => Some("<<="),
            BinaryOp::RightShift => Some(">>="),
            _ => None,
        }
    }

    pub(crate) fn modifiers_text(modifiers: &Modifiers) -> String {
        let mut parts = Vec::new();
        match modifiers.visibility {
            Visibility::Public => parts.push("public"),
            Visibility::Protected => parts.push("protected"),
            Visibility::Private => parts.push("private"),
            Visibility::Package => {}
        }
        if modifiers.is_abstract {
            parts.push("abstract");
        }
        if modifiers.is_static {
            parts.push("static");
        }
        if modifiers.is_final {
            parts.push("final");
        }
        parts.join(" ")
    }

    pub(crate) fn push_lines(builder: &mut JavaSourceBuilder, text: &str) {
        for line in text.lines() {
            builder.push_line(line);
        }
    }

    /// Expressions cheap and side-effect-free enough to repeat in output
    /// text without hoisting into a local.
    pub(crate) fn is_simple_expression(expr: &Expression) -> bool {
        match expr {
            Expression::Literal { .. } | Expression::SelfRef { .. } => true,
            Expression::Reference {
                qualifier: None,
                null_safe: false,
                ..
            } => true,
            Expression::Parenthesized { inner, .. } => Self::is_simple_expression(inner),
            _ => false,
        }
    }

    /// Operand text with parentheses added when embedding it as a method
    /// receiver or unary operand would change how the output parses.
    pub(crate) fn parenthesized_operand(expr: &Expression, text: String) -> String {
        match expr {
            Expression::Binary { .. }
            | Expression::Ternary { .. }
            | Expression::Assignment { .. }
            | Expression::Cast { .. }
            | Expression::TypeCheck { .. } => format!("({})", text),
            _ => text,
        }
    }

    pub(crate) fn self_ref_text(
        &self,
        kind: SelfKind,
        qualifier: Option<&str>,
        ctx: &ExpressionContext,
    ) -> String {
        let keyword = match kind {
            SelfKind::This => "this",
            SelfKind::Super => "super",
        };
        if let Some(name) = qualifier {
            return format!("{}.{}", name, keyword);
        }
        // Inside a synthesized closure/anonymous body a bare `this` binds to
        // the synthetic class; qualify it back onto the converted class.
        if ctx.in_synthetic_scope() {
            if let Some(class) = ctx.containing_class() {
                if let Some(decl) = self.decls.class(class) {
                    return format!("{}.{}", decl.name, keyword);
                }
            }
        }
        keyword.to_string()
    }
}
