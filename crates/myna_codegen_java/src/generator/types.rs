use super::*;
use myna_ast::{PrimitiveKind, WildcardKind};

impl JavaCodeGenerator {
    /// Render a semantic type as Java type syntax.
    pub fn write_type(&mut self, semantic_type: &SemanticType) -> Result<String, CodeGenError> {
        self.write_type_internal(semantic_type, false)
    }

    /// Render a semantic type where Java requires a reference type
    /// (generic arguments, wildcard bounds, reference-cell payloads).
    pub fn write_boxed_type(
        &mut self,
        semantic_type: &SemanticType,
    ) -> Result<String, CodeGenError> {
        self.write_type_internal(semantic_type, true)
    }

    fn write_type_internal(
        &mut self,
        semantic_type: &SemanticType,
        boxed: bool,
    ) -> Result<String, CodeGenError> {
        Ok(match semantic_type {
            SemanticType::Primitive(kind) => {
                if boxed {
                    kind.boxed_name().to_string()
                } else {
                    kind.keyword().to_string()
                }
            }
            SemanticType::Boxed(kind) => kind.boxed_name().to_string(),
            SemanticType::Class { name, type_args } => {
                let base = self.class_type_name(name);
                if type_args.is_empty() {
                    base
                } else {
                    let mut rendered = Vec::new();
                    for arg in type_args {
                        rendered.push(self.write_type_internal(arg, true)?);
                    }
                    format!("{}<{}>", base, rendered.join(", "))
                }
            }
            SemanticType::Array(element) => {
                format!("{}[]", self.write_type_internal(element, false)?)
            }
            SemanticType::Wildcard { kind, bound } => match kind {
                WildcardKind::Unbounded => "?".to_string(),
                WildcardKind::Extends => {
                    let ty = match bound {
                        Some(inner) => self.write_type_internal(inner, true)?,
                        None => "Object".to_string(),
                    };
                    format!("? extends {}", ty)
                }
                WildcardKind::Super => {
                    let ty = match bound {
                        Some(inner) => self.write_type_internal(inner, true)?,
                        None => "Object".to_string(),
                    };
                    format!("? super {}", ty)
                }
            },
            SemanticType::Range(element) => self.range_type_name(element),
            SemanticType::Function { return_type, .. } => {
                let closure = self.runtime_class("Closure");
                let ret = self.write_type_internal(return_type, true)?;
                format!("{}<{}>", closure, ret)
            }
            SemanticType::Void => {
                if boxed {
                    "Void".to_string()
                } else {
                    "void".to_string()
                }
            }
            // Absent/null types default to the root object type.
            SemanticType::Null => "Object".to_string(),
        })
    }

    pub(crate) fn range_type_name(&mut self, element: &SemanticType) -> String {
        match element {
            SemanticType::Primitive(PrimitiveKind::Int) | SemanticType::Boxed(PrimitiveKind::Int) => {
                self.runtime_class("IntRange")
            }
            _ => self.runtime_class("ObjectRange"),
        }
    }

    /// Parameter type text; the lexically last parameter of a varargs method
    /// renders with an ellipsis instead of array syntax.
    pub(crate) fn write_parameter_type(
        &mut self,
        semantic_type: &SemanticType,
        ellipsis: bool,
    ) -> Result<String, CodeGenError> {
        if ellipsis {
            if let SemanticType::Array(element) = semantic_type {
                return Ok(format!("{}...", self.write_type(element)?));
            }
        }
        self.write_type(semantic_type)
    }

    fn class_type_name(&mut self, name: &str) -> String {
        if let Some(simple) = name.strip_prefix("java.lang.") {
            if !simple.contains('.') {
                return simple.to_string();
            }
        }
        if name.contains('.') {
            self.add_import(name)
        } else {
            name.to_string()
        }
    }
}
