use serde::{Deserialize, Serialize};

/// Configuration options that drive Java code generation behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeGenConfig {
    /// Indentation string used when pretty-printing generated Java.
    pub indent: String,
    /// Class name used when a script unit does not name its own wrapper.
    pub script_main_class: String,
    /// Package holding the myna runtime support classes.
    pub runtime_package: String,
}

impl Default for CodeGenConfig {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
            script_main_class: "Main".to_string(),
            runtime_package: "myna.runtime".to_string(),
        }
    }
}
