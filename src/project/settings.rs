//! Run settings stored in the project file.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Settings for a run.
///
/// Every field has a default so older or hand-written project files load.
/// Keys this version does not know are kept in `extra` and written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// API key for the generation service. Empty means "use `GEMINI_API_KEY`".
    #[serde(default)]
    pub api_key: String,

    /// Model identifier, e.g. `gemini-1.5-flash-latest`.
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Directory that receives one output file per task.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Output file extension, with or without the leading dot.
    #[serde(default = "default_output_extension")]
    pub output_extension: String,

    /// Directory for run log files. Empty disables file logging.
    #[serde(default)]
    pub log_folder: String,

    /// Server-side cached content to attach to every request (`cachedContents/...`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_content: Option<String>,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model_name: default_model_name(),
            output_folder: default_output_folder(),
            output_extension: default_output_extension(),
            log_folder: String::new(),
            cached_content: None,
            extra: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// The log directory, if file logging is configured.
    pub fn log_dir(&self) -> Option<PathBuf> {
        let trimmed = self.log_folder.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }

    /// The API key, if one is stored in the project.
    pub fn api_key(&self) -> Option<&str> {
        let trimmed = self.api_key.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

pub(crate) fn default_model_name() -> String {
    "gemini-1.5-flash-latest".to_string()
}
pub(crate) fn default_output_folder() -> String {
    "output".to_string()
}
pub(crate) fn default_output_extension() -> String {
    ".md".to_string()
}
