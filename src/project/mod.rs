//! Project model for promptbatch.
//!
//! A project is a single JSON document holding the user's variables, the
//! ordered task list, and run settings:
//!
//! ```text
//! {
//!   "variables": [{"id": "...", "name": "GREETING", "value": "Hello"}],
//!   "tasks": [{"id": "...", "name": "t1", "prompt": "{GREETING} world",
//!              "output_template": "", "enabled": true}],
//!   "settings": {"model_name": "gemini-1.5-flash-latest", "output_folder": "output"}
//! }
//! ```
//!
//! List order is significant and preserved on every round trip. Unknown
//! settings keys are kept.

use crate::resolve::Resolver;
use serde::{Deserialize, Serialize};

mod io;
mod mutations;
mod settings;

pub use mutations::{DEFAULT_TASK_NAME, DEFAULT_VARIABLE_NAME, Direction, unique_name};
pub use settings::Settings;

/// Default project file name, relative to the working directory.
pub const DEFAULT_PROJECT_FILE: &str = "workspace.json";

/// A reusable text value referenced from prompts as `{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Opaque unique identifier.
    #[serde(default = "new_id")]
    pub id: String,
    /// Unique, case-sensitive name.
    pub name: String,
    /// Raw value; may itself contain placeholders.
    #[serde(default)]
    pub value: String,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One prompt to send to the generation API, producing one output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque unique identifier.
    #[serde(default = "new_id")]
    pub id: String,
    /// Unique name; resolved and sanitized into the output file name.
    pub name: String,
    /// Prompt text sent to the API after resolution.
    #[serde(default)]
    pub prompt: String,
    /// Output file template. Blank means `{RESPONSE}`.
    #[serde(default)]
    pub output_template: String,
    /// Disabled tasks are skipped by runs.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Task {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            prompt: prompt.into(),
            output_template: String::new(),
            enabled: true,
        }
    }

    /// Builder-style setter for the output template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.output_template = template.into();
        self
    }

    /// Builder-style setter for the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// The persisted project document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub variables: Vec<Variable>,
    pub tasks: Vec<Task>,
    pub settings: Settings,
}

impl Project {
    /// Snapshot the current variables into a resolver.
    pub fn resolver(&self) -> Resolver {
        Resolver::new(
            self.variables
                .iter()
                .map(|v| (v.name.clone(), v.value.clone())),
        )
    }

    /// Enabled tasks in list order, cloned.
    pub fn enabled_tasks(&self) -> Vec<Task> {
        self.tasks.iter().filter(|t| t.enabled).cloned().collect()
    }
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_enabled() -> bool {
    true
}
