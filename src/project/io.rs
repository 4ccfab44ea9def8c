//! Loading, saving, and validating project files.

use super::Project;
use crate::error::{PromptBatchError, Result};
use crate::resolve::is_reserved;
use std::collections::HashSet;
use std::path::Path;

impl Project {
    /// Load a project file from disk and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PromptBatchError::Persistence(format!(
                "failed to read project file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_json(&content).map_err(|e| match e {
            PromptBatchError::Persistence(msg) => {
                PromptBatchError::Persistence(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// Load a project file, or return an empty project if it does not exist yet.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse a project from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let project: Project = serde_json::from_str(json).map_err(|e| {
            PromptBatchError::Persistence(format!("failed to parse project JSON: {}", e))
        })?;

        project.validate()?;
        Ok(project)
    }

    /// Serialize the project to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self).map_err(|e| {
            PromptBatchError::Persistence(format!("failed to serialize project: {}", e))
        })?;
        json.push('\n');
        Ok(json)
    }

    /// Atomically save the project to disk.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_json()?;
        crate::fs::atomic_write_file(path, &content)
    }

    /// Check name and id invariants.
    ///
    /// Validation rules:
    /// - variable names are unique and not reserved
    /// - task names are unique
    /// - ids are unique within each list
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for var in &self.variables {
            if is_reserved(&var.name) {
                return Err(PromptBatchError::UserError(format!(
                    "project validation failed: '{}' is a reserved name and cannot be used for a variable",
                    var.name
                )));
            }
            if !names.insert(var.name.as_str()) {
                return Err(PromptBatchError::UserError(format!(
                    "project validation failed: duplicate variable name '{}'",
                    var.name
                )));
            }
            if !ids.insert(var.id.as_str()) {
                return Err(PromptBatchError::UserError(format!(
                    "project validation failed: duplicate variable id '{}'",
                    var.id
                )));
            }
        }

        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for task in &self.tasks {
            if !names.insert(task.name.as_str()) {
                return Err(PromptBatchError::UserError(format!(
                    "project validation failed: duplicate task name '{}'",
                    task.name
                )));
            }
            if !ids.insert(task.id.as_str()) {
                return Err(PromptBatchError::UserError(format!(
                    "project validation failed: duplicate task id '{}'",
                    task.id
                )));
            }
        }

        Ok(())
    }
}
