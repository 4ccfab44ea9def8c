//! Editing operations on variables and tasks.
//!
//! Every operation keeps the project invariants: unique variable names that
//! are never reserved, unique task names, and a stable task order.

use super::{Project, Task, Variable, new_id};
use crate::error::{PromptBatchError, Result};
use crate::resolve::is_reserved;
use std::collections::HashSet;
use std::path::Path;

/// Base name for variables created without an explicit name.
pub const DEFAULT_VARIABLE_NAME: &str = "new variable";

/// Base name for tasks created without an explicit name.
pub const DEFAULT_TASK_NAME: &str = "new task";

const COPY_SUFFIX: &str = " (copy)";

/// Direction for reordering a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Return `base` if unused, otherwise the first free `"base (n)"` for n >= 2.
pub fn unique_name<'a, I>(base: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let existing: HashSet<&str> = existing.into_iter().collect();
    if !existing.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{} ({})", base, n))
        .find(|candidate| !existing.contains(candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}

fn validate_variable_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(PromptBatchError::UserError(
            "variable name must not be empty".to_string(),
        ));
    }
    if name.contains('{') || name.contains('}') {
        return Err(PromptBatchError::UserError(format!(
            "variable name '{}' must not contain '{{' or '}}'",
            name
        )));
    }
    if is_reserved(name) {
        return Err(PromptBatchError::UserError(format!(
            "'{}' is a reserved name and cannot be used for a variable",
            name
        )));
    }
    Ok(())
}

fn validate_task_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(PromptBatchError::UserError(
            "task name must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl Project {
    // =========================================================================
    // Variables
    // =========================================================================

    /// Look up a variable by name.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    fn variable_index(&self, name: &str) -> Result<usize> {
        self.variables
            .iter()
            .position(|v| v.name == name)
            .ok_or_else(|| PromptBatchError::UserError(format!("variable '{}' not found", name)))
    }

    /// Append a new variable with a unique name derived from `base`.
    pub fn add_variable(&mut self, base: Option<&str>, value: &str) -> Result<&Variable> {
        let base = base.unwrap_or(DEFAULT_VARIABLE_NAME);
        validate_variable_name(base)?;
        let name = unique_name(base, self.variables.iter().map(|v| v.name.as_str()));
        self.variables.push(Variable::new(name, value));
        Ok(&self.variables[self.variables.len() - 1])
    }

    /// Rename a variable. Fails if the new name is taken or invalid.
    pub fn rename_variable(&mut self, name: &str, new_name: &str) -> Result<()> {
        let index = self.variable_index(name)?;
        if name == new_name {
            return Ok(());
        }
        validate_variable_name(new_name)?;
        if self.variable(new_name).is_some() {
            return Err(PromptBatchError::UserError(format!(
                "variable name '{}' is already in use",
                new_name
            )));
        }
        self.variables[index].name = new_name.to_string();
        Ok(())
    }

    /// Replace a variable's value.
    pub fn set_variable_value(&mut self, name: &str, value: &str) -> Result<()> {
        let index = self.variable_index(name)?;
        self.variables[index].value = value.to_string();
        Ok(())
    }

    /// Replace a variable's value with the contents of a UTF-8 text file.
    pub fn load_variable_from_file<P: AsRef<Path>>(&mut self, name: &str, path: P) -> Result<()> {
        let path = path.as_ref();
        let index = self.variable_index(name)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            PromptBatchError::Persistence(format!(
                "failed to read variable file '{}': {}",
                path.display(),
                e
            ))
        })?;
        self.variables[index].value = content;
        Ok(())
    }

    /// Delete a variable and return it.
    pub fn remove_variable(&mut self, name: &str) -> Result<Variable> {
        let index = self.variable_index(name)?;
        Ok(self.variables.remove(index))
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    /// Look up a task by name.
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }

    fn task_index(&self, name: &str) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| PromptBatchError::UserError(format!("task '{}' not found", name)))
    }

    fn unique_task_name(&self, base: &str) -> String {
        unique_name(base, self.tasks.iter().map(|t| t.name.as_str()))
    }

    /// Append a new, enabled task with a unique name derived from `base`.
    pub fn add_task(&mut self, base: Option<&str>, prompt: &str) -> Result<&Task> {
        let base = base.unwrap_or(DEFAULT_TASK_NAME);
        validate_task_name(base)?;
        let name = self.unique_task_name(base);
        self.tasks.push(Task::new(name, prompt));
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// Copy a task and insert the copy directly after the original.
    ///
    /// The copy gets a fresh id and the name `"<name> (copy)"`, made unique.
    pub fn duplicate_task(&mut self, name: &str) -> Result<&Task> {
        let index = self.task_index(name)?;
        let original = &self.tasks[index];
        let copy = Task {
            id: new_id(),
            name: self.unique_task_name(&format!("{}{}", original.name, COPY_SUFFIX)),
            prompt: original.prompt.clone(),
            output_template: original.output_template.clone(),
            enabled: original.enabled,
        };
        self.tasks.insert(index + 1, copy);
        Ok(&self.tasks[index + 1])
    }

    /// Rename a task. Fails if the new name is taken or empty.
    pub fn rename_task(&mut self, name: &str, new_name: &str) -> Result<()> {
        let index = self.task_index(name)?;
        if name == new_name {
            return Ok(());
        }
        validate_task_name(new_name)?;
        if self.task(new_name).is_some() {
            return Err(PromptBatchError::UserError(format!(
                "task name '{}' is already in use",
                new_name
            )));
        }
        self.tasks[index].name = new_name.to_string();
        Ok(())
    }

    pub fn set_task_prompt(&mut self, name: &str, prompt: &str) -> Result<()> {
        let index = self.task_index(name)?;
        self.tasks[index].prompt = prompt.to_string();
        Ok(())
    }

    pub fn set_task_template(&mut self, name: &str, template: &str) -> Result<()> {
        let index = self.task_index(name)?;
        self.tasks[index].output_template = template.to_string();
        Ok(())
    }

    /// Delete a task and return it.
    pub fn remove_task(&mut self, name: &str) -> Result<Task> {
        let index = self.task_index(name)?;
        Ok(self.tasks.remove(index))
    }

    /// Swap a task with its neighbour. Returns false at the list edges.
    pub fn move_task(&mut self, name: &str, direction: Direction) -> Result<bool> {
        let index = self.task_index(name)?;
        let target = match direction {
            Direction::Up if index > 0 => index - 1,
            Direction::Down if index + 1 < self.tasks.len() => index + 1,
            _ => return Ok(false),
        };
        self.tasks.swap(index, target);
        Ok(true)
    }

    pub fn set_task_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        let index = self.task_index(name)?;
        self.tasks[index].enabled = enabled;
        Ok(())
    }

    /// Enable or disable every task. Returns the number of tasks changed.
    pub fn set_all_tasks_enabled(&mut self, enabled: bool) -> usize {
        let mut changed = 0;
        for task in self.tasks.iter_mut().filter(|t| t.enabled != enabled) {
            task.enabled = enabled;
            changed += 1;
        }
        changed
    }
}
