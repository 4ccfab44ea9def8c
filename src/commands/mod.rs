//! Command implementations for promptbatch.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Every command receives the project file path; commands
//! that change the project load it, apply the change, and save it back
//! atomically before returning.

mod cache;
mod init;
mod log;
mod resolve;
mod run;
mod task;
mod var;

use crate::cli::{CacheCommand, Cli, Command, LogCommand, TaskCommand, VarCommand};
use promptbatch::error::{PromptBatchError, Result};
use promptbatch::project::{Direction, Project};
use std::path::Path;

/// Dispatch a command to its implementation.
pub fn dispatch(cli: Cli) -> Result<()> {
    let project = cli.project.as_path();
    match cli.command {
        Command::Init => init::cmd_init(project),
        Command::Var(cmd) => dispatch_var(project, cmd),
        Command::Task(cmd) => dispatch_task(project, cmd),
        Command::Resolve(args) => resolve::cmd_resolve(project, args),
        Command::Run(args) => run::cmd_run(project, args),
        Command::Cache(cmd) => dispatch_cache(project, cmd),
        Command::Log(LogCommand::Show(args)) => log::cmd_log_show(project, args),
    }
}

fn dispatch_var(project: &Path, cmd: VarCommand) -> Result<()> {
    match cmd {
        VarCommand::List(args) => var::cmd_list(project, args),
        VarCommand::Add(args) => var::cmd_add(project, args),
        VarCommand::Rename(args) => var::cmd_rename(project, args),
        VarCommand::Set(args) => var::cmd_set(project, args),
        VarCommand::Load(args) => var::cmd_load(project, args),
        VarCommand::Rm(args) => var::cmd_rm(project, args),
    }
}

fn dispatch_task(project: &Path, cmd: TaskCommand) -> Result<()> {
    match cmd {
        TaskCommand::List => task::cmd_list(project),
        TaskCommand::Add(args) => task::cmd_add(project, args),
        TaskCommand::Copy(args) => task::cmd_copy(project, args),
        TaskCommand::Rename(args) => task::cmd_rename(project, args),
        TaskCommand::Prompt(args) => task::cmd_prompt(project, args),
        TaskCommand::Template(args) => task::cmd_template(project, args),
        TaskCommand::Rm(args) => task::cmd_rm(project, args),
        TaskCommand::Up(args) => task::cmd_move(project, args, Direction::Up),
        TaskCommand::Down(args) => task::cmd_move(project, args, Direction::Down),
        TaskCommand::Enable(args) => task::cmd_enable(project, args, true),
        TaskCommand::Disable(args) => task::cmd_enable(project, args, false),
        TaskCommand::EnableAll => task::cmd_enable_all(project, true),
        TaskCommand::DisableAll => task::cmd_enable_all(project, false),
    }
}

fn dispatch_cache(project: &Path, cmd: CacheCommand) -> Result<()> {
    match cmd {
        CacheCommand::List => cache::cmd_list(project),
        CacheCommand::Show(args) => cache::cmd_show(project, args),
        CacheCommand::Create(args) => cache::cmd_create(project, args),
        CacheCommand::Ttl(args) => cache::cmd_ttl(project, args),
        CacheCommand::Rm(args) => cache::cmd_rm(project, args),
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Load the project, apply `change`, and save it.
fn update_project<T>(path: &Path, change: impl FnOnce(&mut Project) -> Result<T>) -> Result<T> {
    let mut project = Project::load(path)?;
    let value = change(&mut project)?;
    project.save(path)?;
    Ok(value)
}

/// Read a UTF-8 text file given on the command line.
fn read_text_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        PromptBatchError::UserError(format!("failed to read '{}': {}", path.display(), e))
    })
}

/// One-line preview of a possibly long, multi-line value.
fn preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("");
    let truncated: String = first_line.chars().take(max_chars).collect();
    if truncated.len() < first_line.len() || text.lines().nth(1).is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("a long value here", 6), "a long...");
        assert_eq!(preview("line one\nline two", 40), "line one...");
        assert_eq!(preview("", 10), "");
    }

    #[test]
    fn test_update_project_saves_change() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("workspace.json");
        Project::default().save(&path).unwrap();

        update_project(&path, |project| {
            project.add_variable(Some("X"), "1")?;
            Ok(())
        })
        .unwrap();

        let project = Project::load(&path).unwrap();
        assert_eq!(project.variable("X").unwrap().value, "1");
    }

    #[test]
    fn test_update_project_failure_leaves_file_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("workspace.json");
        Project::default().save(&path).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let result = update_project(&path, |project| project.remove_variable("missing"));
        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_missing_project_is_persistence_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = update_project(&temp_dir.path().join("none.json"), |_| Ok(())).unwrap_err();
        assert!(matches!(err, PromptBatchError::Persistence(_)));
    }
}
