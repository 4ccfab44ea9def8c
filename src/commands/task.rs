//! Implementation of the `promptbatch task` commands.

use super::{preview, read_text_file, update_project};
use crate::cli::{NameArgs, RenameArgs, TaskAddArgs, TaskTextArgs};
use promptbatch::error::Result;
use promptbatch::project::{Direction, Project};
use std::path::Path;

/// Width of the prompt preview in `task list`.
const PREVIEW_CHARS: usize = 50;

/// Execute `promptbatch task list`.
///
/// Prints one line per task in execution order:
/// position, enabled marker, name, and a prompt preview.
pub fn cmd_list(path: &Path) -> Result<()> {
    let project = Project::load(path)?;

    if project.tasks.is_empty() {
        eprintln!("No tasks.");
        return Ok(());
    }

    for (index, task) in project.tasks.iter().enumerate() {
        let marker = if task.enabled { "[x]" } else { "[ ]" };
        println!(
            "{:>3}. {} {}\t{}",
            index + 1,
            marker,
            task.name,
            preview(&task.prompt, PREVIEW_CHARS)
        );
    }

    let enabled = project.tasks.iter().filter(|t| t.enabled).count();
    eprintln!("{} task(s), {} enabled", project.tasks.len(), enabled);
    Ok(())
}

pub fn cmd_add(path: &Path, args: TaskAddArgs) -> Result<()> {
    let prompt = match &args.prompt_file {
        Some(file) => read_text_file(file)?,
        None => args.prompt.clone(),
    };

    let name = update_project(path, |project| {
        let name = project.add_task(args.name.as_deref(), &prompt)?.name.clone();
        if let Some(template) = &args.template {
            project.set_task_template(&name, template)?;
        }
        if args.disabled {
            project.set_task_enabled(&name, false)?;
        }
        Ok(name)
    })?;

    println!("Added task '{}'", name);
    Ok(())
}

pub fn cmd_copy(path: &Path, args: NameArgs) -> Result<()> {
    let copy = update_project(path, |project| {
        Ok(project.duplicate_task(&args.name)?.name.clone())
    })?;
    println!("Copied task '{}' to '{}'", args.name, copy);
    Ok(())
}

pub fn cmd_rename(path: &Path, args: RenameArgs) -> Result<()> {
    update_project(path, |project| project.rename_task(&args.name, &args.new_name))?;
    println!("Renamed task '{}' to '{}'", args.name, args.new_name);
    Ok(())
}

pub fn cmd_prompt(path: &Path, args: TaskTextArgs) -> Result<()> {
    let text = text_argument(&args)?;
    update_project(path, |project| project.set_task_prompt(&args.name, &text))?;
    println!("Updated prompt of task '{}'", args.name);
    Ok(())
}

pub fn cmd_template(path: &Path, args: TaskTextArgs) -> Result<()> {
    let text = text_argument(&args)?;
    update_project(path, |project| project.set_task_template(&args.name, &text))?;
    println!("Updated output template of task '{}'", args.name);
    Ok(())
}

fn text_argument(args: &TaskTextArgs) -> Result<String> {
    match (&args.file, &args.text) {
        (Some(file), _) => read_text_file(file),
        (None, Some(text)) => Ok(text.clone()),
        (None, None) => Ok(String::new()),
    }
}

pub fn cmd_rm(path: &Path, args: NameArgs) -> Result<()> {
    update_project(path, |project| project.remove_task(&args.name))?;
    println!("Removed task '{}'", args.name);
    Ok(())
}

pub fn cmd_move(path: &Path, args: NameArgs, direction: Direction) -> Result<()> {
    let moved = update_project(path, |project| project.move_task(&args.name, direction))?;
    if moved {
        let label = match direction {
            Direction::Up => "up",
            Direction::Down => "down",
        };
        println!("Moved task '{}' {}", args.name, label);
    } else {
        eprintln!("Task '{}' is already at the edge of the list", args.name);
    }
    Ok(())
}

pub fn cmd_enable(path: &Path, args: NameArgs, enabled: bool) -> Result<()> {
    update_project(path, |project| project.set_task_enabled(&args.name, enabled))?;
    let state = if enabled { "Enabled" } else { "Disabled" };
    println!("{} task '{}'", state, args.name);
    Ok(())
}

pub fn cmd_enable_all(path: &Path, enabled: bool) -> Result<()> {
    let changed = update_project(path, |project| Ok(project.set_all_tasks_enabled(enabled)))?;
    let state = if enabled { "Enabled" } else { "Disabled" };
    println!("{} {} task(s)", state, changed);
    Ok(())
}
