//! Implementation of the `promptbatch var` commands.

use super::{preview, update_project};
use crate::cli::{NameArgs, RenameArgs, VarAddArgs, VarListArgs, VarLoadArgs, VarSetArgs};
use promptbatch::error::Result;
use promptbatch::project::Project;
use std::path::Path;

/// Width of the value preview in `var list`.
const PREVIEW_CHARS: usize = 60;

pub fn cmd_list(path: &Path, args: VarListArgs) -> Result<()> {
    let project = Project::load(path)?;

    if project.variables.is_empty() {
        eprintln!("No variables.");
        return Ok(());
    }

    for variable in &project.variables {
        if args.values {
            println!("{}:", variable.name);
            for line in variable.value.lines() {
                println!("  {}", line);
            }
        } else {
            println!("{}\t{}", variable.name, preview(&variable.value, PREVIEW_CHARS));
        }
    }
    Ok(())
}

pub fn cmd_add(path: &Path, args: VarAddArgs) -> Result<()> {
    let name = update_project(path, |project| {
        Ok(project
            .add_variable(args.name.as_deref(), &args.value)?
            .name
            .clone())
    })?;
    println!("Added variable '{}'", name);
    Ok(())
}

pub fn cmd_rename(path: &Path, args: RenameArgs) -> Result<()> {
    update_project(path, |project| project.rename_variable(&args.name, &args.new_name))?;
    println!("Renamed variable '{}' to '{}'", args.name, args.new_name);
    Ok(())
}

pub fn cmd_set(path: &Path, args: VarSetArgs) -> Result<()> {
    update_project(path, |project| project.set_variable_value(&args.name, &args.value))?;
    println!("Updated variable '{}'", args.name);
    Ok(())
}

pub fn cmd_load(path: &Path, args: VarLoadArgs) -> Result<()> {
    update_project(path, |project| {
        project.load_variable_from_file(&args.name, &args.file)
    })?;
    println!(
        "Loaded variable '{}' from {}",
        args.name,
        args.file.display()
    );
    Ok(())
}

pub fn cmd_rm(path: &Path, args: NameArgs) -> Result<()> {
    update_project(path, |project| project.remove_variable(&args.name))?;
    println!("Removed variable '{}'", args.name);
    Ok(())
}
