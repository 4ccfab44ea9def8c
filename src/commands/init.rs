//! Implementation of the `promptbatch init` command.

use promptbatch::error::Result;
use promptbatch::project::Project;
use std::path::Path;

/// Execute the `promptbatch init` command.
///
/// Idempotent: an existing project file is validated and left untouched.
pub fn cmd_init(path: &Path) -> Result<()> {
    if path.exists() {
        let project = Project::load(path)?;
        println!(
            "Project already initialized: {} ({} variable(s), {} task(s))",
            path.display(),
            project.variables.len(),
            project.tasks.len()
        );
        return Ok(());
    }

    Project::load_or_default(path)?.save(path)?;
    println!("Initialized empty project: {}", path.display());
    Ok(())
}
