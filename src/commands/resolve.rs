//! Implementation of the `promptbatch resolve` command.

use crate::cli::ResolveArgs;
use promptbatch::error::Result;
use promptbatch::project::Project;
use promptbatch::resolve::{Context, placeholders, response_context};
use std::collections::HashSet;
use std::path::Path;

/// Execute `promptbatch resolve`.
///
/// Prints the resolved text on stdout. Placeholders that survive resolution
/// (names that are neither variables nor bound context) are listed on stderr.
pub fn cmd_resolve(path: &Path, args: ResolveArgs) -> Result<()> {
    let project = Project::load(path)?;
    let resolved = resolve_text(&project, &args)?;

    println!("{}", resolved);

    let unknown = unresolved_names(&project, &args);
    if !unknown.is_empty() {
        eprintln!("Unknown placeholders left as-is: {}", unknown.join(", "));
    }
    Ok(())
}

fn context_for(args: &ResolveArgs) -> Context {
    args.response
        .as_ref()
        .map(|response| response_context(response.as_str()))
        .unwrap_or_default()
}

fn resolve_text(project: &Project, args: &ResolveArgs) -> Result<String> {
    let context = context_for(args);
    Ok(project
        .resolver()
        .resolve_with_context(&args.text, &context)?)
}

/// Names referenced from the input text that resolve to nothing.
fn unresolved_names(project: &Project, args: &ResolveArgs) -> Vec<String> {
    let context = context_for(args);
    let mut seen = HashSet::new();
    placeholders(&args.text)
        .into_iter()
        .filter(|name| project.variable(name).is_none() && !context.contains_key(name))
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
