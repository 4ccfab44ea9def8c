//! Output file naming.

use std::path::{Path, PathBuf};

/// Fallback file stem when a task name resolves to nothing.
const UNTITLED: &str = "untitled";

/// Make a resolved task name safe for use as a file stem.
///
/// Alphanumeric characters (any script), spaces, `-`, and `_` are kept;
/// everything else becomes `_`.
pub fn sanitize_file_stem(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim().is_empty() {
        UNTITLED.to_string()
    } else {
        sanitized
    }
}

/// Normalize an extension to start with `.`. Empty means no extension.
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim();
    if ext.is_empty() || ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    }
}

/// Path of the output file for a resolved task name.
///
/// Format: `{output_dir}/{sanitized name}{.ext}`
pub fn output_path(output_dir: &Path, resolved_name: &str, extension: &str) -> PathBuf {
    output_dir.join(format!(
        "{}{}",
        sanitize_file_stem(resolved_name),
        normalize_extension(extension)
    ))
}
