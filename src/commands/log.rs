//! Implementation of the `promptbatch log show` command.

use crate::cli::LogShowArgs;
use promptbatch::error::{PromptBatchError, Result};
use promptbatch::project::Project;
use promptbatch::run_log::latest_log;
use std::path::Path;

/// Print the most recent run log to stdout.
pub fn cmd_log_show(path: &Path, args: LogShowArgs) -> Result<()> {
    let dir = match args.log_dir {
        Some(dir) => dir,
        None => Project::load(path)?.settings.log_dir().ok_or_else(|| {
            PromptBatchError::UserError(
                "no log folder configured (set settings.log_folder or pass --log-dir)".to_string(),
            )
        })?,
    };

    let Some(log) = latest_log(&dir)? else {
        eprintln!("No run logs in {}", dir.display());
        return Ok(());
    };

    let content = std::fs::read_to_string(&log).map_err(|e| {
        PromptBatchError::Persistence(format!("failed to read log '{}': {}", log.display(), e))
    })?;
    eprintln!("{}", log.display());
    print!("{}", content);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_show_without_folder_is_user_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("workspace.json");
        Project::default().save(&path).unwrap();

        let err = cmd_log_show(&path, LogShowArgs { log_dir: None }).unwrap_err();
        assert!(matches!(err, PromptBatchError::UserError(_)));
    }

    #[test]
    fn test_log_show_empty_folder() {
        let temp_dir = TempDir::new().unwrap();
        let args = LogShowArgs {
            log_dir: Some(temp_dir.path().to_path_buf()),
        };
        cmd_log_show(&temp_dir.path().join("unused.json"), args).unwrap();
    }
}
