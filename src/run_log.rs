//! Append-only run log files.
//!
//! Each run writes to its own file, `log_<YYYY-MM-DD_HH-MM-SS>.txt`, inside
//! the configured log directory. The file is created lazily on the first
//! message. Every line has the form:
//!
//! ```text
//! 14:03:27 - [t1] task started (resolved name: t1)
//! ```
//!
//! Log files are observational only; nothing reads them back except
//! `promptbatch log show`.

use crate::error::{PromptBatchError, Result};
use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const LOG_PREFIX: &str = "log_";
const LOG_SUFFIX: &str = ".txt";

/// Log file writer for one run.
#[derive(Debug)]
pub struct RunLog {
    dir: Option<PathBuf>,
    started: DateTime<Local>,
    path: Option<PathBuf>,
}

impl RunLog {
    /// A log that writes into `dir`, or discards everything when `None`.
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self::starting_at(dir, Local::now())
    }

    pub(crate) fn starting_at(dir: Option<PathBuf>, started: DateTime<Local>) -> Self {
        Self {
            dir,
            started,
            path: None,
        }
    }

    /// Path of the log file, once it has been created.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[cfg(test)]
    fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    /// Append one timestamped line.
    ///
    /// If the log directory or file cannot be written, file logging is
    /// switched off for the rest of the run and the error is returned once.
    pub fn append(&mut self, message: &str) -> Result<()> {
        let Some(dir) = self.dir.clone() else {
            return Ok(());
        };

        let path = match &self.path {
            Some(path) => path.clone(),
            None => {
                if let Err(e) = fs::create_dir_all(&dir) {
                    self.dir = None;
                    return Err(PromptBatchError::Persistence(format!(
                        "failed to create log directory '{}': {}",
                        dir.display(),
                        e
                    )));
                }
                let path = dir.join(log_file_name(&self.started));
                self.path = Some(path.clone());
                path
            }
        };

        let result = append_line(&path, &format_line(&Local::now(), message));
        if result.is_err() {
            self.dir = None;
        }
        result
    }
}

/// File name for a run that started at `started`.
pub fn log_file_name(started: &DateTime<Local>) -> String {
    format!(
        "{}{}{}",
        LOG_PREFIX,
        started.format("%Y-%m-%d_%H-%M-%S"),
        LOG_SUFFIX
    )
}

fn format_line(at: &DateTime<Local>, message: &str) -> String {
    format!("{} - {}", at.format("%H:%M:%S"), message)
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            PromptBatchError::Persistence(format!(
                "failed to open log file '{}': {}",
                path.display(),
                e
            ))
        })?;

    writeln!(file, "{}", line).map_err(|e| {
        PromptBatchError::Persistence(format!(
            "failed to write to log file '{}': {}",
            path.display(),
            e
        ))
    })
}

/// The most recent run log in `dir`, if any.
///
/// Log names embed a sortable timestamp, so the newest is the last by name.
pub fn latest_log<P: AsRef<Path>>(dir: P) -> Result<Option<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Ok(None);
    }

    let entries = fs::read_dir(dir).map_err(|e| {
        PromptBatchError::Persistence(format!(
            "failed to read log directory '{}': {}",
            dir.display(),
            e
        ))
    })?;

    let latest = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(LOG_PREFIX) && n.ends_with(LOG_SUFFIX))
        })
        .max();

    Ok(latest)
}

/// Actor string recorded at the top of each run log (`user@HOST`).
pub fn actor() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_start() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 1, 9, 5, 7).unwrap()
    }

    #[test]
    fn test_log_file_name() {
        assert_eq!(log_file_name(&fixed_start()), "log_2024-06-01_09-05-07.txt");
    }

    #[test]
    fn test_format_line() {
        assert_eq!(format_line(&fixed_start(), "hello"), "09:05:07 - hello");
    }

    #[test]
    fn test_append_creates_directory_and_file_lazily() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("logs");
        let mut log = RunLog::starting_at(Some(dir.clone()), fixed_start());

        assert!(!dir.exists());
        assert!(log.path().is_none());

        log.append("line 1").unwrap();
        log.append("line 2").unwrap();

        let path = log.path().unwrap().to_path_buf();
        assert_eq!(path, dir.join("log_2024-06-01_09-05-07.txt"));
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - line 1"));
        assert!(lines[1].ends_with(" - line 2"));
    }

    #[test]
    fn test_disabled_log_writes_nothing() {
        let mut log = RunLog::new(None);
        assert!(!log.is_enabled());
        log.append("ignored").unwrap();
        assert!(log.path().is_none());
    }

    #[test]
    fn test_uncreatable_directory_disables_logging() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let mut log = RunLog::new(Some(blocker.join("logs")));
        assert!(log.append("first").is_err());
        assert!(!log.is_enabled());
        log.append("second").unwrap();
    }

    #[test]
    fn test_latest_log() {
        let temp_dir = TempDir::new().unwrap();
        assert!(latest_log(temp_dir.path()).unwrap().is_none());
        assert!(latest_log(temp_dir.path().join("missing")).unwrap().is_none());

        for name in [
            "log_2024-06-01_09-05-07.txt",
            "log_2024-06-02_08-00-00.txt",
            "notes.txt",
            "log_2024-05-30_23-59-59.txt",
        ] {
            fs::write(temp_dir.path().join(name), "x").unwrap();
        }

        let latest = latest_log(temp_dir.path()).unwrap().unwrap();
        assert_eq!(
            latest.file_name().unwrap().to_str().unwrap(),
            "log_2024-06-02_08-00-00.txt"
        );
    }

    #[test]
    fn test_actor_has_user_and_host() {
        assert!(actor().contains('@'));
    }
}
