//! Sequential task execution.
//!
//! A run takes a by-value [`RunPlan`] snapshot of the project and executes
//! its enabled tasks strictly in order:
//!
//! 1. Resolve the task name (file name) and prompt against the variables
//! 2. Send the prompt to the [`Generator`](crate::generate::Generator)
//! 3. Resolve the output template with `RESPONSE` bound to the response
//! 4. Write `<output_dir>/<sanitized name><ext>`
//!
//! The first error aborts the run; files written by earlier tasks stay on
//! disk. A [`StopFlag`] is checked before each task, so an in-flight
//! generation call always completes. Progress is reported as [`RunEvent`]s
//! and mirrored into the run log file.

mod naming;
mod runner;
#[cfg(test)]
mod tests;

pub use naming::{normalize_extension, output_path, sanitize_file_stem};
pub use runner::{RunHandle, execute, spawn};

use crate::error::PromptBatchError;
use crate::project::{Project, Task};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Everything a run needs, captured once at run start.
///
/// The executor never reads the live project, so edits made while a run is
/// in flight do not affect it.
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Variable `(name, value)` pairs.
    pub variables: Vec<(String, String)>,
    /// Tasks in execution order. Disabled tasks are skipped.
    pub tasks: Vec<Task>,
    pub output_dir: PathBuf,
    /// Output extension, with or without the leading dot.
    pub extension: String,
    /// Directory for the run log file; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub model: String,
    pub cached_content: Option<String>,
}

impl RunPlan {
    /// Snapshot a project's variables, enabled tasks, and settings.
    pub fn from_project(project: &Project) -> Self {
        let settings = &project.settings;
        Self {
            variables: project
                .variables
                .iter()
                .map(|v| (v.name.clone(), v.value.clone()))
                .collect(),
            tasks: project.enabled_tasks(),
            output_dir: PathBuf::from(&settings.output_folder),
            extension: settings.output_extension.clone(),
            log_dir: settings.log_dir(),
            model: settings.model_name.clone(),
            cached_content: settings.cached_content.clone(),
        }
    }

    /// Number of tasks that will actually run.
    pub fn runnable_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| t.enabled).count()
    }
}

/// Cooperative cancellation flag, checked between tasks.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the run stop before its next task.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every runnable task finished.
    Completed,
    /// The stop flag was observed before all tasks ran.
    Stopped,
    /// A task failed and the rest were skipped.
    Failed,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed => write!(f, "completed"),
            RunOutcome::Stopped => write!(f, "stopped"),
            RunOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// Progress notifications emitted during a run.
///
/// `Finished` is always the last event of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    Started {
        tasks: usize,
        model: String,
        output_dir: PathBuf,
        actor: String,
    },
    Log {
        message: String,
    },
    TaskStarted {
        index: usize,
        name: String,
        resolved_name: String,
    },
    TaskCompleted {
        index: usize,
        name: String,
        path: PathBuf,
    },
    Stopped {
        remaining: usize,
    },
    Failed {
        task: Option<String>,
        message: String,
    },
    Finished {
        outcome: RunOutcome,
        completed: usize,
    },
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunEvent::Started {
                tasks,
                model,
                output_dir,
                actor,
            } => write!(
                f,
                "run started by {}: {} task(s), model {}, output {}",
                actor,
                tasks,
                model,
                output_dir.display()
            ),
            RunEvent::Log { message } => write!(f, "{}", message),
            RunEvent::TaskStarted {
                name,
                resolved_name,
                ..
            } => write!(f, "[{}] task started (resolved name: {})", name, resolved_name),
            RunEvent::TaskCompleted { name, path, .. } => {
                write!(f, "[{}] saved {}", name, path.display())
            }
            RunEvent::Stopped { remaining } => {
                write!(f, "run stopped by request; {} task(s) not started", remaining)
            }
            RunEvent::Failed {
                task: Some(task),
                message,
            } => write!(f, "[{}] failed: {}", task, message),
            RunEvent::Failed {
                task: None,
                message,
            } => write!(f, "run failed: {}", message),
            RunEvent::Finished { outcome, completed } => {
                write!(f, "run finished ({}): {} file(s) written", outcome, completed)
            }
        }
    }
}

/// Summary returned when a run ends.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Output files written, in task order.
    pub written: Vec<PathBuf>,
    /// The error that ended a failed run.
    pub error: Option<PromptBatchError>,
    /// Run log file, if one was written.
    pub log_path: Option<PathBuf>,
}
