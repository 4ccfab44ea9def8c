//! Run loop and background run handle.

use super::naming::output_path;
use super::{RunEvent, RunOutcome, RunPlan, RunReport, StopFlag};
use crate::error::{PromptBatchError, Result};
use crate::fs::{atomic_write_file, ensure_dir};
use crate::generate::{GenerateRequest, Generator};
use crate::project::Task;
use crate::resolve::{RESPONSE, Resolver, response_context};
use crate::run_log::{RunLog, actor};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

/// Forwards events to the caller and mirrors them into the run log.
struct Reporter<'a> {
    log: RunLog,
    sink: &'a mut dyn FnMut(RunEvent),
}

impl Reporter<'_> {
    fn emit(&mut self, event: RunEvent) {
        let warning = self.log.append(&event.to_string()).err().map(|e| RunEvent::Log {
            message: format!("warning: {}", e),
        });
        // The log disables itself after the first failure. `Finished` stays last.
        let finished = matches!(event, RunEvent::Finished { .. });
        if !finished {
            (self.sink)(event.clone());
        }
        if let Some(warning) = warning {
            (self.sink)(warning);
        }
        if finished {
            (self.sink)(event);
        }
    }
}

/// Execute a run plan on the current thread.
///
/// Events are delivered to `sink` in order; the last one is always
/// [`RunEvent::Finished`]. The first failing task ends the run.
pub fn execute(
    plan: &RunPlan,
    generator: &dyn Generator,
    stop: &StopFlag,
    sink: &mut dyn FnMut(RunEvent),
) -> RunReport {
    let mut reporter = Reporter {
        log: RunLog::new(plan.log_dir.clone()),
        sink,
    };

    let runnable: Vec<&Task> = plan.tasks.iter().filter(|t| t.enabled).collect();

    reporter.emit(RunEvent::Started {
        tasks: runnable.len(),
        model: plan.model.clone(),
        output_dir: plan.output_dir.clone(),
        actor: actor(),
    });

    let mut written = Vec::new();
    let mut outcome = RunOutcome::Completed;
    let mut error = None;

    if let Err(e) = ensure_dir(&plan.output_dir) {
        reporter.emit(RunEvent::Failed {
            task: None,
            message: e.to_string(),
        });
        outcome = RunOutcome::Failed;
        error = Some(e);
    } else {
        let resolver = Resolver::new(plan.variables.iter().cloned());

        for (index, task) in runnable.iter().enumerate() {
            if stop.is_stopped() {
                reporter.emit(RunEvent::Stopped {
                    remaining: runnable.len() - index,
                });
                outcome = RunOutcome::Stopped;
                break;
            }

            match run_task(plan, &resolver, generator, index, task, &mut reporter) {
                Ok(path) => {
                    reporter.emit(RunEvent::TaskCompleted {
                        index,
                        name: task.name.clone(),
                        path: path.clone(),
                    });
                    written.push(path);
                }
                Err(e) => {
                    reporter.emit(RunEvent::Failed {
                        task: Some(task.name.clone()),
                        message: e.to_string(),
                    });
                    outcome = RunOutcome::Failed;
                    error = Some(e);
                    break;
                }
            }
        }
    }

    reporter.emit(RunEvent::Finished {
        outcome,
        completed: written.len(),
    });

    RunReport {
        outcome,
        written,
        error,
        log_path: reporter.log.path().map(|p| p.to_path_buf()),
    }
}

fn run_task(
    plan: &RunPlan,
    resolver: &Resolver,
    generator: &dyn Generator,
    index: usize,
    task: &Task,
    reporter: &mut Reporter<'_>,
) -> Result<PathBuf> {
    let resolved_name = resolver.resolve(&task.name)?;
    reporter.emit(RunEvent::TaskStarted {
        index,
        name: task.name.clone(),
        resolved_name: resolved_name.clone(),
    });

    let prompt = resolver.resolve(&task.prompt)?;
    let request = GenerateRequest::new(prompt, plan.model.clone())
        .with_cached_content(plan.cached_content.clone());
    let response = generator.generate(&request)?;

    let placeholder = format!("{{{}}}", RESPONSE);
    let template = if task.output_template.trim().is_empty() {
        placeholder.as_str()
    } else {
        task.output_template.as_str()
    };
    let content = resolver.resolve_with_context(template, &response_context(response))?;

    let path = output_path(&plan.output_dir, &resolved_name, &plan.extension);
    atomic_write_file(&path, &content)?;
    Ok(path)
}

/// A run executing on a background thread.
pub struct RunHandle {
    stop: StopFlag,
    events: Receiver<RunEvent>,
    thread: JoinHandle<RunReport>,
}

impl RunHandle {
    /// Request that the run stop before its next task.
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Events emitted by the run. The channel closes when the run ends.
    pub fn events(&self) -> &Receiver<RunEvent> {
        &self.events
    }

    /// Wait for the run to end.
    pub fn join(self) -> RunReport {
        match self.thread.join() {
            Ok(report) => report,
            Err(_) => RunReport {
                outcome: RunOutcome::Failed,
                written: Vec::new(),
                error: Some(PromptBatchError::UserError(
                    "run thread panicked".to_string(),
                )),
                log_path: None,
            },
        }
    }
}

/// Start a run on a background thread.
pub fn spawn<G>(plan: RunPlan, generator: G) -> Result<RunHandle>
where
    G: Generator + 'static,
{
    let stop = StopFlag::new();
    let (tx, rx) = mpsc::channel();
    let thread_stop = stop.clone();

    let thread = thread::Builder::new()
        .name("promptbatch-run".to_string())
        .spawn(move || {
            let mut sink = |event: RunEvent| {
                // Receiver dropped means nobody is listening; keep running.
                let _ = tx.send(event);
            };
            execute(&plan, &generator, &thread_stop, &mut sink)
        })
        .map_err(|e| PromptBatchError::UserError(format!("failed to start run thread: {}", e)))?;

    Ok(RunHandle {
        stop,
        events: rx,
        thread,
    })
}
