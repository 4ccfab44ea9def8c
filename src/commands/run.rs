//! Implementation of the `promptbatch run` command.
//!
//! Builds a run plan from the project, applies command line overrides, and
//! executes it on a background thread while streaming events:
//!
//! - Human-readable progress goes to stderr
//! - With `--json`, each event is also printed to stdout as one JSON line
//!
//! The command fails with the error of the failing task, so the exit code
//! tells resolution, generation, and persistence failures apart.
//!
//! The first Ctrl-C sets the run's stop flag: the in-flight task finishes and
//! no further task starts. A second Ctrl-C exits immediately.

use crate::cli::RunArgs;
use promptbatch::error::{PromptBatchError, Result};
use promptbatch::executor::{RunEvent, RunOutcome, RunPlan, RunReport, StopFlag, spawn};
use promptbatch::exit_codes;
use promptbatch::generate::{EchoGenerator, GeminiClient};
use promptbatch::project::Project;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

/// Stop flag of the run the interrupt handler controls.
static ACTIVE_RUN: Mutex<Option<StopFlag>> = Mutex::new(None);

/// The process-wide Ctrl-C handler can only be installed once.
static INTERRUPT_HANDLER: OnceLock<std::result::Result<(), String>> = OnceLock::new();

/// Execute the `promptbatch run` command.
pub fn cmd_run(path: &Path, args: RunArgs) -> Result<()> {
    let project = Project::load(path)?;
    let plan = build_plan(&project, &args);

    if plan.runnable_tasks() == 0 {
        eprintln!("No enabled tasks to run.");
        return Ok(());
    }

    let handle = if args.dry_run {
        eprintln!("Dry run: prompts are written instead of generated.");
        spawn(plan, EchoGenerator)?
    } else {
        let client = GeminiClient::from_settings(&project.settings)?;
        spawn(plan, client)?
    };

    watch_interrupts(handle.stop_flag());
    for event in handle.events() {
        print_event(&event, args.json);
    }
    let report = handle.join();
    unwatch_interrupts();

    finish(report)
}

/// Route Ctrl-C to `flag` until [`unwatch_interrupts`] is called.
fn watch_interrupts(flag: StopFlag) {
    if let Ok(mut active) = ACTIVE_RUN.lock() {
        *active = Some(flag);
    }

    let installed = INTERRUPT_HANDLER
        .get_or_init(|| ctrlc::set_handler(on_interrupt).map_err(|e| e.to_string()));
    if let Err(e) = installed {
        eprintln!("Warning: Ctrl-C will not stop the run: {}", e);
    }
}

fn unwatch_interrupts() {
    if let Ok(mut active) = ACTIVE_RUN.lock() {
        *active = None;
    }
}

/// Stop the active run. Returns `false` when there is no run to stop or it
/// is already stopping.
fn request_stop() -> bool {
    let Ok(active) = ACTIVE_RUN.lock() else {
        return false;
    };
    match active.as_ref() {
        Some(flag) if !flag.is_stopped() => {
            flag.stop();
            true
        }
        _ => false,
    }
}

fn on_interrupt() {
    if request_stop() {
        eprintln!("Stopping after the current task. Press Ctrl-C again to abort.");
    } else {
        std::process::exit(exit_codes::INTERRUPTED);
    }
}

/// Snapshot the project and apply command line overrides.
fn build_plan(project: &Project, args: &RunArgs) -> RunPlan {
    let mut plan = RunPlan::from_project(project);
    if let Some(model) = &args.model {
        plan.model = model.clone();
    }
    if let Some(output) = &args.output {
        plan.output_dir = output.clone();
    }
    if let Some(ext) = &args.ext {
        plan.extension = ext.clone();
    }
    if let Some(log_dir) = &args.log_dir {
        plan.log_dir = Some(log_dir.clone());
    }
    if let Some(cache) = &args.cache {
        plan.cached_content = Some(cache.clone());
    }
    plan
}

fn print_event(event: &RunEvent, json: bool) {
    eprintln!("{}", event);
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("Warning: failed to serialize event: {}", e),
        }
    }
}

fn finish(report: RunReport) -> Result<()> {
    if let Some(log_path) = &report.log_path {
        eprintln!("Run log: {}", log_path.display());
    }

    match report.outcome {
        RunOutcome::Completed | RunOutcome::Stopped => {
            for path in &report.written {
                println!("{}", path.display());
            }
            Ok(())
        }
        RunOutcome::Failed => Err(report.error.unwrap_or_else(|| {
            PromptBatchError::UserError("run failed".to_string())
        })),
    }
}
