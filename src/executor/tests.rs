use super::*;
use crate::error::PromptBatchError;
use crate::generate::{EchoGenerator, GenerateRequest, GenerationError, Generator};
use crate::project::{Project, Task, Variable};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

fn plan_in(dir: &Path, variables: &[(&str, &str)], tasks: Vec<Task>) -> RunPlan {
    RunPlan {
        variables: variables
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect(),
        tasks,
        output_dir: dir.join("output"),
        extension: ".md".to_string(),
        log_dir: None,
        model: "test-model".to_string(),
        cached_content: None,
    }
}

fn run_collecting(
    plan: &RunPlan,
    generator: &dyn Generator,
    stop: &StopFlag,
) -> (RunReport, Vec<RunEvent>) {
    let mut events = Vec::new();
    let report = execute(plan, generator, stop, &mut |e| events.push(e));
    (report, events)
}

#[test]
fn test_single_task_writes_response() {
    let temp_dir = TempDir::new().unwrap();
    let plan = plan_in(
        temp_dir.path(),
        &[("GREETING", "Hello")],
        vec![Task::new("t1", "{GREETING} world")],
    );

    let prompts = Mutex::new(Vec::new());
    let generator = |req: &GenerateRequest| -> Result<String, GenerationError> {
        prompts.lock().unwrap().push(req.prompt.clone());
        Ok("OK".to_string())
    };

    let (report, _) = run_collecting(&plan, &generator, &StopFlag::new());

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(*prompts.lock().unwrap(), vec!["Hello world".to_string()]);
    let path = temp_dir.path().join("output").join("t1.md");
    assert_eq!(report.written, vec![path.clone()]);
    assert_eq!(fs::read_to_string(path).unwrap(), "OK");
}

#[test]
fn test_output_template_wraps_response() {
    let temp_dir = TempDir::new().unwrap();
    let plan = plan_in(
        temp_dir.path(),
        &[],
        vec![Task::new("t1", "q").with_template("Answer: {RESPONSE}")],
    );
    let generator =
        |_: &GenerateRequest| -> Result<String, GenerationError> { Ok("OK".to_string()) };

    let report = execute(&plan, &generator, &StopFlag::new(), &mut |_| {});

    assert_eq!(report.outcome, RunOutcome::Completed);
    let content = fs::read_to_string(temp_dir.path().join("output/t1.md")).unwrap();
    assert_eq!(content, "Answer: OK");
}

#[test]
fn test_template_can_mix_variables_and_response() {
    let temp_dir = TempDir::new().unwrap();
    let plan = plan_in(
        temp_dir.path(),
        &[("TITLE", "# {TOPIC}"), ("TOPIC", "Rivers")],
        vec![Task::new("{TOPIC} notes", "q").with_template("{TITLE}\n\n{RESPONSE}")],
    );
    let generator =
        |_: &GenerateRequest| -> Result<String, GenerationError> { Ok("{TOPIC} stays".to_string()) };

    let report = execute(&plan, &generator, &StopFlag::new(), &mut |_| {});

    let content = fs::read_to_string(temp_dir.path().join("output/Rivers notes.md")).unwrap();
    assert_eq!(report.outcome, RunOutcome::Completed);
    // The response is inserted verbatim and never re-expanded.
    assert_eq!(content, "# Rivers\n\n{TOPIC} stays");
}

#[test]
fn test_disabled_tasks_are_never_sent() {
    let temp_dir = TempDir::new().unwrap();
    let plan = plan_in(
        temp_dir.path(),
        &[],
        vec![
            Task::new("a", "prompt a"),
            Task::new("b", "prompt b").with_enabled(false),
            Task::new("c", "prompt c"),
        ],
    );

    let prompts = Mutex::new(Vec::new());
    let generator = |req: &GenerateRequest| -> Result<String, GenerationError> {
        prompts.lock().unwrap().push(req.prompt.clone());
        Ok(req.prompt.to_uppercase())
    };

    let (report, events) = run_collecting(&plan, &generator, &StopFlag::new());

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(*prompts.lock().unwrap(), vec!["prompt a", "prompt c"]);
    assert_eq!(report.written.len(), 2);
    assert!(!temp_dir.path().join("output/b.md").exists());
    assert!(matches!(events[0], RunEvent::Started { tasks: 2, .. }));
}

#[test]
fn test_tasks_run_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let plan = plan_in(
        temp_dir.path(),
        &[],
        vec![Task::new("first", "1"), Task::new("second", "2"), Task::new("third", "3")],
    );

    let (report, events) = run_collecting(&plan, &EchoGenerator, &StopFlag::new());

    let started: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            RunEvent::TaskStarted { index, name, .. } => Some((*index, name.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(started, vec![(0, "first"), (1, "second"), (2, "third")]);
    assert_eq!(report.written.len(), 3);
}

#[test]
fn test_stop_flag_prevents_next_task() {
    let temp_dir = TempDir::new().unwrap();
    let plan = plan_in(
        temp_dir.path(),
        &[],
        vec![Task::new("one", "1"), Task::new("two", "2"), Task::new("three", "3")],
    );

    let stop = StopFlag::new();
    let calls = Mutex::new(0);
    let generator = |_: &GenerateRequest| -> Result<String, GenerationError> {
        *calls.lock().unwrap() += 1;
        // The in-flight call completes even though stop was requested.
        stop.stop();
        Ok("done".to_string())
    };

    let (report, events) = run_collecting(&plan, &generator, &stop);

    assert_eq!(*calls.lock().unwrap(), 1);
    assert_eq!(report.outcome, RunOutcome::Stopped);
    assert_eq!(report.written.len(), 1);
    assert!(temp_dir.path().join("output/one.md").exists());
    assert!(!temp_dir.path().join("output/two.md").exists());
    assert!(events.contains(&RunEvent::Stopped { remaining: 2 }));
}

#[test]
fn test_stop_before_start_runs_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let plan = plan_in(temp_dir.path(), &[], vec![Task::new("one", "1")]);
    let stop = StopFlag::new();
    stop.stop();

    let (report, _) = run_collecting(&plan, &EchoGenerator, &stop);

    assert_eq!(report.outcome, RunOutcome::Stopped);
    assert!(report.written.is_empty());
}

#[test]
fn test_circular_reference_aborts_run() {
    let temp_dir = TempDir::new().unwrap();
    let plan = plan_in(
        temp_dir.path(),
        &[("A", "{B}"), ("B", "{A}")],
        vec![
            Task::new("ok", "fine"),
            Task::new("broken", "uses {A}"),
            Task::new("after", "never"),
        ],
    );

    let prompts = Mutex::new(Vec::new());
    let generator = |req: &GenerateRequest| -> Result<String, GenerationError> {
        prompts.lock().unwrap().push(req.prompt.clone());
        Ok("x".to_string())
    };

    let (report, events) = run_collecting(&plan, &generator, &StopFlag::new());

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert_eq!(*prompts.lock().unwrap(), vec!["fine"]);
    assert!(temp_dir.path().join("output/ok.md").exists());
    assert!(!temp_dir.path().join("output/broken.md").exists());
    assert!(!temp_dir.path().join("output/after.md").exists());

    let error = report.error.unwrap();
    assert!(matches!(error, PromptBatchError::Resolve(_)));
    assert!(error.to_string().contains("A -> B -> A"), "unexpected error: {}", error);
    assert!(events.iter().any(|e| matches!(
        e,
        RunEvent::Failed { task: Some(name), .. } if name == "broken"
    )));
}

#[test]
fn test_circular_task_name_fails_before_generation() {
    let temp_dir = TempDir::new().unwrap();
    let plan = plan_in(
        temp_dir.path(),
        &[("N", "{N}")],
        vec![Task::new("{N}", "prompt")],
    );
    let generator = |_: &GenerateRequest| -> Result<String, GenerationError> {
        panic!("generator must not be called")
    };

    let (report, events) = run_collecting(&plan, &generator, &StopFlag::new());

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert!(!events.iter().any(|e| matches!(e, RunEvent::TaskStarted { .. })));
}

#[test]
fn test_generation_error_aborts_run() {
    let temp_dir = TempDir::new().unwrap();
    let plan = plan_in(
        temp_dir.path(),
        &[],
        vec![Task::new("first", "1"), Task::new("second", "2")],
    );
    let generator = |_: &GenerateRequest| -> Result<String, GenerationError> {
        Err(GenerationError::Api {
            status: 429,
            message: "quota exceeded".to_string(),
        })
    };

    let (report, _) = run_collecting(&plan, &generator, &StopFlag::new());

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert!(report.written.is_empty());
    let error = report.error.unwrap();
    assert!(matches!(error, PromptBatchError::Generation(_)));
    assert!(error.to_string().contains("quota exceeded"));
    assert!(!temp_dir.path().join("output/first.md").exists());
}

#[test]
fn test_finished_is_last_event() {
    let temp_dir = TempDir::new().unwrap();
    let plan = plan_in(temp_dir.path(), &[], vec![Task::new("a", "1"), Task::new("b", "2")]);
    let failing = |_: &GenerateRequest| -> Result<String, GenerationError> {
        Err(GenerationError::Other("boom".to_string()))
    };

    let generators: [&dyn Generator; 2] = [&EchoGenerator, &failing];
    for generator in generators {
        let (report, events) = run_collecting(&plan, generator, &StopFlag::new());
        assert_eq!(
            events.last(),
            Some(&RunEvent::Finished {
                outcome: report.outcome,
                completed: report.written.len(),
            })
        );
        let finished = events
            .iter()
            .filter(|e| matches!(e, RunEvent::Finished { .. }))
            .count();
        assert_eq!(finished, 1);
    }
}

#[test]
fn test_empty_plan_completes() {
    let temp_dir = TempDir::new().unwrap();
    let plan = plan_in(temp_dir.path(), &[], vec![]);

    let (report, events) = run_collecting(&plan, &EchoGenerator, &StopFlag::new());

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(events.len(), 2);
    assert!(temp_dir.path().join("output").is_dir());
}

#[test]
fn test_existing_output_is_overwritten() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("output");
    fs::create_dir_all(&output).unwrap();
    fs::write(output.join("t1.md"), "stale").unwrap();

    let plan = plan_in(temp_dir.path(), &[], vec![Task::new("t1", "fresh")]);
    execute(&plan, &EchoGenerator, &StopFlag::new(), &mut |_| {});

    assert_eq!(fs::read_to_string(output.join("t1.md")).unwrap(), "fresh");
}

#[test]
fn test_unusable_output_dir_fails_run() {
    let temp_dir = TempDir::new().unwrap();
    let mut plan = plan_in(temp_dir.path(), &[], vec![Task::new("t1", "p")]);
    let blocker = temp_dir.path().join("blocker");
    fs::write(&blocker, "file").unwrap();
    plan.output_dir = blocker.join("out");

    let (report, events) = run_collecting(&plan, &EchoGenerator, &StopFlag::new());

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert!(events.iter().any(|e| matches!(e, RunEvent::Failed { task: None, .. })));
}

#[test]
fn test_cached_content_and_model_forwarded() {
    let temp_dir = TempDir::new().unwrap();
    let mut plan = plan_in(temp_dir.path(), &[], vec![Task::new("t1", "p")]);
    plan.cached_content = Some("cachedContents/xyz".to_string());

    let seen = Mutex::new(None);
    let generator = |req: &GenerateRequest| -> Result<String, GenerationError> {
        *seen.lock().unwrap() = Some(req.clone());
        Ok("ok".to_string())
    };
    execute(&plan, &generator, &StopFlag::new(), &mut |_| {});

    let req = seen.lock().unwrap().clone().unwrap();
    assert_eq!(req.model, "test-model");
    assert_eq!(req.cached_content.as_deref(), Some("cachedContents/xyz"));
}

#[test]
fn test_run_log_mirrors_events() {
    let temp_dir = TempDir::new().unwrap();
    let mut plan = plan_in(temp_dir.path(), &[], vec![Task::new("t1", "p")]);
    plan.log_dir = Some(temp_dir.path().join("logs"));

    let report = execute(&plan, &EchoGenerator, &StopFlag::new(), &mut |_| {});

    let log_path = report.log_path.unwrap();
    assert!(log_path.starts_with(temp_dir.path().join("logs")));
    let content = fs::read_to_string(log_path).unwrap();
    assert!(content.contains("run started by"));
    assert!(content.contains("[t1] saved"));
    assert!(content.contains("run finished (completed)"));
}

#[test]
fn test_unwritable_log_dir_warns_once() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("blocker");
    fs::write(&blocker, "file").unwrap();
    let mut plan = plan_in(temp_dir.path(), &[], vec![Task::new("t1", "p")]);
    plan.log_dir = Some(blocker.join("logs"));

    let (report, events) = run_collecting(&plan, &EchoGenerator, &StopFlag::new());

    assert_eq!(report.outcome, RunOutcome::Completed);
    let warnings = events
        .iter()
        .filter(|e| matches!(e, RunEvent::Log { .. }))
        .count();
    assert_eq!(warnings, 1);
    assert!(report.log_path.is_none());

    // The warning follows the event whose log write failed.
    assert!(matches!(events[0], RunEvent::Started { .. }));
    match &events[1] {
        RunEvent::Log { message } => assert!(message.starts_with("warning: ")),
        other => panic!("expected log warning, got {:?}", other),
    }
    assert!(matches!(events.last(), Some(RunEvent::Finished { .. })));
}

#[test]
fn test_spawn_and_join() {
    let temp_dir = TempDir::new().unwrap();
    let plan = plan_in(temp_dir.path(), &[("X", "1")], vec![Task::new("t{X}", "value {X}")]);

    let handle = spawn(plan, EchoGenerator).unwrap();
    let events: Vec<RunEvent> = handle.events().iter().collect();
    let report = handle.join();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert!(matches!(events.last(), Some(RunEvent::Finished { .. })));
    let content = fs::read_to_string(temp_dir.path().join("output/t1.md")).unwrap();
    assert_eq!(content, "value 1");
}

#[test]
fn test_plan_snapshot_is_independent_of_project() {
    let mut project = Project::default();
    project.variables.push(Variable::new("A", "before"));
    project.tasks.push(Task::new("on", "{A}"));
    project.tasks.push(Task::new("off", "{A}").with_enabled(false));
    project.settings.cached_content = Some("cachedContents/c".to_string());

    let plan = RunPlan::from_project(&project);
    project.variables[0].value = "after".to_string();
    project.tasks.clear();

    assert_eq!(plan.variables, vec![("A".to_string(), "before".to_string())]);
    assert_eq!(plan.tasks.len(), 1);
    assert_eq!(plan.runnable_tasks(), 1);
    assert_eq!(plan.model, project.settings.model_name);
    assert_eq!(plan.cached_content.as_deref(), Some("cachedContents/c"));
    assert_eq!(plan.extension, ".md");
}

#[test]
fn test_event_serialization() {
    let event = RunEvent::TaskCompleted {
        index: 0,
        name: "t1".to_string(),
        path: "output/t1.md".into(),
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["event"], "task_completed");
    assert_eq!(json["name"], "t1");

    let finished = serde_json::to_value(RunEvent::Finished {
        outcome: RunOutcome::Stopped,
        completed: 1,
    })
    .unwrap();
    assert_eq!(finished["outcome"], "stopped");
}

#[test]
fn test_handle_stop_during_first_task() {
    let temp_dir = TempDir::new().unwrap();
    let plan = plan_in(
        temp_dir.path(),
        &[],
        vec![Task::new("one", "1"), Task::new("two", "2")],
    );

    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);
    let generator = move |req: &GenerateRequest| -> Result<String, GenerationError> {
        let _ = release_rx.lock().unwrap().recv();
        Ok(req.prompt.clone())
    };

    let handle = spawn(plan, generator).unwrap();
    for event in handle.events().iter() {
        if matches!(event, RunEvent::TaskStarted { .. }) {
            break;
        }
    }
    handle.stop();
    assert!(handle.stop_flag().is_stopped());
    release_tx.send(()).unwrap();

    let report = handle.join();
    assert_eq!(report.outcome, RunOutcome::Stopped);
    assert_eq!(report.written.len(), 1);
    assert!(!temp_dir.path().join("output/two.md").exists());
}
