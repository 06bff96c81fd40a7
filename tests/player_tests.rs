use std::sync::Arc;

use parking_lot::Mutex;

use flowplayer::{
    ActionContext, ActionFactoryRegistry, FinishReport, FlowAction, FlowAsset, FlowAssetBuilder,
    FlowError, FlowPlayer, LogLevel, PlayerConfig, PlayerObserver, PlayerState, Session,
    SessionLog, StartOptions, UpdateContext,
};

type EventLog = Arc<Mutex<Vec<String>>>;

#[derive(Clone, Copy)]
enum Step {
    Goto,
    Break,
    Hold,
    Retry,
    Fail,
}

struct ScriptedAction {
    id: String,
    step: Step,
    log: EventLog,
}

impl FlowAction for ScriptedAction {
    fn on_start(&mut self, ctx: &mut ActionContext<'_>) {
        self.log.lock().push(format!("start:{}", ctx.id()));
    }

    fn update(&mut self, ctx: &mut ActionContext<'_>, update: &mut UpdateContext) {
        self.log.lock().push(format!("update:{}", ctx.id()));
        match self.step {
            Step::Goto => update.goto(ctx.first_valid_link(), 0.0),
            Step::Break => update.break_flow(),
            Step::Hold => update.keep_active(),
            Step::Retry => update.throw("not ready", true),
            Step::Fail => update.throw("broken", false),
        }
    }

    fn on_cancel(&mut self) {
        self.log.lock().push(format!("cancel:{}", self.id));
    }
}

fn scripted_factories(log: &EventLog) -> Arc<ActionFactoryRegistry> {
    let mut registry = ActionFactoryRegistry::with_builtins();
    for (name, step) in [
        ("goto", Step::Goto),
        ("break", Step::Break),
        ("hold", Step::Hold),
        ("retry", Step::Retry),
        ("fail_now", Step::Fail),
    ] {
        let log = Arc::clone(log);
        registry.register(name, move |descriptor| {
            Ok(Box::new(ScriptedAction {
                id: descriptor.id.clone(),
                step,
                log: Arc::clone(&log),
            }) as Box<dyn FlowAction>)
        });
    }
    Arc::new(registry)
}

#[derive(Clone, Default)]
struct Recorder {
    started: Arc<Mutex<Vec<String>>>,
    finished: Arc<Mutex<Vec<FinishReport>>>,
}

impl PlayerObserver for Recorder {
    fn on_start(&mut self, flow: &str) {
        self.started.lock().push(flow.to_string());
    }

    fn on_finish(&mut self, report: &FinishReport) {
        self.finished.lock().push(report.clone());
    }
}

#[derive(Default)]
struct RecordingLog {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl SessionLog for RecordingLog {
    fn log(&self, level: LogLevel, message: &str) {
        self.entries.lock().push((level, message.to_string()));
    }
}

fn player_with(log: &EventLog) -> (FlowPlayer, Recorder) {
    let mut player = FlowPlayer::with_factories(scripted_factories(log));
    let recorder = Recorder::default();
    player.add_observer(recorder.clone());
    (player, recorder)
}

fn build(configure: impl FnOnce(&mut FlowAssetBuilder)) -> anyhow::Result<Arc<FlowAsset>> {
    let mut builder = FlowAssetBuilder::new("test_flow");
    configure(&mut builder);
    Ok(Arc::new(builder.build()?))
}

#[test]
fn yielded_transition_resumes_on_next_update() -> anyhow::Result<()> {
    let log = EventLog::default();
    let (mut player, recorder) = player_with(&log);
    let session = Session::new();
    let asset = build(|b| {
        b.add_action("A", "goto")
            .add_action("B", "goto")
            .add_action("C", "break")
            .link("A", "B")
            .link_yield("B", "C");
    })?;

    player.start(asset, StartOptions::new().with_start("A"))?;
    assert_eq!(player.state(), PlayerState::PendingStart);

    player.update(&session, 1.0);
    assert_eq!(
        *log.lock(),
        vec!["start:A", "update:A", "start:B", "update:B"]
    );
    assert_eq!(player.current_action_id(), None);
    assert_eq!(player.pending_action_id(), Some("C"));
    assert_eq!(player.state(), PlayerState::Yielded);
    assert!(player.is_playing());
    assert!(recorder.finished.lock().is_empty());

    player.update(&session, 1.0);
    assert_eq!(&log.lock()[4..], ["start:C", "update:C"]);
    assert!(!player.is_playing());
    assert_eq!(player.state(), PlayerState::Idle);

    let finished = recorder.finished.lock();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].last_action_id.as_deref(), Some("C"));
    assert!(!finished[0].with_error);
    assert_eq!(*recorder.started.lock(), vec!["test_flow"]);
    Ok(())
}

#[test]
fn chained_actions_finish_in_one_update() -> anyhow::Result<()> {
    let log = EventLog::default();
    let (mut player, recorder) = player_with(&log);
    let asset = build(|b| {
        b.add_action("A", "goto")
            .add_action("B", "goto")
            .add_action("C", "break")
            .link("A", "B")
            .link("B", "C")
            .set_start("A");
    })?;

    player.start(asset, StartOptions::new())?;
    player.update(&Session::new(), 0.0);

    assert!(!player.is_playing());
    let finished = recorder.finished.lock();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].last_action_id.as_deref(), Some("C"));
    assert!(!finished[0].with_error);
    Ok(())
}

#[test]
fn zero_delta_update_instantiates_first_action() -> anyhow::Result<()> {
    let log = EventLog::default();
    let (mut player, _) = player_with(&log);
    let asset = build(|b| {
        b.add_action("idle", "hold").set_start("idle");
    })?;

    player.start(asset, StartOptions::new())?;
    assert_eq!(player.current_action_id(), None);

    player.update(&Session::new(), 0.0);
    assert_eq!(player.state(), PlayerState::Active);
    assert_eq!(player.current_action_id(), Some("idle"));
    assert_eq!(*log.lock(), vec!["start:idle", "update:idle"]);
    Ok(())
}

#[test]
fn stop_cancels_live_action_exactly_once() -> anyhow::Result<()> {
    let log = EventLog::default();
    let (mut player, recorder) = player_with(&log);
    let asset = build(|b| {
        b.add_action("idle", "hold").set_start("idle");
    })?;

    player.start(asset, StartOptions::new())?;
    player.update(&Session::new(), 0.1);
    player.stop();
    player.stop();

    let cancels = log.lock().iter().filter(|e| e.starts_with("cancel:")).count();
    assert_eq!(cancels, 1);
    assert!(log.lock().contains(&"cancel:idle".to_string()));
    assert!(!player.is_playing());

    let finished = recorder.finished.lock();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].last_action_id.as_deref(), Some("idle"));
    assert!(!finished[0].with_error);
    Ok(())
}

#[test]
fn stop_before_first_update_finishes_without_cancel() -> anyhow::Result<()> {
    let log = EventLog::default();
    let (mut player, recorder) = player_with(&log);
    let asset = build(|b| {
        b.add_action("idle", "hold").set_start("idle");
    })?;

    player.start(asset, StartOptions::new())?;
    player.stop();

    assert!(log.lock().is_empty());
    let finished = recorder.finished.lock();
    assert_eq!(finished[0].last_action_id.as_deref(), Some("idle"));
    assert!(!finished[0].with_error);
    Ok(())
}

#[test]
fn restart_cancels_previous_run() -> anyhow::Result<()> {
    let log = EventLog::default();
    let (mut player, recorder) = player_with(&log);
    let asset = build(|b| {
        b.add_action("idle", "hold").set_start("idle");
    })?;

    player.start(Arc::clone(&asset), StartOptions::new())?;
    player.update(&Session::new(), 0.1);
    player.start(asset, StartOptions::new())?;

    assert!(log.lock().contains(&"cancel:idle".to_string()));
    assert_eq!(recorder.finished.lock().len(), 1);
    assert_eq!(recorder.started.lock().len(), 2);
    assert_eq!(player.state(), PlayerState::PendingStart);
    Ok(())
}

#[test]
fn retryable_error_retries_on_next_update_only() -> anyhow::Result<()> {
    let log = EventLog::default();
    let (mut player, recorder) = player_with(&log);
    let sink = Arc::new(RecordingLog::default());
    let session = Session::new().with_log(sink.clone());
    let asset = build(|b| {
        b.add_action("flaky", "retry").set_start("flaky");
    })?;

    player.start(asset, StartOptions::new())?;
    player.update(&session, 1.0);
    assert_eq!(*log.lock(), vec!["start:flaky", "update:flaky"]);
    assert_eq!(player.current_action_id(), Some("flaky"));

    player.update(&session, 1.0);
    assert_eq!(*log.lock(), vec!["start:flaky", "update:flaky", "update:flaky"]);
    assert!(recorder.finished.lock().is_empty());

    let entries = sink.entries.lock();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|(level, _)| *level == LogLevel::Warn));
    assert!(entries[0].1.contains("not ready"));
    Ok(())
}

#[test]
fn terminal_error_finishes_with_error() -> anyhow::Result<()> {
    let log = EventLog::default();
    let (mut player, recorder) = player_with(&log);
    let sink = Arc::new(RecordingLog::default());
    let session = Session::new().with_log(sink.clone());
    let asset = build(|b| {
        b.add_action("A", "goto")
            .add_action("B", "fail_now")
            .link("A", "B")
            .set_start("A");
    })?;

    player.start(asset, StartOptions::new())?;
    player.update(&session, 1.0);

    assert!(!player.is_playing());
    let finished = recorder.finished.lock();
    assert_eq!(finished[0].last_action_id.as_deref(), Some("B"));
    assert!(finished[0].with_error);
    assert_eq!(sink.entries.lock()[0].0, LogLevel::Error);
    Ok(())
}

#[test]
fn failed_start_leaves_running_flow_untouched() -> anyhow::Result<()> {
    let log = EventLog::default();
    let (mut player, recorder) = player_with(&log);
    let asset = build(|b| {
        b.add_action("idle", "hold").set_start("idle");
    })?;
    let empty = build(|_| {})?;
    let no_start = build(|b| {
        b.add_action("orphan", "hold");
    })?;

    player.start(Arc::clone(&asset), StartOptions::new())?;
    player.update(&Session::new(), 0.1);

    let err = player
        .start(Arc::clone(&asset), StartOptions::new().with_start("missing"))
        .unwrap_err();
    assert!(matches!(err, FlowError::UnknownAction(id) if id == "missing"));
    assert!(matches!(
        player.start(empty, StartOptions::new()),
        Err(FlowError::EmptyAsset(_))
    ));
    assert!(matches!(
        player.start(no_start, StartOptions::new()),
        Err(FlowError::MissingStartAction(_))
    ));

    assert_eq!(player.state(), PlayerState::Active);
    assert_eq!(player.current_action_id(), Some("idle"));
    assert!(recorder.finished.lock().is_empty());
    assert!(!log.lock().iter().any(|e| e.starts_with("cancel:")));
    Ok(())
}

#[test]
fn unregistered_action_type_finishes_with_error() -> anyhow::Result<()> {
    let log = EventLog::default();
    let (mut player, recorder) = player_with(&log);
    let sink = Arc::new(RecordingLog::default());
    let session = Session::new().with_log(sink.clone());
    let asset = build(|b| {
        b.add_action("A", "does_not_exist").set_start("A");
    })?;

    player.start(asset, StartOptions::new())?;
    player.update(&session, 1.0);

    assert!(!player.is_playing());
    let finished = recorder.finished.lock();
    assert_eq!(finished[0].last_action_id.as_deref(), Some("A"));
    assert!(finished[0].with_error);
    assert!(sink.entries.lock()[0].1.contains("does_not_exist"));
    Ok(())
}

#[test]
fn transition_limit_defers_chain_to_next_update() -> anyhow::Result<()> {
    let log = EventLog::default();
    let config = PlayerConfig::default().with_max_transitions(2);
    let mut player = FlowPlayer::with_config(scripted_factories(&log), config);
    let asset = build(|b| {
        b.add_action("A", "goto")
            .add_action("B", "goto")
            .add_action("C", "goto")
            .add_action("D", "break")
            .link("A", "B")
            .link("B", "C")
            .link("C", "D")
            .set_start("A");
    })?;
    let sink = Arc::new(RecordingLog::default());
    let session = Session::new().with_log(sink.clone());

    player.start(asset, StartOptions::new())?;
    player.update(&session, 0.0);
    assert_eq!(player.pending_action_id(), Some("C"));
    assert!(player.is_playing());
    {
        let entries = sink.entries.lock();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, LogLevel::Warn);
        assert!(entries[0].1.contains("resuming `C`"));
    }

    player.update(&session, 0.0);
    assert!(!player.is_playing());
    assert_eq!(
        player.last_report().and_then(|r| r.last_action_id.as_deref()),
        Some("D")
    );
    Ok(())
}

#[test]
fn start_resets_variables_to_asset_defaults() -> anyhow::Result<()> {
    let mut player = FlowPlayer::new();
    let asset = build(|b| {
        b.add_action_with_params(
            "bump",
            "set_variable",
            serde_json::json!({ "name": "count", "value": 5 }),
        )
        .add_action_with_params("hold", "wait", serde_json::json!({ "seconds": 10.0 }))
        .set_variable("count", 1)
        .link("bump", "hold")
        .set_start("bump");
    })?;
    let session = Session::new();

    player.start(Arc::clone(&asset), StartOptions::new())?;
    assert_eq!(player.variables().get_by_name::<i64>("count")?, 1);
    player.update(&session, 0.0);
    assert_eq!(player.variables().get_by_name::<i64>("count")?, 5);

    player.start(asset, StartOptions::new().with_variable("extra", true))?;
    assert_eq!(player.variables().get_by_name::<i64>("count")?, 1);
    assert!(player.variables().get_by_name::<bool>("extra")?);
    Ok(())
}

fn random_run(player: &mut FlowPlayer, asset: &Arc<FlowAsset>, seed: Option<u64>) -> anyhow::Result<String> {
    let options = match seed {
        Some(seed) => StartOptions::new().with_seed(seed),
        None => StartOptions::new(),
    };
    player.start(Arc::clone(asset), options)?;
    player.update(&Session::new(), 0.0);
    Ok(player
        .last_report()
        .and_then(|r| r.last_action_id.clone())
        .unwrap_or_default())
}

#[test]
fn random_branch_replays_with_same_seed() -> anyhow::Result<()> {
    let asset = build(|b| {
        b.add_action("pick", "random_branch")
            .add_action("a", "end")
            .add_action("b", "end")
            .add_action("c", "end")
            .link("pick", "a")
            .link("pick", "b")
            .link("pick", "c")
            .set_start("pick");
    })?;

    let mut first = FlowPlayer::new();
    let mut second = FlowPlayer::new();
    let mut left = vec![random_run(&mut first, &asset, Some(42))?];
    let mut right = vec![random_run(&mut second, &asset, Some(42))?];
    for _ in 0..16 {
        left.push(random_run(&mut first, &asset, None)?);
        right.push(random_run(&mut second, &asset, None)?);
    }

    assert_eq!(left, right);
    assert!(left.iter().all(|id| ["a", "b", "c"].contains(&id.as_str())));
    Ok(())
}
