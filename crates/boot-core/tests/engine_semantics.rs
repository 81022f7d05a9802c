use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use boot_adapters::SimulatedHost;
use boot_core::{resolve_role, summarize, AbortReason, BootstrapError, ExecutionEngine, FnStep, InstallScript, Role, RoleConfig,
                RoleDefaults, RoleInput, RunStatus, StepRegistry, StepStatus};

fn server_config() -> RoleConfig {
    resolve_role(RoleInput { role: "server".into(), ..Default::default() }, &RoleDefaults::default()).unwrap()
}

fn script_step(id: &'static str, binary: &'static str) -> FnStep {
    FnStep::new(id).probe(move |ctx| ctx.probe.has_binary(binary))
                   .apply(move |ctx| ctx.installer.run_script(&InstallScript::new(binary, format!("https://example.invalid/{binary}"))))
}

#[test]
fn fatal_failure_halts_the_run() {
    let mut builder = StepRegistry::builder();
    builder.register(script_step("a", "alpha"))
           .unwrap()
           .register(script_step("b", "beta").depends_on(&["a"]))
           .unwrap()
           .register(script_step("c", "gamma").depends_on(&["b"]))
           .unwrap();
    let registry = builder.build().unwrap();
    let plan = registry.resolve(Role::Server).unwrap();
    let host = SimulatedHost::new().fail_on("script:beta", "mirror returned 503");

    let mut engine = ExecutionEngine::new();
    let outcome = engine.run(&plan, &server_config(), &host);

    assert_eq!(outcome.status, RunStatus::Aborted);
    assert_eq!(outcome.abort_reason, Some(AbortReason::FatalStep { step_id: "b".into() }));
    assert_eq!(outcome.status_of("a"), Some(StepStatus::Applied));
    assert_eq!(outcome.status_of("b"), Some(StepStatus::FailedFatal));
    assert_eq!(outcome.status_of("c"), None);
    assert_eq!(host.calls(), vec!["script:alpha", "script:beta"]);
    assert_eq!(engine.event_variants(outcome.run_id), vec!["I", "S", "A", "S", "X", "B"]);

    let report = summarize(&plan, &outcome);
    assert_eq!(report.counts.pending, 1);
    assert_eq!(report.exit_code(), 1);
    assert!(report.entry("b").and_then(|e| e.message.as_deref()).is_some_and(|m| m.contains("503")));
}

#[test]
fn tolerated_failure_continues_but_blocks_dependents() {
    let mut builder = StepRegistry::builder();
    builder.register(script_step("base", "alpha"))
           .unwrap()
           .register(script_step("optional", "beta").depends_on(&["base"]).tolerant())
           .unwrap()
           .register(script_step("needs-optional", "gamma").depends_on(&["optional"]).tolerant())
           .unwrap()
           .register(script_step("independent", "delta").depends_on(&["base"]))
           .unwrap();
    let registry = builder.build().unwrap();
    let plan = registry.resolve(Role::Server).unwrap();
    let host = SimulatedHost::new().timeout_on("script:beta");

    let outcome = ExecutionEngine::new().run(&plan, &server_config(), &host);

    assert!(outcome.is_completed());
    assert_eq!(outcome.status_of("optional"), Some(StepStatus::FailedTolerated));
    assert_eq!(outcome.status_of("needs-optional"), Some(StepStatus::FailedTolerated));
    assert_eq!(outcome.status_of("independent"), Some(StepStatus::Applied));
    let blocked = outcome.results.iter().find(|r| r.step_id == "needs-optional").unwrap();
    assert_eq!(blocked.message.as_deref(), Some("dependency 'optional' not satisfied"));
    assert!(!host.calls().contains(&"script:gamma".to_string()));

    let report = summarize(&plan, &outcome);
    assert_eq!(report.counts.failed_tolerated, 2);
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn fatal_step_blocked_by_tolerated_dependency_aborts() {
    let mut builder = StepRegistry::builder();
    builder.register(script_step("optional", "beta").tolerant())
           .unwrap()
           .register(script_step("strict", "gamma").depends_on(&["optional"]))
           .unwrap();
    let plan = builder.build().unwrap().resolve(Role::Server).unwrap();
    let host = SimulatedHost::new().fail_on("script:beta", "boom");

    let outcome = ExecutionEngine::new().run(&plan, &server_config(), &host);

    assert_eq!(outcome.abort_reason, Some(AbortReason::FatalStep { step_id: "strict".into() }));
    assert_eq!(outcome.fatal_failure().map(|r| r.step_id.as_str()), Some("strict"));
}

#[test]
fn abort_signal_stops_between_steps() {
    let mut engine = ExecutionEngine::new();
    let signal = engine.abort_signal();
    let applied = Arc::new(AtomicUsize::new(0));

    let mut builder = StepRegistry::builder();
    for id in ["one", "two", "three"] {
        let signal = signal.clone();
        let applied = Arc::clone(&applied);
        builder.register(FnStep::new(id).apply(move |_| {
                                             if applied.fetch_add(1, Ordering::SeqCst) == 1 {
                                                 signal.raise();
                                             }
                                             Ok(())
                                         }))
               .unwrap();
    }
    let plan = builder.build().unwrap().resolve(Role::Server).unwrap();

    let outcome = engine.run(&plan, &server_config(), &SimulatedHost::new());

    assert_eq!(outcome.status, RunStatus::Aborted);
    assert_eq!(outcome.abort_reason, Some(AbortReason::Signal));
    assert_eq!(outcome.results.len(), 2);
    assert_eq!(applied.load(Ordering::SeqCst), 2);
    assert_eq!(summarize(&plan, &outcome).exit_code(), 130);
}

#[test]
fn signal_raised_during_a_step_lets_it_finish() {
    let (started_tx, started_rx) = mpsc::channel::<()>();
    let (resume_tx, resume_rx) = mpsc::channel::<()>();
    let started_tx = Mutex::new(started_tx);
    let resume_rx = Mutex::new(resume_rx);

    let mut builder = StepRegistry::builder();
    builder.register(FnStep::new("long-install").apply(move |_| {
                                                     started_tx.lock().unwrap().send(()).unwrap();
                                                     resume_rx.lock().unwrap().recv().unwrap();
                                                     Ok(())
                                                 }))
           .unwrap()
           .register(FnStep::new("next").depends_on(&["long-install"]))
           .unwrap();
    let plan = builder.build().unwrap().resolve(Role::Server).unwrap();

    let mut engine = ExecutionEngine::new();
    let signal = engine.abort_signal();
    let worker = {
        let plan = plan.clone();
        thread::spawn(move || engine.run(&plan, &server_config(), &SimulatedHost::new()))
    };

    started_rx.recv().unwrap();
    signal.raise();
    resume_tx.send(()).unwrap();
    let outcome = worker.join().unwrap();

    assert_eq!(outcome.status_of("long-install"), Some(StepStatus::Applied));
    assert_eq!(outcome.status_of("next"), None);
    assert_eq!(outcome.abort_reason, Some(AbortReason::Signal));
    let report = summarize(&plan, &outcome);
    assert!(report.to_string().contains("aborted (signal)"));
    assert_eq!(report.entry("next").map(|e| e.status), Some(StepStatus::Pending));
    assert_eq!(report.exit_code(), 130);
}

#[test]
fn agent_with_empty_token_never_reaches_the_engine() {
    let input = RoleInput { role: "agent".into(),
                            join_url: Some("https://10.0.0.1:6443".into()),
                            join_token: Some(String::new()),
                            ..Default::default() };
    let err = resolve_role(input, &RoleDefaults::default()).unwrap_err();
    assert!(err.is_input_error());
    assert!(matches!(err, BootstrapError::MissingJoinParameters { .. }));
}

#[test]
fn cycle_is_rejected_at_build_time() {
    let mut builder = StepRegistry::builder();
    builder.register(FnStep::new("x").depends_on(&["z"]))
           .unwrap()
           .register(FnStep::new("y").depends_on(&["x"]))
           .unwrap()
           .register(FnStep::new("z").depends_on(&["y"]))
           .unwrap();
    match builder.build() {
        Err(BootstrapError::CyclicDependency(cycle)) => {
            assert!(cycle.len() >= 3);
            for id in ["x", "y", "z"] {
                assert!(cycle.iter().any(|c| c == id));
            }
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
}
