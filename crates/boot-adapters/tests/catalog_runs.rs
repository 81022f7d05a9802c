use std::path::PathBuf;

use boot_adapters::catalog::ids;
use boot_adapters::{default_registry, DryRunHost, SimState, SimulatedHost};
use boot_core::constants::K3S_KUBECONFIG_PATH;
use boot_core::{resolve_role, summarize, AbortReason, ExecutionEngine, RegistryLogin, Role, RoleConfig, RoleDefaults, RoleInput,
                RunStatus, StepStatus};

fn server(defaults: &RoleDefaults) -> RoleConfig {
    resolve_role(RoleInput { role: "server".into(), ..Default::default() }, defaults).unwrap()
}

fn agent() -> RoleConfig {
    let input = RoleInput { role: "agent".into(),
                            join_url: Some("https://10.0.0.1:6443".into()),
                            join_token: Some("K10token".into()),
                            ..Default::default() };
    resolve_role(input, &RoleDefaults::default()).unwrap()
}

fn home_kubeconfig() -> RoleDefaults {
    RoleDefaults { kubeconfig_path: PathBuf::from("/root/.kube/config"),
                   ..RoleDefaults::default() }
}

#[test]
fn second_server_run_skips_everything() {
    let registry = default_registry().unwrap();
    let config = server(&home_kubeconfig());
    let plan = registry.resolve_for(&config).unwrap();
    let host = SimulatedHost::new();
    let mut engine = ExecutionEngine::new();

    let first = engine.run(&plan, &config, &host);
    assert!(first.is_completed(), "{first:?}");
    assert_eq!(first.count(StepStatus::FailedFatal) + first.count(StepStatus::FailedTolerated), 0);
    assert_eq!(first.status_of(ids::CONFIGURE_KUBECONFIG), Some(StepStatus::Applied));
    // k3s deja el nodo Ready y ArgoCD disponible antes de las esperas.
    assert_eq!(first.status_of(ids::WAIT_NODE_READY), Some(StepStatus::Skipped));
    assert_eq!(first.status_of(ids::WAIT_ARGOCD_READY), Some(StepStatus::Skipped));

    let state = host.snapshot();
    for ns in ["argocd", "apps", "monitoring"] {
        assert!(state.namespaces.contains(ns));
    }
    for bin in ["docker", "k3s", "kubectl", "helm", "k9s"] {
        assert!(state.binaries.contains(bin), "missing {bin}");
    }

    let calls_after_first = host.action_count();
    let second = engine.run(&plan, &config, &host);
    assert!(second.is_completed());
    assert_eq!(second.count(StepStatus::Skipped), plan.len());
    assert_eq!(host.action_count(), calls_after_first);
    assert_eq!(host.snapshot(), state);
}

#[test]
fn agent_plan_joins_the_server() {
    let registry = default_registry().unwrap();
    let config = agent();
    let plan = registry.resolve_for(&config).unwrap();
    assert_eq!(plan.step_ids(), vec![ids::INSTALL_DOCKER, ids::JOIN_K3S_AGENT]);

    let host = SimulatedHost::new();
    let outcome = ExecutionEngine::new().run(&plan, &config, &host);
    assert!(outcome.is_completed());
    assert!(host.snapshot().services.contains("k3s-agent"));
    assert_eq!(host.calls(), vec!["script:docker", "script:k3s"]);
}

#[test]
fn failed_k3s_install_leaves_later_steps_pending() {
    let registry = default_registry().unwrap();
    let config = server(&RoleDefaults::default());
    let plan = registry.resolve_for(&config).unwrap();
    let host = SimulatedHost::new().fail_on("script:k3s", "installer exited with 1");

    let outcome = ExecutionEngine::new().run(&plan, &config, &host);
    assert_eq!(outcome.status, RunStatus::Aborted);
    assert_eq!(outcome.abort_reason, Some(AbortReason::FatalStep { step_id: ids::INSTALL_K3S_SERVER.into() }));

    let report = summarize(&plan, &outcome);
    assert_eq!(report.counts.applied, 1);
    assert_eq!(report.counts.failed_fatal, 1);
    assert_eq!(report.counts.pending, plan.len() - 2);
    assert_eq!(report.entry(ids::CREATE_NAMESPACES).map(|e| e.status), Some(StepStatus::Pending));

    // Corregido el fallo, volver a correr retoma desde donde quedó.
    host.clear_failure("script:k3s");
    let retry = ExecutionEngine::new().run(&plan, &config, &host);
    assert!(retry.is_completed());
    assert_eq!(retry.status_of(ids::INSTALL_DOCKER), Some(StepStatus::Skipped));
    assert_eq!(retry.status_of(ids::INSTALL_K3S_SERVER), Some(StepStatus::Applied));
}

#[test]
fn dashboard_failure_is_tolerated() {
    let registry = default_registry().unwrap();
    let config = server(&RoleDefaults::default());
    let plan = registry.resolve_for(&config).unwrap();
    let host = SimulatedHost::new().fail_on("release:k9s", "404");

    let outcome = ExecutionEngine::new().run(&plan, &config, &host);
    assert!(outcome.is_completed());
    assert_eq!(outcome.status_of(ids::INSTALL_K9S), Some(StepStatus::FailedTolerated));
    assert_eq!(outcome.status_of(ids::INSTALL_ARGOCD), Some(StepStatus::Applied));
    assert_eq!(summarize(&plan, &outcome).exit_code(), 0);
}

#[test]
fn argocd_readiness_timeout_is_tolerated() {
    let mut state = SimState::default();
    state.deployments.insert(("argocd".into(), "argocd-server".into()));
    let registry = default_registry().unwrap();
    let config = server(&RoleDefaults::default());
    let plan = registry.resolve_for(&config).unwrap();
    let host = SimulatedHost::with_state(state).timeout_on("wait:deployments-available:argocd");

    let outcome = ExecutionEngine::new().run(&plan, &config, &host);
    assert!(outcome.is_completed());
    assert_eq!(outcome.status_of(ids::INSTALL_ARGOCD), Some(StepStatus::Skipped));
    assert_eq!(outcome.status_of(ids::WAIT_ARGOCD_READY), Some(StepStatus::FailedTolerated));
}

#[test]
fn toggles_and_registry_shape_the_plan() {
    let registry = default_registry().unwrap();
    let defaults = RoleDefaults { registry: Some(RegistryLogin { url: "registry.example.com".into(),
                                                                 username: "ci".into(),
                                                                 password: "hunter2".into() }),
                                  ..RoleDefaults::default() };
    let input = RoleInput { role: "server".into(),
                            dashboard: Some(false),
                            gitops: Some(false),
                            ..Default::default() };
    let config = resolve_role(input, &defaults).unwrap();
    let plan = registry.resolve_for(&config).unwrap();

    let ids_in_plan = plan.step_ids();
    assert!(ids_in_plan.contains(&ids::REGISTRY_LOGIN));
    assert!(!ids_in_plan.contains(&ids::INSTALL_K9S));
    assert!(!ids_in_plan.contains(&ids::INSTALL_ARGOCD));
    assert!(!ids_in_plan.contains(&ids::WAIT_ARGOCD_READY));
    assert_eq!(plan.role(), Role::Server);

    let host = SimulatedHost::new();
    let mut engine = ExecutionEngine::new();
    engine.run(&plan, &config, &host);
    let second = engine.run(&plan, &config, &host);
    // El login se repite en cada corrida.
    assert_eq!(second.status_of(ids::REGISTRY_LOGIN), Some(StepStatus::Applied));
    assert_eq!(host.calls().iter().filter(|c| c.as_str() == "command:docker").count(), 2);
}

#[test]
fn dry_run_records_every_action_in_plan_order() {
    let registry = default_registry().unwrap();
    let config = server(&RoleDefaults::default());
    let plan = registry.resolve_for(&config).unwrap();
    let host = DryRunHost::new();

    let outcome = ExecutionEngine::new().run(&plan, &config, &host);
    assert!(outcome.is_completed());
    assert_eq!(outcome.count(StepStatus::Applied), plan.len());

    let actions = host.actions();
    assert!(actions[0].starts_with("run script docker"));
    assert!(actions.iter().any(|a| a == &format!("copy {K3S_KUBECONFIG_PATH} to {K3S_KUBECONFIG_PATH}")));
    assert!(actions.last().is_some_and(|a| a.starts_with("wait for deployments-available:argocd")));
}
