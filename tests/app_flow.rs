use std::collections::HashMap;

use boot_core::{AbortSignal, RoleInput};
use bootflow::app::{self, HostMode};
use bootflow::config::AppConfig;

fn app_config(vars: &[(&str, &str)]) -> AppConfig {
    let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    AppConfig::from_lookup(|k| map.get(k).cloned()).unwrap()
}

fn server() -> RoleInput {
    RoleInput { role: "server".into(), ..Default::default() }
}

#[test]
fn plan_hash_is_stable_across_resolutions() {
    let cfg = app_config(&[]);
    let a = app::prepare(&cfg, server()).unwrap();
    let b = app::prepare(&cfg, server()).unwrap();
    assert_eq!(a.plan.plan_hash(), b.plan.plan_hash());

    let without_gitops = app::prepare(&app_config(&[("BOOTFLOW_GITOPS", "no")]), server()).unwrap();
    assert_ne!(a.plan.plan_hash(), without_gitops.plan.plan_hash());
}

#[test]
fn aborted_report_json_lists_pending_steps() {
    let prepared = app::prepare(&app_config(&[]), server()).unwrap();
    let abort = AbortSignal::new();
    abort.raise();
    let report = app::execute(&prepared, HostMode::DryRun, abort);

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["status"], "aborted");
    assert_eq!(json["abort_reason"]["kind"], "signal");
    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries.len(), prepared.plan.len());
    assert!(entries.iter().all(|e| e["status"] == "pending"));
}

#[test]
fn agent_plan_from_environment_runs_in_simulation() {
    let cfg = app_config(&[("BOOTFLOW_ROLE", "agent"),
                           ("BOOTFLOW_JOIN_URL", "https://10.0.0.1:6443"),
                           ("BOOTFLOW_JOIN_TOKEN", "K10secret")]);
    let prepared = app::prepare(&cfg, RoleInput::default()).unwrap();
    assert_eq!(prepared.plan.step_ids(), vec!["install-docker", "join-k3s-agent"]);

    let report = app::execute(&prepared, HostMode::Simulated, AbortSignal::new());
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.counts.applied, 2);
    assert!(!report.to_string().contains("K10secret"));
}
