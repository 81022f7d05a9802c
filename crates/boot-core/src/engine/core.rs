//! Core ExecutionEngine implementation

use serde_json::json;
use uuid::Uuid;

use crate::constants::ENGINE_VERSION;
use crate::engine::{AbortReason, AbortSignal, RunOutcome, RunStatus};
use crate::errors::BootstrapError;
use crate::event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
use crate::hashing::hash_value;
use crate::host::{Host, HostContext};
use crate::registry::ResolvedPlan;
use crate::role::RoleConfig;
use crate::step::{ExecutionResult, Idempotency, StepDefinition, StepStatus, Tolerance};

/// Motor de ejecución secuencial.
///
/// Recorre el plan en orden: omite los steps satisfechos, aplica el resto,
/// se detiene ante el primer fallo fatal y continúa tras fallos tolerados.
/// Sin reintentos: como cada step es idempotente, volver a correr el plan
/// completo es el mecanismo de reintento.
#[derive(Debug)]
pub struct ExecutionEngine<E: EventStore = InMemoryEventStore> {
    event_store: E,
    abort: AbortSignal,
}

impl ExecutionEngine<InMemoryEventStore> {
    /// Crea un engine con store de eventos en memoria.
    #[inline]
    pub fn new() -> Self {
        Self::with_store(InMemoryEventStore::default())
    }
}

impl Default for ExecutionEngine<InMemoryEventStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EventStore> ExecutionEngine<E> {
    pub fn with_store(event_store: E) -> Self {
        Self { event_store,
               abort: AbortSignal::new() }
    }

    /// Reemplaza la señal de aborto (p.ej. por una compartida con un handler de señales).
    pub fn with_abort_signal(mut self, signal: AbortSignal) -> Self {
        self.abort = signal;
        self
    }

    pub fn abort_signal(&self) -> AbortSignal {
        self.abort.clone()
    }

    pub fn event_store(&self) -> &E {
        &self.event_store
    }

    pub fn events_for(&self, run_id: Uuid) -> Vec<RunEvent> {
        self.event_store.list(run_id)
    }

    /// Variante compacta de eventos de una corrida
    pub fn event_variants(&self, run_id: Uuid) -> Vec<&'static str> {
        self.events_for(run_id)
            .iter()
            .map(|e| match e.kind {
                RunEventKind::RunInitialized { .. } => "I",
                RunEventKind::StepStarted { .. } => "S",
                RunEventKind::StepSkipped { .. } => "K",
                RunEventKind::StepApplied { .. } => "A",
                RunEventKind::StepFailed { tolerated: true, .. } => "T",
                RunEventKind::StepFailed { tolerated: false, .. } => "X",
                RunEventKind::RunAborted { .. } => "B",
                RunEventKind::RunCompleted { .. } => "C",
            })
            .collect()
    }

    /// Ejecuta `plan` contra `host` con la configuración dada.
    pub fn run<H: Host>(&mut self, plan: &ResolvedPlan, config: &RoleConfig, host: &H) -> RunOutcome {
        let ctx = HostContext::new(config, host);
        self.run_with(plan, &ctx)
    }

    /// Igual que `run` pero con un contexto ya armado.
    pub fn run_with(&mut self, plan: &ResolvedPlan, ctx: &HostContext<'_>) -> RunOutcome {
        let run_id = Uuid::new_v4();
        self.event_store.append_kind(run_id,
                                     RunEventKind::RunInitialized { plan_hash: plan.plan_hash().to_string(),
                                                                    role: plan.role(),
                                                                    step_count: plan.len() });
        log::info!("run {run_id}: {} steps for role {} (plan {})", plan.len(), plan.role(), short(plan.plan_hash()));

        let mut statuses = vec![StepStatus::Pending; plan.len()];
        let mut results: Vec<ExecutionResult> = Vec::with_capacity(plan.len());

        for (index, step) in plan.steps().iter().enumerate() {
            if self.abort.is_raised() {
                log::warn!("run {run_id}: abort signal observed before '{}'", step.id());
                return self.abort_run(run_id, AbortReason::Signal, results);
            }

            statuses[index] = StepStatus::Running;
            self.event_store.append_kind(run_id,
                                         RunEventKind::StepStarted { step_index: index,
                                                                     step_id: step.id().to_string() });

            let (status, message) = self.execute_step(plan, &statuses, step.as_ref(), ctx);
            statuses[index] = status;
            self.record(run_id, index, step.as_ref(), status, message.as_deref());
            results.push(ExecutionResult::new(step.id(), status, message));

            if status == StepStatus::FailedFatal {
                let reason = AbortReason::FatalStep { step_id: step.id().to_string() };
                return self.abort_run(run_id, reason, results);
            }
        }

        let run_fingerprint = hash_value(&json!({
            "engine_version": ENGINE_VERSION,
            "plan_hash": plan.plan_hash(),
            "steps": results.iter().map(|r| json!([r.step_id, r.status])).collect::<Vec<_>>(),
        }));
        self.event_store.append_kind(run_id, RunEventKind::RunCompleted { run_fingerprint });
        log::info!("run {run_id}: completed");

        RunOutcome { run_id,
                     status: RunStatus::Completed,
                     abort_reason: None,
                     results }
    }

    /// Decide y ejecuta un step. Devuelve su estado terminal y un mensaje opcional.
    fn execute_step(&self,
                    plan: &ResolvedPlan,
                    statuses: &[StepStatus],
                    step: &dyn StepDefinition,
                    ctx: &HostContext<'_>)
                    -> (StepStatus, Option<String>) {
        for dep in step.depends_on() {
            let ready = plan.position(dep).is_some_and(|pos| statuses[pos].unblocks_dependents());
            if !ready {
                return failed(step, format!("dependency '{dep}' not satisfied"));
            }
        }

        if step.idempotency() == Idempotency::SkipIfSatisfied {
            match step.is_satisfied(ctx) {
                Ok(true) => {
                    log::info!("[{}] already satisfied, skipping", step.id());
                    return (StepStatus::Skipped, None);
                }
                Ok(false) => {}
                Err(e) => return failed(step, format!("precondition check failed: {e}")),
            }
        }

        log::info!("[{}] applying", step.id());
        match step.apply(ctx) {
            Ok(()) => (StepStatus::Applied, None),
            Err(source) => {
                let err = BootstrapError::StepApply { step: step.id().to_string(),
                                                      source };
                failed(step, err.to_string())
            }
        }
    }

    fn record(&mut self, run_id: Uuid, index: usize, step: &dyn StepDefinition, status: StepStatus, message: Option<&str>) {
        let step_id = step.id().to_string();
        let kind = match status {
            StepStatus::Skipped => RunEventKind::StepSkipped { step_index: index, step_id },
            StepStatus::Applied => RunEventKind::StepApplied { step_index: index, step_id },
            StepStatus::FailedFatal | StepStatus::FailedTolerated => {
                let tolerated = status == StepStatus::FailedTolerated;
                let message = message.unwrap_or_default().to_string();
                if tolerated {
                    log::warn!("[{step_id}] tolerated failure: {message}");
                } else {
                    log::error!("[{step_id}] {message}");
                }
                RunEventKind::StepFailed { step_index: index,
                                           step_id,
                                           tolerated,
                                           message }
            }
            StepStatus::Pending | StepStatus::Running => return,
        };
        self.event_store.append_kind(run_id, kind);
    }

    fn abort_run(&mut self, run_id: Uuid, reason: AbortReason, results: Vec<ExecutionResult>) -> RunOutcome {
        let text = match &reason {
            AbortReason::FatalStep { step_id } => format!("step '{step_id}' failed"),
            AbortReason::Signal => "abort signal".to_string(),
        };
        self.event_store.append_kind(run_id, RunEventKind::RunAborted { reason: text });
        RunOutcome { run_id,
                     status: RunStatus::Aborted,
                     abort_reason: Some(reason),
                     results }
    }
}

fn failed(step: &dyn StepDefinition, message: String) -> (StepStatus, Option<String>) {
    let status = match step.tolerance() {
        Tolerance::Fatal => StepStatus::FailedFatal,
        Tolerance::Tolerant => StepStatus::FailedTolerated,
    };
    (status, Some(message))
}

fn short(hash: &str) -> &str {
    &hash[..hash.len().min(12)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StepApplyError;
    use crate::host::{ClusterClient, HostCommand, InstallScript, Installer, ReleaseAsset, SystemProbe, WaitCondition};
    use crate::registry::StepRegistry;
    use crate::role::{resolve_role, Role, RoleDefaults, RoleInput};
    use crate::step::FnStep;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    // Host vacío: los FnStep de estos tests no consultan colaboradores.
    struct NullHost;

    impl SystemProbe for NullHost {
        fn has_binary(&self, _: &str) -> Result<bool, StepApplyError> { Ok(false) }
        fn has_file(&self, _: &Path) -> Result<bool, StepApplyError> { Ok(false) }
        fn service_active(&self, _: &str) -> Result<bool, StepApplyError> { Ok(false) }
        fn has_namespace(&self, _: &str) -> Result<bool, StepApplyError> { Ok(false) }
        fn has_deployment(&self, _: &str, _: &str) -> Result<bool, StepApplyError> { Ok(false) }
        fn condition_met(&self, _: &WaitCondition) -> Result<bool, StepApplyError> { Ok(false) }
    }

    impl Installer for NullHost {
        fn run_script(&self, _: &InstallScript) -> Result<(), StepApplyError> { Ok(()) }
        fn install_release(&self, _: &ReleaseAsset) -> Result<(), StepApplyError> { Ok(()) }
        fn install_file(&self, _: &Path, _: &Path) -> Result<(), StepApplyError> { Ok(()) }
        fn run_command(&self, _: &HostCommand) -> Result<(), StepApplyError> { Ok(()) }
    }

    impl ClusterClient for NullHost {
        fn create_namespace(&self, _: &str) -> Result<(), StepApplyError> { Ok(()) }
        fn apply_manifest(&self, _: &str, _: &str) -> Result<(), StepApplyError> { Ok(()) }
        fn wait_for(&self, _: &WaitCondition, _: Duration) -> Result<(), StepApplyError> { Ok(()) }
    }

    fn server_config() -> RoleConfig {
        resolve_role(RoleInput { role: "server".into(), ..Default::default() }, &RoleDefaults::default()).unwrap()
    }

    fn boom(_: &HostContext<'_>) -> Result<(), StepApplyError> {
        Err(StepApplyError::Collaborator("boom".into()))
    }

    #[test]
    fn satisfied_steps_are_skipped_without_apply() {
        let applied = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&applied);
        let mut b = StepRegistry::builder();
        b.register(FnStep::new("present").probe(|_| Ok(true)).apply(move |_| {
             counter.fetch_add(1, Ordering::SeqCst);
             Ok(())
         }))
         .unwrap();
        let plan = b.build().unwrap().resolve(Role::Server).unwrap();

        let mut engine = ExecutionEngine::new();
        let outcome = engine.run(&plan, &server_config(), &NullHost);
        assert_eq!(outcome.status_of("present"), Some(StepStatus::Skipped));
        assert_eq!(applied.load(Ordering::SeqCst), 0);
        assert_eq!(engine.event_variants(outcome.run_id), vec!["I", "S", "K", "C"]);
    }

    #[test]
    fn always_run_steps_ignore_probe() {
        let mut b = StepRegistry::builder();
        b.register(FnStep::new("login").always_run().probe(|_| Ok(true))).unwrap();
        let plan = b.build().unwrap().resolve(Role::Server).unwrap();
        let outcome = ExecutionEngine::new().run(&plan, &server_config(), &NullHost);
        assert_eq!(outcome.status_of("login"), Some(StepStatus::Applied));
    }

    #[test]
    fn probe_error_is_classified_by_tolerance() {
        let mut b = StepRegistry::builder();
        b.register(FnStep::new("flaky-probe").tolerant().probe(|_| Err(StepApplyError::Collaborator("no api".into()))))
         .unwrap()
         .register(FnStep::new("next"))
         .unwrap();
        let plan = b.build().unwrap().resolve(Role::Server).unwrap();
        let outcome = ExecutionEngine::new().run(&plan, &server_config(), &NullHost);
        assert_eq!(outcome.status_of("flaky-probe"), Some(StepStatus::FailedTolerated));
        assert!(outcome.results[0].message.as_deref().unwrap_or_default().contains("no api"));
        assert_eq!(outcome.status_of("next"), Some(StepStatus::Applied));
        assert!(outcome.is_completed());
    }

    #[test]
    fn fatal_failure_appends_aborted_event() {
        let mut b = StepRegistry::builder();
        b.register(FnStep::new("a")).unwrap()
         .register(FnStep::new("b").apply(boom)).unwrap()
         .register(FnStep::new("c")).unwrap();
        let plan = b.build().unwrap().resolve(Role::Server).unwrap();
        let mut engine = ExecutionEngine::new();
        let outcome = engine.run(&plan, &server_config(), &NullHost);
        assert_eq!(engine.event_variants(outcome.run_id), vec!["I", "S", "A", "S", "X", "B"]);
        assert_eq!(outcome.abort_reason, Some(AbortReason::FatalStep { step_id: "b".into() }));
        assert_eq!(outcome.fatal_failure().map(|r| r.step_id.as_str()), Some("b"));
    }

    #[test]
    fn completed_runs_over_same_state_share_fingerprint() {
        let mut b = StepRegistry::builder();
        b.register(FnStep::new("a")).unwrap();
        let plan = b.build().unwrap().resolve(Role::Server).unwrap();
        let mut engine = ExecutionEngine::new();
        let r1 = engine.run(&plan, &server_config(), &NullHost);
        let r2 = engine.run(&plan, &server_config(), &NullHost);
        let fp = |id| {
            engine.events_for(id).into_iter().find_map(|e| match e.kind {
                RunEventKind::RunCompleted { run_fingerprint } => Some(run_fingerprint),
                _ => None,
            })
        };
        assert_ne!(r1.run_id, r2.run_id);
        assert_eq!(fp(r1.run_id), fp(r2.run_id));
    }
}
