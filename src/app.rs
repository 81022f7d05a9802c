//! Cableado de la aplicación: configuración → rol → plan → ejecución → reporte.
//!
//! `main.rs` sólo traduce la CLI a estas funciones; todo lo que aquí vive es
//! sincrónico y se puede probar sin runtime.
use std::fmt;

use boot_adapters::{default_registry, DryRunHost, ShellHost, SimulatedHost};
use boot_core::{resolve_role, summarize, AbortSignal, ExecutionEngine, Host, ResolvedPlan, RoleConfig, RoleInput, RunReport,
                StepDefinition, StepRegistry, Tolerance};
use serde::Serialize;

use crate::config::AppConfig;
use crate::errors::{AppError, ConfigError};

/// Contra qué host se ejecuta el plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostMode {
    /// Comandos reales.
    #[default]
    Shell,
    /// Sólo registra lo que haría.
    DryRun,
    /// Modelo en memoria del nodo.
    Simulated,
}

/// Rol validado y plan resuelto, listos para ejecutar.
#[derive(Debug)]
pub struct Prepared {
    pub config: RoleConfig,
    pub plan: ResolvedPlan,
}

/// Combina entorno y CLI, valida el rol y resuelve el plan.
pub fn prepare(app: &AppConfig, cli: RoleInput) -> Result<Prepared, AppError> {
    let input = app.merge(cli);
    if input.role.trim().is_empty() {
        return Err(ConfigError::MissingRole.into());
    }
    let config = resolve_role(input, &app.defaults)?;
    let registry = default_registry()?;
    let plan = registry.resolve_for(&config)?;
    tracing::debug!(role = %config.role, steps = plan.len(), plan_hash = plan.plan_hash(), "plan resolved");
    Ok(Prepared { config, plan })
}

/// Ejecuta el plan. Siempre produce un reporte, también si la corrida se aborta.
pub fn execute(prepared: &Prepared, mode: HostMode, abort: AbortSignal) -> RunReport {
    let Prepared { config, plan } = prepared;
    match mode {
        HostMode::Shell => {
            let host = ShellHost::new().with_kubeconfig(&config.kubeconfig_path);
            run_on(plan, config, &host, abort)
        }
        HostMode::DryRun => run_on(plan, config, &DryRunHost::new(), abort),
        HostMode::Simulated => run_on(plan, config, &SimulatedHost::new(), abort),
    }
}

fn run_on<H: Host>(plan: &ResolvedPlan, config: &RoleConfig, host: &H, abort: AbortSignal) -> RunReport {
    let mut engine = ExecutionEngine::new().with_abort_signal(abort);
    let outcome = engine.run(plan, config, host);
    summarize(plan, &outcome)
}

/// Vista serializable de un step.
#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    pub id: String,
    pub description: String,
    pub depends_on: Vec<String>,
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    pub tolerant: bool,
}

impl StepView {
    fn of(step: &dyn StepDefinition) -> Self {
        Self { id: step.id().to_string(),
               description: step.description().to_string(),
               depends_on: step.depends_on().iter().map(|d| d.to_string()).collect(),
               roles: step.roles().iter().map(|r| r.to_string()).collect(),
               component: step.component().map(|c| format!("{c:?}").to_lowercase()),
               tolerant: step.tolerance() == Tolerance::Tolerant }
    }
}

impl fmt::Display for StepView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<22} {}", self.id, self.description)?;
        if !self.depends_on.is_empty() {
            write!(f, " (after {})", self.depends_on.join(", "))?;
        }
        if self.tolerant {
            f.write_str(" [tolerant]")?;
        }
        Ok(())
    }
}

/// Plan resuelto tal como lo imprime `bootflow plan`.
#[derive(Debug, Clone, Serialize)]
pub struct PlanView {
    pub role: String,
    pub plan_hash: String,
    pub steps: Vec<StepView>,
}

impl PlanView {
    pub fn of(plan: &ResolvedPlan) -> Self {
        Self { role: plan.role().to_string(),
               plan_hash: plan.plan_hash().to_string(),
               steps: plan.steps().iter().map(|s| StepView::of(s.as_ref())).collect() }
    }
}

impl fmt::Display for PlanView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "plan for role {} ({})", self.role, self.plan_hash)?;
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(f, "{:>3}. {step}", i + 1)?;
        }
        Ok(())
    }
}

/// Catálogo completo, en orden de registro.
pub fn catalog() -> Result<Vec<StepView>, AppError> {
    let registry: StepRegistry = default_registry()?;
    Ok(registry.iter().map(|s| StepView::of(s.as_ref())).collect())
}
