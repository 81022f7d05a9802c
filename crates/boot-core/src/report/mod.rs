//! State Reporter: resumen legible (y serializable) de una corrida.
//!
//! `summarize` es puro: no imprime ni registra nada. Imprimir el reporte es
//! responsabilidad de quien lo pide.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::constants::{EXIT_ABORTED, EXIT_FATAL_STEP, EXIT_OK};
use crate::engine::{AbortReason, RunOutcome, RunStatus};
use crate::registry::ResolvedPlan;
use crate::role::Role;
use crate::step::StepStatus;

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub step_id: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub applied: usize,
    pub skipped: usize,
    pub failed_fatal: usize,
    pub failed_tolerated: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub role: Role,
    pub plan_hash: String,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<AbortReason>,
    pub entries: Vec<ReportEntry>,
    pub counts: StatusCounts,
}

/// Construye el reporte de `outcome`. Los steps del plan que no llegaron a
/// intentarse aparecen como `pending`, en su posición del plan.
pub fn summarize(plan: &ResolvedPlan, outcome: &RunOutcome) -> RunReport {
    let mut counts = StatusCounts::default();
    let entries: Vec<ReportEntry> = plan.steps()
                                        .iter()
                                        .map(|step| {
                                            let result = outcome.results.iter().find(|r| r.step_id == step.id());
                                            let entry = match result {
                                                Some(r) => ReportEntry { step_id: r.step_id.clone(),
                                                                         status: r.status,
                                                                         at: Some(r.at),
                                                                         message: r.message.clone() },
                                                None => ReportEntry { step_id: step.id().to_string(),
                                                                      status: StepStatus::Pending,
                                                                      at: None,
                                                                      message: None },
                                            };
                                            counts.bump(entry.status);
                                            entry
                                        })
                                        .collect();

    RunReport { run_id: outcome.run_id,
                role: plan.role(),
                plan_hash: plan.plan_hash().to_string(),
                status: outcome.status,
                abort_reason: outcome.abort_reason.clone(),
                entries,
                counts }
}

impl StatusCounts {
    fn bump(&mut self, status: StepStatus) {
        match status {
            StepStatus::Applied => self.applied += 1,
            StepStatus::Skipped => self.skipped += 1,
            StepStatus::FailedFatal => self.failed_fatal += 1,
            StepStatus::FailedTolerated => self.failed_tolerated += 1,
            StepStatus::Pending | StepStatus::Running => self.pending += 1,
        }
    }
}

impl RunReport {
    /// 0 si completó (aun con fallos tolerados), 1 ante fallo fatal, 130 si
    /// se abortó por señal.
    pub fn exit_code(&self) -> i32 {
        match (&self.status, &self.abort_reason) {
            (RunStatus::Completed, _) => EXIT_OK,
            (RunStatus::Aborted, Some(AbortReason::Signal)) => EXIT_ABORTED,
            (RunStatus::Aborted, _) => EXIT_FATAL_STEP,
        }
    }

    pub fn entry(&self, step_id: &str) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.step_id == step_id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match (&self.status, &self.abort_reason) {
            (RunStatus::Completed, _) => "completed".to_string(),
            (RunStatus::Aborted, Some(AbortReason::FatalStep { step_id })) => format!("aborted (step '{step_id}' failed)"),
            (RunStatus::Aborted, _) => "aborted (signal)".to_string(),
        };
        writeln!(f, "run {} role={} plan={}: {}", self.run_id, self.role, &self.plan_hash[..self.plan_hash.len().min(12)], status)?;
        let width = self.entries.iter().map(|e| e.step_id.len()).max().unwrap_or(0);
        for e in &self.entries {
            match &e.message {
                Some(m) => writeln!(f, "  {:<16} {:<width$}  {}", e.status.as_str(), e.step_id, m)?,
                None => writeln!(f, "  {:<16} {}", e.status.as_str(), e.step_id)?,
            }
        }
        let c = &self.counts;
        write!(f,
               "{} applied, {} skipped, {} failed (fatal), {} failed (tolerated), {} pending",
               c.applied, c.skipped, c.failed_fatal, c.failed_tolerated, c.pending)
    }
}
