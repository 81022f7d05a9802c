use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::step::{ExecutionResult, StepStatus};

/// Estado terminal de una corrida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Aborted,
}

/// Motivo por el que una corrida terminó en `Aborted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum AbortReason {
    /// Un step fatal falló.
    FatalStep { step_id: String },
    /// Se levantó la señal de aborto entre dos steps.
    Signal,
}

/// Resultado de `ExecutionEngine::run`.
///
/// `results` sólo contiene los steps intentados, en orden de ejecución.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub abort_reason: Option<AbortReason>,
    pub results: Vec<ExecutionResult>,
}

impl RunOutcome {
    pub fn status_of(&self, step_id: &str) -> Option<StepStatus> {
        self.results.iter().find(|r| r.step_id == step_id).map(|r| r.status)
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Step fatal que detuvo la corrida, si lo hubo.
    pub fn fatal_failure(&self) -> Option<&ExecutionResult> {
        self.results.iter().find(|r| r.status == StepStatus::FailedFatal)
    }

    pub fn count(&self, status: StepStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}
