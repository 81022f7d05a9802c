use serde::{Deserialize, Serialize};

/// Estado de un Step dentro de una corrida.
///
/// Las transiciones válidas son:
/// - `Pending` -> `Running`
/// - `Running` -> `Skipped` | `Applied` | `FailedFatal` | `FailedTolerated`
///
/// Un step que nunca se intentó queda en `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    Pending,
    Running,
    /// El probe reportó que ya estaba satisfecho.
    Skipped,
    Applied,
    FailedFatal,
    FailedTolerated,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StepStatus::Pending | StepStatus::Running)
    }

    /// Un dependiente sólo puede aplicarse sobre estos estados.
    pub fn unblocks_dependents(&self) -> bool {
        matches!(self, StepStatus::Applied | StepStatus::Skipped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Skipped => "skipped",
            StepStatus::Applied => "applied",
            StepStatus::FailedFatal => "failed-fatal",
            StepStatus::FailedTolerated => "failed-tolerated",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
