use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StepStatus;

/// Resultado final de un step en una corrida.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub step_id: String,
    pub status: StepStatus,
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ExecutionResult {
    pub fn new(step_id: impl Into<String>, status: StepStatus, message: Option<String>) -> Self {
        Self { step_id: step_id.into(),
               status,
               at: Utc::now(),
               message }
    }
}
