//! Tipos de evento de una corrida y estructura `RunEvent`.
//!
//! Rol en el flujo:
//! - Cada corrida del `ExecutionEngine` emite eventos a un `EventStore`
//!   append-only.
//! - Los eventos son la traza auditable de qué se aplicó, qué se omitió y
//!   qué falló; el `RunReport` es un resumen derivado de la misma corrida.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEventKind {
    /// Primer evento de un `run_id`: fija el plan que se va a ejecutar.
    RunInitialized { plan_hash: String, role: Role, step_count: usize },
    /// Un step pasó a `Running`. No implica éxito.
    StepStarted { step_index: usize, step_id: String },
    /// El probe reportó el step como ya satisfecho.
    StepSkipped { step_index: usize, step_id: String },
    StepApplied { step_index: usize, step_id: String },
    /// Fallo del step; `tolerated = false` implica que la corrida se detiene.
    StepFailed {
        step_index: usize,
        step_id: String,
        tolerated: bool,
        message: String,
    },
    /// La corrida terminó antes de recorrer todo el plan.
    RunAborted { reason: String },
    /// Cierre con fingerprint de la corrida (plan + estado final por step).
    RunCompleted { run_fingerprint: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub seq: u64, // asignado por el store (orden append)
    pub run_id: Uuid,
    pub kind: RunEventKind,
    pub ts: DateTime<Utc>,
}
