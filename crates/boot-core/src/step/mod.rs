//! Definiciones relacionadas a Steps.
//!
//! Un Step es una acción de aprovisionamiento idempotente: un probe que
//! responde si ya está satisfecho y una acción `apply` que lo satisface.
//! Este módulo define:
//! - `StepDefinition`: interfaz neutral usada por el registro y el engine.
//! - `FnStep`: step construido a partir de closures (catálogos ad hoc, tests).
//! - `StepStatus` y `ExecutionResult`: estado y resultado por step.

pub mod definition;
pub mod fn_step;
mod run_result;
mod status;

pub use definition::{Idempotency, StepDefinition, Tolerance};
pub use fn_step::FnStep;
pub use run_result::ExecutionResult;
pub use status::StepStatus;
