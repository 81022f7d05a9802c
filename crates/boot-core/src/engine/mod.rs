//! Engine module: ejecución secuencial de un `ResolvedPlan`.
//!
//! Provides the engine itself, the abort signal observed between steps and
//! the outcome value returned by a run.

pub mod abort;
pub mod core;
pub mod outcome;

pub use abort::AbortSignal;
pub use self::core::ExecutionEngine;
pub use outcome::{AbortReason, RunOutcome, RunStatus};
