//! Implementaciones de `boot_core::Host`.

mod dry_run;
mod shell;
mod simulated;

pub use dry_run::DryRunHost;
pub use shell::ShellHost;
pub use simulated::{SimFailure, SimState, SimulatedHost};
