//! boot-core: orquestador declarativo de bootstrap de nodos.
//!
//! Registro de steps idempotentes, resolución por rol, ejecución secuencial
//! y reporte. El core no ejecuta procesos ni toca la red: todo efecto pasa
//! por los colaboradores de `host`.
pub mod constants;
pub mod engine;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod host;
pub mod registry;
pub mod report;
pub mod role;
pub mod step;

pub use engine::{AbortReason, AbortSignal, ExecutionEngine, RunOutcome, RunStatus};
pub use errors::{BootstrapError, StepApplyError};
pub use event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
pub use host::{ClusterClient, Host, HostCommand, HostContext, InstallScript, Installer, ReleaseAsset, SystemProbe, WaitCondition};
pub use registry::{RegistryBuilder, ResolvedPlan, StepRegistry};
pub use report::{summarize, ReportEntry, RunReport, StatusCounts};
pub use role::{resolve_role, Component, JoinParameters, RegistryLogin, Role, RoleConfig, RoleDefaults, RoleInput};
pub use step::{ExecutionResult, FnStep, Idempotency, StepDefinition, StepStatus, Tolerance};
