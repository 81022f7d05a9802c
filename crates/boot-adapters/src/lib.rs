//! boot-adapters: colaboradores concretos y catálogo de steps de k3s.
//!
//! Este crate provee:
//! - `ShellHost`: invoca binarios reales (`sh`, `curl`, `kubectl`, `systemctl`).
//! - `DryRunHost`: registra lo que haría sin tocar el sistema.
//! - `SimulatedHost`: modelo en memoria del nodo, con inyección de fallos,
//!   usado en tests y con `--simulate`.
//! - `catalog::default_registry`: el catálogo de steps (docker, k3s,
//!   kubectl, helm, k9s, namespaces, ArgoCD) en orden de registro.
//!
//! Nota: las URLs y versiones de los instaladores viven en `steps`; el core
//! sólo ve `InstallScript` / `ReleaseAsset`.

pub mod catalog;
pub mod host;
pub mod steps;

pub use catalog::default_registry;
pub use host::{DryRunHost, ShellHost, SimFailure, SimState, SimulatedHost};
