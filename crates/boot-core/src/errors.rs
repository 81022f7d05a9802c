//! Errores del core.
//!
//! `BootstrapError` cubre las tres familias que el motor distingue:
//! construcción del registro (errores de programación), validación de la
//! entrada (antes de ejecutar cualquier step) y fallos de aplicación en
//! tiempo de ejecución. `StepApplyError` es lo que devuelven los
//! colaboradores externos y los steps.

use thiserror::Error;

use crate::role::Role;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("duplicate step id '{0}'")]
    DuplicateStep(String),
    #[error("step '{step}' depends on unknown step '{dependency}'")]
    UnknownDependency { step: String, dependency: String },
    #[error("cyclic dependency among steps: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),
    #[error("step '{step}' depends on '{dependency}', which is not selected for role {role}")]
    DependencyNotSelected { step: String, dependency: String, role: Role },
    #[error("no steps apply to role {0}")]
    EmptyPlan(Role),
    #[error("invalid role '{0}' (expected 'server' or 'agent')")]
    InvalidRole(String),
    #[error("role agent requires join parameters (missing: {})", .missing.join(", "))]
    MissingJoinParameters { missing: Vec<&'static str> },
    #[error("invalid namespace '{0}' (must be a DNS-1123 label)")]
    InvalidNamespace(String),
    #[error("step '{step}' failed: {source}")]
    StepApply {
        step: String,
        #[source]
        source: StepApplyError,
    },
}

impl BootstrapError {
    /// Errores de validación de entrada: se reportan antes de ejecutar steps.
    pub fn is_input_error(&self) -> bool {
        matches!(self,
                 BootstrapError::InvalidRole(_)
                 | BootstrapError::MissingJoinParameters { .. }
                 | BootstrapError::InvalidNamespace(_))
    }

    /// Errores detectados al construir o resolver el registro.
    pub fn is_registry_error(&self) -> bool {
        matches!(self,
                 BootstrapError::DuplicateStep(_)
                 | BootstrapError::UnknownDependency { .. }
                 | BootstrapError::CyclicDependency(_)
                 | BootstrapError::DependencyNotSelected { .. }
                 | BootstrapError::EmptyPlan(_))
    }
}

/// Fallo reportado por un probe o por la acción `apply` de un step.
#[derive(Debug, Error)]
pub enum StepApplyError {
    #[error("command `{program}` exited with {}: {stderr}", code.map(|c| c.to_string()).unwrap_or_else(|| "signal".into()))]
    CommandFailed { program: String, code: Option<i32>, stderr: String },
    #[error("timed out after {secs}s waiting for {what}")]
    Timeout { what: String, secs: u64 },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Collaborator(String),
}
