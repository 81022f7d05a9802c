use boot_core::constants::{EXIT_FATAL_STEP, EXIT_INVALID_INPUT, EXIT_REGISTRY};
use boot_core::BootstrapError;
use thiserror::Error;

use super::ConfigError;

/// Errores de la aplicación, cada uno con su código de salida.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("engine task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AppError {
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Bootstrap(e) if e.is_registry_error() => EXIT_REGISTRY,
            AppError::Bootstrap(e) if e.is_input_error() => EXIT_INVALID_INPUT,
            AppError::Config(_) => EXIT_INVALID_INPUT,
            _ => EXIT_FATAL_STEP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boot_core::Role;

    #[test]
    fn exit_codes_follow_error_family() {
        assert_eq!(AppError::from(BootstrapError::InvalidRole("x".into())).exit_code(), 2);
        assert_eq!(AppError::from(BootstrapError::EmptyPlan(Role::Agent)).exit_code(), 3);
        assert_eq!(AppError::from(ConfigError::MissingRole).exit_code(), 2);
        assert_eq!(AppError::from(std::io::Error::other("disk")).exit_code(), 1);
    }

    #[test]
    fn bootstrap_errors_display_unchanged() {
        let err = AppError::from(BootstrapError::DuplicateStep("install-docker".into()));
        assert_eq!(err.to_string(), "duplicate step id 'install-docker'");
    }
}
