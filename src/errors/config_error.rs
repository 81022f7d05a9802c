use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("incomplete registry credentials: {missing} is not set")]
    IncompleteRegistry { missing: &'static str },
    #[error("no role given (use --role or BOOTFLOW_ROLE)")]
    MissingRole,
}
