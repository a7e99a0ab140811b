use crate::core::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("memory allocation failed")]
    AllocationFailure,
    #[error("pipe creation failed: {0}")]
    PipeFailure(#[source] std::io::Error),
    #[error("fork failed: {0}")]
    ForkFailure(#[source] std::io::Error),
    #[error("{0}")]
    CdFailure(String),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("signal handler error: {0}")]
    Signal(#[from] ctrlc::Error),
}

impl ShellError {
    /// Exit code recorded on the session when an operation fails with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ShellError::CdFailure(_) => 1,
            _ => -1,
        }
    }

    /// Text recorded as the session's `last_error`.
    pub fn diagnostic(&self) -> String {
        match self {
            ShellError::CdFailure(reason) => reason.clone(),
            other => other.to_string(),
        }
    }
}

impl From<std::collections::TryReserveError> for ShellError {
    fn from(_: std::collections::TryReserveError) -> Self {
        ShellError::AllocationFailure
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;
