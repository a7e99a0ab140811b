use std::fmt;

pub mod capture;
pub mod executor;
pub mod fd;
pub mod signal;
pub mod spawn;

pub use capture::ErrorCapture;
pub use executor::CommandExecutor;
pub use spawn::{Child, ExecPlan, Redirects};

/// Conventional exit status of a child whose exec failed.
pub const EXEC_FAILURE_STATUS: i32 = 127;

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited(i32),
    Signaled(i32),
}

impl Termination {
    /// Exit status as reported to callers; abnormal termination maps to -1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Termination::Exited(code) => *code,
            Termination::Signaled(_) => -1,
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Exited(code) => write!(f, "exited with status {}", code),
            Termination::Signaled(signo) => write!(f, "terminated by signal {}", signo),
        }
    }
}

/// Result of running a command or pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub exit_code: i32,
    pub error: Option<String>,
    pub termination: Termination,
}

impl Outcome {
    pub fn new(termination: Termination, error: Option<String>) -> Self {
        Self {
            exit_code: termination.exit_code(),
            error,
            termination,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
