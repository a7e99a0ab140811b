pub mod error;

pub mod core;
pub mod process;
pub mod shell;

pub use crate::core::config::{ExecMode, SessionConfig};
pub use crate::error::ShellError;
pub use crate::process::{Outcome, Termination};
pub use crate::shell::ShellSession;
