use std::path::{Path, PathBuf};

mod loader;

pub use loader::RcLoader;

/// Default bound on captured standard-error bytes.
pub const DEFAULT_CAPTURE_LIMIT: usize = 4096;

const FALLBACK_SHELL: &str = "/bin/sh";

/// How an external command is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecMode {
    /// Exec the argument vector directly; argument boundaries are preserved.
    #[default]
    Direct,
    /// Join the arguments with spaces and hand the string to `$SHELL -c`.
    /// Shell syntax works, but quoting inside arguments is lost.
    LoginShell,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub mode: ExecMode,
    pub capture_limit: usize,
    pub login_shell: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: ExecMode::Direct,
            capture_limit: DEFAULT_CAPTURE_LIMIT,
            login_shell: None,
        }
    }
}

impl SessionConfig {
    pub fn with_mode(mut self, mode: ExecMode) -> Self {
        self.mode = mode;
        self
    }

    /// Picks the shell for `ExecMode::LoginShell`: the configured override,
    /// then the session's `SHELL`, then `/bin/sh`.
    pub fn resolve_login_shell<'a>(&'a self, session_shell: Option<&'a str>) -> &'a Path {
        match (&self.login_shell, session_shell) {
            (Some(path), _) => path.as_path(),
            (None, Some(shell)) if !shell.is_empty() => Path::new(shell),
            _ => Path::new(FALLBACK_SHELL),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: invalid assignment: {content}")]
    InvalidLine { line: usize, content: String },
}
