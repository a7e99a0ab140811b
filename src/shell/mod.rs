use std::env;
use std::io::IsTerminal;
use std::path::Path;

mod executor;
mod pipeline;

pub use pipeline::PipelineExecutor;

use crate::core::commands::change_dir;
use crate::core::config::{ExecMode, SessionConfig};
use crate::core::env::EnvironmentStore;
use crate::error::{Result, ShellError};
use crate::process::{CommandExecutor, Outcome, Termination};

use executor::CommandHandler;

/// Per-session shell state: an owned environment, the working directory
/// and the outcome of the most recent operation.
///
/// A session is not meant to be shared; callers that need concurrent
/// access must synchronise externally. Directory changes affect the whole
/// process, since children inherit the real working directory.
#[derive(Debug)]
pub struct ShellSession {
    pub(crate) environment: EnvironmentStore,
    pub(crate) cwd: String,
    pub(crate) last_exit_code: i32,
    pub(crate) interactive: bool,
    pub(crate) last_error: Option<String>,
    pub(crate) executor: CommandExecutor,
}

impl ShellSession {
    pub fn create() -> Result<Self> {
        Self::with_config(SessionConfig::default())
    }

    /// Snapshots the host environment and working directory.
    pub fn with_config(config: SessionConfig) -> Result<Self> {
        let environment = EnvironmentStore::from_host()?;
        let cwd = env::current_dir()?.to_string_lossy().into_owned();

        let mut session = Self::from_parts(environment, cwd, config);
        session.interactive = std::io::stdin().is_terminal();

        tracing::debug!(
            cwd = %session.cwd,
            vars = session.environment.len(),
            interactive = session.interactive,
            mode = ?session.executor.config().mode,
            "session created"
        );
        Ok(session)
    }

    /// Builds a non-interactive session from explicit parts without
    /// consulting the host.
    pub fn from_parts(environment: EnvironmentStore, cwd: String, config: SessionConfig) -> Self {
        Self {
            environment,
            cwd,
            last_exit_code: 0,
            interactive: false,
            last_error: None,
            executor: CommandExecutor::new(config),
        }
    }

    /// Releases the session held in `slot`; a no-op when already released.
    pub fn destroy(slot: &mut Option<ShellSession>) {
        if let Some(session) = slot.take() {
            tracing::debug!(cwd = %session.cwd, "session destroyed");
        }
    }

    /// Runs one command: a builtin such as `cd`, or an external program.
    pub fn execute(&mut self, command: &[String]) -> Result<Outcome> {
        let result = self.dispatch(command);
        self.record(result)
    }

    /// Runs `stages` connected by pipes. A single stage behaves exactly
    /// like [`ShellSession::execute`].
    pub fn execute_pipeline(&mut self, stages: &[Vec<String>]) -> Result<Outcome> {
        let result = match stages {
            [] => Err(ShellError::InvalidArgument("empty pipeline".to_string())),
            [single] => self.dispatch(single),
            _ => PipelineExecutor::new(&self.environment, Path::new(&self.cwd)).execute(stages),
        };
        self.record(result)
    }

    pub fn change_directory(&mut self, path: &str) -> Result<Outcome> {
        let result = self.chdir(path);
        self.record(result)
    }

    pub(crate) fn chdir(&mut self, path: &str) -> Result<Outcome> {
        let new_cwd = change_dir(path).inspect_err(|e| {
            tracing::debug!(path, error = %e, "cd rejected");
        })?;

        tracing::debug!(from = %self.cwd, to = %new_cwd, "changed directory");
        let old_cwd = std::mem::replace(&mut self.cwd, new_cwd);
        // The directory has already changed; bookkeeping must not undo that.
        if let Err(e) = Self::record_pwd(&mut self.environment, &old_cwd, &self.cwd) {
            tracing::warn!(error = %e, "failed to update PWD/OLDPWD");
        }
        Ok(Outcome::new(Termination::Exited(0), None))
    }

    fn record_pwd(env: &mut EnvironmentStore, old_cwd: &str, new_cwd: &str) -> Result<()> {
        env.set("OLDPWD", old_cwd)?;
        env.set("PWD", new_cwd)
    }

    pub fn get_variable(&self, name: &str) -> Option<&str> {
        self.environment.get(name)
    }

    pub fn set_variable(&mut self, name: &str, value: &str) -> Result<()> {
        self.environment.set(name, value)
    }

    pub fn unset_variable(&mut self, name: &str) -> bool {
        self.environment.unset(name)
    }

    pub fn set_mode(&mut self, mode: ExecMode) {
        tracing::debug!(?mode, "execution mode changed");
        self.executor.set_mode(mode);
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn last_exit_code(&self) -> i32 {
        self.last_exit_code
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn environment(&self) -> impl Iterator<Item = (&str, &str)> {
        self.environment.iter()
    }

    pub fn environment_mut(&mut self) -> &mut EnvironmentStore {
        &mut self.environment
    }

    pub fn var_count(&self) -> usize {
        self.environment.len()
    }

    pub fn config(&self) -> &SessionConfig {
        self.executor.config()
    }

    fn record(&mut self, result: Result<Outcome>) -> Result<Outcome> {
        match &result {
            Ok(outcome) => {
                self.last_exit_code = outcome.exit_code;
                self.last_error = outcome.error.clone();
            }
            Err(e) => {
                self.last_exit_code = e.exit_code();
                self.last_error = Some(e.diagnostic());
            }
        }
        result
    }
}
