use std::path::Path;

use super::{ErrorCapture, ExecPlan, Outcome, Termination};
use crate::core::config::{ExecMode, SessionConfig};
use crate::core::env::EnvironmentStore;
use crate::error::{Result, ShellError};

/// Runs a single external command with its standard error captured.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    config: SessionConfig,
}

impl CommandExecutor {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn set_mode(&mut self, mode: ExecMode) {
        self.config.mode = mode;
    }

    pub fn plan(&self, args: &[String], env: &EnvironmentStore, cwd: &Path) -> Result<ExecPlan> {
        if args.is_empty() {
            return Err(ShellError::InvalidArgument("empty command".to_string()));
        }
        match self.config.mode {
            ExecMode::Direct => ExecPlan::direct(args, env, cwd),
            ExecMode::LoginShell => {
                let shell = self.config.resolve_login_shell(env.get("SHELL"));
                ExecPlan::login_shell(args, env, cwd, shell)
            }
        }
    }

    /// Blocks until the child has exited and been reaped.
    pub fn spawn_process(
        &self,
        args: &[String],
        env: &EnvironmentStore,
        cwd: &Path,
    ) -> Result<Outcome> {
        let plan = self.plan(args, env, cwd)?;
        let capture = ErrorCapture::new()?;

        let mut child = plan
            .spawn(&capture.redirects())
            .map_err(ShellError::ForkFailure)?;

        let captured = capture.collect(self.config.capture_limit);
        let termination = child.wait()?;

        let error = match termination {
            Termination::Exited(code) if code != 0 && !captured.is_empty() => Some(captured),
            _ => None,
        };
        if let Some(text) = &error {
            tracing::debug!(program = plan.name(), %termination, error = %text, "command failed");
        }

        Ok(Outcome::new(termination, error))
    }
}
