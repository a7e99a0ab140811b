use std::os::fd::{AsRawFd, RawFd};
use std::path::Path;

use crate::core::env::EnvironmentStore;
use crate::error::{Result, ShellError};
use crate::process::fd::Pipe;
use crate::process::{Child, ExecPlan, Outcome, Redirects, Termination};

/// Runs two or more stages connected by pipes.
///
/// Every stage is exec'd directly. Stage stderr is inherited rather than
/// captured; a failing pipeline only reports a generic marker naming the
/// last stage.
#[derive(Debug)]
pub struct PipelineExecutor<'a> {
    env: &'a EnvironmentStore,
    cwd: &'a Path,
}

impl<'a> PipelineExecutor<'a> {
    pub fn new(env: &'a EnvironmentStore, cwd: &'a Path) -> Self {
        Self { env, cwd }
    }

    pub fn execute(&self, stages: &[Vec<String>]) -> Result<Outcome> {
        if stages.len() < 2 {
            return Err(ShellError::InvalidArgument(
                "pipeline needs at least two stages".to_string(),
            ));
        }
        if let Some(index) = stages.iter().position(|stage| stage.is_empty()) {
            return Err(ShellError::InvalidArgument(format!(
                "empty command in pipeline stage {}",
                index
            )));
        }

        let plans = stages
            .iter()
            .map(|stage| ExecPlan::direct(stage, self.env, self.cwd))
            .collect::<Result<Vec<_>>>()?;

        let mut pipes = Vec::with_capacity(plans.len() - 1);
        for _ in 1..plans.len() {
            // Pipes created so far are closed when `pipes` drops on error.
            pipes.push(Pipe::new().map_err(ShellError::PipeFailure)?);
        }

        let children = match Self::spawn_stages(&plans, &pipes) {
            Ok(children) => children,
            Err((spawned, err)) => {
                tracing::warn!(spawned = spawned.len(), error = %err, "fork failed mid-pipeline");
                Self::abandon(pipes, spawned);
                return Err(ShellError::ForkFailure(err));
            }
        };
        drop(pipes);

        let termination = Self::wait_all(children)?;
        let error = match termination {
            Termination::Exited(0) => None,
            other => {
                let last = plans.last().map(ExecPlan::name).unwrap_or_default();
                Some(format!("pipeline failed: {} {}", last, other))
            }
        };

        Ok(Outcome::new(termination, error))
    }

    fn spawn_stages(
        plans: &[ExecPlan],
        pipes: &[Pipe],
    ) -> std::result::Result<Vec<Child>, (Vec<Child>, std::io::Error)> {
        let all_fds: Vec<RawFd> = pipes.iter().flat_map(Pipe::raw_fds).collect();
        let mut children = Vec::with_capacity(plans.len());

        for (index, plan) in plans.iter().enumerate() {
            let redirects = Redirects {
                stdin: (index > 0).then(|| pipes[index - 1].read.as_raw_fd()),
                stdout: (index < pipes.len()).then(|| pipes[index].write.as_raw_fd()),
                stderr: None,
                close: all_fds.clone(),
            };
            tracing::trace!(stage = index, ?redirects, "wiring stage");

            match plan.spawn(&redirects) {
                Ok(child) => children.push(child),
                Err(e) => return Err((children, e)),
            }
        }

        Ok(children)
    }

    /// Reaps every stage and returns the last stage's termination.
    fn wait_all(mut children: Vec<Child>) -> Result<Termination> {
        let mut last = None;
        let mut first_error = None;
        let count = children.len();

        for (index, child) in children.iter_mut().enumerate() {
            match child.wait() {
                Ok(termination) if index + 1 == count => last = Some(termination),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(pid = child.pid(), error = %e, "wait failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match (last, first_error) {
            (Some(termination), _) => Ok(termination),
            (None, Some(e)) => Err(e.into()),
            (None, None) => Err(ShellError::InvalidArgument("pipeline has no stages".to_string())),
        }
    }

    /// Cleanup after a partial launch. The pipes go first so that stages
    /// blocked on them see EOF or EPIPE and can be reaped.
    fn abandon(pipes: Vec<Pipe>, mut spawned: Vec<Child>) {
        drop(pipes);
        Self::reap_all(&mut spawned);
    }

    fn reap_all(children: &mut [Child]) {
        for child in children.iter_mut() {
            if let Err(e) = child.wait() {
                tracing::warn!(pid = child.pid(), error = %e, "failed to reap stage");
            }
        }
    }
}
