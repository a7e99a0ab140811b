use std::ffi::{CStr, CString};
use std::io;
use std::os::fd::RawFd;
use std::os::raw::c_char;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use super::fd::errno_text;
use super::{Termination, EXEC_FAILURE_STATUS};
use crate::core::env::EnvironmentStore;
use crate::error::{Result, ShellError};

/// Used when the session has no `PATH`, matching the usual libc default.
const DEFAULT_PATH: &str = "/usr/bin:/bin";

/// Exec errors that get a preformatted diagnostic. The child can only
/// write bytes prepared before the fork.
const REPORTED_ERRNOS: &[i32] = &[
    libc::ENOENT,
    libc::EACCES,
    libc::EPERM,
    libc::ENOEXEC,
    libc::ENOTDIR,
    libc::EISDIR,
    libc::ELOOP,
    libc::ENAMETOOLONG,
    libc::E2BIG,
    libc::ENOMEM,
    libc::ETXTBSY,
];

/// Everything a forked child needs to exec a program, prepared in the
/// parent so the child only makes async-signal-safe calls.
#[derive(Debug)]
pub struct ExecPlan {
    name: String,
    program: Option<CString>,
    argv: Vec<CString>,
    envp: Vec<CString>,
    diagnostics: Vec<(i32, Vec<u8>)>,
    fallback_diagnostic: Vec<u8>,
}

/// Descriptor wiring applied in the child before exec.
#[derive(Debug, Default)]
pub struct Redirects {
    pub stdin: Option<RawFd>,
    pub stdout: Option<RawFd>,
    pub stderr: Option<RawFd>,
    /// Closed after the redirects are in place.
    pub close: Vec<RawFd>,
}

impl ExecPlan {
    /// Execs `argv[0]` directly with `argv` as its argument vector,
    /// resolving bare names against the session `PATH`.
    pub fn direct(argv: &[String], env: &EnvironmentStore, cwd: &Path) -> Result<Self> {
        let name = argv
            .first()
            .ok_or_else(|| ShellError::InvalidArgument("empty command".to_string()))?;
        let program = resolve_program(name, env, cwd);
        Self::build(name, program, argv, env)
    }

    /// Joins `argv` with spaces and runs it through `shell -c`.
    pub fn login_shell(
        argv: &[String],
        env: &EnvironmentStore,
        cwd: &Path,
        shell: &Path,
    ) -> Result<Self> {
        if argv.is_empty() {
            return Err(ShellError::InvalidArgument("empty command".to_string()));
        }
        let shell_name = shell.to_string_lossy().into_owned();
        let program = resolve_program(&shell_name, env, cwd);
        let shell_argv = [shell_name.clone(), "-c".to_string(), argv.join(" ")];
        Self::build(&shell_name, program, &shell_argv, env)
    }

    fn build(
        name: &str,
        program: Option<PathBuf>,
        argv: &[String],
        env: &EnvironmentStore,
    ) -> Result<Self> {
        let program = program
            .map(|path| CString::new(path.as_os_str().as_bytes()))
            .transpose()
            .map_err(|_| nul_error(name))?;

        let argv = argv
            .iter()
            .map(|arg| CString::new(arg.as_bytes()).map_err(|_| nul_error(arg)))
            .collect::<Result<Vec<_>>>()?;

        let diagnostics = REPORTED_ERRNOS
            .iter()
            .map(|&errno| (errno, format!("{}: {}\n", name, errno_text(errno)).into_bytes()))
            .collect();

        Ok(Self {
            name: name.to_string(),
            program,
            argv,
            envp: env.to_envp(),
            diagnostics,
            fallback_diagnostic: format!("{}: exec failed\n", name).into_bytes(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved executable, or `None` when the name was not found on `PATH`.
    pub fn program(&self) -> Option<&CStr> {
        self.program.as_deref()
    }

    pub fn args(&self) -> impl Iterator<Item = &CStr> {
        self.argv.iter().map(CString::as_c_str)
    }

    /// Forks a child that applies `redirects` and execs this plan.
    pub fn spawn(&self, redirects: &Redirects) -> io::Result<Child> {
        let argv_ptrs = null_terminated(&self.argv);
        let envp_ptrs = null_terminated(&self.envp);

        // SAFETY: the child branch only calls async-signal-safe functions on
        // data prepared above and never returns.
        let pid = unsafe { libc::fork() };
        match pid {
            -1 => Err(io::Error::last_os_error()),
            0 => unsafe { self.exec_child(redirects, &argv_ptrs, &envp_ptrs) },
            pid => {
                tracing::debug!(program = %self.name, pid, "spawned child");
                Ok(Child::new(pid))
            }
        }
    }

    unsafe fn exec_child(
        &self,
        redirects: &Redirects,
        argv: &[*const c_char],
        envp: &[*const c_char],
    ) -> ! {
        // The Rust runtime ignores SIGPIPE and ignored dispositions survive exec.
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);

        let wiring = [
            (redirects.stdin, libc::STDIN_FILENO),
            (redirects.stdout, libc::STDOUT_FILENO),
            (redirects.stderr, libc::STDERR_FILENO),
        ];
        for (source, target) in wiring {
            let Some(source) = source else { continue };
            let ok = if source == target {
                libc::fcntl(target, libc::F_SETFD, 0) != -1
            } else {
                libc::dup2(source, target) != -1
            };
            if !ok {
                libc::_exit(EXEC_FAILURE_STATUS);
            }
        }

        for &fd in &redirects.close {
            // Standard streams were just installed above.
            if fd > libc::STDERR_FILENO {
                libc::close(fd);
            }
        }

        let errno = match &self.program {
            Some(program) => {
                libc::execve(program.as_ptr(), argv.as_ptr(), envp.as_ptr());
                io::Error::last_os_error().raw_os_error().unwrap_or(0)
            }
            None => libc::ENOENT,
        };

        let message = self
            .diagnostics
            .iter()
            .find(|(code, _)| *code == errno)
            .map(|(_, text)| text.as_slice())
            .unwrap_or(self.fallback_diagnostic.as_slice());
        libc::write(libc::STDERR_FILENO, message.as_ptr().cast(), message.len());
        libc::_exit(EXEC_FAILURE_STATUS)
    }
}

fn resolve_program(name: &str, env: &EnvironmentStore, cwd: &Path) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    if name.contains('/') {
        return Some(PathBuf::from(name));
    }
    let paths = env.get("PATH").unwrap_or(DEFAULT_PATH);
    which::which_in(name, Some(paths), cwd)
        .ok()
        .or_else(|| first_existing_on_path(name, paths, cwd))
}

/// `which` skips entries that are not executable. Handing execve the first
/// one that exists lets it report EACCES instead of a misleading ENOENT.
fn first_existing_on_path(name: &str, paths: &str, cwd: &Path) -> Option<PathBuf> {
    std::env::split_paths(paths)
        .map(|dir| cwd.join(dir).join(name))
        .find(|candidate| candidate.exists())
}

fn null_terminated(strings: &[CString]) -> Vec<*const c_char> {
    strings
        .iter()
        .map(|s| s.as_ptr())
        .chain(std::iter::once(std::ptr::null()))
        .collect()
}

fn nul_error(arg: &str) -> ShellError {
    ShellError::InvalidArgument(format!("argument contains NUL byte: {:?}", arg))
}

/// Handle to a forked child. Dropping an unreaped child blocks until it
/// has been reaped.
#[derive(Debug)]
pub struct Child {
    pid: libc::pid_t,
    reaped: bool,
}

impl Child {
    fn new(pid: libc::pid_t) -> Self {
        Self { pid, reaped: false }
    }

    pub fn pid(&self) -> libc::pid_t {
        self.pid
    }

    pub fn is_reaped(&self) -> bool {
        self.reaped
    }

    pub fn wait(&mut self) -> io::Result<Termination> {
        loop {
            let mut status: libc::c_int = 0;
            // SAFETY: status is a valid out pointer; pid is our own child.
            let ret = unsafe { libc::waitpid(self.pid, &mut status, 0) };
            if ret == -1 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                self.reaped = true;
                return Err(err);
            }

            self.reaped = true;
            let termination = decode_status(status);
            tracing::debug!(pid = self.pid, %termination, "reaped child");
            return Ok(termination);
        }
    }
}

impl Drop for Child {
    fn drop(&mut self) {
        if !self.reaped {
            tracing::warn!(pid = self.pid, "reaping child on drop");
            if let Err(e) = self.wait() {
                tracing::warn!(pid = self.pid, error = %e, "failed to reap child");
            }
        }
    }
}

fn decode_status(status: libc::c_int) -> Termination {
    if libc::WIFEXITED(status) {
        Termination::Exited(libc::WEXITSTATUS(status))
    } else if libc::WIFSIGNALED(status) {
        Termination::Signaled(libc::WTERMSIG(status))
    } else {
        Termination::Signaled(0)
    }
}
