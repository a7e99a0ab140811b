use std::env;

use super::Command;
use crate::error::{Result, ShellError};
use crate::process::fd::os_error_text;
use crate::process::Outcome;
use crate::shell::ShellSession;

/// `cd [dir|-]`; with no argument the session's `HOME` is used.
#[derive(Clone, Debug, Default)]
pub struct CdCommand;

impl CdCommand {
    pub fn new() -> Self {
        Self
    }

    fn target(args: &[String], session: &ShellSession) -> Result<String> {
        let lookup = |name: &str| {
            session
                .get_variable(name)
                .map(str::to_string)
                .ok_or_else(|| ShellError::InvalidArgument(format!("{} not set", name)))
        };

        match args.first().map(String::as_str) {
            Some("-") => lookup("OLDPWD"),
            Some(path) => Ok(path.to_string()),
            None => lookup("HOME"),
        }
    }
}

impl Command for CdCommand {
    fn execute(&self, args: &[String], session: &mut ShellSession) -> Result<Outcome> {
        let target = Self::target(args, session)?;
        session.chdir(&target)
    }
}

/// Changes the process working directory and returns the real directory
/// afterwards, which may differ from `path` for relative paths or symlinks.
pub fn change_dir(path: &str) -> Result<String> {
    env::set_current_dir(path).map_err(|e| ShellError::CdFailure(os_error_text(&e)))?;
    let cwd = env::current_dir()?;
    Ok(cwd.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SessionConfig;
    use crate::core::env::EnvironmentStore;

    fn session_with(pairs: &[(&str, &str)]) -> ShellSession {
        let env = EnvironmentStore::from_pairs(pairs.iter().copied()).unwrap();
        ShellSession::from_parts(env, "/".to_string(), SessionConfig::default())
    }

    #[test]
    fn test_cd_without_home() {
        let mut session = session_with(&[("PATH", "/usr/bin")]);
        let result = CdCommand::new().execute(&[], &mut session);
        assert!(matches!(result, Err(ShellError::InvalidArgument(msg)) if msg == "HOME not set"));
        assert_eq!(session.cwd(), "/");
    }

    #[test]
    fn test_cd_dash_without_oldpwd() {
        let mut session = session_with(&[("HOME", "/")]);
        let result = CdCommand::new().execute(&["-".to_string()], &mut session);
        assert!(matches!(result, Err(ShellError::InvalidArgument(msg)) if msg == "OLDPWD not set"));
    }

    #[test]
    fn test_target_resolution() -> Result<()> {
        let session = session_with(&[("HOME", "/home/test"), ("OLDPWD", "/var")]);
        assert_eq!(CdCommand::target(&[], &session)?, "/home/test");
        assert_eq!(CdCommand::target(&["-".to_string()], &session)?, "/var");
        assert_eq!(CdCommand::target(&["/tmp".to_string()], &session)?, "/tmp");
        Ok(())
    }

    #[test]
    fn test_change_dir_invalid() {
        let result = change_dir("/nonexistent/ventricle/path");
        assert!(
            matches!(result, Err(ShellError::CdFailure(text)) if text == "No such file or directory")
        );
    }
}
