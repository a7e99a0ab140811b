use std::fs;
use std::path::{Path, PathBuf};

use super::ConfigError;
use crate::core::env::{expand_vars, EnvironmentStore};
use crate::error::Result;

/// Applies `export NAME=value` style startup files to a session environment.
#[derive(Debug, Clone)]
pub struct RcLoader {
    path: PathBuf,
}

impl RcLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of assignments applied. A missing file applies none.
    pub fn load_into(&self, env: &mut EnvironmentStore) -> Result<usize> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no rc file");
            return Ok(0);
        }

        let content = fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;

        let mut applied = 0;
        for (index, line) in content.lines().enumerate() {
            if self.process_line(index + 1, line, env)? {
                applied += 1;
            }
        }

        tracing::debug!(path = %self.path.display(), applied, "rc file loaded");
        Ok(applied)
    }

    fn process_line(&self, number: usize, line: &str, env: &mut EnvironmentStore) -> Result<bool> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(false);
        }

        let assignment = match line.strip_prefix("export ") {
            Some(rest) => rest.trim_start(),
            None if Self::looks_like_assignment(line) => line,
            None => {
                tracing::debug!(line = number, "ignoring rc line");
                return Ok(false);
            }
        };

        let Some((name, value)) = assignment.split_once('=') else {
            return Err(Self::invalid(number, line).into());
        };
        let name = name.trim();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Self::invalid(number, line).into());
        }

        let value = Self::strip_quotes(value.trim());
        let expanded = expand_vars(value, env);
        env.set(name, &expanded)?;
        Ok(true)
    }

    fn looks_like_assignment(line: &str) -> bool {
        line.split_once('=')
            .map(|(name, _)| !name.is_empty() && !name.contains(char::is_whitespace))
            .unwrap_or(false)
    }

    fn strip_quotes(value: &str) -> &str {
        let quoted = value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')));
        if quoted {
            &value[1..value.len() - 1]
        } else {
            value
        }
    }

    fn invalid(line: usize, content: &str) -> ConfigError {
        ConfigError::InvalidLine {
            line,
            content: content.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShellError;
    use std::io::Write;

    fn setup_env() -> EnvironmentStore {
        EnvironmentStore::from_pairs([("HOME", "/home/test"), ("PATH", "/usr/bin")]).unwrap()
    }

    fn write_rc(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_exports() -> Result<()> {
        let rc = write_rc(
            r#"
            # comment
            export TEST_VAR="hello world"
            PATH=/usr/local/bin:$PATH
            export GREETING='hi $HOME'
            alias ll='ls -la'
            "#,
        );
        let mut env = setup_env();

        let applied = RcLoader::new(rc.path()).load_into(&mut env)?;

        assert_eq!(applied, 3);
        assert_eq!(env.get("TEST_VAR"), Some("hello world"));
        assert_eq!(env.get("PATH"), Some("/usr/local/bin:/usr/bin"));
        assert_eq!(env.get("GREETING"), Some("hi /home/test"));
        assert_eq!(env.get("ll"), None);
        Ok(())
    }

    #[test]
    fn test_missing_file_is_not_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut env = setup_env();
        let applied = RcLoader::new(dir.path().join("absent")).load_into(&mut env)?;
        assert_eq!(applied, 0);
        assert_eq!(env.len(), 2);
        Ok(())
    }

    #[test]
    fn test_invalid_assignment() {
        let rc = write_rc("export NOVALUE\n");
        let mut env = setup_env();
        let result = RcLoader::new(rc.path()).load_into(&mut env);
        assert!(matches!(
            result,
            Err(ShellError::Config(ConfigError::InvalidLine { line: 1, .. }))
        ));

        let rc = write_rc("\nexport BAD-NAME=1\n");
        let result = RcLoader::new(rc.path()).load_into(&mut env);
        assert!(matches!(
            result,
            Err(ShellError::Config(ConfigError::InvalidLine { line: 2, .. }))
        ));
    }
}
