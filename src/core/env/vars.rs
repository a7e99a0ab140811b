use std::env;
use std::ffi::CString;

use crate::error::{Result, ShellError};

use super::is_valid_name;

/// Ordered `NAME=value` store owned by a session.
///
/// Seeded once from the host environment; afterwards it never reads or
/// writes the real process environment. Names are unique and
/// case-sensitive, and replacing a value keeps the entry's position.
#[derive(Clone, Debug, Default)]
pub struct EnvironmentStore {
    entries: Vec<(String, String)>,
}

impl EnvironmentStore {
    pub fn from_host() -> Result<Self> {
        let host: Vec<_> = env::vars_os().collect();
        let mut entries = Vec::new();
        entries.try_reserve_exact(host.len())?;

        for (key, value) in host {
            let key = key.to_string_lossy().into_owned();
            if entries.iter().any(|(k, _): &(String, String)| *k == key) {
                continue;
            }
            entries.push((key, value.to_string_lossy().into_owned()));
        }

        Ok(Self { entries })
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut store = Self::default();
        for (key, value) in pairs {
            store.set(key.as_ref(), value.as_ref())?;
        }
        Ok(store)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        if !is_valid_name(name) {
            return Err(ShellError::InvalidArgument(format!(
                "invalid variable name: {:?}",
                name
            )));
        }

        let mut new_value = String::new();
        new_value.try_reserve_exact(value.len())?;
        new_value.push_str(value);

        if let Some(slot) = self.entries.iter_mut().find(|(key, _)| key == name) {
            slot.1 = new_value;
            return Ok(());
        }

        let mut new_name = String::new();
        new_name.try_reserve_exact(name.len())?;
        new_name.push_str(name);

        self.entries.try_reserve(1)?;
        self.entries.push((new_name, new_value));
        Ok(())
    }

    pub fn unset(&mut self, name: &str) -> bool {
        match self.entries.iter().position(|(key, _)| key == name) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Builds the `NAME=value` strings handed to `execve`.
    pub fn to_envp(&self) -> Vec<CString> {
        self.entries
            .iter()
            .filter_map(|(key, value)| match CString::new(format!("{}={}", key, value)) {
                Ok(entry) => Some(entry),
                Err(_) => {
                    tracing::warn!(name = %key, "skipping variable with interior NUL");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_store() -> EnvironmentStore {
        EnvironmentStore::from_pairs([("HOME", "/home/test"), ("PATH", "/usr/bin"), ("LANG", "C")])
            .unwrap()
    }

    #[test]
    fn test_set_and_get() -> Result<()> {
        let mut store = setup_store();
        store.set("FOO", "bar")?;
        assert_eq!(store.get("FOO"), Some("bar"));
        assert_eq!(store.len(), 4);
        Ok(())
    }

    #[test]
    fn test_replace_keeps_position_and_count() -> Result<()> {
        let mut store = setup_store();
        store.set("PATH", "/bin:/usr/bin")?;

        assert_eq!(store.len(), 3);
        let names: Vec<&str> = store.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["HOME", "PATH", "LANG"]);
        assert_eq!(store.get("PATH"), Some("/bin:/usr/bin"));
        Ok(())
    }

    #[test]
    fn test_exact_name_match() -> Result<()> {
        let mut store = setup_store();
        store.set("HOMEDIR", "/srv")?;

        assert_eq!(store.get("HOM"), None);
        assert_eq!(store.get("home"), None);
        assert_eq!(store.get("HOME"), Some("/home/test"));
        assert_eq!(store.get("HOMEDIR"), Some("/srv"));
        Ok(())
    }

    #[test]
    fn test_value_may_contain_equals() -> Result<()> {
        let mut store = setup_store();
        store.set("OPTS", "a=b=c")?;
        assert_eq!(store.get("OPTS"), Some("a=b=c"));
        Ok(())
    }

    #[test]
    fn test_invalid_name_leaves_store_unchanged() {
        let mut store = setup_store();
        assert!(matches!(store.set("", "x"), Err(ShellError::InvalidArgument(_))));
        assert!(matches!(store.set("A=B", "x"), Err(ShellError::InvalidArgument(_))));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_unset_preserves_order() {
        let mut store = setup_store();
        assert!(store.unset("PATH"));
        assert!(!store.unset("PATH"));

        let names: Vec<&str> = store.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["HOME", "LANG"]);
    }

    #[test]
    fn test_grows_without_fixed_ceiling() -> Result<()> {
        let mut store = EnvironmentStore::default();
        for i in 0..2048 {
            store.set(&format!("VAR_{}", i), "x")?;
        }
        assert_eq!(store.len(), 2048);
        Ok(())
    }

    #[test]
    fn test_to_envp() {
        let store = setup_store();
        let envp = store.to_envp();
        assert_eq!(envp.len(), 3);
        assert_eq!(envp[0].to_str().ok(), Some("HOME=/home/test"));
    }

    #[test]
    fn test_from_host_snapshot() -> Result<()> {
        let store = EnvironmentStore::from_host()?;
        let host_count = env::vars_os().count();
        assert!(store.len() <= host_count);
        Ok(())
    }
}
