//! Environment stores that secrets are materialized into.

use crate::error::MaterializeError;
use std::collections::BTreeMap;

/// Key/value environment that secrets are written into.
///
/// Writes through this trait are not synchronized; callers sharing one
/// store across threads must serialize materialization themselves.
pub trait EnvironmentStore {
    /// Current value of `key`, if set.
    fn get(&self, key: &str) -> Option<String>;

    /// Set `key` to `value`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`MaterializeError::InvalidEnvEntry`] if the key or value
    /// cannot be stored in an environment; nothing is written then.
    fn set(&mut self, key: &str, value: &str) -> Result<(), MaterializeError>;

    /// Whether `key` is set.
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Check that `key=value` can be stored in a process environment.
///
/// Keys must be non-empty and free of `=` and NUL; values must be free of
/// NUL. The error names the key only.
///
/// # Errors
///
/// Returns [`MaterializeError::InvalidEnvEntry`] describing the first
/// violation.
pub fn validate_entry(key: &str, value: &str) -> Result<(), MaterializeError> {
    let reason = if key.is_empty() {
        "key is empty"
    } else if key.contains('=') {
        "key contains '='"
    } else if key.contains('\0') {
        "key contains a NUL byte"
    } else if value.contains('\0') {
        "value contains a NUL byte"
    } else {
        return Ok(());
    };
    Err(MaterializeError::InvalidEnvEntry {
        key: key.to_string(),
        reason,
    })
}

/// The real process environment.
///
/// Values written here are visible to the rest of the process and to child
/// processes spawned afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl EnvironmentStore for ProcessEnvironment {
    /// Values that are not valid Unicode are returned lossily.
    fn get(&self, key: &str) -> Option<String> {
        std::env::var_os(key).map(|value| value.to_string_lossy().into_owned())
    }

    #[allow(unsafe_code)]
    fn set(&mut self, key: &str, value: &str) -> Result<(), MaterializeError> {
        validate_entry(key, value)?;
        // SAFETY: materialization runs on a single thread and no other
        // thread reads or writes the environment concurrently.
        unsafe { std::env::set_var(key, value) };
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        std::env::var_os(key).is_some()
    }
}

/// In-memory environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryEnvironment {
    vars: BTreeMap<String, String>,
}

impl MemoryEnvironment {
    /// Create an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current process environment.
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    #[must_use]
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
        }
    }

    /// All variables, sorted by name.
    #[must_use]
    pub const fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    /// Number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the environment is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for MemoryEnvironment
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl IntoIterator for MemoryEnvironment {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.vars.into_iter()
    }
}

impl EnvironmentStore for MemoryEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), MaterializeError> {
        validate_entry(key, value)?;
        self.vars.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_environment() {
        let mut env = MemoryEnvironment::new();
        assert!(env.is_empty());
        assert!(!env.contains("DB_USER"));

        env.set("DB_USER", "a").unwrap();
        assert_eq!(env.get("DB_USER").as_deref(), Some("a"));
        assert!(env.contains("DB_USER"));
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn test_from_iterator() {
        let env: MemoryEnvironment = [("A", "1"), ("B", "2")].into_iter().collect();
        assert_eq!(env.get("B").as_deref(), Some("2"));
        assert_eq!(
            env.into_iter().collect::<Vec<_>>(),
            vec![("A".to_string(), "1".to_string()), ("B".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn test_invalid_entries_rejected() {
        let mut env = MemoryEnvironment::new();
        for (key, value, reason) in [
            ("", "a", "key is empty"),
            ("DB=USER", "a", "key contains '='"),
            ("DB\0USER", "a", "key contains a NUL byte"),
            ("DB_PASS", "s3cr\0t", "value contains a NUL byte"),
        ] {
            match env.set(key, value).unwrap_err() {
                MaterializeError::InvalidEnvEntry { key: k, reason: r } => {
                    assert_eq!(k, key);
                    assert_eq!(r, reason);
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
        assert!(env.is_empty());
    }

    #[test]
    fn test_process_environment_rejects_invalid_entries() {
        let mut env = ProcessEnvironment;

        let err = env.set("VAULT_ENV_TEST=KEY", "a").unwrap_err();
        assert!(matches!(err, MaterializeError::InvalidEnvEntry { .. }));

        let err = env.set("VAULT_ENV_TEST_NUL_VALUE", "top\0secret").unwrap_err();
        assert!(!format!("{err} {err:?}").contains("secret"));
        assert!(!env.contains("VAULT_ENV_TEST_NUL_VALUE"));
    }

    #[cfg(unix)]
    #[test]
    #[allow(unsafe_code)]
    fn test_process_environment_sees_non_unicode_values() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let key = "VAULT_ENV_TEST_NON_UNICODE";
        // SAFETY: the variable is unique to this test.
        unsafe { std::env::set_var(key, OsStr::from_bytes(b"caf\xe9")) };

        let env = ProcessEnvironment;
        assert!(env.contains(key));
        assert_eq!(env.get(key).as_deref(), Some("caf\u{fffd}"));
    }

    #[test]
    fn test_process_snapshot_sees_path() {
        let snapshot = MemoryEnvironment::from_process();
        assert_eq!(snapshot.contains("PATH"), ProcessEnvironment.contains("PATH"));
    }
}
