//! Vault handler configuration.
//!
//! All configuration is read from the environment (or any lookup function)
//! once, when the handler is built.

use crate::credentials::CredentialSource;
use crate::error::ConfigError;
use std::time::Duration;
use vault_env_common::{HttpConfig, TlsVerify};

/// Default KV v2 mount point.
pub const DEFAULT_KV_MOUNT: &str = "secret";
/// Default prefix marking a config entry as a path reference.
pub const DEFAULT_PATH_MARKER: &str = "VAULT_PATH_";
/// Default root under which per-application config paths live.
pub const DEFAULT_CONFIG_ROOT: &str = "dataeng/config";

/// Vault handler configuration.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// AppRole identifiers and endpoint
    pub credentials: CredentialSource,
    /// HTTP client settings, including the default TLS verify policy
    pub http: HttpConfig,
    /// KV v2 mount point
    pub kv_mount: String,
    /// Prefix marking config entries whose value is a secret path
    pub path_marker: String,
    /// Root of derived application config paths
    pub config_root: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            credentials: CredentialSource::default(),
            http: HttpConfig::default(),
            kv_mount: DEFAULT_KV_MOUNT.to_string(),
            path_marker: DEFAULT_PATH_MARKER.to_string(),
            config_root: DEFAULT_CONFIG_ROOT.to_string(),
        }
    }
}

impl VaultConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary lookup function.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = CredentialSource::from_lookup(&lookup);

        let skip_verify = parse_flag(&lookup, "VAULT_SKIP_VERIFY")?;
        let verify = match lookup("VAULT_CACERT").filter(|v| !v.trim().is_empty()) {
            _ if skip_verify => TlsVerify::Disabled,
            Some(path) => TlsVerify::ca_bundle(path),
            None => TlsVerify::Enabled,
        };
        let timeout = Duration::from_secs(parse_var(&lookup, "VAULT_TIMEOUT_SECS", 30)?);

        let http = HttpConfig::default()
            .with_timeout(timeout)
            .with_verify(verify);

        Ok(Self {
            credentials,
            http,
            kv_mount: lookup("VAULT_KV_MOUNT").unwrap_or_else(|| DEFAULT_KV_MOUNT.to_string()),
            path_marker: lookup("VAULT_PATH_MARKER")
                .unwrap_or_else(|| DEFAULT_PATH_MARKER.to_string()),
            config_root: lookup("VAULT_CONFIG_ROOT")
                .unwrap_or_else(|| DEFAULT_CONFIG_ROOT.to_string()),
        })
    }

    /// Replace the credential source.
    #[must_use]
    pub fn with_credentials(mut self, credentials: CredentialSource) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set the default TLS verification policy.
    #[must_use]
    pub fn with_verify(mut self, verify: TlsVerify) -> Self {
        self.http = self.http.with_verify(verify);
        self
    }

    /// Set request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    /// Set the KV v2 mount point.
    #[must_use]
    pub fn with_kv_mount(mut self, mount: impl Into<String>) -> Self {
        self.kv_mount = mount.into();
        self
    }

    /// Default TLS verification policy.
    #[must_use]
    pub const fn verify(&self) -> &TlsVerify {
        &self.http.verify
    }
}

/// Parse a variable with a default value.
fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(val) if !val.trim().is_empty() => {
            val.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                name,
                reason: e.to_string(),
            })
        }
        _ => Ok(default),
    }
}

/// Parse a boolean flag; unset or empty is `false`.
fn parse_flag<F>(lookup: &F, name: &'static str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(val) = lookup(name) else {
        return Ok(false);
    };
    match val.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "0" | "no" => Ok(false),
        "true" | "1" | "yes" => Ok(true),
        _ => Err(ConfigError::InvalidValue {
            name,
            reason: format!("expected a boolean, got {val:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = VaultConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.kv_mount, "secret");
        assert_eq!(config.path_marker, "VAULT_PATH_");
        assert_eq!(config.config_root, "dataeng/config");
        assert_eq!(config.verify(), &TlsVerify::Enabled);
        assert_eq!(config.http.timeout, Duration::from_secs(30));
        assert!(!config.credentials.has_identity());
    }

    #[test]
    fn test_verify_from_env() {
        let config = VaultConfig::from_lookup(|name| match name {
            "VAULT_CACERT" => Some("/etc/vault/ca.pem".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.verify(), &TlsVerify::ca_bundle("/etc/vault/ca.pem"));

        let config = VaultConfig::from_lookup(|name| match name {
            "VAULT_CACERT" => Some("/etc/vault/ca.pem".to_string()),
            "VAULT_SKIP_VERIFY" => Some("true".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.verify(), &TlsVerify::Disabled);
    }

    #[test]
    fn test_skip_verify_flag_forms() {
        for value in ["1", "YES", " true "] {
            let config = VaultConfig::from_lookup(|name| {
                (name == "VAULT_SKIP_VERIFY").then(|| value.to_string())
            })
            .unwrap();
            assert_eq!(config.verify(), &TlsVerify::Disabled);
        }

        let err = VaultConfig::from_lookup(|name| {
            (name == "VAULT_SKIP_VERIFY").then(|| "maybe".to_string())
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { name: "VAULT_SKIP_VERIFY", .. }
        ));
    }

    #[test]
    fn test_invalid_value() {
        let err = VaultConfig::from_lookup(|name| match name {
            "VAULT_TIMEOUT_SECS" => Some("soon".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { name: "VAULT_TIMEOUT_SECS", .. }
        ));
    }

    #[test]
    fn test_overrides() {
        let config = VaultConfig::default()
            .with_kv_mount("kv")
            .with_timeout(Duration::from_secs(5))
            .with_verify(TlsVerify::Disabled);
        assert_eq!(config.kv_mount, "kv");
        assert_eq!(config.http.timeout, Duration::from_secs(5));
        assert_eq!(config.verify(), &TlsVerify::Disabled);
    }
}
