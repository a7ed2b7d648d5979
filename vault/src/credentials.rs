//! AppRole credential lookup.

use crate::error::ConfigError;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use url::Url;

/// Ambient variable holding the AppRole role id.
pub const ROLE_ID_VAR: &str = "role_id";
/// Ambient variable holding the AppRole secret id.
pub const SECRET_ID_VAR: &str = "secret_id";
/// Ambient variable holding the Vault endpoint.
pub const ADDR_VAR: &str = "VAULT_ADDR";

/// Validated AppRole credentials bound to an endpoint.
#[derive(Clone)]
pub struct Credentials {
    /// AppRole role id
    pub role_id: String,
    /// AppRole secret id
    pub secret_id: SecretString,
    /// Vault server address
    pub endpoint: Url,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("role_id", &self.role_id)
            .field("secret_id", &"[REDACTED]")
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

/// Credential values captured from explicit arguments or ambient lookup.
///
/// Captured once; [`CredentialSource::resolve`] only validates.
#[derive(Clone, Default)]
pub struct CredentialSource {
    role_id: Option<String>,
    secret_id: Option<SecretString>,
    endpoint: Option<String>,
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSource")
            .field("role_id", &self.role_id)
            .field("secret_id", &self.secret_id.as_ref().map(|_| "[REDACTED]"))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl CredentialSource {
    /// Capture credentials from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Capture credentials through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            role_id: non_empty(lookup(ROLE_ID_VAR)),
            secret_id: non_empty(lookup(SECRET_ID_VAR)).map(SecretString::from),
            endpoint: non_empty(lookup(ADDR_VAR)),
        }
    }

    /// Override the role id. Empty values leave the captured one in place.
    #[must_use]
    pub fn with_role_id(mut self, role_id: impl Into<String>) -> Self {
        if let Some(role_id) = non_empty(Some(role_id.into())) {
            self.role_id = Some(role_id);
        }
        self
    }

    /// Override the secret id. Empty values leave the captured one in place.
    #[must_use]
    pub fn with_secret_id(mut self, secret_id: impl Into<String>) -> Self {
        if let Some(secret_id) = non_empty(Some(secret_id.into())) {
            self.secret_id = Some(SecretString::from(secret_id));
        }
        self
    }

    /// Override the endpoint. Empty values leave the captured one in place.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        if let Some(endpoint) = non_empty(Some(endpoint.into())) {
            self.endpoint = Some(endpoint);
        }
        self
    }

    /// Whether both AppRole identifiers are present.
    #[must_use]
    pub const fn has_identity(&self) -> bool {
        self.role_id.is_some() && self.secret_id.is_some()
    }

    /// Validate the captured values into [`Credentials`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredentials`] naming every absent value,
    /// or [`ConfigError::InvalidEndpoint`] if the endpoint is not a URL.
    pub fn resolve(&self) -> Result<Credentials, ConfigError> {
        let mut missing = Vec::new();
        if self.role_id.is_none() {
            missing.push(ROLE_ID_VAR);
        }
        if self.secret_id.is_none() {
            missing.push(SECRET_ID_VAR);
        }
        if self.endpoint.is_none() {
            missing.push(ADDR_VAR);
        }

        let (Some(role_id), Some(secret_id), Some(endpoint)) =
            (&self.role_id, &self.secret_id, &self.endpoint)
        else {
            return Err(ConfigError::MissingCredentials { missing });
        };

        let endpoint = Url::parse(endpoint).map_err(|source| ConfigError::InvalidEndpoint {
            endpoint: endpoint.clone(),
            source,
        })?;

        Ok(Credentials {
            role_id: role_id.clone(),
            secret_id: SecretString::from(secret_id.expose_secret()),
            endpoint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_resolve_from_lookup() {
        let source = CredentialSource::from_lookup(lookup(&[
            ("role_id", "role-123"),
            ("secret_id", "secret-456"),
            ("VAULT_ADDR", "https://vault.example:8200"),
        ]));

        let creds = source.resolve().unwrap();
        assert_eq!(creds.role_id, "role-123");
        assert_eq!(creds.secret_id.expose_secret(), "secret-456");
        assert_eq!(creds.endpoint.as_str(), "https://vault.example:8200/");
    }

    #[test]
    fn test_explicit_values_win() {
        let source = CredentialSource::from_lookup(lookup(&[
            ("role_id", "ambient-role"),
            ("secret_id", "ambient-secret"),
        ]))
        .with_role_id("explicit-role")
        .with_secret_id("")
        .with_endpoint("http://127.0.0.1:8200");

        let creds = source.resolve().unwrap();
        assert_eq!(creds.role_id, "explicit-role");
        assert_eq!(creds.secret_id.expose_secret(), "ambient-secret");
    }

    #[test]
    fn test_missing_values_are_all_reported() {
        let source = CredentialSource::from_lookup(lookup(&[("role_id", "  ")]));
        assert!(!source.has_identity());

        match source.resolve() {
            Err(ConfigError::MissingCredentials { missing }) => {
                assert_eq!(missing, vec!["role_id", "secret_id", "VAULT_ADDR"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_endpoint() {
        let source = CredentialSource::default()
            .with_role_id("r")
            .with_secret_id("s")
            .with_endpoint("not a url");
        assert!(matches!(
            source.resolve(),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_debug_redacts_secret_id() {
        let source = CredentialSource::default()
            .with_role_id("role")
            .with_secret_id("very-secret-id")
            .with_endpoint("http://127.0.0.1:8200");
        assert!(!format!("{source:?}").contains("very-secret-id"));
        assert!(!format!("{:?}", source.resolve().unwrap()).contains("very-secret-id"));
    }
}
