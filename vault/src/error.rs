//! Vault error types using thiserror 2.0.
//!
//! Each stage of a retrieval has its own error enum so callers can tell an
//! expected rejection (missing credential, duplicate key) apart from a
//! backend fault. `VaultError` wraps them all for the top-level operations.

use secrecy::SecretString;
use std::collections::BTreeSet;
use thiserror::Error;
use vault_env_common::PlatformError;

/// Errors raised by the transport talking to the Vault server.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Vault server unavailable
    #[error("Vault unavailable: {0}")]
    Unavailable(String),

    /// Authentication rejected by the server
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Secret not found
    #[error("Secret not found at path: {0}")]
    SecretNotFound(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Any other non-success status
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Platform error, e.g. while building the HTTP client
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

impl TransportError {
    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create an authentication failed error.
    #[must_use]
    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::AuthenticationFailed(msg.into())
    }

    /// Create a secret not found error.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::SecretNotFound(path.into())
    }
}

/// Precondition failures detected before any network call.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// One or more AppRole identifiers or the endpoint are absent
    #[error("Missing credentials: {}", .missing.join(", "))]
    MissingCredentials {
        /// Names of the missing values
        missing: Vec<&'static str>,
    },

    /// The endpoint is not a valid URL
    #[error("Invalid Vault endpoint {endpoint:?}: {source}")]
    InvalidEndpoint {
        /// The rejected endpoint
        endpoint: String,
        /// Parse failure
        source: url::ParseError,
    },

    /// A configuration value could not be parsed
    #[error("Invalid {name}: {reason}")]
    InvalidValue {
        /// Variable name
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// Neither an explicit config path nor an environment name is available
    #[error("Unable to determine the config path: set DECONFPATH or env")]
    UnresolvableConfigPath,
}

/// Session establishment failures.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Login succeeded at the transport level but no token came back
    #[error("AppRole login returned no client token")]
    TokenMissing,

    /// The login exchange itself failed
    #[error("AppRole login failed: {0}")]
    LoginFailed(#[source] TransportError),
}

/// Failures reading a single secret path.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The session carries no token
    #[error("Session is not authenticated")]
    Unauthenticated,

    /// The backend refused or failed the read
    #[error("Vault rejected read of {path}: {source}")]
    BackendRejected {
        /// Path that was read
        path: String,
        /// Underlying cause
        source: TransportError,
    },
}

/// Failures combining bundles from several paths.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MergeError {
    /// Two bundles share at least one key
    #[error("Duplicate keys fetched: {keys:?}")]
    DuplicateKeys {
        /// The conflicting keys, sorted
        keys: BTreeSet<String>,
    },
}

/// Failures writing secrets into an environment store.
#[derive(Error, Debug)]
pub enum MaterializeError {
    /// The key is already set; its value is left untouched
    #[error("Duplicated environment key: {key}")]
    DuplicateEnvKey {
        /// Conflicting key
        key: String,
        /// Value already present
        existing: SecretString,
        /// Value that was about to be written
        attempted: SecretString,
    },

    /// The key or value cannot be stored in an environment
    #[error("Cannot write environment key {key:?}: {reason}")]
    InvalidEnvEntry {
        /// Offending key
        key: String,
        /// What makes the entry unusable
        reason: &'static str,
    },

    /// A marker-prefixed entry does not hold a usable path
    #[error("Path reference {marker_key} does not hold a secret path")]
    InvalidReference {
        /// The marker-prefixed key
        marker_key: String,
    },

    /// The referenced path could not be fetched and merged
    #[error("Cannot resolve path reference {marker_key}: {source}")]
    ReferenceResolutionFailed {
        /// The marker-prefixed key
        marker_key: String,
        /// Underlying cause
        source: Box<VaultError>,
    },
}

/// Any failure of a top-level retrieval.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Precondition failure
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Login failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Read failure
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Duplicate keys across paths
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// Environment write failure
    #[error(transparent)]
    Materialize(#[from] MaterializeError),
}

/// Result type for Vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

impl MergeError {
    /// Build a duplicate-keys error from any key iterator.
    #[must_use]
    pub fn duplicate_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::DuplicateKeys {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl VaultError {
    /// Whether this is a duplicate-key rejection, from merging or from
    /// writing into the environment.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Self::Merge(MergeError::DuplicateKeys { .. })
                | Self::Materialize(MaterializeError::DuplicateEnvKey { .. })
        )
    }
}
