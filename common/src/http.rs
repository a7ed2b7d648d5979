//! Centralized HTTP client configuration and building.
//!
//! Every client that talks to Vault is built here, so the TLS verification
//! policy is applied in exactly one place.

use crate::error::PlatformError;
use reqwest::{Certificate, Client, ClientBuilder};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// TLS verification policy for outgoing requests.
///
/// Either a boolean (verify against the default roots, or don't verify at
/// all) or a path to a PEM CA bundle to verify against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerify {
    /// Verify server certificates against the default root store
    #[default]
    Enabled,
    /// Accept any server certificate
    Disabled,
    /// Verify server certificates against the given CA bundle
    CaBundle(PathBuf),
}

impl TlsVerify {
    /// Create a policy that verifies against the given CA bundle.
    #[must_use]
    pub fn ca_bundle(path: impl Into<PathBuf>) -> Self {
        Self::CaBundle(path.into())
    }

    /// Whether certificates are checked at all.
    #[must_use]
    pub const fn verifies(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl From<bool> for TlsVerify {
    fn from(verify: bool) -> Self {
        if verify { Self::Enabled } else { Self::Disabled }
    }
}

impl FromStr for TlsVerify {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" => Err(PlatformError::invalid_input(
                "TLS verify policy must be a boolean or a non-empty CA bundle path",
            )),
            "true" | "1" | "yes" => Ok(Self::Enabled),
            "false" | "0" | "no" => Ok(Self::Disabled),
            _ => Ok(Self::CaBundle(PathBuf::from(s.trim()))),
        }
    }
}

impl fmt::Display for TlsVerify {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled => f.write_str("true"),
            Self::Disabled => f.write_str("false"),
            Self::CaBundle(path) => write!(f, "{}", path.display()),
        }
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout (default: 30s)
    pub timeout: Duration,
    /// Connection timeout (default: 10s)
    pub connect_timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// TLS verification policy (default: verify)
    pub verify: TlsVerify,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("vault-env/", env!("CARGO_PKG_VERSION")).to_string(),
            verify: TlsVerify::Enabled,
        }
    }
}

impl HttpConfig {
    /// Create a new HTTP config with custom timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create a new HTTP config with custom connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Create a new HTTP config with custom user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Create a new HTTP config with the given TLS verification policy.
    #[must_use]
    pub fn with_verify(mut self, verify: TlsVerify) -> Self {
        self.verify = verify;
        self
    }
}

/// Build a configured HTTP client.
///
/// Creates a reqwest client with rustls TLS, applying the configured
/// timeouts and TLS verification policy.
///
/// # Errors
///
/// Returns an error if the CA bundle path is empty or unreadable, if the
/// bundle is not valid PEM, or if the client cannot be built.
///
/// # Examples
///
/// ```
/// use vault_env_common::{HttpConfig, TlsVerify, build_http_client};
/// use std::time::Duration;
///
/// let config = HttpConfig::default()
///     .with_timeout(Duration::from_secs(60))
///     .with_verify(TlsVerify::Disabled);
/// let client = build_http_client(&config).expect("Failed to build client");
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, PlatformError> {
    let mut builder = ClientBuilder::new()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(&config.user_agent)
        .use_rustls_tls();

    match &config.verify {
        TlsVerify::Enabled => {}
        TlsVerify::Disabled => {
            tracing::warn!("TLS certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }
        TlsVerify::CaBundle(path) => {
            if path.as_os_str().is_empty() {
                return Err(PlatformError::invalid_input("CA bundle path is empty"));
            }
            let pem = std::fs::read(path)?;
            let cert = Certificate::from_pem(&pem)
                .map_err(|e| PlatformError::tls(format!("{}: {e}", path.display())))?;
            builder = builder.add_root_certificate(cert);
        }
    }

    Ok(builder.build()?)
}
