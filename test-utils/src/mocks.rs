//! Mock implementations for testing.
//!
//! [`MockVault`] implements both [`Connector`] and [`VaultTransport`]. Clones
//! share state, so a test keeps one handle for assertions while the handler
//! owns another.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;
use vault_env::{Connector, SecretBundle, TransportError, VaultTransport};
use vault_env_common::TlsVerify;

/// Token issued by a default [`MockVault`].
pub const MOCK_TOKEN: &str = "mock-token";

#[derive(Debug, Default)]
struct MockState {
    token: Option<String>,
    login_error: Option<String>,
    connect_error: Option<String>,
    secrets: BTreeMap<String, SecretBundle>,
    denied: Vec<String>,
    connections: Vec<(Url, TlsVerify)>,
    logins: Vec<(String, String)>,
    reads: Vec<String>,
}

/// In-memory Vault server.
#[derive(Debug, Clone)]
pub struct MockVault {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockVault {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVault {
    /// Create a mock that issues [`MOCK_TOKEN`] and holds no secrets.
    #[must_use]
    pub fn new() -> Self {
        let state = MockState {
            token: Some(MOCK_TOKEN.to_string()),
            ..MockState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a bundle at `path`.
    #[must_use]
    pub fn with_secret(self, path: &str, bundle: SecretBundle) -> Self {
        self.state().secrets.insert(path.to_string(), bundle);
        self
    }

    /// Make reads of `path` fail with permission denied.
    #[must_use]
    pub fn with_denied(self, path: &str) -> Self {
        self.state().denied.push(path.to_string());
        self
    }

    /// Token returned by login; `None` answers without a token.
    #[must_use]
    pub fn with_token(self, token: Option<&str>) -> Self {
        self.state().token = token.map(str::to_string);
        self
    }

    /// Make every login fail with the given message.
    #[must_use]
    pub fn failing_login(self, message: &str) -> Self {
        self.state().login_error = Some(message.to_string());
        self
    }

    /// Make every connect fail with the given message.
    #[must_use]
    pub fn failing_connect(self, message: &str) -> Self {
        self.state().connect_error = Some(message.to_string());
        self
    }

    /// Endpoints and TLS policies transports were opened with.
    #[must_use]
    pub fn connections(&self) -> Vec<(Url, TlsVerify)> {
        self.state().connections.clone()
    }

    /// Number of login exchanges performed.
    #[must_use]
    pub fn login_count(&self) -> usize {
        self.state().logins.len()
    }

    /// Role id and secret id of every login, in order.
    #[must_use]
    pub fn logins(&self) -> Vec<(String, String)> {
        self.state().logins.clone()
    }

    /// Paths read, in order.
    #[must_use]
    pub fn reads(&self) -> Vec<String> {
        self.state().reads.clone()
    }
}

impl Connector for MockVault {
    type Transport = Self;

    fn connect(&self, endpoint: &Url, verify: &TlsVerify) -> Result<Self, TransportError> {
        let mut state = self.state();
        if let Some(message) = &state.connect_error {
            return Err(TransportError::unavailable(message.clone()));
        }
        state.connections.push((endpoint.clone(), verify.clone()));
        drop(state);
        Ok(self.clone())
    }
}

#[async_trait]
impl VaultTransport for MockVault {
    async fn approle_login(
        &self,
        role_id: &str,
        secret_id: &SecretString,
    ) -> Result<Option<SecretString>, TransportError> {
        let mut state = self.state();
        state
            .logins
            .push((role_id.to_string(), secret_id.expose_secret().to_string()));
        if let Some(message) = &state.login_error {
            return Err(TransportError::auth_failed(message.clone()));
        }
        Ok(state.token.clone().map(SecretString::from))
    }

    async fn read_kv(
        &self,
        token: &SecretString,
        path: &str,
    ) -> Result<SecretBundle, TransportError> {
        let mut state = self.state();
        state.reads.push(path.to_string());

        if state.token.as_deref() != Some(token.expose_secret()) {
            return Err(TransportError::PermissionDenied(path.to_string()));
        }
        if state.denied.iter().any(|p| p == path) {
            return Err(TransportError::PermissionDenied(path.to_string()));
        }
        state
            .secrets
            .get(path)
            .cloned()
            .ok_or_else(|| TransportError::not_found(path))
    }
}
