//! AppRole login and the short-lived session it produces.

use crate::credentials::Credentials;
use crate::error::AuthError;
use crate::provider::{Connector, VaultTransport};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use tracing::{error, info, instrument};
use vault_env_common::TlsVerify;

/// An authenticated session against one Vault endpoint.
///
/// Owns the token for the duration of one top-level call. Never persisted
/// and never renewed.
pub struct Session<T> {
    transport: T,
    token: SecretString,
    verify: TlsVerify,
}

impl<T> fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("authenticated", &self.is_authenticated())
            .field("verify", &self.verify)
            .finish_non_exhaustive()
    }
}

impl<T: VaultTransport> Session<T> {
    /// Wrap an existing transport and token.
    pub fn new(transport: T, token: SecretString, verify: TlsVerify) -> Self {
        Self {
            transport,
            token,
            verify,
        }
    }

    /// The transport this session talks through.
    pub const fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T> Session<T> {
    /// Whether the session holds a non-empty token.
    pub fn is_authenticated(&self) -> bool {
        !self.token.expose_secret().is_empty()
    }

    /// The session token.
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    /// TLS verification policy the session was opened with.
    pub const fn verify(&self) -> &TlsVerify {
        &self.verify
    }
}

/// Log in with AppRole credentials.
///
/// Opens a transport bound to the credentials' endpoint with the given TLS
/// policy and exchanges the role id and secret id for a client token.
///
/// # Errors
///
/// - [`AuthError::LoginFailed`] if the transport cannot be opened or the
///   login exchange fails. Never retried.
/// - [`AuthError::TokenMissing`] if the server answers without a token.
#[instrument(skip(connector, credentials), fields(endpoint = %credentials.endpoint, verify = %verify))]
pub async fn login<C>(
    connector: &C,
    credentials: &Credentials,
    verify: &TlsVerify,
) -> Result<Session<C::Transport>, AuthError>
where
    C: Connector + ?Sized,
{
    let transport = connector
        .connect(&credentials.endpoint, verify)
        .map_err(AuthError::LoginFailed)?;

    let token = transport
        .approle_login(&credentials.role_id, &credentials.secret_id)
        .await
        .map_err(|e| {
            error!(error = %e, "AppRole login failed");
            AuthError::LoginFailed(e)
        })?;

    match token {
        Some(token) if !token.expose_secret().is_empty() => {
            info!("AppRole session established");
            Ok(Session::new(transport, token, verify.clone()))
        }
        _ => {
            error!("AppRole login returned no client token");
            Err(AuthError::TokenMissing)
        }
    }
}
