//! Transport traits between the retrieval core and the Vault server.
//!
//! The core only needs two calls (AppRole login and a KV v2 read) and a way
//! to open a transport for an endpoint and TLS policy. Everything on the
//! wire lives behind these traits.

use crate::error::TransportError;
use crate::secrets::SecretBundle;
use async_trait::async_trait;
use secrecy::SecretString;
use url::Url;
use vault_env_common::TlsVerify;

/// Wire-level access to a Vault server.
#[async_trait]
pub trait VaultTransport: Send + Sync {
    /// Perform the AppRole login exchange.
    ///
    /// Returns the client token, or `None` if the server answered without one.
    async fn approle_login(
        &self,
        role_id: &str,
        secret_id: &SecretString,
    ) -> Result<Option<SecretString>, TransportError>;

    /// Read the current version of the KV v2 secret at `path`.
    async fn read_kv(&self, token: &SecretString, path: &str)
    -> Result<SecretBundle, TransportError>;
}

/// Opens transports bound to an endpoint and TLS verification policy.
pub trait Connector: Send + Sync {
    /// Transport produced by this connector
    type Transport: VaultTransport;

    /// Build a transport for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be constructed, e.g. when the
    /// CA bundle is unreadable.
    fn connect(&self, endpoint: &Url, verify: &TlsVerify)
    -> Result<Self::Transport, TransportError>;
}
