//! AppRole secret retrieval for HashiCorp Vault.
//!
//! Logs in with a role id and secret id, reads KV v2 secrets from one or more
//! paths, merges them into a single mapping without allowing duplicate keys,
//! and optionally writes the result into an environment store. Config entries
//! whose key carries the path marker (`VAULT_PATH_` by default) are resolved
//! as secret paths and expanded in place.
//!
//! ```no_run
//! use vault_env::{TlsVerify, VaultHandler};
//!
//! # async fn run() -> vault_env::VaultResult<()> {
//! let mut handler = VaultHandler::from_env()?;
//! let secrets = handler
//!     .fetch_paths(["app/db", "app/cache"], true, TlsVerify::Enabled)
//!     .await?;
//! println!("loaded {} secrets", secrets.len());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod credentials;
pub mod environment;
pub mod error;
pub mod fetcher;
pub mod handler;
pub mod legacy;
pub mod materializer;
pub mod merger;
pub mod provider;
pub mod secrets;

pub use auth::{Session, login};
pub use client::{HttpConnector, VaultClient};
pub use config::VaultConfig;
pub use credentials::{CredentialSource, Credentials};
pub use environment::{EnvironmentStore, MemoryEnvironment, ProcessEnvironment, validate_entry};
pub use error::{
    AuthError, ConfigError, FetchError, MaterializeError, MergeError, TransportError, VaultError,
    VaultResult,
};
pub use fetcher::{fetch, fetch_merged};
pub use handler::VaultHandler;
pub use materializer::{ReferenceResolver, expand_and_materialize, materialize, stringify_value};
pub use merger::{PathMerger, merge};
pub use provider::{Connector, VaultTransport};
pub use secrets::{MergedResult, SecretBundle, SecretPaths};
pub use vault_env_common::TlsVerify;
