//! High-level entry point tying credentials, session, fetch, merge and
//! materialization together.

use crate::auth::{Session, login};
use crate::client::HttpConnector;
use crate::config::VaultConfig;
use crate::environment::{EnvironmentStore, ProcessEnvironment};
use crate::error::VaultResult;
use crate::fetcher::fetch_merged;
use crate::materializer::{expand_and_materialize, materialize};
use crate::provider::Connector;
use crate::secrets::{MergedResult, SecretPaths};
use tracing::{info, instrument};
use vault_env_common::TlsVerify;

/// Retrieves secrets with AppRole credentials and optionally loads them into
/// an environment store.
///
/// Every call opens its own session; nothing is cached between calls.
#[derive(Debug)]
pub struct VaultHandler<C = HttpConnector, E = ProcessEnvironment> {
    config: VaultConfig,
    connector: C,
    environment: E,
}

impl VaultHandler {
    /// Create a handler talking HTTP and writing to the process environment.
    #[must_use]
    pub fn new(config: VaultConfig) -> Self {
        let connector = HttpConnector::new(config.http.clone(), config.kv_mount.clone());
        Self::with_parts(config, connector, ProcessEnvironment)
    }

    /// Create a handler from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration variable is invalid.
    pub fn from_env() -> VaultResult<Self> {
        Ok(Self::new(VaultConfig::from_env()?))
    }
}

impl<C, E> VaultHandler<C, E>
where
    C: Connector,
    E: EnvironmentStore,
{
    /// Assemble a handler from explicit parts.
    pub const fn with_parts(config: VaultConfig, connector: C, environment: E) -> Self {
        Self {
            config,
            connector,
            environment,
        }
    }

    /// Handler configuration.
    pub const fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// The environment store secrets are written to.
    pub const fn environment(&self) -> &E {
        &self.environment
    }

    /// Mutable access to the environment store.
    pub const fn environment_mut(&mut self) -> &mut E {
        &mut self.environment
    }

    /// Consume the handler and return its environment store.
    pub fn into_environment(self) -> E {
        self.environment
    }

    /// Resolve credentials and log in.
    ///
    /// # Errors
    ///
    /// Returns a config error if credentials are missing, or an auth error
    /// if the login fails or yields no token.
    pub async fn open_session(&self, verify: &TlsVerify) -> VaultResult<Session<C::Transport>> {
        let credentials = self.config.credentials.resolve()?;
        Ok(login(&self.connector, &credentials, verify).await?)
    }

    /// Fetch and merge secrets from one or more paths.
    ///
    /// With `write_to_environment`, the merged mapping is also written to
    /// the environment store; keys already set there are rejected.
    ///
    /// # Errors
    ///
    /// Any config, auth, fetch, merge or materialize failure. There is no
    /// partial result.
    #[instrument(skip(self, paths))]
    pub async fn fetch_paths(
        &mut self,
        paths: impl Into<SecretPaths>,
        write_to_environment: bool,
        verify: TlsVerify,
    ) -> VaultResult<MergedResult> {
        let paths = paths.into();
        let session = self.open_session(&verify).await?;
        let merged = fetch_merged(&session, &paths).await?;

        if write_to_environment {
            materialize(&mut self.environment, &merged)?;
        }

        info!(
            paths = paths.len(),
            keys = merged.len(),
            write_to_environment,
            "Fetched secrets from Vault"
        );
        Ok(merged)
    }

    /// Write a config mapping to the environment store, expanding entries
    /// marked as path references through a fresh session.
    ///
    /// # Errors
    ///
    /// Any config or auth failure opening the session, or any materialize
    /// failure. Keys written before a failure stay written.
    pub async fn expand_config(
        &mut self,
        config: &MergedResult,
        verify: TlsVerify,
    ) -> VaultResult<()> {
        let session = self.open_session(&verify).await?;
        expand_and_materialize(
            &mut self.environment,
            config,
            &self.config.path_marker,
            &session,
        )
        .await?;
        Ok(())
    }
}
