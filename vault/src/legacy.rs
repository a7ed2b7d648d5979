//! Deprecated entry points kept for existing callers.
//!
//! Both are thin adapters over the same session, fetch and merge path used
//! by [`VaultHandler::fetch_paths`]. Do not extend them.

use crate::environment::EnvironmentStore;
use crate::error::{ConfigError, MergeError, VaultError, VaultResult};
use crate::fetcher::fetch_merged;
use crate::handler::VaultHandler;
use crate::materializer::expand_and_materialize;
use crate::provider::Connector;
use crate::secrets::{MergedResult, SecretPaths};
use serde_json::Value;
use tracing::{error, info, warn};

/// Variable naming the application's config path.
pub const CONFIG_PATH_VAR: &str = "DECONFPATH";
/// Variable receiving the application name.
pub const APP_NAME_VAR: &str = "APPNAME";
/// Variable naming the deployment environment.
pub const DEPLOY_ENV_VAR: &str = "env";

/// Application name derived from a program path: the last `/`-separated
/// segment with `.py` removed, upper-cased. Other extensions are kept.
#[must_use]
pub fn app_name(program: &str) -> String {
    let file_name = program.rsplit('/').next().unwrap_or(program);
    file_name.replace(".py", "").to_uppercase()
}

impl<C, E> VaultHandler<C, E>
where
    C: Connector,
    E: EnvironmentStore,
{
    /// Fetch and merge secrets, reporting duplicate keys as a flag.
    ///
    /// Returns `(true, merged)` on success. When two paths share keys it
    /// returns `(false, {"errors": description})` instead of failing.
    ///
    /// Uses the configured default TLS verification policy
    /// ([`VaultConfig::verify`](crate::VaultConfig::verify)). Earlier
    /// releases of this call always skipped certificate verification; set
    /// `VAULT_SKIP_VERIFY=true` to keep that behavior.
    ///
    /// # Errors
    ///
    /// Missing credentials, login failures and backend failures are still
    /// returned as errors.
    #[deprecated(note = "use `fetch_paths`")]
    pub async fn get_secret(
        &self,
        paths: impl Into<SecretPaths>,
    ) -> VaultResult<(bool, MergedResult)> {
        warn!("get_secret is deprecated in favor of fetch_paths. Please update your code");

        let paths = paths.into();
        let session = self.open_session(self.config().verify()).await?;

        match fetch_merged(&session, &paths).await {
            Ok(merged) => Ok((true, merged)),
            Err(VaultError::Merge(MergeError::DuplicateKeys { keys })) => {
                let description =
                    format!("duplicated key while dict update duplicated keys: {keys:?}");
                Ok((
                    false,
                    MergedResult::from([("errors".to_string(), Value::String(description))]),
                ))
            }
            Err(e) => Err(e),
        }
    }

    /// Load the running program's config path into the environment store.
    ///
    /// See [`VaultHandler::load_config_path_for`].
    ///
    /// # Errors
    ///
    /// See [`VaultHandler::load_config_path_for`].
    #[deprecated(note = "use `fetch_paths` and `expand_config`")]
    #[allow(deprecated)]
    pub async fn load_config_path(&mut self) -> VaultResult<()> {
        let program = std::env::args().next().unwrap_or_default();
        self.load_config_path_for(&program).await
    }

    /// Load a program's config path into the environment store.
    ///
    /// Sets `APPNAME` from `program`. The config path is `DECONFPATH` when
    /// set, otherwise `{config_root}/{ENV}/{APPNAME}` derived from `env`
    /// (and stored as `DECONFPATH`). The mapping at that path is written to
    /// the environment with path references expanded.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnresolvableConfigPath`] when neither `DECONFPATH` nor
    /// `env` is set; otherwise any session, fetch, merge or materialize
    /// failure.
    #[deprecated(note = "use `fetch_paths` and `expand_config`")]
    pub async fn load_config_path_for(&mut self, program: &str) -> VaultResult<()> {
        warn!("get_config_path is deprecated in favor of fetch_paths. Please update your code");

        let app = app_name(program);
        self.environment_mut().set(APP_NAME_VAR, &app)?;

        let configured = self.environment().get(CONFIG_PATH_VAR);
        let deploy_env = self.environment().get(DEPLOY_ENV_VAR);
        let config_path = match (configured, deploy_env) {
            (Some(path), _) => path,
            (None, Some(deploy_env)) => {
                let path = format!(
                    "{}/{}/{app}",
                    self.config().config_root.trim_end_matches('/'),
                    deploy_env.to_uppercase()
                );
                self.environment_mut().set(CONFIG_PATH_VAR, &path)?;
                path
            }
            (None, None) => {
                error!("Not able to determine config path: neither DECONFPATH nor env is set");
                return Err(ConfigError::UnresolvableConfigPath.into());
            }
        };

        info!(app = %app, path = %config_path, "Loading application config from Vault");

        let verify = self.config().verify().clone();
        let session = self.open_session(&verify).await?;
        let config = fetch_merged(&session, &SecretPaths::from(config_path.as_str()))
            .await
            .inspect_err(|e| {
                error!(path = %config_path, error = %e, "Config path cannot be retrieved from Vault");
            })?;

        let marker = self.config().path_marker.clone();
        expand_and_materialize(self.environment_mut(), &config, &marker, &session).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_name() {
        assert_eq!(app_name("/opt/jobs/load_orders.py"), "LOAD_ORDERS");
        assert_eq!(app_name("./billing-sync"), "BILLING-SYNC");
        assert_eq!(app_name("./sync.sh"), "SYNC.SH");
        assert_eq!(app_name("bin/report.py.bak"), "REPORT.BAK");
        assert_eq!(app_name("report"), "REPORT");
        assert_eq!(app_name(""), "");
    }
}
