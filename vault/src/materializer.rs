//! Writing merged secrets into an environment store.
//!
//! Both entry points refuse to overwrite: a key that is already set fails
//! the call and keeps its value. Keys written earlier in the same call stay
//! written; there is no rollback.

use crate::environment::EnvironmentStore;
use crate::error::{MaterializeError, VaultError};
use crate::secrets::MergedResult;
use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, error, info, warn};

/// Resolves a secret path into its merged mapping.
#[async_trait]
pub trait ReferenceResolver: Send + Sync {
    /// Fetch and merge the secret stored at `path`.
    async fn resolve(&self, path: &str) -> Result<MergedResult, VaultError>;
}

/// Render a secret value as an environment string.
///
/// Strings are taken verbatim; any other JSON value is serialized compactly.
#[must_use]
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn write_entry<E>(store: &mut E, key: &str, value: &Value) -> Result<(), MaterializeError>
where
    E: EnvironmentStore + ?Sized,
{
    let attempted = stringify_value(value);
    if store.contains(key) {
        warn!(key, "Duplicated environment key, refusing to overwrite");
        return Err(MaterializeError::DuplicateEnvKey {
            key: key.to_string(),
            existing: SecretString::from(store.get(key).unwrap_or_default()),
            attempted: SecretString::from(attempted),
        });
    }
    store.set(key, &attempted).inspect_err(|e| {
        error!(key, error = %e, "Secret cannot be written to the environment");
    })
}

/// Write every entry of `mapping` into `store`.
///
/// # Errors
///
/// Returns [`MaterializeError::DuplicateEnvKey`] for the first key already
/// present in the store.
pub fn materialize<E>(store: &mut E, mapping: &MergedResult) -> Result<(), MaterializeError>
where
    E: EnvironmentStore + ?Sized,
{
    for (key, value) in mapping {
        write_entry(store, key, value)?;
    }
    debug!(keys = mapping.len(), "Materialized secrets");
    Ok(())
}

/// Write a config mapping into `store`, expanding path references.
///
/// Entries whose key starts with `marker` hold a secret path. The path is
/// resolved and the resulting keys are written in place of the marker key,
/// which itself is never written. Resolved keys are written literally, so a
/// reference expands one level only.
///
/// # Errors
///
/// - [`MaterializeError::InvalidReference`] if a reference value is not a
///   non-empty string.
/// - [`MaterializeError::ReferenceResolutionFailed`] if the referenced path
///   cannot be fetched or merged. Later entries are not written.
/// - [`MaterializeError::DuplicateEnvKey`] for any key already present.
pub async fn expand_and_materialize<E, R>(
    store: &mut E,
    config: &MergedResult,
    marker: &str,
    resolver: &R,
) -> Result<(), MaterializeError>
where
    E: EnvironmentStore + ?Sized,
    R: ReferenceResolver + ?Sized,
{
    for (key, value) in config {
        if !key.starts_with(marker) {
            write_entry(store, key, value)?;
            continue;
        }

        let path = match value {
            Value::String(path) if !path.trim().is_empty() => path.as_str(),
            _ => {
                error!(key = %key, "Path reference does not hold a secret path");
                return Err(MaterializeError::InvalidReference {
                    marker_key: key.clone(),
                });
            }
        };

        let resolved = resolver.resolve(path).await.map_err(|e| {
            error!(key = %key, path, error = %e, "Cannot retrieve referenced secret");
            MaterializeError::ReferenceResolutionFailed {
                marker_key: key.clone(),
                source: Box::new(e),
            }
        })?;

        info!(key = %key, path, keys = resolved.len(), "Expanding path reference");
        materialize(store, &resolved)?;
    }
    Ok(())
}
