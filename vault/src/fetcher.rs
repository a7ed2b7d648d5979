//! Reading secret paths through an authenticated session.

use crate::auth::Session;
use crate::error::{FetchError, VaultError};
use crate::materializer::ReferenceResolver;
use crate::merger::PathMerger;
use crate::provider::VaultTransport;
use crate::secrets::{MergedResult, SecretBundle, SecretPaths};
use async_trait::async_trait;
use tracing::{debug, error, instrument, warn};

/// Read the flat key/value mapping stored at `path`.
///
/// # Errors
///
/// - [`FetchError::Unauthenticated`] if the session has no token; nothing
///   is sent in that case.
/// - [`FetchError::BackendRejected`] for any backend failure. Never retried.
#[instrument(skip(session))]
pub async fn fetch<T: VaultTransport>(
    session: &Session<T>,
    path: &str,
) -> Result<SecretBundle, FetchError> {
    if !session.is_authenticated() {
        warn!(path, "Refusing to read with an unauthenticated session");
        return Err(FetchError::Unauthenticated);
    }

    let bundle = session
        .transport()
        .read_kv(session.token(), path)
        .await
        .map_err(|source| {
            error!(path, error = %source, "Error while fetching secrets from Vault");
            FetchError::BackendRejected {
                path: path.to_string(),
                source,
            }
        })?;

    debug!(path, keys = bundle.len(), "Fetched secret bundle");
    Ok(bundle)
}

/// Fetch every path in order and merge the bundles.
///
/// Each bundle is folded in as soon as it arrives, so a duplicate key stops
/// the remaining reads.
///
/// # Errors
///
/// Returns the first fetch or merge failure; no partial result is produced.
pub async fn fetch_merged<T: VaultTransport>(
    session: &Session<T>,
    paths: &SecretPaths,
) -> Result<MergedResult, VaultError> {
    let mut merger = PathMerger::new();
    for path in paths.iter() {
        let bundle = fetch(session, path).await?;
        merger.push(bundle)?;
    }
    Ok(merger.finish())
}

#[async_trait]
impl<T: VaultTransport> ReferenceResolver for Session<T> {
    async fn resolve(&self, path: &str) -> Result<MergedResult, VaultError> {
        fetch_merged(self, &SecretPaths::from(path)).await
    }
}
