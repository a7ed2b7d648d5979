//! Test fixtures with sample data.

use crate::mocks::MockVault;
use serde_json::Value;
use vault_env::{CredentialSource, SecretBundle, VaultConfig};

/// Role id used by [`test_credentials`].
pub const ROLE_ID: &str = "test-role-id";
/// Secret id used by [`test_credentials`].
pub const SECRET_ID: &str = "test-secret-id";
/// Endpoint used by [`test_credentials`].
pub const ENDPOINT: &str = "https://vault.test:8200";

/// Build a bundle of string values.
#[must_use]
pub fn bundle(pairs: &[(&str, &str)]) -> SecretBundle {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), Value::String((*v).to_string())))
        .collect()
}

/// `app/db`: database user and password.
#[must_use]
pub fn db_bundle() -> SecretBundle {
    bundle(&[("DB_USER", "a"), ("DB_PASS", "b")])
}

/// `app/cache`: cache host, disjoint from [`db_bundle`].
#[must_use]
pub fn cache_bundle() -> SecretBundle {
    bundle(&[("CACHE_HOST", "h")])
}

/// `app/legacy-db`: shares `DB_USER` with [`db_bundle`].
#[must_use]
pub fn legacy_db_bundle() -> SecretBundle {
    bundle(&[("DB_USER", "legacy"), ("DB_HOST", "old-db")])
}

/// A mock Vault holding the three sample bundles.
#[must_use]
pub fn sample_vault() -> MockVault {
    MockVault::new()
        .with_secret("app/db", db_bundle())
        .with_secret("app/cache", cache_bundle())
        .with_secret("app/legacy-db", legacy_db_bundle())
}

/// Complete credentials pointing at [`ENDPOINT`].
#[must_use]
pub fn test_credentials() -> CredentialSource {
    CredentialSource::default()
        .with_role_id(ROLE_ID)
        .with_secret_id(SECRET_ID)
        .with_endpoint(ENDPOINT)
}

/// Default configuration with [`test_credentials`].
#[must_use]
pub fn test_config() -> VaultConfig {
    VaultConfig::default().with_credentials(test_credentials())
}
