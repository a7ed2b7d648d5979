//! Secret types and Vault wire structures.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Flat key/value mapping stored at one secret path.
pub type SecretBundle = BTreeMap<String, Value>;

/// Union of the bundles of all requested paths.
pub type MergedResult = BTreeMap<String, Value>;

/// One or more secret paths, in the order they should be read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretPaths(Vec<String>);

impl SecretPaths {
    /// Iterate over the paths in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no path was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for SecretPaths {
    fn from(path: &str) -> Self {
        Self(vec![path.to_string()])
    }
}

impl From<String> for SecretPaths {
    fn from(path: String) -> Self {
        Self(vec![path])
    }
}

impl From<Vec<String>> for SecretPaths {
    fn from(paths: Vec<String>) -> Self {
        Self(paths)
    }
}

impl<const N: usize> From<[&str; N]> for SecretPaths {
    fn from(paths: [&str; N]) -> Self {
        Self(paths.iter().map(|p| (*p).to_string()).collect())
    }
}

/// Vault KV v2 read response wrapper.
#[derive(Debug, Deserialize)]
pub struct KvResponse {
    /// Versioned payload
    pub data: KvData,
}

/// Versioned payload of a KV v2 read.
#[derive(Debug, Deserialize)]
pub struct KvData {
    /// The secret itself; null for a deleted version
    pub data: Option<SecretBundle>,
    /// Version metadata
    #[serde(default)]
    pub metadata: Option<KvMetadata>,
}

/// Metadata of a KV v2 secret version.
#[derive(Debug, Deserialize)]
pub struct KvMetadata {
    /// Version number
    pub version: u32,
}

/// Vault auth response.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    /// Auth block; absent when the server returned no token
    pub auth: Option<AuthData>,
}

/// Auth block of a login response.
#[derive(Debug, Deserialize)]
pub struct AuthData {
    /// Issued client token
    #[serde(default)]
    pub client_token: Option<String>,
    /// Token TTL in seconds
    #[serde(default)]
    pub lease_duration: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_secret_paths_from_single_and_many() {
        let single = SecretPaths::from("app/db");
        assert_eq!(single.iter().collect::<Vec<_>>(), vec!["app/db"]);

        let many = SecretPaths::from(["app/db", "app/cache"]);
        assert_eq!(many.len(), 2);
        assert_eq!(many.iter().collect::<Vec<_>>(), vec!["app/db", "app/cache"]);

        assert!(SecretPaths::from(Vec::new()).is_empty());
    }

    #[test]
    fn test_kv_response_parsing() {
        let body = json!({
            "data": {
                "data": {"DB_USER": "a", "PORT": 5432},
                "metadata": {"version": 3, "created_time": "2024-01-01T00:00:00Z"}
            },
            "lease_id": "",
            "renewable": false
        });
        let response: KvResponse = serde_json::from_value(body).unwrap();
        let data = response.data.data.unwrap();
        assert_eq!(data["DB_USER"], json!("a"));
        assert_eq!(data["PORT"], json!(5432));
        assert_eq!(response.data.metadata.unwrap().version, 3);
    }

    #[test]
    fn test_auth_response_without_token() {
        let response: AuthResponse = serde_json::from_value(json!({"auth": null})).unwrap();
        assert!(response.auth.is_none());

        let response: AuthResponse =
            serde_json::from_value(json!({"auth": {"client_token": ""}})).unwrap();
        assert_eq!(response.auth.unwrap().client_token.as_deref(), Some(""));
    }
}
