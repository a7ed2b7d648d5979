//! Vault HTTP client.

use crate::{
    error::TransportError,
    provider::{Connector, VaultTransport},
    secrets::{AuthResponse, KvResponse, SecretBundle},
};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};
use url::Url;
use vault_env_common::{HttpConfig, TlsVerify, build_http_client};

/// Vault client for AppRole login and KV v2 reads.
#[derive(Debug)]
pub struct VaultClient {
    endpoint: Url,
    http: Client,
    kv_mount: String,
}

impl VaultClient {
    /// Create a new Vault client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        endpoint: Url,
        http_config: &HttpConfig,
        kv_mount: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let http = build_http_client(http_config)?;

        Ok(Self {
            endpoint,
            http,
            kv_mount: kv_mount.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        token: Option<&SecretString>,
        body: Option<serde_json::Value>,
    ) -> Result<T, TransportError> {
        let mut request = self.http.request(method, self.url(path));

        if let Some(token) = token {
            request = request.header("X-Vault-Token", token.expose_secret());
        }
        if let Some(b) = body {
            request = request.json(&b);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::unavailable(e.to_string()))?;

        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => return Err(TransportError::not_found(path)),
            StatusCode::FORBIDDEN => {
                return Err(TransportError::PermissionDenied(path.to_string()));
            }
            s if !s.is_success() => {
                let text = response.text().await.unwrap_or_default();
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    body: text,
                });
            }
            _ => {}
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl VaultTransport for VaultClient {
    #[instrument(skip(self, secret_id), fields(endpoint = %self.endpoint))]
    async fn approle_login(
        &self,
        role_id: &str,
        secret_id: &SecretString,
    ) -> Result<Option<SecretString>, TransportError> {
        let body = serde_json::json!({
            "role_id": role_id,
            "secret_id": secret_id.expose_secret(),
        });

        let response: AuthResponse = self
            .request(Method::POST, "auth/approle/login", None, Some(body))
            .await
            .map_err(|e| match e {
                TransportError::Status { status, body } => {
                    TransportError::auth_failed(format!("Status {status}: {body}"))
                }
                other => other,
            })?;

        let auth = response.auth;
        if let Some(lease) = auth.as_ref().map(|a| a.lease_duration) {
            info!(ttl_secs = lease, "Authenticated with Vault");
        }

        Ok(auth
            .and_then(|a| a.client_token)
            .map(SecretString::from))
    }

    #[instrument(skip(self, token))]
    async fn read_kv(
        &self,
        token: &SecretString,
        path: &str,
    ) -> Result<SecretBundle, TransportError> {
        debug!(path, "Reading secret");

        let kv_path = format!("{}/data/{}", self.kv_mount, path.trim_start_matches('/'));
        let response: KvResponse = self
            .request(Method::GET, &kv_path, Some(token), None)
            .await
            .map_err(|e| match e {
                TransportError::SecretNotFound(_) => TransportError::not_found(path),
                TransportError::PermissionDenied(_) => {
                    TransportError::PermissionDenied(path.to_string())
                }
                other => other,
            })?;

        if let Some(metadata) = &response.data.metadata {
            debug!(path, version = metadata.version, "Secret read");
        }

        response
            .data
            .data
            .ok_or_else(|| TransportError::not_found(path))
    }
}

/// Connector producing [`VaultClient`]s over HTTP.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    http_config: HttpConfig,
    kv_mount: String,
}

impl HttpConnector {
    /// Create a connector with the given HTTP settings and KV mount.
    #[must_use]
    pub fn new(http_config: HttpConfig, kv_mount: impl Into<String>) -> Self {
        Self {
            http_config,
            kv_mount: kv_mount.into(),
        }
    }
}

impl Connector for HttpConnector {
    type Transport = VaultClient;

    fn connect(&self, endpoint: &Url, verify: &TlsVerify) -> Result<VaultClient, TransportError> {
        let http_config = self.http_config.clone().with_verify(verify.clone());
        VaultClient::new(endpoint.clone(), &http_config, self.kv_mount.clone())
    }
}
