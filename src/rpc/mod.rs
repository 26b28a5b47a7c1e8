//! Authenticated JSON RPC caller for self-hosted wallet nodes.
//!
//! Requests are `POST {base_url}/{method}` with a JSON body. The node
//! authenticates us with a client certificate and presents a self-signed
//! certificate of its own, so server verification is switched off.

pub mod number;
pub mod wallet;

pub use wallet::{
    MutualTlsConnector, SendTransaction, SyncStatus, Transaction, WalletBalance, WalletClient,
    WalletConnector, WalletInfo, WalletRpc, WalletType,
};

use crate::types::ConnectionOptions;
use reqwest::{Client, Identity, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::trace;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors produced by the wallet RPC layer.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// Transport-level failure (DNS, TLS, connection refused, timeout).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// Client certificate or key could not be read.
    #[error("failed to read {path}: {source}")]
    Identity {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The node answered but reported a failure.
    #[error("{method} failed: {message}")]
    Rpc { method: String, message: String },

    #[error("{method} returned HTTP {status}")]
    Status { method: String, status: StatusCode },

    #[error("{method} returned an unexpected body: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Fields every wallet node response carries.
#[derive(Debug, serde::Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RpcClient {
    http: Client,
    base_url: Url,
}

impl RpcClient {
    /// Builds a client presenting the configured certificate and key.
    pub fn connect(options: &ConnectionOptions) -> Result<Self, RpcError> {
        let identity = load_identity(&options.cert_file_path, &options.key_file_path)?;
        let http = Client::builder()
            .identity(identity)
            .danger_accept_invalid_certs(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self::with_http_client(options.url.clone(), http))
    }

    /// Uses a prebuilt `reqwest::Client` instead of the mutual-TLS one.
    pub fn with_http_client(mut base_url: Url, http: Client) -> Self {
        // `Url::join` replaces the last segment unless the path ends in a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Calls `method` and decodes the response once the envelope checks out.
    ///
    /// A non-empty `error` in the body is reported in preference to the HTTP
    /// status, so a 500 from the node still surfaces the node's own message.
    pub async fn request<B, T>(&self, method: &str, body: &B) -> Result<T, RpcError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.base_url.join(method)?;
        trace!(%url, "wallet rpc request");

        let resp = self.http.post(url).json(body).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;

        let envelope = serde_json::from_slice::<Envelope>(&bytes).ok();
        if let Some(message) = envelope
            .as_ref()
            .and_then(|e| e.error.as_deref())
            .filter(|m| !m.is_empty())
        {
            return Err(RpcError::Rpc {
                method: method.to_string(),
                message: message.to_string(),
            });
        }

        if !status.is_success() {
            return Err(RpcError::Status {
                method: method.to_string(),
                status,
            });
        }

        if !envelope.is_some_and(|e| e.success) {
            return Err(RpcError::Rpc {
                method: method.to_string(),
                message: format!("request failed, got {}", String::from_utf8_lossy(&bytes)),
            });
        }

        serde_json::from_slice(&bytes).map_err(|source| RpcError::Decode {
            method: method.to_string(),
            source,
        })
    }
}

fn load_identity(cert_path: &Path, key_path: &Path) -> Result<Identity, RpcError> {
    let read = |path: &Path| {
        std::fs::read(path).map_err(|source| RpcError::Identity {
            path: path.to_path_buf(),
            source,
        })
    };

    let mut pem = read(cert_path)?;
    pem.push(b'\n');
    pem.extend(read(key_path)?);

    Ok(Identity::from_pem(&pem)?)
}
