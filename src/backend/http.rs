//! [`ByteStore`] over HTTP(S) with `reqwest`.
//!
//! One GET per call, no retry. The pipeline bounds the call with its own
//! download timeout; the client timeout here is a backstop for callers that
//! use the adapter on its own.

use crate::capability::{ByteStore, FetchedBytes};
use crate::error::CapabilityError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

/// Shared HTTP client; cheap to clone.
#[derive(Debug, Clone)]
pub struct HttpByteStore {
    client: reqwest::Client,
}

impl HttpByteStore {
    pub fn new(timeout_secs: u64) -> Result<Self, CapabilityError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("docenrich/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CapabilityError::Unavailable(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client (connection pool, proxy settings, ...).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ByteStore for HttpByteStore {
    async fn fetch(&self, url: &str) -> Result<FetchedBytes, CapabilityError> {
        let response = self.client.get(url).send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CapabilityError::Http {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty());

        let bytes = response.bytes().await.map_err(transport_error)?;
        debug!("GET {} → {} bytes ({:?})", url, bytes.len(), content_type);

        Ok(FetchedBytes {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

fn transport_error(e: reqwest::Error) -> CapabilityError {
    if e.is_timeout() {
        // The client-level timeout; the secs value is not carried by reqwest.
        CapabilityError::Transport(format!("request timed out: {e}"))
    } else {
        CapabilityError::Transport(e.to_string())
    }
}
