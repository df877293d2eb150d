// SPDX-License-Identifier: MIT

//! Transport seam to the remote authority
//!
//! The client only needs two exchanges. [`HttpTransport`] speaks JSON over
//! HTTP; tests and embedders can supply their own [`Transport`].

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

use super::types::{LoadRequest, RemoteState, SyncRequest};
use crate::engine::error::{FlagsError, TransportError};

/// A round-trip carrier for load and sync exchanges
#[async_trait]
pub trait Transport: Send + Sync {
    async fn load(&self, request: &LoadRequest) -> Result<RemoteState, TransportError>;

    async fn sync(&self, request: &SyncRequest) -> Result<RemoteState, TransportError>;
}

/// JSON-over-HTTP transport posting to `{base_url}/flags/load` and `{base_url}/flags/sync`
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FlagsError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FlagsError::config(format!("cannot build http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, exchange: &str) -> String {
        format!("{}/flags/{}", self.base_url, exchange)
    }

    async fn post<B: Serialize + Sync>(
        &self,
        exchange: &str,
        body: &B,
    ) -> Result<RemoteState, TransportError> {
        let url = self.endpoint(exchange);
        log::debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(TransportError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn load(&self, request: &LoadRequest) -> Result<RemoteState, TransportError> {
        self.post("load", request).await
    }

    async fn sync(&self, request: &SyncRequest) -> Result<RemoteState, TransportError> {
        self.post("sync", request).await
    }
}
