// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Upstream claim service client.
//!
//! Admitted claims are forwarded unchanged; the upstream's status decides
//! whether the admission is kept or rolled back.

use crate::config::UpstreamConfig;
use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::StatusCode;
use thiserror::Error;
use tracing::debug;

/// Upstream transport failure.
#[derive(Debug, Error)]
#[error("upstream claim service unavailable: {0}")]
pub struct UpstreamError(pub String);

/// Response relayed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Fulfils an admitted claim.
#[async_trait]
pub trait ClaimUpstream: Send + Sync {
    async fn forward(&self, address: &str, body: Bytes) -> Result<UpstreamResponse, UpstreamError>;
}

/// Forwards claims to an HTTP endpoint.
pub struct HttpUpstream {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl HttpUpstream {
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| UpstreamError(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ClaimUpstream for HttpUpstream {
    async fn forward(&self, address: &str, body: Bytes) -> Result<UpstreamResponse, UpstreamError> {
        let response = self
            .client
            .post(self.config.url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| UpstreamError(e.to_string()))?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .map_err(|e| UpstreamError(e.to_string()))?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError(e.to_string()))?;

        debug!(address, status = status.as_u16(), "Upstream claim completed");
        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
