// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for the claim gate.
//!
//! Provides a router wired to stub collaborators, plus utilities for
//! simulating abusive claim patterns.

#![allow(dead_code)]

pub mod attacks;

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    extract::ConnectInfo,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use claim_gate::{
    captcha::{CaptchaVerifier, CAPTCHA_HEADER},
    config::{Config, LimiterConfig},
    handlers::{router, AppState},
    identity::X_FORWARDED_FOR,
    limiter::AdmissionLimiter,
    metrics::GateMetrics,
    store::TtlStore,
    upstream::{ClaimUpstream, UpstreamError, UpstreamResponse},
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Upstream stub answering every claim with a configurable status.
pub struct StubUpstream {
    status: AtomicU16,
    unreachable: bool,
    delay: Duration,
    calls: AtomicUsize,
}

impl StubUpstream {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status: AtomicU16::new(status.as_u16()),
            unreachable: false,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::new(StatusCode::OK)
        }
    }

    /// Answer only after `delay` has passed.
    pub fn slow(status: StatusCode, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new(status)
        }
    }

    pub fn set_status(&self, status: StatusCode) {
        self.status.store(status.as_u16(), Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClaimUpstream for StubUpstream {
    async fn forward(&self, address: &str, _body: Bytes) -> Result<UpstreamResponse, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.unreachable {
            return Err(UpstreamError("connection refused".to_string()));
        }
        let status = StatusCode::from_u16(self.status.load(Ordering::SeqCst))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::json!({ "message": format!("Txhash: claimed {address}") });
        Ok(UpstreamResponse {
            status,
            content_type: Some("application/json".to_string()),
            body: Bytes::from(body.to_string()),
        })
    }
}

/// Captcha stub accepting exactly one token.
pub struct StubCaptcha {
    pub accepted: &'static str,
}

#[async_trait]
impl CaptchaVerifier for StubCaptcha {
    async fn verify(&self, token: &str) -> bool {
        token == self.accepted
    }
}

/// A router plus handles on its collaborators.
pub struct TestGate {
    pub app: Router,
    pub state: Arc<AppState>,
    pub upstream: Arc<StubUpstream>,
}

pub struct GateBuilder {
    limiter: LimiterConfig,
    upstream: StubUpstream,
    captcha: Option<StubCaptcha>,
}

impl GateBuilder {
    pub fn new() -> Self {
        Self {
            limiter: LimiterConfig::default(),
            upstream: StubUpstream::new(StatusCode::OK),
            captcha: None,
        }
    }

    pub fn proxy_count(mut self, proxy_count: usize) -> Self {
        self.limiter.proxy_count = proxy_count;
        self
    }

    pub fn ttl_secs(mut self, ttl_secs: i64) -> Self {
        self.limiter.ttl_secs = ttl_secs;
        self
    }

    pub fn upstream(mut self, upstream: StubUpstream) -> Self {
        self.upstream = upstream;
        self
    }

    pub fn captcha(mut self, accepted: &'static str) -> Self {
        self.captcha = Some(StubCaptcha { accepted });
        self
    }

    pub fn build(self) -> TestGate {
        let upstream = Arc::new(self.upstream);
        let config = Config {
            limiter: self.limiter.clone(),
            ..Default::default()
        };
        let state = Arc::new(AppState {
            limiter: AdmissionLimiter::new(self.limiter, TtlStore::new()),
            captcha: self
                .captcha
                .map(|c| Arc::new(c) as Arc<dyn CaptchaVerifier>),
            upstream: upstream.clone(),
            metrics: GateMetrics::new().expect("metrics registry"),
            config,
        });
        TestGate {
            app: router(state.clone()),
            state,
            upstream,
        }
    }
}

/// A claim for `address` arriving over a connection from `remote`.
pub fn claim_request(address: &str, remote: &str) -> ClaimRequestBuilder {
    ClaimRequestBuilder {
        body: serde_json::json!({ "address": address }).to_string(),
        remote: remote.parse().expect("remote socket address"),
        forwarded_for: None,
        captcha: None,
        content_type: "application/json",
    }
}

pub struct ClaimRequestBuilder {
    body: String,
    remote: SocketAddr,
    forwarded_for: Option<String>,
    captcha: Option<String>,
    content_type: &'static str,
}

impl ClaimRequestBuilder {
    pub fn forwarded_for(mut self, value: impl Into<String>) -> Self {
        self.forwarded_for = Some(value.into());
        self
    }

    pub fn captcha(mut self, token: impl Into<String>) -> Self {
        self.captcha = Some(token.into());
        self
    }

    pub fn raw_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn content_type(mut self, content_type: &'static str) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn build(self) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/api/claim")
            .header(header::CONTENT_TYPE, self.content_type);
        if let Some(forwarded) = &self.forwarded_for {
            builder = builder.header(X_FORWARDED_FOR, forwarded);
        }
        if let Some(token) = &self.captcha {
            builder = builder.header(CAPTCHA_HEADER, token);
        }
        let mut request = builder.body(Body::from(self.body)).expect("valid request");
        request.extensions_mut().insert(ConnectInfo(self.remote));
        request
    }
}

/// Decode the `message` field of a JSON response.
pub async fn message(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    let value: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
    value["message"].as_str().unwrap_or_default().to_string()
}
