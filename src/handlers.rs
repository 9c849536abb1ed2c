// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers and router for the claim gate.

use crate::captcha::CaptchaVerifier;
use crate::claim::ClaimAddress;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::limiter::AdmissionLimiter;
use crate::metrics::GateMetrics;
use crate::middleware;
use crate::upstream::ClaimUpstream;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state.
pub struct AppState {
    pub limiter: AdmissionLimiter,
    /// `None` when no captcha secret is configured
    pub captcha: Option<Arc<dyn CaptchaVerifier>>,
    pub upstream: Arc<dyn ClaimUpstream>,
    pub metrics: GateMetrics,
    pub config: Config,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Build the gate's router.
pub fn router(state: Arc<AppState>) -> Router {
    // Route layers leave the 405 fallback for other methods untouched.
    let claim_route = post(claim)
        .route_layer(from_fn_with_state(state.clone(), middleware::captcha))
        .route_layer(from_fn_with_state(state.clone(), middleware::admission));

    let mut router = Router::new()
        .route("/api/claim", claim_route)
        .route("/health", get(health))
        .route("/healthz", get(health));
    if state.config.metrics.enabled {
        router = router.route(&state.config.metrics.path, get(metrics));
    }

    router
        .layer(from_fn(middleware::preflight))
        .layer(middleware::cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "claim-gate",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Forward an admitted claim upstream and relay the answer.
pub async fn claim(
    State(state): State<Arc<AppState>>,
    Extension(ClaimAddress(address)): Extension<ClaimAddress>,
    body: Bytes,
) -> Result<Response> {
    let upstream = state.upstream.forward(&address, body).await?;

    let mut response = (upstream.status, upstream.body).into_response();
    if let Some(content_type) = upstream
        .content_type
        .and_then(|ct| HeaderValue::from_str(&ct).ok())
    {
        response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    }
    Ok(response)
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<String> {
    state
        .metrics
        .set_store_entries(state.limiter.store().len().await);
    state
        .metrics
        .render()
        .map_err(|e| AppError::Internal(e.to_string()))
}
