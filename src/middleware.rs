// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Request filters in front of the claim handler.
//!
//! Layer order, outermost first:
//! 1. CORS headers and `OPTIONS` short-circuit
//! 2. Claim extraction and admission limiting
//! 3. Captcha verification
//!
//! Captcha runs inside the limiter, so a failed captcha is a non-success
//! downstream outcome and releases the reservation it was given. Admitted
//! requests always run to settlement, even if the client disconnects.

use crate::captcha::CAPTCHA_HEADER;
use crate::claim::{self, ClaimAddress};
use crate::error::AppError;
use crate::handlers::AppState;
use crate::limiter::{Admission, Settlement};
use crate::metrics::Outcome;
use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderName, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::debug;

/// Permissive CORS for browser-based claim forms.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(CAPTCHA_HEADER),
        ])
}

/// Answer every `OPTIONS` request before limiting or captcha see it.
pub async fn preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}

/// Extract the claim address, then admit, run and settle the request.
pub async fn admission(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let extracted = async {
        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        claim::check_content_type(content_type)?;
        let bytes = claim::read_body(body).await?;
        let address = claim::parse_address(&bytes)?;
        Ok::<_, claim::ClaimError>((address, bytes))
    };
    let (address, bytes) = match extracted.await {
        Ok(extracted) => extracted,
        Err(err) => {
            debug!(error = %err, "Rejected claim request");
            return AppError::from(err).into_response();
        }
    };

    let remote_addr = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();
    parts.extensions.insert(ClaimAddress(address.clone()));
    let request = Request::from_parts(parts, Body::from(bytes));

    let reservation = match state.limiter.admit(&address, request.headers(), &remote_addr).await {
        Admission::Bypassed => {
            state.metrics.record(Outcome::Bypassed);
            return next.run(request).await;
        }
        Admission::Rejected(limited) => {
            state.metrics.record(Outcome::Rejected);
            return AppError::from(limited).into_response();
        }
        Admission::Admitted(reservation) => {
            state.metrics.record(Outcome::Admitted);
            reservation
        }
    };

    // The claim and its settlement run detached from the connection, so a
    // client hanging up cannot leave a failed claim holding its reservation.
    let settled = tokio::spawn(async move {
        let response = next.run(request).await;
        if state.limiter.settle(&reservation, response.status()).await == Settlement::RolledBack {
            state.metrics.record(Outcome::RolledBack);
        }
        state
            .metrics
            .set_store_entries(state.limiter.store().len().await);
        response
    });

    match settled.await {
        Ok(response) => response,
        Err(e) => AppError::Internal(format!("claim task failed: {e}")).into_response(),
    }
}

/// Verify the captcha token when a secret is configured.
pub async fn captcha(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let Some(verifier) = &state.captcha else {
        return next.run(request).await;
    };

    let token = request
        .headers()
        .get(CAPTCHA_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !verifier.verify(token).await {
        state.metrics.record_captcha_failure();
        return AppError::CaptchaFailed.into_response();
    }

    next.run(request).await
}
