// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP-facing errors. Every variant renders as `{"message": "..."}`.

use crate::claim::ClaimError;
use crate::limiter::RateLimited;
use crate::upstream::UpstreamError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Response body shared by all gate responses.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error("{}", .0.message())]
    RateLimited(RateLimited),

    #[error("Captcha verification failed, please try again")]
    CaptchaFailed,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RateLimited> for AppError {
    fn from(limited: RateLimited) -> Self {
        Self::RateLimited(limited)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Claim(err) => err.status(),
            Self::RateLimited(_) | Self::CaptchaFailed => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to the client; server faults stay generic.
    fn public_message(&self) -> String {
        match self {
            Self::Claim(err) if !err.is_malformed() => internal_message(),
            Self::Upstream(_) => "Upstream claim service unavailable".to_string(),
            Self::Internal(_) => internal_message(),
            other => other.to_string(),
        }
    }
}

fn internal_message() -> String {
    StatusCode::INTERNAL_SERVER_ERROR
        .canonical_reason()
        .unwrap_or("Internal Server Error")
        .to_string()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Claim request failed");
        }

        let mut response = (status, Json(MessageResponse::new(self.public_message()))).into_response();
        if let Self::RateLimited(limited) = &self {
            if let Ok(v) = HeaderValue::from_str(&limited.retry_after_secs().to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, v);
            }
        }
        response
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
