// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Claim request extraction.
//!
//! Pulls the claimed account address out of a JSON request body:
//! - Content-Type must be `application/json`
//! - Body limited to 1 MiB, must not be empty
//! - Exactly one JSON object with an `address` field, nothing else
//! - Address must be 20 bytes of hex, `0x` prefix optional

use axum::body::{Body, Bytes};
use axum::http::StatusCode;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Maximum accepted claim body size.
pub const MAX_BODY_BYTES: usize = 1 << 20;

const ADDRESS_HEX_LEN: usize = 40;

/// Claim extraction errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimError {
    #[error("Content-Type header is not application/json")]
    UnsupportedContentType,

    #[error("Request body must not be larger than 1MB")]
    TooLarge,

    #[error("Request body must not be empty")]
    Empty,

    #[error("Request body contains badly-formed JSON")]
    Malformed,

    #[error("Request body contains unknown field \"{0}\"")]
    UnknownField(String),

    #[error("Request body contains an invalid value for the \"address\" field")]
    InvalidValue,

    #[error("Invalid address")]
    InvalidAddress,

    /// The body stream failed; not the client's fault
    #[error("Failed to read request body: {0}")]
    Read(String),
}

impl ClaimError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnsupportedContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Read(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Whether the error describes a bad request rather than a server fault.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, Self::Read(_))
    }
}

/// Validated claim address, attached to the request for downstream handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimAddress(pub String);

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClaimRequest {
    #[serde(default)]
    address: String,
}

/// Reject anything but `application/json`, parameters allowed.
pub fn check_content_type(content_type: Option<&str>) -> Result<(), ClaimError> {
    let media_type = content_type
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase());
    match media_type.as_deref() {
        Some("application/json") => Ok(()),
        _ => {
            debug!(content_type = ?content_type, "Unsupported claim Content-Type");
            Err(ClaimError::UnsupportedContentType)
        }
    }
}

/// Buffer the request body, enforcing [`MAX_BODY_BYTES`].
pub async fn read_body(body: Body) -> Result<Bytes, ClaimError> {
    match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => Err(ClaimError::TooLarge),
        Err(err) => Err(ClaimError::Read(err.to_string())),
    }
}

/// Parse the claim body and return the normalised address key.
pub fn parse_address(body: &[u8]) -> Result<String, ClaimError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ClaimError::Empty);
    }

    let request: ClaimRequest = serde_json::from_slice(body).map_err(classify_json_error)?;
    normalize_address(&request.address).ok_or(ClaimError::InvalidAddress)
}

fn classify_json_error(err: serde_json::Error) -> ClaimError {
    use serde_json::error::Category;

    match err.classify() {
        Category::Data => {
            let message = err.to_string();
            match message
                .strip_prefix("unknown field `")
                .and_then(|rest| rest.split_once('`'))
            {
                Some((field, _)) => ClaimError::UnknownField(field.to_string()),
                None => ClaimError::InvalidValue,
            }
        }
        Category::Syntax | Category::Eof => ClaimError::Malformed,
        Category::Io => ClaimError::Read(err.to_string()),
    }
}

/// Lowercase `0x`-prefixed form of a hex account address, if valid.
///
/// Checksummed and plain spellings of one account map to the same key.
pub fn normalize_address(raw: &str) -> Option<String> {
    let hex = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    if hex.len() != ADDRESS_HEX_LEN || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("0x{}", hex.to_ascii_lowercase()))
}
