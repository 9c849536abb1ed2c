// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Claim Gate
//!
//! This crate provides an admission gate for claim-style endpoints such as
//! token faucets, rejecting repeat claims before they reach the dispenser:
//!
//! - Per-address and per-client-IP limiting with a fixed TTL window
//! - Client IP resolution behind a configurable number of trusted proxies
//! - Reservation rollback when the upstream claim fails
//! - Optional hCaptcha verification
//! - Permissive CORS with `OPTIONS` short-circuit

pub mod captcha;
pub mod claim;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod limiter;
pub mod metrics;
pub mod middleware;
pub mod store;
pub mod upstream;

pub use config::Config;
pub use limiter::{Admission, AdmissionLimiter, RateLimited};
pub use store::TtlStore;
