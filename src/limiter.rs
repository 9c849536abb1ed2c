// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Dual-key admission limiter for claim requests.
//!
//! Every claim is keyed twice:
//! 1. By the claimed address (application identity)
//! 2. By the client IP derived from the connection (network identity)
//!
//! An admission reserves both keys for the configured window. If the
//! downstream claim does not succeed the reservation is released again, so
//! callers are only charged for claims that actually went through.

use crate::config::LimiterConfig;
use crate::identity::client_identity;
use crate::store::TtlStore;
use axum::http::{HeaderMap, StatusCode};
use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Which of the two keys caused a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitedKey {
    Address,
    ClientIp,
}

impl fmt::Display for LimitedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address => write!(f, "address"),
            Self::ClientIp => write!(f, "client_ip"),
        }
    }
}

/// A rejected admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimited {
    pub key: LimitedKey,
    pub client_ip: String,
    pub retry_after: Duration,
}

impl RateLimited {
    /// Remaining wait rounded to the nearest second, halves rounding up.
    pub fn retry_after_secs(&self) -> u64 {
        const NANOS_PER_SEC: u128 = 1_000_000_000;
        ((self.retry_after.as_nanos() + NANOS_PER_SEC / 2) / NANOS_PER_SEC) as u64
    }

    pub fn message(&self) -> String {
        format!(
            "You have exceeded the rate limit. Please wait {}s before you try again",
            self.retry_after_secs()
        )
    }
}

/// Keys held for an admitted request until it is settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub address: String,
    pub client_ip: String,
}

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Limiting is disabled; nothing was reserved
    Bypassed,
    /// Both keys are now reserved
    Admitted(Reservation),
    /// One of the keys is still inside its window
    Rejected(RateLimited),
}

impl Admission {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Admission::Rejected(_))
    }
}

/// What `settle` did with a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The claim succeeded; keys stay until they expire
    Kept,
    /// The claim failed; keys were released
    RolledBack,
}

/// Admission limiter backed by an injected [`TtlStore`].
pub struct AdmissionLimiter {
    config: LimiterConfig,
    store: TtlStore,
    /// Serialises check-then-reserve across requests
    gate: Mutex<()>,
}

impl AdmissionLimiter {
    pub fn new(config: LimiterConfig, store: TtlStore) -> Self {
        Self {
            config,
            store,
            gate: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }

    pub fn store(&self) -> &TtlStore {
        &self.store
    }

    /// Check `address` and the client identity of the request, reserving
    /// both when neither is inside its window.
    pub async fn admit(&self, address: &str, headers: &HeaderMap, remote_addr: &str) -> Admission {
        let client_ip = client_identity(headers, remote_addr, self.config.proxy_count);

        let Some(ttl) = self.config.ttl() else {
            return Admission::Bypassed;
        };

        let _guard = self.gate.lock().await;

        for (kind, key) in [(LimitedKey::Address, address), (LimitedKey::ClientIp, client_ip.as_str())] {
            if let Some(retry_after) = self.store.probe(key).await {
                let limited = RateLimited {
                    key: kind,
                    client_ip: client_ip.clone(),
                    retry_after,
                };
                info!(
                    address,
                    client_ip = %client_ip,
                    limited_by = %kind,
                    retry_after_secs = limited.retry_after_secs(),
                    "Request rate limited"
                );
                return Admission::Rejected(limited);
            }
        }

        self.store.set(address, ttl).await;
        self.store.set(&client_ip, ttl).await;
        debug!(address, client_ip = %client_ip, ?ttl, "Request admitted");

        Admission::Admitted(Reservation {
            address: address.to_string(),
            client_ip,
        })
    }

    /// Finalise a reservation once the downstream handler has responded.
    pub async fn settle(&self, reservation: &Reservation, status: StatusCode) -> Settlement {
        if status != StatusCode::OK {
            self.store.remove(&reservation.address).await;
            self.store.remove(&reservation.client_ip).await;
            debug!(
                address = %reservation.address,
                client_ip = %reservation.client_ip,
                status = status.as_u16(),
                "Claim failed, released reservation"
            );
            return Settlement::RolledBack;
        }

        info!(
            address = %reservation.address,
            client_ip = %reservation.client_ip,
            "Maximum request limit has been reached"
        );
        Settlement::Kept
    }
}
