// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Attack simulation patterns for security testing.

/// Attack pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of claims to send
    pub total_requests: usize,
    /// Number of unique client IPs to simulate
    pub unique_ips: usize,
    /// Number of unique claim addresses
    pub unique_addresses: usize,
    /// Forged `X-Forwarded-For` entries prepended by the client
    pub forged_hops: usize,
    /// Trusted proxies the gate is configured for
    pub proxy_count: usize,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            unique_ips: 1,
            unique_addresses: 1,
            forged_hops: 0,
            proxy_count: 0,
        }
    }
}

/// Predefined attack patterns.
impl AttackConfig {
    /// Same wallet, same IP, claiming repeatedly.
    pub fn single_claimer_flood() -> Self {
        Self {
            total_requests: 200,
            ..Default::default()
        }
    }

    /// One IP cycling through fresh wallets.
    pub fn address_rotation() -> Self {
        Self {
            total_requests: 100,
            unique_addresses: 100,
            ..Default::default()
        }
    }

    /// One wallet claimed from many IPs.
    pub fn ip_rotation() -> Self {
        Self {
            total_requests: 100,
            unique_ips: 100,
            ..Default::default()
        }
    }

    /// Fresh wallet per request, forging a new client IP each time behind
    /// one trusted proxy.
    pub fn forwarded_for_spoofing() -> Self {
        Self {
            total_requests: 100,
            unique_addresses: 100,
            forged_hops: 3,
            proxy_count: 1,
            ..Default::default()
        }
    }

    /// Legitimate traffic: every claimer distinct.
    pub fn distinct_claimers() -> Self {
        Self {
            total_requests: 100,
            unique_ips: 100,
            unique_addresses: 100,
            ..Default::default()
        }
    }

    /// Upper bound on claims that may be admitted.
    pub fn max_admitted(&self) -> usize {
        self.unique_ips.min(self.unique_addresses)
    }
}
