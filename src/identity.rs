// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Client identity resolution behind trusted reverse proxies.
//!
//! `X-Forwarded-For` is only consulted when proxies are configured, and then
//! read from the right: each trusted proxy appends the address it saw, so
//! the entry `proxy_count` positions from the end is the last one written by
//! infrastructure we control. Anything to the left of it is client-supplied.

use axum::http::HeaderMap;
use std::net::SocketAddr;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Derive the identity string used as the IP rate-limit key.
///
/// Never fails: when nothing better is available the raw remote address is
/// returned unchanged.
pub fn client_identity(headers: &HeaderMap, remote_addr: &str, proxy_count: usize) -> String {
    if proxy_count > 0 {
        // Forged entries may carry non-ASCII bytes; they must not hide the
        // trusted hops to their right.
        let forwarded = headers
            .get(X_FORWARDED_FOR)
            .map(|v| String::from_utf8_lossy(v.as_bytes()))
            .filter(|v| !v.is_empty());
        if let Some(forwarded) = forwarded {
            let parts: Vec<&str> = forwarded.split(',').collect();
            let index = parts.len().saturating_sub(proxy_count);
            return parts[index].trim().to_string();
        }
    }

    strip_port(remote_addr)
}

/// Drop the `:port` suffix from a transport address.
fn strip_port(remote_addr: &str) -> String {
    if let Ok(addr) = remote_addr.parse::<SocketAddr>() {
        return addr.ip().to_string();
    }

    // Non-IP hosts such as `localhost:8080` or `[fe80::1%eth0]:443`
    let split = match remote_addr.strip_prefix('[') {
        Some(rest) => rest.split_once("]:").map(|(host, _)| host),
        None => remote_addr
            .split_once(':')
            .filter(|(_, port)| !port.contains(':'))
            .map(|(host, _)| host),
    };
    split.unwrap_or(remote_addr).to_string()
}
