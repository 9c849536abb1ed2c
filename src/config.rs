// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the claim gate.
//!
//! Every option can be supplied through an environment variable; anything
//! missing or unparseable falls back to its default.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Configuration for the claim gate service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Rate limiting configuration
    #[serde(default)]
    pub limiter: LimiterConfig,

    /// Upstream claim service configuration
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Captcha configuration
    #[serde(default)]
    pub captcha: CaptchaConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Admission limiter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Number of trusted reverse proxies in front of the gate (default: 0,
    /// meaning `X-Forwarded-For` is ignored)
    #[serde(default)]
    pub proxy_count: usize,

    /// Window during which an admitted address or IP is blocked, in seconds.
    /// Zero or negative disables limiting. (default: 86400)
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: i64,
}

/// Upstream claim service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Claim endpoint admitted requests are forwarded to
    #[serde(default = "default_upstream_url")]
    pub url: Url,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_upstream_timeout_secs")]
    pub timeout_secs: u64,
}

/// hCaptcha configuration. An empty secret disables verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaConfig {
    #[serde(default)]
    pub site_key: String,

    #[serde(default)]
    pub secret: String,

    /// Verification endpoint (default: https://api.hcaptcha.com/siteverify)
    #[serde(default = "default_verify_url")]
    pub verify_url: String,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_ttl_secs() -> i64 {
    24 * 60 * 60
}

fn default_upstream_url() -> Url {
    Url::parse("http://127.0.0.1:9000/api/claim").expect("default upstream url is valid")
}

fn default_upstream_timeout_secs() -> u64 {
    30
}

fn default_verify_url() -> String {
    "https://api.hcaptcha.com/siteverify".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            limiter: LimiterConfig::default(),
            upstream: UpstreamConfig::default(),
            captcha: CaptchaConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            proxy_count: 0,
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            timeout_secs: default_upstream_timeout_secs(),
        }
    }
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            site_key: String::new(),
            secret: String::new(),
            verify_url: default_verify_url(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl LimiterConfig {
    /// The limiting window, or `None` when limiting is disabled.
    pub fn ttl(&self) -> Option<Duration> {
        u64::try_from(self.ttl_secs)
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CaptchaConfig {
    pub fn enabled(&self) -> bool {
        !self.secret.is_empty()
    }
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Config {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            limiter: LimiterConfig {
                proxy_count: parse_var(&lookup, "PROXY_COUNT").unwrap_or(defaults.limiter.proxy_count),
                ttl_secs: parse_var(&lookup, "RATE_LIMIT_TTL_SECS").unwrap_or(defaults.limiter.ttl_secs),
            },
            upstream: UpstreamConfig {
                url: lookup("UPSTREAM_URL")
                    .and_then(|v| Url::parse(v.trim()).ok())
                    .unwrap_or(defaults.upstream.url),
                timeout_secs: parse_var(&lookup, "UPSTREAM_TIMEOUT_SECS")
                    .unwrap_or(defaults.upstream.timeout_secs),
            },
            captcha: CaptchaConfig {
                site_key: lookup("HCAPTCHA_SITEKEY").unwrap_or_default(),
                secret: lookup("HCAPTCHA_SECRET").unwrap_or_default(),
                verify_url: lookup("HCAPTCHA_VERIFY_URL").unwrap_or(defaults.captcha.verify_url),
            },
            metrics: MetricsConfig {
                enabled: parse_var(&lookup, "METRICS_ENABLED").unwrap_or(defaults.metrics.enabled),
                path: lookup("METRICS_PATH").unwrap_or(defaults.metrics.path),
            },
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}
