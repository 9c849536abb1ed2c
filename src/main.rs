// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Claim Gate Service
//!
//! Sits in front of a claim endpoint and forwards only admitted claims.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `PROXY_COUNT`: Trusted reverse proxies in front of the gate (default: 0)
//! - `RATE_LIMIT_TTL_SECS`: Claim window in seconds, `<= 0` disables (default: 86400)
//! - `UPSTREAM_URL`: Claim endpoint to forward to (default: http://127.0.0.1:9000/api/claim)
//! - `UPSTREAM_TIMEOUT_SECS`: Upstream request timeout (default: 30)
//! - `HCAPTCHA_SITEKEY`, `HCAPTCHA_SECRET`: Captcha credentials; empty secret disables
//! - `HCAPTCHA_VERIFY_URL`: Captcha verification endpoint
//! - `METRICS_ENABLED`, `METRICS_PATH`: Prometheus endpoint (default: true, /metrics)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use claim_gate::{
    captcha::{CaptchaVerifier, HCaptchaVerifier},
    config::Config,
    handlers::{router, AppState},
    limiter::AdmissionLimiter,
    metrics::GateMetrics,
    store::TtlStore,
    upstream::HttpUpstream,
};

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env();
    info!(
        bind_addr = %config.bind_addr,
        proxy_count = config.limiter.proxy_count,
        ttl_secs = config.limiter.ttl_secs,
        upstream = %config.upstream.url,
        captcha = config.captcha.enabled(),
        "Starting claim gate"
    );

    // Create application state
    let store = TtlStore::new();
    let captcha: Option<Arc<dyn CaptchaVerifier>> = if config.captcha.enabled() {
        Some(Arc::new(HCaptchaVerifier::new(config.captcha.clone())))
    } else {
        None
    };
    let state = Arc::new(AppState {
        limiter: AdmissionLimiter::new(config.limiter.clone(), store.clone()),
        captcha,
        upstream: Arc::new(HttpUpstream::new(config.upstream.clone())?),
        metrics: GateMetrics::new()?,
        config: config.clone(),
    });

    // Spawn cleanup task
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            store.purge_expired().await;
        }
    });

    let app = router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Claim gate stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
