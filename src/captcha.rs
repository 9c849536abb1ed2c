// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! hCaptcha token verification.

use crate::config::CaptchaConfig;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

/// Request header carrying the captcha token.
pub const CAPTCHA_HEADER: &str = "h-captcha-response";

/// Verifies a captcha token with an external provider.
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> bool;
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// hCaptcha `siteverify` client.
pub struct HCaptchaVerifier {
    client: reqwest::Client,
    config: CaptchaConfig,
}

impl HCaptchaVerifier {
    pub fn new(config: CaptchaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl CaptchaVerifier for HCaptchaVerifier {
    async fn verify(&self, token: &str) -> bool {
        if token.is_empty() {
            debug!("Missing captcha token");
            return false;
        }

        let form = [
            ("secret", self.config.secret.as_str()),
            ("response", token),
            ("sitekey", self.config.site_key.as_str()),
        ];
        let response = match self
            .client
            .post(&self.config.verify_url)
            .form(&form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Captcha verification request failed");
                return false;
            }
        };

        match response.json::<SiteVerifyResponse>().await {
            Ok(body) => {
                if !body.success {
                    debug!(error_codes = ?body.error_codes, "Captcha rejected");
                }
                body.success
            }
            Err(e) => {
                warn!(error = %e, "Captcha verification response unreadable");
                false
            }
        }
    }
}
