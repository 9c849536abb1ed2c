// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for admission decisions.

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Admission outcome label values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Admitted,
    Rejected,
    RolledBack,
    Bypassed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admitted => "admitted",
            Self::Rejected => "rejected",
            Self::RolledBack => "rolled_back",
            Self::Bypassed => "bypassed",
        }
    }
}

/// Metric handles registered in a dedicated registry.
#[derive(Clone)]
pub struct GateMetrics {
    registry: Registry,
    admissions: IntCounterVec,
    captcha_failures: IntCounter,
    store_entries: IntGauge,
}

impl GateMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let admissions = IntCounterVec::new(
            Opts::new("claim_gate_admissions_total", "Claim admission decisions by outcome"),
            &["outcome"],
        )?;
        let captcha_failures = IntCounter::new(
            "claim_gate_captcha_failures_total",
            "Claims blocked by captcha verification",
        )?;
        let store_entries = IntGauge::new(
            "claim_gate_store_entries",
            "Rate limit entries held in memory",
        )?;

        registry.register(Box::new(admissions.clone()))?;
        registry.register(Box::new(captcha_failures.clone()))?;
        registry.register(Box::new(store_entries.clone()))?;

        Ok(Self {
            registry,
            admissions,
            captcha_failures,
            store_entries,
        })
    }

    pub fn record(&self, outcome: Outcome) {
        self.admissions.with_label_values(&[outcome.as_str()]).inc();
    }

    pub fn record_captcha_failure(&self) {
        self.captcha_failures.inc();
    }

    pub fn set_store_entries(&self, entries: usize) {
        self.store_entries.set(entries as i64);
    }

    pub fn count(&self, outcome: Outcome) -> u64 {
        self.admissions.with_label_values(&[outcome.as_str()]).get()
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
