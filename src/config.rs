use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::constants::{
    ALERT_SLIDE_OUT_MS, ALERT_VISIBLE_MS, TX_CONFIRM_TIMEOUT_SECS, TX_POLL_INTERVAL_MS,
    WALLET_REQUEST_TIMEOUT_SECS,
};
use crate::services::{AlertTiming, ConfirmationPolicy};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Wallet
    pub wallet_provider_url: Option<String>,
    pub wallet_request_timeout_secs: u64,

    // Transactions
    pub tx_poll_interval_ms: u64,
    pub tx_confirm_timeout_secs: u64,

    // Alerts
    pub alert_visible_ms: u64,
    pub alert_slide_out_ms: u64,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            host: or("HOST", "127.0.0.1"),
            port: or("PORT", "3000").parse()?,
            environment: or("ENVIRONMENT", "development"),

            wallet_provider_url: lookup("WALLET_PROVIDER_URL")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            wallet_request_timeout_secs: or(
                "WALLET_REQUEST_TIMEOUT_SECS",
                &WALLET_REQUEST_TIMEOUT_SECS.to_string(),
            )
            .parse()?,

            tx_poll_interval_ms: or("TX_POLL_INTERVAL_MS", &TX_POLL_INTERVAL_MS.to_string())
                .parse()?,
            tx_confirm_timeout_secs: or(
                "TX_CONFIRM_TIMEOUT_SECS",
                &TX_CONFIRM_TIMEOUT_SECS.to_string(),
            )
            .parse()?,

            alert_visible_ms: or("ALERT_VISIBLE_MS", &ALERT_VISIBLE_MS.to_string()).parse()?,
            alert_slide_out_ms: or("ALERT_SLIDE_OUT_MS", &ALERT_SLIDE_OUT_MS.to_string())
                .parse()?,

            cors_allowed_origins: or("CORS_ALLOWED_ORIGINS", "*"),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(raw) = &self.wallet_provider_url {
            let parsed = url::Url::parse(raw)
                .map_err(|e| anyhow::anyhow!("WALLET_PROVIDER_URL is invalid: {}", e))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                anyhow::bail!("WALLET_PROVIDER_URL must be http(s), got {}", parsed.scheme());
            }
        } else {
            tracing::warn!("WALLET_PROVIDER_URL not set; running without a wallet provider");
        }

        if self.tx_poll_interval_ms == 0 {
            anyhow::bail!("TX_POLL_INTERVAL_MS must be > 0");
        }
        if self.tx_confirm_timeout_secs == 0 {
            anyhow::bail!("TX_CONFIRM_TIMEOUT_SECS must be > 0");
        }
        if self.wallet_request_timeout_secs < 10 {
            tracing::warn!("WALLET_REQUEST_TIMEOUT_SECS is short; users may not finish signing");
        }
        if self.alert_visible_ms == 0 || self.alert_slide_out_ms == 0 {
            tracing::warn!("Alert timings of 0 hide banners immediately");
        }

        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn wallet_request_timeout(&self) -> Duration {
        Duration::from_secs(self.wallet_request_timeout_secs)
    }

    pub fn confirmation_policy(&self) -> ConfirmationPolicy {
        ConfirmationPolicy {
            poll_interval: Duration::from_millis(self.tx_poll_interval_ms),
            timeout: Duration::from_secs(self.tx_confirm_timeout_secs),
        }
    }

    pub fn alert_timing(&self) -> AlertTiming {
        AlertTiming {
            visible: Duration::from_millis(self.alert_visible_ms),
            slide_out: Duration::from_millis(self.alert_slide_out_ms),
        }
    }
}
