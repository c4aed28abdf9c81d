use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::notification::DEFAULT_TOAST_DURATION;

pub const DEFAULT_API_URL: &str = "http://localhost:8001";

/// How the page controller treats generate responses that arrive out of order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponsePolicy {
    /// Apply every response as it arrives; a late response from an older
    /// request overwrites a newer result.
    #[default]
    LastResponseWins,
    /// Apply a response only if it belongs to the most recent submission.
    LatestRequestOnly,
}

impl FromStr for ResponsePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last-response" => Ok(ResponsePolicy::LastResponseWins),
            "latest-request" => Ok(ResponsePolicy::LatestRequestOnly),
            other => Err(format!(
                "unknown response policy '{other}' (expected last-response or latest-request)"
            )),
        }
    }
}

/// Client configuration loaded from environment variables (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub download_dir: PathBuf,
    pub toast_duration: Duration,
    pub response_policy: ResponsePolicy,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            download_dir: PathBuf::from("."),
            toast_duration: DEFAULT_TOAST_DURATION,
            response_policy: ResponsePolicy::default(),
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let toast_duration = match lookup("TOAST_DURATION_MS") {
            Some(raw) => Duration::from_millis(
                raw.trim()
                    .parse::<u64>()
                    .context("TOAST_DURATION_MS must be a whole number of milliseconds")?,
            ),
            None => defaults.toast_duration,
        };

        let response_policy = match lookup("RESPONSE_POLICY") {
            Some(raw) => raw
                .parse::<ResponsePolicy>()
                .map_err(anyhow::Error::msg)
                .context("RESPONSE_POLICY is invalid")?,
            None => defaults.response_policy,
        };

        Ok(Config {
            api_url: lookup("COVER_LETTER_API_URL").unwrap_or(defaults.api_url),
            download_dir: lookup("DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
            toast_duration,
            response_policy,
            rust_log: lookup("RUST_LOG").unwrap_or(defaults.rust_log),
        })
    }
}
