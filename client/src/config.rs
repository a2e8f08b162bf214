use anyhow::{Context, Result};
use std::time::Duration;
use url::Url;

use crate::http::Timeouts;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub refresh_timeout_secs: u64,
    pub credentials_path: String,
}

impl Config {
    /// Load config from a specific .env file, or the default `.env` if None.
    pub fn from_env_file(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => {
                dotenvy::from_filename(p).with_context(|| format!("Load env file {p}"))?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }
        Self::build_from_env()
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::build_from_env()
    }

    fn build_from_env() -> Result<Self> {
        Ok(Self {
            api_base_url: normalize_base_url(&env("API_BASE_URL", "http://localhost:3000/api"))?,
            request_timeout_secs: env_secs("REQUEST_TIMEOUT_SECS", 10)?,
            refresh_timeout_secs: env_secs("REFRESH_TIMEOUT_SECS", 5)?,
            credentials_path: env("CREDENTIALS_PATH", "data/credentials.json"),
        })
    }

    /// Override the base URL (e.g. from a CLI flag)
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.api_base_url = normalize_base_url(base_url)?;
        Ok(self)
    }

    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.api_base_url).with_context(|| format!("Invalid API_BASE_URL: {}", self.api_base_url))
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            request: Duration::from_secs(self.request_timeout_secs),
            refresh: Duration::from_secs(self.refresh_timeout_secs),
        }
    }
}

fn env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_secs(key: &str, default: u64) -> Result<u64> {
    let val = env(key, &default.to_string());
    let secs: u64 = val
        .parse()
        .with_context(|| format!("{key} must be a whole number of seconds: {val}"))?;
    anyhow::ensure!(secs > 0, "{key} must be greater than zero");
    Ok(secs)
}

/// Validate and strip trailing slashes so paths can be appended as-is
fn normalize_base_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw.trim()).with_context(|| format!("Invalid API base URL: {raw}"))?;
    anyhow::ensure!(
        matches!(url.scheme(), "http" | "https"),
        "API base URL must be http or https: {raw}"
    );
    anyhow::ensure!(url.host_str().is_some(), "API base URL has no host: {raw}");
    Ok(url.as_str().trim_end_matches('/').to_string())
}
