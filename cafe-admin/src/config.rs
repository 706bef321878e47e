use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use common_auth::{DecodeConfig, GuardConfig, MAX_LEEWAY_SECONDS};

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_STORAGE_PATH: &str = ".cafe-admin/storage.json";

#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Base URL of the café REST API, without a trailing slash.
    pub api_url: String,
    /// JSON file backing client storage (token and current route).
    pub storage_path: PathBuf,
    pub http_timeout_secs: u64,
    pub guard: GuardConfig,
}

impl AdminConfig {
    pub fn new(api_url: impl Into<String>, storage_path: impl Into<PathBuf>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            storage_path: storage_path.into(),
            http_timeout_secs: 30,
            guard: GuardConfig::default(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("CAFE_API_URL")
            .and_then(|value| normalize_optional(&value))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let storage_path = lookup("CAFE_STORAGE_PATH")
            .and_then(|value| normalize_optional(&value))
            .unwrap_or_else(|| DEFAULT_STORAGE_PATH.to_string());

        let http_timeout_secs = lookup("CAFE_HTTP_TIMEOUT_SECONDS")
            .map(|value| value.trim().parse::<u64>())
            .transpose()
            .context("Failed to parse CAFE_HTTP_TIMEOUT_SECONDS")?
            .unwrap_or(30);

        let mut decode = DecodeConfig::new();
        if let Some(leeway) = lookup("CAFE_TOKEN_LEEWAY_SECONDS")
            .map(|value| value.trim().parse::<u32>())
            .transpose()
            .context("Failed to parse CAFE_TOKEN_LEEWAY_SECONDS")?
        {
            if leeway > MAX_LEEWAY_SECONDS {
                bail!(
                    "CAFE_TOKEN_LEEWAY_SECONDS must be at most {MAX_LEEWAY_SECONDS}, got {leeway}"
                );
            }
            decode = decode.with_leeway(leeway);
        }
        if lookup("CAFE_VALIDATE_EXPIRY").is_some_and(|value| !parse_bool(&value)) {
            decode = decode.without_expiry_check();
        }

        let mut config = Self::new(api_url, storage_path);
        config.http_timeout_secs = http_timeout_secs.max(1);
        config.guard = config.guard.with_decode(decode);
        Ok(config)
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
