use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::session::idle::{IdleSettings, DEFAULT_DEBOUNCE, DEFAULT_TIMEOUT};
use crate::store::seed::SeedSource;

/// Where employees, applications and departments live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    Local,
    Remote,
}

impl DataMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataMode::Local => "local",
            DataMode::Remote => "remote",
        }
    }
}

impl FromStr for DataMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" | "offline" => Ok(DataMode::Local),
            "remote" | "api" => Ok(DataMode::Remote),
            other => Err(anyhow!("unknown data mode '{other}' (expected 'local' or 'remote')")),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Everything has a default except the API base URL in remote mode.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_mode: DataMode,
    pub data_dir: PathBuf,
    pub api_base_url: Option<String>,
    pub api_fallback_url: Option<String>,
    pub seed_sources: Vec<SeedSource>,
    pub users_file: Option<PathBuf>,
    pub list_limit: usize,
    pub idle: IdleSettings,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let data_mode = match get("STAFFDESK_DATA_MODE") {
            Some(raw) => raw
                .parse::<DataMode>()
                .context("STAFFDESK_DATA_MODE is invalid")?,
            None => DataMode::Local,
        };

        let api_base_url = get("STAFFDESK_API_BASE_URL");
        if data_mode == DataMode::Remote && api_base_url.is_none() {
            return Err(anyhow!(
                "Required environment variable 'STAFFDESK_API_BASE_URL' is not set (remote mode)"
            ));
        }

        let seed_sources = match get("STAFFDESK_SEED_SOURCES") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(SeedSource::parse)
                .collect(),
            None => SeedSource::defaults(),
        };

        let idle = IdleSettings {
            timeout: parse_or(
                "STAFFDESK_IDLE_TIMEOUT_SECS",
                get("STAFFDESK_IDLE_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT.as_secs(),
            )
            .map(Duration::from_secs)?,
            debounce: parse_or(
                "STAFFDESK_IDLE_DEBOUNCE_MS",
                get("STAFFDESK_IDLE_DEBOUNCE_MS"),
                DEFAULT_DEBOUNCE.as_millis() as u64,
            )
            .map(Duration::from_millis)?,
        };

        Ok(Config {
            data_mode,
            data_dir: get("STAFFDESK_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            api_base_url,
            api_fallback_url: get("STAFFDESK_API_FALLBACK_URL"),
            seed_sources,
            users_file: get("STAFFDESK_USERS_FILE").map(PathBuf::from),
            list_limit: parse_or("STAFFDESK_LIST_LIMIT", get("STAFFDESK_LIST_LIMIT"), 10_000)?,
            idle,
            port: parse_or("PORT", get("PORT"), 8080)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
