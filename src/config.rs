//! Runtime configuration, read from the environment after loading `.env`.

use anyhow::{bail, Context, Result};

const API_URL_ENV: &str = "GITHUB_API_URL";
const PAGE_SIZE_ENV: &str = "GITHUB_SEARCH_PAGE_SIZE";
const TIMEOUT_ENV: &str = "GITHUB_SEARCH_TIMEOUT_SECS";
const USER_AGENT_ENV: &str = "GITHUB_SEARCH_USER_AGENT";
const VERBOSE_ENV: &str = "GITHUB_SEARCH_VERBOSE";

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_PAGE_SIZE: i64 = 9;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_USER_AGENT: &str = "rust-github-user-search";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub page_size: i64,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            verbose: false,
        }
    }
}

impl Config {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get(API_URL_ENV) {
            config.api_url = url.trim().to_string();
        }

        if let Some(raw) = get(PAGE_SIZE_ENV) {
            let size: i64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{PAGE_SIZE_ENV} must be an integer, got {raw:?}"))?;
            if size < 1 {
                bail!("{PAGE_SIZE_ENV} must be at least 1, got {size}");
            }
            config.page_size = size;
        }

        if let Some(raw) = get(TIMEOUT_ENV) {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{TIMEOUT_ENV} must be an integer, got {raw:?}"))?;
            if secs == 0 {
                bail!("{TIMEOUT_ENV} must be at least 1");
            }
            config.timeout_secs = secs;
        }

        if let Some(agent) = get(USER_AGENT_ENV) {
            config.user_agent = agent;
        }

        if let Some(raw) = get(VERBOSE_ENV) {
            config.verbose = matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        Ok(config)
    }
}
