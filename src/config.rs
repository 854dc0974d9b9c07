//! Environment-driven application configuration

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};

pub const DEFAULT_BASE_URL: &str = "https://www.78dm.net";
pub const DEFAULT_RESULT_TYPE: u32 = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_MAX_PAGES: u32 = 5;
/// Hard ceiling for `DM78_MAX_PAGES`
pub const MAX_PAGE_LIMIT: u32 = 5;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Site origin, without a trailing slash
    pub base_url: String,
    /// Content category requested from the search endpoint
    pub result_type: u32,
    pub timeout: Duration,
    /// Upper bound for the page count a user may request
    pub max_pages: u32,
    /// Where replies are POSTed as JSON, if anywhere
    pub reply_webhook_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            result_type: DEFAULT_RESULT_TYPE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_pages: DEFAULT_MAX_PAGES,
            reply_webhook_url: None,
        }
    }
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` beforehand to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Unset or blank keys fall back to their defaults; values that are set
    /// but malformed are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let base_url = get("DM78_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            bail!("DM78_BASE_URL must be an http(s) origin, got `{base_url}`");
        }

        let result_type = parse_or(get("DM78_RESULT_TYPE"), "DM78_RESULT_TYPE", DEFAULT_RESULT_TYPE)?;
        let timeout_secs = parse_or(get("DM78_TIMEOUT_SECS"), "DM78_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let max_pages = parse_or(get("DM78_MAX_PAGES"), "DM78_MAX_PAGES", DEFAULT_MAX_PAGES)?;

        if timeout_secs == 0 {
            bail!("DM78_TIMEOUT_SECS must be greater than zero");
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&max_pages) {
            bail!("DM78_MAX_PAGES must be between 1 and {MAX_PAGE_LIMIT}, got {max_pages}");
        }

        Ok(Self {
            base_url,
            result_type,
            timeout: Duration::from_secs(timeout_secs),
            max_pages,
            reply_webhook_url: get("REPLY_WEBHOOK_URL"),
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid value `{raw}` for {key}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.result_type, 3);
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.max_pages, 5);
        assert!(config.reply_webhook_url.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DM78_BASE_URL", "http://127.0.0.1:8080/"),
            ("DM78_RESULT_TYPE", "1"),
            ("DM78_TIMEOUT_SECS", "15"),
            ("DM78_MAX_PAGES", "3"),
            ("REPLY_WEBHOOK_URL", "http://hook.local/reply"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.result_type, 1);
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.max_pages, 3);
        assert_eq!(config.reply_webhook_url.as_deref(), Some("http://hook.local/reply"));
    }

    #[test]
    fn blank_values_fall_back() {
        let config = AppConfig::from_lookup(lookup(&[("DM78_MAX_PAGES", "  "), ("REPLY_WEBHOOK_URL", "")])).unwrap();
        assert_eq!(config.max_pages, DEFAULT_MAX_PAGES);
        assert!(config.reply_webhook_url.is_none());
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("DM78_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("DM78_TIMEOUT_SECS"));
    }

    #[test]
    fn zero_limits_are_rejected() {
        assert!(AppConfig::from_lookup(lookup(&[("DM78_MAX_PAGES", "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("DM78_TIMEOUT_SECS", "0")])).is_err());
    }

    #[test]
    fn page_limit_above_ceiling_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("DM78_MAX_PAGES", "1000")])).unwrap_err();
        assert!(err.to_string().contains("between 1 and 5"));

        let config = AppConfig::from_lookup(lookup(&[("DM78_MAX_PAGES", "5")])).unwrap();
        assert_eq!(config.max_pages, MAX_PAGE_LIMIT);
    }

    #[test]
    fn non_http_origin_is_rejected() {
        assert!(AppConfig::from_lookup(lookup(&[("DM78_BASE_URL", "www.78dm.net")])).is_err());
    }
}
