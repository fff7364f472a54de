use std::time::Duration;

/// Environment variable holding the classification service base URL.
pub const API_URL_ENV: &str = "EXOSCOPE_API_URL";
/// Environment variable holding the read/write timeout in seconds.
pub const TIMEOUT_ENV: &str = "EXOSCOPE_TIMEOUT_SECS";

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of data rows accepted from a single CSV import.
pub const MAX_IMPORT_ROWS: usize = 10;
/// Rows per page in the dataset table.
pub const DEFAULT_PAGE_SIZE: usize = 10;
/// Largest response body accepted from the service.
pub const MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Service configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL without trailing slash.
    pub api_url: String,
    pub connect_timeout: Duration,
    pub io_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            connect_timeout: CONNECT_TIMEOUT,
            io_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup. Invalid values
    /// fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();

        if let Some(url) = lookup(API_URL_ENV) {
            let url = url.trim().trim_end_matches('/');
            if url.starts_with("http://") || url.starts_with("https://") {
                config.api_url = url.to_string();
            } else {
                log::warn!("Ignoring {API_URL_ENV}={url:?}: not an http(s) URL");
            }
        }

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.io_timeout = Duration::from_secs(secs),
                _ => log::warn!("Ignoring {TIMEOUT_ENV}={raw:?}: expected a positive integer"),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config, Config::default());
        assert_eq!(config.api_url, "http://localhost:8000");
    }

    #[test]
    fn strips_trailing_slash_from_url() {
        let config = Config::from_lookup(lookup(&[(API_URL_ENV, "https://exo.example/api/")]));
        assert_eq!(config.api_url, "https://exo.example/api");
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = Config::from_lookup(lookup(&[
            (API_URL_ENV, "localhost:9000"),
            (TIMEOUT_ENV, "soon"),
        ]));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn parses_timeout() {
        let config = Config::from_lookup(lookup(&[(TIMEOUT_ENV, " 5 ")]));
        assert_eq!(config.io_timeout, Duration::from_secs(5));
    }
}
