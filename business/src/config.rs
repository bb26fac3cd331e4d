use std::env::vars;
use std::time::Duration;

use beaute_states::State;
use log::info;
use serde::Deserialize;
use thiserror::Error;
use ustr::Ustr;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read BEAUTE_* environment: {0}")]
    Env(#[from] serde_env::Error),
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
    #[error("api base url must start with http:// or https://, got {0:?}")]
    BaseUrl(String),
}

/// Raw `BEAUTE_*` variables before defaults and validation.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    api_base_url: Option<String>,
    request_timeout_ms: Option<u64>,
    search_debounce_ms: Option<i64>,
    default_page_size: Option<usize>,
    maintenance_mode: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BusinessConfig {
    api_base_url: Ustr,
    request_timeout_ms: u64,
    search_debounce_ms: i64,
    default_page_size: usize,
    maintenance_mode: bool,
}

impl BusinessConfig {
    pub const DEFAULT_API_BASE_URL: &'static str = "http://localhost:8000/api";

    /// Config pointing at `base_url` with every other value defaulted.
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            api_base_url: Ustr::from(base_url.as_ref().trim_end_matches('/')),
            ..Self::default()
        }
    }

    /// Reads `BEAUTE_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading console configuration from BEAUTE_* environment variables");
        Self::from_vars(vars())
    }

    pub fn from_vars<I, S>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let raw: RawConfig = serde_env::from_iter_with_prefix(vars, "BEAUTE")?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let RawConfig {
            api_base_url,
            request_timeout_ms,
            search_debounce_ms,
            default_page_size,
            maintenance_mode,
        } = raw;

        let api_base_url = match api_base_url {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
                Ustr::from(url.trim_end_matches('/'))
            }
            Some(url) => return Err(ConfigError::BaseUrl(url)),
            None => defaults.api_base_url,
        };

        let request_timeout_ms = request_timeout_ms.unwrap_or(defaults.request_timeout_ms);
        if request_timeout_ms == 0 {
            return Err(ConfigError::NotPositive {
                field: "BEAUTE_REQUEST_TIMEOUT_MS",
            });
        }

        let search_debounce_ms = search_debounce_ms.unwrap_or(defaults.search_debounce_ms);
        if search_debounce_ms <= 0 {
            return Err(ConfigError::NotPositive {
                field: "BEAUTE_SEARCH_DEBOUNCE_MS",
            });
        }

        let default_page_size = default_page_size.unwrap_or(defaults.default_page_size);
        if default_page_size == 0 {
            return Err(ConfigError::NotPositive {
                field: "BEAUTE_DEFAULT_PAGE_SIZE",
            });
        }

        let maintenance_mode = maintenance_mode.unwrap_or(defaults.maintenance_mode);
        if maintenance_mode {
            info!("Maintenance mode is on");
        }

        Ok(Self {
            api_base_url,
            request_timeout_ms,
            search_debounce_ms,
            default_page_size,
            maintenance_mode,
        })
    }

    pub fn api_url(&self) -> Ustr {
        self.api_base_url
    }

    /// Joins `path` onto the api base url with exactly one `/` between them.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn search_debounce_ms(&self) -> i64 {
        self.search_debounce_ms
    }

    pub fn default_page_size(&self) -> usize {
        self.default_page_size
    }

    pub fn maintenance_mode(&self) -> bool {
        self.maintenance_mode
    }

    pub fn with_maintenance_mode(mut self, on: bool) -> Self {
        self.maintenance_mode = on;
        self
    }
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            api_base_url: Ustr::from(Self::DEFAULT_API_BASE_URL),
            request_timeout_ms: 10_000,
            search_debounce_ms: 500,
            default_page_size: 10,
            maintenance_mode: false,
        }
    }
}

impl State for BusinessConfig {
    fn snapshot(&self) -> Option<Self> {
        Some(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_environment_uses_defaults() {
        let config = BusinessConfig::from_vars(Vec::<(String, String)>::new())
            .expect("defaults should build");

        assert_eq!(config.api_url(), Ustr::from("http://localhost:8000/api"));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.search_debounce_ms(), 500);
        assert_eq!(config.default_page_size(), 10);
        assert!(!config.maintenance_mode());
    }

    #[test]
    fn prefixed_variables_override_defaults() {
        let config = BusinessConfig::from_vars(vec![
            ("BEAUTE_API_BASE_URL", "https://admin.example.com/api/"),
            ("BEAUTE_SEARCH_DEBOUNCE_MS", "250"),
            ("BEAUTE_MAINTENANCE_MODE", "true"),
            ("UNRELATED_PORT", "8080"),
        ])
        .expect("config should build");

        assert_eq!(config.api_url(), Ustr::from("https://admin.example.com/api"));
        assert_eq!(config.search_debounce_ms(), 250);
        assert!(config.maintenance_mode());
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = BusinessConfig::from_vars(vec![("BEAUTE_DEFAULT_PAGE_SIZE", "0")])
            .expect_err("zero page size must fail");
        assert!(err.to_string().contains("BEAUTE_DEFAULT_PAGE_SIZE"));
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let err = BusinessConfig::from_vars(vec![("BEAUTE_API_BASE_URL", "localhost:8000")])
            .expect_err("scheme-less url must fail");
        assert!(matches!(err, ConfigError::BaseUrl(_)));
    }

    #[test]
    fn unparsable_number_is_an_env_error() {
        let err = BusinessConfig::from_vars(vec![("BEAUTE_REQUEST_TIMEOUT_MS", "soon")])
            .expect_err("non-numeric timeout must fail");
        assert!(matches!(err, ConfigError::Env(_)));
    }

    #[test]
    fn endpoint_joins_with_single_slash() {
        let config = BusinessConfig::new("http://api.test/");
        assert_eq!(config.endpoint("/v2/roles"), "http://api.test/v2/roles");
        assert_eq!(config.endpoint("users"), "http://api.test/users");
    }
}
