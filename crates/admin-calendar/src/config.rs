use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::batch::BatchConfig;
use crate::controller::ControllerConfig;
use crate::error::{CalendarError, CalendarResult};
use crate::orchestrator::FetchConfig;

/// Deployment environment. Mock data is only ever served outside production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" | "test" | "staging" | "" => Ok(Environment::Development),
            other => Err(CalendarError::Config(format!("unknown APP_ENV '{}'", other))),
        }
    }
}

/// Connection settings for the portal REST API
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Base URL the endpoint paths are appended to
    pub base_url: String,
    /// Optional bearer token sent with every request
    pub api_token: Option<String>,
    pub request_timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            api_token: None,
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl SourceConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("CALENDAR_API_URL").unwrap_or(defaults.base_url),
            api_token: std::env::var("CALENDAR_API_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
            request_timeout: Duration::from_secs(env_or("CALENDAR_REQUEST_TIMEOUT_SECS", 15)),
        }
    }
}

/// Complete configuration for the calendar host
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub environment: Environment,
    pub source: SourceConfig,
    pub fetch: FetchConfig,
    pub batch: BatchConfig,
    pub controller: ControllerConfig,
    /// Directory holding persisted view state (filters)
    pub state_dir: PathBuf,
}

impl AppConfig {
    /// Load configuration from `.env` and environment variables
    pub fn from_env() -> CalendarResult<Self> {
        dotenvy::dotenv().ok();

        let environment = match std::env::var("APP_ENV") {
            Ok(value) => value.parse()?,
            Err(_) => Environment::default(),
        };

        let mut fetch = FetchConfig::from_env();
        fetch.environment = environment;

        let config = Self {
            environment,
            source: SourceConfig::from_env(),
            fetch,
            batch: BatchConfig::from_env(),
            controller: ControllerConfig::from_env(),
            state_dir: std::env::var("CALENDAR_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".admin-calendar")),
        };

        if config.source.base_url.trim().is_empty() {
            return Err(CalendarError::Config(
                "CALENDAR_API_URL must not be empty".to_string(),
            ));
        }

        Ok(config)
    }
}

/// Read and parse an environment variable, falling back to `default`
pub(crate) fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!("production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("Prod".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert!("mars".parse::<Environment>().is_err());
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        std::env::set_var("CALENDAR_TEST_GARBAGE_NUMBER", "not-a-number");
        assert_eq!(env_or("CALENDAR_TEST_GARBAGE_NUMBER", 42u64), 42);
        std::env::set_var("CALENDAR_TEST_GOOD_NUMBER", "7");
        assert_eq!(env_or("CALENDAR_TEST_GOOD_NUMBER", 42u64), 7);
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.fetch.max_attempts, 3);
        assert_eq!(config.fetch.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.batch.batch_size, 200);
        assert_eq!(config.controller.loading_timeout, Duration::from_secs(10));
        assert!(!config.environment.is_production());
    }
}
