//! Application configuration loaded from environment variables.

use std::env;

/// Development default values.
pub mod defaults {
    pub const DEV_LOG_FILTER: &str = "appraisal_core=debug,info";
    pub const PROD_LOG_FILTER: &str = "appraisal_core=info,warn";
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Core configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime environment
    pub environment: Environment,
    /// Tracing filter directive (RUST_LOG overrides)
    pub log_filter: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Reads an optional `.env` file first (development convenience), then
    /// `RUST_ENV` and `RUST_LOG`. Everything has a sensible default.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let environment = env::var("RUST_ENV")
            .ok()
            .and_then(|s| Environment::parse(&s))
            .unwrap_or(Environment::Development);

        let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| {
            if environment.is_development() {
                defaults::DEV_LOG_FILTER.to_string()
            } else {
                defaults::PROD_LOG_FILTER.to_string()
            }
        });

        Config {
            environment,
            log_filter,
        }
    }
}

/// Initialize the global tracing subscriber from configuration.
///
/// Intended for the embedding application; calling it twice is a no-op.
pub fn init_tracing(config: &Config) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(defaults::DEV_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
