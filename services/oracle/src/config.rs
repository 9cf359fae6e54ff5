//! services/oracle/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development. API keys are optional here: a missing key
//! only surfaces when an operation that needs it is attempted.

use literary_oracle_core::Coordinates;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which vendor serves the recommendation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleProvider {
    Gemini,
    OpenAi,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub log_level: Level,
    pub provider: OracleProvider,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub gemini_endpoint: String,
    pub recommendation_model: String,
    pub library_model: String,
    pub request_timeout: Option<Duration>,
    pub max_attempts: u32,
    pub home_coordinates: Option<Coordinates>,
    pub archivists: Vec<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let provider = match var("ORACLE_PROVIDER")
            .unwrap_or_else(|| "gemini".to_string())
            .to_lowercase()
            .as_str()
        {
            "gemini" => OracleProvider::Gemini,
            "openai" => OracleProvider::OpenAi,
            other => {
                return Err(ConfigError::InvalidValue(
                    "ORACLE_PROVIDER".to_string(),
                    format!("'{}' is not one of gemini, openai", other),
                ))
            }
        };

        // --- Load API Keys (as optional) ---
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());
        let gemini_api_key = non_empty("GEMINI_API_KEY").or_else(|| non_empty("API_KEY"));
        let openai_api_key = non_empty("OPENAI_API_KEY");

        // --- Load Adapter-specific Settings ---
        let gemini_endpoint = var("GEMINI_ENDPOINT")
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string());
        let recommendation_model = var("RECOMMENDATION_MODEL").unwrap_or_else(|| match provider {
            OracleProvider::Gemini => "gemini-2.5-flash".to_string(),
            OracleProvider::OpenAi => "gpt-4o-mini".to_string(),
        });
        let library_model =
            var("LIBRARY_MODEL").unwrap_or_else(|| "gemini-2.5-flash".to_string());

        let request_timeout = var("REQUEST_TIMEOUT_SECS")
            .map(|raw| parse_number::<u64>("REQUEST_TIMEOUT_SECS", &raw))
            .transpose()?
            .map(Duration::from_secs);

        let max_attempts = var("ORACLE_MAX_ATTEMPTS")
            .map(|raw| parse_number::<u32>("ORACLE_MAX_ATTEMPTS", &raw))
            .transpose()?
            .unwrap_or(1);
        if max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "ORACLE_MAX_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let home_coordinates = match (var("ORACLE_LATITUDE"), var("ORACLE_LONGITUDE")) {
            (Some(lat), Some(lng)) => Some(Coordinates {
                latitude: parse_number("ORACLE_LATITUDE", &lat)?,
                longitude: parse_number("ORACLE_LONGITUDE", &lng)?,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::MissingVar("ORACLE_LONGITUDE".to_string())),
            (None, Some(_)) => return Err(ConfigError::MissingVar("ORACLE_LATITUDE".to_string())),
        };

        let archivists = var("ORACLE_ARCHIVISTS")
            .map(|raw| {
                raw.split(',')
                    .map(|email| email.trim().to_lowercase())
                    .filter(|email| !email.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            log_level,
            provider,
            gemini_api_key,
            openai_api_key,
            gemini_endpoint,
            recommendation_model,
            library_model,
            request_timeout,
            max_attempts,
            home_coordinates,
            archivists,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), format!("'{}' is not a number", raw))
        })
}
