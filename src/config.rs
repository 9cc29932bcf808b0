use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the calendar server. Endpoints are resolved relative to it.
    pub base_url: Url,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// File the session token is persisted to between invocations.
    pub token_path: PathBuf,
    pub token_expiry_days: i64,
    /// Work factor used when hashing passwords before signup.
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub json: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let base_url = env::var("CALENDAR_API_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        let base_url = Url::parse(&base_url)
            .map_err(|_| ConfigError::InvalidValue("CALENDAR_API_URL".to_string()))?;

        let bcrypt_cost: u32 = env::var("CALENDAR_BCRYPT_COST")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("CALENDAR_BCRYPT_COST".to_string()))?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::InvalidValue("CALENDAR_BCRYPT_COST".to_string()));
        }

        let token_expiry_days: i64 = env::var("CALENDAR_TOKEN_EXPIRY_DAYS")
            .unwrap_or_else(|_| "14".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("CALENDAR_TOKEN_EXPIRY_DAYS".to_string()))?;
        if token_expiry_days <= 0 {
            return Err(ConfigError::InvalidValue(
                "CALENDAR_TOKEN_EXPIRY_DAYS".to_string(),
            ));
        }

        Ok(Config {
            api: ApiConfig {
                base_url,
                request_timeout_seconds: env::var("CALENDAR_REQUEST_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            session: SessionConfig {
                token_path: env::var("CALENDAR_TOKEN_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(".holiday-calendar/token.json")),
                token_expiry_days,
                bcrypt_cost,
            },
            logging: LoggingConfig {
                json: match env::var("CALENDAR_LOG_JSON") {
                    Ok(v) => parse_flag(&v).unwrap_or(false),
                    Err(_) => false,
                },
            },
        })
    }
}

/// Accepts "true"/"false", "1"/"0", "yes"/"no" in any case.
fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api: ApiConfig {
                base_url: Url::parse("http://localhost:3000").expect("static URL is valid"),
                request_timeout_seconds: 10,
            },
            session: SessionConfig {
                token_path: PathBuf::from(".holiday-calendar/token.json"),
                token_expiry_days: 14,
                bcrypt_cost: 10,
            },
            logging: LoggingConfig { json: false },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_flag_accepts_common_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("yes"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("No"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn default_session_expires_after_two_weeks() {
        let config = Config::default();
        assert_eq!(config.session.token_expiry_days, 14);
        assert_eq!(config.api.base_url.as_str(), "http://localhost:3000/");
    }
}
