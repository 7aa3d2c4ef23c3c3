use crate::error::config_error::ConfigError;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{info, warn};

static CONFIG: OnceLock<HashMap<String, String>> = OnceLock::new();

/// Default configuration values. Anything listed here can be overridden by
/// the environment; keys in `REQUIRED` have no default and must be set.
const DEFAULTS: &[(&str, &str)] = &[
    ("SERVER_ADDRESS", "127.0.0.1"),
    ("SERVER_PORT", "8080"),
    ("JWT_ISSUER", "authcore"),
    ("JWT_AUDIENCE", "authcore-clients"),
    ("ACCESS_TOKEN_TTL_HOURS", "7"),
    ("REFRESH_TOKEN_TTL_HOURS", "60"),
    ("PASSWORD_MIN_LENGTH", "8"),
    ("DB_MAX_CONNECTIONS", "10"),
    ("DB_ACQUIRE_TIMEOUT_SECONDS", "30"),
    ("LOG_LEVEL", "info"),
];

const REQUIRED: &[&str] = &["JWT_SECRET", "DATABASE_URL"];

pub fn init() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment file: {:?}", path),
        Err(_) => warn!("No .env file found, using system environment variables"),
    }

    let mut config = HashMap::new();

    for (key, value) in DEFAULTS {
        config.insert(key.to_string(), value.to_string());
    }

    for key in DEFAULTS.iter().map(|(key, _)| key).chain(REQUIRED) {
        if let Ok(value) = std::env::var(key) {
            config.insert(key.to_string(), value);
        }
    }

    if CONFIG.set(config).is_err() {
        warn!("Configuration already initialized");
    }
}

pub fn get(parameter: &'static str) -> Result<String, ConfigError> {
    get_optional(parameter).ok_or(ConfigError::Missing(parameter))
}

pub fn get_optional(parameter: &str) -> Option<String> {
    CONFIG
        .get()
        .and_then(|config| config.get(parameter))
        .cloned()
}

pub fn get_i64(parameter: &'static str) -> Result<i64, ConfigError> {
    let value = get(parameter)?;
    value.parse::<i64>().map_err(|_| ConfigError::Invalid {
        key: parameter,
        reason: format!("'{}' is not a valid integer", value),
    })
}

pub fn get_usize(parameter: &'static str) -> Result<usize, ConfigError> {
    let value = get(parameter)?;
    value.parse::<usize>().map_err(|_| ConfigError::Invalid {
        key: parameter,
        reason: format!("'{}' is not a valid integer", value),
    })
}
