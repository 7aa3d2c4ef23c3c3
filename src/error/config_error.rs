use thiserror::Error;

/// Misconfiguration is fatal at startup and never surfaced per-request. The
/// only runtime path that produces one is an unknown enum string read back
/// from the store, which means the schema and the code disagree.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing configuration parameter '{0}'")]
    Missing(&'static str),
    #[error("Invalid configuration parameter '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("Unknown {enum_name} value '{value}' read from store")]
    UnknownEnumValue {
        enum_name: &'static str,
        value: String,
    },
}
