use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber. Runs before the configuration
/// table is loaded, so the level comes straight from the environment:
/// `RUST_LOG` wins, then `LOG_LEVEL`, then `info`.
pub fn init() {
    let fallback = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
