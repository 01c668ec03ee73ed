use solar_config::{LogFormat, LoggingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging.
/// - RUST_LOG wins over the configured filter
/// - JSON lines or human-readable output, per `[logging] format`
pub fn init(service_name: &str, logging: &LoggingConfig) {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| logging.filter.clone());
    let registry = tracing_subscriber::registry().with(EnvFilter::new(env_filter));

    match logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!(service = %service_name, format = ?logging.format, "Logging initialized");
}
