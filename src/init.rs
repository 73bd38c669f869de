//! Initialization helpers for the application startup.

/// Sets up the tracing subscriber. `RUST_LOG` overrides the default level.
pub fn setup_logging(default_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}
