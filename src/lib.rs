pub mod calibration;
pub mod commands;
pub mod config;
pub mod engine;
pub mod errors;
pub mod executor;
pub mod monitor;
pub mod palette;
pub mod perception;
pub mod planner;

/// Loads `.env` and installs the global subscriber. `RUST_LOG` overrides the
/// default `info` filter.
pub fn init_tracing() {
    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
