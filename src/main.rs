use anyhow::Result;
use botanisnap::{config, server};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Parses a log level or a full `EnvFilter` directive list such as
/// `botanisnap=debug,tower_http=info`.
fn log_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level).map_err(|e| {
        anyhow::anyhow!(
            "Invalid log level: '{}' ({}). Use error, warn, info, debug, trace or target=level directives",
            level,
            e
        )
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (before logging setup)
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Determine log level: environment variable overrides config
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.server.logs.level.clone());

    let filter = match log_filter(&log_level) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();

    info!(
        "Starting plant identification server with log level: {}",
        log_level
    );
    info!("Configuration loaded successfully");

    if let Err(e) = server::run(config).await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_accepts_levels_and_directives() {
        for level in ["info", "DEBUG", "botanisnap=debug,tower_http=info", "warn,botanisnap=trace"] {
            assert!(log_filter(level).is_ok(), "{} should be accepted", level);
        }
    }

    #[test]
    fn test_log_filter_rejects_bad_level() {
        let err = log_filter("botanisnap=loud").unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }
}
