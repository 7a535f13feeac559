#![cfg(not(tarpaulin_include))]

use notes_share::{Config, app};

/// Main entry point for the web application
///
/// Reads `NOTES_*` settings from the environment and serves the site until
/// the process is stopped. Set `RUST_LOG` to control log output.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load()?;
    tracing::info!("Notes backend at {}", config.api_base_url);

    app::run(config).await
}
