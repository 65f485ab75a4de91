//! Gallery like server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p gallery-api
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use gallery_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Run the server
    if let Err(e) = run().await {
        error!(error = %e, "Server failed to start");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = AppConfig::from_env()?;

    // Initialize tracing for the configured environment
    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        name = %config.app.name,
        env = ?config.app.env,
        port = config.api.port,
        store = ?config.store,
        "Configuration loaded"
    );

    gallery_api::run(config).await?;

    Ok(())
}
