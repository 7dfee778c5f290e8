//! dealer-edge - Options dealer hedging analytics
//!
//! Reads a snapshot file, runs the analysis pipeline and prints the JSON report.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use dealer_edge::adapters::cli;

fn main() -> Result<()> {
    // .env may set DEALER_EDGE_CONFIG and RUST_LOG
    dotenvy::dotenv().ok();

    let app = cli::init();
    let config = app.load_config()?;
    init_logging(app.verbose, app.debug, &config.logging.level);

    cli::execute(app, config)
}

/// Flags win over RUST_LOG, which wins over the configured level
fn init_logging(verbose: bool, debug: bool, configured: &str) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
