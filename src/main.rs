//! `diamond-shop` binary: parse the command line, set up logging, dispatch.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use diamond_shop::{
    cli::{Cli, Commands},
    commands,
    config::Config,
};

/// Filter used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "diamond_shop=info,tower_http=info,sea_orm=warn";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::from_env();
    tracing::debug!(?config, version = env!("CARGO_PKG_VERSION"), "Configuration loaded");

    let outcome = match cli.command {
        Commands::Serve(args) => commands::serve::execute(args, config).await,
        Commands::Migrate(args) => commands::migrate::execute(args, config).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, code = e.code(), "Command failed");
            ExitCode::FAILURE
        }
    }
}

/// `--verbose` wins over `RUST_LOG`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(filter)
        .init();
}
