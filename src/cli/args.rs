//! CLI argument definitions.
//!
//! Uses clap derive macros for type-safe argument parsing.

use clap::{Parser, Subcommand};

/// Diamond Shop - accounts, diamond bids and VNPay wallet payments
#[derive(Parser, Debug)]
#[command(name = "diamond-shop")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Run database migrations
    Migrate(MigrateArgs),
}

/// Arguments for the serve command. Unset values come from the
/// environment configuration.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

/// Migration actions
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset and re-run all migrations
    Fresh,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_overrides_are_optional() {
        let cli = Cli::try_parse_from(["diamond-shop", "serve"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert!(args.host.is_none());
                assert!(args.port.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::try_parse_from(["diamond-shop", "-v", "serve", "--port", "8080"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Serve(ServeArgs { port: Some(8080), .. })));
    }

    #[test]
    fn migrate_actions_parse() {
        let cli = Cli::try_parse_from(["diamond-shop", "migrate", "fresh"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Migrate(MigrateArgs {
                action: MigrateAction::Fresh
            })
        ));
    }
}
