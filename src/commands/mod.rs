//! One module per CLI subcommand, each exposing `execute(args, config)`.

pub mod migrate;
pub mod serve;
