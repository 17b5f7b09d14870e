//! `serve` - development file server with live reload.
//!
//! Serves a directory over HTTP with caching disabled, falls back to
//! `index.html` for client-side routes, and reloads connected browsers when
//! files change.

mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use commands::ServeArgs;
use output::Output;

/// Log filter used when neither `--verbose` nor `RUST_LOG` is given.
const DEFAULT_FILTER: &str = "info,tower_http=warn,hyper=warn";

/// Development server for single-page apps with live reload and no caching.
#[derive(Parser)]
#[command(name = "serve", version, about)]
struct Cli {
    #[command(flatten)]
    serve: ServeArgs,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables DEBUG level, otherwise use RUST_LOG or the default
    let filter = if cli.serve.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(cli.serve.execute()),
        Err(e) => Err(e.into()),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
