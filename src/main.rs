//! Binary entry point for the segment-aware TCP relay.
//!
//! Parses CLI arguments, installs the tracing subscriber, and runs the
//! server until Ctrl+C. Bind and listen failures abort the process; every
//! later failure stays local to the connection that raised it.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use framegate::{ConfigError, RelayConfig, RelayServer, parse_addr};
use log::error;

fn config_from(cli: cli::Cli) -> Result<RelayConfig, ConfigError> {
    Ok(RelayConfig {
        listen: parse_addr(&cli.listen)?,
        destination: parse_addr(&cli.connect)?,
        verbose: cli.verbose,
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let config = match config_from(cli::Cli::parse()) {
        Ok(config) => config,
        Err(e) => {
            error!("invalid address: {e}");
            return ExitCode::FAILURE;
        }
    };

    let server = match RelayServer::new(config).bind() {
        Ok(server) => server,
        Err(e) => {
            error!("cannot start listener: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run().await {
        error!("server terminated: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
