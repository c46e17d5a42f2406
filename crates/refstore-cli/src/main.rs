//! refstore: Content fingerprinting and tree comparison CLI

use std::process::ExitCode;

use clap::Parser;
use refstore_cli::commands::{self, Engine};
use refstore_cli::{Cli, Commands};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let engine = Engine::new(cli.engine_config(), cli.parallel);

    let code = match cli.command {
        Commands::Hash { path } => commands::hash::run(&engine, &path).await?,
        Commands::Scan { path, json } => commands::scan::run(&engine, &path, json).await?,
        Commands::Compare { left, right, json } => {
            commands::compare::run(&engine, &left, &right, json).await?
        }
    };

    Ok(code)
}
