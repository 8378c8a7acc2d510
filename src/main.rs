mod cli;
mod config;
mod error;
mod export;
mod importer;
mod logging;
mod mapping;
mod model;
mod source;
mod store;
mod trackers;
mod util;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    logging::init(args.verbose);

    if let Err(e) = cli::run(args).await {
        tracing::error!(error = %format!("{e:#}"), "Run aborted");
        return Err(e);
    }
    Ok(())
}
