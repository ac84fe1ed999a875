use clap::Parser;
use imgbatch_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging as early as possible; a worker logs under its own role.
    if let Err(e) = logging::init_logging(cli.command.process_role()) {
        logging::init_logging_stderr();
        tracing::warn!("log file unavailable, logging to stderr: {:#}", e);
    }

    if let Err(err) = cli.run().await {
        eprintln!("imgbatch error: {:#}", err);
        std::process::exit(1);
    }
}
