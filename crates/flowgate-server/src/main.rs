use flowgate_core::logging;

mod auth;
mod cli;
mod routes;
mod server;
mod validation;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible; falls back to stderr on its
    // own if the log dir is unwritable.
    logging::init();

    // Parse CLI and dispatch.
    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("flowgate error: {:#}", err);
        std::process::exit(1);
    }
}
