use obex_core::logging;

mod cli;

use crate::cli::{Cli, Outcome};

fn main() {
    // Initialize logging as early as possible; stderr if the state dir is unusable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    match Cli::run_from_args() {
        Ok(Outcome::Completed) => {}
        Ok(Outcome::AllFailed) => std::process::exit(2),
        Err(err) => {
            tracing::error!("fatal: {:#}", err);
            eprintln!("obex-dl error: {:#}", err);
            std::process::exit(1);
        }
    }
}
