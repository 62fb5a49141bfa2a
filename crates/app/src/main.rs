//! Verdant checkout CLI

use std::process;

use verdant_app::observability;

use crate::cli::Cli;

mod cli;

#[tokio::main]
pub async fn main() {
    let cli = Cli::load().unwrap_or_else(|error| error.exit());

    if let Err(error) = observability::init_logging(cli.logging()) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialise, must use eprintln"
        )]
        {
            eprintln!("{error}");
        }

        process::exit(1);
    }

    if let Err(error) = cli.run().await {
        #[expect(
            clippy::print_stderr,
            reason = "errors are reported to the terminal user"
        )]
        {
            eprintln!("{error}");
        }

        process::exit(1);
    }
}
