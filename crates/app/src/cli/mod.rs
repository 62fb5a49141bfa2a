use clap::{Parser, Subcommand};

use verdant_app::config::{CheckoutConfig, LoggingConfig};

mod checkout;
mod quote;

#[derive(Debug, Parser)]
#[command(name = "verdant", about = "Verdant checkout CLI", long_about = None)]
pub(crate) struct Cli {
    /// Logging output settings.
    #[command(flatten)]
    logging: LoggingConfig,

    /// Storefront checkout settings.
    #[command(flatten)]
    checkout: CheckoutConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the derived totals for a cart fixture
    Quote(quote::QuoteArgs),

    /// Run a checkout end to end and submit the order
    Checkout(checkout::CheckoutArgs),
}

impl Cli {
    /// Load settings from `.env`, the environment and the command line.
    pub(crate) fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    pub(crate) fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Quote(args) => quote::run(&self.checkout, args),
            Commands::Checkout(args) => checkout::run(&self.checkout, args).await,
        }
    }
}
