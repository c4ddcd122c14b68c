use clap::{Parser, Subcommand};
use estante_app::{config::AppConfig, context::AppContext, observability};

mod catalog;
mod shell;

#[derive(Debug, Parser)]
#[command(name = "estante-app", about = "Estante bookstore CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the books on sale
    Catalog(catalog::CatalogCommand),

    /// Open an interactive storefront session
    Shell,
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        observability::init_subscriber(&self.config.logging)
            .map_err(|error| format!("failed to initialise logging: {error}"))?;

        let ctx = AppContext::from_config(&self.config)
            .map_err(|error| format!("failed to start: {error}"))?;

        match self.command {
            Commands::Catalog(command) => catalog::run(&ctx, command).await,
            Commands::Shell => shell::run(&ctx).await,
        }
    }
}
