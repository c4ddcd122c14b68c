use std::io;

use clap::Args;
use estante::catalog::CatalogQuery;
use estante_app::{context::AppContext, render};

#[derive(Debug, Args)]
pub(crate) struct CatalogCommand {
    /// Title, author or ISBN
    #[arg(long)]
    search: Option<String>,

    /// Only books in this category
    #[arg(long)]
    category: Option<String>,
}

pub(crate) async fn run(ctx: &AppContext, command: CatalogCommand) -> Result<(), String> {
    let books = ctx
        .catalog
        .list_books(CatalogQuery {
            text: command.search,
            category: command.category,
            ..CatalogQuery::storefront()
        })
        .await
        .map_err(|error| format!("failed to list books: {error}"))?;

    render::write_books(&mut io::stdout().lock(), &books)
        .map_err(|error| format!("failed to print catalog: {error}"))
}
