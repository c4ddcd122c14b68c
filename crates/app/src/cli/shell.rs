use std::io;

use estante_app::{context::AppContext, shell::Shell};
use tokio::io::BufReader;

pub(crate) async fn run(ctx: &AppContext) -> Result<(), String> {
    Shell::new(ctx)
        .run(BufReader::new(tokio::io::stdin()), io::stdout())
        .await
        .map_err(|error| format!("shell failed: {error}"))
}
