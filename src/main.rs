use clap::Parser;
use tracing_subscriber::EnvFilter;

use ordo::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL, JWT_SECRET etc. are picked up
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ordo=info,tower_http=info")),
        )
        .init();

    cli::run(Cli::parse()).await
}
