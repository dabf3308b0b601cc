pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ordo")]
#[command(about = "Ordo - restaurant ordering and reservation API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Apply the bundled database migrations")]
    Migrate,

    #[command(about = "Create an administrator account")]
    CreateAdmin {
        #[arg(long, help = "Login email")]
        email: String,
        #[arg(long, help = "Display name")]
        name: String,
        #[arg(long, help = "Password (min 8 characters)")]
        password: String,
    },

    #[command(about = "Load restaurant config, categories and items from a YAML file")]
    Seed {
        #[arg(help = "Path to the seed file")]
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => commands::serve::handle().await,
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::CreateAdmin { email, name, password } => {
            commands::admin::handle(email, name, password, output_format).await
        }
        Commands::Seed { file } => commands::seed::handle(&file, output_format).await,
    }
}
