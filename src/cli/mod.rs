pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::database::Store;

#[derive(Parser)]
#[command(name = "kitten")]
#[command(about = "Kitten CLI - administer the kitten database directly")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "Database URL (defaults to DATABASE_URL)")]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create or upgrade the database schema")]
    Migrate,

    #[command(about = "User account management")]
    Users {
        #[command(subcommand)]
        cmd: commands::users::UserCommands,
    },

    #[command(about = "Browse the kitten catalog")]
    Kittens {
        #[command(subcommand)]
        cmd: commands::kittens::KittenCommands,
    },

    #[command(about = "Inspect ratings")]
    Ratings {
        #[command(subcommand)]
        cmd: commands::ratings::RatingCommands,
    },

    #[command(about = "Maintain the refresh-token blacklist")]
    Tokens {
        #[command(subcommand)]
        cmd: commands::tokens::TokenCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
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

    let mut config = AppConfig::from_env();
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }
    let store = Store::connect(&config.database).await?;

    let result = match cli.command {
        Commands::Migrate => {
            store.migrate().await?;
            utils::output_success(
                &output_format,
                &format!("Schema is up to date at {}", config.database.url),
                None,
            )
        }
        Commands::Users { cmd } => {
            commands::users::handle(cmd, &store, &config.security, output_format).await
        }
        Commands::Kittens { cmd } => commands::kittens::handle(cmd, &store, output_format).await,
        Commands::Ratings { cmd } => commands::ratings::handle(cmd, &store, output_format).await,
        Commands::Tokens { cmd } => {
            commands::tokens::handle(cmd, &store, &config.security, output_format).await
        }
    };

    store.close().await;
    result
}
