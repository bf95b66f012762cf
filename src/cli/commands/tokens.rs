use clap::Subcommand;
use serde_json::json;

use crate::auth::TokenService;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::SecurityConfig;
use crate::database::Store;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Remove blacklisted refresh tokens that have expired")]
    Purge,
}

pub async fn handle(
    cmd: TokenCommands,
    store: &Store,
    security: &SecurityConfig,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let tokens = TokenService::new(store.clone(), security);

    match cmd {
        TokenCommands::Purge => {
            let purged = tokens.purge_expired().await?;
            output_success(
                &output_format,
                &format!("Purged {} expired blacklist entries", purged),
                Some(json!({ "purged": purged })),
            )
        }
    }
}
