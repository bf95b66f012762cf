use clap::Subcommand;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::database::Store;
use crate::services::{KittenCatalog, RatingLedger};

#[derive(Subcommand)]
pub enum RatingCommands {
    #[command(about = "List the ratings of a kitten")]
    List {
        #[arg(help = "Kitten ID")]
        kitten_id: i64,
    },
}

pub async fn handle(
    cmd: RatingCommands,
    store: &Store,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let ledger = RatingLedger::new(store.clone(), KittenCatalog::new(store.clone()));

    match cmd {
        RatingCommands::List { kitten_id } => {
            let ratings = ledger.list(kitten_id).await?;
            if ratings.is_empty() {
                return output_empty_collection(
                    &output_format,
                    "ratings",
                    &format!("No ratings for kitten {}", kitten_id),
                );
            }

            match output_format {
                OutputFormat::Json => output_json_collection("ratings", &ratings)?,
                OutputFormat::Text => {
                    println!("{:<6} {:<8} {:<6} {}", "ID", "USER", "SCORE", "CREATED");
                    println!("{}", "-".repeat(40));
                    for rating in &ratings {
                        println!(
                            "{:<6} {:<8} {:<6} {}",
                            rating.id,
                            rating.user_id,
                            rating.score,
                            rating.created_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }
            Ok(())
        }
    }
}
