use clap::Subcommand;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::database::Store;
use crate::filter::KittenFilter;
use crate::services::KittenCatalog;

#[derive(Subcommand)]
pub enum KittenCommands {
    #[command(about = "List kittens, newest first")]
    List {
        #[arg(long, help = "Breed, case-insensitive")]
        breed: Option<String>,
        #[arg(long, help = "Color, case-insensitive")]
        color: Option<String>,
        #[arg(long, help = "Minimum age in months")]
        min_age: Option<i64>,
        #[arg(long, help = "Maximum age in months")]
        max_age: Option<i64>,
        #[arg(long, help = "created_at or -created_at")]
        ordering: Option<String>,
    },

    #[command(about = "Distinct colors in the catalog")]
    Colors,

    #[command(about = "Distinct breeds in the catalog")]
    Breeds,
}

pub async fn handle(
    cmd: KittenCommands,
    store: &Store,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let catalog = KittenCatalog::new(store.clone());

    match cmd {
        KittenCommands::List {
            breed,
            color,
            min_age,
            max_age,
            ordering,
        } => {
            let filter = KittenFilter {
                breed,
                color,
                min_age,
                max_age,
                ordering,
            };
            let kittens = catalog.list(&filter).await?;
            if kittens.is_empty() {
                return output_empty_collection(&output_format, "kittens", "No kittens found");
            }

            match output_format {
                OutputFormat::Json => output_json_collection("kittens", &kittens)?,
                OutputFormat::Text => {
                    println!(
                        "{:<6} {:<20} {:<16} {:<12} {:>4} {:>6} {}",
                        "ID", "NAME", "BREED", "COLOR", "AGE", "RATING", "OWNER"
                    );
                    println!("{}", "-".repeat(80));
                    for kitten in &kittens {
                        println!(
                            "{:<6} {:<20} {:<16} {:<12} {:>4} {:>6.2} {}",
                            kitten.id,
                            kitten.name,
                            kitten.breed,
                            kitten.color,
                            kitten.age_months,
                            kitten.average_rating,
                            kitten.owner
                        );
                    }
                }
            }
            Ok(())
        }
        KittenCommands::Colors => print_values(
            &output_format,
            "colors",
            catalog.distinct_colors().await?,
        ),
        KittenCommands::Breeds => print_values(
            &output_format,
            "breeds",
            catalog.distinct_breeds().await?,
        ),
    }
}

fn print_values(
    output_format: &OutputFormat,
    name: &str,
    values: Vec<String>,
) -> anyhow::Result<()> {
    if values.is_empty() {
        return output_empty_collection(output_format, name, &format!("No {} found", name));
    }
    match output_format {
        OutputFormat::Json => output_json_collection(name, &values),
        OutputFormat::Text => {
            for value in values {
                println!("{}", value);
            }
            Ok(())
        }
    }
}
