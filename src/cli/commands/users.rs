use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::SecurityConfig;
use crate::database::Store;
use crate::services::UserService;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "List all users")]
    List,

    #[command(about = "Create a user account")]
    Create {
        #[arg(help = "Username")]
        username: String,
        #[arg(help = "Password (at least 6 characters)")]
        password: String,
    },

    #[command(about = "Delete a user with their kittens and ratings")]
    Delete {
        #[arg(help = "User ID")]
        id: i64,
    },
}

pub async fn handle(
    cmd: UserCommands,
    store: &Store,
    security: &SecurityConfig,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let users = UserService::new(store.clone(), security.password_rounds);

    match cmd {
        UserCommands::List => {
            let all = users.list().await?;
            if all.is_empty() {
                return output_empty_collection(&output_format, "users", "No users found");
            }

            match output_format {
                OutputFormat::Json => output_json_collection("users", &all)?,
                OutputFormat::Text => {
                    println!("{:<6} {:<30} {}", "ID", "USERNAME", "CREATED");
                    println!("{}", "-".repeat(60));
                    for user in &all {
                        println!(
                            "{:<6} {:<30} {}",
                            user.id,
                            user.username,
                            user.created_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }
            Ok(())
        }
        UserCommands::Create { username, password } => {
            let user = users.register(&username, &password).await?;
            output_success(
                &output_format,
                &format!("Created user '{}' with id {}", user.username, user.id),
                Some(json!({ "user": user })),
            )
        }
        UserCommands::Delete { id } => {
            users.delete(id).await?;
            output_success(&output_format, &format!("Deleted user {}", id), None)
        }
    }
}
