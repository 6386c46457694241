use crate::models::Registration;
use crate::services::accounts;
use crate::services::error::ServiceError;
use crate::{Config, Database};
use anyhow::Result;
use std::path::Path;

use super::UserCommand;

fn prompt_new_password(prompt: &str) -> Result<(String, String)> {
    let password = rpassword::prompt_password(prompt)?;
    let password_confirm = rpassword::prompt_password("Confirm password: ")?;
    Ok((password, password_confirm))
}

/// Spell out every validation message instead of the joined one-liner.
fn explain(err: anyhow::Error) -> anyhow::Error {
    match err.downcast_ref::<ServiceError>() {
        Some(ServiceError::Validation(messages)) => {
            anyhow::anyhow!("\n  - {}", messages.join("\n  - "))
        }
        _ => err,
    }
}

pub async fn run(config_path: &Path, command: UserCommand) -> Result<()> {
    let config = Config::load(config_path)?;
    let db = Database::open(&config.database.path)?;
    db.migrate()?;

    match command {
        UserCommand::Add {
            username,
            email,
            full_name,
            password,
        } => {
            let (password, password_confirm) = match password {
                Some(p) => (p.clone(), p),
                None => prompt_new_password("Password: ")?,
            };

            let registration = Registration {
                username: username.clone(),
                email,
                password,
                password_confirm,
                full_name,
            };
            accounts::register(&db, registration).map_err(explain)?;
            tracing::info!("User '{}' created", username);
        }
        UserCommand::List => {
            let accounts = accounts::list_accounts(&db)?;

            println!(
                "{:<20} {:<30} {:<8} {:<20}",
                "USERNAME", "EMAIL", "ACTIVE", "LAST LOGIN"
            );
            println!("{}", "-".repeat(80));
            for account in accounts {
                let last_login = account
                    .last_login
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "{:<20} {:<30} {:<8} {:<20}",
                    account.username,
                    account.email,
                    if account.is_active { "yes" } else { "no" },
                    last_login
                );
            }
        }
        UserCommand::Deactivate { username } => {
            accounts::set_active(&db, &username, false)?;
            tracing::info!("User '{}' deactivated", username);
        }
        UserCommand::Activate { username } => {
            accounts::set_active(&db, &username, true)?;
            tracing::info!("User '{}' activated", username);
        }
        UserCommand::Remove { username } => {
            if accounts::delete_account(&db, &username)? {
                tracing::info!("User '{}' removed along with their posts", username);
            } else {
                tracing::warn!("User '{}' not found", username);
            }
        }
        UserCommand::Passwd { username } => {
            let (password, password_confirm) = prompt_new_password("New password: ")?;
            if password != password_confirm {
                anyhow::bail!("Passwords do not match");
            }

            accounts::update_password(&db, &username, &password).map_err(explain)?;
            tracing::info!("Password updated for '{}'", username);
        }
    }

    Ok(())
}
