use crate::services::accounts;
use crate::services::statistics::Statistics;
use crate::{Config, Database};
use anyhow::Result;
use std::path::Path;

pub async fn run(config_path: &Path, author: Option<String>) -> Result<()> {
    let config = Config::load(config_path)?;
    let db = Database::open(&config.database.path)?;
    db.migrate()?;

    let statistics = Statistics::new(db.clone());
    let report = match author {
        Some(username) => {
            let account = accounts::get_account_by_username(&db, &username)?
                .ok_or_else(|| anyhow::anyhow!("User '{}' not found", username))?;
            serde_json::to_string_pretty(&statistics.author_dashboard(account.id)?)?
        }
        None => serde_json::to_string_pretty(&statistics.platform()?)?,
    };

    println!("{}", report);
    Ok(())
}
