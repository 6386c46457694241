use crate::Config;
use anyhow::Result;
use std::path::PathBuf;

pub async fn run(path: PathBuf, name: Option<String>) -> Result<()> {
    let site_name = name.unwrap_or_else(|| "Lectern".to_string());

    std::fs::create_dir_all(&path)?;
    std::fs::create_dir_all(path.join("data"))?;

    let config_path = path.join("lectern.toml");
    if config_path.exists() {
        anyhow::bail!("{} already exists", config_path.display());
    }

    let mut config = Config::default_for(&site_name);
    config.site.description = "Writing from many authors".to_string();
    config.database.path = "./data/lectern.db".to_string();

    std::fs::write(&config_path, toml::to_string_pretty(&config)?)?;

    tracing::info!("Created new Lectern site at {:?}", path);
    tracing::info!("Set HUGGINGFACE_API_TOKEN to enable model summaries");
    tracing::info!("Run 'lectern serve' to start the server");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_writes_loadable_config() {
        let dir = std::env::temp_dir().join(format!("lectern-init-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        run(dir.clone(), Some("Test Site".to_string())).await.unwrap();
        let config = Config::load(&dir.join("lectern.toml")).unwrap();
        assert_eq!(config.site.title, "Test Site");
        assert!(dir.join("data").is_dir());

        assert!(run(dir.clone(), None).await.is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
