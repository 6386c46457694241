use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContentConfig {
    #[serde(default = "default_posts_per_page")]
    pub posts_per_page: usize,
    /// Posts listed on a public profile page.
    #[serde(default = "default_profile_posts")]
    pub profile_posts: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            posts_per_page: default_posts_per_page(),
            profile_posts: default_profile_posts(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default = "default_session_lifetime_days")]
    pub session_lifetime_days: i64,
    #[serde(default = "default_login_attempts")]
    pub max_login_attempts: usize,
    #[serde(default = "default_lockout_secs")]
    pub lockout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_lifetime_days: default_session_lifetime_days(),
            max_login_attempts: default_login_attempts(),
            lockout_secs: default_lockout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SummarizerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_summary_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_summary_max")]
    pub max_length: u32,
    #[serde(default = "default_summary_min")]
    pub min_length: u32,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_token: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_summary_timeout(),
            max_length: default_summary_max(),
            min_length: default_summary_min(),
        }
    }
}

impl SummarizerConfig {
    /// Fill the token and model from the environment when the file leaves
    /// them at their defaults.
    pub fn apply_env(&mut self) {
        if self.api_token.is_none() {
            self.api_token = std::env::var("HUGGINGFACE_API_TOKEN")
                .ok()
                .filter(|t| !t.is_empty());
        }
        if self.model == default_model() {
            if let Ok(model) = std::env::var("HUGGINGFACE_MODEL") {
                if !model.is_empty() {
                    self.model = model;
                }
            }
        }
    }
}

pub const DEFAULT_MODEL: &str = "facebook/bart-large-cnn";

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    "https://api-inference.huggingface.co/models".to_string()
}

fn default_summary_timeout() -> u64 {
    30
}

fn default_summary_max() -> u32 {
    150
}

fn default_summary_min() -> u32 {
    50
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u64 {
    60
}

fn default_pool_size() -> u32 {
    10
}

fn default_posts_per_page() -> usize {
    12
}

fn default_profile_posts() -> usize {
    20
}

fn default_session_lifetime_days() -> i64 {
    7
}

fn default_login_attempts() -> usize {
    5
}

fn default_lockout_secs() -> u64 {
    900
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!(
                "Could not read config file '{}': {}. Run `lectern init` first?",
                path.display(),
                e
            )
        })?;
        let mut config: Config = toml::from_str(&content)?;
        config.summarizer.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn default_for(title: &str) -> Self {
        Self {
            site: SiteConfig {
                title: title.to_string(),
                description: String::new(),
            },
            server: ServerConfig::default(),
            database: DatabaseConfig {
                path: "data/lectern.db".to_string(),
                pool_size: default_pool_size(),
            },
            content: ContentConfig::default(),
            auth: AuthConfig::default(),
            summarizer: SummarizerConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.content.posts_per_page == 0 {
            anyhow::bail!("content.posts_per_page must be greater than 0");
        }
        if self.content.posts_per_page > 100 {
            anyhow::bail!("content.posts_per_page must be 100 or less");
        }
        if self.database.pool_size == 0 {
            anyhow::bail!("database.pool_size must be greater than 0");
        }
        if self.auth.session_lifetime_days <= 0 {
            anyhow::bail!("auth.session_lifetime_days must be greater than 0");
        }
        if self.summarizer.min_length > self.summarizer.max_length {
            anyhow::bail!("summarizer.min_length must not exceed summarizer.max_length");
        }
        url::Url::parse(&self.summarizer.base_url)
            .map_err(|e| anyhow::anyhow!("summarizer.base_url is not a valid URL: {}", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [site]
            title = "My Blog"

            [database]
            path = "blog.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.content.posts_per_page, 12);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.summarizer.model, DEFAULT_MODEL);
        assert_eq!(config.summarizer.max_length, 150);
        assert_eq!(config.summarizer.min_length, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_page_size() {
        let mut config = Config::default_for("Blog");
        config.content.posts_per_page = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_summary_bounds() {
        let mut config = Config::default_for("Blog");
        config.summarizer.min_length = 200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = Config::default_for("Blog");
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.site.title, "Blog");
        assert_eq!(parsed.database.path, "data/lectern.db");
    }
}
