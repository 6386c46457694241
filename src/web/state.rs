use crate::services::statistics::Statistics;
use crate::services::summarizer::TextSummarizer;
use crate::web::security::RateLimiter;
use crate::{Config, Database};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub summarizer: Arc<TextSummarizer>,
    pub statistics: Statistics,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Result<Self> {
        let summarizer = TextSummarizer::new(config.summarizer.clone())?;
        Ok(Self::with_summarizer(config, db, summarizer))
    }

    /// Build the state around an already constructed summarizer, e.g. a
    /// disabled one in tests.
    pub fn with_summarizer(config: Config, db: Database, summarizer: TextSummarizer) -> Self {
        let rate_limiter = RateLimiter::new(
            config.auth.max_login_attempts,
            Duration::from_secs(config.auth.lockout_secs),
        );

        Self {
            statistics: Statistics::new(db.clone()),
            config,
            db,
            summarizer: Arc::new(summarizer),
            rate_limiter: Arc::new(rate_limiter),
        }
    }
}
