use crate::config::SummarizerConfig;
use crate::models::Summary;

/// Inputs shorter than this (after trimming) are never sent to the model.
pub const MIN_INPUT_CHARS: usize = 50;
/// The local fallback only kicks in for texts longer than this.
pub const FALLBACK_THRESHOLD_CHARS: usize = 100;
pub const FALLBACK_SENTENCES: usize = 3;

/// Client for the hosted summarization model.
///
/// Built once at startup and shared through the application state.
pub struct TextSummarizer {
    config: SummarizerConfig,
    #[cfg(feature = "summarizer")]
    client: reqwest::Client,
}

impl TextSummarizer {
    pub fn new(config: SummarizerConfig) -> anyhow::Result<Self> {
        if config.enabled && config.api_token.is_none() {
            tracing::warn!(
                "No summarizer API token configured; requests may be slower or rate limited"
            );
        }

        #[cfg(feature = "summarizer")]
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("lectern/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            config,
            #[cfg(feature = "summarizer")]
            client,
        })
    }

    pub fn disabled() -> Self {
        let config = SummarizerConfig {
            enabled: false,
            ..SummarizerConfig::default()
        };
        Self {
            config,
            #[cfg(feature = "summarizer")]
            client: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled && cfg!(feature = "summarizer")
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Ask the model for a summary. `None` covers every way that can fail:
    /// short input, disabled client, model still loading, HTTP errors,
    /// network errors, unexpected bodies.
    pub async fn summarize(&self, text: &str, max_length: u32, min_length: u32) -> Option<String> {
        if text.trim().chars().count() < MIN_INPUT_CHARS || !self.is_enabled() {
            return None;
        }
        self.request(text, max_length, min_length).await
    }

    #[cfg(feature = "summarizer")]
    async fn request(&self, text: &str, max_length: u32, min_length: u32) -> Option<String> {
        let payload = serde_json::json!({
            "inputs": text,
            "parameters": {
                "max_length": max_length,
                "min_length": min_length,
                "do_sample": false,
            },
        });

        let mut request = self.client.post(self.endpoint()).json(&payload);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Summarization request failed: {}", e);
                return None;
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            tracing::info!("Summarization model is still loading");
            return None;
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Summarization API error: {} - {}", status, body);
            return None;
        }

        match response.json::<serde_json::Value>().await {
            Ok(body) => extract_summary(&body),
            Err(e) => {
                tracing::warn!("Summarization API returned an unreadable body: {}", e);
                None
            }
        }
    }

    #[cfg(not(feature = "summarizer"))]
    async fn request(&self, _text: &str, _max_length: u32, _min_length: u32) -> Option<String> {
        None
    }

    /// Model summary if the service answers, otherwise the first sentences
    /// of the text when it is long enough to be worth shortening.
    pub async fn summarize_text(
        &self,
        text: &str,
        max_length: u32,
        min_length: u32,
    ) -> Option<Summary> {
        match self.summarize(text, max_length, min_length).await {
            Some(summary) => Some(Summary::Model(summary)),
            None if text.chars().count() > FALLBACK_THRESHOLD_CHARS => {
                Some(Summary::Fallback(summarize_fallback(text, FALLBACK_SENTENCES)))
            }
            None => None,
        }
    }

    /// [`summarize_text`](Self::summarize_text) with the configured bounds.
    pub async fn summarize_post(&self, text: &str) -> Option<Summary> {
        self.summarize_text(text, self.config.max_length, self.config.min_length)
            .await
    }
}

/// Accepts `[{"summary_text": ...}]` as well as `{"summary_text": ...}`.
fn extract_summary(body: &serde_json::Value) -> Option<String> {
    let entry = match body {
        serde_json::Value::Array(items) => items.first()?,
        other => other,
    };
    entry
        .get("summary_text")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// First `max_sentences` sentences, split on `". "`, ending with a period.
/// Text with no more sentences than that comes back unchanged.
pub fn summarize_fallback(text: &str, max_sentences: usize) -> String {
    if text.is_empty() {
        return String::new();
    }

    let sentences: Vec<&str> = text.split(". ").collect();
    if sentences.len() <= max_sentences {
        return text.to_string();
    }

    let mut summary = sentences[..max_sentences].join(". ");
    if !summary.ends_with('.') {
        summary.push('.');
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_keeps_short_text() {
        let text = "One. Two. Three";
        assert_eq!(summarize_fallback(text, 3), text);
        assert_eq!(summarize_fallback("", 3), "");
    }

    #[test]
    fn test_fallback_takes_first_sentences() {
        let text = "First point. Second point. Third point. Fourth point. Fifth.";
        assert_eq!(
            summarize_fallback(text, 3),
            "First point. Second point. Third point."
        );
    }

    #[test]
    fn test_extract_summary_shapes() {
        let list = serde_json::json!([{ "summary_text": "  short version " }]);
        assert_eq!(extract_summary(&list).as_deref(), Some("short version"));

        let object = serde_json::json!({ "summary_text": "object form" });
        assert_eq!(extract_summary(&object).as_deref(), Some("object form"));

        assert_eq!(extract_summary(&serde_json::json!([])), None);
        assert_eq!(extract_summary(&serde_json::json!({ "error": "x" })), None);
        assert_eq!(extract_summary(&serde_json::json!([{ "summary_text": "" }])), None);
    }

    #[test]
    fn test_endpoint_joins_model() {
        let summarizer = TextSummarizer::new(SummarizerConfig {
            base_url: "https://models.example.com/".to_string(),
            model: "org/model".to_string(),
            ..SummarizerConfig::default()
        })
        .unwrap();
        assert_eq!(summarizer.endpoint(), "https://models.example.com/org/model");
    }

    #[tokio::test]
    async fn test_disabled_summarizer_returns_none() {
        let summarizer = TextSummarizer::disabled();
        let text = "word ".repeat(40);
        assert_eq!(summarizer.summarize(&text, 150, 50).await, None);
    }

    #[tokio::test]
    async fn test_short_input_is_not_sent() {
        let summarizer = TextSummarizer::new(SummarizerConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..SummarizerConfig::default()
        })
        .unwrap();
        assert_eq!(summarizer.summarize("tiny", 150, 50).await, None);
    }

    #[tokio::test]
    async fn test_fallback_used_above_threshold() {
        let summarizer = TextSummarizer::disabled();
        let text = format!(
            "{}. Second sentence here. Third sentence here. Fourth sentence here.",
            "A fairly long opening sentence that pads the text well past the limit"
        );
        assert!(text.chars().count() > FALLBACK_THRESHOLD_CHARS);

        let summary = summarizer.summarize_text(&text, 150, 50).await;
        assert_eq!(
            summary,
            Some(Summary::Fallback(format!(
                "{}. Second sentence here. Third sentence here.",
                "A fairly long opening sentence that pads the text well past the limit"
            )))
        );
    }

    #[tokio::test]
    async fn test_no_summary_at_or_below_threshold() {
        let summarizer = TextSummarizer::disabled();
        let text = "x".repeat(FALLBACK_THRESHOLD_CHARS);
        assert_eq!(summarizer.summarize_text(&text, 150, 50).await, None);
    }
}
