//! Run settings loaded from an optional YAML file.
//!
//! Every field has a default, so an empty or absent file is valid.
//!
//! ```yaml
//! tickers: [OKLO, AAPL, NVDA]
//! exclude_keywords: [maps, policies, preferences, accounts, support]
//! max_article_words: 350
//! summarizer:
//!   backend: stream
//!   model: llama3-8b-8192
//! sentiment:
//!   endpoint: https://api-inference.huggingface.co/models/nlptown/bert-base-multilingual-uncased-sentiment
//! ```

use crate::filter::DEFAULT_EXCLUDE_KEYWORDS;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::time::Duration;
use tracing::{info, instrument};

pub const DEFAULT_TICKERS: [&str; 3] = ["OKLO", "AAPL", "NVDA"];
pub const DEFAULT_LEDGER_PATH: &str = "assetsummaries.csv";

/// Prompt sent to the summarization API; `{input}` is replaced by the article.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "You are a summarization assistant. Your task is to summarize the provided text in a concise and coherent manner. Please summarize the following text:
=========
{input}
=========
Summary:";

/// How summaries are requested from the completion API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SummarizerBackend {
    /// One non-streaming completion.
    #[default]
    Chat,
    /// Incremental chunks accumulated into one summary.
    Stream,
}

/// Top-level settings document.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub tickers: Vec<String>,
    pub exclude_keywords: Vec<String>,
    pub max_article_words: usize,
    pub search_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub summarizer: SummarizerSettings,
    pub sentiment: SentimentSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tickers: DEFAULT_TICKERS.iter().map(|s| s.to_string()).collect(),
            exclude_keywords: DEFAULT_EXCLUDE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            max_article_words: 350,
            search_url: "https://www.google.com/search".into(),
            request_timeout_secs: 30,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).into(),
            summarizer: SummarizerSettings::default(),
            sentiment: SentimentSettings::default(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Completion API settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SummarizerSettings {
    pub backend: SummarizerBackend,
    /// OpenAI-compatible chat completions URL.
    pub endpoint: String,
    pub model: String,
    pub prompt_template: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            backend: SummarizerBackend::Chat,
            endpoint: "https://api.groq.com/openai/v1/chat/completions".into(),
            model: "llama3-8b-8192".into(),
            prompt_template: DEFAULT_PROMPT_TEMPLATE.into(),
            temperature: 0.0,
            max_tokens: 1024,
            top_p: 1.0,
        }
    }
}

/// Sentiment classifier settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SentimentSettings {
    pub endpoint: String,
}

impl Default for SentimentSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api-inference.huggingface.co/models/nlptown/bert-base-multilingual-uncased-sentiment".into(),
        }
    }
}

/// Load settings from `path`, or defaults when no path is given.
#[instrument(level = "info")]
pub fn load_settings(path: Option<&str>) -> Result<Settings, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let text = fs::read_to_string(path)?;
    let settings = parse_settings(&text)?;
    info!(path, "Loaded settings");
    Ok(settings)
}

/// Parse a YAML settings document; an empty document gives the defaults.
pub fn parse_settings(text: &str) -> Result<Settings, serde_yaml::Error> {
    if text.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let s = parse_settings("").unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.max_article_words, 350);
        assert_eq!(
            s.exclude_keywords,
            vec!["maps", "policies", "preferences", "accounts", "support"]
        );
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let yaml = "tickers: [TSLA]\nsummarizer:\n  backend: stream\n  model: llama-3.1-8b-instant\n";
        let s = parse_settings(yaml).unwrap();
        assert_eq!(s.tickers, vec!["TSLA"]);
        assert_eq!(s.summarizer.backend, SummarizerBackend::Stream);
        assert_eq!(s.summarizer.model, "llama-3.1-8b-instant");
        assert_eq!(s.summarizer.max_tokens, 1024);
        assert_eq!(s.search_url, "https://www.google.com/search");
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(parse_settings("summarizer:\n  backend: carrier-pigeon\n").is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yaml");
        assert!(load_settings(path.to_str()).is_err());
        assert!(load_settings(None).is_ok());
    }

    #[test]
    fn test_default_prompt_has_placeholder() {
        assert!(DEFAULT_PROMPT_TEMPLATE.contains("{input}"));
    }
}
