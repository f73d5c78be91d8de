//! News discovery and article scraping.
//!
//! Scraping follows a two-phase pattern:
//!
//! 1. **Searching**: query a news-search page for a ticker and collect every
//!    anchor `href` ([`search`])
//! 2. **Fetching**: download each candidate URL and extract its paragraph
//!    text ([`article`])
//!
//! Both phases sit behind the [`NewsSource`] trait so the pipeline can run
//! against fixed fixtures. [`WebNewsSource`] is the live implementation.
//! Every request is a single attempt; failures are logged by the caller and
//! the item is skipped.

pub mod article;
pub mod search;

use crate::error::ApiError;
use crate::models::ArticleRecord;
use reqwest::Client;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, instrument};

/// Source of search links and article bodies.
pub trait NewsSource {
    /// Return every anchor `href` from the search results for `ticker`, in
    /// document order. Transport or status failures yield an empty list.
    async fn search_links(&self, ticker: &str) -> Vec<String>;

    /// Download `url` and extract its truncated paragraph text.
    async fn fetch_article(&self, url: &str) -> Result<ArticleRecord, Box<dyn Error>>;
}

/// [`NewsSource`] backed by live HTTP requests.
#[derive(Debug, Clone)]
pub struct WebNewsSource {
    client: Client,
    search_url: String,
    max_words: usize,
}

impl WebNewsSource {
    /// Build a source with its own HTTP client.
    ///
    /// # Arguments
    ///
    /// * `search_url` - Search endpoint; `q` and `tbm` are appended
    /// * `user_agent` - Sent on every request
    /// * `timeout` - Per-request timeout
    /// * `max_words` - Article body word limit
    pub fn new(
        search_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
        max_words: usize,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            search_url: search_url.into(),
            max_words,
        })
    }
}

impl NewsSource for WebNewsSource {
    async fn search_links(&self, ticker: &str) -> Vec<String> {
        search::search_for_stock_news_urls(&self.client, &self.search_url, ticker).await
    }

    async fn fetch_article(&self, url: &str) -> Result<ArticleRecord, Box<dyn Error>> {
        article::fetch_article(&self.client, url, self.max_words).await
    }
}

/// GET a page and return its body, treating non-success statuses as errors.
#[instrument(level = "debug", skip(client))]
pub(crate) async fn get_html(client: &Client, url: &str) -> Result<String, Box<dyn Error>> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            url: resp.url().to_string(),
        }
        .into());
    }
    let body = resp.text().await?;
    debug!(bytes = body.len(), "Fetched page");
    Ok(body)
}
