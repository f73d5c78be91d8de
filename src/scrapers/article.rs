//! Article fetching and paragraph extraction.
//!
//! Article pages come from arbitrary publishers, so no site-specific
//! selectors are used: the text of every `<p>` element is joined with single
//! spaces and cut to the first `max_words` words.

use super::get_html;
use crate::models::ArticleRecord;
use crate::utils::truncate_words;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use std::error::Error;
use tracing::{info, instrument};

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// Concatenate the text of all paragraph elements, separated by single spaces.
pub fn extract_paragraph_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .select(&PARAGRAPH)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Paragraph text of `html`, limited to `max_words` words.
pub fn extract_article(html: &str, max_words: usize) -> String {
    truncate_words(&extract_paragraph_text(html), max_words)
}

/// Fetch a single article.
///
/// # Returns
///
/// The article record, or an error on transport failure or non-success
/// status. The body may be empty if the page has no paragraphs.
#[instrument(level = "info", skip(client, max_words))]
pub async fn fetch_article(
    client: &Client,
    url: &str,
    max_words: usize,
) -> Result<ArticleRecord, Box<dyn Error>> {
    let html = get_html(client, url).await?;
    let body = extract_article(&html, max_words);
    info!(words = body.split_whitespace().count(), "Parsed article");
    Ok(ArticleRecord {
        url: url.to_string(),
        body,
    })
}
