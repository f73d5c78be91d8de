//! News search for a ticker.
//!
//! The search page is queried as `{search_url}?q=yahoo+finance+{TICKER}&tbm=nws`
//! (appended to any query the configured URL already carries) and every anchor `href` on the result page is returned untouched. Cleaning
//! happens in [`crate::filter`].

use super::get_html;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, error, info, instrument};
use url::Url;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Build the search URL for a ticker.
pub fn search_query_url(search_url: &str, ticker: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(search_url)?;
    url.query_pairs_mut()
        .append_pair("q", &format!("yahoo finance {ticker}"))
        .append_pair("tbm", "nws");
    Ok(url)
}

/// Every anchor `href` in `html`, in document order.
pub fn extract_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Search for news about `ticker` and return the raw hrefs.
///
/// Any transport error or non-success status is logged and yields an empty
/// list. There is no retry.
#[instrument(level = "info", skip(client, search_url))]
pub async fn search_for_stock_news_urls(client: &Client, search_url: &str, ticker: &str) -> Vec<String> {
    let url = match search_query_url(search_url, ticker) {
        Ok(url) => url,
        Err(e) => {
            error!(%search_url, error = %e, "Invalid search URL");
            return Vec::new();
        }
    };
    match get_html(client, url.as_str()).await {
        Ok(html) => {
            let hrefs = extract_links(&html);
            info!(count = hrefs.len(), "Collected search result links");
            debug!(hrefs = ?hrefs, "Search hrefs");
            hrefs
        }
        Err(e) => {
            error!(%url, error = %e, "Error fetching URLs for ticker");
            Vec::new()
        }
    }
}
