//! The per-run pipeline: search, filter, dedup, fetch, summarize, score.
//!
//! Tickers are processed one after another and articles one at a time. Each
//! article's URL travels with it ([`ArticleRecord`] then
//! [`SummarizedArticle`]), so a failure at any stage removes the whole record
//! and rows can never pair a summary with another article's URL.
//!
//! Failure policy:
//! - search errors: logged by the source, ticker yields no candidates
//! - fetch errors and empty pages: logged, article dropped
//! - summarization errors: logged, article dropped
//! - sentiment errors: logged, ticker skipped, run continues

use crate::api::Summarize;
use crate::filter::strip_unwanted_urls;
use crate::ledger::filter_new_urls;
use crate::models::{ArticleRecord, LedgerRow, SummarizedArticle};
use crate::scrapers::NewsSource;
use crate::sentiment::ClassifySentiment;
use crate::utils::truncate_for_log;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use tracing::{debug, error, info, instrument, warn};

/// Counters for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub tickers: usize,
    pub candidates: usize,
    pub fetched: usize,
    pub summarized: usize,
    pub rows: usize,
    pub skipped_tickers: usize,
}

/// Rows produced by a run, in ticker then article order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub rows: Vec<LedgerRow>,
    pub stats: RunStats,
}

/// The pipeline wired to its collaborators.
#[derive(Debug)]
pub struct StockNewsPipeline<N, S, C> {
    source: N,
    summarizer: S,
    classifier: C,
    exclude_keywords: Vec<String>,
}

impl<N, S, C> StockNewsPipeline<N, S, C>
where
    N: NewsSource,
    S: Summarize,
    C: ClassifySentiment,
{
    pub fn new(source: N, summarizer: S, classifier: C, exclude_keywords: Vec<String>) -> Self {
        Self {
            source,
            summarizer,
            classifier,
            exclude_keywords,
        }
    }

    /// Run every ticker once.
    ///
    /// `seen` holds the URLs already in the ledger. URLs that produce a row
    /// are added to it, so later tickers in the same run skip them too.
    #[instrument(level = "info", skip_all, fields(tickers = tickers.len()))]
    pub async fn run(&self, tickers: &[String], mut seen: HashSet<String>) -> RunReport {
        let mut report = RunReport::default();

        for ticker in tickers {
            report.stats.tickers += 1;
            let rows = self.process_ticker(ticker, &seen, &mut report.stats).await;
            for row in &rows {
                seen.insert(row.url.clone());
            }
            report.rows.extend(rows);
        }

        report.stats.rows = report.rows.len();
        info!(stats = ?report.stats, "Run finished");
        report
    }

    #[instrument(level = "info", skip(self, seen, stats))]
    async fn process_ticker(
        &self,
        ticker: &str,
        seen: &HashSet<String>,
        stats: &mut RunStats,
    ) -> Vec<LedgerRow> {
        info!("Fetching URLs");
        let hrefs = self.source.search_links(ticker).await;
        let cleaned = strip_unwanted_urls(&hrefs, &self.exclude_keywords);
        if cleaned.is_empty() {
            warn!("No candidate URLs found; skipping ticker");
            return Vec::new();
        }

        let urls = filter_new_urls(cleaned, seen);
        if urls.is_empty() {
            info!("Every candidate URL is already in the ledger; skipping ticker");
            return Vec::new();
        }
        stats.candidates += urls.len();
        debug!(urls = ?urls, "New candidate URLs");

        info!(count = urls.len(), "Scraping and summarizing articles");
        let articles = self.fetch_articles(urls).await;
        stats.fetched += articles.len();
        let summarized = self.summarize_articles(articles).await;
        stats.summarized += summarized.len();
        if summarized.is_empty() {
            warn!("No articles summarized; skipping ticker");
            return Vec::new();
        }

        info!(count = summarized.len(), "Analyzing sentiment");
        let texts: Vec<String> = summarized.iter().map(|a| a.summary.clone()).collect();
        let sentiments = match self.classifier.classify(&texts).await {
            Ok(s) if s.len() == summarized.len() => s,
            Ok(s) => {
                error!(expected = summarized.len(), got = s.len(), "Sentiment result count mismatch; skipping ticker");
                stats.skipped_tickers += 1;
                return Vec::new();
            }
            Err(e) => {
                error!(error = %e, "Sentiment analysis failed; skipping ticker");
                stats.skipped_tickers += 1;
                return Vec::new();
            }
        };

        let rows: Vec<LedgerRow> = summarized
            .into_iter()
            .zip(sentiments)
            .map(|(article, sentiment)| LedgerRow::new(ticker, article, sentiment))
            .collect();
        info!(rows = rows.len(), "Created output rows");
        rows
    }

    /// Fetch each URL in order; failed or empty pages are dropped.
    async fn fetch_articles(&self, urls: Vec<String>) -> Vec<ArticleRecord> {
        let source = &self.source;
        stream::iter(urls)
            .then(|url| async move {
                match source.fetch_article(&url).await {
                    Ok(article) if article.body.is_empty() => {
                        warn!(%url, "Article page had no paragraph text; skipping");
                        None
                    }
                    Ok(article) => Some(article),
                    Err(e) => {
                        error!(%url, error = %e, "Error scraping article");
                        None
                    }
                }
            })
            .filter_map(std::future::ready)
            .collect()
            .await
    }

    /// Summarize each article in order; failures drop the article.
    async fn summarize_articles(&self, articles: Vec<ArticleRecord>) -> Vec<SummarizedArticle> {
        let summarizer = &self.summarizer;
        stream::iter(articles)
            .then(|article| async move {
                match summarizer.summarize(&article.body).await {
                    Ok(summary) => Some(SummarizedArticle {
                        url: article.url,
                        summary,
                    }),
                    Err(e) => {
                        error!(
                            url = %article.url,
                            error = %e,
                            body_preview = %truncate_for_log(&article.body, 120),
                            "Error summarizing article"
                        );
                        None
                    }
                }
            })
            .filter_map(std::future::ready)
            .collect()
            .await
    }
}
