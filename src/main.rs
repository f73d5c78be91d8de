//! # Ticker News Ledger
//!
//! Fetches recent news for a list of stock tickers, summarizes each article
//! through a text-generation API, scores the sentiment of every summary and
//! appends the results to a CSV ledger, never recording the same URL twice.
//!
//! ## Usage
//!
//! ```sh
//! GROQ_API_KEY=... ticker_news_ledger --tickers OKLO,AAPL,NVDA
//! ```
//!
//! ## Architecture
//!
//! A single sequential pass per invocation:
//! 1. **Searching**: collect links from a news search for each ticker
//! 2. **Filtering**: keep secure, non-excluded, de-duplicated URLs
//! 3. **Dedup**: drop URLs already present in the ledger
//! 4. **Fetching**: download articles and keep the first 350 words
//! 5. **Summarizing**: one completion per article
//! 6. **Scoring**: one sentiment batch per ticker
//! 7. **Output**: append rows to the ledger and print them

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod filter;
mod ledger;
mod models;
mod pipeline;
mod scrapers;
mod sentiment;
mod utils;

use api::GroqSummarizer;
use cli::Cli;
use pipeline::StockNewsPipeline;
use scrapers::WebNewsSource;
use sentiment::HttpSentimentClassifier;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("ticker_news_ledger starting up");

    if let Err(e) = dotenvy::dotenv() {
        debug!(error = %e, "No .env file loaded");
    }

    // Parse CLI; a missing GROQ_API_KEY stops here
    let args = Cli::parse();
    debug!(?args.tickers, ?args.output, ?args.config, "Parsed CLI arguments");

    // ---- Load settings ----
    let mut settings = config::load_settings(args.config.as_deref()).inspect_err(|e| {
        error!(error = %e, "Failed to load settings");
    })?;
    if let Some(tickers) = args.tickers {
        settings.tickers = tickers;
    }
    if let Some(backend) = args.backend {
        settings.summarizer.backend = backend;
    }
    info!(
        tickers = ?settings.tickers,
        backend = ?settings.summarizer.backend,
        model = %settings.summarizer.model,
        "Settings resolved"
    );

    // ---- Build collaborators ----
    let timeout = settings.request_timeout();
    let source = WebNewsSource::new(
        settings.search_url.clone(),
        &settings.user_agent,
        timeout,
        settings.max_article_words,
    )?;
    let summarizer = GroqSummarizer::new(args.groq_api_key, settings.summarizer.clone(), timeout)?;
    let classifier = HttpSentimentClassifier::new(
        settings.sentiment.endpoint.clone(),
        args.hf_api_token,
        timeout,
    )?;
    let pipeline = StockNewsPipeline::new(
        source,
        summarizer,
        classifier,
        settings.exclude_keywords.clone(),
    );

    // ---- Run ----
    let ledger_path = Path::new(&args.output);
    let existing = ledger::read_existing_urls(ledger_path);
    let report = pipeline.run(&settings.tickers, existing).await;

    // ---- Output ----
    persist(ledger_path, &report.rows);
    match ledger::rows_to_csv(&report.rows) {
        Ok(csv) => print!("{csv}"),
        Err(e) => error!(error = %e, "Failed to render rows"),
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        tickers = report.stats.tickers,
        candidates = report.stats.candidates,
        fetched = report.stats.fetched,
        summarized = report.stats.summarized,
        rows = report.stats.rows,
        skipped_tickers = report.stats.skipped_tickers,
        "Execution complete"
    );

    Ok(())
}

/// Append the run's rows; failures are logged and do not fail the run.
fn persist(path: &Path, rows: &[models::LedgerRow]) {
    match ledger::append_rows(path, rows) {
        Ok(()) => info!(path = %path.display(), rows = rows.len(), "Data written to ledger"),
        Err(e) => error!(path = %path.display(), error = %e, "Error writing data to ledger"),
    }
}
