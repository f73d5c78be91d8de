//! Data models carried through the pipeline.
//!
//! - [`ArticleRecord`]: a fetched page, URL and truncated body kept together
//! - [`SummarizedArticle`]: the same record once the body has been summarized
//! - [`SentimentResult`]: label and confidence for one summary
//! - [`LedgerRow`]: the unit persisted to the CSV ledger
//!
//! The URL travels inside every record, so dropping a record at any stage
//! drops its URL with it and rows never pair a summary with another page.

use serde::{Deserialize, Serialize};

/// Header row of the ledger file. The URL column must stay last.
pub const LEDGER_HEADER: [&str; 5] = ["Ticker", "Summary", "Label", "Confidence", "URL"];

/// A fetched article page.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRecord {
    /// The URL the body was downloaded from.
    pub url: String,
    /// Paragraph text, truncated to the configured word limit.
    pub body: String,
}

/// An article after summarization.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarizedArticle {
    /// The URL the summarized body came from.
    pub url: String,
    /// Generated summary text.
    pub summary: String,
}

/// Classifier output for one summary.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SentimentResult {
    /// Categorical label, e.g. `"4 stars"`.
    pub label: String,
    /// Confidence in `[0, 1]`.
    pub score: f64,
}

/// One persisted ledger row.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub ticker: String,
    pub summary: String,
    pub label: String,
    pub confidence: f64,
    pub url: String,
}

impl LedgerRow {
    /// Build a row from a summarized article and its sentiment.
    pub fn new(ticker: &str, article: SummarizedArticle, sentiment: SentimentResult) -> Self {
        Self {
            ticker: ticker.to_string(),
            summary: article.summary,
            label: sentiment.label,
            confidence: sentiment.score,
            url: article.url,
        }
    }

    /// Fields in ledger column order.
    pub fn to_record(&self) -> [String; 5] {
        [
            self.ticker.clone(),
            self.summary.clone(),
            self.label.clone(),
            self.confidence.to_string(),
            self.url.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_keeps_url_last() {
        let row = LedgerRow::new(
            "OKLO",
            SummarizedArticle {
                url: "https://a.com/x".into(),
                summary: "Oklo files S-4.".into(),
            },
            SentimentResult {
                label: "3 stars".into(),
                score: 0.5,
            },
        );
        let rec = row.to_record();
        assert_eq!(rec[0], "OKLO");
        assert_eq!(rec[3], "0.5");
        assert_eq!(rec[4], "https://a.com/x");
        assert_eq!(LEDGER_HEADER[4], "URL");
    }
}
