//! Sentiment scoring of summaries.
//!
//! The classifier is a hosted text-classification model reached through a
//! Hugging Face style inference endpoint. All summaries for a ticker go out
//! in one request:
//!
//! ```text
//! POST {endpoint}
//! {"inputs": ["summary one", "summary two"]}
//! ```
//!
//! and the answer is either one candidate list per input, or one flat
//! `{label, score}` per input. The highest-scoring candidate wins.

use crate::error::ApiError;
use crate::models::SentimentResult;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

/// Score a batch of summaries.
pub trait ClassifySentiment {
    /// Return exactly one result per input, in input order.
    async fn classify(&self, summaries: &[String]) -> Result<Vec<SentimentResult>, Box<dyn Error>>;
}

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a [String],
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassifyResponse {
    Ranked(Vec<Vec<SentimentResult>>),
    Flat(Vec<SentimentResult>),
}

/// Reduce a classifier response to one top result per input.
fn top_results(resp: ClassifyResponse, expected: usize) -> Result<Vec<SentimentResult>, ApiError> {
    let results: Vec<SentimentResult> = match resp {
        ClassifyResponse::Flat(flat) => flat,
        ClassifyResponse::Ranked(ranked) => ranked
            .into_iter()
            .enumerate()
            .map(|(i, candidates)| {
                candidates
                    .into_iter()
                    .max_by(|a, b| a.score.total_cmp(&b.score))
                    .ok_or(ApiError::MissingLabel(i))
            })
            .collect::<Result<_, _>>()?,
    };

    if results.len() != expected {
        return Err(ApiError::SentimentCount {
            expected,
            got: results.len(),
        });
    }

    Ok(results
        .into_iter()
        .map(|r| SentimentResult {
            score: r.score.clamp(0.0, 1.0),
            ..r
        })
        .collect())
}

/// Classifier reached over HTTP.
pub struct HttpSentimentClassifier {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
}

impl fmt::Debug for HttpSentimentClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSentimentClassifier")
            .field("endpoint", &self.endpoint)
            .field("authenticated", &self.api_token.is_some())
            .finish()
    }
}

impl HttpSentimentClassifier {
    pub fn new(
        endpoint: impl Into<String>,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_token,
        })
    }
}

impl ClassifySentiment for HttpSentimentClassifier {
    #[instrument(level = "info", skip_all, fields(inputs = summaries.len()))]
    async fn classify(&self, summaries: &[String]) -> Result<Vec<SentimentResult>, Box<dyn Error>> {
        if summaries.is_empty() {
            return Ok(Vec::new());
        }

        let t0 = Instant::now();
        let mut req = self
            .client
            .post(&self.endpoint)
            .json(&ClassifyRequest { inputs: summaries });
        if let Some(token) = &self.api_token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: resp.url().to_string(),
            }
            .into());
        }

        let parsed: ClassifyResponse = resp.json().await?;
        let results = top_results(parsed, summaries.len())?;
        info!(elapsed_ms = t0.elapsed().as_millis() as u64, "Scored summaries");
        Ok(results)
    }
}
