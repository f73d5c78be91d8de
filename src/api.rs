//! Summarization through an OpenAI-compatible chat completions API.
//!
//! # Architecture
//!
//! - [`Summarize`]: the capability the pipeline depends on
//! - [`GroqSummarizer`]: the live backend, in one of two modes picked by
//!   [`SummarizerBackend`]:
//!   - `chat`: a single completion, `choices[0].message.content`
//!   - `stream`: server-sent chunks accumulated from
//!     `choices[0].delta.content` until `[DONE]`, then paragraph breaks
//!     collapsed to spaces
//!
//! One attempt per article. Errors are returned to the caller, which logs
//! them and drops the article.

use crate::config::{SummarizerBackend, SummarizerSettings};
use crate::error::ApiError;
use crate::utils::{collapse_paragraph_breaks, truncate_for_log};
use futures::StreamExt;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Turn article text into a summary.
pub trait Summarize {
    /// Summarize `text`, returning non-empty trimmed output.
    async fn summarize(&self, text: &str) -> Result<String, Box<dyn Error>>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

/// Fill the prompt template with the article body.
pub fn render_prompt(template: &str, article: &str) -> String {
    template.replace("{input}", article)
}

/// Incremental decoder for a server-sent completion stream.
///
/// Bytes may arrive split anywhere, including inside a UTF-8 sequence, so
/// only complete lines are decoded.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    pending: Vec<u8>,
    text: String,
    done: bool,
}

impl StreamAccumulator {
    /// Feed raw bytes from the response body.
    pub fn push(&mut self, bytes: &[u8]) -> Result<(), ApiError> {
        self.pending.extend_from_slice(bytes);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.handle_line(&line)?;
        }
        Ok(())
    }

    /// Whether the `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Flush any unterminated last line and return the accumulated text.
    pub fn finish(mut self) -> Result<String, ApiError> {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.handle_line(&line)?;
        }
        Ok(self.text)
    }

    fn handle_line(&mut self, raw: &[u8]) -> Result<(), ApiError> {
        if self.done {
            return Ok(());
        }
        let line = std::str::from_utf8(raw)
            .map_err(|e| ApiError::StreamFrame(e.to_string()))?
            .trim();
        // comments, event names and keep-alives carry no text
        let Some(data) = line.strip_prefix("data:") else {
            return Ok(());
        };
        let data = data.trim();
        if data == "[DONE]" {
            self.done = true;
            return Ok(());
        }
        let chunk: StreamChunk = serde_json::from_str(data)
            .map_err(|e| ApiError::StreamFrame(format!("{e}: {}", truncate_for_log(data, 200))))?;
        for choice in chunk.choices {
            if let Some(content) = choice.delta.content {
                self.text.push_str(&content);
            }
        }
        Ok(())
    }
}

/// Summarizer backed by the Groq chat completions API.
pub struct GroqSummarizer {
    client: Client,
    api_key: String,
    settings: SummarizerSettings,
}

impl fmt::Debug for GroqSummarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroqSummarizer")
            .field("endpoint", &self.settings.endpoint)
            .field("model", &self.settings.model)
            .field("backend", &self.settings.backend)
            .finish()
    }
}

impl GroqSummarizer {
    /// Create a summarizer with its own HTTP client.
    pub fn new(
        api_key: impl Into<String>,
        settings: SummarizerSettings,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            settings,
        })
    }

    fn request<'a>(&'a self, article: &str, stream: bool) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.settings.model,
            messages: vec![ChatMessage {
                role: "user",
                content: render_prompt(&self.settings.prompt_template, article),
            }],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            top_p: self.settings.top_p,
            stream,
        }
    }

    async fn send(&self, body: &ChatRequest<'_>) -> Result<Response, Box<dyn Error>> {
        let resp = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let url = resp.url().to_string();
            let detail = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %truncate_for_log(&detail, 300), "Completion API rejected request");
            return Err(ApiError::Status {
                status: status.as_u16(),
                url,
            }
            .into());
        }
        Ok(resp)
    }

    async fn complete(&self, article: &str) -> Result<String, Box<dyn Error>> {
        let resp = self.send(&self.request(article, false)).await?;
        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ApiError::EmptyCompletion.into())
    }

    async fn complete_streaming(&self, article: &str) -> Result<String, Box<dyn Error>> {
        let resp = self.send(&self.request(article, true)).await?;
        let mut body = resp.bytes_stream();
        let mut acc = StreamAccumulator::default();
        while let Some(chunk) = body.next().await {
            acc.push(&chunk?)?;
            if acc.is_done() {
                break;
            }
        }
        Ok(collapse_paragraph_breaks(&acc.finish()?))
    }
}

impl Summarize for GroqSummarizer {
    #[instrument(level = "info", skip_all, fields(backend = ?self.settings.backend))]
    async fn summarize(&self, text: &str) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = match self.settings.backend {
            SummarizerBackend::Chat => self.complete(text).await,
            SummarizerBackend::Stream => self.complete_streaming(text).await,
        };
        let dt = t0.elapsed();

        let summary = res?.trim().to_string();
        if summary.is_empty() {
            return Err(ApiError::EmptyCompletion.into());
        }
        info!(elapsed_ms = dt.as_millis() as u64, chars = summary.len(), "Summarized article");
        debug!(summary = %truncate_for_log(&summary, 300), "Summary");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    fn settings(server: &MockServer, backend: SummarizerBackend) -> SummarizerSettings {
        SummarizerSettings {
            backend,
            endpoint: server.url("/openai/v1/chat/completions"),
            prompt_template: "Summarize:\n{input}".into(),
            ..SummarizerSettings::default()
        }
    }

    fn summarizer(server: &MockServer, backend: SummarizerBackend) -> GroqSummarizer {
        GroqSummarizer::new("test-key", settings(server, backend), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_render_prompt() {
        assert_eq!(render_prompt("A {input} B", "text"), "A text B");
    }

    #[test]
    fn test_accumulator_handles_split_frames() {
        let mut acc = StreamAccumulator::default();
        acc.push(b"data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\ndata: {\"choices\":[{\"del")
            .unwrap();
        acc.push(b"ta\":{\"content\":\"Oklo \"}}]}\n\n: keep-alive\n").unwrap();
        acc.push("data: {\"choices\":[{\"delta\":{\"content\":\"r\u{e9}".as_bytes()).unwrap();
        acc.push(b"ussit\"}}]}\n\ndata: [DONE]\n\n").unwrap();
        assert!(acc.is_done());
        assert_eq!(acc.finish().unwrap(), "Oklo réussit");
    }

    #[test]
    fn test_accumulator_ignores_frames_after_done() {
        let mut acc = StreamAccumulator::default();
        acc.push(b"data: [DONE]\ndata: not json\n").unwrap();
        assert_eq!(acc.finish().unwrap(), "");
    }

    #[test]
    fn test_accumulator_rejects_garbage_frame() {
        let mut acc = StreamAccumulator::default();
        let err = acc.push(b"data: {oops\n").unwrap_err();
        assert!(matches!(err, ApiError::StreamFrame(_)));
    }

    #[test]
    fn test_accumulator_flushes_unterminated_line() {
        let mut acc = StreamAccumulator::default();
        acc.push(b"data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}").unwrap();
        assert_eq!(acc.finish().unwrap(), "tail");
    }

    #[tokio::test]
    async fn test_chat_backend_returns_completion() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/openai/v1/chat/completions")
                .header("authorization", "Bearer test-key")
                .json_body(json!({
                    "model": "llama3-8b-8192",
                    "messages": [{"role": "user", "content": "Summarize:\nOklo files S-4."}],
                    "temperature": 0.0,
                    "max_tokens": 1024,
                    "top_p": 1.0,
                    "stream": false
                }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "choices": [{"index": 0, "message": {"role": "assistant", "content": "  Oklo filed a registration statement.\n"}}]
                }));
        });

        let summary = summarizer(&server, SummarizerBackend::Chat)
            .summarize("Oklo files S-4.")
            .await
            .unwrap();

        mock.assert();
        assert_eq!(summary, "Oklo filed a registration statement.");
    }

    #[tokio::test]
    async fn test_stream_backend_accumulates_and_collapses_breaks() {
        let server = MockServer::start();
        let sse = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"First point.\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"\\n\\nSecond\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" point.\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        let mock = server.mock(|when, then| {
            when.method(POST).path("/openai/v1/chat/completions");
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(sse);
        });

        let summary = summarizer(&server, SummarizerBackend::Stream)
            .summarize("body")
            .await
            .unwrap();

        mock.assert();
        assert_eq!(summary, "First point. Second point.");
    }

    #[tokio::test]
    async fn test_empty_completion_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/openai/v1/chat/completions");
            then.status(200).json_body(json!({"choices": []}));
        });

        let err = summarizer(&server, SummarizerBackend::Chat)
            .summarize("body")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no text"));
    }

    #[tokio::test]
    async fn test_api_error_status_is_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/openai/v1/chat/completions");
            then.status(401).json_body(json!({"error": {"message": "Invalid API Key"}}));
        });

        let err = summarizer(&server, SummarizerBackend::Chat)
            .summarize("body")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("401"));
    }
}
