//! Command-line interface definitions.
//!
//! Every option has a default or an environment fallback, so the binary runs
//! with no flags at all. Values given here override the settings file.

use crate::config::SummarizerBackend;
use clap::Parser;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Default tickers, ledger in the working directory
/// GROQ_API_KEY=... ticker_news_ledger
///
/// # Custom tickers and ledger, streaming summaries
/// ticker_news_ledger --tickers TSLA,MSFT --output data/ledger.csv --backend stream
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Comma-separated ticker symbols (defaults to the settings file, then OKLO,AAPL,NVDA)
    #[arg(short, long, env = "TICKERS", value_delimiter = ',')]
    pub tickers: Option<Vec<String>>,

    /// Path of the CSV ledger
    #[arg(short, long, env = "LEDGER_PATH", default_value = crate::config::DEFAULT_LEDGER_PATH)]
    pub output: String,

    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Summarization backend (defaults to the settings file, then chat)
    #[arg(short, long, value_enum)]
    pub backend: Option<SummarizerBackend>,

    /// Groq API key
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: String,

    /// Bearer token for the sentiment inference endpoint
    #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
    pub hf_api_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["ticker_news_ledger", "--groq-api-key", "k"]);

        assert_eq!(cli.output, "assetsummaries.csv");
        assert_eq!(cli.groq_api_key, "k");
        assert!(cli.backend.is_none());
    }

    #[test]
    fn test_missing_groq_api_key_is_fatal() {
        // an exported key would satisfy the env fallback
        if std::env::var_os("GROQ_API_KEY").is_some() {
            return;
        }
        let err = Cli::try_parse_from(["ticker_news_ledger"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_tickers_and_backend() {
        let cli = Cli::parse_from([
            "ticker_news_ledger",
            "-t",
            "TSLA,MSFT",
            "-o",
            "/tmp/ledger.csv",
            "--backend",
            "stream",
            "--groq-api-key",
            "k",
        ]);

        assert_eq!(cli.tickers, Some(vec!["TSLA".to_string(), "MSFT".to_string()]));
        assert_eq!(cli.output, "/tmp/ledger.csv");
        assert_eq!(cli.backend, Some(SummarizerBackend::Stream));
    }
}
