mod inputs;
mod prompt;
mod session;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docchat::backends::http::HttpSearchBackend;
use docchat::{DocSearch, ErrorPolicy};
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::inputs::get_env_value_or_input;
use crate::prompt::rustyline::RustylinePrompt;
use crate::session::Session;

const SEARCH_URL_ENV: &str = "DOCCHAT_SEARCH_URL";
const API_KEY_ENV: &str = "DOCCHAT_API_KEY";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Search endpoint (can also be set via DOCCHAT_SEARCH_URL environment variable)
    #[arg(long)]
    search_url: Option<String>,

    /// Search API key (can also be set via DOCCHAT_API_KEY environment variable)
    #[arg(long)]
    api_key: Option<String>,

    /// How failed searches are reported (stream or status)
    #[arg(long, default_value_t = ErrorPolicy::Stream)]
    error_policy: ErrorPolicy,

    /// Heading shown when the session starts
    #[arg(long, default_value = "Docs assistant")]
    title: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive chat (the default)
    Chat,

    /// Ask one question and print the answer
    Ask {
        /// The question to search the docs for
        #[arg(required = true)]
        question: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Keep the chat output clean unless RUST_LOG asks for more
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let doc_search = create_doc_search(&cli)?;
    let prompt = RustylinePrompt::new()?;
    let mut session = Session::new(doc_search, Box::new(prompt), cli.title.clone());

    match cli.command {
        Some(Command::Ask { question }) => session.headless_start(&question.join(" ")).await,
        Some(Command::Chat) | None => session.start().await,
    }
}

fn create_doc_search(cli: &Cli) -> Result<DocSearch> {
    let search_url = match &cli.search_url {
        Some(url) => url.clone(),
        None => get_env_value_or_input(SEARCH_URL_ENV, "Search endpoint URL:", false)
            .context("Search URL must be provided via --search-url or DOCCHAT_SEARCH_URL")?,
    };
    let search_url = Url::parse(&search_url)
        .with_context(|| format!("Invalid search URL: {}", search_url))?;

    let api_key = match &cli.api_key {
        Some(key) => key.clone(),
        None => get_env_value_or_input(API_KEY_ENV, "Search API key:", true)
            .context("API key must be provided via --api-key or DOCCHAT_API_KEY")?,
    };

    tracing::debug!(url = %search_url, policy = %cli.error_policy, "searching");
    let backend = HttpSearchBackend::new(search_url, api_key);
    Ok(DocSearch::new(Arc::new(backend)).with_error_policy(cli.error_policy))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from([
            "docchat",
            "--search-url",
            "https://search.example.com/v1/search",
            "--error-policy",
            "status",
            "ask",
            "how",
            "do I connect?",
        ])
        .unwrap();

        assert_eq!(cli.error_policy, ErrorPolicy::Status);
        match cli.command {
            Some(Command::Ask { question }) => assert_eq!(question.join(" "), "how do I connect?"),
            _ => panic!("Expected the ask command"),
        }
    }

    #[test]
    fn test_defaults_to_chat() {
        let cli = Cli::try_parse_from(["docchat"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.error_policy, ErrorPolicy::Stream);
        assert_eq!(cli.title, "Docs assistant");
    }

    #[test]
    fn test_rejects_unknown_policy() {
        assert!(Cli::try_parse_from(["docchat", "--error-policy", "retry"]).is_err());
    }

    #[test]
    fn test_create_doc_search_rejects_bad_url() {
        let cli = Cli::try_parse_from(["docchat", "--search-url", "not a url", "--api-key", "k"])
            .unwrap();
        assert!(create_doc_search(&cli).is_err());
    }
}
