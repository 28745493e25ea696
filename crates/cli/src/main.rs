mod cli;
mod repl;

use std::sync::Arc;

use clap::Parser;
use coinq_domain::clock::SystemClock;
use coinq_llm::anthropic::AnthropicClient;
use coinq_llm::LlmClient;
use coinq_pipeline::Pipeline;
use coinq_tools::stores::{InMemoryPriceStore, InMemoryVectorStore};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli::load_config()?;

    match cli.command {
        None => {
            let pipeline = Arc::new(build_pipeline(&config)?);
            repl::chat(pipeline, "cli:chat".to_string()).await
        }
        Some(Command::Chat { session }) => {
            let pipeline = Arc::new(build_pipeline(&config)?);
            repl::chat(pipeline, session).await
        }
        Some(Command::Ask { message, session }) => {
            let pipeline = build_pipeline(&config)?;
            let outcome = pipeline.ask(&session, &message).await;
            println!("{}", outcome.answer);
            if !outcome.errors.is_empty() {
                eprintln!("path: {} ({} error(s))", outcome.path, outcome.errors.len());
            } else {
                eprintln!("path: {}", outcome.path);
            }
            Ok(())
        }
        Some(Command::Version) => {
            println!("coinq {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,coinq=debug")))
        .json()
        .init();
}

/// Wires a `Pipeline` from config. Ingestion into the price series and
/// news vector store is out of scope for this binary; it backs both
/// with empty in-memory stubs, so `get_coin_price`/`semantic_search`
/// return no data unless a real deployment supplies its own
/// `PriceStore`/`VectorStore`.
fn build_pipeline(config: &coinq_domain::config::Config) -> anyhow::Result<Pipeline> {
    let api_key = std::env::var(&config.llm.api_key_env)
        .map_err(|_| anyhow::anyhow!("environment variable {} is not set", config.llm.api_key_env))?;

    let llm: Arc<dyn LlmClient> =
        Arc::new(AnthropicClient::new(&config.llm.base_url, api_key, config.llm.model.clone())?);
    let price_store = Arc::new(InMemoryPriceStore::empty());
    let vector_store = Arc::new(InMemoryVectorStore::empty());
    let clock = Arc::new(SystemClock);

    Ok(Pipeline::new(config, llm, price_store, vector_store, clock))
}
