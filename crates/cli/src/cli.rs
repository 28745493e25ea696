use clap::{Parser, Subcommand};
use coinq_domain::config::Config;

/// coinq — a cryptocurrency price/news question-answering pipeline.
#[derive(Debug, Parser)]
#[command(name = "coinq", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open an interactive chat REPL (default when no subcommand is given).
    Chat {
        /// Session key (defaults to "cli:chat").
        #[arg(long, default_value = "cli:chat")]
        session: String,
    },
    /// Send a single utterance and print the answer.
    Ask {
        /// The utterance to ask.
        message: String,
        /// Session key (defaults to "cli:ask").
        #[arg(long, default_value = "cli:ask")]
        session: String,
    },
    /// Print version information.
    Version,
}

/// Load configuration from the path named by `COINQ_CONFIG` (default
/// `config.toml`), or the built-in defaults if that file is absent.
pub fn load_config() -> anyhow::Result<Config> {
    let path = std::env::var("COINQ_CONFIG").unwrap_or_else(|_| "config.toml".to_string());

    if std::path::Path::new(&path).exists() {
        let raw = std::fs::read_to_string(&path).map_err(|e| anyhow::anyhow!("reading {path}: {e}"))?;
        let config = toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {path}: {e}"))?;
        Ok(config)
    } else {
        Ok(Config::default())
    }
}
