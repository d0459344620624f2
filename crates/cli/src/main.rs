//! Agentic RAG CLI
//!
//! Main entry point for the agentic-rag command-line tool.
//! Runs single queries, an interactive loop, document indexing and the HTTP API.

mod commands;
mod interactive;
mod output;

use clap::{Parser, Subcommand};
use commands::{IndexCommand, QueryCommand, ServeCommand, SessionsCommand, StatsCommand};
use agentic_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Agentic RAG - retrieval-augmented answers with query rewriting and self-evaluation
#[derive(Parser, Debug)]
#[command(name = "agentic-rag")]
#[command(about = "Agentic retrieval-augmented generation", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true)]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// LLM provider (groq, openai, ollama)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Process a single query and exit
    #[arg(short, long, conflicts_with = "interactive")]
    query: Option<String>,

    /// Index documents before processing
    #[arg(long)]
    index: bool,

    /// Run in interactive mode (default if no query provided)
    #[arg(long)]
    interactive: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one query through the workflow
    Query(QueryCommand),

    /// Index documents into the knowledge base
    Index(IndexCommand),

    /// Start the HTTP API server
    Serve(ServeCommand),

    /// Inspect and manage conversation sessions
    Sessions(SessionsCommand),

    /// Show knowledge base and session statistics
    Stats(StatsCommand),
}

impl Cli {
    fn load_config(&self) -> AppResult<AppConfig> {
        let workspace = self.workspace.clone();
        let config_file = self.config.clone();

        // CLI paths decide where the config file is read from
        let config = AppConfig::load_with_env(|key| match key {
            "AGENTIC_WORKSPACE" if workspace.is_some() => {
                workspace.as_ref().map(|p| p.to_string_lossy().into_owned())
            }
            "AGENTIC_CONFIG" if config_file.is_some() => {
                config_file.as_ref().map(|p| p.to_string_lossy().into_owned())
            }
            _ => std::env::var(key).ok(),
        })?;

        Ok(config.with_overrides(
            self.workspace.clone(),
            self.config.clone(),
            self.provider.clone(),
            self.model.clone(),
            self.log_level.clone(),
            self.verbose,
            self.no_color,
            self.json_logs,
        ))
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = cli.load_config()?;

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.json_logs)?;

    tracing::info!("Agentic RAG starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.validate()?;
    config.ensure_agentic_dir()?;

    let command_name = match &cli.command {
        Some(Commands::Query(_)) => "query",
        Some(Commands::Index(_)) => "index",
        Some(Commands::Serve(_)) => "serve",
        Some(Commands::Sessions(_)) => "sessions",
        Some(Commands::Stats(_)) => "stats",
        None if cli.query.is_some() => "query",
        None => "interactive",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Some(Commands::Query(cmd)) => cmd.execute(&config).await,
        Some(Commands::Index(cmd)) => cmd.execute(&config).await,
        Some(Commands::Serve(cmd)) => cmd.execute(config).await,
        Some(Commands::Sessions(cmd)) => cmd.execute(&config),
        Some(Commands::Stats(cmd)) => cmd.execute(&config),
        None => {
            let query = if cli.interactive { None } else { cli.query };
            run_default(&config, query, cli.index).await
        }
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

/// Flag-driven mode: optional indexing, then one query or the interactive loop.
async fn run_default(config: &AppConfig, query: Option<String>, index: bool) -> AppResult<()> {
    let runtime = commands::Runtime::open(config)?;

    if index {
        tracing::info!("Indexing documents...");
        let stats = runtime.index(Default::default()).await?;
        tracing::info!("Documents indexed ({} files)", stats.files_indexed);
    }

    match query {
        Some(query) => {
            let state = runtime.workflow.run(&query, Vec::new()).await;
            println!("{}", output::render_result(&state));
            Ok(())
        }
        None => interactive::run(config, &runtime).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_query_flags() {
        let cli = Cli::try_parse_from(["agentic-rag", "-q", "What is Rust?", "--index"]).unwrap();
        assert_eq!(cli.query.as_deref(), Some("What is Rust?"));
        assert!(cli.index);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_subcommands_with_globals() {
        let cli = Cli::try_parse_from([
            "agentic-rag",
            "query",
            "hello",
            "--json",
            "--provider",
            "ollama",
        ])
        .unwrap();
        assert_eq!(cli.provider.as_deref(), Some("ollama"));
        assert!(matches!(cli.command, Some(Commands::Query(ref q)) if q.json && q.text == "hello"));

        let cli = Cli::try_parse_from(["agentic-rag", "sessions", "delete", "abc"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Sessions(_))));
    }

    #[test]
    fn test_query_conflicts_with_interactive() {
        assert!(Cli::try_parse_from(["agentic-rag", "-q", "x", "--interactive"]).is_err());
    }

    #[test]
    fn test_query_stream_flag() {
        let cli = Cli::try_parse_from(["agentic-rag", "query", "hello", "--stream"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Query(ref q)) if q.stream && !q.json));

        let both = ["agentic-rag", "query", "hello", "--stream", "--json"];
        assert!(Cli::try_parse_from(both).is_err());
    }
}
