//! Index command handler.

use super::to_json_string;
use agentic_core::{AppConfig, AppResult};
use agentic_knowledge::{IndexOptions, KnowledgeBase};
use clap::Args;
use std::path::PathBuf;

/// Index documents into the knowledge base
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// Drop the existing index and re-index everything
    #[arg(long)]
    pub reset: bool,

    /// Directory to index instead of the configured documents directory
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Also index markdown files
    #[arg(long)]
    pub markdown: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing index command");

        let knowledge = KnowledgeBase::open(config)?;

        let mut options = IndexOptions {
            reset: self.reset,
            path: self.path.clone(),
            ..Default::default()
        };
        if self.markdown {
            options.extensions.extend(["md".to_string(), "markdown".to_string()]);
        }

        let stats = knowledge.index_documents(options).await?;

        if self.json {
            println!("{}", to_json_string(&stats)?);
        } else {
            println!(
                "Indexed {} of {} files ({} skipped, {} chunks) in {:.2}s",
                stats.files_indexed,
                stats.files_seen,
                stats.files_skipped,
                stats.chunks_added,
                stats.duration_secs
            );
        }

        Ok(())
    }
}
