//! Stats command handler.

use super::{open_sessions, to_json_string};
use agentic_core::{AppConfig, AppResult};
use agentic_knowledge::KnowledgeBase;
use clap::Args;
use serde_json::json;

/// Show knowledge base and session statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let knowledge = KnowledgeBase::open(config)?.stats()?;
        let sessions = open_sessions(config)?.list_sessions(usize::MAX)?;
        let messages: usize = sessions.iter().map(|s| s.message_count).sum();

        if self.json {
            let output = json!({
                "provider": config.provider,
                "model": config.model,
                "knowledge": knowledge,
                "sessions": sessions.len(),
                "messages": messages,
            });
            println!("{}", to_json_string(&output)?);
        } else {
            println!("Provider:        {} ({})", config.provider, config.model);
            println!("Documents:       {}", knowledge.sources);
            println!("Chunks:          {}", knowledge.chunks);
            println!("Tracked files:   {}", knowledge.manifest_entries);
            println!("Index size:      {} bytes", knowledge.db_size_bytes);
            println!("Sessions:        {}", sessions.len());
            println!("Messages:        {}", messages);
        }

        Ok(())
    }
}
