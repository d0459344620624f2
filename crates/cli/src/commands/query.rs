//! Query command handler.

use super::{open_sessions, to_json_string, Runtime};
use crate::output;
use agentic_core::{AppConfig, AppResult};
use agentic_llm::ChatRole;
use clap::Args;
use std::io::Write;

/// Run one query through the workflow
#[derive(Args, Debug)]
pub struct QueryCommand {
    /// The question to ask
    pub text: String,

    /// Output the full workflow state as JSON
    #[arg(long)]
    pub json: bool,

    /// Continue a stored conversation thread
    #[arg(long)]
    pub thread: Option<String>,

    /// Print the answer as the model generates it
    #[arg(long, conflicts_with = "json")]
    pub stream: bool,
}

impl QueryCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing query command");

        let runtime = Runtime::open(config)?;

        let (sessions, history) = match &self.thread {
            Some(thread_id) => {
                let sessions = open_sessions(config)?;
                sessions.ensure_session(thread_id, None)?;
                let history = sessions.context_messages(thread_id)?;
                tracing::debug!("Loaded {} context messages for {}", history.len(), thread_id);
                (Some(sessions), history)
            }
            None => (None, Vec::new()),
        };

        let state = if self.stream {
            println!("\nANSWER:");
            let sink = |piece: &str| {
                print!("{}", piece);
                std::io::stdout().flush().ok();
            };
            let state = runtime.workflow.run_streaming(&self.text, history, &sink).await;
            println!();
            state
        } else {
            runtime.workflow.run(&self.text, history).await
        };

        if let (Some(sessions), Some(thread_id)) = (&sessions, &self.thread) {
            if state.error.is_none() {
                sessions.append_message(thread_id, ChatRole::User, &self.text)?;
                sessions.append_message(thread_id, ChatRole::Assistant, &state.answer)?;
            } else {
                tracing::warn!("Not saving failed query to thread {}", thread_id);
            }
        }

        if self.json {
            println!("{}", to_json_string(&state)?);
        } else if self.stream {
            println!("{}", output::render_summary(&state));
        } else {
            println!("{}", output::render_result(&state));
        }

        Ok(())
    }
}
