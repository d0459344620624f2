//! Sessions command handler.

use super::{open_sessions, to_json_string};
use agentic_core::{AppConfig, AppError, AppResult};
use agentic_session::store::DEFAULT_LIST_LIMIT;
use agentic_session::summary;
use clap::{Args, Subcommand};

/// Inspect and manage conversation sessions
#[derive(Args, Debug)]
pub struct SessionsCommand {
    #[command(subcommand)]
    pub action: SessionsAction,
}

#[derive(Subcommand, Debug)]
pub enum SessionsAction {
    /// List active sessions, most recent first
    List {
        /// Maximum number of sessions to show
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a session's conversation
    Show {
        thread_id: String,

        /// Maximum number of messages to show
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Delete a session and its messages
    Delete { thread_id: String },
}

impl SessionsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let store = open_sessions(config)?;

        match &self.action {
            SessionsAction::List { limit, json } => {
                let sessions = store.list_sessions(*limit)?;
                if *json {
                    println!("{}", to_json_string(&sessions)?);
                } else if sessions.is_empty() {
                    println!("No active sessions");
                } else {
                    for session in sessions {
                        println!(
                            "{}  {:>4} messages  updated {}{}",
                            session.thread_id,
                            session.message_count,
                            session.updated_at.format("%Y-%m-%d %H:%M:%S"),
                            session
                                .user_id
                                .map(|u| format!("  (user: {})", u))
                                .unwrap_or_default()
                        );
                    }
                }
            }
            SessionsAction::Show { thread_id, limit } => {
                if store.get_session(thread_id)?.is_none() {
                    return Err(AppError::Validation(format!(
                        "Session '{}' not found",
                        thread_id
                    )));
                }

                let messages = store.history(thread_id, *limit)?;
                println!("Session {}: {}", thread_id, summary(&messages));
                for message in messages {
                    println!();
                    println!("[{}] {}", message.role, message.content);
                }
            }
            SessionsAction::Delete { thread_id } => {
                if store.delete_session(thread_id)? {
                    println!("Session '{}' deleted", thread_id);
                } else {
                    return Err(AppError::Validation(format!(
                        "Session '{}' not found",
                        thread_id
                    )));
                }
            }
        }

        Ok(())
    }
}
