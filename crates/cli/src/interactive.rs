//! Interactive query loop.

use crate::commands::Runtime;
use crate::output;
use agentic_core::{AppConfig, AppResult};
use agentic_knowledge::IndexOptions;
use agentic_llm::ChatMessage;
use agentic_session::sliding_window;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Skip,
    Quit,
    Index,
    Query(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Skip;
    }
    match trimmed.to_lowercase().as_str() {
        "quit" | "exit" | "q" => Input::Quit,
        "index" => Input::Index,
        _ => Input::Query(trimmed),
    }
}

fn print_banner() {
    let rule = "=".repeat(60);
    println!("\n{}", rule);
    println!("AGENTIC RAG - Interactive Mode");
    println!("{}", rule);
    println!("\nCommands:");
    println!("  - Type your query and press Enter");
    println!("  - Type 'quit' or 'exit' to stop");
    println!("  - Type 'index' to index documents");
    println!("{}\n", rule);
}

fn prompt() -> AppResult<()> {
    print!("\nEnter your query: ");
    std::io::stdout().flush()?;
    Ok(())
}

pub async fn run(config: &AppConfig, runtime: &Runtime) -> AppResult<()> {
    tracing::info!("Starting interactive mode...");
    print_banner();

    let mut history: Vec<ChatMessage> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!("\n\nInterrupted. Goodbye!");
                break;
            }
        };

        let Some(line) = line else {
            println!("\nGoodbye!");
            break;
        };

        match classify(&line) {
            Input::Skip => continue,
            Input::Quit => {
                println!("\nGoodbye!");
                break;
            }
            Input::Index => {
                println!("\nIndexing documents...");
                match runtime.index(IndexOptions::default()).await {
                    Ok(stats) => println!(
                        "✓ Indexed {} of {} files ({} chunks)",
                        stats.files_indexed, stats.files_seen, stats.chunks_added
                    ),
                    Err(e) => {
                        tracing::error!("Indexing failed: {}", e);
                        println!("\n❌ Error: {}\n", e);
                    }
                }
            }
            Input::Query(query) => {
                let state = runtime.workflow.run(query, history.clone()).await;
                println!("{}", output::render_result(&state));

                if let Some(error) = &state.error {
                    tracing::error!("Error processing query: {}", error);
                    continue;
                }

                history.push(ChatMessage::user(query));
                history.push(ChatMessage::assistant(state.answer));
                history = sliding_window(&history, config.session.max_context_messages);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("   "), Input::Skip);
        assert_eq!(classify("QUIT"), Input::Quit);
        assert_eq!(classify(" q "), Input::Quit);
        assert_eq!(classify("exit"), Input::Quit);
        assert_eq!(classify("Index"), Input::Index);
        assert_eq!(classify("  what is rust? "), Input::Query("what is rust?"));
    }
}
