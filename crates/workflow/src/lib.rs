//! Agentic RAG workflow.
//!
//! A query passes through a fixed sequence of LLM-driven stages:
//!
//! ```text
//! rewrite -> needs info? -(yes)-> select source -> retrieve -> generate
//!                        -(no)------------------------------> generate
//! generate -> evaluate -(relevant or out of iterations)-> done
//!                      -(otherwise)-> rewrite
//! ```
//!
//! Every stage talks to the model through [`agentic_llm::LlmClient`], so the
//! whole workflow runs deterministically against a scripted client.

pub mod agents;
pub mod prompts;
pub mod retrieval;
pub mod state;
pub mod workflow;

pub use agents::AnswerSink;
pub use prompts::PromptLibrary;
pub use retrieval::{Retrievers, ToolsManager, WebSearchManager};
pub use state::{RagState, Source};
pub use workflow::{create_llm_client, initialize_knowledge, AgenticRag, WorkflowSettings};
