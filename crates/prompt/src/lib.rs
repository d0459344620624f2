//! Prompt system for the Agentic RAG workflow.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - Built-in definitions for every workflow stage
//! - Workspace overrides in `.agentic/prompts/`
//! - Handlebars template rendering

pub mod builder;
pub mod defaults;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use defaults::{builtin_ids, ids};
pub use loader::{list_prompts, load_prompt};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, OutputFormat, PromptBehavior, PromptDefinition,
    PromptInputSpec, PromptOutputSpec,
};
