//! Conversation sessions persisted in SQLite.
//!
//! Every message of a thread is stored; only a sliding window of the most
//! recent ones is handed to the LLM as context.

pub mod filter;
pub mod store;
pub mod thread;
pub mod types;

pub use filter::{count_by_role, sliding_window, summary};
pub use store::SessionStore;
pub use thread::resolve_thread_id;
pub use types::{RoleCounts, SessionInfo, StoredMessage};
