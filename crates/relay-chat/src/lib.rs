//! Chat orchestration for the relay backend.
//!
//! Selects and wraps the upstream completion provider, strips reasoning
//! markup from its replies, and runs the per-request pipeline: validate,
//! optionally augment with search, complete, assemble.

pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod reasoning;

pub use error::ChatError;
pub use orchestrator::{build_search_message, ChatOrchestrator};
pub use provider::{build_provider, ChatProvider, OpenAiCompatibleProvider};
pub use reasoning::strip_reasoning;
