//! Agent runtime - message routing and multi-agent orchestration
//!
//! This crate is the conversational layer of carelog. One message goes in,
//! one reply comes out, and along the way:
//! - The **router** classifies the message into intents (`router`)
//! - **Specialists** validate, persist and explain each log entry
//!   (`specialists`)
//! - The **pattern analyzer** turns history into findings (`analyzer`)
//! - The **coordinator** fans out across specialists with per-branch
//!   timeouts and stitches partial results together (`coordinator`)
//! - The **responder** answers open questions from retrieved guidance
//!   (`responder`)
//!
//! # Key Types
//!
//! - `AgentRuntime` - entry point; `process_message` handles one turn
//! - `LlmClient` - pluggable trait for OpenAI/Anthropic/Ollama
//! - `AgentError` - failure taxonomy with user-safe rendering
//!
//! # Safety Principle
//!
//! The language model is strictly a classifier and phrasing aid. It NEVER
//! decides what gets persisted, what a reading means, or what advice a
//! threshold triggers. Those are deterministic decisions made in code, so
//! the whole pipeline keeps working when the model is unreachable.

pub mod analyzer;
pub mod coordinator;
pub mod error;
pub mod llm;
pub mod prompts;
pub mod responder;
pub mod router;
pub mod runtime;
pub mod specialists;

mod text;

pub use coordinator::{BranchFailure, CoordinationOutcome, InsightsCoordinator};
pub use error::AgentError;
pub use llm::{client_from_config, DisabledLlmClient, HttpLlmClient, LlmClient};
pub use router::Router;
pub use runtime::{AgentRuntime, RuntimeStores};
