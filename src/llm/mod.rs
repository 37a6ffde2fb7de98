//! Dialogue layer - prompts, transports, canned lines and the arbitrating client

pub mod client;
pub mod dialogue;
pub mod lines;
pub mod mock;
pub mod prompts;

pub use client::{ChatRequest, ChatResponse, DialogueTransport, LlmClient};
pub use dialogue::{DialogueClient, DialogueOutcome, SpokenLine};
pub use lines::Reaction;
pub use mock::MockBackend;
