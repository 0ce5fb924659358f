//! LLM Backend abstraction layer.
//!
//! Provides a trait-based interface for the polish providers:
//! - OpenAI-compatible chat (Groq, OpenAI, LM Studio)
//! - Ollama generate API
//! - Mock backend for testing

pub mod mock;
pub mod ollama;
pub mod openai;
pub mod traits;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;
pub use traits::{
    CompletionRequest, CompletionResponse, FinishReason, LlmBackend, LlmError, Message,
    MessageRole, Usage,
};
