//! Contract Polish - optional LLM rewriting of assembled contracts
//!
//! Provides:
//! - Trait-based LLM backends (OpenAI-compatible chat, Ollama, mock)
//! - Provider configuration from YAML or the environment
//! - A fail-safe [`Polisher`] that degrades to the original text
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │               Polisher                  │
//! │  (timeout, cancellation, degradation)   │
//! └────────────────┬────────────────────────┘
//!                  │
//!      ┌───────────┼───────────┐
//!      ▼           ▼           ▼
//! ┌─────────┐ ┌─────────┐ ┌─────────┐
//! │ OpenAi  │ │ Ollama  │ │  Mock   │
//! │ (Groq,  │ │         │ │         │
//! │ LMStudio│ │         │ │         │
//! └─────────┘ └─────────┘ └─────────┘
//! ```

pub mod backend;
pub mod config;
pub mod polisher;

// Re-export main types for convenience
pub use backend::traits::{CompletionRequest, CompletionResponse, LlmBackend, LlmError, Usage};
pub use config::{PolishConfig, PolishProvider};
pub use polisher::{DegradeReason, PolishOutcome, Polisher};
