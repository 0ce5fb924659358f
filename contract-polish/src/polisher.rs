//! Polisher - the fail-safe entry point for contract polishing.
//!
//! Polishing never fails from the caller's point of view: errors, empty
//! answers, truncation, timeouts and cancellation all hand back the
//! original document together with the reason.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::{
    CompletionRequest, FinishReason, LlmBackend, LlmError, Message, MockBackend, OllamaBackend,
    OpenAiBackend, Usage,
};
use crate::config::{PolishConfig, PolishProvider};

#[cfg(feature = "typescript")]
use ts_rs::TS;

const SYSTEM_PROMPT: &str = "You are a legal document assistant that polishes contracts. \
Maintain all compliance requirements and legal disclaimers.";

const INSTRUCTIONS: &str = "Polish and improve the following legal contract. Make it more \
professional and ensure proper legal language while maintaining all essential clauses and \
compliance requirements.";

/// Why a polish attempt fell back to the original text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DegradeReason {
    /// The backend returned an error
    Failed(String),
    /// The backend answered with nothing
    EmptyResponse,
    /// The backend stopped at its token limit
    Truncated,
    /// No answer within the configured timeout
    TimedOut,
    /// The caller cancelled
    Cancelled,
}

impl std::fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed(msg) => write!(f, "backend error: {}", msg),
            Self::EmptyResponse => write!(f, "empty response"),
            Self::Truncated => write!(f, "response truncated at token limit"),
            Self::TimedOut => write!(f, "timed out"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result of one polish call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PolishOutcome {
    /// Polishing disabled; no call was made
    Passthrough { text: String },
    Polished {
        text: String,
        provider: String,
        model: String,
        usage: Usage,
    },
    /// Original text, returned because polishing did not succeed
    Degraded { text: String, reason: DegradeReason },
}

impl PolishOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Passthrough { text } | Self::Polished { text, .. } | Self::Degraded { text, .. } => {
                text
            }
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Passthrough { text } | Self::Polished { text, .. } | Self::Degraded { text, .. } => {
                text
            }
        }
    }

    pub fn is_polished(&self) -> bool {
        matches!(self, Self::Polished { .. })
    }
}

/// Polishes assembled contracts through a configured backend.
pub struct Polisher {
    backend: Option<Arc<dyn LlmBackend>>,
    /// Set when the selected provider cannot run
    unavailable: Option<String>,
    timeout: Duration,
    temperature: f32,
    max_tokens: u32,
}

impl Polisher {
    /// A polisher that never calls a backend.
    pub fn disabled() -> Self {
        let defaults = PolishConfig::default();
        Self {
            backend: None,
            unavailable: None,
            timeout: defaults.timeout(),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
        }
    }

    /// Build the backend the configuration selects.
    ///
    /// A provider missing its API key still yields a polisher; every call
    /// then degrades to the original text. Fails only when the HTTP client
    /// cannot be built.
    pub fn from_config(config: &PolishConfig) -> Result<Self, LlmError> {
        let mut polisher = Self {
            backend: None,
            unavailable: None,
            timeout: config.timeout(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        };

        if config.provider.requires_api_key() && config.api_key.is_none() {
            let reason = format!("{} requires an API key", config.provider.as_str());
            warn!(provider = %config.provider.as_str(), "Polish backend not configured: {}", reason);
            polisher.unavailable = Some(reason);
            return Ok(polisher);
        }

        let model = config.resolved_model();
        let base_url = config.resolved_base_url().unwrap_or_default();

        polisher.backend = match config.provider {
            PolishProvider::None => None,
            PolishProvider::Mock => Some(Arc::new(MockBackend::new(model).echoing())),
            PolishProvider::Groq | PolishProvider::OpenAi | PolishProvider::LmStudio => Some(Arc::new(
                OpenAiBackend::new(base_url, model, config.api_key.clone())?
                    .with_provider(config.provider.as_str()),
            )),
            PolishProvider::Ollama => Some(Arc::new(OllamaBackend::new(base_url, model)?)),
        };

        if let Some(backend) = &polisher.backend {
            info!(provider = %backend.provider(), model = %backend.id(), "Polish backend configured");
        }
        Ok(polisher)
    }

    /// Polish through an explicit backend.
    pub fn with_backend(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            backend: Some(backend),
            ..Self::disabled()
        }
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether polish calls are attempted, including ones that will degrade.
    pub fn is_enabled(&self) -> bool {
        self.backend.is_some() || self.unavailable.is_some()
    }

    /// Polish a document.
    pub async fn polish(&self, text: &str, requirements: &str) -> PolishOutcome {
        self.polish_until(text, requirements, std::future::pending())
            .await
    }

    /// Polish a document, giving up when `cancel` completes.
    pub async fn polish_until<C>(&self, text: &str, requirements: &str, cancel: C) -> PolishOutcome
    where
        C: Future<Output = ()>,
    {
        if let Some(reason) = &self.unavailable {
            warn!(reason = %reason, "Polish backend unavailable, returning unpolished document");
            return PolishOutcome::Degraded {
                text: text.to_string(),
                reason: DegradeReason::Failed(reason.clone()),
            };
        }

        let Some(backend) = &self.backend else {
            debug!("Polishing disabled, returning document as assembled");
            return PolishOutcome::Passthrough {
                text: text.to_string(),
            };
        };

        let request = self.build_request(text, requirements);
        let call = tokio::time::timeout(self.timeout, backend.complete(request));

        let result = tokio::select! {
            result = call => result,
            _ = cancel => {
                return degrade(backend.as_ref(), text, DegradeReason::Cancelled);
            }
        };

        let response = match result {
            Err(_elapsed) => return degrade(backend.as_ref(), text, DegradeReason::TimedOut),
            Ok(Err(e)) => return degrade(backend.as_ref(), text, DegradeReason::Failed(e.to_string())),
            Ok(Ok(response)) => response,
        };

        if response.content.trim().is_empty() {
            return degrade(backend.as_ref(), text, DegradeReason::EmptyResponse);
        }
        if response.finish_reason == FinishReason::Length {
            return degrade(backend.as_ref(), text, DegradeReason::Truncated);
        }

        info!(
            provider = %backend.provider(),
            model = %backend.id(),
            tokens = response.usage.total(),
            "Document polished"
        );
        PolishOutcome::Polished {
            text: response.content,
            provider: backend.provider().to_string(),
            model: backend.id().to_string(),
            usage: response.usage,
        }
    }

    fn build_request(&self, text: &str, requirements: &str) -> CompletionRequest {
        let instructions = if requirements.trim().is_empty() {
            format!("{}\n\nContract:", INSTRUCTIONS)
        } else {
            format!(
                "{} Requirements: {}\n\nContract:",
                INSTRUCTIONS,
                requirements.trim()
            )
        };

        CompletionRequest::user(instructions)
            .with_message(Message::user(text))
            .with_system(SYSTEM_PROMPT)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }
}

fn degrade(backend: &dyn LlmBackend, text: &str, reason: DegradeReason) -> PolishOutcome {
    warn!(
        provider = %backend.provider(),
        model = %backend.id(),
        reason = %reason,
        "Polish failed, returning unpolished document"
    );
    PolishOutcome::Degraded {
        text: text.to_string(),
        reason,
    }
}
