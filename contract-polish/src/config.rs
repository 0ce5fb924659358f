//! Configuration for contract polishing.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::backend::ollama::OLLAMA_DEFAULT_HOST;
use crate::backend::openai::{GROQ_BASE_URL, LMSTUDIO_BASE_URL, OPENAI_BASE_URL};

/// Which service polishes contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolishProvider {
    /// No polishing; the document is returned as assembled
    #[default]
    #[serde(alias = "null")]
    None,
    Groq,
    #[serde(alias = "open_ai")]
    OpenAi,
    #[serde(alias = "lm_studio")]
    LmStudio,
    Ollama,
    /// Echoes the document back; for demos and tests
    Mock,
}

impl PolishProvider {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "null" => Some(Self::None),
            "groq" => Some(Self::Groq),
            "openai" | "open_ai" => Some(Self::OpenAi),
            "lmstudio" | "lm_studio" => Some(Self::LmStudio),
            "ollama" => Some(Self::Ollama),
            "mock" => Some(Self::Mock),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Groq => "groq",
            Self::OpenAi => "openai",
            Self::LmStudio => "lmstudio",
            Self::Ollama => "ollama",
            Self::Mock => "mock",
        }
    }

    /// Model used when the configuration names none.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Groq => "llama-3-8b-instant",
            Self::OpenAi => "gpt-4o-mini",
            Self::LmStudio => "local-model",
            Self::Ollama => "llama3:8b",
            Self::Mock => "mock",
        }
    }

    /// Endpoint used when the configuration names none.
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Self::Groq => Some(GROQ_BASE_URL),
            Self::OpenAi => Some(OPENAI_BASE_URL),
            Self::LmStudio => Some(LMSTUDIO_BASE_URL),
            Self::Ollama => Some(OLLAMA_DEFAULT_HOST),
            Self::None | Self::Mock => None,
        }
    }

    /// Whether the provider refuses to run without an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::Groq | Self::OpenAi)
    }
}

/// Polish configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolishConfig {
    pub provider: PolishProvider,
    /// Model name; provider default when absent
    pub model: Option<String>,
    pub api_key: Option<String>,
    /// Endpoint override; provider default when absent
    pub base_url: Option<String>,
    /// Upper bound on one polish call (ms)
    pub timeout_ms: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for PolishConfig {
    fn default() -> Self {
        Self {
            provider: PolishProvider::None,
            model: None,
            api_key: None,
            base_url: None,
            timeout_ms: 30_000,
            temperature: 0.3,
            max_tokens: 2000,
        }
    }
}

impl PolishConfig {
    /// Config for a provider with its defaults.
    pub fn new(provider: PolishProvider) -> Self {
        Self {
            provider,
            ..Default::default()
        }
    }

    /// Read the process environment.
    ///
    /// `LLM_PROVIDER` selects the provider; per-provider variables supply
    /// model, key and host. Unknown providers fall back to `none`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let provider = match var("LLM_PROVIDER") {
            Some(raw) => PolishProvider::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(provider = %raw, "Unknown LLM provider, polishing disabled");
                PolishProvider::None
            }),
            None => PolishProvider::None,
        };

        let (model, api_key, base_url) = match provider {
            PolishProvider::Groq => (var("GROQ_MODEL"), var("GROQ_API_KEY"), None),
            PolishProvider::OpenAi => (var("OPENAI_MODEL"), var("OPENAI_API_KEY"), None),
            PolishProvider::LmStudio => (var("LMSTUDIO_MODEL"), None, var("LMSTUDIO_HOST")),
            PolishProvider::Ollama => (var("OLLAMA_MODEL"), None, var("OLLAMA_HOST")),
            PolishProvider::None | PolishProvider::Mock => (None, None, None),
        };

        let mut config = Self {
            provider,
            model,
            api_key,
            base_url,
            ..Default::default()
        };
        if let Some(timeout_ms) = var("LLM_TIMEOUT_MS").and_then(|v| v.trim().parse().ok()) {
            config.timeout_ms = timeout_ms;
        }
        config
    }

    /// Model to request.
    pub fn resolved_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Endpoint to call, if the provider has one.
    pub fn resolved_base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .or_else(|| self.provider.default_base_url())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn is_enabled(&self) -> bool {
        self.provider != PolishProvider::None
    }
}
