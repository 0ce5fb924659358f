//! Configuration for the contract engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use clause_pack::PartySpec;
use contract_polish::PolishConfig;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Where jurisdiction packs are read from
    pub packs: PackConfig,
    /// Party defaults for scaffolds that do not name their own
    pub parties: PartyDefaults,
    /// Optional LLM polishing
    pub polish: PolishConfig,
}

impl EngineConfig {
    /// Config with packs under `root`.
    pub fn with_pack_root(root: impl Into<PathBuf>) -> Self {
        Self {
            packs: PackConfig {
                root: root.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Pack location and caching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Directory holding one sub-directory per jurisdiction
    pub root: PathBuf,
    /// Cache parsed resources for the life of the engine
    pub cache: bool,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("jurisdictions"),
            cache: true,
        }
    }
}

/// Preamble parties used when a scaffold names none.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyDefaults {
    pub primary: PartySpec,
    pub counterparty: PartySpec,
}

impl Default for PartyDefaults {
    fn default() -> Self {
        Self {
            primary: PartySpec::new(&["clientName"], "Company"),
            counterparty: PartySpec::new(&["otherPartyName"], "Counterparty"),
        }
    }
}
