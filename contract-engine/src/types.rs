//! Core types for contract assembly.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use clause_pack::{LegalStance, PackError, RiskLevel, SchemaViolation, SourceError};
use contract_polish::{DegradeReason, PolishOutcome};

use crate::compliance::Violation;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Preference profile used for variation selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub risk_tolerance: RiskLevel,
    #[serde(default)]
    pub legal_stance: LegalStance,
}

/// A request to assemble one contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct AssemblyRequest {
    /// Log correlation only; never reaches the document
    #[serde(default = "Uuid::new_v4")]
    #[cfg_attr(feature = "typescript", ts(type = "string"))]
    pub request_id: Uuid,
    /// Jurisdiction code, e.g. `us_ca`
    pub jurisdiction: String,
    /// Scaffold key, e.g. `employment_agreement`
    pub contract_type: String,
    /// Placeholder name to value
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub preferences: Preferences,
    /// Per-clause variation overrides
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    /// Date stamped into the preamble
    #[serde(default)]
    #[cfg_attr(feature = "typescript", ts(type = "string | null"))]
    pub effective_date: Option<NaiveDate>,
}

impl AssemblyRequest {
    /// Create a request with default preferences and no parameters.
    pub fn new(jurisdiction: impl Into<String>, contract_type: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            jurisdiction: jurisdiction.into(),
            contract_type: contract_type.into(),
            parameters: BTreeMap::new(),
            preferences: Preferences::default(),
            options: BTreeMap::new(),
            effective_date: None,
        }
    }

    /// Set a placeholder value.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Override the variation of one clause.
    pub fn with_option(mut self, clause_id: impl Into<String>, variation: impl Into<String>) -> Self {
        self.options.insert(clause_id.into(), variation.into());
        self
    }

    pub fn with_preferences(mut self, risk_tolerance: RiskLevel, legal_stance: LegalStance) -> Self {
        self.preferences = Preferences {
            risk_tolerance,
            legal_stance,
        };
        self
    }

    pub fn with_effective_date(mut self, date: NaiveDate) -> Self {
        self.effective_date = Some(date);
        self
    }
}

/// How a section's wording was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    /// Request option named the variation
    Explicit,
    /// Scaffold default named the variation
    ScaffoldDefault,
    /// Clause has no variations
    Base,
    /// Variation tags matched the preferences
    PreferenceMatch,
    /// First-defined variation
    Fallback,
}

/// One numbered section of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct SectionSummary {
    pub number: usize,
    pub clause_id: String,
    pub title: String,
    /// `None` for base text
    pub variation: Option<String>,
    pub source: SelectionSource,
}

/// A non-fatal problem found while assembling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssemblyWarning {
    /// Clause resolved to empty text and was left out
    EmptyClause { clause_id: String },
    /// Option or default named a variation the clause lacks
    UnknownVariation {
        clause_id: String,
        variation: String,
        from_request: bool,
    },
    /// Option named a clause the scaffold does not use
    UnusedOption { clause_id: String },
    /// Triggered exhibit whose file is missing
    MissingExhibit { exhibit: String, file: String },
}

impl std::fmt::Display for AssemblyWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyClause { clause_id } => {
                write!(f, "clause '{}' has no text and was skipped", clause_id)
            }
            Self::UnknownVariation {
                clause_id,
                variation,
                from_request,
            } => write!(
                f,
                "{} names unknown variation '{}' of clause '{}'",
                if *from_request { "option" } else { "scaffold default" },
                variation,
                clause_id
            ),
            Self::UnusedOption { clause_id } => {
                write!(f, "option for clause '{}' is not used by this contract", clause_id)
            }
            Self::MissingExhibit { exhibit, file } => {
                write!(f, "exhibit '{}' triggered but {} is missing", exhibit, file)
            }
        }
    }
}

/// Polish state of a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PolishStatus {
    #[default]
    NotRequested,
    /// Polishing disabled by configuration
    Passthrough,
    Polished { provider: String, model: String },
    Degraded { reason: DegradeReason },
}

impl PolishStatus {
    pub(crate) fn from_outcome(outcome: &PolishOutcome) -> Self {
        match outcome {
            PolishOutcome::Passthrough { .. } => Self::Passthrough,
            PolishOutcome::Polished {
                provider, model, ..
            } => Self::Polished {
                provider: provider.clone(),
                model: model.clone(),
            },
            PolishOutcome::Degraded { reason, .. } => Self::Degraded {
                reason: reason.clone(),
            },
        }
    }
}

/// The assembled contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct CompositionResult {
    pub text: String,
    /// Advisory violations; blocking ones abort assembly instead
    pub violations: Vec<Violation>,
    /// Unresolved placeholder names, first-seen order
    pub missing_placeholders: Vec<String>,
    pub warnings: Vec<AssemblyWarning>,
    pub sections: Vec<SectionSummary>,
    /// Keys of the attached exhibits, in order
    pub exhibits: Vec<String>,
    /// SHA-256 of `text`, hex
    pub fingerprint: String,
    pub polish: PolishStatus,
}

/// Error types for assembly.
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    /// Jurisdiction or contract type resource absent
    #[error("{resource} not found for jurisdiction '{jurisdiction}'")]
    NotFound {
        jurisdiction: String,
        resource: String,
    },

    /// Reference data failed validation
    #[error("Malformed {resource}: {}", join(.violations))]
    MalformedData {
        resource: String,
        violations: Vec<SchemaViolation>,
    },

    /// Blocking compliance violations
    #[error("Compliance check failed: {}", join(.violations))]
    Compliance { violations: Vec<Violation> },

    /// Pack source failure
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<PackError> for AssemblyError {
    fn from(err: PackError) -> Self {
        match err {
            PackError::NotFound {
                jurisdiction,
                resource,
            } => Self::NotFound {
                jurisdiction,
                resource,
            },
            PackError::MalformedData {
                jurisdiction,
                resource,
                violations,
            } => Self::MalformedData {
                resource: format!("{} for jurisdiction '{}'", resource, jurisdiction),
                violations,
            },
            PackError::Source(e) => Self::Source(e),
        }
    }
}

impl AssemblyError {
    /// Names of the violated rules, for compliance errors.
    pub fn violated_rules(&self) -> Vec<&str> {
        match self {
            Self::Compliance { violations } => violations.iter().map(|v| v.rule.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

/// Result type for assembly operations.
pub type Result<T> = std::result::Result<T, AssemblyError>;
