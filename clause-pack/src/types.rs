//! Core types for jurisdiction clause packs.
//!
//! These are the validated forms of the pack resources. Raw JSON is turned
//! into these types once, at load time, by [`crate::schema`].
//!
//! With the `typescript` feature enabled, these types can be exported to TypeScript
//! using ts-rs for consistency with the contract builder frontend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Risk profile of a clause variation.
///
/// Doubles as the risk tolerance a requester asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Conservative wording
    #[default]
    Low,
    /// Market-standard wording
    Medium,
    /// Aggressive wording
    High,
}

impl RiskLevel {
    /// Parse a resource or CLI value.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "standard" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Which party a variation's wording leans towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum LegalStance {
    /// Balanced between the parties
    #[default]
    Neutral,
    /// Favors the primary party (employer, client)
    #[serde(alias = "employer_favorable", alias = "company_favorable")]
    PrimaryFavorable,
    /// Favors the counterparty (employee, contractor)
    #[serde(alias = "employee_favorable", alias = "contractor_favorable")]
    CounterpartyFavorable,
}

impl LegalStance {
    /// Parse a resource or CLI value, accepting the party-specific aliases.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "neutral" | "balanced" => Some(Self::Neutral),
            "primary_favorable" | "employer_favorable" | "company_favorable" => {
                Some(Self::PrimaryFavorable)
            }
            "counterparty_favorable" | "employee_favorable" | "contractor_favorable" => {
                Some(Self::CounterpartyFavorable)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::PrimaryFavorable => "primary_favorable",
            Self::CounterpartyFavorable => "counterparty_favorable",
        }
    }
}

/// Tags used to match a variation against requester preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct VariationTags {
    pub risk_level: RiskLevel,
    pub legal_stance: LegalStance,
}

/// An alternate wording of a clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ClauseVariation {
    /// Key within the clause's variation map
    pub key: String,
    /// Section title; empty means "use the clause title"
    pub title: String,
    /// Wording, possibly containing placeholder tokens
    pub text: String,
    /// Untagged variations never match a preference profile
    pub tags: Option<VariationTags>,
}

/// A named, reusable fragment of contract text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ClauseDefinition {
    /// Unique within a library
    pub id: String,
    pub title: String,
    /// Base wording, used when the clause has no variations
    pub text: String,
    /// Clause category (e.g. `non_compete`), matched by category rules
    pub category: Option<String>,
    /// Variations in resource order
    pub variations: Vec<ClauseVariation>,
}

impl ClauseDefinition {
    /// Look up a variation by key.
    pub fn variation(&self, key: &str) -> Option<&ClauseVariation> {
        self.variations.iter().find(|v| v.key == key)
    }

    pub fn has_variations(&self) -> bool {
        !self.variations.is_empty()
    }
}

/// Bracket convention used by every clause of a library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderSyntax {
    /// `[Employee Name]`
    #[default]
    Square,
    /// `{{employeeName}}`, also written `${{employeeName}}`
    Handlebars,
}

impl PlaceholderSyntax {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "square" | "square_bracket" | "brackets" => Some(Self::Square),
            "handlebars" | "double_brace" | "mustache" => Some(Self::Handlebars),
            _ => None,
        }
    }

    pub fn all() -> [Self; 2] {
        [Self::Square, Self::Handlebars]
    }

    /// Regex matching one token; capture group 1 is the untrimmed name.
    pub fn token_pattern(&self) -> &'static str {
        match self {
            Self::Square => r"\[\s*([\w/][\w\s/]*)\]",
            Self::Handlebars => r"\$?\{\{\s*(\w+)\s*\}\}",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "square",
            Self::Handlebars => "handlebars",
        }
    }
}

/// A jurisdiction's clause library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseLibrary {
    pub jurisdiction: String,
    pub placeholder_syntax: PlaceholderSyntax,
    /// Clauses in resource order
    pub clauses: Vec<ClauseDefinition>,
}

impl ClauseLibrary {
    /// Look up a clause by identifier.
    pub fn clause(&self, id: &str) -> Option<&ClauseDefinition> {
        self.clauses.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.clause(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

/// One party named in the preamble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct PartySpec {
    /// Parameter names tried in order for the party's name
    pub parameters: Vec<String>,
    /// Defined term used in the preamble, e.g. "Company"
    pub label: String,
}

impl PartySpec {
    pub fn new(parameters: &[&str], label: impl Into<String>) -> Self {
        Self {
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            label: label.into(),
        }
    }
}

/// The ordered structure of a contract type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ContractScaffold {
    pub contract_type: String,
    pub title: String,
    /// Printed order of the clauses
    pub clause_order: Vec<String>,
    /// Default variation key per clause id
    pub default_options: BTreeMap<String, String>,
    /// Primary party override; engine defaults apply when absent
    pub primary_party: Option<PartySpec>,
    /// Counterparty override; engine defaults apply when absent
    pub counterparty: Option<PartySpec>,
}

impl ContractScaffold {
    /// Default variation key for a clause, if the scaffold names one.
    pub fn default_option(&self, clause_id: &str) -> Option<&str> {
        self.default_options.get(clause_id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stance_aliases() {
        assert_eq!(
            LegalStance::parse("employer_favorable"),
            Some(LegalStance::PrimaryFavorable)
        );
        assert_eq!(
            LegalStance::parse("Employee_Favorable"),
            Some(LegalStance::CounterpartyFavorable)
        );
        assert_eq!(LegalStance::parse("hostile"), None);

        let stance: LegalStance = serde_json::from_str("\"employee_favorable\"").unwrap();
        assert_eq!(stance, LegalStance::CounterpartyFavorable);
    }

    #[test]
    fn test_risk_defaults() {
        assert_eq!(RiskLevel::default(), RiskLevel::Low);
        assert_eq!(LegalStance::default(), LegalStance::Neutral);
        assert_eq!(RiskLevel::parse("HIGH"), Some(RiskLevel::High));
    }

    #[test]
    fn test_variation_lookup() {
        let clause = ClauseDefinition {
            id: "term".to_string(),
            title: "Term".to_string(),
            text: "At will.".to_string(),
            category: None,
            variations: vec![ClauseVariation {
                key: "fixed".to_string(),
                title: String::new(),
                text: "Two years.".to_string(),
                tags: None,
            }],
        };

        assert!(clause.has_variations());
        assert_eq!(clause.variation("fixed").map(|v| v.text.as_str()), Some("Two years."));
        assert!(clause.variation("missing").is_none());
    }
}
