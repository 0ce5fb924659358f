//! Jurisdiction rule profiles.
//!
//! A rule profile tells the compliance validator which checks apply in a
//! jurisdiction. Profiles come from a pack's `ruleset.yaml`, or from the
//! built-in profile for the jurisdiction code when the pack has none.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// How a compliance finding affects assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Aborts assembly
    #[default]
    Blocking,
    /// Recorded alongside a successful result
    Advisory,
}

impl Severity {
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Blocking)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocking => "blocking",
            Self::Advisory => "advisory",
        }
    }
}

/// Condition under which an exhibit is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhibitTrigger {
    /// Always attach
    Always,
    /// Attach when the named parameter is truthy
    Parameter(String),
    /// Attach when the scaffold contains the clause
    Clause(String),
    /// Any of the nested triggers
    AnyOf(Vec<ExhibitTrigger>),
    /// All of the nested triggers
    AllOf(Vec<ExhibitTrigger>),
}

impl ExhibitTrigger {
    /// Evaluate against request parameters and the scaffold's clause ids.
    pub fn fires(&self, parameters: &BTreeMap<String, String>, clause_ids: &[String]) -> bool {
        match self {
            Self::Always => true,
            Self::Parameter(name) => parameters
                .get(name)
                .map(|value| is_truthy(value))
                .unwrap_or(false),
            Self::Clause(id) => clause_ids.iter().any(|c| c == id),
            Self::AnyOf(triggers) => triggers.iter().any(|t| t.fires(parameters, clause_ids)),
            Self::AllOf(triggers) => triggers.iter().all(|t| t.fires(parameters, clause_ids)),
        }
    }
}

/// Truthiness of a string parameter (`true`, `yes`, `y`, `1`).
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1"
    )
}

/// An exhibit that must accompany a contract when its trigger fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExhibitRequirement {
    /// Key in the pack's exhibit catalog
    pub exhibit: String,
    pub trigger: ExhibitTrigger,
    /// Shown in the violation when the exhibit is missing
    #[serde(default)]
    pub reason: Option<String>,
}

/// A custom text-scan rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRule {
    pub name: String,
    pub terms: Vec<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub message: Option<String>,
}

/// Compliance configuration for one jurisdiction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Display name, e.g. "California"
    #[serde(default)]
    pub name: Option<String>,
    /// Enables the competition-restriction rule
    #[serde(default)]
    pub restricts_post_employment_competition: bool,
    #[serde(default = "default_competition_terms")]
    pub competition_terms: Vec<String>,
    #[serde(default = "default_disclaimer_terms")]
    pub disclaimer_terms: Vec<String>,
    /// Clause categories that may not appear in a scaffold
    #[serde(default)]
    pub forbidden_categories: Vec<String>,
    #[serde(default)]
    pub forbidden_terms: Vec<TermRule>,
    #[serde(default)]
    pub mandatory_exhibits: Vec<ExhibitRequirement>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            name: None,
            restricts_post_employment_competition: false,
            competition_terms: default_competition_terms(),
            disclaimer_terms: default_disclaimer_terms(),
            forbidden_categories: Vec::new(),
            forbidden_terms: Vec::new(),
            mandatory_exhibits: Vec::new(),
        }
    }
}

impl RuleSet {
    /// Load a rule profile from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Whether clauses of `category` are forbidden here.
    pub fn forbids_category(&self, category: &str) -> bool {
        self.forbidden_categories
            .iter()
            .any(|forbidden| category_matches(forbidden, category))
    }
}

/// Clause categories compare ASCII case-insensitively.
pub fn category_matches(forbidden: &str, category: &str) -> bool {
    forbidden.eq_ignore_ascii_case(category)
}

/// Terminology that signals a post-employment competition restriction.
pub fn default_competition_terms() -> Vec<String> {
    [
        "non-compete",
        "noncompete",
        "non-competition",
        "covenant not to compete",
    ]
    .iter()
    .map(|t| t.to_string())
    .collect()
}

/// Terminology that belongs only in the trailing disclaimer section.
pub fn default_disclaimer_terms() -> Vec<String> {
    ["legal disclaimer", "does not constitute legal advice"]
        .iter()
        .map(|t| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_trigger_evaluation() {
        let clauses = vec!["ip_assignment".to_string()];
        let trigger = ExhibitTrigger::Parameter("ipAssignment".to_string());

        assert!(trigger.fires(&params(&[("ipAssignment", "Yes")]), &[]));
        assert!(trigger.fires(&params(&[("ipAssignment", "true")]), &[]));
        assert!(!trigger.fires(&params(&[("ipAssignment", "no")]), &[]));
        assert!(!trigger.fires(&params(&[]), &[]));

        let any = ExhibitTrigger::AnyOf(vec![
            trigger.clone(),
            ExhibitTrigger::Clause("ip_assignment".to_string()),
        ]);
        assert!(any.fires(&params(&[]), &clauses));

        let all = ExhibitTrigger::AllOf(vec![
            trigger,
            ExhibitTrigger::Clause("ip_assignment".to_string()),
        ]);
        assert!(!all.fires(&params(&[]), &clauses));
    }

    #[test]
    fn test_ruleset_yaml_defaults() {
        let yaml = r#"
name: California
restricts_post_employment_competition: true
forbidden_categories: [non_compete]
mandatory_exhibits:
  - exhibit: ip_notice
    trigger:
      parameter: ipAssignment
"#;
        let ruleset = RuleSet::from_yaml(yaml).unwrap();

        assert!(ruleset.restricts_post_employment_competition);
        assert!(ruleset.competition_terms.contains(&"non-compete".to_string()));
        assert_eq!(ruleset.mandatory_exhibits.len(), 1);
        assert_eq!(
            ruleset.mandatory_exhibits[0].trigger,
            ExhibitTrigger::Parameter("ipAssignment".to_string())
        );
        assert_eq!(ruleset.forbidden_terms.len(), 0);
    }

    #[test]
    fn test_forbidden_category_ignores_case() {
        let ruleset = RuleSet {
            forbidden_categories: vec!["non_compete".to_string()],
            ..Default::default()
        };
        assert!(ruleset.forbids_category("Non_Compete"));
        assert!(ruleset.forbids_category("non_compete"));
        assert!(!ruleset.forbids_category("confidentiality"));
    }

    #[test]
    fn test_severity() {
        assert!(Severity::Blocking.is_blocking());
        assert!(!Severity::Advisory.is_blocking());
        assert_eq!(Severity::default(), Severity::Blocking);
    }
}
