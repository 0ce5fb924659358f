//! Compliance validation.
//!
//! Rules run in two phases:
//! - **Input**: raw parameters, options and the scaffold's clauses, before
//!   any text is substituted
//! - **Output**: the assembled body, without the disclaimer section
//!
//! Both phases are mandatory. The rule set of a jurisdiction is built from
//! its rule profile.

mod rules;

pub use rules::{CompetitionRestriction, DisclaimerInBody, ForbiddenCategory, ForbiddenTerms};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use clause_pack::{ClauseDefinition, RuleSet, Severity};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// When a violation was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Input,
    Output,
}

/// A compliance finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Violation {
    /// Rule name, e.g. `competition_restriction`
    pub rule: String,
    pub severity: Severity,
    pub phase: Phase,
    pub message: String,
    /// Term or category that triggered the rule
    pub matched_term: Option<String>,
}

impl Violation {
    pub fn new(
        rule: impl Into<String>,
        severity: Severity,
        phase: Phase,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule: rule.into(),
            severity,
            phase,
            message: message.into(),
            matched_term: None,
        }
    }

    pub fn with_matched_term(mut self, term: impl Into<String>) -> Self {
        self.matched_term = Some(term.into());
        self
    }

    pub fn is_blocking(&self) -> bool {
        self.severity.is_blocking()
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.rule, self.message)
    }
}

/// What input-phase rules see.
#[derive(Debug, Clone, Copy)]
pub struct ComplianceInput<'a> {
    pub jurisdiction: &'a str,
    pub contract_type: &'a str,
    pub parameters: &'a BTreeMap<String, String>,
    pub options: &'a BTreeMap<String, String>,
    /// Clauses of the scaffold, in order
    pub clauses: &'a [&'a ClauseDefinition],
}

impl ComplianceInput<'_> {
    /// Lowercased parameter and option names and values.
    pub fn raw_corpus(&self) -> String {
        let mut corpus = String::new();
        for (key, value) in self.parameters.iter().chain(self.options.iter()) {
            corpus.push_str(key);
            corpus.push('=');
            corpus.push_str(value);
            corpus.push('\n');
        }
        corpus.to_lowercase()
    }
}

/// Common trait for compliance rules.
pub trait ComplianceRule: Send + Sync {
    /// Name of the rule, reported in violations.
    fn name(&self) -> &str;

    /// Checks on raw request data.
    fn check_input(&self, _input: &ComplianceInput<'_>) -> Vec<Violation> {
        Vec::new()
    }

    /// Checks on the assembled body (disclaimer excluded).
    fn check_output(&self, _body: &str) -> Vec<Violation> {
        Vec::new()
    }
}

/// First term found in an already-lowercased haystack.
pub(crate) fn find_term<'t>(haystack_lower: &str, terms: &'t [String]) -> Option<&'t str> {
    terms
        .iter()
        .map(String::as_str)
        .filter(|t| !t.trim().is_empty())
        .find(|t| haystack_lower.contains(&t.to_lowercase()))
}

/// Runs a jurisdiction's rules.
pub struct ComplianceValidator {
    rules: Vec<Box<dyn ComplianceRule>>,
}

impl ComplianceValidator {
    /// Build the rules a profile enables.
    pub fn for_ruleset(ruleset: &RuleSet) -> Self {
        let mut rules: Vec<Box<dyn ComplianceRule>> = Vec::new();

        if ruleset.restricts_post_employment_competition {
            rules.push(Box::new(CompetitionRestriction::new(
                ruleset.competition_terms.clone(),
            )));
        }
        if !ruleset.forbidden_categories.is_empty() {
            rules.push(Box::new(ForbiddenCategory::new(
                ruleset.forbidden_categories.clone(),
            )));
        }
        rules.push(Box::new(DisclaimerInBody::new(
            ruleset.disclaimer_terms.clone(),
        )));
        for term_rule in &ruleset.forbidden_terms {
            rules.push(Box::new(ForbiddenTerms::from_rule(term_rule)));
        }

        Self { rules }
    }

    /// Validator with explicit rules.
    pub fn with_rules(rules: Vec<Box<dyn ComplianceRule>>) -> Self {
        Self { rules }
    }

    /// Add a rule.
    pub fn push_rule(&mut self, rule: Box<dyn ComplianceRule>) {
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Input phase: every rule's input checks.
    pub fn validate_input(&self, input: &ComplianceInput<'_>) -> Vec<Violation> {
        let violations = self.collect(|rule| rule.check_input(input));
        debug!(
            jurisdiction = %input.jurisdiction,
            contract_type = %input.contract_type,
            violations = violations.len(),
            "Input compliance checked"
        );
        violations
    }

    /// Output phase: every rule's body checks.
    pub fn validate_output(&self, body: &str) -> Vec<Violation> {
        self.collect(|rule| rule.check_output(body))
    }

    /// Both phases, input first.
    pub fn validate(&self, input: &ComplianceInput<'_>, assembled_text: &str) -> Vec<Violation> {
        let mut violations = self.validate_input(input);
        violations.extend(self.validate_output(assembled_text));
        violations
    }

    fn collect(&self, check: impl Fn(&dyn ComplianceRule) -> Vec<Violation>) -> Vec<Violation> {
        let mut violations = Vec::new();
        for rule in &self.rules {
            for violation in check(rule.as_ref()) {
                if !violation.is_blocking() {
                    warn!(rule = %violation.rule, message = %violation.message, "Advisory compliance finding");
                }
                violations.push(violation);
            }
        }
        violations
    }
}

/// Split findings into (blocking, advisory).
pub fn partition(violations: Vec<Violation>) -> (Vec<Violation>, Vec<Violation>) {
    violations.into_iter().partition(Violation::is_blocking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clause_pack::builtin_ruleset;

    fn input<'a>(
        parameters: &'a BTreeMap<String, String>,
        options: &'a BTreeMap<String, String>,
        clauses: &'a [&'a ClauseDefinition],
    ) -> ComplianceInput<'a> {
        ComplianceInput {
            jurisdiction: "us_ca",
            contract_type: "employment_agreement",
            parameters,
            options,
            clauses,
        }
    }

    #[test]
    fn test_california_rules() {
        let validator = ComplianceValidator::for_ruleset(&builtin_ruleset("us_ca"));
        assert_eq!(
            validator.rule_names(),
            vec!["competition_restriction", "forbidden_clause_category", "disclaimer_in_body"]
        );

        let texas = ComplianceValidator::for_ruleset(&builtin_ruleset("us_tx"));
        assert_eq!(texas.rule_names(), vec!["disclaimer_in_body"]);
    }

    #[test]
    fn test_input_phase_collects_all() {
        let validator = ComplianceValidator::for_ruleset(&builtin_ruleset("us_ca"));
        let parameters: BTreeMap<String, String> = [
            ("restriction".to_string(), "12 month Non-Compete".to_string()),
            ("note".to_string(), "Legal Disclaimer attached".to_string()),
        ]
        .into_iter()
        .collect();
        let options = BTreeMap::new();

        let violations = validator.validate_input(&input(&parameters, &options, &[]));
        let rules: Vec<&str> = violations.iter().map(|v| v.rule.as_str()).collect();

        assert_eq!(rules, vec!["competition_restriction", "disclaimer_in_body"]);
        assert!(violations.iter().all(|v| v.phase == Phase::Input && v.is_blocking()));
        assert_eq!(violations[0].matched_term.as_deref(), Some("non-compete"));
    }

    #[test]
    fn test_output_phase() {
        let validator = ComplianceValidator::for_ruleset(&builtin_ruleset("us_ca"));
        let violations =
            validator.validate_output("## 3. Restrictions\n\nEmployee signs a covenant not to compete.");

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].phase, Phase::Output);
        assert_eq!(violations[0].rule, "competition_restriction");

        assert!(validator.validate_output("## 1. Term\n\nAt will.").is_empty());
    }

    #[test]
    fn test_partition() {
        let (blocking, advisory) = partition(vec![
            Violation::new("a", Severity::Blocking, Phase::Input, "x"),
            Violation::new("b", Severity::Advisory, Phase::Input, "y"),
        ]);
        assert_eq!(blocking.len(), 1);
        assert_eq!(advisory[0].rule, "b");
    }
}
