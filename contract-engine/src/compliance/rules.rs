//! Built-in compliance rules.

use clause_pack::{category_matches, Severity, TermRule};

use crate::compliance::{find_term, ComplianceInput, ComplianceRule, Phase, Violation};

/// Blocks post-employment competition restrictions.
pub struct CompetitionRestriction {
    terms: Vec<String>,
}

impl CompetitionRestriction {
    pub fn new(terms: Vec<String>) -> Self {
        Self { terms }
    }

    fn violation(&self, phase: Phase, term: &str, place: &str) -> Violation {
        Violation::new(
            self.name(),
            Severity::Blocking,
            phase,
            format!(
                "Post-employment competition restrictions are void in this jurisdiction ('{}' found in {})",
                term, place
            ),
        )
        .with_matched_term(term)
    }
}

impl ComplianceRule for CompetitionRestriction {
    fn name(&self) -> &str {
        "competition_restriction"
    }

    fn check_input(&self, input: &ComplianceInput<'_>) -> Vec<Violation> {
        find_term(&input.raw_corpus(), &self.terms)
            .map(|term| vec![self.violation(Phase::Input, term, "request inputs")])
            .unwrap_or_default()
    }

    fn check_output(&self, body: &str) -> Vec<Violation> {
        find_term(&body.to_lowercase(), &self.terms)
            .map(|term| vec![self.violation(Phase::Output, term, "contract body")])
            .unwrap_or_default()
    }
}

/// Blocks scaffold clauses of forbidden categories.
pub struct ForbiddenCategory {
    categories: Vec<String>,
}

impl ForbiddenCategory {
    pub fn new(categories: Vec<String>) -> Self {
        Self { categories }
    }
}

impl ComplianceRule for ForbiddenCategory {
    fn name(&self) -> &str {
        "forbidden_clause_category"
    }

    fn check_input(&self, input: &ComplianceInput<'_>) -> Vec<Violation> {
        input
            .clauses
            .iter()
            .filter_map(|clause| {
                let category = clause.category.as_deref()?;
                self.categories
                    .iter()
                    .any(|c| category_matches(c, category))
                    .then(|| {
                        Violation::new(
                            self.name(),
                            Severity::Blocking,
                            Phase::Input,
                            format!(
                                "Clause '{}' has category '{}', which is not permitted in {}",
                                clause.id, category, input.jurisdiction
                            ),
                        )
                        .with_matched_term(category)
                    })
            })
            .collect()
    }
}

/// Keeps disclaimer language out of substantive clauses.
pub struct DisclaimerInBody {
    terms: Vec<String>,
}

impl DisclaimerInBody {
    pub fn new(terms: Vec<String>) -> Self {
        Self { terms }
    }

    fn violation(&self, phase: Phase, term: &str) -> Violation {
        Violation::new(
            self.name(),
            Severity::Blocking,
            phase,
            format!(
                "Disclaimer language ('{}') belongs only in the trailing disclaimer section",
                term
            ),
        )
        .with_matched_term(term)
    }
}

impl ComplianceRule for DisclaimerInBody {
    fn name(&self) -> &str {
        "disclaimer_in_body"
    }

    fn check_input(&self, input: &ComplianceInput<'_>) -> Vec<Violation> {
        find_term(&input.raw_corpus(), &self.terms)
            .map(|term| vec![self.violation(Phase::Input, term)])
            .unwrap_or_default()
    }

    fn check_output(&self, body: &str) -> Vec<Violation> {
        find_term(&body.to_lowercase(), &self.terms)
            .map(|term| vec![self.violation(Phase::Output, term)])
            .unwrap_or_default()
    }
}

/// Profile-defined term scan with its own severity.
pub struct ForbiddenTerms {
    name: String,
    terms: Vec<String>,
    severity: Severity,
    message: Option<String>,
}

impl ForbiddenTerms {
    pub fn from_rule(rule: &TermRule) -> Self {
        Self {
            name: rule.name.clone(),
            terms: rule.terms.clone(),
            severity: rule.severity,
            message: rule.message.clone(),
        }
    }

    fn violation(&self, phase: Phase, term: &str) -> Violation {
        let message = self
            .message
            .clone()
            .unwrap_or_else(|| format!("Term '{}' is not permitted", term));
        Violation::new(self.name.clone(), self.severity, phase, message).with_matched_term(term)
    }
}

impl ComplianceRule for ForbiddenTerms {
    fn name(&self) -> &str {
        &self.name
    }

    fn check_input(&self, input: &ComplianceInput<'_>) -> Vec<Violation> {
        find_term(&input.raw_corpus(), &self.terms)
            .map(|term| vec![self.violation(Phase::Input, term)])
            .unwrap_or_default()
    }

    fn check_output(&self, body: &str) -> Vec<Violation> {
        find_term(&body.to_lowercase(), &self.terms)
            .map(|term| vec![self.violation(Phase::Output, term)])
            .unwrap_or_default()
    }
}
