//! Whole-pack validation.
//!
//! Checks every resource of a jurisdiction pack in one pass and reports
//! errors and warnings together, so a pack author can fix a pack before any
//! contract is assembled from it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::exhibits::ExhibitCatalog;
use crate::jurisdictions::builtin_ruleset;
use crate::ruleset::RuleSet;
use crate::schema;
use crate::source::{PackResource, PackSource, SourceError};
use crate::types::{ClauseLibrary, PlaceholderSyntax};

/// Result of validating one jurisdiction pack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub jurisdiction: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn new(jurisdiction: &str) -> Self {
        Self {
            jurisdiction: jurisdiction.to_string(),
            ..Default::default()
        }
    }

    /// True when the pack has no errors. Warnings do not fail a pack.
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pack: {}", self.jurisdiction)?;
        for error in &self.errors {
            writeln!(f, "  error: {}", error)?;
        }
        for warning in &self.warnings {
            writeln!(f, "  warning: {}", warning)?;
        }
        match (self.errors.is_empty(), self.warnings.is_empty()) {
            (true, true) => write!(f, "Pack validation passed."),
            (true, false) => write!(f, "Pack validation passed with warnings."),
            (false, _) => write!(f, "Pack validation failed."),
        }
    }
}

/// Validates jurisdiction packs read from a source.
///
/// Reads resources directly rather than through the loader cache, so a
/// report always reflects the pack as it is now.
pub struct PackValidator {
    source: Arc<dyn PackSource>,
}

impl PackValidator {
    pub fn new(source: Arc<dyn PackSource>) -> Self {
        Self { source }
    }

    /// Validate one jurisdiction pack.
    ///
    /// Only source failures are errors of this call; everything wrong with
    /// the pack itself is reported in the [`ValidationReport`].
    pub async fn validate(&self, jurisdiction: &str) -> Result<ValidationReport, SourceError> {
        let mut report = ValidationReport::new(jurisdiction);

        let library = self.check_library(jurisdiction, &mut report).await?;
        self.check_disclaimer(jurisdiction, &mut report).await?;
        self.check_scaffolds(jurisdiction, library.as_ref(), &mut report)
            .await?;
        let ruleset = self.check_ruleset(jurisdiction, &mut report).await?;
        let catalog = self.check_exhibits(jurisdiction, &mut report).await?;

        if let Some(library) = &library {
            check_placeholder_conventions(library, &mut report);
            self.check_compliance(jurisdiction, library, &ruleset, &catalog, &mut report)
                .await?;
        }

        info!(
            jurisdiction = %jurisdiction,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "Validated pack"
        );
        Ok(report)
    }

    /// Validate every jurisdiction the source knows.
    pub async fn validate_all(&self) -> Result<Vec<ValidationReport>, SourceError> {
        let mut reports = Vec::new();
        for jurisdiction in self.source.jurisdictions().await? {
            reports.push(self.validate(&jurisdiction).await?);
        }
        Ok(reports)
    }

    async fn check_library(
        &self,
        jurisdiction: &str,
        report: &mut ValidationReport,
    ) -> Result<Option<ClauseLibrary>, SourceError> {
        let resource = PackResource::ClauseLibrary;
        let Some(raw) = self.source.read(jurisdiction, &resource).await? else {
            report.error(format!("Required file missing: {}", resource.file_name()));
            return Ok(None);
        };

        match schema::parse_library(jurisdiction, &raw) {
            Ok(library) => Ok(Some(library)),
            Err(violations) => {
                for violation in violations {
                    report.error(format!("{}: {}", resource.file_name(), violation));
                }
                Ok(None)
            }
        }
    }

    async fn check_disclaimer(
        &self,
        jurisdiction: &str,
        report: &mut ValidationReport,
    ) -> Result<(), SourceError> {
        let resource = PackResource::Disclaimer;
        if self.source.read(jurisdiction, &resource).await?.is_some() {
            return Ok(());
        }
        if self.source.read_shared(&resource).await?.is_some() {
            debug!(jurisdiction = %jurisdiction, "Pack uses the shared disclaimer");
            return Ok(());
        }
        report.error(format!("Required file missing: {}", resource.file_name()));
        Ok(())
    }

    async fn check_scaffolds(
        &self,
        jurisdiction: &str,
        library: Option<&ClauseLibrary>,
        report: &mut ValidationReport,
    ) -> Result<(), SourceError> {
        let contract_types = self.source.contract_types(jurisdiction).await?;
        if contract_types.is_empty() {
            report.error("No contract templates found (contract_*.json)");
            return Ok(());
        }

        for contract_type in contract_types {
            let resource = PackResource::Scaffold(contract_type.clone());
            let file = resource.file_name();
            let Some(raw) = self.source.read(jurisdiction, &resource).await? else {
                continue;
            };

            let scaffold = match schema::parse_scaffold(&contract_type, &raw) {
                Ok(scaffold) => scaffold,
                Err(violations) => {
                    for violation in violations {
                        report.error(format!("{}: {}", file, violation));
                    }
                    continue;
                }
            };

            let Some(library) = library else { continue };
            for clause_id in &scaffold.clause_order {
                if !library.contains(clause_id) {
                    report.warning(format!("{}: References unknown clause: {}", file, clause_id));
                }
            }
            for (clause_id, key) in &scaffold.default_options {
                let known = library
                    .clause(clause_id)
                    .map(|clause| clause.variation(key).is_some())
                    .unwrap_or(false);
                if !known {
                    report.warning(format!(
                        "{}: Default option '{}' does not name a variation of {}",
                        file, key, clause_id
                    ));
                }
            }
        }
        Ok(())
    }

    async fn check_ruleset(
        &self,
        jurisdiction: &str,
        report: &mut ValidationReport,
    ) -> Result<RuleSet, SourceError> {
        let resource = PackResource::RuleSet;
        let Some(raw) = self.source.read(jurisdiction, &resource).await? else {
            return Ok(builtin_ruleset(jurisdiction));
        };

        match schema::parse_ruleset(&raw) {
            Ok(ruleset) => Ok(ruleset),
            Err(violations) => {
                for violation in violations {
                    report.error(format!("{}: {}", resource.file_name(), violation));
                }
                Ok(builtin_ruleset(jurisdiction))
            }
        }
    }

    async fn check_exhibits(
        &self,
        jurisdiction: &str,
        report: &mut ValidationReport,
    ) -> Result<ExhibitCatalog, SourceError> {
        let resource = PackResource::ExhibitCatalog;
        let Some(raw) = self.source.read(jurisdiction, &resource).await? else {
            return Ok(ExhibitCatalog::default());
        };

        let catalog = match schema::parse_exhibit_catalog(&raw) {
            Ok(catalog) => catalog,
            Err(violations) => {
                for violation in violations {
                    report.error(format!("{}: {}", resource.file_name(), violation));
                }
                return Ok(ExhibitCatalog::default());
            }
        };

        for entry in &catalog.entries {
            if !self.exhibit_exists(jurisdiction, &entry.file).await? {
                report.warning(format!(
                    "Exhibit file not found: {} (referenced by {})",
                    entry.file, entry.key
                ));
            }
        }
        Ok(catalog)
    }

    async fn check_compliance(
        &self,
        jurisdiction: &str,
        library: &ClauseLibrary,
        ruleset: &RuleSet,
        catalog: &ExhibitCatalog,
        report: &mut ValidationReport,
    ) -> Result<(), SourceError> {
        let label = ruleset.name.as_deref().unwrap_or(jurisdiction);

        if ruleset.restricts_post_employment_competition {
            let corpus = library_corpus(library);
            if let Some(term) = ruleset
                .competition_terms
                .iter()
                .find(|term| corpus.contains(&term.to_lowercase()))
            {
                report.warning(format!(
                    "{}: Competition-restriction language detected ('{}'), assembly will block contracts using it",
                    label, term
                ));
            }
        }

        for clause in &library.clauses {
            if let Some(category) = clause
                .category
                .as_deref()
                .filter(|c| ruleset.forbids_category(c))
            {
                report.warning(format!(
                    "{}: Clause {} has forbidden category '{}'",
                    label, clause.id, category
                ));
            }
        }

        // A requirement matters here when the library alone can fire it
        let clause_ids: Vec<String> = library.clauses.iter().map(|c| c.id.clone()).collect();
        let no_parameters = BTreeMap::new();
        for requirement in &ruleset.mandatory_exhibits {
            if !requirement.trigger.fires(&no_parameters, &clause_ids) {
                continue;
            }
            let attachable = match catalog.get(&requirement.exhibit) {
                Some(entry) => self.exhibit_exists(jurisdiction, &entry.file).await?,
                None => false,
            };
            if !attachable {
                report.warning(format!(
                    "{}: Clauses require exhibit '{}' but the pack cannot attach it",
                    label, requirement.exhibit
                ));
            }
        }
        Ok(())
    }

    async fn exhibit_exists(&self, jurisdiction: &str, file: &str) -> Result<bool, SourceError> {
        match self
            .source
            .read(jurisdiction, &PackResource::Exhibit(file.to_string()))
            .await
        {
            Ok(body) => Ok(body.is_some()),
            Err(SourceError::InvalidResource(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Every title and text of a library, lowercased.
fn library_corpus(library: &ClauseLibrary) -> String {
    let mut corpus = String::new();
    for clause in &library.clauses {
        corpus.push_str(&clause.title);
        corpus.push('\n');
        corpus.push_str(&clause.text);
        corpus.push('\n');
        for variation in &clause.variations {
            corpus.push_str(&variation.title);
            corpus.push('\n');
            corpus.push_str(&variation.text);
            corpus.push('\n');
        }
    }
    corpus.to_lowercase()
}

/// Warn about clauses carrying tokens of a convention the library does not use.
fn check_placeholder_conventions(library: &ClauseLibrary, report: &mut ValidationReport) {
    for syntax in PlaceholderSyntax::all() {
        if syntax == library.placeholder_syntax {
            continue;
        }
        let Ok(pattern) = Regex::new(syntax.token_pattern()) else {
            continue;
        };

        for clause in &library.clauses {
            let texts = std::iter::once(clause.text.as_str())
                .chain(clause.variations.iter().map(|v| v.text.as_str()));
            if texts.into_iter().any(|text| pattern.is_match(text)) {
                report.warning(format!(
                    "Clause {}: Mixed placeholder conventions ({} tokens in a {} library are left as-is)",
                    clause.id,
                    syntax.as_str(),
                    library.placeholder_syntax.as_str()
                ));
            }
        }
    }
}
