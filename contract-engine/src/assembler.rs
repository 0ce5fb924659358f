//! DocumentAssembler - turns a request into a finished contract.
//!
//! Assembly runs in a fixed order:
//!
//! ```text
//! load scaffold + library ─► input compliance ─► select + substitute
//!        │                                              │
//!        ▼                                              ▼
//!  MalformedData/NotFound                    exhibits + parties + date
//!                                                       │
//!                        disclaimer ◄─ output compliance ◄─ render body
//! ```
//!
//! The same request against the same packs always yields byte-identical
//! text. Polishing is a separate, optional step after assembly.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use clause_pack::{
    ClauseDefinition, ContractScaffold, FsPackSource, PackLoader, PackSource, PartySpec,
};
use contract_polish::{PolishOutcome, Polisher};

use crate::compliance::{partition, ComplianceInput, ComplianceValidator};
use crate::config::{EngineConfig, PartyDefaults};
use crate::exhibits::plan_exhibits;
use crate::render::{
    append_disclaimer, fingerprint, format_date, render_body, DocumentParts, Party, Section,
    UNDATED_EFFECTIVE_DATE,
};
use crate::selection::{SelectionContext, VariationSelector};
use crate::substitution::{merge_missing, missing_marker, Tokenizer};
use crate::types::{
    AssemblyError, AssemblyRequest, AssemblyWarning, CompositionResult, PolishStatus, Result,
    SectionSummary,
};

/// Parameter consulted for the effective date when the request has none.
pub const EFFECTIVE_DATE_PARAMETER: &str = "effectiveDate";

/// Assembles contracts from jurisdiction packs.
pub struct DocumentAssembler {
    loader: Arc<PackLoader>,
    selector: VariationSelector,
    polisher: Polisher,
    parties: PartyDefaults,
}

impl DocumentAssembler {
    /// Create an assembler over a loader, with polishing disabled.
    pub fn new(loader: Arc<PackLoader>) -> Self {
        Self {
            loader,
            selector: VariationSelector::default(),
            polisher: Polisher::disabled(),
            parties: PartyDefaults::default(),
        }
    }

    /// Build from configuration: filesystem packs, party defaults, polisher.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let source: Arc<dyn PackSource> = Arc::new(FsPackSource::new(config.packs.root.clone()));
        let loader = PackLoader::new(source).with_cache(config.packs.cache);
        let polisher = Polisher::from_config(&config.polish)
            .map_err(|e| AssemblyError::Config(e.to_string()))?;

        Ok(Self::new(Arc::new(loader))
            .with_polisher(polisher)
            .with_parties(config.parties.clone()))
    }

    /// Set the polisher.
    pub fn with_polisher(mut self, polisher: Polisher) -> Self {
        self.polisher = polisher;
        self
    }

    /// Set the party defaults.
    pub fn with_parties(mut self, parties: PartyDefaults) -> Self {
        self.parties = parties;
        self
    }

    /// Replace the variation resolver chain.
    pub fn with_selector(mut self, selector: VariationSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn loader(&self) -> &Arc<PackLoader> {
        &self.loader
    }

    /// Jurisdictions available in the pack source.
    pub async fn jurisdictions(&self) -> Result<Vec<String>> {
        Ok(self.loader.source().jurisdictions().await?)
    }

    /// Contract types available for a jurisdiction.
    pub async fn contract_types(&self, jurisdiction: &str) -> Result<Vec<String>> {
        Ok(self.loader.source().contract_types(jurisdiction).await?)
    }

    /// Assemble a contract.
    pub async fn assemble(&self, request: &AssemblyRequest) -> Result<CompositionResult> {
        let jurisdiction = request.jurisdiction.as_str();
        let contract_type = request.contract_type.as_str();

        info!(
            request_id = %request.request_id,
            jurisdiction = %jurisdiction,
            contract_type = %contract_type,
            "Assembling contract"
        );

        // 1. Reference data
        let scaffold = self.loader.load_scaffold(jurisdiction, contract_type).await?;
        let library = self.loader.load_library(jurisdiction).await?;
        let ruleset = self.loader.load_ruleset(jurisdiction).await?;
        let catalog = self.loader.load_exhibit_catalog(jurisdiction).await?;

        let clauses = resolve_clauses(&scaffold, &library.clauses, contract_type)?;

        // 2. Input compliance
        let validator = ComplianceValidator::for_ruleset(&ruleset);
        let input = ComplianceInput {
            jurisdiction,
            contract_type,
            parameters: &request.parameters,
            options: &request.options,
            clauses: &clauses,
        };
        let (blocking, mut advisory) = partition(validator.validate_input(&input));
        if !blocking.is_empty() {
            warn!(
                jurisdiction = %jurisdiction,
                contract_type = %contract_type,
                violations = blocking.len(),
                "Input compliance failed"
            );
            return Err(AssemblyError::Compliance {
                violations: blocking,
            });
        }

        let mut warnings = Vec::new();
        for clause_id in request.options.keys() {
            if !scaffold.clause_order.contains(clause_id) {
                warnings.push(AssemblyWarning::UnusedOption {
                    clause_id: clause_id.clone(),
                });
            }
        }

        // 3. Sections
        let tokenizer = Tokenizer::new(library.placeholder_syntax)?;
        let mut missing = Vec::new();
        let mut sections = Vec::with_capacity(clauses.len());
        let mut summaries = Vec::with_capacity(clauses.len());

        for clause in &clauses {
            let context = SelectionContext {
                preferences: &request.preferences,
                explicit: request.options.get(&clause.id).map(String::as_str),
                scaffold_default: scaffold.default_option(&clause.id),
            };
            let resolution = self.selector.select(clause, &context, &mut warnings);

            if resolution.text.trim().is_empty() {
                warn!(clause_id = %clause.id, "Clause resolved to empty text, skipping");
                warnings.push(AssemblyWarning::EmptyClause {
                    clause_id: clause.id.clone(),
                });
                continue;
            }

            let substituted = tokenizer.substitute(&resolution.text, &request.parameters);
            merge_missing(&mut missing, substituted.missing);

            let number = sections.len() + 1;
            summaries.push(SectionSummary {
                number,
                clause_id: clause.id.clone(),
                title: resolution.title.clone(),
                variation: resolution.variation,
                source: resolution.source,
            });
            sections.push(Section {
                number,
                title: resolution.title,
                text: substituted.text,
            });
        }

        // 4. Exhibits, parties, date
        let rendered_ids: Vec<String> = summaries.iter().map(|s| s.clause_id.clone()).collect();
        let plan = plan_exhibits(
            &self.loader,
            jurisdiction,
            &catalog,
            &ruleset,
            &request.parameters,
            &rendered_ids,
        )
        .await?;
        warnings.extend(plan.warnings.iter().cloned());
        advisory.extend(plan.violations.iter().cloned());

        let primary = resolve_party(
            scaffold.primary_party.as_ref().unwrap_or(&self.parties.primary),
            &request.parameters,
            &mut missing,
        );
        let counterparty = resolve_party(
            scaffold.counterparty.as_ref().unwrap_or(&self.parties.counterparty),
            &request.parameters,
            &mut missing,
        );

        let effective_date = match request.effective_date {
            Some(date) => format_date(date),
            None => request
                .parameters
                .get(EFFECTIVE_DATE_PARAMETER)
                .map(|d| d.trim())
                .filter(|d| !d.is_empty())
                .map(String::from)
                .unwrap_or_else(|| UNDATED_EFFECTIVE_DATE.to_string()),
        };

        // 5. Render, then output compliance on the body alone
        let exhibits = plan.rendered();
        let body = render_body(&DocumentParts {
            title: &scaffold.title,
            effective_date: &effective_date,
            primary: &primary,
            counterparty: &counterparty,
            sections: &sections,
            exhibits: &exhibits,
        });

        let (blocking, output_advisory) = partition(validator.validate_output(&body));
        if !blocking.is_empty() {
            warn!(
                jurisdiction = %jurisdiction,
                contract_type = %contract_type,
                violations = blocking.len(),
                "Output compliance failed"
            );
            return Err(AssemblyError::Compliance {
                violations: blocking,
            });
        }
        advisory.extend(output_advisory);

        // 6. Disclaimer
        let disclaimer = self.loader.load_disclaimer(jurisdiction).await?;
        let text = append_disclaimer(&body, &disclaimer);
        let fingerprint = fingerprint(&text);

        info!(
            request_id = %request.request_id,
            jurisdiction = %jurisdiction,
            contract_type = %contract_type,
            sections = sections.len(),
            exhibits = exhibits.len(),
            missing = missing.len(),
            warnings = warnings.len(),
            "Contract assembled"
        );

        Ok(CompositionResult {
            text,
            violations: advisory,
            missing_placeholders: missing,
            warnings,
            sections: summaries,
            exhibits: plan.keys(),
            fingerprint,
            polish: PolishStatus::NotRequested,
        })
    }

    /// Assemble, then polish the text. Polish failures keep the assembled text.
    pub async fn assemble_and_polish(
        &self,
        request: &AssemblyRequest,
        requirements: &str,
    ) -> Result<CompositionResult> {
        self.assemble_and_polish_until(request, requirements, std::future::pending())
            .await
    }

    /// Like [`assemble_and_polish`](Self::assemble_and_polish), abandoning the
    /// polish call when `cancel` completes.
    pub async fn assemble_and_polish_until<C>(
        &self,
        request: &AssemblyRequest,
        requirements: &str,
        cancel: C,
    ) -> Result<CompositionResult>
    where
        C: Future<Output = ()>,
    {
        let mut result = self.assemble(request).await?;

        let outcome = self
            .polisher
            .polish_until(&result.text, requirements, cancel)
            .await;
        result.polish = PolishStatus::from_outcome(&outcome);

        if let PolishOutcome::Degraded { reason, .. } = &outcome {
            warn!(request_id = %request.request_id, reason = %reason, "Polish degraded, keeping assembled text");
        }
        if outcome.is_polished() {
            result.text = outcome.into_text();
            result.fingerprint = fingerprint(&result.text);
        }

        Ok(result)
    }
}

/// Scaffold clauses in order; every missing id is reported at once.
fn resolve_clauses<'a>(
    scaffold: &ContractScaffold,
    clauses: &'a [ClauseDefinition],
    contract_type: &str,
) -> Result<Vec<&'a ClauseDefinition>> {
    let mut resolved = Vec::with_capacity(scaffold.clause_order.len());
    let mut violations = Vec::new();

    for (index, id) in scaffold.clause_order.iter().enumerate() {
        match clauses.iter().find(|c| &c.id == id) {
            Some(clause) => resolved.push(clause),
            None => violations.push(clause_pack::SchemaViolation::new(
                format!("clauses[{}]", index),
                format!("references unknown clause '{}'", id),
            )),
        }
    }

    if violations.is_empty() {
        debug!(contract_type = %contract_type, clauses = resolved.len(), "Scaffold clauses resolved");
        Ok(resolved)
    } else {
        Err(AssemblyError::MalformedData {
            resource: format!("contract scaffold '{}'", contract_type),
            violations,
        })
    }
}

/// Party name from the first present parameter, else the missing marker.
fn resolve_party(
    party: &PartySpec,
    parameters: &BTreeMap<String, String>,
    missing: &mut Vec<String>,
) -> Party {
    let name = party
        .parameters
        .iter()
        .find_map(|p| parameters.get(p).filter(|v| !v.trim().is_empty()).cloned());

    let name = match name {
        Some(name) => name,
        None => {
            let wanted = party.parameters.first().map(String::as_str).unwrap_or("party");
            merge_missing(missing, vec![wanted.to_string()]);
            missing_marker(wanted)
        }
    };

    Party {
        name,
        label: party.label.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::Phase;
    use crate::exhibits::MANDATORY_EXHIBIT_RULE;
    use crate::types::SelectionSource;
    use chrono::NaiveDate;
    use clause_pack::{InMemoryPackSource, LegalStance, RiskLevel};
    use contract_polish::backend::MockBackend;
    use contract_polish::DegradeReason;
    use std::time::Duration;

    const LIBRARY: &str = r#"{
        "placeholderSyntax": "square",
        "clauses": {
            "position": {
                "title": "Position and Duties",
                "text": "[Employee Name] will serve as [Job Title] for [Company Name]."
            },
            "compensation": {
                "title": "Compensation",
                "text": "",
                "variations": {
                    "standard": {
                        "text": "Employee will be paid [Salary] per year.",
                        "tags": { "riskLevel": "medium", "legalStance": "neutral" }
                    },
                    "employer": {
                        "title": "Compensation and Review",
                        "text": "Employee will be paid [Salary] per year, reviewed at Company's discretion.",
                        "tags": { "riskLevel": "low", "legalStance": "primary_favorable" }
                    }
                }
            },
            "reserved": { "title": "Reserved", "text": "   " },
            "termination": {
                "title": "Termination",
                "text": "Employment is at will."
            },
            "ip_assignment": {
                "title": "Inventions",
                "text": "Employee assigns inventions to Company, subject to the attached notice."
            }
        }
    }"#;

    const EMPLOYMENT: &str = r#"{
        "title": "Employment Agreement",
        "clauses": ["position", "compensation", "reserved", "termination"],
        "parties": {
            "primary": { "parameter": "clientName", "label": "Company" },
            "counterparty": { "parameters": ["employeeName", "otherPartyName"], "label": "Employee" }
        }
    }"#;

    const CONTRACTOR: &str = r#"{
        "title": "Independent Contractor Agreement",
        "clauses": ["position", "ip_assignment"]
    }"#;

    const CATALOG: &str = r#"{
        "ip_notice": { "file": "exhibit_a.md", "trigger": { "parameter": "ip_assignment" }, "mandatory": true }
    }"#;

    fn source() -> InMemoryPackSource {
        InMemoryPackSource::new()
            .with_file("us_ca", "clause_library.json", LIBRARY)
            .with_file("us_ca", "contract_employment_agreement.json", EMPLOYMENT)
            .with_file("us_ca", "contract_independent_contractor.json", CONTRACTOR)
            .with_file("us_ca", "exhibits.map.json", CATALOG)
            .with_file("us_ca", "exhibit_a.md", "# Exhibit A\n\nInvention notice.")
            .with_file("shared", "disclaimer.md", "Generated text; have counsel review it.")
    }

    fn assembler() -> DocumentAssembler {
        DocumentAssembler::new(Arc::new(PackLoader::new(Arc::new(source()))))
    }

    fn request() -> AssemblyRequest {
        AssemblyRequest::new("us_ca", "employment_agreement")
            .with_parameter("clientName", "Acme Inc.")
            .with_parameter("employeeName", "Jane Doe")
            .with_parameter("Employee Name", "Jane Doe")
            .with_parameter("Job Title", "Engineer")
            .with_parameter("Company Name", "Acme Inc.")
            .with_parameter("Salary", "$100,000")
            .with_preferences(RiskLevel::Medium, LegalStance::Neutral)
            .with_effective_date(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())
    }

    #[tokio::test]
    async fn test_assemble_employment_agreement() {
        let result = assembler().assemble(&request()).await.unwrap();

        assert!(result.text.starts_with("# Employment Agreement"));
        assert!(result.text.contains("as of January 15, 2025"));
        assert!(result.text.contains("**Acme Inc.** (\"Company\")"));
        assert!(result.text.contains("**Jane Doe** (\"Employee\")"));
        assert!(result.text.contains("## 1. Position and Duties\n\nJane Doe will serve as Engineer for Acme Inc."));
        assert!(result.text.contains("## 2. Compensation\n\nEmployee will be paid $100,000 per year."));
        assert!(result.text.contains("## 3. Termination"));
        assert!(!result.text.contains("## 4."));
        assert!(result.missing_placeholders.is_empty());
        assert!(result.violations.is_empty());
        assert_eq!(result.sections[1].source, SelectionSource::PreferenceMatch);
        assert_eq!(
            result.warnings,
            vec![AssemblyWarning::EmptyClause {
                clause_id: "reserved".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_deterministic() {
        let assembler = assembler();
        let first = assembler.assemble(&request()).await.unwrap();
        let second = assembler.assemble(&request()).await.unwrap();

        assert_eq!(first.text, second.text);
        assert_eq!(first.fingerprint, second.fingerprint);
        assert_eq!(first.fingerprint, fingerprint(&first.text));
    }

    #[tokio::test]
    async fn test_explicit_option_overrides_preferences() {
        let request = request()
            .with_option("compensation", "employer")
            .with_option("non_existent_clause", "x");
        let result = assembler().assemble(&request).await.unwrap();

        assert!(result.text.contains("## 2. Compensation and Review"));
        assert_eq!(result.sections[1].variation.as_deref(), Some("employer"));
        assert!(result.warnings.contains(&AssemblyWarning::UnusedOption {
            clause_id: "non_existent_clause".to_string()
        }));
    }

    #[tokio::test]
    async fn test_missing_placeholders_and_parties() {
        let request = AssemblyRequest::new("us_ca", "employment_agreement")
            .with_parameter("Employee Name", "Jane Doe");
        let result = assembler().assemble(&request).await.unwrap();

        assert!(result.text.contains("[!!MISSING_DATA: Job Title!!]"));
        assert!(result.text.contains("**[!!MISSING_DATA: clientName!!]** (\"Company\")"));
        assert!(result.text.contains(UNDATED_EFFECTIVE_DATE));
        assert_eq!(
            result.missing_placeholders,
            vec!["Job Title", "Company Name", "Salary", "clientName", "employeeName"]
        );
    }

    #[tokio::test]
    async fn test_effective_date_parameter() {
        let mut request = request().with_parameter("effectiveDate", "March 1, 2025");
        request.effective_date = None;
        let result = assembler().assemble(&request).await.unwrap();
        assert!(result.text.contains("as of March 1, 2025 (the \"Effective Date\")"));
    }

    #[tokio::test]
    async fn test_input_compliance_blocks() {
        let request = request().with_parameter("restrictions", "12 month non-compete");
        let err = assembler().assemble(&request).await.unwrap_err();

        assert_eq!(err.violated_rules(), vec!["competition_restriction"]);
        match err {
            AssemblyError::Compliance { violations } => {
                assert!(violations.iter().all(|v| v.phase == Phase::Input))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_output_compliance_blocks_substituted_text() {
        // Only the substituted clause carries the restricted wording
        let source = source().with_file(
            "us_ca",
            "clause_library.json",
            r#"{ "clauses": {
                "position": { "title": "Position", "text": "Employee agrees to a covenant not to [Verb]." },
                "compensation": { "title": "Compensation", "text": "Paid." },
                "reserved": { "title": "Reserved", "text": "Reserved." },
                "termination": { "title": "Termination", "text": "At will." }
            } }"#,
        );
        let assembler = DocumentAssembler::new(Arc::new(PackLoader::new(Arc::new(source))));
        let request = request().with_parameter("Verb", "compete");

        let err = assembler.assemble(&request).await.unwrap_err();
        match err {
            AssemblyError::Compliance { violations } => {
                assert_eq!(violations[0].phase, Phase::Output);
                assert_eq!(violations[0].rule, "competition_restriction");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_disclaimer_is_not_scanned_or_substituted() {
        let source = source().with_file(
            "us_ca",
            "disclaimer.md",
            "LEGAL DISCLAIMER: this [Salary] text does not constitute legal advice.",
        );
        let assembler = DocumentAssembler::new(Arc::new(PackLoader::new(Arc::new(source))));

        let result = assembler.assemble(&request()).await.unwrap();
        assert!(result
            .text
            .ends_with("---\n\nLEGAL DISCLAIMER: this [Salary] text does not constitute legal advice."));
    }

    #[tokio::test]
    async fn test_exhibit_between_body_and_disclaimer() {
        let request = request().with_parameter("ip_assignment", "true");
        let result = assembler().assemble(&request).await.unwrap();

        let body_end = result.text.find("## 3. Termination").unwrap();
        let exhibit = result.text.find("# Exhibit A").unwrap();
        let disclaimer = result.text.find("Generated text;").unwrap();
        assert!(body_end < exhibit && exhibit < disclaimer);
        assert_eq!(result.exhibits, vec!["ip_notice"]);
    }

    #[tokio::test]
    async fn test_mandatory_exhibit_from_clause() {
        let request = AssemblyRequest::new("us_ca", "independent_contractor")
            .with_parameter("clientName", "Acme Inc.")
            .with_parameter("otherPartyName", "Jane Doe");
        let result = assembler().assemble(&request).await.unwrap();
        assert_eq!(result.exhibits, vec!["ip_notice"]);

        let bare = InMemoryPackSource::new()
            .with_file("us_ca", "clause_library.json", LIBRARY)
            .with_file("us_ca", "contract_independent_contractor.json", CONTRACTOR)
            .with_file("us_ca", "disclaimer.md", "Review with counsel.");
        let assembler = DocumentAssembler::new(Arc::new(PackLoader::new(Arc::new(bare))));
        let result = assembler.assemble(&request).await.unwrap();

        assert!(result.exhibits.is_empty());
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].rule, MANDATORY_EXHIBIT_RULE);
    }

    #[tokio::test]
    async fn test_skipped_clause_triggers_no_exhibit() {
        let blank_ip = LIBRARY.replace(
            "Employee assigns inventions to Company, subject to the attached notice.",
            "  ",
        );
        let request = AssemblyRequest::new("us_ca", "independent_contractor")
            .with_parameter("clientName", "Acme Inc.")
            .with_parameter("otherPartyName", "Jane Doe");

        let source = source().with_file("us_ca", "clause_library.json", &blank_ip);
        let assembler = DocumentAssembler::new(Arc::new(PackLoader::new(Arc::new(source))));
        let result = assembler.assemble(&request).await.unwrap();

        let ids: Vec<&str> = result.sections.iter().map(|s| s.clause_id.as_str()).collect();
        assert_eq!(ids, vec!["position"]);
        assert!(result.exhibits.is_empty());
        assert!(result.warnings.contains(&AssemblyWarning::EmptyClause {
            clause_id: "ip_assignment".to_string()
        }));

        // No exhibit file either: still no advisory
        let bare = InMemoryPackSource::new()
            .with_file("us_ca", "clause_library.json", &blank_ip)
            .with_file("us_ca", "contract_independent_contractor.json", CONTRACTOR)
            .with_file("us_ca", "disclaimer.md", "Review with counsel.");
        let assembler = DocumentAssembler::new(Arc::new(PackLoader::new(Arc::new(bare))));
        let result = assembler.assemble(&request).await.unwrap();
        assert!(result.violations.is_empty());
    }

    #[tokio::test]
    async fn test_missing_scaffold_clause_is_malformed() {
        let source = source().with_file(
            "us_ca",
            "contract_employment_agreement.json",
            r#"{ "title": "Employment Agreement", "clauses": ["position", "ghost", "phantom"] }"#,
        );
        let assembler = DocumentAssembler::new(Arc::new(PackLoader::new(Arc::new(source))));

        match assembler.assemble(&request()).await.unwrap_err() {
            AssemblyError::MalformedData { violations, .. } => {
                assert_eq!(violations.len(), 2);
                assert!(violations[1].message.contains("phantom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_contract_type() {
        let request = AssemblyRequest::new("us_ca", "lease");
        let err = assembler().assemble(&request).await.unwrap_err();
        assert!(matches!(err, AssemblyError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_polish_with_mock() {
        let backend = MockBackend::new("mock").with_response("Polished contract.");
        let assembler = assembler().with_polisher(Polisher::with_backend(Arc::new(backend)));

        let result = assembler
            .assemble_and_polish(&request(), "Keep it short")
            .await
            .unwrap();

        assert_eq!(result.text, "Polished contract.");
        assert_eq!(result.fingerprint, fingerprint("Polished contract."));
        assert!(matches!(result.polish, PolishStatus::Polished { .. }));
    }

    #[tokio::test]
    async fn test_polish_degrades_on_cancel() {
        let backend = MockBackend::new("mock")
            .with_response("never used")
            .with_delay(Duration::from_secs(5));
        let assembler = assembler().with_polisher(Polisher::with_backend(Arc::new(backend)));
        let plain = assembler.assemble(&request()).await.unwrap();

        let result = assembler
            .assemble_and_polish_until(&request(), "", async {})
            .await
            .unwrap();

        assert_eq!(result.text, plain.text);
        assert_eq!(
            result.polish,
            PolishStatus::Degraded {
                reason: DegradeReason::Cancelled
            }
        );
    }

    #[tokio::test]
    async fn test_polish_not_configured() {
        let result = assembler()
            .assemble_and_polish(&request(), "")
            .await
            .unwrap();
        assert_eq!(result.polish, PolishStatus::Passthrough);
    }

    #[tokio::test]
    async fn test_from_config_missing_key_still_assembles() {
        let mut config = EngineConfig::default();
        config.polish.provider = contract_polish::PolishProvider::Groq;
        assert!(DocumentAssembler::from_config(&config).is_ok());

        let polisher = Polisher::from_config(&config.polish).unwrap();
        let assembler = assembler().with_polisher(polisher);
        let plain = assembler.assemble(&request()).await.unwrap();
        let result = assembler.assemble_and_polish(&request(), "").await.unwrap();

        assert_eq!(result.text, plain.text);
        assert_eq!(
            result.polish,
            PolishStatus::Degraded {
                reason: DegradeReason::Failed("groq requires an API key".to_string())
            }
        );
    }

    #[tokio::test]
    async fn test_listing() {
        let assembler = assembler();
        assert_eq!(assembler.jurisdictions().await.unwrap(), vec!["us_ca"]);
        assert_eq!(
            assembler.contract_types("us_ca").await.unwrap(),
            vec!["employment_agreement", "independent_contractor"]
        );
    }
}
