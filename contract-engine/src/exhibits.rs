//! Exhibit attachment.
//!
//! Exhibits come from two places: catalog entries with their own triggers,
//! and mandatory requirements of the jurisdiction's rule profile. A
//! requirement whose exhibit cannot be attached is an advisory violation.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use clause_pack::{ExhibitCatalog, ExhibitEntry, PackLoader, RuleSet, Severity};

use crate::compliance::{Phase, Violation};
use crate::render::RenderedExhibit;
use crate::types::{AssemblyWarning, Result};

pub const MANDATORY_EXHIBIT_RULE: &str = "mandatory_exhibit";

/// Exhibits to print, plus what went wrong finding them.
#[derive(Debug, Clone, Default)]
pub struct ExhibitPlan {
    /// (key, exhibit) in print order
    pub attached: Vec<(String, RenderedExhibit)>,
    pub warnings: Vec<AssemblyWarning>,
    /// Advisory only
    pub violations: Vec<Violation>,
}

impl ExhibitPlan {
    pub fn keys(&self) -> Vec<String> {
        self.attached.iter().map(|(key, _)| key.clone()).collect()
    }

    pub fn rendered(&self) -> Vec<RenderedExhibit> {
        self.attached.iter().map(|(_, e)| e.clone()).collect()
    }

    fn is_attached(&self, key: &str) -> bool {
        self.attached.iter().any(|(k, _)| k == key)
    }

    fn has_violation_for(&self, key: &str) -> bool {
        self.violations
            .iter()
            .any(|v| v.matched_term.as_deref() == Some(key))
    }

    fn record_missing(&mut self, key: &str, reason: &str) {
        if self.has_violation_for(key) {
            return;
        }
        warn!(exhibit = %key, "Mandatory exhibit cannot be attached");
        self.violations.push(
            Violation::new(
                MANDATORY_EXHIBIT_RULE,
                Severity::Advisory,
                Phase::Input,
                format!("Exhibit '{}' is required but not available: {}", key, reason),
            )
            .with_matched_term(key),
        );
    }
}

/// Decide which exhibits accompany a contract.
pub async fn plan_exhibits(
    loader: &PackLoader,
    jurisdiction: &str,
    catalog: &ExhibitCatalog,
    ruleset: &RuleSet,
    parameters: &BTreeMap<String, String>,
    clause_ids: &[String],
) -> Result<ExhibitPlan> {
    let mut plan = ExhibitPlan::default();

    for entry in &catalog.entries {
        let fires = entry
            .trigger
            .as_ref()
            .map_or(false, |trigger| trigger.fires(parameters, clause_ids));
        if !fires {
            continue;
        }

        match load_body(loader, jurisdiction, entry).await? {
            Some(exhibit) => {
                debug!(exhibit = %entry.key, "Attaching exhibit");
                plan.attached.push((entry.key.clone(), exhibit));
            }
            None => {
                plan.warnings.push(AssemblyWarning::MissingExhibit {
                    exhibit: entry.key.clone(),
                    file: entry.file.clone(),
                });
                if entry.mandatory {
                    plan.record_missing(&entry.key, &format!("{} is missing", entry.file));
                }
            }
        }
    }

    for requirement in &ruleset.mandatory_exhibits {
        if !requirement.trigger.fires(parameters, clause_ids) || plan.is_attached(&requirement.exhibit) {
            continue;
        }
        let reason = requirement.reason.as_deref().unwrap_or("required by jurisdiction rules");

        let Some(entry) = catalog.get(&requirement.exhibit) else {
            plan.record_missing(&requirement.exhibit, &format!("not in exhibit catalog ({})", reason));
            continue;
        };
        match load_body(loader, jurisdiction, entry).await? {
            Some(exhibit) => plan.attached.push((entry.key.clone(), exhibit)),
            None => plan.record_missing(&entry.key, &format!("{} is missing ({})", entry.file, reason)),
        }
    }

    Ok(plan)
}

async fn load_body(
    loader: &PackLoader,
    jurisdiction: &str,
    entry: &ExhibitEntry,
) -> Result<Option<RenderedExhibit>> {
    let body = loader.load_exhibit(jurisdiction, &entry.file).await?;
    Ok(body.map(|body| RenderedExhibit {
        title: entry.title.clone(),
        body: body.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clause_pack::{builtin_ruleset, ExhibitTrigger, InMemoryPackSource};
    use std::sync::Arc;

    fn catalog(mandatory: bool) -> ExhibitCatalog {
        ExhibitCatalog {
            entries: vec![ExhibitEntry {
                key: "ip_notice".to_string(),
                file: "exhibit_a_ip_notice.md".to_string(),
                title: None,
                trigger: Some(ExhibitTrigger::Parameter("ip_assignment".to_string())),
                mandatory,
            }],
        }
    }

    fn params(value: &str) -> BTreeMap<String, String> {
        [("ip_assignment".to_string(), value.to_string())]
            .into_iter()
            .collect()
    }

    #[tokio::test]
    async fn test_attach_when_triggered() {
        let source = InMemoryPackSource::new().with_file("us_ca", "exhibit_a_ip_notice.md", "# Exhibit A");
        let loader = PackLoader::new(Arc::new(source));

        let plan = plan_exhibits(&loader, "us_ca", &catalog(false), &builtin_ruleset("us_ca"), &params("yes"), &[])
            .await
            .unwrap();
        assert_eq!(plan.keys(), vec!["ip_notice"]);
        assert!(plan.violations.is_empty());

        let plan = plan_exhibits(&loader, "us_ca", &catalog(false), &builtin_ruleset("us_ca"), &params("no"), &[])
            .await
            .unwrap();
        assert!(plan.attached.is_empty());
    }

    #[tokio::test]
    async fn test_missing_mandatory_is_advisory() {
        let loader = PackLoader::new(Arc::new(InMemoryPackSource::new()));

        let plan = plan_exhibits(&loader, "us_ca", &catalog(true), &builtin_ruleset("us_ca"), &params("true"), &[])
            .await
            .unwrap();

        assert!(plan.attached.is_empty());
        assert_eq!(plan.warnings.len(), 1);
        assert_eq!(plan.violations.len(), 1);
        assert_eq!(plan.violations[0].rule, MANDATORY_EXHIBIT_RULE);
        assert_eq!(plan.violations[0].severity, Severity::Advisory);
    }

    #[tokio::test]
    async fn test_requirement_attaches_from_clause() {
        let source = InMemoryPackSource::new().with_file("us_ca", "exhibit_a_ip_notice.md", "Notice");
        let loader = PackLoader::new(Arc::new(source));
        let clause_ids = vec!["ip_assignment".to_string()];

        // Catalog trigger does not fire, the profile requirement does
        let plan = plan_exhibits(&loader, "us_ca", &catalog(false), &builtin_ruleset("us_ca"), &BTreeMap::new(), &clause_ids)
            .await
            .unwrap();
        assert_eq!(plan.keys(), vec!["ip_notice"]);

        let plan = plan_exhibits(&loader, "us_ca", &ExhibitCatalog::default(), &builtin_ruleset("us_ca"), &BTreeMap::new(), &clause_ids)
            .await
            .unwrap();
        assert!(plan.attached.is_empty());
        assert_eq!(plan.violations.len(), 1);
    }
}
