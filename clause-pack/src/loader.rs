//! Pack loading and caching.
//!
//! The loader turns raw resources from a [`PackSource`] into validated,
//! shared values. Parsed resources are cached per jurisdiction (and contract
//! type for scaffolds) so concurrent assemblies read them without reparsing.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::exhibits::ExhibitCatalog;
use crate::jurisdictions::builtin_ruleset;
use crate::ruleset::RuleSet;
use crate::schema::{self, SchemaViolation};
use crate::source::{PackResource, PackSource, SourceError};
use crate::types::{ClauseLibrary, ContractScaffold};

/// Error types for pack loading.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    /// Resource absent for the jurisdiction
    #[error("{resource} not found for jurisdiction '{jurisdiction}'")]
    NotFound {
        jurisdiction: String,
        resource: String,
    },

    /// Resource failed schema validation
    #[error("Malformed {resource} for jurisdiction '{jurisdiction}': {}", join_violations(.violations))]
    MalformedData {
        jurisdiction: String,
        resource: String,
        violations: Vec<SchemaViolation>,
    },

    /// Source failed to read
    #[error(transparent)]
    Source(#[from] SourceError),
}

fn join_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl PackError {
    fn malformed(
        jurisdiction: &str,
        resource: &PackResource,
        violations: Vec<SchemaViolation>,
    ) -> Self {
        Self::MalformedData {
            jurisdiction: jurisdiction.to_string(),
            resource: resource.describe(),
            violations,
        }
    }

    fn not_found(jurisdiction: &str, resource: &PackResource) -> Self {
        Self::NotFound {
            jurisdiction: jurisdiction.to_string(),
            resource: resource.describe(),
        }
    }
}

type ScaffoldKey = (String, String);

/// Loads and caches jurisdiction pack resources.
pub struct PackLoader {
    source: Arc<dyn PackSource>,
    cache_enabled: bool,
    libraries: DashMap<String, Arc<ClauseLibrary>>,
    scaffolds: DashMap<ScaffoldKey, Arc<ContractScaffold>>,
    rulesets: DashMap<String, Arc<RuleSet>>,
    catalogs: DashMap<String, Arc<ExhibitCatalog>>,
    disclaimers: DashMap<String, Arc<str>>,
    exhibits: DashMap<ScaffoldKey, Option<Arc<str>>>,
}

impl PackLoader {
    /// Create a caching loader over a source.
    pub fn new(source: Arc<dyn PackSource>) -> Self {
        Self {
            source,
            cache_enabled: true,
            libraries: DashMap::new(),
            scaffolds: DashMap::new(),
            rulesets: DashMap::new(),
            catalogs: DashMap::new(),
            disclaimers: DashMap::new(),
            exhibits: DashMap::new(),
        }
    }

    /// Builder: enable or disable caching.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// The underlying source.
    pub fn source(&self) -> &Arc<dyn PackSource> {
        &self.source
    }

    /// Load the clause library of a jurisdiction.
    pub async fn load_library(&self, jurisdiction: &str) -> Result<Arc<ClauseLibrary>, PackError> {
        self.cached(&self.libraries, jurisdiction.to_string(), || async {
            let resource = PackResource::ClauseLibrary;
            let raw = self.read_required(jurisdiction, &resource).await?;
            let library = schema::parse_library(jurisdiction, &raw)
                .map_err(|violations| PackError::malformed(jurisdiction, &resource, violations))?;

            debug!(
                jurisdiction = %jurisdiction,
                clauses = library.len(),
                "Loaded clause library"
            );
            Ok(Arc::new(library))
        })
        .await
    }

    /// Load the scaffold for a (jurisdiction, contract type) pair.
    pub async fn load_scaffold(
        &self,
        jurisdiction: &str,
        contract_type: &str,
    ) -> Result<Arc<ContractScaffold>, PackError> {
        let key = (jurisdiction.to_string(), contract_type.to_string());
        self.cached(&self.scaffolds, key, || async {
            let resource = PackResource::Scaffold(contract_type.to_string());
            let raw = self.read_required(jurisdiction, &resource).await?;
            let scaffold = schema::parse_scaffold(contract_type, &raw)
                .map_err(|violations| PackError::malformed(jurisdiction, &resource, violations))?;

            debug!(
                jurisdiction = %jurisdiction,
                contract_type = %contract_type,
                clauses = scaffold.clause_order.len(),
                "Loaded contract scaffold"
            );
            Ok(Arc::new(scaffold))
        })
        .await
    }

    /// Load the rule profile, falling back to the built-in profile.
    pub async fn load_ruleset(&self, jurisdiction: &str) -> Result<Arc<RuleSet>, PackError> {
        self.cached(&self.rulesets, jurisdiction.to_string(), || async {
            let resource = PackResource::RuleSet;
            let ruleset = match self.source.read(jurisdiction, &resource).await? {
                Some(raw) => schema::parse_ruleset(&raw).map_err(|violations| {
                    PackError::malformed(jurisdiction, &resource, violations)
                })?,
                None => {
                    debug!(jurisdiction = %jurisdiction, "No ruleset in pack, using built-in profile");
                    builtin_ruleset(jurisdiction)
                }
            };
            Ok(Arc::new(ruleset))
        })
        .await
    }

    /// Load the exhibit catalog; a pack without one has no exhibits.
    pub async fn load_exhibit_catalog(
        &self,
        jurisdiction: &str,
    ) -> Result<Arc<ExhibitCatalog>, PackError> {
        self.cached(&self.catalogs, jurisdiction.to_string(), || async {
            let resource = PackResource::ExhibitCatalog;
            let catalog = match self.source.read(jurisdiction, &resource).await? {
                Some(raw) => schema::parse_exhibit_catalog(&raw).map_err(|violations| {
                    PackError::malformed(jurisdiction, &resource, violations)
                })?,
                None => ExhibitCatalog::default(),
            };
            Ok(Arc::new(catalog))
        })
        .await
    }

    /// Load an exhibit body by file name. `None` when the file is missing.
    pub async fn load_exhibit(
        &self,
        jurisdiction: &str,
        file: &str,
    ) -> Result<Option<Arc<str>>, PackError> {
        let key = (jurisdiction.to_string(), file.to_string());
        self.cached(&self.exhibits, key, || async {
            let body = self
                .source
                .read(jurisdiction, &PackResource::Exhibit(file.to_string()))
                .await?;
            if body.is_none() {
                warn!(jurisdiction = %jurisdiction, file = %file, "Exhibit file missing");
            }
            Ok(body.map(Arc::from))
        })
        .await
    }

    /// Load the disclaimer: the jurisdiction's own, else the shared one.
    pub async fn load_disclaimer(&self, jurisdiction: &str) -> Result<Arc<str>, PackError> {
        self.cached(&self.disclaimers, jurisdiction.to_string(), || async {
            let resource = PackResource::Disclaimer;
            if let Some(text) = self.source.read(jurisdiction, &resource).await? {
                return Ok(Arc::from(text));
            }
            match self.source.read_shared(&resource).await? {
                Some(text) => Ok(Arc::from(text)),
                None => Err(PackError::not_found(jurisdiction, &resource)),
            }
        })
        .await
    }

    /// Drop every cached resource of a jurisdiction.
    pub fn invalidate(&self, jurisdiction: &str) {
        self.libraries.remove(jurisdiction);
        self.rulesets.remove(jurisdiction);
        self.catalogs.remove(jurisdiction);
        self.disclaimers.remove(jurisdiction);
        self.scaffolds.retain(|(j, _), _| j != jurisdiction);
        self.exhibits.retain(|(j, _), _| j != jurisdiction);
    }

    /// Drop every cached resource.
    pub fn clear(&self) {
        self.libraries.clear();
        self.scaffolds.clear();
        self.rulesets.clear();
        self.catalogs.clear();
        self.disclaimers.clear();
        self.exhibits.clear();
    }

    /// Number of cached entries across all resource kinds.
    pub fn cached_entries(&self) -> usize {
        self.libraries.len()
            + self.scaffolds.len()
            + self.rulesets.len()
            + self.catalogs.len()
            + self.disclaimers.len()
            + self.exhibits.len()
    }

    async fn read_required(
        &self,
        jurisdiction: &str,
        resource: &PackResource,
    ) -> Result<String, PackError> {
        self.source
            .read(jurisdiction, resource)
            .await?
            .ok_or_else(|| PackError::not_found(jurisdiction, resource))
    }

    /// Serve from cache, or load and remember. No map guard is held across
    /// the load.
    async fn cached<K, V, F, Fut>(&self, map: &DashMap<K, V>, key: K, load: F) -> Result<V, PackError>
    where
        K: Eq + Hash,
        V: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, PackError>>,
    {
        if self.cache_enabled {
            if let Some(hit) = map.get(&key) {
                return Ok(hit.value().clone());
            }
        }

        let value = load().await?;
        if self.cache_enabled {
            map.insert(key, value.clone());
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{InMemoryPackSource, SHARED_PACK};

    const LIBRARY: &str = r#"{ "clauses": { "term": { "title": "Term", "text": "At will." } } }"#;
    const SCAFFOLD: &str = r#"{ "title": "Employment Agreement", "clauses": ["term"] }"#;

    fn source() -> InMemoryPackSource {
        InMemoryPackSource::new()
            .with_file("us_ca", "clause_library.json", LIBRARY)
            .with_file("us_ca", "contract_employment_agreement.json", SCAFFOLD)
            .with_file(SHARED_PACK, "disclaimer.md", "Shared disclaimer")
    }

    #[tokio::test]
    async fn test_load_and_cache() {
        let source = Arc::new(source());
        let loader = PackLoader::new(source.clone());

        let library = loader.load_library("us_ca").await.unwrap();
        assert_eq!(library.len(), 1);

        // Removing the file does not affect the cached parse
        source.remove("us_ca", "clause_library.json").await;
        let again = loader.load_library("us_ca").await.unwrap();
        assert!(Arc::ptr_eq(&library, &again));

        loader.invalidate("us_ca");
        let err = loader.load_library("us_ca").await.unwrap_err();
        assert!(matches!(err, PackError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_cache_disabled_rereads() {
        let source = Arc::new(source());
        let loader = PackLoader::new(source.clone()).with_cache(false);

        loader.load_library("us_ca").await.unwrap();
        assert_eq!(loader.cached_entries(), 0);

        source.insert("us_ca", "clause_library.json", "{}").await;
        let err = loader.load_library("us_ca").await.unwrap_err();
        assert!(matches!(err, PackError::MalformedData { .. }));
    }

    #[tokio::test]
    async fn test_scaffold_not_found() {
        let loader = PackLoader::new(Arc::new(source()));

        let err = loader.load_scaffold("us_ca", "nda").await.unwrap_err();
        match err {
            PackError::NotFound { jurisdiction, resource } => {
                assert_eq!(jurisdiction, "us_ca");
                assert!(resource.contains("nda"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let scaffold = loader
            .load_scaffold("us_ca", "employment_agreement")
            .await
            .unwrap();
        assert_eq!(scaffold.clause_order, vec!["term"]);
    }

    #[tokio::test]
    async fn test_ruleset_and_disclaimer_fallbacks() {
        let loader = PackLoader::new(Arc::new(source()));

        let ruleset = loader.load_ruleset("us_ca").await.unwrap();
        assert!(ruleset.restricts_post_employment_competition);

        let catalog = loader.load_exhibit_catalog("us_ca").await.unwrap();
        assert!(catalog.is_empty());

        let disclaimer = loader.load_disclaimer("us_ca").await.unwrap();
        assert_eq!(&*disclaimer, "Shared disclaimer");

        let exhibit = loader.load_exhibit("us_ca", "missing.md").await.unwrap();
        assert!(exhibit.is_none());
    }

    #[tokio::test]
    async fn test_disclaimer_not_found() {
        let source = InMemoryPackSource::new().with_file("us_tx", "clause_library.json", LIBRARY);
        let loader = PackLoader::new(Arc::new(source));

        let err = loader.load_disclaimer("us_tx").await.unwrap_err();
        assert!(matches!(err, PackError::NotFound { .. }));
    }
}
