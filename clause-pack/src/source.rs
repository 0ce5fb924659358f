//! Pack sources.
//!
//! A pack source reads raw pack resources for a jurisdiction. Sources only
//! read; parsing and caching happen in [`crate::loader::PackLoader`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Directory holding jurisdiction-independent resources.
pub const SHARED_PACK: &str = "shared";

/// Error types for pack source operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Jurisdiction code cannot name a pack
    #[error("Invalid jurisdiction code: {0}")]
    InvalidJurisdiction(String),

    /// Resource name cannot name a file inside a pack
    #[error("Invalid resource name: {0}")]
    InvalidResource(String),

    /// Underlying read failed
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A resource inside a jurisdiction pack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PackResource {
    ClauseLibrary,
    /// Scaffold for a contract type
    Scaffold(String),
    RuleSet,
    ExhibitCatalog,
    /// Exhibit body, by file name
    Exhibit(String),
    Disclaimer,
}

impl PackResource {
    /// File name of the resource inside the pack directory.
    pub fn file_name(&self) -> String {
        match self {
            Self::ClauseLibrary => "clause_library.json".to_string(),
            Self::Scaffold(contract_type) => format!("contract_{}.json", contract_type),
            Self::RuleSet => "ruleset.yaml".to_string(),
            Self::ExhibitCatalog => "exhibits.map.json".to_string(),
            Self::Exhibit(file) => file.clone(),
            Self::Disclaimer => "disclaimer.md".to_string(),
        }
    }

    /// Human-readable name used in errors.
    pub fn describe(&self) -> String {
        match self {
            Self::ClauseLibrary => "clause library".to_string(),
            Self::Scaffold(contract_type) => format!("contract template '{}'", contract_type),
            Self::RuleSet => "ruleset".to_string(),
            Self::ExhibitCatalog => "exhibit catalog".to_string(),
            Self::Exhibit(file) => format!("exhibit '{}'", file),
            Self::Disclaimer => "disclaimer".to_string(),
        }
    }
}

/// Contract type named by a scaffold file name, if it is one.
pub fn contract_type_from_file(file_name: &str) -> Option<&str> {
    file_name
        .strip_prefix("contract_")
        .and_then(|rest| rest.strip_suffix(".json"))
        .filter(|contract_type| !contract_type.is_empty())
}

/// Check that a jurisdiction code names a pack and cannot escape the pack root.
pub fn validate_jurisdiction_code(code: &str) -> Result<(), SourceError> {
    let valid = !code.is_empty()
        && code != SHARED_PACK
        && code
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(SourceError::InvalidJurisdiction(code.to_string()))
    }
}

fn validate_file_name(name: &str) -> Result<(), SourceError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(SourceError::InvalidResource(name.to_string()));
    }
    Ok(())
}

/// Trait for reading raw pack resources.
///
/// Implementations exist for a directory tree ([`FsPackSource`]) and for
/// in-memory fixtures ([`InMemoryPackSource`]).
#[async_trait]
pub trait PackSource: Send + Sync {
    /// Read a resource of a jurisdiction pack. `Ok(None)` means absent.
    async fn read(
        &self,
        jurisdiction: &str,
        resource: &PackResource,
    ) -> Result<Option<String>, SourceError>;

    /// Read a jurisdiction-independent resource.
    async fn read_shared(&self, resource: &PackResource) -> Result<Option<String>, SourceError>;

    /// List the jurisdictions this source has packs for, sorted.
    async fn jurisdictions(&self) -> Result<Vec<String>, SourceError>;

    /// List the contract types of a jurisdiction, sorted.
    async fn contract_types(&self, jurisdiction: &str) -> Result<Vec<String>, SourceError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Reads packs from `<root>/<jurisdiction>/<file>`.
pub struct FsPackSource {
    root: PathBuf,
}

impl FsPackSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    async fn read_path(&self, path: PathBuf) -> Result<Option<String>, SourceError> {
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SourceError::Io {
                path: path.display().to_string(),
                source: e,
            }),
        }
    }

    async fn list_dir(&self, path: PathBuf) -> Result<Vec<(String, bool)>, SourceError> {
        let io_err = |e: std::io::Error, path: &PathBuf| SourceError::Io {
            path: path.display().to_string(),
            source: e,
        };

        let mut entries = match tokio::fs::read_dir(&path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(e, &path)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_err(e, &path))? {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .map_err(|e| io_err(e, &path))?;
            names.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
        }
        Ok(names)
    }
}

#[async_trait]
impl PackSource for FsPackSource {
    async fn read(
        &self,
        jurisdiction: &str,
        resource: &PackResource,
    ) -> Result<Option<String>, SourceError> {
        validate_jurisdiction_code(jurisdiction)?;
        let file_name = resource.file_name();
        validate_file_name(&file_name)?;

        self.read_path(self.root.join(jurisdiction).join(file_name))
            .await
    }

    async fn read_shared(&self, resource: &PackResource) -> Result<Option<String>, SourceError> {
        let file_name = resource.file_name();
        validate_file_name(&file_name)?;

        self.read_path(self.root.join(SHARED_PACK).join(file_name))
            .await
    }

    async fn jurisdictions(&self) -> Result<Vec<String>, SourceError> {
        let mut codes: Vec<String> = self
            .list_dir(self.root.clone())
            .await?
            .into_iter()
            .filter(|(name, is_dir)| *is_dir && validate_jurisdiction_code(name).is_ok())
            .map(|(name, _)| name)
            .collect();
        codes.sort();
        Ok(codes)
    }

    async fn contract_types(&self, jurisdiction: &str) -> Result<Vec<String>, SourceError> {
        validate_jurisdiction_code(jurisdiction)?;

        let mut types: Vec<String> = self
            .list_dir(self.root.join(jurisdiction))
            .await?
            .into_iter()
            .filter(|(_, is_dir)| !is_dir)
            .filter_map(|(name, _)| contract_type_from_file(&name).map(String::from))
            .collect();
        types.sort();
        Ok(types)
    }

    fn describe(&self) -> String {
        format!("fs:{}", self.root.display())
    }
}

/// In-memory pack source.
///
/// Used by tests and by hosts that embed their packs.
pub struct InMemoryPackSource {
    /// Files keyed by (pack, file name); the shared pack uses [`SHARED_PACK`]
    files: RwLock<BTreeMap<(String, String), String>>,
}

impl InMemoryPackSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self {
            files: RwLock::new(BTreeMap::new()),
        }
    }

    /// Builder: add a file to a pack.
    pub fn with_file(
        mut self,
        pack: impl Into<String>,
        file_name: impl Into<String>,
        contents: impl Into<String>,
    ) -> Self {
        self.files
            .get_mut()
            .insert((pack.into(), file_name.into()), contents.into());
        self
    }

    /// Add or replace a file.
    pub async fn insert(&self, pack: &str, file_name: &str, contents: impl Into<String>) {
        let mut files = self.files.write().await;
        files.insert((pack.to_string(), file_name.to_string()), contents.into());
    }

    /// Remove a file.
    pub async fn remove(&self, pack: &str, file_name: &str) {
        let mut files = self.files.write().await;
        files.remove(&(pack.to_string(), file_name.to_string()));
    }
}

impl Default for InMemoryPackSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PackSource for InMemoryPackSource {
    async fn read(
        &self,
        jurisdiction: &str,
        resource: &PackResource,
    ) -> Result<Option<String>, SourceError> {
        validate_jurisdiction_code(jurisdiction)?;
        let files = self.files.read().await;
        Ok(files
            .get(&(jurisdiction.to_string(), resource.file_name()))
            .cloned())
    }

    async fn read_shared(&self, resource: &PackResource) -> Result<Option<String>, SourceError> {
        let files = self.files.read().await;
        Ok(files
            .get(&(SHARED_PACK.to_string(), resource.file_name()))
            .cloned())
    }

    async fn jurisdictions(&self) -> Result<Vec<String>, SourceError> {
        let files = self.files.read().await;
        let mut codes: Vec<String> = files
            .keys()
            .map(|(pack, _)| pack.clone())
            .filter(|pack| pack != SHARED_PACK)
            .collect();
        codes.dedup();
        Ok(codes)
    }

    async fn contract_types(&self, jurisdiction: &str) -> Result<Vec<String>, SourceError> {
        let files = self.files.read().await;
        Ok(files
            .keys()
            .filter(|(pack, _)| pack == jurisdiction)
            .filter_map(|(_, file)| contract_type_from_file(file).map(String::from))
            .collect())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_file_names() {
        assert_eq!(
            PackResource::Scaffold("employment_agreement".to_string()).file_name(),
            "contract_employment_agreement.json"
        );
        assert_eq!(contract_type_from_file("contract_nda.json"), Some("nda"));
        assert_eq!(contract_type_from_file("contract_.json"), None);
        assert_eq!(contract_type_from_file("clause_library.json"), None);
    }

    #[test]
    fn test_jurisdiction_codes() {
        assert!(validate_jurisdiction_code("us_ca").is_ok());
        assert!(validate_jurisdiction_code("../etc").is_err());
        assert!(validate_jurisdiction_code("US_CA").is_err());
        assert!(validate_jurisdiction_code(SHARED_PACK).is_err());
        assert!(validate_jurisdiction_code("").is_err());
    }

    #[tokio::test]
    async fn test_in_memory_source() {
        let source = InMemoryPackSource::new()
            .with_file("us_ca", "clause_library.json", "{}")
            .with_file("us_ca", "contract_nda.json", "{}")
            .with_file("us_tx", "contract_employment_agreement.json", "{}")
            .with_file(SHARED_PACK, "disclaimer.md", "Shared");

        assert_eq!(
            source
                .read("us_ca", &PackResource::ClauseLibrary)
                .await
                .unwrap()
                .as_deref(),
            Some("{}")
        );
        assert!(source
            .read("us_tx", &PackResource::ClauseLibrary)
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            source
                .read_shared(&PackResource::Disclaimer)
                .await
                .unwrap()
                .as_deref(),
            Some("Shared")
        );
        assert_eq!(source.jurisdictions().await.unwrap(), vec!["us_ca", "us_tx"]);
        assert_eq!(source.contract_types("us_ca").await.unwrap(), vec!["nda"]);
    }

    #[tokio::test]
    async fn test_fs_source() {
        let dir = tempfile::tempdir().unwrap();
        let pack = dir.path().join("us_ca");
        std::fs::create_dir_all(&pack).unwrap();
        std::fs::create_dir_all(dir.path().join(SHARED_PACK)).unwrap();
        std::fs::write(pack.join("clause_library.json"), "{\"clauses\":{}}").unwrap();
        std::fs::write(pack.join("contract_employment_agreement.json"), "{}").unwrap();
        std::fs::write(dir.path().join(SHARED_PACK).join("disclaimer.md"), "Shared").unwrap();

        let source = FsPackSource::new(dir.path());

        let library = source.read("us_ca", &PackResource::ClauseLibrary).await.unwrap();
        assert_eq!(library.as_deref(), Some("{\"clauses\":{}}"));

        let missing = source.read("us_ca", &PackResource::RuleSet).await.unwrap();
        assert!(missing.is_none());

        let escaped = source
            .read("us_ca", &PackResource::Exhibit("../../etc/passwd".to_string()))
            .await;
        assert!(matches!(escaped, Err(SourceError::InvalidResource(_))));

        assert_eq!(source.jurisdictions().await.unwrap(), vec!["us_ca"]);
        assert_eq!(
            source.contract_types("us_ca").await.unwrap(),
            vec!["employment_agreement"]
        );
        assert!(source
            .read_shared(&PackResource::Disclaimer)
            .await
            .unwrap()
            .is_some());
    }
}
