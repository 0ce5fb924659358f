//! Jurisdiction Clause Packs
//!
//! A clause pack is the reference data for one jurisdiction:
//!
//! - **Clause library**: every clause the jurisdiction offers, with variations
//! - **Scaffolds**: the ordered clause list of each contract type
//! - **Rule profile**: which compliance checks apply
//! - **Exhibits**: supplementary sections attached on a trigger
//! - **Disclaimer**: the trailing section, shared when the pack has none
//!
//! # Key Components
//!
//! - [`PackSource`]: Trait for reading raw pack resources
//! - [`PackLoader`]: Validates resources into typed values and caches them
//! - [`PackValidator`]: Checks a whole pack and reports errors and warnings
//! - [`JurisdictionProfile`]: Built-in rule profiles per jurisdiction code
//!
//! # Example
//!
//! ```ignore
//! use clause_pack::{FsPackSource, PackLoader};
//!
//! let loader = PackLoader::new(Arc::new(FsPackSource::new("jurisdictions")));
//! let scaffold = loader.load_scaffold("us_ca", "employment_agreement").await?;
//! let library = loader.load_library("us_ca").await?;
//! ```

pub mod exhibits;
pub mod jurisdictions;
pub mod loader;
pub mod ruleset;
pub mod schema;
pub mod source;
pub mod types;
pub mod validation;

// Re-export main types
pub use exhibits::{ExhibitCatalog, ExhibitEntry};
pub use jurisdictions::{builtin_ruleset, JurisdictionProfile};
pub use loader::{PackError, PackLoader};
pub use ruleset::{category_matches, is_truthy, ExhibitRequirement, ExhibitTrigger, RuleSet, Severity, TermRule};
pub use schema::SchemaViolation;
pub use source::{FsPackSource, InMemoryPackSource, PackResource, PackSource, SourceError};
pub use types::*;
pub use validation::{PackValidator, ValidationReport};
