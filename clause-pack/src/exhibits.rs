//! Exhibit catalogs.
//!
//! An exhibit is a supplementary section appended after the clause body when
//! its trigger fires. The catalog (`exhibits.map.json`) maps exhibit keys to
//! markdown files inside the jurisdiction pack.

use serde::{Deserialize, Serialize};

use crate::ruleset::ExhibitTrigger;

/// One exhibit known to a jurisdiction pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExhibitEntry {
    pub key: String,
    /// File name relative to the jurisdiction directory
    pub file: String,
    pub title: Option<String>,
    /// `None` means the exhibit is only attached through a rule requirement
    pub trigger: Option<ExhibitTrigger>,
    /// A mandatory exhibit missing its file is an advisory violation
    /// rather than a plain warning
    pub mandatory: bool,
}

/// The exhibits of one jurisdiction, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExhibitCatalog {
    pub entries: Vec<ExhibitEntry>,
}

impl ExhibitCatalog {
    pub fn get(&self, key: &str) -> Option<&ExhibitEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
