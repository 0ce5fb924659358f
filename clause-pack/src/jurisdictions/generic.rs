//! Fallback profile for jurisdictions without built-in rules.

use crate::jurisdictions::JurisdictionProfile;
use crate::ruleset::RuleSet;

/// Universal rules only.
pub struct Generic;

impl JurisdictionProfile for Generic {
    fn code(&self) -> &'static str {
        "generic"
    }

    fn name(&self) -> &'static str {
        "Generic"
    }

    fn default_ruleset(&self) -> RuleSet {
        RuleSet::default()
    }
}
