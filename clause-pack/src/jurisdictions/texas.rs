//! Texas.
//!
//! Competition restrictions ancillary to an otherwise enforceable agreement
//! are permitted (Bus. & Com. Code 15.50), so only the universal rules apply.

use crate::jurisdictions::JurisdictionProfile;
use crate::ruleset::RuleSet;

/// Provider for the `us_tx` profile.
pub struct Texas;

impl JurisdictionProfile for Texas {
    fn code(&self) -> &'static str {
        "us_tx"
    }

    fn name(&self) -> &'static str {
        "Texas"
    }

    fn default_ruleset(&self) -> RuleSet {
        RuleSet {
            name: Some(self.name().to_string()),
            ..Default::default()
        }
    }
}
