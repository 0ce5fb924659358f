//! California.
//!
//! Business and Professions Code section 16600 voids most post-employment
//! competition restrictions, and Labor Code section 2872 requires employers
//! to give written notice of the section 2870 limits on invention
//! assignment.

use crate::jurisdictions::JurisdictionProfile;
use crate::ruleset::{default_competition_terms, ExhibitRequirement, ExhibitTrigger, RuleSet};

/// Provider for the `us_ca` profile.
pub struct California;

impl JurisdictionProfile for California {
    fn code(&self) -> &'static str {
        "us_ca"
    }

    fn name(&self) -> &'static str {
        "California"
    }

    fn default_ruleset(&self) -> RuleSet {
        RuleSet {
            name: Some(self.name().to_string()),
            restricts_post_employment_competition: true,
            competition_terms: default_competition_terms(),
            forbidden_categories: vec!["non_compete".to_string()],
            mandatory_exhibits: vec![ExhibitRequirement {
                exhibit: "ip_notice".to_string(),
                trigger: ExhibitTrigger::AnyOf(vec![
                    ExhibitTrigger::Parameter("ip_assignment".to_string()),
                    ExhibitTrigger::Parameter("ipAssignment".to_string()),
                    ExhibitTrigger::Clause("ip_assignment".to_string()),
                ]),
                reason: Some(
                    "Labor Code 2872 requires written notice of the 2870 invention carve-out"
                        .to_string(),
                ),
            }],
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_ip_notice_trigger() {
        let ruleset = California.default_ruleset();
        let requirement = &ruleset.mandatory_exhibits[0];

        let mut params = BTreeMap::new();
        assert!(!requirement.trigger.fires(&params, &[]));

        params.insert("ipAssignment".to_string(), "true".to_string());
        assert!(requirement.trigger.fires(&params, &[]));

        assert!(requirement
            .trigger
            .fires(&BTreeMap::new(), &["ip_assignment".to_string()]));
    }
}
