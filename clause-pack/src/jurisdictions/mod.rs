//! Built-in jurisdiction profiles.
//!
//! Each profile provides the default rule set for a jurisdiction code. A
//! pack's own `ruleset.yaml` replaces the built-in profile entirely.

pub mod california;
pub mod generic;
pub mod texas;

pub use california::California;
pub use generic::Generic;
pub use texas::Texas;

use crate::ruleset::RuleSet;

/// Trait for jurisdiction-specific default rules.
pub trait JurisdictionProfile: Send + Sync {
    /// Jurisdiction code this profile handles, e.g. `us_ca`
    fn code(&self) -> &'static str;

    /// Display name
    fn name(&self) -> &'static str;

    /// Rules applied when the pack has no ruleset of its own
    fn default_ruleset(&self) -> RuleSet;
}

/// All built-in profiles.
pub fn builtin_profiles() -> Vec<Box<dyn JurisdictionProfile>> {
    vec![Box::new(California), Box::new(Texas)]
}

/// Built-in rule set for a jurisdiction code.
///
/// Unknown codes get the generic profile, which carries only the universal
/// disclaimer rule.
pub fn builtin_ruleset(code: &str) -> RuleSet {
    builtin_profiles()
        .into_iter()
        .find(|profile| profile.code() == code)
        .map(|profile| profile.default_ruleset())
        .unwrap_or_else(|| Generic.default_ruleset())
}
