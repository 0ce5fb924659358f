//! Variation selection.
//!
//! Selection is an ordered chain of [`VariationResolver`]s. The first
//! resolver that returns a [`Resolution`] decides the wording; the chain
//! always ends in a resolver that cannot fail for a clause with variations.

use tracing::debug;

use clause_pack::{ClauseDefinition, ClauseVariation};

use crate::types::{AssemblyWarning, Preferences, SelectionSource};

/// Chosen wording for one clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub title: String,
    pub text: String,
    /// `None` when the base text was used
    pub variation: Option<String>,
    pub source: SelectionSource,
}

impl Resolution {
    fn base(clause: &ClauseDefinition) -> Self {
        Self {
            title: clause.title.clone(),
            text: clause.text.clone(),
            variation: None,
            source: SelectionSource::Base,
        }
    }

    fn from_variation(
        clause: &ClauseDefinition,
        variation: &ClauseVariation,
        source: SelectionSource,
    ) -> Self {
        let title = if variation.title.trim().is_empty() {
            clause.title.clone()
        } else {
            variation.title.clone()
        };
        Self {
            title,
            text: variation.text.clone(),
            variation: Some(variation.key.clone()),
            source,
        }
    }
}

/// Inputs a resolver may consult for one clause.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    pub preferences: &'a Preferences,
    /// Variation key from the request options
    pub explicit: Option<&'a str>,
    /// Variation key from the scaffold defaults
    pub scaffold_default: Option<&'a str>,
}

/// One step of the selection chain.
pub trait VariationResolver: Send + Sync {
    /// Name of the resolver, for logs.
    fn name(&self) -> &str;

    /// Resolve the clause, or pass to the next resolver.
    fn resolve(
        &self,
        clause: &ClauseDefinition,
        context: &SelectionContext<'_>,
        warnings: &mut Vec<AssemblyWarning>,
    ) -> Option<Resolution>;
}

/// A request option naming a variation of the clause wins verbatim.
pub struct ExplicitOption;

impl VariationResolver for ExplicitOption {
    fn name(&self) -> &str {
        "explicit_option"
    }

    fn resolve(
        &self,
        clause: &ClauseDefinition,
        context: &SelectionContext<'_>,
        warnings: &mut Vec<AssemblyWarning>,
    ) -> Option<Resolution> {
        let key = context.explicit?;
        match clause.variation(key) {
            Some(variation) => Some(Resolution::from_variation(
                clause,
                variation,
                SelectionSource::Explicit,
            )),
            None => {
                warnings.push(AssemblyWarning::UnknownVariation {
                    clause_id: clause.id.clone(),
                    variation: key.to_string(),
                    from_request: true,
                });
                None
            }
        }
    }
}

/// The scaffold's default variation for the clause.
pub struct ScaffoldDefault;

impl VariationResolver for ScaffoldDefault {
    fn name(&self) -> &str {
        "scaffold_default"
    }

    fn resolve(
        &self,
        clause: &ClauseDefinition,
        context: &SelectionContext<'_>,
        warnings: &mut Vec<AssemblyWarning>,
    ) -> Option<Resolution> {
        let key = context.scaffold_default?;
        match clause.variation(key) {
            Some(variation) => Some(Resolution::from_variation(
                clause,
                variation,
                SelectionSource::ScaffoldDefault,
            )),
            None => {
                warnings.push(AssemblyWarning::UnknownVariation {
                    clause_id: clause.id.clone(),
                    variation: key.to_string(),
                    from_request: false,
                });
                None
            }
        }
    }
}

/// A clause without variations uses its base wording.
pub struct BaseText;

impl VariationResolver for BaseText {
    fn name(&self) -> &str {
        "base_text"
    }

    fn resolve(
        &self,
        clause: &ClauseDefinition,
        _context: &SelectionContext<'_>,
        _warnings: &mut Vec<AssemblyWarning>,
    ) -> Option<Resolution> {
        (!clause.has_variations()).then(|| Resolution::base(clause))
    }
}

/// First variation whose tags match both preferences.
pub struct PreferenceMatch;

impl VariationResolver for PreferenceMatch {
    fn name(&self) -> &str {
        "preference_match"
    }

    fn resolve(
        &self,
        clause: &ClauseDefinition,
        context: &SelectionContext<'_>,
        _warnings: &mut Vec<AssemblyWarning>,
    ) -> Option<Resolution> {
        let wanted = context.preferences;
        clause
            .variations
            .iter()
            .find(|v| {
                v.tags.map_or(false, |tags| {
                    tags.risk_level == wanted.risk_tolerance
                        && tags.legal_stance == wanted.legal_stance
                })
            })
            .map(|v| Resolution::from_variation(clause, v, SelectionSource::PreferenceMatch))
    }
}

/// First-defined variation; base text if there is none.
pub struct FirstDefined;

impl VariationResolver for FirstDefined {
    fn name(&self) -> &str {
        "first_defined"
    }

    fn resolve(
        &self,
        clause: &ClauseDefinition,
        _context: &SelectionContext<'_>,
        _warnings: &mut Vec<AssemblyWarning>,
    ) -> Option<Resolution> {
        Some(match clause.variations.first() {
            Some(first) => Resolution::from_variation(clause, first, SelectionSource::Fallback),
            None => Resolution::base(clause),
        })
    }
}

/// Ordered resolver chain.
pub struct VariationSelector {
    resolvers: Vec<Box<dyn VariationResolver>>,
}

impl Default for VariationSelector {
    /// explicit option → scaffold default → base text → tag match → first defined
    fn default() -> Self {
        Self {
            resolvers: vec![
                Box::new(ExplicitOption),
                Box::new(ScaffoldDefault),
                Box::new(BaseText),
                Box::new(PreferenceMatch),
                Box::new(FirstDefined),
            ],
        }
    }
}

impl VariationSelector {
    /// Build a chain from explicit resolvers.
    pub fn with_resolvers(resolvers: Vec<Box<dyn VariationResolver>>) -> Self {
        Self { resolvers }
    }

    /// Resolve a clause. Never fails: the default chain ends in
    /// [`FirstDefined`], and a custom chain that resolves nothing yields
    /// the base wording.
    pub fn select(
        &self,
        clause: &ClauseDefinition,
        context: &SelectionContext<'_>,
        warnings: &mut Vec<AssemblyWarning>,
    ) -> Resolution {
        for resolver in &self.resolvers {
            if let Some(resolution) = resolver.resolve(clause, context, warnings) {
                debug!(
                    clause_id = %clause.id,
                    resolver = resolver.name(),
                    variation = resolution.variation.as_deref().unwrap_or("-"),
                    "Resolved clause wording"
                );
                return resolution;
            }
        }
        Resolution::base(clause)
    }
}

/// Select with the default chain and no scaffold default.
pub fn select_variation(
    clause: &ClauseDefinition,
    preferences: &Preferences,
    explicit_override: Option<&str>,
) -> Resolution {
    let context = SelectionContext {
        preferences,
        explicit: explicit_override,
        scaffold_default: None,
    };
    VariationSelector::default().select(clause, &context, &mut Vec::new())
}
