//! Placeholder substitution.
//!
//! A [`Tokenizer`] finds the placeholder tokens of one bracket convention.
//! A library uses exactly one convention, so tokens written in any other
//! convention pass through untouched.

use std::collections::BTreeMap;

use regex::{Captures, Regex};

use clause_pack::PlaceholderSyntax;

use crate::types::{AssemblyError, Result};

/// Marker written in place of a token that has no value.
pub fn missing_marker(name: &str) -> String {
    format!("[!!MISSING_DATA: {}!!]", name)
}

/// Output of one substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub text: String,
    /// Unresolved token names, de-duplicated, first-seen order
    pub missing: Vec<String>,
}

/// Token finder for one placeholder convention.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    syntax: PlaceholderSyntax,
    pattern: Regex,
}

impl Tokenizer {
    pub fn new(syntax: PlaceholderSyntax) -> Result<Self> {
        let pattern = Regex::new(syntax.token_pattern())
            .map_err(|e| AssemblyError::Config(format!("placeholder pattern: {}", e)))?;
        Ok(Self { syntax, pattern })
    }

    pub fn syntax(&self) -> PlaceholderSyntax {
        self.syntax
    }

    /// Trimmed token names in `text`, in order of appearance.
    pub fn tokens<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
    }

    /// Replace every token with its parameter value or the missing marker.
    ///
    /// Never fails; unresolved names are reported in `missing`.
    pub fn substitute(&self, text: &str, parameters: &BTreeMap<String, String>) -> Substitution {
        let mut missing: Vec<String> = Vec::new();

        let replaced = self.pattern.replace_all(text, |caps: &Captures<'_>| {
            let name = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            match parameters.get(name) {
                Some(value) => value.clone(),
                None => {
                    if !missing.iter().any(|m| m == name) {
                        missing.push(name.to_string());
                    }
                    missing_marker(name)
                }
            }
        });

        Substitution {
            text: replaced.into_owned(),
            missing,
        }
    }
}

/// Substitute with a one-off tokenizer.
pub fn substitute(
    syntax: PlaceholderSyntax,
    text: &str,
    parameters: &BTreeMap<String, String>,
) -> Result<Substitution> {
    Ok(Tokenizer::new(syntax)?.substitute(text, parameters))
}

/// Merge `more` into `into`, keeping first-seen order without duplicates.
pub fn merge_missing(into: &mut Vec<String>, more: Vec<String>) {
    for name in more {
        if !into.contains(&name) {
            into.push(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_missing_token_is_flagged() {
        let tokenizer = Tokenizer::new(PlaceholderSyntax::Square).unwrap();
        let result = tokenizer.substitute("[A] owes [ B ] to [A].", &params(&[("A", "x")]));

        assert_eq!(result.text, "x owes [!!MISSING_DATA: B!!] to x.");
        assert_eq!(result.missing, vec!["B"]);
    }

    #[test]
    fn test_blank_brackets_are_not_tokens() {
        let tokenizer = Tokenizer::new(PlaceholderSyntax::Square).unwrap();
        let text = "- [ ] Employee received handbook\n- [] Signed";
        let result = tokenizer.substitute(text, &BTreeMap::new());

        assert_eq!(result.text, text);
        assert!(result.missing.is_empty());
        assert_eq!(tokenizer.tokens(text).count(), 0);
    }

    #[test]
    fn test_missing_names_deduplicated_in_order() {
        let tokenizer = Tokenizer::new(PlaceholderSyntax::Square).unwrap();
        let result = tokenizer.substitute("[Z] [Y] [Z] [Start Date]", &BTreeMap::new());
        assert_eq!(result.missing, vec!["Z", "Y", "Start Date"]);
    }

    #[test]
    fn test_handlebars_convention() {
        let tokenizer = Tokenizer::new(PlaceholderSyntax::Handlebars).unwrap();
        let result = tokenizer.substitute(
            "Pay ${{salary}} to {{ employeeName }}, not [Employee Name].",
            &params(&[("salary", "100000"), ("employeeName", "Jane Doe")]),
        );

        assert_eq!(result.text, "Pay 100000 to Jane Doe, not [Employee Name].");
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_other_convention_untouched() {
        let tokenizer = Tokenizer::new(PlaceholderSyntax::Square).unwrap();
        let result = tokenizer.substitute("Hello {{name}}", &BTreeMap::new());
        assert_eq!(result.text, "Hello {{name}}");
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_marker_is_not_a_token() {
        let tokenizer = Tokenizer::new(PlaceholderSyntax::Square).unwrap();
        let once = tokenizer.substitute("[B]", &BTreeMap::new());
        let twice = tokenizer.substitute(&once.text, &BTreeMap::new());
        assert_eq!(twice.text, once.text);
        assert!(twice.missing.is_empty());
    }

    #[test]
    fn test_tokens_listing() {
        let tokenizer = Tokenizer::new(PlaceholderSyntax::Square).unwrap();
        let tokens: Vec<&str> = tokenizer.tokens("[ A ] and [B/C]").collect();
        assert_eq!(tokens, vec!["A", "B/C"]);
    }
}
