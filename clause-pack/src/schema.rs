//! Schema validation for pack resources.
//!
//! Pack resources are authored by hand as JSON/YAML. Each parser walks the
//! whole resource once and either returns the typed value or every
//! violation it found, so a pack author sees all problems in one pass.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::exhibits::{ExhibitCatalog, ExhibitEntry};
use crate::ruleset::{ExhibitTrigger, RuleSet};
use crate::types::*;

/// A single schema problem in a pack resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaViolation {
    /// Dotted path to the offending value, e.g. `clauses.term.title`
    pub location: String,
    pub message: String,
}

impl SchemaViolation {
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// First value present under any of the accepted key spellings.
fn field<'a>(object: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| object.get(*name))
}

fn parse_json(raw: &str, location: &str) -> Result<Value, Vec<SchemaViolation>> {
    serde_json::from_str(raw)
        .map_err(|e| vec![SchemaViolation::new(location, format!("invalid JSON: {}", e))])
}

/// Parse and validate a `clause_library.json`.
pub fn parse_library(jurisdiction: &str, raw: &str) -> Result<ClauseLibrary, Vec<SchemaViolation>> {
    let root = parse_json(raw, "clause_library")?;
    let root = root
        .as_object()
        .ok_or_else(|| vec![SchemaViolation::new("clause_library", "must be a JSON object")])?;

    let mut violations = Vec::new();

    let placeholder_syntax = match field(root, &["placeholderSyntax", "placeholder_syntax"]) {
        None => PlaceholderSyntax::default(),
        Some(Value::String(s)) => PlaceholderSyntax::parse(s).unwrap_or_else(|| {
            violations.push(SchemaViolation::new(
                "placeholderSyntax",
                format!("unknown placeholder convention '{}'", s),
            ));
            PlaceholderSyntax::default()
        }),
        Some(_) => {
            violations.push(SchemaViolation::new("placeholderSyntax", "must be a string"));
            PlaceholderSyntax::default()
        }
    };

    let clauses_value = match root.get("clauses") {
        Some(Value::Object(map)) => map,
        _ => {
            violations.push(SchemaViolation::new(
                "clauses",
                "missing or invalid clauses object",
            ));
            return Err(violations);
        }
    };

    let mut clauses = Vec::with_capacity(clauses_value.len());
    for (id, value) in clauses_value {
        if let Some(clause) = parse_clause(id, value, &mut violations) {
            clauses.push(clause);
        }
    }

    if violations.is_empty() {
        Ok(ClauseLibrary {
            jurisdiction: jurisdiction.to_string(),
            placeholder_syntax,
            clauses,
        })
    } else {
        Err(violations)
    }
}

fn parse_clause(
    id: &str,
    value: &Value,
    violations: &mut Vec<SchemaViolation>,
) -> Option<ClauseDefinition> {
    let location = format!("clauses.{}", id);
    let Some(object) = value.as_object() else {
        violations.push(SchemaViolation::new(location, "clause must be an object"));
        return None;
    };

    let before = violations.len();

    let title = match object.get("title") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => {
            violations.push(SchemaViolation::new(
                format!("{}.title", location),
                "missing title",
            ));
            String::new()
        }
    };

    let text = match field(object, &["text", "clause"]) {
        Some(Value::String(s)) => s.clone(),
        _ => {
            violations.push(SchemaViolation::new(
                format!("{}.text", location),
                "missing text",
            ));
            String::new()
        }
    };

    let category = match object.get("category") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            violations.push(SchemaViolation::new(
                format!("{}.category", location),
                "must be a string",
            ));
            None
        }
    };

    let mut variations = Vec::new();
    match object.get("variations") {
        None | Some(Value::Null) => {}
        Some(Value::Object(map)) => {
            for (key, value) in map {
                if let Some(variation) =
                    parse_variation(&location, key, value, violations)
                {
                    variations.push(variation);
                }
            }
        }
        Some(_) => violations.push(SchemaViolation::new(
            format!("{}.variations", location),
            "must be an object keyed by variation name",
        )),
    }

    if violations.len() > before {
        return None;
    }

    Some(ClauseDefinition {
        id: id.to_string(),
        title,
        text,
        category,
        variations,
    })
}

fn parse_variation(
    clause_location: &str,
    key: &str,
    value: &Value,
    violations: &mut Vec<SchemaViolation>,
) -> Option<ClauseVariation> {
    let location = format!("{}.variations.{}", clause_location, key);
    let Some(object) = value.as_object() else {
        violations.push(SchemaViolation::new(location, "variation must be an object"));
        return None;
    };

    let title = match object.get("title") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            violations.push(SchemaViolation::new(
                format!("{}.title", location),
                "must be a string",
            ));
            return None;
        }
    };

    let text = match field(object, &["text", "clause"]) {
        Some(Value::String(s)) => s.clone(),
        _ => {
            violations.push(SchemaViolation::new(
                format!("{}.text", location),
                "missing text",
            ));
            return None;
        }
    };

    // Tags live in a `tags` object; older libraries put them on the variation itself.
    let tag_source = match object.get("tags") {
        Some(Value::Object(tags)) => Some(tags),
        Some(_) => {
            violations.push(SchemaViolation::new(
                format!("{}.tags", location),
                "must be an object",
            ));
            return None;
        }
        None if field(object, &["riskLevel", "risk_level"]).is_some() => Some(object),
        None => None,
    };

    let tags = match tag_source {
        None => None,
        Some(tags) => Some(parse_tags(&location, tags, violations)?),
    };

    Some(ClauseVariation {
        key: key.to_string(),
        title,
        text,
        tags,
    })
}

fn parse_tags(
    location: &str,
    tags: &Map<String, Value>,
    violations: &mut Vec<SchemaViolation>,
) -> Option<VariationTags> {
    let risk = field(tags, &["riskLevel", "risk_level"]).and_then(Value::as_str);
    let stance = field(tags, &["legalStance", "legal_stance"]).and_then(Value::as_str);

    let risk_level = match risk.map(|r| (r, RiskLevel::parse(r))) {
        Some((_, Some(level))) => Some(level),
        Some((raw, None)) => {
            violations.push(SchemaViolation::new(
                format!("{}.tags.riskLevel", location),
                format!("unknown risk level '{}'", raw),
            ));
            None
        }
        None => {
            violations.push(SchemaViolation::new(
                format!("{}.tags.riskLevel", location),
                "missing risk level",
            ));
            None
        }
    };

    let legal_stance = match stance.map(|s| (s, LegalStance::parse(s))) {
        Some((_, Some(stance))) => Some(stance),
        Some((raw, None)) => {
            violations.push(SchemaViolation::new(
                format!("{}.tags.legalStance", location),
                format!("unknown legal stance '{}'", raw),
            ));
            None
        }
        None => {
            violations.push(SchemaViolation::new(
                format!("{}.tags.legalStance", location),
                "missing legal stance",
            ));
            None
        }
    };

    Some(VariationTags {
        risk_level: risk_level?,
        legal_stance: legal_stance?,
    })
}

/// Parse and validate a `contract_<type>.json` scaffold.
pub fn parse_scaffold(
    contract_type: &str,
    raw: &str,
) -> Result<ContractScaffold, Vec<SchemaViolation>> {
    let root = parse_json(raw, "scaffold")?;
    let root = root
        .as_object()
        .ok_or_else(|| vec![SchemaViolation::new("scaffold", "must be a JSON object")])?;

    let mut violations = Vec::new();

    let title = match root.get("title") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => {
            violations.push(SchemaViolation::new("title", "missing title"));
            String::new()
        }
    };

    let mut clause_order = Vec::new();
    match field(root, &["clause_order", "clauseOrder", "clauses"]) {
        Some(Value::Array(items)) => {
            let mut seen = HashSet::new();
            for (index, item) in items.iter().enumerate() {
                match item.as_str() {
                    Some(id) if !seen.insert(id.to_string()) => {
                        violations.push(SchemaViolation::new(
                            format!("clauses[{}]", index),
                            format!("clause '{}' appears more than once", id),
                        ));
                    }
                    Some(id) => clause_order.push(id.to_string()),
                    None => violations.push(SchemaViolation::new(
                        format!("clauses[{}]", index),
                        "clause id must be a string",
                    )),
                }
            }
        }
        _ => violations.push(SchemaViolation::new(
            "clauses",
            "missing or invalid clauses array",
        )),
    }

    let mut default_options = BTreeMap::new();
    match field(root, &["default_options", "defaultOptions"]) {
        None | Some(Value::Null) => {}
        Some(Value::Object(map)) => {
            for (clause_id, value) in map {
                match value.as_str() {
                    Some(key) => {
                        default_options.insert(clause_id.clone(), key.to_string());
                    }
                    None => violations.push(SchemaViolation::new(
                        format!("default_options.{}", clause_id),
                        "variation key must be a string",
                    )),
                }
            }
        }
        Some(_) => violations.push(SchemaViolation::new(
            "default_options",
            "must be an object of clause id to variation key",
        )),
    }

    let (primary_party, counterparty) = match root.get("parties") {
        None | Some(Value::Null) => (None, None),
        Some(Value::Object(parties)) => (
            parse_party(parties.get("primary"), "parties.primary", &mut violations),
            parse_party(parties.get("counterparty"), "parties.counterparty", &mut violations),
        ),
        Some(_) => {
            violations.push(SchemaViolation::new("parties", "must be an object"));
            (None, None)
        }
    };

    if violations.is_empty() {
        Ok(ContractScaffold {
            contract_type: contract_type.to_string(),
            title,
            clause_order,
            default_options,
            primary_party,
            counterparty,
        })
    } else {
        Err(violations)
    }
}

fn parse_party(
    value: Option<&Value>,
    location: &str,
    violations: &mut Vec<SchemaViolation>,
) -> Option<PartySpec> {
    let object = match value {
        None | Some(Value::Null) => return None,
        Some(Value::Object(object)) => object,
        Some(_) => {
            violations.push(SchemaViolation::new(location, "must be an object"));
            return None;
        }
    };

    let parameters: Vec<String> = match (object.get("parameter"), object.get("parameters")) {
        (Some(Value::String(p)), _) => vec![p.clone()],
        (_, Some(Value::Array(items))) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    };
    if parameters.is_empty() {
        violations.push(SchemaViolation::new(
            format!("{}.parameter", location),
            "missing party parameter name",
        ));
    }

    let label = match object.get("label") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => {
            violations.push(SchemaViolation::new(
                format!("{}.label", location),
                "missing party label",
            ));
            String::new()
        }
    };

    Some(PartySpec { parameters, label })
}

/// Parse and validate a `ruleset.yaml`.
pub fn parse_ruleset(raw: &str) -> Result<RuleSet, Vec<SchemaViolation>> {
    let ruleset = RuleSet::from_yaml(raw)
        .map_err(|e| vec![SchemaViolation::new("ruleset", format!("invalid YAML: {}", e))])?;

    let mut violations = Vec::new();
    for (index, rule) in ruleset.forbidden_terms.iter().enumerate() {
        if rule.terms.iter().all(|t| t.trim().is_empty()) {
            violations.push(SchemaViolation::new(
                format!("forbidden_terms[{}]", index),
                format!("rule '{}' has no terms", rule.name),
            ));
        }
    }
    if ruleset.restricts_post_employment_competition && ruleset.competition_terms.is_empty() {
        violations.push(SchemaViolation::new(
            "competition_terms",
            "competition restriction enabled without any terms",
        ));
    }

    if violations.is_empty() {
        Ok(ruleset)
    } else {
        Err(violations)
    }
}

/// Full form of a catalog entry; the short form is just a file name.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawExhibit {
    File(String),
    Entry {
        file: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        trigger: Option<ExhibitTrigger>,
        #[serde(default)]
        mandatory: bool,
    },
}

/// Parse and validate an `exhibits.map.json`.
///
/// The short form `"ip_assignment": "exhibit_a.md"` attaches the file when
/// the parameter named like the key is truthy.
pub fn parse_exhibit_catalog(raw: &str) -> Result<ExhibitCatalog, Vec<SchemaViolation>> {
    let root = parse_json(raw, "exhibits")?;
    let root = root
        .as_object()
        .ok_or_else(|| vec![SchemaViolation::new("exhibits", "must be a JSON object")])?;

    let mut violations = Vec::new();
    let mut entries = Vec::with_capacity(root.len());

    for (key, value) in root {
        match serde_json::from_value::<RawExhibit>(value.clone()) {
            Ok(RawExhibit::File(file)) => entries.push(ExhibitEntry {
                key: key.clone(),
                file,
                title: None,
                trigger: Some(ExhibitTrigger::Parameter(key.clone())),
                mandatory: false,
            }),
            Ok(RawExhibit::Entry {
                file,
                title,
                trigger,
                mandatory,
            }) => entries.push(ExhibitEntry {
                key: key.clone(),
                file,
                title,
                trigger,
                mandatory,
            }),
            Err(e) => violations.push(SchemaViolation::new(
                format!("exhibits.{}", key),
                format!("invalid exhibit entry: {}", e),
            )),
        }
    }

    for entry in &entries {
        if entry.file.contains('/') || entry.file.contains('\\') || entry.file.contains("..") {
            violations.push(SchemaViolation::new(
                format!("exhibits.{}.file", entry.key),
                "exhibit file must be a plain file name inside the jurisdiction",
            ));
        }
    }

    if violations.is_empty() {
        Ok(ExhibitCatalog { entries })
    } else {
        Err(violations)
    }
}
