//! Canonical fact tables: the ground truth for claim verification.
//!
//! Fact extraction normalizes a raw profile into canonical units so that
//! claims extracted from explanation text can be compared value-to-value:
//! currency strings become plain numbers, percentages become ratios,
//! duration strings become years, and categories are case-folded.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ProfileError;
use crate::profile::{
    attribute_kind, categorical_attribute, AttributeKind, AttributeValue, Profile,
    REQUIRED_ATTRIBUTES,
};

/// A single normalized fact derived from a profile attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub kind: AttributeKind,
    pub value: AttributeValue,
}

impl Fact {
    pub fn numeric(&self) -> Option<f64> {
        self.value.as_numeric()
    }

    pub fn categorical(&self) -> Option<&str> {
        self.value.as_categorical()
    }
}

/// Canonical attribute table for one profile. One per profile; used as
/// ground truth for claim verification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactTable {
    facts: BTreeMap<String, Fact>,
}

impl FactTable {
    /// Build the fact table from a profile, normalizing units and spellings.
    ///
    /// Fails with a `ProfileError` if a required attribute is absent or a
    /// required value cannot be normalized. Fatal for the run: no explanation
    /// quality score is possible without ground truth.
    pub fn from_profile(profile: &Profile) -> Result<FactTable, ProfileError> {
        for required in REQUIRED_ATTRIBUTES {
            if !profile.contains(required) {
                return Err(ProfileError::MissingAttribute {
                    attribute: required.to_string(),
                });
            }
        }

        let mut facts = BTreeMap::new();
        for (name, value) in profile.attributes() {
            let fact = normalize_attribute(name, value)?;
            facts.insert(name.clone(), fact);
        }
        Ok(FactTable { facts })
    }

    pub fn get(&self, name: &str) -> Option<&Fact> {
        self.facts.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.facts.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Fact)> {
        self.facts.iter()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

/// Normalize one attribute into a fact.
///
/// Schema-known attributes are coerced to their schema kind; attributes
/// outside the schema keep their profile type (numeric stays numeric,
/// strings are case-folded and kept categorical).
fn normalize_attribute(name: &str, value: &AttributeValue) -> Result<Fact, ProfileError> {
    match attribute_kind(name) {
        Some(AttributeKind::Numeric) => {
            let numeric = match value {
                AttributeValue::Numeric(v) => *v,
                AttributeValue::Categorical(raw) | AttributeValue::Text(raw) => {
                    parse_quantity(raw).ok_or_else(|| ProfileError::UnparseableValue {
                        attribute: name.to_string(),
                        raw: raw.clone(),
                    })?
                }
            };
            Ok(Fact {
                kind: AttributeKind::Numeric,
                value: AttributeValue::Numeric(numeric),
            })
        }
        Some(AttributeKind::Categorical) => {
            let raw = match value {
                AttributeValue::Categorical(v) | AttributeValue::Text(v) => v.clone(),
                AttributeValue::Numeric(v) => v.to_string(),
            };
            let folded = fold_category(&raw);
            let schema = categorical_attribute(name);
            if let Some(schema) = schema {
                if !schema.categories.contains(&folded.as_str()) {
                    return Err(ProfileError::UnknownCategory {
                        attribute: name.to_string(),
                        value: raw,
                    });
                }
            }
            Ok(Fact {
                kind: AttributeKind::Categorical,
                value: AttributeValue::Categorical(folded),
            })
        }
        None => {
            let value = match value {
                AttributeValue::Numeric(v) => AttributeValue::Numeric(*v),
                AttributeValue::Categorical(v) | AttributeValue::Text(v) => {
                    match parse_quantity(v) {
                        Some(n) => AttributeValue::Numeric(n),
                        None => AttributeValue::Categorical(fold_category(v)),
                    }
                }
            };
            Ok(Fact {
                kind: match value {
                    AttributeValue::Numeric(_) => AttributeKind::Numeric,
                    _ => AttributeKind::Categorical,
                },
                value,
            })
        }
    }
}

/// Case-fold and trim a categorical spelling, collapsing internal whitespace
/// and separators ("Self-Employed" and "self employed" both become
/// "self_employed").
pub fn fold_category(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut last_sep = false;
    for ch in lowered.chars() {
        if ch.is_whitespace() || ch == '-' || ch == '_' {
            if !last_sep && !out.is_empty() {
                out.push('_');
            }
            last_sep = true;
        } else {
            out.push(ch);
            last_sep = false;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Parse a human-written quantity into a canonical number.
///
/// Handles currency ("$120,000" -> 120000.0), percentages ("25%" -> 0.25),
/// durations ("12 years" -> 12.0), and plain numbers with thousands
/// separators. Returns `None` for text that carries no single quantity.
pub fn parse_quantity(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lowered = trimmed.to_lowercase();
    let is_percent = trimmed.ends_with('%') || lowered.ends_with("percent");
    let is_duration = lowered.ends_with("years")
        || lowered.ends_with("year")
        || lowered.ends_with("yrs")
        || lowered.ends_with("months")
        || lowered.ends_with("month");
    let months = lowered.ends_with("months") || lowered.ends_with("month");

    let digits: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if digits.is_empty() {
        return None;
    }
    let value: f64 = digits.parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    if is_percent {
        Some(value / 100.0)
    } else if is_duration {
        if months {
            Some(value / 12.0)
        } else {
            Some(value)
        }
    } else {
        Some(value)
    }
}
