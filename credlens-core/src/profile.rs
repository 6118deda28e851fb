//! Applicant profiles and the canonical attribute schema.
//!
//! A `Profile` is the immutable reference instance for one explanation run:
//! a mapping of attribute name to typed value. The attribute schema defines
//! the numeric ranges and categorical universes used for perturbation,
//! normalized distance, and counterfactual probes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A typed attribute value in an applicant profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Numeric(f64),
    Categorical(String),
    Text(String),
}

impl AttributeValue {
    /// Return the numeric value, if this is a numeric attribute.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Self::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    /// Return the category, if this is a categorical attribute.
    pub fn as_categorical(&self) -> Option<&str> {
        match self {
            Self::Categorical(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        Self::Numeric(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Numeric(v as f64)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::Categorical(v.to_string())
    }
}

/// An applicant profile: attribute name to typed value.
///
/// Immutable once constructed. Built via [`ProfileBuilder`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Profile {
    attributes: BTreeMap<String, AttributeValue>,
}

impl Profile {
    pub fn builder() -> ProfileBuilder {
        ProfileBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Return a copy of this profile with one attribute replaced.
    ///
    /// The only sanctioned way to derive a variant of a reference profile;
    /// the profile itself never mutates.
    pub fn with_attribute(&self, name: &str, value: AttributeValue) -> Profile {
        let mut attributes = self.attributes.clone();
        attributes.insert(name.to_string(), value);
        Profile { attributes }
    }
}

impl FromIterator<(String, AttributeValue)> for Profile {
    fn from_iter<T: IntoIterator<Item = (String, AttributeValue)>>(iter: T) -> Self {
        Profile {
            attributes: iter.into_iter().collect(),
        }
    }
}

/// Builder for [`Profile`].
#[derive(Debug, Default)]
pub struct ProfileBuilder {
    attributes: BTreeMap<String, AttributeValue>,
}

impl ProfileBuilder {
    pub fn attribute(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn build(self) -> Profile {
        Profile {
            attributes: self.attributes,
        }
    }
}

/// The kind of an attribute in the canonical schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Numeric,
    Categorical,
}

/// Schema entry for a numeric attribute: the plausible value range used for
/// normalized distance and perturbation clamping.
#[derive(Debug, Clone, Copy)]
pub struct NumericAttribute {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
}

impl NumericAttribute {
    /// Width of the plausible range; never zero for schema entries.
    pub fn range_width(&self) -> f64 {
        self.max - self.min
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Schema entry for a categorical attribute: the category universe and the
/// category treated as "more favorable" by counterfactual probes.
#[derive(Debug, Clone, Copy)]
pub struct CategoricalAttribute {
    pub name: &'static str,
    pub categories: &'static [&'static str],
    pub favorable: &'static str,
}

/// Numeric attributes of the canonical applicant schema.
///
/// Ranges bound the perturbation space and normalize distances; they are
/// deliberately generous so real profiles never sit on a boundary.
pub const NUMERIC_ATTRIBUTES: &[NumericAttribute] = &[
    NumericAttribute {
        name: "income",
        min: 0.0,
        max: 250_000.0,
    },
    NumericAttribute {
        name: "employment_duration_years",
        min: 0.0,
        max: 40.0,
    },
    NumericAttribute {
        name: "existing_loans",
        min: 0.0,
        max: 10.0,
    },
    NumericAttribute {
        name: "loan_amount",
        min: 0.0,
        max: 500_000.0,
    },
    NumericAttribute {
        name: "credit_limit",
        min: 0.0,
        max: 100_000.0,
    },
    NumericAttribute {
        name: "used_credit",
        min: 0.0,
        max: 100_000.0,
    },
    NumericAttribute {
        name: "credit_utilization",
        min: 0.0,
        max: 1.0,
    },
    NumericAttribute {
        name: "payment_defaults",
        min: 0.0,
        max: 10.0,
    },
    NumericAttribute {
        name: "credit_inquiries_last_6_months",
        min: 0.0,
        max: 20.0,
    },
    NumericAttribute {
        name: "address_stability_years",
        min: 0.0,
        max: 40.0,
    },
    NumericAttribute {
        name: "household_size",
        min: 1.0,
        max: 10.0,
    },
];

/// Categorical attributes of the canonical applicant schema.
pub const CATEGORICAL_ATTRIBUTES: &[CategoricalAttribute] = &[
    CategoricalAttribute {
        name: "employment_status",
        categories: &["employed", "self_employed", "unemployed", "retired"],
        favorable: "employed",
    },
    CategoricalAttribute {
        name: "housing_status",
        categories: &["rent", "owner", "mortgage"],
        favorable: "owner",
    },
];

/// Attributes that must be present for fact extraction to succeed.
pub const REQUIRED_ATTRIBUTES: &[&str] = &[
    "income",
    "employment_status",
    "credit_limit",
    "used_credit",
    "payment_defaults",
];

/// Look up the numeric schema entry for an attribute.
pub fn numeric_attribute(name: &str) -> Option<&'static NumericAttribute> {
    NUMERIC_ATTRIBUTES.iter().find(|a| a.name == name)
}

/// Look up the categorical schema entry for an attribute.
pub fn categorical_attribute(name: &str) -> Option<&'static CategoricalAttribute> {
    CATEGORICAL_ATTRIBUTES.iter().find(|a| a.name == name)
}

/// The schema kind of a known attribute, or `None` for attributes outside
/// the canonical schema (which pass through fact extraction untyped).
pub fn attribute_kind(name: &str) -> Option<AttributeKind> {
    if numeric_attribute(name).is_some() {
        Some(AttributeKind::Numeric)
    } else if categorical_attribute(name).is_some() {
        Some(AttributeKind::Categorical)
    } else {
        None
    }
}
