//! The eight explanation-quality analyzers.
//!
//! Each analyzer is pure, synchronous CPU work over the fact table, the
//! feature ranking, and one or more explanation texts. They are commutative
//! and independently computable; the aggregate score must not depend on the
//! order they run in. Analysis ambiguity is never an error: vague or
//! malformed text scores poorly instead of failing the run.

pub mod alignment;
pub mod completeness;
pub mod compliance;
pub mod consistency;
pub mod counterfactual;
pub mod faithfulness;
pub mod readability;
pub mod specificity;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The eight quality dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Faithfulness,
    SurrogateAlignment,
    Specificity,
    Completeness,
    Consistency,
    Counterfactual,
    Compliance,
    Readability,
}

impl Dimension {
    /// Fixed aggregation weight. Compliance is a gate, not a weighted term.
    pub fn weight(&self) -> f64 {
        match self {
            Self::Faithfulness => 0.25,
            Self::SurrogateAlignment => 0.25,
            Self::Specificity => 0.15,
            Self::Completeness => 0.15,
            Self::Consistency => 0.10,
            Self::Counterfactual => 0.05,
            Self::Compliance => 0.0,
            Self::Readability => 0.05,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Faithfulness => "faithfulness",
            Self::SurrogateAlignment => "surrogate_alignment",
            Self::Specificity => "specificity",
            Self::Completeness => "completeness",
            Self::Consistency => "consistency",
            Self::Counterfactual => "counterfactual",
            Self::Compliance => "compliance",
            Self::Readability => "readability",
        }
    }

    pub const ALL: [Dimension; 8] = [
        Self::Faithfulness,
        Self::SurrogateAlignment,
        Self::Specificity,
        Self::Completeness,
        Self::Consistency,
        Self::Counterfactual,
        Self::Compliance,
        Self::Readability,
    ];
}

/// One dimension's result: a value in [0, 1] plus qualitative flags.
/// Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: Dimension,
    pub value: f64,
    pub flags: BTreeSet<String>,
}

impl DimensionScore {
    /// Create a score, clamping the value into [0, 1]. Non-finite input
    /// collapses to zero so a degenerate computation can never poison the
    /// aggregate.
    pub fn new(dimension: Dimension, value: f64) -> Self {
        let value = if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            dimension,
            value,
            flags: BTreeSet::new(),
        }
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.insert(flag.into());
        self
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }
}
