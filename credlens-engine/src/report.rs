//! Aggregate scoring and the terminal quality report.
//!
//! Combines the eight dimension scores under fixed weights, applies the
//! compliance gate, derives the quality level, and emits targeted
//! recommendations in a fixed priority order. The report is created once,
//! immutable, and returned to the caller; this engine has no opinion about
//! how it is rendered downstream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analyzers::{Dimension, DimensionScore};
use crate::ranking::FeatureRanking;

/// Score ceiling applied when the compliance gate fails. The gate strictly
/// dominates the weighted sum.
pub const COMPLIANCE_CAP: f64 = 20.0;

/// Quality bands over the final 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::Excellent
        } else if score >= 80.0 {
            Self::Good
        } else if score >= 70.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

/// Surrogate fit diagnostics carried on the report for auditability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurrogateDiagnostics {
    pub fit_quality: f64,
    pub sample_count: usize,
    pub samples_attempted: usize,
    pub dropped_columns: Vec<String>,
    /// Set when `fit_quality` fell below the configured floor; the
    /// explanation's reliability signal, never silently accepted.
    pub low_fidelity: bool,
}

/// The terminal artifact of one explanation-quality run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Score the collaborator returned for the unperturbed profile, when a
    /// baseline call succeeded.
    pub baseline_score: Option<f64>,
    pub baseline_classification: Option<String>,
    /// The surrogate's top-K feature ranking, for downstream rendering.
    pub ranking: FeatureRanking,
    pub dimensions: Vec<DimensionScore>,
    pub compliance_pass: bool,
    pub final_score: f64,
    pub quality_level: QualityLevel,
    /// Critical findings surfaced regardless of the numeric score.
    pub critical_flags: Vec<String>,
    pub recommendations: Vec<String>,
    pub surrogate: SurrogateDiagnostics,
}

impl QualityReport {
    pub fn dimension(&self, dimension: Dimension) -> Option<&DimensionScore> {
        self.dimensions.iter().find(|d| d.dimension == dimension)
    }
}

/// Per-dimension recommendation thresholds, in emission priority order
/// (compliance is handled first, separately).
const RECOMMENDATION_RULES: &[(Dimension, f64, &str)] = &[
    (
        Dimension::Faithfulness,
        0.6,
        "Explanations lack grounding in the applicant's actual input values; cite real figures",
    ),
    (
        Dimension::SurrogateAlignment,
        0.6,
        "Explanations are poorly aligned with the features that drove the decision",
    ),
    (
        Dimension::Specificity,
        0.4,
        "Explanations are too vague; include concrete values and actionable next steps",
    ),
    (
        Dimension::Completeness,
        0.5,
        "Explanations omit important decision factors identified by the local surrogate",
    ),
    (
        Dimension::Consistency,
        0.5,
        "Explanations vary across repeated calls on the identical profile",
    ),
    (
        Dimension::Counterfactual,
        0.5,
        "Explanations do not reflect features whose change materially moves the score",
    ),
    (
        Dimension::Readability,
        0.4,
        "Explanations lack a clear summary, structured reasons, or a next step",
    ),
];

/// Combine dimension scores into the final report.
///
/// `final = 100 * sum(weight_d * value_d)` over the seven weighted
/// dimensions; a failed compliance gate caps the result at
/// [`COMPLIANCE_CAP`]. The computation is commutative over `dimensions`.
pub fn aggregate(
    dimensions: Vec<DimensionScore>,
    compliance_pass: bool,
    surrogate: SurrogateDiagnostics,
    ranking: FeatureRanking,
    baseline_score: Option<f64>,
    baseline_classification: Option<String>,
) -> QualityReport {
    let weighted: f64 = dimensions
        .iter()
        .map(|d| d.dimension.weight() * d.value)
        .sum();
    let mut final_score = 100.0 * weighted;
    if !compliance_pass {
        final_score = final_score.min(COMPLIANCE_CAP);
    }

    let critical_flags = collect_critical_flags(&dimensions);
    let recommendations =
        build_recommendations(&dimensions, compliance_pass, &surrogate);

    QualityReport {
        run_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        baseline_score,
        baseline_classification,
        ranking,
        quality_level: QualityLevel::from_score(final_score),
        final_score,
        compliance_pass,
        critical_flags,
        recommendations,
        dimensions,
        surrogate,
    }
}

/// Flags that must reach the auditor regardless of scores: compliance
/// criticals plus contradicted or hallucinated claims.
fn collect_critical_flags(dimensions: &[DimensionScore]) -> Vec<String> {
    let mut flags = Vec::new();
    for d in dimensions {
        for flag in &d.flags {
            let critical = flag.starts_with("critical:")
                || flag == "contradicted_claim"
                || flag == "hallucinated_claim"
                || flag.starts_with("contradicted:");
            if critical {
                flags.push(format!("{}:{flag}", d.dimension.id()));
            }
        }
    }
    flags
}

fn build_recommendations(
    dimensions: &[DimensionScore],
    compliance_pass: bool,
    surrogate: &SurrogateDiagnostics,
) -> Vec<String> {
    let mut recs = Vec::new();
    if !compliance_pass {
        recs.push(
            "Compliance violation detected; remove references to protected attributes \
             and harmful advice before release"
                .to_string(),
        );
    }
    for (dimension, threshold, message) in RECOMMENDATION_RULES {
        let below = dimensions
            .iter()
            .find(|d| d.dimension == *dimension)
            .is_some_and(|d| d.value < *threshold);
        if below {
            recs.push((*message).to_string());
        }
    }
    if surrogate.low_fidelity {
        recs.push(
            "Local surrogate fit quality is low; treat feature-attribution findings \
             with caution"
                .to_string(),
        );
    }
    recs
}
