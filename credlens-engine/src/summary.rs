//! Batch summary statistics over many quality reports.
//!
//! Pure computation for callers that audit a corpus of decisions rather
//! than a single one: score distribution, compliance rate, per-dimension
//! statistics, and corpus-level recommendations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analyzers::Dimension;
use crate::report::{QualityLevel, QualityReport};

/// Mean, spread, and range of a sequence of values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl Stats {
    fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let median = if sorted.len() % 2 == 1 {
            sorted[sorted.len() / 2]
        } else {
            (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) / 2.0
        };

        Self {
            mean,
            median,
            std_dev: variance.sqrt(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
        }
    }
}

/// Aggregate view over a batch of quality reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_analyzed: usize,
    pub final_score: Stats,
    /// Fraction of reports that passed the compliance gate.
    pub compliance_rate: f64,
    pub level_distribution: BTreeMap<QualityLevel, usize>,
    pub dimension_stats: BTreeMap<Dimension, Stats>,
    pub mean_fit_quality: f64,
    pub recommendations: Vec<String>,
}

impl BatchSummary {
    pub fn from_reports(reports: &[QualityReport]) -> Self {
        if reports.is_empty() {
            return Self {
                total_analyzed: 0,
                final_score: Stats::default(),
                compliance_rate: 0.0,
                level_distribution: BTreeMap::new(),
                dimension_stats: BTreeMap::new(),
                mean_fit_quality: 0.0,
                recommendations: Vec::new(),
            };
        }

        let scores: Vec<f64> = reports.iter().map(|r| r.final_score).collect();
        let final_score = Stats::from_values(&scores);

        let compliant = reports.iter().filter(|r| r.compliance_pass).count();
        let compliance_rate = compliant as f64 / reports.len() as f64;

        let mut level_distribution = BTreeMap::new();
        for r in reports {
            *level_distribution.entry(r.quality_level).or_insert(0) += 1;
        }

        let mut dimension_stats = BTreeMap::new();
        for dimension in Dimension::ALL {
            let values: Vec<f64> = reports
                .iter()
                .filter_map(|r| r.dimension(dimension).map(|d| d.value))
                .collect();
            if !values.is_empty() {
                dimension_stats.insert(dimension, Stats::from_values(&values));
            }
        }

        let mean_fit_quality = reports
            .iter()
            .map(|r| r.surrogate.fit_quality)
            .sum::<f64>()
            / reports.len() as f64;

        let recommendations = corpus_recommendations(
            &final_score,
            compliance_rate,
            reports.len() - compliant,
            &dimension_stats,
        );

        Self {
            total_analyzed: reports.len(),
            final_score,
            compliance_rate,
            level_distribution,
            dimension_stats,
            mean_fit_quality,
            recommendations,
        }
    }
}

fn corpus_recommendations(
    final_score: &Stats,
    compliance_rate: f64,
    non_compliant: usize,
    dimension_stats: &BTreeMap<Dimension, Stats>,
) -> Vec<String> {
    let mut recs = Vec::new();
    if final_score.mean < 70.0 {
        recs.push(
            "Overall explanation quality is poor; significant improvements needed".to_string(),
        );
    } else if final_score.mean < 80.0 {
        recs.push(
            "Explanation quality is fair; moderate improvements recommended".to_string(),
        );
    }
    if compliance_rate < 1.0 {
        recs.push(format!(
            "Compliance issues detected in {non_compliant} explanations"
        ));
    }
    for (dimension, stats) in dimension_stats {
        if *dimension == Dimension::Compliance || stats.mean >= 0.6 {
            continue;
        }
        recs.push(format!(
            "Dimension '{}' averages {:.2} across the batch; review the per-report \
             recommendations",
            dimension.id(),
            stats.mean
        ));
    }
    recs
}
