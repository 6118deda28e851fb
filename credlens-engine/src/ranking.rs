//! Feature importance ranking derived from a fitted surrogate.

use serde::{Deserialize, Serialize};

use crate::surrogate::SurrogateModel;

/// Whether a feature pushes the score up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    PositiveDriver,
    NegativeDriver,
}

/// One ranked surrogate feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedFeature {
    /// Encoded column name (`attribute` or `attribute=category`).
    pub name: String,
    /// Signed surrogate coefficient.
    pub importance: f64,
    pub direction: Direction,
}

impl RankedFeature {
    /// The profile attribute this feature belongs to.
    pub fn attribute(&self) -> &str {
        SurrogateModel::column_attribute(&self.name)
    }
}

/// Surrogate features ordered by absolute importance, truncated to top-K.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRanking {
    features: Vec<RankedFeature>,
}

impl FeatureRanking {
    /// Rank the model's coefficients by |importance| descending and keep the
    /// top `k`. Empty coefficients produce an empty ranking; there is no
    /// failure mode.
    pub fn from_model(model: &SurrogateModel, k: usize) -> Self {
        let mut features: Vec<RankedFeature> = model
            .coefficients
            .iter()
            .map(|(name, &coef)| RankedFeature {
                name: name.clone(),
                importance: coef,
                direction: if coef >= 0.0 {
                    Direction::PositiveDriver
                } else {
                    Direction::NegativeDriver
                },
            })
            .collect();
        features.sort_by(|a, b| {
            b.importance
                .abs()
                .partial_cmp(&a.importance.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        features.truncate(k);
        Self { features }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedFeature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Features whose absolute importance meets the threshold, split into
    /// positive and negative drivers.
    pub fn important_drivers(
        &self,
        threshold: f64,
    ) -> (Vec<&RankedFeature>, Vec<&RankedFeature>) {
        let mut positive = Vec::new();
        let mut negative = Vec::new();
        for f in &self.features {
            if f.importance.abs() < threshold {
                continue;
            }
            match f.direction {
                Direction::PositiveDriver => positive.push(f),
                Direction::NegativeDriver => negative.push(f),
            }
        }
        (positive, negative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn model_with(coefs: &[(&str, f64)]) -> SurrogateModel {
        SurrogateModel {
            coefficients: coefs
                .iter()
                .map(|(n, c)| (n.to_string(), *c))
                .collect::<BTreeMap<_, _>>(),
            intercept: 50.0,
            fit_quality: 0.9,
            sample_count: 100,
            dropped_columns: Vec::new(),
        }
    }

    #[test]
    fn test_ordering_by_absolute_importance() {
        let model = model_with(&[
            ("income", 0.3),
            ("payment_defaults", -0.8),
            ("credit_utilization", 0.1),
        ]);
        let ranking = FeatureRanking::from_model(&model, 10);
        let names: Vec<&str> = ranking.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["payment_defaults", "income", "credit_utilization"]);
        assert_eq!(ranking.iter().next().unwrap().direction, Direction::NegativeDriver);
    }

    #[test]
    fn test_truncates_to_top_k() {
        let model = model_with(&[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)]);
        assert_eq!(FeatureRanking::from_model(&model, 2).len(), 2);
    }

    #[test]
    fn test_empty_model_yields_empty_ranking() {
        let model = model_with(&[]);
        let ranking = FeatureRanking::from_model(&model, 10);
        assert!(ranking.is_empty());
    }

    #[test]
    fn test_attribute_strips_category_suffix() {
        let model = model_with(&[("housing_status=owner", 0.5)]);
        let ranking = FeatureRanking::from_model(&model, 10);
        assert_eq!(ranking.iter().next().unwrap().attribute(), "housing_status");
    }

    #[test]
    fn test_important_drivers_partition() {
        let model = model_with(&[
            ("income", 0.4),
            ("payment_defaults", -0.6),
            ("household_size", 0.01),
        ]);
        let ranking = FeatureRanking::from_model(&model, 10);
        let (positive, negative) = ranking.important_drivers(0.1);
        assert_eq!(positive.len(), 1);
        assert_eq!(negative.len(), 1);
        assert_eq!(positive[0].name, "income");
    }
}
