//! End-to-end assessment scenarios against a deterministic rule-based
//! scoring gateway.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use credlens_core::config::{AssessmentConfig, SamplingConfig};
use credlens_core::error::{AuditError, GatewayError, SurrogateError};
use credlens_core::gateway::{classification_for, ScoreResponse, ScoringGateway};
use credlens_core::profile::Profile;
use credlens_engine::analyzers::Dimension;
use credlens_engine::ExplanationAuditor;

/// Deterministic synthetic scoring rule on the canonical 0-100 scale.
fn ground_truth_score(profile: &Profile) -> f64 {
    let numeric =
        |name: &str| profile.get(name).and_then(|v| v.as_numeric()).unwrap_or(0.0);
    let categorical = |name: &str| {
        profile
            .get(name)
            .and_then(|v| v.as_categorical())
            .unwrap_or("")
            .to_string()
    };

    let mut score = 50.0;

    let income = numeric("income");
    score += if income > 100_000.0 {
        20.0
    } else if income > 70_000.0 {
        15.0
    } else if income > 50_000.0 {
        10.0
    } else if income > 30_000.0 {
        5.0
    } else {
        0.0
    };

    let duration = numeric("employment_duration_years");
    score += if duration > 10.0 {
        15.0
    } else if duration > 5.0 {
        10.0
    } else if duration > 2.0 {
        5.0
    } else {
        0.0
    };

    score -= numeric("payment_defaults") * 15.0;

    let utilization = if profile.contains("credit_utilization") {
        numeric("credit_utilization")
    } else {
        numeric("used_credit") / numeric("credit_limit").max(1.0)
    };
    score += if utilization < 0.3 {
        10.0
    } else if utilization < 0.7 {
        5.0
    } else {
        -10.0
    };

    score -= numeric("credit_inquiries_last_6_months") * 2.0;

    if categorical("housing_status") == "owner" {
        score += 5.0;
    }

    let address = numeric("address_stability_years");
    score += if address > 10.0 {
        5.0
    } else if address > 5.0 {
        3.0
    } else {
        0.0
    };

    if numeric("existing_loans") > 3.0 {
        score -= 5.0;
    }

    score.clamp(0.0, 100.0)
}

fn render_explanation(profile: &Profile, score: f64) -> String {
    let numeric =
        |name: &str| profile.get(name).and_then(|v| v.as_numeric()).unwrap_or(0.0);
    format!(
        "Your credit score is {score:.0}. Your income of ${:.0} and your employment \
         status shape the result. Your credit utilization matters because it reflects \
         balance management. You have {:.0} payment defaults on record. To improve, \
         pay your bills on time.",
        numeric("income"),
        numeric("payment_defaults"),
    )
}

/// Gateway backed by the synthetic rule; always succeeds.
struct RuleBasedGateway;

#[async_trait]
impl ScoringGateway for RuleBasedGateway {
    async fn score(&self, profile: &Profile) -> Result<ScoreResponse, GatewayError> {
        let score = ground_truth_score(profile);
        Ok(ScoreResponse {
            score,
            classification: classification_for(score).to_string(),
            explanation: render_explanation(profile, score),
        })
    }
}

/// Gateway that succeeds a fixed number of times, then simulates an outage.
struct FlakyGateway {
    successes_allowed: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl ScoringGateway for FlakyGateway {
    async fn score(&self, profile: &Profile) -> Result<ScoreResponse, GatewayError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n >= self.successes_allowed {
            return Err(GatewayError::Timeout { timeout_secs: 30 });
        }
        let score = ground_truth_score(profile);
        Ok(ScoreResponse {
            score,
            classification: classification_for(score).to_string(),
            explanation: render_explanation(profile, score),
        })
    }
}

fn strong_profile() -> Profile {
    Profile::builder()
        .attribute("income", 120_000.0)
        .attribute("employment_status", "employed")
        .attribute("employment_duration_years", 12.0)
        .attribute("credit_limit", 20_000.0)
        .attribute("used_credit", 5_000.0)
        .attribute("credit_utilization", 0.25)
        .attribute("payment_defaults", 0.0)
        .attribute("housing_status", "owner")
        .build()
}

fn test_config(seed: u64) -> AssessmentConfig {
    AssessmentConfig {
        sampling: SamplingConfig {
            sample_count: 60,
            seed: Some(seed),
            ..SamplingConfig::default()
        },
        ..AssessmentConfig::default()
    }
}

fn auditor(seed: u64) -> ExplanationAuditor {
    ExplanationAuditor::new(Arc::new(RuleBasedGateway), test_config(seed))
}

#[tokio::test]
async fn scenario_a_accurate_explanation_is_faithful() {
    let profile = strong_profile();
    let explanation = "Your income of $120,000 supports approval. You have 12 years of \
                       employment. Your credit utilization of 25% is well managed.";
    let report = auditor(42)
        .assess_explanation(&profile, explanation)
        .await
        .unwrap();

    assert_eq!(report.baseline_score, Some(100.0));
    assert_eq!(report.baseline_classification.as_deref(), Some("Good"));
    assert!(report.compliance_pass);
    let faithfulness = report.dimension(Dimension::Faithfulness).unwrap();
    assert!(faithfulness.value >= 0.9, "got {}", faithfulness.value);
    assert!(report.critical_flags.is_empty());
}

#[tokio::test]
async fn scenario_b_protected_attribute_caps_score() {
    let profile = strong_profile();
    let explanation = "approved because applicant is female. Your income of $120,000 \
                       supports approval. You have 12 years of employment. Your credit \
                       utilization of 25% is well managed. Pay your bills on time.";
    let report = auditor(42)
        .assess_explanation(&profile, explanation)
        .await
        .unwrap();

    assert!(!report.compliance_pass);
    assert!(report.final_score <= 20.0, "got {}", report.final_score);
    assert!(report
        .critical_flags
        .iter()
        .any(|f| f.contains("protected:gender")));
    assert!(report.recommendations[0].contains("Compliance"));
}

#[tokio::test]
async fn scenario_c_vacuous_explanation_degrades_gracefully() {
    let profile = strong_profile();
    let report = auditor(42)
        .assess_explanation(&profile, "Thank you for your application.")
        .await
        .unwrap();

    let faithfulness = report.dimension(Dimension::Faithfulness).unwrap();
    assert_eq!(faithfulness.value, 1.0);
    assert!(faithfulness.has_flag("vacuous_explanation"));

    let completeness = report.dimension(Dimension::Completeness).unwrap();
    assert!(completeness.value < 0.5, "got {}", completeness.value);
    assert!(
        completeness.has_flag("missing_positives") || completeness.has_flag("missing_negatives")
    );
}

#[tokio::test]
async fn scenario_d_insufficient_samples_is_a_typed_failure() {
    let gateway = Arc::new(FlakyGateway {
        successes_allowed: 9,
        calls: AtomicUsize::new(0),
    });
    let auditor = ExplanationAuditor::new(gateway, test_config(42));
    let err = auditor
        .assess_explanation(&strong_profile(), "Anything at all.")
        .await
        .unwrap_err();

    match err {
        AuditError::Surrogate(SurrogateError::InsufficientSamples {
            succeeded,
            attempted,
            needed,
        }) => {
            assert_eq!(succeeded, 9);
            assert_eq!(attempted, 60);
            assert_eq!(needed, 10);
        }
        other => panic!("expected InsufficientSamples, got {other:?}"),
    }
}

#[tokio::test]
async fn seeded_runs_are_deterministic() {
    let profile = strong_profile();
    let explanation = "Your income of $120,000 supports approval. Pay your bills on time.";

    let report_a = auditor(7)
        .assess_explanation(&profile, explanation)
        .await
        .unwrap();
    let report_b = auditor(7)
        .assess_explanation(&profile, explanation)
        .await
        .unwrap();

    assert_eq!(report_a.ranking, report_b.ranking);
    for (a, b) in report_a.dimensions.iter().zip(report_b.dimensions.iter()) {
        assert_eq!(a.dimension, b.dimension);
        // The consistency dimension depends on live repeated calls and is
        // exempt from the determinism guarantee.
        if a.dimension == Dimension::Consistency {
            continue;
        }
        assert_eq!(a.value, b.value, "{:?}", a.dimension);
        assert_eq!(a.flags, b.flags, "{:?}", a.dimension);
    }
    assert_ne!(report_a.run_id, report_b.run_id);
}

#[tokio::test]
async fn malformed_profile_aborts_before_any_scoring() {
    let incomplete = Profile::builder().attribute("income", 50_000.0).build();
    let err = auditor(1)
        .assess_explanation(&incomplete, "Anything.")
        .await
        .unwrap_err();
    assert!(matches!(err, AuditError::Profile(_)));
}

#[tokio::test]
async fn deterministic_gateway_yields_full_consistency() {
    let report = auditor(3)
        .assess_explanation(&strong_profile(), "Your income of $120,000 is noted.")
        .await
        .unwrap();
    let consistency = report.dimension(Dimension::Consistency).unwrap();
    assert!((consistency.value - 1.0).abs() < 1e-9, "got {}", consistency.value);
}
