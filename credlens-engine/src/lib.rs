//! # credlens-engine
//!
//! The explanation fidelity and quality assessment engine. Approximates a
//! black-box credit-scoring function around a single decision with a
//! weighted local surrogate model, then grades the scoring function's
//! natural-language explanation against eight quality dimensions and
//! combines them under a hard compliance gate.
//!
//! The entry point is [`ExplanationAuditor::assess_explanation`]: one call
//! takes a reference profile and an explanation text and returns either a
//! complete [`report::QualityReport`] or a typed failure naming the fatal
//! condition. Nothing in between is ever returned.

pub mod analyzers;
pub mod ranking;
pub mod report;
pub mod sampler;
pub mod summary;
pub mod surrogate;
pub mod text;

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, info, warn};

use credlens_core::config::AssessmentConfig;
use credlens_core::error::{AuditError, Result, SurrogateError};
use credlens_core::facts::FactTable;
use credlens_core::gateway::{ScoreResponse, ScoringGateway};
use credlens_core::profile::Profile;

use analyzers::compliance::ComplianceScanner;
use analyzers::consistency::{TextSimilarity, TokenOverlapSimilarity};
use analyzers::counterfactual::{build_probe, CounterfactualObservation};
use analyzers::DimensionScore;
use ranking::FeatureRanking;
use report::{QualityReport, SurrogateDiagnostics};
use sampler::PerturbationSampler;
use surrogate::ScoredSample;
use text::claims::{ClaimExtractor, RegexClaimExtractor};
use text::mentions::MentionScanner;

/// The assessment engine for one or more explanation-quality runs.
///
/// Holds the scoring gateway, the run configuration, and the pluggable text
/// collaborators (claim extractor and similarity function). Each call to
/// [`assess_explanation`](Self::assess_explanation) owns its profile,
/// samples, and surrogate exclusively; concurrent runs share nothing but
/// the gateway's connection state.
pub struct ExplanationAuditor {
    gateway: Arc<dyn ScoringGateway>,
    config: AssessmentConfig,
    scanner: MentionScanner,
    compliance: ComplianceScanner,
    extractor: Box<dyn ClaimExtractor>,
    similarity: Box<dyn TextSimilarity>,
}

impl ExplanationAuditor {
    pub fn new(gateway: Arc<dyn ScoringGateway>, config: AssessmentConfig) -> Self {
        Self {
            gateway,
            config,
            scanner: MentionScanner::new(),
            compliance: ComplianceScanner::new(),
            extractor: Box::new(RegexClaimExtractor::new()),
            similarity: Box::new(TokenOverlapSimilarity::new()),
        }
    }

    /// Substitute the claim extractor (e.g. an NLP-backed implementation).
    pub fn with_claim_extractor(mut self, extractor: Box<dyn ClaimExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Substitute the text-similarity collaborator (e.g. embedding cosine).
    pub fn with_similarity(mut self, similarity: Box<dyn TextSimilarity>) -> Self {
        self.similarity = similarity;
        self
    }

    /// Assess one explanation for one decision.
    ///
    /// Pipeline: fact extraction, perturbation scoring sweep, surrogate
    /// fit, feature ranking, repeated-call collection, counterfactual
    /// probes, the eight analyzers, aggregation. Returns a complete report
    /// or a typed fatal error (`ProfileError` for malformed input,
    /// `SurrogateError::InsufficientSamples` when too few scoring calls
    /// survive).
    pub async fn assess_explanation(
        &self,
        profile: &Profile,
        explanation_text: &str,
    ) -> Result<QualityReport> {
        let facts = FactTable::from_profile(profile)?;
        info!(attributes = facts.len(), "Fact table extracted");

        let (scored, attempted) = self.scoring_sweep(profile).await;
        let needed = self.config.surrogate.min_samples;
        if scored.len() < needed {
            return Err(AuditError::Surrogate(SurrogateError::InsufficientSamples {
                succeeded: scored.len(),
                attempted,
                needed,
            }));
        }

        let model = surrogate::fit(&scored, &self.config.surrogate)?;
        info!(
            fit_quality = model.fit_quality,
            samples = model.sample_count,
            dropped = model.dropped_columns.len(),
            "Surrogate fitted"
        );
        let ranking = FeatureRanking::from_model(&model, self.config.analysis.top_k);

        let repeats = self.repeated_scores(profile).await;
        let baseline = repeats.first().cloned();
        let repeat_texts: Vec<String> =
            repeats.iter().map(|r| r.explanation.clone()).collect();

        let observations = match &baseline {
            Some(base) => self.counterfactual_probes(profile, base.score).await,
            None => Vec::new(),
        };

        let analysis = &self.config.analysis;
        let compliance = analyzers::compliance::analyze(explanation_text, &self.compliance);
        let mut counterfactual =
            analyzers::counterfactual::analyze(&observations, analysis.impact_threshold, &self.scanner);
        if baseline.is_none() {
            counterfactual = counterfactual.with_flag("baseline_unavailable");
        }

        let dimensions: Vec<DimensionScore> = vec![
            analyzers::faithfulness::analyze(
                explanation_text,
                &facts,
                self.extractor.as_ref(),
                analysis.value_tolerance,
            ),
            analyzers::alignment::analyze(
                explanation_text,
                &ranking,
                analysis.top_k,
                &self.scanner,
            ),
            analyzers::specificity::analyze(explanation_text),
            analyzers::completeness::analyze(
                explanation_text,
                &ranking,
                analysis.importance_threshold,
                &self.scanner,
            ),
            analyzers::consistency::analyze(&repeat_texts, self.similarity.as_ref()),
            counterfactual,
            compliance.score,
            analyzers::readability::analyze(explanation_text, &self.scanner),
        ];

        let diagnostics = SurrogateDiagnostics {
            fit_quality: model.fit_quality,
            sample_count: model.sample_count,
            samples_attempted: attempted,
            dropped_columns: model.dropped_columns.clone(),
            low_fidelity: model.fit_quality < self.config.surrogate.fidelity_floor,
        };

        let report = report::aggregate(
            dimensions,
            compliance.pass,
            diagnostics,
            ranking,
            baseline.as_ref().map(|b| b.score),
            baseline.map(|b| b.classification),
        );
        info!(
            final_score = report.final_score,
            compliance_pass = report.compliance_pass,
            "Assessment complete"
        );
        Ok(report)
    }

    /// Dispatch the perturbation sweep with bounded concurrency under the
    /// run deadline. Failed calls are dropped; on deadline the sweep stops
    /// and the run proceeds with whatever was collected.
    async fn scoring_sweep(&self, profile: &Profile) -> (Vec<ScoredSample>, usize) {
        let samples =
            PerturbationSampler::new(profile, &self.config.sampling).sample(self.config.sampling.sample_count);
        let attempted = samples.len();

        let mut stream = futures::stream::iter(samples.into_iter().map(|sample| {
            let gateway = Arc::clone(&self.gateway);
            async move {
                match gateway.score(&sample.profile).await {
                    Ok(response) => Some(ScoredSample {
                        sample,
                        score: response.score,
                    }),
                    Err(error) => {
                        debug!(%error, "Perturbation scoring call failed; dropping sample");
                        None
                    }
                }
            }
        }))
        .buffer_unordered(self.config.sampling.concurrency.max(1));

        let deadline = tokio::time::Instant::now()
            + Duration::from_secs(self.config.sampling.run_deadline_secs);
        let mut scored = Vec::with_capacity(attempted);
        loop {
            match tokio::time::timeout_at(deadline, stream.next()).await {
                Ok(Some(Some(sample))) => scored.push(sample),
                Ok(Some(None)) => {}
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        collected = scored.len(),
                        attempted, "Run deadline reached; proceeding with collected samples"
                    );
                    break;
                }
            }
        }
        (scored, attempted)
    }

    /// Issue the configured number of independent scoring calls for the
    /// identical profile. Each returned explanation is a distinct
    /// observation for the consistency analysis; failures are tolerated.
    async fn repeated_scores(&self, profile: &Profile) -> Vec<ScoreResponse> {
        let mut responses = Vec::with_capacity(self.config.analysis.repeat_calls);
        for attempt in 0..self.config.analysis.repeat_calls {
            match self.gateway.score(profile).await {
                Ok(response) => responses.push(response),
                Err(error) => {
                    warn!(attempt, %error, "Repeated scoring call failed");
                }
            }
        }
        responses
    }

    /// Score one altered profile per configured counterfactual feature.
    /// Probes that cannot be built or fail to score are dropped.
    async fn counterfactual_probes(
        &self,
        profile: &Profile,
        baseline_score: f64,
    ) -> Vec<CounterfactualObservation> {
        let analysis = &self.config.analysis;
        let mut observations = Vec::new();
        for feature in &analysis.counterfactual_features {
            let Some(probe) = build_probe(profile, feature, analysis.counterfactual_shift)
            else {
                debug!(feature = %feature, "Counterfactual probe not applicable");
                continue;
            };
            match self.gateway.score(&probe).await {
                Ok(response) => observations.push(CounterfactualObservation {
                    feature: feature.clone(),
                    baseline_score,
                    probe_score: response.score,
                    explanation: response.explanation,
                }),
                Err(error) => {
                    warn!(feature = %feature, %error, "Counterfactual probe scoring failed");
                }
            }
        }
        observations
    }
}
