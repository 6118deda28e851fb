//! The scoring-collaborator boundary.
//!
//! The engine never talks HTTP directly; it goes through the
//! [`ScoringGateway`] trait. The shipped implementation is the reqwest-based
//! [`HttpScoringGateway`], but tests and offline replays supply their own.
//!
//! Failure handling contract: a failed `score` call drops the corresponding
//! sample. The core never retries a scoring call; retry policy belongs to
//! the collaborator behind the gateway.

pub mod http;
pub mod rate_limit;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::profile::Profile;

pub use http::HttpScoringGateway;
pub use rate_limit::{PacerConfig, RequestPacer};

/// One scoring decision returned by the collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    /// Credit score on the canonical 0-100 scale.
    pub score: f64,
    /// Collaborator-assigned classification label.
    pub classification: String,
    /// Natural-language explanation of the decision.
    pub explanation: String,
}

/// Abstraction over the external scoring service.
///
/// Implementations must be safe to call concurrently; the engine dispatches
/// tens to hundreds of perturbation calls per run with bounded concurrency.
#[async_trait]
pub trait ScoringGateway: Send + Sync {
    async fn score(&self, profile: &Profile) -> Result<ScoreResponse, GatewayError>;
}

/// Canonical classification bands on the 0-100 score scale.
///
/// The single source of truth for score-to-label mapping; the original
/// system mixed 0-100 and 300-850 scales across modules, this library uses
/// 0-100 everywhere.
pub fn classification_for(score: f64) -> &'static str {
    if score >= 70.0 {
        "Good"
    } else if score >= 50.0 {
        "Average"
    } else {
        "Poor"
    }
}
