//! # credlens-core
//!
//! Domain types and collaborator boundary for the credlens explanation
//! audit engine: applicant profiles and the canonical attribute schema,
//! normalized fact tables used as claim-verification ground truth, run
//! configuration, the error taxonomy, and the scoring gateway (trait,
//! HTTP client, request pacing).
//!
//! The analysis engine itself lives in `credlens-engine`; this crate holds
//! everything both the engine and its callers need to agree on.

pub mod config;
pub mod error;
pub mod facts;
pub mod gateway;
pub mod profile;

pub use config::{AnalysisConfig, AssessmentConfig, GatewayConfig, SamplingConfig, SurrogateConfig};
pub use error::{AuditError, GatewayError, ProfileError, Result, SurrogateError};
pub use facts::{Fact, FactTable};
pub use gateway::{classification_for, HttpScoringGateway, ScoreResponse, ScoringGateway};
pub use profile::{AttributeKind, AttributeValue, Profile, ProfileBuilder};
