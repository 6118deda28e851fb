//! Error types for the credlens core library.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering profile validation, the scoring-collaborator boundary, and
//! surrogate fitting. Per-sample gateway failures are recovered by exclusion
//! and only become fatal in aggregate via `SurrogateError::InsufficientSamples`.

/// Top-level error type for an explanation-quality run.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Surrogate error: {0}")]
    Surrogate(#[from] SurrogateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while validating or normalizing an applicant profile.
///
/// All variants are fatal for the run: without a complete fact table there is
/// no ground truth to verify an explanation against.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Required attribute missing from profile: {attribute}")]
    MissingAttribute { attribute: String },

    #[error("Attribute '{attribute}' has unparseable value: {raw}")]
    UnparseableValue { attribute: String, raw: String },

    #[error("Attribute '{attribute}' has unknown category: {value}")]
    UnknownCategory { attribute: String, value: String },
}

/// Errors from a single call to the scoring collaborator.
///
/// Any of these causes the corresponding perturbation sample to be dropped
/// before fitting. The core never retries; retry policy belongs to the
/// collaborator.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Scoring request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Scoring request failed with HTTP status {status}")]
    Http { status: u16 },

    #[error("Connection to scoring service failed: {message}")]
    Connection { message: String },

    #[error("Scoring response could not be parsed: {message}")]
    Parse { message: String },
}

/// Errors from fitting the local surrogate model.
#[derive(Debug, thiserror::Error)]
pub enum SurrogateError {
    #[error(
        "Insufficient scored samples for surrogate fit: {succeeded} of {attempted} \
         scoring calls succeeded, minimum is {needed}"
    )]
    InsufficientSamples {
        succeeded: usize,
        attempted: usize,
        needed: usize,
    },
}

/// A type alias for results using the top-level `AuditError`.
pub type Result<T> = std::result::Result<T, AuditError>;
