//! Reqwest-based scoring gateway.
//!
//! Speaks a strict, versioned wire schema: the request is a typed payload
//! built from the profile, the response must deserialize into
//! [`WireScoreResponse`] exactly. The core never inspects untyped JSON from
//! the collaborator; anything that does not match the schema is a
//! `GatewayError::Parse` and the sample is dropped.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::gateway::rate_limit::{PacerConfig, RequestPacer};
use crate::gateway::{ScoreResponse, ScoringGateway};
use crate::profile::{AttributeValue, Profile};

/// Wire schema version this client speaks.
const WIRE_SCHEMA_VERSION: u32 = 1;

/// Typed request payload for the `/score` endpoint.
#[derive(Debug, Serialize)]
struct WireScoreRequest<'a> {
    schema_version: u32,
    attributes: std::collections::BTreeMap<&'a str, &'a AttributeValue>,
}

/// Typed response payload from the `/score` endpoint.
///
/// `deny_unknown_fields` is deliberately absent: the collaborator may add
/// fields, but the three required ones must be present and typed.
#[derive(Debug, Deserialize)]
struct WireScoreResponse {
    credit_score: f64,
    classification: String,
    explanation: String,
}

/// HTTP scoring gateway with basic auth and injected request pacing.
pub struct HttpScoringGateway {
    client: Client,
    config: GatewayConfig,
    pacer: RequestPacer,
}

impl HttpScoringGateway {
    /// Create a gateway from configuration, deriving the pacer from the
    /// config's rate-limit fields.
    pub fn new(config: GatewayConfig) -> Self {
        let pacer = RequestPacer::new(PacerConfig {
            requests_per_minute: config.requests_per_minute,
            min_interval: Duration::from_millis(config.min_interval_ms),
        });
        Self::with_pacer(config, pacer)
    }

    /// Create a gateway with an explicitly supplied pacing policy.
    pub fn with_pacer(config: GatewayConfig, pacer: RequestPacer) -> Self {
        Self {
            client: Client::new(),
            config,
            pacer,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/score", self.config.base_url.trim_end_matches('/'))
    }

    fn build_payload<'a>(&self, profile: &'a Profile) -> WireScoreRequest<'a> {
        WireScoreRequest {
            schema_version: WIRE_SCHEMA_VERSION,
            attributes: profile
                .attributes()
                .map(|(name, value)| (name.as_str(), value))
                .collect(),
        }
    }
}

#[async_trait::async_trait]
impl ScoringGateway for HttpScoringGateway {
    async fn score(&self, profile: &Profile) -> Result<ScoreResponse, GatewayError> {
        self.pacer.acquire().await;

        let payload = self.build_payload(profile);
        debug!(endpoint = %self.endpoint(), "Dispatching scoring request");

        let response = self
            .client
            .post(self.endpoint())
            .basic_auth(&self.config.username, Some(&self.config.password))
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&payload)
            .send()
            .await
            .map_err(|e| classify_transport_error(e, self.config.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Scoring request rejected");
            return Err(GatewayError::Http {
                status: status.as_u16(),
            });
        }

        let wire: WireScoreResponse = response.json().await.map_err(|e| GatewayError::Parse {
            message: e.to_string(),
        })?;

        if !wire.credit_score.is_finite() {
            return Err(GatewayError::Parse {
                message: format!("non-finite credit score: {}", wire.credit_score),
            });
        }

        Ok(ScoreResponse {
            score: wire.credit_score,
            classification: wire.classification,
            explanation: wire.explanation,
        })
    }
}

/// Map a reqwest transport error onto the gateway error taxonomy.
fn classify_transport_error(err: reqwest::Error, timeout_secs: u64) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout { timeout_secs }
    } else if err.is_connect() {
        GatewayError::Connection {
            message: err.to_string(),
        }
    } else if err.is_decode() {
        GatewayError::Parse {
            message: err.to_string(),
        }
    } else {
        GatewayError::Connection {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_response_strict_fields() {
        let ok: WireScoreResponse = serde_json::from_str(
            r#"{"credit_score": 83.0, "classification": "Good", "explanation": "stable income"}"#,
        )
        .unwrap();
        assert_eq!(ok.credit_score, 83.0);

        // Extra fields tolerated, missing required fields are not.
        let extra: Result<WireScoreResponse, _> = serde_json::from_str(
            r#"{"credit_score": 61.5, "classification": "Average", "explanation": "x", "model": "v2"}"#,
        );
        assert!(extra.is_ok());

        let missing: Result<WireScoreResponse, _> =
            serde_json::from_str(r#"{"credit_score": 61.5}"#);
        assert!(missing.is_err());
    }

    #[test]
    fn test_payload_carries_schema_version() {
        let gateway = HttpScoringGateway::new(GatewayConfig {
            base_url: "http://localhost:9".into(),
            ..GatewayConfig::default()
        });
        let profile = Profile::builder()
            .attribute("income", 85_000.0)
            .attribute("housing_status", "rent")
            .build();
        let payload = gateway.build_payload(&profile);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["schema_version"], 1);
        assert_eq!(json["attributes"]["income"], 85_000.0);
        assert_eq!(json["attributes"]["housing_status"], "rent");
    }

    #[test]
    fn test_endpoint_normalizes_trailing_slash() {
        let gateway = HttpScoringGateway::new(GatewayConfig {
            base_url: "http://svc.example/api/".into(),
            ..GatewayConfig::default()
        });
        assert_eq!(gateway.endpoint(), "http://svc.example/api/score");
    }
}
