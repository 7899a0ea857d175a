//! Engine transport
//!
//! The remote simulation engine is reached only through [`EngineTransport`],
//! so the lifecycle controller and the comparison orchestrator can be driven
//! by [`HttpEngineClient`] in production and by in-memory fakes in tests.
//!
//! Responses are returned raw; turning them into typed results is the
//! normalizer's job.

mod http;

pub use http::HttpEngineClient;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::TransportError;
use crate::model::{FinalMetrics, LeadershipSplit, RiskAssessment, SimulationResult};
use crate::policy::{PolicyConfig, PolicyKind};

/// Remote simulation engine
#[async_trait]
pub trait EngineTransport: Send + Sync + std::fmt::Debug {
    /// Run one simulation, returning the raw response body
    async fn simulate(&self, policy: &PolicyConfig) -> Result<Value, TransportError>;

    /// Run a joint comparison of two policies, returning the raw response body
    async fn compare(&self, a: &PolicyConfig, b: &PolicyConfig) -> Result<Value, TransportError>;

    /// Plain-language explanation of a result
    async fn explain(&self, result: &SimulationResult) -> Result<String, TransportError>;

    /// Rendered report document for a result
    async fn download_report(
        &self,
        result: &SimulationResult,
        explanation: &str,
    ) -> Result<Vec<u8>, TransportError>;

    /// Informational insights for a policy type
    async fn policy_insights(&self, kind: PolicyKind) -> Result<Value, TransportError>;

    /// Engine health status
    async fn health(&self) -> Result<Value, TransportError>;
}

/// Simulation request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyRequest<'a> {
    /// Wire name of the kind
    pub policy_type: PolicyKind,
    /// Strength, in percent
    pub percentage: f64,
    /// Duration, in years
    pub duration: u32,
    /// Total budget
    pub budget: f64,
    /// Display name, echoed back by the engine
    pub policy_name: &'a str,
}

impl<'a> From<&'a PolicyConfig> for PolicyRequest<'a> {
    fn from(policy: &'a PolicyConfig) -> Self {
        Self {
            policy_type: policy.kind(),
            percentage: policy.strength_percent(),
            duration: policy.duration_years(),
            budget: policy.budget(),
            policy_name: policy.name(),
        }
    }
}

/// Comparison request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompareRequest<'a> {
    /// First policy
    pub policy_a: PolicyRequest<'a>,
    /// Second policy
    pub policy_b: PolicyRequest<'a>,
}

#[derive(Debug, Serialize)]
struct PolicyEcho<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: PolicyKind,
    type_name: &'static str,
    description: &'static str,
    percentage: f64,
    duration: u32,
    budget: f64,
}

#[derive(Debug, Serialize)]
struct TimelineColumns {
    years: Vec<u32>,
    pay_gap: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    employment_ratio: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    leadership: Option<Vec<LeadershipSplit>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    budget_spent: Option<Vec<f64>>,
    duration: u32,
}

#[derive(Debug, Serialize)]
struct MetricsEcho<'a> {
    #[serde(flatten)]
    metrics: &'a FinalMetrics,
    final_pay_gap: f64,
}

#[derive(Debug, Serialize)]
struct ResultEcho<'a> {
    policy: PolicyEcho<'a>,
    timeline: TimelineColumns,
    final_metrics: MetricsEcho<'a>,
    risk: &'a RiskAssessment,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

/// A result in the engine's own response shape.
///
/// The explain and report endpoints read the result back in this shape
/// (column-wise timeline, descriptive policy fields, `final_pay_gap`).
/// Companion columns are only sent when every year carries them.
pub fn engine_payload(result: &SimulationResult) -> Value {
    let policy = result.policy();
    let info = policy.info();
    let points = result.timeline().points();
    let metrics = result.final_metrics();

    let final_pay_gap = metrics
        .final_pay_gap_percent
        .or_else(|| result.timeline().last().map(|p| p.pay_gap))
        .unwrap_or_default();

    let echo = ResultEcho {
        policy: PolicyEcho {
            name: policy.name(),
            kind: policy.kind(),
            type_name: info.name,
            description: info.description,
            percentage: policy.strength_percent(),
            duration: policy.duration_years(),
            budget: policy.budget(),
        },
        timeline: TimelineColumns {
            years: result.timeline().years(),
            pay_gap: result.timeline().pay_gaps(),
            employment_ratio: points.iter().map(|p| p.employment_ratio).collect(),
            leadership: points.iter().map(|p| p.leadership).collect(),
            budget_spent: points.iter().map(|p| p.budget_spent).collect(),
            duration: policy.duration_years(),
        },
        final_metrics: MetricsEcho {
            metrics,
            final_pay_gap,
        },
        risk: result.risk(),
        timestamp: result
            .computed_at()
            .map(|t| t.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
    };

    serde_json::to_value(echo).unwrap_or(Value::Null)
}

/// Report file name the engine suggests for a result
pub fn report_file_name(policy: &PolicyConfig) -> String {
    format!("PolicySim_{}_Report.pdf", policy.name().replace(' ', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::policy::{validate, PolicyDraft};
    use serde_json::json;

    fn engine_result() -> Value {
        json!({
            "policy": {"name": "Leave Plus", "type": "parental_leave", "percentage": 80,
                       "duration": 2, "budget": 3000000},
            "timeline": {
                "years": [0, 1, 2],
                "pay_gap": [23.0, 22.0, 21.2],
                "leadership": [
                    {"female": 30.0, "male": 70.0},
                    {"female": 30.9, "male": 69.1},
                    {"female": 31.8, "male": 68.2}
                ]
            },
            "final_metrics": {
                "pay_gap_reduction": 1.8, "employment_improvement": 6.1,
                "final_employment_ratio": 0.87,
                "final_leadership": {"female": 31.8, "male": 68.2},
                "total_budget_spent": 3000000.0
            },
            "risk": {"score": 48.0, "level": "medium"},
            "timestamp": "2025-06-01T10:00:00"
        })
    }

    #[test]
    fn test_policy_request_body() {
        let draft = PolicyDraft::new("Equal Pay 2025", PolicyKind::EqualPay, 75.0, 5, 2e6);
        let policy = validate(&draft).unwrap();
        let body = serde_json::to_value(PolicyRequest::from(&policy)).unwrap();
        assert_eq!(
            body,
            json!({
                "policy_type": "equal_pay",
                "percentage": 75.0,
                "duration": 5,
                "budget": 2000000.0,
                "policy_name": "Equal Pay 2025"
            })
        );
    }

    #[test]
    fn test_engine_payload_shape() {
        let result = normalize(&engine_result()).unwrap().value;
        let payload = engine_payload(&result);

        assert_eq!(payload["policy"]["type_name"], "Parental Leave Expansion");
        assert_eq!(payload["timeline"]["years"], json!([0, 1, 2]));
        assert_eq!(payload["timeline"]["duration"], 2);
        assert!(payload["timeline"].get("employment_ratio").is_none());
        assert_eq!(payload["timeline"]["leadership"][2]["female"], 31.8);
        // Falls back to the last timeline year when the engine omitted it
        assert_eq!(payload["final_metrics"]["final_pay_gap"], 21.2);
        assert_eq!(payload["final_metrics"]["pay_gap_reduction"], 1.8);
        assert_eq!(payload["timestamp"], "2025-06-01T10:00:00");
    }

    #[test]
    fn test_engine_payload_normalizes_back() {
        let result = normalize(&engine_result()).unwrap().value;
        let again = normalize(&engine_payload(&result)).unwrap().value;
        assert_eq!(again.policy(), result.policy());
        assert_eq!(again.timeline(), result.timeline());
        assert_eq!(again.risk(), result.risk());
        assert_eq!(again.computed_at(), result.computed_at());
    }

    #[test]
    fn test_report_file_name() {
        let draft = PolicyDraft::new("Equal Pay 2025", PolicyKind::EqualPay, 75.0, 5, 2e6);
        let policy = validate(&draft).unwrap();
        assert_eq!(report_file_name(&policy), "PolicySim_Equal_Pay_2025_Report.pdf");
    }
}
