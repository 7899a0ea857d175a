//! Shared fixtures: a scripted engine transport and engine response bodies.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use policysim_core::{EngineTransport, PolicyConfig, PolicyKind, SimulationResult, TransportError};
use serde_json::{json, Value};
use tokio::sync::{Mutex, Notify};

/// A request observed by the transport
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Simulate(String),
    Compare(String, String),
    Explain(String),
    Report(String),
    Insights(PolicyKind),
    Health,
}

/// A scripted reply, optionally held until its gate is released
#[derive(Debug)]
pub struct Reply {
    gate: Option<Arc<Notify>>,
    outcome: Result<Value, TransportError>,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self {
            gate: None,
            outcome: Ok(body),
        }
    }

    pub fn err(error: TransportError) -> Self {
        Self {
            gate: None,
            outcome: Err(error),
        }
    }

    /// Hold this reply until the returned gate is notified
    pub fn held(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(gate.clone());
        (self, gate)
    }
}

/// Transport that replays scripted replies in order and records every call
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    calls: Mutex<Vec<Call>>,
    replies: Mutex<VecDeque<Reply>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn push(&self, reply: Reply) {
        self.replies.lock().await.push_back(reply);
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    /// Yield until at least `n` calls have been recorded
    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls.lock().await.len() < n {
            tokio::task::yield_now().await;
        }
    }

    async fn reply(&self, call: Call) -> Result<Value, TransportError> {
        self.calls.lock().await.push(call);
        let reply = self.replies.lock().await.pop_front();
        let Some(reply) = reply else {
            return Err(TransportError::Request("no scripted reply".to_string()));
        };
        if let Some(gate) = reply.gate {
            gate.notified().await;
        }
        reply.outcome
    }
}

#[async_trait::async_trait]
impl EngineTransport for ScriptedTransport {
    async fn simulate(&self, policy: &PolicyConfig) -> Result<Value, TransportError> {
        self.reply(Call::Simulate(policy.name().to_string())).await
    }

    async fn compare(&self, a: &PolicyConfig, b: &PolicyConfig) -> Result<Value, TransportError> {
        self.reply(Call::Compare(a.name().to_string(), b.name().to_string()))
            .await
    }

    async fn explain(&self, result: &SimulationResult) -> Result<String, TransportError> {
        let body = self
            .reply(Call::Explain(result.policy().name().to_string()))
            .await?;
        Ok(body["explanation"].as_str().unwrap_or_default().to_string())
    }

    async fn download_report(
        &self,
        result: &SimulationResult,
        _explanation: &str,
    ) -> Result<Vec<u8>, TransportError> {
        let body = self
            .reply(Call::Report(result.policy().name().to_string()))
            .await?;
        Ok(body.to_string().into_bytes())
    }

    async fn policy_insights(&self, kind: PolicyKind) -> Result<Value, TransportError> {
        self.reply(Call::Insights(kind)).await
    }

    async fn health(&self) -> Result<Value, TransportError> {
        self.reply(Call::Health).await
    }
}

/// One engine simulation payload, without the envelope
pub fn simulation_data(name: &str, kind: PolicyKind, strength: f64, final_gap: f64) -> Value {
    json!({
        "policy": {
            "name": name,
            "type": kind.as_str(),
            "type_name": kind.info().name,
            "description": kind.info().description,
            "percentage": strength,
            "duration": 3,
            "budget": 2000000
        },
        "timeline": {
            "years": [0, 1, 2, 3],
            "pay_gap": [23.0, 23.0 - (23.0 - final_gap) / 3.0, 23.0 - 2.0 * (23.0 - final_gap) / 3.0, final_gap],
            "employment_ratio": [0.82, 0.83, 0.84, 0.85],
            "leadership": [
                {"female": 30.0, "male": 70.0},
                {"female": 31.0, "male": 69.0},
                {"female": 32.0, "male": 68.0},
                {"female": 33.0, "male": 67.0}
            ],
            "budget_spent": [0.0, 666666.67, 1333333.33, 2000000.0],
            "duration": 3
        },
        "final_metrics": {
            "final_pay_gap": final_gap,
            "pay_gap_reduction": 23.0 - final_gap,
            "final_employment_ratio": 0.85,
            "employment_improvement": 3.66,
            "final_leadership": {"female": 33.0, "male": 67.0},
            "total_budget_spent": 2000000.0
        },
        "risk": {"score": 40.0, "level": "medium"},
        "timestamp": "2025-03-14T09:26:53.589793"
    })
}

/// `/api/simulate` success body
pub fn simulation_body(name: &str, final_gap: f64) -> Value {
    json!({
        "success": true,
        "data": simulation_data(name, PolicyKind::EqualPay, 75.0, final_gap)
    })
}

/// `/api/compare` success body; `a` reduces the gap 3.2 points more than `b`
pub fn comparison_body(a: &str, b: &str) -> Value {
    json!({
        "success": true,
        "data": {
            "policy_a": simulation_data(a, PolicyKind::EqualPay, 75.0, 15.0),
            "policy_b": simulation_data(b, PolicyKind::LeadershipQuota, 40.0, 18.2),
            "analysis": {
                "recommendations": [
                    "Policy A is more effective at reducing the pay gap"
                ],
                "overall_recommendation": "Policy A",
                "metrics_comparison": {
                    "pay_gap_reduction_diff": 3.2,
                    "budget_diff": 0.0,
                    "risk_diff": 0.0,
                    "employment_diff": 0.0
                }
            }
        },
        "explanation": "Policy A reduces the pay gap by 3.2 more percentage points."
    })
}
