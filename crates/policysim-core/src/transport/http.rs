//! HTTP/JSON engine client

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{engine_payload, CompareRequest, EngineTransport, PolicyRequest};
use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::model::SimulationResult;
use crate::policy::{PolicyConfig, PolicyKind};

/// Error body returned by the engine
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct ExplainResponse {
    explanation: String,
}

#[derive(Debug, Serialize)]
struct ReportRequest<'a> {
    simulation_results: Value,
    explanation: &'a str,
}

/// Engine client over HTTP/JSON
#[derive(Debug, Clone)]
pub struct HttpEngineClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl HttpEngineClient {
    /// Create a client for the configured engine
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        reqwest::Url::parse(config.base_url.trim())
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {e}", config.base_url)))?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Configuration this client was built from
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, TransportError> {
        let url = self.config.endpoint(path);
        tracing::debug!("POST {}", url);
        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;
        check_status(response).await
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, TransportError> {
        let url = self.config.endpoint(path);
        tracing::debug!("GET {}", url);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;
        check_status(response).await
    }

    async fn json(&self, response: reqwest::Response) -> Result<Value, TransportError> {
        let body: Value = response.json().await.map_err(|e| self.map_error(e))?;
        match error_message(&body) {
            Some(message) => Err(TransportError::Server {
                status: None,
                message,
            }),
            None => Ok(body),
        }
    }

    fn map_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.config.timeout_secs)
        } else {
            TransportError::from(e)
        }
    }
}

/// Turn a non-2xx response into one `TransportError`, keeping the engine's
/// `error` string when the body carries one.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| {
            format!(
                "Simulation engine error ({})",
                status.canonical_reason().unwrap_or("unknown status")
            )
        });
    tracing::warn!("Engine returned {}: {}", status, message);

    Err(TransportError::Server {
        status: Some(status.as_u16()),
        message,
    })
}

/// `{error}` or `{success: false}` bodies delivered with a 2xx status
fn error_message(body: &Value) -> Option<String> {
    if let Some(error) = body.get("error").and_then(Value::as_str) {
        return Some(error.to_string());
    }
    (body.get("success") == Some(&Value::Bool(false)))
        .then(|| "The simulation engine reported a failure".to_string())
}

#[async_trait]
impl EngineTransport for HttpEngineClient {
    async fn simulate(&self, policy: &PolicyConfig) -> Result<Value, TransportError> {
        let response = self
            .post("/api/simulate", &PolicyRequest::from(policy))
            .await?;
        self.json(response).await
    }

    async fn compare(&self, a: &PolicyConfig, b: &PolicyConfig) -> Result<Value, TransportError> {
        let body = CompareRequest {
            policy_a: PolicyRequest::from(a),
            policy_b: PolicyRequest::from(b),
        };
        let response = self.post("/api/compare", &body).await?;
        self.json(response).await
    }

    async fn explain(&self, result: &SimulationResult) -> Result<String, TransportError> {
        let body = json!({ "simulation_results": engine_payload(result) });
        let response = self.post("/api/explain", &body).await?;
        let body = self.json(response).await?;
        serde_json::from_value::<ExplainResponse>(body)
            .map(|r| r.explanation)
            .map_err(|e| TransportError::Decode(e.to_string()))
    }

    async fn download_report(
        &self,
        result: &SimulationResult,
        explanation: &str,
    ) -> Result<Vec<u8>, TransportError> {
        let body = ReportRequest {
            simulation_results: engine_payload(result),
            explanation,
        };
        let response = self.post("/api/download-report", &body).await?;
        let bytes = response.bytes().await.map_err(|e| self.map_error(e))?;
        Ok(bytes.to_vec())
    }

    async fn policy_insights(&self, kind: PolicyKind) -> Result<Value, TransportError> {
        let response = self
            .get(&format!("/api/policy-insights/{}", kind.as_str()))
            .await?;
        self.json(response).await
    }

    async fn health(&self) -> Result<Value, TransportError> {
        let response = self.get("/api/health").await?;
        self.json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let config = ClientConfig::new().with_base_url("not a url");
        assert!(matches!(
            HttpEngineClient::new(config),
            Err(TransportError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_client_keeps_config() {
        let config = ClientConfig::new().with_timeout_secs(3);
        let client = HttpEngineClient::new(config.clone()).unwrap();
        assert_eq!(client.config(), &config);
    }

    #[test]
    fn test_error_message_from_success_body() {
        assert_eq!(
            error_message(&json!({"error": "Invalid policy type"})),
            Some("Invalid policy type".to_string())
        );
        assert!(error_message(&json!({"success": false})).is_some());
        assert!(error_message(&json!({"success": true, "data": {}})).is_none());
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_a_transport_error() {
        // Port 9 (discard) is closed on test hosts
        let config = ClientConfig::new()
            .with_base_url("http://127.0.0.1:9")
            .with_timeout_secs(2);
        let client = HttpEngineClient::new(config).unwrap();
        let err = client.health().await.unwrap_err();
        assert_eq!(err.user_message(), "Could not reach the simulation engine");
    }
}
