//! Simulation lifecycle
//!
//! [`LifecycleController`] is a synchronous state machine
//! (`Idle -> Submitting -> Succeeded | Failed`) that owns the single in-flight
//! simulation of one surface. Every accepted submission gets a fresh
//! [`RequestToken`]; a resolution carrying any other token is stale and
//! leaves the state untouched.
//!
//! [`SimulationFlow`] drives a controller against an [`EngineTransport`].

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{
    NormalizationError, PolicySimError, Result, StaleResponseError, SubmitError, TransportError,
};
use crate::model::SimulationResult;
use crate::normalize::{normalize, NormalizationWarning};
use crate::policy::{validate, PolicyConfig, PolicyDraft};
use crate::transport::EngineTransport;

/// Identifies one accepted submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

impl RequestToken {
    /// Token with a given sequence number
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Sequence number
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State of a simulation surface
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationState {
    /// Nothing submitted yet, or reset
    Idle,
    /// A request is in flight
    Submitting {
        /// Token the resolution must carry
        token: RequestToken,
        /// The validated policy that was sent
        policy: PolicyConfig,
    },
    /// The latest request produced a result
    Succeeded(SimulationResult),
    /// The latest request failed
    Failed {
        /// One-line summary for display
        message: String,
    },
}

impl SimulationState {
    /// Lowercase state name, for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting { .. } => "submitting",
            Self::Succeeded(_) => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }
}

/// An accepted submission
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Token to resolve or reject with
    pub token: RequestToken,
    /// Validated policy to send
    pub policy: PolicyConfig,
}

/// Single-simulation state machine
#[derive(Debug)]
pub struct LifecycleController {
    state: SimulationState,
    last_success: Option<SimulationResult>,
    warnings: Vec<NormalizationWarning>,
    next_token: u64,
}

impl Default for LifecycleController {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleController {
    /// Idle controller; the first token is `#1`
    pub fn new() -> Self {
        Self {
            state: SimulationState::Idle,
            last_success: None,
            warnings: Vec::new(),
            next_token: 1,
        }
    }

    /// Current state
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Most recent successful result, kept through a later failure
    pub fn last_result(&self) -> Option<&SimulationResult> {
        self.last_success.as_ref()
    }

    /// Warnings raised while normalizing the most recent result
    pub fn warnings(&self) -> &[NormalizationWarning] {
        &self.warnings
    }

    /// Token of the request currently in flight
    pub fn in_flight(&self) -> Option<RequestToken> {
        match self.state {
            SimulationState::Submitting { token, .. } => Some(token),
            _ => None,
        }
    }

    /// Whether a submission would be refused as busy
    pub fn is_busy(&self) -> bool {
        self.in_flight().is_some()
    }

    /// Validate a draft and, if it passes, enter `Submitting`.
    ///
    /// Refused while another submission is in flight; the earlier one is
    /// neither queued behind nor cancelled.
    pub fn submit(&mut self, draft: &PolicyDraft) -> std::result::Result<Submission, SubmitError> {
        if let Some(in_flight) = self.in_flight() {
            tracing::debug!("Submission refused, request {} in flight", in_flight);
            return Err(SubmitError::Busy { in_flight });
        }

        let policy = validate(draft)?;
        let token = RequestToken(self.next_token);
        self.next_token += 1;

        tracing::info!("Simulation {} submitted: {}", token, policy.name());
        self.state = SimulationState::Submitting {
            token,
            policy: policy.clone(),
        };
        Ok(Submission { token, policy })
    }

    /// Complete the in-flight request with the engine's raw response
    pub fn resolve(&mut self, token: RequestToken, raw: &Value) -> Result<SimulationResult> {
        self.check_current(token)?;

        match normalize(raw) {
            Ok(normalized) => {
                tracing::info!("Simulation {} succeeded", token);
                let result = normalized.value;
                self.warnings = normalized.warnings;
                self.last_success = Some(result.clone());
                self.state = SimulationState::Succeeded(result.clone());
                Ok(result)
            }
            Err(err) => {
                tracing::warn!("Simulation {} returned an unusable response: {}", token, err);
                let message = match &err {
                    NormalizationError::EngineError(message) => message.clone(),
                    other => format!("The simulation engine sent an unexpected response ({other})"),
                };
                self.state = SimulationState::Failed { message };
                Err(err.into())
            }
        }
    }

    /// Fail the in-flight request with a transport error
    pub fn reject(
        &mut self,
        token: RequestToken,
        error: &TransportError,
    ) -> std::result::Result<(), StaleResponseError> {
        self.check_current(token)?;
        tracing::warn!("Simulation {} failed: {}", token, error);
        self.state = SimulationState::Failed {
            message: error.user_message(),
        };
        Ok(())
    }

    /// Return to `Idle`, dropping any held result. A request still in
    /// flight becomes stale.
    pub fn reset(&mut self) {
        if let Some(token) = self.in_flight() {
            tracing::debug!("Reset while request {} in flight", token);
        }
        self.state = SimulationState::Idle;
        self.last_success = None;
        self.warnings.clear();
    }

    fn check_current(&self, token: RequestToken) -> std::result::Result<(), StaleResponseError> {
        let current = self.in_flight();
        if current == Some(token) {
            return Ok(());
        }
        tracing::debug!("Discarding stale response for request {}", token);
        Err(StaleResponseError { token, current })
    }
}

/// Submit, await and resolve cycle against a transport.
///
/// The controller lock is never held across the request, so the state stays
/// observable (and resettable) while the engine is working.
#[derive(Debug, Clone)]
pub struct SimulationFlow {
    controller: Arc<Mutex<LifecycleController>>,
    transport: Arc<dyn EngineTransport>,
}

impl SimulationFlow {
    /// Flow with an idle controller
    pub fn new(transport: Arc<dyn EngineTransport>) -> Self {
        Self {
            controller: Arc::new(Mutex::new(LifecycleController::new())),
            transport,
        }
    }

    /// Shared controller, for observing state
    pub fn controller(&self) -> &Arc<Mutex<LifecycleController>> {
        &self.controller
    }

    /// Transport used for the simulation request
    pub fn transport(&self) -> &Arc<dyn EngineTransport> {
        &self.transport
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SimulationState {
        self.controller.lock().state().clone()
    }

    /// See [`LifecycleController::reset`]
    pub fn reset(&self) {
        self.controller.lock().reset();
    }

    /// Run one simulation to completion.
    ///
    /// A `Stale` error means the flow was reset (or resubmitted) while the
    /// request was in flight. It has no user message; callers drop it.
    pub async fn run(&self, draft: &PolicyDraft) -> Result<SimulationResult> {
        let submission = self.controller.lock().submit(draft)?;

        let outcome = self.transport.simulate(&submission.policy).await;

        let mut controller = self.controller.lock();
        match outcome {
            Ok(raw) => controller.resolve(submission.token, &raw),
            Err(err) => {
                controller.reject(submission.token, &err)?;
                Err(PolicySimError::from(err))
            }
        }
    }
}
