//! Comparison orchestrator
//!
//! Validates two drafts independently, then runs one joint comparison on
//! the engine. Nothing is sent unless both sides are valid, and any remote
//! failure is reported once for the comparison as a whole. Recoverable
//! deviations in either side come back as warnings next to the result.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::error::{NormalizationError, TransportError, ValidationErrors};
use crate::model::ComparisonResult;
use crate::normalize::{normalize_comparison, Normalized};
use crate::policy::{validate, PolicyDraft};
use crate::transport::EngineTransport;

/// Side of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// First policy
    A,
    /// Second policy
    B,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("Policy A"),
            Self::B => f.write_str("Policy B"),
        }
    }
}

/// Why a comparison produced no result
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComparisonError {
    /// One or both drafts failed validation; only failing sides are listed
    #[error("{}", describe_invalid(.0))]
    InvalidPolicies(Vec<(Side, ValidationErrors)>),

    /// The engine could not produce a usable comparison
    #[error("{message}")]
    Failed {
        /// One-line summary for display
        message: String,
    },
}

impl ComparisonError {
    /// Sides that failed validation
    pub fn invalid_sides(&self) -> Vec<Side> {
        match self {
            Self::InvalidPolicies(sides) => sides.iter().map(|(side, _)| *side).collect(),
            Self::Failed { .. } => Vec::new(),
        }
    }

    /// Field errors of one side, if it failed validation
    pub fn errors_for(&self, side: Side) -> Option<&ValidationErrors> {
        match self {
            Self::InvalidPolicies(sides) => sides
                .iter()
                .find(|(s, _)| *s == side)
                .map(|(_, errors)| errors),
            Self::Failed { .. } => None,
        }
    }
}

fn describe_invalid(sides: &[(Side, ValidationErrors)]) -> String {
    sides
        .iter()
        .map(|(side, errors)| format!("{side} is invalid: {errors}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Runs validated joint comparisons
#[derive(Debug, Clone)]
pub struct ComparisonOrchestrator {
    transport: Arc<dyn EngineTransport>,
}

impl ComparisonOrchestrator {
    /// Orchestrator sending comparisons through `transport`
    pub fn new(transport: Arc<dyn EngineTransport>) -> Self {
        Self { transport }
    }

    /// Compare two drafts.
    ///
    /// Warnings carry side-prefixed paths (`policy_a.risk`, ...).
    pub async fn compare(
        &self,
        a: &PolicyDraft,
        b: &PolicyDraft,
    ) -> Result<Normalized<ComparisonResult>, ComparisonError> {
        let (policy_a, policy_b) = match (validate(a), validate(b)) {
            (Ok(policy_a), Ok(policy_b)) => (policy_a, policy_b),
            (result_a, result_b) => {
                let invalid: Vec<_> = [(Side::A, result_a.err()), (Side::B, result_b.err())]
                    .into_iter()
                    .filter_map(|(side, errors)| errors.map(|e| (side, e)))
                    .collect();
                tracing::debug!("Comparison refused: {}", describe_invalid(&invalid));
                return Err(ComparisonError::InvalidPolicies(invalid));
            }
        };

        tracing::info!(
            "Comparing '{}' with '{}'",
            policy_a.name(),
            policy_b.name()
        );

        let raw = self
            .transport
            .compare(&policy_a, &policy_b)
            .await
            .map_err(unreachable_engine)?;
        let normalized = normalize_comparison(&raw).map_err(unusable_response)?;

        tracing::info!(
            "Comparison complete, recommended: {} ({} warning(s))",
            normalized.value.analysis().overall_recommendation,
            normalized.warnings.len()
        );
        Ok(normalized)
    }
}

fn unreachable_engine(err: TransportError) -> ComparisonError {
    tracing::warn!("Comparison request failed: {}", err);
    ComparisonError::Failed {
        message: err.user_message(),
    }
}

fn unusable_response(err: NormalizationError) -> ComparisonError {
    tracing::warn!("Comparison response unusable: {}", err);
    let message = match err {
        NormalizationError::EngineError(message) => message,
        _ => "The simulation engine sent an unexpected comparison response".to_string(),
    };
    ComparisonError::Failed { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyKind;

    #[test]
    fn test_invalid_policies_message_names_failing_sides() {
        let errors = validate(&PolicyDraft::new("", PolicyKind::EqualPay, 75.0, 5, 2e6)).unwrap_err();
        let err = ComparisonError::InvalidPolicies(vec![(Side::B, errors)]);
        assert_eq!(err.invalid_sides(), vec![Side::B]);
        assert!(err.errors_for(Side::A).is_none());
        assert_eq!(err.to_string(), "Policy B is invalid: name: must not be empty");
    }
}
