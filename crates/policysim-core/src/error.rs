//! Error types for PolicySim Core
//!
//! Every failure the orchestration layer can produce is a typed `thiserror`
//! enum. Validation failures are local and field-level, transport failures
//! come from the remote engine, normalization failures mean the engine's
//! response did not match the expected contract, and stale responses are an
//! internal signal that callers discard.

use std::fmt;

use thiserror::Error;

use crate::lifecycle::RequestToken;

/// Result type alias for PolicySim operations
pub type Result<T> = std::result::Result<T, PolicySimError>;

/// Main error type for PolicySim operations
#[derive(Error, Debug)]
pub enum PolicySimError {
    /// One or more draft fields are out of range
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// The remote engine could not be reached or refused the request
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The remote engine answered with an unexpected shape
    #[error("Normalization error: {0}")]
    Normalization(#[from] NormalizationError),

    /// A simulation could not be started
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// A response arrived for a superseded request
    #[error(transparent)]
    Stale(#[from] StaleResponseError),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        /// What was being attempted
        context: String,
        /// Underlying error
        source: Box<PolicySimError>,
    },
}

/// A single violated field of a policy draft.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// Draft field name (`name`, `strength_percent`, `duration_years`, `budget`)
    pub field: &'static str,
    /// Human-readable reason, suitable for inline display
    pub reason: String,
}

impl ValidationError {
    /// Create a new field error
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Every violated field of a draft, collected in one pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub(crate) fn new(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }

    /// The individual field errors, in field order
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Names of the violated fields
    pub fn fields(&self) -> Vec<&'static str> {
        self.0.iter().map(|e| e.field).collect()
    }

    /// Whether the given field is among the violations
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Number of violated fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for errors produced by the validator
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Errors reaching the remote simulation engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection or protocol failure before a response arrived
    #[error("Request failed: {0}")]
    Request(String),

    /// The engine answered with an error
    #[error("{message}")]
    Server {
        /// HTTP status, when the error came from a non-2xx response
        status: Option<u16>,
        /// The engine's `error` string, or a generic summary
        message: String,
    },

    /// No response within the configured timeout (seconds)
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// The body was not JSON
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// The configured base URL cannot be used
    #[error("Invalid engine URL: {0}")]
    InvalidUrl(String),
}

impl TransportError {
    /// Message shown to the user as the single failure summary
    pub fn user_message(&self) -> String {
        match self {
            Self::Server { message, .. } => message.clone(),
            Self::Request(_) | Self::Timeout(_) => {
                "Could not reach the simulation engine".to_string()
            }
            Self::Decode(_) => "The simulation engine sent an unreadable response".to_string(),
            Self::InvalidUrl(url) => format!("Invalid engine URL: {url}"),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            TransportError::Decode(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// The engine response did not match the expected contract
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    /// A required field is absent or null
    #[error("Missing required field `{path}`")]
    MissingField {
        /// Dotted JSON path
        path: String,
    },

    /// A field has the wrong JSON type
    #[error("Field `{path}` has the wrong type: expected {expected}")]
    InvalidType {
        /// Dotted JSON path
        path: String,
        /// Expected JSON type
        expected: &'static str,
    },

    /// A field has the right type but an unusable value
    #[error("Field `{path}` is invalid: {reason}")]
    InvalidValue {
        /// Dotted JSON path
        path: String,
        /// What is wrong with the value
        reason: String,
    },

    /// The engine answered with an `{error}` body or `success: false`
    #[error("Engine reported an error: {0}")]
    EngineError(String),
}

impl NormalizationError {
    /// JSON path of the offending field, if any
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::MissingField { path }
            | Self::InvalidType { path, .. }
            | Self::InvalidValue { path, .. } => Some(path),
            Self::EngineError(_) => None,
        }
    }
}

/// A resolution arrived for a request that is no longer current.
///
/// Never shown to the user.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Discarded stale response for request {token} (current: {current:?})")]
pub struct StaleResponseError {
    /// Token the resolution carried
    pub token: RequestToken,
    /// Token in flight when it arrived, if any
    pub current: Option<RequestToken>,
}

/// A submission was refused before any request was sent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The draft failed validation
    #[error("Invalid policy: {0}")]
    Invalid(#[from] ValidationErrors),

    /// A simulation is already in flight
    #[error("A simulation is already running (request {in_flight})")]
    Busy {
        /// The submission still in flight
        in_flight: RequestToken,
    },
}

/// Errors loading client configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        /// File that was read
        path: String,
        /// I/O failure
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`ClientConfig`](crate::ClientConfig)
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// File, or other origin, of the TOML text
        path: String,
        /// Parser failure
        source: toml::de::Error,
    },

    /// A setting is out of range
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue {
        /// Setting name
        key: String,
        /// What is wrong with it
        reason: String,
    },
}

impl PolicySimError {
    /// Add context to an error
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error only signals a superseded request
    pub fn is_stale(&self) -> bool {
        match self {
            Self::Stale(_) => true,
            Self::WithContext { source, .. } => source.is_stale(),
            _ => false,
        }
    }

    /// Single summary line for display, without internal detail.
    ///
    /// `None` for stale responses, which are never shown.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Stale(_) => None,
            Self::Transport(e) => Some(e.user_message()),
            Self::WithContext { source, .. } => source.user_message(),
            other => Some(other.to_string()),
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add lazy context to a Result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<PolicySimError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_display_lists_every_field() {
        let errors = ValidationErrors::new(vec![
            ValidationError::new("name", "must not be empty"),
            ValidationError::new("budget", "must be at least 100000"),
        ]);

        let msg = errors.to_string();
        assert!(msg.contains("name: must not be empty"));
        assert!(msg.contains("budget: must be at least 100000"));
        assert_eq!(errors.fields(), vec!["name", "budget"]);
        assert!(errors.has_field("budget"));
        assert!(!errors.has_field("duration_years"));
    }

    #[test]
    fn test_server_message_is_surfaced_verbatim() {
        let err = TransportError::Server {
            status: Some(400),
            message: "Percentage must be between 30 and 50".to_string(),
        };
        assert_eq!(err.user_message(), "Percentage must be between 30 and 50");

        let err: PolicySimError = err.into();
        assert_eq!(
            err.user_message().as_deref(),
            Some("Percentage must be between 30 and 50")
        );
    }

    #[test]
    fn test_connection_failure_gets_generic_message() {
        let err = TransportError::Request("connection refused".to_string());
        assert_eq!(err.user_message(), "Could not reach the simulation engine");
    }

    #[test]
    fn test_error_context() {
        let err: PolicySimError = NormalizationError::MissingField {
            path: "risk.score".to_string(),
        }
        .into();
        let err = err.context("Failed to normalize simulation");

        let msg = err.to_string();
        assert!(msg.contains("Failed to normalize simulation"));
        assert!(msg.contains("risk.score"));
    }

    #[test]
    fn test_result_ext() {
        let result: std::result::Result<(), TransportError> =
            Err(TransportError::Timeout(30));
        let result = result.context("Simulation request failed");

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Simulation request failed"));
    }

    #[test]
    fn test_stale_is_detected_through_context() {
        let err: PolicySimError = StaleResponseError {
            token: RequestToken::from_raw(1),
            current: Some(RequestToken::from_raw(2)),
        }
        .into();
        assert!(err.user_message().is_none());

        let err = err.context("resolve");
        assert!(err.is_stale());
        assert!(err.user_message().is_none());
    }
}
