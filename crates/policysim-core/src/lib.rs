//! PolicySim Core - client-side simulation and comparison orchestration
//!
//! PolicySim lets a user configure a gender-equality policy, preview its
//! effect locally, run it on a remote simulation engine, and compare two
//! policies side by side. This crate is everything between the form and the
//! engine.
//!
//! # Architecture
//!
//! 1. **Policy model** (`policy`): drafts, the validator, and the policy catalog
//! 2. **Preview** (`preview`): instant local pay gap estimate, never authoritative
//! 3. **Normalizer** (`normalize`): the one seam where engine JSON becomes typed results
//! 4. **Lifecycle** (`lifecycle`): single-simulation state machine with request tokens
//! 5. **Comparison** (`comparison`): validated joint comparisons
//! 6. **Transport** (`transport`): the engine behind an async trait, HTTP by default
//!
//! # Quick Start
//!
//! ```
//! use policysim_core::policy::{validate, PolicyDraft, PolicyKind};
//! use policysim_core::preview;
//!
//! let draft = PolicyDraft::new("Equal Pay 2025", PolicyKind::EqualPay, 75.0, 5, 2_000_000.0);
//!
//! // Local preview while the form is being edited
//! let series = preview::estimate(&draft);
//! assert_eq!(series.len(), 6);
//!
//! // Only a validated configuration can be submitted
//! let policy = validate(&draft).unwrap();
//! assert_eq!(policy.kind(), PolicyKind::EqualPay);
//! ```
//!
//! Running a simulation needs an engine:
//!
//! ```no_run
//! # async fn run() -> policysim_core::Result<()> {
//! use std::sync::Arc;
//! use policysim_core::{ClientConfig, HttpEngineClient, PolicyDraft, PolicyKind, SimulationFlow};
//!
//! let client = HttpEngineClient::new(ClientConfig::default())?;
//! let flow = SimulationFlow::new(Arc::new(client));
//!
//! let draft = PolicyDraft::new("Equal Pay 2025", PolicyKind::EqualPay, 75.0, 5, 2_000_000.0);
//! let result = flow.run(&draft).await?;
//! println!("Risk: {}", result.risk().level);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod comparison;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod normalize;
pub mod policy;
pub mod preview;
pub mod series;
pub mod transport;

// Re-export commonly used types for convenience
pub use comparison::{ComparisonError, ComparisonOrchestrator, Side};
pub use config::ClientConfig;
pub use error::{
    ConfigError, NormalizationError, PolicySimError, Result, ResultExt, StaleResponseError,
    SubmitError, TransportError, ValidationError, ValidationErrors,
};
pub use lifecycle::{LifecycleController, RequestToken, SimulationFlow, SimulationState};
pub use model::{
    ComparisonResult, FinalMetrics, LeadershipSplit, RiskAssessment, RiskLevel, SimulationResult,
    Timeline, TimelinePoint,
};
pub use normalize::{normalize, normalize_comparison, NormalizationWarning, Normalized};
pub use policy::{validate, PolicyConfig, PolicyDraft, PolicyKind};
pub use preview::PreviewSeries;
pub use series::{ChartSeries, SeriesPoint, TimelineMetric};
pub use transport::{EngineTransport, HttpEngineClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
