//! Policy configuration model and validator
//!
//! A [`PolicyDraft`] is the freely mutable value a form edits. A
//! [`PolicyConfig`] is the immutable, validated configuration that may be
//! submitted to the engine; the only public way to obtain one is
//! [`validate`], which reports every violated field at once.
//!
//! # Example
//!
//! ```
//! use policysim_core::policy::{validate, PolicyDraft, PolicyKind};
//!
//! let draft = PolicyDraft::new("Equal Pay 2025", PolicyKind::EqualPay, 75.0, 5, 2_000_000.0);
//! let policy = validate(&draft).unwrap();
//! assert_eq!(policy.duration_years(), 5);
//!
//! let mut bad = draft.clone();
//! bad.name = "  ".to_string();
//! bad.budget = 10.0;
//! let errors = validate(&bad).unwrap_err();
//! assert_eq!(errors.fields(), vec!["name", "budget"]);
//! ```

pub mod catalog;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationErrors};

pub use catalog::{advise, Advisory, PolicyInfo, Rating, TimeToImpact};

/// Shortest accepted policy duration, in years
pub const MIN_DURATION_YEARS: u32 = 1;

/// Longest accepted policy duration, in years
pub const MAX_DURATION_YEARS: u32 = 10;

/// Smallest accepted budget, in whole currency units
pub const MIN_BUDGET: f64 = 100_000.0;

/// Policy type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Equal pay for equal work
    EqualPay,
    /// Minimum share of women in leadership
    LeadershipQuota,
    /// Extended paid parental leave
    ParentalLeave,
}

impl PolicyKind {
    /// All kinds, in catalog order
    pub const ALL: [PolicyKind; 3] = [
        PolicyKind::EqualPay,
        PolicyKind::LeadershipQuota,
        PolicyKind::ParentalLeave,
    ];

    /// Wire identifier used by the engine
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EqualPay => "equal_pay",
            Self::LeadershipQuota => "leadership_quota",
            Self::ParentalLeave => "parental_leave",
        }
    }

    /// Accepted strength range, inclusive
    pub fn strength_range(self) -> (f64, f64) {
        let info = self.info();
        (info.min_percent, info.max_percent)
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a policy kind identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown policy type: {0}")]
pub struct UnknownPolicyKind(pub String);

impl FromStr for PolicyKind {
    type Err = UnknownPolicyKind;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "equal_pay" => Ok(Self::EqualPay),
            "leadership_quota" => Ok(Self::LeadershipQuota),
            "parental_leave" => Ok(Self::ParentalLeave),
            other => Err(UnknownPolicyKind(other.to_string())),
        }
    }
}

/// Editable, unvalidated policy parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDraft {
    /// Policy name
    pub name: String,

    /// Policy type
    #[serde(rename = "type")]
    pub kind: PolicyKind,

    /// Policy strength, in percent
    pub strength_percent: f64,

    /// Duration in years
    pub duration_years: i64,

    /// Total budget, in whole currency units
    pub budget: f64,
}

impl PolicyDraft {
    /// Create a new draft
    pub fn new(
        name: impl Into<String>,
        kind: PolicyKind,
        strength_percent: f64,
        duration_years: i64,
        budget: f64,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            strength_percent,
            duration_years,
            budget,
        }
    }

    /// Parse a draft from TOML text
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

impl Default for PolicyDraft {
    fn default() -> Self {
        Self::new("", PolicyKind::EqualPay, 75.0, 5, 2_000_000.0)
    }
}

impl From<&PolicyConfig> for PolicyDraft {
    fn from(policy: &PolicyConfig) -> Self {
        Self::new(
            policy.name.clone(),
            policy.kind,
            policy.strength_percent,
            i64::from(policy.duration_years),
            policy.budget,
        )
    }
}

/// Validated, immutable policy configuration
///
/// Serializes with the field names the engine echoes back in results
/// (`name`, `type`, `percentage`, `duration`, `budget`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyConfig {
    name: String,
    #[serde(rename = "type")]
    kind: PolicyKind,
    #[serde(rename = "percentage")]
    strength_percent: f64,
    #[serde(rename = "duration")]
    duration_years: u32,
    budget: f64,
}

impl PolicyConfig {
    /// Build a configuration from values echoed by the engine.
    ///
    /// The engine is trusted for its own echo; range checks on it are the
    /// normalizer's business and only produce warnings.
    pub(crate) fn from_engine(
        name: String,
        kind: PolicyKind,
        strength_percent: f64,
        duration_years: u32,
        budget: f64,
    ) -> Self {
        Self {
            name,
            kind,
            strength_percent,
            duration_years,
            budget,
        }
    }

    /// Policy name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Policy type
    pub fn kind(&self) -> PolicyKind {
        self.kind
    }

    /// Policy strength, in percent
    pub fn strength_percent(&self) -> f64 {
        self.strength_percent
    }

    /// Duration in years
    pub fn duration_years(&self) -> u32 {
        self.duration_years
    }

    /// Total budget, in whole currency units
    pub fn budget(&self) -> f64 {
        self.budget
    }

    /// Catalog entry for this policy's kind
    pub fn info(&self) -> &'static PolicyInfo {
        self.kind.info()
    }
}

/// Validate a draft, reporting every violated field.
pub fn validate(draft: &PolicyDraft) -> std::result::Result<PolicyConfig, ValidationErrors> {
    let mut errors = Vec::new();

    let name = draft.name.trim();
    if name.is_empty() {
        errors.push(ValidationError::new("name", "must not be empty"));
    }

    let (min, max) = draft.kind.strength_range();
    if !draft.strength_percent.is_finite() {
        errors.push(ValidationError::new("strength_percent", "must be a number"));
    } else if draft.strength_percent < min || draft.strength_percent > max {
        errors.push(ValidationError::new(
            "strength_percent",
            format!(
                "must be between {min} and {max} for {}",
                draft.kind.info().name
            ),
        ));
    }

    let duration = u32::try_from(draft.duration_years)
        .ok()
        .filter(|d| (MIN_DURATION_YEARS..=MAX_DURATION_YEARS).contains(d));
    if duration.is_none() {
        errors.push(ValidationError::new(
            "duration_years",
            format!("must be between {MIN_DURATION_YEARS} and {MAX_DURATION_YEARS} years"),
        ));
    }

    if !draft.budget.is_finite() {
        errors.push(ValidationError::new("budget", "must be a number"));
    } else if draft.budget < MIN_BUDGET {
        errors.push(ValidationError::new(
            "budget",
            format!("must be at least {MIN_BUDGET:.0}"),
        ));
    } else if draft.budget.fract() != 0.0 {
        errors.push(ValidationError::new(
            "budget",
            "must be expressed in whole currency units",
        ));
    }

    match duration {
        Some(duration_years) if errors.is_empty() => Ok(PolicyConfig {
            name: name.to_string(),
            kind: draft.kind,
            strength_percent: draft.strength_percent,
            duration_years,
            budget: draft.budget,
        }),
        _ => Err(ValidationErrors::new(errors)),
    }
}
