//! Result normalizer
//!
//! The single seam where untyped engine payloads become the canonical
//! [`SimulationResult`] and [`ComparisonResult`]. Required fields are
//! verified and reported by JSON path; recoverable oddities (out-of-order
//! years, leadership shares that do not add up, a risk level that does not
//! match its score) become [`NormalizationWarning`]s instead of failures.
//!
//! Both the engine's wire shape and the serialized canonical shape are
//! accepted, so `normalize(serialize(normalize(x)))` yields the same value.

mod fields;
mod timeline;

use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

use crate::error::NormalizationError;
use crate::model::{
    ComparativeAnalysis, ComparisonResult, FinalMetrics, MetricsComparison, RiskAssessment,
    RiskLevel, SimulationResult,
};
use crate::policy::{PolicyConfig, PolicyKind, MAX_DURATION_YEARS, MIN_BUDGET, MIN_DURATION_YEARS};
use fields::Object;

/// Allowed distance of `female + male` from 100
pub const LEADERSHIP_SUM_TOLERANCE: f64 = 0.5;

/// A normalized value together with the non-fatal issues found on the way
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    /// The canonical value
    pub value: T,
    /// Recoverable deviations, in the order they were found
    pub warnings: Vec<NormalizationWarning>,
}

impl<T> Normalized<T> {
    /// Drop the warnings
    pub fn into_value(self) -> T {
        self.value
    }

    /// Whether anything was recovered from
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Recoverable contract deviation.
///
/// Every variant carries the JSON `path` it refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizationWarning {
    /// Timeline years were out of order and have been sorted
    TimelineReordered {
        /// Timeline path
        path: String,
    },
    /// Repeated years were dropped, keeping the first occurrence
    DuplicateYears {
        /// Timeline path
        path: String,
        /// Years that appeared more than once
        years: Vec<u32>,
    },
    /// Timeline does not start at year 0
    MissingBaseline {
        /// Timeline path
        path: String,
    },
    /// Leadership shares do not add up to 100
    LeadershipSum {
        /// Path of the split
        path: String,
        /// `female + male`
        total: f64,
    },
    /// Risk level is implausible for its score
    RiskLevelMismatch {
        /// Risk object path
        path: String,
        /// Reported score
        score: f64,
        /// Reported level, kept as is
        level: RiskLevel,
    },
    /// The echoed policy has parameters outside the accepted ranges
    PolicyOutOfRange {
        /// Policy object path
        path: String,
        /// Canonical names of the offending parameters
        fields: Vec<&'static str>,
    },
    /// Timestamp could not be parsed and was dropped
    InvalidTimestamp {
        /// Timestamp path
        path: String,
        /// The raw value, as JSON
        value: String,
    },
    /// An optional field could not be read and was dropped
    IgnoredField {
        /// Field path
        path: String,
        /// What was expected there
        expected: &'static str,
    },
}

impl NormalizationWarning {
    /// JSON path the warning refers to
    pub fn path(&self) -> &str {
        match self {
            Self::TimelineReordered { path }
            | Self::DuplicateYears { path, .. }
            | Self::MissingBaseline { path }
            | Self::LeadershipSum { path, .. }
            | Self::RiskLevelMismatch { path, .. }
            | Self::PolicyOutOfRange { path, .. }
            | Self::InvalidTimestamp { path, .. }
            | Self::IgnoredField { path, .. } => path,
        }
    }
}

impl fmt::Display for NormalizationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimelineReordered { path } => {
                write!(f, "{path}: years were out of order and have been sorted")
            }
            Self::DuplicateYears { path, years } => {
                write!(f, "{path}: dropped repeated years {years:?}")
            }
            Self::MissingBaseline { path } => write!(f, "{path}: no baseline (year 0) reported"),
            Self::LeadershipSum { path, total } => {
                write!(f, "{path}: leadership shares add up to {total:.2}, not 100")
            }
            Self::RiskLevelMismatch { path, score, level } => {
                write!(f, "{path}: risk level {level} is implausible for score {score:.1}")
            }
            Self::PolicyOutOfRange { path, fields } => {
                write!(f, "{path}: echoed policy out of range ({})", fields.join(", "))
            }
            Self::InvalidTimestamp { path, value } => {
                write!(f, "{path}: unreadable timestamp {value:?} ignored")
            }
            Self::IgnoredField { path, expected } => {
                write!(f, "{path}: ignored, expected {expected}")
            }
        }
    }
}

/// Normalize a raw simulation response
pub fn normalize(raw: &Value) -> Result<Normalized<SimulationResult>, NormalizationError> {
    let mut warnings = Vec::new();
    let body = unwrap_envelope(raw)?;
    let obj = fields::object(body, "")?;
    let value = simulation(obj, "", &mut warnings)?;
    log_warnings(&warnings);
    Ok(Normalized { value, warnings })
}

/// Normalize a raw joint comparison response
pub fn normalize_comparison(
    raw: &Value,
) -> Result<Normalized<ComparisonResult>, NormalizationError> {
    let mut warnings = Vec::new();
    let body = unwrap_envelope(raw)?;
    let obj = fields::object(body, "")?;

    let (a, a_path) = fields::required(obj, "", &["policy_a", "a"])?;
    let a = simulation(fields::object(a, &a_path)?, &a_path, &mut warnings)?;
    let (b, b_path) = fields::required(obj, "", &["policy_b", "b"])?;
    let b = simulation(fields::object(b, &b_path)?, &b_path, &mut warnings)?;

    let (analysis, analysis_path) = fields::required(obj, "", &["analysis"])?;
    let analysis = comparative_analysis(
        fields::object(analysis, &analysis_path)?,
        &analysis_path,
        &mut warnings,
    )?;

    // The engine sends the explanation beside `data`, canonical output inside it.
    let explanation = match raw.get("explanation").filter(|v| !v.is_null()) {
        Some(text) => supplementary(fields::string(text, "explanation"), &mut warnings),
        None => fields::lookup(obj, "", &["explanation"])
            .and_then(|(text, path)| supplementary(fields::string(text, &path), &mut warnings)),
    }
    .map(str::to_string);

    log_warnings(&warnings);
    Ok(Normalized {
        value: ComparisonResult::new(a, b, analysis, explanation),
        warnings,
    })
}

fn log_warnings(warnings: &[NormalizationWarning]) {
    for warning in warnings {
        tracing::warn!("Normalization warning: {}", warning);
    }
}

/// Strip the `{success, data}` envelope, surfacing `{error}` bodies.
fn unwrap_envelope(raw: &Value) -> Result<&Value, NormalizationError> {
    let Some(obj) = raw.as_object() else {
        return Ok(raw);
    };

    if let Some(error) = obj.get("error").filter(|v| !v.is_null()) {
        let message = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(NormalizationError::EngineError(message));
    }
    if obj.get("success") == Some(&Value::Bool(false)) {
        return Err(NormalizationError::EngineError(
            "engine reported an unsuccessful simulation".to_string(),
        ));
    }

    Ok(match obj.get("data") {
        Some(data) if data.is_object() => data,
        _ => raw,
    })
}

fn simulation(
    obj: &Object,
    path: &str,
    warnings: &mut Vec<NormalizationWarning>,
) -> Result<SimulationResult, NormalizationError> {
    let (policy_value, policy_path) = fields::required(obj, path, &["policy"])?;
    let policy = policy(fields::object(policy_value, &policy_path)?, &policy_path, warnings)?;

    let (timeline_value, timeline_path) = fields::required(obj, path, &["timeline"])?;
    let timeline = timeline::parse(timeline_value, &timeline_path, warnings)?;
    for (i, point) in timeline.points().iter().enumerate() {
        if let Some(split) = point.leadership {
            let at = format!("{}.leadership", fields::index(&timeline_path, i));
            check_leadership(split.total(), &at, warnings);
        }
    }

    let (metrics_value, metrics_path) = fields::required(obj, path, &["final_metrics"])?;
    let final_metrics = final_metrics(
        fields::object(metrics_value, &metrics_path)?,
        &metrics_path,
        warnings,
    )?;

    let (risk_value, risk_path) = fields::required(obj, path, &["risk"])?;
    let risk = risk(fields::object(risk_value, &risk_path)?, &risk_path, warnings)?;

    let computed_at = match fields::lookup(obj, path, &["timestamp", "computed_at"]) {
        Some((value, ts_path)) => timestamp(value, &ts_path, warnings),
        None => None,
    };

    Ok(SimulationResult::new(
        policy,
        timeline,
        final_metrics,
        risk,
        computed_at,
    ))
}

fn policy(
    obj: &Object,
    path: &str,
    warnings: &mut Vec<NormalizationWarning>,
) -> Result<PolicyConfig, NormalizationError> {
    let (name, name_path) = fields::required(obj, path, &["name", "policy_name"])?;
    let name = fields::string(name, &name_path)?.to_string();

    let (kind, kind_path) = fields::required(obj, path, &["type", "policy_type"])?;
    let kind: PolicyKind = fields::string(kind, &kind_path)?
        .parse()
        .map_err(|e: crate::policy::UnknownPolicyKind| NormalizationError::InvalidValue {
            path: kind_path.clone(),
            reason: e.to_string(),
        })?;

    let strength = fields::required_number(obj, path, &["percentage", "strength_percent"])?;
    let (duration, duration_path) = fields::required(obj, path, &["duration", "duration_years"])?;
    let duration = fields::whole_number(duration, &duration_path)?;
    let budget = fields::required_number(obj, path, &["budget"])?;

    let (min, max) = kind.strength_range();
    let mut out_of_range = Vec::new();
    if strength < min || strength > max {
        out_of_range.push("strength_percent");
    }
    if !(MIN_DURATION_YEARS..=MAX_DURATION_YEARS).contains(&duration) {
        out_of_range.push("duration_years");
    }
    if budget < MIN_BUDGET {
        out_of_range.push("budget");
    }
    if !out_of_range.is_empty() {
        warnings.push(NormalizationWarning::PolicyOutOfRange {
            path: path.to_string(),
            fields: out_of_range,
        });
    }

    Ok(PolicyConfig::from_engine(name, kind, strength, duration, budget))
}

fn final_metrics(
    obj: &Object,
    path: &str,
    warnings: &mut Vec<NormalizationWarning>,
) -> Result<FinalMetrics, NormalizationError> {
    let (leadership, leadership_path) = fields::required(obj, path, &["final_leadership"])?;
    let final_leadership = timeline::leadership(leadership, &leadership_path)?;
    check_leadership(final_leadership.total(), &leadership_path, warnings);

    Ok(FinalMetrics {
        pay_gap_reduction_percent: fields::required_number(
            obj,
            path,
            &["pay_gap_reduction", "pay_gap_reduction_percent"],
        )?,
        employment_improvement_percent: fields::required_number(
            obj,
            path,
            &["employment_improvement", "employment_improvement_percent"],
        )?,
        final_employment_ratio: fields::required_number(obj, path, &["final_employment_ratio"])?,
        final_leadership,
        total_budget_spent: fields::required_number(obj, path, &["total_budget_spent"])?,
        final_pay_gap_percent: optional_number(
            obj,
            path,
            &["final_pay_gap", "final_pay_gap_percent"],
            warnings,
        ),
    })
}

fn risk(
    obj: &Object,
    path: &str,
    warnings: &mut Vec<NormalizationWarning>,
) -> Result<RiskAssessment, NormalizationError> {
    let (score, score_path) = fields::required(obj, path, &["score"])?;
    let score = fields::number(score, &score_path)?;
    if !(0.0..=100.0).contains(&score) {
        return Err(NormalizationError::InvalidValue {
            path: score_path,
            reason: format!("risk score {score} is outside 0..=100"),
        });
    }

    let (level, level_path) = fields::required(obj, path, &["level"])?;
    let level_str = fields::string(level, &level_path)?;
    let level = RiskLevel::parse(level_str).ok_or_else(|| NormalizationError::InvalidValue {
        path: level_path,
        reason: format!("unknown risk level {level_str:?}"),
    })?;

    let assessment = RiskAssessment { score, level };
    if !assessment.is_consistent() {
        warnings.push(NormalizationWarning::RiskLevelMismatch {
            path: path.to_string(),
            score,
            level,
        });
    }
    Ok(assessment)
}

fn comparative_analysis(
    obj: &Object,
    path: &str,
    warnings: &mut Vec<NormalizationWarning>,
) -> Result<ComparativeAnalysis, NormalizationError> {
    let (list, list_path) = fields::required(obj, path, &["recommendations"])?;
    let recommendations = fields::array(list, &list_path)?
        .iter()
        .enumerate()
        .map(|(i, item)| fields::string(item, &fields::index(&list_path, i)).map(str::to_string))
        .collect::<Result<Vec<_>, _>>()?;

    let (overall, overall_path) = fields::required(obj, path, &["overall_recommendation"])?;
    let overall_recommendation = fields::string(overall, &overall_path)?.to_string();

    let (metrics, metrics_path) = fields::required(obj, path, &["metrics_comparison"])?;
    let metrics = fields::object(metrics, &metrics_path)?;
    let metrics_comparison = MetricsComparison {
        pay_gap_reduction_diff: fields::required_number(
            metrics,
            &metrics_path,
            &["pay_gap_reduction_diff"],
        )?,
        budget_diff: fields::required_number(metrics, &metrics_path, &["budget_diff"])?,
        risk_diff: fields::required_number(metrics, &metrics_path, &["risk_diff"])?,
        employment_diff: optional_number(metrics, &metrics_path, &["employment_diff"], warnings),
    };

    Ok(ComparativeAnalysis {
        recommendations,
        overall_recommendation,
        metrics_comparison,
    })
}

/// A malformed optional field is dropped with a warning rather than failing.
fn supplementary<T>(
    parsed: Result<T, NormalizationError>,
    warnings: &mut Vec<NormalizationWarning>,
) -> Option<T> {
    match parsed {
        Ok(value) => Some(value),
        Err(NormalizationError::InvalidType { path, expected }) => {
            warnings.push(NormalizationWarning::IgnoredField { path, expected });
            None
        }
        Err(other) => {
            warnings.push(NormalizationWarning::IgnoredField {
                path: other.path().unwrap_or_default().to_string(),
                expected: "a readable value",
            });
            None
        }
    }
}

fn optional_number(
    obj: &Object,
    parent: &str,
    keys: &[&str],
    warnings: &mut Vec<NormalizationWarning>,
) -> Option<f64> {
    let (value, path) = fields::lookup(obj, parent, keys)?;
    supplementary(fields::number(value, &path), warnings)
}

fn check_leadership(total: f64, path: &str, warnings: &mut Vec<NormalizationWarning>) {
    if (total - 100.0).abs() > LEADERSHIP_SUM_TOLERANCE {
        warnings.push(NormalizationWarning::LeadershipSum {
            path: path.to_string(),
            total,
        });
    }
}

fn timestamp(
    value: &Value,
    path: &str,
    warnings: &mut Vec<NormalizationWarning>,
) -> Option<NaiveDateTime> {
    let parsed = value.as_str().and_then(|s| {
        s.parse::<NaiveDateTime>()
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc()))
    });
    if parsed.is_none() {
        warnings.push(NormalizationWarning::InvalidTimestamp {
            path: path.to_string(),
            value: value.to_string(),
        });
    }
    parsed
}
