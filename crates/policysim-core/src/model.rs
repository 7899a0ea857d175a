//! Canonical result model
//!
//! These types are what every rendering surface consumes. They are produced
//! only by the normalizer from engine responses; the serialized form of each
//! type is itself accepted by the normalizer.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::policy::PolicyConfig;

/// Leadership positions split by gender, in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeadershipSplit {
    /// Share held by women
    pub female: f64,
    /// Share held by men
    pub male: f64,
}

impl LeadershipSplit {
    /// Sum of both shares, expected to be about 100
    pub fn total(&self) -> f64 {
        self.female + self.male
    }
}

/// One simulated year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePoint {
    /// Year index, 0 is the baseline
    pub year: u32,

    /// Pay gap, in percent
    pub pay_gap: f64,

    /// Employment ratio (women / men)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_ratio: Option<f64>,

    /// Leadership split at the end of the year
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leadership: Option<LeadershipSplit>,

    /// Cumulative budget spent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_spent: Option<f64>,
}

impl TimelinePoint {
    /// Point carrying only the pay gap
    pub fn new(year: u32, pay_gap: f64) -> Self {
        Self {
            year,
            pay_gap,
            employment_ratio: None,
            leadership: None,
            budget_spent: None,
        }
    }
}

/// Year-ordered simulated trajectory, strictly increasing in `year`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Timeline(Vec<TimelinePoint>);

impl Timeline {
    /// Callers guarantee strictly increasing years.
    pub(crate) fn from_sorted(points: Vec<TimelinePoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].year < w[1].year));
        Self(points)
    }

    /// Points in ascending year order
    pub fn points(&self) -> &[TimelinePoint] {
        &self.0
    }

    /// Year indices
    pub fn years(&self) -> Vec<u32> {
        self.0.iter().map(|p| p.year).collect()
    }

    /// Pay gap values in year order
    pub fn pay_gaps(&self) -> Vec<f64> {
        self.0.iter().map(|p| p.pay_gap).collect()
    }

    /// Baseline point, if the engine reported year 0
    pub fn baseline(&self) -> Option<&TimelinePoint> {
        self.0.first().filter(|p| p.year == 0)
    }

    /// Last simulated year
    pub fn last(&self) -> Option<&TimelinePoint> {
        self.0.last()
    }

    /// Number of reported years
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a normalized timeline
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// End-of-horizon metrics reported by the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalMetrics {
    /// Pay gap reduction, in percentage points
    #[serde(rename = "pay_gap_reduction")]
    pub pay_gap_reduction_percent: f64,

    /// Employment improvement, in percent
    #[serde(rename = "employment_improvement")]
    pub employment_improvement_percent: f64,

    /// Employment ratio in the last year
    pub final_employment_ratio: f64,

    /// Leadership split in the last year
    pub final_leadership: LeadershipSplit,

    /// Total budget spent over the horizon
    pub total_budget_spent: f64,

    /// Pay gap in the last year
    #[serde(rename = "final_pay_gap", skip_serializing_if = "Option::is_none")]
    pub final_pay_gap_percent: Option<f64>,
}

/// Engine-assigned risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// `low`
    Low,
    /// `medium`
    Medium,
    /// `high`
    High,
}

impl RiskLevel {
    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Score range this level is plausible for.
    ///
    /// Nominal bands are `< 34`, `34..=66` and `> 66`, widened by
    /// [`RISK_BAND_SLACK`] on each inner edge since engines place their own
    /// thresholds near those points.
    pub fn plausible_scores(self) -> (f64, f64) {
        match self {
            Self::Low => (0.0, 34.0 + RISK_BAND_SLACK),
            Self::Medium => (34.0 - RISK_BAND_SLACK, 66.0 + RISK_BAND_SLACK),
            Self::High => (66.0 - RISK_BAND_SLACK, 100.0),
        }
    }
}

/// Widening applied to the nominal risk bands
pub const RISK_BAND_SLACK: f64 = 8.0;

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk score and level
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskAssessment {
    /// Score in `[0, 100]`
    pub score: f64,
    /// Level as classified by the engine
    pub level: RiskLevel,
}

impl RiskAssessment {
    /// Whether the engine's level is plausible for its score
    pub fn is_consistent(&self) -> bool {
        let (lo, hi) = self.level.plausible_scores();
        self.score >= lo && self.score <= hi
    }
}

/// Normalized outcome of one simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    policy: PolicyConfig,
    timeline: Timeline,
    final_metrics: FinalMetrics,
    risk: RiskAssessment,
    #[serde(rename = "timestamp", skip_serializing_if = "Option::is_none")]
    computed_at: Option<NaiveDateTime>,
}

impl SimulationResult {
    pub(crate) fn new(
        policy: PolicyConfig,
        timeline: Timeline,
        final_metrics: FinalMetrics,
        risk: RiskAssessment,
        computed_at: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            policy,
            timeline,
            final_metrics,
            risk,
            computed_at,
        }
    }

    /// Policy as echoed by the engine
    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Per-year values, sorted by year
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// End-of-horizon metrics
    pub fn final_metrics(&self) -> &FinalMetrics {
        &self.final_metrics
    }

    /// Risk assessment
    pub fn risk(&self) -> &RiskAssessment {
        &self.risk
    }

    /// Engine-side computation time, when reported
    pub fn computed_at(&self) -> Option<NaiveDateTime> {
        self.computed_at
    }
}

/// Engine-provided metric differences, echoed verbatim
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsComparison {
    /// Pay gap reduction difference, in percentage points
    pub pay_gap_reduction_diff: f64,
    /// Budget difference
    pub budget_diff: f64,
    /// Risk score difference
    pub risk_diff: f64,
    /// Employment improvement difference, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_diff: Option<f64>,
}

/// Engine-provided comparison analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparativeAnalysis {
    /// Recommendation sentences, in engine order
    pub recommendations: Vec<String>,
    /// Name of the recommended side
    pub overall_recommendation: String,
    /// Metric differences
    pub metrics_comparison: MetricsComparison,
}

/// Locally derived differences, always `a - b`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DirectionalDiff {
    /// Pay gap reduction, in percentage points
    pub pay_gap_reduction: f64,
    /// Employment improvement, in percent
    pub employment_improvement: f64,
    /// Total budget spent
    pub budget: f64,
    /// Risk score
    pub risk: f64,
}

/// Normalized outcome of a joint comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    #[serde(rename = "policy_a")]
    a: SimulationResult,
    #[serde(rename = "policy_b")]
    b: SimulationResult,
    analysis: ComparativeAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
}

impl ComparisonResult {
    pub(crate) fn new(
        a: SimulationResult,
        b: SimulationResult,
        analysis: ComparativeAnalysis,
        explanation: Option<String>,
    ) -> Self {
        Self {
            a,
            b,
            analysis,
            explanation,
        }
    }

    /// Result for policy A
    pub fn a(&self) -> &SimulationResult {
        &self.a
    }

    /// Result for policy B
    pub fn b(&self) -> &SimulationResult {
        &self.b
    }

    /// Engine analysis, echoed verbatim
    pub fn analysis(&self) -> &ComparativeAnalysis {
        &self.analysis
    }

    /// Explanation text sent along with the comparison, if any
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Differences computed from both sides' final metrics, as `a - b`
    pub fn directional_diff(&self) -> DirectionalDiff {
        let (a, b) = (&self.a.final_metrics, &self.b.final_metrics);
        DirectionalDiff {
            pay_gap_reduction: a.pay_gap_reduction_percent - b.pay_gap_reduction_percent,
            employment_improvement: a.employment_improvement_percent
                - b.employment_improvement_percent,
            budget: a.total_budget_spent - b.total_budget_spent,
            risk: self.a.risk.score - self.b.risk.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_consistency_bands() {
        let check = |score, level| RiskAssessment { score, level }.is_consistent();

        assert!(check(12.0, RiskLevel::Low));
        assert!(check(50.0, RiskLevel::Medium));
        assert!(check(90.0, RiskLevel::High));

        // Engine thresholds near the nominal edges are tolerated
        assert!(check(30.0, RiskLevel::Medium));
        assert!(check(60.0, RiskLevel::High));

        assert!(!check(5.0, RiskLevel::High));
        assert!(!check(95.0, RiskLevel::Low));
        assert!(!check(10.0, RiskLevel::Medium));
    }

    #[test]
    fn test_risk_level_parse() {
        assert_eq!(RiskLevel::parse("Medium"), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::parse("severe"), None);
    }

    #[test]
    fn test_timeline_accessors() {
        let timeline = Timeline::from_sorted(vec![
            TimelinePoint::new(0, 23.0),
            TimelinePoint::new(1, 21.5),
        ]);
        assert_eq!(timeline.years(), vec![0, 1]);
        assert_eq!(timeline.pay_gaps(), vec![23.0, 21.5]);
        assert_eq!(timeline.baseline().map(|p| p.pay_gap), Some(23.0));
        assert_eq!(timeline.last().map(|p| p.year), Some(1));
    }

    #[test]
    fn test_point_omits_absent_companions() {
        let json = serde_json::to_value(TimelinePoint::new(3, 18.0)).unwrap();
        assert_eq!(json, serde_json::json!({"year": 3, "pay_gap": 18.0}));
    }
}
