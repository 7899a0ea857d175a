//! Generic chart series
//!
//! Rendering surfaces (terminal tables, web charts) consume one format:
//! a labelled list of `(x, y)` points. Previews and engine results are
//! converted here so no surface needs to know either model.

use serde::Serialize;

use crate::model::{ComparisonResult, Timeline};
use crate::preview::PreviewSeries;

/// One chart point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Year index
    pub x: f64,
    /// Metric value
    pub y: f64,
}

/// A labelled series of points, ordered by `x`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    /// Legend label
    pub label: String,
    /// Points, ordered by `x`
    pub points: Vec<SeriesPoint>,
}

/// Timeline metric that can be charted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineMetric {
    /// Pay gap, in percent
    PayGap,
    /// Employment ratio
    EmploymentRatio,
    /// Share of women in leadership
    FemaleLeadership,
    /// Cumulative budget spent
    BudgetSpent,
}

impl TimelineMetric {
    /// Every metric, in display order
    pub const ALL: [TimelineMetric; 4] = [
        TimelineMetric::PayGap,
        TimelineMetric::EmploymentRatio,
        TimelineMetric::FemaleLeadership,
        TimelineMetric::BudgetSpent,
    ];

    /// Axis label
    pub fn label(self) -> &'static str {
        match self {
            Self::PayGap => "Pay gap (%)",
            Self::EmploymentRatio => "Employment ratio",
            Self::FemaleLeadership => "Women in leadership (%)",
            Self::BudgetSpent => "Budget spent",
        }
    }
}

impl ChartSeries {
    /// Series with the given label and points
    pub fn new(label: impl Into<String>, points: Vec<SeriesPoint>) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }

    /// Preview pay gap trajectory
    pub fn from_preview(preview: &PreviewSeries) -> Self {
        let points = preview
            .points()
            .iter()
            .map(|p| SeriesPoint {
                x: f64::from(p.year),
                y: p.pay_gap,
            })
            .collect();
        Self::new("Preview pay gap (%)", points)
    }

    /// One metric of an engine timeline.
    ///
    /// Years for which the engine did not report the metric are skipped.
    pub fn from_timeline(timeline: &Timeline, metric: TimelineMetric) -> Self {
        let points = timeline
            .points()
            .iter()
            .filter_map(|p| {
                let y = match metric {
                    TimelineMetric::PayGap => Some(p.pay_gap),
                    TimelineMetric::EmploymentRatio => p.employment_ratio,
                    TimelineMetric::FemaleLeadership => p.leadership.map(|l| l.female),
                    TimelineMetric::BudgetSpent => p.budget_spent,
                }?;
                Some(SeriesPoint {
                    x: f64::from(p.year),
                    y,
                })
            })
            .collect();
        Self::new(metric.label(), points)
    }

    /// Side-by-side series for both policies of a comparison, labelled by
    /// policy name.
    pub fn comparison_pair(result: &ComparisonResult, metric: TimelineMetric) -> [ChartSeries; 2] {
        [result.a(), result.b()].map(|side| {
            let mut series = Self::from_timeline(side.timeline(), metric);
            series.label = format!("{} - {}", side.policy().name(), metric.label());
            series
        })
    }

    /// X values
    pub fn xs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    /// Y values
    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    /// Whether there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
