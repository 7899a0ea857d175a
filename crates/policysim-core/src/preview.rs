//! Local preview estimator
//!
//! Gives instant feedback while a draft is being edited, before any round
//! trip to the engine. The estimate is a closed-form linear approximation:
//!
//! ```text
//! gap(i) = baseline - (strength / 100) * 0.3 * i      for i in 0..=duration
//! ```
//!
//! It is not the engine's model and is kept in its own type,
//! [`PreviewSeries`], so it can never stand in for a `SimulationResult`.

use serde::Serialize;

use crate::policy::{PolicyDraft, MAX_DURATION_YEARS, MIN_DURATION_YEARS};

/// Baseline pay gap, in percent, used when none is configured
pub const DEFAULT_BASELINE_GAP: f64 = 23.0;

/// Pay gap reduction per year at 100% strength, in percentage points
const REDUCTION_PER_YEAR: f64 = 0.3;

/// One preview point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PreviewPoint {
    /// Year index, 0 is the baseline
    pub year: u32,
    /// Estimated pay gap, in percent
    pub pay_gap: f64,
}

/// Approximate pay gap trajectory computed locally
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewSeries {
    baseline_gap: f64,
    points: Vec<PreviewPoint>,
}

impl PreviewSeries {
    /// Points in ascending year order
    pub fn points(&self) -> &[PreviewPoint] {
        &self.points
    }

    /// Pay gap values in year order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.pay_gap).collect()
    }

    /// Display labels (`Y0`, `Y1`, ...)
    pub fn labels(&self) -> Vec<String> {
        self.points.iter().map(|p| format!("Y{}", p.year)).collect()
    }

    /// Baseline the series was computed from
    pub fn baseline_gap(&self) -> f64 {
        self.baseline_gap
    }

    /// Number of points (duration + 1)
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Never true: a series has at least the baseline point
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Estimate with the default baseline gap
pub fn estimate(draft: &PolicyDraft) -> PreviewSeries {
    estimate_with_baseline(draft, DEFAULT_BASELINE_GAP)
}

/// Estimate the pay gap trajectory for a draft.
///
/// Never fails: strength is clamped to the kind's range, duration to the
/// accepted span, and a non-finite baseline falls back to the default.
pub fn estimate_with_baseline(draft: &PolicyDraft, baseline_gap: f64) -> PreviewSeries {
    let baseline_gap = if baseline_gap.is_finite() {
        baseline_gap
    } else {
        DEFAULT_BASELINE_GAP
    };

    let (min, max) = draft.kind.strength_range();
    let strength = if draft.strength_percent.is_finite() {
        draft.strength_percent.clamp(min, max)
    } else {
        min
    };

    let duration = draft.duration_years.clamp(
        i64::from(MIN_DURATION_YEARS),
        i64::from(MAX_DURATION_YEARS),
    ) as u32;

    let slope = (strength / 100.0) * REDUCTION_PER_YEAR;
    let points = (0..=duration)
        .map(|year| PreviewPoint {
            year,
            pay_gap: baseline_gap - slope * f64::from(year),
        })
        .collect();

    PreviewSeries {
        baseline_gap,
        points,
    }
}
