//! Terminal rendering

use colored::Colorize;
use policysim_core::policy::{Advisory, PolicyConfig};
use policysim_core::{
    ChartSeries, ComparisonResult, NormalizationWarning, PolicyDraft, PolicySimError,
    PreviewSeries, Result, RiskLevel, SimulationResult, SubmitError, TimelineMetric,
    ValidationErrors,
};
use serde::Serialize;

/// `simulate --json` output
#[derive(Serialize)]
pub struct SimulationOutput<'a> {
    pub result: &'a SimulationResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<&'a str>,
}

/// `compare --json` output
#[derive(Serialize)]
pub struct ComparisonOutput<'a> {
    pub result: &'a ComparisonResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Settle a simulation run for display.
///
/// A stale outcome yields `Ok(None)` and prints nothing; any other failure
/// becomes the one-line message shown to the user.
pub fn settle(outcome: Result<SimulationResult>) -> anyhow::Result<Option<SimulationResult>> {
    match outcome {
        Ok(result) => Ok(Some(result)),
        Err(err) => match err.user_message() {
            None => {
                tracing::debug!("Dropped superseded simulation: {}", err);
                Ok(None)
            }
            Some(message) => {
                if let PolicySimError::Submit(SubmitError::Invalid(errors)) = &err {
                    print_validation_errors(errors);
                    anyhow::bail!("Policy is invalid, nothing was sent");
                }
                Err(anyhow::anyhow!(message))
            }
        },
    }
}

pub fn print_valid(policy: &PolicyConfig) {
    println!("{} {} is valid", "✓".green(), policy.name().bold());
    print_policy(policy);
}

pub fn print_validation_errors(errors: &ValidationErrors) {
    for error in errors.errors() {
        println!("{} {}: {}", "✗".red(), error.field.bold(), error.reason);
    }
}

fn print_policy(policy: &PolicyConfig) {
    println!("  Type      {}", policy.info().name);
    println!("  Strength  {}%", policy.strength_percent());
    println!("  Duration  {} years", policy.duration_years());
    println!("  Budget    {}", money(policy.budget()));
}

pub fn print_preview(draft: &PolicyDraft, series: &PreviewSeries) {
    println!(
        "{} {} (estimate, not a simulation)",
        "Preview".bold(),
        draft.name
    );
    for (label, value) in series.labels().iter().zip(series.values()) {
        println!("  {:<4} {:>6.2}%", label, value);
    }
}

pub fn print_advisories(policy: &PolicyConfig, advisories: &[Advisory]) {
    if advisories.is_empty() {
        println!("{} No concerns for {}", "✓".green(), policy.name());
        return;
    }
    for advisory in advisories {
        println!("{} {}", "!".yellow(), advisory.message());
    }
}

pub fn print_result(result: &SimulationResult) {
    let policy = result.policy();
    println!("{}", policy.name().bold());
    print_policy(policy);

    println!();
    println!("{}", "Timeline".bold());
    println!("  {:<4} {:>8} {:>11} {:>12}", "Year", "Pay gap", "Employment", "Leadership");
    for point in result.timeline().points() {
        let employment = point
            .employment_ratio
            .map(|r| format!("{r:.3}"))
            .unwrap_or_else(|| "-".to_string());
        let leadership = point
            .leadership
            .map(|l| format!("{:.1}%", l.female))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  Y{:<3} {:>7.2}% {:>11} {:>12}",
            point.year, point.pay_gap, employment, leadership
        );
    }

    let metrics = result.final_metrics();
    println!();
    println!("{}", "Final metrics".bold());
    println!(
        "  Pay gap reduction       {:.1} pts",
        metrics.pay_gap_reduction_percent
    );
    println!(
        "  Employment improvement  {:.1}%",
        metrics.employment_improvement_percent
    );
    println!(
        "  Women in leadership     {:.1}%",
        metrics.final_leadership.female
    );
    println!("  Budget spent            {}", money(metrics.total_budget_spent));
    println!(
        "  Risk                    {:.0} ({})",
        result.risk().score,
        risk_label(result.risk().level)
    );
}

pub fn print_warnings(warnings: &[NormalizationWarning]) {
    for warning in warnings {
        println!("{} {}", "warning:".yellow(), warning);
    }
}

pub fn print_explanation(text: &str) {
    println!();
    println!("{}", "Explanation".bold());
    println!("{}", text.replace("**", ""));
}

pub fn print_comparison(result: &ComparisonResult) {
    let (a, b) = (result.a(), result.b());
    let analysis = result.analysis();
    let diff = result.directional_diff();

    println!(
        "{} {} vs {}",
        "Comparison".bold(),
        a.policy().name(),
        b.policy().name()
    );
    println!("  {:<24} {:>14} {:>14} {:>12}", "", "A", "B", "A - B");
    row(
        "Pay gap reduction (pts)",
        a.final_metrics().pay_gap_reduction_percent,
        b.final_metrics().pay_gap_reduction_percent,
        diff.pay_gap_reduction,
    );
    row(
        "Employment (%)",
        a.final_metrics().employment_improvement_percent,
        b.final_metrics().employment_improvement_percent,
        diff.employment_improvement,
    );
    row(
        "Budget spent",
        a.final_metrics().total_budget_spent,
        b.final_metrics().total_budget_spent,
        diff.budget,
    );
    row("Risk score", a.risk().score, b.risk().score, diff.risk);

    println!();
    println!("{}", "Pay gap by year".bold());
    let [gap_a, gap_b] = ChartSeries::comparison_pair(result, TimelineMetric::PayGap);
    for (pa, pb) in gap_a.points.iter().zip(&gap_b.points) {
        println!("  Y{:<3} {:>7.2}% {:>7.2}%", pa.x, pa.y, pb.y);
    }

    println!();
    println!(
        "{} {}",
        "Recommended:".bold(),
        analysis.overall_recommendation.green()
    );
    for recommendation in &analysis.recommendations {
        println!("  - {}", recommendation);
    }
    if let Some(text) = result.explanation() {
        print_explanation(text);
    }
}

fn row(label: &str, a: f64, b: f64, diff: f64) {
    println!("  {:<24} {:>14.1} {:>14.1} {:>+12.1}", label, a, b, diff);
}

fn risk_label(level: RiskLevel) -> colored::ColoredString {
    match level {
        RiskLevel::Low => level.as_str().green(),
        RiskLevel::Medium => level.as_str().yellow(),
        RiskLevel::High => level.as_str().red(),
    }
}

/// `$1,234,567`
pub fn money(amount: f64) -> String {
    let whole = format!("{:.0}", amount.abs());
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_run_settles_silently() {
        let stale: PolicySimError = policysim_core::StaleResponseError {
            token: policysim_core::RequestToken::from_raw(1),
            current: None,
        }
        .into();
        assert!(settle(Err(stale)).unwrap().is_none());
    }

    #[test]
    fn test_failed_run_settles_to_user_message() {
        let err: PolicySimError = policysim_core::TransportError::Request("refused".into()).into();
        let err = settle(Err(err)).unwrap_err();
        assert_eq!(err.to_string(), "Could not reach the simulation engine");
    }

    #[test]
    fn test_money() {
        assert_eq!(money(2_000_000.0), "$2,000,000");
        assert_eq!(money(999.0), "$999");
        assert_eq!(money(100_000.0), "$100,000");
        assert_eq!(money(-1_500.0), "-$1,500");
    }
}
