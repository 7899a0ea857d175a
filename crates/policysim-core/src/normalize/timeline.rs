//! Timeline parsing.
//!
//! The engine reports the timeline column-wise (`years`, `pay_gap`, and
//! optional companion columns of the same length). A serialized [`Timeline`]
//! is row-wise. Both are accepted.

use serde_json::Value;

use super::fields::{self, Object};
use super::{optional_number, supplementary, NormalizationWarning};
use crate::error::NormalizationError;
use crate::model::{LeadershipSplit, Timeline, TimelinePoint};

pub(super) fn parse(
    value: &Value,
    path: &str,
    warnings: &mut Vec<NormalizationWarning>,
) -> Result<Timeline, NormalizationError> {
    let points = match value {
        Value::Array(rows) => parse_rows(rows, path, warnings)?,
        Value::Object(columns) => parse_columns(columns, path, warnings)?,
        _ => {
            return Err(NormalizationError::InvalidType {
                path: path.to_string(),
                expected: "object or array",
            })
        }
    };

    if points.is_empty() {
        return Err(NormalizationError::InvalidValue {
            path: path.to_string(),
            reason: "must contain at least one year".to_string(),
        });
    }

    Ok(order(points, path, warnings))
}

fn parse_rows(
    rows: &[Value],
    path: &str,
    warnings: &mut Vec<NormalizationWarning>,
) -> Result<Vec<TimelinePoint>, NormalizationError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let row_path = fields::index(path, i);
            let obj = fields::object(row, &row_path)?;
            let (year, year_path) = fields::required(obj, &row_path, &["year", "year_index"])?;
            let leadership = fields::lookup(obj, &row_path, &["leadership"])
                .and_then(|(value, path)| supplementary(leadership(value, &path), warnings));
            Ok(TimelinePoint {
                year: fields::whole_number(year, &year_path)?,
                pay_gap: fields::required_number(obj, &row_path, &["pay_gap", "pay_gap_percent"])?,
                employment_ratio: optional_number(obj, &row_path, &["employment_ratio"], warnings),
                leadership,
                budget_spent: optional_number(obj, &row_path, &["budget_spent"], warnings),
            })
        })
        .collect()
}

/// Companion cells of the wrong type are dropped with a warning; a companion
/// column of the wrong length fails.
fn parse_columns(
    columns: &Object,
    path: &str,
    warnings: &mut Vec<NormalizationWarning>,
) -> Result<Vec<TimelinePoint>, NormalizationError> {
    let (years, years_path) = fields::required(columns, path, &["years"])?;
    let years = fields::array(years, &years_path)?;
    let (gaps, gaps_path) = fields::required(columns, path, &["pay_gap"])?;
    let gaps = fields::array(gaps, &gaps_path)?;
    let expected = years.len();
    check_len(gaps.len(), expected, &gaps_path)?;

    let employment = companion(columns, path, "employment_ratio", expected)?;
    let leadership_col = companion(columns, path, "leadership", expected)?;
    let budget = companion(columns, path, "budget_spent", expected)?;

    (0..expected)
        .map(|i| {
            let cell = |col: &Option<(&[Value], String)>| -> Option<(Value, String)> {
                col.as_ref()
                    .map(|(values, col_path)| (values[i].clone(), fields::index(col_path, i)))
            };
            let employment_ratio = cell(&employment)
                .and_then(|(v, p)| supplementary(fields::number(&v, &p), warnings));
            let leadership = cell(&leadership_col)
                .and_then(|(v, p)| supplementary(leadership(&v, &p), warnings));
            let budget_spent = cell(&budget)
                .and_then(|(v, p)| supplementary(fields::number(&v, &p), warnings));
            Ok(TimelinePoint {
                year: fields::whole_number(&years[i], &fields::index(&years_path, i))?,
                pay_gap: fields::number(&gaps[i], &fields::index(&gaps_path, i))?,
                employment_ratio,
                leadership,
                budget_spent,
            })
        })
        .collect()
}

fn companion<'a>(
    columns: &'a Object,
    path: &str,
    key: &str,
    expected: usize,
) -> Result<Option<(&'a [Value], String)>, NormalizationError> {
    let Some((value, col_path)) = fields::lookup(columns, path, &[key]) else {
        return Ok(None);
    };
    let values = fields::array(value, &col_path)?;
    check_len(values.len(), expected, &col_path)?;
    Ok(Some((values, col_path)))
}

fn check_len(actual: usize, expected: usize, path: &str) -> Result<(), NormalizationError> {
    if actual != expected {
        return Err(NormalizationError::InvalidValue {
            path: path.to_string(),
            reason: format!("has {actual} entries, expected {expected} (one per year)"),
        });
    }
    Ok(())
}

pub(super) fn leadership(value: &Value, path: &str) -> Result<LeadershipSplit, NormalizationError> {
    let obj = fields::object(value, path)?;
    Ok(LeadershipSplit {
        female: fields::required_number(obj, path, &["female"])?,
        male: fields::required_number(obj, path, &["male"])?,
    })
}

/// Sort by year and drop repeated years, keeping the first occurrence.
fn order(
    mut points: Vec<TimelinePoint>,
    path: &str,
    warnings: &mut Vec<NormalizationWarning>,
) -> Timeline {
    if !points.windows(2).all(|w| w[0].year < w[1].year) {
        if !points.windows(2).all(|w| w[0].year <= w[1].year) {
            warnings.push(NormalizationWarning::TimelineReordered {
                path: path.to_string(),
            });
        }
        // Stable sort keeps the engine's first entry for each year in front.
        points.sort_by_key(|p| p.year);

        let mut duplicates = Vec::new();
        points.dedup_by(|later, earlier| {
            let dup = later.year == earlier.year;
            if dup {
                duplicates.push(later.year);
            }
            dup
        });
        if !duplicates.is_empty() {
            duplicates.dedup();
            warnings.push(NormalizationWarning::DuplicateYears {
                path: path.to_string(),
                years: duplicates,
            });
        }
    }

    if points.first().map(|p| p.year) != Some(0) {
        warnings.push(NormalizationWarning::MissingBaseline {
            path: path.to_string(),
        });
    }

    Timeline::from_sorted(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_ok(value: Value) -> (Timeline, Vec<NormalizationWarning>) {
        let mut warnings = Vec::new();
        let timeline = parse(&value, "timeline", &mut warnings).unwrap();
        (timeline, warnings)
    }

    #[test]
    fn test_columnar_with_companions() {
        let (timeline, warnings) = parse_ok(json!({
            "years": [0, 1, 2],
            "pay_gap": [23.0, 20.1, "17.9"],
            "employment_ratio": [0.82, 0.84, 0.87],
            "leadership": [
                {"female": 30.0, "male": 70.0},
                {"female": 33.5, "male": 66.5},
                {"female": 37.0, "male": 63.0}
            ],
            "budget_spent": [0.0, 520000.0, 1040000.0],
            "duration": 2
        }));
        assert!(warnings.is_empty());
        assert_eq!(timeline.years(), vec![0, 1, 2]);
        assert_eq!(timeline.pay_gaps(), vec![23.0, 20.1, 17.9]);
        let last = timeline.last().unwrap();
        assert_eq!(last.employment_ratio, Some(0.87));
        assert_eq!(last.leadership.map(|l| l.female), Some(37.0));
        assert_eq!(last.budget_spent, Some(1_040_000.0));
    }

    #[test]
    fn test_rows_without_companions() {
        let (timeline, warnings) = parse_ok(json!([
            {"year": 0, "pay_gap": 23.0},
            {"year": 1, "pay_gap": 22.0}
        ]));
        assert!(warnings.is_empty());
        assert_eq!(timeline.len(), 2);
        assert!(timeline.points()[0].leadership.is_none());
    }

    #[test]
    fn test_out_of_order_is_resorted_with_warning() {
        let (timeline, warnings) = parse_ok(json!({
            "years": [2, 0, 1],
            "pay_gap": [18.0, 23.0, 20.0]
        }));
        assert_eq!(timeline.years(), vec![0, 1, 2]);
        assert_eq!(timeline.pay_gaps(), vec![23.0, 20.0, 18.0]);
        assert_eq!(
            warnings,
            vec![NormalizationWarning::TimelineReordered {
                path: "timeline".to_string()
            }]
        );
    }

    #[test]
    fn test_duplicate_years_keep_first() {
        let (timeline, warnings) = parse_ok(json!({
            "years": [0, 1, 1, 2],
            "pay_gap": [23.0, 21.0, 99.0, 19.0]
        }));
        assert_eq!(timeline.pay_gaps(), vec![23.0, 21.0, 19.0]);
        assert_eq!(
            warnings,
            vec![NormalizationWarning::DuplicateYears {
                path: "timeline".to_string(),
                years: vec![1]
            }]
        );
    }

    #[test]
    fn test_missing_baseline_warns() {
        let (_, warnings) = parse_ok(json!([{"year": 1, "pay_gap": 22.0}]));
        assert!(matches!(
            warnings.as_slice(),
            [NormalizationWarning::MissingBaseline { .. }]
        ));
    }

    #[test]
    fn test_column_length_mismatch_is_an_error() {
        let mut warnings = Vec::new();
        let err = parse(
            &json!({"years": [0, 1], "pay_gap": [23.0]}),
            "timeline",
            &mut warnings,
        )
        .unwrap_err();
        assert_eq!(err.path(), Some("timeline.pay_gap"));

        let err = parse(
            &json!({"years": [0, 1], "pay_gap": [23.0, 22.0], "budget_spent": [0.0]}),
            "timeline",
            &mut warnings,
        )
        .unwrap_err();
        assert_eq!(err.path(), Some("timeline.budget_spent"));
    }

    #[test]
    fn test_malformed_cells_report_their_index() {
        let mut warnings = Vec::new();
        let err = parse(
            &json!({"years": [0, 1], "pay_gap": [23.0, "n/a"]}),
            "policy_a.timeline",
            &mut warnings,
        )
        .unwrap_err();
        assert_eq!(err.path(), Some("policy_a.timeline.pay_gap[1]"));
    }

    #[test]
    fn test_malformed_companion_cells_are_dropped_with_warning() {
        let (timeline, warnings) = parse_ok(json!({
            "years": [0, 1],
            "pay_gap": [23.0, 22.0],
            "employment_ratio": [0.82, "n/a"],
            "leadership": [{"female": 30.0, "male": 70.0}, {"female": 31.0}]
        }));
        assert_eq!(timeline.pay_gaps(), vec![23.0, 22.0]);
        assert_eq!(timeline.points()[0].employment_ratio, Some(0.82));
        assert!(timeline.points()[1].employment_ratio.is_none());
        assert!(timeline.points()[1].leadership.is_none());

        let paths: Vec<&str> = warnings.iter().map(|w| w.path()).collect();
        assert_eq!(
            paths,
            vec!["timeline.employment_ratio[1]", "timeline.leadership[1].male"]
        );
    }

    #[test]
    fn test_empty_timeline_is_an_error() {
        let mut warnings = Vec::new();
        assert!(parse(&json!([]), "timeline", &mut warnings).is_err());
        assert!(parse(&json!("soon"), "timeline", &mut warnings).is_err());
    }
}
