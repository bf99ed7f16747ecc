//! Cross-project metric comparison: date join, trend statistics and correlation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::data::{MetricRow, Project};
use crate::metrics::display_name;
use crate::window::TimeRange;

/// |r| above this is a strong correlation
pub const STRONG_CORRELATION: f64 = 0.7;
/// |r| above this (and up to the strong bound) is a moderate correlation
pub const MODERATE_CORRELATION: f64 = 0.3;

/// One date on which both projects have a row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonPoint {
    pub date: String,
    /// `None` renders as a gap, never as zero
    pub project1_value: Option<f64>,
    pub project2_value: Option<f64>,
}

/// Trend of one project over the compared range
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ProjectStats {
    /// Most recent non-null value
    pub latest: Option<f64>,
    /// latest - first; needs two non-null values
    pub change: Option<f64>,
    /// change / first * 100; absent when first is zero
    pub change_percent: Option<f64>,
}

impl ProjectStats {
    /// Compute from a date-ordered sequence of optional values
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let valid: Vec<f64> = values.into_iter().flatten().collect();

        let latest = valid.last().copied();
        let (change, change_percent) = match valid.as_slice() {
            [first, .., last] => {
                let change = last - first;
                let percent = if *first != 0.0 {
                    Some(change / first * 100.0).filter(|p| p.is_finite())
                } else {
                    None
                };
                (Some(change), percent)
            }
            _ => (None, None),
        };

        Self {
            latest,
            change,
            change_percent,
        }
    }
}

/// Statistics for a pair of joined series
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ComparisonStats {
    pub project1: ProjectStats,
    pub project2: ProjectStats,
    /// Pearson r over pairwise-complete points
    pub correlation: Option<f64>,
}

impl ComparisonStats {
    pub fn compute(points: &[ComparisonPoint]) -> Self {
        Self {
            project1: ProjectStats::from_values(points.iter().map(|p| p.project1_value)),
            project2: ProjectStats::from_values(points.iter().map(|p| p.project2_value)),
            correlation: correlation(points),
        }
    }

    pub fn strength(&self) -> CorrelationStrength {
        CorrelationStrength::classify(self.correlation)
    }
}

/// Display bucket for a correlation coefficient
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
    Unknown,
}

impl CorrelationStrength {
    pub fn classify(correlation: Option<f64>) -> Self {
        match correlation.map(f64::abs) {
            None => CorrelationStrength::Unknown,
            Some(r) if r > STRONG_CORRELATION => CorrelationStrength::Strong,
            Some(r) if r > MODERATE_CORRELATION => CorrelationStrength::Moderate,
            Some(_) => CorrelationStrength::Weak,
        }
    }
}

impl fmt::Display for CorrelationStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CorrelationStrength::Strong => "Strong",
            CorrelationStrength::Moderate => "Moderate",
            CorrelationStrength::Weak => "Weak",
            CorrelationStrength::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// Extract the `(date, value)` series of one metric
pub fn metric_series(rows: &[MetricRow], key: &str) -> Vec<(String, Option<f64>)> {
    rows.iter()
        .map(|row| (row.date.clone(), row.value(key)))
        .collect()
}

/// Date to value lookup; a later duplicate date overwrites an earlier one
fn lookup(series: &[(String, Option<f64>)]) -> BTreeMap<&str, Option<f64>> {
    series
        .iter()
        .map(|(date, value)| (date.as_str(), *value))
        .collect()
}

/// Join two series on the dates both contain, then apply the trailing window
///
/// Dates are ISO strings, so the lexical order of the lookup is chronological.
pub fn join_series(
    series1: &[(String, Option<f64>)],
    series2: &[(String, Option<f64>)],
    range: TimeRange,
    now: DateTime<Utc>,
) -> Vec<ComparisonPoint> {
    let map1 = lookup(series1);
    let map2 = lookup(series2);

    let joined: Vec<ComparisonPoint> = map1
        .iter()
        .filter_map(|(date, value1)| {
            map2.get(date).map(|value2| ComparisonPoint {
                date: date.to_string(),
                project1_value: *value1,
                project2_value: *value2,
            })
        })
        .collect();

    range.filter(joined, now, |p| p.date.as_str())
}

/// Pearson product-moment correlation over points where both values exist
///
/// `None` for fewer than two pairs or a zero-variance series.
pub fn correlation(points: &[ComparisonPoint]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = points
        .iter()
        .filter_map(|p| Some((p.project1_value?, p.project2_value?)))
        .collect();

    if pairs.len() < 2 {
        return None;
    }

    // a constant series is undefined even when rounding leaves residual variance
    if is_constant(pairs.iter().map(|p| p.0)) || is_constant(pairs.iter().map(|p| p.1)) {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0_f64, 0.0_f64, 0.0_f64);
    for &(x, y) in &pairs {
        let (dx, dy) = (x - mean_x, y - mean_y);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let variance_product = var_x * var_y;
    if !variance_product.is_finite() || variance_product <= 0.0 {
        return None;
    }

    let r = cov / variance_product.sqrt();
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

fn is_constant(mut values: impl Iterator<Item = f64>) -> bool {
    match values.next() {
        Some(first) => values.all(|v| v == first),
        None => true,
    }
}

/// Compact number for display: `N/A`, `1.2K`, `3.4M`, `5.6B`
pub fn format_number(value: Option<f64>) -> String {
    let Some(value) = value else {
        return "N/A".to_string();
    };

    if value >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        let text = format!("{:.3}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Signed percentage with one decimal, or `N/A`
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        None => "N/A".to_string(),
        Some(v) if v >= 0.0 => format!("+{:.1}%", v),
        Some(v) => format!("{:.1}%", v),
    }
}

/// Correlation coefficient with three decimals, or `N/A`
pub fn format_correlation(value: Option<f64>) -> String {
    value
        .map(|r| format!("{:.3}", r))
        .unwrap_or_else(|| "N/A".to_string())
}

/// Result of comparing one metric between two projects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareReport {
    pub project1: Project,
    pub project2: Project,
    /// Metric key
    pub metric: String,
    pub range: TimeRange,
    pub points: Vec<ComparisonPoint>,
    pub stats: ComparisonStats,
    pub strength: CorrelationStrength,
}

impl CompareReport {
    /// Join the two row sets on `metric` and compute statistics
    pub fn build(
        project1: Project,
        rows1: &[MetricRow],
        project2: Project,
        rows2: &[MetricRow],
        metric: &str,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> Self {
        let points = join_series(
            &metric_series(rows1, metric),
            &metric_series(rows2, metric),
            range,
            now,
        );
        let stats = ComparisonStats::compute(&points);

        Self {
            project1,
            project2,
            metric: metric.to_string(),
            range,
            strength: stats.strength(),
            points,
            stats,
        }
    }

    /// Generate a markdown summary
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        let metric_name = display_name(&self.metric);

        lines.push(format!(
            "## {} vs {}: {} ({})\n",
            self.project1.name, self.project2.name, metric_name, self.range
        ));

        if self.points.is_empty() {
            lines.push("No overlapping data in the selected range.".to_string());
            return lines.join("\n");
        }

        lines.push("| Project | Latest | Change | Change % |".to_string());
        lines.push("|---------|--------|--------|----------|".to_string());
        for (project, stats) in [
            (&self.project1, &self.stats.project1),
            (&self.project2, &self.stats.project2),
        ] {
            let indicator = match stats.change {
                Some(c) if c > 0.0 => "📈",
                Some(c) if c < 0.0 => "📉",
                _ => "⚪",
            };
            lines.push(format!(
                "| {} | {} | {} {} | {} |",
                project.name,
                format_number(stats.latest),
                indicator,
                format_number(stats.change),
                format_percent(stats.change_percent)
            ));
        }
        lines.push(String::new());

        lines.push(format!(
            "**Correlation**: {} ({})",
            format_correlation(self.stats.correlation),
            self.strength
        ));
        lines.push(format!(
            "**Data points**: {} ({} to {})",
            self.points.len(),
            self.points[0].date,
            self.points[self.points.len() - 1].date
        ));

        lines.join("\n")
    }

    /// One-line summary for terminal output
    pub fn short_summary(&self) -> String {
        if self.points.is_empty() {
            return "No overlapping data to compare.".to_string();
        }

        format!(
            "{}: {} {} vs {} {}, correlation {} ({}) over {} points",
            display_name(&self.metric),
            self.project1.name,
            format_percent(self.stats.project1.change_percent),
            self.project2.name,
            format_percent(self.stats.project2.change_percent),
            format_correlation(self.stats.correlation),
            self.strength,
            self.points.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn series(values: &[(&str, Option<f64>)]) -> Vec<(String, Option<f64>)> {
        values.iter().map(|(d, v)| (d.to_string(), *v)).collect()
    }

    fn point(date: &str, a: Option<f64>, b: Option<f64>) -> ComparisonPoint {
        ComparisonPoint {
            date: date.to_string(),
            project1_value: a,
            project2_value: b,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn project(id: &str) -> Project {
        Project {
            id: id.to_string(),
            name: id.to_uppercase(),
            url: String::new(),
        }
    }

    #[test]
    fn test_join_worked_example() {
        let p1 = series(&[("2024-01-01", Some(10.0)), ("2024-01-02", Some(20.0))]);
        let p2 = series(&[("2024-01-01", Some(5.0)), ("2024-01-02", Some(5.0))]);

        let points = join_series(&p1, &p2, TimeRange::All, now());
        assert_eq!(
            points,
            vec![
                point("2024-01-01", Some(10.0), Some(5.0)),
                point("2024-01-02", Some(20.0), Some(5.0)),
            ]
        );

        let stats = ComparisonStats::compute(&points);
        assert_eq!(stats.project1.change, Some(10.0));
        assert_eq!(stats.project1.change_percent, Some(100.0));
        assert_eq!(stats.project2.change, Some(0.0));
        assert_eq!(stats.project2.change_percent, Some(0.0));
        assert_eq!(stats.correlation, None);
        assert_eq!(stats.strength(), CorrelationStrength::Unknown);
    }

    #[test]
    fn test_join_uses_date_intersection_sorted() {
        let p1 = series(&[
            ("2024-01-03", Some(3.0)),
            ("2024-01-01", Some(1.0)),
            ("2024-01-02", Some(2.0)),
        ]);
        let p2 = series(&[
            ("2024-01-02", Some(20.0)),
            ("2024-01-03", Some(30.0)),
            ("2024-01-04", Some(40.0)),
        ]);

        let dates: Vec<String> = join_series(&p1, &p2, TimeRange::All, now())
            .into_iter()
            .map(|p| p.date)
            .collect();
        assert_eq!(dates, vec!["2024-01-02", "2024-01-03"]);
    }

    #[test]
    fn test_duplicate_dates_last_write_wins() {
        let p1 = series(&[("2024-01-01", Some(1.0)), ("2024-01-01", Some(9.0))]);
        let p2 = series(&[("2024-01-01", Some(2.0))]);
        let points = join_series(&p1, &p2, TimeRange::All, now());
        assert_eq!(points, vec![point("2024-01-01", Some(9.0), Some(2.0))]);
    }

    #[test]
    fn test_nulls_and_zeros_are_preserved() {
        let p1 = series(&[("2024-01-01", None), ("2024-01-02", Some(0.0))]);
        let p2 = series(&[("2024-01-01", Some(4.0)), ("2024-01-02", Some(0.0))]);
        let points = join_series(&p1, &p2, TimeRange::All, now());
        assert_eq!(
            points,
            vec![
                point("2024-01-01", None, Some(4.0)),
                point("2024-01-02", Some(0.0), Some(0.0)),
            ]
        );
    }

    #[test]
    fn test_window_result_is_suffix_of_unwindowed() {
        let dates = ["2023-05-01", "2024-02-01", "2024-05-15", "2024-06-20", "2024-06-29"];
        let p1: Vec<_> = dates.iter().map(|d| (d.to_string(), Some(1.0))).collect();
        let p2 = p1.clone();

        let all = join_series(&p1, &p2, TimeRange::All, now());
        for range in TimeRange::ALL_RANGES {
            let windowed = join_series(&p1, &p2, range, now());
            assert!(windowed.len() <= all.len());
            assert_eq!(windowed[..], all[all.len() - windowed.len()..]);
        }
        assert_eq!(join_series(&p1, &p2, TimeRange::Days30, now()).len(), 2);
        assert_eq!(join_series(&p1, &p2, TimeRange::Days90, now()).len(), 3);
        assert_eq!(join_series(&p1, &p2, TimeRange::Year, now()).len(), 4);
    }

    #[test]
    fn test_stale_series_shrinks_under_short_window() {
        let p1 = series(&[("2024-01-01", Some(1.0)), ("2024-01-02", Some(2.0))]);
        let points = join_series(&p1, &p1, TimeRange::Days30, now());
        assert!(points.is_empty());
    }

    #[test]
    fn test_latest_skips_trailing_nulls() {
        let stats = ProjectStats::from_values([Some(4.0), Some(8.0), None]);
        assert_eq!(stats.latest, Some(8.0));
        assert_eq!(stats.change, Some(4.0));
        assert_eq!(stats.change_percent, Some(100.0));
    }

    #[test]
    fn test_single_value_has_no_change() {
        let stats = ProjectStats::from_values([None, Some(7.0)]);
        assert_eq!(stats.latest, Some(7.0));
        assert_eq!(stats.change, None);
        assert_eq!(stats.change_percent, None);
    }

    #[test]
    fn test_change_percent_absent_when_first_is_zero() {
        let stats = ProjectStats::from_values([Some(0.0), Some(5.0)]);
        assert_eq!(stats.change, Some(5.0));
        assert_eq!(stats.change_percent, None);
    }

    #[test]
    fn test_correlation_self_is_one() {
        let points: Vec<_> = [1.0, 3.0, 2.0, 8.0]
            .iter()
            .enumerate()
            .map(|(i, v)| point(&format!("2024-01-0{}", i + 1), Some(*v), Some(*v)))
            .collect();
        let r = correlation(&points).unwrap();
        assert!((r - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_correlation_is_symmetric() {
        let points = vec![
            point("2024-01-01", Some(1.0), Some(2.5)),
            point("2024-01-02", Some(2.0), Some(1.0)),
            point("2024-01-03", Some(4.0), Some(7.0)),
            point("2024-01-04", Some(3.5), None),
            point("2024-01-05", Some(6.0), Some(6.5)),
        ];
        let swapped: Vec<_> = points
            .iter()
            .map(|p| point(&p.date, p.project2_value, p.project1_value))
            .collect();
        assert_eq!(correlation(&points), correlation(&swapped));
    }

    #[test]
    fn test_correlation_negative_and_pairwise_complete() {
        let points = vec![
            point("2024-01-01", Some(1.0), Some(3.0)),
            point("2024-01-02", None, Some(100.0)),
            point("2024-01-03", Some(2.0), Some(2.0)),
            point("2024-01-04", Some(3.0), Some(1.0)),
        ];
        let r = correlation(&points).unwrap();
        assert!((r + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_correlation_undefined_cases() {
        assert_eq!(correlation(&[]), None);
        assert_eq!(correlation(&[point("2024-01-01", Some(1.0), Some(2.0))]), None);
        let constant = vec![
            point("2024-01-01", Some(3.0), Some(1.0)),
            point("2024-01-02", Some(3.0), Some(2.0)),
        ];
        assert_eq!(correlation(&constant), None);
    }

    #[test]
    fn test_correlation_undefined_for_inexact_constant() {
        let points: Vec<ComparisonPoint> = (0..5)
            .map(|i| point(&format!("2024-01-0{}", i + 1), Some(0.1), Some(f64::from(i))))
            .collect();
        assert_eq!(correlation(&points), None);

        let stats = ComparisonStats::compute(&points);
        assert_eq!(stats.strength(), CorrelationStrength::Unknown);
    }

    #[test]
    fn test_strength_thresholds() {
        assert_eq!(CorrelationStrength::classify(Some(0.71)), CorrelationStrength::Strong);
        assert_eq!(CorrelationStrength::classify(Some(-0.9)), CorrelationStrength::Strong);
        assert_eq!(CorrelationStrength::classify(Some(0.7)), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::classify(Some(-0.31)), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::classify(Some(0.3)), CorrelationStrength::Weak);
        assert_eq!(CorrelationStrength::classify(Some(0.0)), CorrelationStrength::Weak);
        assert_eq!(CorrelationStrength::classify(None), CorrelationStrength::Unknown);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(None), "N/A");
        assert_eq!(format_number(Some(2_500_000_000.0)), "2.5B");
        assert_eq!(format_number(Some(1_260_000.0)), "1.3M");
        assert_eq!(format_number(Some(1_500.0)), "1.5K");
        assert_eq!(format_number(Some(42.0)), "42");
        assert_eq!(format_number(Some(0.125)), "0.125");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(None), "N/A");
        assert_eq!(format_percent(Some(12.345)), "+12.3%");
        assert_eq!(format_percent(Some(0.0)), "+0.0%");
        assert_eq!(format_percent(Some(-4.0)), "-4.0%");
    }

    #[test]
    fn test_report_summary_renders_na() {
        let rows1 = vec![
            MetricRow::new("a", "2024-06-01").with("twitter_user", Some(100.0)),
            MetricRow::new("a", "2024-06-02").with("twitter_user", Some(150.0)),
        ];
        let rows2 = vec![
            MetricRow::new("b", "2024-06-01").with("twitter_user", Some(0.0)),
            MetricRow::new("b", "2024-06-02").with("twitter_user", Some(0.0)),
        ];

        let report = CompareReport::build(
            project("a"),
            &rows1,
            project("b"),
            &rows2,
            "twitter_user",
            TimeRange::All,
            now(),
        );

        assert_eq!(report.points.len(), 2);
        assert_eq!(report.strength, CorrelationStrength::Unknown);
        let summary = report.summary();
        assert!(summary.contains("## A vs B: Twitter User (All)"));
        assert!(summary.contains("| A | 150 | 📈 50 | +50.0% |"));
        assert!(summary.contains("| B | 0 | ⚪ 0 | N/A |"));
        assert!(summary.contains("**Correlation**: N/A (Unknown)"));
    }

    #[test]
    fn test_report_without_overlap() {
        let report = CompareReport::build(
            project("a"),
            &[MetricRow::new("a", "2024-06-01").with("x", Some(1.0))],
            project("b"),
            &[MetricRow::new("b", "2024-06-02").with("x", Some(1.0))],
            "x",
            TimeRange::All,
            now(),
        );
        assert!(report.points.is_empty());
        assert_eq!(report.short_summary(), "No overlapping data to compare.");
    }
}
