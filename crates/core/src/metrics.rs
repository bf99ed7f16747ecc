//! Metric discovery for single projects and project pairs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::data::{ColorMapping, MetricRow, DEFAULT_METRIC_COLOR};

/// Number of metrics charted by default on a project dashboard
pub const DEFAULT_SELECTED_METRICS: usize = 3;

/// A metric key offered for cross-project comparison
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricInfo {
    /// Raw field name, e.g. `twitter_user`
    pub key: String,
    /// Display name, e.g. `Twitter User`
    pub name: String,
    /// Whether both projects have at least one non-null value for the key
    pub available: bool,
}

/// A metric charted on a single project's dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardMetric {
    pub key: String,
    pub name: String,
    pub color: String,
}

/// Turn `closing_price` into `Closing Price`
pub fn display_name(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Union of non-null metric keys over every row
pub fn metric_keys(rows: &[MetricRow]) -> BTreeSet<String> {
    rows.iter()
        .flat_map(|row| row.present_keys())
        .map(str::to_string)
        .collect()
}

/// Metrics of two projects, comparable ones first, then by display name
///
/// Returns an empty list when either project has no rows.
pub fn discover_metrics(rows1: &[MetricRow], rows2: &[MetricRow]) -> Vec<MetricInfo> {
    if rows1.is_empty() || rows2.is_empty() {
        return Vec::new();
    }

    let keys1 = metric_keys(rows1);
    let keys2 = metric_keys(rows2);

    let mut metrics: Vec<MetricInfo> = keys1
        .union(&keys2)
        .map(|key| MetricInfo {
            key: key.clone(),
            name: display_name(key),
            available: keys1.contains(key) && keys2.contains(key),
        })
        .collect();

    metrics.sort_by(|a, b| {
        b.available
            .cmp(&a.available)
            .then_with(|| a.name.cmp(&b.name))
    });

    metrics
}

/// First available metric, used as the initial comparison selection
pub fn first_available(metrics: &[MetricInfo]) -> Option<&MetricInfo> {
    metrics.iter().find(|m| m.available)
}

/// Metrics present in one project's history, in first-seen order, with colors
pub fn project_metrics(rows: &[MetricRow], colors: &[ColorMapping]) -> Vec<DashboardMetric> {
    let color_map: HashMap<&str, &str> = colors
        .iter()
        .map(|c| (c.metric.as_str(), c.color.as_str()))
        .collect();

    let mut seen = BTreeSet::new();
    let mut metrics = Vec::new();

    for row in rows {
        for key in row.present_keys() {
            if seen.insert(key.to_string()) {
                metrics.push(DashboardMetric {
                    key: key.to_string(),
                    name: display_name(key),
                    color: color_map
                        .get(key)
                        .copied()
                        .unwrap_or(DEFAULT_METRIC_COLOR)
                        .to_string(),
                });
            }
        }
    }

    metrics
}

/// Keys charted when a dashboard first opens
pub fn default_selection(metrics: &[DashboardMetric]) -> Vec<String> {
    metrics
        .iter()
        .take(DEFAULT_SELECTED_METRICS)
        .map(|m| m.key.clone())
        .collect()
}

/// Add the key if absent, remove it if present
pub fn toggle_selection(selected: &mut Vec<String>, key: &str) {
    if let Some(pos) = selected.iter().position(|k| k == key) {
        selected.remove(pos);
    } else {
        selected.push(key.to_string());
    }
}

/// Percent change between the last two rows of a history
///
/// `None` when there are fewer than two rows, either value is missing, or the
/// previous value is zero.
pub fn day_over_day(rows: &[MetricRow], key: &str) -> Option<f64> {
    let [.., previous, current] = rows else {
        return None;
    };
    let previous = previous.value(key)?;
    let current = current.value(key)?;

    if previous == 0.0 {
        return None;
    }

    Some((current - previous) / previous * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(date: &str, values: &[(&str, Option<f64>)]) -> MetricRow {
        values
            .iter()
            .fold(MetricRow::new("p", date), |row, (k, v)| row.with(k, *v))
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("twitter_user"), "Twitter User");
        assert_eq!(display_name("closing_price"), "Closing Price");
        assert_eq!(display_name("return"), "Return");
        assert_eq!(display_name("a__b"), "A  B");
    }

    #[test]
    fn test_availability_is_key_set_intersection() {
        let p1 = vec![row("2024-01-01", &[("a", Some(1.0)), ("b", Some(2.0))])];
        let p2 = vec![row("2024-01-01", &[("b", Some(3.0)), ("c", Some(4.0))])];

        let metrics = discover_metrics(&p1, &p2);

        let available: Vec<&str> = metrics
            .iter()
            .filter(|m| m.available)
            .map(|m| m.key.as_str())
            .collect();
        let unavailable: Vec<&str> = metrics
            .iter()
            .filter(|m| !m.available)
            .map(|m| m.key.as_str())
            .collect();

        assert_eq!(available, vec!["b"]);
        assert_eq!(unavailable, vec!["a", "c"]);
    }

    #[test]
    fn test_keys_are_collected_over_whole_history() {
        let p1 = vec![
            row("2024-01-01", &[("discord_user", Some(10.0)), ("twitter_user", None)]),
            row("2024-01-02", &[("discord_user", None), ("twitter_user", Some(5.0))]),
        ];
        let p2 = vec![row(
            "2024-01-01",
            &[("twitter_user", Some(1.0)), ("discord_user", Some(1.0))],
        )];

        let metrics = discover_metrics(&p1, &p2);
        assert_eq!(metrics.len(), 2);
        assert!(metrics.iter().all(|m| m.available));
    }

    #[test]
    fn test_null_only_key_is_not_present() {
        let p1 = vec![row("2024-01-01", &[("x", None), ("y", Some(1.0))])];
        let p2 = vec![row("2024-01-01", &[("x", Some(1.0)), ("y", Some(1.0))])];

        let metrics = discover_metrics(&p1, &p2);
        let x = metrics.iter().find(|m| m.key == "x").unwrap();
        assert!(!x.available);
    }

    #[test]
    fn test_available_sorted_before_unavailable_then_by_name() {
        let p1 = vec![row(
            "2024-01-01",
            &[
                ("zeta", Some(1.0)),
                ("alpha", Some(1.0)),
                ("only_one", Some(1.0)),
                ("beta_only", Some(1.0)),
            ],
        )];
        let p2 = vec![row("2024-01-01", &[("zeta", Some(1.0)), ("alpha", Some(1.0))])];

        let metrics = discover_metrics(&p1, &p2);
        let names: Vec<&str> = metrics.iter().map(|m| m.name.as_str()).collect();

        assert_eq!(names, vec!["Alpha", "Zeta", "Beta Only", "Only One"]);
        let first_unavailable = metrics.iter().position(|m| !m.available).unwrap();
        assert!(metrics[first_unavailable..].iter().all(|m| !m.available));
    }

    #[test]
    fn test_empty_project_yields_no_metrics() {
        let p1 = vec![row("2024-01-01", &[("a", Some(1.0))])];
        assert!(discover_metrics(&p1, &[]).is_empty());
        assert!(discover_metrics(&[], &p1).is_empty());
    }

    #[test]
    fn test_first_available() {
        let p1 = vec![row("2024-01-01", &[("a", Some(1.0)), ("b", Some(1.0))])];
        let p2 = vec![row("2024-01-01", &[("b", Some(1.0))])];
        let metrics = discover_metrics(&p1, &p2);
        assert_eq!(first_available(&metrics).unwrap().key, "b");
    }

    #[test]
    fn test_project_metrics_uses_colors_and_default() {
        let rows = vec![
            row("2024-01-01", &[("twitter_user", Some(1.0))]),
            row("2024-01-02", &[("closing_price", Some(2.0)), ("twitter_user", Some(3.0))]),
        ];
        let colors = vec![ColorMapping {
            metric: "twitter_user".to_string(),
            color: "#1da1f2".to_string(),
        }];

        let metrics = project_metrics(&rows, &colors);

        assert_eq!(
            metrics,
            vec![
                DashboardMetric {
                    key: "twitter_user".to_string(),
                    name: "Twitter User".to_string(),
                    color: "#1da1f2".to_string(),
                },
                DashboardMetric {
                    key: "closing_price".to_string(),
                    name: "Closing Price".to_string(),
                    color: DEFAULT_METRIC_COLOR.to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_default_selection_takes_three() {
        let rows = vec![row(
            "2024-01-01",
            &[("a", Some(1.0)), ("b", Some(1.0)), ("c", Some(1.0)), ("d", Some(1.0))],
        )];
        let metrics = project_metrics(&rows, &[]);
        assert_eq!(default_selection(&metrics), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_toggle_selection_twice_restores() {
        let mut selected = vec!["a".to_string()];
        toggle_selection(&mut selected, "b");
        assert_eq!(selected, vec!["a", "b"]);
        toggle_selection(&mut selected, "b");
        assert_eq!(selected, vec!["a"]);
    }

    #[test]
    fn test_day_over_day() {
        let rows = vec![
            row("2024-01-01", &[("x", Some(200.0)), ("z", Some(0.0))]),
            row("2024-01-02", &[("x", Some(250.0)), ("z", Some(5.0))]),
        ];
        assert_eq!(day_over_day(&rows, "x"), Some(25.0));
        assert_eq!(day_over_day(&rows, "z"), None);
        assert_eq!(day_over_day(&rows, "missing"), None);
        assert_eq!(day_over_day(&rows[..1], "x"), None);
    }
}
