//! Single-project dashboard: metric cards and windowed history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::compare::format_number;
use crate::data::{ColorMapping, MetricRow};
use crate::metrics::{day_over_day, default_selection, project_metrics, DashboardMetric};
use crate::window::TimeRange;

/// Headline card for one metric
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricCard {
    pub key: String,
    pub name: String,
    /// Value on the most recent day
    pub latest: Option<f64>,
    /// Percent change from the previous day
    pub day_change: Option<f64>,
}

/// Dashboard of one project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectDashboard {
    pub project_id: String,
    pub range: TimeRange,
    pub metrics: Vec<DashboardMetric>,
    /// Keys charted, defaults to the first three metrics
    pub selected: Vec<String>,
    pub cards: Vec<MetricCard>,
    /// Rows inside the selected range, oldest first
    pub history: Vec<MetricRow>,
}

impl ProjectDashboard {
    /// Build from the full ascending history; cards always use the newest rows
    pub fn build(
        project_id: &str,
        rows: Vec<MetricRow>,
        colors: &[ColorMapping],
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> Self {
        let metrics = project_metrics(&rows, colors);
        let selected = default_selection(&metrics);
        let cards = metrics
            .iter()
            .map(|m| MetricCard {
                key: m.key.clone(),
                name: m.name.clone(),
                latest: rows.last().and_then(|row| row.value(&m.key)),
                day_change: day_over_day(&rows, &m.key),
            })
            .collect();
        let history = range.filter(rows, now, |row| row.date.as_str());

        Self {
            project_id: project_id.to_string(),
            range,
            metrics,
            selected,
            cards,
            history,
        }
    }

    /// Replace the charted metrics, keeping only keys the project has
    pub fn select(&mut self, keys: &[String]) {
        self.selected = keys
            .iter()
            .filter(|k| self.metrics.iter().any(|m| &m.key == *k))
            .cloned()
            .collect();
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Markdown summary with cards and the latest `limit` history rows
    pub fn summary(&self, limit: usize) -> String {
        let mut lines = vec![format!("## {} dashboard ({})\n", self.project_id, self.range)];

        lines.push("| Metric | Latest | vs previous day |".to_string());
        lines.push("|--------|--------|-----------------|".to_string());
        for card in &self.cards {
            let change = card
                .day_change
                .map(|c| format!("{:.2}%", c))
                .unwrap_or_else(|| "N/A".to_string());
            lines.push(format!(
                "| {} | {} | {} |",
                card.name,
                format_number(card.latest),
                change
            ));
        }
        lines.push(String::new());

        if self.selected.is_empty() || self.history.is_empty() {
            lines.push("No data in the selected range.".to_string());
            return lines.join("\n");
        }

        let names: Vec<&str> = self
            .selected
            .iter()
            .filter_map(|key| self.metrics.iter().find(|m| &m.key == key))
            .map(|m| m.name.as_str())
            .collect();
        lines.push(format!("### History ({} points)\n", self.history.len()));
        lines.push(format!("| Date | {} |", names.join(" | ")));
        lines.push(format!("|------|{}", "------|".repeat(names.len())));

        let start = self.history.len().saturating_sub(limit);
        for row in &self.history[start..] {
            let values: Vec<String> = self
                .selected
                .iter()
                .map(|key| {
                    row.value(key)
                        .map(|v| format_number(Some(v)))
                        .unwrap_or_else(|| "-".to_string())
                })
                .collect();
            lines.push(format!("| {} | {} |", row.date, values.join(" | ")));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn rows() -> Vec<MetricRow> {
        vec![
            MetricRow::new("sol", "2024-01-01").with("twitter_user", Some(80.0)),
            MetricRow::new("sol", "2024-06-28")
                .with("twitter_user", Some(100.0))
                .with("closing_price", None),
            MetricRow::new("sol", "2024-06-29")
                .with("twitter_user", Some(110.0))
                .with("closing_price", Some(150.0)),
        ]
    }

    #[test]
    fn test_build_cards_and_window() {
        let dashboard = ProjectDashboard::build("sol", rows(), &[], TimeRange::Days30, now());

        assert_eq!(dashboard.history.len(), 2);
        assert_eq!(dashboard.selected, vec!["twitter_user", "closing_price"]);

        let twitter = &dashboard.cards[0];
        assert_eq!(twitter.latest, Some(110.0));
        assert!((twitter.day_change.unwrap() - 10.0).abs() < 1e-9);

        let price = &dashboard.cards[1];
        assert_eq!(price.latest, Some(150.0));
        assert_eq!(price.day_change, None);
    }

    #[test]
    fn test_select_ignores_unknown_keys() {
        let mut dashboard = ProjectDashboard::build("sol", rows(), &[], TimeRange::All, now());
        dashboard.select(&["closing_price".to_string(), "bogus".to_string()]);
        assert_eq!(dashboard.selected, vec!["closing_price"]);
    }

    #[test]
    fn test_summary_marks_gaps() {
        let dashboard = ProjectDashboard::build("sol", rows(), &[], TimeRange::All, now());
        let summary = dashboard.summary(2);
        assert!(summary.contains("| Twitter User | 110 | 10.00% |"));
        assert!(summary.contains("| Closing Price | 150 | N/A |"));
        assert!(summary.contains("| 2024-06-28 | 100 | - |"));
        assert!(!summary.contains("2024-01-01"));
    }

    #[test]
    fn test_empty_history() {
        let dashboard = ProjectDashboard::build("none", vec![], &[], TimeRange::All, now());
        assert!(dashboard.is_empty());
        assert!(dashboard.cards.is_empty());
    }
}
