//! Data structures for projects, metric rows and leaderboard entries

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Field names that identify a row rather than carry a metric
pub const ID_FIELD: &str = "id";
pub const DATE_FIELD: &str = "date";

/// Color used when no mapping exists for a metric
pub const DEFAULT_METRIC_COLOR: &str = "#000000";

/// A tracked crypto project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    /// Project identifier (also used as the route slug)
    pub id: String,
    /// Display name
    pub name: String,
    /// Logo URL
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
}

/// A sparse per-day metric record for one project
///
/// Which metric keys are present varies by project and by day, so the metric
/// fields are kept as raw JSON values. A key counts as present only when its
/// value is non-null.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MetricRow {
    /// Project reference; absent from narrow selects
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// ISO `YYYY-MM-DD` date
    pub date: String,
    /// Metric key to value, nulls included
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl MetricRow {
    /// Create an empty row for a project and date
    pub fn new(id: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            date: date.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style setter, `None` stores an explicit null
    pub fn with(mut self, key: &str, value: Option<f64>) -> Self {
        let value = value.map(Value::from).unwrap_or(Value::Null);
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Keys with a non-null value on this row
    pub fn present_keys(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(key, value)| !value.is_null() && !is_identifier(key))
            .map(|(key, _)| key.as_str())
    }

    /// Numeric value of a metric; null, missing and non-numeric read as `None`
    pub fn value(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }
}

fn is_identifier(key: &str) -> bool {
    key == ID_FIELD || key == DATE_FIELD
}

/// Read an explicit JSON `null` the same way as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse an ISO `YYYY-MM-DD` date string
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|source| Error::InvalidDate {
        value: value.to_string(),
        source,
    })
}

/// Format a date the way the remote service expects it
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Metric-to-color mapping used when charting a project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColorMapping {
    pub metric: String,
    pub color: String,
}

/// Twitter activity of one author over the leaderboard window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TwitterAuthor {
    pub author_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub avatar: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub posts: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_likes: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_retweet: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_comment: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_quotes: u64,
}

/// Message activity of one author on Discord or Telegram
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MessageAuthor {
    pub author_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub avatar: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_message: u64,
}

/// Commit activity of one GitHub author
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GitHubAuthor {
    pub author_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub avatar: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_commits: u64,
}

/// A row of the precomputed community leaderboard table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CommunityMember {
    /// Project reference
    pub id: String,
    pub author_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub avatar: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub post: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub like: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub retweet: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comment: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quote: u64,
    pub rank: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_row_deserializes_sparse_fields() {
        let json = r#"{"id":"sol","date":"2024-03-01","twitter_user":120,"discord_user":null}"#;
        let row: MetricRow = serde_json::from_str(json).unwrap();

        assert_eq!(row.id, "sol");
        assert_eq!(row.date, "2024-03-01");
        assert_eq!(row.value("twitter_user"), Some(120.0));
        assert_eq!(row.value("discord_user"), None);
        assert_eq!(row.present_keys().collect::<Vec<_>>(), vec!["twitter_user"]);
    }

    #[test]
    fn test_zero_is_a_present_value() {
        let row = MetricRow::new("p", "2024-01-01").with("return", Some(0.0));
        assert_eq!(row.value("return"), Some(0.0));
        assert_eq!(row.present_keys().count(), 1);
    }

    #[test]
    fn test_non_numeric_value_is_present_but_not_numeric() {
        let json = r#"{"id":"p","date":"2024-01-01","note":"halving"}"#;
        let row: MetricRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.present_keys().collect::<Vec<_>>(), vec!["note"]);
        assert_eq!(row.value("note"), None);
    }

    #[test]
    fn test_parse_date() {
        let date = parse_date("2024-02-29").unwrap();
        assert_eq!(format_date(date), "2024-02-29");
        assert!(parse_date("29/02/2024").is_err());
    }

    #[test]
    fn test_nulls_read_as_defaults() {
        let json = r#"[{"author_id":"1","author":"a","avatar":null,"total_commits":3}]"#;
        let authors: Vec<GitHubAuthor> = serde_json::from_str(json).unwrap();
        assert_eq!(authors[0].total_commits, 3);
        assert!(authors[0].avatar.is_empty());

        let project: Project =
            serde_json::from_str(r#"{"id":"sol","name":"Solana","url":null}"#).unwrap();
        assert!(project.url.is_empty());

        let json = r#"{"author_id":"2","author":null,"avatar":null,"posts":null,"total_likes":4}"#;
        let twitter: TwitterAuthor = serde_json::from_str(json).unwrap();
        assert_eq!(twitter.posts, 0);
        assert_eq!(twitter.total_likes, 4);
        assert!(twitter.author.is_empty());

        let json = r#"{"id":"sol","author_id":"3","author":"c","avatar":null,"like":null,"rank":1}"#;
        let member: CommunityMember = serde_json::from_str(json).unwrap();
        assert_eq!(member.like, 0);
        assert_eq!(member.rank, 1);
    }

    #[test]
    fn test_author_defaults_missing_counters() {
        let json = r#"{"author_id":"1","author":"alice"}"#;
        let author: GitHubAuthor = serde_json::from_str(json).unwrap();
        assert_eq!(author.total_commits, 0);
        assert!(author.avatar.is_empty());
    }
}
