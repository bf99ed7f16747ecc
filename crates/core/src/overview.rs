//! Project overview: latest metrics, totals, activity levels and ordering

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::data::{MetricRow, Project};
use crate::error::Error;
use crate::favorites::Favorites;

/// Combined users above this count are highly active
pub const HIGH_ACTIVITY_USERS: f64 = 1000.0;
/// Combined users above this count are moderately active
pub const MEDIUM_ACTIVITY_USERS: f64 = 50.0;

/// Latest headline metrics of one project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProjectSnapshot {
    pub id: String,
    pub date: String,
    pub twitter_user: f64,
    pub discord_user: f64,
    pub telegram_user: f64,
    pub closing_price: Option<f64>,
    #[serde(rename = "return")]
    pub return_value: Option<f64>,
    pub twitter_post: Option<f64>,
}

impl ProjectSnapshot {
    fn from_row(row: &MetricRow) -> Self {
        Self {
            id: row.id.clone(),
            date: row.date.clone(),
            twitter_user: row.value("twitter_user").unwrap_or(0.0),
            discord_user: row.value("discord_user").unwrap_or(0.0),
            telegram_user: row.value("telegram_user").unwrap_or(0.0),
            closing_price: row.value("closing_price"),
            return_value: row.value("return"),
            twitter_post: row.value("twitter_post"),
        }
    }

    /// Users across Twitter, Discord and Telegram
    pub fn total_users(&self) -> f64 {
        self.twitter_user + self.discord_user + self.telegram_user
    }
}

/// Keep the first row seen per project from rows ordered newest first
pub fn latest_snapshots(rows_newest_first: &[MetricRow]) -> HashMap<String, ProjectSnapshot> {
    let mut latest = HashMap::new();
    for row in rows_newest_first {
        latest
            .entry(row.id.clone())
            .or_insert_with(|| ProjectSnapshot::from_row(row));
    }
    latest
}

/// Sum of users over every project snapshot
pub fn total_users<'a, I>(snapshots: I) -> f64
where
    I: IntoIterator<Item = &'a ProjectSnapshot>,
{
    snapshots.into_iter().map(ProjectSnapshot::total_users).sum()
}

/// Coarse community size bucket
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActivityLevel {
    High,
    Medium,
    Low,
}

impl ActivityLevel {
    pub fn classify(snapshot: Option<&ProjectSnapshot>) -> Self {
        let Some(snapshot) = snapshot else {
            return ActivityLevel::Low;
        };
        let total = snapshot.total_users();
        if total > HIGH_ACTIVITY_USERS {
            ActivityLevel::High
        } else if total > MEDIUM_ACTIVITY_USERS {
            ActivityLevel::Medium
        } else {
            ActivityLevel::Low
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActivityLevel::High => "High Activity",
            ActivityLevel::Medium => "Medium Activity",
            ActivityLevel::Low => "Low Activity",
        };
        f.write_str(label)
    }
}

/// `user` for zero or one, `users` otherwise
pub fn user_label(count: f64) -> &'static str {
    if count == 0.0 || count == 1.0 {
        "user"
    } else {
        "users"
    }
}

/// Ordering of the project list
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Name,
    Twitter,
    Discord,
    Telegram,
    Price,
}

impl SortBy {
    fn metric(&self, snapshot: Option<&ProjectSnapshot>) -> f64 {
        let Some(s) = snapshot else {
            return 0.0;
        };
        match self {
            SortBy::Name => 0.0,
            SortBy::Twitter => s.twitter_user,
            SortBy::Discord => s.discord_user,
            SortBy::Telegram => s.telegram_user,
            SortBy::Price => s.closing_price.unwrap_or(0.0),
        }
    }
}

impl FromStr for SortBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(SortBy::Name),
            "twitter" => Ok(SortBy::Twitter),
            "discord" => Ok(SortBy::Discord),
            "telegram" => Ok(SortBy::Telegram),
            "price" => Ok(SortBy::Price),
            _ => Err(Error::UnknownSortKey(s.to_string())),
        }
    }
}

/// A project with its latest snapshot, as listed in the overview
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverviewEntry {
    pub project: Project,
    pub snapshot: Option<ProjectSnapshot>,
    pub activity: ActivityLevel,
    pub favorite: bool,
}

/// Overview of every tracked project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Overview {
    pub total_projects: usize,
    pub total_users: f64,
    pub favorites: Vec<OverviewEntry>,
    pub others: Vec<OverviewEntry>,
}

impl Overview {
    /// Filter by name, sort, and split favorites from the rest
    pub fn build(
        projects: &[Project],
        snapshots: &HashMap<String, ProjectSnapshot>,
        favorites: &Favorites,
        search: &str,
        sort_by: SortBy,
    ) -> Self {
        let needle = search.to_lowercase();
        let mut listed: Vec<&Project> = projects
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect();

        match sort_by {
            SortBy::Name => listed.sort_by(|a, b| a.name.cmp(&b.name)),
            _ => listed.sort_by(|a, b| {
                let va = sort_by.metric(snapshots.get(&a.id));
                let vb = sort_by.metric(snapshots.get(&b.id));
                vb.total_cmp(&va)
            }),
        }

        let (favorite_entries, others): (Vec<OverviewEntry>, Vec<OverviewEntry>) = listed
            .into_iter()
            .map(|project| {
                let snapshot = snapshots.get(&project.id).cloned();
                OverviewEntry {
                    activity: ActivityLevel::classify(snapshot.as_ref()),
                    favorite: favorites.contains(&project.id),
                    project: project.clone(),
                    snapshot,
                }
            })
            .partition(|entry| entry.favorite);

        Self {
            total_projects: projects.len(),
            total_users: total_users(snapshots.values()),
            favorites: favorite_entries,
            others,
        }
    }

    /// Markdown listing
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "## Crypto Social Analytics\n".to_string(),
            format!(
                "Tracking {} projects with {:.0} total community members\n",
                self.total_projects, self.total_users
            ),
        ];

        let sections = [
            ("### ★ Favorites\n", &self.favorites),
            ("### Projects\n", &self.others),
        ];
        for (title, entries) in sections {
            if entries.is_empty() {
                continue;
            }
            lines.push(title.to_string());
            lines.push("| Project | Twitter | Discord | Telegram | Price | Activity |".to_string());
            lines.push("|---------|---------|---------|----------|-------|----------|".to_string());
            for entry in entries {
                let s = entry.snapshot.clone().unwrap_or_default();
                lines.push(format!(
                    "| {} | {:.0} {} | {:.0} {} | {:.0} {} | {} | {} |",
                    entry.project.name,
                    s.twitter_user,
                    user_label(s.twitter_user),
                    s.discord_user,
                    user_label(s.discord_user),
                    s.telegram_user,
                    user_label(s.telegram_user),
                    s.closing_price
                        .map(|p| format!("${:.4}", p))
                        .unwrap_or_else(|| "N/A".to_string()),
                    entry.activity
                ));
            }
            lines.push(String::new());
        }

        lines.join("\n")
    }
}
