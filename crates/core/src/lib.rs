//! mopsos-core - Shared types and analytics for mopsos
//!
//! This crate contains WASM-compatible code that can be shared between
//! the CLI and a browser front end.
//!
//! # Features
//!
//! - Metric discovery across two projects' sparse daily rows
//! - Date-joined comparison series with trailing windows
//! - Trend statistics and Pearson correlation
//! - Per-platform leaderboards with position badges and paging
//! - Project overview, favorites and subscription quotes
//!
//! # Example
//!
//! ```
//! use mopsos_core::{compare::join_series, window::TimeRange, ComparisonStats};
//!
//! let day = |d: &str, v: f64| (d.to_string(), Some(v));
//! let p1 = vec![day("2024-01-01", 10.0), day("2024-01-02", 20.0)];
//! let p2 = vec![day("2024-01-01", 5.0), day("2024-01-02", 5.0)];
//!
//! let points = join_series(&p1, &p2, TimeRange::All, chrono::Utc::now());
//! let stats = ComparisonStats::compute(&points);
//! assert_eq!(stats.project1.change_percent, Some(100.0));
//! assert_eq!(stats.correlation, None);
//! ```

pub mod compare;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod favorites;
pub mod leaderboard;
pub mod metrics;
pub mod overview;
pub mod subscription;
pub mod window;

pub use compare::{
    CompareReport, ComparisonPoint, ComparisonStats, CorrelationStrength, ProjectStats,
};
pub use dashboard::ProjectDashboard;
pub use data::{
    ColorMapping, CommunityMember, GitHubAuthor, MessageAuthor, MetricRow, Project, TwitterAuthor,
};
pub use error::{Error, Result};
pub use favorites::{Favorites, KeyValueStore, MemoryStore};
pub use leaderboard::{Carousel, Leaderboard, Platform, PlatformBoard};
pub use metrics::{discover_metrics, MetricInfo};
pub use overview::{Overview, SortBy};
pub use window::{DateWindow, TimeRange};
