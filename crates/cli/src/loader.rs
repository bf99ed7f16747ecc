//! Concurrent view loading with partial failure
//!
//! Every view fans its independent queries out at once and waits for all of
//! them to settle. Non-critical resources that fail or time out are logged
//! and replaced by an empty value; only the view's critical resource turns
//! into an error. Nothing is retried here, the user re-runs the command.

use crate::client::DataSource;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use mopsos_core::compare::CompareReport;
use mopsos_core::leaderboard::{community_ranking, RankIcon};
use mopsos_core::metrics::first_available;
use mopsos_core::overview::latest_snapshots;
use mopsos_core::{
    discover_metrics, CommunityMember, DateWindow, Favorites, Leaderboard, MetricInfo, MetricRow,
    Overview, Platform, PlatformBoard, Project, ProjectDashboard, SortBy, TimeRange,
};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// One deadline applied to every request of a view
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    after: Duration,
}

impl Deadline {
    pub fn new(after: Duration) -> Self {
        Self { after }
    }

    /// Await `request`, failing with `Error::Timeout` once the deadline passes
    pub async fn run<T, F>(&self, resource: &str, request: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.after, request).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                resource: resource.to_string(),
                after: self.after,
            }),
        }
    }
}

/// Tracks which view is current so late responses can be dropped
#[derive(Debug, Default)]
pub struct ViewGuard {
    generation: AtomicU64,
}

/// Proof of the view a request was issued for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewTicket {
    generation: u64,
    identity: String,
}

impl ViewTicket {
    pub fn identity(&self) -> &str {
        &self.identity
    }
}

impl ViewGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `identity` the current view, invalidating earlier tickets
    pub fn enter(&self, identity: &str) -> ViewTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        ViewTicket {
            generation,
            identity: identity.to_string(),
        }
    }

    pub fn is_current(&self, ticket: &ViewTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
    }

    /// Hand back `value` only if `ticket` is still the current view
    pub fn accept<T>(&self, ticket: &ViewTicket, value: T) -> Result<T> {
        if self.is_current(ticket) {
            Ok(value)
        } else {
            debug!("Dropping stale response for {}", ticket.identity());
            Err(Error::Stale(ticket.identity().to_string()))
        }
    }
}

/// Substitute an empty value for a failed non-critical resource
pub fn or_empty<T: Default>(resource: &str, result: Result<T>) -> T {
    result.unwrap_or_else(|e| {
        warn!("{} unavailable, showing it empty: {}", resource, e);
        T::default()
    })
}

/// A critical resource must load and must not be empty
pub fn critical<T>(resource: &str, result: Result<Vec<T>>) -> Result<Vec<T>> {
    match result {
        Ok(rows) if rows.is_empty() => Err(Error::CriticalResource {
            resource: resource.to_string(),
            reason: "no data returned".to_string(),
        }),
        Ok(rows) => Ok(rows),
        Err(e) => Err(Error::CriticalResource {
            resource: resource.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Dashboard of one project with its social rankings
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub dashboard: ProjectDashboard,
    pub leaderboard: Leaderboard,
}

/// Per-platform rankings and the community table of one project
#[derive(Debug, Clone)]
pub struct LeaderboardView {
    pub window: DateWindow,
    pub leaderboard: Leaderboard,
    pub community: Vec<(RankIcon, CommunityMember)>,
}

/// Comparison of two projects on one metric
#[derive(Debug, Clone)]
pub struct ComparisonView {
    pub metrics: Vec<MetricInfo>,
    pub report: CompareReport,
}

/// Loads views from a `DataSource`
pub struct Loader<S> {
    source: S,
    deadline: Deadline,
    guard: ViewGuard,
}

impl<S: DataSource> Loader<S> {
    pub fn new(source: S, deadline: Deadline) -> Self {
        Self {
            source,
            deadline,
            guard: ViewGuard::new(),
        }
    }

    /// Historical metrics are critical; colors and rankings are not
    pub async fn load_dashboard(
        &self,
        project_id: &str,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> Result<DashboardView> {
        let ticket = self.guard.enter(project_id);
        let window = DateWindow::current(now);
        info!("Loading dashboard for {}", project_id);

        let (history, colors, leaderboard) = futures::join!(
            self.deadline
                .run("historical metrics", self.source.project_history(project_id)),
            self.deadline.run("color mapping", self.source.colors()),
            self.platform_boards(project_id, &window),
        );

        let history = critical("historical metrics", history)?;
        let colors = or_empty("color mapping", colors);
        let dashboard = ProjectDashboard::build(project_id, history, &colors, range, now);

        self.guard.accept(
            &ticket,
            DashboardView {
                dashboard,
                leaderboard,
            },
        )
    }

    /// Rankings never fail the view, they render as empty sections
    pub async fn load_leaderboard(
        &self,
        project_id: &str,
        now: DateTime<Utc>,
    ) -> Result<LeaderboardView> {
        let ticket = self.guard.enter(project_id);
        let window = DateWindow::current(now);
        debug!(
            "Loading rankings for {} from {} to {}",
            project_id, window.start_date, window.end_date
        );

        let (leaderboard, community) = futures::join!(
            self.platform_boards(project_id, &window),
            self.deadline
                .run("community leaderboard", self.source.community_members(project_id)),
        );
        let community = community_ranking(or_empty("community leaderboard", community));

        self.guard.accept(
            &ticket,
            LeaderboardView {
                window,
                leaderboard,
                community,
            },
        )
    }

    /// Metrics available for comparing two projects
    pub async fn load_metrics(
        &self,
        project1_id: &str,
        project2_id: &str,
    ) -> Result<Vec<MetricInfo>> {
        let ticket = self.guard.enter(&pair_identity(project1_id, project2_id));
        let (rows1, rows2) = self.histories(project1_id, project2_id).await?;
        self.guard.accept(&ticket, discover_metrics(&rows1, &rows2))
    }

    /// Both histories are critical; `metric` defaults to the first available
    pub async fn load_comparison(
        &self,
        project1_id: &str,
        project2_id: &str,
        metric: Option<&str>,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> Result<ComparisonView> {
        let ticket = self.guard.enter(&pair_identity(project1_id, project2_id));

        let (projects, histories) = futures::join!(
            self.deadline.run("projects", self.source.projects()),
            self.histories(project1_id, project2_id),
        );
        let projects = or_empty("projects", projects);
        let (rows1, rows2) = histories?;

        let metrics = discover_metrics(&rows1, &rows2);
        let metric = match metric {
            Some(key) if metrics.iter().any(|m| m.key == key && m.available) => {
                key.to_string()
            }
            Some(key) if metrics.iter().any(|m| m.key == key) => {
                return Err(Error::Validation(format!(
                    "Metric '{}' is recorded for only one of {} and {}",
                    key, project1_id, project2_id
                )))
            }
            Some(key) => {
                return Err(Error::Validation(format!(
                    "Metric '{}' is not recorded for {} or {}",
                    key, project1_id, project2_id
                )))
            }
            None => first_available(&metrics)
                .map(|m| m.key.clone())
                .ok_or_else(|| {
                    Error::Validation(format!(
                        "{} and {} share no metric",
                        project1_id, project2_id
                    ))
                })?,
        };
        debug!("Comparing {} and {} on {}", project1_id, project2_id, metric);

        let report = CompareReport::build(
            resolve_project(&projects, project1_id),
            &rows1,
            resolve_project(&projects, project2_id),
            &rows2,
            &metric,
            range,
            now,
        );

        self.guard.accept(&ticket, ComparisonView { metrics, report })
    }

    /// The project list is critical, latest metrics are not
    pub async fn load_overview(
        &self,
        favorites: &Favorites,
        search: &str,
        sort_by: SortBy,
    ) -> Result<Overview> {
        let ticket = self.guard.enter("overview");

        let (projects, latest) = futures::join!(
            self.deadline.run("projects", self.source.projects()),
            self.deadline.run("latest metrics", self.source.latest_rows()),
        );
        let projects = projects.map_err(|e| Error::CriticalResource {
            resource: "projects".to_string(),
            reason: e.to_string(),
        })?;
        let latest = or_empty("latest metrics", latest);
        let snapshots = latest_snapshots(&latest);

        self.guard.accept(
            &ticket,
            Overview::build(&projects, &snapshots, favorites, search, sort_by),
        )
    }

    async fn histories(
        &self,
        project1_id: &str,
        project2_id: &str,
    ) -> Result<(Vec<MetricRow>, Vec<MetricRow>)> {
        let (rows1, rows2) = futures::join!(
            self.deadline
                .run("historical metrics", self.source.project_history(project1_id)),
            self.deadline
                .run("historical metrics", self.source.project_history(project2_id)),
        );
        let rows1 = critical(&format!("historical metrics of {}", project1_id), rows1)?;
        let rows2 = critical(&format!("historical metrics of {}", project2_id), rows2)?;
        Ok((rows1, rows2))
    }

    async fn platform_boards(&self, project_id: &str, window: &DateWindow) -> Leaderboard {
        let requests = Platform::ALL.iter().map(|&platform| async move {
            let result = self
                .deadline
                .run(
                    platform.name(),
                    self.source.top_authors(platform, project_id, window),
                )
                .await;
            result.unwrap_or_else(|e| {
                warn!("{} leaderboard unavailable, showing it empty: {}", platform, e);
                PlatformBoard {
                    platform,
                    entries: Vec::new(),
                }
            })
        });

        Leaderboard::from_boards(join_all(requests).await)
    }
}

fn pair_identity(project1_id: &str, project2_id: &str) -> String {
    format!("{} vs {}", project1_id, project2_id)
}

/// Project metadata by id, falling back to the id as its name
fn resolve_project(projects: &[Project], id: &str) -> Project {
    projects
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .unwrap_or_else(|| Project {
            id: id.to_string(),
            name: id.to_string(),
            url: String::new(),
        })
}
