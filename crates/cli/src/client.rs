//! Remote query service integration

use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use mopsos_core::leaderboard::PlatformBoard;
use mopsos_core::{
    ColorMapping, CommunityMember, DateWindow, GitHubAuthor, MessageAuthor, MetricRow, Platform,
    Project, TwitterAuthor,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

/// Table holding tracked projects
pub const PROJECT_TABLE: &str = "project";
/// Table holding per-day metric rows
pub const DATA_TABLE: &str = "data";
/// Table holding metric colors
pub const COLOR_TABLE: &str = "color";
/// Table holding the precomputed community ranking
pub const LEADERBOARD_TABLE: &str = "leaderboard";

/// Columns read for the overview's latest metrics
pub const OVERVIEW_COLUMNS: &str =
    "id,twitter_user,discord_user,telegram_user,closing_price,return,twitter_post,date";

/// Everything a view can ask the backend for
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Displayable projects ordered by name
    async fn projects(&self) -> Result<Vec<Project>>;

    /// All metric rows of one project, oldest first
    async fn project_history(&self, project_id: &str) -> Result<Vec<MetricRow>>;

    /// Headline metric rows of every project, newest first
    async fn latest_rows(&self) -> Result<Vec<MetricRow>>;

    async fn colors(&self) -> Result<Vec<ColorMapping>>;

    /// Ranked authors of one platform over `window`
    async fn top_authors(
        &self,
        platform: Platform,
        project_id: &str,
        window: &DateWindow,
    ) -> Result<PlatformBoard>;

    /// Precomputed community ranking, ordered by rank
    async fn community_members(&self, project_id: &str) -> Result<Vec<CommunityMember>>;
}

/// Client for the PostgREST-style query service
pub struct RemoteClient {
    client: reqwest::Client,
    base: Url,
}

impl RemoteClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("mopsos"));

        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| Error::Validation("Invalid API key format".to_string()))?;
        api_key.set_sensitive(true);
        headers.insert(HeaderName::from_static("apikey"), api_key);

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| Error::Validation("Invalid API key format".to_string()))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base: with_trailing_slash(&config.api_url),
        })
    }

    /// Absolute URL of a service path such as `rest/v1/data`
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let url = self.endpoint(&format!("rest/v1/{}", table))?;
        debug!("Querying {} with {:?}", table, query);

        let rows = self
            .client
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Api(format!("Failed to query {}: {}", table, e)))?
            .json()
            .await?;

        Ok(rows)
    }

    async fn rpc<T: DeserializeOwned, P: Serialize + Sync>(
        &self,
        function: &str,
        params: &P,
    ) -> Result<Vec<T>> {
        let url = self.endpoint(&format!("rest/v1/rpc/{}", function))?;
        debug!("Calling {}", function);

        let rows = self
            .client
            .post(url)
            .json(params)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Api(format!("Failed to call {}: {}", function, e)))?
            .json()
            .await?;

        Ok(rows)
    }
}

#[async_trait]
impl DataSource for RemoteClient {
    async fn projects(&self) -> Result<Vec<Project>> {
        self.select(
            PROJECT_TABLE,
            &[
                ("select", "*".to_string()),
                ("display", "neq.false".to_string()),
                ("order", "name.asc".to_string()),
            ],
        )
        .await
    }

    async fn project_history(&self, project_id: &str) -> Result<Vec<MetricRow>> {
        self.select(
            DATA_TABLE,
            &[
                ("select", "*".to_string()),
                ("id", format!("eq.{}", project_id)),
                ("order", "date.asc".to_string()),
            ],
        )
        .await
    }

    async fn latest_rows(&self) -> Result<Vec<MetricRow>> {
        self.select(
            DATA_TABLE,
            &[
                ("select", OVERVIEW_COLUMNS.to_string()),
                ("order", "date.desc".to_string()),
            ],
        )
        .await
    }

    async fn colors(&self) -> Result<Vec<ColorMapping>> {
        self.select(COLOR_TABLE, &[("select", "*".to_string())]).await
    }

    async fn top_authors(
        &self,
        platform: Platform,
        project_id: &str,
        window: &DateWindow,
    ) -> Result<PlatformBoard> {
        let params = RankingParams {
            project_id,
            start_date: &window.start_date,
            end_date: &window.end_date,
        };
        let function = platform.rpc_function();

        let board = match platform {
            Platform::Twitter => {
                PlatformBoard::new(platform, self.rpc::<TwitterAuthor, _>(function, &params).await?)
            }
            Platform::Discord | Platform::Telegram => {
                PlatformBoard::new(platform, self.rpc::<MessageAuthor, _>(function, &params).await?)
            }
            Platform::GitHub => {
                PlatformBoard::new(platform, self.rpc::<GitHubAuthor, _>(function, &params).await?)
            }
        };

        Ok(board)
    }

    async fn community_members(&self, project_id: &str) -> Result<Vec<CommunityMember>> {
        self.select(
            LEADERBOARD_TABLE,
            &[
                ("select", "*".to_string()),
                ("id", format!("eq.{}", project_id)),
                ("order", "rank.asc".to_string()),
            ],
        )
        .await
    }
}

/// Body of the ranking procedures
#[derive(Debug, Serialize)]
struct RankingParams<'a> {
    project_id: &'a str,
    start_date: &'a str,
    end_date: &'a str,
}

/// `Url::join` replaces the last segment unless the base ends with `/`
fn with_trailing_slash(url: &Url) -> Url {
    let mut base = url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}
