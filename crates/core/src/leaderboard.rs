//! Per-platform leaderboards of top community contributors
//!
//! Rankings arrive already ordered by the remote procedures. Locally we only
//! drop empty platforms, assign position badges and page between platforms.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::data::{CommunityMember, GitHubAuthor, MessageAuthor, TwitterAuthor};
use crate::error::Error;

/// Minimum horizontal drag distance, in pixels, that switches pages
pub const DRAG_THRESHOLD_PX: f64 = 50.0;

/// UI color theme, selects icon variants
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Social platform with a leaderboard
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Discord,
    Telegram,
    GitHub,
}

impl Platform {
    /// Display order of the paged view
    pub const ALL: [Platform; 4] = [
        Platform::Twitter,
        Platform::Discord,
        Platform::Telegram,
        Platform::GitHub,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Discord => "discord",
            Platform::Telegram => "telegram",
            Platform::GitHub => "github",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Platform::Twitter => "Twitter",
            Platform::Discord => "Discord",
            Platform::Telegram => "Telegram",
            Platform::GitHub => "GitHub",
        }
    }

    /// Remote procedure returning the ranked authors
    pub fn rpc_function(&self) -> &'static str {
        match self {
            Platform::Twitter => "get_top_twitter_authors",
            Platform::Discord => "get_top_discord_authors",
            Platform::Telegram => "get_top_telegram_authors",
            Platform::GitHub => "get_top_github_authors",
        }
    }

    /// Logo asset; dark themes use the light artwork
    pub fn logo(&self, theme: Theme) -> &'static str {
        match (self, theme) {
            (Platform::Twitter, Theme::Dark) => "/x-logo-light.svg",
            (Platform::Twitter, Theme::Light) => "/x-logo-dark.svg",
            (Platform::Discord, Theme::Dark) => "/discord-logo-light.svg",
            (Platform::Discord, Theme::Light) => "/discord-logo-dark.svg",
            (Platform::Telegram, Theme::Dark) => "/telegram-light.svg",
            (Platform::Telegram, Theme::Light) => "/telegram-dark.svg",
            (Platform::GitHub, Theme::Dark) => "/github-light.svg",
            (Platform::GitHub, Theme::Light) => "/github-dark.svg",
        }
    }

    /// Placeholder avatar for platforms whose avatar URLs often fail
    pub fn fallback_avatar(&self) -> Option<&'static str> {
        match self {
            Platform::Twitter => Some("/twitter_pfp.png"),
            Platform::Telegram => Some("/telegram_pfp.png"),
            Platform::Discord | Platform::GitHub => None,
        }
    }

    /// Directory serving avatars stored as bare file names
    pub fn avatar_dir(&self) -> Option<&'static str> {
        match self {
            Platform::Discord => Some("/discord_avatar"),
            _ => None,
        }
    }

    /// Avatar to show, falling back to the placeholder when none is known
    pub fn avatar(&self, avatar: &str) -> String {
        let avatar = avatar.trim();
        if avatar.is_empty() {
            return self.fallback_avatar().unwrap_or_default().to_string();
        }
        match self.avatar_dir() {
            Some(dir) => format!("{}/{}", dir, avatar.trim_start_matches('/')),
            None => avatar.to_string(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("x") {
            return Ok(Platform::Twitter);
        }
        Platform::ALL
            .into_iter()
            .find(|p| p.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownPlatform(s.to_string()))
    }
}

/// Interaction icon assets for Twitter rows
pub fn interaction_icon(kind: &str, theme: Theme) -> String {
    match theme {
        Theme::Dark => format!("/{}-light.svg", kind),
        Theme::Light => format!("/{}.svg", kind),
    }
}

/// Platform-specific activity counters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Activity {
    Twitter {
        posts: u64,
        likes: u64,
        retweets: u64,
        comments: u64,
        quotes: u64,
    },
    Messages {
        total: u64,
    },
    Commits {
        total: u64,
    },
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activity::Twitter {
                posts,
                likes,
                retweets,
                comments,
                ..
            } => write!(
                f,
                "Posts: {} | Likes: {} | Retweets: {} | Comments: {}",
                posts, likes, retweets, comments
            ),
            Activity::Messages { total } => write!(f, "Messages: {}", total),
            Activity::Commits { total } => write!(f, "Commits: {}", total),
        }
    }
}

/// One author on a platform leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub author_id: String,
    pub author: String,
    pub avatar: String,
    pub activity: Activity,
}

impl From<TwitterAuthor> for LeaderboardEntry {
    fn from(a: TwitterAuthor) -> Self {
        Self {
            author_id: a.author_id,
            author: a.author,
            avatar: a.avatar,
            activity: Activity::Twitter {
                posts: a.posts,
                likes: a.total_likes,
                retweets: a.total_retweet,
                comments: a.total_comment,
                quotes: a.total_quotes,
            },
        }
    }
}

impl From<MessageAuthor> for LeaderboardEntry {
    fn from(a: MessageAuthor) -> Self {
        Self {
            author_id: a.author_id,
            author: a.author,
            avatar: a.avatar,
            activity: Activity::Messages {
                total: a.total_message,
            },
        }
    }
}

impl From<GitHubAuthor> for LeaderboardEntry {
    fn from(a: GitHubAuthor) -> Self {
        Self {
            author_id: a.author_id,
            author: a.author,
            avatar: a.avatar,
            activity: Activity::Commits {
                total: a.total_commits,
            },
        }
    }
}

/// Position badge shown next to an author
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Badge {
    Gold,
    Silver,
    Bronze,
    Rank(usize),
}

impl Badge {
    /// Badge for a 1-based position
    pub fn for_position(position: usize) -> Self {
        match position {
            1 => Badge::Gold,
            2 => Badge::Silver,
            3 => Badge::Bronze,
            n => Badge::Rank(n),
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Badge::Gold => f.write_str("🥇"),
            Badge::Silver => f.write_str("🥈"),
            Badge::Bronze => f.write_str("🥉"),
            Badge::Rank(n) => write!(f, "#{}", n),
        }
    }
}

/// Ranked authors of one platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformBoard {
    pub platform: Platform,
    pub entries: Vec<LeaderboardEntry>,
}

impl PlatformBoard {
    pub fn new<T: Into<LeaderboardEntry>>(platform: Platform, authors: Vec<T>) -> Self {
        Self {
            platform,
            entries: authors.into_iter().map(Into::into).collect(),
        }
    }

    /// Entries with their badge, in remote order
    pub fn ranked(&self) -> impl Iterator<Item = (Badge, &LeaderboardEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (Badge::for_position(i + 1), entry))
    }

    /// Text rendering of the board
    pub fn render(&self) -> String {
        let mut lines = vec![format!("### {}\n", self.platform)];
        for (badge, entry) in self.ranked() {
            lines.push(format!(
                "{} {} ({}) - {}",
                badge, entry.author, entry.author_id, entry.activity
            ));
        }
        lines.join("\n")
    }
}

/// All platform boards of a project, empty platforms dropped
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Leaderboard {
    pub boards: Vec<PlatformBoard>,
}

impl Leaderboard {
    /// Assemble from independently fetched rankings
    pub fn new(
        twitter: Vec<TwitterAuthor>,
        discord: Vec<MessageAuthor>,
        telegram: Vec<MessageAuthor>,
        github: Vec<GitHubAuthor>,
    ) -> Self {
        Self::from_boards(vec![
            PlatformBoard::new(Platform::Twitter, twitter),
            PlatformBoard::new(Platform::Discord, discord),
            PlatformBoard::new(Platform::Telegram, telegram),
            PlatformBoard::new(Platform::GitHub, github),
        ])
    }

    pub fn from_boards(boards: Vec<PlatformBoard>) -> Self {
        Self {
            boards: boards.into_iter().filter(|b| !b.entries.is_empty()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    pub fn platforms(&self) -> Vec<Platform> {
        self.boards.iter().map(|b| b.platform).collect()
    }

    pub fn board(&self, platform: Platform) -> Option<&PlatformBoard> {
        self.boards.iter().find(|b| b.platform == platform)
    }

    pub fn index_of(&self, platform: Platform) -> Option<usize> {
        self.boards.iter().position(|b| b.platform == platform)
    }
}

/// Horizontally paged view over the visible platforms
///
/// Offsets are percentages of the viewport width, the active page sits at
/// `-current * 100`.
#[derive(Debug, Clone, PartialEq)]
pub struct Carousel {
    current: usize,
    len: usize,
    drag_start: Option<f64>,
    translate: f64,
}

impl Carousel {
    pub fn new(len: usize) -> Self {
        Self {
            current: 0,
            len,
            drag_start: None,
            translate: 0.0,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn translate(&self) -> f64 {
        self.translate
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_start.is_some()
    }

    /// Update the page count; an out-of-range page resets to the first
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if self.current >= len {
            self.go_to(0);
        }
    }

    /// Jump to a page; indices outside the view are ignored
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.go_to(index);
        true
    }

    pub fn drag_start(&mut self, x: f64) {
        self.drag_start = Some(x);
    }

    /// Follow the pointer while dragging
    pub fn drag_move(&mut self, x: f64, viewport_width: f64) {
        let Some(start) = self.drag_start else {
            return;
        };
        let drift = if viewport_width > 0.0 {
            (x - start) / viewport_width * 100.0
        } else {
            0.0
        };
        self.translate = self.resting_offset() + drift;
    }

    /// Finish a drag: move one page past the threshold if in bounds, else snap back
    pub fn drag_end(&mut self, x: f64) -> usize {
        let Some(start) = self.drag_start.take() else {
            return self.current;
        };
        let diff = x - start;

        let target = if diff.abs() > DRAG_THRESHOLD_PX {
            if diff > 0.0 && self.current > 0 {
                self.current - 1
            } else if diff < 0.0 && self.current + 1 < self.len {
                self.current + 1
            } else {
                self.current
            }
        } else {
            self.current
        };

        self.go_to(target);
        self.current
    }

    fn go_to(&mut self, index: usize) {
        self.current = index;
        self.translate = self.resting_offset();
    }

    fn resting_offset(&self) -> f64 {
        -(self.current as f64) * 100.0
    }
}

/// Icon for a precomputed community leaderboard rank
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RankIcon {
    Trophy,
    Medal,
    Award,
    Number(u32),
}

impl RankIcon {
    pub fn for_rank(rank: u32) -> Self {
        match rank {
            1 => RankIcon::Trophy,
            2 => RankIcon::Medal,
            3 => RankIcon::Award,
            n => RankIcon::Number(n),
        }
    }
}

impl fmt::Display for RankIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankIcon::Trophy => f.write_str("🏆"),
            RankIcon::Medal => f.write_str("🏅"),
            RankIcon::Award => f.write_str("🎖"),
            RankIcon::Number(n) => write!(f, "#{}", n),
        }
    }
}

/// Community members ordered by their precomputed rank
pub fn community_ranking(mut members: Vec<CommunityMember>) -> Vec<(RankIcon, CommunityMember)> {
    members.sort_by_key(|m| m.rank);
    members
        .into_iter()
        .map(|m| (RankIcon::for_rank(m.rank), m))
        .collect()
}
