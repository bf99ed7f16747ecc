//! mopsos CLI - Crypto social analytics from the command line

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info, warn};

mod client;
mod config;
mod error;
mod loader;
mod store;

use client::RemoteClient;
use config::{Config, DEFAULT_FAVORITES_FILE, DEFAULT_TIMEOUT_SECS};
use loader::{Deadline, Loader};
use mopsos_core::leaderboard::{interaction_icon, Theme};
use mopsos_core::metrics::toggle_selection;
use mopsos_core::subscription::Quote;
use mopsos_core::{Carousel, Favorites, Platform, SortBy, TimeRange};
use store::FileStore;

/// mopsos: Social analytics for crypto projects
#[derive(Parser, Debug)]
#[command(name = "mopsos")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Base URL of the query service
    #[arg(long, global = true, env = "MOPSOS_API_URL")]
    api_url: Option<String>,

    /// Public API key of the query service
    #[arg(long, global = true, env = "MOPSOS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Deadline applied to every request
    #[arg(long, global = true, env = "MOPSOS_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// File holding favorites and other local preferences
    #[arg(long, global = true, env = "MOPSOS_FAVORITES_FILE")]
    favorites_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List tracked projects with their latest community size
    Projects(ProjectsArgs),
    /// Show the dashboard of one project
    Dashboard(DashboardArgs),
    /// List the metrics two projects can be compared on
    Metrics(MetricsArgs),
    /// Compare two projects on one metric
    Compare(CompareArgs),
    /// Show per-platform rankings of one project
    Leaderboard(LeaderboardArgs),
    /// Add or remove a project from favorites
    Favorite(FavoriteArgs),
    /// List favorite projects
    Favorites,
    /// Price an API subscription
    Quote(QuoteArgs),
}

#[derive(Parser, Debug)]
struct ProjectsArgs {
    /// Case-insensitive filter on project name
    #[arg(short, long, default_value = "")]
    search: String,

    /// name, twitter, discord, telegram or price
    #[arg(long, default_value = "name")]
    sort: SortBy,

    #[arg(long, default_value = "markdown")]
    format: String,
}

#[derive(Parser, Debug)]
struct DashboardArgs {
    project: String,

    /// 30d, 90d, 1y or all
    #[arg(short, long, default_value = "all")]
    range: TimeRange,

    /// Metrics to chart instead of the default selection
    #[arg(short, long, value_delimiter = ',')]
    metrics: Vec<String>,

    /// Add or remove metrics from the charted selection
    #[arg(long, value_delimiter = ',')]
    toggle: Vec<String>,

    /// History rows to print
    #[arg(long, default_value = "10")]
    rows: usize,
}

#[derive(Parser, Debug)]
struct MetricsArgs {
    project1: String,
    project2: String,
}

#[derive(Parser, Debug)]
struct CompareArgs {
    project1: String,
    project2: String,

    /// Metric key, defaults to the first one both projects record
    #[arg(short, long)]
    metric: Option<String>,

    /// 30d, 90d, 1y or all
    #[arg(short, long, default_value = "all")]
    range: TimeRange,

    /// markdown, json or text
    #[arg(long, default_value = "markdown")]
    format: String,
}

#[derive(Parser, Debug)]
struct LeaderboardArgs {
    project: String,

    /// Platform to open on (twitter, x, discord, telegram, github)
    #[arg(short, long)]
    platform: Option<Platform>,

    /// Print every platform instead of one page
    #[arg(long, default_value = "false")]
    all: bool,

    /// Include the precomputed community ranking
    #[arg(long, default_value = "false")]
    community: bool,

    /// Use dark theme assets in json output
    #[arg(long, default_value = "false")]
    dark: bool,

    #[arg(long, default_value = "markdown")]
    format: String,
}

#[derive(Parser, Debug)]
struct FavoriteArgs {
    project: String,
}

#[derive(Parser, Debug)]
struct QuoteArgs {
    /// Subscription length; non-digits are ignored
    #[arg(short, long)]
    months: String,

    /// Price of one month in the chain's native token
    #[arg(long)]
    unit_price: f64,

    #[arg(long, default_value = "MATIC")]
    symbol: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    match &cli.command {
        Commands::Projects(args) => projects_command(&cli, args).await,
        Commands::Dashboard(args) => dashboard_command(&cli, args).await,
        Commands::Metrics(args) => metrics_command(&cli, args).await,
        Commands::Compare(args) => compare_command(&cli, args).await,
        Commands::Leaderboard(args) => leaderboard_command(&cli, args).await,
        Commands::Favorite(args) => favorite_command(&cli, args),
        Commands::Favorites => favorites_command(&cli),
        Commands::Quote(args) => quote_command(args),
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let api_url = cli
        .api_url
        .as_deref()
        .context("No API URL given, pass --api-url or set MOPSOS_API_URL")?;
    let api_key = cli
        .api_key
        .as_deref()
        .context("No API key given, pass --api-key or set MOPSOS_API_KEY")?;

    Config::new(api_url, api_key, cli.timeout_secs).context("Invalid configuration")
}

fn connect(cli: &Cli) -> Result<Loader<RemoteClient>> {
    let config = load_config(cli)?;
    debug!(
        "Using {} with a {:?} deadline",
        config.api_url, config.timeout
    );

    let client = RemoteClient::new(&config).context("Failed to create API client")?;
    Ok(Loader::new(client, Deadline::new(config.timeout)))
}

fn open_store(cli: &Cli) -> Result<FileStore> {
    let path = cli
        .favorites_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FAVORITES_FILE));
    config::validate_favorites_file(&path).context("Invalid favorites file")?;
    Ok(FileStore::new(path))
}

async fn projects_command(cli: &Cli, args: &ProjectsArgs) -> Result<()> {
    let loader = connect(cli)?;
    let store = open_store(cli)?;
    let favorites = Favorites::load(&store)
        .with_context(|| format!("Failed to read favorites from {:?}", store.path()))?;

    let overview = loader
        .load_overview(&favorites, &args.search, args.sort)
        .await
        .context("Could not load projects, re-run the command to retry")?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&overview)?),
        _ => println!("{}", overview.summary()),
    }

    Ok(())
}

async fn dashboard_command(cli: &Cli, args: &DashboardArgs) -> Result<()> {
    let loader = connect(cli)?;

    let mut view = loader
        .load_dashboard(&args.project, args.range, Utc::now())
        .await
        .with_context(|| {
            format!(
                "Could not load the dashboard of {}, re-run the command to retry",
                args.project
            )
        })?;

    let dashboard = &mut view.dashboard;
    if !args.metrics.is_empty() {
        dashboard.select(&args.metrics);
    }
    for key in &args.toggle {
        if dashboard.metrics.iter().any(|m| &m.key == key) {
            toggle_selection(&mut dashboard.selected, key);
        } else {
            warn!("{} has no metric named {}", args.project, key);
        }
    }

    println!("{}", dashboard.summary(args.rows));

    if view.leaderboard.is_empty() {
        println!("\nNo leaderboard data in the last 30 days.");
    }
    for board in &view.leaderboard.boards {
        println!("\n{}", board.render());
    }

    Ok(())
}

async fn metrics_command(cli: &Cli, args: &MetricsArgs) -> Result<()> {
    let loader = connect(cli)?;

    let metrics = loader
        .load_metrics(&args.project1, &args.project2)
        .await
        .context("Could not load project history, re-run the command to retry")?;

    println!("| Metric | Key | Comparable |");
    println!("|--------|-----|------------|");
    for metric in &metrics {
        let comparable = if metric.available { "yes" } else { "no" };
        println!("| {} | {} | {} |", metric.name, metric.key, comparable);
    }

    Ok(())
}

async fn compare_command(cli: &Cli, args: &CompareArgs) -> Result<()> {
    let loader = connect(cli)?;
    info!("Comparing {} with {}", args.project1, args.project2);

    let view = loader
        .load_comparison(
            &args.project1,
            &args.project2,
            args.metric.as_deref(),
            args.range,
            Utc::now(),
        )
        .await
        .context("Could not compare projects, re-run the command to retry")?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&view.report)?),
        "text" => println!("{}", view.report.short_summary()),
        _ => println!("{}", view.report.summary()),
    }

    let unavailable: Vec<&str> = view
        .metrics
        .iter()
        .filter(|m| !m.available)
        .map(|m| m.key.as_str())
        .collect();
    if !unavailable.is_empty() {
        debug!("Recorded for only one project: {}", unavailable.join(", "));
    }

    Ok(())
}

async fn leaderboard_command(cli: &Cli, args: &LeaderboardArgs) -> Result<()> {
    let loader = connect(cli)?;
    let view = loader.load_leaderboard(&args.project, Utc::now()).await?;
    let theme = if args.dark { Theme::Dark } else { Theme::Light };

    let mut carousel = Carousel::new(view.leaderboard.boards.len());
    if let Some(platform) = args.platform {
        match view.leaderboard.index_of(platform) {
            Some(index) => {
                carousel.select(index);
            }
            None => warn!("No {} activity for {}", platform, args.project),
        }
    }

    let boards: Vec<_> = if args.all {
        view.leaderboard.boards.iter().collect()
    } else {
        view.leaderboard.boards.get(carousel.current()).into_iter().collect()
    };

    if args.format == "json" {
        let boards: Vec<serde_json::Value> = boards
            .iter()
            .map(|board| {
                let entries: Vec<serde_json::Value> = board
                    .ranked()
                    .map(|(badge, entry)| {
                        serde_json::json!({
                            "badge": badge.to_string(),
                            "author": entry.author,
                            "author_id": entry.author_id,
                            "avatar": board.platform.avatar(&entry.avatar),
                            "activity": entry.activity,
                        })
                    })
                    .collect();
                serde_json::json!({
                    "platform": board.platform,
                    "logo": board.platform.logo(theme),
                    "entries": entries,
                })
            })
            .collect();
        let community: Vec<serde_json::Value> = if args.community {
            view.community
                .iter()
                .map(|(icon, member)| serde_json::json!({"icon": icon.to_string(), "member": member}))
                .collect()
        } else {
            Vec::new()
        };
        let icons: Vec<String> = ["like", "retweet", "comment", "quote"]
            .iter()
            .map(|kind| interaction_icon(kind, theme))
            .collect();
        let output = serde_json::json!({
            "project": args.project,
            "start_date": view.window.start_date,
            "end_date": view.window.end_date,
            "interaction_icons": icons,
            "boards": boards,
            "community": community,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "## {} leaderboard ({} to {})\n",
        args.project, view.window.start_date, view.window.end_date
    );
    if view.leaderboard.is_empty() {
        println!("No activity recorded in this window, re-run the command to retry.");
    } else {
        for board in &boards {
            println!("{}\n", board.render());
        }
        if !args.all {
            let pages: Vec<&str> = view
                .leaderboard
                .platforms()
                .iter()
                .map(|p| p.name())
                .collect();
            println!(
                "Page {}/{}: {}",
                carousel.current() + 1,
                carousel.len(),
                pages.join(" | ")
            );
        }
    }

    if args.community {
        println!("\n### Community\n");
        if view.community.is_empty() {
            println!("No community ranking available.");
        }
        for (icon, member) in &view.community {
            println!(
                "{} {} - {} posts, {} likes, {} retweets, {} comments, {} quotes",
                icon,
                member.author,
                member.post,
                member.like,
                member.retweet,
                member.comment,
                member.quote
            );
        }
    }

    Ok(())
}

fn favorite_command(cli: &Cli, args: &FavoriteArgs) -> Result<()> {
    let mut store = open_store(cli)?;
    let mut favorites = Favorites::load(&store)
        .with_context(|| format!("Failed to read favorites from {:?}", store.path()))?;

    let now_favorite = favorites
        .toggle_in(&mut store, &args.project)
        .with_context(|| format!("Failed to save favorites to {:?}", store.path()))?;

    if now_favorite {
        println!("★ {} added to favorites", args.project);
    } else {
        println!("☆ {} removed from favorites", args.project);
    }

    Ok(())
}

fn favorites_command(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let favorites = Favorites::load(&store)
        .with_context(|| format!("Failed to read favorites from {:?}", store.path()))?;

    if favorites.ids().is_empty() {
        println!("No favorites yet, add one with `mopsos favorite <project>`.");
    }
    for id in favorites.ids() {
        println!("★ {}", id);
    }

    Ok(())
}

fn quote_command(args: &QuoteArgs) -> Result<()> {
    let quote = Quote::from_input(&args.months, args.unit_price)?;
    println!(
        "{} month(s) at {:.2} {} each",
        quote.months, quote.unit_price, args.symbol
    );
    println!("Total price: {}", quote.display_total(&args.symbol));
    Ok(())
}
