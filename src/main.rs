//! vidsync command-line interface.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use vidsync::config::{Config, Settings};
use vidsync::feeds::json::JsonFeedReader;
use vidsync::models::{Feed, Site, VideoStatus};
use vidsync::repository::{
    create_pool, migrations, DbPool, FeedRepository, ImportRepository, SiteRepository,
    VideoRepository,
};
use vidsync::services::{ImportHooks, ImportOptions, ImportService};

#[derive(Parser)]
#[command(name = "vidsync", version, about = "Video feed import and publication")]
struct Cli {
    /// Data directory override.
    #[arg(long, env = "VIDSYNC_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Explicit configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage feed subscriptions.
    #[command(subcommand)]
    Feed(FeedCommand),
    /// Run an import for a feed.
    Import {
        /// Feed id.
        feed: String,
    },
    /// List import runs for a feed.
    Runs {
        /// Feed id.
        feed: String,
    },
    /// Show the step log of an import run.
    Steps {
        /// Run id.
        run: i64,
    },
    /// List videos.
    Videos {
        /// Filter by status (unpublished, needs moderation, published, hidden).
        #[arg(long)]
        status: Option<String>,
        /// Filter by feed id.
        #[arg(long)]
        feed: Option<String>,
    },
    /// Publish a video.
    Publish {
        /// Video id.
        video: String,
    },
    /// Hide a video.
    Hide {
        /// Video id.
        video: String,
    },
}

#[derive(Subcommand)]
enum FeedCommand {
    /// Subscribe to a feed.
    Add {
        /// Feed URL (or path to a feed document).
        url: String,
        /// Display name.
        #[arg(long)]
        name: Option<String>,
        /// Require moderation before imported videos are published.
        #[arg(long)]
        moderate: bool,
        /// Walk the whole feed every run instead of stopping at the first
        /// previously-seen item.
        #[arg(long)]
        full_scan: bool,
        /// Owner email recorded on the feed and its videos.
        #[arg(long)]
        owner_email: Option<String>,
    },
    /// List feeds.
    List,
    /// Show one feed with its recent runs.
    Show {
        /// Feed id.
        id: String,
    },
    /// Delete a feed subscription.
    Remove {
        /// Feed id.
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli).await?;
    settings.ensure_directories()?;

    let pool = create_pool(&settings.database_path())
        .context("failed to open database connection pool")?;
    migrations::init_schema(pool.clone()).await?;

    match cli.command {
        Command::Feed(command) => run_feed_command(command, pool).await,
        Command::Import { feed } => run_import(&feed, pool, &settings).await,
        Command::Runs { feed } => list_runs(&feed, pool).await,
        Command::Steps { run } => list_steps(run, pool).await,
        Command::Videos { status, feed } => list_videos(status, feed, pool).await,
        Command::Publish { video } => set_video_status(&video, VideoStatus::Published, pool).await,
        Command::Hide { video } => set_video_status(&video, VideoStatus::Hidden, pool).await,
    }
}

async fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match cli.config.as_deref() {
        Some(path) => {
            let config = Config::from_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            let mut settings = Settings::default();
            config.apply_to_settings(&mut settings);
            settings
        }
        None => vidsync::config::load_settings().await,
    };
    if let Some(ref data_dir) = cli.data_dir {
        settings.data_dir = data_dir.clone();
    }
    Ok(settings)
}

async fn run_feed_command(command: FeedCommand, pool: DbPool) -> Result<()> {
    let feeds = FeedRepository::new(pool.clone());

    match command {
        FeedCommand::Add {
            url,
            name,
            moderate,
            full_scan,
            owner_email,
        } => {
            if feeds.find_by_url(&url).await?.is_some() {
                bail!("a feed for {url} already exists");
            }
            let mut feed = Feed::new(&url);
            if let Some(name) = name {
                feed.name = name;
                // An operator-provided name beats the source's.
                feed.update_metadata_next_import = false;
            }
            feed.moderate_imported_videos = moderate;
            feed.stop_if_seen = !full_scan;
            feed.owner_email = owner_email.unwrap_or_default();
            feeds.save(&feed).await?;
            println!("{} {}", style("added").green(), feed.id);
        }
        FeedCommand::List => {
            for feed in feeds.get_all().await? {
                println!(
                    "{}  {}  {}",
                    style(&feed.id).cyan(),
                    feed.original_url,
                    feed.name,
                );
            }
        }
        FeedCommand::Show { id } => {
            let feed = feeds
                .get(&id)
                .await?
                .with_context(|| format!("no feed {id}"))?;
            println!("{}", style(&feed.name).bold());
            println!("  id:        {}", feed.id);
            println!("  url:       {}", feed.original_url);
            println!("  web:       {}", feed.web_url);
            println!("  moderated: {}", feed.moderate_imported_videos);
            println!("  stop if seen: {}", feed.stop_if_seen);

            let imports = ImportRepository::new(pool);
            for run in imports.runs_for_feed(&feed.id).await?.into_iter().take(10) {
                println!(
                    "  run {}  {}  complete={}  {}",
                    run.id,
                    run.created_at.format("%Y-%m-%d %H:%M"),
                    run.is_complete,
                    run.summary(),
                );
            }
        }
        FeedCommand::Remove { id } => {
            if feeds.delete(&id).await? {
                println!("{} {}", style("removed").green(), id);
            } else {
                bail!("no feed {id}");
            }
        }
    }
    Ok(())
}

async fn run_import(feed_id: &str, pool: DbPool, settings: &Settings) -> Result<()> {
    let sites = SiteRepository::new(pool.clone());
    let default_site: Site = sites
        .ensure_default(&settings.site_domain, &settings.site_name)
        .await?;

    let reader = JsonFeedReader::new(
        &settings.user_agent,
        Duration::from_secs(settings.request_timeout),
    )?;
    let service = ImportService::new(
        pool,
        Arc::new(reader),
        ImportHooks::new(),
        ImportOptions {
            max_results: settings.max_results,
            api_keys: settings.api_keys.clone(),
            default_site,
        },
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    spinner.set_message(format!("importing feed {feed_id}"));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let run = service.start_import(feed_id).await?;
    spinner.finish_and_clear();

    let marker = if run.error_count > 0 {
        style("!").yellow()
    } else {
        style("✓").green()
    };
    println!("{} run {}: {}", marker, run.id, run.summary());
    Ok(())
}

async fn list_runs(feed_id: &str, pool: DbPool) -> Result<()> {
    let imports = ImportRepository::new(pool);
    for run in imports.runs_for_feed(feed_id).await? {
        println!(
            "{}  {}  complete={}  {}",
            style(run.id).cyan(),
            run.created_at.format("%Y-%m-%d %H:%M:%S"),
            run.is_complete,
            run.summary(),
        );
    }
    Ok(())
}

async fn list_steps(run_id: i64, pool: DbPool) -> Result<()> {
    let imports = ImportRepository::new(pool);
    for step in imports.steps_for_run(run_id).await? {
        let video = step.video_id.as_deref().unwrap_or("-");
        let failure = step.failure.lines().next().unwrap_or("");
        println!(
            "{}  {:16}  {}  {}",
            step.created_at.format("%H:%M:%S"),
            step.kind.as_str(),
            video,
            failure,
        );
    }
    Ok(())
}

async fn list_videos(
    status: Option<String>,
    feed: Option<String>,
    pool: DbPool,
) -> Result<()> {
    let status = match status.as_deref() {
        Some(raw) => Some(
            VideoStatus::from_str(raw)
                .with_context(|| format!("unknown status {raw:?}"))?,
        ),
        None => None,
    };

    let videos = VideoRepository::new(pool);
    for video in videos.list(status, feed.as_deref()).await? {
        println!(
            "{}  {:16}  {}",
            style(&video.id).cyan(),
            video.status.as_str(),
            video.name,
        );
    }
    Ok(())
}

async fn set_video_status(video_id: &str, status: VideoStatus, pool: DbPool) -> Result<()> {
    let videos = VideoRepository::new(pool);
    let mut video = videos
        .get(video_id)
        .await?
        .with_context(|| format!("no video {video_id}"))?;
    video.set_status(status);
    videos.save(&video).await?;
    println!(
        "{} {} is now {}",
        style("✓").green(),
        video.id,
        status.as_str(),
    );
    Ok(())
}
