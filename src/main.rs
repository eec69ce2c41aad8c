use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;

use cragfeed::app::{App, AppEvent};
use cragfeed::config::{AreaEntry, Config};
use cragfeed::feed::{load_feed, FeedExtractor, FeedSnapshot};
use cragfeed::ui;

/// Get the config directory path (~/.config/cragfeed/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("cragfeed"))
}

#[derive(Parser, Debug)]
#[command(
    name = "cragfeed",
    about = "Terminal viewer for Mountain Project climbing activity feeds"
)]
struct Args {
    /// Area id to show (overrides `default_area`)
    #[arg(long, value_name = "ID")]
    area: Option<u64>,

    /// Exclude new routes
    #[arg(long)]
    no_routes: bool,

    /// Exclude new areas
    #[arg(long)]
    no_areas: bool,

    /// Exclude comments
    #[arg(long)]
    no_comments: bool,

    /// Exclude photos
    #[arg(long)]
    no_photos: bool,

    /// Read a saved RSS document instead of fetching
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Print the extracted feed as JSON and exit
    #[arg(long)]
    json: bool,

    /// Config file (default: ~/.config/cragfeed/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Args {
    /// Applies command-line overrides on top of the file configuration.
    fn apply(&self, config: &mut Config) {
        if let Some(id) = self.area {
            config.default_area = Some(id);
            if !config.areas.iter().any(|a| a.id == id) {
                config.areas.push(AreaEntry {
                    id,
                    name: format!("Area {id}"),
                });
            }
        }
        config.include_routes &= !self.no_routes;
        config.include_areas &= !self.no_areas;
        config.include_comments &= !self.no_comments;
        config.include_photos &= !self.no_photos;
    }
}

/// Plain-text listing used for `--file` without `--json`.
fn print_summary(snapshot: &FeedSnapshot) {
    let now = Utc::now();
    println!("{}", snapshot.channel.title);
    for item in &snapshot.items {
        let when = ui::format_relative_time(item.published_at, now);
        println!("{:<10} {:>8}  {}", item.kind.label(), when, item.display_title());
    }
}

fn emit(snapshot: &FeedSnapshot, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(snapshot).context("Failed to serialize feed")?;
        println!("{}", out);
    } else {
        print_summary(snapshot);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; the TUI owns stdout.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_dir()?.join("config.toml"),
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    args.apply(&mut config);

    // Offline extraction of a saved document
    if let Some(path) = &args.file {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read feed file: {}", path.display()))?;
        let snapshot = FeedExtractor::new(config.extract_options())
            .extract(&raw)
            .with_context(|| format!("Failed to parse feed file: {}", path.display()))?;
        return emit(&snapshot, args.json);
    }

    let mut app = App::new(&config).context("Failed to create application")?;

    if args.json {
        let snapshot = load_feed(
            &app.http_client,
            &app.fetch_settings,
            &app.current_query(),
            &app.extractor,
        )
        .await
        .context("Failed to load feed")?;
        return emit(&snapshot, true);
    }

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);
    ui::run(&mut app, event_tx, event_rx).await?;
    Ok(())
}
