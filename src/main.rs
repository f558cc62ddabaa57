mod config;
mod db;
mod error;
mod fetch;
mod models;
mod parser;
mod pipeline;
mod pool;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Settings;
use crate::db::Entity;
use crate::fetch::HttpFetcher;
use crate::pipeline::{Pipeline, RunSummary};

#[derive(Parser)]
#[command(name = "bref_scraper", about = "Sports-reference team, roster and stats scraper")]
struct Cli {
    /// Settings file (default: bref.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Season year used in roster, league and game-log URLs
    #[arg(long, global = true)]
    season: Option<u16>,

    /// Concurrent fetch workers
    #[arg(short = 'w', long, global = true)]
    workers: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Populate the teams table from the teams index
    Teams,
    /// Fetch every stored team's roster and insert new players
    Rosters,
    /// Populate players from the basketball league totals listing
    League,
    /// Fetch career batting totals for non-pitchers without them
    Careers,
    /// Fetch per-game logs for players without game rows
    Gamelogs,
    /// Fill missing secondary-site player ids by name
    Enrich,
    /// teams → rosters → careers in one go
    Run,
    /// Show row counts per table
    Counts {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref())?;
        if let Some(db) = &self.db {
            settings.db_path.clone_from(db);
        }
        if let Some(season) = self.season {
            settings.season = season;
        }
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = cli.settings()?;

    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, finishing in-flight pages");
                cancel.cancel();
            }
        });
    }

    info!(
        "Season {} | {} workers | db {:?}",
        settings.season, settings.workers, settings.db_path
    );
    let pipeline = Pipeline::new(HttpFetcher::new(&settings)?, settings, cancel);

    let result = match cli.command {
        Commands::Teams => pipeline.populate_teams_table(&conn).await.map(|s| report("Teams", &s)),
        Commands::Rosters => pipeline.populate_rosters(&conn).await.map(|s| report("Players", &s)),
        Commands::League => pipeline.populate_league(&conn).await.map(|s| report("Players", &s)),
        Commands::Careers => pipeline.scrape_careers(&conn).await.map(|s| report("Career stats", &s)),
        Commands::Gamelogs => pipeline
            .scrape_game_logs(&conn)
            .await
            .map(|s| report("Game stats", &s)),
        Commands::Enrich => pipeline
            .enrich_secondary_ids(&conn)
            .await
            .map(|s| report("Secondary ids", &s)),
        Commands::Run => run_all(&pipeline, &conn).await,
        Commands::Counts { json } => print_counts(&conn, json),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run_all(pipeline: &Pipeline<HttpFetcher>, conn: &Connection) -> Result<()> {
    let t_teams = Instant::now();
    let teams = pipeline.populate_teams_table(conn).await?;
    report("Teams", &teams);
    println!("  in {:.1}s", t_teams.elapsed().as_secs_f64());

    let t_rosters = Instant::now();
    let players = pipeline.populate_rosters(conn).await?;
    report("Players", &players);
    println!("  in {:.1}s", t_rosters.elapsed().as_secs_f64());

    let t_careers = Instant::now();
    let careers = pipeline.scrape_careers(conn).await?;
    report("Career stats", &careers);
    println!("  in {:.1}s", t_careers.elapsed().as_secs_f64());
    Ok(())
}

fn report(what: &str, summary: &RunSummary) {
    println!("{}: {}", what, summary);
    if !summary.warnings.is_empty() {
        println!("\n--- Failures ({}) ---", summary.warnings.len());
        for w in summary.warnings.iter().take(20) {
            println!("  {}", w);
        }
        if summary.warnings.len() > 20 {
            println!("  ... and {} more", summary.warnings.len() - 20);
        }
    }
}

fn print_counts(conn: &Connection, json: bool) -> Result<()> {
    let mut counts = BTreeMap::new();
    for entity in Entity::ALL {
        counts.insert(entity.table(), db::count(conn, entity)?);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
    } else {
        for (table, n) in &counts {
            println!("{:<13} {:>8}", format!("{}:", table), n);
        }
    }
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
