use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::canonical_team_code;

pub const DEFAULT_CONFIG_FILE: &str = "bref.toml";
const ENV_PREFIX: &str = "BREF";

/// Runtime settings. Every field has a default so an empty environment is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub db_path: PathBuf,
    pub season: u16,
    pub workers: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub baseball_base_url: String,
    pub basketball_base_url: String,
    pub secondary_base_url: String,
    /// Replace existing stat rows instead of skipping players that already have them.
    pub refresh_stats: bool,
    pub progress: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/baseball_stats.sqlite"),
            season: 2019,
            workers: 8,
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            baseball_base_url: "https://www.baseball-reference.com/".to_string(),
            basketball_base_url: "https://www.basketball-reference.com/".to_string(),
            secondary_base_url: "https://www.fangraphs.com/".to_string(),
            refresh_stats: false,
            progress: true,
        }
    }
}

impl Settings {
    /// Layer defaults, the config file and `BREF_*` environment variables.
    ///
    /// An explicitly passed file must exist; the default `bref.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let settings: Settings = config::Config::builder()
            .add_source(config::File::from(file.clone()).required(path.is_some()))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("Failed to load settings from {:?}", file))?
            .try_deserialize()
            .context("Invalid settings")?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.workers > 0, "workers must be at least 1");
        anyhow::ensure!(self.timeout_secs > 0, "timeout_secs must be at least 1");
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    // ── URL builders ──

    pub fn teams_url(&self) -> String {
        format!("{}teams/", self.baseball_base_url)
    }

    /// Roster page for a team; historical franchise codes are remapped first.
    pub fn roster_url(&self, abbr: &str) -> String {
        format!(
            "{}teams/{}/{}.shtml",
            self.baseball_base_url,
            canonical_team_code(abbr),
            self.season
        )
    }

    pub fn career_url(&self, href: &str) -> String {
        join_url(&self.baseball_base_url, href)
    }

    pub fn league_totals_url(&self) -> String {
        format!(
            "{}leagues/NBA_{}_totals.html",
            self.basketball_base_url, self.season
        )
    }

    /// `/players/j/jamesle01.html` becomes `.../players/j/jamesle01/gamelog/2019`.
    pub fn game_log_url(&self, href: &str) -> String {
        let stem = href.strip_suffix(".html").unwrap_or(href);
        format!(
            "{}/gamelog/{}",
            join_url(&self.basketball_base_url, stem),
            self.season
        )
    }

    pub fn secondary_root_url(&self) -> String {
        format!("{}players.aspx", self.secondary_base_url)
    }

    pub fn secondary_page_url(&self, href: &str) -> String {
        join_url(&self.secondary_base_url, href)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
