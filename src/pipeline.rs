//! Fetch → parse → existence check → insert, per entity.
//!
//! Each run stages its rows in one transaction and commits once at the end, after
//! every worker has finished. A failure for one team or player is logged and counted;
//! a store failure aborts the run and rolls the transaction back.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::Connection;
use scraper::Html;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::db::{self, RecordKey};
use crate::error::{ScrapeError, StoreError};
use crate::fetch::PageFetcher;
use crate::models::{
    canonical_team_code, BattingTotals, CareerStats, GameLine, GameStats, Player, Team,
};
use crate::parser;
use crate::pool::{self, PoolConfig, PoolStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staged {
    Inserted,
    Skipped,
    Replaced,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub inserted: usize,
    pub skipped: usize,
    pub replaced: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub warnings: Vec<String>,
}

impl RunSummary {
    fn record(&mut self, staged: Staged) {
        match staged {
            Staged::Inserted => self.inserted += 1,
            Staged::Skipped => self.skipped += 1,
            Staged::Replaced => self.replaced += 1,
        }
    }

    fn absorb(&mut self, stats: PoolStats) {
        self.failed += stats.failed;
        self.cancelled += stats.cancelled;
        self.warnings.extend(
            stats
                .failures
                .into_iter()
                .map(|(label, err)| format!("{}: {}", label, err)),
        );
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} skipped, {} replaced, {} failed, {} cancelled",
            self.inserted, self.skipped, self.replaced, self.failed, self.cancelled
        )
    }
}

// ── Staging ──

pub fn stage_team(conn: &Connection, team: &Team) -> Result<Staged, StoreError> {
    if db::exists(conn, RecordKey::Team(&team.abbr))? {
        return Ok(Staged::Skipped);
    }
    db::insert_team(conn, team)?;
    Ok(Staged::Inserted)
}

/// Players are created once and never refreshed from a listing.
pub fn stage_player(conn: &Connection, player: &Player) -> Result<Staged, StoreError> {
    if db::exists(conn, RecordKey::Player(&player.player_id))? {
        return Ok(Staged::Skipped);
    }
    db::insert_player(conn, player)?;
    Ok(Staged::Inserted)
}

pub fn stage_career(
    conn: &Connection,
    career: &CareerStats,
    refresh: bool,
) -> Result<Staged, StoreError> {
    let staged = if db::exists(conn, RecordKey::Career(&career.player_id))? {
        if !refresh {
            return Ok(Staged::Skipped);
        }
        db::delete_career(conn, &career.player_id)?;
        Staged::Replaced
    } else {
        Staged::Inserted
    };
    db::insert_career(conn, career)?;
    Ok(staged)
}

/// Stage one player's game log. With `refresh` the player's previous rows are replaced.
pub fn stage_games(
    conn: &Connection,
    player_id: &str,
    games: &[GameStats],
    refresh: bool,
    summary: &mut RunSummary,
) -> Result<(), StoreError> {
    let replaced = if refresh {
        db::delete_games(conn, player_id)?
    } else {
        0
    };

    for game in games {
        if !refresh && db::exists(conn, RecordKey::Game(&game.player_id, game.game))? {
            summary.record(Staged::Skipped);
            continue;
        }
        db::insert_game(conn, game)?;
        summary.record(Staged::Inserted);
    }
    summary.replaced += replaced;
    Ok(())
}

// ── Per-entity work (runs on pool workers) ──

async fn fetch_roster<F: PageFetcher>(
    fetcher: &F,
    url: String,
    team: Team,
) -> Result<Vec<Player>, ScrapeError> {
    let doc = fetcher.fetch(&url).await?;
    // stored players reference the code the roster was fetched under
    let players = parser::parse_player_listing(&doc, canonical_team_code(&team.abbr))?;
    Ok(players)
}

async fn fetch_career<F: PageFetcher>(
    fetcher: &F,
    url: String,
    player: Player,
) -> Result<CareerStats, ScrapeError> {
    let doc = fetcher.fetch(&url).await?;
    let stats = parser::parse_career_stats(&doc)?;
    let (totals, ignored) = BattingTotals::from_stats(&stats);
    if !ignored.is_empty() {
        debug!(player = %player.player_id, ?ignored, "ignored career stat codes");
    }
    Ok(CareerStats::for_player(&player, totals))
}

async fn fetch_game_log<F: PageFetcher>(
    fetcher: &F,
    url: String,
    player: Player,
) -> Result<(String, Vec<GameStats>), ScrapeError> {
    let doc = fetcher.fetch(&url).await?;
    let rows = parser::parse_game_log(&doc)?;
    let games = rows
        .into_iter()
        .map(|row| GameStats {
            player_id: player.player_id.clone(),
            game: row.game,
            line: GameLine::from_stats(&row.stats).0,
        })
        .collect();
    Ok((player.player_id, games))
}

async fn fetch_secondary_page<F: PageFetcher>(
    fetcher: &F,
    url: String,
) -> Result<Vec<(String, String)>, ScrapeError> {
    let doc = fetcher.fetch(&url).await?;
    Ok(parser::parse_secondary_index(&doc))
}

/// Label for a secondary index page in pool diagnostics.
struct PageUrl(String);

impl fmt::Display for PageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Controller ──

pub struct Pipeline<F> {
    fetcher: Arc<F>,
    settings: Arc<Settings>,
    cancel: CancellationToken,
}

impl<F: PageFetcher + 'static> Pipeline<F> {
    pub fn new(fetcher: F, settings: Settings, cancel: CancellationToken) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            settings: Arc::new(settings),
            cancel,
        }
    }

    /// Fetch a single index page, giving up as soon as the run is cancelled.
    async fn fetch_index(&self, url: &str) -> Result<Html, ScrapeError> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(ScrapeError::Cancelled),
            page = self.fetcher.fetch(url) => Ok(page?),
        }
    }

    fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            workers: self.settings.workers,
            progress: self.settings.progress,
        }
    }

    /// Insert every team on the teams index that is not stored yet.
    pub async fn populate_teams_table(&self, conn: &Connection) -> Result<RunSummary> {
        let url = self.settings.teams_url();
        info!("Fetching teams index: {}", url);
        let teams = {
            let doc = self
                .fetch_index(&url)
                .await
                .context("Failed to fetch teams index")?;
            parser::parse_teams(&doc).context("Failed to parse teams index")?
        };

        let tx = conn.unchecked_transaction()?;
        let mut summary = RunSummary::default();
        for (abbr, name) in teams {
            summary.record(stage_team(&tx, &Team { abbr, name })?);
        }
        tx.commit().context("Failed to commit teams")?;

        info!("Teams: {}", summary);
        Ok(summary)
    }

    /// Fetch every stored team's roster and insert players not seen before.
    pub async fn populate_rosters(&self, conn: &Connection) -> Result<RunSummary> {
        let teams = db::fetch_teams(conn)?;
        info!("Fetching rosters for {} teams (season {})", teams.len(), self.settings.season);

        let fetcher = Arc::clone(&self.fetcher);
        let settings = Arc::clone(&self.settings);
        let op = move |team: Team| {
            let fetcher = Arc::clone(&fetcher);
            let url = settings.roster_url(&team.abbr);
            async move { fetch_roster(&*fetcher, url, team).await }
        };

        let tx = conn.unchecked_transaction()?;
        let mut summary = RunSummary::default();
        let stats = pool::run(&self.pool_config(), teams, &self.cancel, op, |players: Vec<Player>| {
            for p in &players {
                summary.record(stage_player(&tx, p)?);
            }
            Ok(())
        })
        .await?;
        summary.absorb(stats);
        tx.commit().context("Failed to commit players")?;

        info!("Rosters: {}", summary);
        Ok(summary)
    }

    /// Insert players from the league totals listing. Only this listing carries ages.
    pub async fn populate_league(&self, conn: &Connection) -> Result<RunSummary> {
        let url = self.settings.league_totals_url();
        info!("Fetching league totals: {}", url);
        let players = {
            let doc = self
                .fetch_index(&url)
                .await
                .context("Failed to fetch league totals")?;
            parser::parse_league_totals(&doc).context("Failed to parse league totals")?
        };

        let tx = conn.unchecked_transaction()?;
        let mut summary = RunSummary::default();
        for p in &players {
            summary.record(stage_player(&tx, p)?);
        }
        tx.commit().context("Failed to commit players")?;

        info!("League players: {}", summary);
        Ok(summary)
    }

    /// Career batting totals for every non-pitcher that does not have them yet
    /// (or for every non-pitcher when refreshing).
    pub async fn scrape_careers(&self, conn: &Connection) -> Result<RunSummary> {
        let refresh = self.settings.refresh_stats;
        let candidates = if refresh {
            db::fetch_players(conn)?
        } else {
            db::players_without_career(conn)?
        };
        let players: Vec<Player> = candidates.into_iter().filter(|p| !p.is_pitcher()).collect();
        info!("Fetching career totals for {} players", players.len());

        let fetcher = Arc::clone(&self.fetcher);
        let settings = Arc::clone(&self.settings);
        let op = move |player: Player| {
            let fetcher = Arc::clone(&fetcher);
            let url = settings.career_url(&player.href);
            async move { fetch_career(&*fetcher, url, player).await }
        };

        let tx = conn.unchecked_transaction()?;
        let mut summary = RunSummary::default();
        let stats = pool::run(&self.pool_config(), players, &self.cancel, op, |career: CareerStats| {
            summary.record(stage_career(&tx, &career, refresh)?);
            Ok(())
        })
        .await?;
        summary.absorb(stats);
        tx.commit().context("Failed to commit career stats")?;

        info!("Career stats: {}", summary);
        Ok(summary)
    }

    /// Per-game logs for every player without game rows (or every player when refreshing).
    pub async fn scrape_game_logs(&self, conn: &Connection) -> Result<RunSummary> {
        let refresh = self.settings.refresh_stats;
        let players = if refresh {
            db::fetch_players(conn)?
        } else {
            db::players_without_games(conn)?
        };
        info!("Fetching game logs for {} players", players.len());

        let fetcher = Arc::clone(&self.fetcher);
        let settings = Arc::clone(&self.settings);
        let op = move |player: Player| {
            let fetcher = Arc::clone(&fetcher);
            let url = settings.game_log_url(&player.href);
            async move { fetch_game_log(&*fetcher, url, player).await }
        };

        let tx = conn.unchecked_transaction()?;
        let mut summary = RunSummary::default();
        let stats = pool::run(&self.pool_config(), players, &self.cancel, op, |(player_id, games): (String, Vec<GameStats>)| {
            if games.is_empty() {
                warn!(player = %player_id, "game log has no data rows");
            }
            stage_games(&tx, &player_id, &games, refresh, &mut summary)?;
            db::mark_game_log(&tx, &player_id, games.len())
        })
        .await?;
        summary.absorb(stats);
        tx.commit().context("Failed to commit game stats")?;

        info!("Game stats: {}", summary);
        Ok(summary)
    }

    /// Fill missing secondary-site ids by exact display-name match.
    pub async fn enrich_secondary_ids(&self, conn: &Connection) -> Result<RunSummary> {
        let root = self.settings.secondary_root_url();
        info!("Fetching secondary player index: {}", root);
        let pages: Vec<PageUrl> = {
            let doc = self
                .fetch_index(&root)
                .await
                .context("Failed to fetch secondary player index")?;
            parser::parse_secondary_letters(&doc)
                .iter()
                .map(|href| PageUrl(self.settings.secondary_page_url(href)))
                .collect()
        };

        let fetcher = Arc::clone(&self.fetcher);
        let op = move |page: PageUrl| {
            let fetcher = Arc::clone(&fetcher);
            async move { fetch_secondary_page(&*fetcher, page.0).await }
        };

        let tx = conn.unchecked_transaction()?;
        let mut summary = RunSummary::default();
        let stats = pool::run(&self.pool_config(), pages, &self.cancel, op, |ids: Vec<(String, String)>| {
            for (name, id) in &ids {
                let updated = db::set_secondary_id(&tx, name, id)?;
                if updated > 0 {
                    summary.inserted += updated;
                } else {
                    summary.skipped += 1;
                }
            }
            Ok(())
        })
        .await?;
        summary.absorb(stats);
        tx.commit().context("Failed to commit secondary ids")?;

        info!("Secondary ids: {}", summary);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_in_memory, Entity};
    use crate::fetch::fake::FakeFetcher;

    const BR: &str = "https://www.baseball-reference.com/";

    fn settings() -> Settings {
        Settings {
            season: 2018,
            workers: 4,
            progress: false,
            ..Settings::default()
        }
    }

    fn pipeline(fetcher: FakeFetcher, settings: Settings) -> Pipeline<FakeFetcher> {
        Pipeline::new(fetcher, settings, CancellationToken::new())
    }

    fn player(id: &str, position: &str) -> Player {
        Player {
            player_id: id.to_string(),
            name: id.to_string(),
            href: format!("/players/{}/{}.shtml", &id[..1], id),
            position: position.to_string(),
            age: None,
            team: "HOU".to_string(),
            secondary_id: None,
        }
    }

    fn seed_players(conn: &Connection, players: &[Player]) {
        for p in players {
            db::insert_player(conn, p).unwrap();
        }
    }

    #[tokio::test]
    async fn teams_inserted_once() {
        let conn = open_in_memory();
        let fetcher = FakeFetcher::new().fixture(format!("{}teams/", BR), "teams_index");
        let p = pipeline(fetcher, settings());

        let first = p.populate_teams_table(&conn).await.unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!(db::count(&conn, Entity::Team).unwrap(), 2);

        let second = p.populate_teams_table(&conn).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(db::count(&conn, Entity::Team).unwrap(), 2);
    }

    #[tokio::test]
    async fn teams_index_failure_is_an_error_and_writes_nothing() {
        let conn = open_in_memory();
        let p = pipeline(FakeFetcher::new(), settings());
        assert!(p.populate_teams_table(&conn).await.is_err());
        assert_eq!(db::count(&conn, Entity::Team).unwrap(), 0);
    }

    fn roster_fetcher() -> FakeFetcher {
        FakeFetcher::new()
            .fixture(format!("{}teams/", BR), "teams_index")
            // ANA is fetched under its canonical code
            .fixture(format!("{}teams/LAA/2018.shtml", BR), "roster")
    }

    #[tokio::test]
    async fn rosters_are_idempotent() {
        let conn = open_in_memory();
        let p = pipeline(roster_fetcher(), settings());
        p.populate_teams_table(&conn).await.unwrap();

        let first = p.populate_rosters(&conn).await.unwrap();
        let after_first = db::count(&conn, Entity::Player).unwrap();
        assert_eq!(first.inserted, 3);
        // HOU has no page in the fake: contained, not fatal
        assert_eq!(first.failed, 1);
        assert_eq!(first.warnings.len(), 1);

        let second = p.populate_rosters(&conn).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 3);
        assert_eq!(db::count(&conn, Entity::Player).unwrap(), after_first);

        let players = db::fetch_players(&conn).unwrap();
        assert!(players.iter().all(|p| p.team == "LAA"));
    }

    #[tokio::test]
    async fn existing_player_rows_are_not_refreshed() {
        let conn = open_in_memory();
        let mut altuve = player("altuvjo01", "DH");
        altuve.name = "Old Name".into();
        seed_players(&conn, &[altuve]);

        let p = pipeline(roster_fetcher(), settings());
        p.populate_teams_table(&conn).await.unwrap();
        p.populate_rosters(&conn).await.unwrap();

        let stored = db::fetch_players(&conn).unwrap();
        let altuve = stored.iter().find(|p| p.player_id == "altuvjo01").unwrap();
        assert_eq!(altuve.name, "Old Name");
        assert_eq!(altuve.position, "DH");
    }

    #[tokio::test]
    async fn league_totals_populate_ages() {
        let conn = open_in_memory();
        let fetcher = FakeFetcher::new().fixture(
            "https://www.basketball-reference.com/leagues/NBA_2018_totals.html",
            "league_totals",
        );
        let p = pipeline(fetcher, settings());
        let summary = p.populate_league(&conn).await.unwrap();
        assert_eq!(summary.inserted, 2);
        let players = db::fetch_players(&conn).unwrap();
        assert_eq!(players[0].age, Some(29));
    }

    fn career_fetcher() -> FakeFetcher {
        FakeFetcher::new()
            .fixture(format!("{}players/t/troutmi01.shtml", BR), "career_batting")
            .fixture(format!("{}players/a/altuvjo01.shtml", BR), "career_batting")
    }

    #[tokio::test]
    async fn careers_skip_pitchers_and_contain_failures() {
        let conn = open_in_memory();
        seed_players(
            &conn,
            &[
                player("troutmi01", "CF"),
                player("altuvjo01", "2B"),
                player("verlaju01", "P"),
                player("missing01", "SS"),
            ],
        );
        let fetcher = career_fetcher();
        let p = pipeline(fetcher, settings());

        let summary = p.scrape_careers(&conn).await.unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(p.fetcher.requests(), 3);
        assert!(!db::exists(&conn, RecordKey::Career("verlaju01")).unwrap());

        let (g, doubles): (i64, i64) = conn
            .query_row(
                "SELECT g, doubles FROM career_stats WHERE player_id = 'troutmi01'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!((g, doubles), (1199, 223));
    }

    #[tokio::test]
    async fn careers_rerun_adds_no_rows() {
        let conn = open_in_memory();
        seed_players(&conn, &[player("troutmi01", "CF"), player("altuvjo01", "2B")]);
        let p = pipeline(career_fetcher(), settings());

        p.scrape_careers(&conn).await.unwrap();
        let second = p.scrape_careers(&conn).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(db::count(&conn, Entity::CareerStats).unwrap(), 2);
        // nothing pending, so the second run fetches nothing
        assert_eq!(p.fetcher.requests(), 2);
    }

    #[tokio::test]
    async fn unguarded_restaging_is_rejected_by_store() {
        // appending without an existence check is what produced duplicate stat rows;
        // the store now refuses the second row instead
        let conn = open_in_memory();
        let trout = player("troutmi01", "CF");
        seed_players(&conn, std::slice::from_ref(&trout));
        let career = CareerStats::for_player(&trout, BattingTotals::default());

        db::insert_career(&conn, &career).unwrap();
        assert!(matches!(
            db::insert_career(&conn, &career),
            Err(StoreError::DuplicateKey { .. })
        ));
        assert_eq!(stage_career(&conn, &career, false).unwrap(), Staged::Skipped);
        assert_eq!(db::count(&conn, Entity::CareerStats).unwrap(), 1);
    }

    #[tokio::test]
    async fn refresh_replaces_career_rows() {
        let conn = open_in_memory();
        seed_players(&conn, &[player("troutmi01", "CF")]);
        let p = pipeline(career_fetcher(), Settings { refresh_stats: true, ..settings() });

        let first = p.scrape_careers(&conn).await.unwrap();
        let second = p.scrape_careers(&conn).await.unwrap();
        assert_eq!(first.inserted, 1);
        assert_eq!(second.replaced, 1);
        assert_eq!(db::count(&conn, Entity::CareerStats).unwrap(), 1);
    }

    fn game_log_fetcher() -> FakeFetcher {
        FakeFetcher::new().fixture(
            "https://www.basketball-reference.com/players/h/hardeja01/gamelog/2018",
            "game_log",
        )
    }

    fn hoop_player(id: &str) -> Player {
        Player {
            href: format!("/players/{}/{}.html", &id[..1], id),
            ..player(id, "PG")
        }
    }

    #[tokio::test]
    async fn game_logs_are_idempotent() {
        let conn = open_in_memory();
        seed_players(&conn, &[hoop_player("hardeja01"), hoop_player("nobody01")]);
        let p = pipeline(game_log_fetcher(), settings());

        let first = p.scrape_game_logs(&conn).await.unwrap();
        assert_eq!(first.inserted, 3);
        assert_eq!(first.failed, 1);

        let second = p.scrape_game_logs(&conn).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(db::count(&conn, Entity::GameStats).unwrap(), 3);

        let mp: f64 = conn
            .query_row(
                "SELECT mp FROM game_stats WHERE player_id = 'hardeja01' AND game = 1",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(mp, 34.12);
    }

    #[tokio::test]
    async fn refresh_replaces_game_rows() {
        let conn = open_in_memory();
        seed_players(&conn, &[hoop_player("hardeja01")]);
        let p = pipeline(game_log_fetcher(), Settings { refresh_stats: true, ..settings() });

        p.scrape_game_logs(&conn).await.unwrap();
        let second = p.scrape_game_logs(&conn).await.unwrap();
        assert_eq!(second.replaced, 3);
        assert_eq!(second.inserted, 3);
        assert_eq!(db::count(&conn, Entity::GameStats).unwrap(), 3);
    }

    #[tokio::test]
    async fn empty_game_log_is_fetched_once() {
        let conn = open_in_memory();
        seed_players(&conn, &[hoop_player("hardeja01")]);
        let fetcher = FakeFetcher::new().page(
            "https://www.basketball-reference.com/players/h/hardeja01/gamelog/2018",
            "<table><tbody></tbody></table>",
        );
        let p = pipeline(fetcher, settings());

        let first = p.scrape_game_logs(&conn).await.unwrap();
        assert_eq!((first.inserted, first.failed), (0, 0));
        p.scrape_game_logs(&conn).await.unwrap();
        assert_eq!(p.fetcher.requests(), 1);
        assert_eq!(db::count(&conn, Entity::GameStats).unwrap(), 0);
    }

    #[tokio::test]
    async fn store_failure_rolls_back_the_whole_run() {
        let conn = open_in_memory();
        seed_players(&conn, &[player("altuvjo01", "2B"), player("troutmi01", "CF")]);
        conn.execute_batch(
            "CREATE TRIGGER reject_trout BEFORE INSERT ON career_stats
             WHEN NEW.player_id = 'troutmi01'
             BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
        )
        .unwrap();
        // one worker: altuvjo01 is staged before troutmi01 fails
        let p = pipeline(career_fetcher(), Settings { workers: 1, ..settings() });

        let err = p.scrape_careers(&conn).await.unwrap_err();
        assert!(err.to_string().contains("disk full"), "{:#}", err);
        assert_eq!(db::count(&conn, Entity::CareerStats).unwrap(), 0);
        assert!(conn.is_autocommit());
    }

    #[tokio::test]
    async fn cancelled_run_commits_nothing_new() {
        let conn = open_in_memory();
        seed_players(&conn, &[player("troutmi01", "CF"), player("altuvjo01", "2B")]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let p = Pipeline::new(career_fetcher(), settings(), cancel);

        let summary = p.scrape_careers(&conn).await.unwrap();
        assert_eq!(summary.cancelled, 2);
        assert_eq!(db::count(&conn, Entity::CareerStats).unwrap(), 0);
    }

    #[tokio::test]
    async fn secondary_ids_fill_by_name() {
        let conn = open_in_memory();
        let mut altuve = player("altuvjo01", "2B");
        altuve.name = "Jose Altuve".into();
        let mut bregman = player("bregmal01", "3B");
        bregman.name = "Alex Bregman".into();
        bregman.secondary_id = Some("keep".into());
        seed_players(&conn, &[altuve, bregman]);

        let fetcher = FakeFetcher::new()
            .fixture("https://www.fangraphs.com/players.aspx", "secondary_index")
            .fixture("https://www.fangraphs.com/players.aspx?letter=A", "secondary_index");
        let p = pipeline(fetcher, settings());
        let summary = p.enrich_secondary_ids(&conn).await.unwrap();
        assert_eq!(summary.inserted, 1);
        // letter B has no page in the fake
        assert_eq!(summary.failed, 1);

        let players = db::fetch_players(&conn).unwrap();
        assert_eq!(players[0].secondary_id.as_deref(), Some("5417"));
        assert_eq!(players[1].secondary_id.as_deref(), Some("keep"));
    }
}
