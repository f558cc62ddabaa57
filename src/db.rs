use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension};

use crate::error::StoreError;
use crate::models::{BattingTotals, CareerStats, GameLine, GameStats, Player, StatValue, Team};

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS teams (
            id    INTEGER PRIMARY KEY,
            name  TEXT NOT NULL,
            abbr  TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS players (
            player_id    TEXT PRIMARY KEY,
            name         TEXT NOT NULL,
            href         TEXT NOT NULL,
            position     TEXT,
            age          INTEGER,
            team         TEXT,
            secondary_id TEXT,
            created_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_players_team ON players(team);
        CREATE INDEX IF NOT EXISTS idx_players_name ON players(name);

        CREATE TABLE IF NOT EXISTS career_stats (
            player_id  TEXT PRIMARY KEY REFERENCES players(player_id),
            name       TEXT,
            position   TEXT,
            g INTEGER, pa INTEGER, ab INTEGER, r INTEGER, h INTEGER,
            doubles INTEGER, triples INTEGER, hr INTEGER, rbi INTEGER,
            sb INTEGER, cs INTEGER, bb INTEGER, so INTEGER, tb INTEGER,
            gidp INTEGER, hbp INTEGER, sh INTEGER, sf INTEGER, ibb INTEGER,
            batting_avg REAL, onbase_perc REAL, slugging_perc REAL,
            onbase_plus_slugging REAL, onbase_plus_slugging_plus REAL,
            scraped_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS game_stats (
            id         INTEGER PRIMARY KEY,
            player_id  TEXT NOT NULL REFERENCES players(player_id),
            game       INTEGER NOT NULL,
            mp REAL, fg REAL, fga REAL, fg_pct REAL, fg3 REAL, fg3_pct REAL,
            ft REAL, fta REAL, ft_pct REAL, orb REAL, drb REAL, trb REAL,
            ast REAL, stl REAL, blk REAL, tov REAL, pts REAL,
            scraped_at TEXT NOT NULL,
            UNIQUE(player_id, game)
        );
        CREATE INDEX IF NOT EXISTS idx_game_stats_player ON game_stats(player_id);

        CREATE TABLE IF NOT EXISTS game_logs_scraped (
            player_id  TEXT PRIMARY KEY REFERENCES players(player_id),
            games      INTEGER NOT NULL,
            scraped_at TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

// ── Keys ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Team,
    Player,
    CareerStats,
    GameStats,
}

impl Entity {
    pub const ALL: [Entity; 4] = [
        Entity::Team,
        Entity::Player,
        Entity::CareerStats,
        Entity::GameStats,
    ];

    pub fn table(self) -> &'static str {
        match self {
            Entity::Team => "teams",
            Entity::Player => "players",
            Entity::CareerStats => "career_stats",
            Entity::GameStats => "game_stats",
        }
    }
}

/// Identity of one row; game rows are keyed by player and game number.
#[derive(Debug, Clone, Copy)]
pub enum RecordKey<'a> {
    Team(&'a str),
    Player(&'a str),
    Career(&'a str),
    Game(&'a str, u32),
}

impl RecordKey<'_> {
    fn entity(&self) -> Entity {
        match self {
            RecordKey::Team(_) => Entity::Team,
            RecordKey::Player(_) => Entity::Player,
            RecordKey::Career(_) => Entity::CareerStats,
            RecordKey::Game(..) => Entity::GameStats,
        }
    }

    fn describe(&self) -> String {
        match self {
            RecordKey::Team(k) | RecordKey::Player(k) | RecordKey::Career(k) => k.to_string(),
            RecordKey::Game(k, game) => format!("{}#{}", k, game),
        }
    }
}

pub fn exists(conn: &Connection, key: RecordKey) -> Result<bool, StoreError> {
    let found = match key {
        RecordKey::Team(abbr) => conn
            .query_row("SELECT 1 FROM teams WHERE abbr = ?1", [abbr], |_| Ok(()))
            .optional()?,
        RecordKey::Player(id) => conn
            .query_row("SELECT 1 FROM players WHERE player_id = ?1", [id], |_| Ok(()))
            .optional()?,
        RecordKey::Career(id) => conn
            .query_row("SELECT 1 FROM career_stats WHERE player_id = ?1", [id], |_| Ok(()))
            .optional()?,
        RecordKey::Game(id, game) => conn
            .query_row(
                "SELECT 1 FROM game_stats WHERE player_id = ?1 AND game = ?2",
                params![id, game],
                |_| Ok(()),
            )
            .optional()?,
    };
    Ok(found.is_some())
}

pub fn count(conn: &Connection, entity: Entity) -> Result<usize, StoreError> {
    let sql = format!("SELECT COUNT(*) FROM {}", entity.table());
    Ok(conn.query_row(&sql, [], |r| r.get(0))?)
}

/// Unique violations become `DuplicateKey`; everything else passes through.
fn map_insert_err(err: rusqlite::Error, key: RecordKey) -> StoreError {
    let duplicate = matches!(
        &err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    );
    if duplicate {
        StoreError::DuplicateKey {
            table: key.entity().table(),
            key: key.describe(),
        }
    } else {
        StoreError::Sqlite(err)
    }
}

fn to_sql_values(values: Vec<Option<StatValue>>) -> impl Iterator<Item = Value> {
    values.into_iter().map(|v| match v {
        Some(StatValue::Int(i)) => Value::Integer(i),
        Some(StatValue::Float(f)) => Value::Real(f),
        None => Value::Null,
    })
}

fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{}", i)).collect::<Vec<_>>().join(", ")
}

// ── Inserts ──
// Plain INSERTs: callers check `exists` first, and a duplicate must fail loudly.

pub fn insert_team(conn: &Connection, team: &Team) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO teams (name, abbr) VALUES (?1, ?2)",
        params![team.name, team.abbr],
    )
    .map_err(|e| map_insert_err(e, RecordKey::Team(&team.abbr)))?;
    Ok(())
}

pub fn insert_player(conn: &Connection, p: &Player) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO players (player_id, name, href, position, age, team, secondary_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![p.player_id, p.name, p.href, p.position, p.age, p.team, p.secondary_id],
    )
    .map_err(|e| map_insert_err(e, RecordKey::Player(&p.player_id)))?;
    Ok(())
}

pub fn insert_career(conn: &Connection, c: &CareerStats) -> Result<(), StoreError> {
    let columns = BattingTotals::COLUMNS;
    let sql = format!(
        "INSERT INTO career_stats (player_id, name, position, {}, scraped_at) VALUES ({})",
        columns.join(", "),
        placeholders(columns.len() + 4)
    );
    let values = [
        Value::Text(c.player_id.clone()),
        Value::Text(c.name.clone()),
        Value::Text(c.position.clone()),
    ]
    .into_iter()
    .chain(to_sql_values(c.totals.values()))
    .chain(std::iter::once(Value::Text(Utc::now().to_rfc3339())));

    conn.execute(&sql, params_from_iter(values))
        .map_err(|e| map_insert_err(e, RecordKey::Career(&c.player_id)))?;
    Ok(())
}

pub fn insert_game(conn: &Connection, g: &GameStats) -> Result<(), StoreError> {
    let columns = GameLine::COLUMNS;
    let sql = format!(
        "INSERT INTO game_stats (player_id, game, {}, scraped_at) VALUES ({})",
        columns.join(", "),
        placeholders(columns.len() + 3)
    );
    let values = [
        Value::Text(g.player_id.clone()),
        Value::Integer(i64::from(g.game)),
    ]
    .into_iter()
    .chain(to_sql_values(g.line.values()))
    .chain(std::iter::once(Value::Text(Utc::now().to_rfc3339())));

    conn.execute(&sql, params_from_iter(values))
        .map_err(|e| map_insert_err(e, RecordKey::Game(&g.player_id, g.game)))?;
    Ok(())
}

pub fn delete_career(conn: &Connection, player_id: &str) -> Result<usize, StoreError> {
    Ok(conn.execute("DELETE FROM career_stats WHERE player_id = ?1", [player_id])?)
}

pub fn delete_games(conn: &Connection, player_id: &str) -> Result<usize, StoreError> {
    Ok(conn.execute("DELETE FROM game_stats WHERE player_id = ?1", [player_id])?)
}

/// Record that a player's game log was fetched, even when it held no games.
pub fn mark_game_log(conn: &Connection, player_id: &str, games: usize) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO game_logs_scraped (player_id, games, scraped_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(player_id) DO UPDATE SET games = excluded.games, scraped_at = excluded.scraped_at",
        params![player_id, games as i64, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

/// Fill a missing secondary id by exact display name. Existing ids are never overwritten,
/// and a name shared by several players is left alone since it cannot say which one.
pub fn set_secondary_id(conn: &Connection, name: &str, id: &str) -> Result<usize, StoreError> {
    Ok(conn.execute(
        "UPDATE players SET secondary_id = ?2
         WHERE name = ?1 AND secondary_id IS NULL
           AND (SELECT COUNT(*) FROM players WHERE name = ?1) = 1",
        params![name, id],
    )?)
}

// ── Queries ──

pub fn fetch_teams(conn: &Connection) -> Result<Vec<Team>, StoreError> {
    let mut stmt = conn.prepare("SELECT abbr, name FROM teams ORDER BY abbr")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Team {
                abbr: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

const PLAYER_COLUMNS: &str =
    "p.player_id, p.name, p.href, p.position, p.age, p.team, p.secondary_id";

fn player_from_row(row: &rusqlite::Row) -> rusqlite::Result<Player> {
    Ok(Player {
        player_id: row.get(0)?,
        name: row.get(1)?,
        href: row.get(2)?,
        position: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        age: row.get(4)?,
        team: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        secondary_id: row.get(6)?,
    })
}

fn query_players(conn: &Connection, filter: &str) -> Result<Vec<Player>, StoreError> {
    let sql = format!(
        "SELECT {} FROM players p {} ORDER BY p.player_id",
        PLAYER_COLUMNS, filter
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], player_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn fetch_players(conn: &Connection) -> Result<Vec<Player>, StoreError> {
    query_players(conn, "")
}

pub fn players_without_career(conn: &Connection) -> Result<Vec<Player>, StoreError> {
    query_players(
        conn,
        "WHERE NOT EXISTS (SELECT 1 FROM career_stats c WHERE c.player_id = p.player_id)",
    )
}

/// Players whose game log has never been fetched. An empty log counts as fetched.
pub fn players_without_games(conn: &Connection) -> Result<Vec<Player>, StoreError> {
    query_players(
        conn,
        "WHERE NOT EXISTS (SELECT 1 FROM game_logs_scraped s WHERE s.player_id = p.player_id)
           AND NOT EXISTS (SELECT 1 FROM game_stats g WHERE g.player_id = p.player_id)",
    )
}

#[cfg(test)]
pub fn open_in_memory() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
    init_schema(&conn).unwrap();
    conn
}
