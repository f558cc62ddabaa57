use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use super::cells::cell_text;
use crate::error::ParseError;
use crate::models::Player;

static ACTIVE_TEAMS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#all_teams_active").unwrap());
static TBODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tbody").unwrap());
static TD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static TD_LEFT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td.left").unwrap());
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static FULL_TABLE_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr.full_table").unwrap());

/// Parse the teams index into `abbr -> display name`.
///
/// The abbreviation is the third path segment of the entry's link (`/teams/ANA/`).
/// Entries without a link are skipped.
pub fn parse_teams(doc: &Html) -> Result<BTreeMap<String, String>, ParseError> {
    let container = doc
        .select(&ACTIVE_TEAMS)
        .next()
        .ok_or(ParseError::MissingElement { what: "#all_teams_active" })?;
    let body = container
        .select(&TBODY)
        .next()
        .ok_or(ParseError::MissingElement { what: "active teams tbody" })?;

    let mut teams = BTreeMap::new();
    for entry in body.select(&TD) {
        let Some(href) = entry
            .select(&LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };
        let Some(abbr) = href.split('/').nth(2).filter(|s| !s.is_empty()) else {
            warn!(href, "team link without an abbreviation segment");
            continue;
        };
        let text: String = entry.text().collect();
        teams.insert(abbr.to_string(), normalize_team_name(&text));
    }
    Ok(teams)
}

/// `"Angels, see California Angels"` → `california-angels`; `"Houston Astros"` → `houston-astros`.
pub fn normalize_team_name(text: &str) -> String {
    let name = match text.split(',').nth(1) {
        Some(after) => {
            let after = after.trim();
            after.strip_prefix("see ").unwrap_or(after)
        }
        None => text,
    };
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Parse a team roster page.
///
/// Roster cells alternate: a position cell, then a name cell carrying the identity
/// (`data-append-csv`) and the player link. An odd cell count, or a pair whose cells
/// are in the wrong slots, means the pairing is broken and nothing on the page can be
/// trusted.
pub fn parse_player_listing(doc: &Html, team: &str) -> Result<Vec<Player>, ParseError> {
    let body = doc
        .select(&TBODY)
        .next()
        .ok_or(ParseError::MissingElement { what: "roster tbody" })?;
    let cells: Vec<ElementRef> = body.select(&TD_LEFT).collect();
    if cells.len() % 2 != 0 {
        return Err(ParseError::UnpairedCells { count: cells.len() });
    }

    let mut players = Vec::with_capacity(cells.len() / 2);
    for (index, pair) in cells.chunks(2).enumerate() {
        let (position_cell, name_cell) = (&pair[0], &pair[1]);
        if is_name_cell(position_cell) || is_position_cell(name_cell) {
            return Err(ParseError::MisalignedPair { pair: index });
        }
        let player_id = name_cell
            .value()
            .attr("data-append-csv")
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let link = name_cell.select(&LINK).next();
        let href = link
            .and_then(|a| a.value().attr("href"))
            .filter(|s| !s.is_empty());

        let (Some(player_id), Some(link), Some(href)) = (player_id, link, href) else {
            warn!(team, cell = %cell_text(name_cell), "roster row without identity or link");
            continue;
        };

        players.push(Player {
            player_id: player_id.to_string(),
            name: cell_text(&link),
            href: href.to_string(),
            position: cell_text(position_cell),
            age: None,
            team: team.to_string(),
            secondary_id: None,
        });
    }
    Ok(players)
}

fn is_name_cell(cell: &ElementRef) -> bool {
    let el = cell.value();
    el.attr("data-append-csv").is_some() || el.attr("data-stat") == Some("player")
}

fn is_position_cell(cell: &ElementRef) -> bool {
    cell.value().attr("data-stat") == Some("pos")
}

/// Parse a league totals page (one `full_table` row per player and team stint).
///
/// Players traded mid-season appear once per stint; the first row wins.
pub fn parse_league_totals(doc: &Html) -> Result<Vec<Player>, ParseError> {
    if doc.select(&TBODY).next().is_none() {
        return Err(ParseError::MissingElement { what: "totals tbody" });
    }

    let mut seen = HashSet::new();
    let mut players = Vec::new();
    for row in doc.select(&FULL_TABLE_ROW) {
        let cells: Vec<ElementRef> = row.select(&TD).collect();
        if cells.len() < 4 {
            warn!(cells = cells.len(), "short totals row");
            continue;
        }
        let first = &cells[0];
        let Some(player_id) = first.value().attr("data-append-csv") else {
            continue;
        };
        let Some(link) = first.select(&LINK).next() else {
            continue;
        };
        if !seen.insert(player_id.to_string()) {
            continue;
        }

        let name = Some(cell_text(&link))
            .filter(|n| !n.is_empty())
            .or_else(|| first.value().attr("csk").map(str::to_string))
            .unwrap_or_default();

        players.push(Player {
            player_id: player_id.to_string(),
            name,
            href: link.value().attr("href").unwrap_or_default().to_string(),
            position: cell_text(&cells[1]),
            age: cell_text(&cells[2]).parse().ok(),
            team: cell_text(&cells[3]),
            secondary_id: None,
        });
    }
    Ok(players)
}
