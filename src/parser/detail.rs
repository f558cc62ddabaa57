use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::cells::{cell_text, coerce_or_skip};
use crate::error::ParseError;
use crate::models::{GameLine, StatMap};

static TFOOT_ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tfoot tr").unwrap());
static TBODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tbody").unwrap());
static TR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static TD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static RIGHT_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th.right, td.right").unwrap());

/// One data row of a game log.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRow {
    pub game: u32,
    pub stats: StatMap,
}

/// Stat codes that collide with identifiers starting with a digit.
fn rename_stat(code: &str) -> &str {
    match code {
        "2B" => "doubles",
        "3B" => "triples",
        other => other,
    }
}

/// Parse the footer summary row (career totals) of the first table with a footer.
///
/// Blank cells are left out. The first footer row is used because later ones hold
/// per-162-game averages.
pub fn parse_career_stats(doc: &Html) -> Result<StatMap, ParseError> {
    let row = doc
        .select(&TFOOT_ROW)
        .next()
        .ok_or(ParseError::MissingElement { what: "tfoot summary row" })?;

    let mut stats = StatMap::new();
    for cell in row.select(&TD) {
        let text = cell_text(&cell);
        if text.is_empty() {
            continue;
        }
        let Some(code) = cell.value().attr("data-stat") else {
            continue;
        };
        let code = rename_stat(code);
        if let Some(value) = coerce_or_skip(code, &text) {
            stats.insert(code.to_string(), value);
        }
    }
    Ok(stats)
}

/// Parse every data row of a game log body.
///
/// The first right-aligned cell holds the game number; rows where it is not an
/// integer (repeated headers, "Did Not Play" dividers) are skipped.
pub fn parse_game_log(doc: &Html) -> Result<Vec<GameRow>, ParseError> {
    let body = doc
        .select(&TBODY)
        .next()
        .ok_or(ParseError::MissingElement { what: "game log tbody" })?;

    let mut games = Vec::new();
    for row in body.select(&TR) {
        let cells: Vec<ElementRef> = row.select(&RIGHT_CELL).collect();
        let Some((first, rest)) = cells.split_first() else {
            continue;
        };
        let Ok(game) = cell_text(first).parse::<u32>() else {
            continue;
        };

        let mut stats = StatMap::new();
        for cell in rest {
            let Some(code) = cell.value().attr("data-stat") else {
                continue;
            };
            if !GameLine::is_recognized(code) {
                continue;
            }
            if let Some(value) = coerce_or_skip(code, &cell_text(cell)) {
                stats.insert(code.to_string(), value);
            }
        }
        games.push(GameRow { game, stats });
    }
    Ok(games)
}
