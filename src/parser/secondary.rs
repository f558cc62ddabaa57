use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::cells::cell_text;

static LETTER_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".s_name a[href]").unwrap());
static SEARCH_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".search table tr").unwrap());
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static PLAYER_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]playerid=([^&]+)").unwrap());

/// Links to the per-letter player index pages.
pub fn parse_secondary_letters(doc: &Html) -> Vec<String> {
    doc.select(&LETTER_LINK)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// `(display name, secondary id)` pairs from a per-letter index page.
pub fn parse_secondary_index(doc: &Html) -> Vec<(String, String)> {
    doc.select(&SEARCH_ROW)
        .filter_map(|row| {
            let link = row.select(&LINK).next()?;
            let href = link.value().attr("href")?;
            let id = PLAYER_ID_RE.captures(href)?.get(1)?.as_str().to_string();
            let name = cell_text(&link);
            if name.is_empty() {
                None
            } else {
                Some((name, id))
            }
        })
        .collect()
}
