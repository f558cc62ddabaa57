pub mod cells;
pub mod detail;
pub mod listing;
pub mod secondary;

pub use detail::{parse_career_stats, parse_game_log};
pub use listing::{parse_league_totals, parse_player_listing, parse_teams};
pub use secondary::{parse_secondary_index, parse_secondary_letters};

#[cfg(test)]
pub(crate) fn fixture(name: &str) -> scraper::Html {
    let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap();
    scraper::Html::parse_document(&html)
}
