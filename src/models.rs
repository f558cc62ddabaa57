//! Plain records. Nothing here knows about SQLite; `db.rs` owns the column mapping.

use std::collections::BTreeMap;
use std::fmt;

/// Stat code → numeric value, as parsed from one table row.
pub type StatMap = BTreeMap<String, f64>;

/// Historical franchise codes that the site no longer serves roster pages under.
const TEAM_CODE_REMAP: &[(&str, &str)] = &[("ANA", "LAA"), ("FLA", "MIA"), ("TBD", "TBR")];

pub fn canonical_team_code(abbr: &str) -> &str {
    TEAM_CODE_REMAP
        .iter()
        .find(|(from, _)| *from == abbr)
        .map(|(_, to)| *to)
        .unwrap_or(abbr)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub abbr: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub player_id: String,
    pub name: String,
    pub href: String,
    pub position: String,
    pub age: Option<u32>,
    pub team: String,
    pub secondary_id: Option<String>,
}

impl Player {
    pub fn is_pitcher(&self) -> bool {
        self.position.trim() == "P"
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.player_id)
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.abbr)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Int(i64),
    Float(f64),
}

/// Numeric column type a stat can be stored as.
pub trait StatField: Copy {
    fn from_f64(v: f64) -> Self;
    fn into_value(self) -> StatValue;
}

impl StatField for i64 {
    fn from_f64(v: f64) -> Self {
        v.round() as i64
    }
    fn into_value(self) -> StatValue {
        StatValue::Int(self)
    }
}

impl StatField for f64 {
    fn from_f64(v: f64) -> Self {
        v
    }
    fn into_value(self) -> StatValue {
        StatValue::Float(self)
    }
}

/// Declares a stat line: one optional field per recognised stat code, in column order.
macro_rules! stat_line {
    ($(#[$meta:meta])* $name:ident { $($field:ident : $ty:ty = $code:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            $(pub $field: Option<$ty>,)*
        }

        impl $name {
            pub const COLUMNS: &'static [&'static str] = &[$(stringify!($field)),*];
            pub const CODES: &'static [&'static str] = &[$($code),*];

            pub fn is_recognized(code: &str) -> bool {
                Self::CODES.contains(&code)
            }

            /// Build from a parsed row. Unknown codes are returned, in key order, instead of stored.
            pub fn from_stats(stats: &StatMap) -> (Self, Vec<String>) {
                let mut line = Self::default();
                let mut ignored = Vec::new();
                for (code, &value) in stats {
                    match code.as_str() {
                        $($code => line.$field = Some(<$ty as StatField>::from_f64(value)),)*
                        _ => ignored.push(code.clone()),
                    }
                }
                (line, ignored)
            }

            pub fn values(&self) -> Vec<Option<StatValue>> {
                vec![$(self.$field.map(StatField::into_value)),*]
            }
        }
    };
}

stat_line! {
    /// Career batting totals from a player's footer summary row.
    BattingTotals {
        g: i64 = "G",
        pa: i64 = "PA",
        ab: i64 = "AB",
        r: i64 = "R",
        h: i64 = "H",
        doubles: i64 = "doubles",
        triples: i64 = "triples",
        hr: i64 = "HR",
        rbi: i64 = "RBI",
        sb: i64 = "SB",
        cs: i64 = "CS",
        bb: i64 = "BB",
        so: i64 = "SO",
        tb: i64 = "TB",
        gidp: i64 = "GIDP",
        hbp: i64 = "HBP",
        sh: i64 = "SH",
        sf: i64 = "SF",
        ibb: i64 = "IBB",
        batting_avg: f64 = "batting_avg",
        onbase_perc: f64 = "onbase_perc",
        slugging_perc: f64 = "slugging_perc",
        onbase_plus_slugging: f64 = "onbase_plus_slugging",
        onbase_plus_slugging_plus: f64 = "onbase_plus_slugging_plus",
    }
}

stat_line! {
    /// One game of a basketball game log.
    GameLine {
        mp: f64 = "mp",
        fg: f64 = "fg",
        fga: f64 = "fga",
        fg_pct: f64 = "fg_pct",
        fg3: f64 = "fg3",
        fg3_pct: f64 = "fg3_pct",
        ft: f64 = "ft",
        fta: f64 = "fta",
        ft_pct: f64 = "ft_pct",
        orb: f64 = "orb",
        drb: f64 = "drb",
        trb: f64 = "trb",
        ast: f64 = "ast",
        stl: f64 = "stl",
        blk: f64 = "blk",
        tov: f64 = "tov",
        pts: f64 = "pts",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CareerStats {
    pub player_id: String,
    pub name: String,
    pub position: String,
    pub totals: BattingTotals,
}

impl CareerStats {
    pub fn for_player(player: &Player, totals: BattingTotals) -> Self {
        Self {
            player_id: player.player_id.clone(),
            name: player.name.clone(),
            position: player.position.clone(),
            totals,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameStats {
    pub player_id: String,
    pub game: u32,
    pub line: GameLine,
}
