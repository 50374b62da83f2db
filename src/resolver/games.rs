//! NBA game slug ↔ ticker synthesis.
//!
//! Polymarket names single games `nba-{away}-{home}-YYYY-MM-DD`; Kalshi uses
//! `KXNBAGAME-YYMONDDAWAYHOME`. Either side can be generated from the other.
//! Team codes are resolved through the `nba_codes` table; games with unknown
//! codes are skipped.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

use crate::config::teams::TeamsConfig;

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// A parsed single-game identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameInfo {
    /// Away team 3-letter code, lowercase.
    pub away: String,
    /// Home team 3-letter code, lowercase.
    pub home: String,
    pub date: NaiveDate,
}

fn slug_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^nba-([a-z]{3})-([a-z]{3})-(\d{4})-(\d{2})-(\d{2})$").expect("game slug regex")
    })
}

fn ticker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^KXNBAGAME-(\d{2})([A-Z]{3})(\d{2})([A-Z]{3})([A-Z]{3})$")
            .expect("game ticker regex")
    })
}

/// Parse a Polymarket game slug like `nba-phx-mia-2026-01-13`.
#[must_use]
pub fn parse_game_slug(slug: &str) -> Option<GameInfo> {
    let slug_lower = slug.to_lowercase();
    let caps = slug_regex().captures(&slug_lower)?;
    let date = NaiveDate::from_ymd_opt(
        caps[3].parse().ok()?,
        caps[4].parse().ok()?,
        caps[5].parse().ok()?,
    )?;
    Some(GameInfo {
        away: caps[1].to_string(),
        home: caps[2].to_string(),
        date,
    })
}

/// Parse a Kalshi game ticker like `KXNBAGAME-26JAN13PHXMIA`.
#[must_use]
pub fn parse_game_ticker(ticker: &str) -> Option<GameInfo> {
    let ticker_upper = ticker.to_uppercase();
    let caps = ticker_regex().captures(&ticker_upper)?;
    let year = 2000 + caps[1].parse::<i32>().ok()?;
    let month = MONTHS.iter().position(|m| *m == &caps[2])? as u32 + 1;
    let day: u32 = caps[3].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(GameInfo {
        away: caps[4].to_lowercase(),
        home: caps[5].to_lowercase(),
        date,
    })
}

/// Generate the Polymarket slug for a game.
#[must_use]
pub fn game_slug(game: &GameInfo) -> String {
    format!(
        "nba-{}-{}-{}",
        game.away,
        game.home,
        game.date.format("%Y-%m-%d")
    )
}

/// Generate the Kalshi event ticker for a game.
#[must_use]
pub fn game_ticker(game: &GameInfo) -> String {
    format!(
        "KXNBAGAME-{:02}{}{:02}{}{}",
        game.date.year() % 100,
        MONTHS[game.date.month0() as usize],
        game.date.day(),
        game.away.to_uppercase(),
        game.home.to_uppercase()
    )
}

/// Whether both team codes resolve to known teams.
#[must_use]
pub fn codes_known(game: &GameInfo, teams: &TeamsConfig) -> bool {
    teams.team_from_code(&game.away).is_some() && teams.team_from_code(&game.home).is_some()
}
