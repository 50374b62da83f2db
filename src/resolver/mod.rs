//! Cross-venue pair resolution.
//!
//! Three mapping sources are consulted in priority order: the static catalog,
//! dynamic date templates, and sports-game slug/ticker synthesis. Events no
//! mapping covers go through the fuzzy matcher (see
//! [`crate::matching::fuzzy`]), whose confirmed results feed back in through
//! the match cache.

pub mod catalog;
pub mod games;
pub mod templates;

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::config::mappings::{DynamicMapping, MarketMappings};
use crate::config::teams::TeamsConfig;
use crate::domain::{MatchType, MatchedPair, Venue};
use crate::matching::fuzzy::ConfirmedMatch;

pub struct PairResolver {
    mappings: Arc<MarketMappings>,
    teams: Arc<TeamsConfig>,
}

impl PairResolver {
    #[must_use]
    pub fn new(mappings: Arc<MarketMappings>, teams: Arc<TeamsConfig>) -> Self {
        Self { mappings, teams }
    }

    /// Resolve an identifier on one venue to its counterpart pair.
    ///
    /// Tries the static catalog, then dynamic templates, then game synthesis.
    /// `reference` supplies the year for date templates that omit one.
    #[must_use]
    pub fn find_match(
        &self,
        identifier: &str,
        venue: Venue,
        reference: NaiveDate,
    ) -> Option<MatchedPair> {
        if let Some(pair) = self.match_static(identifier, venue) {
            return Some(pair);
        }
        if let Some(pair) = self.match_dynamic(identifier, venue, reference) {
            return Some(pair);
        }
        self.match_game(identifier, venue)
    }

    fn match_static(&self, identifier: &str, venue: Venue) -> Option<MatchedPair> {
        let mapping = match venue {
            Venue::Polymarket => catalog::by_polymarket_slug(&self.mappings, identifier),
            Venue::Kalshi => catalog::by_kalshi_ticker(&self.mappings, identifier),
        }?;
        Some(catalog::to_matched_pair(mapping, None))
    }

    fn match_dynamic(
        &self,
        identifier: &str,
        venue: Venue,
        reference: NaiveDate,
    ) -> Option<MatchedPair> {
        for mapping in &self.mappings.dynamic_mappings {
            let date = match venue {
                Venue::Polymarket => {
                    templates::match_polymarket_slug(&mapping.polymarket.pattern, identifier, reference)
                }
                Venue::Kalshi => {
                    templates::match_kalshi_ticker(&mapping.kalshi.pattern, identifier, reference)
                }
            };
            if let Some(date) = date {
                return Some(expand_mapping(mapping, date));
            }
        }
        None
    }

    fn match_game(&self, identifier: &str, venue: Venue) -> Option<MatchedPair> {
        let game = match venue {
            Venue::Polymarket => games::parse_game_slug(identifier),
            Venue::Kalshi => games::parse_game_ticker(identifier),
        }?;

        if !games::codes_known(&game, &self.teams) {
            debug!(away = %game.away, home = %game.home, "Unknown team code, skipping game");
            return None;
        }

        Some(game_pair(&game, &self.teams))
    }

    /// Expand every dynamic template for the dates in `[from, from + days)`,
    /// deduplicated by slug.
    #[must_use]
    pub fn expand_dynamic(&self, from: NaiveDate, days: u32) -> Vec<MatchedPair> {
        let mut pairs: Vec<MatchedPair> = Vec::new();
        for mapping in &self.mappings.dynamic_mappings {
            for offset in 0..days.max(1) {
                let date = from + Duration::days(i64::from(offset));
                let pair = expand_mapping(mapping, date);
                if !pairs.iter().any(|p| p.polymarket_slug == pair.polymarket_slug) {
                    pairs.push(pair);
                }
            }
        }
        pairs
    }

    /// Pairs recorded by earlier fuzzy-match confirmations.
    #[must_use]
    pub fn from_confirmed(&self, confirmed: &[&ConfirmedMatch]) -> Vec<MatchedPair> {
        confirmed
            .iter()
            .map(|m| MatchedPair {
                name: m.polymarket_slug.replace('-', " "),
                category: "uncategorized".into(),
                polymarket_slug: m.polymarket_slug.clone(),
                kalshi_ticker: m.kalshi_ticker.clone(),
                kalshi_series: None,
                date: None,
                match_type: MatchType::Fuzzy,
            })
            .collect()
    }
}

fn expand_mapping(mapping: &DynamicMapping, date: NaiveDate) -> MatchedPair {
    MatchedPair {
        name: mapping.name.clone(),
        category: mapping.category.clone(),
        polymarket_slug: templates::generate_polymarket_slug(&mapping.polymarket.pattern, date),
        kalshi_ticker: templates::generate_kalshi_ticker(&mapping.kalshi.pattern, date),
        kalshi_series: Some(mapping.kalshi.series.clone()),
        date: Some(date),
        match_type: MatchType::Dynamic,
    }
}

fn game_pair(game: &games::GameInfo, teams: &TeamsConfig) -> MatchedPair {
    let away = teams.team_from_code(&game.away).unwrap_or(&game.away);
    let home = teams.team_from_code(&game.home).unwrap_or(&game.home);
    MatchedPair {
        name: format!("{away} @ {home}"),
        category: "nba".into(),
        polymarket_slug: games::game_slug(game),
        kalshi_ticker: games::game_ticker(game),
        kalshi_series: Some("KXNBAGAME".into()),
        date: Some(game.date),
        match_type: MatchType::Game,
    }
}
