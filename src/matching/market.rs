//! Intra-event market alignment.
//!
//! Once the pair resolver has matched two events, individual binary markets
//! still have to be lined up. Team-sports events align on canonical team,
//! single NBA games go through moneyline detection, and everything else falls
//! back to question-token overlap.

use std::collections::HashSet;

use tracing::{debug, info};

use super::text::{jaccard_similarity, significant_tokens, tokenize};
use crate::config::teams::TeamsConfig;
use crate::domain::{
    BookKey, MarketPair, MarketQuote, MarketRef, MatchType, MatchedPair, Ticker, TokenId,
};
use crate::resolver::games::parse_game_slug;

/// Question substrings that disqualify a Polymarket game market from being
/// the moneyline. Props, spreads, totals and period markets all contain one.
const MONEYLINE_STOPLIST: &[&str] = &[
    "spread",
    "o/u",
    "over",
    "under",
    "total",
    "points",
    "rebounds",
    "assists",
    "steals",
    "blocks",
    "three",
    "3-pointer",
    "quarter",
    "half",
    "1st",
    "2nd",
    "3rd",
    "4th",
    "first",
    "second",
    "1h",
    "2h",
    "moneyline",
];

/// Minimum question-token Jaccard for a generic pairing.
const GENERIC_MIN_OVERLAP: f64 = 0.5;

const TEAM_MATCH_CONFIDENCE: f64 = 0.95;
const GAME_MATCH_CONFIDENCE: f64 = 1.0;

pub struct MarketMatcher<'a> {
    teams: &'a TeamsConfig,
}

impl<'a> MarketMatcher<'a> {
    #[must_use]
    pub const fn new(teams: &'a TeamsConfig) -> Self {
        Self { teams }
    }

    /// Align the markets of a matched event pair.
    #[must_use]
    pub fn match_event(
        &self,
        matched: &MatchedPair,
        polymarket: &[MarketRef],
        kalshi: &[MarketRef],
        image_url: Option<&str>,
    ) -> Vec<MarketPair> {
        if matched.match_type == MatchType::Game {
            return self.match_game(matched, polymarket, kalshi, image_url);
        }

        if let Some(league) = self.teams.detect_league(&matched.name) {
            let league = league.to_string();
            return self.match_team_sports(matched, &league, polymarket, kalshi, image_url);
        }

        self.match_generic(matched, polymarket, kalshi, image_url)
    }

    /// Team-championship style events: one market per team on both venues.
    fn match_team_sports(
        &self,
        matched: &MatchedPair,
        league: &str,
        polymarket: &[MarketRef],
        kalshi: &[MarketRef],
        image_url: Option<&str>,
    ) -> Vec<MarketPair> {
        let mut pairs = Vec::new();
        let mut used: HashSet<usize> = HashSet::new();

        for poly in polymarket {
            let Some((poly_quote, tokens)) = poly_parts(poly) else {
                continue;
            };

            let matched_kalshi = kalshi.iter().enumerate().find(|(i, k)| {
                !used.contains(i) && self.teams.is_same_team(&poly.question, &k.question, league)
            });

            if let Some((i, k)) = matched_kalshi {
                let Some((kalshi_quote, ticker)) = kalshi_parts(k) else {
                    continue;
                };
                used.insert(i);
                pairs.push(build_pair(
                    matched,
                    poly.question.clone(),
                    poly_quote,
                    kalshi_quote,
                    tokens,
                    ticker,
                    TEAM_MATCH_CONFIDENCE,
                    poly,
                    k,
                    image_url,
                ));
            }
        }

        pairs
    }

    /// Single NBA game: locate the moneyline market and pair each team side
    /// against the Kalshi ticker suffixed with that team's code.
    fn match_game(
        &self,
        matched: &MatchedPair,
        polymarket: &[MarketRef],
        kalshi: &[MarketRef],
        image_url: Option<&str>,
    ) -> Vec<MarketPair> {
        let Some(game) = parse_game_slug(&matched.polymarket_slug) else {
            debug!(slug = %matched.polymarket_slug, "Not a game slug, skipping");
            return Vec::new();
        };

        let (Some(away_name), Some(home_name)) = (
            self.teams.team_from_code(&game.away),
            self.teams.team_from_code(&game.home),
        ) else {
            debug!(away = %game.away, home = %game.home, "Unknown team code, skipping game");
            return Vec::new();
        };

        let Some(moneyline) = polymarket.iter().find(|m| is_moneyline(&m.question)) else {
            debug!(slug = %matched.polymarket_slug, "No moneyline market found");
            return Vec::new();
        };
        info!(question = %moneyline.question, "Moneyline accepted");

        let Some((quote, (token_first, token_second))) = poly_parts(moneyline) else {
            return Vec::new();
        };

        // The first team mentioned in the question owns outcome index 0.
        let (first_part, second_part) = match split_matchup(&moneyline.question) {
            Some(parts) => parts,
            None => return Vec::new(),
        };
        let first_team = self.teams.canonical_team("nba", &first_part);
        let second_team = self.teams.canonical_team("nba", &second_part);
        if first_team.is_none() && second_team.is_none() {
            debug!(question = %moneyline.question, "Could not identify matchup teams");
            return Vec::new();
        }
        let away_is_first = first_team.as_deref() == Some(away_name)
            || second_team.as_deref() == Some(home_name);

        let mut pairs = Vec::new();
        for (team_name, code, team_is_first) in [
            (away_name, game.away.as_str(), away_is_first),
            (home_name, game.home.as_str(), !away_is_first),
        ] {
            let suffix = format!("-{}", code.to_uppercase());
            let Some(k) = kalshi
                .iter()
                .find(|k| ticker_of(k).is_some_and(|t| t.as_str().ends_with(&suffix)))
            else {
                continue;
            };
            let Some((kalshi_quote, ticker)) = kalshi_parts(k) else {
                continue;
            };

            // Preserve token order: index 0 is YES-for-first-team-mentioned.
            let (poly_quote, tokens) = if team_is_first {
                (quote.clone(), (token_first.clone(), token_second.clone()))
            } else {
                (
                    MarketQuote {
                        question: quote.question.clone(),
                        yes_price: quote.no_price,
                        no_price: quote.yes_price,
                    },
                    (token_second.clone(), token_first.clone()),
                )
            };

            pairs.push(build_pair(
                matched,
                format!("{} ({team_name})", matched.name),
                poly_quote,
                kalshi_quote,
                tokens,
                ticker,
                GAME_MATCH_CONFIDENCE,
                moneyline,
                k,
                image_url,
            ));
        }

        pairs
    }

    /// Everything else: pair on normalized-question token overlap.
    fn match_generic(
        &self,
        matched: &MatchedPair,
        polymarket: &[MarketRef],
        kalshi: &[MarketRef],
        image_url: Option<&str>,
    ) -> Vec<MarketPair> {
        let mut pairs = Vec::new();
        let mut used: HashSet<usize> = HashSet::new();

        for poly in polymarket {
            let poly_tokens: HashSet<String> = tokenize(&poly.question).into_iter().collect();
            let poly_significant = significant_tokens(&poly.question);

            let mut best: Option<(usize, f64)> = None;
            for (i, k) in kalshi.iter().enumerate() {
                if used.contains(&i) {
                    continue;
                }
                // No extractable entity on either side means nothing to match on.
                if poly_significant.is_empty() && significant_tokens(&k.question).is_empty() {
                    continue;
                }
                let k_tokens: HashSet<String> = tokenize(&k.question).into_iter().collect();
                let score = jaccard_similarity(&poly_tokens, &k_tokens);
                if score >= GENERIC_MIN_OVERLAP
                    && best.map_or(true, |(_, prev)| score > prev)
                {
                    best = Some((i, score));
                }
            }

            if let Some((i, score)) = best {
                let Some((poly_quote, tokens)) = poly_parts(poly) else {
                    continue;
                };
                let Some((kalshi_quote, ticker)) = kalshi_parts(&kalshi[i]) else {
                    continue;
                };
                used.insert(i);
                pairs.push(build_pair(
                    matched,
                    poly.question.clone(),
                    poly_quote,
                    kalshi_quote,
                    tokens,
                    ticker,
                    score,
                    poly,
                    &kalshi[i],
                    image_url,
                ));
            }
        }

        pairs
    }
}

/// Moneyline detection: a matchup question with none of the prop markers.
fn is_moneyline(question: &str) -> bool {
    let q = question.to_lowercase();
    q.contains("vs.") && !MONEYLINE_STOPLIST.iter().any(|stop| q.contains(stop))
}

/// Split a `"Suns vs. Heat"` style question into team halves.
fn split_matchup(question: &str) -> Option<(String, String)> {
    let lower = question.to_lowercase();
    let idx = lower.find("vs.")?;
    let first = question[..idx].trim().to_string();
    let second = question[idx + 3..].trim().trim_end_matches('?').to_string();
    if first.is_empty() || second.is_empty() {
        return None;
    }
    Some((first, second))
}

fn poly_parts(m: &MarketRef) -> Option<(MarketQuote, (TokenId, TokenId))> {
    let BookKey::Tokens { yes, no } = &m.book_key else {
        return None;
    };
    let (yes_price, no_price) = m.quotes()?;
    Some((
        MarketQuote {
            question: m.question.clone(),
            yes_price,
            no_price,
        },
        (yes.clone(), no.clone()),
    ))
}

fn kalshi_parts(m: &MarketRef) -> Option<(MarketQuote, Ticker)> {
    let ticker = ticker_of(m)?.clone();
    let (yes_price, no_price) = m.quotes()?;
    Some((
        MarketQuote {
            question: m.question.clone(),
            yes_price,
            no_price,
        },
        ticker,
    ))
}

fn ticker_of(m: &MarketRef) -> Option<&Ticker> {
    match &m.book_key {
        BookKey::Ticker(t) => Some(t),
        BookKey::Tokens { .. } => None,
    }
}

#[allow(clippy::too_many_arguments)]
fn build_pair(
    matched: &MatchedPair,
    name: String,
    polymarket: MarketQuote,
    kalshi: MarketQuote,
    tokens: (TokenId, TokenId),
    ticker: Ticker,
    confidence: f64,
    poly_market: &MarketRef,
    kalshi_market: &MarketRef,
    image_url: Option<&str>,
) -> MarketPair {
    let end_date = match (poly_market.end_date, kalshi_market.end_date) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };

    MarketPair {
        name,
        category: matched.category.clone(),
        polymarket,
        kalshi,
        polymarket_tokens: tokens,
        kalshi_ticker: ticker,
        confidence,
        end_date,
        image_url: image_url.map(str::to_string),
        polymarket_slug: matched.polymarket_slug.clone(),
    }
}
