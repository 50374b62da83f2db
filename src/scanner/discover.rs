//! Fuzzy pair discovery over fetched event corpora.
//!
//! Events already in hand for a scan tick are blocked, scored and classified;
//! confirmations and rejections land in the persistent match cache so the
//! next tick resolves them without re-scoring.

use tracing::{debug, info};

use crate::domain::{EventRef, MarketRef, MatchType, MatchedPair};
use crate::matching::blocking::{BlockingIndex, BlockingInput};
use crate::matching::fuzzy::{
    classify, score_candidate, ConfirmedMatch, EventDigest, MatchCache, MatchClass,
};

/// Block, score and classify every cross-venue candidate pair.
///
/// Returns the newly confirmed pairs; the cache accumulates confirmations
/// and rejections either way.
pub fn discover_fuzzy(
    polymarket_events: &[(EventRef, Vec<MarketRef>)],
    kalshi_events: &[(EventRef, Vec<MarketRef>)],
    cache: &mut MatchCache,
) -> Vec<MatchedPair> {
    if polymarket_events.is_empty() || kalshi_events.is_empty() {
        return Vec::new();
    }

    let poly_index = BlockingIndex::build(&blocking_inputs(polymarket_events));
    let kalshi_index = BlockingIndex::build(&blocking_inputs(kalshi_events));
    let (candidates, stats) = poly_index.candidate_pairs(&kalshi_index);

    debug!(
        total_potential = stats.total_potential,
        actual = stats.actual,
        reduction_pct = %format!("{:.1}", stats.reduction_pct),
        "Blocking reduced candidate pairs"
    );

    let mut confirmed = Vec::new();
    for (poly_id, kalshi_id) in candidates {
        if cache.is_rejected(&poly_id, &kalshi_id) {
            continue;
        }
        if cache.get_confirmed(&poly_id, &kalshi_id).is_some() {
            // Already resolved by a previous tick; the resolver seeds it.
            continue;
        }

        let (Some(poly), Some(kalshi)) = (
            find_event(polymarket_events, &poly_id),
            find_event(kalshi_events, &kalshi_id),
        ) else {
            continue;
        };

        let candidate = score_candidate(&digest(poly), &digest(kalshi));
        match classify(candidate.score) {
            MatchClass::Confirmed => {
                info!(
                    polymarket = %poly.0.identifier,
                    kalshi = %kalshi.0.identifier,
                    score = %format!("{:.3}", candidate.score),
                    "Fuzzy match confirmed"
                );
                cache.record_confirmed(ConfirmedMatch {
                    polymarket_id: poly_id,
                    kalshi_id,
                    polymarket_slug: poly.0.identifier.clone(),
                    kalshi_ticker: kalshi.0.identifier.clone(),
                    score: candidate.score,
                    confirmed_at: chrono::Utc::now(),
                });
                confirmed.push(MatchedPair {
                    name: poly.0.title.clone(),
                    category: poly
                        .0
                        .category
                        .clone()
                        .unwrap_or_else(|| "uncategorized".into()),
                    polymarket_slug: poly.0.identifier.clone(),
                    kalshi_ticker: kalshi.0.identifier.clone(),
                    kalshi_series: None,
                    date: None,
                    match_type: MatchType::Fuzzy,
                });
            }
            MatchClass::Uncertain => {
                debug!(
                    polymarket = %poly.0.identifier,
                    kalshi = %kalshi.0.identifier,
                    score = %format!("{:.3}", candidate.score),
                    "Fuzzy match uncertain, not recorded"
                );
            }
            MatchClass::Discarded => {
                cache.record_rejected(poly_id, kalshi_id);
            }
        }
    }

    confirmed
}

fn blocking_inputs(events: &[(EventRef, Vec<MarketRef>)]) -> Vec<BlockingInput> {
    events
        .iter()
        .map(|(event, markets)| BlockingInput {
            event_id: event.id.clone(),
            title: event.title.clone(),
            category: event.category.clone(),
            market_questions: markets.iter().map(|m| m.question.clone()).collect(),
        })
        .collect()
}

fn find_event<'a>(
    events: &'a [(EventRef, Vec<MarketRef>)],
    id: &str,
) -> Option<&'a (EventRef, Vec<MarketRef>)> {
    events.iter().find(|(event, _)| event.id == id)
}

fn digest(entry: &(EventRef, Vec<MarketRef>)) -> EventDigest {
    EventDigest {
        event_id: entry.0.id.clone(),
        title: entry.0.title.clone(),
        earliest_end: entry.1.iter().filter_map(|m| m.end_date).min(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BookKey, Ticker, TokenId, Venue};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn poly_event(id: &str, slug: &str, title: &str) -> (EventRef, Vec<MarketRef>) {
        let event = EventRef {
            venue: Venue::Polymarket,
            id: id.to_string(),
            identifier: slug.to_string(),
            title: title.to_string(),
            category: Some("crypto".into()),
            image_url: None,
        };
        let market = MarketRef {
            venue: Venue::Polymarket,
            id: format!("{id}-m"),
            question: title.to_string(),
            event_id: id.to_string(),
            end_date: Some(Utc.with_ymd_and_hms(2025, 12, 31, 0, 0, 0).unwrap()),
            yes_price: Some(dec!(0.5)),
            no_price: Some(dec!(0.5)),
            book_key: BookKey::Tokens {
                yes: TokenId::from("y"),
                no: TokenId::from("n"),
            },
        };
        (event, vec![market])
    }

    fn kalshi_event(id: &str, title: &str) -> (EventRef, Vec<MarketRef>) {
        let event = EventRef {
            venue: Venue::Kalshi,
            id: id.to_string(),
            identifier: id.to_string(),
            title: title.to_string(),
            category: Some("crypto".into()),
            image_url: None,
        };
        let market = MarketRef {
            venue: Venue::Kalshi,
            id: format!("{id}-1"),
            question: title.to_string(),
            event_id: id.to_string(),
            end_date: Some(Utc.with_ymd_and_hms(2025, 12, 31, 0, 0, 0).unwrap()),
            yes_price: Some(dec!(0.5)),
            no_price: Some(dec!(0.5)),
            book_key: BookKey::Ticker(Ticker::from(id)),
        };
        (event, vec![market])
    }

    #[test]
    fn identical_events_confirm_and_cache() {
        let poly = vec![poly_event(
            "p1",
            "bitcoin-price-december-2025",
            "Bitcoin price December 2025",
        )];
        let kalshi = vec![kalshi_event("KXBTC-25DEC", "Bitcoin price December 2025")];
        let mut cache = MatchCache::in_memory();

        let confirmed = discover_fuzzy(&poly, &kalshi, &mut cache);

        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].polymarket_slug, "bitcoin-price-december-2025");
        assert_eq!(confirmed[0].match_type, MatchType::Fuzzy);
        assert!(cache.get_confirmed("p1", "KXBTC-25DEC").is_some());

        // Second pass resolves through the cache, not a fresh confirmation.
        let again = discover_fuzzy(&poly, &kalshi, &mut cache);
        assert!(again.is_empty());
    }

    #[test]
    fn unrelated_events_are_rejected_once() {
        // Shared "2025" token gets them past blocking but not past scoring.
        let poly = vec![poly_event("p1", "senate-2025", "Senate majority 2025")];
        let kalshi = vec![kalshi_event(
            "KXBTC-25DEC",
            "Ethereum staking yield above threshold 2025",
        )];
        let mut cache = MatchCache::in_memory();

        let confirmed = discover_fuzzy(&poly, &kalshi, &mut cache);

        assert!(confirmed.is_empty());
        assert!(cache.is_rejected("p1", "KXBTC-25DEC"));
    }

    #[test]
    fn blocked_out_pairs_are_never_scored() {
        let poly = vec![poly_event("p1", "senate-control", "Senate majority outcome")];
        let kalshi = vec![kalshi_event("KXBTC", "Bitcoin maximum price")];
        let mut cache = MatchCache::in_memory();

        let confirmed = discover_fuzzy(&poly, &kalshi, &mut cache);

        assert!(confirmed.is_empty());
        // No shared key, so the pair was never a candidate and is not
        // recorded as rejected either.
        assert!(!cache.is_rejected("p1", "KXBTC"));
    }
}
