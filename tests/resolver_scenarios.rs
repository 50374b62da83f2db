//! End-to-end resolver scenarios: catalog priority, template expansion and
//! game synthesis, including reverse-match/generate round trips.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use spreadhawk::config::mappings::MarketMappings;
use spreadhawk::config::teams::TeamsConfig;
use spreadhawk::domain::{MatchType, Venue};
use spreadhawk::resolver::{games, templates, PairResolver};

const MAPPINGS_JSON: &str = r#"{
    "static": [
        {
            "name": "Fed rate decision",
            "category": "economics",
            "polymarket": "fed-decision-in-march",
            "kalshi": "KXFEDDECISION-26MAR"
        }
    ],
    "dynamic": [
        {
            "name": "Bitcoin monthly high",
            "category": "crypto",
            "frequency": "monthly",
            "polymarket": {"pattern": "what-price-will-bitcoin-hit-in-{month}"},
            "kalshi": {"series": "KXBTCMAX", "pattern": "KXBTCMAX-{yy}{MON}"}
        },
        {
            "name": "Bitcoin daily move",
            "category": "crypto",
            "frequency": "daily",
            "polymarket": {"pattern": "bitcoin-up-or-down-on-{month}-{day}"},
            "kalshi": {"series": "KXBTCD", "pattern": "KXBTCD-{yy}{MON}{dd}"}
        },
        {
            "name": "Presidential election",
            "category": "politics",
            "frequency": "yearly",
            "polymarket": {"pattern": "presidential-election-winner-{year}"},
            "kalshi": {"series": "KXPRES", "pattern": "KXPRES-{yy}"}
        }
    ]
}"#;

const TEAMS_JSON: &str = r#"{
    "nba": {"Phoenix Suns": ["suns"], "Miami Heat": ["heat"]},
    "nba_codes": {"PHX": "Phoenix Suns", "MIA": "Miami Heat"}
}"#;

fn resolver() -> PairResolver {
    let mappings: MarketMappings = serde_json::from_str(MAPPINGS_JSON).unwrap();
    let teams = TeamsConfig::from_json(TEAMS_JSON).unwrap();
    PairResolver::new(Arc::new(mappings), Arc::new(teams))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn monthly_slug_resolves_to_kalshi_ticker() {
    // A December slug seen with a 2025 reference date resolves to the
    // December 2025 ticker.
    let pair = resolver()
        .find_match(
            "what-price-will-bitcoin-hit-in-december",
            Venue::Polymarket,
            date(2025, 12, 1),
        )
        .expect("dynamic match");

    assert_eq!(pair.kalshi_ticker, "KXBTCMAX-25DEC");
    assert_eq!(pair.match_type, MatchType::Dynamic);
}

#[test]
fn year_default_is_reference_supplied() {
    // The same slug against a different reference year lands in that year.
    let pair = resolver()
        .find_match(
            "what-price-will-bitcoin-hit-in-december",
            Venue::Polymarket,
            date(2026, 12, 1),
        )
        .unwrap();

    assert_eq!(pair.kalshi_ticker, "KXBTCMAX-26DEC");
}

#[test]
fn nba_game_slug_round_trip() {
    let game = games::parse_game_slug("nba-phx-mia-2026-01-13").expect("game slug");
    assert_eq!(game.away, "phx");
    assert_eq!(game.home, "mia");
    assert_eq!(game.date, date(2026, 1, 13));
    assert_eq!(games::game_ticker(&game), "KXNBAGAME-26JAN13PHXMIA");

    let pair = resolver()
        .find_match("nba-phx-mia-2026-01-13", Venue::Polymarket, date(2026, 1, 1))
        .expect("game match");
    assert_eq!(pair.kalshi_ticker, "KXNBAGAME-26JAN13PHXMIA");
    assert_eq!(pair.match_type, MatchType::Game);
    assert_eq!(pair.date, Some(date(2026, 1, 13)));
}

#[test]
fn static_catalog_takes_priority() {
    let pair = resolver()
        .find_match("FED-DECISION-IN-MARCH", Venue::Polymarket, date(2026, 3, 1))
        .unwrap();
    assert_eq!(pair.match_type, MatchType::Static);
    assert_eq!(pair.kalshi_ticker, "KXFEDDECISION-26MAR");
}

#[test]
fn template_generation_and_matching_are_inverse() {
    let patterns = [
        ("what-price-will-bitcoin-hit-in-{month}", "KXBTCMAX-{yy}{MON}"),
        ("bitcoin-up-or-down-on-{month}-{day}", "KXBTCD-{yy}{MON}{dd}"),
        ("presidential-election-winner-{year}", "KXPRES-{yy}"),
    ];
    let dates = [
        date(2025, 1, 1),
        date(2025, 12, 31),
        date(2026, 2, 28),
        date(2027, 7, 4),
    ];

    for (poly_pattern, kalshi_pattern) in patterns {
        for d in dates {
            let slug = templates::generate_polymarket_slug(poly_pattern, d);
            let matched = templates::match_polymarket_slug(poly_pattern, &slug, d)
                .unwrap_or_else(|| panic!("{poly_pattern} failed on {d}"));
            // Fields absent from the pattern default to the period start, so
            // compare only what the pattern encodes.
            if poly_pattern.contains("{day}") {
                assert_eq!(matched.day(), d.day(), "{poly_pattern} day on {d}");
            }
            if poly_pattern.contains("{month}") {
                assert_eq!(matched.month(), d.month(), "{poly_pattern} month on {d}");
            }
            if poly_pattern.contains("{year}") {
                assert_eq!(matched.year(), d.year(), "{poly_pattern} year on {d}");
            }

            let ticker = templates::generate_kalshi_ticker(kalshi_pattern, d);
            let matched = templates::match_kalshi_ticker(kalshi_pattern, &ticker, d)
                .unwrap_or_else(|| panic!("{kalshi_pattern} failed on {d}"));
            assert_eq!(matched.year(), d.year(), "{kalshi_pattern} year on {d}");
        }
    }
}

#[test]
fn unknown_identifiers_resolve_to_nothing() {
    let r = resolver();
    assert!(r
        .find_match("some-random-event", Venue::Polymarket, date(2026, 1, 1))
        .is_none());
    assert!(r
        .find_match("KXUNKNOWN-26JAN", Venue::Kalshi, date(2026, 1, 1))
        .is_none());
    // Known pattern shape, unknown team code.
    assert!(r
        .find_match("nba-zzz-mia-2026-01-13", Venue::Polymarket, date(2026, 1, 1))
        .is_none());
}
