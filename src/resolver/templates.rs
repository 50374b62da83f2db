//! Date-templated slug/ticker expansion.
//!
//! Dynamic mappings declare one pattern per venue. Polymarket patterns use
//! `{year}`, `{month}` (lowercase full name) and `{day}`; Kalshi patterns use
//! `{yy}`, `{MON}` (3-letter uppercase) and `{dd}`. Forward generation
//! substitutes a date; reverse matching turns the pattern into a regex,
//! escapes its literals and parses the captures back into a date.
//!
//! A pattern without an explicit year can match year-round, so reverse
//! matching takes a caller-supplied reference date instead of consulting the
//! clock.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use tracing::warn;

const MONTHS_FULL: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const MONTHS_ABBREV: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Generate a Polymarket slug for `date`.
#[must_use]
pub fn generate_polymarket_slug(pattern: &str, date: NaiveDate) -> String {
    pattern
        .replace("{year}", &date.year().to_string())
        .replace("{month}", MONTHS_FULL[date.month0() as usize])
        .replace("{day}", &date.day().to_string())
}

/// Generate a Kalshi ticker for `date`.
#[must_use]
pub fn generate_kalshi_ticker(pattern: &str, date: NaiveDate) -> String {
    pattern
        .replace("{yy}", &format!("{:02}", date.year() % 100))
        .replace("{MON}", MONTHS_ABBREV[date.month0() as usize])
        .replace("{dd}", &format!("{:02}", date.day()))
}

/// Fields captured while reverse-matching a pattern.
#[derive(Debug, Default, Clone, Copy)]
struct CapturedDate {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
}

impl CapturedDate {
    /// Fill missing fields from the reference date (year) or period start
    /// (month, day) and build a date.
    fn resolve(self, reference: NaiveDate) -> Option<NaiveDate> {
        let year = self.year.unwrap_or(reference.year());
        let month = self.month.unwrap_or(1);
        let day = self.day.unwrap_or(1);
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

/// Reverse-match a Polymarket slug against a pattern.
///
/// Returns the date the slug encodes, with an absent year defaulting to
/// `reference`'s year.
#[must_use]
pub fn match_polymarket_slug(
    pattern: &str,
    slug: &str,
    reference: NaiveDate,
) -> Option<NaiveDate> {
    let (regex, fields) = compile_pattern(
        pattern,
        &[
            ("{year}", r"(\d{4})"),
            ("{month}", r"([a-z]+)"),
            ("{day}", r"(\d{1,2})"),
        ],
    )?;

    let slug_lower = slug.to_lowercase();
    let caps = regex.captures(&slug_lower)?;
    let mut captured = CapturedDate::default();
    for (i, field) in fields.iter().enumerate() {
        let value = caps.get(i + 1)?.as_str();
        match *field {
            "{year}" => captured.year = Some(value.parse().ok()?),
            "{month}" => {
                captured.month =
                    Some(MONTHS_FULL.iter().position(|m| *m == value)? as u32 + 1);
            }
            "{day}" => captured.day = Some(value.parse().ok()?),
            _ => unreachable!(),
        }
    }
    captured.resolve(reference)
}

/// Reverse-match a Kalshi ticker against a pattern.
#[must_use]
pub fn match_kalshi_ticker(pattern: &str, ticker: &str, reference: NaiveDate) -> Option<NaiveDate> {
    let (regex, fields) = compile_pattern(
        pattern,
        &[
            ("{yy}", r"(\d{2})"),
            ("{MON}", r"([A-Z]{3})"),
            ("{dd}", r"(\d{2})"),
        ],
    )?;

    let ticker_upper = ticker.to_uppercase();
    let caps = regex.captures(&ticker_upper)?;
    let mut captured = CapturedDate::default();
    for (i, field) in fields.iter().enumerate() {
        let value = caps.get(i + 1)?.as_str();
        match *field {
            "{yy}" => captured.year = Some(2000 + value.parse::<i32>().ok()?),
            "{MON}" => {
                captured.month =
                    Some(MONTHS_ABBREV.iter().position(|m| *m == value)? as u32 + 1);
            }
            "{dd}" => captured.day = Some(value.parse().ok()?),
            _ => unreachable!(),
        }
    }
    captured.resolve(reference)
}

/// Escape the pattern's literal segments and substitute capture groups,
/// recording placeholder order for capture extraction.
fn compile_pattern(
    pattern: &str,
    placeholders: &[(&'static str, &'static str)],
) -> Option<(Regex, Vec<&'static str>)> {
    // Locate placeholders in appearance order.
    let mut found: Vec<(usize, &'static str, &'static str)> = Vec::new();
    for (name, group) in placeholders {
        let mut start = 0;
        while let Some(pos) = pattern[start..].find(name) {
            found.push((start + pos, name, group));
            start += pos + name.len();
        }
    }
    found.sort_by_key(|(pos, _, _)| *pos);

    let mut regex_src = String::from("^");
    let mut fields = Vec::with_capacity(found.len());
    let mut cursor = 0;
    for (pos, name, group) in found {
        regex_src.push_str(&regex::escape(&pattern[cursor..pos]));
        regex_src.push_str(group);
        fields.push(name);
        cursor = pos + name.len();
    }
    regex_src.push_str(&regex::escape(&pattern[cursor..]));
    regex_src.push('$');

    match Regex::new(&regex_src) {
        Ok(regex) => Some((regex, fields)),
        Err(e) => {
            warn!(pattern, error = %e, "Invalid template pattern");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn generates_polymarket_slug_from_date() {
        let slug = generate_polymarket_slug(
            "what-price-will-bitcoin-hit-in-{month}",
            date(2025, 12, 1),
        );
        assert_eq!(slug, "what-price-will-bitcoin-hit-in-december");
    }

    #[test]
    fn generates_kalshi_ticker_from_date() {
        let ticker = generate_kalshi_ticker("KXBTCMAX-{yy}{MON}", date(2025, 12, 1));
        assert_eq!(ticker, "KXBTCMAX-25DEC");
    }

    #[test]
    fn monthly_slug_resolves_with_reference_year() {
        let matched = match_polymarket_slug(
            "what-price-will-bitcoin-hit-in-{month}",
            "what-price-will-bitcoin-hit-in-december",
            date(2025, 12, 1),
        );
        assert_eq!(matched, Some(date(2025, 12, 1)));
    }

    #[test]
    fn daily_slug_with_full_date() {
        let matched = match_polymarket_slug(
            "bitcoin-up-or-down-on-{month}-{day}",
            "bitcoin-up-or-down-on-march-7",
            date(2026, 1, 1),
        );
        assert_eq!(matched, Some(date(2026, 3, 7)));
    }

    #[test]
    fn explicit_year_overrides_reference() {
        let matched = match_polymarket_slug(
            "presidential-election-winner-{year}",
            "presidential-election-winner-2028",
            date(2026, 6, 1),
        );
        assert_eq!(matched, Some(date(2028, 1, 1)));
    }

    #[test]
    fn kalshi_ticker_reverse_match() {
        let matched = match_kalshi_ticker("KXBTCMAX-{yy}{MON}", "KXBTCMAX-25DEC", date(2020, 1, 1));
        assert_eq!(matched, Some(date(2025, 12, 1)));
    }

    #[test]
    fn kalshi_daily_ticker_reverse_match() {
        let matched =
            match_kalshi_ticker("KXBTCD-{yy}{MON}{dd}", "KXBTCD-26MAR07", date(2020, 1, 1));
        assert_eq!(matched, Some(date(2026, 3, 7)));
    }

    #[test]
    fn mismatched_slug_returns_none() {
        assert!(match_polymarket_slug(
            "what-price-will-bitcoin-hit-in-{month}",
            "what-price-will-ethereum-hit-in-december",
            date(2025, 12, 1),
        )
        .is_none());
        assert!(match_polymarket_slug(
            "what-price-will-bitcoin-hit-in-{month}",
            "what-price-will-bitcoin-hit-in-decembra",
            date(2025, 12, 1),
        )
        .is_none());
    }

    #[test]
    fn generation_and_matching_round_trip() {
        let pattern = "bitcoin-up-or-down-on-{month}-{day}";
        let d = date(2026, 7, 4);
        let slug = generate_polymarket_slug(pattern, d);
        assert_eq!(match_polymarket_slug(pattern, &slug, d), Some(d));

        let kpattern = "KXBTCD-{yy}{MON}{dd}";
        let ticker = generate_kalshi_ticker(kpattern, d);
        assert_eq!(match_kalshi_ticker(kpattern, &ticker, d), Some(d));
    }
}
