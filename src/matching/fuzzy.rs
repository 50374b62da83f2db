//! Fuzzy event matching over blocking candidates.
//!
//! Events no mapping covers are scored on title similarity, significant-token
//! overlap and end-date proximity. Confirmed matches and explicit rejections
//! are persisted so later scans skip re-scoring them.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::text::{jaccard_similarity, levenshtein_similarity, normalize, significant_tokens};
use crate::error::{Error, Result};

const TITLE_WEIGHT: f64 = 0.4;
const TOKEN_WEIGHT: f64 = 0.4;
const DATE_WEIGHT: f64 = 0.2;

const CONFIRMED_THRESHOLD: f64 = 0.85;
const UNCERTAIN_THRESHOLD: f64 = 0.5;

/// The event fields the fuzzy matcher scores on.
#[derive(Debug, Clone)]
pub struct EventDigest {
    pub event_id: String,
    pub title: String,
    /// Earliest end date across the event's markets.
    pub earliest_end: Option<DateTime<Utc>>,
}

/// Per-signal subscores feeding the composite.
#[derive(Debug, Clone, Copy)]
pub struct MatchSignals {
    pub title: f64,
    pub tokens: f64,
    pub date: f64,
}

/// A scored candidate pair.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub polymarket_id: String,
    pub kalshi_id: String,
    pub score: f64,
    pub signals: MatchSignals,
}

/// Outcome of scoring a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchClass {
    Confirmed,
    Uncertain,
    Discarded,
}

/// Score a Polymarket/Kalshi event pair.
///
/// `0.4 * title + 0.4 * tokens + 0.2 * date`, where date proximity decays
/// linearly to zero over 30 days and scores zero when either side has no end
/// date.
#[must_use]
pub fn score_candidate(polymarket: &EventDigest, kalshi: &EventDigest) -> MatchCandidate {
    let title = levenshtein_similarity(&normalize(&polymarket.title), &normalize(&kalshi.title));

    let tokens_a: HashSet<String> = significant_tokens(&polymarket.title).into_iter().collect();
    let tokens_b: HashSet<String> = significant_tokens(&kalshi.title).into_iter().collect();
    let tokens = jaccard_similarity(&tokens_a, &tokens_b);

    let date = match (polymarket.earliest_end, kalshi.earliest_end) {
        (Some(a), Some(b)) => {
            let delta_days = (a - b).num_days().unsigned_abs() as f64;
            (1.0 - delta_days / 30.0).max(0.0)
        }
        _ => 0.0,
    };

    let score = TITLE_WEIGHT * title + TOKEN_WEIGHT * tokens + DATE_WEIGHT * date;

    MatchCandidate {
        polymarket_id: polymarket.event_id.clone(),
        kalshi_id: kalshi.event_id.clone(),
        score,
        signals: MatchSignals {
            title,
            tokens,
            date,
        },
    }
}

/// Classify a composite score.
#[must_use]
pub fn classify(score: f64) -> MatchClass {
    if score >= CONFIRMED_THRESHOLD {
        MatchClass::Confirmed
    } else if score >= UNCERTAIN_THRESHOLD {
        MatchClass::Uncertain
    } else {
        MatchClass::Discarded
    }
}

/// A confirmed match as stored in the cache file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmedMatch {
    pub polymarket_id: String,
    pub kalshi_id: String,
    pub polymarket_slug: String,
    pub kalshi_ticker: String,
    pub score: f64,
    pub confirmed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RejectedPair {
    polymarket_id: String,
    kalshi_id: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    confirmed: Vec<ConfirmedMatch>,
    rejected: Vec<RejectedPair>,
}

/// Persistent record of fuzzy-match decisions.
///
/// Backed by a JSON file written with a tmp-file-and-rename so a crashed
/// write never truncates the cache. Tests use [`MatchCache::in_memory`].
#[derive(Debug, Default)]
pub struct MatchCache {
    path: Option<PathBuf>,
    confirmed: HashMap<(String, String), ConfirmedMatch>,
    rejected: HashSet<(String, String)>,
}

impl MatchCache {
    /// A cache that never touches disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the cache file, starting empty when it does not exist yet.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut cache = Self {
            path: Some(path.clone()),
            ..Self::default()
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let file: CacheFile = serde_json::from_str(&contents)?;
                for m in file.confirmed {
                    cache
                        .confirmed
                        .insert((m.polymarket_id.clone(), m.kalshi_id.clone()), m);
                }
                for r in file.rejected {
                    cache.rejected.insert((r.polymarket_id, r.kalshi_id));
                }
                debug!(
                    confirmed = cache.confirmed.len(),
                    rejected = cache.rejected.len(),
                    "Loaded match cache"
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No match cache yet, starting empty");
            }
            Err(e) => return Err(Error::Io(e)),
        }

        Ok(cache)
    }

    #[must_use]
    pub fn is_rejected(&self, polymarket_id: &str, kalshi_id: &str) -> bool {
        self.rejected
            .contains(&(polymarket_id.to_string(), kalshi_id.to_string()))
    }

    #[must_use]
    pub fn get_confirmed(&self, polymarket_id: &str, kalshi_id: &str) -> Option<&ConfirmedMatch> {
        self.confirmed
            .get(&(polymarket_id.to_string(), kalshi_id.to_string()))
    }

    /// All confirmed matches, for seeding the resolver at scan start.
    #[must_use]
    pub fn confirmed_matches(&self) -> Vec<&ConfirmedMatch> {
        self.confirmed.values().collect()
    }

    pub fn record_confirmed(&mut self, m: ConfirmedMatch) {
        self.confirmed
            .insert((m.polymarket_id.clone(), m.kalshi_id.clone()), m);
    }

    pub fn record_rejected(&mut self, polymarket_id: impl Into<String>, kalshi_id: impl Into<String>) {
        self.rejected.insert((polymarket_id.into(), kalshi_id.into()));
    }

    /// Write the cache back to its file. No-op for in-memory caches.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let file = CacheFile {
            confirmed: self.confirmed.values().cloned().collect(),
            rejected: self
                .rejected
                .iter()
                .map(|(p, k)| RejectedPair {
                    polymarket_id: p.clone(),
                    kalshi_id: k.clone(),
                })
                .collect(),
        };

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&file)?)?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            warn!(error = %e, path = %path.display(), "Failed to replace match cache");
            return Err(Error::Io(e));
        }

        Ok(())
    }
}
