//! Blocking index for candidate reduction.
//!
//! Comparing every Polymarket event against every Kalshi event is quadratic;
//! blocking groups events under shallow keys and only scores pairs that share
//! at least one key.

use std::collections::{HashMap, HashSet};

use super::text::{extract_years, normalize, significant_tokens, tokenize};

/// The fields of an event the blocking keys are derived from.
#[derive(Debug, Clone)]
pub struct BlockingInput {
    pub event_id: String,
    pub title: String,
    pub category: Option<String>,
    /// Questions of the event's markets; only the first five contribute keys.
    pub market_questions: Vec<String>,
}

/// Key -> event-id index for one venue.
#[derive(Debug, Default)]
pub struct BlockingIndex {
    by_key: HashMap<String, Vec<String>>,
    event_count: usize,
}

/// Candidate-reduction statistics for one blocking pass.
#[derive(Debug, Clone, Copy)]
pub struct BlockingStats {
    pub total_potential: usize,
    pub actual: usize,
    pub reduction_pct: f64,
}

impl BlockingIndex {
    /// Index a venue's events under their blocking keys.
    #[must_use]
    pub fn build(events: &[BlockingInput]) -> Self {
        let mut by_key: HashMap<String, Vec<String>> = HashMap::new();
        for event in events {
            for key in Self::keys_for(event) {
                by_key.entry(key).or_default().push(event.event_id.clone());
            }
        }
        Self {
            by_key,
            event_count: events.len(),
        }
    }

    /// The key set for a single event: years, category, significant title
    /// tokens plus the top-3 significant tokens of the first five markets,
    /// title bigrams, and the first significant word.
    #[must_use]
    pub fn keys_for(event: &BlockingInput) -> HashSet<String> {
        let mut keys = HashSet::new();

        for year in extract_years(&event.title) {
            keys.insert(format!("year:{year}"));
        }

        if let Some(cat) = &event.category {
            let cat = normalize(cat);
            if !cat.is_empty() {
                keys.insert(format!("cat:{cat}"));
            }
        }

        let title_tokens = significant_tokens(&event.title);
        for token in &title_tokens {
            keys.insert(format!("tok:{token}"));
        }
        for question in event.market_questions.iter().take(5) {
            for token in significant_tokens(question).into_iter().take(3) {
                keys.insert(format!("tok:{token}"));
            }
        }

        let all_tokens = tokenize(&event.title);
        for bigram in all_tokens.windows(2) {
            keys.insert(format!("2g:{} {}", bigram[0], bigram[1]));
        }

        if let Some(first) = title_tokens.first() {
            keys.insert(format!("first:{first}"));
        }

        keys
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.event_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.event_count == 0
    }

    #[must_use]
    pub fn events_for_key(&self, key: &str) -> &[String] {
        self.by_key.get(key).map_or(&[], Vec::as_slice)
    }

    /// Pair every event of `self` with every event of `other` sharing at
    /// least one key. Pairs are deduplicated by ordered id tuple and returned
    /// with reduction statistics.
    #[must_use]
    pub fn candidate_pairs(&self, other: &Self) -> (Vec<(String, String)>, BlockingStats) {
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut pairs = Vec::new();

        for (key, ids_a) in &self.by_key {
            let ids_b = other.events_for_key(key);
            if ids_b.is_empty() {
                continue;
            }
            for id_a in ids_a {
                for id_b in ids_b {
                    let tuple = (id_a.clone(), id_b.clone());
                    if seen.insert(tuple.clone()) {
                        pairs.push(tuple);
                    }
                }
            }
        }

        let total_potential = self.event_count * other.event_count;
        let actual = pairs.len();
        let reduction_pct = if total_potential == 0 {
            0.0
        } else {
            (1.0 - actual as f64 / total_potential as f64) * 100.0
        };

        (
            pairs,
            BlockingStats {
                total_potential,
                actual,
                reduction_pct,
            },
        )
    }
}
