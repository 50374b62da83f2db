//! Team alias tables (`teams.json`).
//!
//! The file maps each league to canonical team names and their aliases, plus
//! a special `nba_codes` table of 3-letter codes used in game slugs and
//! tickers:
//!
//! ```json
//! {
//!   "nba": {"Phoenix Suns": ["suns", "phoenix"], "Miami Heat": ["heat", "miami"]},
//!   "nba_codes": {"PHX": "Phoenix Suns", "MIA": "Miami Heat"}
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::matching::text::normalize;

#[derive(Debug, Clone, Default)]
pub struct TeamsConfig {
    /// league -> canonical name -> aliases.
    leagues: HashMap<String, HashMap<String, Vec<String>>>,
    /// 3-letter code (uppercase) -> canonical name.
    nba_codes: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TeamsEntry {
    Codes(HashMap<String, String>),
    League(HashMap<String, Vec<String>>),
}

impl TeamsConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!("Failed to read {}: {e}", path.as_ref().display()))
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let raw: HashMap<String, TeamsEntry> = serde_json::from_str(contents)
            .map_err(|e| Error::Config(format!("Failed to parse teams config: {e}")))?;

        let mut config = TeamsConfig::default();
        for (key, entry) in raw {
            match (key.as_str(), entry) {
                ("nba_codes", TeamsEntry::Codes(codes)) => {
                    config.nba_codes = codes
                        .into_iter()
                        .map(|(code, name)| (code.to_uppercase(), name))
                        .collect();
                }
                ("nba_codes", TeamsEntry::League(_)) => {
                    return Err(Error::Config("nba_codes must map code -> name".into()));
                }
                (_, TeamsEntry::League(teams)) => {
                    config.leagues.insert(key.to_lowercase(), teams);
                }
                (league, TeamsEntry::Codes(_)) => {
                    return Err(Error::Config(format!(
                        "league {league} must map team -> aliases"
                    )));
                }
            }
        }

        Ok(config)
    }

    /// The league whose name appears in the event title, if any.
    #[must_use]
    pub fn detect_league(&self, title: &str) -> Option<&str> {
        let normalized = normalize(title);
        let words: Vec<&str> = normalized.split(' ').collect();
        self.leagues
            .keys()
            .find(|league| words.contains(&league.as_str()))
            .map(String::as_str)
    }

    /// Resolve free text to a canonical team name within a league.
    ///
    /// Aliases and canonical names are matched as whole words against the
    /// normalized text; the longest match wins so "san antonio" beats "san".
    #[must_use]
    pub fn canonical_team(&self, league: &str, text: &str) -> Option<String> {
        let teams = self.leagues.get(&league.to_lowercase())?;
        let haystack = format!(" {} ", normalize(text));

        let mut best: Option<(usize, &str)> = None;
        for (canonical, aliases) in teams {
            let mut names: Vec<String> = vec![normalize(canonical)];
            names.extend(aliases.iter().map(|a| normalize(a)));
            for name in names {
                if name.is_empty() {
                    continue;
                }
                if haystack.contains(&format!(" {name} "))
                    && best.map_or(true, |(len, _)| name.len() > len)
                {
                    best = Some((name.len(), canonical));
                }
            }
        }

        best.map(|(_, canonical)| canonical.to_string())
    }

    /// Whether two question strings refer to the same team.
    #[must_use]
    pub fn is_same_team(&self, a: &str, b: &str, league: &str) -> bool {
        match (
            self.canonical_team(league, a),
            self.canonical_team(league, b),
        ) {
            (Some(ta), Some(tb)) => ta == tb,
            _ => false,
        }
    }

    /// Canonical name for an NBA 3-letter code.
    #[must_use]
    pub fn team_from_code(&self, code: &str) -> Option<&str> {
        self.nba_codes.get(&code.to_uppercase()).map(String::as_str)
    }

    /// 3-letter code for a canonical NBA team name.
    #[must_use]
    pub fn code_for_team(&self, canonical: &str) -> Option<&str> {
        self.nba_codes
            .iter()
            .find(|(_, name)| name.as_str() == canonical)
            .map(|(code, _)| code.as_str())
    }
}

/// Process-scoped teams holder, mirror of [`super::mappings::MappingsStore`].
pub struct TeamsStore {
    path: PathBuf,
    current: RwLock<Arc<TeamsConfig>>,
}

impl TeamsStore {
    pub fn init(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = TeamsConfig::load(&path)?;
        info!(leagues = config.leagues.len(), "Loaded team aliases");
        Ok(Self {
            path,
            current: RwLock::new(Arc::new(config)),
        })
    }

    #[must_use]
    pub fn from_config(config: TeamsConfig) -> Self {
        Self {
            path: PathBuf::new(),
            current: RwLock::new(Arc::new(config)),
        }
    }

    pub fn reload(&self) -> Result<()> {
        let config = TeamsConfig::load(&self.path)?;
        *self.current.write() = Arc::new(config);
        Ok(())
    }

    #[must_use]
    pub fn get(&self) -> Arc<TeamsConfig> {
        self.current.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEAMS_JSON: &str = r#"{
        "nba": {
            "Phoenix Suns": ["suns", "phoenix"],
            "Miami Heat": ["heat", "miami"],
            "San Antonio Spurs": ["spurs", "san antonio"]
        },
        "nba_codes": {
            "PHX": "Phoenix Suns",
            "MIA": "Miami Heat",
            "SAS": "San Antonio Spurs"
        }
    }"#;

    fn config() -> TeamsConfig {
        TeamsConfig::from_json(TEAMS_JSON).unwrap()
    }

    #[test]
    fn detects_league_from_title() {
        let teams = config();
        assert_eq!(teams.detect_league("NBA Finals Champion 2026"), Some("nba"));
        assert_eq!(teams.detect_league("Premier League winner"), None);
    }

    #[test]
    fn resolves_aliases_to_canonical() {
        let teams = config();
        assert_eq!(
            teams.canonical_team("nba", "Will the Suns win?"),
            Some("Phoenix Suns".to_string())
        );
        assert_eq!(
            teams.canonical_team("nba", "Miami to win the title"),
            Some("Miami Heat".to_string())
        );
        assert_eq!(teams.canonical_team("nba", "Will the Lakers win?"), None);
    }

    #[test]
    fn same_team_across_phrasings() {
        let teams = config();
        assert!(teams.is_same_team("Phoenix Suns moneyline", "suns to win", "nba"));
        assert!(!teams.is_same_team("Suns win", "Heat win", "nba"));
        assert!(!teams.is_same_team("Suns win", "no team here", "nba"));
    }

    #[test]
    fn code_lookup_is_case_insensitive() {
        let teams = config();
        assert_eq!(teams.team_from_code("phx"), Some("Phoenix Suns"));
        assert_eq!(teams.team_from_code("PHX"), Some("Phoenix Suns"));
        assert_eq!(teams.team_from_code("XXX"), None);
        assert_eq!(teams.code_for_team("Miami Heat"), Some("MIA"));
    }
}
