//! High score leaderboard
//!
//! `Leaderboard` is the collaborator the game hands finished runs to. The
//! local `HighScores` board keeps the top 10 and is persisted to LocalStorage
//! on the web, so the game is fully playable offline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::RunSummary;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// Leaderboard collaborator failures. Never fatal to a run.
#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("leaderboard unavailable: {0}")]
    Unavailable(String),
    #[error("leaderboard data corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A finished run as sent to a leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub score: u64,
    pub altitude: u32,
    pub elapsed_secs: u32,
    /// Identity of the player, if one is signed in
    pub player: Option<String>,
}

impl ScoreSubmission {
    pub fn from_summary(summary: &RunSummary, player: Option<String>) -> Self {
        Self {
            score: summary.score,
            altitude: summary.altitude,
            elapsed_secs: summary.elapsed_secs,
            player,
        }
    }
}

/// A single ranked entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    pub altitude: u32,
    pub elapsed_secs: u32,
    pub player: Option<String>,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

impl HighScoreEntry {
    /// Whether a run with `score` and `altitude` ranks above this entry (altitude breaks ties)
    fn beats(&self, score: u64, altitude: u32) -> bool {
        score > self.score || (score == self.score && altitude > self.altitude)
    }
}

/// Score service: submit finished runs, query ranked entries
pub trait Leaderboard {
    /// Record a run. Returns the rank achieved (1-indexed), if any.
    fn submit(&mut self, run: &ScoreSubmission) -> Result<Option<usize>, LeaderboardError>;

    /// Best `limit` entries, best first
    fn top(&mut self, limit: usize) -> Result<Vec<HighScoreEntry>, LeaderboardError>;
}

/// Local top-10 board
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "sky_ascent_highscores";

    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a run qualifies for the leaderboard
    pub fn qualifies(&self, score: u64, altitude: u32) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries
            .last()
            .map(|e| e.beats(score, altitude))
            .unwrap_or(true)
    }

    /// Rank a run would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, score: u64, altitude: u32) -> Option<usize> {
        if !self.qualifies(score, altitude) {
            return None;
        }
        let rank = self.entries.iter().position(|e| e.beats(score, altitude));
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert a run if it qualifies; returns the rank achieved
    pub fn add_score(&mut self, run: &ScoreSubmission, timestamp: f64) -> Option<usize> {
        let rank = self.potential_rank(run.score, run.altitude)?;
        self.entries.insert(
            rank - 1,
            HighScoreEntry {
                score: run.score,
                altitude: run.altitude,
                elapsed_secs: run.elapsed_secs,
                player: run.player.clone(),
                timestamp,
            },
        );
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    pub fn from_json(json: &str) -> Result<Self, LeaderboardError> {
        let mut scores: HighScores = serde_json::from_str(json)?;
        scores
            .entries
            .sort_by(|a, b| b.score.cmp(&a.score).then(b.altitude.cmp(&a.altitude)));
        scores.entries.truncate(MAX_HIGH_SCORES);
        Ok(scores)
    }

    /// Load high scores from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(scores) => {
                        log::info!("Loaded {} high scores", scores.entries.len());
                        return scores;
                    }
                    Err(e) => log::warn!("Discarding stored high scores: {e}"),
                }
            }
        }

        log::info!("No high scores found, starting fresh");
        Self::new()
    }

    /// Save high scores to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> Result<(), LeaderboardError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| LeaderboardError::Unavailable("no LocalStorage".into()))?;

        let json = serde_json::to_string(self)?;
        storage
            .set_item(Self::STORAGE_KEY, &json)
            .map_err(|_| LeaderboardError::Unavailable("LocalStorage write failed".into()))?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) -> Result<(), LeaderboardError> {
        Ok(())
    }
}

impl Leaderboard for HighScores {
    fn submit(&mut self, run: &ScoreSubmission) -> Result<Option<usize>, LeaderboardError> {
        let rank = self.add_score(run, crate::platform::now_ms());
        if rank.is_some() {
            self.save()?;
        }
        Ok(rank)
    }

    fn top(&mut self, limit: usize) -> Result<Vec<HighScoreEntry>, LeaderboardError> {
        Ok(self.entries.iter().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(score: u64, altitude: u32) -> ScoreSubmission {
        ScoreSubmission {
            score,
            altitude,
            elapsed_secs: 10,
            player: None,
        }
    }

    #[test]
    fn test_sorted_with_altitude_tie_break() {
        let mut hs = HighScores::new();
        assert_eq!(hs.add_score(&run(100, 5), 0.0), Some(1));
        assert_eq!(hs.add_score(&run(300, 5), 0.0), Some(1));
        assert_eq!(hs.add_score(&run(100, 9), 0.0), Some(2));
        let scores: Vec<(u64, u32)> = hs.entries.iter().map(|e| (e.score, e.altitude)).collect();
        assert_eq!(scores, vec![(300, 5), (100, 9), (100, 5)]);
    }

    #[test]
    fn test_keeps_top_ten() {
        let mut hs = HighScores::new();
        for i in 1..=15 {
            hs.add_score(&run(i * 10, 0), 0.0);
        }
        assert_eq!(hs.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(hs.top_score(), Some(150));
        assert!(!hs.qualifies(50, 0));
        assert_eq!(hs.potential_rank(65, 0), Some(10));
    }

    #[test]
    fn test_zero_score_never_qualifies() {
        let mut hs = HighScores::new();
        assert_eq!(hs.add_score(&run(0, 40), 0.0), None);
        assert!(hs.is_empty());
    }

    #[test]
    fn test_leaderboard_trait() {
        let mut hs = HighScores::new();
        assert_eq!(hs.submit(&run(20, 1)).unwrap(), Some(1));
        assert_eq!(hs.submit(&run(40, 1)).unwrap(), Some(1));
        let top = hs.top(1).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].score, 40);
    }

    #[test]
    fn test_corrupt_json_is_an_error() {
        assert!(matches!(
            HighScores::from_json("[1, 2"),
            Err(LeaderboardError::Corrupt(_))
        ));
    }
}
