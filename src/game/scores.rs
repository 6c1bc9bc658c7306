//! # High Scores
//!
//! The persistent top-ten table, stored as one `name|score|timestamp` line
//! per entry.

use crate::GameResult;
use log::{debug, info, warn};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

pub const MAX_HIGH_SCORES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighScore {
    pub name: String,
    pub score: u64,
    /// Seconds since the Unix epoch
    pub timestamp: u64,
}

impl HighScore {
    fn parse_line(line: &str) -> Option<Self> {
        let mut parts = line.split('|');
        let name = parts.next()?.trim();
        let score = parts.next()?.trim().parse().ok()?;
        let timestamp = parts.next()?.trim().parse().ok()?;
        if name.is_empty() || parts.next().is_some() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            score,
            timestamp,
        })
    }
}

/// Best scores first. Equal scores keep the order they were recorded in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighScoreTable {
    entries: Vec<HighScore>,
}

impl HighScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the file format. Blank and malformed lines are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::game::HighScoreTable;
    ///
    /// let table = HighScoreTable::parse("ann|300|1\nnot a score\nbob|900|2\n");
    /// assert_eq!(table.entries().len(), 2);
    /// assert_eq!(table.best().map(|e| e.name.as_str()), Some("bob"));
    /// ```
    pub fn parse(text: &str) -> Self {
        let mut table = Self::new();
        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match HighScore::parse_line(line) {
                Some(entry) => {
                    table.insert_entry(entry);
                }
                None => debug!("high scores: skipping malformed line {}", number + 1),
            }
        }
        table
    }

    pub fn load(path: &Path) -> GameResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// An empty table when the file is missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.is_file() {
            return Self::new();
        }
        Self::load(path).unwrap_or_else(|e| {
            warn!("Could not read high scores from {}: {}", path.display(), e);
            Self::new()
        })
    }

    pub fn to_file_string(&self) -> String {
        self.entries
            .iter()
            .map(|entry| format!("{}|{}|{}\n", entry.name, entry.score, entry.timestamp))
            .collect()
    }

    pub fn save(&self, path: &Path) -> GameResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_file_string())?;
        info!("Saved {} high scores to {}", self.entries.len(), path.display());
        Ok(())
    }

    pub fn entries(&self) -> &[HighScore] {
        &self.entries
    }

    pub fn best(&self) -> Option<&HighScore> {
        self.entries.first()
    }

    /// Whether `score` would make it into the table.
    pub fn qualifies(&self, score: u64) -> bool {
        self.entries.len() < MAX_HIGH_SCORES
            || self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Records a score and returns its zero-based rank, or `None` if it did
    /// not make the table. Separator characters are stripped from the name.
    pub fn insert(&mut self, name: &str, score: u64, timestamp: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let clean: String = name
            .chars()
            .filter(|c| *c != '|' && !c.is_control())
            .collect();
        let clean = clean.trim();
        let entry = HighScore {
            name: if clean.is_empty() { "???".to_string() } else { clean.to_string() },
            score,
            timestamp,
        };
        Some(self.insert_entry(entry))
    }

    fn insert_entry(&mut self, entry: HighScore) -> usize {
        let rank = self
            .entries
            .iter()
            .position(|existing| existing.score < entry.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(rank, entry);
        self.entries.truncate(MAX_HIGH_SCORES);
        rank
    }
}

/// Current time as a high score timestamp.
pub fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
