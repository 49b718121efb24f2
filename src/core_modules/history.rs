// THEORY:
// The `history` module keeps a short rolling record of per-frame scores for
// the trend display. It is a bounded FIFO: once the window is full, recording
// a new entry evicts the oldest. Entries stay in chronological order and are
// never deduplicated; two identical consecutive scores are two real frames.

use crate::core_modules::evaluator::Mode;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// How many recent evaluations the trend window retains.
pub const HISTORY_CAPACITY: usize = 30;

/// One recorded evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp_ms: u64,
    pub score: u8,
    pub mode: Mode,
}

/// Rolling window of the most recent `HistoryEntry` values.
#[derive(Debug, Clone)]
pub struct HistoryRecorder {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for HistoryRecorder {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

impl HistoryRecorder {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an entry, evicting from the front until the window fits.
    pub fn record(&mut self, entry: HistoryEntry) -> &VecDeque<HistoryEntry> {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        &self.entries
    }

    pub fn entries(&self) -> &VecDeque<HistoryEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: u64) -> HistoryEntry {
        HistoryEntry {
            timestamp_ms: n,
            score: 100,
            mode: Mode::Desk,
        }
    }

    #[test]
    fn window_holds_the_most_recent_thirty_in_order() {
        let mut recorder = HistoryRecorder::default();
        for n in 1..=35 {
            recorder.record(entry(n));
        }

        assert_eq!(recorder.len(), 30);
        let timestamps: Vec<u64> = recorder.entries().iter().map(|e| e.timestamp_ms).collect();
        let expected: Vec<u64> = (6..=35).collect();
        assert_eq!(timestamps, expected);
    }

    #[test]
    fn duplicate_scores_are_kept_as_separate_frames() {
        let mut recorder = HistoryRecorder::default();
        recorder.record(entry(1));
        recorder.record(entry(1));

        assert_eq!(recorder.len(), 2);
    }

    #[test]
    fn clear_empties_the_window() {
        let mut recorder = HistoryRecorder::new(3);
        recorder.record(entry(1));
        recorder.clear();

        assert!(recorder.is_empty());
    }
}
