// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TALLY - VOTING-WEIGHT CHECKPOINTS
//
// Voting weight = balance (1 base unit = 1 vote), recorded as an append-only
// history of (timepoint, weight) pairs per address.
// Lookups return the weight of the latest checkpoint with timepoint <= T.
// Several checkpoints may share a timepoint; the last one wins.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};

use crate::amount_str;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Clock value supplied by the host (seconds or block height)
    pub timepoint: u64,
    /// Weight from this timepoint on
    #[serde(with = "amount_str")]
    pub votes: u128,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointHistory {
    entries: Vec<Checkpoint>,
}

impl CheckpointHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a checkpoint.
    ///
    /// Callers guarantee `timepoint` is not earlier than the last entry;
    /// the ledger enforces this with its clock-regression check before any
    /// mutation.
    pub fn push(&mut self, timepoint: u64, votes: u128) {
        debug_assert!(
            self.last_timepoint().map_or(true, |last| last <= timepoint),
            "checkpoint timepoints must be non-decreasing"
        );
        self.entries.push(Checkpoint { timepoint, votes });
    }

    /// Current weight (latest checkpoint), 0 if none.
    pub fn latest(&self) -> u128 {
        self.entries.last().map_or(0, |c| c.votes)
    }

    pub fn last_timepoint(&self) -> Option<u64> {
        self.entries.last().map(|c| c.timepoint)
    }

    /// Weight at `timepoint`: the latest checkpoint with `timepoint <= T`.
    /// Binary search; O(log n).
    pub fn upper_lookup(&self, timepoint: u64) -> u128 {
        let idx = self.entries.partition_point(|c| c.timepoint <= timepoint);
        if idx == 0 {
            0
        } else {
            self.entries[idx - 1].votes
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[Checkpoint] {
        &self.entries
    }

    /// Timepoints non-decreasing. Always true for histories built by `push`.
    pub fn is_ordered(&self) -> bool {
        self.entries.windows(2).all(|w| w[0].timepoint <= w[1].timepoint)
    }
}
