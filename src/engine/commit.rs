// score state and the commit gate.
//
// the mutant score is a shared accumulator that every scoring task adds into.
// the compare/copy/count step is the one place best-genome state changes, and it
// runs under a single mutex so no reader can see a half-copied best genome.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::dna::GenomeStore;

/// counters that only change inside the gate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ScoreLedger {
    /// lowest score seen so far. u64::MAX until the first iteration lands
    pub best_score: u64,
    /// attempted mutations
    pub iterations: u64,
    /// accepted mutations
    pub improvements: u64,
}

impl Default for ScoreLedger {
    fn default() -> Self {
        Self { best_score: u64::MAX, iterations: 0, improvements: 0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    Accepted { score: u64, previous_best: u64 },
    Rejected { score: u64, best: u64 },
}

impl CommitOutcome {
    pub fn accepted(&self) -> bool {
        matches!(self, CommitOutcome::Accepted { .. })
    }

    pub fn score(&self) -> u64 {
        match *self {
            CommitOutcome::Accepted { score, .. } | CommitOutcome::Rejected { score, .. } => score,
        }
    }
}

#[derive(Debug, Default)]
pub struct ScoreState {
    mutant_score: AtomicU64,
    gate: Mutex<ScoreLedger>,
}

impl ScoreState {
    pub fn new() -> Self {
        Self::default()
    }

    /// zero the accumulator before a scoring pass
    pub fn reset_mutant(&self) {
        self.mutant_score.store(0, Ordering::Release);
    }

    /// scoring tasks add their partial sums here
    pub fn mutant_accumulator(&self) -> &AtomicU64 {
        &self.mutant_score
    }

    pub fn mutant_score(&self) -> u64 {
        self.mutant_score.load(Ordering::Acquire)
    }

    pub fn ledger(&self) -> ScoreLedger {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, ScoreLedger> {
        // the ledger is plain data; a panic elsewhere cannot leave it half-written
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// the admission decision. must only run after the scoring pass has fully joined.
    /// strictly better mutants are copied into the best slot; ties are discarded.
    pub fn commit(&self, store: &mut GenomeStore) -> CommitOutcome {
        profiling::scope!("ScoreState::commit");
        let mut ledger = self.lock();
        let score = self.mutant_score();
        ledger.iterations += 1;

        if score < ledger.best_score {
            store.promote_mutant();
            let previous_best = ledger.best_score;
            ledger.best_score = score;
            ledger.improvements += 1;
            CommitOutcome::Accepted { score, previous_best }
        } else {
            CommitOutcome::Rejected { score, best: ledger.best_score }
        }
    }
}
