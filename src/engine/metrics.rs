use serde::Serialize;

use crate::fitness::{fitness_percent, MetricsSnapshot};

use super::Engine;

/// a logged fitness threshold crossing
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Milestone {
    pub fitness: f64,
    pub elapsed_secs: f64,
    pub iterations: u64,
}

/// remembers the last whole-percent fitness that was logged.
/// a milestone fires when the integer part of fitness exceeds it.
#[derive(Clone, Debug)]
pub struct MilestoneTracker {
    reached: u32,
    history: Vec<Milestone>,
}

impl MilestoneTracker {
    pub fn new(start: u32) -> Self {
        Self { reached: start, history: Vec::new() }
    }

    pub fn observe(&mut self, fitness: f64, elapsed_secs: f64, iterations: u64) -> Option<Milestone> {
        let whole = fitness.floor() as u32;
        if whole <= self.reached {
            return None;
        }
        self.reached = whole;
        let m = Milestone { fitness, elapsed_secs, iterations };
        self.history.push(m);
        Some(m)
    }

    pub fn history(&self) -> &[Milestone] {
        &self.history
    }
}

impl Engine {
    /// current fitness as a percentage (0-100, higher is better)
    pub fn fitness_percent(&self) -> f64 {
        profiling::scope!("fitness_percent");
        let ledger = self.score.ledger();
        fitness_percent(ledger.best_score, self.target.width(), self.target.height())
    }

    /// sad/px and psnr of the best genome. empty before the first iteration
    pub fn metrics(&self) -> MetricsSnapshot {
        let ledger = self.score.ledger();
        if ledger.iterations == 0 {
            return MetricsSnapshot::default();
        }
        MetricsSnapshot::from_sad(
            ledger.best_score,
            self.target.pixel_count(),
            self.settings.psnr_peak,
        )
    }

    pub fn milestones(&self) -> &[Milestone] {
        self.milestones.history()
    }
}
