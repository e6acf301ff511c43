// Engine module organization
// Each submodule handles a specific aspect of the evolution loop

pub mod commit;
pub mod metrics;
pub mod mutations;

use serde::Serialize;
use std::time::{Duration, Instant};
use tiny_skia as sk;

use crate::dna::{Genome, GenomeSlot, GenomeStore, TriangleRecord};
use crate::error::{EvolveError, Result};
use crate::fitness::{accumulate_sad_rgb, MetricsSnapshot};
use crate::render::{CpuRenderer, RenderTargets};
use crate::rng::SeedSequence;
use crate::settings::RunSettings;
use crate::target::TargetImage;

pub use commit::{CommitOutcome, ScoreLedger, ScoreState};
pub use metrics::{Milestone, MilestoneTracker};
pub use mutations::{apply_mutation, Mutation};

/// result of one mutate → rasterize → score/commit pass
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IterationOutcome {
    /// 1-based index of this iteration over the whole run
    pub iteration: u64,
    pub mutation: Mutation,
    pub commit: CommitOutcome,
}

/// what the driver hands back after each batch
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BatchReport {
    pub best_score: u64,
    pub iterations: u64,
    pub improvements: u64,
    /// improvements accepted during this batch
    pub accepted: u64,
    pub fitness_percent: f64,
    pub metrics: MetricsSnapshot,
    pub elapsed_secs: f64,
    pub milestone: Option<Milestone>,
}

pub struct Engine {
    settings: RunSettings,
    target: TargetImage,
    store: GenomeStore,
    score: ScoreState,
    seeds: SeedSequence,
    renders: RenderTargets,
    milestones: MilestoneTracker,
    started: Instant,
}

impl Engine {
    /// validate everything, then allocate the genome store and render targets.
    /// nothing is allocated for a configuration that would be rejected.
    pub fn new(target: TargetImage, settings: RunSettings) -> Result<Self> {
        profiling::scope!("Engine::new");
        settings.validate()?;
        if target.pixel_count() == 0 {
            return Err(EvolveError::invalid("target image has no pixels"));
        }

        let initial = Genome::random(settings.triangle_count, settings.genome_seed)?;
        let store = GenomeStore::new(initial)?;
        let renders = RenderTargets::new(target.width(), target.height())?;

        tracing::info!(
            "engine ready: {}x{} target, {} triangles, {} iterations per batch",
            target.width(),
            target.height(),
            settings.triangle_count,
            settings.iterations_per_batch
        );

        Ok(Self {
            seeds: SeedSequence::new(settings.mutation_seed),
            milestones: MilestoneTracker::new(settings.milestone_start),
            score: ScoreState::new(),
            settings,
            target,
            store,
            renders,
            started: Instant::now(),
        })
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn target(&self) -> &TargetImage {
        &self.target
    }

    pub fn store(&self) -> &GenomeStore {
        &self.store
    }

    pub fn ledger(&self) -> ScoreLedger {
        self.score.ledger()
    }

    pub fn seed_state(&self) -> u32 {
        self.seeds.state()
    }

    /// swap the target. render targets are only recreated when the size changes.
    /// the genome and score history are kept.
    pub fn set_target(&mut self, target: TargetImage) -> Result<()> {
        if !self.renders.matches(target.width(), target.height()) {
            tracing::debug!(
                "target resized to {}x{}, recreating render targets",
                target.width(),
                target.height()
            );
            self.renders = RenderTargets::new(target.width(), target.height())?;
        }
        self.target = target;
        Ok(())
    }

    /// one iteration. stages run strictly in order; each parallel stage has
    /// joined before the next one reads what it wrote.
    pub fn step(&mut self) -> Result<IterationOutcome> {
        profiling::scope!("step");
        let iteration = self.score.ledger().iterations + 1;

        // mutation: best → mutant, then one scalar moves
        let draw = self.seeds.next_draw();
        let mutation = apply_mutation(&mut self.store, draw, &self.settings.mutation);

        let commit = self.score_mutant(iteration)?;
        tracing::trace!(iteration, ?mutation, ?commit, "iteration done");

        Ok(IterationOutcome { iteration, mutation, commit })
    }

    /// rasterize the mutant slot, score it against the target, then run the commit gate
    fn score_mutant(&mut self, iteration: u64) -> Result<CommitOutcome> {
        // rasterization: mutant into the live render
        CpuRenderer::render_slot(&self.store, GenomeSlot::Mutant, &mut self.renders.live);

        // scoring
        let live = &self.renders.live;
        if live.width() != self.target.width() || live.height() != self.target.height() {
            return Err(EvolveError::IterationFailed {
                iteration,
                reason: format!(
                    "render is {}x{} but target is {}x{}",
                    live.width(),
                    live.height(),
                    self.target.width(),
                    self.target.height()
                ),
            });
        }
        self.score.reset_mutant();
        accumulate_sad_rgb(
            self.target.rgb(),
            live.data(),
            self.target.width(),
            self.score.mutant_accumulator(),
        );

        // commit gate
        Ok(self.score.commit(&mut self.store))
    }

    /// run the configured number of iterations per batch
    pub fn run_configured_batch(&mut self) -> Result<BatchReport> {
        self.run_batch(self.settings.iterations_per_batch)
    }

    /// run `iterations` iterations, refresh the best render, and report.
    /// a failing iteration aborts the batch and its error is returned.
    pub fn run_batch(&mut self, iterations: u32) -> Result<BatchReport> {
        profiling::scope!("run_batch");
        if iterations == 0 {
            return Err(EvolveError::invalid("a batch needs at least one iteration"));
        }

        let mut accepted = 0u64;
        for _ in 0..iterations {
            if self.step()?.commit.accepted() {
                accepted += 1;
            }
        }

        CpuRenderer::render_slot(&self.store, GenomeSlot::Best, &mut self.renders.best);

        let mut report = self.report();
        report.accepted = accepted;
        report.milestone =
            self.milestones.observe(report.fitness_percent, report.elapsed_secs, report.iterations);
        if let Some(m) = report.milestone {
            tracing::info!(
                "reached {:.2}% after {:.2}s, iterations {}",
                m.fitness,
                m.elapsed_secs,
                m.iterations
            );
        }

        Ok(report)
    }

    /// snapshot of the counters without running anything. `accepted` is 0 and
    /// `milestone` is the most recent one reached, if any.
    pub fn report(&self) -> BatchReport {
        let ledger = self.score.ledger();
        BatchReport {
            best_score: ledger.best_score,
            iterations: ledger.iterations,
            improvements: ledger.improvements,
            accepted: 0,
            fitness_percent: self.fitness_percent(),
            metrics: self.metrics(),
            elapsed_secs: self.elapsed().as_secs_f64(),
            milestone: self.milestones.history().last().copied(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// mutant render from the latest iteration
    pub fn live_render(&self) -> &sk::Pixmap {
        &self.renders.live
    }

    /// best render as of the latest batch
    pub fn best_render(&self) -> &sk::Pixmap {
        &self.renders.best
    }

    /// re-derive the best render from the genome store, RGBA8
    pub fn render_best_rgba(&self) -> Result<Vec<u8>> {
        CpuRenderer::render_rgba(self.store.best(), self.target.width(), self.target.height())
    }

    /// the best genome as plain records, for external persistence
    pub fn dump_best(&self) -> Vec<TriangleRecord> {
        self.store.best().records()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dna::Triangle;

    fn settings(triangles: usize) -> RunSettings {
        RunSettings { triangle_count: triangles, ..RunSettings::default() }
    }

    #[test]
    fn zero_triangles_is_invalid_configuration() {
        let target = TargetImage::solid(2, 2, [255; 3]).unwrap();
        let err = Engine::new(target, settings(0)).err().unwrap();
        assert!(matches!(err, EvolveError::InvalidConfiguration { .. }));
    }

    #[test]
    fn first_iteration_always_commits() {
        let target = TargetImage::solid(8, 8, [40, 80, 120]).unwrap();
        let mut engine = Engine::new(target, settings(5)).unwrap();
        let out = engine.step().unwrap();
        assert_eq!(out.iteration, 1);
        assert!(out.commit.accepted());
        assert_eq!(engine.ledger().best_score, out.commit.score());
    }

    #[test]
    fn step_score_matches_rescoring_the_live_render() {
        let target = TargetImage::solid(6, 5, [10, 200, 30]).unwrap();
        let mut engine = Engine::new(target, settings(4)).unwrap();
        for _ in 0..20 {
            let out = engine.step().unwrap();
            let rescored = crate::fitness::sad_rgb_parallel(
                engine.target().rgb(),
                engine.live_render().data(),
                engine.target().width(),
            );
            assert_eq!(out.commit.score(), rescored);
        }
    }

    #[test]
    fn best_render_matches_best_genome_after_batch() {
        let target = TargetImage::solid(7, 3, [0, 0, 0]).unwrap();
        let mut engine = Engine::new(target, settings(6)).unwrap();
        let report = engine.run_batch(25).unwrap();
        let rescored = crate::fitness::sad_rgb_parallel(
            engine.target().rgb(),
            engine.best_render().data(),
            engine.target().width(),
        );
        assert_eq!(report.best_score, rescored);
        assert_eq!(engine.render_best_rgba().unwrap(), engine.best_render().data());
    }

    #[test]
    fn report_before_any_iteration() {
        let target = TargetImage::solid(3, 3, [9; 3]).unwrap();
        let engine = Engine::new(target, settings(2)).unwrap();
        let report = engine.report();
        assert_eq!(report.best_score, u64::MAX);
        assert_eq!(report.iterations, 0);
        assert_eq!(report.fitness_percent, 0.0);
        assert_eq!(report.metrics, MetricsSnapshot::default());
        assert!(report.milestone.is_none());
    }

    #[test]
    fn zero_iteration_batch_rejected() {
        let target = TargetImage::solid(2, 2, [0; 3]).unwrap();
        let mut engine = Engine::new(target, settings(1)).unwrap();
        assert!(engine.run_batch(0).is_err());
        assert_eq!(engine.ledger().iterations, 0);
    }

    // pixel space (0,0) (2,0) (1,1.9): both top-row centers are well inside,
    // both bottom-row centers well outside
    fn top_row_triangle(rgba: [f32; 4]) -> Triangle {
        Triangle { pos_a: [0.0, 0.0], pos_b: [1.0, 0.0], pos_c: [0.5, 0.95], rgba }
    }

    fn white_2x2_with(tri: Triangle) -> Engine {
        let target = TargetImage::solid(2, 2, [255; 3]).unwrap();
        let mut engine = Engine::new(target, settings(1)).unwrap();
        engine.store = GenomeStore::new(Genome { tris: vec![tri] }).unwrap();
        engine
    }

    #[test]
    fn white_2x2_scores_known_opaque_triangle() {
        // 0.2 -> 51, 0.6 -> 153, 1.0 -> 255
        let mut engine = white_2x2_with(top_row_triangle([0.2, 0.6, 1.0, 1.0]));
        let commit = engine.score_mutant(1).unwrap();
        assert_eq!(commit.score(), 2 * ((255 - 51) + (255 - 153)));
        assert!(commit.accepted());
        assert_eq!(engine.ledger().best_score, 612);
    }

    #[test]
    fn white_2x2_scores_black_triangle_per_covered_pixel() {
        let mut engine = white_2x2_with(top_row_triangle([0.0, 0.0, 0.0, 1.0]));
        assert_eq!(engine.score_mutant(1).unwrap().score(), 2 * 765);
    }

    #[test]
    fn white_2x2_white_triangle_scores_zero() {
        let mut engine = white_2x2_with(top_row_triangle([1.0, 1.0, 1.0, 1.0]));
        let commit = engine.score_mutant(1).unwrap();
        assert_eq!(commit.score(), 0);
        assert_eq!(engine.fitness_percent(), 100.0);
    }

    #[test]
    fn white_2x2_first_step_lands_on_a_covered_pixel_multiple() {
        // an opaque black triangle scores 765 per covered pixel, whatever one scalar moved
        let mut engine = white_2x2_with(top_row_triangle([0.0, 0.0, 0.0, 1.0]));
        engine.settings.mutation.p_geometry = 1.0;
        engine.settings.mutation.vertex_step = 0.01;
        let out = engine.step().unwrap();
        assert_eq!(out.commit.score(), 2 * 765);
        assert!(out.mutation.field.is_geometry());
    }

    #[test]
    fn resized_target_recreates_renders() {
        let target = TargetImage::solid(4, 4, [0; 3]).unwrap();
        let mut engine = Engine::new(target, settings(3)).unwrap();
        engine.run_batch(3).unwrap();
        engine.set_target(TargetImage::solid(9, 2, [0; 3]).unwrap()).unwrap();
        assert_eq!(engine.live_render().width(), 9);
        assert_eq!(engine.best_render().height(), 2);
        engine.run_batch(3).unwrap();
        assert_eq!(engine.ledger().iterations, 6);
    }
}
