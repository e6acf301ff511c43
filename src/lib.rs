//! Approximates a target image with a fixed set of alpha-blended triangles.
//!
//! Each iteration copies the best genome into a working mutant, moves one
//! scalar of one triangle, renders the mutant, scores it against the target
//! and keeps it only if it beats the best score so far.

pub mod dna;
pub mod engine;
pub mod engine_thread;
pub mod error;
pub mod fitness;
pub mod mutation_config;
pub mod render;
pub mod rng;
pub mod settings;
pub mod target;

pub use dna::{Genome, GenomeSlot, GenomeStore, Triangle, TriangleField, TriangleRecord};
pub use engine::{BatchReport, Engine, IterationOutcome};
pub use error::EvolveError;
pub use settings::RunSettings;
pub use target::TargetImage;
