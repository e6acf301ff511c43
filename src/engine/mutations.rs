use rand::Rng;
use serde::Serialize;

use crate::dna::{GenomeStore, TriangleField};
use crate::mutation_config::{perturb, MutateConfig};
use crate::rng::MutationDraw;

/// what one mutation changed
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Mutation {
    pub triangle: usize,
    pub field: TriangleField,
    pub before: f32,
    pub after: f32,
}

/// build the working mutant: copy best → mutant (parallel, one task per triangle),
/// then move exactly one scalar of one triangle.
///
/// all choices come from the single draw, so the result is a pure function of
/// (best genome, draw, config). `GenomeStore` never holds an empty genome.
pub fn apply_mutation(store: &mut GenomeStore, draw: MutationDraw, cfg: &MutateConfig) -> Mutation {
    profiling::scope!("apply_mutation");
    store.reset_mutant();

    let mut rng = draw.rng();
    let mutant = store.mutant_mut();
    debug_assert!(!mutant.is_empty());
    let triangle = rng.random_range(0..mutant.len());

    let geometry = rng.random::<f32>() < cfg.p_geometry;
    let field = if geometry {
        TriangleField::GEOMETRY[rng.random_range(0..TriangleField::GEOMETRY.len())]
    } else {
        TriangleField::COLOR[rng.random_range(0..TriangleField::COLOR.len())]
    };

    let tri = &mut mutant.tris[triangle];
    let before = tri.get(field);
    let after = perturb(before, cfg.step_for(geometry), &mut rng);
    tri.set(field, after);

    Mutation { triangle, field, before, after }
}
