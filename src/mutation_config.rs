use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EvolveError, Result};

/// smallest move, as a fraction of the configured step. keeps every mutation
/// a real change instead of a no-op.
pub const MIN_STEP_FRACTION: f32 = 0.05;

/// smallest configurable step. below this a move can vanish in f32 rounding.
pub const MIN_STEP: f32 = 1e-3;

/// mutation policy. one triangle, one scalar, bounded move per iteration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutateConfig {
    /// chance that the mutation moves a vertex coordinate instead of a color channel
    pub p_geometry: f32,
    /// largest coordinate move, normalized image units (0.1 = 10% of the side)
    pub vertex_step: f32,
    /// largest color/alpha move, normalized channel units
    pub color_step: f32,
}

impl Default for MutateConfig {
    fn default() -> Self {
        Self {
            // 6 of the 10 fields are geometry
            p_geometry: 0.6,
            vertex_step: 0.1,
            color_step: 0.1,
        }
    }
}

impl MutateConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.p_geometry) {
            return Err(EvolveError::invalid(format!(
                "p_geometry must be within [0, 1], got {}",
                self.p_geometry
            )));
        }
        for (name, step) in [("vertex_step", self.vertex_step), ("color_step", self.color_step)] {
            // steps above 0.5 could overshoot both ends of [0, 1]
            if !(MIN_STEP..=0.5).contains(&step) {
                return Err(EvolveError::invalid(format!(
                    "{name} must be within [{MIN_STEP}, 0.5], got {step}"
                )));
            }
        }
        Ok(())
    }

    pub fn step_for(&self, geometry: bool) -> f32 {
        if geometry {
            self.vertex_step
        } else {
            self.color_step
        }
    }
}

/// move `value` by a random signed amount in [step * MIN_STEP_FRACTION, step].
/// a move that would leave [0, 1] goes the other way instead, so the result is
/// always in range and always different from `value`.
#[inline]
pub fn perturb<R: Rng>(value: f32, step: f32, rng: &mut R) -> f32 {
    let magnitude = step * rng.random_range(MIN_STEP_FRACTION..=1.0);
    let up = rng.random::<bool>();
    let (forward, backward) = if up {
        (value + magnitude, value - magnitude)
    } else {
        (value - magnitude, value + magnitude)
    };
    if (0.0..=1.0).contains(&forward) {
        forward
    } else {
        backward.clamp(0.0, 1.0)
    }
}
