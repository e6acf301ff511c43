// per-iteration randomness.
//
// the loop owns exactly one u32 state. each iteration advances it once and the
// resulting draw seeds everything that iteration needs, so a run is fully
// reproducible from (genome seed, mutation seed, target, triangle count).

use rand::SeedableRng;
use rand_pcg::Pcg32;

/// replaces a zero seed (xorshift would stay at zero forever)
const ZERO_SEED_REPLACEMENT: u32 = 0xDEAD_BEEF;

/// xorshift32 sequence. advanced only by the iteration driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedSequence {
    state: u32,
}

impl SeedSequence {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { ZERO_SEED_REPLACEMENT } else { seed },
        }
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    /// advance once and hand out the new state as this iteration's draw
    pub fn next_draw(&mut self) -> MutationDraw {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        MutationDraw(x)
    }
}

/// one iteration's worth of randomness
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MutationDraw(pub u32);

impl MutationDraw {
    /// expand the draw into a generator for the mutation's choices
    pub fn rng(self) -> Pcg32 {
        Pcg32::seed_from_u64(self.0 as u64)
    }
}
