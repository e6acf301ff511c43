use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use crate::error::{EvolveError, Result};

/// a triangle with normalized [0,1] vertices and un-premultiplied [0,1] color
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub pos_a: [f32; 2],
    pub pos_b: [f32; 2],
    pub pos_c: [f32; 2],
    pub rgba: [f32; 4],
}

/// one scalar slot of a triangle. mutations replace exactly one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriangleField {
    AX,
    AY,
    BX,
    BY,
    CX,
    CY,
    Red,
    Green,
    Blue,
    Alpha,
}

impl TriangleField {
    pub const GEOMETRY: [TriangleField; 6] = [
        TriangleField::AX,
        TriangleField::AY,
        TriangleField::BX,
        TriangleField::BY,
        TriangleField::CX,
        TriangleField::CY,
    ];

    pub const COLOR: [TriangleField; 4] = [
        TriangleField::Red,
        TriangleField::Green,
        TriangleField::Blue,
        TriangleField::Alpha,
    ];

    pub fn is_geometry(self) -> bool {
        !Self::COLOR.contains(&self)
    }
}

impl Triangle {
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self {
            pos_a: [rng.random::<f32>(), rng.random::<f32>()],
            pos_b: [rng.random::<f32>(), rng.random::<f32>()],
            pos_c: [rng.random::<f32>(), rng.random::<f32>()],
            rgba: [
                rng.random::<f32>(),
                rng.random::<f32>(),
                rng.random::<f32>(),
                rng.random::<f32>(),
            ],
        }
    }

    pub fn get(&self, field: TriangleField) -> f32 {
        match field {
            TriangleField::AX => self.pos_a[0],
            TriangleField::AY => self.pos_a[1],
            TriangleField::BX => self.pos_b[0],
            TriangleField::BY => self.pos_b[1],
            TriangleField::CX => self.pos_c[0],
            TriangleField::CY => self.pos_c[1],
            TriangleField::Red => self.rgba[0],
            TriangleField::Green => self.rgba[1],
            TriangleField::Blue => self.rgba[2],
            TriangleField::Alpha => self.rgba[3],
        }
    }

    pub fn set(&mut self, field: TriangleField, value: f32) {
        let slot = match field {
            TriangleField::AX => &mut self.pos_a[0],
            TriangleField::AY => &mut self.pos_a[1],
            TriangleField::BX => &mut self.pos_b[0],
            TriangleField::BY => &mut self.pos_b[1],
            TriangleField::CX => &mut self.pos_c[0],
            TriangleField::CY => &mut self.pos_c[1],
            TriangleField::Red => &mut self.rgba[0],
            TriangleField::Green => &mut self.rgba[1],
            TriangleField::Blue => &mut self.rgba[2],
            TriangleField::Alpha => &mut self.rgba[3],
        };
        *slot = value;
    }

    /// vertices scaled to pixel space
    pub fn pixel_points(&self, width: u32, height: u32) -> [(f32, f32); 3] {
        let (w, h) = (width as f32, height as f32);
        [
            (self.pos_a[0] * w, self.pos_a[1] * h),
            (self.pos_b[0] * w, self.pos_b[1] * h),
            (self.pos_c[0] * w, self.pos_c[1] * h),
        ]
    }
}

/// ordered triangles, painted back-to-front (later index = on top)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub tris: Vec<Triangle>,
}

impl Genome {
    /// N uniformly random triangles from a seedable stream
    pub fn random(triangle_count: usize, seed: u64) -> Result<Self> {
        profiling::scope!("Genome::random");
        let mut tris = Vec::new();
        tris.try_reserve_exact(triangle_count)
            .map_err(|_| EvolveError::ResourceAllocationFailed { resource: "genome buffer" })?;

        let mut rng = Pcg32::seed_from_u64(seed);
        for _ in 0..triangle_count {
            tris.push(Triangle::random(&mut rng));
        }
        Ok(Self { tris })
    }

    pub fn len(&self) -> usize {
        self.tris.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tris.is_empty()
    }

    /// overwrite self with `src`, one task per triangle. writes are disjoint.
    pub fn copy_from_parallel(&mut self, src: &Genome) {
        profiling::scope!("Genome::copy_from_parallel");
        debug_assert_eq!(self.tris.len(), src.tris.len());
        self.tris
            .par_iter_mut()
            .zip(src.tris.par_iter())
            .for_each(|(dst, src)| *dst = *src);
    }

    pub fn records(&self) -> Vec<TriangleRecord> {
        self.tris.iter().map(TriangleRecord::from).collect()
    }
}

/// which of the two genome buffers an operation reads
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenomeSlot {
    Best,
    Mutant,
}

/// the double buffer: `best` is authoritative, `mutant` is overwritten every iteration
#[derive(Clone, Debug)]
pub struct GenomeStore {
    best: Genome,
    mutant: Genome,
}

impl GenomeStore {
    /// both slots start from the same genome, so the run begins from a tie.
    /// an empty genome has nothing to mutate and is rejected.
    pub fn new(initial: Genome) -> Result<Self> {
        if initial.is_empty() {
            return Err(EvolveError::invalid("genome store needs at least one triangle"));
        }
        let mutant = initial.clone();
        Ok(Self { best: initial, mutant })
    }

    pub fn triangle_count(&self) -> usize {
        self.best.len()
    }

    pub fn slot(&self, slot: GenomeSlot) -> &Genome {
        match slot {
            GenomeSlot::Best => &self.best,
            GenomeSlot::Mutant => &self.mutant,
        }
    }

    pub fn best(&self) -> &Genome {
        &self.best
    }

    pub fn mutant(&self) -> &Genome {
        &self.mutant
    }

    pub(crate) fn mutant_mut(&mut self) -> &mut Genome {
        &mut self.mutant
    }

    /// best → mutant, start of every mutation
    pub(crate) fn reset_mutant(&mut self) {
        let Self { best, mutant } = self;
        mutant.copy_from_parallel(best);
    }

    /// mutant → best, only from the commit gate
    pub(crate) fn promote_mutant(&mut self) {
        let Self { best, mutant } = self;
        best.copy_from_parallel(mutant);
    }
}

/// plain export record: 6 coordinates + 4 color values
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriangleRecord {
    pub coords: [f32; 6],
    pub rgba: [f32; 4],
}

impl From<&Triangle> for TriangleRecord {
    fn from(t: &Triangle) -> Self {
        Self {
            coords: [t.pos_a[0], t.pos_a[1], t.pos_b[0], t.pos_b[1], t.pos_c[0], t.pos_c[1]],
            rgba: t.rgba,
        }
    }
}

/// one line per triangle: `ax ay bx by cx cy r g b a`
pub fn write_records<W: Write>(records: &[TriangleRecord], mut out: W) -> io::Result<()> {
    for rec in records {
        let c = &rec.coords;
        let col = &rec.rgba;
        writeln!(
            out,
            "{:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6}",
            c[0], c[1], c[2], c[3], c[4], c[5], col[0], col[1], col[2], col[3]
        )?;
    }
    Ok(())
}
