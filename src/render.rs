use tiny_skia as sk;

use crate::dna::{Genome, GenomeSlot, GenomeStore, Triangle};
use crate::error::{EvolveError, Result};

/// the two derived buffers: the mutant being scored and the current champion.
/// both can be regenerated from the genome store at any time.
pub struct RenderTargets {
    pub live: sk::Pixmap,
    pub best: sk::Pixmap,
}

impl RenderTargets {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        profiling::scope!("RenderTargets::new");
        Ok(Self {
            live: new_pixmap(width, height)?,
            best: new_pixmap(width, height)?,
        })
    }

    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.live.width() == width && self.live.height() == height
    }
}

fn new_pixmap(width: u32, height: u32) -> Result<sk::Pixmap> {
    sk::Pixmap::new(width, height)
        .ok_or(EvolveError::ResourceAllocationFailed { resource: "render target" })
}

pub struct CpuRenderer;

impl CpuRenderer {
    /// render one slot of the store. same draw path for the mutant and the best genome.
    pub fn render_slot(store: &GenomeStore, slot: GenomeSlot, pix: &mut sk::Pixmap) {
        Self::render_genome(store.slot(slot), pix);
    }

    /// clear to white, then paint triangles back-to-front with source-over.
    /// tiny-skia stores premultiplied RGBA, but over an opaque white base every
    /// pixel stays opaque, so the bytes read back as plain RGB.
    pub fn render_genome(genome: &Genome, pix: &mut sk::Pixmap) {
        profiling::scope!("render_genome");
        pix.fill(sk::Color::WHITE);
        for tri in &genome.tris {
            draw_triangle(pix, tri);
        }
    }

    /// render into a fresh buffer and return un-premultiplied RGBA bytes
    pub fn render_rgba(genome: &Genome, width: u32, height: u32) -> Result<Vec<u8>> {
        let mut pix = new_pixmap(width, height)?;
        Self::render_genome(genome, &mut pix);
        Ok(pix.data().to_vec())
    }
}

fn draw_triangle(pix: &mut sk::Pixmap, tri: &Triangle) {
    let (w, h) = (pix.width(), pix.height());
    let pts = tri.pixel_points(w, h);

    // quick reject: bbox fully outside the pixmap
    let min_x = pts[0].0.min(pts[1].0).min(pts[2].0);
    let min_y = pts[0].1.min(pts[1].1).min(pts[2].1);
    let max_x = pts[0].0.max(pts[1].0).max(pts[2].0);
    let max_y = pts[0].1.max(pts[1].1).max(pts[2].1);
    if max_x < 0.0 || max_y < 0.0 || min_x >= w as f32 || min_y >= h as f32 {
        return;
    }

    let mut pb = sk::PathBuilder::new();
    pb.move_to(pts[0].0, pts[0].1);
    pb.line_to(pts[1].0, pts[1].1);
    pb.line_to(pts[2].0, pts[2].1);
    pb.close();
    // collapsed triangles have no path and cover nothing
    let Some(path) = pb.finish() else {
        return;
    };

    let [r, g, b, a] = tri.rgba;
    let Some(color) = sk::Color::from_rgba(r, g, b, a) else {
        return;
    };

    let mut paint = sk::Paint::default();
    // non-AA fill: vertices snap to 1/64 px, then pixel centers decide coverage.
    // coverage is deterministic, so scores reproduce exactly
    paint.anti_alias = false;
    paint.set_color(color);

    pix.fill_path(&path, &paint, sk::FillRule::Winding, sk::Transform::identity(), None);
}
