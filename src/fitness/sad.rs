/// Sum of Absolute Differences (SAD) / Manhattan distance on RGB.
/// the target is packed RGB, renders are tiny-skia RGBA; alpha is never scored.
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};

/// SAD of one pixel row
#[inline]
fn sad_row(target_rgb: &[u8], render_rgba: &[u8]) -> u64 {
    target_rgb
        .chunks_exact(3)
        .zip(render_rgba.chunks_exact(4))
        .map(|(t, c)| {
            let dr = (t[0] as i32 - c[0] as i32).unsigned_abs();
            let dg = (t[1] as i32 - c[1] as i32).unsigned_abs();
            let db = (t[2] as i32 - c[2] as i32).unsigned_abs();
            (dr + dg + db) as u64
        })
        .sum()
}

/// parallel SAD over every pixel, one rayon task per row, each row's partial sum
/// added atomically into `acc`. the caller resets `acc` first; once this returns
/// every row has been folded in (rayon joins before returning).
pub fn accumulate_sad_rgb(target_rgb: &[u8], render_rgba: &[u8], width: u32, acc: &AtomicU64) {
    profiling::scope!("accumulate_sad_rgb");
    debug_assert_eq!(target_rgb.len() / 3, render_rgba.len() / 4);

    let w = width as usize;
    target_rgb
        .par_chunks(w * 3)
        .zip(render_rgba.par_chunks(w * 4))
        .for_each(|(t_row, c_row)| {
            acc.fetch_add(sad_row(t_row, c_row), Ordering::Relaxed);
        });
}

/// convenience wrapper returning the total directly
pub fn sad_rgb_parallel(target_rgb: &[u8], render_rgba: &[u8], width: u32) -> u64 {
    let acc = AtomicU64::new(0);
    accumulate_sad_rgb(target_rgb, render_rgba, width, &acc);
    acc.load(Ordering::Acquire)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_images_score_zero() {
        let target = vec![255u8; 4 * 3];
        let render = vec![255u8; 4 * 4];
        assert_eq!(sad_rgb_parallel(&target, &render, 2), 0);
    }

    #[test]
    fn alpha_is_ignored() {
        let target = vec![10u8, 20, 30];
        let render = vec![10u8, 20, 30, 0];
        assert_eq!(sad_rgb_parallel(&target, &render, 1), 0);
    }

    #[test]
    fn sums_channel_differences() {
        // 2x2: one black pixel against white, one off by (1,2,3)
        let target = vec![255u8; 12];
        let mut render = vec![255u8; 16];
        render[0..3].copy_from_slice(&[0, 0, 0]);
        render[12..15].copy_from_slice(&[254, 253, 252]);
        assert_eq!(sad_rgb_parallel(&target, &render, 2), 765 + 6);
    }

    #[test]
    fn accumulates_on_top_of_existing_value() {
        let acc = AtomicU64::new(100);
        accumulate_sad_rgb(&[0, 0, 0], &[1, 1, 1, 255], 1, &acc);
        assert_eq!(acc.load(Ordering::Acquire), 103);
    }
}
