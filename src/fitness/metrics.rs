//─────────────────────────────────────────────────────────────────────────────
// fitness percentage and resolution-invariant metrics (SAD/px, PSNR)
//─────────────────────────────────────────────────────────────────────────────

use serde::Serialize;

/// scored channels per pixel (RGB)
pub const FITNESS_CHANNELS: u64 = 3;
pub const FITNESS_CHANNELS_F64: f64 = 3.0;

/// largest per-channel error for 8-bit samples
pub const CHANNEL_MAX: u64 = 255;

/// worst possible score for an image: every channel off by 255
#[inline]
pub fn max_score(width: u32, height: u32) -> u64 {
    width as u64 * height as u64 * FITNESS_CHANNELS * CHANNEL_MAX
}

/// fraction of the maximum possible error avoided, as a percentage.
/// 100 = perfect match. clamped to [0, 100]; an empty image reads as 0.
#[inline]
pub fn fitness_percent(best_score: u64, width: u32, height: u32) -> f64 {
    let denom = max_score(width, height);
    if denom == 0 {
        return 0.0;
    }
    let pct = (1.0 - best_score as f64 / denom as f64) * 100.0;
    pct.clamp(0.0, 100.0)
}

/// PSNR (peak signal-to-noise ratio) in decibels.
/// - `mse`: mean squared error (or pseudo-MSE from SAD)
/// - `peak`: 255.0 for 8-bit images
#[inline]
pub fn psnr_from_mse(mse: f64, peak: f64) -> f64 {
    let mse = mse.max(1e-12);
    10.0 * ((peak * peak) / mse).log10()
}

/// cached snapshot of resolution-invariant metrics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub sad_per_px: f64,
    pub psnr: f64,
}

impl MetricsSnapshot {
    /// build metrics from raw SAD + pixel count. treats L1/px/channel as if it were MSE.
    #[inline]
    pub fn from_sad(sad: u64, num_pixels: usize, psnr_peak: f64) -> Self {
        let n = (num_pixels as f64).max(1.0);
        let sad = sad as f64;
        let sad_per_px = sad / n;
        let pseudo_mse = (sad / (n * FITNESS_CHANNELS_F64)).max(1e-12);
        Self { sad_per_px, psnr: psnr_from_mse(pseudo_mse, psnr_peak) }
    }
}
