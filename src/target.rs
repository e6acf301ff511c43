use crate::error::{EvolveError, Result};

/// the image being approximated. packed RGB8, row-major, immutable for a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetImage {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

impl TargetImage {
    pub fn from_rgb8(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self> {
        check_dims(width, height)?;
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(EvolveError::invalid(format!(
                "rgb buffer holds {} bytes, {width}x{height} needs {expected}",
                rgb.len()
            )));
        }
        Ok(Self { width, height, rgb })
    }

    /// alpha is dropped; scoring only looks at RGB
    pub fn from_rgba8(width: u32, height: u32, rgba: &[u8]) -> Result<Self> {
        check_dims(width, height)?;
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(EvolveError::invalid(format!(
                "rgba buffer holds {} bytes, {width}x{height} needs {expected}",
                rgba.len()
            )));
        }
        let rgb = rgba
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();
        Ok(Self { width, height, rgb })
    }

    /// a single flat color, mostly useful for tests
    pub fn solid(width: u32, height: u32, color: [u8; 3]) -> Result<Self> {
        check_dims(width, height)?;
        let rgb = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Ok(Self { width, height, rgb })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgb(&self) -> &[u8] {
        &self.rgb
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

fn check_dims(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(EvolveError::invalid(format!(
            "target image is {width}x{height}, both sides must be non-zero"
        )));
    }
    Ok(())
}
