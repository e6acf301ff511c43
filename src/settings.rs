/// run settings for tricolage
/// loaded from JSON, overridden by command-line flags
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{EvolveError, Result};
use crate::mutation_config::MutateConfig;

pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// triangles per genome. fixed for the lifetime of an engine
    pub triangle_count: usize,
    /// mutate/render/score iterations per reported batch
    pub iterations_per_batch: u32,
    /// seed for the initial random genome
    pub genome_seed: u64,
    /// seed for the per-iteration draw sequence
    pub mutation_seed: u32,
    pub mutation: MutateConfig,
    /// first fitness percentage worth logging as a milestone
    pub milestone_start: u32,
    /// peak value for PSNR (255.0 for 8-bit)
    pub psnr_peak: f64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            triangle_count: 100,
            iterations_per_batch: 10,
            genome_seed: 1,
            mutation_seed: 1,
            mutation: MutateConfig::default(),
            milestone_start: 90,
            psnr_peak: 255.0,
        }
    }
}

impl RunSettings {
    /// checked before anything is allocated
    pub fn validate(&self) -> Result<()> {
        if self.triangle_count == 0 {
            return Err(EvolveError::invalid("triangle count must be positive"));
        }
        if self.iterations_per_batch == 0 {
            return Err(EvolveError::invalid("iterations per batch must be positive"));
        }
        if !(self.psnr_peak > 0.0) {
            return Err(EvolveError::invalid(format!(
                "psnr peak must be positive, got {}",
                self.psnr_peak
            )));
        }
        self.mutation.validate()
    }

    /// save settings to a JSON file
    pub fn save(&self, path: &Path) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// load settings from a JSON file, or return defaults if it is missing or unreadable
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!("failed to parse {}: {}. using defaults.", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                // file doesn't exist or can't be read - use defaults
                Self::default()
            }
        }
    }
}
