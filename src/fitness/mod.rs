// Fitness module organization
// Each submodule handles a specific aspect of fitness computation

pub mod metrics;
pub mod sad;

// Re-export commonly used types and functions
pub use metrics::{fitness_percent, max_score, MetricsSnapshot};
pub use sad::{accumulate_sad_rgb, sad_rgb_parallel};
