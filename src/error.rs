use std::fmt;

/// everything the core can refuse to do. the core has no I/O of its own,
/// so the taxonomy stays narrow: bad config, failed allocation, failed iteration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvolveError {
    InvalidConfiguration { reason: String },
    ResourceAllocationFailed { resource: &'static str },
    IterationFailed { iteration: u64, reason: String },
}

impl EvolveError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration { reason: reason.into() }
    }
}

impl fmt::Display for EvolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfiguration { reason } => {
                write!(f, "invalid configuration: {reason}")
            }
            Self::ResourceAllocationFailed { resource } => {
                write!(f, "failed to allocate {resource}")
            }
            Self::IterationFailed { iteration, reason } => {
                write!(f, "iteration {iteration} failed: {reason}")
            }
        }
    }
}

impl std::error::Error for EvolveError {}

pub type Result<T> = std::result::Result<T, EvolveError>;
