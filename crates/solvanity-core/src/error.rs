//! Search outcomes other than a match

use thiserror::Error;

use solvanity_pattern::PatternError;

use crate::keygen::KeygenError;

#[derive(Error, Debug)]
pub enum SearchError {
    /// Rejected before any keypair was generated
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] PatternError),

    /// Stopped on request before a match was found
    #[error("Generation stopped")]
    Cancelled,

    /// The keypair source failed; the run is abandoned
    #[error(transparent)]
    Keygen(#[from] KeygenError),
}

impl SearchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SearchError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
