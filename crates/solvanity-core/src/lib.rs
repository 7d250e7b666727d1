//! SolVanity Core Engine
//!
//! Brute-force search for a Solana keypair whose address starts or ends
//! with a chosen pattern, with progress reporting and cooperative
//! cancellation.

mod error;
mod keygen;
mod schedule;
mod search;
mod stats;

pub use error::{Result, SearchError};
pub use keygen::{Candidate, Ed25519Generator, KeygenError, KeypairGenerator};
pub use schedule::{ChannelProgress, NoProgress, ProgressObserver, ThreadYield, Yield, YieldPoint};
pub use search::{EngineOptions, SearchEngine, SearchResult, DEFAULT_BATCH_SIZE};
pub use stats::{
    estimated_progress, format_attempts, ProgressSnapshot, RunState, SearchState, StopHandle,
    MAX_RUNNING_PROGRESS,
};

// Re-exports for convenience
pub use solvanity_pattern::{
    charset_size, difficulty, difficulty_f64, estimate_time, format_difficulty, format_duration,
    matches, normalize, probability50, valid_characters, validate, BigUint, ConfigUpdate, MatchMode,
    Pattern, PatternError, SearchConfig, DEFAULT_ATTEMPTS_PER_SECOND,
};
