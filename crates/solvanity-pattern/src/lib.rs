//! SolVanity Pattern Matching Engine
//!
//! Normalizes and validates user patterns, estimates how hard they are to
//! hit, and tests candidate addresses against them (prefix or suffix).

mod difficulty;
mod matcher;

pub use difficulty::{
    difficulty, difficulty_f64, estimate_time, format_difficulty, format_duration, probability50,
    DEFAULT_ATTEMPTS_PER_SECOND,
};
pub use matcher::{
    charset_size, matches, normalize, valid_characters, validate, validate_detailed, ConfigUpdate,
    MatchMode, Pattern, PatternError, PatternMatcher, SearchConfig, BASE58_ALPHABET,
};

pub use num_bigint::BigUint;
