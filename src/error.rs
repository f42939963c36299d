//! Error taxonomy shared by the generators.
//!
//! Configuration problems are fatal and reported immediately. A wave
//! contradiction or an unreachable exit is recoverable; the region driver
//! retries those internally and only surfaces `RetryExhausted` once the
//! attempt budget is spent. A grid is never returned partially filled.

/// Error type for generation operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("Invalid seed image: {0}")]
    InvalidSeed(String),
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
    #[error("Pattern missing from seed: {0}")]
    UnknownPattern(String),
    #[error("Invalid grammar ruleset: {0}")]
    InvalidRuleset(String),
    #[error(
        "Region generation gave up after {attempts} attempts \
         ({contradictions} contradictions, {unreachable_exits} exit rejects)"
    )]
    RetryExhausted {
        attempts: u32,
        contradictions: u32,
        unreachable_exits: u32,
    },
}
