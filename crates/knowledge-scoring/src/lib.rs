//! # knowledge-scoring
//!
//! Estimates each conversation's ongoing value as a [1, 10] composite of
//! five factors: exponential-decay recency, engagement, title uniqueness,
//! recent-context relevance, and message-count depth. The per-factor
//! breakdown is persisted with the composite so every score is auditable.
//!
//! Conversations that decay below a threshold and age past a floor become
//! prune candidates; pruning is soft (recoverable) or hard (irreversible)
//! at the caller's choice, and favorited conversations are always exempt.

pub mod error;
pub mod factors;
pub mod scorer;

pub use error::ScoringError;
pub use scorer::{ImportanceScorer, ScoreWeights, ScoringConfig};
