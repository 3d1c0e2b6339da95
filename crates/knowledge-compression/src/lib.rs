//! # knowledge-compression
//!
//! Shrinks conversation history by message age: recent messages stay
//! verbatim, medium-age windows collapse into synthetic summaries, old
//! messages fold into deduplicated key facts, and ancient messages move
//! to a separate archive store.
//!
//! The critical invariant is the atomic swap: originals are copied to the
//! backup store, active history replaced, and ancient messages archived
//! in one storage batch. A reader never observes a partially compressed
//! conversation, and any failure before the commit leaves the original
//! messages exactly as they were.

pub mod compressor;
pub mod error;
pub mod summarizer;

pub use compressor::{CompressionConfig, MemoryCompressor};
pub use error::CompressionError;
pub use summarizer::{HeuristicSummarizer, ProviderSummarizer, WindowSummarizer};
