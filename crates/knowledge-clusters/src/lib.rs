//! # knowledge-clusters
//!
//! Groups conversations into topic clusters with k-means over their
//! embeddings, using `1 - cosine_similarity` as the distance and
//! k-means++ seeding.
//!
//! A run is wholesale: it recomputes every cluster, relabels them from
//! member title keywords, rewrites conversation assignments, and replaces
//! auto-tags. Clusters below the size floor are discarded, not
//! reassigned. With too few embedded conversations the run aborts with a
//! "not enough data" outcome and writes nothing.

pub mod engine;
pub mod error;
pub mod kmeans;

pub use engine::{
    ClusterConfig, ClusterEngine, ClusterOutcome, ClusterRunReport, SimilarConversation,
};
pub use error::ClusterError;
pub use kmeans::{cosine_similarity, kmeans, KMeansResult};
