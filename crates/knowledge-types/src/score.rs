//! Importance score breakdown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-factor breakdown of a conversation's importance score.
///
/// Each sub-score is independently bounded to [1, 10]; the weighted total
/// is clamped to the same range. The breakdown is persisted alongside the
/// composite value so scoring decisions stay auditable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Conversation the score belongs to
    pub conversation_id: String,
    /// Exponential-decay recency score
    pub recency: f64,
    /// Favorite/context/user-initiated engagement score
    pub engagement: f64,
    /// Inverse of title-similar conversation count
    pub uniqueness: f64,
    /// Recent context usage within the rolling window
    pub context_relevance: f64,
    /// Message-count depth score
    pub depth: f64,
    /// Weighted composite, clamped to [1, 10]
    pub total: f64,
    /// When the score was computed
    pub scored_at: DateTime<Utc>,
}

impl ScoreBreakdown {
    /// True when every component sits inside the contract range.
    pub fn in_bounds(&self) -> bool {
        let parts = [
            self.recency,
            self.engagement,
            self.uniqueness,
            self.context_relevance,
            self.depth,
            self.total,
        ];
        parts.iter().all(|v| (1.0..=10.0).contains(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_bounds() {
        let breakdown = ScoreBreakdown {
            conversation_id: "c1".to_string(),
            recency: 10.0,
            engagement: 5.0,
            uniqueness: 8.0,
            context_relevance: 2.0,
            depth: 1.0,
            total: 6.2,
            scored_at: Utc::now(),
        };
        assert!(breakdown.in_bounds());

        let mut out = breakdown.clone();
        out.recency = 0.5;
        assert!(!out.in_bounds());
    }
}
