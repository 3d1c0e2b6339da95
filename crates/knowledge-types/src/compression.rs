//! Compression tiers and run records.

use serde::{Deserialize, Serialize};

/// Age tier of a message at compression time.
///
/// The tier determines how aggressively a message is summarized or
/// archived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionTier {
    /// Less than 1 day old: kept verbatim
    Recent,
    /// 1-7 days old: collapsed into window summaries
    Medium,
    /// 7-30 days old: reduced to deduplicated key facts
    Old,
    /// More than 30 days old: moved to the archive store
    Ancient,
}

impl CompressionTier {
    /// Classify a message by its age in days.
    ///
    /// Boundaries: recent `< 1`, medium `[1, 7)`, old `[7, 30)`,
    /// ancient `>= 30`.
    pub fn from_age_days(age_days: f64) -> Self {
        if age_days < 1.0 {
            CompressionTier::Recent
        } else if age_days < 7.0 {
            CompressionTier::Medium
        } else if age_days < 30.0 {
            CompressionTier::Old
        } else {
            CompressionTier::Ancient
        }
    }
}

/// How many original messages landed in each tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBreakdown {
    pub recent: usize,
    pub medium: usize,
    pub old: usize,
    pub ancient: usize,
}

impl TierBreakdown {
    /// Total messages across all tiers.
    pub fn total(&self) -> usize {
        self.recent + self.medium + self.old + self.ancient
    }

    /// Count one message into its tier.
    pub fn record(&mut self, tier: CompressionTier) {
        match tier {
            CompressionTier::Recent => self.recent += 1,
            CompressionTier::Medium => self.medium += 1,
            CompressionTier::Old => self.old += 1,
            CompressionTier::Ancient => self.ancient += 1,
        }
    }
}

/// Result of compressing one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionRecord {
    /// Conversation that was compressed
    pub conversation_id: String,
    /// Total content bytes before compression
    pub original_bytes: usize,
    /// Total content bytes after compression
    pub compressed_bytes: usize,
    /// Size reduction in [0, 1]: `1 - compressed/original`
    pub ratio: f64,
    /// Messages per tier before compression
    pub tiers: TierBreakdown,
    /// Whether the compressed set was committed. False when the reduction
    /// did not meet the target ratio and the conversation was left as-is.
    pub applied: bool,
    /// Human-readable reason when not applied
    pub reason: Option<String>,
}

impl CompressionRecord {
    /// Compute the reduction ratio, 0.0 for an empty original.
    pub fn reduction(original_bytes: usize, compressed_bytes: usize) -> f64 {
        if original_bytes == 0 {
            return 0.0;
        }
        (1.0 - compressed_bytes as f64 / original_bytes as f64).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(CompressionTier::from_age_days(0.0), CompressionTier::Recent);
        assert_eq!(CompressionTier::from_age_days(0.99), CompressionTier::Recent);
        assert_eq!(CompressionTier::from_age_days(1.0), CompressionTier::Medium);
        assert_eq!(CompressionTier::from_age_days(6.9), CompressionTier::Medium);
        assert_eq!(CompressionTier::from_age_days(7.0), CompressionTier::Old);
        assert_eq!(CompressionTier::from_age_days(29.9), CompressionTier::Old);
        assert_eq!(CompressionTier::from_age_days(30.0), CompressionTier::Ancient);
        assert_eq!(CompressionTier::from_age_days(400.0), CompressionTier::Ancient);
    }

    #[test]
    fn test_breakdown_record_and_total() {
        let mut tiers = TierBreakdown::default();
        tiers.record(CompressionTier::Recent);
        tiers.record(CompressionTier::Medium);
        tiers.record(CompressionTier::Medium);
        tiers.record(CompressionTier::Ancient);
        assert_eq!(tiers.recent, 1);
        assert_eq!(tiers.medium, 2);
        assert_eq!(tiers.ancient, 1);
        assert_eq!(tiers.total(), 4);
    }

    #[test]
    fn test_reduction_bounds() {
        assert_eq!(CompressionRecord::reduction(0, 0), 0.0);
        assert!((CompressionRecord::reduction(100, 40) - 0.6).abs() < 1e-9);
        // Compressed larger than original clamps to zero reduction.
        assert_eq!(CompressionRecord::reduction(100, 150), 0.0);
    }
}
