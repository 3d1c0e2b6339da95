//! The five importance factors, as pure functions.
//!
//! Every factor maps its raw signal into [1, 10]; the weighted composite
//! is clamped to the same range by the scorer.

use std::collections::HashSet;

/// Clamp a factor value into the contract range.
fn bounded(value: f64) -> f64 {
    value.clamp(1.0, 10.0)
}

/// Exponential-decay recency: `10 * 0.5^(age / half_life)`.
///
/// A conversation loses half its recency value every `half_life_days`.
pub fn recency(age_days: f64, half_life_days: f64) -> f64 {
    bounded(10.0 * 0.5f64.powf(age_days.max(0.0) / half_life_days))
}

/// Engagement: base 5, +2 when favorited, +1 per tag up to 3, +1 when the
/// user started the conversation.
pub fn engagement(favorited: bool, tag_count: usize, user_initiated: bool) -> f64 {
    let mut value = 5.0;
    if favorited {
        value += 2.0;
    }
    value += tag_count.min(3) as f64;
    if user_initiated {
        value += 1.0;
    }
    bounded(value)
}

/// Uniqueness: inverse tiers over the number of title-similar
/// conversations.
pub fn uniqueness(similar_count: usize) -> f64 {
    match similar_count {
        0 => 10.0,
        1 => 8.0,
        2 => 6.0,
        3 => 4.0,
        _ => 2.0,
    }
}

/// Context relevance: tiers over activity inside the rolling window.
pub fn context_relevance(recent_message_count: usize) -> f64 {
    match recent_message_count {
        0 => 2.0,
        1..=2 => 4.0,
        3..=5 => 6.0,
        6..=10 => 8.0,
        _ => 10.0,
    }
}

/// Depth: tiers over total message count, floored to 1 by the bound.
pub fn depth(message_count: usize) -> f64 {
    let tier = match message_count {
        0 => 0.0,
        1..=2 => 3.0,
        3..=5 => 5.0,
        6..=10 => 7.0,
        11..=20 => 9.0,
        _ => 10.0,
    };
    bounded(tier)
}

/// Significant words (longer than 3 chars) of a title, lowercased.
fn significant_words(title: &str) -> HashSet<String> {
    title
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| w.len() > 3)
        .collect()
}

/// Whether two titles share enough significant words to count as similar
/// (Jaccard overlap at or above `threshold`).
pub fn titles_similar(a: &str, b: &str, threshold: f64) -> bool {
    let a = significant_words(a);
    let b = significant_words(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let intersection = a.intersection(&b).count() as f64;
    let union = a.union(&b).count() as f64;
    intersection / union >= threshold
}
