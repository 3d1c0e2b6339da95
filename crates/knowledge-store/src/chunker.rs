//! Document chunking.
//!
//! Content is split on blank-line paragraph boundaries, then packed
//! greedily into chunks within `[min_chunk_size, max_chunk_size]` bytes.
//! Paragraphs exceeding the maximum are split by sentence, then by word,
//! then hard-truncated as a last resort. Chunks below the minimum are
//! dropped. Paragraph order is preserved.

use tracing::trace;

/// Chunk size bounds, in bytes.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Chunks shorter than this are dropped
    pub min_chunk_size: usize,
    /// No emitted chunk exceeds this
    pub max_chunk_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            min_chunk_size: 100,
            max_chunk_size: 2000,
        }
    }
}

/// Split `content` into chunks within the configured bounds.
pub fn chunk_text(content: &str, config: &ChunkerConfig) -> Vec<String> {
    let normalized = content.replace("\r\n", "\n");

    // Pieces are paragraph-or-smaller units, each within max size.
    let mut pieces: Vec<String> = Vec::new();
    for paragraph in normalized.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }
        if paragraph.len() <= config.max_chunk_size {
            pieces.push(paragraph.to_string());
        } else {
            split_oversized(paragraph, config.max_chunk_size, &mut pieces);
        }
    }

    // Greedy accumulation: merge consecutive pieces while they fit.
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    for piece in pieces {
        if current.is_empty() {
            current = piece;
        } else if current.len() + 2 + piece.len() <= config.max_chunk_size {
            current.push_str("\n\n");
            current.push_str(&piece);
        } else {
            chunks.push(std::mem::take(&mut current));
            current = piece;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    let before = chunks.len();
    chunks.retain(|c| c.len() >= config.min_chunk_size);
    if chunks.len() < before {
        trace!(dropped = before - chunks.len(), "Dropped under-sized chunks");
    }
    chunks
}

/// Break an over-long paragraph into pieces no larger than `max`:
/// sentences first, words next, hard truncation last.
fn split_oversized(paragraph: &str, max: usize, out: &mut Vec<String>) {
    let mut current = String::new();
    for sentence in split_sentences(paragraph) {
        if sentence.len() > max {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            split_by_words(&sentence, max, out);
            continue;
        }
        if current.is_empty() {
            current = sentence;
        } else if current.len() + 1 + sentence.len() <= max {
            current.push(' ');
            current.push_str(&sentence);
        } else {
            out.push(std::mem::take(&mut current));
            current = sentence;
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
}

/// Split text on sentence-ending punctuation followed by whitespace.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev_was_terminator = false;

    for (offset, ch) in text.char_indices() {
        if prev_was_terminator && ch.is_whitespace() {
            let sentence = text[start..offset].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = offset;
        }
        prev_was_terminator = matches!(ch, '.' | '!' | '?');
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

/// Pack whitespace-separated words into pieces no larger than `max`;
/// single words beyond `max` are hard-truncated at a char boundary.
fn split_by_words(text: &str, max: usize, out: &mut Vec<String>) {
    let mut current = String::new();
    for word in text.split_whitespace() {
        if word.len() > max {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            out.push(truncate_at_boundary(word, max).to_string());
            continue;
        }
        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + 1 + word.len() <= max {
            current.push(' ');
            current.push_str(word);
        } else {
            out.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
}

/// Truncate to at most `max` bytes without splitting a char.
fn truncate_at_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(min: usize, max: usize) -> ChunkerConfig {
        ChunkerConfig {
            min_chunk_size: min,
            max_chunk_size: max,
        }
    }

    #[test]
    fn test_all_chunks_within_bounds() {
        let paragraphs: Vec<String> = (0..30)
            .map(|i| format!("Paragraph number {} with enough words to carry real weight in the chunking process.", i))
            .collect();
        let content = paragraphs.join("\n\n");
        let cfg = config(100, 300);

        let chunks = chunk_text(&content, &cfg);
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.len() >= cfg.min_chunk_size, "chunk too small: {}", chunk.len());
            assert!(chunk.len() <= cfg.max_chunk_size, "chunk too large: {}", chunk.len());
        }
    }

    #[test]
    fn test_paragraph_order_preserved() {
        let content = "first paragraph with plenty of words inside it\n\nsecond paragraph with plenty of words inside it\n\nthird paragraph with plenty of words inside it";
        let chunks = chunk_text(content, &config(10, 1000));
        let joined = chunks.join("\n\n");
        let first = joined.find("first").unwrap();
        let second = joined.find("second").unwrap();
        let third = joined.find("third").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn test_greedy_merge_packs_small_paragraphs() {
        let content = "short one\n\nshort two\n\nshort three";
        let chunks = chunk_text(content, &config(5, 1000));
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("short one") && chunks[0].contains("short three"));
    }

    #[test]
    fn test_oversized_paragraph_split_by_sentence() {
        let sentences: Vec<String> = (0..20)
            .map(|i| format!("Sentence number {} has a reasonable amount of words in it.", i))
            .collect();
        let content = sentences.join(" ");
        let cfg = config(30, 120);

        let chunks = chunk_text(&content, &cfg);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= cfg.max_chunk_size);
        }
    }

    #[test]
    fn test_giant_word_hard_truncated() {
        let word = "x".repeat(500);
        let chunks = chunk_text(&word, &config(10, 100));
        // Only the first max-sized slice survives hard truncation.
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 100);
    }

    #[test]
    fn test_hard_truncation_respects_char_boundaries() {
        let word = "é".repeat(300); // 2 bytes per char
        let chunks = chunk_text(&word, &config(10, 101));
        assert_eq!(chunks[0].len(), 100, "must back off to a char boundary");
        assert!(chunks[0].chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_under_min_chunks_dropped() {
        let content = "tiny";
        assert!(chunk_text(content, &config(100, 2000)).is_empty());
    }

    #[test]
    fn test_blank_lines_and_crlf_handled() {
        let content = "first block of words here\r\n\r\n\r\n\r\nsecond block of words here";
        let chunks = chunk_text(content, &config(5, 30));
        assert_eq!(chunks.len(), 2);
    }
}
