//! Text chunking on top of `text-splitter`.
//!
//! Chunks are at most `chunk_size` characters, split at the coarsest semantic
//! boundary that fits (paragraphs, lines, sentences, words, then graphemes).
//! Consecutive chunks share up to `overlap` characters.

use agentic_core::{AppError, AppResult};
use text_splitter::{ChunkConfig, TextSplitter};

/// Split `text` into overlapping chunks of at most `chunk_size` characters.
///
/// Whitespace-only chunks are dropped. An overlap that is not smaller than
/// the chunk size is clamped to `chunk_size - 1`.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> AppResult<Vec<String>> {
    let chunk_size = chunk_size.max(1);
    let overlap = overlap.min(chunk_size - 1);

    let config = ChunkConfig::new(chunk_size)
        .with_overlap(overlap)
        .map_err(|e| AppError::Knowledge(format!("Invalid chunk configuration: {}", e)))?;
    let splitter = TextSplitter::new(config);

    let chunks: Vec<String> = splitter
        .chunks(text)
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(str::to_string)
        .collect();

    tracing::debug!(
        "Split text into {} chunks (size: {}, overlap: {})",
        chunks.len(),
        chunk_size,
        overlap
    );

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_whitespace_text() {
        assert!(split_text("", 100, 10).unwrap().is_empty());
        assert!(split_text("   \n\n  \n ", 100, 10).unwrap().is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = split_text("A short document.", 1000, 200).unwrap();
        assert_eq!(chunks, vec!["A short document."]);
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let chunks = split_text("para one.\n\npara two.", 15, 0).unwrap();
        assert_eq!(chunks, vec!["para one.", "para two."]);
    }

    #[test]
    fn test_chunks_respect_size() {
        let text = (0..200)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = split_text(&text, 50, 10).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50, "chunk too long: {}", chunk);
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let text = (0..100)
            .map(|i| format!("w{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = split_text(&text, 50, 20).unwrap();

        assert!(chunks.len() >= 2);
        let first_words: Vec<&str> = chunks[0].split(' ').collect();
        let second_start = chunks[1].split(' ').next().unwrap();
        assert!(first_words.contains(&second_start));
    }

    #[test]
    fn test_no_overlap_covers_all_words() {
        let text = (0..60)
            .map(|i| format!("t{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = split_text(&text, 30, 0).unwrap();
        let rejoined = chunks.join(" ");
        assert_eq!(rejoined, text);
    }

    #[test]
    fn test_long_word_falls_back_to_characters() {
        let text = "x".repeat(25);
        let chunks = split_text(&text, 10, 0).unwrap();
        assert_eq!(chunks, vec!["x".repeat(10), "x".repeat(10), "x".repeat(5)]);
    }

    #[test]
    fn test_multibyte_text() {
        let text = "héllo wörld ñandú café ".repeat(20);
        let chunks = split_text(&text, 12, 3).unwrap();
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 12);
        }
    }

    #[test]
    fn test_overlap_clamped_below_chunk_size() {
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let chunks = split_text(text, 12, 50).unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 12);
        }
    }
}
