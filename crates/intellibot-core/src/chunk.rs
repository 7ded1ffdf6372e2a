//! Fixed-size overlapping text segmenter.
//!
//! Splits document text into [`Chunk`]s of at most `chunk_size` characters,
//! with consecutive chunks sharing `overlap` characters. Sizes and offsets
//! are counted in characters, so multibyte text never splits inside a
//! code point.
//!
//! # Algorithm
//!
//! 1. Start at offset 0.
//! 2. Emit `[start, start + chunk_size)`, clamped to the text length.
//! 3. Stop if that chunk reached the end of the text.
//! 4. Otherwise advance `start` by `chunk_size - overlap` and repeat.
//!
//! For text of `len > overlap` characters this yields
//! `ceil((len - overlap) / (chunk_size - overlap))` chunks, and exactly one
//! chunk otherwise. Empty text yields no chunks.
//!
//! # Example
//!
//! ```rust
//! use intellibot_core::chunk::ChunkingParams;
//!
//! let params = ChunkingParams::new(9, 4).unwrap();
//! let chunks = params.split("AAAA BBBB CCCC DDDD");
//! let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
//! assert_eq!(texts, ["AAAA BBBB", "BBBB CCCC", "CCCC DDDD"]);
//! ```

use crate::error::{ChatError, Result};
use crate::models::{Chunk, ChunkCollection, Document};

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 800;
/// Default overlap between consecutive chunks, in characters.
pub const DEFAULT_OVERLAP: usize = 100;

/// Validated segmentation parameters.
///
/// Construction is the only place the `overlap < chunk_size` guard is
/// checked; a value of this type always makes forward progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingParams {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkingParams {
    /// Validate a window size and overlap.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: Maximum characters per chunk.
    /// * `overlap`: Characters shared by consecutive chunks.
    ///
    /// # Errors
    ///
    /// [`ChatError::InvalidChunking`] if `chunk_size` is zero or `overlap` is
    /// not strictly smaller than `chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ChatError::InvalidChunking {
                chunk_size,
                overlap,
                reason: "chunk_size must be > 0",
            });
        }
        if overlap >= chunk_size {
            return Err(ChatError::InvalidChunking {
                chunk_size,
                overlap,
                reason: "overlap must be < chunk_size",
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between the starts of consecutive chunks. Always > 0.
    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Split `text` into ordered, overlapping chunks.
    ///
    /// Windows of `chunk_size` characters start every [`step`](Self::step)
    /// characters; splitting stops at the first window that reaches the end
    /// of the text.
    ///
    /// # Arguments
    ///
    /// * `text`: The full document text, counted in `char`s.
    ///
    /// # Guarantees
    ///
    /// - Empty text yields no chunks.
    /// - Chunk indices are contiguous: `0, 1, 2, …, N-1`.
    /// - Chunk `i` starts at character `i * step` and holds at most
    ///   `chunk_size` characters; only the last chunk may be shorter.
    /// - For `len > overlap` there are `ceil((len - overlap) / step)` chunks.
    /// - Chunk boundaries always fall on `char` boundaries.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        // Byte offset of every char boundary, including the end of the text.
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let len = boundaries.len() - 1;

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < len {
            let end = (start + self.chunk_size).min(len);
            chunks.push(Chunk {
                index: chunks.len(),
                start,
                end,
                text: text[boundaries[start]..boundaries[end]].to_string(),
            });

            if end == len {
                break;
            }
            start += self.step();
        }

        chunks
    }

    /// Segment a document into a collection that remembers its source.
    pub fn collect(&self, document: &Document) -> ChunkCollection {
        ChunkCollection {
            document_id: document.id.clone(),
            document_name: document.name.clone(),
            hash: document.hash.clone(),
            chunks: self.split(&document.text),
        }
    }
}

impl Default for ChunkingParams {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

/// Validate parameters and split `text` in one call.
///
/// Fails with [`ChatError::InvalidChunking`] before doing any work when
/// `chunk_size == 0` or `overlap >= chunk_size`.
pub fn segment(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    Ok(ChunkingParams::new(chunk_size, overlap)?.split(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    fn expected_count(len: usize, size: usize, overlap: usize) -> usize {
        if len > overlap {
            (len - overlap).div_ceil(size - overlap)
        } else {
            1
        }
    }

    #[test]
    fn test_empty_text() {
        let chunks = segment("", 10, 2).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = segment("Hello, world!", 800, 100).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello, world!");
        assert_eq!((chunks[0].start, chunks[0].end), (0, 13));
    }

    #[test]
    fn test_overlapping_windows() {
        let chunks = segment("AAAA BBBB CCCC DDDD", 9, 4).unwrap();
        assert_eq!(texts(&chunks), ["AAAA BBBB", "BBBB CCCC", "CCCC DDDD"]);
    }

    #[test]
    fn test_overlap_three_on_nineteen_chars() {
        let chunks = segment("AAAA BBBB CCCC DDDD", 9, 3).unwrap();
        assert_eq!(texts(&chunks), ["AAAA BBBB", "BBB CCCC ", "CC DDDD"]);
        assert_eq!(chunks.len(), expected_count(19, 9, 3));
    }

    #[test]
    fn test_consecutive_chunks_share_overlap() {
        let text: String = ('a'..='z').cycle().take(250).collect();
        let chunks = segment(&text, 40, 7).unwrap();
        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].text.chars().collect();
            let next: Vec<char> = pair[1].text.chars().collect();
            assert_eq!(prev[prev.len() - 7..], next[..7]);
        }
    }

    #[test]
    fn test_count_and_coverage_property() {
        let text: String = "lorem ipsum dolor sit amet ".repeat(13);
        let len = text.chars().count();
        for size in 1..30 {
            for overlap in 0..size {
                let chunks = segment(&text, size, overlap).unwrap();
                assert_eq!(
                    chunks.len(),
                    expected_count(len, size, overlap),
                    "size={} overlap={}",
                    size,
                    overlap
                );

                let mut covered = vec![false; len];
                for c in &chunks {
                    assert!(c.char_len() <= size);
                    assert_eq!(c.text.chars().count(), c.char_len());
                    covered[c.start..c.end].iter_mut().for_each(|x| *x = true);
                }
                assert!(covered.iter().all(|x| *x), "size={} overlap={}", size, overlap);
            }
        }
    }

    #[test]
    fn test_text_not_longer_than_overlap() {
        let chunks = segment("abc", 10, 5).unwrap();
        assert_eq!(texts(&chunks), ["abc"]);
    }

    #[test]
    fn test_indices_contiguous() {
        let text = "x".repeat(1000);
        let chunks = segment(&text, 64, 16).unwrap();
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i, "Index mismatch at position {}", i);
        }
    }

    #[test]
    fn test_multibyte_utf8_chars() {
        let text = "┌──────────────────┐\n│ Hello wörld      │\n└──────────────────┘";
        let chunks = segment(text, 7, 2).unwrap();
        assert!(!chunks.is_empty());
        for c in &chunks {
            assert!(c.text.chars().count() <= 7);
        }
        let last = chunks.last().unwrap();
        assert_eq!(last.end, text.chars().count());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let err = segment("abc", 0, 0).unwrap_err();
        assert!(matches!(err, ChatError::InvalidChunking { chunk_size: 0, .. }));
    }

    #[test]
    fn test_overlap_not_less_than_size_rejected() {
        assert!(segment("abc", 10, 10).is_err());
        assert!(segment("abc", 10, 11).is_err());
        assert!(ChunkingParams::new(10, 9).is_ok());
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha beta gamma delta epsilon zeta eta theta";
        let a = segment(text, 12, 4).unwrap();
        let b = segment(text, 12, 4).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_collect_keeps_document_identity() {
        let doc = Document::new("notes.txt", "one two three four five");
        let collection = ChunkingParams::new(10, 2).unwrap().collect(&doc);
        assert_eq!(collection.document_id, doc.id);
        assert_eq!(collection.document_name, "notes.txt");
        assert_eq!(collection.hash, doc.hash);
        assert_eq!(collection.len(), 3);
    }
}
