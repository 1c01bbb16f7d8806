//! Boundary-aware overlapping text chunker.
//!
//! Splits raw page text into bounded segments suitable for embedding,
//! preferring paragraph, line, sentence, and word boundaries before a hard
//! character cut. Consecutive chunks share a configurable overlap built
//! from whole trailing pieces of the predecessor, and every chunk records
//! the overlap it actually received so the original text can be
//! reconstructed exactly.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::types::RagError;

/// One segment of a source document, ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Per-chunk bookkeeping persisted alongside the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Character length of the chunk text.
    pub len: usize,
    /// Characters at the start of this chunk repeated from the previous one.
    pub overlap: usize,
    /// Zero-based position within the source document.
    pub index: usize,
}

/// Character-budget splitter with whole-piece overlap.
#[derive(Debug, Clone)]
pub struct TextChunker {
    max_chars: usize,
    overlap_chars: usize,
}

impl TextChunker {
    /// Creates a chunker producing chunks of at most `max_chars` characters
    /// with roughly `overlap_chars` characters shared between neighbors.
    pub fn new(max_chars: usize, overlap_chars: usize) -> Result<Self, RagError> {
        if max_chars == 0 {
            return Err(RagError::InvalidParameter(
                "maximum chunk size must be positive".into(),
            ));
        }
        if overlap_chars >= max_chars {
            return Err(RagError::InvalidParameter(format!(
                "overlap ({overlap_chars}) must be smaller than the maximum chunk size ({max_chars})"
            )));
        }
        Ok(Self {
            max_chars,
            overlap_chars,
        })
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn overlap_chars(&self) -> usize {
        self.overlap_chars
    }

    /// Splits `text` into ordered overlapping chunks.
    ///
    /// Empty input produces no chunks; input that fits the budget produces
    /// exactly one chunk with zero overlap.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }

        let pieces = self.split_pieces(text);
        let mut chunks: Vec<Chunk> = Vec::new();
        // Pieces making up the chunk under construction, with char lengths.
        let mut current: Vec<&str> = Vec::new();
        let mut lens: Vec<usize> = Vec::new();
        let mut total = 0usize;
        let mut seeded = 0usize;

        for piece in pieces {
            let piece_len = piece.chars().count();
            if !current.is_empty() && total + piece_len > self.max_chars {
                chunks.push(Chunk {
                    text: current.concat(),
                    metadata: ChunkMetadata {
                        len: total,
                        overlap: seeded,
                        index: chunks.len(),
                    },
                });

                // Carry whole trailing pieces into the next chunk, up to the
                // configured overlap budget.
                let mut keep_from = current.len();
                let mut carried = 0usize;
                while keep_from > 0 && carried + lens[keep_from - 1] <= self.overlap_chars {
                    keep_from -= 1;
                    carried += lens[keep_from];
                }
                current.drain(..keep_from);
                lens.drain(..keep_from);
                total = carried;
                seeded = carried;
            }
            current.push(piece);
            lens.push(piece_len);
            total += piece_len;
        }

        if !current.is_empty() {
            chunks.push(Chunk {
                text: current.concat(),
                metadata: ChunkMetadata {
                    len: total,
                    overlap: seeded,
                    index: chunks.len(),
                },
            });
        }

        chunks
    }

    /// Breaks text into pieces no longer than `max_chars - overlap_chars`,
    /// preferring natural boundaries. Concatenating the pieces yields the
    /// input unchanged.
    fn split_pieces<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let limit = (self.max_chars - self.overlap_chars).max(1);
        let mut pieces = Vec::new();
        split_at_level(text, 0, limit, &mut pieces);
        pieces
    }
}

fn split_at_level<'a>(text: &'a str, level: usize, limit: usize, out: &mut Vec<&'a str>) {
    if text.is_empty() {
        return;
    }
    if text.chars().count() <= limit {
        out.push(text);
        return;
    }
    match level {
        0 => {
            for part in text.split_inclusive("\n\n") {
                split_at_level(part, 1, limit, out);
            }
        }
        1 => {
            for part in text.split_inclusive('\n') {
                split_at_level(part, 2, limit, out);
            }
        }
        2 => {
            for part in text.split_sentence_bounds() {
                split_at_level(part, 3, limit, out);
            }
        }
        3 => {
            for part in text.split_word_bounds() {
                split_at_level(part, 4, limit, out);
            }
        }
        _ => {
            // Hard cut on character boundaries.
            let mut rest = text;
            while rest.chars().count() > limit {
                let cut = rest
                    .char_indices()
                    .nth(limit)
                    .map(|(byte, _)| byte)
                    .unwrap_or(rest.len());
                let (head, tail) = rest.split_at(cut);
                out.push(head);
                rest = tail;
            }
            if !rest.is_empty() {
                out.push(rest);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Strips each chunk's recorded overlap and concatenates the remainder.
    fn reconstruct(chunks: &[Chunk]) -> String {
        chunks
            .iter()
            .map(|chunk| {
                chunk
                    .text
                    .chars()
                    .skip(chunk.metadata.overlap)
                    .collect::<String>()
            })
            .collect()
    }

    fn lorem(paragraphs: usize) -> String {
        let sentence = "The quick brown fox jumps over the lazy dog while the \
                        river keeps moving under the old stone bridge. ";
        let paragraph = sentence.repeat(6);
        vec![paragraph; paragraphs].join("\n\n")
    }

    #[test]
    fn rejects_overlap_not_smaller_than_max() {
        assert!(matches!(
            TextChunker::new(100, 100),
            Err(RagError::InvalidParameter(_))
        ));
        assert!(matches!(
            TextChunker::new(100, 150),
            Err(RagError::InvalidParameter(_))
        ));
        assert!(matches!(
            TextChunker::new(0, 0),
            Err(RagError::InvalidParameter(_))
        ));
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunker = TextChunker::new(1500, 150).unwrap();
        assert!(chunker.chunk("").is_empty());
    }

    #[test]
    fn short_document_is_a_single_chunk_without_overlap() {
        let chunker = TextChunker::new(1500, 150).unwrap();
        let text = "Hello world. This is a test page about llamas.";
        let chunks = chunker.chunk(text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].metadata.len, 46);
        assert_eq!(chunks[0].metadata.overlap, 0);
        assert_eq!(chunks[0].metadata.index, 0);
    }

    #[test]
    fn chunks_respect_the_size_budget() {
        let chunker = TextChunker::new(200, 40).unwrap();
        for chunks in [
            chunker.chunk(&lorem(4)),
            chunker.chunk(&"x".repeat(1000)),
            chunker.chunk("one two three"),
        ] {
            for chunk in &chunks {
                assert!(chunk.metadata.len <= 200, "chunk exceeds budget");
                assert_eq!(chunk.text.chars().count(), chunk.metadata.len);
            }
        }
    }

    #[test]
    fn reconstruction_is_lossless() {
        let chunker = TextChunker::new(200, 40).unwrap();
        for text in [
            lorem(5),
            "x".repeat(973),
            "short".to_string(),
            "line one\nline two\n\nparagraph two".to_string(),
            lorem(1),
        ] {
            let chunks = chunker.chunk(&text);
            assert_eq!(reconstruct(&chunks), text);
        }
    }

    #[test]
    fn adjacent_chunks_share_the_recorded_overlap() {
        let chunker = TextChunker::new(400, 120).unwrap();
        let text = lorem(4);
        let chunks = chunker.chunk(&text);
        assert!(chunks.len() > 1, "fixture should split");

        for pair in chunks.windows(2) {
            let overlap = pair[1].metadata.overlap;
            assert!(overlap <= 120, "overlap above the configured budget");
            let tail: String = pair[0]
                .text
                .chars()
                .skip(pair[0].metadata.len - overlap)
                .collect();
            let head: String = pair[1].text.chars().take(overlap).collect();
            assert_eq!(tail, head, "chunk head must repeat predecessor tail");
        }
    }

    #[test]
    fn prose_overlap_is_carried_when_pieces_fit_the_budget() {
        // Sentences in the fixture are around 100 characters, well within
        // the 120-character overlap budget, so every boundary carries one.
        let chunker = TextChunker::new(400, 120).unwrap();
        let chunks = chunker.chunk(&lorem(4));
        assert!(chunks.len() > 1, "fixture should split");
        assert!(
            chunks.iter().skip(1).all(|c| c.metadata.overlap > 0),
            "prose boundaries should leave room for overlap pieces"
        );
    }

    #[test]
    fn indexes_follow_document_order() {
        let chunker = TextChunker::new(120, 20).unwrap();
        let chunks = chunker.chunk(&lorem(3));
        for (position, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.metadata.index, position);
        }
    }

    #[test]
    fn unbreakable_text_falls_back_to_hard_cuts() {
        let chunker = TextChunker::new(100, 20).unwrap();
        let text = "a".repeat(500);
        let chunks = chunker.chunk(&text);
        assert!(chunks.len() >= 5);
        for chunk in &chunks {
            assert!(chunk.metadata.len <= 100);
        }
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn multibyte_text_is_cut_on_character_boundaries() {
        let chunker = TextChunker::new(50, 10).unwrap();
        let text = "日本語のテキスト。".repeat(30);
        let chunks = chunker.chunk(&text);
        for chunk in &chunks {
            assert!(chunk.metadata.len <= 50);
        }
        assert_eq!(reconstruct(&chunks), text);
    }
}
