//! Overlapping window chunker.
//!
//! Splits document text into [`Chunk`]s of at most `size` characters where
//! adjacent chunks share exactly `overlap` characters. Window ends prefer
//! structural boundaries so code is not cut mid-line.
//!
//! # Algorithm
//!
//! 1. Count characters (Unicode scalar values), not bytes.
//! 2. If the remaining text fits in `size`, emit it and stop.
//! 3. Otherwise look inside the window `(start + overlap, start + size]` for
//!    the last paragraph break (`\n\n`), then line break (`\n`), then space.
//!    The window ends just after the separator. With no boundary, hard cut at
//!    `start + size`.
//! 4. The next window starts `overlap` characters before the previous end.
//!
//! Because every chunk after the first begins with exactly `overlap`
//! characters of its predecessor, dropping those prefixes and concatenating
//! reproduces the document.
//!
//! # Example
//!
//! ```rust
//! use rag_review_core::chunk::split_text;
//!
//! let pieces = split_text("alpha beta gamma delta", 12, 4).unwrap();
//! assert_eq!(pieces, vec!["alpha beta ", "eta gamma ", "mma delta"]);
//! ```

use crate::error::{ReviewError, ReviewResult};
use crate::models::{Chunk, Document};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Boundaries tried in order before falling back to a hard cut.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Split every document into chunks, tagging each with its document's
/// metadata plus a `chunk_index`.
///
/// Documents that are empty or whitespace-only produce no chunks.
pub fn split(documents: &[Document], size: usize, overlap: usize) -> ReviewResult<Vec<Chunk>> {
    validate(size, overlap)?;

    let mut chunks = Vec::new();
    for doc in documents {
        if doc.text.trim().is_empty() {
            continue;
        }
        for (i, piece) in windows(&doc.text, size, overlap).into_iter().enumerate() {
            let mut source_metadata = doc.metadata.clone();
            source_metadata.insert("chunk_index".to_string(), i.to_string());
            chunks.push(Chunk {
                text: piece.to_string(),
                source_metadata,
            });
        }
    }
    Ok(chunks)
}

/// Split a single text into overlapping window slices.
pub fn split_text(text: &str, size: usize, overlap: usize) -> ReviewResult<Vec<&str>> {
    validate(size, overlap)?;
    if text.is_empty() {
        return Ok(Vec::new());
    }
    Ok(windows(text, size, overlap))
}

fn validate(size: usize, overlap: usize) -> ReviewResult<()> {
    if size == 0 {
        return Err(ReviewError::InvalidInput(
            "chunk size must be > 0".to_string(),
        ));
    }
    if overlap >= size {
        return Err(ReviewError::InvalidInput(format!(
            "chunk overlap ({}) must be smaller than chunk size ({})",
            overlap, size
        )));
    }
    Ok(())
}

fn windows(text: &str, size: usize, overlap: usize) -> Vec<&str> {
    // offsets[i] is the byte offset of char i; offsets[n] == text.len().
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let n = offsets.len() - 1;

    let mut pieces = Vec::new();
    let mut start = 0;
    loop {
        if n - start <= size {
            pieces.push(&text[offsets[start]..]);
            break;
        }
        let end = break_point(text, &offsets, start, start + size, start + overlap);
        pieces.push(&text[offsets[start]..offsets[end]]);
        start = end - overlap;
    }
    pieces
}

/// Pick the char index where the window `[start, hard_end)` should end.
///
/// The result is always in `(min_end, hard_end]`, which keeps the next
/// start strictly ahead of the current one.
fn break_point(text: &str, offsets: &[usize], start: usize, hard_end: usize, min_end: usize) -> usize {
    let window = &text[offsets[start]..offsets[hard_end]];
    for sep in SEPARATORS {
        if let Some(pos) = window.rfind(sep) {
            let end_byte = offsets[start] + pos + sep.len();
            let end = offsets.binary_search(&end_byte).unwrap_or_else(|i| i);
            if end > min_end {
                return end;
            }
        }
    }
    hard_end
}
