//! Line-streaming text statistics.
//!
//! Computes [`TextStats`] over any [`BufRead`] without holding the whole
//! document as a string. Bytes are decoded per line with lossy UTF-8, so
//! arbitrary byte streams are accepted.
//!
//! # Algorithm
//!
//! 1. Read one line at a time, stripping a trailing `\n` or `\r\n`.
//! 2. Characters: add the line length in Unicode scalar values.
//! 3. Words: add the number of maximal non-whitespace runs in the line.
//! 4. Paragraphs: a blank line (empty or whitespace-only) that follows a
//!    non-blank line closes one paragraph. At end of input, an open
//!    paragraph counts as one more.
//!
//! An empty document has no paragraphs, a document without blank lines has
//! exactly one, and trailing blank lines never add paragraphs.
//!
//! # Example
//!
//! ```rust
//! use antiplag_core::stats::text_stats;
//!
//! let stats = text_stats(b"hello\nworld\n");
//! assert_eq!(stats.paragraph_count, 1);
//! assert_eq!(stats.word_count, 2);
//! assert_eq!(stats.character_count, 10);
//! ```

use std::io::{self, BufRead};

use crate::models::TextStats;

/// Stream `reader` line by line and count paragraphs, words and characters.
pub fn compute_stats<R: BufRead>(mut reader: R) -> io::Result<TextStats> {
    let mut stats = TextStats::default();
    let mut in_paragraph = false;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }

        let line = String::from_utf8_lossy(&buf);
        stats.character_count += line.chars().count() as u64;
        stats.word_count += line.split_whitespace().count() as u64;

        if line.trim().is_empty() {
            if in_paragraph {
                stats.paragraph_count += 1;
                in_paragraph = false;
            }
        } else {
            in_paragraph = true;
        }
    }

    if in_paragraph {
        stats.paragraph_count += 1;
    }

    Ok(stats)
}

/// [`compute_stats`] over an in-memory buffer.
pub fn text_stats(bytes: &[u8]) -> TextStats {
    // Reading from a slice cannot fail.
    compute_stats(bytes).unwrap_or_default()
}
