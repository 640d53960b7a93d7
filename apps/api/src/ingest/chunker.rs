//! Splits extracted resume text into retrievable units.
//!
//! A sliding window of `max_chars` characters with `overlap_chars` of
//! overlap, cut preferentially at paragraph, line, then sentence boundaries.
//! Sizes are counted in characters, never bytes, so multi-byte text is safe.

use serde::Serialize;

/// A retrievable piece of the resume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentUnit {
    /// Position of the unit inside the document, starting at 0.
    pub ordinal: usize,
    pub content: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkConfig {
    /// 0 disables chunking: the whole document becomes one unit.
    pub max_chars: usize,
    pub overlap_chars: usize,
}

/// Splits `text` into units. Empty or whitespace-only text yields no units.
pub fn chunk_document(text: &str, config: ChunkConfig) -> Vec<DocumentUnit> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    if config.max_chars == 0 {
        return vec![DocumentUnit {
            ordinal: 0,
            content: text.to_string(),
        }];
    }

    sliding_window(text, config.max_chars, config.overlap_chars)
        .into_iter()
        .enumerate()
        .map(|(ordinal, content)| DocumentUnit { ordinal, content })
        .collect()
}

fn sliding_window(text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    // Byte offset of every char start, plus the end of the text.
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let total_chars = offsets.len() - 1;

    if total_chars <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < total_chars {
        let end = (start + max_chars).min(total_chars);

        let chunk_end = if end < total_chars {
            let window = &text[offsets[start]..offsets[end]];
            find_break_point(window, max_chars)
                .map(|byte_offset| char_index_of(&offsets, offsets[start] + byte_offset))
                .filter(|&idx| idx > start)
                .unwrap_or(end)
        } else {
            end
        };

        let chunk = text[offsets[start]..offsets[chunk_end]].trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        if chunk_end >= total_chars {
            break;
        }

        let step = chunk_end - start;
        start = if step <= overlap {
            chunk_end
        } else {
            chunk_end - overlap
        };
    }

    chunks
}

/// Byte offset (within `window`) just after the best break point, if any.
/// Only ASCII patterns are searched, so results always land on char boundaries.
fn find_break_point(window: &str, max_chars: usize) -> Option<usize> {
    let min_bytes = window
        .char_indices()
        .nth(max_chars / 3)
        .map(|(i, _)| i)
        .unwrap_or(0);

    if let Some(pos) = window.rfind("\n\n") {
        if pos > min_bytes {
            return Some(pos + 2);
        }
    }

    // Resume bullets sit one per line.
    if let Some(pos) = window.rfind('\n') {
        if pos > min_bytes {
            return Some(pos + 1);
        }
    }

    for pattern in [". ", "! ", "? "] {
        if let Some(pos) = window.rfind(pattern) {
            if pos > min_bytes {
                return Some(pos + pattern.len());
            }
        }
    }

    window.rfind(' ').map(|pos| pos + 1)
}

fn char_index_of(offsets: &[usize], byte_offset: usize) -> usize {
    match offsets.binary_search(&byte_offset) {
        Ok(idx) => idx,
        Err(idx) => idx.saturating_sub(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: ChunkConfig = ChunkConfig {
        max_chars: 200,
        overlap_chars: 40,
    };

    #[test]
    fn test_short_text_is_a_single_unit() {
        let units = chunk_document("Experienced engineer with 5 years Python.", SMALL);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].ordinal, 0);
        assert_eq!(units[0].content, "Experienced engineer with 5 years Python.");
    }

    #[test]
    fn test_whitespace_text_yields_no_units() {
        assert!(chunk_document("  \n\n\t ", SMALL).is_empty());
    }

    #[test]
    fn test_disabled_chunking_keeps_whole_document() {
        let text = "Summary line.\n".repeat(500);
        let config = ChunkConfig {
            max_chars: 0,
            overlap_chars: 0,
        };
        let units = chunk_document(&text, config);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].content, text.trim());
    }

    #[test]
    fn test_long_text_is_split_within_budget() {
        let text = "Led migration of billing to Rust. ".repeat(60);
        let units = chunk_document(&text, SMALL);

        assert!(units.len() > 1);
        for (i, unit) in units.iter().enumerate() {
            assert_eq!(unit.ordinal, i);
            assert!(unit.content.chars().count() <= SMALL.max_chars);
        }
    }

    #[test]
    fn test_consecutive_units_overlap() {
        let text = "Shipped the payments API. ".repeat(40);
        let units = chunk_document(&text, SMALL);

        for pair in units.windows(2) {
            let tail: String = pair[0]
                .content
                .chars()
                .rev()
                .take(10)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            assert!(pair[1].content.contains(tail.trim()));
        }
    }

    #[test]
    fn test_multibyte_text_does_not_split_chars() {
        let text = "Développeur expérimenté — ingénierie logicielle. ".repeat(30);
        let units = chunk_document(&text, SMALL);

        assert!(units.len() > 1);
        let rebuilt: usize = units.iter().map(|u| u.content.chars().count()).sum();
        assert!(rebuilt >= text.trim().chars().count());
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let first = "Experience ".repeat(10);
        let second = "Education ".repeat(30);
        let text = format!("{}\n\n{}", first.trim(), second.trim());
        let units = chunk_document(&text, SMALL);

        assert_eq!(units[0].content, first.trim());
    }

    #[test]
    fn test_prefers_line_breaks_over_sentence_ends() {
        let first = "Built services. ".repeat(6);
        let second = "Shipped features. Improved latency ".repeat(8);
        let text = format!("{}\n{}", first.trim(), second.trim());
        let units = chunk_document(&text, SMALL);

        assert!(units.len() > 1);
        assert_eq!(units[0].content, first.trim());
    }
}
