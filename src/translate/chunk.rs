//! Paragraph-aware chunking of text for translation requests.

/// Split text into chunks of at most `max_chars` characters, keeping
/// paragraphs (blank-line separated) together where possible. A paragraph
/// longer than the limit is split at character boundaries.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let paragraphs = text.split("\n\n").filter(|p| !p.trim().is_empty());

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for para in paragraphs {
        let para_chars = para.chars().count();

        if para_chars > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            let chars: Vec<char> = para.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(para);
            current_chars = para_chars;
            continue;
        }

        if current_chars + para_chars + 2 <= max_chars {
            current.push_str("\n\n");
            current.push_str(para);
            current_chars += para_chars + 2;
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(para);
            current_chars = para_chars;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("hello world", 100);
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn test_paragraphs_packed_together() {
        let chunks = chunk_text("one\n\ntwo\n\nthree", 20);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "one\n\ntwo\n\nthree");
    }

    #[test]
    fn test_paragraphs_split_at_limit() {
        let chunks = chunk_text("aaaa\n\nbbbb\n\ncccc", 9);
        // "aaaa" + sep + "bbbb" is 10 chars, over the limit.
        assert_eq!(chunks, vec!["aaaa".to_string(), "bbbb".to_string(), "cccc".to_string()]);
    }

    #[test]
    fn test_oversized_paragraph_hard_split() {
        let chunks = chunk_text(&"x".repeat(25), 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 10);
        assert_eq!(chunks[2].len(), 5);
    }

    #[test]
    fn test_multibyte_boundaries() {
        let text = "é".repeat(7);
        let chunks = chunk_text(&text, 3);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 3);
        assert_eq!(chunks[2].chars().count(), 1);
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert!(chunk_text("", 100).is_empty());
        assert!(chunk_text("\n\n  \n\n", 100).is_empty());
    }
}
