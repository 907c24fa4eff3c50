//! Line merging: collapse soft wraps and hyphen breaks into paragraphs.
//!
//! Works on classified blocks. Footer lines are dropped from the
//! translatable text (their positions stay on the block so rendering can
//! skip them); heading lines are kept as their own one-line paragraph so
//! they can be rendered with distinct sizing later.

use crate::model::{BlockRole, LineRole, Page, TextBlock};

/// Merge every block of the document and repair hyphenation across page
/// boundaries. Must run after classification; blocks are not mutated again
/// afterwards except for the cached merged text.
pub fn merge_document(pages: &mut [Page]) {
    for page in pages.iter_mut() {
        for block in &mut page.blocks {
            block.merged_text = merge_block(block);
        }
    }
    repair_page_breaks(pages);
}

/// Produce the merged paragraph text for one classified block.
///
/// Paragraphs are separated by blank lines; soft wraps and hyphen breaks
/// inside a paragraph are collapsed.
pub fn merge_block(block: &TextBlock) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();

    for line in &block.lines {
        let text = line.text.trim();
        if text.is_empty() {
            continue;
        }
        match line.role {
            LineRole::FooterOrPageNumber => continue,
            LineRole::Heading => {
                if !current.is_empty() {
                    paragraphs.push(std::mem::take(&mut current));
                }
                paragraphs.push(text.to_string());
            }
            LineRole::Paragraph => {
                if current.is_empty() {
                    current = text.to_string();
                } else if current.ends_with('-') && starts_lowercase(text) {
                    current = merge_hyphenated(&current, text);
                } else if !ends_sentence(&current) && starts_lowercase(text) {
                    current.push(' ');
                    current.push_str(text);
                } else {
                    paragraphs.push(std::mem::take(&mut current));
                    current = text.to_string();
                }
            }
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    paragraphs.join("\n\n")
}

/// Remove the trailing hyphen and glue the next line's first token onto the
/// partial word; the remainder continues after a single space.
fn merge_hyphenated(current: &str, next: &str) -> String {
    let (first, rest) = split_first_token(next);
    let mut merged = current[..current.len() - 1].to_string();
    merged.push_str(first);
    if !rest.is_empty() {
        merged.push(' ');
        merged.push_str(rest);
    }
    merged
}

/// Split off the first whitespace-separated token.
pub fn split_first_token(text: &str) -> (&str, &str) {
    let trimmed = text.trim_start();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim_start()),
        None => (trimmed, ""),
    }
}

/// Whether the text ends a sentence: terminal punctuation, optionally
/// followed by a closing quote or bracket.
pub fn ends_sentence(text: &str) -> bool {
    let trimmed = text.trim_end();
    let mut chars = trimmed.chars().rev();
    match chars.next() {
        None => false,
        Some(c) if ".!?".contains(c) => true,
        Some(c) if "\"')]\u{201d}\u{2019}".contains(c) => {
            matches!(chars.next(), Some(p) if ".!?".contains(p))
        }
        _ => false,
    }
}

/// Whether the first alphabetic character is lowercase.
pub fn starts_lowercase(text: &str) -> bool {
    text.chars()
        .find(|c| c.is_alphabetic())
        .map(|c| c.is_lowercase())
        .unwrap_or(false)
}

/// Repair hyphenation across page boundaries: when a page's last block ends
/// with a hyphen and the next page's first block continues the word, move
/// that first token back across the boundary. Only hyphenated breaks are
/// repaired; plain soft wraps are left alone to avoid reshaping page
/// layout.
fn repair_page_breaks(pages: &mut [Page]) {
    for page_index in 0..pages.len().saturating_sub(1) {
        let (head, tail) = pages.split_at_mut(page_index + 1);
        let current_page = &mut head[page_index];
        let next_page = &mut tail[0];

        let Some(last) = current_page
            .blocks
            .iter_mut()
            .rev()
            .find(|b| translatable(b))
        else {
            continue;
        };
        let Some(first) = next_page.blocks.iter_mut().find(|b| translatable(b)) else {
            continue;
        };
        if last.role == BlockRole::Heading || first.role == BlockRole::Heading {
            continue;
        }
        if !last.merged_text.ends_with('-') || !starts_lowercase(&first.merged_text) {
            continue;
        }

        let (fragment, remainder) = {
            let (first_token, rest) = split_first_token(&first.merged_text);
            (first_token.to_string(), rest.to_string())
        };
        if fragment.is_empty() {
            continue;
        }
        last.merged_text = {
            let mut text = last.merged_text.clone();
            text.pop();
            text.push_str(&fragment);
            text
        };
        first.merged_text = remainder;
        log::debug!(
            "repaired hyphenated word across pages {} and {}",
            page_index + 1,
            page_index + 2
        );
    }
}

fn translatable(block: &TextBlock) -> bool {
    block.role != BlockRole::Footer && !block.merged_text.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, TextLine};

    fn line_with_role(text: &str, role: LineRole) -> TextLine {
        TextLine {
            text: text.to_string(),
            bbox: BoundingBox::new(72.0, 100.0, 300.0, 112.0),
            font_name: "Helvetica".to_string(),
            font_size: 11.0,
            baseline: 109.6,
            role,
        }
    }

    fn paragraph_block(texts: &[&str]) -> TextBlock {
        TextBlock::from_lines(
            0,
            texts
                .iter()
                .map(|t| line_with_role(t, LineRole::Paragraph))
                .collect(),
        )
    }

    #[test]
    fn test_hyphen_merge_consumes_first_token() {
        let block = paragraph_block(&["exam-", "ple world"]);
        assert_eq!(merge_block(&block), "example world");
    }

    #[test]
    fn test_soft_wrap_merge() {
        let block = paragraph_block(&["the quick brown fox", "jumps over the dog."]);
        assert_eq!(merge_block(&block), "the quick brown fox jumps over the dog.");
    }

    #[test]
    fn test_terminal_punctuation_blocks_merge() {
        // Never soft-merged after terminal punctuation, whatever the casing.
        let block = paragraph_block(&["First sentence ends here.", "another begins now."]);
        assert_eq!(
            merge_block(&block),
            "First sentence ends here.\n\nanother begins now."
        );
    }

    #[test]
    fn test_uppercase_start_is_hard_break() {
        let block = paragraph_block(&["unfinished clause without", "New paragraph marker"]);
        assert_eq!(
            merge_block(&block),
            "unfinished clause without\n\nNew paragraph marker"
        );
    }

    #[test]
    fn test_closing_quote_counts_as_terminal() {
        assert!(ends_sentence("he said \"stop.\""));
        assert!(ends_sentence("done!"));
        assert!(ends_sentence("(finished?)"));
        assert!(!ends_sentence("trailing words"));
        assert!(!ends_sentence(""));
    }

    #[test]
    fn test_footer_lines_dropped() {
        let block = TextBlock::from_lines(
            0,
            vec![
                line_with_role("body text continues", LineRole::Paragraph),
                line_with_role("42", LineRole::FooterOrPageNumber),
                line_with_role("and ends here.", LineRole::Paragraph),
            ],
        );
        assert_eq!(merge_block(&block), "body text continues and ends here.");
    }

    #[test]
    fn test_heading_kept_as_own_paragraph() {
        let block = TextBlock::from_lines(
            0,
            vec![
                line_with_role("Chapter One", LineRole::Heading),
                line_with_role("the story starts here", LineRole::Paragraph),
            ],
        );
        assert_eq!(merge_block(&block), "Chapter One\n\nthe story starts here");
    }

    #[test]
    fn test_split_first_token() {
        assert_eq!(split_first_token("hello world"), ("hello", "world"));
        assert_eq!(split_first_token("  solo"), ("solo", ""));
        assert_eq!(split_first_token(""), ("", ""));
    }

    #[test]
    fn test_repair_page_breaks() {
        let mut page1 = Page::letter(0);
        let mut block1 = paragraph_block(&["ending in a hyphen-"]);
        block1.merged_text = merge_block(&block1);
        page1.blocks = vec![block1];

        let mut page2 = Page::letter(1);
        let mut block2 = paragraph_block(&["ated word follows."]);
        block2.merged_text = merge_block(&block2);
        page2.blocks = vec![block2];

        let mut pages = vec![page1, page2];
        repair_page_breaks(&mut pages);

        assert!(pages[0].blocks[0].merged_text.ends_with("hyphenated"));
        assert_eq!(pages[1].blocks[0].merged_text, "word follows.");
    }

    #[test]
    fn test_repair_skips_footer_blocks() {
        let mut page1 = Page::letter(0);
        let mut block1 = paragraph_block(&["hyphen-"]);
        block1.merged_text = merge_block(&block1);
        page1.blocks = vec![block1];

        let mut page2 = Page::letter(1);
        let mut footer = TextBlock::from_lines(
            0,
            vec![line_with_role("12", LineRole::FooterOrPageNumber)],
        );
        footer.role = BlockRole::Footer;
        footer.merged_text = merge_block(&footer);
        page2.blocks = vec![footer];

        let mut pages = vec![page1, page2];
        repair_page_breaks(&mut pages);

        assert_eq!(pages[0].blocks[0].merged_text, "hyphen-");
    }
}
