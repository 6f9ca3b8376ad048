pub mod toc;
pub mod transcript;

use crate::clean::collapse_whitespace;
use regex::{Regex, RegexBuilder};
use std::ops::Range;
use std::sync::LazyLock;

static LEADER_DOTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{2,}").unwrap());

/// Short single-line excerpt of `content`, cut on a word boundary.
pub fn make_preview(content: &str, max_chars: usize) -> String {
    let flat = collapse_whitespace(content);
    if flat.chars().count() <= max_chars {
        return flat;
    }
    // No room for an ellipsis.
    if max_chars <= 3 {
        return flat.chars().take(max_chars).collect();
    }

    let budget = max_chars - 3;
    let cut = flat
        .char_indices()
        .nth(budget)
        .map(|(i, _)| i)
        .unwrap_or(flat.len());
    let head = &flat[..cut];
    // Back off to the last space unless the cut already falls on one.
    let head = if flat[cut..].starts_with(' ') {
        head
    } else {
        match head.rfind(' ') {
            Some(space) if space > 0 => &head[..space],
            _ => head,
        }
    };
    format!("{}...", head.trim_end())
}

/// Title with leader dots, page numbers and edge punctuation removed.
pub fn clean_title_for_search(title: &str) -> String {
    let no_dots = LEADER_DOTS.replace_all(title, " ");
    let trimmed = no_dots.trim_matches(|c: char| !c.is_alphabetic());
    collapse_whitespace(trimmed)
}

/// Case-insensitive search for `needle` with any whitespace between words.
/// Returns the byte range of the match in `haystack`.
pub fn find_phrase(haystack: &str, needle: &str) -> Option<Range<usize>> {
    let words: Vec<String> = needle.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        return None;
    }
    let pattern = RegexBuilder::new(&words.join(r"\s+"))
        .case_insensitive(true)
        .build()
        .ok()?;
    pattern.find(haystack).map(|m| m.range())
}

/// Locate a title: the full cleaned title first, then its first
/// `prefix_chars` characters.
pub fn find_title(haystack: &str, title: &str, prefix_chars: usize) -> Option<Range<usize>> {
    let cleaned = clean_title_for_search(title);
    if cleaned.is_empty() {
        return None;
    }
    if let Some(found) = find_phrase(haystack, &cleaned) {
        return Some(found);
    }

    if prefix_chars == 0 || cleaned.chars().count() <= prefix_chars {
        return None;
    }
    let prefix: String = cleaned.chars().take(prefix_chars).collect();
    find_phrase(haystack, prefix.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_text_untouched() {
        assert_eq!(make_preview("  short\n text ", 150), "short text");
    }

    #[test]
    fn test_preview_breaks_on_word() {
        let preview = make_preview("alpha beta gamma delta", 14);
        assert_eq!(preview, "alpha beta...");
        assert!(preview.chars().count() <= 14);
    }

    #[test]
    fn test_preview_never_exceeds_tiny_limit() {
        for max in 0..=4 {
            let preview = make_preview("alpha beta gamma", max);
            assert!(preview.chars().count() <= max, "{max}: {preview}");
        }
        assert_eq!(make_preview("alpha beta", 2), "al");
        assert_eq!(make_preview("alpha beta", 4), "a...");
    }

    #[test]
    fn test_preview_multibyte() {
        let preview = make_preview("ééééé ééééé ééééé", 10);
        assert_eq!(preview, "ééééé...");
    }

    #[test]
    fn test_clean_title_for_search() {
        assert_eq!(clean_title_for_search("Journey to Taif ......"), "Journey to Taif");
        assert_eq!(clean_title_for_search("12. The Battle  of Uhud 45"), "The Battle of Uhud");
    }

    #[test]
    fn test_find_title_whitespace_and_case() {
        let text = "intro\nJOURNEY  TO\nTAIF and more";
        assert_eq!(find_title(text, "Journey to Taif", 15), Some(6..22));
    }

    #[test]
    fn test_find_title_prefix_fallback() {
        // OCR dropped the end of the title.
        let text = "body\nThe Prophet's Journey ta Taaif\nmore";
        assert_eq!(
            find_title(text, "The Prophet's Journey to Taif", 15).map(|r| r.start),
            Some(5)
        );
        assert_eq!(find_title(text, "Unrelated heading", 15), None);
    }
}
