use super::{book_cleaner, LinearStream};
use crate::config::schema::BookDef;
use crate::extraction::PhysicalPage;
use crate::layout::partition::PartitionId;
use crate::report::{Diagnostic, DiagnosticKind, RunReport};
use regex::Regex;
use std::sync::LazyLock;

static LEADER_DOTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{3,}").unwrap());

static TRAILING_PAGE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s\.]*\d+\s*$").unwrap());

/// Naive two-up traversal: left half then right half of every sheet.
///
/// Linear index `2 * i` is the left half of physical page `i`. Sheets with
/// no area contribute two empty pages so indices stay aligned.
pub fn linear_pages(pages: &[PhysicalPage]) -> Vec<String> {
    let mut linear = Vec::with_capacity(pages.len() * 2);
    for page in pages {
        for half in [PartitionId::Left, PartitionId::Right] {
            if page.bounds().is_degenerate() {
                linear.push(String::new());
            } else {
                linear.push(page.text_in(&half.region(page.width, page.height)));
            }
        }
    }
    linear
}

/// Contents and index pages repeat every title with its page number.
pub fn is_toc_like(text: &str) -> bool {
    let upper = text.to_uppercase();
    LEADER_DOTS.is_match(text) || upper.contains("CONTENTS") || upper.contains("INDEX")
}

/// True when `phrase` appears on a line of `text` that does not end in a
/// page number after it.
fn has_body_anchor(text: &str, phrase: &str) -> bool {
    let phrase = phrase.to_uppercase();
    text.lines().any(|line| {
        let upper = line.to_uppercase();
        match upper.find(&phrase) {
            Some(pos) => !TRAILING_PAGE_NUMBER.is_match(&upper[pos + phrase.len()..]),
            None => false,
        }
    })
}

/// Locate the book's anchor phrase and return `linear index - logical page`.
pub fn find_offset(book: &BookDef, linear: &[String], window: usize) -> Option<i64> {
    let anchor = book.anchor.as_ref()?;
    let end = book.search_start.saturating_add(window).min(linear.len());

    (book.search_start..end)
        .find(|&i| !is_toc_like(&linear[i]) && has_body_anchor(&linear[i], &anchor.phrase))
        .map(|i| {
            let offset = i as i64 - i64::from(anchor.page);
            log::debug!(
                "book {}: anchor '{}' at linear page {} (offset {})",
                book.id,
                anchor.phrase,
                i,
                offset
            );
            offset
        })
}

/// Anchor offset, else the configured fallback, else a diagnostic.
pub fn resolve_offset(
    book: &BookDef,
    linear: &[String],
    window: usize,
    report: &mut RunReport,
) -> Option<i64> {
    if let Some(offset) = find_offset(book, linear, window) {
        return Some(offset);
    }
    if let Some(offset) = book.fallback_offset {
        log::info!("book {}: anchor not found, using fallback offset {}", book.id, offset);
        return Some(offset);
    }
    report.record(
        Diagnostic::new(
            DiagnosticKind::ExtractionGap,
            format!("book {}: no anchor found and no fallback offset", book.id),
        )
        .book(book.id),
    );
    None
}

/// Offset-driven stream: logical page `n` is linear page `n + offset`.
pub fn offset_stream(book: &BookDef, linear: &[String], offset: i64) -> LinearStream {
    let cleaner = book_cleaner(book);
    let mut stream = LinearStream::new(book.id);
    for number in 1..=book.end_page {
        let index = i64::from(number) + offset;
        let Ok(index) = usize::try_from(index) else {
            continue;
        };
        let Some(text) = linear.get(index) else {
            break;
        };
        if text.trim().is_empty() {
            continue;
        }
        stream.push(number, cleaner.clean_page(text));
    }
    stream
}
