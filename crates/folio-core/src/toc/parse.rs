//! Build boundary entries from a book's printed contents pages.

use crate::config::schema::PipelineConfig;
use crate::extraction::PhysicalPage;
use crate::layout::partition::partition_page;
use crate::model::{BookId, BoundaryEntry};
use crate::report::{Diagnostic, DiagnosticKind, RunReport};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Entry titles must be longer than this to count.
const MIN_TITLE_CHARS: usize = 3;

// "Journey to Taif ........ 15"
static DOTTED_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s*\.{3,}\s*(\d+)\s*$").unwrap());

// "Journey to Taif 15"
static PLAIN_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^\d]+?)\s*(\d+)\s*$").unwrap());

static HEADER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:chapter|part)\b").unwrap());

/// Parse one line of a contents page.
pub fn parse_toc_line(book_id: BookId, line: &str) -> Option<BoundaryEntry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let entry = DOTTED_ENTRY
        .captures(line)
        .or_else(|| PLAIN_ENTRY.captures(line));
    if let Some(caps) = entry {
        let title = caps[1].trim().trim_end_matches('.').trim();
        if title.chars().count() > MIN_TITLE_CHARS {
            if let Ok(page) = caps[2].parse::<i64>() {
                return Some(BoundaryEntry::Content {
                    book_id,
                    title: title.to_string(),
                    page,
                });
            }
        }
        return None;
    }

    if HEADER_LINE.is_match(line) {
        return Some(BoundaryEntry::Header {
            book_id,
            title: line.to_string(),
        });
    }

    None
}

pub fn parse_toc_lines<S: AsRef<str>>(book_id: BookId, lines: &[S]) -> Vec<BoundaryEntry> {
    lines
        .iter()
        .filter_map(|line| parse_toc_line(book_id, line.as_ref()))
        .collect()
}

/// Boundary entries from every configured contents page, book by book.
pub fn parse_toc_pages(
    pages: &[PhysicalPage],
    config: &PipelineConfig,
    report: &mut RunReport,
) -> Vec<BoundaryEntry> {
    let by_index: HashMap<usize, &PhysicalPage> = pages.iter().map(|p| (p.index, p)).collect();
    let mut entries = Vec::new();

    for book in &config.books {
        let before = entries.len();
        for index in &book.toc_pages {
            let Some(page) = by_index.get(index) else {
                report.record(
                    Diagnostic::new(
                        DiagnosticKind::ExtractionGap,
                        format!("book {}: contents page {} not extracted", book.id, index),
                    )
                    .book(book.id)
                    .page(*index),
                );
                continue;
            };
            let partitions = match partition_page(page, config.scheme) {
                Ok(p) => p,
                Err(e) => {
                    report.record(
                        Diagnostic::new(DiagnosticKind::ExtractionGap, e.to_string())
                            .book(book.id)
                            .page(*index),
                    );
                    continue;
                }
            };
            for partition in partitions {
                let lines = page.lines_in(&partition.bounds);
                entries.extend(parse_toc_lines(book.id, &lines));
            }
        }
        if !book.toc_pages.is_empty() {
            log::info!(
                "book {}: {} contents entries from {} pages",
                book.id,
                entries.len() - before,
                book.toc_pages.len()
            );
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_and_plain_entries() {
        assert_eq!(
            parse_toc_line(1, "Journey to Taif ............ 15"),
            Some(BoundaryEntry::Content {
                book_id: 1,
                title: "Journey to Taif".into(),
                page: 15
            })
        );
        assert_eq!(
            parse_toc_line(2, "Who is the best person 17"),
            Some(BoundaryEntry::Content {
                book_id: 2,
                title: "Who is the best person".into(),
                page: 17
            })
        );
    }

    #[test]
    fn test_short_titles_and_noise_dropped() {
        assert_eq!(parse_toc_line(1, "No. 12"), None);
        assert_eq!(parse_toc_line(1, "some prose without numbers"), None);
        assert_eq!(parse_toc_line(1, "   "), None);
    }

    #[test]
    fn test_header_lines() {
        assert_eq!(
            parse_toc_line(1, "CHAPTER II: FEAR OF ALLAH"),
            Some(BoundaryEntry::Header {
                book_id: 1,
                title: "CHAPTER II: FEAR OF ALLAH".into()
            })
        );
        assert_eq!(parse_toc_line(1, "Departure"), None);
    }

    #[test]
    fn test_parse_lines_keeps_order() {
        let lines = [
            "CONTENTS",
            "PART I",
            "Journey to Taif .... 15",
            "Sufferings of Hazrat Anas ... 18",
        ];
        let entries = parse_toc_lines(1, &lines);
        assert_eq!(entries.len(), 3);
        assert!(matches!(entries[0], BoundaryEntry::Header { .. }));
        assert_eq!(entries[2].title(), "Sufferings of Hazrat Anas");
    }
}
