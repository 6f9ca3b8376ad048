//! Slices per-book streams into content units using a table of contents.

use super::{find_title, make_preview};
use crate::clean::normalize_whitespace;
use crate::config::schema::{BookDef, PipelineConfig, SegmenterConfig};
use crate::model::{BookId, BoundaryEntry, ContentUnit, SegmentationResult, UnitOrigin};
use crate::report::{Diagnostic, DiagnosticKind, RunReport};
use crate::stream::{StreamPage, Streams};
use crate::toc::clean_chapter_label;
use std::collections::HashMap;

pub const FALLBACK_TITLE: &str = "Full Content";

/// A content marker that passed validation.
#[derive(Debug, Clone, Copy)]
struct Marker<'a> {
    book_id: BookId,
    title: &'a str,
    page: u32,
}

/// Half-open logical page range of one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpan {
    pub start: u32,
    pub end: u32,
}

pub struct TocSegmenter<'a> {
    config: &'a PipelineConfig,
}

impl<'a> TocSegmenter<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        TocSegmenter { config }
    }

    fn settings(&self) -> &SegmenterConfig {
        &self.config.segmenter
    }

    /// Validate a content entry; malformed ones are reported and dropped.
    fn marker<'e>(&self, entry: &'e BoundaryEntry, report: &mut RunReport) -> Option<Marker<'e>> {
        let BoundaryEntry::Content {
            book_id,
            title,
            page,
        } = entry
        else {
            return None;
        };

        let Some(book) = self.config.book(*book_id) else {
            report.record(
                Diagnostic::new(
                    DiagnosticKind::MalformedEntry,
                    format!("'{}': unknown book {}", title, book_id),
                )
                .book(*book_id),
            );
            return None;
        };
        // A unit cannot start further past the book's end than one full span.
        let last_start = book
            .end_page
            .saturating_add(self.settings().max_span_pages);
        match u32::try_from(*page) {
            Ok(page) if page > 0 && page <= last_start => Some(Marker {
                book_id: *book_id,
                title,
                page,
            }),
            _ => {
                report.record(
                    Diagnostic::new(
                        DiagnosticKind::MalformedEntry,
                        format!("'{}': invalid start page {}", title, page),
                    )
                    .book(*book_id),
                );
                None
            }
        }
    }

    /// Page span of a unit starting at `start`, repaired if corrupt.
    pub fn span(
        &self,
        book: &BookDef,
        start: u32,
        next_start: Option<u32>,
        report: &mut RunReport,
    ) -> PageSpan {
        let max_span = self.settings().max_span_pages;
        let mut end = next_start.unwrap_or(book.end_page.saturating_add(1));

        if end <= start {
            report.record(
                Diagnostic::new(
                    DiagnosticKind::SpanCorruption,
                    format!("book {} page {}: end {} not after start", book.id, start, end),
                )
                .book(book.id),
            );
            end = start.saturating_add(1);
        }
        if end - start > max_span {
            report.record(
                Diagnostic::new(
                    DiagnosticKind::SpanCorruption,
                    format!(
                        "book {} page {}: span of {} pages truncated to {}",
                        book.id,
                        start,
                        end - start,
                        max_span
                    ),
                )
                .book(book.id),
            );
            end = start.saturating_add(max_span);
        }

        PageSpan { start, end }
    }

    pub fn segment(&self, entries: &[BoundaryEntry], streams: &Streams) -> SegmentationResult {
        let mut report = RunReport::default();
        let settings = self.settings();

        // Validate once so that end-page lookups only see good markers.
        let mut markers: Vec<Option<Marker>> = Vec::with_capacity(entries.len());
        for entry in entries {
            markers.push(self.marker(entry, &mut report));
        }

        let mut chapters: HashMap<BookId, String> = HashMap::new();
        let mut units: Vec<ContentUnit> = Vec::new();

        for (k, entry) in entries.iter().enumerate() {
            if let BoundaryEntry::Header { book_id, title } = entry {
                if self.config.book(*book_id).is_none() {
                    report.record(
                        Diagnostic::new(
                            DiagnosticKind::MalformedEntry,
                            format!("header '{}': unknown book {}", title, book_id),
                        )
                        .book(*book_id),
                    );
                } else {
                    chapters.insert(
                        *book_id,
                        clean_chapter_label(title, &settings.default_chapter),
                    );
                }
                continue;
            }

            let Some(marker) = markers[k] else {
                continue;
            };
            let Some(book) = self.config.book(marker.book_id) else {
                continue;
            };
            let next = markers[k + 1..]
                .iter()
                .flatten()
                .find(|m| m.book_id == marker.book_id);

            let span = self.span(book, marker.page, next.map(|m| m.page), &mut report);
            let mut read_end = span.end;
            if settings.include_boundary_page && next.is_some_and(|m| m.page == span.end) {
                read_end = read_end.saturating_add(1);
            }

            let pages = streams
                .get(&book.id)
                .map(|s| s.span(span.start, read_end))
                .unwrap_or(&[]);
            if pages.is_empty() {
                report.record(
                    Diagnostic::new(
                        DiagnosticKind::ExtractionGap,
                        format!(
                            "'{}': no text for pages {}..{}",
                            marker.title, span.start, read_end
                        ),
                    )
                    .book(book.id),
                );
            }

            let content = self.refine(
                pages,
                marker.title,
                next.map(|m| m.title),
                book.id,
                &mut report,
            );
            if content.chars().count() <= settings.min_content_chars {
                log::debug!(
                    "book {} '{}': {} chars, skipped",
                    book.id,
                    marker.title,
                    content.chars().count()
                );
                report.units_skipped += 1;
                continue;
            }

            let chapter = chapters
                .get(&book.id)
                .cloned()
                .unwrap_or_else(|| settings.default_chapter.clone());
            units.push(ContentUnit {
                id: units.len() as u32 + 1,
                book_id: book.id,
                chapter,
                title: marker.title.trim().to_string(),
                preview: make_preview(&content, settings.preview_chars),
                content,
                origin: UnitOrigin::Marker,
            });
        }

        for book in &self.config.books {
            if units.iter().any(|u| u.book_id == book.id) {
                continue;
            }
            let Some(stream) = streams.get(&book.id) else {
                continue;
            };
            let text = join_pages(stream.span(1, book.end_page.saturating_add(1)));
            let content = normalize_whitespace(&text);
            if content.is_empty() {
                continue;
            }
            log::info!("book {}: no units from markers, emitting full content", book.id);
            units.push(ContentUnit {
                id: units.len() as u32 + 1,
                book_id: book.id,
                chapter: settings.default_chapter.clone(),
                title: FALLBACK_TITLE.to_string(),
                preview: make_preview(&content, settings.preview_chars),
                content,
                origin: UnitOrigin::Fallback,
            });
            report.units_fallback += 1;
        }

        report.units_produced = units.len();
        log::info!(
            "segmented {} units ({} skipped, {} fallback)",
            report.units_produced,
            report.units_skipped,
            report.units_fallback
        );
        SegmentationResult::new(units, report)
    }

    /// Join the span's pages, cutting the first page at the unit's title and
    /// the last page at the next unit's title when they can be found.
    fn refine(
        &self,
        pages: &[StreamPage],
        title: &str,
        next_title: Option<&str>,
        book_id: BookId,
        report: &mut RunReport,
    ) -> String {
        let prefix_chars = self.settings().title_prefix_chars;
        let mut texts: Vec<&str> = pages.iter().map(|p| p.text.as_str()).collect();
        let Some(first) = texts.first().copied() else {
            return String::new();
        };

        // End of the unit's own heading on the first page, relative to the
        // trimmed text.
        let mut heading_end = 0;
        match find_title(first, title, prefix_chars) {
            Some(found) => {
                texts[0] = &first[found.start..];
                heading_end = found.end - found.start;
            }
            None => report.record(
                Diagnostic::new(
                    DiagnosticKind::BoundaryResolutionFailure,
                    format!("'{}': title not found on page {}", title, pages[0].number),
                )
                .book(book_id),
            ),
        }

        if let Some(next_title) = next_title {
            let last = texts.len() - 1;
            let skip = if last == 0 { heading_end } else { 0 };
            let last_text = texts[last];
            match find_title(&last_text[skip..], next_title, prefix_chars) {
                Some(found) => texts[last] = &last_text[..skip + found.start],
                None => report.record(
                    Diagnostic::new(
                        DiagnosticKind::BoundaryResolutionFailure,
                        format!(
                            "'{}': next title '{}' not found on page {}",
                            title, next_title, pages[last].number
                        ),
                    )
                    .book(book_id),
                ),
            }
        }

        normalize_whitespace(&texts.join("\n\n"))
    }
}

fn join_pages(pages: &[StreamPage]) -> String {
    pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_pipeline_config_str;
    use crate::stream::LinearStream;

    const BODY: &str = "The companions endured great hardship and remained steadfast throughout.";

    fn config() -> PipelineConfig {
        parse_pipeline_config_str(
            r#"{
                "name": "test",
                "books": [
                    { "id": 1, "title": "Book A", "header": "BOOK A", "end_page": 10 },
                    { "id": 2, "title": "Book B", "header": "BOOK B", "end_page": 3 }
                ]
            }"#,
        )
        .unwrap()
    }

    fn streams(pages: &[(BookId, u32, &str)]) -> Streams {
        let mut streams = Streams::new();
        for (book, number, text) in pages {
            streams
                .entry(*book)
                .or_insert_with(|| LinearStream::new(*book))
                .push(*number, text.to_string());
        }
        streams
    }

    fn content(book_id: BookId, title: &str, page: i64) -> BoundaryEntry {
        BoundaryEntry::Content {
            book_id,
            title: title.into(),
            page,
        }
    }

    #[test]
    fn test_span_repairs() {
        let config = config();
        let seg = TocSegmenter::new(&config);
        let book = config.book(1).unwrap();
        let mut report = RunReport::default();

        assert_eq!(seg.span(book, 4, Some(6), &mut report), PageSpan { start: 4, end: 6 });
        assert_eq!(seg.span(book, 4, None, &mut report), PageSpan { start: 4, end: 9 });
        assert_eq!(seg.span(book, 4, Some(4), &mut report), PageSpan { start: 4, end: 5 });
        assert_eq!(seg.span(book, 8, None, &mut report), PageSpan { start: 8, end: 11 });
        assert_eq!(report.count(DiagnosticKind::SpanCorruption), 2);
    }

    #[test]
    fn test_shared_page_cut_at_next_title() {
        let config = config();
        let page = format!("Story One\n{BODY}\nStory Two\nSecond story text that is also long enough to keep.");
        let streams = streams(&[(1, 1, &page)]);
        let entries = vec![content(1, "Story One", 1), content(1, "Story Two", 1)];

        let result = TocSegmenter::new(&config).segment(&entries, &streams);
        assert_eq!(result.units.len(), 2);
        let first = &result.units[0];
        assert!(first.content.starts_with("Story One"));
        assert!(!first.content.contains("Story Two"));
        assert!(result.units[1].content.starts_with("Story Two"));
    }

    #[test]
    fn test_missing_next_title_keeps_content() {
        let config = config();
        let page = format!("Story One\n{BODY}");
        let streams = streams(&[(1, 1, &page)]);
        let entries = vec![content(1, "Story One", 1), content(1, "Nowhere To Be Found", 2)];

        let result = TocSegmenter::new(&config).segment(&entries, &streams);
        assert!(!result.units.is_empty());
        assert!(result.units[0].content.contains("steadfast"));
        assert!(result.report.count(DiagnosticKind::BoundaryResolutionFailure) >= 1);
    }

    #[test]
    fn test_malformed_entries_and_short_units() {
        let config = config();
        let streams = streams(&[(1, 1, "tiny"), (1, 2, BODY)]);
        let entries = vec![
            content(1, "Zero page", 0),
            content(9, "Unknown book", 3),
            content(1, "Tiny", 1),
            content(1, "Real", 2),
        ];

        let result = TocSegmenter::new(&config).segment(&entries, &streams);
        assert_eq!(result.report.count(DiagnosticKind::MalformedEntry), 2);
        assert_eq!(result.report.units_skipped, 1);
        assert_eq!(result.units.len(), 1);
        assert_eq!(result.units[0].title, "Real");
    }

    #[test]
    fn test_fallback_unit_for_book_without_units() {
        let config = config();
        let streams = streams(&[(2, 1, BODY), (2, 2, BODY), (2, 9, "beyond the end")]);
        let result = TocSegmenter::new(&config).segment(&[], &streams);

        assert_eq!(result.units.len(), 1);
        let unit = &result.units[0];
        assert_eq!(unit.book_id, 2);
        assert_eq!(unit.title, FALLBACK_TITLE);
        assert_eq!(unit.origin, UnitOrigin::Fallback);
        assert!(!unit.content.contains("beyond the end"));
        assert_eq!(result.report.units_fallback, 1);
    }

    #[test]
    fn test_huge_start_page_is_malformed_not_fatal() {
        let config = config();
        let page = format!("Story One\n{BODY}");
        let streams = streams(&[(1, 1, &page)]);
        let entries = vec![
            content(1, "Story One", 1),
            content(1, "Corrupt", i64::from(u32::MAX)),
            content(1, "Past the end", 16),
        ];

        let result = TocSegmenter::new(&config).segment(&entries, &streams);
        assert_eq!(result.report.count(DiagnosticKind::MalformedEntry), 2);
        assert_eq!(result.units.len(), 1);
        assert_eq!(result.units[0].title, "Story One");

        let seg = TocSegmenter::new(&config);
        let mut report = RunReport::default();
        let span = seg.span(config.book(1).unwrap(), u32::MAX, None, &mut report);
        assert_eq!(span.start, u32::MAX);
        assert!(span.end >= span.start);
    }

    #[test]
    fn test_boundary_page_read_and_cut_at_next_title() {
        let first = format!("Story One\n{BODY}");
        let second = format!("Tail of story one that spills over.\nStory Two\n{BODY}");
        let streams = streams(&[(1, 1, &first), (1, 2, &second)]);
        let entries = vec![content(1, "Story One", 1), content(1, "Story Two", 2)];

        let mut config = config();
        let without = TocSegmenter::new(&config).segment(&entries, &streams);
        assert!(!without.units[0].content.contains("spills over"));

        config.segmenter.include_boundary_page = true;
        let with = TocSegmenter::new(&config).segment(&entries, &streams);
        assert_eq!(with.units.len(), 2);
        let one = &with.units[0];
        assert!(one.content.starts_with("Story One"));
        assert!(one.content.ends_with("spills over."));
        assert!(!one.content.contains("Story Two"));
        assert!(with.units[1].content.starts_with("Story Two"));
    }

    #[test]
    fn test_chapter_follows_headers() {
        let config = config();
        let streams = streams(&[(1, 1, BODY), (1, 2, BODY)]);
        let entries = vec![
            content(1, "Before", 1),
            BoundaryEntry::Header {
                book_id: 1,
                title: "CHAPTER II: Fear of Allah".into(),
            },
            content(1, "After", 2),
        ];

        let result = TocSegmenter::new(&config).segment(&entries, &streams);
        assert_eq!(result.units[0].chapter, "General");
        assert_eq!(result.units[1].chapter, "Fear of Allah");
        assert_eq!(result.chapters.len(), 2);
    }
}
