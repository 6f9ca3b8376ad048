//! Per-book linear text streams.
//!
//! A stream is the book's cleaned logical pages in ascending page order. It is
//! assembled from the logical map when the map knows the book, and from the
//! naive two-up traversal plus an anchor offset otherwise.

pub mod offset;

use crate::clean::ContentCleaner;
use crate::config::schema::{BookDef, PipelineConfig, StreamStrategy};
use crate::extraction::PhysicalPage;
use crate::mapping::LogicalMap;
use crate::model::BookId;
use crate::report::{Diagnostic, DiagnosticKind, RunReport};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamPage {
    pub number: u32,
    pub text: String,
}

/// Ordered (logical page, text) pairs of one book. Page numbers strictly
/// increase; gaps are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearStream {
    pub book_id: BookId,
    pages: Vec<StreamPage>,
}

impl LinearStream {
    pub fn new(book_id: BookId) -> Self {
        LinearStream {
            book_id,
            pages: Vec::new(),
        }
    }

    /// Append a page. Returns false, leaving the stream unchanged, if
    /// `number` is not greater than the last page's.
    pub fn push(&mut self, number: u32, text: String) -> bool {
        if self.pages.last().is_some_and(|p| p.number >= number) {
            return false;
        }
        self.pages.push(StreamPage { number, text });
        true
    }

    pub fn pages(&self) -> &[StreamPage] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn page(&self, number: u32) -> Option<&str> {
        self.pages
            .binary_search_by_key(&number, |p| p.number)
            .ok()
            .map(|i| self.pages[i].text.as_str())
    }

    /// Pages with `start <= number < end`.
    pub fn span(&self, start: u32, end: u32) -> &[StreamPage] {
        let from = self.pages.partition_point(|p| p.number < start);
        let to = self.pages.partition_point(|p| p.number < end);
        &self.pages[from..to.max(from)]
    }
}

pub type Streams = BTreeMap<BookId, LinearStream>;

/// Content cleaner for one book: its header, title and extra running headers.
pub fn book_cleaner(book: &BookDef) -> ContentCleaner {
    ContentCleaner::new(
        [book.header.as_str(), book.title.as_str()]
            .into_iter()
            .chain(book.running_headers.iter().map(String::as_str)),
    )
}

/// Build a stream for every configured book.
pub fn assemble_streams(
    pages: &[PhysicalPage],
    map: Option<&LogicalMap>,
    config: &PipelineConfig,
    report: &mut RunReport,
) -> Streams {
    let mut streams = Streams::new();
    let mut linear: Option<Vec<String>> = None;

    for book in &config.books {
        let use_map = match config.stream.strategy {
            StreamStrategy::Map => true,
            StreamStrategy::Offset => false,
            StreamStrategy::Auto => map.is_some_and(|m| m.has_book(book.id)),
        };

        let stream = if use_map {
            match map {
                Some(map) => map_stream(book, pages, map, report),
                None => {
                    report.record(
                        Diagnostic::new(
                            DiagnosticKind::ExtractionGap,
                            format!("book {}: map-driven stream requested without a map", book.id),
                        )
                        .book(book.id),
                    );
                    LinearStream::new(book.id)
                }
            }
        } else {
            let linear = linear.get_or_insert_with(|| offset::linear_pages(pages));
            match offset::resolve_offset(book, linear, config.stream.anchor_window, report) {
                Some(off) => offset::offset_stream(book, linear, off),
                None => LinearStream::new(book.id),
            }
        };

        log::info!(
            "book {}: {} pages ({})",
            book.id,
            stream.len(),
            if use_map { "map" } else { "offset" }
        );
        streams.insert(book.id, stream);
    }

    streams
}

/// Map-driven stream: each mapped page's partition text, cleaned, in page order.
pub fn map_stream(
    book: &BookDef,
    pages: &[PhysicalPage],
    map: &LogicalMap,
    report: &mut RunReport,
) -> LinearStream {
    let by_index: HashMap<usize, &PhysicalPage> = pages.iter().map(|p| (p.index, p)).collect();
    let cleaner = book_cleaner(book);
    let mut stream = LinearStream::new(book.id);

    for number in map.pages_for(book.id) {
        let Some(page_ref) = map.get(book.id, number) else {
            continue;
        };
        let Some(page) = by_index.get(&page_ref.physical_index) else {
            report.record(
                Diagnostic::new(
                    DiagnosticKind::ExtractionGap,
                    format!(
                        "book {} page {}: physical page {} not extracted",
                        book.id, number, page_ref.physical_index
                    ),
                )
                .book(book.id)
                .page(page_ref.physical_index),
            );
            continue;
        };
        let region = page_ref.partition_id.region(page.width, page.height);
        let text = cleaner.clean_page(&page.text_in(&region));
        stream.push(number, text);
    }

    stream
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_rejects_non_increasing() {
        let mut stream = LinearStream::new(1);
        assert!(stream.push(3, "c".into()));
        assert!(stream.push(5, "e".into()));
        assert!(!stream.push(5, "dup".into()));
        assert!(!stream.push(4, "back".into()));
        assert_eq!(stream.len(), 2);
        assert!(stream
            .pages()
            .windows(2)
            .all(|w| w[0].number < w[1].number));
    }

    #[test]
    fn test_span_and_lookup() {
        let mut stream = LinearStream::new(1);
        for n in [1, 2, 4, 7] {
            stream.push(n, format!("p{n}"));
        }
        let numbers: Vec<u32> = stream.span(2, 7).iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![2, 4]);
        assert!(stream.span(8, 9).is_empty());
        assert!(stream.span(5, 3).is_empty());
        assert_eq!(stream.page(4), Some("p4"));
        assert_eq!(stream.page(3), None);
    }
}
