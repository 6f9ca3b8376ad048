//! Integration tests for the segmentation pipeline end to end.
//!
//! Uses a MockExtractor that returns pre-built pages and transcripts without
//! invoking pdftotext, so these tests run without poppler-utils.

use folio_core::config::builtin::{load_pipeline_preset, load_transcript_preset};
use folio_core::config::parse_pipeline_config_str;
use folio_core::config::schema::{PipelineConfig, StreamStrategy};
use folio_core::error::FolioError;
use folio_core::extraction::{BBox, PhysicalPage, SpatialExtractor, TextFragment};
use folio_core::layout::partition::PartitionId;
use folio_core::mapping::LogicalMap;
use folio_core::model::{BoundaryEntry, CatalogItem, UnitOrigin};
use folio_core::report::DiagnosticKind;
use folio_core::{build_logical_map, parse_toc_pdf, segment_pages, segment_pdf, segment_transcript};

struct MockExtractor {
    pages: Vec<PhysicalPage>,
    transcript: String,
}

impl SpatialExtractor for MockExtractor {
    fn extract_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<PhysicalPage>, FolioError> {
        Ok(self.pages.clone())
    }

    fn extract_transcript(&self, _pdf_bytes: &[u8]) -> Result<String, FolioError> {
        Ok(self.transcript.clone())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

const WIDTH: f32 = 800.0;
const HEIGHT: f32 = 600.0;
const LINE_HEIGHT: f32 = 12.0;

/// One physical page; each line is laid out as words at `(x, y)` onwards.
fn page(index: usize, blocks: &[(f32, f32, &[&str])]) -> PhysicalPage {
    let mut fragments = Vec::new();
    for (x0, y0, lines) in blocks {
        for (row, line) in lines.iter().enumerate() {
            let y = y0 + row as f32 * LINE_HEIGHT;
            let mut x = *x0;
            for word in line.split_whitespace() {
                let width = word.chars().count() as f32 * 4.0;
                let order = fragments.len();
                fragments.push(TextFragment {
                    text: word.to_string(),
                    bbox: BBox::new(x, y, x + width, y + 8.0),
                    font_size: Some(8.0),
                    order,
                });
                x += width + 3.0;
            }
        }
    }
    PhysicalPage {
        index,
        width: WIDTH,
        height: HEIGHT,
        fragments,
    }
}

/// One logical page in the left half: page number and header, then body.
fn single(index: usize, number: u32, header: &str, body: &[&str]) -> PhysicalPage {
    let number = number.to_string();
    let top: &[&str] = &[number.as_str(), header];
    page(index, &[(20.0, 10.0, top), (20.0, 60.0, body)])
}

fn two_book_config() -> PipelineConfig {
    parse_pipeline_config_str(
        r#"{
            "name": "two books",
            "scheme": "halves",
            "books": [
                { "id": 1, "title": "Book A", "header": "BOOK ALPHA", "end_page": 2 },
                { "id": 2, "title": "Book B", "header": "BOOK BETA", "end_page": 3 }
            ]
        }"#,
    )
    .unwrap()
}

const STORY_ONE_P1: &[&str] = &[
    "Story One",
    "The first story begins on the first page with plenty of text.",
];
const STORY_ONE_P2: &[&str] =
    &["It continues on the second page and ends there quietly after a while."];
const STORY_TWO_P3: &[&str] = &[
    "Story Two",
    "The second story belongs to the other book entirely and is long.",
];

// ---------------------------------------------------------------------------
// Test 1: three logical pages, two books, one header -> two units
// ---------------------------------------------------------------------------
#[test]
fn end_to_end_two_books() {
    let config = two_book_config();
    let extractor = MockExtractor {
        pages: vec![
            single(0, 1, "BOOK ALPHA", STORY_ONE_P1),
            single(1, 2, "BOOK ALPHA", STORY_ONE_P2),
            single(2, 3, "BOOK BETA", STORY_TWO_P3),
        ],
        transcript: String::new(),
    };
    let entries = vec![
        BoundaryEntry::Header {
            book_id: 1,
            title: "Intro".into(),
        },
        BoundaryEntry::Content {
            book_id: 1,
            title: "Story One".into(),
            page: 1,
        },
        BoundaryEntry::Content {
            book_id: 2,
            title: "Story Two".into(),
            page: 3,
        },
    ];

    let result = segment_pdf(&[], &extractor, &entries, None, &config).unwrap();

    assert_eq!(result.units.len(), 2);
    let one = &result.units[0];
    assert_eq!(one.id, 1);
    assert_eq!(one.book_id, 1);
    assert_eq!(one.chapter, "Intro");
    assert!(one.content.starts_with("Story One"));
    assert!(one.content.contains("second page"));
    assert!(!one.content.contains("BOOK ALPHA"));

    let two = &result.units[1];
    assert_eq!(two.id, 2);
    assert_eq!(two.book_id, 2);
    assert_eq!(two.chapter, "General");
    assert!(two.content.starts_with("Story Two"));

    let chapters: Vec<&str> = result.chapters.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(chapters, vec!["Intro", "General"]);
    assert_eq!(result.report.units_produced, 2);
    assert_eq!(result.report.units_fallback, 0);
}

// ---------------------------------------------------------------------------
// Test 2: map building is deterministic and round-trips through JSON
// ---------------------------------------------------------------------------
#[test]
fn map_is_idempotent_and_persists() {
    let config = two_book_config();
    let extractor = MockExtractor {
        pages: vec![
            single(0, 1, "BOOK ALPHA", STORY_ONE_P1),
            single(1, 2, "BOOK ALPHA", STORY_ONE_P2),
            single(2, 3, "BOOK BETA", STORY_TWO_P3),
        ],
        transcript: String::new(),
    };

    let (first, _) = build_logical_map(&[], &extractor, &config).unwrap();
    let (second, _) = build_logical_map(&[], &extractor, &config).unwrap();
    let json = first.to_json().unwrap();
    assert_eq!(json, second.to_json().unwrap());

    let reloaded = LogicalMap::from_json(&json).unwrap();
    assert_eq!(reloaded, first);
    let r = reloaded.get(2, 3).unwrap();
    assert_eq!(r.physical_index, 2);
    assert_eq!(r.partition_id, PartitionId::Left);
    assert_eq!(reloaded.pages_for(1), vec![1, 2]);
}

// ---------------------------------------------------------------------------
// Test 3: a duplicate claim on the same key keeps the longer partition
// ---------------------------------------------------------------------------
#[test]
fn duplicate_page_claim_prefers_longer_text() {
    let config = two_book_config();
    // Page 0 carries a stub copy of page 1; page 1 carries the full text.
    let pages = vec![
        single(0, 1, "BOOK ALPHA", &["stub"]),
        single(1, 1, "BOOK ALPHA", STORY_ONE_P1),
    ];
    let extractor = MockExtractor {
        pages,
        transcript: String::new(),
    };
    let (map, _) = build_logical_map(&[], &extractor, &config).unwrap();
    assert_eq!(map.get(1, 1).unwrap().physical_index, 1);
}

// ---------------------------------------------------------------------------
// Test 4: a supplied map skips detection; offset strategy needs no map
// ---------------------------------------------------------------------------
#[test]
fn supplied_map_and_offset_fallback() {
    let mut config = two_book_config();
    let pages = vec![
        single(0, 1, "BOOK ALPHA", STORY_ONE_P1),
        single(1, 2, "BOOK ALPHA", STORY_ONE_P2),
    ];
    let entries = vec![BoundaryEntry::Content {
        book_id: 1,
        title: "Story One".into(),
        page: 1,
    }];

    // Map claims logical page 1 lives on physical page 1.
    let map = LogicalMap::from_json(
        r#"{ "1|1": { "physical_index": 1, "partition_id": "L" } }"#,
    )
    .unwrap();
    let result = segment_pages(&pages, &entries, Some(&map), &config);
    assert_eq!(result.units.len(), 1);
    assert!(result.units[0].content.contains("second page"));
    assert!(!result.units[0].content.contains("first page"));

    // Offset-driven: logical page 1 is linear page 0, the left half of sheet 0.
    config.stream.strategy = StreamStrategy::Offset;
    config.books[0].fallback_offset = Some(-1);
    let pages = vec![
        single(0, 1, "BOOK ALPHA", STORY_ONE_P1),
        single(1, 2, "BOOK ALPHA", STORY_ONE_P2),
    ];
    let result = segment_pages(&pages, &entries, None, &config);
    assert_eq!(result.units.len(), 1);
    assert!(result.units[0].content.starts_with("Story One"));
}

// ---------------------------------------------------------------------------
// Test 5: book with no usable markers gets one fallback unit
// ---------------------------------------------------------------------------
#[test]
fn fallback_unit_covers_book_without_markers() {
    let config = two_book_config();
    let pages = vec![
        single(0, 1, "BOOK ALPHA", STORY_ONE_P1),
        single(1, 3, "BOOK BETA", STORY_TWO_P3),
    ];
    let entries = vec![
        BoundaryEntry::Content {
            book_id: 1,
            title: "Story One".into(),
            page: 1,
        },
        BoundaryEntry::Content {
            book_id: 2,
            title: "Broken".into(),
            page: 0,
        },
    ];

    let result = segment_pages(&pages, &entries, None, &config);
    assert_eq!(result.units.len(), 2);
    let fallback = &result.units[1];
    assert_eq!(fallback.book_id, 2);
    assert_eq!(fallback.origin, UnitOrigin::Fallback);
    assert_eq!(result.report.units_fallback, 1);
    assert_eq!(result.report.count(DiagnosticKind::MalformedEntry), 1);
}

// ---------------------------------------------------------------------------
// Test 6: contents pages become boundary entries
// ---------------------------------------------------------------------------
#[test]
fn toc_pages_parsed_from_pdf() {
    let mut config = two_book_config();
    config.books[0].toc_pages = vec![0];
    let toc_lines: &[&str] = &[
        "CONTENTS",
        "CHAPTER I: STEADFASTNESS",
        "Story One ........ 1",
        "Story Three ...... 2",
    ];
    let extractor = MockExtractor {
        pages: vec![page(0, &[(20.0, 40.0, toc_lines)])],
        transcript: String::new(),
    };

    let (entries, report) = parse_toc_pdf(&[], &extractor, &config).unwrap();
    assert!(report.diagnostics.is_empty());
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].title(), "CHAPTER I: STEADFASTNESS");
    assert_eq!(
        entries[2],
        BoundaryEntry::Content {
            book_id: 1,
            title: "Story Three".into(),
            page: 2
        }
    );
}

// ---------------------------------------------------------------------------
// Test 7: transcript split with the good-deeds overrides
// ---------------------------------------------------------------------------
#[test]
fn transcript_with_preset_overrides() {
    let config = load_transcript_preset("good-deeds").unwrap();
    let transcript = "\
Introduction to the book.
(1) GOOD INTENTIONS
Actions are judged by intentions.
2. PRAYING ON TIME
Prayer at its time is most beloved.
17
(31) WALKING TO THE MASJID
Every step is rewarded.
(71) SIX GOOD DEEDS
Modesty is part of faith.";
    let extractor = MockExtractor {
        pages: vec![],
        transcript: transcript.to_string(),
    };
    let item = |id: u32, title: &str| CatalogItem {
        id,
        label: String::new(),
        title: title.into(),
    };
    let catalog = vec![
        item(1, "Good intentions"),
        item(2, "Praying on time"),
        item(37, "Walking to the masjid"),
        item(71, "Six good deeds"),
        item(77, "Modesty"),
        item(80, "Graveyards"),
    ];

    let result = segment_transcript(&[], &extractor, &catalog, config).unwrap();
    let ids: Vec<u32> = result.units.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![1, 2, 37, 71, 77]);

    assert_eq!(result.units[0].content, "Actions are judged by intentions.");
    assert_eq!(result.units[1].content, "Prayer at its time is most beloved.");
    assert_eq!(result.units[2].content, "Every step is rewarded.");
    assert_eq!(result.units[4].origin, UnitOrigin::Copied);
    assert_eq!(result.units[4].content, result.units[3].content);
    assert_eq!(result.report.unmatched_identifiers, vec![80]);
}

// ---------------------------------------------------------------------------
// Test 8: built-in pipeline preset validates
// ---------------------------------------------------------------------------
#[test]
fn fazail_preset_is_valid() {
    let config = load_pipeline_preset("fazail").unwrap();
    assert_eq!(config.books.len(), 8);
    assert!(config.books.iter().all(|b| b.end_page > 0));
}
