use crate::report::RunReport;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one book (section) of the source volume.
pub type BookId = u32;

/// One entry of the externally supplied table of contents, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoundaryEntry {
    /// Chapter or section marker.
    Header {
        #[serde(alias = "bookId")]
        book_id: BookId,
        title: String,
    },
    /// Start of a content unit at a logical page.
    #[serde(alias = "story")]
    Content {
        #[serde(alias = "bookId")]
        book_id: BookId,
        title: String,
        /// Signed so that corrupt (zero or negative) pages survive loading
        /// and are reported instead of rejected wholesale.
        page: i64,
    },
}

impl BoundaryEntry {
    pub fn book_id(&self) -> BookId {
        match self {
            BoundaryEntry::Header { book_id, .. } | BoundaryEntry::Content { book_id, .. } => {
                *book_id
            }
        }
    }

    pub fn title(&self) -> &str {
        match self {
            BoundaryEntry::Header { title, .. } | BoundaryEntry::Content { title, .. } => title,
        }
    }
}

/// One expected item of a flat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: u32,
    /// Heading text printed next to the number, if known.
    #[serde(default)]
    pub label: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitOrigin {
    /// Cut from a boundary marker or a matched transcript header.
    #[default]
    Marker,
    /// Whole-book unit emitted because no marker produced content.
    Fallback,
    /// Synthesized from another unit by a declared copy rule.
    Copied,
}

impl fmt::Display for UnitOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitOrigin::Marker => write!(f, "marker"),
            UnitOrigin::Fallback => write!(f, "fallback"),
            UnitOrigin::Copied => write!(f, "copied"),
        }
    }
}

/// One produced story, lesson or hadith.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentUnit {
    pub id: u32,
    pub book_id: BookId,
    pub chapter: String,
    pub title: String,
    pub preview: String,
    pub content: String,
    #[serde(default)]
    pub origin: UnitOrigin,
}

/// A distinct (book, chapter) pair seen while segmenting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRecord {
    pub id: u32,
    pub book_id: BookId,
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentationResult {
    pub units: Vec<ContentUnit>,
    pub chapters: Vec<ChapterRecord>,
    pub report: RunReport,
}

impl SegmentationResult {
    /// Build the result, deriving the chapter index from the units.
    pub fn new(units: Vec<ContentUnit>, report: RunReport) -> Self {
        let chapters = chapter_index(&units);
        SegmentationResult {
            units,
            chapters,
            report,
        }
    }
}

/// Deduplicated (book, chapter) pairs with sequential ids, in first-seen order.
pub fn chapter_index(units: &[ContentUnit]) -> Vec<ChapterRecord> {
    let mut chapters: Vec<ChapterRecord> = Vec::new();
    for unit in units {
        let seen = chapters
            .iter()
            .any(|c| c.book_id == unit.book_id && c.title == unit.chapter);
        if !seen {
            chapters.push(ChapterRecord {
                id: chapters.len() as u32 + 1,
                book_id: unit.book_id,
                title: unit.chapter.clone(),
            });
        }
    }
    chapters
}
