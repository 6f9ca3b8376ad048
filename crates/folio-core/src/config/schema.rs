use crate::layout::detect::{DEFAULT_BAND_RATIO, DEFAULT_PAGE_CEILING};
use crate::layout::partition::PartitionScheme;
use crate::model::BookId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration of the multi-up PDF pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub scheme: PartitionScheme,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub segmenter: SegmenterConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    /// Books in catalog order. Section detection tries headers in this order.
    pub books: Vec<BookDef>,
}

impl PipelineConfig {
    pub fn book(&self, id: BookId) -> Option<&BookDef> {
        self.books.iter().find(|b| b.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Fraction of the partition height searched at top and bottom.
    #[serde(default = "default_band_ratio")]
    pub band_ratio: f32,
    /// Page numbers must be strictly below this.
    #[serde(default = "default_page_ceiling")]
    pub page_number_ceiling: u32,
    #[serde(default)]
    pub carry_forward_section: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            band_ratio: DEFAULT_BAND_RATIO,
            page_number_ceiling: DEFAULT_PAGE_CEILING,
            carry_forward_section: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmenterConfig {
    #[serde(default = "default_chapter")]
    pub default_chapter: String,
    #[serde(default = "default_max_span_pages")]
    pub max_span_pages: u32,
    /// Units with this many characters or fewer are skipped.
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,
    /// Length of the title prefix tried when the full title is not found.
    #[serde(default = "default_title_prefix_chars")]
    pub title_prefix_chars: usize,
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
    /// Also read the next unit's start page, cut at the next title.
    #[serde(default)]
    pub include_boundary_page: bool,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        SegmenterConfig {
            default_chapter: default_chapter(),
            max_span_pages: default_max_span_pages(),
            min_content_chars: default_min_content_chars(),
            title_prefix_chars: default_title_prefix_chars(),
            preview_chars: default_preview_chars(),
            include_boundary_page: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamStrategy {
    /// Map-driven for books the map covers, offset-driven otherwise.
    #[default]
    Auto,
    Map,
    Offset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default)]
    pub strategy: StreamStrategy,
    /// Linear pages searched for a book's anchor phrase.
    #[serde(default = "default_anchor_window")]
    pub anchor_window: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            strategy: StreamStrategy::Auto,
            anchor_window: default_anchor_window(),
        }
    }
}

/// One book of the volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookDef {
    pub id: BookId,
    pub title: String,
    /// Running header printed on the book's pages, matched case-insensitively.
    pub header: String,
    /// Last logical page of the book, inclusive.
    pub end_page: u32,
    #[serde(default)]
    pub anchor: Option<AnchorDef>,
    /// Used when the anchor phrase cannot be found.
    #[serde(default)]
    pub fallback_offset: Option<i64>,
    /// First linear page searched for the anchor.
    #[serde(default)]
    pub search_start: usize,
    /// Extra running header strings stripped from content.
    #[serde(default)]
    pub running_headers: Vec<String>,
    /// Physical page indices holding the book's table of contents.
    #[serde(default)]
    pub toc_pages: Vec<usize>,
}

/// A phrase known to start on a given logical page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorDef {
    pub phrase: String,
    pub page: u32,
}

/// Configuration of the flat-transcript segmenter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_transcript_book")]
    pub book_id: BookId,
    #[serde(default = "default_chapter")]
    pub chapter: String,
    /// Identifier -> printed label, or `"blocked"` to skip the identifier.
    #[serde(default)]
    pub remap: BTreeMap<u32, LabelRemap>,
    /// Identifier -> full replacement header pattern.
    #[serde(default)]
    pub patterns: BTreeMap<u32, String>,
    #[serde(default)]
    pub copy: Vec<CopyRule>,
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        TranscriptConfig {
            name: String::new(),
            book_id: default_transcript_book(),
            chapter: default_chapter(),
            remap: BTreeMap::new(),
            patterns: BTreeMap::new(),
            copy: Vec::new(),
            preview_chars: default_preview_chars(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelRemap {
    Label(u32),
    Blocked(Blocked),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blocked {
    Blocked,
}

/// Synthesize `target` from `source`'s content when `target` has no header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyRule {
    pub source: u32,
    pub target: u32,
}

fn default_band_ratio() -> f32 {
    DEFAULT_BAND_RATIO
}

fn default_page_ceiling() -> u32 {
    DEFAULT_PAGE_CEILING
}

fn default_chapter() -> String {
    "General".to_string()
}

fn default_max_span_pages() -> u32 {
    5
}

fn default_min_content_chars() -> usize {
    50
}

fn default_title_prefix_chars() -> usize {
    15
}

fn default_preview_chars() -> usize {
    150
}

fn default_anchor_window() -> usize {
    50
}

fn default_transcript_book() -> BookId {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let json = r#"{
            "name": "minimal",
            "books": [{ "id": 1, "title": "A", "header": "BOOK A", "end_page": 10 }]
        }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.scheme, PartitionScheme::Quadrants);
        assert_eq!(config.segmenter.max_span_pages, 5);
        assert_eq!(config.segmenter.min_content_chars, 50);
        assert_eq!(config.segmenter.default_chapter, "General");
        assert_eq!(config.detector.page_number_ceiling, 500);
        assert_eq!(config.stream.strategy, StreamStrategy::Auto);
        assert!(config.book(1).is_some());
        assert!(config.book(2).is_none());
    }

    #[test]
    fn test_remap_values() {
        let json = r#"{ "remap": { "37": 31, "78": "blocked" } }"#;
        let config: TranscriptConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.remap[&37], LabelRemap::Label(31));
        assert_eq!(config.remap[&78], LabelRemap::Blocked(Blocked::Blocked));
        assert_eq!(config.book_id, 1);
        assert_eq!(config.preview_chars, 150);
    }
}
