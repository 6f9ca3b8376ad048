pub mod pdftotext;

use crate::error::FolioError;
use crate::layout;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BBox {
    pub fn new(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        BBox {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    /// True when the box encloses no area.
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Half-open containment, so a point on a shared edge belongs to exactly
    /// one of two adjacent regions.
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x_min && x < self.x_max && y >= self.y_min && y < self.y_max
    }

    /// Horizontal band covering `ratio` of this box's height from the top.
    pub fn top_band(&self, ratio: f32) -> BBox {
        BBox::new(
            self.x_min,
            self.y_min,
            self.x_max,
            self.y_min + self.height() * ratio,
        )
    }

    /// Horizontal band covering `ratio` of this box's height from the bottom.
    pub fn bottom_band(&self, ratio: f32) -> BBox {
        BBox::new(
            self.x_min,
            self.y_max - self.height() * ratio,
            self.x_max,
            self.y_max,
        )
    }
}

/// One positioned piece of text (usually a word) on a physical page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub bbox: BBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    /// Position in the extractor's reading order.
    #[serde(default)]
    pub order: usize,
}

/// One sheet of the source document, with every text fragment on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalPage {
    pub index: usize,
    pub width: f32,
    pub height: f32,
    pub fragments: Vec<TextFragment>,
}

impl PhysicalPage {
    pub fn bounds(&self) -> BBox {
        BBox::new(0.0, 0.0, self.width, self.height)
    }

    /// Fragments whose center falls inside `region`.
    pub fn fragments_in(&self, region: &BBox) -> Vec<&TextFragment> {
        self.fragments
            .iter()
            .filter(|f| {
                let (x, y) = f.bbox.center();
                region.contains_point(x, y)
            })
            .collect()
    }

    /// Text lines inside `region`, top to bottom.
    pub fn lines_in(&self, region: &BBox) -> Vec<String> {
        layout::group_lines(self.fragments_in(region))
    }

    /// Text inside `region`, one line per row of fragments.
    pub fn text_in(&self, region: &BBox) -> String {
        self.lines_in(region).join("\n")
    }

    /// Whole-page text.
    pub fn full_text(&self) -> String {
        self.text_in(&self.bounds())
    }
}

/// Trait for spatial text extraction backends.
pub trait SpatialExtractor: Send + Sync {
    /// Extract every page of the document with positioned fragments.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PhysicalPage>, FolioError>;

    /// Extract the document as one continuous transcript, pages joined by newlines.
    fn extract_transcript(&self, pdf_bytes: &[u8]) -> Result<String, FolioError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
