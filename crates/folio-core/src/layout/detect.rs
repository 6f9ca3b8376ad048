//! Page-number and section detection for a single partition.
//!
//! Both detectors are pure classifiers: they read text and return a verdict,
//! leaving it to the map builder to decide what to do with a miss.

use crate::extraction::{BBox, PhysicalPage};
use crate::model::BookId;
use regex::Regex;
use std::sync::LazyLock;

pub const DEFAULT_BAND_RATIO: f32 = 0.2;
pub const DEFAULT_PAGE_CEILING: u32 = 500;

static STANDALONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*$").unwrap());

static NUMBER_BEFORE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s+[A-Z]").unwrap());

static NUMBER_AFTER_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[A-Z].*\s(\d+)\s*$").unwrap());

/// One way a printed page number can appear on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberMatcher {
    /// `15`
    Standalone,
    /// `15 Stories of the Sahaabah`
    BeforeTitle,
    /// `Stories of the Sahaabah 15`
    AfterTitle,
}

impl NumberMatcher {
    /// Preference order: earlier matchers win over later ones.
    pub const PREFERENCE: [NumberMatcher; 3] = [
        NumberMatcher::Standalone,
        NumberMatcher::BeforeTitle,
        NumberMatcher::AfterTitle,
    ];

    fn regex(&self) -> &'static Regex {
        match self {
            NumberMatcher::Standalone => &STANDALONE_NUMBER,
            NumberMatcher::BeforeTitle => &NUMBER_BEFORE_TITLE,
            NumberMatcher::AfterTitle => &NUMBER_AFTER_TITLE,
        }
    }

    pub fn capture(&self, line: &str) -> Option<u32> {
        self.regex()
            .captures(line)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

/// A detected logical page number and how it was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNumberHit {
    pub number: u32,
    pub matcher: NumberMatcher,
    /// False when the number came from the whole-partition fallback.
    pub from_band: bool,
}

#[derive(Debug, Clone)]
pub struct PageNumberDetector {
    band_ratio: f32,
    ceiling: u32,
}

impl Default for PageNumberDetector {
    fn default() -> Self {
        Self::new(DEFAULT_BAND_RATIO, DEFAULT_PAGE_CEILING)
    }
}

impl PageNumberDetector {
    pub fn new(band_ratio: f32, ceiling: u32) -> Self {
        PageNumberDetector {
            band_ratio,
            ceiling,
        }
    }

    /// Numbers such as years or verse references fall outside this range.
    pub fn is_plausible(&self, n: u32) -> bool {
        n > 0 && n < self.ceiling
    }

    /// Find the logical page number of the partition at `region`.
    ///
    /// Header and footer bands are searched first; the whole partition is
    /// the fallback.
    pub fn detect(&self, page: &PhysicalPage, region: &BBox) -> Option<PageNumberHit> {
        let mut band_lines = page.lines_in(&region.top_band(self.band_ratio));
        band_lines.extend(page.lines_in(&region.bottom_band(self.band_ratio)));

        if let Some((number, matcher)) = self.detect_in_lines(&band_lines) {
            return Some(PageNumberHit {
                number,
                matcher,
                from_band: true,
            });
        }

        let all_lines = page.lines_in(region);
        self.detect_in_lines(&all_lines)
            .map(|(number, matcher)| PageNumberHit {
                number,
                matcher,
                from_band: false,
            })
    }

    /// Apply the matchers in preference order; the first plausible hit wins.
    pub fn detect_in_lines<S: AsRef<str>>(&self, lines: &[S]) -> Option<(u32, NumberMatcher)> {
        NumberMatcher::PREFERENCE.iter().find_map(|matcher| {
            lines
                .iter()
                .filter_map(|line| matcher.capture(line.as_ref()))
                .find(|n| self.is_plausible(*n))
                .map(|n| (n, *matcher))
        })
    }
}

/// Recognizes which book a piece of text belongs to by its header strings.
#[derive(Debug, Clone, Default)]
pub struct SectionDetector {
    /// (book, uppercased header) in catalog order.
    headers: Vec<(BookId, String)>,
}

impl SectionDetector {
    pub fn new<'a>(headers: impl IntoIterator<Item = (BookId, &'a str)>) -> Self {
        SectionDetector {
            headers: headers
                .into_iter()
                .filter(|(_, h)| !h.trim().is_empty())
                .map(|(id, h)| (id, h.trim().to_uppercase()))
                .collect(),
        }
    }

    /// First book (in catalog order) whose header occurs in `text`.
    pub fn detect(&self, text: &str) -> Option<BookId> {
        let upper = text.to_uppercase();
        self.headers
            .iter()
            .find(|(_, header)| upper.contains(header.as_str()))
            .map(|(id, _)| *id)
    }

    /// Partition text first, then the whole page.
    pub fn classify(&self, partition_text: &str, page_text: &str) -> Option<BookId> {
        self.detect(partition_text).or_else(|| self.detect(page_text))
    }
}
