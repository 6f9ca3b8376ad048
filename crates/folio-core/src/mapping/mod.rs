//! Logical page map: which partition of which physical page holds each
//! (book, logical page).

use crate::config::schema::PipelineConfig;
use crate::error::FolioError;
use crate::extraction::PhysicalPage;
use crate::layout::detect::{PageNumberDetector, SectionDetector};
use crate::layout::partition::{partition_page, PartitionId, PartitionScheme};
use crate::model::BookId;
use crate::report::{Diagnostic, DiagnosticKind, RunReport};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageKey {
    pub book_id: BookId,
    pub page: u32,
}

impl PageKey {
    pub fn new(book_id: BookId, page: u32) -> Self {
        PageKey { book_id, page }
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.book_id, self.page)
    }
}

impl FromStr for PageKey {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || FolioError::InvalidMap(format!("bad key '{s}' (expected 'book|page')"));
        let (book, page) = s.split_once('|').ok_or_else(bad)?;
        Ok(PageKey {
            book_id: book.trim().parse().map_err(|_| bad())?,
            page: page.trim().parse().map_err(|_| bad())?,
        })
    }
}

/// Where one logical page physically lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalPageRef {
    pub physical_index: usize,
    pub partition_id: PartitionId,
    /// Characters of text in the partition when it was claimed.
    #[serde(default)]
    pub text_len: usize,
}

/// Read-only (book, page) -> partition lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    into = "BTreeMap<String, LogicalPageRef>",
    try_from = "BTreeMap<String, LogicalPageRef>"
)]
pub struct LogicalMap {
    refs: HashMap<PageKey, LogicalPageRef>,
}

impl LogicalMap {
    pub fn get(&self, book_id: BookId, page: u32) -> Option<&LogicalPageRef> {
        self.refs.get(&PageKey::new(book_id, page))
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Mapped logical pages of one book, ascending.
    pub fn pages_for(&self, book_id: BookId) -> Vec<u32> {
        let mut pages: Vec<u32> = self
            .refs
            .keys()
            .filter(|k| k.book_id == book_id)
            .map(|k| k.page)
            .collect();
        pages.sort_unstable();
        pages
    }

    pub fn has_book(&self, book_id: BookId) -> bool {
        self.refs.keys().any(|k| k.book_id == book_id)
    }

    /// All entries in key order.
    pub fn entries(&self) -> Vec<(PageKey, LogicalPageRef)> {
        let mut entries: Vec<_> = self.refs.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(k, _)| *k);
        entries
    }

    pub fn to_json(&self) -> Result<String, FolioError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, FolioError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<LogicalMap> for BTreeMap<String, LogicalPageRef> {
    fn from(map: LogicalMap) -> Self {
        map.refs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}

impl TryFrom<BTreeMap<String, LogicalPageRef>> for LogicalMap {
    type Error = FolioError;

    fn try_from(table: BTreeMap<String, LogicalPageRef>) -> Result<Self, Self::Error> {
        let mut refs = HashMap::with_capacity(table.len());
        for (key, value) in table {
            refs.insert(key.parse::<PageKey>()?, value);
        }
        Ok(LogicalMap { refs })
    }
}

/// One partition's claim to be a given logical page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claim {
    pub key: PageKey,
    pub physical_index: usize,
    pub partition_id: PartitionId,
    pub text_len: usize,
}

/// Resolve competing claims into a map.
///
/// Claims are applied in the order given; a later claim replaces an earlier
/// one only when its text is strictly longer, so ties keep the first seen.
pub fn reduce_claims(claims: impl IntoIterator<Item = Claim>) -> LogicalMap {
    let mut refs: HashMap<PageKey, LogicalPageRef> = HashMap::new();
    for claim in claims {
        let candidate = LogicalPageRef {
            physical_index: claim.physical_index,
            partition_id: claim.partition_id,
            text_len: claim.text_len,
        };
        match refs.get(&claim.key) {
            Some(existing) if existing.text_len >= claim.text_len => {
                log::debug!(
                    "{}: keeping p{}/{} over p{}/{} ({} >= {} chars)",
                    claim.key,
                    existing.physical_index,
                    existing.partition_id,
                    claim.physical_index,
                    claim.partition_id,
                    existing.text_len,
                    claim.text_len
                );
            }
            _ => {
                refs.insert(claim.key, candidate);
            }
        }
    }
    LogicalMap { refs }
}

/// Detects page numbers and books per partition and builds the logical map.
#[derive(Debug, Clone)]
pub struct MapBuilder {
    scheme: PartitionScheme,
    numbers: PageNumberDetector,
    sections: SectionDetector,
    carry_forward: bool,
}

impl MapBuilder {
    pub fn new(
        scheme: PartitionScheme,
        numbers: PageNumberDetector,
        sections: SectionDetector,
    ) -> Self {
        MapBuilder {
            scheme,
            numbers,
            sections,
            carry_forward: false,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        let sections =
            SectionDetector::new(config.books.iter().map(|b| (b.id, b.header.as_str())));
        let numbers = PageNumberDetector::new(
            config.detector.band_ratio,
            config.detector.page_number_ceiling,
        );
        MapBuilder::new(config.scheme, numbers, sections)
            .with_carry_forward(config.detector.carry_forward_section)
    }

    /// Let partitions with no visible book header inherit the last book seen.
    pub fn with_carry_forward(mut self, carry_forward: bool) -> Self {
        self.carry_forward = carry_forward;
        self
    }

    /// Every claim over all pages and partitions, in traversal order.
    pub fn claims(&self, pages: &[PhysicalPage], report: &mut RunReport) -> Vec<Claim> {
        let mut claims = Vec::new();
        let mut last_book: Option<BookId> = None;

        for page in pages {
            let partitions = match partition_page(page, self.scheme) {
                Ok(p) => p,
                Err(e) => {
                    report.record(
                        Diagnostic::new(DiagnosticKind::ExtractionGap, e.to_string())
                            .page(page.index),
                    );
                    continue;
                }
            };
            let page_text = page.full_text();

            for partition in partitions {
                let text = page.text_in(&partition.bounds);
                if text.trim().is_empty() {
                    report.record(
                        Diagnostic::new(
                            DiagnosticKind::ExtractionGap,
                            format!("page {} {}: no text", page.index, partition.id),
                        )
                        .page(page.index),
                    );
                    continue;
                }

                let detected = self.sections.classify(&text, &page_text);
                if detected.is_some() {
                    last_book = detected;
                }
                let book = detected.or(if self.carry_forward { last_book } else { None });
                let number = self.numbers.detect(page, &partition.bounds);

                match (book, number) {
                    (Some(book_id), Some(hit)) => {
                        log::debug!(
                            "page {} {} -> book {} page {} ({:?})",
                            page.index,
                            partition.id,
                            book_id,
                            hit.number,
                            hit.matcher
                        );
                        claims.push(Claim {
                            key: PageKey::new(book_id, hit.number),
                            physical_index: page.index,
                            partition_id: partition.id,
                            text_len: text.chars().count(),
                        });
                    }
                    (None, _) => report.record(
                        Diagnostic::new(
                            DiagnosticKind::ExtractionGap,
                            format!("page {} {}: no book header", page.index, partition.id),
                        )
                        .page(page.index),
                    ),
                    (Some(book_id), None) => report.record(
                        Diagnostic::new(
                            DiagnosticKind::ExtractionGap,
                            format!("page {} {}: no page number", page.index, partition.id),
                        )
                        .page(page.index)
                        .book(book_id),
                    ),
                }
            }
        }

        claims
    }

    pub fn build(&self, pages: &[PhysicalPage], report: &mut RunReport) -> LogicalMap {
        let claims = self.claims(pages, report);
        let claim_count = claims.len();
        let map = reduce_claims(claims);
        log::info!(
            "mapped {} logical pages from {} claims over {} physical pages",
            map.len(),
            claim_count,
            pages.len()
        );
        map
    }
}
