use crate::model::BookId;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const REPORT_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Important,
    Info,
}

/// Per-item failure categories. None of them abort a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A page or partition yielded no text, page number or book.
    ExtractionGap,
    /// A title could not be located for trimming; content kept untrimmed.
    BoundaryResolutionFailure,
    /// A transcript identifier's header was not found.
    PatternMatchFailure,
    /// A page span was empty, inverted or too long and was clamped.
    SpanCorruption,
    /// A boundary entry with a bad page or unknown book.
    MalformedEntry,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::ExtractionGap => "extraction gap",
            DiagnosticKind::BoundaryResolutionFailure => "boundary resolution failure",
            DiagnosticKind::PatternMatchFailure => "pattern match failure",
            DiagnosticKind::SpanCorruption => "span corruption",
            DiagnosticKind::MalformedEntry => "malformed entry",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_id: Option<BookId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<u32>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        let severity = match kind {
            DiagnosticKind::PatternMatchFailure | DiagnosticKind::MalformedEntry => {
                Severity::Important
            }
            _ => Severity::Info,
        };
        Diagnostic {
            kind,
            severity,
            book_id: None,
            physical_page: None,
            item: None,
            message: message.into(),
        }
    }

    pub fn book(mut self, book_id: BookId) -> Self {
        self.book_id = Some(book_id);
        self
    }

    pub fn page(mut self, index: usize) -> Self {
        self.physical_page = Some(index);
        self
    }

    pub fn item(mut self, id: u32) -> Self {
        self.item = Some(id);
        self
    }
}

/// Counts and diagnostics for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub report_schema_version: String,
    pub units_produced: usize,
    pub units_skipped: usize,
    pub units_fallback: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmatched_identifiers: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self {
            report_schema_version: REPORT_SCHEMA_VERSION.to_string(),
            units_produced: 0,
            units_skipped: 0,
            units_fallback: 0,
            unmatched_identifiers: Vec::new(),
            diagnostics: Vec::new(),
        }
    }
}

impl RunReport {
    /// Record a diagnostic and log it.
    pub fn record(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Important => log::warn!("{}: {}", diagnostic.kind, diagnostic.message),
            Severity::Info => log::debug!("{}: {}", diagnostic.kind, diagnostic.message),
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    /// Fold another report's diagnostics into this one.
    pub fn absorb(&mut self, other: RunReport) {
        self.units_produced += other.units_produced;
        self.units_skipped += other.units_skipped;
        self.units_fallback += other.units_fallback;
        self.unmatched_identifiers
            .extend(other.unmatched_identifiers);
        self.diagnostics.extend(other.diagnostics);
    }
}
