//! Splits one continuous transcript into catalog items by their numbered
//! headers, e.g. `(12) VISITING THE SICK`.

use super::make_preview;
use crate::clean::collapse_whitespace;
use crate::config::schema::{LabelRemap, TranscriptConfig};
use crate::config::validate_transcript_config;
use crate::error::FolioError;
use crate::model::{CatalogItem, ContentUnit, SegmentationResult, UnitOrigin};
use crate::report::{Diagnostic, DiagnosticKind, RunReport};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static NUMERIC_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+\s*$").unwrap());

// "(31)", "31.", "(71)-(17)"
static LEADING_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\(\d+\)|\d+\.)(?:-\(\d+\))?\s*").unwrap());

/// Default header pattern: the label in parentheses, then a capitalized title.
pub fn default_pattern(label: u32) -> String {
    format!(r"\({label}\)\s+[A-Z]")
}

/// Looser retry: `(id)` anywhere or `id.` at the start of a line.
pub fn loose_pattern(id: u32) -> String {
    format!(r"(?:\({id}\)|(?m:^)[ \t]*{id}\.)\s+[A-Z]")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLabel {
    Label(u32),
    Blocked,
}

#[derive(Debug)]
pub struct TranscriptSegmenter {
    config: TranscriptConfig,
    overrides: HashMap<u32, Regex>,
}

impl TranscriptSegmenter {
    /// Compile the override patterns; an invalid one is a fatal error.
    pub fn new(config: TranscriptConfig) -> Result<Self, FolioError> {
        validate_transcript_config(&config)?;
        let mut overrides = HashMap::with_capacity(config.patterns.len());
        for (id, pattern) in &config.patterns {
            let regex = Regex::new(pattern).map_err(|e| FolioError::InvalidPattern {
                id: *id,
                reason: e.to_string(),
            })?;
            overrides.insert(*id, regex);
        }
        Ok(TranscriptSegmenter { config, overrides })
    }

    pub fn search_label(&self, id: u32) -> SearchLabel {
        match self.config.remap.get(&id) {
            Some(LabelRemap::Label(label)) => SearchLabel::Label(*label),
            Some(LabelRemap::Blocked(_)) => SearchLabel::Blocked,
            None => SearchLabel::Label(id),
        }
    }

    /// Find `id`'s header at or after `cursor`. Returns the unit's start
    /// (first non-space character of the match) and the match end.
    fn locate(
        &self,
        id: u32,
        label: u32,
        transcript: &str,
        cursor: usize,
    ) -> Option<(usize, usize)> {
        let rest = &transcript[cursor..];
        let found = match self.overrides.get(&id) {
            Some(regex) => regex.find(rest),
            None => Regex::new(&default_pattern(label)).ok()?.find(rest),
        };
        let found = found.or_else(|| {
            log::debug!("identifier {id}: label {label} not found, retrying loosely");
            Regex::new(&loose_pattern(id)).ok()?.find(rest)
        })?;

        let text = found.as_str();
        let lead = text.len() - text.trim_start().len();
        Some((cursor + found.start() + lead, cursor + found.end()))
    }

    pub fn segment(&self, catalog: &[CatalogItem], transcript: &str) -> SegmentationResult {
        let mut report = RunReport::default();
        let mut items: Vec<&CatalogItem> = Vec::with_capacity(catalog.len());
        for item in catalog {
            if items.iter().any(|seen| seen.id == item.id) {
                report.record(
                    Diagnostic::new(
                        DiagnosticKind::MalformedEntry,
                        format!("duplicate catalog id {} ('{}') ignored", item.id, item.title),
                    )
                    .item(item.id),
                );
                continue;
            }
            items.push(item);
        }
        items.sort_by_key(|item| item.id);

        let mut starts: Vec<(&CatalogItem, usize)> = Vec::new();
        let mut cursor = 0;
        for item in items.iter().copied() {
            let label = match self.search_label(item.id) {
                SearchLabel::Label(label) => label,
                SearchLabel::Blocked => {
                    log::debug!("identifier {} blocked", item.id);
                    report.unmatched_identifiers.push(item.id);
                    continue;
                }
            };

            match self.locate(item.id, label, transcript, cursor) {
                Some((start, end)) => {
                    log::debug!("identifier {} (label {}) at {}", item.id, label, start);
                    starts.push((item, start));
                    cursor = end;
                }
                None => {
                    report.record(
                        Diagnostic::new(
                            DiagnosticKind::PatternMatchFailure,
                            format!("no header for identifier {} (label {})", item.id, label),
                        )
                        .item(item.id),
                    );
                    report.unmatched_identifiers.push(item.id);
                }
            }
        }

        let mut units: Vec<ContentUnit> = Vec::with_capacity(starts.len());
        for (k, (item, start)) in starts.iter().enumerate() {
            let end = starts
                .get(k + 1)
                .map(|(_, next)| *next)
                .unwrap_or(transcript.len());
            let content = clean_unit_text(&transcript[*start..end], item);
            if content.is_empty() {
                report.units_skipped += 1;
                continue;
            }
            units.push(self.unit(item, content, UnitOrigin::Marker));
        }

        for rule in &self.config.copy {
            if units.iter().any(|u| u.id == rule.target) {
                continue;
            }
            let Some(target) = items.iter().find(|i| i.id == rule.target) else {
                continue;
            };
            let Some(source) = units.iter().find(|u| u.id == rule.source) else {
                report.record(
                    Diagnostic::new(
                        DiagnosticKind::PatternMatchFailure,
                        format!(
                            "copy rule {} -> {}: source has no content",
                            rule.source, rule.target
                        ),
                    )
                    .item(rule.target),
                );
                continue;
            };
            log::info!("copying content of {} into {}", rule.source, rule.target);
            let content = source.content.clone();
            units.push(self.unit(target, content, UnitOrigin::Copied));
            report.unmatched_identifiers.retain(|id| *id != rule.target);
        }
        units.sort_by_key(|u| u.id);

        report.units_produced = units.len();
        log::info!(
            "transcript: {} units, {} unmatched",
            report.units_produced,
            report.unmatched_identifiers.len()
        );
        SegmentationResult::new(units, report)
    }

    fn unit(&self, item: &CatalogItem, content: String, origin: UnitOrigin) -> ContentUnit {
        ContentUnit {
            id: item.id,
            book_id: self.config.book_id,
            chapter: self.config.chapter.clone(),
            title: item.title.clone(),
            preview: make_preview(&content, self.config.preview_chars),
            content,
            origin,
        }
    }
}

/// True when the first line is only a heading for the item.
fn is_heading_line(line: &str, item: &CatalogItem) -> bool {
    let rest = LEADING_LABEL.replace(line, "");
    let rest = rest.trim();
    if rest.is_empty() {
        return true;
    }
    if rest.eq_ignore_ascii_case(item.label.trim()) || rest.eq_ignore_ascii_case(item.title.trim())
    {
        return true;
    }
    rest.chars().any(char::is_alphabetic) && !rest.chars().any(char::is_lowercase)
}

/// Drop a bare heading line and page numbers, then flatten whitespace.
pub fn clean_unit_text(raw: &str, item: &CatalogItem) -> String {
    let mut lines = raw.trim().lines().peekable();
    if lines.peek().is_some_and(|first| is_heading_line(first, item)) {
        lines.next();
    }
    let kept: Vec<&str> = lines.filter(|l| !NUMERIC_LINE.is_match(l)).collect();
    collapse_whitespace(&kept.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_transcript_config_str;

    fn item(id: u32, title: &str) -> CatalogItem {
        CatalogItem {
            id,
            label: String::new(),
            title: title.into(),
        }
    }

    fn segmenter(json: &str) -> TranscriptSegmenter {
        TranscriptSegmenter::new(parse_transcript_config_str(json).unwrap()).unwrap()
    }

    #[test]
    fn test_units_split_at_next_header() {
        let seg = segmenter("{}");
        let text = "(1) FIRST text here. (2) SECOND text there.";
        let result = seg.segment(&[item(2, "Second"), item(1, "First")], text);

        assert_eq!(result.units.len(), 2);
        assert_eq!(result.units[0].id, 1);
        assert_eq!(result.units[0].content, "(1) FIRST text here.");
        assert_eq!(result.units[1].content, "(2) SECOND text there.");
        assert_eq!(result.units[1].chapter, "General");
    }

    #[test]
    fn test_heading_line_dropped() {
        let seg = segmenter("{}");
        let text = "(1) GOOD INTENTIONS\nActions are judged by intentions.\n12\nKeep them pure.";
        let result = seg.segment(&[item(1, "Good intentions")], text);
        assert_eq!(
            result.units[0].content,
            "Actions are judged by intentions. Keep them pure."
        );
    }

    #[test]
    fn test_override_takes_precedence() {
        let seg = segmenter(r#"{ "patterns": { "2": "(?m:^)\\s*2\\.\\s+PRAYING" } }"#);
        let text = "(1) ONE body\n(2) Decoy mention in body\n2. PRAYING on time matters.";
        let result = seg.segment(&[item(1, "One"), item(2, "Praying")], text);

        assert_eq!(result.units.len(), 2);
        assert!(result.units[0].content.contains("Decoy"));
        assert_eq!(result.units[1].content, "2. PRAYING on time matters.");
    }

    #[test]
    fn test_remap_and_block() {
        let seg = segmenter(r#"{ "remap": { "37": 31, "78": "blocked" } }"#);
        let text = "(31) WALKING to the mosque.\n(78) CONSULTATION text.";
        let result = seg.segment(&[item(37, "Walking"), item(78, "Consultation")], text);

        assert_eq!(result.units.len(), 1);
        assert_eq!(result.units[0].id, 37);
        assert!(result.units[0].content.contains("CONSULTATION"));
        assert_eq!(result.report.unmatched_identifiers, vec![78]);
        assert!(result.report.diagnostics.is_empty());
    }

    #[test]
    fn test_loose_retry_on_catalog_id() {
        let seg = segmenter(r#"{ "remap": { "5": 50 } }"#);
        let text = "intro\n5. Smiling is charity.";
        let result = seg.segment(&[item(5, "Smiling")], text);
        assert_eq!(result.units[0].content, "5. Smiling is charity.");
    }

    #[test]
    fn test_unmatched_reported() {
        let seg = segmenter("{}");
        let result = seg.segment(&[item(1, "One"), item(2, "Two")], "(1) ONE only");
        assert_eq!(result.units.len(), 1);
        assert_eq!(result.report.unmatched_identifiers, vec![2]);
        assert_eq!(result.report.count(DiagnosticKind::PatternMatchFailure), 1);
    }

    #[test]
    fn test_search_resumes_after_previous_match() {
        let seg = segmenter("{}");
        // The early "(2)" comes before item 1 and is never searched for item 2.
        let text = "(2) EARLY decoy\n(1) ONE body\n(2) TWO body";
        let result = seg.segment(&[item(1, "One"), item(2, "Two")], text);
        assert_eq!(result.units[0].content, "(1) ONE body");
        assert_eq!(result.units[1].content, "(2) TWO body");
    }

    #[test]
    fn test_duplicate_catalog_id_keeps_first() {
        let seg = segmenter("{}");
        let text = "(3) ALPHA body\n(3) BETA body";
        let result = seg.segment(&[item(3, "Alpha"), item(3, "Beta")], text);

        let ids: Vec<u32> = result.units.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![3]);
        assert_eq!(result.units[0].title, "Alpha");
        assert_eq!(result.report.count(DiagnosticKind::MalformedEntry), 1);
        assert_eq!(result.report.diagnostics[0].item, Some(3));
    }

    #[test]
    fn test_copy_rule() {
        let seg = segmenter(r#"{ "copy": [{ "source": 71, "target": 77 }] }"#);
        let text = "(71) SIX GOOD DEEDS\nModesty and more.";
        let result = seg.segment(&[item(71, "Six good deeds"), item(77, "Modesty")], text);

        assert_eq!(result.units.len(), 2);
        let copied = &result.units[1];
        assert_eq!(copied.id, 77);
        assert_eq!(copied.title, "Modesty");
        assert_eq!(copied.origin, UnitOrigin::Copied);
        assert_eq!(copied.content, result.units[0].content);
        assert!(result.report.unmatched_identifiers.is_empty());
    }

    #[test]
    fn test_invalid_override_is_fatal() {
        let mut config = TranscriptConfig::default();
        config.patterns.insert(9, "(unclosed".into());
        assert!(matches!(
            TranscriptSegmenter::new(config),
            Err(FolioError::InvalidPattern { id: 9, .. })
        ));
    }
}
