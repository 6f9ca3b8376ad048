use regex::Regex;
use std::sync::LazyLock;

/// A line containing a running header may be this much longer than the
/// header itself (page number, chapter tag) and still count as noise.
const RUNNING_HEADER_SLACK: usize = 24;

static PAGE_NUMBER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\s*$").unwrap());

// "112 Ch. IV: Virtues of Zikr"
static CHAPTER_RUNNING_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\s+Ch\.\s+[IVXLC]+:").unwrap());

static TOC_LEADER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*\.{3,}[\.\s]*\d+\s*$").unwrap());

static LEADER_DOTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{4,}").unwrap());

static PAGE_NO_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)page\s+no\s*:").unwrap());

static CONTROL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0b\x0c\x0e-\x1f]").unwrap());

static INLINE_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

/// Strips page furniture from logical-page text.
#[derive(Debug, Clone, Default)]
pub struct ContentCleaner {
    /// Uppercased running header strings (book titles).
    running_headers: Vec<String>,
}

impl ContentCleaner {
    pub fn new<S: AsRef<str>>(running_headers: impl IntoIterator<Item = S>) -> Self {
        ContentCleaner {
            running_headers: running_headers
                .into_iter()
                .map(|h| h.as_ref().trim().to_uppercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// True for lines that are page furniture rather than content.
    pub fn is_noise_line(&self, line: &str) -> bool {
        let trimmed = line.trim();
        if PAGE_NUMBER_LINE.is_match(trimmed)
            || CHAPTER_RUNNING_HEADER.is_match(trimmed)
            || TOC_LEADER_LINE.is_match(trimmed)
        {
            return true;
        }

        let upper = trimmed.to_uppercase();
        let len = trimmed.chars().count();
        self.running_headers
            .iter()
            .any(|h| upper.contains(h.as_str()) && len <= h.chars().count() + RUNNING_HEADER_SLACK)
    }

    /// Remove noise lines and normalize whitespace in one logical page.
    pub fn clean_page(&self, text: &str) -> String {
        let text = CONTROL_CHARS.replace_all(text, "");
        let kept: Vec<String> = text
            .lines()
            .filter(|line| !self.is_noise_line(line))
            .map(|line| {
                let line = PAGE_NO_MARKER.replace_all(line, "");
                LEADER_DOTS.replace_all(&line, " ").into_owned()
            })
            .collect();
        normalize_whitespace(&kept.join("\n"))
    }
}

/// Collapse inline spaces, trim lines, and keep at most one blank line
/// between paragraphs.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut blank_run = false;
    for line in text.lines() {
        let line = INLINE_SPACES.replace_all(line.trim(), " ");
        if line.is_empty() {
            if !blank_run && !out.is_empty() {
                out.push(String::new());
            }
            blank_run = true;
        } else {
            out.push(line.into_owned());
            blank_run = false;
        }
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

/// Reduce every whitespace run, newlines included, to one space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
