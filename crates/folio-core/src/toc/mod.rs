//! Boundary catalogs (table of contents) and transcript item catalogs.

pub mod parse;

use crate::error::FolioError;
use crate::model::{BoundaryEntry, CatalogItem};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

// "CHAPTER II:", "Part 3 -", "chapter IV."
static CHAPTER_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?i:chapter|part)\s+(?:[IVXLC]+|\d+)\b[\.:\-\s]*").unwrap()
});

// "IV. ", "3) ", "12: "
static NUMERAL_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[IVXLC]+|\d+)[\.:\)]\s+").unwrap());

/// Load a boundary catalog from a JSON file.
pub fn load_boundaries(path: &Path) -> Result<Vec<BoundaryEntry>, FolioError> {
    let content = std::fs::read_to_string(path).map_err(|e| FolioError::CatalogLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| FolioError::CatalogLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub fn parse_boundaries_str(json: &str) -> Result<Vec<BoundaryEntry>, FolioError> {
    Ok(serde_json::from_str(json)?)
}

/// Load the expected items of a transcript from a JSON array of
/// `{id, label?, title}`.
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogItem>, FolioError> {
    let content = std::fs::read_to_string(path).map_err(|e| FolioError::CatalogLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| FolioError::CatalogLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Strip the numbering from a chapter header, falling back to `default`
/// when nothing is left.
pub fn clean_chapter_label(raw: &str, default: &str) -> String {
    let stripped = CHAPTER_PREFIX.replace(raw, "");
    let stripped = NUMERAL_PREFIX.replace(&stripped, "");
    let label = stripped
        .trim()
        .trim_matches(|c: char| c == '.' || c == ':' || c == '-')
        .trim();
    if label.is_empty() {
        default.to_string()
    } else {
        label.to_string()
    }
}
