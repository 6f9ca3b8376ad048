pub mod builtin;
pub mod schema;

use crate::error::FolioError;
use crate::layout::partition::PartitionScheme;
use regex::Regex;
use schema::{PipelineConfig, TranscriptConfig};
use std::collections::HashSet;
use std::path::Path;

/// Load a pipeline config from a JSON file.
pub fn load_pipeline_config(path: &Path) -> Result<PipelineConfig, FolioError> {
    let content = std::fs::read_to_string(path).map_err(|e| FolioError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_pipeline_config(&content, path)
}

/// Parse a pipeline config from a JSON string read from `source`.
pub fn parse_pipeline_config(json: &str, source: &Path) -> Result<PipelineConfig, FolioError> {
    let config: PipelineConfig =
        serde_json::from_str(json).map_err(|e| FolioError::ConfigLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_pipeline_config(&config)?;
    Ok(config)
}

/// Parse a pipeline config from a JSON string (no file path context).
pub fn parse_pipeline_config_str(json: &str) -> Result<PipelineConfig, FolioError> {
    let config: PipelineConfig = serde_json::from_str(json)?;
    validate_pipeline_config(&config)?;
    Ok(config)
}

pub fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), FolioError> {
    if config.books.is_empty() {
        return Err(FolioError::ConfigInvalid("books must not be empty".into()));
    }

    let mut seen = HashSet::new();
    for book in &config.books {
        if !seen.insert(book.id) {
            return Err(FolioError::ConfigInvalid(format!(
                "duplicate book id {}",
                book.id
            )));
        }
        if book.header.trim().is_empty() {
            return Err(FolioError::ConfigInvalid(format!(
                "book {} has an empty header",
                book.id
            )));
        }
        if book.end_page == 0 {
            return Err(FolioError::ConfigInvalid(format!(
                "book {} must have end_page > 0",
                book.id
            )));
        }
        if let Some(anchor) = &book.anchor {
            if anchor.phrase.trim().is_empty() || anchor.page == 0 {
                return Err(FolioError::ConfigInvalid(format!(
                    "book {} has an anchor without phrase or page",
                    book.id
                )));
            }
        }
    }

    let ratio = config.detector.band_ratio;
    if !(ratio > 0.0 && ratio <= 0.5) {
        return Err(FolioError::ConfigInvalid(format!(
            "band_ratio {ratio} must be in (0, 0.5]"
        )));
    }
    if config.detector.page_number_ceiling < 2 {
        return Err(FolioError::ConfigInvalid(
            "page_number_ceiling must be at least 2".into(),
        ));
    }
    if let PartitionScheme::Strips(n) = config.scheme {
        if n < 2 {
            return Err(FolioError::ConfigInvalid(format!(
                "strips scheme needs at least 2 strips, got {n}"
            )));
        }
    }
    if config.segmenter.max_span_pages == 0 {
        return Err(FolioError::ConfigInvalid(
            "max_span_pages must be at least 1".into(),
        ));
    }

    Ok(())
}

/// Load a transcript config from a JSON file.
pub fn load_transcript_config(path: &Path) -> Result<TranscriptConfig, FolioError> {
    let content = std::fs::read_to_string(path).map_err(|e| FolioError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_transcript_config(&content, path)
}

pub fn parse_transcript_config(
    json: &str,
    source: &Path,
) -> Result<TranscriptConfig, FolioError> {
    let config: TranscriptConfig =
        serde_json::from_str(json).map_err(|e| FolioError::ConfigLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_transcript_config(&config)?;
    Ok(config)
}

pub fn parse_transcript_config_str(json: &str) -> Result<TranscriptConfig, FolioError> {
    let config: TranscriptConfig = serde_json::from_str(json)?;
    validate_transcript_config(&config)?;
    Ok(config)
}

/// Check override patterns compile and copy rules are sane.
pub fn validate_transcript_config(config: &TranscriptConfig) -> Result<(), FolioError> {
    for (id, pattern) in &config.patterns {
        Regex::new(pattern).map_err(|e| FolioError::InvalidPattern {
            id: *id,
            reason: e.to_string(),
        })?;
    }

    for rule in &config.copy {
        if rule.source == rule.target {
            return Err(FolioError::ConfigInvalid(format!(
                "copy rule for {} copies onto itself",
                rule.source
            )));
        }
    }

    Ok(())
}
