pub mod map;
pub mod presets;
pub mod segment;
pub mod toc;
pub mod transcript;

use folio_core::config::builtin;
use folio_core::config::schema::{PipelineConfig, TranscriptConfig};
use folio_core::error::FolioError;
use std::path::PathBuf;

const DEFAULT_PIPELINE_PRESET: &str = "fazail";

/// A custom config file wins; otherwise the named or default preset.
pub fn pipeline_config(
    preset: Option<String>,
    config: Option<PathBuf>,
) -> Result<PipelineConfig, FolioError> {
    match config {
        Some(path) => folio_core::config::load_pipeline_config(&path),
        None => {
            let name = preset.as_deref().unwrap_or(DEFAULT_PIPELINE_PRESET);
            builtin::load_pipeline_preset(name)
        }
    }
}

pub fn transcript_config(
    preset: Option<String>,
    config: Option<PathBuf>,
) -> Result<TranscriptConfig, FolioError> {
    match (config, preset) {
        (Some(path), _) => folio_core::config::load_transcript_config(&path),
        (None, Some(name)) => builtin::load_transcript_preset(&name),
        (None, None) => Ok(TranscriptConfig::default()),
    }
}
