use crate::config::schema::{PipelineConfig, TranscriptConfig};
use crate::config::{validate_pipeline_config, validate_transcript_config};
use crate::error::FolioError;

const FAZAIL_JSON: &str = include_str!("../../../../presets/fazail.json");
const GOOD_DEEDS_JSON: &str = include_str!("../../../../presets/good-deeds.json");

/// Available predefined configurations.
pub const PRESETS: &[&str] = &["fazail", "good-deeds"];

/// Check if a preset configures the transcript segmenter rather than the
/// multi-up pipeline.
pub fn is_transcript_preset(name: &str) -> bool {
    name == "good-deeds"
}

/// Load a predefined pipeline configuration by name.
pub fn load_pipeline_preset(name: &str) -> Result<PipelineConfig, FolioError> {
    match name {
        "fazail" => {
            let config: PipelineConfig = serde_json::from_str(FAZAIL_JSON)?;
            validate_pipeline_config(&config)?;
            Ok(config)
        }
        _ if is_transcript_preset(name) => Err(FolioError::ConfigInvalid(format!(
            "'{name}' is a transcript preset. Use it with `folio transcript --preset {name}`."
        ))),
        _ => Err(unknown_preset(name)),
    }
}

/// Load a predefined transcript configuration by name.
pub fn load_transcript_preset(name: &str) -> Result<TranscriptConfig, FolioError> {
    match name {
        "good-deeds" => {
            let config: TranscriptConfig = serde_json::from_str(GOOD_DEEDS_JSON)?;
            validate_transcript_config(&config)?;
            Ok(config)
        }
        _ if PRESETS.contains(&name) => Err(FolioError::ConfigInvalid(format!(
            "'{name}' is a pipeline preset, not a transcript preset."
        ))),
        _ => Err(unknown_preset(name)),
    }
}

fn unknown_preset(name: &str) -> FolioError {
    FolioError::ConfigInvalid(format!(
        "unknown preset '{}'. Available: {}",
        name,
        PRESETS.join(", ")
    ))
}
