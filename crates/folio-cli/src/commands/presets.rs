use folio_core::config::builtin;
use folio_core::error::FolioError;
use std::path::Path;

use crate::output;

pub fn list() -> Result<(), FolioError> {
    println!("Available predefined configurations:\n");
    for name in builtin::PRESETS {
        if builtin::is_transcript_preset(name) {
            let config = builtin::load_transcript_preset(name)?;
            println!("  {:<12} {} [transcript]", name, config.name);
            println!(
                "               {} remapped labels, {} override patterns, {} copy rules",
                config.remap.len(),
                config.patterns.len(),
                config.copy.len()
            );
        } else {
            let config = builtin::load_pipeline_preset(name)?;
            println!("  {:<12} {} [{} books]", name, config.name, config.books.len());
            if let Some(ref desc) = config.description {
                println!("               {}", desc);
            }
        }
        println!();
    }
    Ok(())
}

pub fn show(preset: &str) -> Result<(), FolioError> {
    if builtin::is_transcript_preset(preset) {
        output::json::print(&builtin::load_transcript_preset(preset)?)
    } else {
        output::json::print(&builtin::load_pipeline_preset(preset)?)
    }
}

pub fn validate(file: &Path, transcript: bool) -> Result<(), FolioError> {
    if transcript {
        let config = folio_core::config::load_transcript_config(file)?;
        println!(
            "Valid transcript configuration '{}' ({} override patterns)",
            config.name,
            config.patterns.len()
        );
    } else {
        let config = folio_core::config::load_pipeline_config(file)?;
        println!(
            "Valid pipeline configuration '{}' ({} books)",
            config.name,
            config.books.len()
        );
    }
    Ok(())
}
