use folio_core::extraction::pdftotext::PdftotextExtractor;
use std::path::PathBuf;

use crate::output;

pub fn run(
    input_file: PathBuf,
    catalog: PathBuf,
    preset: Option<String>,
    config: Option<PathBuf>,
    output_format: &str,
    out: Option<PathBuf>,
) -> Result<(), folio_core::error::FolioError> {
    let config = super::transcript_config(preset, config)?;
    let catalog = folio_core::toc::load_catalog(&catalog)?;

    let pdf_bytes = std::fs::read(&input_file)?;
    let extractor = PdftotextExtractor::new();
    let result = folio_core::segment_transcript(&pdf_bytes, &extractor, &catalog, config)?;

    if let Some(path) = out {
        output::json::write(&result, &path)?;
        eprintln!("Result written to {}", path.display());
    }

    match output_format {
        "json" => output::json::print(&result)?,
        _ => output::table::print(&result),
    }

    Ok(())
}
