use folio_core::extraction::pdftotext::PdftotextExtractor;
use std::path::PathBuf;

use crate::output;

pub fn run(
    input_file: PathBuf,
    preset: Option<String>,
    config: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<(), folio_core::error::FolioError> {
    let config = super::pipeline_config(preset, config)?;
    let pdf_bytes = std::fs::read(&input_file)?;
    let extractor = PdftotextExtractor::new();

    let (entries, report) = folio_core::parse_toc_pdf(&pdf_bytes, &extractor, &config)?;
    if entries.is_empty() {
        log::warn!("no contents entries found; check the books' toc_pages");
    }

    match out {
        Some(path) => {
            output::json::write(&entries, &path)?;
            eprintln!("{} entries written to {}", entries.len(), path.display());
        }
        None => output::json::print(&entries)?,
    }
    output::table::print_report(&report);

    Ok(())
}
