use folio_core::extraction::pdftotext::PdftotextExtractor;
use folio_core::extraction::SpatialExtractor;
use folio_core::mapping::LogicalMap;
use folio_core::report::RunReport;
use std::path::PathBuf;

use crate::output;

pub fn run(
    input_file: PathBuf,
    toc: Option<PathBuf>,
    map: Option<PathBuf>,
    preset: Option<String>,
    config: Option<PathBuf>,
    output_format: &str,
    out: Option<PathBuf>,
) -> Result<(), folio_core::error::FolioError> {
    let config = super::pipeline_config(preset, config)?;

    let map = match map {
        Some(path) => {
            let map = LogicalMap::from_json(&std::fs::read_to_string(&path)?)?;
            log::info!("loaded {} mapped pages from {}", map.len(), path.display());
            Some(map)
        }
        None => None,
    };

    let pdf_bytes = std::fs::read(&input_file)?;
    let extractor = PdftotextExtractor::new();
    let pages = extractor.extract_pages(&pdf_bytes)?;

    // Without a catalog file, read the book's own contents pages.
    let mut toc_report = RunReport::default();
    let entries = match toc {
        Some(path) => folio_core::toc::load_boundaries(&path)?,
        None => folio_core::toc::parse::parse_toc_pages(&pages, &config, &mut toc_report),
    };

    let mut result = folio_core::segment_pages(&pages, &entries, map.as_ref(), &config);
    toc_report.absorb(result.report);
    result.report = toc_report;

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
