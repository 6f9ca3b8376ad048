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

    let (map, report) = folio_core::build_logical_map(&pdf_bytes, &extractor, &config)?;

    match out {
        Some(path) => {
            std::fs::write(&path, map.to_json()?)?;
            output::table::print_map_summary(&map, &config);
            output::table::print_report(&report);
            eprintln!("Map written to {}", path.display());
        }
        None => println!("{}", map.to_json()?),
    }

    Ok(())
}
