pub mod clean;
pub mod config;
pub mod error;
pub mod extraction;
pub mod layout;
pub mod mapping;
pub mod model;
pub mod report;
pub mod segment;
pub mod stream;
pub mod toc;

use config::schema::{PipelineConfig, StreamStrategy, TranscriptConfig};
use error::FolioError;
use extraction::{PhysicalPage, SpatialExtractor};
use mapping::{LogicalMap, MapBuilder};
use model::{BoundaryEntry, CatalogItem, SegmentationResult};
use report::RunReport;
use segment::toc::TocSegmenter;
use segment::transcript::TranscriptSegmenter;

/// Build the logical page map of a multi-up PDF.
pub fn build_logical_map(
    pdf_bytes: &[u8],
    extractor: &dyn SpatialExtractor,
    config: &PipelineConfig,
) -> Result<(LogicalMap, RunReport), FolioError> {
    let pages = extractor.extract_pages(pdf_bytes)?;
    log::info!(
        "extracted {} pages with {}",
        pages.len(),
        extractor.backend_name()
    );
    let mut report = RunReport::default();
    let map = MapBuilder::from_config(config).build(&pages, &mut report);
    Ok((map, report))
}

/// Segment already extracted pages into content units.
///
/// A map is built from the pages unless one is supplied or the stream
/// strategy never uses it. Diagnostics from every stage end up in the
/// result's report.
pub fn segment_pages(
    pages: &[PhysicalPage],
    entries: &[BoundaryEntry],
    map: Option<&LogicalMap>,
    config: &PipelineConfig,
) -> SegmentationResult {
    let mut report = RunReport::default();

    let built;
    let map = match map {
        Some(map) => Some(map),
        None if config.stream.strategy == StreamStrategy::Offset => None,
        None => {
            built = MapBuilder::from_config(config).build(pages, &mut report);
            Some(&built)
        }
    };

    let streams = stream::assemble_streams(pages, map, config, &mut report);
    let mut result = TocSegmenter::new(config).segment(entries, &streams);
    report.absorb(result.report);
    result.report = report;
    result
}

/// Main API entry point: extract a multi-up PDF and segment it against a
/// table of contents.
pub fn segment_pdf(
    pdf_bytes: &[u8],
    extractor: &dyn SpatialExtractor,
    entries: &[BoundaryEntry],
    map: Option<&LogicalMap>,
    config: &PipelineConfig,
) -> Result<SegmentationResult, FolioError> {
    let pages = extractor.extract_pages(pdf_bytes)?;
    log::info!(
        "extracted {} pages with {}",
        pages.len(),
        extractor.backend_name()
    );
    Ok(segment_pages(pages.as_slice(), entries, map, config))
}

/// Segment a flat transcript PDF against a catalog of expected items.
pub fn segment_transcript(
    pdf_bytes: &[u8],
    extractor: &dyn SpatialExtractor,
    catalog: &[CatalogItem],
    config: TranscriptConfig,
) -> Result<SegmentationResult, FolioError> {
    let segmenter = TranscriptSegmenter::new(config)?;
    let transcript = extractor.extract_transcript(pdf_bytes)?;
    Ok(segmenter.segment(catalog, &transcript))
}

/// Read boundary entries from the configured contents pages of a PDF.
pub fn parse_toc_pdf(
    pdf_bytes: &[u8],
    extractor: &dyn SpatialExtractor,
    config: &PipelineConfig,
) -> Result<(Vec<BoundaryEntry>, RunReport), FolioError> {
    let pages = extractor.extract_pages(pdf_bytes)?;
    let mut report = RunReport::default();
    let entries = toc::parse::parse_toc_pages(&pages, config, &mut report);
    Ok((entries, report))
}
