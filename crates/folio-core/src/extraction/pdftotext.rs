use crate::error::FolioError;
use crate::extraction::{BBox, PhysicalPage, SpatialExtractor, TextFragment};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::Write;
use std::path::Path;
use std::process::Command;

/// Extraction backend using pdftotext (from poppler-utils).
///
/// Uses `pdftotext -bbox-layout` for word-level bounding boxes and plain
/// `pdftotext` for continuous transcripts.
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialExtractor for PdftotextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PhysicalPage>, FolioError> {
        let tmpfile = write_temp_pdf(pdf_bytes)?;
        let xml = run_pdftotext(&["-bbox-layout"], tmpfile.path())?;
        let pages = parse_bbox_xml(&xml)?;
        log::info!("pdftotext extracted {} physical pages", pages.len());
        Ok(pages)
    }

    fn extract_transcript(&self, pdf_bytes: &[u8]) -> Result<String, FolioError> {
        let tmpfile = write_temp_pdf(pdf_bytes)?;
        let text = run_pdftotext(&[], tmpfile.path())?;
        // pdftotext separates pages with form feeds
        Ok(text
            .split('\x0c')
            .map(|page| page.trim_end())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

fn write_temp_pdf(pdf_bytes: &[u8]) -> Result<tempfile::NamedTempFile, FolioError> {
    let mut tmpfile =
        tempfile::NamedTempFile::new().map_err(|e| FolioError::Extraction(e.to_string()))?;
    tmpfile
        .write_all(pdf_bytes)
        .map_err(|e| FolioError::Extraction(e.to_string()))?;
    Ok(tmpfile)
}

fn run_pdftotext(args: &[&str], pdf_path: &Path) -> Result<String, FolioError> {
    let output = Command::new("pdftotext")
        .args(args)
        .arg(pdf_path)
        .arg("-") // output to stdout
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FolioError::PdftotextNotFound
            } else {
                FolioError::Extraction(format!("pdftotext failed: {}", e))
            }
        })?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(FolioError::PdftotextFailed { code, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Parse `pdftotext -bbox-layout` XHTML into physical pages of word fragments.
fn parse_bbox_xml(xml: &str) -> Result<Vec<PhysicalPage>, FolioError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pages = Vec::new();
    let mut current: Option<PhysicalPage> = None;
    let mut word_bbox: Option<BBox> = None;
    let mut word_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"page" => current = Some(start_page(&e, pages.len())),
                b"word" => {
                    word_bbox = parse_bbox(&e);
                    word_text.clear();
                }
                _ => {}
            },
            Ok(Event::Empty(e)) if e.name().as_ref() == b"page" => {
                pages.push(start_page(&e, pages.len()));
            }
            Ok(Event::Text(t)) => {
                if word_bbox.is_some() {
                    let text = t
                        .unescape()
                        .map_err(|e| FolioError::Extraction(format!("bad word text: {e}")))?;
                    word_text.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"word" => {
                    if let (Some(bbox), Some(page)) = (word_bbox.take(), current.as_mut()) {
                        let text = word_text.trim();
                        if !text.is_empty() {
                            let order = page.fragments.len();
                            page.fragments.push(TextFragment {
                                text: text.to_string(),
                                bbox,
                                // pdftotext reports no font size; glyph height is close enough
                                font_size: Some(bbox.height()),
                                order,
                            });
                        }
                    }
                }
                b"page" => {
                    if let Some(page) = current.take() {
                        pages.push(page);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FolioError::Extraction(format!(
                    "bbox XML parse error at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Ok(pages)
}

fn start_page(tag: &BytesStart<'_>, index: usize) -> PhysicalPage {
    PhysicalPage {
        index,
        width: parse_attr_f32(tag, b"width").unwrap_or(0.0),
        height: parse_attr_f32(tag, b"height").unwrap_or(0.0),
        fragments: Vec::new(),
    }
}

fn parse_attr_f32(tag: &BytesStart<'_>, name: &[u8]) -> Option<f32> {
    tag.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok()?.trim().parse().ok())
}

fn parse_bbox(tag: &BytesStart<'_>) -> Option<BBox> {
    Some(BBox {
        x_min: parse_attr_f32(tag, b"xMin")?,
        y_min: parse_attr_f32(tag, b"yMin")?,
        x_max: parse_attr_f32(tag, b"xMax")?,
        y_max: parse_attr_f32(tag, b"yMax")?,
    })
}
