use folio_core::config::schema::PipelineConfig;
use folio_core::mapping::LogicalMap;
use folio_core::model::{SegmentationResult, UnitOrigin};
use folio_core::report::{RunReport, Severity};

pub fn print(result: &SegmentationResult) {
    let mut current_book = None;
    for unit in &result.units {
        if current_book != Some(unit.book_id) {
            if current_book.is_some() {
                println!();
            }
            println!("=== Book {} ===\n", unit.book_id);
            current_book = Some(unit.book_id);
        }

        let origin = match unit.origin {
            UnitOrigin::Marker => String::new(),
            other => format!(" [{other}]"),
        };
        println!("  {:>4}  {} / {}{}", unit.id, unit.chapter, unit.title, origin);
        if !unit.preview.is_empty() {
            println!("        {}", unit.preview);
        }
    }

    if !result.units.is_empty() {
        println!();
    }
    println!("  Chapters: {}", result.chapters.len());
    print_report(&result.report);
}

/// Counts, then important diagnostics. Informational ones only show in logs.
pub fn print_report(report: &RunReport) {
    println!(
        "  Units: {} produced, {} skipped, {} fallback",
        report.units_produced, report.units_skipped, report.units_fallback
    );
    if !report.unmatched_identifiers.is_empty() {
        let ids: Vec<String> = report
            .unmatched_identifiers
            .iter()
            .map(|id| id.to_string())
            .collect();
        println!("  Unmatched: {}", ids.join(", "));
    }

    let important: Vec<_> = report
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Important)
        .collect();
    let info = report.diagnostics.len() - important.len();
    if !important.is_empty() {
        println!("\n  Warnings:");
        for d in important {
            println!("    [{}] {}", d.kind, d.message);
        }
    }
    if info > 0 {
        println!("  {}", info_hint(info));
    }
}

/// Informational diagnostics are logged at debug level.
fn info_hint(count: usize) -> String {
    format!("({count} informational diagnostics, use -vv to log them)")
}

pub fn print_map_summary(map: &LogicalMap, config: &PipelineConfig) {
    println!("Logical map: {} pages\n", map.len());
    for book in &config.books {
        let pages = map.pages_for(book.id);
        match (pages.first(), pages.last()) {
            (Some(first), Some(last)) => println!(
                "  {:>2}  {:<30} {:>4} pages  ({}..{} of {})",
                book.id,
                book.title,
                pages.len(),
                first,
                last,
                book.end_page
            ),
            _ => println!("  {:>2}  {:<30}    - no pages detected", book.id, book.title),
        }
    }
    println!();
}
