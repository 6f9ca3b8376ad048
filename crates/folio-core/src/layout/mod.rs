pub mod detect;
pub mod partition;

use crate::extraction::TextFragment;

/// Fragments whose top edges differ by less than this many points share a line.
pub const LINE_TOLERANCE: f32 = 3.0;

/// Group positioned fragments into text lines.
///
/// Fragments are sorted top to bottom, then clustered while their top edge
/// stays within `LINE_TOLERANCE` of the line's first fragment. Each line is
/// read left to right.
pub fn group_lines(mut fragments: Vec<&TextFragment>) -> Vec<String> {
    fragments.sort_by(|a, b| {
        a.bbox
            .y_min
            .total_cmp(&b.bbox.y_min)
            .then(a.bbox.x_min.total_cmp(&b.bbox.x_min))
            .then(a.order.cmp(&b.order))
    });

    let mut lines: Vec<Vec<&TextFragment>> = Vec::new();
    let mut line_y = f32::NEG_INFINITY;

    for frag in fragments {
        if frag.text.trim().is_empty() {
            continue;
        }
        match lines.last_mut() {
            Some(line) if (frag.bbox.y_min - line_y).abs() < LINE_TOLERANCE => line.push(frag),
            _ => {
                line_y = frag.bbox.y_min;
                lines.push(vec![frag]);
            }
        }
    }

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| {
                a.bbox
                    .x_min
                    .total_cmp(&b.bbox.x_min)
                    .then(a.order.cmp(&b.order))
            });
            line.iter()
                .map(|f| f.text.trim())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}
