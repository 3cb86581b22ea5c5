// Grouping of raw text segments into lines and blocks.
//
// pdfium reports text as short same-style segments. The layout engine works on
// paragraph-sized blocks, so segments are first joined into lines and lines
// into blocks.

use super::{Rect, TextBlock, reading_order};

/// Segments whose vertical centres differ by less than this fraction of the
/// smaller segment height belong to the same line.
const SAME_LINE_TOLERANCE: f32 = 0.5;

/// Horizontal gap (in multiples of line height, about one em) allowed between
/// segments of a line. A two-column gutter is wider than this.
const MAX_WORD_GAP: f32 = 1.0;

/// Vertical gap (in multiples of line height) below which lines join a block.
const MAX_LINE_GAP: f32 = 0.8;

/// Group raw segments into blocks in reading order.
pub fn group_segments(segments: &[TextBlock]) -> Vec<TextBlock> {
    let lines = group_into_lines(segments);
    group_lines_into_blocks(lines)
}

fn group_into_lines(segments: &[TextBlock]) -> Vec<TextBlock> {
    let mut sorted: Vec<&TextBlock> = segments
        .iter()
        .filter(|s| !s.text.trim().is_empty() && !s.rect.is_empty())
        .collect();
    sorted.sort_by(|a, b| reading_order(&a.rect, &b.rect));

    let mut lines: Vec<TextBlock> = Vec::new();
    for segment in sorted {
        let joined = lines.iter_mut().rev().take(4).find(|line| {
            same_line(&line.rect, &segment.rect)
                && segment.rect.x0 - line.rect.x1 <= MAX_WORD_GAP * line.rect.height()
                && segment.rect.x0 >= line.rect.x0
        });
        match joined {
            Some(line) => {
                if !line.text.ends_with(' ') && !segment.text.starts_with(' ') {
                    line.text.push(' ');
                }
                line.text.push_str(segment.text.trim());
                line.rect = line.rect.union(&segment.rect);
            }
            None => lines.push(TextBlock::new(segment.rect, segment.text.trim())),
        }
    }
    lines
}

fn same_line(a: &Rect, b: &Rect) -> bool {
    let (_, ca) = a.center();
    let (_, cb) = b.center();
    let h = a.height().min(b.height()).max(1.0);
    (ca - cb).abs() < h * SAME_LINE_TOLERANCE
}

fn group_lines_into_blocks(mut lines: Vec<TextBlock>) -> Vec<TextBlock> {
    lines.sort_by(|a, b| reading_order(&a.rect, &b.rect));

    let mut blocks: Vec<TextBlock> = Vec::new();
    for line in lines {
        let line_height = line.rect.height().max(1.0);
        let joined = blocks.iter_mut().rev().find(|block| {
            let gap = line.rect.y0 - block.rect.y1;
            gap >= -line_height * 0.5
                && gap < MAX_LINE_GAP * line_height
                && block.rect.overlaps_horizontally(&line.rect)
        });
        match joined {
            Some(block) => {
                block.text.push('\n');
                block.text.push_str(&line.text);
                block.rect = block.rect.union(&line.rect);
            }
            None => blocks.push(line),
        }
    }

    blocks.sort_by(|a, b| reading_order(&a.rect, &b.rect));
    blocks
}
