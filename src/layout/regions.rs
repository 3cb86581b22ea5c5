// Region extraction: vertical text intervals and the blank bands between them.

use super::{Rect, TextBlock};

/// Geometry parameters for gap extraction.
#[derive(Debug, Clone, Copy)]
pub struct RegionParams {
    pub min_gap_height: f32,
    pub side_margin: f32,
    /// Header/footer band as a fraction of the page height.
    pub header_band: f32,
    /// Blocks closer than this vertically merge into one interval.
    pub merge_tolerance: f32,
}

/// A vertical range of the page occupied by text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextInterval {
    pub top: f32,
    pub bottom: f32,
    /// Horizontal extent: union of the member blocks.
    pub x0: f32,
    pub x1: f32,
}

/// A candidate figure location: a band with no text in it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapRegion {
    pub rect: Rect,
}

impl GapRegion {
    pub fn height(&self) -> f32 {
        self.rect.height()
    }
}

/// Merge blocks into vertical intervals.
///
/// Blocks are sorted by their top edge; a block joins the current interval
/// when its vertical range overlaps it or starts within `tolerance` of its
/// bottom.
pub fn merge_intervals(blocks: &[TextBlock], tolerance: f32) -> Vec<TextInterval> {
    let mut rects: Vec<Rect> = blocks.iter().map(|b| b.rect).collect();
    rects.sort_by(|a, b| a.y0.total_cmp(&b.y0));

    let mut intervals: Vec<TextInterval> = Vec::new();
    for r in rects {
        match intervals.last_mut() {
            Some(current) if r.y0 <= current.bottom + tolerance => {
                current.bottom = current.bottom.max(r.y1);
                current.x0 = current.x0.min(r.x0);
                current.x1 = current.x1.max(r.x1);
            }
            _ => intervals.push(TextInterval {
                top: r.y0,
                bottom: r.y1,
                x0: r.x0,
                x1: r.x1,
            }),
        }
    }
    intervals
}

/// Derive the blank bands of a page from its (non-header/footer) blocks.
///
/// Bands are clipped to the safe area between the header and footer bands
/// and span the page width minus the side margins. Bands lower than
/// `min_gap_height` are never returned. A page without blocks yields no
/// bands; see [`whole_page_region`] for that case.
pub fn extract_gap_regions(
    blocks: &[TextBlock],
    page_width: f32,
    page_height: f32,
    params: &RegionParams,
) -> Vec<GapRegion> {
    let safe_top = page_height * params.header_band;
    let safe_bottom = page_height * (1.0 - params.header_band);
    let x0 = params.side_margin;
    let x1 = page_width - params.side_margin;
    if x1 <= x0 || safe_bottom <= safe_top {
        return Vec::new();
    }

    let intervals = merge_intervals(blocks, params.merge_tolerance);
    if intervals.is_empty() {
        return Vec::new();
    }

    let mut bounds: Vec<(f32, f32)> = Vec::with_capacity(intervals.len() + 1);
    bounds.push((safe_top, intervals[0].top));
    for pair in intervals.windows(2) {
        bounds.push((pair[0].bottom, pair[1].top));
    }
    if let Some(last) = intervals.last() {
        bounds.push((last.bottom, safe_bottom));
    }

    bounds
        .into_iter()
        .filter_map(|(top, bottom)| {
            let top = top.max(safe_top);
            let bottom = bottom.min(safe_bottom);
            (bottom - top >= params.min_gap_height).then(|| GapRegion {
                rect: Rect::new(x0, top, x1, bottom),
            })
        })
        .collect()
}

/// The single candidate used for pages without any text: the whole safe area.
pub fn whole_page_region(
    page_width: f32,
    page_height: f32,
    params: &RegionParams,
) -> Option<GapRegion> {
    let rect = Rect::new(
        params.side_margin,
        page_height * params.header_band,
        page_width - params.side_margin,
        page_height * (1.0 - params.header_band),
    );
    (!rect.is_empty() && rect.height() >= params.min_gap_height).then_some(GapRegion { rect })
}
