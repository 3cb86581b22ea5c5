use image::DynamicImage;

use crate::layout::{Page, Rect};

/// Page-level access to a parsed document.
///
/// Coordinates follow [`crate::layout`]: PDF points, top-left origin.
/// Page indices are 0-based.
pub trait PageSource {
    fn page_count(&self) -> u32;

    /// Page geometry and its text blocks in reading order.
    fn page(&self, index: u32) -> crate::error::Result<Page>;

    /// Text whose glyphs fall inside `rect`, possibly empty.
    fn text_in_rect(&self, index: u32, rect: &Rect) -> crate::error::Result<String>;

    /// Raster of `rect` at `zoom` pixels per point.
    ///
    /// Fails with an extraction error when `rect` is empty once clipped to
    /// the page.
    fn render_region(&self, index: u32, rect: &Rect, zoom: f32)
    -> crate::error::Result<DynamicImage>;

    /// Raster of the full page at `zoom` pixels per point.
    fn render_page(&self, index: u32, zoom: f32) -> crate::error::Result<DynamicImage>;
}

/// Clip `rect` to the page and convert it to a pixel crop box at `zoom`.
///
/// Returns `(x, y, width, height)` in pixels of a page rendered at `zoom`.
pub fn pixel_crop_box(
    rect: &Rect,
    page_width: f32,
    page_height: f32,
    zoom: f32,
) -> crate::error::Result<(u32, u32, u32, u32)> {
    let page = Rect::new(0.0, 0.0, page_width, page_height);
    let clipped = rect.intersection(&page).ok_or_else(|| {
        crate::error::BilingualError::extraction(format!(
            "degenerate region {:?} on {}x{} page",
            rect, page_width, page_height
        ))
    })?;

    let x = (clipped.x0 * zoom).floor().max(0.0) as u32;
    let y = (clipped.y0 * zoom).floor().max(0.0) as u32;
    let right = (clipped.x1 * zoom).ceil() as u32;
    let bottom = (clipped.y1 * zoom).ceil() as u32;
    let width = right.saturating_sub(x);
    let height = bottom.saturating_sub(y);
    if width == 0 || height == 0 {
        return Err(crate::error::BilingualError::extraction(format!(
            "region {:?} is smaller than one pixel at zoom {zoom}",
            rect
        )));
    }
    Ok((x, y, width, height))
}
