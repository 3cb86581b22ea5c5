// pdfium-render wrapper: page -> text blocks / DynamicImage (in-memory only)

use std::path::PathBuf;

use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::debug;

use crate::error::BilingualError;
use crate::layout::blocks::group_segments;
use crate::layout::{Page, Rect, TextBlock};
use crate::pdf::source::{PageSource, pixel_crop_box};

/// Resolves the directory holding the pdfium shared library.
///
/// Search order:
/// 1. `PDFIUM_DYNAMIC_LIB_PATH` environment variable
/// 2. `vendor/pdfium/lib/` relative to the project root (for development)
///
/// `None` means "try the system library".
fn resolve_pdfium_lib_path() -> crate::error::Result<Option<PathBuf>> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Ok(Some(p));
        }
        return Err(BilingualError::extraction(format!(
            "PDFIUM_DYNAMIC_LIB_PATH is set to '{}' but the path does not exist",
            path
        )));
    }

    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let vendor_path = PathBuf::from(&manifest_dir).join("vendor/pdfium/lib");
        if vendor_path.exists() {
            return Ok(Some(vendor_path));
        }
    }

    Ok(None)
}

/// Creates a new Pdfium instance by dynamically loading the shared library.
pub fn create_pdfium() -> crate::error::Result<Pdfium> {
    let bindings = match resolve_pdfium_lib_path()? {
        Some(lib_path) => {
            let lib_path_str = lib_path.to_str().ok_or_else(|| {
                BilingualError::extraction("pdfium library path contains non-UTF-8 characters")
            })?;
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(lib_path_str))
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| {
        BilingualError::extraction(format!(
            "pdfium library not found ({e}): set PDFIUM_DYNAMIC_LIB_PATH or place libpdfium in vendor/pdfium/lib/"
        ))
    })?;
    Ok(Pdfium::new(bindings))
}

/// [`PageSource`] backed by a pdfium document.
pub struct PdfiumSource<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumSource<'a> {
    pub fn from_bytes(pdfium: &'a Pdfium, bytes: &'a [u8]) -> crate::error::Result<Self> {
        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| BilingualError::pdf_read(e.to_string()))?;
        Ok(Self { document })
    }

    fn get_page(&self, index: u32) -> crate::error::Result<PdfPage<'a>> {
        let index_u16 = u16::try_from(index)
            .map_err(|_| BilingualError::extraction("page index exceeds u16 range"))?;
        self.document
            .pages()
            .get(index_u16)
            .map_err(|e| BilingualError::extraction(format!("page {}: {e}", index + 1)))
    }

    fn render(page: &PdfPage<'_>, zoom: f32) -> crate::error::Result<DynamicImage> {
        let width_px = (page.width().value * zoom).round() as i32;
        let height_px = (page.height().value * zoom).round() as i32;
        if width_px <= 0 || height_px <= 0 {
            return Err(BilingualError::raster(format!(
                "page renders to an empty bitmap at zoom {zoom}"
            )));
        }

        let config = PdfRenderConfig::new()
            .set_target_width(width_px)
            .set_target_height(height_px)
            .render_form_data(true)
            .render_annotations(true);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| BilingualError::raster(e.to_string()))?;

        Ok(bitmap.as_image())
    }
}

impl PageSource for PdfiumSource<'_> {
    fn page_count(&self) -> u32 {
        self.document.pages().len() as u32
    }

    fn page(&self, index: u32) -> crate::error::Result<Page> {
        let page = self.get_page(index)?;
        let width = page.width().value;
        let height = page.height().value;

        let text = page
            .text()
            .map_err(|e| BilingualError::extraction(format!("page {}: {e}", index + 1)))?;

        // PDF space has a bottom-left origin; flip to top-left.
        let segments: Vec<TextBlock> = text
            .segments()
            .iter()
            .filter_map(|segment| {
                let content = segment.text();
                if content.trim().is_empty() {
                    return None;
                }
                let bounds = segment.bounds();
                let rect = Rect::new(
                    bounds.left().value,
                    height - bounds.top().value,
                    bounds.right().value,
                    height - bounds.bottom().value,
                );
                Some(TextBlock::new(rect, content))
            })
            .collect();

        let blocks = group_segments(&segments);
        debug!(
            page = index + 1,
            segments = segments.len(),
            blocks = blocks.len(),
            "grouped text segments"
        );

        Ok(Page {
            index,
            width,
            height,
            blocks,
        })
    }

    fn text_in_rect(&self, index: u32, rect: &Rect) -> crate::error::Result<String> {
        let page = self.get_page(index)?;
        let height = page.height().value;
        let text = page
            .text()
            .map_err(|e| BilingualError::extraction(format!("page {}: {e}", index + 1)))?;
        let pdf_rect =
            PdfRect::new_from_values(height - rect.y1, rect.x0, height - rect.y0, rect.x1);
        Ok(text.inside_rect(pdf_rect))
    }

    fn render_region(
        &self,
        index: u32,
        rect: &Rect,
        zoom: f32,
    ) -> crate::error::Result<DynamicImage> {
        let page = self.get_page(index)?;
        let (x, y, w, h) = pixel_crop_box(rect, page.width().value, page.height().value, zoom)?;
        let full = Self::render(&page, zoom)?;
        if x >= full.width() || y >= full.height() {
            return Err(BilingualError::extraction(format!(
                "region {:?} lies outside the rendered page",
                rect
            )));
        }
        let w = w.min(full.width() - x);
        let h = h.min(full.height() - y);
        Ok(full.crop_imm(x, y, w, h))
    }

    fn render_page(&self, index: u32, zoom: f32) -> crate::error::Result<DynamicImage> {
        let page = self.get_page(index)?;
        Self::render(&page, zoom)
    }
}
