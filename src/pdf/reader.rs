use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::BilingualError;

/// PDFのページ一辺の上限 (200 inch)。
const MAX_PAGE_SIDE: f32 = 14_400.0;

/// Page tree depth at which MediaBox inheritance is abandoned.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Structural view of the input PDF.
///
/// pdfium is lenient with broken files; the job checks the page tree with
/// lopdf first so that a bad input fails before any rendering or translation.
pub struct PdfReader {
    doc: Document,
}

impl PdfReader {
    pub fn from_bytes(bytes: &[u8]) -> crate::error::Result<Self> {
        if !bytes.starts_with(b"%PDF") {
            return Err(BilingualError::pdf_read(
                "input does not start with a %PDF header",
            ));
        }
        let doc = Document::load_mem(bytes)?;
        Ok(Self { doc })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// ページ(1始まり)の MediaBox 寸法 `(width, height)` をポイントで返す。
    pub fn page_size(&self, page_num: u32) -> crate::error::Result<(f32, f32)> {
        let page_id = self.page_id(page_num)?;
        let media_box = self.inherited_media_box(page_id)?;
        box_size(&media_box)
            .map_err(|e| BilingualError::pdf_read(format!("page {page_num}: {e}")))
    }

    /// Check that every requested page (1-based) exists and has a usable size.
    pub fn validate_pages(&self, pages: &[u32]) -> crate::error::Result<()> {
        let count = self.page_count();
        if count == 0 {
            return Err(BilingualError::pdf_read("PDF has no pages"));
        }
        for &page_num in pages {
            if page_num == 0 || page_num > count {
                return Err(BilingualError::pdf_read(format!(
                    "page {page_num} out of range (document has {count} pages)"
                )));
            }
            self.page_size(page_num)?;
        }
        Ok(())
    }

    fn page_id(&self, page_num: u32) -> crate::error::Result<ObjectId> {
        self.doc
            .get_pages()
            .get(&page_num)
            .copied()
            .ok_or_else(|| BilingualError::pdf_read(format!("page {page_num} not found")))
    }

    /// Page の MediaBox、無ければ Parent を辿って継承値を探す。
    fn inherited_media_box(&self, page_id: ObjectId) -> crate::error::Result<Vec<Object>> {
        let mut dict: &Dictionary = self.doc.get_dictionary(page_id)?;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Ok(media_box) = dict.get(b"MediaBox") {
                let media_box = match media_box {
                    Object::Reference(id) => self.doc.get_object(*id)?,
                    other => other,
                };
                return Ok(media_box.as_array()?.clone());
            }
            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => dict = self.doc.get_dictionary(*parent_id)?,
                _ => break,
            }
        }
        Err(BilingualError::pdf_read("MediaBox not found"))
    }
}

/// `[llx lly urx ury]` の幅と高さ。
fn box_size(values: &[Object]) -> crate::error::Result<(f32, f32)> {
    let [llx, lly, urx, ury] = values else {
        return Err(BilingualError::pdf_read(format!(
            "Invalid MediaBox: expected 4 numbers, got {}",
            values.len()
        )));
    };
    let number = |obj: &Object| {
        obj.as_float()
            .map_err(|_| BilingualError::pdf_read("Invalid MediaBox value"))
    };
    let width = (number(urx)? - number(llx)?).abs();
    let height = (number(ury)? - number(lly)?).abs();

    if width == 0.0 || height == 0.0 {
        return Err(BilingualError::pdf_read(format!(
            "Invalid MediaBox: empty {width}x{height} pt page"
        )));
    }
    if width > MAX_PAGE_SIDE || height > MAX_PAGE_SIDE {
        return Err(BilingualError::pdf_read(format!(
            "Invalid MediaBox: {width}x{height} pt exceeds the PDF limit of {MAX_PAGE_SIDE} pt"
        )));
    }
    Ok((width, height))
}
