// HTML document generation for both layout modes.

use std::fmt::Write as _;
use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat};

use crate::config::job::RenderMode;
use crate::config::settings::LayoutSettings;
use crate::layout::assembler::{Element, PageElements};

const MATHJAX: &str = r#"<script>
MathJax = { tex: { inlineMath: [['$', '$'], ['\\(', '\\)']] } };
</script>
<script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>"#;

/// A page ready for rendering: its translated elements plus, in screenshot
/// mode, a raster of the original page.
pub struct PageView {
    pub elements: PageElements,
    pub screenshot: Option<DynamicImage>,
}

/// Typography and layout options for the generated document.
#[derive(Debug, Clone, Copy)]
pub struct HtmlOptions {
    pub mode: RenderMode,
    pub font_size: f32,
    pub line_height: f32,
    /// Width of the original-page column in screenshot mode, in percent.
    pub image_column_width: u8,
}

impl HtmlOptions {
    pub fn new(mode: RenderMode, layout: &LayoutSettings) -> Self {
        HtmlOptions {
            mode,
            font_size: layout.font_size,
            line_height: layout.line_height,
            image_column_width: layout.image_column_width,
        }
    }
}

pub struct HtmlRenderer {
    options: HtmlOptions,
}

impl HtmlRenderer {
    pub fn new(options: HtmlOptions) -> Self {
        Self { options }
    }

    /// Build the complete HTML document for `pages`.
    pub fn render(&self, pages: &[PageView]) -> crate::error::Result<String> {
        let mut body = String::new();
        for page in pages {
            match self.options.mode {
                RenderMode::ScreenshotCompare => self.render_compare_page(page, &mut body)?,
                RenderMode::PureFlow => self.render_flow_page(page, &mut body)?,
            }
        }

        Ok(format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n{}</style>\n{}\n</head>\n<body>\n{}</body>\n</html>\n",
            self.css(),
            MATHJAX,
            body
        ))
    }

    fn render_compare_page(&self, page: &PageView, out: &mut String) -> crate::error::Result<()> {
        let _ = writeln!(
            out,
            "<div class=\"page-container\" data-page=\"{}\">",
            page.elements.page_index + 1
        );
        out.push_str("<div class=\"left-col\">");
        if let Some(shot) = &page.screenshot {
            let _ = write!(out, "<img src=\"{}\" alt=\"\">", image_to_data_uri(shot)?);
        }
        out.push_str("</div>\n<div class=\"right-col\">\n");
        // The screenshot already shows the figures.
        for element in &page.elements.elements {
            match element {
                Element::Text(t) => push_paragraphs(out, t.display_text()),
                Element::Caption(t) => push_caption(out, t.display_text()),
                Element::Image(_) => {}
            }
        }
        out.push_str("</div>\n</div>\n");
        Ok(())
    }

    fn render_flow_page(&self, page: &PageView, out: &mut String) -> crate::error::Result<()> {
        let _ = writeln!(
            out,
            "<div class=\"flow-page\" data-page=\"{}\">",
            page.elements.page_index + 1
        );
        for element in &page.elements.elements {
            match element {
                Element::Text(t) => push_paragraphs(out, t.display_text()),
                Element::Caption(t) => push_caption(out, t.display_text()),
                Element::Image(img) => {
                    let _ = writeln!(
                        out,
                        "<figure><img src=\"{}\" alt=\"\"></figure>",
                        image_to_data_uri(&img.raster)?
                    );
                }
            }
        }
        out.push_str("</div>\n");
        Ok(())
    }

    fn css(&self) -> String {
        let o = &self.options;
        let common = format!(
            "body {{ font-family: \"Noto Serif SC\", \"SimSun\", serif; font-size: {}pt; \
             line-height: {}; color: #000; margin: 0; padding: 0; background: white; }}\n\
             p {{ margin: 0 0 1em 0; text-indent: 2em; text-align: justify; }}\n\
             .caption {{ font-size: 0.9em; color: #444; font-weight: bold; margin: 1em 0; \
             text-indent: 0; text-align: center; background: #f0f0f0; padding: 5px; \
             border-radius: 4px; }}\n",
            o.font_size, o.line_height
        );
        match o.mode {
            RenderMode::ScreenshotCompare => format!(
                "@page {{ size: A4 landscape; margin: 0; }}\n{common}\
                 .page-container {{ width: 297mm; height: 210mm; page-break-after: always; \
                 display: flex; flex-direction: row; overflow: hidden; }}\n\
                 .left-col {{ width: {left}%; height: 100%; border-right: 1px solid #ccc; \
                 display: flex; align-items: center; justify-content: center; padding: 10px; \
                 box-sizing: border-box; background: #fcfcfc; }}\n\
                 .left-col img {{ max-width: 100%; max-height: 100%; object-fit: contain; }}\n\
                 .right-col {{ width: {right}%; height: 100%; padding: 25px 30px; \
                 box-sizing: border-box; overflow: hidden; }}\n",
                left = o.image_column_width,
                right = 100 - o.image_column_width.min(100),
            ),
            RenderMode::PureFlow => format!(
                "@page {{ size: A4 portrait; margin: 18mm 20mm; }}\n{common}\
                 .flow-page {{ page-break-after: always; }}\n\
                 figure {{ margin: 1em 0; text-align: center; }}\n\
                 figure img {{ max-width: 100%; }}\n"
            ),
        }
    }
}

fn push_paragraphs(out: &mut String, text: &str) {
    for paragraph in text.split("\n\n") {
        let joined = paragraph.split_whitespace().collect::<Vec<_>>().join(" ");
        if !joined.is_empty() {
            let _ = writeln!(out, "<p>{}</p>", escape_html(&joined));
        }
    }
}

fn push_caption(out: &mut String, text: &str) {
    let joined = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let _ = writeln!(out, "<div class=\"caption\">{}</div>", escape_html(&joined));
}

/// Escape text for use in HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Encode `image` as PNG inside a `data:` URI.
pub fn image_to_data_uri(image: &DynamicImage) -> crate::error::Result<String> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(format!(
        "data:image/png;base64,{}",
        STANDARD.encode(buf.into_inner())
    ))
}
