// Page assembly: paragraphs, captions and accepted figures merged into one
// element stream in vertical reading order.

use image::DynamicImage;

use super::{Rect, TextBlock, reading_order};

/// Text content with its translation once available.
#[derive(Debug, Clone, PartialEq)]
pub struct TextElement {
    pub rect: Rect,
    pub source: String,
    pub translated: Option<String>,
}

impl TextElement {
    pub fn new(rect: Rect, source: impl Into<String>) -> Self {
        TextElement {
            rect,
            source: source.into(),
            translated: None,
        }
    }

    /// Translated text, or the source text while untranslated.
    pub fn display_text(&self) -> &str {
        self.translated.as_deref().unwrap_or(&self.source)
    }
}

/// A figure cropped from the page. Never translated.
#[derive(Debug, Clone)]
pub struct ImageElement {
    pub rect: Rect,
    pub raster: DynamicImage,
    /// Visual score the classifier assigned to the region.
    pub score: f64,
}

/// One unit of the output stream.
#[derive(Debug, Clone)]
pub enum Element {
    Text(TextElement),
    Image(ImageElement),
    Caption(TextElement),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Text,
    Image,
    Caption,
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Text(_) => ElementKind::Text,
            Element::Image(_) => ElementKind::Image,
            Element::Caption(_) => ElementKind::Caption,
        }
    }

    pub fn rect(&self) -> Rect {
        match self {
            Element::Text(t) | Element::Caption(t) => t.rect,
            Element::Image(i) => i.rect,
        }
    }

    pub fn top(&self) -> f32 {
        self.rect().y0
    }

    pub fn is_caption(&self) -> bool {
        matches!(self, Element::Caption(_))
    }

    /// Text-bearing view of the element, if it carries text.
    pub fn text(&self) -> Option<&TextElement> {
        match self {
            Element::Text(t) | Element::Caption(t) => Some(t),
            Element::Image(_) => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut TextElement> {
        match self {
            Element::Text(t) | Element::Caption(t) => Some(t),
            Element::Image(_) => None,
        }
    }
}

/// The reconstructed content of one page.
#[derive(Debug, Clone)]
pub struct PageElements {
    /// 0-based page index.
    pub page_index: u32,
    pub width: f32,
    pub height: f32,
    pub elements: Vec<Element>,
    pub warnings: Vec<String>,
}

enum Event {
    Image(ImageElement),
    Caption(TextBlock),
    Text(TextBlock),
}

impl Event {
    fn rect(&self) -> &Rect {
        match self {
            Event::Image(i) => &i.rect,
            Event::Caption(b) | Event::Text(b) => &b.rect,
        }
    }

    /// Tie-break at equal tops: figures first, then captions, then text.
    fn rank(&self) -> u8 {
        match self {
            Event::Image(_) => 0,
            Event::Caption(_) => 1,
            Event::Text(_) => 2,
        }
    }
}

/// Merge text blocks, caption blocks and accepted figures into one stream.
///
/// Text blocks accumulate in an open paragraph while each starts less than
/// `paragraph_gap` below the paragraph's bottom edge. Captions and figures
/// always close the open paragraph. Element tops are non-decreasing.
pub fn assemble(
    text_blocks: Vec<TextBlock>,
    captions: Vec<TextBlock>,
    images: Vec<ImageElement>,
    paragraph_gap: f32,
) -> Vec<Element> {
    let mut events: Vec<Event> =
        Vec::with_capacity(text_blocks.len() + captions.len() + images.len());
    events.extend(images.into_iter().map(Event::Image));
    events.extend(captions.into_iter().map(Event::Caption));
    events.extend(text_blocks.into_iter().map(Event::Text));
    events.sort_by(|a, b| {
        a.rect()
            .y0
            .total_cmp(&b.rect().y0)
            .then(a.rank().cmp(&b.rank()))
            .then(reading_order(a.rect(), b.rect()))
    });

    let mut elements = Vec::new();
    let mut open: Option<TextElement> = None;

    for event in events {
        match event {
            Event::Text(block) => {
                let text = block.text.trim();
                if text.is_empty() {
                    continue;
                }
                match open.as_mut() {
                    Some(paragraph) if block.rect.y0 - paragraph.rect.y1 < paragraph_gap => {
                        paragraph.source.push('\n');
                        paragraph.source.push_str(text);
                        paragraph.rect = paragraph.rect.union(&block.rect);
                    }
                    _ => {
                        if let Some(done) = open.take() {
                            elements.push(Element::Text(done));
                        }
                        open = Some(TextElement::new(block.rect, text));
                    }
                }
            }
            Event::Caption(block) => {
                if let Some(done) = open.take() {
                    elements.push(Element::Text(done));
                }
                elements.push(Element::Caption(TextElement::new(
                    block.rect,
                    block.text.trim(),
                )));
            }
            Event::Image(image) => {
                if let Some(done) = open.take() {
                    elements.push(Element::Text(done));
                }
                elements.push(Element::Image(image));
            }
        }
    }
    if let Some(done) = open.take() {
        elements.push(Element::Text(done));
    }
    elements
}
