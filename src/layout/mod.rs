//! Page geometry and the layout reconstruction engine.
//!
//! All coordinates are PDF points with the origin at the top-left corner of
//! the page and `y` growing downwards, so `y0` is a rectangle's top edge and
//! `y1` its bottom edge.

pub mod assembler;
pub mod blocks;
pub mod caption;
pub mod classifier;
pub mod regions;

use std::cmp::Ordering;

/// Axis-aligned rectangle in page space (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Rect {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Overlapping area, if any.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let r = Rect {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        };
        if r.is_empty() { None } else { Some(r) }
    }

    pub fn overlaps_horizontally(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }
}

/// Top-to-bottom, then left-to-right.
pub fn reading_order(a: &Rect, b: &Rect) -> Ordering {
    a.y0.total_cmp(&b.y0).then(a.x0.total_cmp(&b.x0))
}

/// A geometrically bounded unit of extracted text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub rect: Rect,
    pub text: String,
}

impl TextBlock {
    pub fn new(rect: Rect, text: impl Into<String>) -> Self {
        TextBlock {
            rect,
            text: text.into(),
        }
    }
}

/// One input page: geometry plus the raw blocks reported by the extractor.
#[derive(Debug, Clone)]
pub struct Page {
    /// 0-based index within the source document.
    pub index: u32,
    pub width: f32,
    pub height: f32,
    pub blocks: Vec<TextBlock>,
}

impl Page {
    /// Blocks sorted into reading order.
    pub fn sorted_blocks(&self) -> Vec<TextBlock> {
        let mut blocks = self.blocks.clone();
        blocks.sort_by(|a, b| reading_order(&a.rect, &b.rect));
        blocks
    }
}

/// Drop blocks that carry no translatable content: very short fragments and
/// bare numbers (page numbers, axis ticks, matrix cells).
pub fn is_noise_block(text: &str, min_chars: usize) -> bool {
    let trimmed = text.trim();
    trimmed.chars().count() < min_chars || trimmed.chars().all(|c| c.is_ascii_digit())
}
