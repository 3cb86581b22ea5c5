// テスト共通: インメモリの PageSource / Translator 実装と画像生成ヘルパー
#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{DynamicImage, GrayImage, Luma, imageops::FilterType};
use paper_bilingual::error::BilingualError;
use paper_bilingual::layout::{Page, Rect, TextBlock};
use paper_bilingual::pdf::source::{PageSource, pixel_crop_box};
use paper_bilingual::translate::Translator;

pub const PAGE_WIDTH: f32 = 600.0;
pub const PAGE_HEIGHT: f32 = 800.0;

/// One page held in memory: extractor blocks plus a raster at zoom 1.
pub struct MockPage {
    pub width: f32,
    pub height: f32,
    pub blocks: Vec<TextBlock>,
    pub raster: GrayImage,
}

impl MockPage {
    /// A blank white page of the default size.
    pub fn blank() -> Self {
        MockPage {
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
            blocks: Vec::new(),
            raster: GrayImage::from_pixel(PAGE_WIDTH as u32, PAGE_HEIGHT as u32, Luma([255])),
        }
    }

    pub fn with_block(mut self, x0: f32, y0: f32, x1: f32, y1: f32, text: &str) -> Self {
        self.blocks.push(TextBlock::new(Rect::new(x0, y0, x1, y1), text));
        self
    }

    /// A filled curve between `top` and `bottom`: dark area under a sine wave
    /// with a black outline, like a plotted spectrum.
    pub fn with_curve(mut self, top: f32, bottom: f32) -> Self {
        let (top, bottom) = (top as u32, bottom as u32);
        let mid = (top + bottom) as f32 / 2.0;
        let amplitude = (bottom - top) as f32 / 4.0;
        for x in 40..(self.width as u32 - 40) {
            let y_curve = (mid - amplitude * ((x as f32) / 40.0).sin()) as u32;
            for y in y_curve..bottom {
                self.raster.put_pixel(x, y, Luma([120]));
            }
            for y in y_curve.saturating_sub(1)..=(y_curve + 1).min(bottom - 1) {
                self.raster.put_pixel(x, y, Luma([0]));
            }
        }
        self
    }

    /// A plain line plot between `top` and `bottom`: 1 px axes and a 2 px
    /// stroked sine curve on white, with nothing filled.
    pub fn with_line_plot(mut self, top: f32, bottom: f32) -> Self {
        let (x0, x1) = (70u32, self.width as u32 - 50);
        let (y_top, y_axis) = (top as u32 + 10, bottom as u32 - 12);
        for y in y_top..=y_axis {
            self.raster.put_pixel(x0, y, Luma([0]));
        }
        for x in x0..=x1 {
            self.raster.put_pixel(x, y_axis, Luma([0]));
        }

        let mid = (y_top + y_axis) as f32 / 2.0;
        let amplitude = (y_axis - y_top) as f32 / 3.0;
        let mut prev: Option<u32> = None;
        for x in x0 + 1..=x1 {
            let y = (mid - amplitude * ((x - x0) as f32 / 40.0).sin()) as u32;
            // 急な区間は縦に繋いで線を途切れさせない
            let (lo, hi) = match prev {
                Some(p) => (p.min(y), p.max(y)),
                None => (y, y),
            };
            for yy in lo..=hi + 1 {
                self.raster.put_pixel(x, yy, Luma([0]));
            }
            prev = Some(y);
        }
        self
    }

    /// A handful of small black marks, like a scattered matrix fragment.
    pub fn with_specks(mut self, top: f32, bottom: f32) -> Self {
        let mid = ((top + bottom) / 2.0) as u32;
        for (cx, cy) in [(200u32, mid - 10), (260, mid - 10), (200, mid + 10), (260, mid + 10)] {
            for y in cy..cy + 6 {
                for x in cx..cx + 6 {
                    self.raster.put_pixel(x, y, Luma([0]));
                }
            }
        }
        self
    }

    /// Fill the whole page with a checkerboard, like a scanned photo.
    pub fn with_checkerboard(mut self) -> Self {
        for (x, y, p) in self.raster.enumerate_pixels_mut() {
            *p = if (x / 4 + y / 4) % 2 == 0 {
                Luma([0])
            } else {
                Luma([255])
            };
        }
        self
    }
}

/// In-memory [`PageSource`].
pub struct MockSource {
    pub pages: Vec<MockPage>,
    pub region_renders: AtomicUsize,
}

impl MockSource {
    pub fn new(pages: Vec<MockPage>) -> Self {
        MockSource {
            pages,
            region_renders: AtomicUsize::new(0),
        }
    }

    fn get(&self, index: u32) -> paper_bilingual::error::Result<&MockPage> {
        self.pages
            .get(index as usize)
            .ok_or_else(|| BilingualError::extraction(format!("no page {index}")))
    }
}

impl PageSource for MockSource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page(&self, index: u32) -> paper_bilingual::error::Result<Page> {
        let page = self.get(index)?;
        Ok(Page {
            index,
            width: page.width,
            height: page.height,
            blocks: page.blocks.clone(),
        })
    }

    fn text_in_rect(&self, index: u32, rect: &Rect) -> paper_bilingual::error::Result<String> {
        let page = self.get(index)?;
        let texts: Vec<&str> = page
            .blocks
            .iter()
            .filter(|b| {
                let (cx, cy) = b.rect.center();
                rect.contains_point(cx, cy)
            })
            .map(|b| b.text.as_str())
            .collect();
        Ok(texts.join("\n"))
    }

    fn render_region(
        &self,
        index: u32,
        rect: &Rect,
        zoom: f32,
    ) -> paper_bilingual::error::Result<DynamicImage> {
        self.region_renders.fetch_add(1, Ordering::SeqCst);
        let page = self.get(index)?;
        let (x, y, w, h) = pixel_crop_box(rect, page.width, page.height, 1.0)?;
        let crop = DynamicImage::ImageLuma8(page.raster.clone()).crop_imm(x, y, w, h);
        if (zoom - 1.0).abs() < f32::EPSILON {
            return Ok(crop);
        }
        let zw = ((w as f32) * zoom).round().max(1.0) as u32;
        let zh = ((h as f32) * zoom).round().max(1.0) as u32;
        Ok(crop.resize_exact(zw, zh, FilterType::Nearest))
    }

    fn render_page(&self, index: u32, zoom: f32) -> paper_bilingual::error::Result<DynamicImage> {
        let page = self.get(index)?;
        let full = DynamicImage::ImageLuma8(page.raster.clone());
        let zw = (page.width * zoom).round().max(1.0) as u32;
        let zh = (page.height * zoom).round().max(1.0) as u32;
        Ok(full.resize_exact(zw, zh, FilterType::Nearest))
    }
}

/// How a [`MockTranslator`] answers.
pub enum Behavior {
    /// Prefix the input with a fixed marker.
    Prefix(&'static str),
    /// Fail every call with a retryable error.
    AlwaysFail,
    /// Fail the first `n` calls, then prefix.
    FailFirst(usize, &'static str),
    /// Fail every call with an authentication-style error.
    Unauthorized,
}

/// Translator that records every call instead of going to the network.
pub struct MockTranslator {
    behavior: Behavior,
    calls: AtomicUsize,
    inputs: Mutex<Vec<String>>,
}

impl MockTranslator {
    pub fn new(behavior: Behavior) -> Self {
        MockTranslator {
            behavior,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().expect("inputs lock").clone()
    }
}

impl Translator for MockTranslator {
    fn name(&self) -> &str {
        "mock-model"
    }

    fn translate(
        &self,
        text: &str,
        _system_prompt: &str,
    ) -> paper_bilingual::error::Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().expect("inputs lock").push(text.to_string());
        match &self.behavior {
            Behavior::Prefix(p) => Ok(format!("{p}{text}")),
            Behavior::AlwaysFail => Err(BilingualError::translation("connection reset")),
            Behavior::FailFirst(k, _) if n < *k => Err(BilingualError::translation("rate limited")),
            Behavior::FailFirst(_, p) => Ok(format!("{p}{text}")),
            Behavior::Unauthorized => Err(BilingualError::config("API returned 401")),
        }
    }
}

/// English prose long enough to survive the noise filter.
pub const PARAGRAPH: &str = "We measure the polarization state of light transmitted through \
a birefringent crystal and compare it with the prediction of the Jones calculus.";
