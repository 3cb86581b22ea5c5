// Region classification: genuine figure vs. stray formula fragment.
//
// A gap region is only blank of *extracted blocks*. It may hold a figure, or
// a formula the extractor could not linearise. The decision combines a visual
// score of a probe raster with the shape of whatever text sits in the region.

use image::DynamicImage;
use tracing::debug;

use super::Rect;
use super::regions::GapRegion;
use crate::config::settings::ClassifierSettings;
use crate::pdf::source::PageSource;

/// Characters counted as mathematical symbols.
const MATH_SYMBOLS: &str = "=+-−–×·∗*/\\^_()[]{}|<>≤≥≈≠∝∼~±∓∑∏∫∮∂∇√∞′″∈∉⊂⊃∪∩→←↔⇒⟨⟩‖αβγδεζηθικλμνξπρστυφχψωΓΔΘΛΞΠΣΦΨΩ";

/// Pixel-level structure of a probe raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualMetrics {
    /// Standard deviation of luma (0-~128).
    pub contrast: f64,
    /// Mean forward-difference gradient of luma (0-255).
    pub edge: f64,
    /// Percentage of pixels darker than the ink threshold (0-100).
    pub ink: f64,
    /// Geometric mean of the percentages of rows and of columns holding any
    /// ink (0-100). Line art scores high here with almost no ink.
    pub spread: f64,
}

impl VisualMetrics {
    pub fn measure(image: &DynamicImage, ink_luma: u8) -> Self {
        let gray = image.to_luma8();
        let (w, h) = gray.dimensions();
        let n = (w as usize) * (h as usize);
        if n == 0 {
            return VisualMetrics {
                contrast: 0.0,
                edge: 0.0,
                ink: 0.0,
                spread: 0.0,
            };
        }

        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        let mut ink_pixels = 0usize;
        let mut ink_rows = vec![false; h as usize];
        let mut ink_cols = vec![false; w as usize];
        for (x, y, p) in gray.enumerate_pixels() {
            let v = p.0[0] as f64;
            sum += v;
            sum_sq += v * v;
            if p.0[0] < ink_luma {
                ink_pixels += 1;
                ink_rows[y as usize] = true;
                ink_cols[x as usize] = true;
            }
        }
        let covered =
            |marks: &[bool]| marks.iter().filter(|&&m| m).count() as f64 / marks.len() as f64;
        let spread = (covered(&ink_rows) * covered(&ink_cols)).sqrt() * 100.0;
        let mean = sum / n as f64;
        let variance = (sum_sq / n as f64 - mean * mean).max(0.0);

        let mut edge_sum = 0.0f64;
        let mut edge_count = 0usize;
        if w >= 2 && h >= 2 {
            for y in 0..h - 1 {
                for x in 0..w - 1 {
                    let p = gray.get_pixel(x, y).0[0] as f64;
                    let right = gray.get_pixel(x + 1, y).0[0] as f64;
                    let below = gray.get_pixel(x, y + 1).0[0] as f64;
                    edge_sum += ((right - p).abs() + (below - p).abs()) / 2.0;
                    edge_count += 1;
                }
            }
        }

        VisualMetrics {
            contrast: variance.sqrt(),
            edge: if edge_count == 0 {
                0.0
            } else {
                edge_sum / edge_count as f64
            },
            ink: ink_pixels as f64 * 100.0 / n as f64,
            spread,
        }
    }
}

/// What the classifier sees of a candidate region.
pub struct RegionProbe<'a> {
    pub rect: Rect,
    pub raster: &'a DynamicImage,
    pub text: &'a str,
}

/// Scores how much a region looks like a picture. Higher means more structure.
pub trait RegionScorer: Send + Sync {
    fn score(&self, probe: &RegionProbe<'_>) -> f64;
}

/// Weighted sum of contrast, edge strength, ink density and ink spread.
#[derive(Debug, Clone)]
pub struct VisualScorer {
    pub contrast_weight: f64,
    pub edge_weight: f64,
    pub ink_weight: f64,
    pub spread_weight: f64,
    pub ink_luma: u8,
}

impl VisualScorer {
    pub fn from_settings(settings: &ClassifierSettings) -> Self {
        VisualScorer {
            contrast_weight: settings.contrast_weight,
            edge_weight: settings.edge_weight,
            ink_weight: settings.ink_weight,
            spread_weight: settings.spread_weight,
            ink_luma: settings.ink_luma,
        }
    }
}

impl RegionScorer for VisualScorer {
    fn score(&self, probe: &RegionProbe<'_>) -> f64 {
        let m = VisualMetrics::measure(probe.raster, self.ink_luma);
        self.contrast_weight * m.contrast
            + self.edge_weight * m.edge
            + self.ink_weight * m.ink
            + self.spread_weight * m.spread
    }
}

/// Text-shape statistics used to spot formulas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormulaStats {
    /// Non-whitespace characters.
    pub chars: usize,
    /// Math symbols / non-whitespace characters.
    pub symbol_ratio: f64,
    /// Single-letter tokens / word-like tokens.
    pub single_letter_ratio: f64,
}

impl FormulaStats {
    pub fn of(text: &str) -> Self {
        let chars = text.chars().filter(|c| !c.is_whitespace()).count();
        let symbols = text.chars().filter(|c| MATH_SYMBOLS.contains(*c)).count();

        let tokens: Vec<&str> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();
        let single_letters = tokens
            .iter()
            .filter(|t| {
                let mut it = t.chars();
                matches!((it.next(), it.next()), (Some(c), None) if c.is_alphabetic())
            })
            .count();

        FormulaStats {
            chars,
            symbol_ratio: if chars == 0 {
                0.0
            } else {
                symbols as f64 / chars as f64
            },
            single_letter_ratio: if tokens.is_empty() {
                0.0
            } else {
                single_letters as f64 / tokens.len() as f64
            },
        }
    }
}

/// Kind of text found inside a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionText {
    None,
    Prose,
    Formula,
}

/// Classifier outcome for one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Image,
    Rejected,
}

/// Everything learned about a region, kept for logging and assembly.
#[derive(Debug, Clone)]
pub struct Classification {
    pub verdict: Verdict,
    pub score: f64,
    pub text_kind: RegionText,
    /// Text extracted from the region (trimmed), possibly empty.
    pub text: String,
}

/// The three acceptance thresholds, one per [`RegionText`] kind.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

/// Image-vs-formula discriminator with a pluggable scorer.
pub struct RegionClassifier {
    scorer: Box<dyn RegionScorer>,
    thresholds: Thresholds,
    min_text_chars: usize,
    min_formula_chars: usize,
    symbol_ratio: f64,
    single_letter_ratio: f64,
}

impl RegionClassifier {
    pub fn new(scorer: Box<dyn RegionScorer>, settings: &ClassifierSettings) -> Self {
        RegionClassifier {
            scorer,
            thresholds: Thresholds {
                low: settings.threshold_low,
                mid: settings.threshold_mid,
                high: settings.threshold_high,
            },
            min_text_chars: settings.min_text_chars,
            min_formula_chars: settings.min_formula_chars,
            symbol_ratio: settings.symbol_ratio,
            single_letter_ratio: settings.single_letter_ratio,
        }
    }

    /// Classifier using [`VisualScorer`] with weights from `settings`.
    pub fn from_settings(settings: &ClassifierSettings) -> Self {
        Self::new(Box::new(VisualScorer::from_settings(settings)), settings)
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Kind of text: none, ordinary prose, or formula-shaped.
    ///
    /// Formula-shaped needs enough characters, a high symbol density and
    /// mostly single-letter tokens all at once.
    pub fn text_kind(&self, text: &str) -> RegionText {
        let stats = FormulaStats::of(text);
        if stats.chars < self.min_text_chars {
            RegionText::None
        } else if stats.chars >= self.min_formula_chars
            && stats.symbol_ratio >= self.symbol_ratio
            && stats.single_letter_ratio >= self.single_letter_ratio
        {
            RegionText::Formula
        } else {
            RegionText::Prose
        }
    }

    /// Threshold decision for a scored region.
    pub fn decide(&self, kind: RegionText, score: f64) -> Verdict {
        let threshold = match kind {
            RegionText::None => self.thresholds.low,
            RegionText::Prose => self.thresholds.mid,
            RegionText::Formula => self.thresholds.high,
        };
        if score >= threshold {
            Verdict::Image
        } else {
            Verdict::Rejected
        }
    }

    /// Classify an already rendered probe.
    pub fn classify_probe(&self, probe: &RegionProbe<'_>) -> Classification {
        let text = probe.text.trim();
        let text_kind = self.text_kind(text);
        let score = self.scorer.score(probe);
        Classification {
            verdict: self.decide(text_kind, score),
            score,
            text_kind,
            text: text.to_string(),
        }
    }

    /// Extract the region's text, render a probe and classify it.
    pub fn classify(
        &self,
        source: &dyn PageSource,
        page_index: u32,
        gap: &GapRegion,
        probe_zoom: f32,
    ) -> crate::error::Result<Classification> {
        let text = source.text_in_rect(page_index, &gap.rect)?;
        let raster = source.render_region(page_index, &gap.rect, probe_zoom)?;
        let classification = self.classify_probe(&RegionProbe {
            rect: gap.rect,
            raster: &raster,
            text: &text,
        });
        debug!(
            page = page_index + 1,
            top = gap.rect.y0,
            bottom = gap.rect.y1,
            score = classification.score,
            kind = ?classification.text_kind,
            verdict = ?classification.verdict,
            "classified gap region"
        );
        Ok(classification)
    }
}
