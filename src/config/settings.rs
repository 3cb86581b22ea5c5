use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::job::RenderMode;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: RenderMode,
    pub layout: LayoutSettings,
    pub classifier: ClassifierSettings,
    pub translation: TranslationSettings,
    pub renderer: RendererSettings,
}

/// Page geometry and typography parameters.
///
/// Lengths are PDF points in a top-left origin coordinate system.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub font_size: f32,
    pub line_height: f32,
    /// Width of the original-page column in screenshot mode, in percent.
    pub image_column_width: u8,
    pub min_gap_height: f32,
    pub side_margin: f32,
    /// Fraction of the page height treated as header (top) and footer (bottom).
    pub header_band: f32,
    pub paragraph_gap: f32,
    pub interval_merge_tolerance: f32,
    pub min_block_chars: usize,
    pub probe_zoom: f32,
    pub image_zoom: f32,
    pub screenshot_zoom: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        LayoutSettings {
            font_size: 13.0,
            line_height: 1.4,
            image_column_width: 50,
            min_gap_height: 120.0,
            side_margin: 30.0,
            header_band: 0.06,
            paragraph_gap: 50.0,
            interval_merge_tolerance: 2.0,
            min_block_chars: 5,
            probe_zoom: 1.0,
            image_zoom: 2.0,
            screenshot_zoom: 2.0,
        }
    }
}

/// Thresholds and weights for the image-vs-formula decision.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub threshold_low: f64,
    pub threshold_mid: f64,
    pub threshold_high: f64,
    pub contrast_weight: f64,
    pub edge_weight: f64,
    pub ink_weight: f64,
    pub spread_weight: f64,
    /// Luma below which a pixel counts as ink.
    pub ink_luma: u8,
    pub min_formula_chars: usize,
    pub symbol_ratio: f64,
    pub single_letter_ratio: f64,
    /// Fewer non-whitespace characters than this counts as "no text".
    pub min_text_chars: usize,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        ClassifierSettings {
            threshold_low: 35.0,
            threshold_mid: 40.0,
            threshold_high: 62.0,
            contrast_weight: 0.5,
            edge_weight: 1.0,
            ink_weight: 0.5,
            spread_weight: 0.35,
            ink_luma: 230,
            min_formula_chars: 25,
            symbol_ratio: 0.15,
            single_letter_ratio: 0.4,
            min_text_chars: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslationSettings {
    pub base_url: String,
    pub model: String,
    /// Environment variable consulted when `api_keys` is empty.
    pub api_key_env: String,
    pub api_keys: Vec<String>,
    pub target_language: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: f64,
    pub workers: usize,
    pub cache_capacity: usize,
    pub chunk_chars: usize,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        TranslationSettings {
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            api_key_env: "TRANSLATE_API_KEY".to_string(),
            api_keys: Vec::new(),
            target_language: "Chinese".to_string(),
            temperature: 0.1,
            timeout_secs: 60,
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 8000,
            jitter: 0.25,
            workers: 4,
            cache_capacity: 2048,
            chunk_chars: 2500,
        }
    }
}

impl TranslationSettings {
    /// Configured API keys, falling back to the `api_key_env` variable.
    pub fn resolve_api_keys(&self) -> Vec<String> {
        let keys: Vec<String> = self
            .api_keys
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if !keys.is_empty() {
            return keys;
        }
        match std::env::var(&self.api_key_env) {
            Ok(value) => value
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    pub browser_path: Option<PathBuf>,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub keep_html: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        RendererSettings {
            browser_path: None,
            timeout_secs: 120,
            max_attempts: 2,
            keep_html: false,
        }
    }
}

impl LayoutSettings {
    /// 値域チェック。ジョブ単位の上書き後にも呼ばれる。
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(0.0..0.5).contains(&self.header_band) {
            return Err(crate::error::BilingualError::config(format!(
                "layout.header_band must be in [0, 0.5), got {}",
                self.header_band
            )));
        }
        if !(1..=99).contains(&self.image_column_width) {
            return Err(crate::error::BilingualError::config(format!(
                "layout.image_column_width must be 1-99, got {}",
                self.image_column_width
            )));
        }
        for (name, value) in [
            ("min_gap_height", self.min_gap_height),
            ("font_size", self.font_size),
            ("line_height", self.line_height),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(crate::error::BilingualError::config(format!(
                    "layout.{name} must be positive, got {value}"
                )));
            }
        }
        if self.probe_zoom <= 0.0 || self.image_zoom <= 0.0 || self.screenshot_zoom <= 0.0 {
            return Err(crate::error::BilingualError::config(
                "layout zoom factors must be positive",
            ));
        }
        Ok(())
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        let settings: Settings = serde_yml::from_str(yaml).map_err(|e| {
            crate::error::BilingualError::config(format!("Failed to parse settings YAML: {e}"))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Reject values that would make the layout or translation stages misbehave.
    pub fn validate(&self) -> crate::error::Result<()> {
        self.layout.validate()?;

        let cls = &self.classifier;
        if !(cls.threshold_low <= cls.threshold_mid && cls.threshold_mid <= cls.threshold_high) {
            return Err(crate::error::BilingualError::config(format!(
                "classifier thresholds must satisfy low <= mid <= high, got {} / {} / {}",
                cls.threshold_low, cls.threshold_mid, cls.threshold_high
            )));
        }

        let tr = &self.translation;
        if tr.max_attempts == 0 {
            return Err(crate::error::BilingualError::config(
                "translation.max_attempts must be at least 1",
            ));
        }
        if tr.workers == 0 {
            return Err(crate::error::BilingualError::config(
                "translation.workers must be at least 1",
            ));
        }
        if tr.chunk_chars < 100 {
            return Err(crate::error::BilingualError::config(format!(
                "translation.chunk_chars must be at least 100, got {}",
                tr.chunk_chars
            )));
        }
        if self.renderer.max_attempts == 0 {
            return Err(crate::error::BilingualError::config(
                "renderer.max_attempts must be at least 1",
            ));
        }
        Ok(())
    }
}
