// ジョブ単位: PDF読込 -> ページ再構成 -> 一括翻訳 -> HTML生成 -> PDF印刷

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::store::TranslationCache;
use crate::config::job::RenderMode;
use crate::config::merged::MergedConfig;
use crate::config::settings::RendererSettings;
use crate::document::html::{HtmlOptions, HtmlRenderer, PageView};
use crate::document::printer::BrowserPrinter;
use crate::error::BilingualError;
use crate::layout::classifier::RegionClassifier;
use crate::pdf::reader::PdfReader;
use crate::pdf::source::PageSource;
use crate::pipeline::page_processor::{PageParams, process_page};
use crate::render::pdfium::{PdfiumSource, create_pdfium};
use crate::translate::Translator;
use crate::translate::orchestrator::{
    OrchestratorConfig, TranslationFailure, TranslationOrchestrator,
};

/// Configuration for a single job.
pub struct JobConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// 1-based page numbers; `None` means every page.
    pub pages: Option<Vec<u32>>,
    pub merged: MergedConfig,
    pub translator: Arc<dyn Translator>,
    /// Shared between jobs so repeated text is translated once per process.
    pub cache: Arc<TranslationCache>,
}

/// What a job left on disk.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutput {
    Pdf(PathBuf),
    /// No renderer could be found; the HTML document is the deliverable.
    HtmlFallback { path: PathBuf, reason: String },
}

impl JobOutput {
    pub fn path(&self) -> &Path {
        match self {
            JobOutput::Pdf(path) => path,
            JobOutput::HtmlFallback { path, .. } => path,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, JobOutput::HtmlFallback { .. })
    }
}

/// Result of processing a single job.
#[derive(Debug)]
pub struct JobResult {
    pub input_path: PathBuf,
    pub output: JobOutput,
    pub pages_processed: usize,
    pub translation_errors: Vec<TranslationFailure>,
    pub warnings: Vec<String>,
}

/// Translated pages of one document, ready for rendering.
pub struct TranslatedDocument {
    pub pages: Vec<PageView>,
    pub translation_errors: Vec<TranslationFailure>,
    pub warnings: Vec<String>,
}

/// Reconstruct and translate `page_indices` (0-based) of `source`.
///
/// Pages are processed sequentially; translation of every page's text runs
/// as one batch afterwards. A page that cannot be read is skipped with a
/// warning.
pub fn translate_document(
    source: &dyn PageSource,
    page_indices: &[u32],
    merged: &MergedConfig,
    orchestrator: &TranslationOrchestrator,
) -> TranslatedDocument {
    let params = PageParams::from_layout(&merged.layout);
    let classifier = RegionClassifier::from_settings(&merged.classifier);
    let mut warnings = Vec::new();
    let mut pages = Vec::with_capacity(page_indices.len());
    let mut screenshots = Vec::with_capacity(page_indices.len());

    for &page_index in page_indices {
        let page_num = page_index + 1;
        let elements = match process_page(source, page_index, &params, &classifier) {
            Ok(elements) => elements,
            Err(e) => {
                warn!(page = page_num, error = %e, "skipping page");
                warnings.push(format!("page {page_num}: skipped: {e}"));
                continue;
            }
        };
        warnings.extend(elements.warnings.iter().cloned());

        let screenshot = match merged.mode {
            RenderMode::ScreenshotCompare => {
                match source.render_page(page_index, merged.layout.screenshot_zoom) {
                    Ok(image) => Some(image),
                    Err(e) => {
                        warn!(page = page_num, error = %e, "failed to render page screenshot");
                        warnings.push(format!("page {page_num}: no screenshot: {e}"));
                        None
                    }
                }
            }
            RenderMode::PureFlow => None,
        };

        pages.push(elements);
        screenshots.push(screenshot);
    }

    let translated = orchestrator.translate_pages(pages);
    let pages = translated
        .translated_elements
        .into_iter()
        .zip(screenshots)
        .map(|(elements, screenshot)| PageView {
            elements,
            screenshot,
        })
        .collect();

    TranslatedDocument {
        pages,
        translation_errors: translated.errors,
        warnings,
    }
}

/// Path of the intermediate HTML document for `output_path`.
pub fn html_path_for(output_path: &Path) -> PathBuf {
    output_path.with_extension("html")
}

/// Write `html` next to `output_path` and print it to PDF.
///
/// When no browser is available the HTML file is kept and returned as the
/// fallback output. Any other printing failure is an error.
pub fn write_output(
    html: &str,
    output_path: &Path,
    renderer: &RendererSettings,
) -> crate::error::Result<JobOutput> {
    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let html_path = html_path_for(output_path);
    std::fs::write(&html_path, html)?;

    let printed = BrowserPrinter::from_settings(renderer)
        .and_then(|printer| printer.print(&html_path, output_path));

    match printed {
        Ok(()) => {
            // 印刷済みなので中間HTMLの削除失敗はジョブを失敗させない
            if !renderer.keep_html
                && let Err(e) = std::fs::remove_file(&html_path)
            {
                warn!(
                    html = %html_path.display(),
                    error = %e,
                    "could not remove intermediate HTML"
                );
            }
            Ok(JobOutput::Pdf(output_path.to_path_buf()))
        }
        Err(BilingualError::RendererUnavailable(reason)) => {
            warn!(html = %html_path.display(), %reason, "no PDF renderer, keeping HTML");
            Ok(JobOutput::HtmlFallback {
                path: html_path,
                reason,
            })
        }
        Err(e) => Err(e),
    }
}

/// Run a single conversion job.
pub fn run_job(config: &JobConfig) -> crate::error::Result<JobResult> {
    config.merged.validate()?;
    let bytes = std::fs::read(&config.input_path)?;

    let reader = PdfReader::from_bytes(&bytes)?;
    let page_count = reader.page_count();
    let pages = match &config.pages {
        Some(pages) => pages.clone(),
        None => (1..=page_count).collect(),
    };
    reader.validate_pages(&pages)?;

    let pdfium = create_pdfium()?;
    let source = PdfiumSource::from_bytes(&pdfium, &bytes)?;

    let orchestrator = TranslationOrchestrator::new(
        Arc::clone(&config.translator),
        Arc::clone(&config.cache),
        OrchestratorConfig::from_settings(&config.merged.translation),
    )?;

    info!(
        input = %config.input_path.display(),
        pages = pages.len(),
        mode = ?config.merged.mode,
        "starting job"
    );

    let indices: Vec<u32> = pages.iter().map(|p| p - 1).collect();
    let document = translate_document(&source, &indices, &config.merged, &orchestrator);

    let renderer = HtmlRenderer::new(HtmlOptions::new(config.merged.mode, &config.merged.layout));
    let html = renderer.render(&document.pages)?;
    let output = write_output(&html, &config.output_path, &config.merged.renderer)?;

    Ok(JobResult {
        input_path: config.input_path.clone(),
        output,
        pages_processed: document.pages.len(),
        translation_errors: document.translation_errors,
        warnings: document.warnings,
    })
}
