// E2E integration tests
//
// End-to-end tests over real PDFs: lopdf writes the input, pdfium extracts and
// renders it, a mock translator stands in for the network and the renderer is
// forced into its HTML fallback. Tests skip when pdfium is not configured.

mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::{Behavior, MockTranslator};
use lopdf::{Document, Object, Stream, dictionary};
use paper_bilingual::cache::store::TranslationCache;
use paper_bilingual::config::job::RenderMode;
use paper_bilingual::config::merged::MergedConfig;
use paper_bilingual::config::settings::Settings;
use paper_bilingual::pdf::source::PageSource;
use paper_bilingual::pipeline::job_runner::{JobConfig, JobOutput, run_job};
use paper_bilingual::pipeline::orchestrator::run_all_jobs;
use paper_bilingual::render::pdfium::{PdfiumSource, create_pdfium};

// ============================================================
// Guards and helpers
// ============================================================

/// Check whether pdfium is available via environment variable.
fn pdfium_available() -> bool {
    std::env::var("PDFIUM_DYNAMIC_LIB_PATH").is_ok()
}

const LINES: &[&str] = &[
    "We measure the polarization state of transmitted light",
    "and compare it with the prediction of the Jones calculus.",
];

/// Create a 1-page Letter PDF with two lines of Helvetica text near the top.
fn create_text_pdf(path: &Path) {
    let mut doc = Document::with_version("1.4");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut content = String::from("BT\n/F1 12 Tf\n72 700 Td\n14 TL\n");
    for line in LINES {
        content.push_str(&format!("({line}) Tj\nT*\n"));
    }
    content.push_str("ET\n");
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(path).expect("failed to save test PDF");
}

fn job_config(input: PathBuf, output: PathBuf, translator: Arc<MockTranslator>) -> JobConfig {
    let settings = Settings::from_yaml(
        "mode: pure_flow\nrenderer:\n  browser_path: /nonexistent/chromium\n",
    )
    .expect("settings");
    let job = serde_yml::from_str("input: in.pdf\noutput: out.pdf\n").expect("job");
    JobConfig {
        input_path: input,
        output_path: output,
        pages: None,
        merged: MergedConfig::new(&settings, &job),
        translator,
        cache: Arc::new(TranslationCache::new(64)),
    }
}

// ============================================================
// 1. pdfium extraction
// ============================================================

#[test]
fn test_pdfium_source_extracts_blocks() {
    if !pdfium_available() {
        eprintln!("skipping: PDFIUM_DYNAMIC_LIB_PATH not set");
        return;
    }
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("paper.pdf");
    create_text_pdf(&input);

    let bytes = std::fs::read(&input).expect("read PDF");
    let pdfium = create_pdfium().expect("pdfium");
    let source = PdfiumSource::from_bytes(&pdfium, &bytes).expect("load");
    assert_eq!(source.page_count(), 1);

    let page = source.page(0).expect("page");
    assert_eq!((page.width, page.height), (612.0, 792.0));
    assert!(!page.blocks.is_empty());
    let all_text: String = page
        .blocks
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    assert!(all_text.contains("polarization"), "got {all_text:?}");
    // 上端原点: テキストはページ上部 (y < 150)
    assert!(page.blocks.iter().all(|b| b.rect.y0 < 150.0));

    let shot = source.render_page(0, 1.0).expect("render");
    assert_eq!((shot.width(), shot.height()), (612, 792));
}

// ============================================================
// 2. run_job with HTML fallback
// ============================================================

#[test]
fn test_run_job_produces_translated_html_fallback() {
    if !pdfium_available() {
        eprintln!("skipping: PDFIUM_DYNAMIC_LIB_PATH not set");
        return;
    }
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("paper.pdf");
    let output = dir.path().join("paper_zh.pdf");
    create_text_pdf(&input);
    let translator = Arc::new(MockTranslator::new(Behavior::Prefix("[zh] ")));

    let result = run_job(&job_config(input, output, Arc::clone(&translator)))
        .expect("job completes");

    assert_eq!(result.pages_processed, 1);
    assert!(result.translation_errors.is_empty());
    let JobOutput::HtmlFallback { path, .. } = &result.output else {
        panic!("expected HTML fallback, got {:?}", result.output);
    };
    let html = std::fs::read_to_string(path).expect("html");
    assert!(html.contains("[zh] "), "translation missing from HTML");
    assert!(html.contains("polarization"));
    assert!(translator.calls() >= 1);
}

#[test]
fn test_run_job_rejects_out_of_range_pages() {
    // ページ検証は pdfium の読み込みより前に行われる
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("paper.pdf");
    create_text_pdf(&input);
    let mut config = job_config(
        input,
        dir.path().join("out.pdf"),
        Arc::new(MockTranslator::new(Behavior::Prefix(""))),
    );
    config.pages = Some(vec![3]);

    let err = run_job(&config).expect_err("page 3 does not exist");
    assert!(err.to_string().contains("out of range"), "{err}");
}

#[test]
fn test_run_job_rejects_invalid_layout_override() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("paper.pdf");
    create_text_pdf(&input);
    let mut config = job_config(
        input,
        dir.path().join("out.pdf"),
        Arc::new(MockTranslator::new(Behavior::Prefix(""))),
    );
    config.merged.layout.min_gap_height = 0.0;

    let err = run_job(&config).expect_err("zero gap floor");
    assert!(err.to_string().contains("min_gap_height"), "{err}");
}

// ============================================================
// 3. run_all_jobs isolates failures
// ============================================================

#[test]
fn test_run_all_jobs_continues_after_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let translator = Arc::new(MockTranslator::new(Behavior::Prefix("[zh] ")));
    let missing = job_config(
        dir.path().join("missing.pdf"),
        dir.path().join("a.pdf"),
        Arc::clone(&translator),
    );
    let not_pdf_path = dir.path().join("notes.pdf");
    std::fs::write(&not_pdf_path, b"plain text").expect("write");
    let not_pdf = job_config(not_pdf_path, dir.path().join("b.pdf"), Arc::clone(&translator));

    let results = run_all_jobs(&[missing, not_pdf]);

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(Result::is_err));
    assert_eq!(translator.calls(), 0);
}

#[test]
fn test_screenshot_mode_is_default() {
    let config = job_config(
        PathBuf::from("in.pdf"),
        PathBuf::from("out.pdf"),
        Arc::new(MockTranslator::new(Behavior::Prefix(""))),
    );
    // job_config は pure_flow を明示している
    assert_eq!(config.merged.mode, RenderMode::PureFlow);
    assert_eq!(Settings::default().mode, RenderMode::ScreenshotCompare);
}
