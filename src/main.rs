use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use paper_bilingual::cache::store::TranslationCache;
use paper_bilingual::config::job::JobFile;
use paper_bilingual::config::merged::MergedConfig;
use paper_bilingual::config::{self};
use paper_bilingual::pipeline::job_runner::{JobConfig, JobOutput};
use paper_bilingual::pipeline::orchestrator::run_all_jobs;
use paper_bilingual::translate::Translator;
use paper_bilingual::translate::client::OpenAiTranslator;

/// Exit code when every job ran but at least one only produced HTML.
const EXIT_HTML_FALLBACK: u8 = 2;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: paper_bilingual <jobs.yaml>...");
        eprintln!("  Translate academic PDFs into bilingual documents according to job files.");
        eprintln!("  settings.yaml next to each job file is loaded automatically.");
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("paper_bilingual {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let mut job_configs: Vec<JobConfig> = Vec::new();
    // One cache for the whole run; keys include model and target language.
    let mut cache: Option<Arc<TranslationCache>> = None;

    for job_file_arg in &args {
        let job_file_path = Path::new(job_file_arg);

        // Load settings from the same directory as the job file.
        let settings = match config::load_settings_for_job(job_file_path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("ERROR: Failed to load settings for {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let yaml_content = match std::fs::read_to_string(job_file_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("ERROR: Failed to read job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let job_file: JobFile = match serde_yml::from_str(&yaml_content) {
            Ok(jf) => jf,
            Err(e) => {
                eprintln!("ERROR: Failed to parse job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let translator: Arc<dyn Translator> =
            match OpenAiTranslator::from_settings(&settings.translation) {
                Ok(t) => Arc::new(t),
                Err(e) => {
                    eprintln!("ERROR: {job_file_arg}: {e}");
                    return ExitCode::FAILURE;
                }
            };
        let cache = Arc::clone(cache.get_or_insert_with(|| {
            Arc::new(TranslationCache::new(settings.translation.cache_capacity))
        }));

        // Resolve job file directory for relative paths.
        let job_dir = job_file_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        for job in &job_file.jobs {
            let merged = MergedConfig::new(&settings, job);
            if let Err(e) = merged.validate() {
                eprintln!("ERROR: {job_file_arg}: job {}: {e}", job.input);
                return ExitCode::FAILURE;
            }
            job_configs.push(JobConfig {
                input_path: resolve_path(&job_dir, &job.input),
                output_path: resolve_path(&job_dir, &job.output),
                pages: job.pages.clone(),
                merged,
                translator: Arc::clone(&translator),
                cache: Arc::clone(&cache),
            });
        }
    }

    let results = run_all_jobs(&job_configs);

    let mut has_error = false;
    let mut has_fallback = false;
    for (job, result) in job_configs.iter().zip(&results) {
        match result {
            Ok(job_result) => {
                for failure in &job_result.translation_errors {
                    eprintln!("WARN: untranslated text {failure}");
                }
                match &job_result.output {
                    JobOutput::Pdf(path) => eprintln!(
                        "OK: {} -> {} ({} pages, {} translation errors)",
                        job_result.input_path.display(),
                        path.display(),
                        job_result.pages_processed,
                        job_result.translation_errors.len()
                    ),
                    JobOutput::HtmlFallback { path, reason } => {
                        eprintln!(
                            "ERROR: {} -> PDF not produced: {reason}",
                            job_result.input_path.display()
                        );
                        eprintln!(
                            "  The bilingual HTML was kept at {}; open it in a browser and print to PDF, \
                             or install Chromium and rerun.",
                            path.display()
                        );
                        has_fallback = true;
                    }
                }
            }
            Err(e) => {
                eprintln!(
                    "ERROR: {} -> {}: {e}",
                    job.input_path.display(),
                    job.output_path.display()
                );
                has_error = true;
            }
        }
    }

    if has_error {
        ExitCode::FAILURE
    } else if has_fallback {
        ExitCode::from(EXIT_HTML_FALLBACK)
    } else {
        ExitCode::SUCCESS
    }
}

/// Resolve a potentially relative path against a base directory.
/// If the path is already absolute, return it as-is.
fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}
