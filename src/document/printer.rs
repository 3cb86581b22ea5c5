// HTML -> PDF via a headless Chromium/Chrome process.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::settings::RendererSettings;
use crate::error::BilingualError;
use crate::translate::retry::RetryPolicy;

/// Executable names looked up on `PATH`, in order.
const BROWSER_NAMES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
];

/// Install locations that are usually not on `PATH`.
const BROWSER_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Find a headless-capable browser.
///
/// An explicit `browser_path` must exist; otherwise `PATH` and the well-known
/// install locations are searched.
pub fn locate_browser(browser_path: Option<&Path>) -> crate::error::Result<PathBuf> {
    if let Some(path) = browser_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(BilingualError::renderer_unavailable(format!(
            "renderer.browser_path '{}' does not exist",
            path.display()
        )));
    }

    for name in BROWSER_NAMES {
        if let Ok(path) = which::which(name) {
            return Ok(path);
        }
    }
    for candidate in BROWSER_PATHS {
        let path = Path::new(candidate);
        if path.exists() {
            return Ok(path.to_path_buf());
        }
    }

    Err(BilingualError::renderer_unavailable(
        "no Chromium or Google Chrome found; install one or set renderer.browser_path in settings.yaml",
    ))
}

pub struct BrowserPrinter {
    browser: PathBuf,
    timeout: Duration,
    retry: RetryPolicy,
}

impl BrowserPrinter {
    pub fn new(browser: PathBuf, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            browser,
            timeout,
            retry,
        }
    }

    pub fn from_settings(settings: &RendererSettings) -> crate::error::Result<Self> {
        let browser = locate_browser(settings.browser_path.as_deref())?;
        let retry = RetryPolicy {
            max_attempts: settings.max_attempts,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            jitter: 0.1,
        };
        Ok(Self::new(
            browser,
            Duration::from_secs(settings.timeout_secs),
            retry,
        ))
    }

    /// Print `html_path` to `pdf_path`, retrying transient failures.
    pub fn print(&self, html_path: &Path, pdf_path: &Path) -> crate::error::Result<()> {
        let html_abs = std::fs::canonicalize(html_path)?;
        self.retry
            .run("print", |attempt| {
                debug!(attempt, browser = %self.browser.display(), "printing HTML to PDF");
                self.print_once(&html_abs, pdf_path)
            })
            .map_err(|exhausted| exhausted.last_error)?;
        info!(output = %pdf_path.display(), "PDF written");
        Ok(())
    }

    fn print_once(&self, html_abs: &Path, pdf_path: &Path) -> crate::error::Result<()> {
        let mut cmd = Command::new(&self.browser);
        if cfg!(target_os = "linux") {
            cmd.arg("--no-sandbox");
        }
        cmd.arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-pdf-header-footer")
            .arg(format!("--print-to-pdf={}", pdf_path.display()))
            .arg(format!("file://{}", html_abs.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BilingualError::renderer_unavailable(format!(
                    "failed to execute {}: {e}",
                    self.browser.display()
                ))
            } else {
                BilingualError::print(format!("failed to execute {}: {e}", self.browser.display()))
            }
        })?;

        // Drain both pipes on their own threads so a chatty browser cannot block.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break Some(status);
            }
            if started.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                break None;
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        let stderr_text = stderr
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        let _ = stdout.and_then(|h| h.join().ok());

        match status {
            None => Err(BilingualError::print(format!(
                "browser timed out after {}s: {}",
                self.timeout.as_secs(),
                stderr_text.trim()
            ))),
            Some(status) if !status.success() => Err(BilingualError::print(format!(
                "browser failed (exit code {}): {}",
                status
                    .code()
                    .map_or_else(|| "unknown".to_string(), |c| c.to_string()),
                stderr_text.trim()
            ))),
            Some(_) if !pdf_path.exists() => Err(BilingualError::print(format!(
                "browser exited successfully but produced no PDF: {}",
                stderr_text.trim()
            ))),
            Some(_) => Ok(()),
        }
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}
