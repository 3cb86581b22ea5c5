use thiserror::Error;

#[derive(Debug, Error)]
pub enum BilingualError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("PDF read error: {0}")]
    PdfReadError(String),

    #[error("Extraction error: {0}")]
    ExtractionError(String),

    #[error("Raster error: {0}")]
    RasterError(String),

    #[error("Translation error: {0}")]
    TranslationError(String),

    #[error("Print error: {0}")]
    PrintError(String),

    #[error("No HTML-to-PDF renderer available: {0}")]
    RendererUnavailable(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`BilingualError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl BilingualError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a configuration error.
    config => ConfigError,
    /// Create a PDF read error.
    pdf_read => PdfReadError,
    /// Create an extraction error (malformed page, degenerate rectangle).
    extraction => ExtractionError,
    /// Create a raster error.
    raster => RasterError,
    /// Create a translation error.
    translation => TranslationError,
    /// Create a print error.
    print => PrintError,
    /// Create a renderer-unavailable error.
    renderer_unavailable => RendererUnavailable,
}

impl BilingualError {
    /// Whether retrying the failed operation could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::ConfigError(_) | Self::RendererUnavailable(_) | Self::PdfReadError(_)
        )
    }
}

impl From<lopdf::Error> for BilingualError {
    fn from(e: lopdf::Error) -> Self {
        Self::PdfReadError(e.to_string())
    }
}

impl From<serde_json::Error> for BilingualError {
    fn from(e: serde_json::Error) -> Self {
        Self::TranslationError(e.to_string())
    }
}

impl From<serde_yml::Error> for BilingualError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<pdfium_render::prelude::PdfiumError> for BilingualError {
    fn from(e: pdfium_render::prelude::PdfiumError) -> Self {
        Self::ExtractionError(e.to_string())
    }
}

impl From<image::ImageError> for BilingualError {
    fn from(e: image::ImageError) -> Self {
        Self::RasterError(e.to_string())
    }
}

impl From<reqwest::Error> for BilingualError {
    fn from(e: reqwest::Error) -> Self {
        Self::TranslationError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BilingualError>;
