//! Translation: the external translation capability and its orchestration.

pub mod chunk;
pub mod client;
pub mod orchestrator;
pub mod retry;

/// A text-to-text translation backend.
///
/// Implementations are shared across worker threads.
pub trait Translator: Send + Sync {
    /// Short identifier used in logs and cache keys.
    fn name(&self) -> &str;

    /// Translate `text` following `system_prompt`.
    fn translate(&self, text: &str, system_prompt: &str) -> crate::error::Result<String>;
}

/// Instruction sent with every request.
pub fn system_prompt(target_language: &str, is_caption: bool) -> String {
    let base = format!(
        "You are a professional translator of optics and physics papers. \
         Translate the user's text into natural, idiomatic {target_language}. \
         Keep every formula as LaTeX, inline as $...$ and display as $$...$$. \
         Text extracted from PDF may contain broken formula fragments such as \
         scattered matrix entries or subscripts; reconstruct them as LaTeX when \
         the intent is clear. Reply with the translation only, no commentary."
    );
    if is_caption {
        format!(
            "{base} The text is a figure or table caption: keep the figure or \
             table number and keep it concise."
        )
    } else {
        base
    }
}
