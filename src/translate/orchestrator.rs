// Batched, cached, retried translation over a bounded worker pool.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::chunk::split_into_chunks;
use super::retry::RetryPolicy;
use super::{Translator, system_prompt};
use crate::cache::hash::{CacheSettings, compute_cache_key};
use crate::cache::store::TranslationCache;
use crate::config::settings::TranslationSettings;
use crate::error::BilingualError;
use crate::layout::assembler::PageElements;

/// Maximum characters of source text quoted in a failure record.
const EXCERPT_CHARS: usize = 80;

/// One translation that fell back to source text.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationFailure {
    /// Start of the source text that could not be translated.
    pub excerpt: String,
    pub attempts: u32,
    pub message: String,
}

impl std::fmt::Display for TranslationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "after {} attempt(s): {} [{}]",
            self.attempts, self.message, self.excerpt
        )
    }
}

/// Result of translating one text.
#[derive(Debug, Clone)]
pub struct Translation {
    /// Translated text; source text for chunks that failed.
    pub text: String,
    pub from_cache: bool,
    pub failures: Vec<TranslationFailure>,
}

/// A pending translation.
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub text: String,
    pub is_caption: bool,
}

/// Batch outcome, in submission order.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub translations: Vec<String>,
    pub errors: Vec<TranslationFailure>,
}

/// Translated pages together with every failure met on the way.
#[derive(Debug, Clone)]
pub struct TranslationJobResult {
    pub translated_elements: Vec<PageElements>,
    pub errors: Vec<TranslationFailure>,
}

/// Orchestrator settings.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub workers: usize,
    pub chunk_chars: usize,
    pub retry: RetryPolicy,
    pub target_language: String,
}

impl OrchestratorConfig {
    pub fn from_settings(settings: &TranslationSettings) -> Self {
        OrchestratorConfig {
            workers: settings.workers,
            chunk_chars: settings.chunk_chars,
            retry: RetryPolicy {
                max_attempts: settings.max_attempts,
                base_delay: Duration::from_millis(settings.base_delay_ms),
                max_delay: Duration::from_millis(settings.max_delay_ms),
                jitter: settings.jitter,
            },
            target_language: settings.target_language.clone(),
        }
    }
}

pub struct TranslationOrchestrator {
    translator: Arc<dyn Translator>,
    cache: Arc<TranslationCache>,
    pool: rayon::ThreadPool,
    config: OrchestratorConfig,
    cache_settings: CacheSettings,
}

impl TranslationOrchestrator {
    pub fn new(
        translator: Arc<dyn Translator>,
        cache: Arc<TranslationCache>,
        config: OrchestratorConfig,
    ) -> crate::error::Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers.max(1))
            .thread_name(|i| format!("translate-{i}"))
            .build()
            .map_err(|e| BilingualError::config(format!("failed to start worker pool: {e}")))?;
        let cache_settings = CacheSettings {
            model: translator.name().to_string(),
            target_language: config.target_language.clone(),
        };
        Ok(Self {
            translator,
            cache,
            pool,
            config,
            cache_settings,
        })
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    fn cache_key(&self, text: &str, is_caption: bool) -> String {
        compute_cache_key(text, is_caption, &self.cache_settings)
    }

    /// Translate one text. Never fails: chunks that exhaust their retries
    /// keep their source text and are reported in `failures`.
    pub fn translate(&self, text: &str, is_caption: bool) -> Translation {
        if text.trim().is_empty() {
            return Translation {
                text: text.to_string(),
                from_cache: false,
                failures: Vec::new(),
            };
        }

        let key = self.cache_key(text, is_caption);
        if let Some(cached) = self.cache.get(&key) {
            debug!(key = %&key[..12], "translation cache hit");
            return Translation {
                text: cached,
                from_cache: true,
                failures: Vec::new(),
            };
        }

        let prompt = system_prompt(&self.config.target_language, is_caption);
        let chunks = split_into_chunks(text, self.config.chunk_chars);
        let mut translated = Vec::with_capacity(chunks.len());
        let mut failures = Vec::new();

        for chunk in &chunks {
            let result = self.config.retry.run("translate", |_| {
                self.translator.translate(chunk, &prompt)
            });
            match result {
                Ok(t) => translated.push(t),
                Err(exhausted) => {
                    warn!(
                        attempts = exhausted.attempts,
                        error = %exhausted.last_error,
                        "translation failed, keeping source text"
                    );
                    failures.push(TranslationFailure {
                        excerpt: excerpt(chunk),
                        attempts: exhausted.attempts,
                        message: exhausted.last_error.to_string(),
                    });
                    translated.push(chunk.clone());
                }
            }
        }

        let text = translated.join("\n");
        if failures.is_empty() {
            self.cache.insert(&key, text.clone());
        }
        Translation {
            text,
            from_cache: false,
            failures,
        }
    }

    /// Translate a batch on the worker pool.
    ///
    /// Identical requests are sent once; results come back in submission
    /// order regardless of completion order.
    pub fn translate_batch(&self, requests: &[TranslationRequest]) -> BatchResult {
        let mut unique: Vec<&TranslationRequest> = Vec::new();
        let mut slot_of_key: HashMap<String, usize> = HashMap::new();
        let slots: Vec<usize> = requests
            .iter()
            .map(|r| {
                let key = self.cache_key(&r.text, r.is_caption);
                *slot_of_key.entry(key).or_insert_with(|| {
                    unique.push(r);
                    unique.len() - 1
                })
            })
            .collect();

        let results: Vec<Translation> = self.pool.install(|| {
            unique
                .par_iter()
                .map(|r| self.translate(&r.text, r.is_caption))
                .collect()
        });

        let cached = results.iter().filter(|t| t.from_cache).count();
        let errors: Vec<TranslationFailure> =
            results.iter().flat_map(|t| t.failures.iter().cloned()).collect();
        info!(
            requests = requests.len(),
            unique = unique.len(),
            cached,
            failures = errors.len(),
            "translation batch finished"
        );

        BatchResult {
            translations: slots.into_iter().map(|i| results[i].text.clone()).collect(),
            errors,
        }
    }

    /// Translate every text and caption element of `pages` in one batch.
    pub fn translate_pages(&self, mut pages: Vec<PageElements>) -> TranslationJobResult {
        let requests: Vec<TranslationRequest> = pages
            .iter()
            .flat_map(|p| p.elements.iter())
            .filter_map(|e| {
                e.text().map(|t| TranslationRequest {
                    text: t.source.clone(),
                    is_caption: e.is_caption(),
                })
            })
            .collect();

        let batch = self.translate_batch(&requests);

        let mut translations = batch.translations.into_iter();
        for element in pages.iter_mut().flat_map(|p| p.elements.iter_mut()) {
            if let Some(text) = element.text_mut()
                && let Some(translated) = translations.next()
            {
                text.translated = Some(translated);
            }
        }

        TranslationJobResult {
            translated_elements: pages,
            errors: batch.errors,
        }
    }
}

fn excerpt(text: &str) -> String {
    let mut s: String = text.chars().take(EXCERPT_CHARS).collect();
    if text.chars().count() > EXCERPT_CHARS {
        s.push('…');
    }
    s
}
