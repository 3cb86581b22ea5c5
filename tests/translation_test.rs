// 翻訳オーケストレーションのテスト: キャッシュ・リトライ・重複排除・分割

mod common;

use std::sync::Arc;

use common::{Behavior, MockTranslator};
use paper_bilingual::cache::hash::{CacheSettings, compute_cache_key};
use paper_bilingual::cache::store::TranslationCache;
use paper_bilingual::translate::chunk::split_into_chunks;
use paper_bilingual::translate::orchestrator::{
    OrchestratorConfig, TranslationOrchestrator, TranslationRequest,
};
use paper_bilingual::translate::retry::RetryPolicy;
use paper_bilingual::translate::system_prompt;

fn orchestrator_with(
    translator: Arc<MockTranslator>,
    cache: Arc<TranslationCache>,
    max_attempts: u32,
    chunk_chars: usize,
) -> TranslationOrchestrator {
    TranslationOrchestrator::new(
        translator,
        cache,
        OrchestratorConfig {
            workers: 4,
            chunk_chars,
            retry: RetryPolicy::immediate(max_attempts),
            target_language: "Chinese".to_string(),
        },
    )
    .expect("orchestrator")
}

fn orchestrator(translator: Arc<MockTranslator>, max_attempts: u32) -> TranslationOrchestrator {
    orchestrator_with(
        translator,
        Arc::new(TranslationCache::new(128)),
        max_attempts,
        2500,
    )
}

// ============================================================
// 1. キャッシュの冪等性
// ============================================================

#[test]
fn test_second_translation_is_cache_hit() {
    let translator = Arc::new(MockTranslator::new(Behavior::Prefix("[zh] ")));
    let orch = orchestrator(Arc::clone(&translator), 3);

    let first = orch.translate("The beam is linearly polarized.", false);
    let second = orch.translate("The beam is linearly polarized.", false);

    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(first.text, second.text);
    assert_eq!(translator.calls(), 1, "no duplicate network call");
    assert_eq!(orch.cache().hits(), 1);
}

#[test]
fn test_whitespace_variants_share_cache_entry() {
    let translator = Arc::new(MockTranslator::new(Behavior::Prefix("[zh] ")));
    let orch = orchestrator(Arc::clone(&translator), 3);

    orch.translate("The beam is\nlinearly   polarized.", false);
    let again = orch.translate("  The beam is linearly polarized. ", false);

    assert!(again.from_cache);
    assert_eq!(translator.calls(), 1);
}

#[test]
fn test_caption_flag_is_part_of_cache_key() {
    let translator = Arc::new(MockTranslator::new(Behavior::Prefix("[zh] ")));
    let orch = orchestrator(Arc::clone(&translator), 3);

    orch.translate("Figure 2: Setup.", false);
    let caption = orch.translate("Figure 2: Setup.", true);

    assert!(!caption.from_cache);
    assert_eq!(translator.calls(), 2);
}

#[test]
fn test_cache_shared_between_orchestrators() {
    let cache = Arc::new(TranslationCache::new(16));
    let first = Arc::new(MockTranslator::new(Behavior::Prefix("[zh] ")));
    let second = Arc::new(MockTranslator::new(Behavior::Prefix("[zh] ")));

    orchestrator_with(Arc::clone(&first), Arc::clone(&cache), 3, 2500)
        .translate("Quarter-wave plate.", false);
    let hit = orchestrator_with(Arc::clone(&second), Arc::clone(&cache), 3, 2500)
        .translate("Quarter-wave plate.", false);

    assert!(hit.from_cache);
    assert_eq!(second.calls(), 0);
}

#[test]
fn test_cache_key_depends_on_target_language() {
    let zh = CacheSettings {
        model: "deepseek-chat".to_string(),
        target_language: "Chinese".to_string(),
    };
    let ja = CacheSettings {
        target_language: "Japanese".to_string(),
        ..zh.clone()
    };
    assert_ne!(
        compute_cache_key("Phase shift", false, &zh),
        compute_cache_key("Phase shift", false, &ja)
    );
}

// ============================================================
// 2. リトライ上限
// ============================================================

#[test]
fn test_always_failing_call_retried_exactly_limit() {
    let translator = Arc::new(MockTranslator::new(Behavior::AlwaysFail));
    let orch = orchestrator(Arc::clone(&translator), 3);

    let result = orch.translate("Malus's law holds.", false);

    assert_eq!(translator.calls(), 3, "attempts must equal the retry limit");
    assert_eq!(result.text, "Malus's law holds.", "falls back to source");
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].attempts, 3);
    assert!(!orch.cache().contains(&compute_cache_key(
        "Malus's law holds.",
        false,
        &CacheSettings {
            model: "mock-model".to_string(),
            target_language: "Chinese".to_string(),
        }
    )));
}

#[test]
fn test_transient_failure_recovers() {
    let translator = Arc::new(MockTranslator::new(Behavior::FailFirst(2, "[zh] ")));
    let orch = orchestrator(Arc::clone(&translator), 3);

    let result = orch.translate("Brewster angle.", false);

    assert_eq!(result.text, "[zh] Brewster angle.");
    assert!(result.failures.is_empty());
    assert_eq!(translator.calls(), 3);
}

#[test]
fn test_auth_failure_is_not_retried() {
    let translator = Arc::new(MockTranslator::new(Behavior::Unauthorized));
    let orch = orchestrator(Arc::clone(&translator), 5);

    let result = orch.translate("Fresnel equations.", false);

    assert_eq!(translator.calls(), 1);
    assert_eq!(result.text, "Fresnel equations.");
    assert_eq!(result.failures[0].attempts, 1);
}

#[test]
fn test_retry_policy_backoff_is_capped() {
    let policy = RetryPolicy {
        max_attempts: 10,
        base_delay: std::time::Duration::from_millis(100),
        max_delay: std::time::Duration::from_millis(1000),
        jitter: 0.0,
    };
    assert_eq!(policy.backoff(1).as_millis(), 100);
    assert_eq!(policy.backoff(3).as_millis(), 400);
    assert_eq!(policy.backoff(9).as_millis(), 1000);
}

// ============================================================
// 3. バッチ: 重複排除と順序保持
// ============================================================

#[test]
fn test_batch_deduplicates_and_preserves_order() {
    let translator = Arc::new(MockTranslator::new(Behavior::Prefix("[zh] ")));
    let orch = orchestrator(Arc::clone(&translator), 3);
    let texts = ["alpha text", "beta text", "alpha text", "gamma text", "beta text"];
    let requests: Vec<TranslationRequest> = texts
        .iter()
        .map(|t| TranslationRequest {
            text: t.to_string(),
            is_caption: false,
        })
        .collect();

    let batch = orch.translate_batch(&requests);

    let expected: Vec<String> = texts.iter().map(|t| format!("[zh] {t}")).collect();
    assert_eq!(batch.translations, expected);
    assert!(batch.errors.is_empty());
    assert_eq!(translator.calls(), 3);
}

#[test]
fn test_batch_collects_every_failure() {
    let translator = Arc::new(MockTranslator::new(Behavior::AlwaysFail));
    let orch = orchestrator(Arc::clone(&translator), 2);
    let requests = vec![
        TranslationRequest {
            text: "first".to_string(),
            is_caption: false,
        },
        TranslationRequest {
            text: "Figure 1: second".to_string(),
            is_caption: true,
        },
    ];

    let batch = orch.translate_batch(&requests);

    assert_eq!(batch.translations, vec!["first", "Figure 1: second"]);
    assert_eq!(batch.errors.len(), 2);
    assert_eq!(translator.calls(), 4);
}

// ============================================================
// 4. 長文の分割
// ============================================================

#[test]
fn test_long_text_is_sent_in_chunks() {
    let translator = Arc::new(MockTranslator::new(Behavior::Prefix("")));
    let orch = orchestrator_with(
        Arc::clone(&translator),
        Arc::new(TranslationCache::new(16)),
        3,
        120,
    );
    let sentence = "The retarder introduces a phase delay between the two eigenmodes.";
    let text = [sentence; 6].join(" ");

    let result = orch.translate(&text, false);

    assert!(translator.calls() > 1);
    assert!(translator.inputs().iter().all(|c| c.chars().count() <= 120));
    assert_eq!(
        result.text.split_whitespace().collect::<Vec<_>>(),
        text.split_whitespace().collect::<Vec<_>>()
    );
}

#[test]
fn test_split_prefers_paragraph_boundaries() {
    let text = "First paragraph line.\n\nSecond paragraph line.";
    let chunks = split_into_chunks(text, 25);
    assert_eq!(chunks, vec!["First paragraph line.", "Second paragraph line."]);
}

#[test]
fn test_split_hard_cuts_unbroken_text() {
    let text = "x".repeat(250);
    let chunks = split_into_chunks(&text, 100);
    assert_eq!(chunks.len(), 3);
    assert!(chunks.iter().all(|c| c.chars().count() <= 100));
}

#[test]
fn test_split_short_text_untouched() {
    assert_eq!(split_into_chunks("  short  ", 100), vec!["short"]);
    assert!(split_into_chunks("   ", 100).is_empty());
}

// ============================================================
// 5. システムプロンプト
// ============================================================

#[test]
fn test_system_prompt_mentions_target_and_caption() {
    let body = system_prompt("Japanese", false);
    let caption = system_prompt("Japanese", true);
    assert!(body.contains("Japanese"));
    assert!(body.contains("LaTeX"));
    assert!(caption.contains("caption"));
    assert!(!body.contains("caption"));
}
