// SHA-256（正規化テキスト + 図注フラグ + 翻訳設定）
//
// Computes a translation cache key from normalised source text, the caption
// flag and the settings that change the translation result. The key is a
// SHA-256 hash encoded as a lowercase hexadecimal string.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

/// 翻訳結果に影響する設定パラメータ。
///
/// キャッシュキー計算時にハッシュに含める設定値のみを保持する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub model: String,
    pub target_language: String,
}

/// 設定を正規化JSON形式に変換する（キーはアルファベット順で固定）。
fn settings_to_canonical_json(settings: &CacheSettings) -> String {
    let mut map = BTreeMap::new();
    map.insert("model", settings.model.as_str());
    map.insert("target_language", settings.target_language.as_str());
    serde_json::to_string(&map).unwrap_or_default()
}

/// Collapse every whitespace run to a single space and trim the ends.
///
/// Line breaks inside extracted blocks depend on the column width, not on the
/// content, so they must not split cache entries.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 正規化テキストと図注フラグからキャッシュキー（SHA-256ハッシュ）を計算する。
///
/// ハッシュ入力: `caption_flag || 0x00 || settings_canonical_json || 0x00 || normalized_text`
pub fn compute_cache_key(text: &str, is_caption: bool, settings: &CacheSettings) -> String {
    let mut hasher = Sha256::new();
    hasher.update([u8::from(is_caption), 0]);
    hasher.update(settings_to_canonical_json(settings).as_bytes());
    hasher.update([0]);
    hasher.update(normalize_text(text).as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_json_is_sorted_by_key() {
        let settings = CacheSettings {
            model: "deepseek-chat".to_string(),
            target_language: "Chinese".to_string(),
        };

        assert_eq!(
            settings_to_canonical_json(&settings),
            "{\"model\":\"deepseek-chat\",\"target_language\":\"Chinese\"}"
        );
    }

    #[test]
    fn test_normalize_text_collapses_whitespace() {
        assert_eq!(normalize_text("  a\n b\t\tc  "), "a b c");
    }
}
