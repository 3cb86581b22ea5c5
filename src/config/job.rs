use serde::Deserialize;

/// Output layout of the generated document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Original page raster on the left, translated text column on the right.
    #[default]
    ScreenshotCompare,
    /// Single translated column with inline figures.
    PureFlow,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub input: String,
    pub output: String,
    /// 1-based page numbers; `None` means every page.
    #[serde(default, deserialize_with = "deserialize_pages")]
    pub pages: Option<Vec<u32>>,
    pub mode: Option<RenderMode>,
    pub font_size: Option<f32>,
    pub line_height: Option<f32>,
    pub min_gap_height: Option<f32>,
}

/// ページ範囲文字列をパースしてページ番号のベクタに変換する。
///
/// 形式:
/// - 単一ページ: `"5"`
/// - 範囲: `"5-10"` (5, 6, 7, 8, 9, 10)
/// - 混合（カンマ区切り）: `"1, 3, 5-10, 15"`
///
/// 結果はソート済み・重複なし。ページ番号は1始まり。
pub fn parse_page_range(s: &str) -> crate::error::Result<Vec<u32>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(crate::error::BilingualError::config(
            "Page range cannot be empty",
        ));
    }

    let mut pages = Vec::new();

    for part in trimmed.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start_str, end_str)) = part.split_once('-') {
            let start = parse_page_number(start_str)?;
            let end = parse_page_number(end_str)?;

            if start > end {
                return Err(crate::error::BilingualError::config(format!(
                    "Invalid page range: start ({start}) > end ({end})"
                )));
            }

            pages.extend(start..=end);
        } else {
            pages.push(parse_page_number(part)?);
        }
    }

    if pages.is_empty() {
        return Err(crate::error::BilingualError::config(
            "Page range resolved to empty set",
        ));
    }

    pages.sort();
    pages.dedup();
    Ok(pages)
}

fn parse_page_number(s: &str) -> crate::error::Result<u32> {
    let page: u32 = s.trim().parse().map_err(|_| {
        crate::error::BilingualError::config(format!("Invalid page number: '{}'", s.trim()))
    })?;
    if page == 0 {
        return Err(crate::error::BilingualError::config(
            "Page numbers are 1-indexed; 0 is not a valid page",
        ));
    }
    Ok(page)
}

/// serdeのdeserialize_withで使用するページ範囲デシリアライザ
fn deserialize_pages<'de, D>(deserializer: D) -> Result<Option<Vec<u32>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PagesValue {
        Number(u32),
        Text(String),
    }

    let value = Option::<PagesValue>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(PagesValue::Number(n)) => parse_page_range(&n.to_string())
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(PagesValue::Text(s)) => parse_page_range(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
