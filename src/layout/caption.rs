// Caption and header/footer predicates.

use super::Rect;

const LATIN_PREFIXES: &[&str] = &["figure", "fig.", "fig", "table", "tab.", "tab"];
const CJK_PREFIXES: &[&str] = &["图", "表"];

/// Whether `text` opens like a figure or table caption.
///
/// Accepts `Fig.`, `Figure`, `Tab.`, `Table` (any case) and `图`/`表`, each
/// followed by optional whitespace and a digit, e.g. `"Figure 1: ..."`,
/// `"FIG. 3."`, `"Tab.2"`, `"图 4："`.
pub fn is_caption(text: &str) -> bool {
    let trimmed = text.trim_start();
    let lower = trimmed.to_lowercase();

    for prefix in LATIN_PREFIXES.iter().chain(CJK_PREFIXES) {
        if let Some(rest) = lower.strip_prefix(prefix)
            && rest.trim_start().starts_with(|c: char| c.is_ascii_digit())
        {
            return true;
        }
    }
    false
}

/// Whether `rect` sits in the header or footer band of a page.
///
/// The band is a fraction of the page height (0.06 by default), so the test
/// scales with the page size: the rectangle's top edge inside the top band or
/// its bottom edge inside the bottom band.
pub fn is_header_or_footer(rect: &Rect, page_height: f32, band: f32) -> bool {
    let top_limit = page_height * band;
    let bottom_limit = page_height * (1.0 - band);
    rect.y0 < top_limit || rect.y1 > bottom_limit
}
