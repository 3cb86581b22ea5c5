// ページ単位処理: ブロック抽出 → ノイズ除去 → 空白帯検出 → 図判定 → 要素列組立

use tracing::{debug, warn};

use crate::config::settings::LayoutSettings;
use crate::layout::assembler::{ImageElement, PageElements, assemble};
use crate::layout::caption::{is_caption, is_header_or_footer};
use crate::layout::classifier::{RegionClassifier, Verdict};
use crate::layout::regions::{GapRegion, RegionParams, extract_gap_regions, whole_page_region};
use crate::layout::{TextBlock, is_noise_block};
use crate::pdf::source::PageSource;

/// Layout parameters needed to reconstruct one page.
#[derive(Debug, Clone, Copy)]
pub struct PageParams {
    pub regions: RegionParams,
    pub paragraph_gap: f32,
    pub min_block_chars: usize,
    pub probe_zoom: f32,
    pub image_zoom: f32,
}

impl PageParams {
    pub fn from_layout(layout: &LayoutSettings) -> Self {
        PageParams {
            regions: RegionParams {
                min_gap_height: layout.min_gap_height,
                side_margin: layout.side_margin,
                header_band: layout.header_band,
                merge_tolerance: layout.interval_merge_tolerance,
            },
            paragraph_gap: layout.paragraph_gap,
            min_block_chars: layout.min_block_chars,
            probe_zoom: layout.probe_zoom,
            image_zoom: layout.image_zoom,
        }
    }
}

/// Reconstruct the element stream of one page.
///
/// Runs synchronously. Region-level failures (degenerate rectangles, raster
/// errors) skip the region and are recorded as page warnings; only a failure
/// to read the page itself is returned as `Err`.
pub fn process_page(
    source: &dyn PageSource,
    page_index: u32,
    params: &PageParams,
    classifier: &RegionClassifier,
) -> crate::error::Result<PageElements> {
    let page = source.page(page_index)?;
    let page_num = page_index + 1;
    let mut warnings = Vec::new();

    let mut body: Vec<TextBlock> = Vec::new();
    let mut captions: Vec<TextBlock> = Vec::new();
    let mut excluded = 0usize;
    for block in page.sorted_blocks() {
        if is_header_or_footer(&block.rect, page.height, params.regions.header_band)
            || is_noise_block(&block.text, params.min_block_chars)
        {
            excluded += 1;
            continue;
        }
        if is_caption(&block.text) {
            captions.push(block);
        } else {
            body.push(block);
        }
    }

    // Captions occupy vertical space like any other text.
    let occupied: Vec<TextBlock> = body.iter().chain(captions.iter()).cloned().collect();
    let gaps: Vec<GapRegion> = if occupied.is_empty() {
        warnings.push(format!(
            "page {page_num}: no extractable text; treated as a single image candidate"
        ));
        whole_page_region(page.width, page.height, &params.regions)
            .into_iter()
            .collect()
    } else {
        extract_gap_regions(&occupied, page.width, page.height, &params.regions)
    };

    debug!(
        page = page_num,
        blocks = page.blocks.len(),
        excluded,
        body = body.len(),
        captions = captions.len(),
        gaps = gaps.len(),
        "extracted page layout"
    );

    let mut images = Vec::new();
    for gap in &gaps {
        let classification = match classifier.classify(source, page_index, gap, params.probe_zoom) {
            Ok(c) => c,
            Err(e) => {
                warn!(page = page_num, error = %e, "skipping gap region");
                warnings.push(format!("page {page_num}: skipped region: {e}"));
                continue;
            }
        };

        match classification.verdict {
            Verdict::Image => match source.render_region(page_index, &gap.rect, params.image_zoom)
            {
                Ok(raster) => images.push(ImageElement {
                    rect: gap.rect,
                    raster,
                    score: classification.score,
                }),
                Err(e) => {
                    warn!(page = page_num, error = %e, "failed to crop accepted region");
                    warnings.push(format!("page {page_num}: failed to crop figure: {e}"));
                }
            },
            Verdict::Rejected => {
                // Leftover text (typically a broken formula) goes back into the
                // paragraph flow so the translator can rebuild it.
                if !classification.text.is_empty() {
                    body.push(TextBlock::new(gap.rect, classification.text));
                }
            }
        }
    }

    let elements = assemble(body, captions, images, params.paragraph_gap);

    Ok(PageElements {
        page_index,
        width: page.width,
        height: page.height,
        elements,
        warnings,
    })
}
