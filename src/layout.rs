use crate::glyphs::{GlyphIndex, normalize_key};
use crate::report::{GlyphCoverageReport, OverflowReport};
use crate::types::{Mm, Size};

/// Everything the layout pass needs to know, frozen for one run. Changing
/// any field means a full re-layout; there is no incremental path.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Full page size, orientation already applied.
    pub page: Size,
    pub glyph_height: Mm,
    pub char_spacing: Mm,
    pub space_width: Mm,
    pub line_gap: Mm,
    pub margin_left: Mm,
    pub margin_top: Mm,
    /// Bottom strip reserved for the footer line; content never enters it.
    pub footer_margin: Mm,
    /// Paper label shown in the footer ("A1", "A4", ...).
    pub paper_label: String,
    pub footer_text: String,
}

impl LayoutConfig {
    /// Width available to a line: the page minus the left margin on both
    /// sides (the sheet is trimmed symmetrically).
    pub fn content_width(&self) -> Mm {
        self.page.width - self.margin_left * 2
    }

    /// Vertical distance consumed by one line: the glyph row plus the gap
    /// above the separator rule and the gap below it.
    pub fn line_advance(&self) -> Mm {
        self.glyph_height + self.line_gap * 2
    }

    /// Lowest y (from the page top) a line may extend to before it would
    /// intrude into the footer reservation.
    pub fn content_floor(&self) -> Mm {
        self.page.height - self.footer_margin
    }

    pub fn footer_string(&self, page_number: usize) -> String {
        format!(
            "Page {} — {} — {}.NCC",
            page_number, self.paper_label, self.footer_text
        )
    }
}

/// One glyph cell positioned on a page. Coordinates are millimetres from
/// the page's top-left corner; `y` is the top edge of the glyph box.
/// Spaces produce no placement, they only advance the cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub line_index: usize,
    pub ch: char,
    pub x: Mm,
    pub y: Mm,
    pub width: Mm,
    pub height: Mm,
    pub has_asset: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinePlan {
    /// Index of the line in the input order, across all pages.
    pub index: usize,
    pub text: String,
    pub total_width: Mm,
    pub placements: Vec<Placement>,
    /// y of the horizontal separator rule drawn under this line.
    pub separator_y: Mm,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    /// 1-based.
    pub number: usize,
    pub footer: String,
    pub lines: Vec<LinePlan>,
}

/// Complete result of one layout run: page-partitioned placements plus the
/// structured diagnostics callers surface to the user. Identical inputs and
/// an unchanged glyph snapshot produce an identical plan.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPlan {
    pub pages: Vec<PagePlan>,
    pub missing: GlyphCoverageReport,
    pub overflow: OverflowReport,
}

impl LayoutPlan {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn line_count(&self) -> usize {
        self.pages.iter().map(|p| p.lines.len()).sum()
    }
}

/// Total rendered width of `line`, recording fallback characters into
/// `missing`. A glyph is followed by one character-spacing gap unless its
/// successor is a literal space (the space itself supplies the separation);
/// the last glyph of a line keeps its trailing gap.
fn measure_line(
    line: &str,
    config: &LayoutConfig,
    index: &GlyphIndex,
    missing: &mut GlyphCoverageReport,
) -> Mm {
    let chars: Vec<char> = line.chars().collect();
    let mut total = Mm::ZERO;
    for (i, &ch) in chars.iter().enumerate() {
        if ch == ' ' {
            total += config.space_width;
            continue;
        }
        let (width, has_asset) = index.resolve_width(ch, config.glyph_height);
        if !has_asset {
            missing.record_missing(ch, normalize_key(ch));
        }
        total += width;
        let next_is_space = chars.get(i + 1) == Some(&' ');
        if !next_is_space {
            total += config.char_spacing;
        }
    }
    total
}

/// Lays out `lines` across as many pages as needed. Lines are atomic: a
/// line is never wrapped or split across pages, and a line wider than the
/// content area is still placed in full (it is reported in `overflow`, not
/// truncated). Page breaks trigger on vertical exhaustion only.
pub fn layout(lines: &[String], config: &LayoutConfig, index: &GlyphIndex) -> LayoutPlan {
    let mut missing = GlyphCoverageReport::default();
    let mut overflow = OverflowReport::new();
    let mut pages: Vec<PagePlan> = Vec::new();

    let mut page = PagePlan {
        number: 1,
        footer: config.footer_string(1),
        lines: Vec::new(),
    };
    let mut cursor_y = config.margin_top;
    let content_width = config.content_width();

    for (line_index, line) in lines.iter().enumerate() {
        let total_width = measure_line(line, config, index, &mut missing);
        if total_width > content_width {
            overflow.insert(line_index, total_width - content_width);
        }

        // Vertical fit check happens before the line is placed. A line that
        // would not fit even on a fresh page stays where the cursor is; a
        // new page cannot help it and must not be spent on it.
        let would_intrude = cursor_y + config.line_advance() > config.content_floor();
        if would_intrude && !page.lines.is_empty() {
            let number = page.number + 1;
            log::debug!("page {} full, advancing before line {}", page.number, line_index);
            pages.push(std::mem::replace(
                &mut page,
                PagePlan {
                    number,
                    footer: config.footer_string(number),
                    lines: Vec::new(),
                },
            ));
            cursor_y = config.margin_top;
        }

        let chars: Vec<char> = line.chars().collect();
        let mut placements = Vec::new();
        let mut x = config.margin_left;
        for (i, &ch) in chars.iter().enumerate() {
            if ch == ' ' {
                x += config.space_width;
                continue;
            }
            let (width, has_asset) = index.resolve_width(ch, config.glyph_height);
            placements.push(Placement {
                line_index,
                ch,
                x,
                y: cursor_y,
                width,
                height: config.glyph_height,
                has_asset,
            });
            let next_is_space = chars.get(i + 1) == Some(&' ');
            x += width;
            if !next_is_space {
                x += config.char_spacing;
            }
        }

        page.lines.push(LinePlan {
            index: line_index,
            text: line.clone(),
            total_width,
            placements,
            separator_y: cursor_y + config.glyph_height + config.line_gap,
        });
        cursor_y += config.line_advance();
    }

    pages.push(page);
    LayoutPlan {
        pages,
        missing,
        overflow,
    }
}
