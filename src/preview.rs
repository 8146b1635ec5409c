use crate::glyphs::{GlyphIndex, normalize_key};
use crate::layout::{LayoutConfig, LayoutPlan};
use crate::types::Mm;
use base64::Engine;

/// Base on-screen scale. The page is scaled down further when it would not
/// fit the preview column, so the markup never needs a horizontal scrollbar.
const PX_PER_MM: f32 = 2.5;
const MIN_SCALE: f32 = 0.25;

pub const DEFAULT_MAX_PREVIEW_WIDTH_PX: u32 = 900;

fn px(value: Mm) -> i64 {
    (value.to_f32() * PX_PER_MM).round() as i64
}

fn html_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

fn data_uri(bytes: &[u8]) -> String {
    let mime = match image::guess_format(bytes) {
        Ok(image::ImageFormat::Jpeg) => "image/jpeg",
        _ => "image/png",
    };
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Renders the plan as stacked scaled pages. Placement coordinates come
/// straight from the plan, so the preview and the PDF always agree on where
/// every glyph sits.
pub fn render_preview_html(
    plan: &LayoutPlan,
    config: &LayoutConfig,
    index: &GlyphIndex,
    max_preview_width_px: u32,
) -> String {
    let page_w_px = px(config.page.width);
    let page_h_px = px(config.page.height);
    let mut scale = 1.0f32;
    if page_w_px > max_preview_width_px as i64 {
        scale = max_preview_width_px as f32 / page_w_px as f32;
    }
    if scale < MIN_SCALE {
        scale = MIN_SCALE;
    }
    let scaled_w = (page_w_px as f32 * scale) as i64;
    let scaled_h = (page_h_px as f32 * scale) as i64;

    let mut out = String::new();
    out.push_str(
        "<div class=\"markplate-preview\" style=\"display:flex;flex-direction:column;align-items:center;gap:16px;padding:12px;\">\n",
    );

    for page in &plan.pages {
        out.push_str(&format!(
            "<div style=\"width:{sw}px;height:{sh}px;overflow:hidden;\">\
<div data-page=\"{number}\" style=\"width:{w}px;height:{h}px;background:#fff;position:relative;\
box-shadow:0 0 14px rgba(0,0,0,0.45);transform:scale({scale});transform-origin:top left;\">\n",
            sw = scaled_w,
            sh = scaled_h,
            number = page.number,
            w = page_w_px,
            h = page_h_px,
            scale = scale,
        ));

        for line in &page.lines {
            if plan.overflow.contains_key(&line.index) {
                // Amber wash behind an overflowing line, full content width.
                out.push_str(&format!(
                    "<div class=\"overflow-line\" style=\"position:absolute;left:{}px;top:{}px;\
width:{}px;height:{}px;background:rgba(255,200,0,0.4);\"></div>\n",
                    px(config.margin_left),
                    px(line.separator_y - config.glyph_height - config.line_gap),
                    px(config.content_width()),
                    px(config.glyph_height),
                ));
            }
            for placement in &line.placements {
                let left = px(placement.x);
                let top = px(placement.y);
                let width = px(placement.width);
                let height = px(placement.height);
                let bytes = placement
                    .has_asset
                    .then(|| index.image_bytes(&normalize_key(placement.ch)))
                    .flatten();
                match bytes {
                    Some(bytes) => {
                        out.push_str(&format!(
                            "<img src=\"{}\" style=\"position:absolute;left:{}px;top:{}px;\
width:{}px;height:{}px;\"/>\n",
                            data_uri(bytes),
                            left,
                            top,
                            width,
                            height
                        ));
                    }
                    None => {
                        out.push_str(&format!(
                            "<div style=\"position:absolute;left:{}px;top:{}px;width:{}px;height:{}px;\
background:#000;color:#fff;display:flex;align-items:center;justify-content:center;\
font-weight:bold;font-size:{}px;\">{}</div>\n",
                            left,
                            top,
                            width,
                            height,
                            height / 2,
                            html_escape(&placement.ch.to_string())
                        ));
                    }
                }
            }
            out.push_str(&format!(
                "<div style=\"position:absolute;left:{}px;top:{}px;width:{}px;height:1px;\
background:#000;\"></div>\n",
                px(config.margin_left),
                px(line.separator_y),
                px(config.content_width()),
            ));
        }

        out.push_str(&format!(
            "<div style=\"position:absolute;left:0;bottom:{}px;width:100%;text-align:center;\
font:10px Helvetica,Arial,sans-serif;color:#000;\">{}</div>\n",
            px(config.footer_margin),
            html_escape(&page.footer)
        ));
        out.push_str("</div></div>\n");
    }

    out.push_str("</div>\n");
    out
}

/// Strip of every registered glyph at a fixed preview height, in key order.
/// Mirrors the "library preview" panel of the original tool so operators
/// can see at a glance which characters have artwork.
pub fn render_library_html(index: &GlyphIndex, preview_height_px: u32, spacing_px: u32) -> String {
    let mut out = String::from(
        "<div class=\"markplate-library\" style=\"background:#fff;border-top:2px solid #ccc;\
margin-top:20px;padding:10px;\">\n\
<div style=\"font-weight:bold;margin-bottom:6px;color:#333;\">Marking Library</div>\n\
<div style=\"display:flex;overflow-x:auto;white-space:nowrap;padding:5px;\">\n",
    );

    if index.is_empty() {
        out.push_str(
            "<div style=\"color:#666;padding:8px;\">No glyph images registered. Add .png/.jpg \
files named for characters (e.g. A.png, 1.png, _.png for '.') to the library folder.</div>\n",
        );
    } else {
        for key in index.keys() {
            match index.image_bytes(key) {
                Some(bytes) => {
                    let width = index
                        .pixel_dimensions(key)
                        .filter(|(_, h)| *h > 0)
                        .map(|(w, h)| (preview_height_px as u64 * w as u64 / h as u64) as u32)
                        .unwrap_or(preview_height_px);
                    out.push_str(&format!(
                        "<img src=\"{}\" title=\"{}\" style=\"height:{}px;width:{}px;\
margin-right:{}px;display:inline-block;\"/>\n",
                        data_uri(bytes),
                        html_escape(key),
                        preview_height_px,
                        width,
                        spacing_px
                    ));
                }
                None => {
                    out.push_str(&format!(
                        "<div style=\"width:{h}px;height:{h}px;background:#eee;color:#000;\
display:inline-flex;align-items:center;justify-content:center;margin-right:{}px;\
font-size:12px;font-weight:bold;\">{}</div>\n",
                        spacing_px,
                        html_escape(key),
                        h = preview_height_px
                    ));
                }
            }
        }
    }

    out.push_str("</div></div>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyphs::test_support::MemoryGlyphSource;
    use crate::layout::layout;
    use crate::types::{Orientation, PaperSize};

    fn config(paper: PaperSize) -> LayoutConfig {
        LayoutConfig {
            page: paper.oriented(Orientation::Landscape),
            glyph_height: Mm::from_i32(100),
            char_spacing: Mm::from_i32(20),
            space_width: Mm::from_i32(40),
            line_gap: Mm::from_i32(10),
            margin_left: Mm::from_i32(20),
            margin_top: Mm::from_i32(20),
            footer_margin: Mm::from_i32(10),
            paper_label: paper.as_str().to_string(),
            footer_text: "Author".to_string(),
        }
    }

    fn png_index(keys: &[&str]) -> GlyphIndex {
        let mut source = MemoryGlyphSource::default();
        for key in keys {
            source.with_png(key, 10, 10);
        }
        GlyphIndex::from_source(&source)
    }

    #[test]
    fn preview_embeds_glyph_images_as_data_uris() {
        let cfg = config(PaperSize::A1);
        let index = png_index(&["1", "0"]);
        let plan = layout(&["10".to_string()], &cfg, &index);
        let html = render_preview_html(&plan, &cfg, &index, DEFAULT_MAX_PREVIEW_WIDTH_PX);

        assert!(html.contains("data:image/png;base64,"));
        assert!(html.contains("data-page=\"1\""));
        assert!(html.contains("Page 1 — A1 — Author.NCC"));
    }

    #[test]
    fn missing_glyphs_render_fallback_boxes_escaped() {
        let cfg = config(PaperSize::A1);
        let plan = layout(&["<".to_string()], &cfg, &GlyphIndex::empty());
        let html = render_preview_html(&plan, &cfg, &GlyphIndex::empty(), 900);

        assert!(html.contains("&lt;"));
        assert!(!html.contains("<img"));
        assert!(html.contains("background:#000"));
    }

    #[test]
    fn overflow_lines_are_highlighted() {
        let cfg = config(PaperSize::A4);
        let index = png_index(&["a"]);
        let text = "A".repeat(30);
        let plan = layout(&[text], &cfg, &index);
        assert!(!plan.overflow.is_empty());

        let html = render_preview_html(&plan, &cfg, &index, 900);
        assert!(html.contains("overflow-line"));
    }

    #[test]
    fn pages_appear_once_each() {
        let cfg = config(PaperSize::A4);
        let index = png_index(&["a"]);
        let lines: Vec<String> = (0..6).map(|_| "A".to_string()).collect();
        let plan = layout(&lines, &cfg, &index);
        let html = render_preview_html(&plan, &cfg, &index, 900);

        for page in &plan.pages {
            assert!(html.contains(&format!("data-page=\"{}\"", page.number)));
        }
    }

    #[test]
    fn library_strip_lists_keys_in_order() {
        let index = png_index(&["b", "a", "7"]);
        let html = render_library_html(&index, 50, 10);
        let pos_7 = html.find("title=\"7\"").unwrap();
        let pos_a = html.find("title=\"a\"").unwrap();
        let pos_b = html.find("title=\"b\"").unwrap();
        assert!(pos_7 < pos_a && pos_a < pos_b);
    }

    #[test]
    fn empty_library_shows_hint() {
        let html = render_library_html(&GlyphIndex::empty(), 50, 10);
        assert!(html.contains("No glyph images registered"));
    }
}
