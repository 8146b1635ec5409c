//! Layout and pagination engine for tank/compartment marking labels.
//!
//! Short identifier lines ("10WB", "25VOID") are typeset as rows of
//! pre-rendered character glyph images onto paginated sheets. The core is a
//! deterministic layout pass producing a [`LayoutPlan`]; two adapters render
//! the same plan as a print PDF and as a scaled HTML preview, so what the
//! operator previews is exactly what the plotter prints.

mod canvas;
mod debug;
mod error;
mod glyphs;
mod layout;
mod pdf;
mod preview;
mod report;
mod types;

pub use canvas::{Canvas, Command, Document, Page};
use debug::DebugLogger;
pub use error::MarkPlateError;
pub use glyphs::{GlyphAsset, GlyphIndex, GlyphLibrary, GlyphSource, normalize_key};
pub use layout::{LayoutConfig, LayoutPlan, LinePlan, PagePlan, Placement, layout};
pub use pdf::{document_from_plan, document_to_pdf};
pub use preview::{DEFAULT_MAX_PREVIEW_WIDTH_PX, render_library_html, render_preview_html};
pub use report::{GlyphCoverageReport, MissingGlyph, OverflowReport};
pub use types::{Color, Mm, Orientation, PaperSize, Size};

use std::io::Write;
use std::path::PathBuf;

// Shop defaults, all in millimetres.
pub const DEFAULT_GLYPH_HEIGHT_MM: i32 = 100;
pub const DEFAULT_CHAR_SPACING_MM: i32 = 20;
pub const DEFAULT_SPACE_WIDTH_MM: i32 = 40;
pub const DEFAULT_LINE_GAP_MM: i32 = 10;
pub const DEFAULT_MARGIN_LEFT_MM: i32 = 20;
pub const DEFAULT_MARGIN_TOP_MM: i32 = 20;
pub const DEFAULT_FOOTER_MARGIN_MM: i32 = 10;

/// Splits raw operator input into marking lines: one line per text row,
/// rows that are blank or whitespace-only are dropped. Layout itself takes
/// lines as given; this trimming is an input-surface concern.
pub fn marking_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.to_string())
        .collect()
}

/// Configured engine instance. Immutable once built; every render call gets
/// its own plan, so instances are safe to share across calls as long as each
/// call brings its own glyph snapshot.
pub struct MarkPlate {
    config: LayoutConfig,
    max_preview_width_px: u32,
    debug: Option<DebugLogger>,
}

#[derive(Clone)]
pub struct MarkPlateBuilder {
    paper: PaperSize,
    orientation: Orientation,
    glyph_height: Mm,
    char_spacing: Mm,
    space_width: Mm,
    line_gap: Mm,
    margin_left: Mm,
    margin_top: Mm,
    footer_margin: Mm,
    footer_text: String,
    max_preview_width_px: u32,
    debug_log_path: Option<PathBuf>,
}

impl Default for MarkPlateBuilder {
    fn default() -> Self {
        Self {
            paper: PaperSize::A1,
            orientation: Orientation::Landscape,
            glyph_height: Mm::from_i32(DEFAULT_GLYPH_HEIGHT_MM),
            char_spacing: Mm::from_i32(DEFAULT_CHAR_SPACING_MM),
            space_width: Mm::from_i32(DEFAULT_SPACE_WIDTH_MM),
            line_gap: Mm::from_i32(DEFAULT_LINE_GAP_MM),
            margin_left: Mm::from_i32(DEFAULT_MARGIN_LEFT_MM),
            margin_top: Mm::from_i32(DEFAULT_MARGIN_TOP_MM),
            footer_margin: Mm::from_i32(DEFAULT_FOOTER_MARGIN_MM),
            footer_text: String::new(),
            max_preview_width_px: DEFAULT_MAX_PREVIEW_WIDTH_PX,
            debug_log_path: None,
        }
    }
}

impl MarkPlateBuilder {
    pub fn paper(mut self, paper: PaperSize) -> Self {
        self.paper = paper;
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn glyph_height(mut self, height: Mm) -> Self {
        self.glyph_height = height;
        self
    }

    pub fn char_spacing(mut self, spacing: Mm) -> Self {
        self.char_spacing = spacing;
        self
    }

    pub fn space_width(mut self, width: Mm) -> Self {
        self.space_width = width;
        self
    }

    pub fn line_gap(mut self, gap: Mm) -> Self {
        self.line_gap = gap;
        self
    }

    pub fn margins(mut self, left: Mm, top: Mm) -> Self {
        self.margin_left = left;
        self.margin_top = top;
        self
    }

    pub fn footer_margin(mut self, margin: Mm) -> Self {
        self.footer_margin = margin;
        self
    }

    pub fn footer_text(mut self, text: impl Into<String>) -> Self {
        self.footer_text = text.into();
        self
    }

    pub fn max_preview_width_px(mut self, width: u32) -> Self {
        self.max_preview_width_px = width;
        self
    }

    /// Enables the JSONL diagnostics stream at `path`.
    pub fn debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<MarkPlate, MarkPlateError> {
        if !self.glyph_height.is_positive() {
            return Err(MarkPlateError::InvalidConfiguration(
                "glyph_height must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("char_spacing", self.char_spacing),
            ("space_width", self.space_width),
            ("line_gap", self.line_gap),
            ("margin_left", self.margin_left),
            ("margin_top", self.margin_top),
            ("footer_margin", self.footer_margin),
        ] {
            if value < Mm::ZERO {
                return Err(MarkPlateError::InvalidConfiguration(format!(
                    "{} must not be negative",
                    name
                )));
            }
        }

        let page = self.paper.oriented(self.orientation);
        if page.width - self.margin_left * 2 <= Mm::ZERO {
            return Err(MarkPlateError::InvalidConfiguration(
                "margins leave no horizontal content area".to_string(),
            ));
        }
        if self.margin_top + self.footer_margin >= page.height {
            return Err(MarkPlateError::InvalidConfiguration(
                "margins leave no vertical content area".to_string(),
            ));
        }

        let debug = match self.debug_log_path.as_ref() {
            Some(path) => Some(DebugLogger::new(path)?),
            None => None,
        };

        Ok(MarkPlate {
            config: LayoutConfig {
                page,
                glyph_height: self.glyph_height,
                char_spacing: self.char_spacing,
                space_width: self.space_width,
                line_gap: self.line_gap,
                margin_left: self.margin_left,
                margin_top: self.margin_top,
                footer_margin: self.footer_margin,
                paper_label: self.paper.as_str().to_string(),
                footer_text: self.footer_text,
            },
            max_preview_width_px: self.max_preview_width_px,
            debug,
        })
    }
}

impl MarkPlate {
    pub fn builder() -> MarkPlateBuilder {
        MarkPlateBuilder::default()
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Runs the layout pass against one immutable glyph snapshot and emits
    /// diagnostics. The same plan feeds both render surfaces.
    pub fn plan(&self, lines: &[String], index: &GlyphIndex) -> LayoutPlan {
        let plan = layout(lines, &self.config, index);
        if let Some(logger) = self.debug.as_ref() {
            for missing in plan.missing.missing() {
                logger.log_event(
                    "glyph.missing",
                    &[
                        ("char", missing.ch.to_string(), true),
                        ("key", missing.key.clone(), true),
                        ("count", missing.count.to_string(), false),
                    ],
                );
                logger.increment("glyph.missing", missing.count as u64);
            }
            for (line_index, excess) in &plan.overflow {
                logger.log_event(
                    "layout.overflow",
                    &[
                        ("line", line_index.to_string(), false),
                        ("excess_milli_mm", excess.to_milli_i64().to_string(), false),
                    ],
                );
                logger.increment("layout.overflow", 1);
            }
            logger.log_event(
                "layout.pages",
                &[
                    ("pages", plan.page_count().to_string(), false),
                    ("lines", plan.line_count().to_string(), false),
                ],
            );
            logger.emit_summary("layout");
            logger.flush();
        }
        plan
    }

    /// Lays out `lines` and writes the print PDF.
    pub fn render_pdf(
        &self,
        lines: &[String],
        index: &GlyphIndex,
    ) -> Result<Vec<u8>, MarkPlateError> {
        let plan = self.plan(lines, index);
        self.render_plan_pdf(&plan, index)
    }

    /// Renders an already computed plan, for callers that inspect the plan
    /// diagnostics first and then print it unchanged.
    pub fn render_plan_pdf(
        &self,
        plan: &LayoutPlan,
        index: &GlyphIndex,
    ) -> Result<Vec<u8>, MarkPlateError> {
        let document = document_from_plan(plan, &self.config);
        let bytes = document_to_pdf(&document, index)?;
        if let Some(logger) = self.debug.as_ref() {
            logger.log_event(
                "pdf.link",
                &[
                    ("bytes", bytes.len().to_string(), false),
                    ("pages", plan.page_count().to_string(), false),
                ],
            );
            logger.flush();
        }
        Ok(bytes)
    }

    /// Streams the print PDF into `writer` and hands the plan back so the
    /// caller can surface its diagnostics alongside the file.
    pub fn render_pdf_to_writer<W: Write>(
        &self,
        lines: &[String],
        index: &GlyphIndex,
        writer: &mut W,
    ) -> Result<LayoutPlan, MarkPlateError> {
        let plan = self.plan(lines, index);
        let bytes = self.render_plan_pdf(&plan, index)?;
        writer.write_all(&bytes)?;
        Ok(plan)
    }

    /// Lays out `lines` and renders the scaled on-screen preview.
    pub fn render_preview_html(&self, lines: &[String], index: &GlyphIndex) -> String {
        let plan = self.plan(lines, index);
        self.render_plan_preview_html(&plan, index)
    }

    pub fn render_plan_preview_html(&self, plan: &LayoutPlan, index: &GlyphIndex) -> String {
        render_preview_html(plan, &self.config, index, self.max_preview_width_px)
    }

    /// Glyph library strip for the bottom of the input surface.
    pub fn render_library_html(&self, index: &GlyphIndex) -> String {
        render_library_html(index, 50, 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyphs::test_support::MemoryGlyphSource;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn index_for(chars: &str) -> GlyphIndex {
        let mut source = MemoryGlyphSource::default();
        for ch in chars.chars() {
            source.with_png(&normalize_key(ch), 60, 100);
        }
        GlyphIndex::from_source(&source)
    }

    fn temp_log_path(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!(
            "markplate_{tag}_{}_{}.jsonl",
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn builder_rejects_non_positive_glyph_height() {
        let err = match MarkPlate::builder().glyph_height(Mm::ZERO).build() {
            Ok(_) => panic!("zero glyph height should fail"),
            Err(err) => err,
        };
        assert!(matches!(err, MarkPlateError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("glyph_height"));
    }

    #[test]
    fn builder_rejects_negative_spacing() {
        let err = match MarkPlate::builder()
            .char_spacing(Mm::from_i32(-1))
            .build()
        {
            Ok(_) => panic!("negative spacing should fail"),
            Err(err) => err,
        };
        assert!(err.to_string().contains("char_spacing"));
    }

    #[test]
    fn builder_rejects_margins_that_swallow_the_page() {
        let err = match MarkPlate::builder()
            .paper(PaperSize::A4)
            .orientation(Orientation::Portrait)
            .margins(Mm::from_i32(110), Mm::from_i32(20))
            .build()
        {
            Ok(_) => panic!("margins wider than the page should fail"),
            Err(err) => err,
        };
        assert!(err.to_string().contains("content area"));
    }

    #[test]
    fn marking_lines_drops_blank_rows() {
        let lines = marking_lines("10WB\n\n  \n25VOID\n50FO\n");
        assert_eq!(lines, vec!["10WB", "25VOID", "50FO"]);
    }

    #[test]
    fn reference_markings_fit_one_page() {
        let engine = MarkPlate::builder()
            .footer_text("Author")
            .build()
            .expect("valid config");
        let index = index_for("10WB25VOIDF");
        let lines = marking_lines("10WB\n25VOID\n50FO");
        let plan = engine.plan(&lines, &index);

        assert_eq!(plan.page_count(), 1);
        assert!(plan.missing.is_empty());
        assert!(plan.overflow.is_empty());
        assert_eq!(plan.pages[0].lines.len(), 3);
    }

    #[test]
    fn preview_and_pdf_come_from_the_same_plan() {
        let engine = MarkPlate::builder()
            .paper(PaperSize::A3)
            .footer_text("QA")
            .build()
            .expect("valid config");
        let index = index_for("10WB");
        let lines = marking_lines("10WB\n1 0");
        let plan = engine.plan(&lines, &index);

        let pdf = engine.render_plan_pdf(&plan, &index).expect("pdf bytes");
        let html = engine.render_plan_preview_html(&plan, &index);

        assert!(pdf.starts_with(b"%PDF-1.7\n"));
        assert!(html.contains("data-page=\"1\""));
        // Re-planning identical input must not change either output.
        let again = engine.plan(&lines, &index);
        assert_eq!(plan, again);
        assert_eq!(pdf, engine.render_plan_pdf(&again, &index).expect("pdf"));
    }

    #[test]
    fn pdf_streams_to_writer_and_returns_the_plan() {
        let engine = MarkPlate::builder()
            .footer_text("Author")
            .build()
            .expect("valid config");
        let index = index_for("10WB");
        let lines = marking_lines("10WB");
        let mut buf = Vec::new();
        let plan = engine
            .render_pdf_to_writer(&lines, &index, &mut buf)
            .expect("streamed pdf");

        assert!(buf.starts_with(b"%PDF-1.7\n"));
        assert_eq!(plan.page_count(), 1);
        assert_eq!(buf, engine.render_plan_pdf(&plan, &index).expect("pdf"));
    }

    #[test]
    fn missing_characters_flow_into_pdf_and_report() {
        let engine = MarkPlate::builder().build().expect("valid config");
        let index = index_for("1");
        let lines = marking_lines("1X");
        let plan = engine.plan(&lines, &index);

        assert_eq!(plan.missing.characters(), vec!['X']);
        let pdf = engine.render_plan_pdf(&plan, &index).expect("pdf bytes");
        assert!(!pdf.is_empty());
    }

    #[test]
    fn empty_input_still_produces_a_sheet() {
        let engine = MarkPlate::builder()
            .footer_text("Author")
            .build()
            .expect("valid config");
        let plan = engine.plan(&[], &GlyphIndex::empty());
        assert_eq!(plan.page_count(), 1);
        assert!(plan.pages[0].lines.is_empty());

        let pdf = engine
            .render_plan_pdf(&plan, &GlyphIndex::empty())
            .expect("pdf bytes");
        assert!(pdf.starts_with(b"%PDF-1.7\n"));
    }

    #[test]
    fn debug_log_records_layout_events() {
        let path = temp_log_path("engine");
        let engine = MarkPlate::builder()
            .paper(PaperSize::A4)
            .orientation(Orientation::Portrait)
            .glyph_height(Mm::from_i32(150))
            .debug_log(&path)
            .build()
            .expect("valid config");
        let index = index_for("A");
        let text = "A".repeat(20);
        let _plan = engine.plan(&marking_lines(&format!("{text}\nZ")), &index);

        let contents = std::fs::read_to_string(&path).expect("read log");
        assert!(contents.contains("\"type\":\"layout.overflow\""));
        assert!(contents.contains("\"type\":\"glyph.missing\""));
        assert!(contents.contains("\"type\":\"layout.pages\""));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn library_from_directory_is_optional() {
        // A missing directory degrades to an empty library, not an error.
        let library = GlyphLibrary::open("/definitely/not/a/real/path");
        assert!(library.is_empty());
        let index = GlyphIndex::from_source(&library);
        assert!(index.is_empty());
    }
}
