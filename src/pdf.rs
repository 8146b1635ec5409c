use crate::canvas::{Canvas, Command, Document};
use crate::glyphs::GlyphIndex;
use crate::layout::{LayoutConfig, LayoutPlan};
use crate::types::{Color, Mm, Size};
use std::collections::HashMap;
use std::io::{self, Write};

// Footer line matches the print shop's long-standing sheet format.
const FOOTER_FONT_SIZE_PT: f32 = 10.0;
const SEPARATOR_WIDTH_PT: f32 = 0.5;

// Approximate advance of Helvetica as a fraction of the font size, used to
// center strings without shipping AFM tables.
const HELVETICA_CHAR_WIDTH_RATIO: f32 = 0.5;

const PDF_CATALOG_ID: usize = 1;
const PDF_PAGES_ID: usize = 2;
const PDF_RESOURCES_ID: usize = 3;

/// Converts a layout plan into a drawable command document. The preview
/// adapter consumes the same plan directly, so both outputs share every
/// coordinate decision made here or earlier.
pub fn document_from_plan(plan: &LayoutPlan, config: &LayoutConfig) -> Document {
    let mut canvas = Canvas::new(config.page);
    let page_count = plan.pages.len();

    for (page_index, page) in plan.pages.iter().enumerate() {
        for line in &page.lines {
            for placement in &line.placements {
                if placement.has_asset {
                    canvas.draw_image(
                        placement.x,
                        placement.y,
                        placement.width,
                        placement.height,
                        crate::glyphs::normalize_key(placement.ch),
                    );
                } else {
                    draw_fallback_cell(&mut canvas, placement);
                }
            }
            canvas.set_stroke_color(Color::BLACK);
            canvas.set_line_width(SEPARATOR_WIDTH_PT);
            canvas.move_to(config.margin_left, line.separator_y);
            canvas.line_to(config.page.width - config.margin_left, line.separator_y);
            canvas.stroke();
        }

        canvas.set_fill_color(Color::BLACK);
        canvas.set_font_size(FOOTER_FONT_SIZE_PT);
        canvas.draw_string_centered(
            config.page.width / 2,
            config.page.height - config.footer_margin,
            page.footer.clone(),
        );

        if page_index + 1 < page_count {
            canvas.show_page();
        }
    }

    canvas.finish()
}

/// Missing glyph: solid black square with the character centered in white,
/// the same degradation the preview shows.
fn draw_fallback_cell(canvas: &mut Canvas, placement: &crate::layout::Placement) {
    let side = placement.height;
    canvas.set_fill_color(Color::BLACK);
    canvas.draw_rect(placement.x, placement.y, side, side);
    canvas.set_fill_color(Color::WHITE);
    let font_size_pt = (side / 2).to_point_milli() as f32 / 1000.0;
    canvas.set_font_size(font_size_pt);
    // Baseline sits height/2.8 below the cell top; tuned to optically
    // center a single capital in the square.
    let baseline = placement.y + Mm::from_milli_i64(side.to_milli_i64() * 10 / 28);
    canvas.draw_string_centered(placement.x + side / 2, baseline, placement.ch.to_string());
    canvas.set_fill_color(Color::BLACK);
}

/// Serializes a command document as a PDF, embedding glyph images from the
/// run's snapshot. Identical documents and snapshots produce identical
/// bytes.
pub fn document_to_pdf(document: &Document, index: &GlyphIndex) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut writer = PdfWriter::new(&mut out, document.page_size, index)?;
    writer.add_document(document)?;
    writer.finish()?;
    Ok(out)
}

struct ImageData {
    width: u32,
    height: u32,
    color_space: &'static str,
    filter: &'static str,
    data: Vec<u8>,
    alpha: Option<AlphaData>,
}

struct AlphaData {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

struct PdfWriter<'a, W: Write> {
    writer: &'a mut W,
    index: &'a GlyphIndex,
    offset: usize,
    offsets: Vec<usize>,
    next_id: usize,
    page_size: Size,
    page_ids: Vec<usize>,
    image_resources: Vec<(String, usize)>,
    image_name_map: HashMap<String, String>,
    image_content_map: HashMap<u64, String>,
    next_image_index: usize,
    font_id: Option<usize>,
}

impl<'a, W: Write> PdfWriter<'a, W> {
    fn new(writer: &'a mut W, page_size: Size, index: &'a GlyphIndex) -> io::Result<Self> {
        let mut offset = 0;
        write_bytes(writer, b"%PDF-1.7\n", &mut offset)?;
        write_bytes(writer, b"%\xE2\xE3\xCF\xD3\n", &mut offset)?;
        Ok(Self {
            writer,
            index,
            offset,
            offsets: vec![0; PDF_RESOURCES_ID + 1],
            next_id: PDF_RESOURCES_ID + 1,
            page_size,
            page_ids: Vec::new(),
            image_resources: Vec::new(),
            image_name_map: HashMap::new(),
            image_content_map: HashMap::new(),
            next_image_index: 1,
            font_id: None,
        })
    }

    fn add_document(&mut self, document: &Document) -> io::Result<()> {
        for page in &document.pages {
            let content = self.render_page(page)?;
            let start = self.alloc_ids(2);
            let content_id = start;
            let page_id = start + 1;
            self.write_object(content_id, &stream_object(&content))?;
            let page_obj = format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] /Resources {} 0 R /Contents {} 0 R >>",
                PDF_PAGES_ID,
                fmt_mm(self.page_size.width),
                fmt_mm(self.page_size.height),
                PDF_RESOURCES_ID,
                content_id
            );
            self.write_object(page_id, &page_obj)?;
            self.page_ids.push(page_id);
        }
        Ok(())
    }

    fn render_page(&mut self, page: &crate::canvas::Page) -> io::Result<String> {
        let page_height = self.page_size.height;
        let mut out = String::new();
        let mut current_font_size = 12.0f32;

        for cmd in &page.commands {
            match cmd {
                Command::SetFillColor(color) => {
                    out.push_str(&format!(
                        "{} {} {} rg\n",
                        fmt_unit(color.r),
                        fmt_unit(color.g),
                        fmt_unit(color.b)
                    ));
                }
                Command::SetStrokeColor(color) => {
                    out.push_str(&format!(
                        "{} {} {} RG\n",
                        fmt_unit(color.r),
                        fmt_unit(color.g),
                        fmt_unit(color.b)
                    ));
                }
                Command::SetLineWidth(width) => {
                    out.push_str(&format!("{} w\n", fmt_f32(*width)));
                }
                Command::SetFontSize(size) => {
                    current_font_size = *size;
                }
                Command::MoveTo { x, y } => {
                    out.push_str(&format!("{} {} m\n", fmt_mm(*x), fmt_mm(page_height - *y)));
                }
                Command::LineTo { x, y } => {
                    out.push_str(&format!("{} {} l\n", fmt_mm(*x), fmt_mm(page_height - *y)));
                }
                Command::Stroke => out.push_str("S\n"),
                Command::DrawRect {
                    x,
                    y,
                    width,
                    height,
                } => {
                    let draw_y = page_height - *y - *height;
                    out.push_str(&format!(
                        "{} {} {} {} re\nf\n",
                        fmt_mm(*x),
                        fmt_mm(draw_y),
                        fmt_mm(*width),
                        fmt_mm(*height)
                    ));
                }
                Command::DrawStringCentered { x, y, text } => {
                    let resource = self.ensure_font();
                    let encoded = encode_winansi_pdf_string(text);
                    let approx_width_pt =
                        encoded.glyph_count as f32 * current_font_size * HELVETICA_CHAR_WIDTH_RATIO;
                    let x_pt = x.to_point_milli() as f32 / 1000.0 - approx_width_pt / 2.0;
                    let y_pt = (page_height - *y).to_point_milli() as f32 / 1000.0;
                    out.push_str("BT\n");
                    out.push_str(&format!("/{} {} Tf\n", resource, fmt_f32(current_font_size)));
                    out.push_str(&format!("{} {} Td\n", fmt_f32(x_pt), fmt_f32(y_pt)));
                    out.push_str(&format!("({}) Tj\n", encoded.text));
                    out.push_str("ET\n");
                }
                Command::DrawImage {
                    x,
                    y,
                    width,
                    height,
                    resource_id,
                } => {
                    if let Some(name) = self.ensure_image(resource_id)? {
                        let draw_y = page_height - *y - *height;
                        out.push_str("q\n");
                        out.push_str(&format!(
                            "{} 0 0 {} {} {} cm\n",
                            fmt_mm(*width),
                            fmt_mm(*height),
                            fmt_mm(*x),
                            fmt_mm(draw_y)
                        ));
                        out.push_str(&format!("/{} Do\n", name));
                        out.push_str("Q\n");
                    } else {
                        // Snapshot held no usable bytes: paint the box solid
                        // so the sheet keeps its layout.
                        let draw_y = page_height - *y - *height;
                        log::warn!("glyph image '{}' unavailable, drawing solid box", resource_id);
                        out.push_str(&format!(
                            "{} {} {} {} re\nf\n",
                            fmt_mm(*x),
                            fmt_mm(draw_y),
                            fmt_mm(*width),
                            fmt_mm(*height)
                        ));
                    }
                }
            }
        }
        Ok(out)
    }

    fn ensure_font(&mut self) -> String {
        if self.font_id.is_none() {
            self.font_id = Some(self.alloc_ids(1));
        }
        "F1".to_string()
    }

    fn ensure_image(&mut self, resource_id: &str) -> io::Result<Option<String>> {
        if let Some(name) = self.image_name_map.get(resource_id) {
            return Ok(Some(name.clone()));
        }
        let Some(bytes) = self.index.image_bytes(resource_id) else {
            return Ok(None);
        };
        let Some(image) = decode_image_bytes(bytes) else {
            return Ok(None);
        };

        let hash = hash_image(&image);
        if let Some(name) = self.image_content_map.get(&hash) {
            self.image_name_map
                .insert(resource_id.to_string(), name.clone());
            return Ok(Some(name.clone()));
        }

        let smask_id = image.alpha.as_ref().map(|_| self.alloc_ids(1));
        let obj_id = self.alloc_ids(1);
        let name = format!("Im{}", self.next_image_index);
        self.next_image_index += 1;

        if let (Some(alpha), Some(mask_id)) = (image.alpha.as_ref(), smask_id) {
            self.write_object(mask_id, &image_smask_object(alpha))?;
        }
        self.write_object(obj_id, &image_object(&image, smask_id))?;
        self.image_resources.push((name.clone(), obj_id));
        self.image_name_map
            .insert(resource_id.to_string(), name.clone());
        self.image_content_map.insert(hash, name.clone());
        Ok(Some(name))
    }

    fn finish(&mut self) -> io::Result<usize> {
        if let Some(font_id) = self.font_id {
            self.write_object(font_id, &helvetica_font_object())?;
        }

        let mut resources = Vec::new();
        if let Some(font_id) = self.font_id {
            resources.push(format!("/Font << /F1 {} 0 R >>", font_id));
        }
        if !self.image_resources.is_empty() {
            let entries = self
                .image_resources
                .iter()
                .map(|(name, id)| format!("/{} {} 0 R", name, id))
                .collect::<Vec<_>>()
                .join(" ");
            resources.push(format!("/XObject << {} >>", entries));
        }
        self.write_object(PDF_RESOURCES_ID, &format!("<< {} >>", resources.join(" ")))?;

        let kids = self
            .page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        self.write_object(
            PDF_PAGES_ID,
            &format!(
                "<< /Type /Pages /Count {} /Kids [{}] >>",
                self.page_ids.len(),
                kids
            ),
        )?;

        let info_id = self.alloc_ids(1);
        self.write_object(info_id, "<< /Producer (markplate) >>")?;
        self.write_object(
            PDF_CATALOG_ID,
            &format!("<< /Type /Catalog /Pages {} 0 R >>", PDF_PAGES_ID),
        )?;

        let total_objects = self.next_id.saturating_sub(1);
        let xref_start = self.offset;
        write_str(
            self.writer,
            &format!("xref\n0 {}\n", total_objects + 1),
            &mut self.offset,
        )?;
        write_bytes(self.writer, b"0000000000 65535 f \n", &mut self.offset)?;
        for id in 1..=total_objects {
            let obj_offset = self.offsets.get(id).copied().unwrap_or(0);
            write_str(
                self.writer,
                &format!("{:010} 00000 n \n", obj_offset),
                &mut self.offset,
            )?;
        }
        let trailer = format!(
            "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF",
            total_objects + 1,
            PDF_CATALOG_ID,
            info_id,
            xref_start
        );
        write_str(self.writer, &trailer, &mut self.offset)?;
        Ok(self.offset)
    }

    fn alloc_ids(&mut self, count: usize) -> usize {
        let start = self.next_id;
        self.next_id = self.next_id.saturating_add(count);
        if self.offsets.len() < self.next_id {
            self.offsets.resize(self.next_id, 0);
        }
        start
    }

    fn write_object(&mut self, obj_id: usize, body: &str) -> io::Result<()> {
        if let Some(slot) = self.offsets.get_mut(obj_id) {
            *slot = self.offset;
        }
        write_str(self.writer, &format!("{} 0 obj\n", obj_id), &mut self.offset)?;
        write_bytes(self.writer, body.as_bytes(), &mut self.offset)?;
        write_bytes(self.writer, b"\nendobj\n", &mut self.offset)?;
        Ok(())
    }
}

fn write_bytes<W: Write>(writer: &mut W, bytes: &[u8], offset: &mut usize) -> io::Result<()> {
    writer.write_all(bytes)?;
    *offset += bytes.len();
    Ok(())
}

fn write_str<W: Write>(writer: &mut W, text: &str, offset: &mut usize) -> io::Result<()> {
    write_bytes(writer, text.as_bytes(), offset)
}

fn decode_image_bytes(data: &[u8]) -> Option<ImageData> {
    use image::GenericImageView;

    let format = image::guess_format(data).ok();
    let decoded = image::load_from_memory(data).ok()?;
    let (width, height) = decoded.dimensions();

    if matches!(format, Some(image::ImageFormat::Jpeg)) {
        let color_space = match decoded.color() {
            image::ColorType::L8 | image::ColorType::La8 => "/DeviceGray",
            _ => "/DeviceRGB",
        };
        return Some(ImageData {
            width,
            height,
            color_space,
            filter: "/DCTDecode",
            data: data.to_vec(),
            alpha: None,
        });
    }

    let rgba = decoded.to_rgba8();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    let mut has_alpha = false;
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        if a != 255 {
            has_alpha = true;
        }
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }

    let compressed = flate_compress(&rgb);
    let alpha = if has_alpha {
        Some(AlphaData {
            width,
            height,
            data: flate_compress(&alpha),
        })
    } else {
        None
    };
    Some(ImageData {
        width,
        height,
        color_space: "/DeviceRGB",
        filter: "/FlateDecode",
        data: compressed,
        alpha,
    })
}

fn flate_compress(data: &[u8]) -> Vec<u8> {
    miniz_oxide::deflate::compress_to_vec_zlib(data, 6)
}

fn hash_image(image: &ImageData) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    image.data.hash(&mut hasher);
    if let Some(alpha) = &image.alpha {
        alpha.data.hash(&mut hasher);
    }
    hasher.finish()
}

fn image_object(image: &ImageData, smask_id: Option<usize>) -> String {
    let stream_data = encode_stream_data(&image.data);
    let filters = match image.filter {
        "/DCTDecode" => "[/ASCIIHexDecode /DCTDecode]",
        _ => "[/ASCIIHexDecode /FlateDecode]",
    };
    let smask = smask_id
        .map(|id| format!(" /SMask {} 0 R", id))
        .unwrap_or_default();
    format!(
        "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} /BitsPerComponent 8 /Length {} /Filter {}{} >>
stream
{}
endstream",
        image.width,
        image.height,
        image.color_space,
        stream_data.as_bytes().len(),
        filters,
        smask,
        stream_data
    )
}

fn image_smask_object(alpha: &AlphaData) -> String {
    let stream_data = encode_stream_data(&alpha.data);
    format!(
        "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceGray /BitsPerComponent 8 /Length {} /Filter [/ASCIIHexDecode /FlateDecode] >>
stream
{}
endstream",
        alpha.width,
        alpha.height,
        stream_data.as_bytes().len(),
        stream_data
    )
}

fn encode_stream_data(data: &[u8]) -> String {
    let mut hex = ascii_hex_encode(data);
    hex.push('>');
    hex
}

fn ascii_hex_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for (index, byte) in data.iter().enumerate() {
        use std::fmt::Write;
        let _ = write!(&mut out, "{:02X}", byte);
        if index % 32 == 31 {
            out.push('\n');
        }
    }
    out
}

fn stream_object(content: &str) -> String {
    let length = content.as_bytes().len();
    format!("<< /Length {} >>\nstream\n{}\nendstream", length, content)
}

fn helvetica_font_object() -> String {
    "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
        .to_string()
}

struct WinAnsiEncoded {
    text: String,
    glyph_count: usize,
}

/// Encodes text as a WinAnsi PDF string literal with octal escapes for
/// bytes outside printable ASCII. Characters with no WinAnsi slot become
/// `?` rather than dropping out of the footer.
fn encode_winansi_pdf_string(input: &str) -> WinAnsiEncoded {
    let mut out = String::new();
    let mut glyph_count = 0usize;
    for ch in input.chars() {
        glyph_count += 1;
        let byte: u8 = match ch {
            '\\' => {
                out.push_str("\\\\");
                continue;
            }
            '(' => {
                out.push_str("\\(");
                continue;
            }
            ')' => {
                out.push_str("\\)");
                continue;
            }
            '\u{2013}' => 0x96, // en dash
            '\u{2014}' => 0x97, // em dash
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            _ => {
                let code = ch as u32;
                if (0x20..0x7F).contains(&code) {
                    out.push(ch);
                    continue;
                }
                if (0xA0..=0xFF).contains(&code) {
                    code as u8
                } else {
                    b'?'
                }
            }
        };
        use std::fmt::Write;
        let _ = write!(&mut out, "\\{:03o}", byte);
    }
    WinAnsiEncoded {
        text: out,
        glyph_count,
    }
}

fn format_milli(milli: i64) -> String {
    let neg = milli < 0;
    let abs = milli.unsigned_abs();
    let int = abs / 1000;
    let frac = abs % 1000;
    let mut s = if neg {
        format!("-{}", int)
    } else {
        int.to_string()
    };
    if frac != 0 {
        let mut tail = format!(".{:03}", frac);
        while tail.ends_with('0') {
            tail.pop();
        }
        s.push_str(&tail);
    }
    s
}

/// Millimetres to a PDF-space point literal.
fn fmt_mm(value: Mm) -> String {
    format_milli(value.to_point_milli())
}

fn fmt_f32(value: f32) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    format_milli((value as f64 * 1000.0).round() as i64)
}

fn fmt_unit(value: f32) -> String {
    fmt_f32(value.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyphs::test_support::MemoryGlyphSource;
    use crate::layout::layout;
    use crate::types::{Orientation, PaperSize};

    fn config() -> LayoutConfig {
        LayoutConfig {
            page: PaperSize::A4.oriented(Orientation::Landscape),
            glyph_height: Mm::from_i32(50),
            char_spacing: Mm::from_i32(20),
            space_width: Mm::from_i32(40),
            line_gap: Mm::from_i32(10),
            margin_left: Mm::from_i32(20),
            margin_top: Mm::from_i32(20),
            footer_margin: Mm::from_i32(10),
            paper_label: "A4".to_string(),
            footer_text: "Author".to_string(),
        }
    }

    fn index_with_png(keys: &[&str]) -> GlyphIndex {
        let mut source = MemoryGlyphSource::default();
        for key in keys {
            source.with_png(key, 4, 8);
        }
        GlyphIndex::from_source(&source)
    }

    fn count_token(haystack: &[u8], token: &[u8]) -> usize {
        if token.is_empty() || haystack.len() < token.len() {
            return 0;
        }
        haystack
            .windows(token.len())
            .filter(|window| *window == token)
            .count()
    }

    #[test]
    fn number_formatting_is_deterministic() {
        assert_eq!(format_milli(595_276), "595.276");
        assert_eq!(format_milli(-1_500), "-1.5");
        assert_eq!(format_milli(72_000), "72");
        assert_eq!(fmt_f32(0.5), "0.5");
        assert_eq!(fmt_mm(Mm::from_f32(25.4)), "72");
    }

    #[test]
    fn winansi_encoding_handles_footer_punctuation() {
        let encoded = encode_winansi_pdf_string("Page 1 — A4 — Author.NCC");
        assert!(encoded.text.contains("\\227"));
        assert_eq!(encoded.glyph_count, 24);
        let parens = encode_winansi_pdf_string("(ok)");
        assert_eq!(parens.text, "\\(ok\\)");
    }

    #[test]
    fn fallback_cell_paints_rect_and_centered_character() {
        let cfg = config();
        let plan = layout(&["Q".to_string()], &cfg, &GlyphIndex::empty());
        let doc = document_from_plan(&plan, &cfg);
        let commands = &doc.pages[0].commands;
        assert!(
            commands
                .iter()
                .any(|c| matches!(c, Command::DrawRect { .. }))
        );
        assert!(commands.iter().any(
            |c| matches!(c, Command::DrawStringCentered { text, .. } if text == "Q")
        ));
        assert!(
            !commands
                .iter()
                .any(|c| matches!(c, Command::DrawImage { .. }))
        );
    }

    #[test]
    fn footer_is_drawn_on_every_page() {
        let cfg = config();
        let lines: Vec<String> = (0..10).map(|_| "A".to_string()).collect();
        let index = index_with_png(&["a"]);
        let plan = layout(&lines, &cfg, &index);
        let doc = document_from_plan(&plan, &cfg);
        assert!(doc.pages.len() > 1);
        for (i, page) in doc.pages.iter().enumerate() {
            let footer = format!("Page {} — A4 — Author.NCC", i + 1);
            assert!(page.commands.iter().any(
                |c| matches!(c, Command::DrawStringCentered { text, .. } if *text == footer)
            ));
        }
    }

    #[test]
    fn pdf_bytes_have_header_pages_and_trailer() {
        let cfg = config();
        let index = index_with_png(&["1", "0"]);
        let plan = layout(&["10".to_string()], &cfg, &index);
        let doc = document_from_plan(&plan, &cfg);
        let bytes = document_to_pdf(&doc, &index).expect("pdf");

        assert!(bytes.starts_with(b"%PDF-1.7\n"));
        assert!(bytes.ends_with(b"%%EOF"));
        assert_eq!(count_token(&bytes, b"/Type /Page "), 1);
        assert_eq!(count_token(&bytes, b"/Subtype /Image"), 1);
        assert!(count_token(&bytes, b"/BaseFont /Helvetica") == 1);
    }

    #[test]
    fn repeated_glyphs_share_one_xobject() {
        let cfg = config();
        let index = index_with_png(&["a"]);
        let plan = layout(&["AAAA".to_string()], &cfg, &index);
        let doc = document_from_plan(&plan, &cfg);
        let bytes = document_to_pdf(&doc, &index).expect("pdf");

        assert_eq!(count_token(&bytes, b"/Subtype /Image"), 1);
        assert_eq!(count_token(&bytes, b"/Im1 Do"), 4);
    }

    #[test]
    fn identical_inputs_produce_identical_bytes() {
        let cfg = config();
        let index = index_with_png(&["a", "b"]);
        let plan = layout(&["AB BA".to_string()], &cfg, &index);
        let doc = document_from_plan(&plan, &cfg);
        let first = document_to_pdf(&doc, &index).expect("pdf");
        let second = document_to_pdf(&doc, &index).expect("pdf");
        assert_eq!(first, second);
    }

    #[test]
    fn empty_plan_renders_single_page_with_footer_only() {
        let cfg = config();
        let plan = layout(&[], &cfg, &GlyphIndex::empty());
        let doc = document_from_plan(&plan, &cfg);
        let bytes = document_to_pdf(&doc, &GlyphIndex::empty()).expect("pdf");

        assert_eq!(doc.pages.len(), 1);
        assert_eq!(count_token(&bytes, b"/Type /Page "), 1);
        assert_eq!(count_token(&bytes, b"Tj"), 1);
    }
}
