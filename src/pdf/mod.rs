//! PDF export — renders a Markdown article to A4 pages.
//!
//! Layout mirrors the product's article structure: a centered bold title
//! taken from the first `# ` heading, an accent rule, sized-down bold
//! section headings, indented list items, word-wrapped body text, and page
//! numbers in the footer. The built-in Helvetica faces only cover WinAnsi,
//! so Unicode punctuation is transliterated to ASCII before layout.

use anyhow::{Context, Result};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rgb,
};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
const BOTTOM_MARGIN_MM: f32 = 20.0;
const USABLE_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;

const TITLE_PT: f32 = 18.0;
const H2_PT: f32 = 14.0;
const H3_PT: f32 = 12.0;
const BODY_PT: f32 = 10.0;
const FOOTER_PT: f32 = 8.0;

/// Average glyph advance for Helvetica as a fraction of the point size.
/// Used for wrapping estimates; slightly conservative so lines never
/// overflow the margin.
const AVG_GLYPH_EM: f32 = 0.52;
const PT_TO_MM: f32 = 0.3528;

/// Replacements for punctuation the built-in fonts cannot encode.
const UNICODE_REPLACEMENTS: &[(char, &str)] = &[
    ('\u{2014}', "--"),
    ('\u{2013}', "-"),
    ('\u{2019}', "'"),
    ('\u{2018}', "'"),
    ('\u{201c}', "\""),
    ('\u{201d}', "\""),
    ('\u{2026}', "..."),
    ('\u{00a0}', " "),
    ('\u{2022}', "*"),
    ('\u{2010}', "-"),
    ('\u{00ad}', "-"),
    ('\u{00b7}', "*"),
    ('\u{25cf}', "*"),
    ('\u{2212}', "-"),
    ('\u{00d7}', "x"),
    ('\u{00f7}', "/"),
    ('\u{2190}', "<-"),
    ('\u{2192}', "->"),
    ('\u{2191}', "^"),
    ('\u{2193}', "v"),
];

/// Transliterate to the ASCII subset the built-in fonts can encode.
fn sanitize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    'chars: for c in text.chars() {
        if c.is_ascii() {
            out.push(c);
            continue;
        }
        for (from, to) in UNICODE_REPLACEMENTS {
            if c == *from {
                out.push_str(to);
                continue 'chars;
            }
        }
        if c.is_whitespace() {
            out.push(' ');
        } else {
            out.push('?');
        }
    }
    out
}

/// Greedy word wrap against an estimated line capacity.
fn wrap_line(text: &str, font_size_pt: f32, width_mm: f32) -> Vec<String> {
    let glyph_mm = font_size_pt * AVG_GLYPH_EM * PT_TO_MM;
    let max_chars = ((width_mm / glyph_mm) as usize).max(8);

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate_len = if current.is_empty() {
            word.len()
        } else {
            current.len() + 1 + word.len()
        };
        if candidate_len <= max_chars {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        } else {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            // A single word longer than the line is hard-split.
            let mut rest = word;
            while rest.len() > max_chars {
                let (head, tail) = rest.split_at(max_chars);
                lines.push(head.to_string());
                rest = tail;
            }
            current = rest.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
}

/// Cursor over the document: tracks the current layer and vertical
/// position, breaking pages (and numbering them) as content flows.
struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y_mm: f32,
    page_no: u32,
}

impl<'a> PageCursor<'a> {
    fn new(doc: &'a PdfDocumentReference, layer: PdfLayerReference) -> Self {
        Self {
            doc,
            layer,
            y_mm: PAGE_HEIGHT_MM - MARGIN_MM,
            page_no: 1,
        }
    }

    fn write_footer(&self, fonts: &Fonts) {
        self.layer.use_text(
            format!("Page {}", self.page_no),
            FOOTER_PT,
            Mm(PAGE_WIDTH_MM / 2.0 - 6.0),
            Mm(8.0),
            &fonts.oblique,
        );
    }

    fn ensure_room(&mut self, needed_mm: f32, fonts: &Fonts) {
        if self.y_mm - needed_mm < BOTTOM_MARGIN_MM {
            self.write_footer(fonts);
            let (page, layer) =
                self.doc
                    .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y_mm = PAGE_HEIGHT_MM - MARGIN_MM;
            self.page_no += 1;
        }
    }

    fn line(
        &mut self,
        text: &str,
        font: &IndirectFontRef,
        size_pt: f32,
        x_mm: f32,
        fonts: &Fonts,
    ) {
        let line_height = size_pt * PT_TO_MM * 1.4;
        self.ensure_room(line_height, fonts);
        self.y_mm -= line_height;
        if !text.is_empty() {
            self.layer
                .use_text(text, size_pt, Mm(x_mm), Mm(self.y_mm), font);
        }
    }

    fn space(&mut self, mm: f32) {
        self.y_mm -= mm;
    }
}

/// Render a Markdown article to PDF bytes.
pub fn render(markdown: &str) -> Result<Vec<u8>> {
    let content = sanitize_text(markdown);

    let title = crate::pipeline::markdown::extract_title(&content)
        .unwrap_or_else(|| "Generated Blog Article".to_string());

    let (doc, page, layer) = PdfDocument::new(&title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .context("Failed to load Helvetica")?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .context("Failed to load Helvetica-Bold")?,
        oblique: doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .context("Failed to load Helvetica-Oblique")?,
    };

    let first_layer = doc.get_page(page).get_layer(layer);
    let mut cursor = PageCursor::new(&doc, first_layer);

    // Centered title, wrapped when wide.
    for line in wrap_line(&title, TITLE_PT, USABLE_WIDTH_MM) {
        let glyph_mm = TITLE_PT * AVG_GLYPH_EM * PT_TO_MM;
        let text_width = line.len() as f32 * glyph_mm;
        let x = (PAGE_WIDTH_MM - text_width).max(0.0) / 2.0;
        cursor.line(&line, &fonts.bold, TITLE_PT, x.max(MARGIN_MM), &fonts);
    }
    cursor.space(4.0);

    // Accent rule under the title.
    cursor.layer.set_outline_color(Color::Rgb(Rgb::new(0.4, 0.49, 0.92, None)));
    cursor.layer.set_outline_thickness(0.8);
    cursor.layer.add_line(Line {
        points: vec![
            (Point::new(Mm(MARGIN_MM), Mm(cursor.y_mm)), false),
            (Point::new(Mm(PAGE_WIDTH_MM - MARGIN_MM), Mm(cursor.y_mm)), false),
        ],
        is_closed: false,
    });
    cursor.space(5.0);

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() {
            cursor.space(2.0);
            continue;
        }
        // The main title was already rendered above.
        if line.starts_with("# ") {
            continue;
        }

        if let Some(heading) = line.strip_prefix("## ") {
            cursor.space(3.0);
            for wrapped in wrap_line(heading, H2_PT, USABLE_WIDTH_MM) {
                cursor.line(&wrapped, &fonts.bold, H2_PT, MARGIN_MM, &fonts);
            }
            cursor.space(1.5);
        } else if let Some(heading) = line.strip_prefix("### ") {
            cursor.space(2.0);
            for wrapped in wrap_line(heading, H3_PT, USABLE_WIDTH_MM) {
                cursor.line(&wrapped, &fonts.bold, H3_PT, MARGIN_MM, &fonts);
            }
            cursor.space(1.0);
        } else if let Some(item) = line.strip_prefix("- ") {
            let indent = MARGIN_MM + 5.0;
            let width = USABLE_WIDTH_MM - 5.0;
            for (i, wrapped) in wrap_line(item, BODY_PT, width).iter().enumerate() {
                let text = if i == 0 {
                    format!("- {}", wrapped)
                } else {
                    wrapped.clone()
                };
                cursor.line(&text, &fonts.regular, BODY_PT, indent, &fonts);
            }
        } else {
            for wrapped in wrap_line(line, BODY_PT, USABLE_WIDTH_MM) {
                cursor.line(&wrapped, &fonts.regular, BODY_PT, MARGIN_MM, &fonts);
            }
        }
    }

    cursor.write_footer(&fonts);
    drop(cursor);
    doc.save_to_bytes().context("Failed to serialize PDF")
}
