//! PDF renderer – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).
//!
//! Text is already shaped and in visual order, so each span is written
//! left-to-right as-is. A configured TrueType font is embedded; without one
//! the builtin Helvetica faces are used and anything outside ASCII becomes
//! `?`.

use std::collections::{HashMap, HashSet};

use printpdf::*;

use crate::canvas::BorderSide;
use crate::error::{Error, Result};
use crate::fonts::FontManager;
use crate::layout_config::{LayoutBox, LayoutConfig};
use crate::resources::parse_data_uri;

const PT_TO_MM: f32 = 0.352778;
const UNDERLINE_THICKNESS: f32 = 0.5;

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// Fonts used when writing text spans.
enum PdfFonts {
    Embedded { regular: FontId, bold: FontId },
    Builtin,
}

impl PdfFonts {
    fn register(doc: &mut PdfDocument, fonts: &FontManager) -> Result<Self> {
        let Some(regular_bytes) = fonts.font_bytes(false) else {
            return Ok(PdfFonts::Builtin);
        };
        let mut warnings = Vec::new();
        let regular = ParsedFont::from_bytes(regular_bytes, 0, &mut warnings)
            .ok_or_else(|| Error::Font("printpdf could not parse the regular font".to_string()))?;
        let regular = doc.add_font(&regular);

        let bold = match fonts.font_bytes(true) {
            Some(bytes) => {
                let parsed = ParsedFont::from_bytes(bytes, 0, &mut warnings)
                    .ok_or_else(|| Error::Font("printpdf could not parse the bold font".to_string()))?;
                doc.add_font(&parsed)
            }
            None => regular.clone(),
        };
        for w in &warnings {
            log::debug!("Font warning: {w:?}");
        }
        Ok(PdfFonts::Embedded { regular, bold })
    }

    fn set_size(&self, size: f32, bold: bool) -> Op {
        match self {
            PdfFonts::Embedded { regular, bold: b } => Op::SetFontSize {
                size: Pt(size),
                font: if bold { b.clone() } else { regular.clone() },
            },
            PdfFonts::Builtin => Op::SetFontSizeBuiltinFont {
                size: Pt(size),
                font: builtin(bold),
            },
        }
    }

    fn write(&self, text: &str, bold: bool) -> Op {
        match self {
            PdfFonts::Embedded { regular, bold: b } => Op::WriteText {
                items: vec![TextItem::Text(text.to_string())],
                font: if bold { b.clone() } else { regular.clone() },
            },
            PdfFonts::Builtin => Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(to_builtin_text(text))],
                font: builtin(bold),
            },
        }
    }
}

fn builtin(bold: bool) -> BuiltinFont {
    if bold {
        BuiltinFont::HelveticaBold
    } else {
        BuiltinFont::Helvetica
    }
}

/// Render a LayoutConfig into PDF bytes.
///
/// Images that are not base64 data URIs, or that cannot be decoded, fail the
/// render with [`Error::Resource`].
pub fn render_pdf(config: &LayoutConfig, fonts: &FontManager) -> Result<Vec<u8>> {
    let page_w = Mm(config.page_width_pt * PT_TO_MM);
    let page_h = Mm(config.page_height_pt * PT_TO_MM);

    let mut doc = PdfDocument::new(&config.title);
    let pdf_fonts = PdfFonts::register(&mut doc, fonts)?;

    // ── Pre-register all images ────────────────────────────────────────────
    let mut all_srcs: HashSet<&str> = HashSet::new();
    for lbox in config.all_boxes() {
        if let Some(img) = &lbox.image {
            all_srcs.insert(img.src.as_str());
        }
    }

    let mut image_resources: HashMap<String, ImageResource> = HashMap::new();
    let mut img_warnings: Vec<PdfWarnMsg> = Vec::new();

    for src in all_srcs {
        let location: String = src.chars().take(40).collect();
        let bytes = parse_data_uri(src).map_err(|e| Error::resource(location.clone(), e))?;

        let dyn_img =
            ::image::load_from_memory(&bytes).map_err(|e| Error::resource(location.clone(), e))?;
        let (px_width, px_height) = (dyn_img.width(), dyn_img.height());

        let raw = RawImage::decode_from_bytes(&bytes, &mut img_warnings)
            .map_err(|e| Error::resource(location, e))?;
        let xobj_id = doc.add_image(&raw);

        image_resources.insert(
            src.to_string(),
            ImageResource {
                xobj_id,
                px_width,
                px_height,
            },
        );
    }

    // ── Render pages ──────────────────────────────────────────────────────
    let mut pages = Vec::new();

    for page_layout in &config.pages {
        let mut ops = Vec::new();
        for lbox in &page_layout.boxes {
            render_box(&mut ops, lbox, config.page_height_pt, &image_resources, &pdf_fonts);
        }
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    log::debug!("Rendering {} page(s) to PDF", pages.len());
    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut Vec::new());

    Ok(bytes)
}

/// Fold text for the builtin Helvetica faces. printpdf writes the string's
/// bytes as-is, so only ASCII survives the WinAnsi encoding intact. Common
/// typographic punctuation is folded to its ASCII look-alike and everything
/// else becomes `?`.
fn to_builtin_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            c if c.is_ascii() => out.push(c),
            '\u{00A0}' => out.push(' '),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2022}' => out.push('*'),
            '\u{2026}' => out.push_str("..."),
            _ => out.push('?'),
        }
    }
    out
}

fn rgb(color: [f32; 4]) -> Color {
    Color::Rgb(Rgb {
        r: color[0],
        g: color[1],
        b: color[2],
        icc_profile: None,
    })
}

fn line(from: (f32, f32), to: (f32, f32)) -> Op {
    let point = |(x, y): (f32, f32)| LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    };
    Op::DrawLine {
        line: Line {
            points: vec![point(from), point(to)],
            is_closed: false,
        },
    }
}

/// Recursively render a LayoutBox and its children into PDF ops.
fn render_box(
    ops: &mut Vec<Op>,
    lbox: &LayoutBox,
    page_height: f32,
    images: &HashMap<String, ImageResource>,
    fonts: &PdfFonts,
) {
    // PDF origin is bottom-left, layout origin is top-left.
    let top = page_height - lbox.y;
    let bottom = top - lbox.height;
    let (left, right) = (lbox.x, lbox.x + lbox.width);

    if let Some(border) = &lbox.border {
        ops.push(Op::SetOutlineColor { col: rgb(border.color) });
        ops.push(Op::SetOutlineThickness { pt: Pt(border.width) });
        for side in &border.sides {
            let op = match side {
                BorderSide::Top => line((left, top), (right, top)),
                BorderSide::Right => line((right, top), (right, bottom)),
                BorderSide::Bottom => line((left, bottom), (right, bottom)),
                BorderSide::Left => line((left, top), (left, bottom)),
            };
            ops.push(op);
        }
    }

    if let Some(text) = &lbox.text {
        for tline in &text.lines {
            let baseline = top - tline.y_offset - text.ascender;
            for span in &tline.spans {
                if span.text.is_empty() {
                    continue;
                }
                let x = lbox.x + tline.x_offset + span.x_offset;

                ops.push(Op::StartTextSection);
                ops.push(Op::SetTextCursor {
                    pos: Point {
                        x: Pt(x),
                        y: Pt(baseline),
                    },
                });
                ops.push(fonts.set_size(text.font_size, span.bold));
                ops.push(Op::SetLineHeight {
                    lh: Pt(text.line_height),
                });
                ops.push(Op::SetFillColor { col: rgb(span.color) });
                ops.push(fonts.write(&span.text, span.bold));
                ops.push(Op::EndTextSection);

                if span.underline {
                    let y = baseline - text.font_size * 0.1;
                    ops.push(Op::SetOutlineThickness {
                        pt: Pt(UNDERLINE_THICKNESS),
                    });
                    ops.push(Op::SetOutlineColor { col: rgb(span.color) });
                    ops.push(line((x, y), (x + span.width, y)));
                }
            }
        }
    }

    if let Some(img) = &lbox.image {
        if let Some(res) = images.get(&img.src) {
            // At dpi=72 printpdf renders 1 px = 1 pt, so
            // scale = desired_pt / px_dim.
            let scale_x = if res.px_width > 0 {
                img.width / res.px_width as f32
            } else {
                1.0
            };
            let scale_y = if res.px_height > 0 {
                img.height / res.px_height as f32
            } else {
                1.0
            };

            ops.push(Op::UseXobject {
                id: res.xobj_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(lbox.x)),
                    translate_y: Some(Pt(top - img.height)),
                    dpi: Some(72.0),
                    scale_x: Some(scale_x),
                    scale_y: Some(scale_y),
                    rotate: None,
                },
            });
        }
    }

    for child in &lbox.children {
        render_box(ops, child, page_height, images, fonts);
    }
}
