//! Page canvas – a [`Canvas`] that places content top to bottom on fixed-size
//! pages and produces a [`LayoutConfig`] for the PDF renderer.
//!
//! Handles:
//! - a vertical cursor inside the page margins
//! - greedy word wrapping of styled runs and left/center/right alignment
//! - tables with explicit or natural column widths
//! - page breaks between table rows and before blocks that do not fit

use unicode_bidi::{bidi_class, BidiClass};

use crate::canvas::{Align, Canvas, ImageOptions, Padding, TableSpec, TextOptions};
use crate::error::{Error, Result};
use crate::fonts::FontManager;
use crate::inline::{parse_runs, plain_run, Color, Run, RunStyle};
use crate::layout_config::*;
use crate::resources::ImageData;

/// Prawn-compatible default font size before the composer sets its own.
pub const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Stroke width for cell borders.
const BORDER_WIDTH: f32 = 1.0;

/// Slack for float error when a line exactly fits its column.
const FIT_EPSILON: f32 = 0.01;

/// A wrapped line before alignment: its spans and total width.
type ShapedLine = (Vec<TextSpan>, f32);

/// A measured word or whitespace token.
type Piece<'a> = (String, &'a RunStyle, f32);

pub struct PageCanvas {
    fonts: FontManager,
    page_width: f32,
    page_height: f32,
    margin: f32,
    font_size: f32,
    /// Distance below the top margin where the next block goes.
    cursor: f32,
    pages: Vec<PageLayout>,
    current: Vec<LayoutBox>,
}

impl PageCanvas {
    pub fn new(page_width: f32, page_height: f32, margin: f32, fonts: FontManager) -> Self {
        Self {
            fonts,
            page_width,
            page_height,
            margin,
            font_size: DEFAULT_FONT_SIZE,
            cursor: 0.0,
            pages: Vec::new(),
            current: Vec::new(),
        }
    }

    pub fn fonts(&self) -> &FontManager {
        &self.fonts
    }

    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    /// Pages started so far, including the one being filled.
    pub fn page_count(&self) -> usize {
        self.pages.len() + 1
    }

    fn content_height(&self) -> f32 {
        self.page_height - 2.0 * self.margin
    }

    fn start_new_page(&mut self) {
        let boxes = std::mem::take(&mut self.current);
        self.pages.push(PageLayout {
            page_index: self.pages.len(),
            boxes,
        });
        self.cursor = 0.0;
        log::debug!("Started page {}", self.pages.len() + 1);
    }

    /// Break the page if a block of `height` does not fit below the cursor.
    /// A block taller than a whole page is placed at the top anyway.
    fn ensure_room(&mut self, height: f32) {
        let at_top = self.cursor <= 0.0 && self.current.is_empty();
        if self.cursor + height > self.content_height() && !at_top {
            self.start_new_page();
        }
        if height > self.content_height() {
            log::warn!(
                "Block of height {height:.1} is taller than the page content area ({:.1})",
                self.content_height()
            );
        }
    }

    /// Close the last page and hand over the finished layout.
    pub fn finish(mut self, title: impl Into<String>) -> LayoutConfig {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.start_new_page();
        }
        LayoutConfig {
            title: title.into(),
            page_width_pt: self.page_width,
            page_height_pt: self.page_height,
            pages: self.pages,
        }
    }

    fn runs(&self, content: &str, inline_format: bool, base: &RunStyle) -> Result<Vec<Run>> {
        if inline_format {
            Ok(parse_runs(content, base)?)
        } else {
            Ok(plain_run(content, base))
        }
    }

    /// Greedy word wrap of `runs` into lines no wider than `max_width`.
    /// `\n` always breaks. Non-positive widths disable wrapping.
    ///
    /// Runs are already in visual order. A hard line that reads right to left
    /// is filled from its right end, so its logical start lands on the first
    /// line.
    fn shape_lines(&self, runs: &[Run], max_width: f32, size: f32) -> Vec<ShapedLine> {
        let limit = if max_width > 0.0 { max_width + FIT_EPSILON } else { f32::INFINITY };
        let mut hard_lines: Vec<Vec<Piece>> = vec![Vec::new()];
        for run in runs {
            for (i, segment) in run.text.split('\n').enumerate() {
                if i > 0 {
                    hard_lines.push(Vec::new());
                }
                let Some(line) = hard_lines.last_mut() else { continue };
                for token in split_words(segment) {
                    let w = self.fonts.measure_text_width(token, size, run.style.bold);
                    line.push((token.to_string(), &run.style, w));
                }
            }
        }

        hard_lines
            .into_iter()
            .flat_map(|pieces| {
                if reads_right_to_left(&pieces) {
                    wrap_from_right(pieces, limit)
                } else {
                    wrap_from_left(pieces, limit)
                }
            })
            .map(|mut pieces| {
                while pieces.last().is_some_and(|(t, _, _)| is_blank(t)) {
                    pieces.pop();
                }
                merge_spans(pieces)
            })
            .collect()
    }

    /// Widest hard line of `runs`, unwrapped.
    fn natural_width(&self, runs: &[Run], size: f32) -> f32 {
        self.shape_lines(runs, 0.0, size)
            .iter()
            .map(|(_, w)| *w)
            .fold(0.0f32, f32::max)
    }

    fn text_content(
        &self,
        lines: Vec<ShapedLine>,
        pad: Padding,
        inner_width: f32,
        align: Align,
        size: f32,
    ) -> TextContent {
        let line_height = self.fonts.line_height_px(size);
        let lines = lines
            .into_iter()
            .enumerate()
            .map(|(i, (spans, width))| TextLine {
                spans,
                x_offset: pad.left + align_offset(align, inner_width, width),
                y_offset: pad.top + i as f32 * line_height,
                width,
            })
            .collect();
        TextContent {
            lines,
            font_size: size,
            line_height,
            ascender: self.fonts.ascender_px(size),
        }
    }

    fn column_widths(
        &self,
        table: &TableSpec,
        cells: &[Vec<(Vec<Run>, Padding)>],
        columns: usize,
    ) -> Result<Vec<f32>> {
        if let Some(widths) = &table.column_widths {
            if widths.len() != columns {
                return Err(Error::Render(format!(
                    "{} column widths given for a table with {columns} columns",
                    widths.len()
                )));
            }
            return Ok(widths.clone());
        }

        let mut natural = vec![0.0f32; columns];
        for row in cells {
            for (c, (runs, pad)) in row.iter().enumerate() {
                let w = self.natural_width(runs, self.font_size) + pad.horizontal();
                natural[c] = natural[c].max(w);
            }
        }
        let total: f32 = natural.iter().sum();
        let bounds = self.bounds_width();
        let target = match table.width {
            Some(w) => w,
            None if total > bounds => bounds,
            None => return Ok(natural),
        };
        if total <= 0.0 {
            return Ok(vec![target / columns as f32; columns]);
        }
        Ok(natural.iter().map(|w| w * target / total).collect())
    }
}

impl Canvas for PageCanvas {
    fn bounds_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    fn set_font_size(&mut self, size: f32) {
        self.font_size = size;
    }

    fn text(&mut self, content: &str, options: &TextOptions) -> Result<()> {
        let size = options.size.unwrap_or(self.font_size);
        let base = RunStyle {
            bold: options.bold,
            color: options
                .color
                .as_deref()
                .and_then(Color::from_hex)
                .unwrap_or_default(),
            ..RunStyle::default()
        };
        let runs = self.runs(content, options.inline_format, &base)?;
        if runs.is_empty() {
            return Ok(());
        }

        let width = self.bounds_width();
        let lines = self.shape_lines(&runs, width, size);
        let height = lines.len() as f32 * self.fonts.line_height_px(size);
        self.ensure_room(height);

        let mut lbox = LayoutBox::new(self.margin, self.margin + self.cursor, width, height);
        lbox.text = Some(self.text_content(lines, Padding::default(), width, options.align, size));
        log::debug!("Placed text block at y={:.1} ({height:.1} pt)", lbox.y);
        self.current.push(lbox);
        self.cursor += height;
        Ok(())
    }

    fn image(&mut self, image: &ImageData, options: &ImageOptions) -> Result<()> {
        let decoded = ::image::load_from_memory(&image.bytes)
            .map_err(|e| Error::resource(image.location.clone(), e))?;
        let (px_width, px_height) = (decoded.width(), decoded.height());
        if px_height == 0 {
            return Err(Error::resource(image.location.clone(), "image has zero height"));
        }

        let height = options.height;
        let width = height * px_width as f32 / px_height as f32;
        self.ensure_room(height);

        let x = self.margin + align_offset(options.position, self.bounds_width(), width);
        let mut lbox = LayoutBox::new(x, self.margin + self.cursor, width, height);
        lbox.image = Some(ImageContent {
            src: image.to_data_uri(),
            width,
            height,
        });
        self.current.push(lbox);
        self.cursor += height;
        Ok(())
    }

    fn table(&mut self, table: &TableSpec) -> Result<()> {
        let columns = table.column_count();
        if columns == 0 {
            return Ok(());
        }
        let size = self.font_size;
        let line_height = self.fonts.line_height_px(size);
        let style = &table.cell_style;
        let base = RunStyle::default();

        let mut cells = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let mut parsed = Vec::with_capacity(columns);
            for cell in row {
                let runs = self.runs(&cell.content, style.inline_format, &base)?;
                parsed.push((runs, cell.padding.unwrap_or(style.padding)));
            }
            parsed.resize(columns, (Vec::new(), style.padding));
            cells.push(parsed);
        }

        let widths = self.column_widths(table, &cells, columns)?;
        let table_width: f32 = widths.iter().sum();
        let x0 = self.margin + align_offset(table.position, self.bounds_width(), table_width);
        let border_color = style
            .border_color
            .as_deref()
            .and_then(Color::from_hex)
            .unwrap_or_default();

        for (r, row) in cells.iter().enumerate() {
            let laid: Vec<(Vec<ShapedLine>, Padding, f32)> = row
                .iter()
                .zip(&widths)
                .map(|((runs, pad), w)| {
                    let inner = w - pad.horizontal();
                    (self.shape_lines(runs, inner, size), *pad, inner)
                })
                .collect();
            let row_height = laid
                .iter()
                .map(|(lines, pad, _)| lines.len() as f32 * line_height + pad.vertical())
                .fold(0.0f32, f32::max);

            self.ensure_room(row_height);
            let y = self.margin + self.cursor;
            let sides = table.borders_for(r);

            let mut row_box = LayoutBox::new(x0, y, table_width, row_height);
            let mut x = x0;
            for ((lines, pad, inner), w) in laid.into_iter().zip(&widths) {
                let mut cell_box = LayoutBox::new(x, y, *w, row_height);
                if !sides.is_empty() {
                    cell_box.border = Some(BorderStyle {
                        width: BORDER_WIDTH,
                        color: border_color.to_array(),
                        sides: sides.to_vec(),
                    });
                }
                cell_box.text = Some(self.text_content(lines, pad, inner, style.align, size));
                row_box.children.push(cell_box);
                x += w;
            }
            self.current.push(row_box);
            self.cursor += row_height;
        }
        log::debug!(
            "Placed {}x{columns} table, {:.1} pt wide",
            table.rows.len(),
            table_width
        );
        Ok(())
    }

    fn move_down(&mut self, amount: f32) {
        self.cursor += amount;
        if self.cursor > self.content_height() {
            self.start_new_page();
        }
    }

    fn move_up(&mut self, amount: f32) {
        self.cursor = (self.cursor - amount).max(0.0);
    }
}

fn align_offset(align: Align, available: f32, used: f32) -> f32 {
    match align {
        Align::Left => 0.0,
        Align::Center => ((available - used) / 2.0).max(0.0),
        Align::Right => (available - used).max(0.0),
    }
}

/// The rightmost strong character is right-to-left. In visual order that is
/// where an RTL paragraph starts.
fn reads_right_to_left(pieces: &[Piece]) -> bool {
    pieces
        .iter()
        .rev()
        .flat_map(|(t, _, _)| t.chars().rev())
        .find_map(|c| match bidi_class(c) {
            BidiClass::L => Some(false),
            BidiClass::R | BidiClass::AL => Some(true),
            _ => None,
        })
        .unwrap_or(false)
}

fn is_blank(token: &str) -> bool {
    token.trim().is_empty()
}

fn wrap_from_left(pieces: Vec<Piece>, limit: f32) -> Vec<Vec<Piece>> {
    let mut lines = Vec::new();
    let mut current: Vec<Piece> = Vec::new();
    let mut line_w = 0.0f32;
    let mut soft_wrapped = false;
    for piece in pieces {
        let blank = is_blank(&piece.0);
        let has_words = current.iter().any(|(t, _, _)| !is_blank(t));
        if !blank && has_words && line_w + piece.2 > limit {
            lines.push(std::mem::take(&mut current));
            line_w = 0.0;
            soft_wrapped = true;
        }
        if blank && current.is_empty() && soft_wrapped {
            continue;
        }
        line_w += piece.2;
        current.push(piece);
    }
    lines.push(current);
    lines
}

/// Mirror image of [`wrap_from_left`]: take tokens from the visual right end
/// and keep each line in left-to-right order.
fn wrap_from_right(pieces: Vec<Piece>, limit: f32) -> Vec<Vec<Piece>> {
    let mut lines = Vec::new();
    let mut current: Vec<Piece> = Vec::new();
    let mut line_w = 0.0f32;
    let mut soft_wrapped = false;
    for piece in pieces.into_iter().rev() {
        let blank = is_blank(&piece.0);
        let has_words = current.iter().any(|(t, _, _)| !is_blank(t));
        if !blank && has_words && line_w + piece.2 > limit {
            lines.push(left_to_right(std::mem::take(&mut current)));
            line_w = 0.0;
            soft_wrapped = true;
        }
        if blank && current.is_empty() && soft_wrapped {
            continue;
        }
        line_w += piece.2;
        current.push(piece);
    }
    lines.push(left_to_right(current));
    lines
}

/// Restore visual order of a line collected right to left, dropping the
/// blanks at its left edge.
fn left_to_right(mut reversed: Vec<Piece>) -> Vec<Piece> {
    while reversed.last().is_some_and(|(t, _, _)| is_blank(t)) {
        reversed.pop();
    }
    reversed.reverse();
    reversed
}

/// Split into alternating word and whitespace tokens.
fn split_words(s: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_space = None;
    for (i, c) in s.char_indices() {
        let space = c.is_whitespace();
        if in_space.is_some_and(|prev| prev != space) {
            tokens.push(&s[start..i]);
            start = i;
        }
        in_space = Some(space);
    }
    if start < s.len() {
        tokens.push(&s[start..]);
    }
    tokens
}

/// Join adjacent pieces of the same style into positioned spans.
fn merge_spans(pieces: Vec<Piece>) -> ShapedLine {
    let mut spans: Vec<TextSpan> = Vec::new();
    let mut styles: Vec<&RunStyle> = Vec::new();
    let mut x = 0.0f32;
    for (text, style, w) in pieces {
        let same_style = styles.last().is_some_and(|last| *last == style);
        match spans.last_mut() {
            Some(span) if same_style => {
                span.text.push_str(&text);
                span.width += w;
            }
            _ => {
                spans.push(TextSpan {
                    text,
                    x_offset: x,
                    width: w,
                    bold: style.bold,
                    italic: style.italic,
                    underline: style.underline,
                    color: style.color.to_array(),
                    link: style.link.clone(),
                });
                styles.push(style);
            }
        }
        x += w;
    }
    (spans, x)
}
