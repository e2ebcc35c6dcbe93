//! The placement surface the composer draws on.
//!
//! A [`Canvas`] knows how to place text runs, images and tables at a vertical
//! cursor and nothing about bidirectional text: everything it receives is
//! already in visual order. [`crate::page::PageCanvas`] lays pages out for PDF
//! output; [`RecordingCanvas`] just keeps the calls, which is what tests and
//! the `--calls` CLI flag use.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::resources::ImageData;

/// Horizontal anchoring of text, images, tables and cell content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderSide {
    Top,
    Right,
    Bottom,
    Left,
}

/// Cell padding in points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Padding {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Padding {
    pub fn uniform(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

/// `[top, right, bottom, left]`
impl From<[f32; 4]> for Padding {
    fn from([top, right, bottom, left]: [f32; 4]) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextOptions {
    /// Font size; `None` uses the canvas' current size.
    pub size: Option<f32>,
    pub bold: bool,
    /// Hex colour such as `"4b5563"`.
    pub color: Option<String>,
    pub align: Align,
    /// Interpret `<b>`, `<i>`, `<u>`, `<color>` and `<link>` tags.
    pub inline_format: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageOptions {
    pub height: f32,
    pub position: Align,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub content: String,
    /// Overrides the table's cell padding.
    pub padding: Option<Padding>,
}

impl Cell {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            padding: None,
        }
    }

    pub fn with_padding(mut self, padding: impl Into<Padding>) -> Self {
        self.padding = Some(padding.into());
        self
    }
}

/// Style applied to every cell unless a row or cell overrides it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellStyle {
    pub borders: Vec<BorderSide>,
    pub border_color: Option<String>,
    pub padding: Padding,
    pub align: Align,
    pub inline_format: bool,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            borders: vec![
                BorderSide::Top,
                BorderSide::Right,
                BorderSide::Bottom,
                BorderSide::Left,
            ],
            border_color: None,
            padding: Padding::uniform(5.0),
            align: Align::Left,
            inline_format: false,
        }
    }
}

/// Border override for one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowBorders {
    pub row: usize,
    pub sides: Vec<BorderSide>,
}

/// A table placed as one unit. Rows are laid out top to bottom and cells
/// strictly left to right.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableSpec {
    pub rows: Vec<Vec<Cell>>,
    /// Total width; `None` sizes the table to its content.
    pub width: Option<f32>,
    pub position: Align,
    /// Explicit widths, one per column, in visual order.
    pub column_widths: Option<Vec<f32>>,
    pub cell_style: CellStyle,
    pub row_borders: Vec<RowBorders>,
}

impl TableSpec {
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Borders for cells of `row`.
    pub fn borders_for(&self, row: usize) -> &[BorderSide] {
        self.row_borders
            .iter()
            .find(|rb| rb.row == row)
            .map(|rb| rb.sides.as_slice())
            .unwrap_or(&self.cell_style.borders)
    }
}

/// Renderer primitives consumed by the composer.
pub trait Canvas {
    /// Usable width between the page margins.
    fn bounds_width(&self) -> f32;

    /// Default size for subsequent text.
    fn set_font_size(&mut self, size: f32);

    /// Place a text block at the cursor and move the cursor below it.
    fn text(&mut self, content: &str, options: &TextOptions) -> Result<()>;

    /// Place an image at the cursor and move the cursor below it.
    fn image(&mut self, image: &ImageData, options: &ImageOptions) -> Result<()>;

    /// Place a table at the cursor and move the cursor below it.
    fn table(&mut self, table: &TableSpec) -> Result<()>;

    fn move_down(&mut self, amount: f32);

    fn move_up(&mut self, amount: f32);
}

/// One recorded placement call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum CanvasCall {
    FontSize { size: f32 },
    Text { content: String, options: TextOptions },
    Image { location: String, options: ImageOptions },
    Table { table: TableSpec },
    MoveDown { amount: f32 },
    MoveUp { amount: f32 },
}

/// A canvas that records every call in order and places nothing.
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    pub width: f32,
    pub calls: Vec<CanvasCall>,
}

impl RecordingCanvas {
    pub fn new(width: f32) -> Self {
        Self {
            width,
            calls: Vec::new(),
        }
    }

    pub fn texts(&self) -> impl Iterator<Item = (&str, &TextOptions)> {
        self.calls.iter().filter_map(|c| match c {
            CanvasCall::Text { content, options } => Some((content.as_str(), options)),
            _ => None,
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSpec> {
        self.calls.iter().filter_map(|c| match c {
            CanvasCall::Table { table } => Some(table),
            _ => None,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.calls)?)
    }
}

impl Canvas for RecordingCanvas {
    fn bounds_width(&self) -> f32 {
        self.width
    }

    fn set_font_size(&mut self, size: f32) {
        self.calls.push(CanvasCall::FontSize { size });
    }

    fn text(&mut self, content: &str, options: &TextOptions) -> Result<()> {
        self.calls.push(CanvasCall::Text {
            content: content.to_string(),
            options: options.clone(),
        });
        Ok(())
    }

    fn image(&mut self, image: &ImageData, options: &ImageOptions) -> Result<()> {
        self.calls.push(CanvasCall::Image {
            location: image.location.clone(),
            options: options.clone(),
        });
        Ok(())
    }

    fn table(&mut self, table: &TableSpec) -> Result<()> {
        self.calls.push(CanvasCall::Table {
            table: table.clone(),
        });
        Ok(())
    }

    fn move_down(&mut self, amount: f32) {
        self.calls.push(CanvasCall::MoveDown { amount });
    }

    fn move_up(&mut self, amount: f32) {
        self.calls.push(CanvasCall::MoveUp { amount });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_from_array_is_top_right_bottom_left() {
        let p = Padding::from([0.0, 1.0, 2.0, 8.0]);
        assert_eq!(p.top, 0.0);
        assert_eq!(p.right, 1.0);
        assert_eq!(p.bottom, 2.0);
        assert_eq!(p.left, 8.0);
        assert_eq!(p.horizontal(), 9.0);
    }

    #[test]
    fn row_border_override() {
        let table = TableSpec {
            rows: vec![vec![Cell::new("a")], vec![Cell::new("b")]],
            cell_style: CellStyle {
                borders: vec![],
                ..CellStyle::default()
            },
            row_borders: vec![RowBorders {
                row: 0,
                sides: vec![BorderSide::Bottom],
            }],
            ..TableSpec::default()
        };
        assert_eq!(table.borders_for(0), &[BorderSide::Bottom]);
        assert!(table.borders_for(1).is_empty());
        assert_eq!(table.column_count(), 1);
    }

    #[test]
    fn recording_keeps_call_order() {
        let mut canvas = RecordingCanvas::new(540.0);
        canvas.move_down(16.0);
        canvas.text("hi", &TextOptions::default()).unwrap();
        canvas.move_up(4.0);
        assert_eq!(canvas.calls.len(), 3);
        assert_eq!(canvas.calls[0], CanvasCall::MoveDown { amount: 16.0 });
        assert!(canvas.to_json().unwrap().contains("\"call\": \"text\""));
    }
}
