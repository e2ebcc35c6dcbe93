//! Layout config – the intermediate representation between page placement
//! and PDF rendering. This is the "frozen" structure that encodes exactly what
//! goes on each page, with all text already in visual order.

use serde::{Deserialize, Serialize};

use crate::canvas::BorderSide;
use crate::error::Result;

/// A complete document layout ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Document title embedded in the PDF metadata.
    #[serde(default = "LayoutConfig::default_title")]
    pub title: String,
    /// Width of each page in PDF points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    /// Height of each page in PDF points.
    pub page_height_pt: f32,
    /// Ordered list of pages.
    pub pages: Vec<PageLayout>,
}

/// One page of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_index: usize,
    pub boxes: Vec<LayoutBox>,
}

/// A positioned rectangle with optional content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutBox {
    /// Position relative to page top-left, in points.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub border: Option<BorderStyle>,

    /// Content (mutually exclusive in practice)
    pub text: Option<TextContent>,
    pub image: Option<ImageContent>,

    /// Children (table cells of a row box)
    pub children: Vec<LayoutBox>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorderStyle {
    pub width: f32,
    pub color: [f32; 4],
    pub sides: Vec<BorderSide>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    /// Pre-wrapped lines of styled spans.
    pub lines: Vec<TextLine>,
    pub font_size: f32,
    pub line_height: f32,
    /// Distance from the top of a line to its baseline.
    pub ascender: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
    /// X offset within the layout box (padding + alignment)
    pub x_offset: f32,
    /// Y offset from the top of the layout box
    pub y_offset: f32,
    pub width: f32,
}

/// A piece of a line in one style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    /// X offset from the start of the line
    pub x_offset: f32,
    pub width: f32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: [f32; 4],
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageContent {
    /// base64 `data:` URI of the encoded image
    pub src: String,
    pub width: f32,
    pub height: f32,
}

impl LayoutConfig {
    /// Create an empty US-letter layout config.
    pub fn letter() -> Self {
        Self {
            title: Self::default_title(),
            page_width_pt: 612.0,
            page_height_pt: 792.0,
            pages: Vec::new(),
        }
    }

    fn default_title() -> String {
        "receipt".to_string()
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Every box on every page, depth first.
    pub fn all_boxes(&self) -> Vec<&LayoutBox> {
        let mut out = Vec::new();
        for page in &self.pages {
            for lbox in &page.boxes {
                lbox.visit(&mut |b| out.push(b));
            }
        }
        out
    }
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            border: None,
            text: None,
            image: None,
            children: Vec::new(),
        }
    }

    pub fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a LayoutBox)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

impl TextContent {
    /// Concatenated span text of every line, joined with `\n`.
    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
