//! Inline formatting – flattens a localised markup fragment into styled runs
//! for the page renderer.
//!
//! Recognised tags: `b`/`strong`, `i`/`em`, `u`, `color rgb=".."`,
//! `link href=".."` (also `a`) and `br`. Unknown tags are transparent.

use serde::{Deserialize, Serialize};

use crate::error::MarkupError;
use crate::markup::{Fragment, Node};

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        if hex.len() == 6 {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()? as f32 / 255.0;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()? as f32 / 255.0;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()? as f32 / 255.0;
            Some(Self { r, g, b, a: 1.0 })
        } else if hex.len() == 3 {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()? as f32 / 255.0;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()? as f32 / 255.0;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()? as f32 / 255.0;
            Some(Self { r, g, b, a: 1.0 })
        } else {
            None
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Color,
    pub link: Option<String>,
}

/// A stretch of text with one style. `\n` inside `text` is a hard break.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub style: RunStyle,
}

/// Treat `content` as plain text in the base style.
pub fn plain_run(content: &str, base: &RunStyle) -> Vec<Run> {
    if content.is_empty() {
        return Vec::new();
    }
    vec![Run {
        text: content.to_string(),
        style: base.clone(),
    }]
}

/// Parse `markup` into runs, starting from `base`.
pub fn parse_runs(markup: &str, base: &RunStyle) -> Result<Vec<Run>, MarkupError> {
    let fragment = Fragment::parse(markup)?;
    let mut runs = Vec::new();
    walk(&fragment.nodes, base, &mut runs);
    Ok(runs)
}

fn walk(nodes: &[Node], style: &RunStyle, runs: &mut Vec<Run>) {
    for node in nodes {
        match node {
            Node::Text(text) => push_run(runs, text, style),
            Node::Element(e) => {
                let mut inner = style.clone();
                match e.tag().as_str() {
                    "b" | "strong" => inner.bold = true,
                    "i" | "em" => inner.italic = true,
                    "u" => inner.underline = true,
                    "color" => {
                        if let Some(c) = e.attr("rgb").and_then(Color::from_hex) {
                            inner.color = c;
                        }
                    }
                    "link" | "a" => inner.link = e.attr("href").map(str::to_string),
                    "br" => {
                        push_run(runs, "\n", style);
                        continue;
                    }
                    _ => {}
                }
                walk(&e.children, &inner, runs);
            }
        }
    }
}

/// Append, merging with the previous run when the style is identical.
fn push_run(runs: &mut Vec<Run>, text: &str, style: &RunStyle) {
    if text.is_empty() {
        return;
    }
    match runs.last_mut() {
        Some(last) if last.style == *style => last.text.push_str(text),
        _ => runs.push(Run {
            text: text.to_string(),
            style: style.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_styles_accumulate() {
        let runs = parse_runs(
            "<color rgb='326d92'><link href='mailto:a@b.com'><b>a@b.com</b></link></color> tail",
            &RunStyle::default(),
        )
        .unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs[0].style.bold);
        assert_eq!(runs[0].style.link.as_deref(), Some("mailto:a@b.com"));
        assert!((runs[0].style.color.b - 146.0 / 255.0).abs() < 0.001);
        assert_eq!(runs[1].text, " tail");
        assert!(!runs[1].style.bold);
        assert_eq!(runs[1].style.color, Color::BLACK);
    }

    #[test]
    fn same_style_runs_merge() {
        let runs = parse_runs("one<span> two</span>", &RunStyle::default()).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "one two");
    }

    #[test]
    fn br_is_a_hard_break() {
        let runs = parse_runs("a<br>b", &RunStyle::default()).unwrap();
        assert_eq!(runs[0].text, "a\nb");
    }

    #[test]
    fn color_from_hex() {
        let c = Color::from_hex("#ff8800").unwrap();
        assert!((c.r - 1.0).abs() < 0.01);
        assert!((c.g - 0.533).abs() < 0.01);
        assert_eq!(Color::from_hex("eee").map(|c| c.r), Some(238.0 / 255.0));
        assert!(Color::from_hex("nope").is_none());
    }
}
