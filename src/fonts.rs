//! Font loading and text measurement using `ttf-parser`, plus the
//! process-wide default font.
//!
//! Arabic presentation forms need a real TrueType font to show up in the
//! PDF. Without one, the builtin Helvetica metrics are used and only Latin
//! text renders.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use serde::Deserialize;

use crate::error::{ConfigError, Error, Result};

/// Family name under which a configured font is registered.
pub const PRIMARY_FAMILY: &str = "Primary";
const BUILTIN_FAMILY: &str = "Helvetica";

/// A font file on disk or already in memory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "PathBuf")]
pub enum FontSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for FontSource {
    fn from(p: PathBuf) -> Self {
        FontSource::Path(p)
    }
}

impl FontSource {
    fn read(&self) -> Result<Vec<u8>> {
        match self {
            FontSource::Path(p) => std::fs::read(p)
                .map_err(|e| Error::Font(format!("cannot read {}: {e}", p.display()))),
            FontSource::Bytes(b) => Ok(b.clone()),
        }
    }
}

/// Style name → font file. `normal` is required, `bold` falls back to it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FontFamily {
    pub normal: FontSource,
    #[serde(default)]
    pub bold: Option<FontSource>,
}

impl FontFamily {
    pub fn new(normal: FontSource) -> Self {
        Self { normal, bold: None }
    }

    pub fn with_bold(mut self, bold: FontSource) -> Self {
        self.bold = Some(bold);
        self
    }

    /// Build from a `{"normal": .., "bold": ..}` style map.
    pub fn from_styles(mut styles: HashMap<String, FontSource>) -> Result<Self> {
        let normal = styles
            .remove("normal")
            .ok_or_else(|| Error::Font("font family needs a `normal` style".to_string()))?;
        Ok(Self {
            normal,
            bold: styles.remove("bold"),
        })
    }
}

static DEFAULT_FONT: OnceLock<FontFamily> = OnceLock::new();

/// Set the font used by documents that do not configure one.
///
/// Call once at startup, before any document is built. Later calls fail.
pub fn set_default_font(family: FontFamily) -> std::result::Result<(), ConfigError> {
    DEFAULT_FONT
        .set(family)
        .map_err(|_| ConfigError::DefaultFontAlreadySet)
}

pub fn default_font() -> Option<&'static FontFamily> {
    DEFAULT_FONT.get()
}

/// A loaded font face with metrics.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes (kept alive for ttf-parser's zero-copy API).
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
    pub line_gap: f32,
}

/// Manages loaded fonts.
#[derive(Clone)]
pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
    /// Fallback metrics if no font is loaded.
    default_key: FontKey,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
}

impl FontManager {
    pub fn new() -> Self {
        Self {
            fonts: HashMap::new(),
            default_key: FontKey {
                family: BUILTIN_FAMILY.to_string(),
                bold: false,
            },
        }
    }

    /// Load every style of `family` under [`PRIMARY_FAMILY`].
    pub fn from_family(family: &FontFamily) -> Result<Self> {
        let mut mgr = Self::new();
        mgr.load_font(PRIMARY_FAMILY, false, family.normal.read()?)?;
        if let Some(bold) = &family.bold {
            mgr.load_font(PRIMARY_FAMILY, true, bold.read()?)?;
        }
        Ok(mgr)
    }

    /// Fonts for a document: its own family, else the process default, else
    /// builtin Helvetica metrics.
    pub fn for_document(family: Option<&FontFamily>) -> Result<Self> {
        match family.or_else(|| default_font()) {
            Some(f) => Self::from_family(f),
            None => Ok(Self::default()),
        }
    }

    /// Load a TTF/OTF font from bytes.
    pub fn load_font(&mut self, family: &str, bold: bool, bytes: Vec<u8>) -> Result<()> {
        let face = ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| Error::Font(format!("Failed to parse font: {e}")))?;

        let data = FontData {
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            descender: face.descender() as f32,
            line_gap: face.line_gap() as f32,
            bytes,
        };

        let key = FontKey {
            family: family.to_string(),
            bold,
        };

        if !self.has_real_fonts() {
            self.default_key = key.clone();
        }
        self.fonts.insert(key, data);
        Ok(())
    }

    /// Register a builtin font with synthetic Helvetica-like metrics (for when
    /// no TTF is available).
    pub fn ensure_default(&mut self) {
        if self.fonts.is_empty() {
            for bold in [false, true] {
                self.fonts.insert(
                    FontKey {
                        family: BUILTIN_FAMILY.to_string(),
                        bold,
                    },
                    FontData {
                        bytes: Vec::new(),
                        units_per_em: 1000.0,
                        ascender: 718.0,
                        descender: -207.0,
                        line_gap: 231.0,
                    },
                );
            }
        }
    }

    fn key(&self, bold: bool) -> FontKey {
        FontKey {
            family: self.default_key.family.clone(),
            bold,
        }
    }

    /// Font data for the active family, falling back to the regular style.
    fn get(&self, bold: bool) -> Option<&FontData> {
        self.fonts
            .get(&self.key(bold))
            .or_else(|| self.fonts.get(&self.default_key))
    }

    /// Measure the width of a string at a given font size (in pt).
    /// With real font bytes we sum glyph advances, otherwise we use an
    /// average character width heuristic (0.5 × font_size per char).
    pub fn measure_text_width(&self, text: &str, font_size: f32, bold: bool) -> f32 {
        let heuristic = || {
            // Bold is ~10 % wider.
            let avg = if bold { 0.55 } else { 0.5 };
            text.chars().count() as f32 * font_size * avg
        };

        let Some(data) = self.get(bold).filter(|d| !d.bytes.is_empty()) else {
            return heuristic();
        };

        // Parse the font and sum horizontal advances
        match ttf_parser::Face::parse(&data.bytes, 0) {
            Ok(face) => {
                let scale = font_size / data.units_per_em;
                text.chars()
                    .map(|ch| match face.glyph_index(ch) {
                        Some(gid) => face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale,
                        None => font_size * 0.5,
                    })
                    .sum()
            }
            Err(_) => heuristic(),
        }
    }

    /// Line height (ascender − descender + line gap) in pt.
    pub fn line_height_px(&self, font_size: f32) -> f32 {
        match self.get(false) {
            Some(d) => (d.ascender - d.descender + d.line_gap) / d.units_per_em * font_size,
            None => font_size * 1.2,
        }
    }

    /// Get the ascender in pt for the active font.
    pub fn ascender_px(&self, font_size: f32) -> f32 {
        match self.get(false) {
            Some(d) => d.ascender / d.units_per_em * font_size,
            None => font_size * 0.75,
        }
    }

    /// Check if real font bytes are loaded for the default font.
    pub fn has_real_fonts(&self) -> bool {
        self.fonts
            .get(&self.default_key)
            .map(|d| !d.bytes.is_empty())
            .unwrap_or(false)
    }

    /// Get font bytes for embedding in PDF, `None` for builtin metrics.
    pub fn font_bytes(&self, bold: bool) -> Option<&[u8]> {
        self.fonts.get(&self.key(bold)).and_then(|d| {
            if d.bytes.is_empty() {
                None
            } else {
                Some(d.bytes.as_slice())
            }
        })
    }
}

impl Default for FontManager {
    fn default() -> Self {
        let mut mgr = Self::new();
        mgr.ensure_default();
        mgr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_text_width() {
        let mgr = FontManager::default();
        let w = mgr.measure_text_width("Hello", 16.0, false);
        // 5 chars × 16 × 0.5 = 40
        assert!((w - 40.0).abs() < 0.1);
        assert!(mgr.measure_text_width("Hello", 16.0, true) > w);
    }

    #[test]
    fn builtin_line_height() {
        let mgr = FontManager::default();
        assert!((mgr.line_height_px(10.0) - 11.56).abs() < 0.01);
        assert!((mgr.ascender_px(10.0) - 7.18).abs() < 0.01);
        assert!(!mgr.has_real_fonts());
        assert!(mgr.font_bytes(false).is_none());
    }

    #[test]
    fn garbage_font_bytes_are_rejected() {
        let family = FontFamily::new(FontSource::Bytes(vec![0, 1, 2, 3]));
        assert!(matches!(FontManager::from_family(&family), Err(Error::Font(_))));
    }

    #[test]
    fn missing_font_file_is_a_font_error() {
        let family = FontFamily::new(FontSource::Path("/no/such/font.ttf".into()));
        assert!(matches!(FontManager::from_family(&family), Err(Error::Font(_))));
    }

    #[test]
    fn style_map_requires_normal() {
        let mut styles = HashMap::new();
        styles.insert("bold".to_string(), FontSource::Path("b.ttf".into()));
        assert!(FontFamily::from_styles(styles.clone()).is_err());
        styles.insert("normal".to_string(), FontSource::Path("n.ttf".into()));
        let family = FontFamily::from_styles(styles).unwrap();
        assert_eq!(family.normal, FontSource::Path("n.ttf".into()));
        assert!(family.bold.is_some());
    }

    #[test]
    fn family_deserialises_from_paths() {
        let family: FontFamily =
            serde_json::from_str(r#"{"normal": "fonts/a.ttf", "bold": "fonts/b.ttf"}"#).unwrap();
        assert_eq!(family.normal, FontSource::Path("fonts/a.ttf".into()));
    }
}
