//! Markup-preserving localisation.
//!
//! Only text leaves are shaped and reordered; tags, attribute values (link
//! targets, colours) and the tree structure pass through untouched.

use crate::bidi::{Reorderer, UnicodeReorderer};
use crate::error::Result;
use crate::markup::Fragment;
use crate::shaping::{ArabicShaper, Shaper};

/// Applies shaper-then-reorderer to every text leaf of a markup fragment.
pub struct Localizer {
    shaper: Box<dyn Shaper>,
    reorderer: Box<dyn Reorderer>,
}

impl Localizer {
    pub fn new(shaper: Box<dyn Shaper>, reorderer: Box<dyn Reorderer>) -> Self {
        Self { shaper, reorderer }
    }

    /// Shape and reorder a single plain-text run.
    pub fn visual(&self, text: &str) -> String {
        self.reorderer.to_visual(&self.shaper.shape(text))
    }

    /// Localise one markup fragment. Malformed markup is an error.
    pub fn localize(&self, markup: &str) -> Result<String> {
        if markup.is_empty() {
            return Ok(String::new());
        }
        let fragment = Fragment::parse(markup)?;
        Ok(fragment.map_text(|text| self.visual(text)).to_markup())
    }

    /// Localise each fragment independently; order and length are preserved.
    pub fn localize_all<S: AsRef<str>>(&self, fragments: &[S]) -> Result<Vec<String>> {
        fragments.iter().map(|f| self.localize(f.as_ref())).collect()
    }

    /// Absent input stays absent.
    pub fn localize_opt(&self, markup: Option<&str>) -> Result<Option<String>> {
        markup.map(|m| self.localize(m)).transpose()
    }
}

impl Default for Localizer {
    fn default() -> Self {
        Self::new(Box::new(ArabicShaper), Box::new(UnicodeReorderer::default()))
    }
}

impl std::fmt::Debug for Localizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Localizer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn plain_arabic_is_shaped_and_reversed() {
        let l = Localizer::default();
        assert_eq!(l.localize("سلام").unwrap(), "\u{FEE1}\u{FEFC}\u{FEB3}");
    }

    #[test]
    fn tags_and_attributes_are_untouched() {
        let l = Localizer::default();
        let out = l
            .localize("<link href='mailto:a@b.com?subject=سلام'><b>سلام</b></link>")
            .unwrap();
        assert_eq!(
            out,
            "<link href=\"mailto:a@b.com?subject=سلام\"><b>\u{FEE1}\u{FEFC}\u{FEB3}</b></link>"
        );
    }

    #[test]
    fn shape_is_preserved() {
        let l = Localizer::default();
        let input = "<b>فاتورة</b> رقم <color rgb='4b5563'>42</color>";
        let before = Fragment::parse(input).unwrap();
        let after = Fragment::parse(&l.localize(input).unwrap()).unwrap();
        assert_eq!(before.outline(), after.outline());
        assert_eq!(before.text_leaves().len(), after.text_leaves().len());
    }

    #[test]
    fn latin_passes_through() {
        let l = Localizer::default();
        assert_eq!(l.localize("Widget").unwrap(), "Widget");
        assert_eq!(l.localize("2024-01-01").unwrap(), "2024-01-01");
    }

    #[test]
    fn empty_inputs_are_identity() {
        let l = Localizer::default();
        assert_eq!(l.localize("").unwrap(), "");
        assert_eq!(l.localize_opt(None).unwrap(), None);
        assert!(l.localize_all::<&str>(&[]).unwrap().is_empty());
    }

    #[test]
    fn sequences_map_one_to_one() {
        let l = Localizer::default();
        let out = l.localize_all(&["Item", "سلام", "$10"]).unwrap();
        assert_eq!(out, vec!["Item", "\u{FEE1}\u{FEFC}\u{FEB3}", "$10"]);
    }

    #[test]
    fn malformed_markup_is_fatal() {
        let l = Localizer::default();
        assert!(matches!(l.localize("<b>open"), Err(Error::Markup(_))));
    }
}
