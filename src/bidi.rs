//! Logical → visual reordering built on `unicode-bidi`.
//!
//! The page renderer places glyphs strictly left to right, so every text run
//! is handed over already in visual order: RTL runs reversed, embedded LTR
//! runs (digits, Latin words) keeping their own internal order.

use std::borrow::Cow;

use unicode_bidi::{BidiInfo, Level, LTR_LEVEL, RTL_LEVEL};

/// Converts shaped logical-order text into visual order.
///
/// Implementations must be pure.
pub trait Reorderer: Send + Sync {
    fn to_visual(&self, text: &str) -> String;
}

/// Base direction hint for paragraph analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseDirection {
    /// Detect paragraph base direction from text (first strong char).
    #[default]
    Auto,
    /// Force overall left-to-right base direction.
    Ltr,
    /// Force overall right-to-left base direction.
    Rtl,
}

impl BaseDirection {
    pub fn to_level(self) -> Option<Level> {
        match self {
            BaseDirection::Auto => None,
            BaseDirection::Ltr => Some(LTR_LEVEL),
            BaseDirection::Rtl => Some(RTL_LEVEL),
        }
    }
}

/// UAX #9 reorderer. Each `\n`-separated line is reordered on its own so that
/// line breaks stay where the author put them.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeReorderer {
    pub base: BaseDirection,
}

impl UnicodeReorderer {
    pub fn new(base: BaseDirection) -> Self {
        Self { base }
    }

    fn reorder_line<'a>(&self, line: &'a str) -> Cow<'a, str> {
        if line.is_empty() {
            return Cow::Borrowed(line);
        }
        let info = BidiInfo::new(line, self.base.to_level());
        if !info.has_rtl() {
            return Cow::Borrowed(line);
        }
        let mut visual = String::with_capacity(line.len());
        for para in &info.paragraphs {
            visual.push_str(&info.reorder_line(para, para.range.clone()));
        }
        Cow::Owned(visual)
    }
}

impl Reorderer for UnicodeReorderer {
    fn to_visual(&self, text: &str) -> String {
        text.split('\n')
            .map(|line| self.reorder_line(line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
