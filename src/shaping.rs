//! Arabic contextual letter shaping.
//!
//! Substitutes each Arabic letter with its isolated, final, initial or medial
//! presentation form (Unicode block FE70–FEFF) depending on its neighbours,
//! and folds lam + alef into the mandatory ligatures. Logical order is never
//! changed; reordering is the job of [`crate::bidi`].

/// Converts logical text into its shaped/connected form.
///
/// Implementations must be pure: same input, same output, no side effects.
pub trait Shaper: Send + Sync {
    fn shape(&self, text: &str) -> String;
}

/// Shaper for the basic Arabic alphabet (U+0621–U+064A).
#[derive(Debug, Clone, Copy, Default)]
pub struct ArabicShaper;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Joining {
    /// Joins on both sides (isolated, final, initial, medial).
    Dual,
    /// Joins only to the preceding letter (isolated, final).
    Right,
    /// Never joins (hamza).
    NonJoining,
}

/// `(letter, first presentation form, joining type)`; forms follow the first
/// one in isolated, final, initial, medial order.
const LETTERS: &[(char, u32, Joining)] = &[
    ('\u{0621}', 0xFE80, Joining::NonJoining),
    ('\u{0622}', 0xFE81, Joining::Right),
    ('\u{0623}', 0xFE83, Joining::Right),
    ('\u{0624}', 0xFE85, Joining::Right),
    ('\u{0625}', 0xFE87, Joining::Right),
    ('\u{0626}', 0xFE89, Joining::Dual),
    ('\u{0627}', 0xFE8D, Joining::Right),
    ('\u{0628}', 0xFE8F, Joining::Dual),
    ('\u{0629}', 0xFE93, Joining::Right),
    ('\u{062A}', 0xFE95, Joining::Dual),
    ('\u{062B}', 0xFE99, Joining::Dual),
    ('\u{062C}', 0xFE9D, Joining::Dual),
    ('\u{062D}', 0xFEA1, Joining::Dual),
    ('\u{062E}', 0xFEA5, Joining::Dual),
    ('\u{062F}', 0xFEA9, Joining::Right),
    ('\u{0630}', 0xFEAB, Joining::Right),
    ('\u{0631}', 0xFEAD, Joining::Right),
    ('\u{0632}', 0xFEAF, Joining::Right),
    ('\u{0633}', 0xFEB1, Joining::Dual),
    ('\u{0634}', 0xFEB5, Joining::Dual),
    ('\u{0635}', 0xFEB9, Joining::Dual),
    ('\u{0636}', 0xFEBD, Joining::Dual),
    ('\u{0637}', 0xFEC1, Joining::Dual),
    ('\u{0638}', 0xFEC5, Joining::Dual),
    ('\u{0639}', 0xFEC9, Joining::Dual),
    ('\u{063A}', 0xFECD, Joining::Dual),
    ('\u{0641}', 0xFED1, Joining::Dual),
    ('\u{0642}', 0xFED5, Joining::Dual),
    ('\u{0643}', 0xFED9, Joining::Dual),
    ('\u{0644}', 0xFEDD, Joining::Dual),
    ('\u{0645}', 0xFEE1, Joining::Dual),
    ('\u{0646}', 0xFEE5, Joining::Dual),
    ('\u{0647}', 0xFEE9, Joining::Dual),
    ('\u{0648}', 0xFEED, Joining::Right),
    ('\u{0649}', 0xFEEF, Joining::Right),
    ('\u{064A}', 0xFEF1, Joining::Dual),
];

const TATWEEL: char = '\u{0640}';
const LAM: char = '\u{0644}';

/// Lam-alef ligatures as `(alef, isolated, final)`.
const LAM_ALEF: &[(char, char, char)] = &[
    ('\u{0622}', '\u{FEF5}', '\u{FEF6}'),
    ('\u{0623}', '\u{FEF7}', '\u{FEF8}'),
    ('\u{0625}', '\u{FEF9}', '\u{FEFA}'),
    ('\u{0627}', '\u{FEFB}', '\u{FEFC}'),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    Isolated,
    Final,
    Initial,
    Medial,
}

fn letter(c: char) -> Option<(u32, Joining)> {
    LETTERS
        .iter()
        .find(|(l, _, _)| *l == c)
        .map(|(_, base, joining)| (*base, *joining))
}

fn joining(c: char) -> Option<Joining> {
    if c == TATWEEL {
        return Some(Joining::Dual);
    }
    letter(c).map(|(_, j)| j)
}

/// Harakat and other marks that sit on a letter without breaking the join.
fn is_transparent(c: char) -> bool {
    matches!(c, '\u{0610}'..='\u{061A}' | '\u{064B}'..='\u{065F}' | '\u{0670}' | '\u{06D6}'..='\u{06ED}')
}

fn lam_alef(alef: char) -> Option<(char, char)> {
    LAM_ALEF
        .iter()
        .find(|(a, _, _)| *a == alef)
        .map(|(_, iso, fin)| (*iso, *fin))
}

impl ArabicShaper {
    /// Whether the nearest non-transparent letter before `i` joins forward.
    fn joins_previous(chars: &[char], i: usize) -> bool {
        chars[..i]
            .iter()
            .rev()
            .find(|c| !is_transparent(**c))
            .and_then(|c| joining(*c))
            .is_some_and(|j| j == Joining::Dual)
    }

    /// Whether the nearest non-transparent letter after `i` joins backward.
    fn joins_next(chars: &[char], i: usize) -> bool {
        chars[i + 1..]
            .iter()
            .find(|c| !is_transparent(**c))
            .and_then(|c| joining(*c))
            .is_some_and(|j| j != Joining::NonJoining)
    }

    fn form(chars: &[char], i: usize, own: Joining) -> Form {
        let prev = Self::joins_previous(chars, i);
        let next = own == Joining::Dual && Self::joins_next(chars, i);
        match (prev && own != Joining::NonJoining, next) {
            (false, false) => Form::Isolated,
            (true, false) => Form::Final,
            (false, true) => Form::Initial,
            (true, true) => Form::Medial,
        }
    }
}

impl Shaper for ArabicShaper {
    fn shape(&self, text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len());
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if c == LAM {
                if let Some((iso, fin)) = chars.get(i + 1).and_then(|a| lam_alef(*a)) {
                    out.push(if Self::joins_previous(&chars, i) { fin } else { iso });
                    i += 2;
                    continue;
                }
            }

            match letter(c) {
                Some((base, own)) => {
                    let offset = match Self::form(&chars, i, own) {
                        Form::Isolated => 0,
                        Form::Final => 1,
                        Form::Initial => 2,
                        Form::Medial => 3,
                    };
                    out.push(char::from_u32(base + offset).unwrap_or(c));
                }
                None => out.push(c),
            }
            i += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin_is_untouched() {
        assert_eq!(ArabicShaper.shape("Widget $10"), "Widget $10");
    }

    #[test]
    fn isolated_letter() {
        assert_eq!(ArabicShaper.shape("ب"), "\u{FE8F}");
    }

    #[test]
    fn initial_medial_final() {
        // بيت: beh initial, yeh medial, teh final
        assert_eq!(ArabicShaper.shape("بيت"), "\u{FE91}\u{FEF4}\u{FE96}");
    }

    #[test]
    fn right_joining_letter_breaks_the_word() {
        // دب: dal never joins forward, so beh stays isolated
        assert_eq!(ArabicShaper.shape("دب"), "\u{FEA9}\u{FE8F}");
    }

    #[test]
    fn lam_alef_ligature() {
        // سلام: seen initial, lam-alef final, meem isolated
        assert_eq!(ArabicShaper.shape("سلام"), "\u{FEB3}\u{FEFC}\u{FEE1}");
        assert_eq!(ArabicShaper.shape("لا"), "\u{FEFB}");
    }

    #[test]
    fn harakat_do_not_break_joining() {
        // بَت with fatha on beh
        assert_eq!(ArabicShaper.shape("بَت"), "\u{FE91}\u{064E}\u{FE96}");
    }

    #[test]
    fn shaping_is_idempotent_on_presentation_forms() {
        let once = ArabicShaper.shape("فاتورة");
        assert_eq!(ArabicShaper.shape(&once), once);
    }
}
