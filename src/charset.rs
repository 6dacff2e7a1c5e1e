//! Fixed code-point tables used when generating single characters.
//!
//! The tables are built once, on first use, and are read-only afterwards.

use once_cell::sync::Lazy;
use rand::Rng;
use rand::seq::SliceRandom;

pub const WHITESPACE: &str = " \t\n\r\u{0B}\u{0C}";
pub const ASCII_LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub const ASCII_UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const DIGITS: &str = "0123456789";
pub const HEX_DIGITS: &str = "0123456789abcdefABCDEF";
pub const OCT_DIGITS: &str = "01234567";
pub const PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

// Inclusive code-point blocks mixed into the "all" universe.
pub const PUNCTUATION_EXTENDED: (u32, u32) = (161, 191);
pub const LATIN_EXTENDED: (u32, u32) = (192, 591);
pub const IPA_ALPHABET: (u32, u32) = (592, 687);
pub const SPACE_MODIFIERS: (u32, u32) = (688, 767);
pub const DIACRITICAL_MARKS: (u32, u32) = (768, 879);
pub const CYRILLIC: (u32, u32) = (1024, 1327);
pub const RUNIC: (u32, u32) = (5792, 5880);
pub const VEDIC: (u32, u32) = (7376, 7417);
pub const PHONETIC: (u32, u32) = (7424, 7615);
pub const CURRENCY: (u32, u32) = (8352, 8383);
pub const NUMBER_FORMS: (u32, u32) = (8528, 8587);
pub const ARROWS: (u32, u32) = (8592, 8703);
pub const MATHEMATICAL: (u32, u32) = (8704, 8959);
pub const TECHNICAL: (u32, u32) = (8960, 9215);
pub const ENCLOSED: (u32, u32) = (9312, 9471);
pub const CJK: (u32, u32) = (19968, 40934);
pub const EGYPTIAN: (u32, u32) = (77824, 78863);
pub const ALCHEMICAL: (u32, u32) = (128768, 128883);

const EXTENDED_BLOCKS: &[(u32, u32)] = &[
    PUNCTUATION_EXTENDED,
    LATIN_EXTENDED,
    IPA_ALPHABET,
    SPACE_MODIFIERS,
    DIACRITICAL_MARKS,
    CYRILLIC,
    RUNIC,
    VEDIC,
    PHONETIC,
    CURRENCY,
    NUMBER_FORMS,
    ARROWS,
    MATHEMATICAL,
    TECHNICAL,
    ENCLOSED,
    CJK,
    EGYPTIAN,
    ALCHEMICAL,
];

/// An unordered collection of code points.
///
/// Membership order carries no meaning, which is what lets [`remove`](Self::remove)
/// swap the last element into the hole instead of shifting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterSet {
    chars: Vec<char>,
}

impl CharacterSet {
    pub fn from_chars(chars: &str) -> Self {
        CharacterSet {
            chars: chars.chars().collect(),
        }
    }

    /// Build a set from inclusive `(start, end)` code-point pairs.
    ///
    /// Values that are not Unicode scalar values (surrogates) are skipped.
    pub fn from_ranges(ranges: &[(u32, u32)]) -> Self {
        let chars = ranges
            .iter()
            .flat_map(|&(start, end)| (start..=end).filter_map(char::from_u32))
            .collect();
        CharacterSet { chars }
    }

    pub fn union(&self, other: &CharacterSet) -> Self {
        let mut chars = Vec::with_capacity(self.chars.len() + other.chars.len());
        chars.extend_from_slice(&self.chars);
        chars.extend_from_slice(&other.chars);
        CharacterSet { chars }
    }

    /// Remove the first occurrence of `c`, returning whether it was present.
    pub fn remove(&mut self, c: char) -> bool {
        match self.chars.iter().position(|&member| member == c) {
            Some(index) => {
                self.chars.swap_remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn contains(&self, c: char) -> bool {
        self.chars.contains(&c)
    }

    /// Pick one member uniformly. Returns `None` for an empty set.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<char> {
        self.chars.choose(rng).copied()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }
}

static WHITESPACE_SET: Lazy<CharacterSet> = Lazy::new(|| CharacterSet::from_chars(WHITESPACE));
static LOWERCASE_SET: Lazy<CharacterSet> =
    Lazy::new(|| CharacterSet::from_chars(ASCII_LOWERCASE));
static UPPERCASE_SET: Lazy<CharacterSet> =
    Lazy::new(|| CharacterSet::from_chars(ASCII_UPPERCASE));
static LETTERS_SET: Lazy<CharacterSet> = Lazy::new(|| LOWERCASE_SET.union(&UPPERCASE_SET));
static DIGITS_SET: Lazy<CharacterSet> = Lazy::new(|| CharacterSet::from_chars(DIGITS));
static HEX_DIGITS_SET: Lazy<CharacterSet> = Lazy::new(|| CharacterSet::from_chars(HEX_DIGITS));
static OCT_DIGITS_SET: Lazy<CharacterSet> = Lazy::new(|| CharacterSet::from_chars(OCT_DIGITS));
static PUNCTUATION_SET: Lazy<CharacterSet> =
    Lazy::new(|| CharacterSet::from_chars(PUNCTUATION));

static PRINTABLE_SET: Lazy<CharacterSet> = Lazy::new(|| {
    WHITESPACE_SET
        .union(&DIGITS_SET)
        .union(&LETTERS_SET)
        .union(&PUNCTUATION_SET)
});
static EXTENDED_SET: Lazy<CharacterSet> =
    Lazy::new(|| CharacterSet::from_ranges(EXTENDED_BLOCKS));
static ALL_SET: Lazy<CharacterSet> = Lazy::new(|| PRINTABLE_SET.union(&EXTENDED_SET));
static ALL_EXCEPT_NEWLINE_SET: Lazy<CharacterSet> = Lazy::new(|| {
    let mut set = (*ALL_SET).clone();
    set.remove('\n');
    set
});

pub fn whitespace() -> &'static CharacterSet {
    &WHITESPACE_SET
}

pub fn lowercase() -> &'static CharacterSet {
    &LOWERCASE_SET
}

pub fn uppercase() -> &'static CharacterSet {
    &UPPERCASE_SET
}

pub fn letters() -> &'static CharacterSet {
    &LETTERS_SET
}

pub fn digits() -> &'static CharacterSet {
    &DIGITS_SET
}

pub fn hex_digits() -> &'static CharacterSet {
    &HEX_DIGITS_SET
}

pub fn oct_digits() -> &'static CharacterSet {
    &OCT_DIGITS_SET
}

pub fn punctuation() -> &'static CharacterSet {
    &PUNCTUATION_SET
}

/// Whitespace, digits, ASCII letters and ASCII punctuation.
pub fn printable() -> &'static CharacterSet {
    &PRINTABLE_SET
}

/// The curated non-ASCII blocks.
pub fn extended() -> &'static CharacterSet {
    &EXTENDED_SET
}

/// The universe `.` draws from in dot-all mode.
pub fn all() -> &'static CharacterSet {
    &ALL_SET
}

/// The universe `.` draws from by default.
pub fn all_except_newline() -> &'static CharacterSet {
    &ALL_EXCEPT_NEWLINE_SET
}

/// Choose uniformly among every code point covered by inclusive `ranges`.
///
/// Equivalent to expanding the ranges into a set and picking one member, without
/// materialising negated classes that span most of Unicode.
pub fn choose_from_ranges<R: Rng + ?Sized>(ranges: &[(char, char)], rng: &mut R) -> Option<char> {
    let total: u64 = ranges
        .iter()
        .map(|&(start, end)| range_width(start, end))
        .sum();
    if total == 0 {
        return None;
    }

    let mut index = rng.gen_range(0..total);
    for &(start, end) in ranges {
        let width = range_width(start, end);
        if index < width {
            // Offsets are below the range width, which stays inside u32.
            let mut code = start as u32 + index as u32;
            if (start as u32) < SURROGATE_START && code >= SURROGATE_START {
                code += SURROGATE_COUNT;
            }
            return char::from_u32(code);
        }
        index -= width;
    }
    None
}

const SURROGATE_START: u32 = 0xD800;
const SURROGATE_END: u32 = 0xDFFF;
const SURROGATE_COUNT: u32 = SURROGATE_END - SURROGATE_START + 1;

/// Number of scalar values in `start..=end`; surrogates are not counted.
fn range_width(start: char, end: char) -> u64 {
    if end < start {
        return 0;
    }
    let width = u64::from(end as u32 - start as u32) + 1;
    // Chars are never surrogates, so a range either spans the whole block or none of it.
    if (start as u32) < SURROGATE_START && (end as u32) > SURROGATE_END {
        width - u64::from(SURROGATE_COUNT)
    } else {
        width
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_ascii_tables() {
        assert_eq!(letters().len(), 52);
        assert_eq!(digits().len(), 10);
        assert_eq!(hex_digits().len(), 22);
        assert_eq!(oct_digits().len(), 8);
        assert_eq!(punctuation().len(), 32);
        assert_eq!(whitespace().len(), 6);
        assert_eq!(printable().len(), 6 + 10 + 52 + 32);
    }

    #[test]
    fn test_all_sets() {
        assert_eq!(all().len(), printable().len() + extended().len());
        assert!(all().contains('\n'));
        assert!(all().contains('Ж'));
        assert!(all().contains('→'));
        assert!(all().contains('中'));

        assert_eq!(all_except_newline().len(), all().len() - 1);
        assert!(!all_except_newline().contains('\n'));
    }

    #[test]
    fn test_from_ranges_skips_surrogates() {
        let set = CharacterSet::from_ranges(&[(0xD7FE, 0xE001)]);
        assert_eq!(set.len(), 4);
        assert!(set.contains('\u{D7FE}'));
        assert!(set.contains('\u{E001}'));
    }

    #[test]
    fn test_remove() {
        let mut set = CharacterSet::from_chars("abcd");
        assert!(set.remove('b'));
        assert!(!set.remove('z'));
        assert_eq!(set.len(), 3);
        assert!(!set.contains('b'));
        // Swap-remove moves the last member into the hole.
        assert_eq!(set.chars(), &['a', 'd', 'c']);
    }

    #[test]
    fn test_choose() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let c = digits().choose(&mut rng).unwrap();
            assert!(c.is_ascii_digit());
        }
        assert_eq!(CharacterSet::default().choose(&mut rng), None);
    }

    #[test]
    fn test_choose_from_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let ranges = [('a', 'c'), ('x', 'x')];
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            let c = choose_from_ranges(&ranges, &mut rng).unwrap();
            assert!(matches!(c, 'a'..='c' | 'x'));
            seen.insert(c);
        }
        assert_eq!(seen.len(), 4);

        assert_eq!(choose_from_ranges(&[], &mut rng), None);
    }

    #[test]
    fn test_choose_from_ranges_across_surrogates() {
        let mut rng = StdRng::seed_from_u64(11);
        let whole = [('\0', '\u{10FFFF}')];
        for _ in 0..10_000 {
            assert!(choose_from_ranges(&whole, &mut rng).is_some());
        }

        // Both neighbours of the surrogate block are reachable.
        let edges = [('\u{D7FF}', '\u{E000}')];
        assert_eq!(range_width('\u{D7FF}', '\u{E000}'), 2);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(choose_from_ranges(&edges, &mut rng).unwrap());
        }
        assert_eq!(seen.len(), 2);
        assert!(seen.contains(&'\u{D7FF}') && seen.contains(&'\u{E000}'));
    }
}
