// Codepoint classification and character-class matching
// Handles \w \W \u \U \d \D \s \S \p \P and [set] matching

use std::fmt;

use crate::config::Locale;

#[inline(always)]
pub fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[inline(always)]
pub fn is_space(c: char) -> bool {
    c.is_whitespace()
}

#[inline(always)]
pub fn is_punct(c: char) -> bool {
    c.is_ascii_punctuation()
}

/// A predefined class usable on its own (`\d`) or inside brackets (`[\d_]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassTag {
    Word,     // \w
    NotWord,  // \W
    Lower,    // \u
    Upper,    // \U
    Digit,    // \d
    NotDigit, // \D
    Space,    // \s
    NotSpace, // \S
    Punct,    // \p
    NotPunct, // \P
}

impl ClassTag {
    /// Maps the letter following a backslash to its class, if it names one.
    pub fn from_escape(c: char) -> Option<ClassTag> {
        Some(match c {
            'w' => ClassTag::Word,
            'W' => ClassTag::NotWord,
            'u' => ClassTag::Lower,
            'U' => ClassTag::Upper,
            'd' => ClassTag::Digit,
            'D' => ClassTag::NotDigit,
            's' => ClassTag::Space,
            'S' => ClassTag::NotSpace,
            'p' => ClassTag::Punct,
            'P' => ClassTag::NotPunct,
            _ => return None,
        })
    }

    pub fn escape_letter(self) -> char {
        match self {
            ClassTag::Word => 'w',
            ClassTag::NotWord => 'W',
            ClassTag::Lower => 'u',
            ClassTag::Upper => 'U',
            ClassTag::Digit => 'd',
            ClassTag::NotDigit => 'D',
            ClassTag::Space => 's',
            ClassTag::NotSpace => 'S',
            ClassTag::Punct => 'p',
            ClassTag::NotPunct => 'P',
        }
    }

    #[inline]
    pub fn matches(self, c: char) -> bool {
        match self {
            ClassTag::Word => is_word(c),
            ClassTag::NotWord => !is_word(c),
            ClassTag::Lower => c.is_lowercase(),
            ClassTag::Upper => c.is_uppercase(),
            ClassTag::Digit => c.is_ascii_digit(),
            ClassTag::NotDigit => !c.is_ascii_digit(),
            ClassTag::Space => is_space(c),
            ClassTag::NotSpace => !is_space(c),
            ClassTag::Punct => is_punct(c),
            ClassTag::NotPunct => !is_punct(c),
        }
    }
}

/// A set of codepoints: literal members, inclusive ranges and predefined
/// classes, optionally negated as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CharClass {
    singles: Vec<char>,
    ranges: Vec<(char, char)>,
    special: Vec<ClassTag>,
    negate: bool,
}

impl CharClass {
    pub fn new() -> Self {
        Self::default()
    }

    /// The class matching exactly what `tag` matches.
    pub fn from_tag(tag: ClassTag) -> Self {
        let mut class = CharClass::new();
        class.add_tag(tag);
        class
    }

    pub fn add_char(&mut self, c: char) {
        if let Err(i) = self.singles.binary_search(&c) {
            self.singles.insert(i, c);
        }
    }

    /// Adds `lo..=hi`. Callers guarantee `lo <= hi`.
    pub fn add_range(&mut self, lo: char, hi: char) {
        if !self.ranges.contains(&(lo, hi)) {
            self.ranges.push((lo, hi));
        }
    }

    pub fn add_tag(&mut self, tag: ClassTag) {
        if !self.special.contains(&tag) {
            self.special.push(tag);
        }
    }

    pub fn set_negated(&mut self, negate: bool) {
        self.negate = negate;
    }

    fn contains(&self, c: char) -> bool {
        self.singles.binary_search(&c).is_ok()
            || self.ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi)
            || self.special.iter().any(|tag| tag.matches(c))
    }

    /// Under case-insensitivity both `c` and its opposite-case counterpart
    /// are tried.
    #[inline]
    pub fn matches(&self, c: char, icase: Option<Locale>) -> bool {
        let mut found = self.contains(c);
        if !found && let Some(locale) = icase {
            found = locale.swap_case(c).is_some_and(|other| self.contains(other));
        }
        found != self.negate
    }
}

impl fmt::Display for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let ([], [], [tag], false) = (
            self.singles.as_slice(),
            self.ranges.as_slice(),
            self.special.as_slice(),
            self.negate,
        ) {
            return write!(f, "\\{}", tag.escape_letter());
        }
        write!(f, "[")?;
        if self.negate {
            write!(f, "^")?;
        }
        for &c in &self.singles {
            if matches!(c, ']' | '\\' | '-' | '^') {
                write!(f, "\\")?;
            }
            write!(f, "{}", c)?;
        }
        for &(lo, hi) in &self.ranges {
            write!(f, "{}-{}", lo, hi)?;
        }
        for tag in &self.special {
            write!(f, "\\{}", tag.escape_letter())?;
        }
        write!(f, "]")
    }
}
