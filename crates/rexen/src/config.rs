use crate::error::{CompileError, ErrorKind};
use crate::limits::{DEFAULT_STEPS, TIGHT_STEPS, UNBOUNDED_STEPS};
use crate::optimizer::OptConfig;

/// How much backtracking the rest of a pattern may do for each candidate
/// repetition count of a quantified node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Budget {
    /// `s` flag: favor speed.
    Tight,
    #[default]
    Default,
    /// `S` flag: favor accuracy.
    Unbounded,
}

impl Budget {
    pub fn steps(self) -> usize {
        match self {
            Budget::Tight => TIGHT_STEPS,
            Budget::Default => DEFAULT_STEPS,
            Budget::Unbounded => UNBOUNDED_STEPS,
        }
    }
}

/// Options selected by the letters after the closing separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Flags {
    /// `i`
    pub case_insensitive: bool,
    /// `l`: `^` and `$` also match next to a line feed.
    pub line_anchors: bool,
    /// `s` / `S`
    pub budget: Budget,
    /// `o`
    pub optimize: bool,
}

impl Flags {
    /// Parses the trailing flag letters. `offset` is the codepoint position of
    /// the first letter inside the pattern text.
    pub fn parse(letters: &[char], offset: usize) -> Result<Flags, CompileError> {
        let mut flags = Flags::default();
        let mut invalid = String::new();
        let mut first_invalid = None;

        for (i, &c) in letters.iter().enumerate() {
            match c {
                'i' => flags.case_insensitive = true,
                'l' => flags.line_anchors = true,
                's' => flags.budget = Budget::Tight,
                'S' => flags.budget = Budget::Unbounded,
                'o' => flags.optimize = true,
                _ => {
                    invalid.push(c);
                    first_invalid.get_or_insert(offset + i);
                }
            }
        }

        match first_invalid {
            Some(position) => Err(CompileError::new(
                ErrorKind::InvalidFlags { letters: invalid },
                position,
            )),
            None => Ok(flags),
        }
    }
}

/// Case folding rules, passed explicitly to the compiler and evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    /// Simple one-to-one Unicode case mapping.
    #[default]
    Unicode,
    /// Only ASCII letters fold.
    Ascii,
    /// Unicode mapping with the Turkish and Azeri dotted/dotless `i` pairs.
    Turkic,
}

impl Locale {
    /// Returns the opposite-case counterpart of `c`, if it has exactly one.
    pub fn swap_case(self, c: char) -> Option<char> {
        match self {
            Locale::Ascii => {
                if c.is_ascii_uppercase() {
                    Some(c.to_ascii_lowercase())
                } else if c.is_ascii_lowercase() {
                    Some(c.to_ascii_uppercase())
                } else {
                    None
                }
            }
            Locale::Turkic => match c {
                'i' => Some('\u{130}'),
                '\u{130}' => Some('i'),
                '\u{131}' => Some('I'),
                'I' => Some('\u{131}'),
                _ => Locale::Unicode.swap_case(c),
            },
            Locale::Unicode => {
                if c.is_uppercase() {
                    single(c.to_lowercase())
                } else if c.is_lowercase() {
                    single(c.to_uppercase())
                } else {
                    None
                }
            }
        }
    }

    #[inline]
    pub fn eq_ignore_case(self, a: char, b: char) -> bool {
        a == b || self.swap_case(a) == Some(b) || self.swap_case(b) == Some(a)
    }
}

fn single(mut it: impl Iterator<Item = char>) -> Option<char> {
    let c = it.next()?;
    if it.next().is_some() { None } else { Some(c) }
}

/// Configuration that does not come from the pattern text itself.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub locale: Locale,
    pub optimizer: OptConfig,
    /// Run the optimizer even without the `o` flag.
    pub force_optimize: bool,
}

impl CompileOptions {
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_optimizer(mut self, optimizer: OptConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn force_optimize(mut self, yes: bool) -> Self {
        self.force_optimize = yes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let flags = Flags::parse(&['i', 'l', 'o'], 5).unwrap();
        assert!(flags.case_insensitive);
        assert!(flags.line_anchors);
        assert!(flags.optimize);
        assert_eq!(flags.budget, Budget::Default);
    }

    #[test]
    fn test_last_budget_letter_wins() {
        assert_eq!(Flags::parse(&['s', 'S'], 0).unwrap().budget, Budget::Unbounded);
        assert_eq!(Flags::parse(&['S', 's'], 0).unwrap().budget, Budget::Tight);
    }

    #[test]
    fn test_invalid_flags_collected() {
        let err = Flags::parse(&['i', 'x', 'l', 'q'], 7).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::InvalidFlags {
                letters: "xq".to_string()
            }
        );
        assert_eq!(err.position, 8);
    }

    #[test]
    fn test_budget_steps() {
        assert_eq!(Budget::Tight.steps(), 1);
        assert_eq!(Budget::Default.steps(), 6);
        assert_eq!(Budget::Unbounded.steps(), usize::MAX);
    }

    #[test]
    fn test_swap_case() {
        assert_eq!(Locale::Unicode.swap_case('a'), Some('A'));
        assert_eq!(Locale::Unicode.swap_case('\u{e9}'), Some('\u{c9}'));
        assert_eq!(Locale::Unicode.swap_case('1'), None);
        assert_eq!(Locale::Ascii.swap_case('\u{e9}'), None);
        assert_eq!(Locale::Turkic.swap_case('i'), Some('\u{130}'));
        assert_eq!(Locale::Turkic.swap_case('I'), Some('\u{131}'));
    }

    #[test]
    fn test_eq_ignore_case() {
        assert!(Locale::Unicode.eq_ignore_case('q', 'Q'));
        assert!(!Locale::Unicode.eq_ignore_case('q', 'R'));
        assert!(!Locale::Turkic.eq_ignore_case('i', 'I'));
    }
}
