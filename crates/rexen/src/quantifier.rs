use std::fmt;

/// Repetition descriptor attached to every node. `max == None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quantifier {
    pub min: usize,
    pub max: Option<usize>,
    pub greedy: bool,
}

impl Default for Quantifier {
    fn default() -> Self {
        Quantifier::ONE
    }
}

impl Quantifier {
    /// Exactly one occurrence.
    pub const ONE: Quantifier = Quantifier {
        min: 1,
        max: Some(1),
        greedy: true,
    };

    /// `?`
    pub const OPTIONAL: Quantifier = Quantifier {
        min: 0,
        max: Some(1),
        greedy: true,
    };

    /// `*`
    pub const STAR: Quantifier = Quantifier {
        min: 0,
        max: None,
        greedy: true,
    };

    /// `+`
    pub const PLUS: Quantifier = Quantifier {
        min: 1,
        max: None,
        greedy: true,
    };

    /// Builds a greedy range. Returns `None` when `min > max`.
    pub fn range(min: usize, max: Option<usize>) -> Option<Quantifier> {
        match max {
            Some(max) if max < min => None,
            _ => Some(Quantifier {
                min,
                max,
                greedy: true,
            }),
        }
    }

    #[inline]
    pub fn is_one(&self) -> bool {
        self.min == 1 && self.max == Some(1)
    }

    /// True when `count` more repetitions are still allowed.
    #[inline]
    pub fn allows(&self, count: usize) -> bool {
        self.max.is_none_or(|max| count < max)
    }

    pub fn lazy(self) -> Quantifier {
        Quantifier {
            greedy: false,
            ..self
        }
    }
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (1, Some(1)) => return Ok(()),
            (0, Some(1)) => write!(f, "?")?,
            (0, None) => write!(f, "*")?,
            (1, None) => write!(f, "+")?,
            (min, Some(max)) if min == max => write!(f, "{{{}}}", min)?,
            (min, None) => write!(f, "{{{},}}", min)?,
            (min, Some(max)) => write!(f, "{{{},{}}}", min, max)?,
        }
        if !self.greedy {
            write!(f, "?")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_rejects_inverted_bounds() {
        assert!(Quantifier::range(3, Some(2)).is_none());
        assert_eq!(Quantifier::range(2, Some(2)).unwrap().min, 2);
        assert!(Quantifier::range(0, None).unwrap().allows(usize::MAX - 1));
    }

    #[test]
    fn test_allows() {
        let q = Quantifier::range(1, Some(3)).unwrap();
        assert!(q.allows(2));
        assert!(!q.allows(3));
    }

    #[test]
    fn test_display() {
        assert_eq!(Quantifier::ONE.to_string(), "");
        assert_eq!(Quantifier::STAR.lazy().to_string(), "*?");
        assert_eq!(Quantifier::range(2, Some(4)).unwrap().to_string(), "{2,4}");
        assert_eq!(Quantifier::range(3, None).unwrap().to_string(), "{3,}");
        assert_eq!(Quantifier::range(0, Some(0)).unwrap().to_string(), "{0}");
    }
}
