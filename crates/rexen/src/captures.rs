// Match results
// Spans are byte offsets into the searched text

use std::collections::HashMap;
use std::ops::Range;

use ahash::RandomState;
use smol_str::SmolStr;

use crate::engine::Captures;
use crate::limits::RESERVED_CAPTURE;

/// Half-open byte range `[start, end)` of the searched text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Codepoint index -> byte offset
pub(crate) enum ByteMap {
    Ascii,
    Map(Vec<usize>),
}

impl ByteMap {
    pub fn new(text: &str) -> Self {
        if text.is_ascii() {
            ByteMap::Ascii
        } else {
            let mut offsets: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
            offsets.push(text.len());
            ByteMap::Map(offsets)
        }
    }

    #[inline(always)]
    pub fn get(&self, i: usize) -> usize {
        match self {
            ByteMap::Ascii => i,
            ByteMap::Map(m) => m[i],
        }
    }
}

/// One successful match: the whole-match span plus every named capture that
/// participated. The whole match is also reachable as `complete`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Match<'t> {
    #[cfg_attr(feature = "serde", serde(skip))]
    haystack: &'t str,
    whole: Span,
    captures: HashMap<SmolStr, Span, RandomState>,
}

impl<'t> Match<'t> {
    pub(crate) fn new(haystack: &'t str, whole: Span) -> Self {
        let mut captures = HashMap::with_hasher(RandomState::new());
        captures.insert(SmolStr::new_static(RESERVED_CAPTURE), whole);
        Match {
            haystack,
            whole,
            captures,
        }
    }

    /// Converts codepoint positions reported by the evaluator.
    pub(crate) fn from_captures(
        haystack: &'t str,
        bytes: &ByteMap,
        start: usize,
        end: usize,
        captures: Captures,
    ) -> Self {
        let mut m = Match::new(haystack, Span::new(bytes.get(start), bytes.get(end)));
        for (name, (s, e)) in captures {
            m.captures.insert(name, Span::new(bytes.get(s), bytes.get(e)));
        }
        m
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.whole.start
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.whole.end
    }

    pub fn range(&self) -> Range<usize> {
        self.whole.range()
    }

    pub fn span(&self, name: &str) -> Option<Span> {
        self.captures.get(name).copied()
    }

    /// Text of the whole match.
    pub fn as_str(&self) -> &'t str {
        &self.haystack[self.whole.range()]
    }

    /// Text of the capture `name`, if it participated in the match.
    pub fn get(&self, name: &str) -> Option<&'t str> {
        let haystack = self.haystack;
        self.span(name).map(|span| &haystack[span.range()])
    }

    /// Capture names, `complete` included, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.captures.keys().map(|name| name.as_str())
    }

    /// Number of recorded captures, `complete` included.
    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_map() {
        assert_eq!(ByteMap::new("abc").get(2), 2);
        let map = ByteMap::new("aé€b");
        assert_eq!(map.get(0), 0);
        assert_eq!(map.get(1), 1);
        assert_eq!(map.get(2), 3);
        assert_eq!(map.get(3), 6);
        assert_eq!(map.get(4), 7);
    }

    #[test]
    fn test_match_accessors() {
        let text = "key=value";
        let mut captures = Captures::default();
        captures.insert(SmolStr::new("key"), (0, 3));
        let m = Match::from_captures(text, &ByteMap::new(text), 0, 9, captures);
        assert_eq!(m.as_str(), "key=value");
        assert_eq!(m.get("key"), Some("key"));
        assert_eq!(m.get("complete"), Some("key=value"));
        assert_eq!(m.get("value"), None);
        assert_eq!(m.len(), 2);
        let mut names: Vec<&str> = m.names().collect();
        names.sort();
        assert_eq!(names, vec!["complete", "key"]);
    }

    #[test]
    fn test_spans_are_byte_offsets() {
        let text = "¡hola!";
        let m = Match::from_captures(text, &ByteMap::new(text), 1, 5, Captures::default());
        assert_eq!(m.range(), 2..6);
        assert_eq!(m.as_str(), "hola");
        assert_eq!(m.span("complete").map(|s| s.len()), Some(4));
    }
}
