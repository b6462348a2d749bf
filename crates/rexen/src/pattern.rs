// Compiled pattern
// Owns the optimized node chain and runs the search operations over it

use std::fmt;
use std::str::FromStr;

use crate::captures::{ByteMap, Match, Span};
use crate::config::{CompileOptions, Flags, Locale};
use crate::engine::{Cursor, Scan, run};
use crate::error::{CompileError, TemplateError};
use crate::node::{self, Chain, NodeKind, Render};
use crate::optimizer::optimize;
use crate::parser::{Parsed, parse_pattern};
use crate::template::Template;

/// A compiled pattern. Immutable; every search builds its own evaluation
/// state, so one `Pattern` can serve any number of threads.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    flags: Flags,
    locale: Locale,
    head: Chain,
    /// Literal every match must end with, checked against the tail of the
    /// input before searching.
    suffix: Option<Vec<char>>,
    /// Set when the whole pattern is one case-sensitive literal.
    plain: Option<String>,
    nodes: usize,
}

impl Pattern {
    /// Compiles `text` with the default options.
    pub fn new(text: &str) -> Result<Pattern, CompileError> {
        Self::with_options(text, &CompileOptions::default())
    }

    pub fn with_options(text: &str, options: &CompileOptions) -> Result<Pattern, CompileError> {
        let Parsed { head, flags } = parse_pattern(text)?;

        let (head, suffix) = if flags.optimize || options.force_optimize {
            let out = optimize(head, &flags, &options.optimizer);
            (out.head, out.suffix)
        } else {
            (head, None)
        };

        let plain = match head.as_deref() {
            Some(node)
                if node.next.is_none()
                    && node.quantifier.is_one()
                    && !flags.case_insensitive =>
            {
                match &node.kind {
                    NodeKind::Literal(text) => Some(text.iter().collect()),
                    _ => None,
                }
            }
            _ => None,
        };

        let nodes = node::count(head.as_deref());
        log::debug!(
            "compiled pattern {} into {} nodes (flags {:?}, plain: {})",
            text,
            nodes,
            flags,
            plain.is_some()
        );

        Ok(Pattern {
            source: text.to_string(),
            flags,
            locale: options.locale,
            head,
            suffix,
            plain,
            nodes,
        })
    }

    /// The pattern text this was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Number of nodes in the compiled chain, nested chains included.
    pub fn node_count(&self) -> usize {
        self.nodes
    }

    /// The compiled chain rendered back in pattern syntax.
    pub fn explain(&self) -> String {
        Render(self.head.as_deref()).to_string()
    }

    /// Matches the pattern at the start of `text`. The match need not extend
    /// to the end of `text`.
    pub fn match_prefix<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        if let Some(needle) = &self.plain {
            return text
                .starts_with(needle.as_str())
                .then(|| Match::new(text, Span::new(0, needle.len())));
        }

        let hay = Haystack::new(text);
        if self.rejects(&hay) {
            return None;
        }
        let scan = self.scan(&hay);
        let found = self.attempt(&scan, 0);
        self.finish(&scan, "match_prefix");
        found.map(|cur| hay.matched(0, cur))
    }

    /// First match scanning start offsets from the beginning of `text`.
    pub fn find_first<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        if let Some(needle) = &self.plain {
            return text
                .find(needle.as_str())
                .map(|at| Match::new(text, Span::new(at, at + needle.len())));
        }

        let hay = Haystack::new(text);
        if self.rejects(&hay) {
            return None;
        }
        let scan = self.scan(&hay);
        let found = self.search_from(&scan, 0);
        self.finish(&scan, "find_first");
        found.map(|(start, cur)| hay.matched(start, cur))
    }

    /// First match scanning start offsets backwards from the end of `text`.
    pub fn find_last<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        if let Some(needle) = &self.plain {
            return text
                .rfind(needle.as_str())
                .map(|at| Match::new(text, Span::new(at, at + needle.len())));
        }

        let hay = Haystack::new(text);
        if self.rejects(&hay) {
            return None;
        }
        let scan = self.scan(&hay);
        let min_len = self.min_len();
        let len = hay.chars.len();
        let mut found = None;
        for start in (0..=len).rev() {
            if len - start < min_len {
                continue;
            }
            if let Some(cur) = self.attempt(&scan, start) {
                found = Some((start, cur));
                break;
            }
        }
        self.finish(&scan, "find_last");
        found.map(|(start, cur)| hay.matched(start, cur))
    }

    /// All non-overlapping matches, left to right.
    pub fn find_all<'t>(&self, text: &'t str) -> Vec<Match<'t>> {
        self.collect(text, None)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.find_first(text).is_some()
    }

    /// Replaces every match with the expansion of `template`. Returns the new
    /// text and the number of replacements.
    pub fn replace_all(&self, text: &str, template: &str) -> Result<(String, usize), TemplateError> {
        self.replace(text, None, template)
    }

    /// Like [`Pattern::replace_all`], stopping after `limit` replacements.
    pub fn replacen(
        &self,
        text: &str,
        limit: usize,
        template: &str,
    ) -> Result<(String, usize), TemplateError> {
        self.replace(text, Some(limit), template)
    }

    fn replace(
        &self,
        text: &str,
        limit: Option<usize>,
        template: &str,
    ) -> Result<(String, usize), TemplateError> {
        let template = Template::parse(template)?;
        let matches = self.collect(text, limit);

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for m in &matches {
            out.push_str(&text[last..m.start()]);
            template.expand(m, &mut out);
            last = m.end();
        }
        out.push_str(&text[last..]);
        Ok((out, matches.len()))
    }

    fn collect<'t>(&self, text: &'t str, limit: Option<usize>) -> Vec<Match<'t>> {
        let mut matches = Vec::new();
        if limit == Some(0) {
            return matches;
        }

        if let Some(needle) = &self.plain {
            matches.extend(
                text.match_indices(needle.as_str())
                    .take(limit.unwrap_or(usize::MAX))
                    .map(|(at, _)| Match::new(text, Span::new(at, at + needle.len()))),
            );
            return matches;
        }

        let hay = Haystack::new(text);
        if self.rejects(&hay) {
            return matches;
        }
        let scan = self.scan(&hay);
        let len = hay.chars.len();
        let mut si = 0;
        let mut last_was_nonempty = false;

        while si <= len {
            if limit.is_some_and(|max| matches.len() >= max) {
                break;
            }
            let Some((start, cur)) = self.search_from(&scan, si) else {
                break;
            };
            let end = cur.pos();
            let is_empty = end == start;

            // Skip empty match right after non-empty match
            if is_empty && last_was_nonempty && start == si {
                si += 1;
                last_was_nonempty = false;
                continue;
            }

            matches.push(hay.matched(start, cur));
            if is_empty {
                si = start + 1;
                last_was_nonempty = false;
            } else {
                si = end;
                last_was_nonempty = true;
            }
        }

        self.finish(&scan, "find_all");
        matches
    }

    fn min_len(&self) -> usize {
        self.head.as_ref().map_or(0, |node| node.min_len)
    }

    fn scan<'h>(&self, hay: &'h Haystack<'_>) -> Scan<'h> {
        Scan::new(&hay.chars, self.flags, self.locale)
    }

    /// Fixed-suffix fast reject
    fn rejects(&self, hay: &Haystack<'_>) -> bool {
        let Some(suffix) = &self.suffix else {
            return false;
        };
        let len = hay.chars.len();
        let scan = self.scan(hay);
        let rejected = len < suffix.len() || !scan.matches_at(len - suffix.len(), suffix);
        if rejected {
            log::debug!("{}: input does not end with the required suffix", self.source);
        }
        rejected
    }

    fn attempt<'s>(&self, scan: &'s Scan<'s>, start: usize) -> Option<Cursor<'s>> {
        run(self.head.as_deref(), scan, start)
    }

    fn search_from<'s>(&self, scan: &'s Scan<'s>, from: usize) -> Option<(usize, Cursor<'s>)> {
        let len = scan.input().len();
        let min_len = self.min_len();
        (from..=len)
            .take_while(|&start| len - start >= min_len)
            .find_map(|start| self.attempt(scan, start).map(|cur| (start, cur)))
    }

    fn finish(&self, scan: &Scan<'_>, op: &str) {
        log::trace!("{} {}: {} node attempts", op, self.source, scan.epoch());
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for Pattern {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::new(s)
    }
}

/// Searched text prepared for the evaluator.
struct Haystack<'t> {
    text: &'t str,
    chars: Vec<char>,
    bytes: ByteMap,
}

impl<'t> Haystack<'t> {
    fn new(text: &'t str) -> Self {
        Haystack {
            text,
            chars: text.chars().collect(),
            bytes: ByteMap::new(text),
        }
    }

    fn matched(&self, start: usize, cur: Cursor<'_>) -> Match<'t> {
        let end = cur.pos();
        Match::from_captures(self.text, &self.bytes, start, end, cur.into_captures())
    }
}

/// Escapes every character with a meaning in pattern syntax, so that the
/// result matches `text` literally when placed between `/` separators.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if node::is_special(c) || c == '/' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
