// Pattern compiler
// Parses `<sep><body><sep><flags>` into a node chain

use smol_str::SmolStr;

use crate::class::{CharClass, ClassTag, is_word};
use crate::config::Flags;
use crate::error::{CompileError, ErrorKind};
use crate::limits::{MAX_NESTING, RESERVED_CAPTURE};
use crate::node::{Chain, Node, NodeKind, link};
use crate::quantifier::Quantifier;

/// Output of the compiler, before optimization.
#[derive(Debug)]
pub struct Parsed {
    pub head: Chain,
    pub flags: Flags,
}

/// Splits the pattern text at its separators, parses the flags and compiles
/// the body.
pub fn parse_pattern(text: &str) -> Result<Parsed, CompileError> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < 2 {
        return Err(CompileError::new(ErrorKind::TooShort, 0));
    }

    let sep = chars[0];
    let mut end = 1;
    let mut last_escape = None;
    while end < chars.len() && chars[end] != sep {
        if chars[end] == '\\' {
            last_escape = Some(end);
            end += 1;
        }
        end += 1;
    }
    if end >= chars.len() {
        // `/ab\/` or `/ab\`: the backslash swallowed the closing separator
        if let Some(at) = last_escape
            && chars.get(at + 1).is_none_or(|&c| c == sep && at + 2 == chars.len())
        {
            return Err(CompileError::new(ErrorKind::TrailingEscape, at));
        }
        return Err(CompileError::new(
            ErrorKind::UnterminatedPattern,
            chars.len(),
        ));
    }

    let flags = Flags::parse(&chars[end + 1..], end + 1)?;
    let mut parser = Parser::new(&chars[1..end], 1);
    let nodes = parser.parse_sequence()?;
    if let Some(c) = parser.peek() {
        // parse_sequence only stops early at a stray ')'
        debug_assert_eq!(c, ')');
        return Err(parser.error(ErrorKind::UnbalancedParen, parser.pos));
    }

    Ok(Parsed {
        head: link(nodes),
        flags,
    })
}

struct Parser<'a> {
    chars: &'a [char],
    pos: usize,
    /// Position of `chars[0]` within the full pattern text.
    offset: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(chars: &'a [char], offset: usize) -> Self {
        Parser {
            chars,
            pos: 0,
            offset,
            depth: 0,
        }
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    #[inline]
    fn peek_at(&self, i: usize) -> Option<char> {
        self.chars.get(i).copied()
    }

    #[inline]
    fn bump(&mut self) {
        self.pos += 1;
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn error(&self, kind: ErrorKind, at: usize) -> CompileError {
        CompileError::new(kind, self.offset + at)
    }

    fn nest(&mut self, at: usize) -> Result<(), CompileError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error(ErrorKind::NestingTooDeep, at));
        }
        Ok(())
    }

    /// Parses terms up to the end of input or an unmatched `)`, which is left
    /// for the caller.
    fn parse_sequence(&mut self) -> Result<Vec<Node>, CompileError> {
        let mut terms: Vec<Node> = Vec::new();

        loop {
            if let Some(term) = self.parse_term()? {
                terms.push(term);
                continue;
            }
            match self.peek() {
                Some('|') => {
                    let at = self.pos;
                    self.bump();
                    let first = terms
                        .pop()
                        .ok_or_else(|| self.error(ErrorKind::LeadingAlternation, at))?;
                    let alternation = self.parse_alternation(first)?;
                    terms.push(alternation);
                }
                // ')' or end of input
                _ => break,
            }
        }

        Ok(terms)
    }

    /// Collects the options of an alternation whose first option is `first`
    /// and whose first `|` was just consumed. Each option is a single term;
    /// whatever follows the last option becomes the shared successor.
    fn parse_alternation(&mut self, first: Node) -> Result<Node, CompileError> {
        let mut options = vec![Some(Box::new(first))];
        loop {
            let term = self
                .parse_term()?
                .ok_or_else(|| self.error(ErrorKind::MissingAlternative, self.pos))?;
            options.push(Some(Box::new(term)));
            if !self.eat('|') {
                break;
            }
        }
        Ok(Node::new(NodeKind::Alternation(options)))
    }

    /// Parses one term and any quantifier suffix. Returns `None` at end of
    /// input, `)` and `|`.
    fn parse_term(&mut self) -> Result<Option<Node>, CompileError> {
        let Some(c) = self.peek() else {
            return Ok(None);
        };
        let start = self.pos;

        let mut node = match c {
            ')' | '|' => return Ok(None),
            '*' | '+' | '{' => {
                return Err(self.error(ErrorKind::MissingQuantifierTarget, start));
            }
            '?' => {
                // Nothing to make optional: a literal question mark.
                self.bump();
                Node::literal(vec!['?'])
            }
            '.' => {
                self.bump();
                Node::new(NodeKind::AnyChar)
            }
            '^' => {
                self.bump();
                Node::new(NodeKind::StartAnchor)
            }
            '$' => {
                self.bump();
                Node::new(NodeKind::EndAnchor)
            }
            '[' => self.parse_class()?,
            '(' => self.parse_group()?,
            '@' => self.parse_capture()?,
            '!' => self.parse_negation()?,
            '\\' => self.parse_escape()?,
            _ => self.parse_literal_run()?,
        };

        self.parse_quantifiers(&mut node)?;
        Ok(Some(node))
    }

    /// Applies `? * + {..}` suffixes, including the trailing `?` that makes a
    /// quantifier non-greedy.
    fn parse_quantifiers(&mut self, node: &mut Node) -> Result<(), CompileError> {
        let mut quantified = false;

        while let Some(c) = self.peek() {
            let at = self.pos;
            let quantifier = match c {
                '*' => {
                    self.bump();
                    Quantifier::STAR
                }
                '+' => {
                    self.bump();
                    Quantifier::PLUS
                }
                '{' => self.parse_braces()?,
                '?' => {
                    self.bump();
                    if !node.kind.is_quantifiable() {
                        return Err(self.error(ErrorKind::UnquantifiableTerm, at));
                    }
                    if !quantified {
                        node.quantifier = Quantifier::OPTIONAL;
                        quantified = true;
                    } else if node.quantifier.greedy {
                        node.quantifier = node.quantifier.lazy();
                    } else {
                        return Err(self.error(ErrorKind::DoubleQuantifier, at));
                    }
                    continue;
                }
                _ => break,
            };

            if !node.kind.is_quantifiable() {
                return Err(self.error(ErrorKind::UnquantifiableTerm, at));
            }
            if quantified {
                return Err(self.error(ErrorKind::DoubleQuantifier, at));
            }
            node.quantifier = quantifier;
            quantified = true;
        }

        Ok(())
    }

    /// `{m}`, `{m,}`, `{,n}`, `{m,n}`
    fn parse_braces(&mut self) -> Result<Quantifier, CompileError> {
        let open = self.pos;
        self.bump();

        let min = self.parse_number()?;
        let has_comma = self.eat(',');
        let max = if has_comma { self.parse_number()? } else { min };

        match self.peek() {
            Some('}') => self.bump(),
            Some(_) => return Err(self.error(ErrorKind::MalformedQuantifier, self.pos)),
            None => return Err(self.error(ErrorKind::UnterminatedQuantifier, open)),
        }

        if min.is_none() && max.is_none() {
            return Err(self.error(ErrorKind::MalformedQuantifier, open));
        }
        let min = min.unwrap_or(0);
        Quantifier::range(min, max).ok_or_else(|| {
            self.error(
                ErrorKind::InvalidQuantifierRange {
                    min,
                    max: max.unwrap_or(min),
                },
                open,
            )
        })
    }

    fn parse_number(&mut self) -> Result<Option<usize>, CompileError> {
        let start = self.pos;
        let mut value: Option<usize> = None;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
            value = value
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|v| v.checked_add(d as usize));
            if value.is_none() {
                return Err(self.error(ErrorKind::MalformedQuantifier, start));
            }
            self.bump();
        }
        Ok(value)
    }

    /// A run of literal characters. The run stops before a character that
    /// carries its own quantifier, so that `ab+` repeats only `b`.
    fn parse_literal_run(&mut self) -> Result<Node, CompileError> {
        let mut text = Vec::new();

        loop {
            let (c, width) = match self.peek() {
                None => break,
                Some('\\') => match self.peek_at(self.pos + 1) {
                    None => return Err(self.error(ErrorKind::TrailingEscape, self.pos)),
                    Some(n) if n == 'b' || n == 'B' || ClassTag::from_escape(n).is_some() => {
                        break;
                    }
                    Some(n) => (n, 2),
                },
                Some(c) if is_syntax(c) => break,
                Some(c) => (c, 1),
            };

            let quantified = matches!(
                self.peek_at(self.pos + width),
                Some('?' | '*' | '+' | '{')
            );
            if quantified && !text.is_empty() {
                break;
            }
            text.push(c);
            self.pos += width;
            if quantified {
                break;
            }
        }

        Ok(Node::literal(text))
    }

    fn parse_escape(&mut self) -> Result<Node, CompileError> {
        let at = self.pos;
        let Some(c) = self.peek_at(at + 1) else {
            return Err(self.error(ErrorKind::TrailingEscape, at));
        };

        let kind = match c {
            'b' => NodeKind::WordStart,
            'B' => NodeKind::WordEnd,
            _ => match ClassTag::from_escape(c) {
                Some(tag) => NodeKind::Class(CharClass::from_tag(tag)),
                None => return self.parse_literal_run(),
            },
        };
        self.pos += 2;
        Ok(Node::new(kind))
    }

    /// `[...]`, `[^...]`
    fn parse_class(&mut self) -> Result<Node, CompileError> {
        let open = self.pos;
        self.bump();

        let mut class = CharClass::new();
        class.set_negated(self.eat('^'));

        loop {
            let Some(c) = self.peek() else {
                return Err(self.error(ErrorKind::UnterminatedClass, open));
            };
            if c == ']' {
                self.bump();
                break;
            }

            let lo = match self.class_item(open)? {
                ClassItem::Tag(tag) => {
                    class.add_tag(tag);
                    continue;
                }
                ClassItem::Char(lo) => lo,
            };

            // A '-' right before ']' is literal.
            if self.peek() == Some('-') && !matches!(self.peek_at(self.pos + 1), None | Some(']')) {
                let dash = self.pos;
                self.bump();
                let hi = match self.class_item(open)? {
                    ClassItem::Char(hi) => hi,
                    ClassItem::Tag(tag) => tag.escape_letter(),
                };
                if lo > hi {
                    return Err(self.error(ErrorKind::InvalidRange { lo, hi }, dash));
                }
                class.add_range(lo, hi);
            } else {
                class.add_char(lo);
            }
        }

        Ok(Node::new(NodeKind::Class(class)))
    }

    fn class_item(&mut self, open: usize) -> Result<ClassItem, CompileError> {
        let Some(c) = self.peek() else {
            return Err(self.error(ErrorKind::UnterminatedClass, open));
        };
        self.bump();
        if c != '\\' {
            return Ok(ClassItem::Char(c));
        }

        let Some(escaped) = self.peek() else {
            return Err(self.error(ErrorKind::UnterminatedClass, open));
        };
        self.bump();
        Ok(match ClassTag::from_escape(escaped) {
            Some(tag) => ClassItem::Tag(tag),
            None => ClassItem::Char(escaped),
        })
    }

    /// `(...)`
    fn parse_group(&mut self) -> Result<Node, CompileError> {
        let open = self.pos;
        self.nest(open)?;
        self.bump();

        let body = self.parse_sequence()?;
        if !self.eat(')') {
            return Err(self.error(ErrorKind::UnterminatedGroup, open));
        }
        self.depth -= 1;
        Ok(Node::new(NodeKind::Group(link(body))))
    }

    /// `@<name>(...)` or `@:<name>`
    fn parse_capture(&mut self) -> Result<Node, CompileError> {
        let at = self.pos;
        self.bump();

        match self.peek() {
            Some('<') => {
                let name = self.parse_name()?;
                if name.as_str() == RESERVED_CAPTURE {
                    return Err(self.error(ErrorKind::ReservedName, at));
                }
                if self.peek() != Some('(') {
                    return Err(self.error(ErrorKind::MissingCaptureParen, self.pos));
                }
                self.nest(at)?;
                self.bump();
                let body = self.parse_sequence()?;
                if !self.eat(')') {
                    return Err(self.error(ErrorKind::UnterminatedCapture, at));
                }
                self.depth -= 1;
                Ok(Node::new(NodeKind::Capture {
                    name,
                    body: link(body),
                }))
            }
            Some(':') => {
                self.bump();
                if self.peek() != Some('<') {
                    return Err(self.error(ErrorKind::EmptyName, self.pos));
                }
                let name = self.parse_name()?;
                Ok(Node::new(NodeKind::Backreference(name)))
            }
            _ => Err(self.error(ErrorKind::MalformedCapture, at)),
        }
    }

    /// `<name>`; the cursor sits on the `<`.
    fn parse_name(&mut self) -> Result<SmolStr, CompileError> {
        let open = self.pos;
        self.bump();
        let start = self.pos;

        loop {
            match self.peek() {
                None => return Err(self.error(ErrorKind::UnterminatedName, open)),
                Some('>') => break,
                Some(c) if is_word(c) => self.bump(),
                Some(c) => return Err(self.error(ErrorKind::InvalidNameChar(c), self.pos)),
            }
        }

        let name = &self.chars[start..self.pos];
        self.bump();
        if name.is_empty() {
            return Err(self.error(ErrorKind::EmptyName, start));
        }
        if name.iter().all(|c| c.is_ascii_digit()) {
            return Err(self.error(ErrorKind::NumericName, start));
        }
        Ok(name.iter().copied().collect())
    }

    /// `!term`
    fn parse_negation(&mut self) -> Result<Node, CompileError> {
        let at = self.pos;
        self.nest(at)?;
        self.bump();

        let operand = self
            .parse_term()?
            .ok_or_else(|| self.error(ErrorKind::MissingNegationOperand, self.pos))?;
        if matches!(operand.kind, NodeKind::Class(_)) {
            return Err(self.error(ErrorKind::NegatedClass, at));
        }
        self.depth -= 1;
        Ok(Node::new(NodeKind::Negation(Box::new(operand))))
    }
}

enum ClassItem {
    Char(char),
    Tag(ClassTag),
}

/// Characters that start something other than a literal outside classes.
fn is_syntax(c: char) -> bool {
    matches!(
        c,
        '.' | '^' | '$' | '\\' | '[' | '(' | ')' | '@' | '|' | '!' | '?' | '*' | '+' | '{'
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Render;

    fn render(text: &str) -> String {
        let parsed = parse_pattern(text).unwrap();
        Render(parsed.head.as_deref()).to_string()
    }

    fn kind_of(text: &str) -> ErrorKind {
        parse_pattern(text).unwrap_err().kind
    }

    #[test]
    fn test_literal_run_splits_before_quantifier() {
        let parsed = parse_pattern("/ab+c/").unwrap();
        let nodes: Vec<&Node> = crate::node::iter(parsed.head.as_deref()).collect();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].kind, NodeKind::Literal(vec!['a']));
        assert_eq!(nodes[1].quantifier, Quantifier::PLUS);
        assert_eq!(nodes[2].kind, NodeKind::Literal(vec!['c']));
    }

    #[test]
    fn test_escapes_join_literal_runs() {
        let parsed = parse_pattern(r"/a\.b\/c/").unwrap();
        let head = parsed.head.unwrap();
        assert_eq!(head.kind, NodeKind::Literal("a.b/c".chars().collect()));
        assert!(head.next.is_none());
    }

    #[test]
    fn test_render_round_trip() {
        assert_eq!(render("/^a*?[^x-z\\d]{2,}$/"), "^a*?[^x-z\\d]{2,}$");
        assert_eq!(render("/@<year>(\\d{4})-@:<year>/"), "@<year>(\\d{4})-@:<year>");
        assert_eq!(render("/(foo|bar)baz/"), "(foo|bar)baz");
        assert_eq!(render("/!a\\b.\\B/"), "!a\\b.\\B");
    }

    #[test]
    fn test_alternation_options_are_terms() {
        let parsed = parse_pattern("/x|y+z/").unwrap();
        let head = parsed.head.unwrap();
        let NodeKind::Alternation(options) = &head.kind else {
            panic!("expected alternation, got {:?}", head.kind);
        };
        assert_eq!(options.len(), 2);
        assert_eq!(options[1].as_ref().unwrap().quantifier, Quantifier::PLUS);
        // The trailing term is the shared successor, not an option.
        let next = head.next.as_ref().unwrap();
        assert_eq!(next.kind, NodeKind::Literal(vec!['z']));
    }

    #[test]
    fn test_question_mark_rules() {
        assert_eq!(render("/?a/"), "\\?a");
        assert_eq!(render("/a??/"), "a??");
        assert_eq!(render("/a{2,3}?/"), "a{2,3}?");
        assert_eq!(kind_of("/a*??/"), ErrorKind::DoubleQuantifier);
        assert_eq!(kind_of("/a*+/"), ErrorKind::DoubleQuantifier);
    }

    #[test]
    fn test_braces() {
        assert_eq!(render("/a{3}/"), "a{3}");
        assert_eq!(render("/a{,2}/"), "a{0,2}");
        assert_eq!(kind_of("/a{x}/"), ErrorKind::MalformedQuantifier);
        assert_eq!(kind_of("/a{2/"), ErrorKind::UnterminatedQuantifier);
        assert_eq!(kind_of("/a{}/"), ErrorKind::MalformedQuantifier);
        assert_eq!(
            kind_of("/a{3,1}/"),
            ErrorKind::InvalidQuantifierRange { min: 3, max: 1 }
        );
    }

    #[test]
    fn test_flags_and_separators() {
        let parsed = parse_pattern("#a/b#il").unwrap();
        assert!(parsed.flags.case_insensitive);
        assert!(parsed.flags.line_anchors);
        assert_eq!(kind_of("/"), ErrorKind::TooShort);
        assert_eq!(kind_of("/abc"), ErrorKind::UnterminatedPattern);
        let err = parse_pattern("/a/iz").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::InvalidFlags {
                letters: "z".to_string()
            }
        );
        assert_eq!(err.position, 4);
    }

    #[test]
    fn test_error_positions() {
        let err = parse_pattern("/ab(cd/").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedGroup);
        assert_eq!(err.position, 3);

        let err = parse_pattern("/ab)/").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnbalancedParen);
        assert_eq!(err.position, 3);

        let err = parse_pattern("/|a/").unwrap_err();
        assert_eq!(err.kind, ErrorKind::LeadingAlternation);
        assert_eq!(err.position, 1);
    }

    #[test]
    fn test_name_rules() {
        assert_eq!(kind_of("/@<>(a)/"), ErrorKind::EmptyName);
        assert_eq!(kind_of("/@<12>(a)/"), ErrorKind::NumericName);
        assert_eq!(kind_of("/@<a-b>(a)/"), ErrorKind::InvalidNameChar('-'));
        assert_eq!(kind_of("/@<x>a/"), ErrorKind::MissingCaptureParen);
        assert_eq!(kind_of("/@<x>(a/"), ErrorKind::UnterminatedCapture);
        assert_eq!(kind_of("/@:<x/"), ErrorKind::UnterminatedName);
        assert_eq!(kind_of("/@<complete>(a)/"), ErrorKind::ReservedName);
        assert_eq!(kind_of("/@x/"), ErrorKind::MalformedCapture);
        assert!(parse_pattern("/@<x1>(a)@:<x1>/").is_ok());
    }

    #[test]
    fn test_classes() {
        assert_eq!(render("/[a-]/"), "[\\-a]");
        assert_eq!(render("/[\\]]/"), "[\\]]");
        assert_eq!(kind_of("/[abc/"), ErrorKind::UnterminatedClass);
        assert_eq!(
            kind_of("/[z-a]/"),
            ErrorKind::InvalidRange { lo: 'z', hi: 'a' }
        );
    }

    #[test]
    fn test_negation_rules() {
        assert_eq!(kind_of("/![a-z]/"), ErrorKind::NegatedClass);
        assert_eq!(kind_of("/!\\d/"), ErrorKind::NegatedClass);
        assert_eq!(kind_of("/a!/"), ErrorKind::MissingNegationOperand);
        assert_eq!(render("/!ab*/"), "!ab*");
    }

    #[test]
    fn test_anchor_quantifier_rejected() {
        assert_eq!(kind_of("/^*/"), ErrorKind::UnquantifiableTerm);
        assert_eq!(kind_of("/\\b?/"), ErrorKind::UnquantifiableTerm);
        assert_eq!(kind_of("/*a/"), ErrorKind::MissingQuantifierTarget);
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("/{}a{}/", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert_eq!(kind_of(&deep), ErrorKind::NestingTooDeep);
        let ok = format!("/{}a{}/", "(".repeat(10), ")".repeat(10));
        assert!(parse_pattern(&ok).is_ok());
    }
}
