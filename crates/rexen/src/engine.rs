// Core backtracking evaluator
//
// - Scan holds the input codepoints, flags and per-evaluation counters
// - Cursor is the position plus captures, cloned before every attempt and
//   written back only when the attempt and everything after it succeeded
// - Nodes match in continuation-passing style: a node matches itself, then
//   hands the cursor to `k`, which matches the rest of the pattern

use std::cell::Cell;
use std::collections::HashMap;

use ahash::RandomState;
use smol_str::SmolStr;

use crate::class::{is_punct, is_space, is_word};
use crate::config::{Flags, Locale};
use crate::limits::{MAX_MATCH_DEPTH, UNBOUNDED_STEPS};
use crate::node::{Node, NodeKind};

/// Capture name -> (start, end) codepoint indices.
pub type Captures = HashMap<SmolStr, (usize, usize), RandomState>;

/// What the rest of the pattern must match once a node succeeded. Receives
/// the cursor after the node and the step budget it may spend.
type Cont<'a, 't> = &'a mut dyn FnMut(&mut Cursor<'t>, usize) -> bool;

/// Read-only input and shared counters of one evaluation.
pub struct Scan<'t> {
    input: &'t [char],
    flags: Flags,
    locale: Locale,
    depth: Cell<usize>,
    epoch: Cell<u64>,
    depth_warned: Cell<bool>,
}

impl<'t> Scan<'t> {
    pub fn new(input: &'t [char], flags: Flags, locale: Locale) -> Self {
        Scan {
            input,
            flags,
            locale,
            depth: Cell::new(0),
            epoch: Cell::new(0),
            depth_warned: Cell::new(false),
        }
    }

    pub fn input(&self) -> &'t [char] {
        self.input
    }

    /// Number of node attempts made so far.
    pub fn epoch(&self) -> u64 {
        self.epoch.get()
    }

    #[inline]
    fn icase(&self) -> Option<Locale> {
        self.flags.case_insensitive.then_some(self.locale)
    }

    #[inline]
    fn same_char(&self, a: char, b: char) -> bool {
        match self.icase() {
            Some(locale) => locale.eq_ignore_case(a, b),
            None => a == b,
        }
    }

    /// True when `pattern` matches `input[at..]` codepoint for codepoint.
    pub fn matches_at(&self, at: usize, pattern: &[char]) -> bool {
        at + pattern.len() <= self.input.len()
            && self.input[at..at + pattern.len()]
                .iter()
                .zip(pattern)
                .all(|(&a, &b)| self.same_char(a, b))
    }

    fn enter(&self) -> bool {
        let depth = self.depth.get();
        if depth >= MAX_MATCH_DEPTH {
            if !self.depth_warned.replace(true) {
                log::warn!(
                    "evaluation reached depth {}, failing deeper attempts",
                    MAX_MATCH_DEPTH
                );
            }
            return false;
        }
        self.depth.set(depth + 1);
        self.epoch.set(self.epoch.get() + 1);
        true
    }

    fn leave(&self) {
        self.depth.set(self.depth.get() - 1);
    }
}

/// Scan state threaded through node matching.
#[derive(Clone)]
pub struct Cursor<'t> {
    scan: &'t Scan<'t>,
    pos: usize,
    captures: Captures,
}

impl<'t> Cursor<'t> {
    pub fn new(scan: &'t Scan<'t>, pos: usize) -> Self {
        Cursor {
            scan,
            pos,
            captures: Captures::default(),
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn into_captures(self) -> Captures {
        self.captures
    }

    #[inline]
    fn remaining(&self) -> usize {
        self.scan.input.len() - self.pos
    }

    #[inline]
    fn current(&self) -> Option<char> {
        self.scan.input.get(self.pos).copied()
    }

    #[inline]
    fn previous(&self) -> Option<char> {
        self.pos.checked_sub(1).map(|i| self.scan.input[i])
    }

    /// Budget handed downstream by quantified nodes.
    #[inline]
    fn budget(&self) -> usize {
        self.scan.flags.budget.steps()
    }

    fn set_capture(&mut self, name: &SmolStr, start: usize, end: usize) {
        self.captures.insert(name.clone(), (start, end));
    }
}

/// Matches `chain`, then `k`. On failure `cur` is left untouched.
pub fn match_chain<'t>(
    chain: Option<&Node>,
    cur: &mut Cursor<'t>,
    steps: usize,
    k: Cont<'_, 't>,
) -> bool {
    match chain {
        None => k(cur, steps),
        Some(node) => node.match_here(cur, steps, k),
    }
}

/// Runs a whole evaluation of `head` starting at `start`. Returns the cursor
/// at the end of the match.
pub fn run<'t>(head: Option<&Node>, scan: &'t Scan<'t>, start: usize) -> Option<Cursor<'t>> {
    let mut cur = Cursor::new(scan, start);
    if match_chain(head, &mut cur, UNBOUNDED_STEPS, &mut |_, _| true) {
        Some(cur)
    } else {
        None
    }
}

impl Node {
    /// Matches this node with its quantifier, then the rest of its chain,
    /// then `k`.
    fn match_here<'t>(&self, cur: &mut Cursor<'t>, steps: usize, k: Cont<'_, 't>) -> bool {
        if cur.remaining() < self.min_len {
            return false;
        }
        let scan = cur.scan;
        if !scan.enter() {
            return false;
        }

        let q = self.quantifier;
        let matched = if q.is_one() {
            let next = self.next.as_deref();
            let mut attempt = cur.clone();
            let ok = self.match_once(&mut attempt, steps, &mut |c: &mut Cursor<'t>, s: usize| {
                match_chain(next, c, s, &mut *k)
            });
            if ok {
                *cur = attempt;
            }
            ok
        } else if self.kind.is_atom() {
            if q.greedy {
                self.repeat_atom_greedy(cur, steps, k)
            } else {
                self.repeat_atom_lazy(cur, steps, k)
            }
        } else {
            if q.greedy {
                self.repeat_greedy(cur, steps, k)
            } else {
                self.repeat_lazy(cur, steps, k)
            }
        };

        scan.leave();
        matched
    }

    /// One repetition of this node, then `k`. May leave `cur` modified on
    /// failure; callers pass a private copy.
    fn match_once<'t>(&self, cur: &mut Cursor<'t>, steps: usize, k: Cont<'_, 't>) -> bool {
        match &self.kind {
            NodeKind::Group(body) => match_chain(body.as_deref(), cur, steps, k),
            NodeKind::Capture { name, body } => {
                let start = cur.pos;
                match_chain(body.as_deref(), cur, steps, &mut |c: &mut Cursor<'t>, s: usize| {
                    let mut attempt = c.clone();
                    attempt.set_capture(name, start, attempt.pos);
                    let ok = k(&mut attempt, s);
                    if ok {
                        *c = attempt;
                    }
                    ok
                })
            }
            NodeKind::Alternation(options) => {
                for option in options {
                    let mut attempt = cur.clone();
                    if match_chain(option.as_deref(), &mut attempt, steps, &mut *k) {
                        *cur = attempt;
                        return true;
                    }
                }
                false
            }
            _ => self.step(cur, steps) && k(cur, steps),
        }
    }

    /// Advances `cur` over one repetition of an atom. Returns false, possibly
    /// leaving `cur` modified, when the atom does not match.
    fn step(&self, cur: &mut Cursor<'_>, steps: usize) -> bool {
        let scan = cur.scan;
        match &self.kind {
            NodeKind::Literal(text) => {
                if scan.matches_at(cur.pos, text) {
                    cur.pos += text.len();
                    true
                } else {
                    false
                }
            }
            NodeKind::AnyChar => {
                if cur.remaining() > 0 {
                    cur.pos += 1;
                    true
                } else {
                    false
                }
            }
            NodeKind::Class(class) => match cur.current() {
                Some(c) if class.matches(c, scan.icase()) => {
                    cur.pos += 1;
                    true
                }
                _ => false,
            },
            NodeKind::StartAnchor => {
                cur.pos == 0 || (scan.flags.line_anchors && cur.previous() == Some('\n'))
            }
            NodeKind::EndAnchor => {
                cur.remaining() == 0 || (scan.flags.line_anchors && cur.current() == Some('\n'))
            }
            NodeKind::WordStart => {
                cur.current().is_some_and(is_word)
                    && cur.previous().is_none_or(|p| is_space(p) || is_punct(p))
            }
            NodeKind::WordEnd => {
                cur.previous().is_some_and(is_word)
                    && cur.current().is_none_or(|c| is_space(c) || is_punct(c))
            }
            NodeKind::Backreference(name) => {
                let Some(&(start, end)) = cur.captures.get(name) else {
                    return false;
                };
                if scan.matches_at(cur.pos, &scan.input[start..end]) {
                    cur.pos += end - start;
                    true
                } else {
                    false
                }
            }
            NodeKind::Negation(operand) => {
                let mut probe = cur.clone();
                !operand.match_here(&mut probe, steps, &mut |_, _| true)
            }
            NodeKind::Group(_) | NodeKind::Capture { .. } | NodeKind::Alternation(_) => false,
        }
    }

    /// Greedy repetition of an atom: collect the position after every
    /// successful repetition, then try the continuation from the deepest
    /// entry down to `min`.
    fn repeat_atom_greedy<'t>(&self, cur: &mut Cursor<'t>, steps: usize, k: Cont<'_, 't>) -> bool {
        let q = self.quantifier;
        let limit = q.max.unwrap_or(usize::MAX);
        let mut stack = vec![cur.pos];

        if self.kind == NodeKind::AnyChar {
            let reps = cur.remaining().min(limit);
            stack.extend((1..=reps).map(|i| cur.pos + i));
        } else {
            let mut probe = cur.clone();
            while stack.len() - 1 < limit {
                let before = probe.pos;
                if !self.step(&mut probe, steps) {
                    break;
                }
                if probe.pos == before {
                    // Zero-width: every further repetition lands here too.
                    let reps = q.min.max(stack.len()).min(limit);
                    stack.resize(reps + 1, before);
                    break;
                }
                stack.push(probe.pos);
            }
        }

        let next = self.next.as_deref();
        let budget = cur.budget();
        for (tries, count) in (q.min..stack.len()).rev().enumerate() {
            if tries >= steps {
                return false;
            }
            let mut attempt = cur.clone();
            attempt.pos = stack[count];
            if match_chain(next, &mut attempt, budget, &mut *k) {
                *cur = attempt;
                return true;
            }
        }
        false
    }

    /// Non-greedy repetition of an atom: force `min` repetitions, then grow
    /// one at a time until the continuation succeeds.
    fn repeat_atom_lazy<'t>(&self, cur: &mut Cursor<'t>, steps: usize, k: Cont<'_, 't>) -> bool {
        let q = self.quantifier;
        let mut probe = cur.clone();
        for _ in 0..q.min {
            if !self.step(&mut probe, steps) {
                return false;
            }
        }

        let next = self.next.as_deref();
        let budget = cur.budget();
        let mut count = q.min;
        let mut tries = 0;
        loop {
            if tries >= steps {
                return false;
            }
            tries += 1;

            let mut attempt = probe.clone();
            if match_chain(next, &mut attempt, budget, &mut *k) {
                *cur = attempt;
                return true;
            }
            if !q.allows(count) {
                return false;
            }
            let before = probe.pos;
            if !self.step(&mut probe, steps) || probe.pos == before {
                return false;
            }
            count += 1;
        }
    }

    /// Greedy repetition of a group-like node. Every repetition may end in
    /// several places (alternation, inner quantifiers); the ends not yet
    /// explored stay on an explicit stack, so a later failure revisits the
    /// choices of earlier repetitions without growing the native stack.
    fn repeat_greedy<'t>(&self, cur: &mut Cursor<'t>, steps: usize, k: Cont<'_, 't>) -> bool {
        let q = self.quantifier;
        let next = self.next.as_deref();
        let budget = cur.budget();
        let mut tries = 0;
        let mut stack = vec![self.repetition(0, cur.clone(), steps)];

        while let Some(top) = stack.last_mut() {
            if let Some(end) = top.ends.next() {
                let count = top.count + 1;
                stack.push(self.repetition(count, end, steps));
                continue;
            }
            let Some(done) = stack.pop() else { break };
            if done.count < q.min {
                continue;
            }
            if tries >= steps {
                return false;
            }
            tries += 1;
            let mut attempt = done.at;
            if match_chain(next, &mut attempt, budget, &mut *k) {
                *cur = attempt;
                return true;
            }
        }
        false
    }

    /// Non-greedy counterpart of `repeat_greedy`: the continuation is tried
    /// before each further repetition.
    fn repeat_lazy<'t>(&self, cur: &mut Cursor<'t>, steps: usize, k: Cont<'_, 't>) -> bool {
        let q = self.quantifier;
        let next = self.next.as_deref();
        let budget = cur.budget();
        let mut tries = 0;
        let mut stack: Vec<Repetition<'t>> = Vec::new();
        let mut visit = Some((0, cur.clone()));

        loop {
            if let Some((count, at)) = visit.take() {
                if count >= q.min {
                    if tries >= steps {
                        return false;
                    }
                    tries += 1;
                    let mut attempt = at.clone();
                    if match_chain(next, &mut attempt, budget, &mut *k) {
                        *cur = attempt;
                        return true;
                    }
                }
                stack.push(self.repetition(count, at, steps));
            }

            let Some(top) = stack.last_mut() else {
                return false;
            };
            match top.ends.next() {
                Some(end) => visit = Some((top.count + 1, end)),
                None => {
                    stack.pop();
                }
            }
        }
    }

    /// Every cursor one more repetition of this node can end at, starting
    /// from `at` after `count` repetitions, in preference order. Repetitions
    /// that consume nothing once `min` is reached are left out.
    fn repetition<'t>(&self, count: usize, at: Cursor<'t>, steps: usize) -> Repetition<'t> {
        let q = self.quantifier;
        let mut ends = Vec::new();
        if q.allows(count) {
            let start = at.pos;
            let mut attempt = at.clone();
            self.match_once(&mut attempt, steps, &mut |c: &mut Cursor<'t>, _: usize| {
                if c.pos != start || count < q.min {
                    ends.push(c.clone());
                }
                false
            });
        }
        Repetition {
            count,
            at,
            ends: ends.into_iter(),
        }
    }
}

/// One level of a group repetition: the cursor after `count` repetitions and
/// the unexplored ends of the next one.
struct Repetition<'t> {
    count: usize,
    at: Cursor<'t>,
    ends: std::vec::IntoIter<Cursor<'t>>,
}
