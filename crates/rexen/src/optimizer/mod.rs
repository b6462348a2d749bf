// Node-chain optimizer
// Rewrites the compiled chain once, before any matching happens

mod passes;

use crate::config::Flags;
use crate::node::{Chain, NodeKind, iter};

/// Optimization configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptConfig {
    /// Drop repeated anchors and alternation options, merge adjacent
    /// identical repeated atoms.
    pub dedup: bool,
    /// Replace non-capturing groups holding at most one node.
    pub collapse_groups: bool,
    /// Split `lit+` into `lit lit*`.
    pub expose_literals: bool,
    /// Record the minimum remaining length on every node.
    pub annotate_lengths: bool,
    /// Check a literal suffix anchored at end of input before searching.
    pub suffix_reject: bool,
}

impl Default for OptConfig {
    fn default() -> Self {
        Self {
            dedup: true,
            collapse_groups: true,
            expose_literals: true,
            annotate_lengths: true,
            suffix_reject: true,
        }
    }
}

impl OptConfig {
    /// Every pass disabled.
    pub fn none() -> Self {
        Self {
            dedup: false,
            collapse_groups: false,
            expose_literals: false,
            annotate_lengths: false,
            suffix_reject: false,
        }
    }
}

/// Optimized chain
#[derive(Debug)]
pub(crate) struct Optimized {
    pub head: Chain,
    /// Literal that every match must end with, when the pattern ends in
    /// `literal$` and `$` means end of input.
    pub suffix: Option<Vec<char>>,
}

/// Main optimization entry point
pub(crate) fn optimize(head: Chain, flags: &Flags, config: &OptConfig) -> Optimized {
    let mut head = passes::rewrite_chain(head, config);

    if config.annotate_lengths {
        passes::annotate(head.as_mut());
    }

    let suffix = if config.suffix_reject && !flags.line_anchors {
        fixed_suffix(&head)
    } else {
        None
    };
    if let Some(suffix) = &suffix {
        log::trace!(
            "suffix_reject: matches must end with {:?}",
            suffix.iter().collect::<String>()
        );
    }

    Optimized { head, suffix }
}

fn fixed_suffix(head: &Chain) -> Option<Vec<char>> {
    let nodes: Vec<_> = iter(head.as_deref()).collect();
    let [.., last_literal, anchor] = nodes.as_slice() else {
        return None;
    };
    if anchor.kind != NodeKind::EndAnchor || !anchor.quantifier.is_one() {
        return None;
    }
    match &last_literal.kind {
        NodeKind::Literal(text) if last_literal.quantifier.is_one() => Some(text.clone()),
        _ => None,
    }
}
