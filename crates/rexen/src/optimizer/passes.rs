// Chain rewriting passes

use super::OptConfig;
use crate::node::{Chain, Node, NodeKind, link, unlink};
use crate::quantifier::Quantifier;

/// Apply all enabled rewrites to `chain` and, first, to every chain nested
/// inside it.
pub fn rewrite_chain(chain: Chain, config: &OptConfig) -> Chain {
    let mut nodes = unlink(chain);
    for node in &mut nodes {
        rewrite_children(node, config);
    }

    if config.collapse_groups {
        nodes = collapse_groups(nodes);
    }
    if config.dedup {
        nodes = dedup(nodes);
    }
    if config.expose_literals {
        nodes = expose_literals(nodes);
    }

    link(nodes)
}

fn rewrite_children(node: &mut Node, config: &OptConfig) {
    match &mut node.kind {
        NodeKind::Group(body) | NodeKind::Capture { body, .. } => {
            *body = rewrite_chain(body.take(), config);
        }
        NodeKind::Alternation(options) => {
            for option in options.iter_mut() {
                *option = rewrite_chain(option.take(), config);
            }
        }
        // The operand itself must stay a single node.
        NodeKind::Negation(operand) => rewrite_children(operand, config),
        _ => {}
    }
}

/// Superfluous-group collapse
///
/// - `()` and `()*` match nothing and are dropped
/// - `(x)` becomes `x`
/// - `(x)*` becomes `x*` when `x` is unquantified
fn collapse_groups(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());

    for mut node in nodes {
        let NodeKind::Group(body) = &mut node.kind else {
            out.push(node);
            continue;
        };

        let mut inner = unlink(body.take());
        match inner.len() {
            0 => {
                log::trace!("collapse_groups: dropped empty group");
            }
            1 if node.quantifier.is_one() => {
                let single = inner.remove(0);
                log::trace!("collapse_groups: unwrapped ({})", single);
                out.push(single);
            }
            1 if inner[0].quantifier.is_one()
                && inner[0].kind.is_quantifiable()
                && !matches!(inner[0].kind, NodeKind::Alternation(_)) =>
            {
                let single = inner.remove(0).with_quantifier(node.quantifier);
                log::trace!("collapse_groups: group quantifier moved onto {}", single);
                out.push(single);
            }
            _ => {
                node.kind = NodeKind::Group(link(inner));
                out.push(node);
            }
        }
    }

    out
}

/// Duplicate-node removal
///
/// - repeated identical anchors collapse to one
/// - later alternation options equal to an earlier one are dropped, and an
///   alternation left with a single option is replaced by it
/// - adjacent identical greedy repeated atoms merge their counts
fn dedup(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());

    for mut node in nodes {
        if let NodeKind::Alternation(options) = &mut node.kind {
            let before = options.len();
            let mut kept: Vec<Chain> = Vec::with_capacity(before);
            for option in options.drain(..) {
                if !kept.contains(&option) {
                    kept.push(option);
                }
            }
            if kept.len() < before {
                log::trace!("dedup: dropped {} alternation options", before - kept.len());
            }
            if kept.len() == 1 {
                let only = unlink(kept.pop().flatten());
                log::trace!("dedup: single-option alternation inlined");
                for inner in only {
                    push_merged(&mut out, inner);
                }
                continue;
            }
            *options = kept;
        }

        push_merged(&mut out, node);
    }

    out
}

fn push_merged(out: &mut Vec<Node>, node: Node) {
    let Some(prev) = out.last_mut() else {
        out.push(node);
        return;
    };

    if node.kind.is_anchor() && prev.same_shape(&node) {
        log::trace!("dedup: repeated {}", node);
        return;
    }

    let repeatable = matches!(
        node.kind,
        NodeKind::Literal(_) | NodeKind::AnyChar | NodeKind::Class(_)
    );
    if repeatable
        && prev.kind == node.kind
        && prev.quantifier.greedy
        && node.quantifier.greedy
        && !prev.quantifier.is_one()
        && !node.quantifier.is_one()
    {
        let merged = Quantifier {
            min: prev.quantifier.min.saturating_add(node.quantifier.min),
            max: match (prev.quantifier.max, node.quantifier.max) {
                (Some(a), Some(b)) => Some(a.saturating_add(b)),
                _ => None,
            },
            greedy: true,
        };
        log::trace!("dedup: {}{} -> {}", prev, node, prev.clone().with_quantifier(merged));
        prev.quantifier = merged;
        return;
    }

    out.push(node);
}

/// Literal exposure: `lit+` becomes `lit lit*`, so the mandatory occurrence
/// is checked without entering the repetition loop.
fn expose_literals(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());

    for node in nodes {
        let q = node.quantifier;
        if matches!(node.kind, NodeKind::Literal(_)) && q.min == 1 && q.max.is_none() {
            let rest = Quantifier {
                min: 0,
                max: None,
                greedy: q.greedy,
            };
            let first = node.clone().with_quantifier(Quantifier::ONE);
            let tail = node.with_quantifier(rest);
            log::trace!("expose_literals: {}{}", first, tail);
            out.push(first);
            out.push(tail);
        } else {
            out.push(node);
        }
    }

    out
}

/// Minimum-remaining-length annotation. Returns the value stored on the
/// head of `chain`.
pub fn annotate(chain: Option<&mut Box<Node>>) -> usize {
    let Some(node) = chain else {
        return 0;
    };
    let rest = annotate(node.next.as_mut());

    let own = match &mut node.kind {
        NodeKind::Literal(text) => text.len(),
        NodeKind::AnyChar | NodeKind::Class(_) => 1,
        NodeKind::Group(body) | NodeKind::Capture { body, .. } => annotate(body.as_mut()),
        NodeKind::Alternation(options) => options
            .iter_mut()
            .map(|option| annotate(option.as_mut()))
            .min()
            .unwrap_or(0),
        NodeKind::Negation(operand) => {
            annotate(Some(operand));
            0
        }
        NodeKind::StartAnchor
        | NodeKind::EndAnchor
        | NodeKind::WordStart
        | NodeKind::WordEnd
        | NodeKind::Backreference(_) => 0,
    };

    node.min_len = own.saturating_mul(node.quantifier.min).saturating_add(rest);
    node.min_len
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Render, iter};
    use smol_str::SmolStr;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn rewrite(nodes: Vec<Node>) -> String {
        let chain = rewrite_chain(link(nodes), &OptConfig::default());
        Render(chain.as_deref()).to_string()
    }

    #[test]
    fn test_collapse_single_node_group() {
        let group = Node::new(NodeKind::Group(link(vec![Node::literal(chars("ab"))])));
        assert_eq!(rewrite(vec![group]), "ab");
    }

    #[test]
    fn test_collapse_moves_quantifier() {
        let group = Node::new(NodeKind::Group(link(vec![Node::literal(chars("ab"))])))
            .with_quantifier(Quantifier::STAR);
        assert_eq!(rewrite(vec![group]), "(ab)*");
        let chain = rewrite_chain(
            link(vec![
                Node::new(NodeKind::Group(link(vec![Node::literal(chars("ab"))])))
                    .with_quantifier(Quantifier::STAR),
            ]),
            &OptConfig::default(),
        );
        assert!(matches!(chain.unwrap().kind, NodeKind::Literal(_)));
    }

    #[test]
    fn test_capture_never_collapsed() {
        let capture = Node::new(NodeKind::Capture {
            name: SmolStr::new("x"),
            body: link(vec![Node::literal(chars("a"))]),
        });
        assert_eq!(rewrite(vec![capture]), "@<x>(a)");
    }

    #[test]
    fn test_empty_group_dropped() {
        let group = Node::new(NodeKind::Group(None)).with_quantifier(Quantifier::PLUS);
        assert_eq!(rewrite(vec![group, Node::literal(chars("a"))]), "a");
    }

    #[test]
    fn test_dedup_anchors_and_atoms() {
        let nodes = vec![
            Node::new(NodeKind::StartAnchor),
            Node::new(NodeKind::StartAnchor),
            Node::literal(chars("a")).with_quantifier(Quantifier::STAR),
            Node::literal(chars("a")).with_quantifier(Quantifier::range(2, Some(3)).unwrap()),
        ];
        assert_eq!(rewrite(nodes), "^a{2,}");
    }

    #[test]
    fn test_lazy_atoms_not_merged() {
        let nodes = vec![
            Node::new(NodeKind::AnyChar).with_quantifier(Quantifier::STAR.lazy()),
            Node::new(NodeKind::AnyChar).with_quantifier(Quantifier::STAR),
        ];
        assert_eq!(rewrite(nodes), ".*?.*");
    }

    #[test]
    fn test_dedup_alternation_options() {
        let alternation = Node::new(NodeKind::Alternation(vec![
            link(vec![Node::literal(chars("x"))]),
            link(vec![Node::literal(chars("y"))]),
            link(vec![Node::literal(chars("x"))]),
        ]));
        assert_eq!(rewrite(vec![alternation]), "x|y");

        let single = Node::new(NodeKind::Alternation(vec![
            link(vec![Node::literal(chars("x"))]),
            link(vec![Node::literal(chars("x"))]),
        ]));
        assert_eq!(rewrite(vec![single, Node::literal(chars("z"))]), "xz");
    }

    #[test]
    fn test_expose_literal() {
        let nodes = vec![Node::literal(chars("a")).with_quantifier(Quantifier::PLUS.lazy())];
        assert_eq!(rewrite(nodes), "aa*?");
    }

    #[test]
    fn test_annotate_lengths() {
        let mut chain = link(vec![
            Node::literal(chars("ab")),
            Node::new(NodeKind::Class(crate::class::CharClass::new()))
                .with_quantifier(Quantifier::range(2, None).unwrap()),
            Node::new(NodeKind::Alternation(vec![
                link(vec![Node::literal(chars("xyz"))]),
                link(vec![Node::new(NodeKind::AnyChar)]),
            ])),
            Node::new(NodeKind::EndAnchor),
        ]);
        assert_eq!(annotate(chain.as_mut()), 5);
        let lens: Vec<usize> = iter(chain.as_deref()).map(|n| n.min_len).collect();
        assert_eq!(lens, vec![5, 3, 1, 0]);
    }
}
