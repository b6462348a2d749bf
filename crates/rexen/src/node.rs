// Compiled pattern representation
//
// A pattern compiles into a singly linked chain of nodes. Each node owns its
// successor (`next`) and any sub-chains (group bodies, alternation options,
// negated operand). The successor of an alternation is shared by all of its
// options and is reached only through the alternation node itself.

use std::fmt;

use smol_str::SmolStr;

use crate::class::CharClass;
use crate::quantifier::Quantifier;

/// An owned, possibly empty, chain of nodes.
pub type Chain = Option<Box<Node>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Fixed codepoint sequence, never empty.
    Literal(Vec<char>),
    AnyChar,
    Class(CharClass),
    StartAnchor,
    EndAnchor,
    /// `\b`
    WordStart,
    /// `\B`
    WordEnd,
    Group(Chain),
    Capture { name: SmolStr, body: Chain },
    Backreference(SmolStr),
    Alternation(Vec<Chain>),
    /// Zero-width; succeeds when the operand fails.
    Negation(Box<Node>),
}

impl NodeKind {
    /// Nodes whose single repetition is deterministic: one way to match or
    /// none. These repeat with the position-stack loop.
    pub fn is_atom(&self) -> bool {
        !matches!(
            self,
            NodeKind::Group(_) | NodeKind::Capture { .. } | NodeKind::Alternation(_)
        )
    }

    pub fn is_anchor(&self) -> bool {
        matches!(
            self,
            NodeKind::StartAnchor | NodeKind::EndAnchor | NodeKind::WordStart | NodeKind::WordEnd
        )
    }

    pub fn is_quantifiable(&self) -> bool {
        !self.is_anchor() && !matches!(self, NodeKind::Negation(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub quantifier: Quantifier,
    /// Minimum number of codepoints this node and the rest of its chain
    /// consume. Zero until the optimizer annotates it.
    pub min_len: usize,
    pub next: Chain,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            quantifier: Quantifier::ONE,
            min_len: 0,
            next: None,
        }
    }

    pub fn literal(text: Vec<char>) -> Self {
        Node::new(NodeKind::Literal(text))
    }

    pub fn with_quantifier(mut self, quantifier: Quantifier) -> Self {
        self.quantifier = quantifier;
        self
    }

    /// Same kind and quantifier, ignoring successors and annotations.
    pub fn same_shape(&self, other: &Node) -> bool {
        self.kind == other.kind && self.quantifier == other.quantifier
    }
}

/// Links `nodes` into a chain, in order.
pub fn link(nodes: Vec<Node>) -> Chain {
    nodes.into_iter().rev().fold(None, |next, mut node| {
        node.next = next;
        Some(Box::new(node))
    })
}

/// Breaks a chain back into its nodes, clearing every `next` link.
pub fn unlink(mut chain: Chain) -> Vec<Node> {
    let mut nodes = Vec::new();
    while let Some(mut node) = chain {
        chain = node.next.take();
        nodes.push(*node);
    }
    nodes
}

pub fn iter(chain: Option<&Node>) -> impl Iterator<Item = &Node> {
    std::iter::successors(chain, |node| node.next.as_deref())
}

/// Counts every node reachable from `chain`, sub-chains included.
pub fn count(chain: Option<&Node>) -> usize {
    iter(chain)
        .map(|node| {
            1 + match &node.kind {
                NodeKind::Group(body) | NodeKind::Capture { body, .. } => count(body.as_deref()),
                NodeKind::Alternation(options) => {
                    options.iter().map(|o| count(o.as_deref())).sum()
                }
                NodeKind::Negation(operand) => count(Some(operand)),
                _ => 0,
            }
        })
        .sum()
}

const SPECIAL: &[char] = &[
    '\\', '.', '^', '$', '[', ']', '(', ')', '@', '|', '!', '?', '*', '+', '{', '}',
];

pub(crate) fn is_special(c: char) -> bool {
    SPECIAL.contains(&c)
}

fn write_char(f: &mut fmt::Formatter<'_>, c: char) -> fmt::Result {
    if is_special(c) {
        write!(f, "\\{}", c)
    } else {
        write!(f, "{}", c)
    }
}

/// Renders a chain back in pattern syntax, for diagnostics.
pub struct Render<'a>(pub Option<&'a Node>);

impl fmt::Display for Render<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in iter(self.0) {
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Literal(text) => {
                let wrap = text.len() > 1 && !self.quantifier.is_one();
                if wrap {
                    write!(f, "(")?;
                }
                for &c in text {
                    write_char(f, c)?;
                }
                if wrap {
                    write!(f, ")")?;
                }
            }
            NodeKind::AnyChar => write!(f, ".")?,
            NodeKind::Class(class) => write!(f, "{}", class)?,
            NodeKind::StartAnchor => write!(f, "^")?,
            NodeKind::EndAnchor => write!(f, "$")?,
            NodeKind::WordStart => write!(f, "\\b")?,
            NodeKind::WordEnd => write!(f, "\\B")?,
            NodeKind::Group(body) => write!(f, "({})", Render(body.as_deref()))?,
            NodeKind::Capture { name, body } => {
                write!(f, "@<{}>({})", name, Render(body.as_deref()))?
            }
            NodeKind::Backreference(name) => write!(f, "@:<{}>", name)?,
            NodeKind::Alternation(options) => {
                for (i, option) in options.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{}", Render(option.as_deref()))?;
                }
            }
            NodeKind::Negation(operand) => write!(f, "!{}", operand)?,
        }
        write!(f, "{}", self.quantifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_and_unlink() {
        let chain = link(vec![
            Node::literal(vec!['a']),
            Node::new(NodeKind::AnyChar),
            Node::new(NodeKind::EndAnchor),
        ]);
        assert_eq!(iter(chain.as_deref()).count(), 3);
        let nodes = unlink(chain);
        assert_eq!(nodes.len(), 3);
        assert!(nodes.iter().all(|n| n.next.is_none()));
    }

    #[test]
    fn test_count_includes_sub_chains() {
        let group = Node::new(NodeKind::Group(link(vec![
            Node::literal(vec!['a']),
            Node::literal(vec!['b']),
        ])));
        let chain = link(vec![group, Node::new(NodeKind::AnyChar)]);
        assert_eq!(count(chain.as_deref()), 4);
    }

    #[test]
    fn test_render() {
        let chain = link(vec![
            Node::literal(vec!['a', '.']),
            Node::literal(vec!['b', 'c']).with_quantifier(Quantifier::STAR),
            Node::new(NodeKind::Backreference(SmolStr::new("x"))),
        ]);
        assert_eq!(Render(chain.as_deref()).to_string(), "a\\.(bc)*@:<x>");
    }

    #[test]
    fn test_atoms() {
        assert!(NodeKind::AnyChar.is_atom());
        assert!(NodeKind::Negation(Box::new(Node::new(NodeKind::AnyChar))).is_atom());
        assert!(!NodeKind::Group(None).is_atom());
        assert!(!NodeKind::StartAnchor.is_quantifiable());
    }
}
