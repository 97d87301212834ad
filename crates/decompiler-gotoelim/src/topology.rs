use std::collections::HashMap;

use decompiler_ast::{Arena, Node, NodeId};

use crate::error::{GotoElimError, Result};

/// Parent / next-sibling / label topology of one method body, computed once
/// at the start of a pass and consulted (never mutated) by everything else.
///
/// Maps are keyed by [`NodeId`], so identity — not structural equality — is
/// what distinguishes nodes. `parent` and `next_sibling` use a present key
/// with a `None` value as the NULL sentinel (root has no parent; a last
/// child has no next sibling), which a `HashMap` makes easy to tell apart
/// from "never indexed".
#[derive(Debug, Default)]
pub struct Topology {
    parent: HashMap<NodeId, Option<NodeId>>,
    next_sibling: HashMap<NodeId, Option<NodeId>>,
    label_before: HashMap<NodeId, NodeId>,
    node_after_label: HashMap<NodeId, NodeId>,
}

impl Topology {
    /// Build the index by a single recursive descent from `root`.
    pub fn build(arena: &Arena, root: NodeId) -> Result<Self> {
        let mut topo = Topology::default();
        topo.parent.insert(root, None);
        topo.index_children(arena, root)?;
        Ok(topo)
    }

    fn index_children(&mut self, arena: &Arena, node: NodeId) -> Result<()> {
        let children = arena.children(node);
        let mut prev: Option<NodeId> = None;

        for &child in &children {
            if self.parent.contains_key(&child) {
                return Err(GotoElimError::LinkedFromMultipleLocations { node: child });
            }
            self.parent.insert(child, Some(node));

            if let Some(p) = prev {
                self.next_sibling.insert(p, Some(child));
                if matches!(arena.get(p), Node::Label(_)) {
                    self.label_before.insert(child, p);
                    self.node_after_label.insert(p, child);
                }
            }
            prev = Some(child);
        }
        if let Some(last) = prev {
            self.next_sibling.insert(last, None);
        }

        for &child in &children {
            self.index_children(arena, child)?;
        }
        Ok(())
    }

    /// Structural parent of `node`, or `None` at the method root.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parent.get(&node).copied().flatten()
    }

    /// Next sibling of `node` under the same parent, or `None` for the last
    /// child.
    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.next_sibling.get(&node).copied().flatten()
    }

    /// The label immediately preceding `node`, if any.
    pub fn label_before(&self, node: NodeId) -> Option<NodeId> {
        self.label_before.get(&node).copied()
    }

    /// The node immediately following `label`, if any.
    pub fn node_after_label(&self, label: NodeId) -> Option<NodeId> {
        self.node_after_label.get(&label).copied()
    }

    /// Ancestors of `node`, innermost first, not including `node` itself.
    pub fn ancestors(&self, node: NodeId) -> crate::ancestors::Ancestors<'_> {
        crate::ancestors::Ancestors::new(self, node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decompiler_ast::{AstCode, BlockData, ExpressionData};

    fn leaf(arena: &mut Arena, code: AstCode) -> NodeId {
        arena.alloc(Node::Expression(ExpressionData {
            code,
            ..Default::default()
        }))
    }

    #[test]
    fn root_has_no_parent() {
        let mut arena = Arena::new();
        let ret = leaf(&mut arena, AstCode::Return);
        let root = arena.alloc(Node::Block(BlockData {
            body: vec![ret],
            entry_goto: None,
        }));
        let topo = Topology::build(&arena, root).unwrap();
        assert_eq!(topo.parent(root), None);
        assert_eq!(topo.parent(ret), Some(root));
    }

    #[test]
    fn last_child_has_sentinel_next_sibling() {
        let mut arena = Arena::new();
        let a = leaf(&mut arena, AstCode::Nop);
        let b = leaf(&mut arena, AstCode::Return);
        let root = arena.alloc(Node::Block(BlockData {
            body: vec![a, b],
            entry_goto: None,
        }));
        let topo = Topology::build(&arena, root).unwrap();
        assert_eq!(topo.next_sibling(a), Some(b));
        // Present key, None value: last child, distinct from "not indexed".
        assert_eq!(topo.next_sibling.get(&b), Some(&None));
        assert_eq!(topo.next_sibling(b), None);
    }

    #[test]
    fn label_before_and_node_after_label_are_inverses() {
        let mut arena = Arena::new();
        let label = arena.alloc(Node::Label(decompiler_ast::LabelData));
        let target = leaf(&mut arena, AstCode::Return);
        let root = arena.alloc(Node::Block(BlockData {
            body: vec![label, target],
            entry_goto: None,
        }));
        let topo = Topology::build(&arena, root).unwrap();
        assert_eq!(topo.label_before(target), Some(label));
        assert_eq!(topo.node_after_label(label), Some(target));
    }

    #[test]
    fn double_parentage_is_an_error() {
        let mut arena = Arena::new();
        let shared = leaf(&mut arena, AstCode::Nop);
        let root = arena.alloc(Node::Block(BlockData {
            body: vec![shared, shared],
            entry_goto: None,
        }));
        let err = Topology::build(&arena, root).unwrap_err();
        assert!(matches!(
            err,
            GotoElimError::LinkedFromMultipleLocations { node } if node == shared
        ));
    }
}
