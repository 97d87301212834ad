use crate::{Node, NodeId};

/// Owns every node of one method body, addressed by [`NodeId`].
///
/// Nodes are appended, never removed — cleanup in the surrounding pass
/// drops `NodeId`s from parents' child lists, not arena slots. This keeps
/// `NodeId`s stable for the lifetime of the arena, which is what lets
/// topology maps built at the start of a pass stay valid as nodes are
/// rewritten or excised from the tree.
#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, returning its id.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Number of nodes ever allocated (including any no longer reachable
    /// from the root after cleanup removed them from their parent).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// # Panics
    /// Panics if `id` was not allocated by this arena.
    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.as_u32() as usize]
    }

    /// # Panics
    /// Panics if `id` was not allocated by this arena.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.as_u32() as usize]
    }

    /// Structural children of `id`, per [`Node::children`].
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.get(id).children()
    }

    /// All ids of nodes allocated so far, in allocation order. Includes ids
    /// no longer reachable from the root; callers that need only live nodes
    /// should walk from the root via `children` instead.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId::from_raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AstCode, BlockData, ExpressionData};

    #[test]
    fn alloc_assigns_increasing_ids() {
        let mut arena = Arena::new();
        let a = arena.alloc(Node::Expression(ExpressionData {
            code: AstCode::Nop,
            ..Default::default()
        }));
        let b = arena.alloc(Node::Expression(ExpressionData {
            code: AstCode::Return,
            ..Default::default()
        }));
        assert!(a.as_u32() < b.as_u32());
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn children_follow_node_definition() {
        let mut arena = Arena::new();
        let ret = arena.alloc(Node::Expression(ExpressionData {
            code: AstCode::Return,
            ..Default::default()
        }));
        let block = arena.alloc(Node::Block(BlockData {
            body: vec![ret],
            entry_goto: None,
        }));
        assert_eq!(arena.children(block), vec![ret]);
    }

    #[test]
    #[should_panic]
    fn get_panics_on_foreign_id() {
        let arena = Arena::new();
        arena.get(NodeId::from_raw(0));
    }
}
