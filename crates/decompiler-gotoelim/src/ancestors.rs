use decompiler_ast::{Arena, Node, NodeId};

use crate::topology::Topology;

/// Lazy walk of the strict ancestors of a node, innermost first, stopping
/// at the method root. Consumed as an `Iterator`; nothing is materialized
/// up front, so callers that only need the first matching ancestor (the
/// classifier's break/continue search) can short-circuit cheaply.
pub struct Ancestors<'a> {
    topology: &'a Topology,
    current: Option<NodeId>,
}

impl<'a> Ancestors<'a> {
    pub(crate) fn new(topology: &'a Topology, node: NodeId) -> Self {
        Self {
            topology,
            current: topology.parent(node),
        }
    }
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.current?;
        self.current = self.topology.parent(node);
        Some(node)
    }
}

/// Ancestors filtered to nodes matching `pred`, e.g. just `Loop`s or just
/// `TryCatchBlock`s. Equivalent to the ancestor walker's optional kind
/// filter.
pub fn ancestors_matching<'a>(
    topology: &'a Topology,
    arena: &'a Arena,
    node: NodeId,
    mut pred: impl FnMut(&Node) -> bool + 'a,
) -> impl Iterator<Item = NodeId> + 'a {
    Ancestors::new(topology, node).filter(move |&id| pred(arena.get(id)))
}
