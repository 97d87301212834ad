//! The `enter`/`exit` flow simulator.
//!
//! `enter(n)` answers "what executes when control begins at `n`?"; `exit(n)`
//! answers "what executes when `n` completes?". Neither mutates the tree.
//! Both share a caller-provided visited set purely to break cycles — if a
//! node would be entered twice in one simulation, the answer is `None`
//! rather than an infinite recursion, mirroring how a single-successor
//! chain walk elsewhere in this codebase uses a visited set to stop at the
//! first repeat instead of looping forever.

use std::collections::HashSet;

use decompiler_ast::{Arena, AstCode, Node, NodeId};

use crate::error::{GotoElimError, Result};
use crate::topology::Topology;

pub type Visited = HashSet<NodeId>;

fn is_try_catch(n: &Node) -> bool {
    matches!(n, Node::TryCatchBlock(_))
}

/// Where control lands when execution begins at `node`.
pub fn enter(arena: &Arena, topo: &Topology, node: NodeId, visited: &mut Visited) -> Result<Option<NodeId>> {
    if !visited.insert(node) {
        return Ok(None);
    }

    match arena.get(node) {
        Node::Label(_) => exit(arena, topo, node, visited),

        Node::Expression(e) if e.code != AstCode::Goto => Ok(Some(node)),

        Node::Expression(e) => match e.operand {
            Some(target) => enter_goto(arena, topo, node, target, visited),
            None => Ok(None),
        },

        Node::Block(b) => {
            if let Some(entry_goto) = b.entry_goto {
                enter(arena, topo, entry_goto, visited)
            } else if let Some(&first) = b.body.first() {
                enter(arena, topo, first, visited)
            } else {
                exit(arena, topo, node, visited)
            }
        }

        Node::Condition(c) => Ok(Some(c.condition)),

        Node::Loop(l) => match l.condition {
            Some(cond) => Ok(Some(cond)),
            None => enter(arena, topo, l.body, visited),
        },

        Node::TryCatchBlock(_) => Ok(Some(node)),

        Node::Switch(s) => Ok(Some(s.condition)),

        Node::CaseBlock(c) => enter(arena, topo, c.body, visited),

        Node::CatchBlock(c) => enter(arena, topo, c.body, visited),
    }
}

/// Where control lands when `node` completes.
pub fn exit(arena: &Arena, topo: &Topology, node: NodeId, visited: &mut Visited) -> Result<Option<NodeId>> {
    let Some(parent) = topo.parent(node) else {
        return Ok(None);
    };

    match arena.get(parent) {
        Node::Block(_) => {
            if let Some(next) = topo.next_sibling(node) {
                enter(arena, topo, next, visited)
            } else {
                exit(arena, topo, parent, visited)
            }
        }

        Node::Condition(_) => exit(arena, topo, parent, visited),

        // Entry to a try block is forbidden, so completing it falls through
        // as if the try-catch were a single statement; the finally block is
        // not a structured successor and is never reached via `exit`.
        Node::TryCatchBlock(_) => exit(arena, topo, parent, visited),

        Node::Switch(_) => Ok(None),

        Node::Loop(_) => enter(arena, topo, parent, visited),

        // Not named by the method-body shape the simulator was designed
        // against, but required by this tree's nesting: a catch body that
        // falls off the end completes the whole try-catch, same as the try
        // body would.
        Node::CatchBlock(_) => exit(arena, topo, parent, visited),

        // A case body that falls off the end is the same "implicit
        // fall-off-end is not allowed; must break explicitly" rule as a
        // switch itself — it has no structured successor, the same as
        // `exit`'s `Switch` rule.
        Node::CaseBlock(_) => Ok(None),

        other => Err(GotoElimError::UnsupportedNode {
            node: parent,
            kind: other.kind_name(),
        }),
    }
}

/// `enter`'s rule for a `goto` expression: simulate where its target label
/// would be entered from, honoring try/catch boundaries that a plain
/// `enter(target)` would ignore.
fn enter_goto(
    arena: &Arena,
    topo: &Topology,
    goto: NodeId,
    target: NodeId,
    visited: &mut Visited,
) -> Result<Option<NodeId>> {
    let goto_tcb = crate::ancestors::ancestors_matching(topo, arena, goto, is_try_catch).next();
    let target_tcb = crate::ancestors::ancestors_matching(topo, arena, target, is_try_catch).next();

    if goto_tcb == target_tcb {
        return enter(arena, topo, target, visited);
    }

    // Outermost-first chains, so the common prefix is the set of try blocks
    // both the goto and the target are nested inside.
    let goto_chain: Vec<NodeId> =
        crate::ancestors::ancestors_matching(topo, arena, goto, is_try_catch)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
    let target_chain: Vec<NodeId> =
        crate::ancestors::ancestors_matching(topo, arena, target, is_try_catch)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();

    let common = goto_chain
        .iter()
        .zip(target_chain.iter())
        .take_while(|(a, b)| a == b)
        .count();

    if common == target_chain.len() {
        // The target's try-nesting is a prefix of the goto's: the target is
        // in an enclosing or identical set of try blocks.
        return enter(arena, topo, target, visited);
    }

    let ttb = target_chain[common];
    let Some(try_data) = arena.get(ttb).as_try_catch() else {
        return Ok(None);
    };

    if try_entry_matches(arena, try_data.try_block, target) {
        Ok(Some(ttb))
    } else {
        Ok(None)
    }
}

/// Whether `target` is the first real statement of `try_body`, allowing
/// leading `Nop`s and other labels stacked on the same location, and
/// descending into a nested try's body if one intervenes first.
fn try_entry_matches(arena: &Arena, try_body: NodeId, target: NodeId) -> bool {
    let Some(block) = arena.get(try_body).as_block() else {
        return false;
    };

    for &stmt in &block.body {
        match arena.get(stmt) {
            Node::Expression(e) if e.code == AstCode::Nop => continue,
            Node::Label(_) if stmt == target => return true,
            Node::Label(_) => continue,
            Node::TryCatchBlock(inner) => return try_entry_matches(arena, inner.try_block, target),
            _ => return false,
        }
    }
    false
}
