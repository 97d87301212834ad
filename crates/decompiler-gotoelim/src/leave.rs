//! Leave transformer: normalizes exits from handler bodies before goto
//! classification runs, so the classifier never has to special-case a
//! `goto` whose natural landing spot is implicitly past the end of a
//! `catch`/`try` rather than a real statement.

use decompiler_ast::{Arena, AstCode, Node, NodeId};

use crate::error::Result;
use crate::flow::{self, Visited};
use crate::topology::Topology;

/// For every `goto` that is the last statement of a `Block` whose parent is
/// a `CatchBlock` or `TryCatchBlock`, and whose fresh-visited `exit` lands on
/// a `Leave` expression, rewrite it to a bare `Leave` (no operand).
pub fn normalize_handler_exits(arena: &mut Arena, topo: &Topology, root: NodeId) -> Result<()> {
    for g in collect_handler_tail_gotos(arena, topo, root) {
        let mut visited = Visited::new();
        let lands_on_leave = matches!(
            flow::exit(arena, topo, g, &mut visited)?.map(|n| arena.get(n).clone()),
            Some(Node::Expression(e)) if e.code == AstCode::Leave
        );
        if lands_on_leave {
            let ge = arena.get_mut(g).as_expression_mut().expect("g is an Expression");
            ge.code = AstCode::Leave;
            ge.operand = None;
        }
    }
    Ok(())
}

fn collect_handler_tail_gotos(arena: &Arena, topo: &Topology, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if is_goto(arena, id) && is_last_statement_of_handler_block(arena, topo, id) {
            out.push(id);
        }
        stack.extend(arena.children(id));
    }
    out
}

fn is_goto(arena: &Arena, id: NodeId) -> bool {
    matches!(arena.get(id), Node::Expression(e) if e.code == AstCode::Goto)
}

fn is_last_statement_of_handler_block(arena: &Arena, topo: &Topology, node: NodeId) -> bool {
    let Some(block_id) = topo.parent(node) else {
        return false;
    };
    let Some(block) = arena.get(block_id).as_block() else {
        return false;
    };
    if block.body.last() != Some(&node) {
        return false;
    }
    let Some(grandparent) = topo.parent(block_id) else {
        return false;
    };
    matches!(
        arena.get(grandparent),
        Node::CatchBlock(_) | Node::TryCatchBlock(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use decompiler_ast::{BlockData, CatchBlockData, ExpressionData, TryCatchBlockData};

    #[test]
    fn tail_goto_to_leave_is_normalized() {
        let mut arena = Arena::new();
        let leave = arena.alloc(Node::Expression(ExpressionData {
            code: AstCode::Leave,
            ..Default::default()
        }));
        let g = arena.alloc(Node::Expression(ExpressionData {
            code: AstCode::Goto,
            operand: Some(leave),
            ..Default::default()
        }));
        let catch_body = arena.alloc(Node::Block(BlockData {
            body: vec![g],
            entry_goto: None,
        }));
        let catch = arena.alloc(Node::CatchBlock(CatchBlockData { body: catch_body }));

        let try_body = arena.alloc(Node::Block(BlockData {
            body: vec![leave],
            entry_goto: None,
        }));
        let tcb = arena.alloc(Node::TryCatchBlock(TryCatchBlockData {
            try_block: try_body,
            catches: vec![catch],
            finally_block: None,
        }));
        let root = arena.alloc(Node::Block(BlockData {
            body: vec![tcb],
            entry_goto: None,
        }));

        let topo = Topology::build(&arena, root).unwrap();
        normalize_handler_exits(&mut arena, &topo, root).unwrap();

        let ge = arena.get(g).as_expression().unwrap();
        assert_eq!(ge.code, AstCode::Leave);
        assert!(ge.operand.is_none());
    }

    #[test]
    fn goto_not_in_handler_tail_is_untouched() {
        let mut arena = Arena::new();
        let target = arena.alloc(Node::Expression(ExpressionData {
            code: AstCode::Nop,
            ..Default::default()
        }));
        let g = arena.alloc(Node::Expression(ExpressionData {
            code: AstCode::Goto,
            operand: Some(target),
            ..Default::default()
        }));
        let root = arena.alloc(Node::Block(BlockData {
            body: vec![g, target],
            entry_goto: None,
        }));
        let topo = Topology::build(&arena, root).unwrap();
        normalize_handler_exits(&mut arena, &topo, root).unwrap();

        assert_eq!(arena.get(g).as_expression().unwrap().code, AstCode::Goto);
    }
}
