//! Goto classification and rewriting.
//!
//! [`try_simplify_goto`] attempts, in order, to recognize a `goto` as a
//! natural fall-through, a jump into an enclosing `finally`, a `break`, a
//! `continue`, or an inlined `return`/`throw`; [`sweep`] repeats this over
//! every goto in the tree to a fixed point.

use decompiler_ast::{Arena, AstCode, ExpressionData, Node, NodeId};

use crate::ancestors::ancestors_matching;
use crate::error::Result;
use crate::flow::{self, Visited};
use crate::topology::Topology;

fn is_try_catch(n: &Node) -> bool {
    matches!(n, Node::TryCatchBlock(_))
}

/// Try each rewrite rule against the goto at `g`. Returns whether any rule
/// applied. `g` must name a `Goto` expression; any other node is left
/// untouched and reports no change.
pub fn try_simplify_goto(arena: &mut Arena, topo: &Topology, g: NodeId) -> Result<bool> {
    let raw_target = match arena.get(g) {
        Node::Expression(e) if e.code == AstCode::Goto => e.operand,
        _ => return Ok(false),
    };
    let Some(raw_target) = raw_target else {
        return Ok(false);
    };

    let target = match flow::enter(arena, topo, g, &mut Visited::new())? {
        Some(t) => t,
        None => return Ok(false),
    };

    // Rule 1: does falling through naturally land in the same place as the jump?
    let mut exit_visited = Visited::new();
    exit_visited.insert(g);
    if flow::exit(arena, topo, g, &mut exit_visited)? == Some(target) {
        rewrite_to_nop(arena, g, target);
        return Ok(true);
    }

    // Rule 2: jump into an enclosing finally is redundant — finally runs anyway.
    for tcb in ancestors_matching(topo, arena, g, is_try_catch) {
        let Some(finally) = arena.get(tcb).as_try_catch().and_then(|t| t.finally_block) else {
            continue;
        };
        if flow::enter(arena, topo, finally, &mut Visited::new())? == Some(target) {
            rewrite_to_nop(arena, g, target);
            return Ok(true);
        }
    }

    // Rule 3: break out of an enclosing loop or switch.
    if let Some(keep_operand) = find_break_target(arena, topo, g, raw_target, target)? {
        let ge = arena.get_mut(g).as_expression_mut().expect("g is an Expression");
        ge.code = AstCode::LoopOrSwitchBreak;
        if !keep_operand {
            ge.operand = None;
        }
        ge.arguments.clear();
        return Ok(true);
    }

    // Rule 4: continue an enclosing loop.
    if let Some(keep_operand) = find_continue_target(arena, topo, g, target)? {
        let ge = arena.get_mut(g).as_expression_mut().expect("g is an Expression");
        ge.code = AstCode::LoopContinue;
        if !keep_operand {
            ge.operand = None;
        }
        ge.arguments.clear();
        return Ok(true);
    }

    // Rule 5: the target is (or leads straight to) a return/throw of a single value.
    if inline_return_or_throw(arena, topo, g, target) {
        return Ok(true);
    }

    Ok(false)
}

fn rewrite_to_nop(arena: &mut Arena, g: NodeId, target: NodeId) {
    let ranges = {
        let ge = arena.get_mut(g).as_expression_mut().expect("g is an Expression");
        let ranges = std::mem::take(&mut ge.ranges);
        ge.code = AstCode::Nop;
        ge.operand = None;
        ranges
    };
    if let Some(te) = arena.get_mut(target).as_expression_mut() {
        te.ranges.extend(ranges);
    }
}

fn find_break_target(
    arena: &Arena,
    topo: &Topology,
    g: NodeId,
    raw_target: NodeId,
    target: NodeId,
) -> Result<Option<bool>> {
    let mut loop_depth = 0u32;
    let mut switch_depth = 0u32;
    let mut visited = Visited::new();
    visited.insert(g);

    for anc in topo.ancestors(g) {
        match arena.get(anc) {
            Node::Loop(_) => {
                loop_depth += 1;
                let e = flow::exit(arena, topo, anc, &mut visited)?;
                if e == Some(target) || enters_try_first_child(arena, topo, e, target)? {
                    return Ok(Some(loop_depth + switch_depth > 1));
                }
            }
            Node::Switch(_) => {
                switch_depth += 1;
                if topo.next_sibling(anc) == Some(raw_target) {
                    return Ok(Some(loop_depth + switch_depth > 1));
                }
            }
            _ => {}
        }
    }
    Ok(None)
}

fn find_continue_target(
    arena: &Arena,
    topo: &Topology,
    g: NodeId,
    target: NodeId,
) -> Result<Option<bool>> {
    let mut loop_depth = 0u32;
    let mut visited = Visited::new();
    visited.insert(g);

    for anc in topo.ancestors(g) {
        if matches!(arena.get(anc), Node::Loop(_)) {
            loop_depth += 1;
            let en = flow::enter(arena, topo, anc, &mut visited)?;
            if en == Some(target) || enters_try_first_child(arena, topo, en, target)? {
                return Ok(Some(loop_depth > 1));
            }
        }
    }
    Ok(None)
}

/// Whether `landing` is a `TryCatchBlock` whose first child (the try body)
/// is itself entered at `target`, checked against its own fresh visited set
/// since this is an independent question from the walk that produced
/// `landing`.
fn enters_try_first_child(
    arena: &Arena,
    topo: &Topology,
    landing: Option<NodeId>,
    target: NodeId,
) -> Result<bool> {
    let Some(landing) = landing else { return Ok(false) };
    let Some(tcb) = arena.get(landing).as_try_catch() else {
        return Ok(false);
    };
    Ok(flow::enter(arena, topo, tcb.try_block, &mut Visited::new())? == Some(target))
}

fn inline_return_or_throw(arena: &mut Arena, topo: &Topology, g: NodeId, target: NodeId) -> bool {
    for code in [AstCode::Return, AstCode::AThrow] {
        let direct_arg: Option<Option<NodeId>> = match arena.get(target) {
            Node::Expression(te) if te.code == code && te.arguments.len() <= 1 => {
                Some(te.arguments.first().copied())
            }
            _ => None,
        };
        if let Some(arg) = direct_arg {
            let cloned = arg.map(|a| clone_expression(arena, a));
            set_return_or_throw(arena, g, code, cloned);
            return true;
        }

        if let Some(value) = match_store_then_return(arena, topo, target, code) {
            let cloned = clone_expression(arena, value);
            set_return_or_throw(arena, g, code, Some(cloned));
            return true;
        }
    }
    false
}

/// Matches `Store v <- e` at `target`, followed — skipping any labels — by
/// a `code` expression with a single `Load v` argument. Returns `e`.
fn match_store_then_return(
    arena: &Arena,
    topo: &Topology,
    target: NodeId,
    code: AstCode,
) -> Option<NodeId> {
    let (var, value) = match arena.get(target) {
        Node::Expression(store) if store.code == AstCode::Store => {
            (store.operand?, *store.arguments.first()?)
        }
        _ => return None,
    };

    let mut cur = target;
    loop {
        let next = topo.next_sibling(cur)?;
        match arena.get(next) {
            Node::Label(_) => {
                cur = next;
                continue;
            }
            Node::Expression(e) if e.code == code && e.arguments.len() == 1 => {
                let loads_var = matches!(
                    arena.get(e.arguments[0]),
                    Node::Expression(load) if load.code == AstCode::Load && load.operand == Some(var)
                );
                return loads_var.then_some(value);
            }
            _ => return None,
        }
    }
}

fn set_return_or_throw(arena: &mut Arena, g: NodeId, code: AstCode, arg: Option<NodeId>) {
    let ge = arena.get_mut(g).as_expression_mut().expect("g is an Expression");
    ge.code = code;
    ge.operand = None;
    ge.arguments = arg.into_iter().collect();
}

/// Deep-clones an expression subtree into fresh arena slots so the clone
/// has its own identity and can be inserted as a child of `g` without
/// creating a second parent for the original.
fn clone_expression(arena: &mut Arena, id: NodeId) -> NodeId {
    let Node::Expression(e) = arena.get(id).clone() else {
        return id;
    };
    let new_args: Vec<NodeId> = e
        .arguments
        .iter()
        .map(|&a| clone_expression(arena, a))
        .collect();
    arena.alloc(Node::Expression(ExpressionData {
        code: e.code,
        operand: e.operand,
        arguments: new_args,
        ranges: e.ranges.clone(),
    }))
}

/// All `Goto` expressions reachable from `root`, in pre-order.
fn collect_gotos(arena: &Arena, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if matches!(arena.get(id), Node::Expression(e) if e.code == AstCode::Goto) {
            out.push(id);
        }
        stack.extend(arena.children(id));
    }
    out
}

/// Sweep every goto reachable from `root` through [`try_simplify_goto`]
/// repeatedly until a full sweep makes no change.
pub fn sweep(arena: &mut Arena, topo: &Topology, root: NodeId) -> Result<()> {
    loop {
        let mut changed = false;
        for g in collect_gotos(arena, root) {
            if try_simplify_goto(arena, topo, g)? {
                changed = true;
                log::trace!(target: "gotoelim", "simplified goto {g}");
            }
        }
        if !changed {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decompiler_ast::{BlockData, ExpressionData, LoopData};

    fn goto_to(arena: &mut Arena, target: NodeId) -> NodeId {
        arena.alloc(Node::Expression(ExpressionData {
            code: AstCode::Goto,
            operand: Some(target),
            ..Default::default()
        }))
    }

    fn expr(arena: &mut Arena, code: AstCode) -> NodeId {
        arena.alloc(Node::Expression(ExpressionData {
            code,
            ..Default::default()
        }))
    }

    #[test]
    fn natural_fallthrough_becomes_nop() {
        let mut arena = Arena::new();
        let target = expr(&mut arena, AstCode::Nop);
        let g = goto_to(&mut arena, target);
        let root = arena.alloc(Node::Block(BlockData {
            body: vec![g, target],
            entry_goto: None,
        }));
        let topo = Topology::build(&arena, root).unwrap();

        assert!(try_simplify_goto(&mut arena, &topo, g).unwrap());
        let ge = arena.get(g).as_expression().unwrap();
        assert_eq!(ge.code, AstCode::Nop);
        assert!(ge.operand.is_none());
    }

    #[test]
    fn goto_to_loop_header_becomes_continue() {
        let mut arena = Arena::new();
        let cond = expr(&mut arena, AstCode::Nop);
        let g = goto_to(&mut arena, cond);
        let body = arena.alloc(Node::Block(BlockData {
            body: vec![g],
            entry_goto: None,
        }));
        let lp = arena.alloc(Node::Loop(LoopData {
            condition: Some(cond),
            body,
        }));
        let root = arena.alloc(Node::Block(BlockData {
            body: vec![lp],
            entry_goto: None,
        }));
        let topo = Topology::build(&arena, root).unwrap();

        assert!(try_simplify_goto(&mut arena, &topo, g).unwrap());
        let ge = arena.get(g).as_expression().unwrap();
        assert_eq!(ge.code, AstCode::LoopContinue);
        // Single enclosing loop: no label needed.
        assert!(ge.operand.is_none());
    }

    #[test]
    fn goto_past_loop_becomes_break() {
        let mut arena = Arena::new();
        let after = expr(&mut arena, AstCode::Return);
        let g = goto_to(&mut arena, after);
        let body = arena.alloc(Node::Block(BlockData {
            body: vec![g],
            entry_goto: None,
        }));
        let lp = arena.alloc(Node::Loop(LoopData {
            condition: None,
            body,
        }));
        let root = arena.alloc(Node::Block(BlockData {
            body: vec![lp, after],
            entry_goto: None,
        }));
        let topo = Topology::build(&arena, root).unwrap();

        assert!(try_simplify_goto(&mut arena, &topo, g).unwrap());
        let ge = arena.get(g).as_expression().unwrap();
        assert_eq!(ge.code, AstCode::LoopOrSwitchBreak);
        assert!(ge.operand.is_none());
    }

    #[test]
    fn goto_into_middle_of_try_stays_a_goto() {
        use decompiler_ast::TryCatchBlockData;

        let mut arena = Arena::new();
        let before = expr(&mut arena, AstCode::Nop);
        let label = arena.alloc(Node::Label(decompiler_ast::LabelData));
        let after_label = expr(&mut arena, AstCode::Nop);
        let try_block = arena.alloc(Node::Block(BlockData {
            body: vec![before, label, after_label],
            entry_goto: None,
        }));
        let _tcb = arena.alloc(Node::TryCatchBlock(TryCatchBlockData {
            try_block,
            catches: vec![],
            finally_block: None,
        }));
        let g = goto_to(&mut arena, label);
        let root = arena.alloc(Node::Block(BlockData {
            body: vec![g, _tcb],
            entry_goto: None,
        }));
        let topo = Topology::build(&arena, root).unwrap();

        assert!(!try_simplify_goto(&mut arena, &topo, g).unwrap());
        let ge = arena.get(g).as_expression().unwrap();
        assert_eq!(ge.code, AstCode::Goto);
    }

    #[test]
    fn goto_to_stored_return_value_inlines_a_clone() {
        let mut arena = Arena::new();
        // var is just an identity token two Store/Load operands share.
        let var = arena.alloc(Node::Label(decompiler_ast::LabelData));
        let loaded_by_store = expr(&mut arena, AstCode::Eval(1));
        let store = arena.alloc(Node::Expression(ExpressionData {
            code: AstCode::Store,
            operand: Some(var),
            arguments: vec![loaded_by_store],
            ..Default::default()
        }));
        let load = arena.alloc(Node::Expression(ExpressionData {
            code: AstCode::Load,
            operand: Some(var),
            ..Default::default()
        }));
        let ret = arena.alloc(Node::Expression(ExpressionData {
            code: AstCode::Return,
            arguments: vec![load],
            ..Default::default()
        }));
        let g = goto_to(&mut arena, store);
        let root = arena.alloc(Node::Block(BlockData {
            body: vec![g, store, ret],
            entry_goto: None,
        }));
        let topo = Topology::build(&arena, root).unwrap();

        assert!(try_simplify_goto(&mut arena, &topo, g).unwrap());
        let ge = arena.get(g).as_expression().unwrap();
        assert_eq!(ge.code, AstCode::Return);
        assert_eq!(ge.arguments.len(), 1);
        // The inlined argument is a clone, not the original Eval node.
        assert_ne!(ge.arguments[0], loaded_by_store);
        // The store/return statements are untouched; only the goto changed.
        assert_eq!(arena.get(store).as_expression().unwrap().code, AstCode::Store);
        assert_eq!(arena.get(ret).as_expression().unwrap().code, AstCode::Return);
    }

    #[test]
    fn sweep_runs_to_fixed_point() {
        let mut arena = Arena::new();
        let target = expr(&mut arena, AstCode::Nop);
        let g1 = goto_to(&mut arena, target);
        let root = arena.alloc(Node::Block(BlockData {
            body: vec![g1, target],
            entry_goto: None,
        }));
        let topo = Topology::build(&arena, root).unwrap();
        sweep(&mut arena, &topo, root).unwrap();
        assert_eq!(arena.get(g1).as_expression().unwrap().code, AstCode::Nop);
    }
}
