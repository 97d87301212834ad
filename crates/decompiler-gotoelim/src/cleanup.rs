//! Dead-code cleanup that runs after the goto sweep: dead labels, nops and
//! leaves, redundant trailing loop `continue`, redundant switch breaks and
//! no-op default cases, a final empty `return`, and statements unreachable
//! after unconditional control flow. Operates directly on the arena; it
//! does not need the topology index since every decision here only looks
//! at a node's immediate structural children.

use std::collections::HashSet;

use decompiler_ast::{Arena, AstCode, Node, NodeId};

/// Runs the full ordered cleanup over the tree rooted at `root`. Returns
/// whether step 6 (unreachable statements) deleted anything — the driver
/// re-invokes the whole pass when this is `true`, since the deletions may
/// expose further simplifications.
pub fn remove_redundant_code(arena: &mut Arena, root: NodeId) -> bool {
    let live = collect_live_labels_and_rewrite_finally_leaves(arena, root);
    prune(arena, root, &live);
    drop_redundant_loop_continue(arena, root);
    switch_cleanup(arena, root);
    drop_trailing_empty_return(arena, root);
    remove_unreachable_statements(arena, root)
}

fn all_ids(arena: &Arena, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        out.push(id);
        stack.extend(arena.children(id));
    }
    out
}

/// Labels that are the effective entry point of a `finally` block, or of
/// the sole catch body when a try has no finally — a goto landing there is
/// redundant with the implicit handler dispatch and gets rewritten to
/// `Leave` rather than counted live.
fn finally_like_entry_labels(arena: &Arena, root: NodeId) -> HashSet<NodeId> {
    let mut out = HashSet::new();
    for id in all_ids(arena, root) {
        let Node::TryCatchBlock(t) = arena.get(id) else {
            continue;
        };
        let entry_block = if let Some(finally) = t.finally_block {
            Some(finally)
        } else if t.catches.len() == 1 {
            match arena.get(t.catches[0]) {
                Node::CatchBlock(c) => Some(c.body),
                _ => None,
            }
        } else {
            None
        };
        if let Some(first) = entry_block.and_then(|b| arena.get(b).as_block()?.body.first().copied())
        {
            out.insert(first);
        }
    }
    out
}

fn collect_live_labels_and_rewrite_finally_leaves(arena: &mut Arena, root: NodeId) -> HashSet<NodeId> {
    let finally_like = finally_like_entry_labels(arena, root);
    let mut live = HashSet::new();

    for id in all_ids(arena, root) {
        let Some((code, operand)) = (match arena.get(id) {
            Node::Expression(e) => Some((e.code, e.operand)),
            _ => None,
        }) else {
            continue;
        };

        if code == AstCode::Goto {
            if let Some(target) = operand {
                if finally_like.contains(&target) {
                    let ge = arena.get_mut(id).as_expression_mut().expect("id is an Expression");
                    ge.code = AstCode::Leave;
                    ge.operand = None;
                    continue;
                }
            }
        }

        if code.is_branch() {
            live.extend(operand);
        }
    }
    live
}

fn prune(arena: &mut Arena, root: NodeId, live: &HashSet<NodeId>) {
    let block_ids: Vec<NodeId> = all_ids(arena, root)
        .into_iter()
        .filter(|&id| matches!(arena.get(id), Node::Block(_)))
        .collect();

    for id in block_ids {
        let body = arena.get(id).as_block().expect("filtered to Block above").body.clone();
        let keep: Vec<NodeId> = body
            .into_iter()
            .filter(|&stmt| match arena.get(stmt) {
                Node::Expression(e) if e.code == AstCode::Nop || e.code == AstCode::Leave => false,
                Node::Label(_) => live.contains(&stmt),
                _ => true,
            })
            .collect();
        arena.get_mut(id).as_block_mut().expect("id is a Block").body = keep;
    }
}

fn drop_redundant_loop_continue(arena: &mut Arena, root: NodeId) {
    let loop_ids: Vec<NodeId> = all_ids(arena, root)
        .into_iter()
        .filter(|&id| matches!(arena.get(id), Node::Loop(_)))
        .collect();

    for id in loop_ids {
        let Some(body_id) = arena.get(id).as_loop().map(|l| l.body) else {
            continue;
        };
        let last = arena
            .get(body_id)
            .as_block()
            .and_then(|b| b.body.last().copied());
        let Some(last) = last else { continue };
        if matches!(arena.get(last), Node::Expression(e) if e.code == AstCode::LoopContinue) {
            arena.get_mut(body_id).as_block_mut().expect("loop body is a Block").body.pop();
        }
    }
}

fn is_lone_unlabeled_break(arena: &Arena, case: NodeId) -> bool {
    let Node::CaseBlock(c) = arena.get(case) else {
        return false;
    };
    let Some(block) = arena.get(c.body).as_block() else {
        return false;
    };
    match block.body.as_slice() {
        [only] => {
            matches!(arena.get(*only), Node::Expression(e) if e.code == AstCode::LoopOrSwitchBreak && e.operand.is_none())
        }
        _ => false,
    }
}

fn switch_cleanup(arena: &mut Arena, root: NodeId) {
    let switch_ids: Vec<NodeId> = all_ids(arena, root)
        .into_iter()
        .filter(|&id| matches!(arena.get(id), Node::Switch(_)))
        .collect();

    for sw in switch_ids {
        let cases = arena.get(sw).as_switch().expect("filtered to Switch above").cases.clone();

        for &case in &cases {
            let Node::CaseBlock(c) = arena.get(case) else { continue };
            let body_id = c.body;
            let stmts = arena
                .get(body_id)
                .as_block()
                .map(|b| b.body.clone())
                .unwrap_or_default();
            if stmts.len() < 2 {
                continue;
            }
            let last = stmts[stmts.len() - 1];
            let second_last = stmts[stmts.len() - 2];
            let last_is_break =
                matches!(arena.get(last), Node::Expression(e) if e.code == AstCode::LoopOrSwitchBreak);
            let second_last_is_unconditional = arena.get(second_last).is_unconditional_control_flow();
            if last_is_break && second_last_is_unconditional {
                arena.get_mut(body_id).as_block_mut().expect("case body is a Block").body.pop();
            }
        }

        let default_case = cases.iter().copied().find(|&c| match arena.get(c) {
            Node::CaseBlock(cb) => cb.values.is_empty(),
            _ => false,
        });
        let default_is_lone_break = match default_case {
            Some(d) => is_lone_unlabeled_break(arena, d),
            None => true,
        };

        if default_case.is_none() || default_is_lone_break {
            let keep: Vec<NodeId> = cases
                .iter()
                .copied()
                .filter(|&c| !is_lone_unlabeled_break(arena, c))
                .collect();
            if let Node::Switch(s) = arena.get_mut(sw) {
                s.cases = keep;
            }
        }
    }
}

fn drop_trailing_empty_return(arena: &mut Arena, root: NodeId) {
    let Some(last) = arena.get(root).as_block().and_then(|b| b.body.last().copied()) else {
        return;
    };
    let is_empty_return =
        matches!(arena.get(last), Node::Expression(e) if e.code == AstCode::Return && e.arguments.is_empty());
    if is_empty_return {
        arena.get_mut(root).as_block_mut().expect("root is a Block").body.pop();
    }
}

fn remove_unreachable_statements(arena: &mut Arena, root: NodeId) -> bool {
    let block_ids: Vec<NodeId> = all_ids(arena, root)
        .into_iter()
        .filter(|&id| matches!(arena.get(id), Node::Block(_)))
        .collect();

    let mut any_deleted = false;
    for id in block_ids {
        let body = arena.get(id).as_block().expect("filtered to Block above").body.clone();
        let mut kept: Vec<NodeId> = Vec::with_capacity(body.len());
        let mut deleted_here = false;

        for stmt in body {
            if let Some(&prev) = kept.last() {
                let prev_unconditional = arena.get(prev).is_unconditional_control_flow();
                let stmt_is_return_or_throw =
                    matches!(arena.get(stmt), Node::Expression(e) if e.code == AstCode::Return || e.code == AstCode::AThrow);
                if prev_unconditional && stmt_is_return_or_throw {
                    deleted_here = true;
                    continue;
                }
            }
            kept.push(stmt);
        }

        if deleted_here {
            arena.get_mut(id).as_block_mut().expect("id is a Block").body = kept;
            any_deleted = true;
        }
    }
    any_deleted
}
