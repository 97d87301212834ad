#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Goto-elimination pass for a structured-control-flow decompiler AST.
//!
//! [`remove_gotos`] rewrites every residual `goto` in a method body into
//! the strongest structured equivalent it is provably equal to — a
//! fall-through `nop`, a `break`, a `continue`, an inlined `return`/`throw`,
//! or a `leave` out of a handler — and leaves it as a genuine `goto` when
//! no equivalent exists. It then removes the dead code that rewrite
//! exposes (unreferenced labels, redundant trailing jumps, no-op switch
//! cases, unreachable statements), re-running itself when that cleanup
//! uncovers further simplifications.
//!
//! The pass never constructs new statements: every rewrite is a mutation
//! of an existing node or the removal of one from its parent's child list.

mod ancestors;
mod classify;
mod cleanup;
mod error;
mod flow;
mod leave;
mod topology;

pub use ancestors::Ancestors;
pub use error::{GotoElimError, Result};
pub use flow::{enter, exit, Visited};
pub use topology::Topology;

use decompiler_ast::{Arena, NodeId};

/// Bounds the cleanup/re-invocation fixed point. The inner goto sweep
/// already terminates by strictly shrinking the number of `Goto`
/// expressions each time it changes anything; this additionally caps the
/// outer re-invocation loop (triggered only by unreachable-code removal)
/// so a future change to the cleanup rules can't make the pass loop
/// forever — it logs a warning and returns instead.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_reinvocations: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_reinvocations: 16,
        }
    }
}

/// Eliminates residual gotos in the method body rooted at `root`, mutating
/// `arena` in place.
pub fn remove_gotos(arena: &mut Arena, root: NodeId) -> Result<()> {
    remove_gotos_with_limits(arena, root, Limits::default())
}

/// Same as [`remove_gotos`], with an explicit re-invocation cap.
pub fn remove_gotos_with_limits(arena: &mut Arena, root: NodeId, limits: Limits) -> Result<()> {
    for attempt in 0..limits.max_reinvocations {
        let topo = Topology::build(arena, root)?;
        leave::normalize_handler_exits(arena, &topo, root)?;
        classify::sweep(arena, &topo, root)?;

        let deleted_unreachable = cleanup::remove_redundant_code(arena, root);
        log::debug!(
            target: "gotoelim",
            "pass {attempt}: cleanup removed unreachable code = {deleted_unreachable}"
        );
        if !deleted_unreachable {
            return Ok(());
        }
        log::trace!(target: "gotoelim", "re-invoking after cleanup (attempt {attempt})");
    }

    log::warn!(
        target: "gotoelim",
        "goto elimination did not converge within {} re-invocations",
        limits.max_reinvocations
    );
    Ok(())
}
