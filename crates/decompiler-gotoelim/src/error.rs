use decompiler_ast::NodeId;

/// Structural failures the pass refuses to work around.
///
/// Both variants indicate the input tree violates an invariant the rest of
/// the pass assumes; there is no sensible rewrite to fall back to; the pass
/// aborts rather than guess.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GotoElimError {
    /// The same node appeared as a child under two different parents while
    /// building the topology index.
    #[error("node {node} is linked from multiple locations in the tree")]
    LinkedFromMultipleLocations { node: NodeId },

    /// `enter`/`exit` encountered a node kind they have no rule for.
    ///
    /// [`Node`](decompiler_ast::Node) is closed and every variant is handled
    /// in `flow`, so this is unreachable today; it is kept as a named
    /// failure mode rather than a `match` default so a future node kind
    /// added without a flow rule fails loudly instead of silently
    /// miscompiling.
    #[error("node {node} of kind {kind} has no flow-simulation rule")]
    UnsupportedNode { node: NodeId, kind: &'static str },
}

pub type Result<T> = std::result::Result<T, GotoElimError>;
