#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Arena-backed abstract syntax tree for a structured-control-flow decompiler.
//!
//! A method body is a tree of [`Node`]s owned by a single [`Arena`] and
//! addressed by [`NodeId`], a small `Copy` index rather than a shared,
//! mutable pointer. Two nodes are the same node iff their `NodeId`s compare
//! equal — structurally identical subtrees at different arena slots are
//! always distinct, which is what lets identity-keyed maps (parent,
//! next-sibling, ...) work with an ordinary `HashMap<NodeId, _>`.
//!
//! This crate only defines the tree shape and its node kinds. The pass that
//! walks it — topology indexing, flow simulation, goto classification — lives
//! in `decompiler-gotoelim`.

mod arena;
mod node;
mod node_id;

pub use arena::Arena;
pub use node::{
    AstCode, BlockData, CaseBlockData, CatchBlockData, ConditionData, ExpressionData, LabelData,
    LoopData, Node, SourceRange, SwitchData, TryCatchBlockData,
};
pub use node_id::NodeId;
