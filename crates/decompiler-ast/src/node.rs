use crate::NodeId;

/// A half-open byte or token range in the original bytecode, carried along
/// purely so rewrites can merge provenance; the pass never interprets it.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct SourceRange {
    pub start: u32,
    pub end: u32,
}

/// Opcode of an [`ExpressionData`](Node::Expression).
///
/// `Eval` is a catch-all for the evaluation opcodes (arithmetic, field
/// access, calls, ...) the pass never needs to distinguish; it carries an
/// opaque tag so tests and callers can still tell two eval nodes apart.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AstCode {
    Goto,
    Nop,
    Leave,
    Return,
    AThrow,
    Store,
    Load,
    LoopOrSwitchBreak,
    LoopContinue,
    Eval(u32),
}

impl AstCode {
    /// Whether this opcode carries a control-flow edge to a label operand.
    ///
    /// `Goto` always does; `LoopOrSwitchBreak`/`LoopContinue` do when they
    /// carry an (optional) label disambiguating which loop or switch they
    /// target — callers check the operand, not just the opcode, to get the
    /// actual target set.
    pub fn is_branch(self) -> bool {
        matches!(
            self,
            AstCode::Goto | AstCode::LoopOrSwitchBreak | AstCode::LoopContinue
        )
    }

    /// Whether an expression with this opcode unconditionally leaves its
    /// containing block — nothing after it in the same block can run.
    pub fn is_unconditional_control_flow(self) -> bool {
        matches!(
            self,
            AstCode::Return
                | AstCode::AThrow
                | AstCode::Goto
                | AstCode::LoopContinue
                | AstCode::LoopOrSwitchBreak
                | AstCode::Leave
        )
    }
}

/// A sequence of statements, optionally preceded by an *entry-goto* — an
/// expression executed before the body, modeling the case where control
/// falls into the middle of what is otherwise a structured block.
#[derive(Clone, Debug, Default)]
pub struct BlockData {
    pub body: Vec<NodeId>,
    pub entry_goto: Option<NodeId>,
}

/// An evaluation, branch, or control-flow opcode with its operand, its
/// arguments (for the rewrites in the classifier that inline a single
/// returned value), and the source ranges it was merged from.
#[derive(Clone, Debug, Default)]
pub struct ExpressionData {
    pub code: AstCode,
    pub operand: Option<NodeId>,
    pub arguments: Vec<NodeId>,
    pub ranges: Vec<SourceRange>,
}

impl Default for AstCode {
    fn default() -> Self {
        AstCode::Nop
    }
}

/// A control-flow target. Carries no body of its own; `Label`'s only
/// purpose is to be pointed at by gotos and branch operands and to be found
/// by the topology index's `label_before` / `node_after_label` maps.
#[derive(Clone, Debug, Default)]
pub struct LabelData;

#[derive(Clone, Debug)]
pub struct ConditionData {
    pub condition: NodeId,
    pub then_block: NodeId,
    pub else_block: Option<NodeId>,
}

#[derive(Clone, Debug)]
pub struct LoopData {
    pub condition: Option<NodeId>,
    pub body: NodeId,
}

#[derive(Clone, Debug)]
pub struct SwitchData {
    pub condition: NodeId,
    pub cases: Vec<NodeId>,
}

/// One arm of a [`SwitchData`]. An empty `values` list marks the default
/// case. `body` is a `Block`, but by construction its `entry_goto` is always
/// `None` — a case can only be entered at its first statement.
#[derive(Clone, Debug)]
pub struct CaseBlockData {
    pub values: Vec<i64>,
    pub body: NodeId,
}

#[derive(Clone, Debug)]
pub struct TryCatchBlockData {
    pub try_block: NodeId,
    pub catches: Vec<NodeId>,
    pub finally_block: Option<NodeId>,
}

#[derive(Clone, Debug)]
pub struct CatchBlockData {
    pub body: NodeId,
}

/// A single AST node. Lives in an [`Arena`](crate::Arena) and is addressed
/// by [`NodeId`]; never constructed standalone.
#[derive(Clone, Debug)]
pub enum Node {
    Block(BlockData),
    Expression(ExpressionData),
    Label(LabelData),
    Condition(ConditionData),
    Loop(LoopData),
    Switch(SwitchData),
    CaseBlock(CaseBlockData),
    TryCatchBlock(TryCatchBlockData),
    CatchBlock(CatchBlockData),
}

impl Node {
    /// Name of the variant, for error messages and logging.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Block(_) => "Block",
            Node::Expression(_) => "Expression",
            Node::Label(_) => "Label",
            Node::Condition(_) => "Condition",
            Node::Loop(_) => "Loop",
            Node::Switch(_) => "Switch",
            Node::CaseBlock(_) => "CaseBlock",
            Node::TryCatchBlock(_) => "TryCatchBlock",
            Node::CatchBlock(_) => "CatchBlock",
        }
    }

    /// Structural children, in order, as enumerated for topology indexing.
    ///
    /// This is the single source of truth for "what is a child of what";
    /// the topology index is built entirely by walking this.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Node::Block(b) => {
                let mut out = Vec::with_capacity(b.body.len() + 1);
                out.extend(b.entry_goto);
                out.extend(b.body.iter().copied());
                out
            }
            Node::Expression(e) => e.arguments.clone(),
            Node::Label(_) => Vec::new(),
            Node::Condition(c) => {
                let mut out = vec![c.condition, c.then_block];
                out.extend(c.else_block);
                out
            }
            Node::Loop(l) => {
                let mut out = Vec::new();
                out.extend(l.condition);
                out.push(l.body);
                out
            }
            Node::Switch(s) => {
                let mut out = vec![s.condition];
                out.extend(s.cases.iter().copied());
                out
            }
            Node::CaseBlock(c) => vec![c.body],
            Node::TryCatchBlock(t) => {
                let mut out = vec![t.try_block];
                out.extend(t.catches.iter().copied());
                out.extend(t.finally_block);
                out
            }
            Node::CatchBlock(c) => vec![c.body],
        }
    }

    pub fn as_block(&self) -> Option<&BlockData> {
        match self {
            Node::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_block_mut(&mut self) -> Option<&mut BlockData> {
        match self {
            Node::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_expression(&self) -> Option<&ExpressionData> {
        match self {
            Node::Expression(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_expression_mut(&mut self) -> Option<&mut ExpressionData> {
        match self {
            Node::Expression(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_try_catch(&self) -> Option<&TryCatchBlockData> {
        match self {
            Node::TryCatchBlock(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_switch(&self) -> Option<&SwitchData> {
        match self {
            Node::Switch(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_loop(&self) -> Option<&LoopData> {
        match self {
            Node::Loop(l) => Some(l),
            _ => None,
        }
    }

    /// Is this expression a branch? (See [`AstCode::is_branch`].)
    pub fn is_branch(&self) -> bool {
        self.as_expression().is_some_and(|e| e.code.is_branch())
    }

    /// Is this expression unconditional control flow? (See
    /// [`AstCode::is_unconditional_control_flow`].)
    pub fn is_unconditional_control_flow(&self) -> bool {
        self.as_expression()
            .is_some_and(|e| e.code.is_unconditional_control_flow())
    }

    /// Labels this node branches to, if it is a branch expression with an
    /// operand. `Goto`'s operand is always its sole target; labeled
    /// `break`/`continue` report their operand the same way.
    pub fn branch_targets(&self) -> Vec<NodeId> {
        match self.as_expression() {
            Some(e) if e.code.is_branch() => e.operand.into_iter().collect(),
            _ => Vec::new(),
        }
    }
}
