//! Statement forms and task kinds.
//!
//! `Stmt` is deliberately small: it covers exactly the shapes the dispatch
//! engine inspects (data-structure accesses, the arithmetic they feed, and
//! the offload header). Task kind is a closed tagged variant so that
//! decision points like fusion eligibility match exhaustively and a new
//! kind forces every call site to be revisited.

use std::fmt;

use smallvec::SmallVec;

use crate::node::NodeId;

/// Index of a statement inside a fragment arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StmtId(pub u32);

impl fmt::Display for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Min,
    Max,
}

impl BinOp {
    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    pub fn apply(self, lhs: i64, rhs: i64) -> i64 {
        match self {
            Self::Add => lhs.wrapping_add(rhs),
            Self::Sub => lhs.wrapping_sub(rhs),
            Self::Mul => lhs.wrapping_mul(rhs),
            Self::Min => lhs.min(rhs),
            Self::Max => lhs.max(rhs),
        }
    }
}

/// Loop bound of a range iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bound {
    /// Statically known value.
    Const(i64),
    /// Resolved at launch time from the invocation context.
    Dynamic,
}

/// Execution shape of an offloaded task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Plain sequential block. May contain accessor side effects.
    Serial,
    /// Iteration over a bounded integer interval.
    Range { begin: Bound, end: Bound },
    /// Iteration over the currently active elements of a sparse node.
    Domain { node: NodeId, block_dim: u32 },
    /// Rebuild the active-element index list of a node.
    ListGen { node: NodeId },
    /// Clear the active-element index list of a node.
    ListClear { node: NodeId },
    /// Reclaim deactivated storage under a node.
    Gc { node: NodeId },
}

impl TaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Serial => "serial",
            Self::Range { .. } => "range_for",
            Self::Domain { .. } => "struct_for",
            Self::ListGen { .. } => "listgen",
            Self::ListClear { .. } => "clear_list",
            Self::Gc { .. } => "gc",
        }
    }
}

/// One statement in a fragment body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// Fragment root: the offload header. Never appears in a body.
    Offload { kind: TaskKind },
    /// Address of an element in a sparse node; `activate` allocates
    /// storage for previously inactive elements on dereference.
    GlobalPtr { node: NodeId, activate: bool },
    Load { ptr: StmtId },
    Store { ptr: StmtId, value: StmtId },
    /// Atomic read-modify-write: both a read and a write of the target.
    AtomicAdd { ptr: StmtId, value: StmtId },
    Const { value: i64 },
    Binary { op: BinOp, lhs: StmtId, rhs: StmtId },
    /// Loop index of the enclosing offload (`owner` is the fragment root).
    LoopIndex { owner: StmtId, dim: u32 },
}

impl Stmt {
    /// Statement ids this statement refers to, including the owner link of
    /// a loop index.
    pub fn operands(&self) -> SmallVec<[StmtId; 2]> {
        match *self {
            Self::Offload { .. } | Self::GlobalPtr { .. } | Self::Const { .. } => SmallVec::new(),
            Self::Load { ptr } => SmallVec::from_slice(&[ptr]),
            Self::Store { ptr, value } | Self::AtomicAdd { ptr, value } => SmallVec::from_slice(&[ptr, value]),
            Self::Binary { lhs, rhs, .. } => SmallVec::from_slice(&[lhs, rhs]),
            Self::LoopIndex { owner, .. } => SmallVec::from_slice(&[owner]),
        }
    }

    /// Mutable references to the same ids, for remapping during merges and
    /// renumbering.
    pub fn operands_mut(&mut self) -> SmallVec<[&mut StmtId; 2]> {
        match self {
            Self::Offload { .. } | Self::GlobalPtr { .. } | Self::Const { .. } => SmallVec::new(),
            Self::Load { ptr } => SmallVec::from_iter([ptr]),
            Self::Store { ptr, value } | Self::AtomicAdd { ptr, value } => SmallVec::from_iter([ptr, value]),
            Self::Binary { lhs, rhs, .. } => SmallVec::from_iter([lhs, rhs]),
            Self::LoopIndex { owner, .. } => SmallVec::from_iter([owner]),
        }
    }

    /// Whether the statement is observable even when its result is unused.
    /// An activating pointer allocates storage, which is an effect.
    pub fn has_side_effect(&self) -> bool {
        match self {
            Self::Store { .. } | Self::AtomicAdd { .. } => true,
            Self::GlobalPtr { activate, .. } => *activate,
            Self::Offload { .. }
            | Self::Load { .. }
            | Self::Const { .. }
            | Self::Binary { .. }
            | Self::LoopIndex { .. } => false,
        }
    }
}
