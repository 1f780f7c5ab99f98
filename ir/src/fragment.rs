//! Arena-backed task fragments.
//!
//! A fragment is the tree of statements for one offloaded task: an
//! `Offload` root plus an ordered body. Statements live in an arena and
//! refer to each other by arena index, so cloning a fragment is a plain
//! `Vec` copy and merging two fragments is an index remap.
//!
//! The parent back-reference is expressed as an optional anchor id rather
//! than a pointer: a cloned fragment points at a per-kernel sentinel anchor
//! owned by the engine, which satisfies the "non-null parent" invariant
//! without any dangling reference. Anchors are never populated with
//! children and never executed.

use std::collections::HashMap;

use snafu::ensure;

use crate::error::{MissingOffloadRootSnafu, Result};
use crate::node::NodeId;
use crate::stmt::{BinOp, Stmt, StmtId, TaskKind};

/// Identifier of a per-kernel anchor sentinel owned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorId(pub u64);

/// Structural parent of a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    /// Freshly built, not yet handed to an engine.
    Detached,
    /// Points at the designated per-kernel sentinel.
    Anchor(AnchorId),
}

/// One finalized unit of execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub(crate) stmts: Vec<Stmt>,
    pub(crate) root: StmtId,
    pub(crate) body: Vec<StmtId>,
    pub(crate) parent: Parent,
}

impl Fragment {
    /// Task kind of the offload root. Fails when the root slot does not
    /// hold an offload statement, which means the fragment was corrupted
    /// before it reached the engine.
    pub fn task_kind(&self) -> Result<TaskKind> {
        match self.stmts.get(self.root.0 as usize) {
            Some(Stmt::Offload { kind }) => Ok(*kind),
            _ => MissingOffloadRootSnafu { root: self.root }.fail(),
        }
    }

    pub fn root(&self) -> StmtId {
        self.root
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.0 as usize]
    }

    pub fn body(&self) -> &[StmtId] {
        &self.body
    }

    pub fn body_is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn parent(&self) -> Parent {
        self.parent
    }

    pub fn set_anchor(&mut self, anchor: AnchorId) {
        self.parent = Parent::Anchor(anchor);
    }

    /// Iterate body statements in program order.
    pub fn walk(&self) -> impl Iterator<Item = (StmtId, &Stmt)> {
        self.body.iter().map(|&id| (id, self.stmt(id)))
    }

    /// Merge `other`'s body into `self`.
    ///
    /// Appends `other`'s body statements to `self`'s body in order, empties
    /// `other`'s body, rewrites every reference to `other`'s root to refer
    /// to `self`'s root, and renumbers the combined arena into canonical
    /// order. `other`'s offload header is not carried over.
    pub fn absorb(&mut self, other: &mut Fragment) {
        let offset = self.stmts.len() as u32;
        let other_root = other.root;
        let other_kind = match other.stmts.get(other_root.0 as usize) {
            Some(Stmt::Offload { kind }) => *kind,
            _ => TaskKind::Serial,
        };

        for mut stmt in other.stmts.drain(..) {
            for op in stmt.operands_mut() {
                *op = if *op == other_root { self.root } else { StmtId(op.0 + offset) };
            }
            self.stmts.push(stmt);
        }
        self.body.extend(other.body.drain(..).map(|id| StmtId(id.0 + offset)));

        // `other` keeps a valid empty-bodied shape so the caller can still
        // classify it during the cleanup pass.
        other.stmts.push(Stmt::Offload { kind: other_kind });
        other.root = StmtId(0);

        self.renumber();
    }

    /// Compact the arena into canonical order: root first, then body
    /// statements in program order. Statements reachable from neither are
    /// dropped (e.g. the absorbed offload header of a merged fragment).
    pub fn renumber(&mut self) {
        let mut remap: HashMap<StmtId, StmtId> = HashMap::with_capacity(self.body.len() + 1);
        let mut stmts = Vec::with_capacity(self.body.len() + 1);

        remap.insert(self.root, StmtId(0));
        stmts.push(self.stmts[self.root.0 as usize].clone());
        for &id in &self.body {
            remap.insert(id, StmtId(stmts.len() as u32));
            stmts.push(self.stmts[id.0 as usize].clone());
        }

        for stmt in &mut stmts {
            for op in stmt.operands_mut() {
                debug_assert!(remap.contains_key(op), "operand {op} escapes the fragment body");
                if let Some(&new) = remap.get(op) {
                    *op = new;
                }
            }
        }

        self.stmts = stmts;
        self.root = StmtId(0);
        self.body = (1..self.stmts.len() as u32).map(StmtId).collect();
    }

    /// Validate that every operand reference lands inside the arena.
    pub fn validate(&self) -> Result<()> {
        let len = self.stmts.len();
        ensure!(
            matches!(self.stmts.get(self.root.0 as usize), Some(Stmt::Offload { .. })),
            MissingOffloadRootSnafu { root: self.root }
        );
        for (_, stmt) in self.walk() {
            for op in stmt.operands() {
                ensure!((op.0 as usize) < len, crate::error::DanglingStmtSnafu { stmt: op, len });
            }
        }
        Ok(())
    }
}

/// Builder used by the front end to assemble one fragment.
///
/// Every emitted statement is appended to the body in program order, so the
/// body doubles as a flat SSA-ish statement list: operands always precede
/// their uses.
#[derive(Debug)]
pub struct FragmentBuilder {
    stmts: Vec<Stmt>,
    body: Vec<StmtId>,
}

impl FragmentBuilder {
    pub fn new(kind: TaskKind) -> Self {
        Self { stmts: vec![Stmt::Offload { kind }], body: Vec::new() }
    }

    fn push(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(stmt);
        self.body.push(id);
        id
    }

    pub fn global_ptr(&mut self, node: NodeId, activate: bool) -> StmtId {
        self.push(Stmt::GlobalPtr { node, activate })
    }

    pub fn load(&mut self, ptr: StmtId) -> StmtId {
        self.push(Stmt::Load { ptr })
    }

    pub fn store(&mut self, ptr: StmtId, value: StmtId) -> StmtId {
        self.push(Stmt::Store { ptr, value })
    }

    pub fn atomic_add(&mut self, ptr: StmtId, value: StmtId) -> StmtId {
        self.push(Stmt::AtomicAdd { ptr, value })
    }

    pub fn constant(&mut self, value: i64) -> StmtId {
        self.push(Stmt::Const { value })
    }

    pub fn binary(&mut self, op: BinOp, lhs: StmtId, rhs: StmtId) -> StmtId {
        self.push(Stmt::Binary { op, lhs, rhs })
    }

    pub fn loop_index(&mut self, dim: u32) -> StmtId {
        let owner = StmtId(0);
        self.push(Stmt::LoopIndex { owner, dim })
    }

    pub fn build(self) -> Fragment {
        Fragment { stmts: self.stmts, root: StmtId(0), body: self.body, parent: Parent::Detached }
    }
}
