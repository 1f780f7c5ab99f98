//! Launch records and per-fingerprint metadata.

use std::collections::HashSet;
use std::sync::Arc;

use snafu::ResultExt;

use sango_ir::{Fingerprint, Fragment, NodeId, Stmt, TaskKind, fingerprint};

use crate::error::{ConstructionSnafu, Result};
use crate::kernel::{Context, Kernel};

/// Immutable launch record: one task queued for compile-and-dispatch.
///
/// The fingerprint is computed once at construction and stays stable
/// except across an explicit recomputation triggered by fusion.
#[derive(Debug)]
pub struct Task {
    pub(crate) context: Context,
    pub(crate) kernel: Arc<Kernel>,
    pub(crate) fragment: Fragment,
    pub(crate) fingerprint: Fingerprint,
    pub(crate) kind: TaskKind,
}

impl Task {
    pub fn new(context: Context, kernel: Arc<Kernel>, fragment: Fragment) -> Result<Self> {
        let kind = fragment.task_kind().context(ConstructionSnafu)?;
        let fingerprint = fingerprint(&fragment).context(ConstructionSnafu)?;
        Ok(Self { context, kernel, fragment, fingerprint, kind })
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn kernel(&self) -> &Arc<Kernel> {
        &self.kernel
    }

    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Recompute the fingerprint after an in-place rewrite of the fragment.
    /// The offload root is preserved by every rewrite the engine performs,
    /// so this only fails on a corrupted fragment.
    pub(crate) fn refresh_fingerprint(&mut self) -> Result<()> {
        self.kind = self.fragment.task_kind().context(ConstructionSnafu)?;
        self.fingerprint = fingerprint(&self.fragment).context(ConstructionSnafu)?;
        Ok(())
    }
}

/// Derived read/write/activation sets of a fragment over data-structure
/// nodes. Keyed by fingerprint and shared across structurally identical
/// tasks; computed once per distinct fingerprint.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TaskMeta {
    pub reads: HashSet<NodeId>,
    pub writes: HashSet<NodeId>,
    pub activations: HashSet<NodeId>,
}

/// Classify every data-structure access in a single walk of the fragment.
pub fn extract_meta(fragment: &Fragment) -> TaskMeta {
    let mut meta = TaskMeta::default();
    let node_of = |ptr: sango_ir::StmtId| match fragment.stmt(ptr) {
        Stmt::GlobalPtr { node, .. } => Some(*node),
        _ => None,
    };
    for (_, stmt) in fragment.walk() {
        match stmt {
            Stmt::GlobalPtr { node, activate } => {
                meta.reads.insert(*node);
                if *activate {
                    meta.activations.insert(*node);
                }
            }
            Stmt::Load { ptr } => {
                if let Some(node) = node_of(*ptr) {
                    meta.reads.insert(node);
                }
            }
            Stmt::Store { ptr, .. } => {
                if let Some(node) = node_of(*ptr) {
                    meta.writes.insert(node);
                }
            }
            Stmt::AtomicAdd { ptr, .. } => {
                if let Some(node) = node_of(*ptr) {
                    meta.reads.insert(node);
                    meta.writes.insert(node);
                }
            }
            Stmt::Offload { .. } | Stmt::Const { .. } | Stmt::Binary { .. } | Stmt::LoopIndex { .. } => {}
        }
    }
    meta
}
