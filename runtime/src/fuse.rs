//! Horizontal task fusion.
//!
//! Adjacent pending tasks iterating the same index space are merged into
//! one task, halving launch overhead and exposing the combined body to
//! constant folding and dead-code elimination. Fusion only ever merges a
//! task into its immediate predecessor, so program order is preserved.

use std::collections::VecDeque;

use tracing::debug;

use sango_ir::{Bound, TaskKind, simplify};

use crate::engine::AsyncEngine;
use crate::task::Task;

/// Whether two adjacent tasks iterate the same index space.
fn same_index_space(a: &Task, b: &Task) -> bool {
    match (a.kind(), b.kind()) {
        (
            TaskKind::Domain { node: na, block_dim: ba },
            TaskKind::Domain { node: nb, block_dim: bb },
        ) => na == nb && ba == bb,
        (TaskKind::Range { begin: ab, end: ae }, TaskKind::Range { begin: bb, end: be }) => {
            // Only statically known, exactly equal bounds fuse. A dynamic
            // bound may differ at runtime even when the expressions match.
            const_eq(ab, bb) && const_eq(ae, be)
        }
        // Serial tasks are excluded: their bodies may carry host-side
        // accessor effects whose interleaving with device launches is
        // observable.
        _ => false,
    }
}

fn const_eq(a: Bound, b: Bound) -> bool {
    matches!((a, b), (Bound::Const(x), Bound::Const(y)) if x == y)
}

/// Whether the tasks' kernels allow sharing one argument context.
fn compatible_kernels(a: &Task, b: &Task) -> bool {
    a.kernel().id() == b.kernel().id()
        || (a.kernel().is_bindings_free() && b.kernel().is_bindings_free())
}

impl AsyncEngine {
    /// One fusion sweep over the pending queue. Returns whether anything
    /// was merged; callers iterate to a fixpoint. Each sweep strictly
    /// shrinks the total pending statement count on a merge, so the
    /// fixpoint terminates.
    pub fn fuse(&mut self) -> bool {
        let mut modified = false;
        let mut tasks: Vec<Task> = std::mem::take(&mut self.pending).into();

        for i in 0..tasks.len().saturating_sub(1) {
            let (left, right) = tasks.split_at_mut(i + 1);
            let a = &mut left[i];
            let b = &mut right[0];
            if a.fragment.body_is_empty() && b.fragment.body_is_empty() {
                continue;
            }
            if !(same_index_space(a, b) && compatible_kernels(a, b)) {
                continue;
            }

            debug!(
                into = %a.fingerprint(),
                from = %b.fingerprint(),
                kind = a.kind().name(),
                "fusing adjacent tasks"
            );
            a.fragment.absorb(&mut b.fragment);
            simplify(&mut a.fragment);
            // absorb keeps both execution-unit roots well formed, so the
            // refresh cannot observe a missing root.
            if a.refresh_fingerprint().is_err() || b.refresh_fingerprint().is_err() {
                continue;
            }
            modified = true;
        }

        // Drop compute tasks with empty bodies, whether fusion emptied them
        // or they arrived empty. Index-list and GC tasks act through their
        // kind, not their body, and are always kept.
        tasks.retain(|task| match task.kind() {
            TaskKind::Serial | TaskKind::Range { .. } | TaskKind::Domain { .. } => {
                !task.fragment().body_is_empty()
            }
            TaskKind::ListGen { .. } | TaskKind::ListClear { .. } | TaskKind::Gc { .. } => true,
        });

        self.pending = VecDeque::from(tasks);
        modified
    }
}
