//! Redundant index-rebuild elimination.
//!
//! A sparse node's active-element index list must be rebuilt (clear, then
//! generate) before it is iterated, but the rebuild is wasted work when
//! nothing activated new elements since the last one. This pass scans the
//! pending queue in program order with a per-node dirty flag and drops
//! clear/generate pairs whose node is known clean.

use std::collections::{HashMap, VecDeque};

use snafu::ensure;
use tracing::debug;

use sango_ir::{NodeId, TaskKind};

use crate::engine::AsyncEngine;
use crate::error::{ListClearWithoutGenSnafu, Result};
use crate::task::Task;

impl AsyncEngine {
    /// Returns whether anything was eliminated. Idempotent: a second run
    /// on an already-optimized queue reports no change.
    ///
    /// The producer guarantees that every clear-list task is immediately
    /// followed by its matching generate task; a queue violating that is a
    /// producer programming error and fails fatally.
    pub fn optimize_listgen(&mut self) -> Result<bool> {
        let mut modified = false;
        // Dirty flag per node: "elements activated since the index list
        // was last rebuilt". Absent means unknown, so the rebuild is kept.
        let mut dirty: HashMap<NodeId, bool> = HashMap::new();

        let tasks = std::mem::take(&mut self.pending);
        let mut kept = VecDeque::with_capacity(tasks.len());
        let mut iter = tasks.into_iter().peekable();

        while let Some(task) = iter.next() {
            match task.kind() {
                // The generate half of a kept pair flows through here.
                TaskKind::ListGen { .. } => kept.push_back(task),
                TaskKind::ListClear { node } => {
                    let paired = matches!(
                        iter.peek().map(Task::kind),
                        Some(TaskKind::ListGen { node: generated }) if generated == node
                    );
                    ensure!(paired, ListClearWithoutGenSnafu { node });

                    if dirty.get(&node) == Some(&false) {
                        // Nothing activated since the last rebuild: drop
                        // the clear and its matching generate.
                        iter.next();
                        modified = true;
                        debug!(node = %node, "clear/generate pair eliminated");
                        continue;
                    }
                    dirty.insert(node, false);
                    kept.push_back(task);
                }
                TaskKind::Serial | TaskKind::Range { .. } | TaskKind::Domain { .. } | TaskKind::Gc { .. } => {
                    let meta = self.meta_for(&task);
                    for &activated in &meta.activations {
                        // Activating an element dirties the node and every
                        // ancestor list up to (excluding) the root.
                        for node in self.nodes.self_and_ancestors(activated) {
                            if self.nodes.is_root(node) {
                                break;
                            }
                            dirty.insert(node, true);
                        }
                    }
                    kept.push_back(task);
                }
            }
        }

        self.pending = kept;
        Ok(modified)
    }
}
