//! The asynchronous compile-and-dispatch engine.
//!
//! `AsyncEngine` decouples "a task becomes eligible to run" from "that
//! task is compiled and executed": kernel invocations are expanded into
//! tasks and parked in a pending queue, the static optimization passes
//! (list-regeneration elimination, horizontal fusion) rewrite the queue,
//! and only then is it drained into the [`ExecutionQueue`]. All rewriting
//! completes strictly before any task enters the pipeline.
//!
//! Every cache the engine consults (compiled artifacts, in-flight
//! compiles, per-fingerprint metadata, per-kernel anchors) is instance
//! state torn down with the engine, not ambient process state.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tracing::debug;

use sango_ir::{AnchorId, Fingerprint, NodeTree};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::kernel::{Context, Kernel, KernelId};
use crate::queue::ExecutionQueue;
use crate::stats::Statistics;
use crate::task::{Task, TaskMeta, extract_meta};

pub struct AsyncEngine {
    queue: ExecutionQueue,
    pub(crate) pending: VecDeque<Task>,
    pub(crate) metas: HashMap<Fingerprint, Arc<TaskMeta>>,
    pub(crate) nodes: Arc<NodeTree>,
    /// One persistent placeholder parent per kernel. Never populated with
    /// children, never executed; exists so a freshly cloned fragment
    /// satisfies the non-null-parent invariant.
    anchors: HashMap<KernelId, AnchorId>,
    next_anchor: u64,
}

impl AsyncEngine {
    pub fn new(nodes: Arc<NodeTree>, config: &EngineConfig) -> Result<Self> {
        Ok(Self {
            queue: ExecutionQueue::new(config)?,
            pending: VecDeque::new(),
            metas: HashMap::new(),
            nodes,
            anchors: HashMap::new(),
            next_anchor: 0,
        })
    }

    pub fn statistics(&self) -> &Statistics {
        self.queue.statistics()
    }

    /// Expand one kernel invocation into tasks and park them.
    pub fn launch(&mut self, kernel: &Arc<Kernel>, context: Context) -> Result<()> {
        let anchor = match self.anchors.entry(kernel.id()) {
            std::collections::hash_map::Entry::Occupied(e) => *e.get(),
            std::collections::hash_map::Entry::Vacant(e) => {
                let anchor = AnchorId(self.next_anchor);
                self.next_anchor += 1;
                *e.insert(anchor)
            }
        };

        for template in kernel.fragments() {
            let mut fragment = template.clone();
            fragment.set_anchor(anchor);
            let task = Task::new(context.clone(), Arc::clone(kernel), fragment)?;
            self.enqueue(task);
        }
        Ok(())
    }

    /// Park one task, deriving its metadata if this fingerprint has not
    /// been seen before.
    pub fn enqueue(&mut self, task: Task) {
        self.metas.entry(task.fingerprint()).or_insert_with(|| Arc::new(extract_meta(task.fragment())));
        self.pending.push_back(task);
    }

    pub(crate) fn meta_for(&mut self, task: &Task) -> Arc<TaskMeta> {
        Arc::clone(
            self.metas.entry(task.fingerprint()).or_insert_with(|| Arc::new(extract_meta(task.fragment()))),
        )
    }

    /// Optimize the pending queue, drain it into the pipeline in program
    /// order, and block until every launch has executed.
    pub fn synchronize(&mut self) -> Result<()> {
        self.optimize_listgen()?;
        while self.fuse() {}

        let drained = self.pending.len();
        while let Some(task) = self.pending.pop_front() {
            self.queue.enqueue(task);
        }
        debug!(tasks = drained, "pending queue drained into pipeline");
        self.queue.synchronize()
    }
}
