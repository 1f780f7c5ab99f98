//! Launch statistics.
//!
//! Fire-and-forget counters recorded per launched task, classified by task
//! kind. Owned by the pipeline rather than ambient process state.

use std::collections::HashMap;

use parking_lot::Mutex;

use sango_ir::TaskKind;

#[derive(Debug, Default)]
pub struct Statistics {
    counters: Mutex<HashMap<&'static str, u64>>,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, key: &'static str) {
        *self.counters.lock().entry(key).or_insert(0) += 1;
    }

    pub fn get(&self, key: &str) -> u64 {
        self.counters.lock().get(key).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> HashMap<&'static str, u64> {
        self.counters.lock().clone()
    }
}

/// Record one launched task.
pub(crate) fn record_launch(stats: &Statistics, kind: &TaskKind) {
    stats.add("launched_kernels");
    match kind {
        TaskKind::ListGen { .. } => {
            stats.add("launched_kernels_list_op");
            stats.add("launched_kernels_list_gen");
        }
        TaskKind::ListClear { .. } => {
            stats.add("launched_kernels_list_op");
            stats.add("launched_kernels_list_clear");
        }
        TaskKind::Range { .. } => {
            stats.add("launched_kernels_compute");
            stats.add("launched_kernels_range_for");
        }
        TaskKind::Domain { .. } => {
            stats.add("launched_kernels_compute");
            stats.add("launched_kernels_struct_for");
        }
        TaskKind::Gc { .. } => {
            stats.add("launched_kernels_garbage_collect");
        }
        TaskKind::Serial => {}
    }
}
