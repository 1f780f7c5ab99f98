//! Shared fixtures: instrumented backends and small fragment builders.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use sango_ir::{Fragment, FragmentBuilder, NodeId, NodeKind, NodeTree, TaskKind};

use crate::backend::{CodeGen, CodeGenError, EntryPoint};
use crate::config::EngineConfig;
use crate::engine::AsyncEngine;
use crate::kernel::{Context, Kernel};
use crate::task::Task;

/// Backend that counts compiles and appends the kernel name to a shared
/// trace on every launch.
pub struct RecordingBackend {
    compiles: AtomicUsize,
    pub trace: Arc<Mutex<Vec<String>>>,
    /// Stall applied to the first compile only, so later compiles can
    /// overtake it in the pool.
    first_compile_delay: Option<Duration>,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { compiles: AtomicUsize::new(0), trace: Arc::default(), first_compile_delay: None })
    }

    pub fn with_slow_first_compile(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            compiles: AtomicUsize::new(0),
            trace: Arc::default(),
            first_compile_delay: Some(delay),
        })
    }

    pub fn compile_count(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }
}

impl CodeGen for RecordingBackend {
    fn compile(&self, kernel: &Kernel, _fragment: &Fragment) -> Result<EntryPoint, CodeGenError> {
        let ordinal = self.compiles.fetch_add(1, Ordering::SeqCst);
        if ordinal == 0 {
            if let Some(delay) = self.first_compile_delay {
                std::thread::sleep(delay);
            }
        }
        let trace = Arc::clone(&self.trace);
        let name = kernel.name().to_string();
        Ok(Arc::new(move |_: &Context| trace.lock().push(name.clone())))
    }
}

/// Backend that rejects every fragment.
pub struct FailingBackend;

impl CodeGen for FailingBackend {
    fn compile(&self, kernel: &Kernel, _fragment: &Fragment) -> Result<EntryPoint, CodeGenError> {
        Err(CodeGenError { reason: format!("no backend available for kernel {}", kernel.name()) })
    }
}

/// Root -> pointer -> dense, the smallest tree with a non-root ancestor.
pub fn two_level_tree() -> (Arc<NodeTree>, NodeId, NodeId) {
    let mut tree = NodeTree::new();
    let parent = tree.add_child(tree.root(), NodeKind::Pointer);
    let leaf = tree.add_child(parent, NodeKind::Dense);
    (Arc::new(tree), parent, leaf)
}

pub fn engine(tree: Arc<NodeTree>, backend: Arc<dyn CodeGen>) -> AsyncEngine {
    let config = EngineConfig::builder().backend(backend).build();
    AsyncEngine::new(tree, &config).unwrap()
}

/// `node[...] = value`, without activation.
pub fn store_fragment(kind: TaskKind, node: NodeId, value: i64) -> Fragment {
    let mut builder = FragmentBuilder::new(kind);
    let ptr = builder.global_ptr(node, false);
    let v = builder.constant(value);
    builder.store(ptr, v);
    builder.build()
}

/// `node[...] = value` through an activating pointer.
pub fn activating_fragment(kind: TaskKind, node: NodeId, value: i64) -> Fragment {
    let mut builder = FragmentBuilder::new(kind);
    let ptr = builder.global_ptr(node, true);
    let v = builder.constant(value);
    builder.store(ptr, v);
    builder.build()
}

/// Body-less fragment; used for list maintenance and GC tasks, which act
/// through their kind alone.
pub fn empty_fragment(kind: TaskKind) -> Fragment {
    FragmentBuilder::new(kind).build()
}

pub fn kernel_of(name: &str, fragments: Vec<Fragment>) -> Arc<Kernel> {
    Arc::new(Kernel::new(name, [], [], fragments))
}

pub fn task(kernel: &Arc<Kernel>, fragment: Fragment) -> Task {
    Task::new(Context::new(), Arc::clone(kernel), fragment).unwrap()
}
