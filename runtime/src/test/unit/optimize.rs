//! Pending-queue rewrite tests: index-rebuild elimination and fusion.

use std::sync::Arc;

use test_case::test_case;

use sango_ir::{Bound, FragmentBuilder, NodeId, TaskKind};

use crate::engine::AsyncEngine;
use crate::error::Error;
use crate::kernel::{Kernel, ParamKind};
use crate::task::Task;

use super::support::{
    RecordingBackend, activating_fragment, empty_fragment, engine, kernel_of, store_fragment, task,
    two_level_tree,
};

fn kinds(engine: &AsyncEngine) -> Vec<TaskKind> {
    engine.pending.iter().map(Task::kind).collect()
}

fn push_rebuild(engine: &mut AsyncEngine, kernel: &Arc<Kernel>, node: NodeId) {
    engine.enqueue(task(kernel, empty_fragment(TaskKind::ListClear { node })));
    engine.enqueue(task(kernel, empty_fragment(TaskKind::ListGen { node })));
}

#[test]
fn test_clean_rebuild_pair_eliminated() {
    let (tree, _, leaf) = two_level_tree();
    let mut engine = engine(tree, RecordingBackend::new());
    let k = kernel_of("k", vec![]);

    push_rebuild(&mut engine, &k, leaf);
    engine.enqueue(task(&k, store_fragment(TaskKind::Domain { node: leaf, block_dim: 32 }, leaf, 1)));
    push_rebuild(&mut engine, &k, leaf);

    assert!(engine.optimize_listgen().unwrap());
    assert_eq!(
        kinds(&engine),
        vec![
            TaskKind::ListClear { node: leaf },
            TaskKind::ListGen { node: leaf },
            TaskKind::Domain { node: leaf, block_dim: 32 },
        ]
    );
    // Nothing left to remove on a second run.
    assert!(!engine.optimize_listgen().unwrap());
    assert_eq!(engine.pending.len(), 3);
}

#[test]
fn test_activation_forces_rebuild() {
    let (tree, _, leaf) = two_level_tree();
    let mut engine = engine(tree, RecordingBackend::new());
    let k = kernel_of("k", vec![]);

    push_rebuild(&mut engine, &k, leaf);
    engine.enqueue(task(
        &k,
        activating_fragment(TaskKind::Domain { node: leaf, block_dim: 32 }, leaf, 1),
    ));
    push_rebuild(&mut engine, &k, leaf);

    assert!(!engine.optimize_listgen().unwrap());
    assert_eq!(engine.pending.len(), 5);
}

#[test]
fn test_activation_dirties_ancestor_lists() {
    let (tree, parent, leaf) = two_level_tree();
    let mut engine = engine(tree, RecordingBackend::new());
    let k = kernel_of("k", vec![]);

    // Activating a leaf element implicitly activates its parent, so the
    // parent's rebuild must survive too.
    push_rebuild(&mut engine, &k, parent);
    engine.enqueue(task(&k, activating_fragment(TaskKind::Serial, leaf, 1)));
    push_rebuild(&mut engine, &k, parent);

    assert!(!engine.optimize_listgen().unwrap());
    assert_eq!(engine.pending.len(), 5);
}

#[test]
fn test_unpaired_clear_is_fatal() {
    let (tree, parent, leaf) = two_level_tree();

    let mut lone = engine(Arc::clone(&tree), RecordingBackend::new());
    let k = kernel_of("k", vec![]);
    lone.enqueue(task(&k, empty_fragment(TaskKind::ListClear { node: leaf })));
    assert!(matches!(lone.optimize_listgen(), Err(Error::ListClearWithoutGen { .. })));

    // A generate task for a different node does not pair either.
    let mut mismatched = engine(tree, RecordingBackend::new());
    mismatched.enqueue(task(&k, empty_fragment(TaskKind::ListClear { node: parent })));
    mismatched.enqueue(task(&k, empty_fragment(TaskKind::ListGen { node: leaf })));
    assert!(matches!(mismatched.optimize_listgen(), Err(Error::ListClearWithoutGen { .. })));
}

fn range(begin: i64, end: i64) -> TaskKind {
    TaskKind::Range { begin: Bound::Const(begin), end: Bound::Const(end) }
}

fn dynamic_range() -> TaskKind {
    TaskKind::Range { begin: Bound::Const(0), end: Bound::Dynamic }
}

fn domain(node: NodeId, block_dim: u32) -> TaskKind {
    TaskKind::Domain { node, block_dim }
}

#[test_case(range(0, 16), range(0, 16) => true; "identical constant bounds")]
#[test_case(range(0, 16), range(0, 32) => false; "different end bound")]
#[test_case(dynamic_range(), dynamic_range() => false; "dynamic bounds")]
#[test_case(domain(NodeId(2), 32), domain(NodeId(2), 32) => true; "same node and block size")]
#[test_case(domain(NodeId(2), 32), domain(NodeId(2), 64) => false; "different block size")]
#[test_case(domain(NodeId(1), 32), domain(NodeId(2), 32) => false; "different node")]
#[test_case(TaskKind::Serial, TaskKind::Serial => false; "serial never fuses")]
#[test_case(range(0, 16), domain(NodeId(2), 32) => false; "mixed kinds")]
fn fuses_within_one_kernel(a: TaskKind, b: TaskKind) -> bool {
    let (tree, _, leaf) = two_level_tree();
    let mut engine = engine(tree, RecordingBackend::new());
    let k = kernel_of("k", vec![]);
    engine.enqueue(task(&k, store_fragment(a, leaf, 1)));
    engine.enqueue(task(&k, store_fragment(b, leaf, 2)));
    engine.fuse()
}

#[test]
fn test_equal_bound_ranges_fuse_across_index_dimensionality() {
    let (tree, _, leaf) = two_level_tree();
    let mut engine = engine(tree, RecordingBackend::new());
    let k = kernel_of("k", vec![]);
    let kind = range(0, 16);

    let mut one_d = FragmentBuilder::new(kind);
    let p = one_d.global_ptr(leaf, false);
    let i = one_d.loop_index(0);
    one_d.store(p, i);

    let mut two_d = FragmentBuilder::new(kind);
    let p = two_d.global_ptr(leaf, false);
    let j = two_d.loop_index(1);
    two_d.store(p, j);

    engine.enqueue(task(&k, one_d.build()));
    engine.enqueue(task(&k, two_d.build()));

    // Eligibility compares bounds only; index dimensionality is not
    // inspected.
    assert!(engine.fuse());
    assert_eq!(engine.pending.len(), 1);
}

#[test]
fn test_fusion_merges_bodies_and_drops_emptied_task() {
    let (tree, _, leaf) = two_level_tree();
    let mut engine = engine(tree, RecordingBackend::new());
    let k = kernel_of("k", vec![]);
    let kind = TaskKind::Domain { node: leaf, block_dim: 32 };

    engine.enqueue(task(&k, store_fragment(kind, leaf, 1)));
    engine.enqueue(task(&k, store_fragment(kind, leaf, 2)));
    let before = engine.pending[0].fingerprint();

    assert!(engine.fuse());
    assert_eq!(engine.pending.len(), 1);
    let merged = &engine.pending[0];
    assert_eq!(merged.fragment().body().len(), 6);
    assert_ne!(merged.fingerprint(), before);
    merged.fragment().validate().unwrap();
}

#[test]
fn test_fusion_reaches_fixpoint() {
    let (tree, _, leaf) = two_level_tree();
    let mut engine = engine(tree, RecordingBackend::new());
    let k = kernel_of("k", vec![]);
    let kind = TaskKind::Domain { node: leaf, block_dim: 32 };
    for value in 0..3 {
        engine.enqueue(task(&k, store_fragment(kind, leaf, value)));
    }

    let mut sweeps = 0;
    while engine.fuse() {
        sweeps += 1;
        assert!(sweeps < 10, "fusion failed to converge");
    }
    assert_eq!(engine.pending.len(), 1);
    assert_eq!(engine.pending[0].fragment().body().len(), 9);
}

#[test]
fn test_preexisting_empty_compute_tasks_are_dropped() {
    let (tree, _, leaf) = two_level_tree();
    let mut engine = engine(tree, RecordingBackend::new());
    let k = kernel_of("k", vec![]);

    engine.enqueue(task(&k, empty_fragment(TaskKind::Serial)));
    engine.enqueue(task(&k, empty_fragment(TaskKind::ListClear { node: leaf })));
    engine.enqueue(task(&k, empty_fragment(TaskKind::ListGen { node: leaf })));
    engine.enqueue(task(&k, empty_fragment(TaskKind::Gc { node: leaf })));

    // Cleanup runs even when nothing fused: the empty serial task goes,
    // list maintenance and GC tasks act through their kind and stay.
    assert!(!engine.fuse());
    assert_eq!(
        kinds(&engine),
        vec![
            TaskKind::ListClear { node: leaf },
            TaskKind::ListGen { node: leaf },
            TaskKind::Gc { node: leaf },
        ]
    );
}

#[test]
fn test_cross_kernel_fusion_requires_binding_free_kernels() {
    let kind = TaskKind::Domain { node: NodeId(2), block_dim: 32 };

    let (tree, _, leaf) = two_level_tree();
    let mut free = engine(Arc::clone(&tree), RecordingBackend::new());
    let a = kernel_of("a", vec![]);
    let b = kernel_of("b", vec![]);
    free.enqueue(task(&a, store_fragment(kind, leaf, 1)));
    free.enqueue(task(&b, store_fragment(kind, leaf, 2)));
    assert!(free.fuse());

    // A kernel with parameters binds arguments positionally, so its tasks
    // only fuse with tasks of the same kernel.
    let mut bound = engine(tree, RecordingBackend::new());
    let c = Arc::new(Kernel::new("c", [ParamKind::I64], [], vec![]));
    bound.enqueue(task(&a, store_fragment(kind, leaf, 1)));
    bound.enqueue(task(&c, store_fragment(kind, leaf, 2)));
    assert!(!bound.fuse());
}
