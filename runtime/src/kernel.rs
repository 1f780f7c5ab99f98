//! Kernels and invocation contexts.

use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use sango_ir::Fragment;

// Monotonic kernel ids; Relaxed is sufficient since only uniqueness matters.
static KERNEL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Stable identifier of a kernel, assigned at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelId(u64);

/// Declared type of a kernel parameter or return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    I32,
    I64,
    F32,
    F64,
    Ptr,
}

/// A front-end kernel: its signature plus the ordered template fragments
/// one invocation expands into.
///
/// The front end guarantees that the fragments are self-contained trees in
/// per-kernel program order and that clear/generate pairs are adjacent.
#[derive(Debug)]
pub struct Kernel {
    id: KernelId,
    name: String,
    params: SmallVec<[ParamKind; 4]>,
    returns: SmallVec<[ParamKind; 1]>,
    fragments: Vec<Fragment>,
}

impl Kernel {
    pub fn new(
        name: impl Into<String>,
        params: impl IntoIterator<Item = ParamKind>,
        returns: impl IntoIterator<Item = ParamKind>,
        fragments: Vec<Fragment>,
    ) -> Self {
        Self {
            id: KernelId(KERNEL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            params: params.into_iter().collect(),
            returns: returns.into_iter().collect(),
            fragments,
        }
    }

    pub fn id(&self) -> KernelId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    pub fn returns(&self) -> &[ParamKind] {
        &self.returns
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Whether the kernel declares no arguments and no return values.
    /// Argument binding is positional per kernel, so only binding-free
    /// kernels may be fused across kernel boundaries.
    pub fn is_bindings_free(&self) -> bool {
        self.params.is_empty() && self.returns.is_empty()
    }
}

/// Value bound to a kernel argument for one invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArgValue {
    I64(i64),
    F64(f64),
    Ptr(usize),
}

/// Per-invocation context handed to every launch of that invocation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub args: SmallVec<[ArgValue; 8]>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_args(args: impl IntoIterator<Item = ArgValue>) -> Self {
        Self { args: args.into_iter().collect() }
    }
}
