//! Asynchronous compile-and-dispatch runtime for sango kernels.
//!
//! Kernel invocations are expanded into per-execution-unit tasks and
//! parked in a pending queue instead of running eagerly. Queue-level
//! optimization passes (redundant index-rebuild elimination, horizontal
//! fusion) rewrite the pending work, and `synchronize` drains it into a
//! pipeline that compiles fragments in parallel while launching them
//! strictly in program order.
//!
//! # Structural caching
//!
//! Tasks are identified by a structural fingerprint of their fragment.
//! Compiled artifacts and derived access metadata are cached per
//! fingerprint, so structurally identical tasks compile once no matter
//! how many times they are launched.

pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod fuse;
pub mod kernel;
pub mod listgen;
pub mod queue;
pub mod stats;
pub mod task;


pub use backend::{CodeGen, CodeGenError, DefaultLowering, EntryPoint, Lowering};
pub use config::EngineConfig;
pub use engine::AsyncEngine;
pub use error::{Error, Result};
pub use kernel::{ArgValue, Context, Kernel, KernelId, ParamKind};
pub use queue::ExecutionQueue;
pub use stats::Statistics;
pub use task::{Task, TaskMeta, extract_meta};
