//! Error types for the dispatch engine.

use snafu::Snafu;

use sango_ir::{Fingerprint, NodeId};

use crate::backend::CodeGenError;

/// Result type for engine operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Task construction failed: the fragment has no valid execution-unit
    /// root. Precedes enqueue, fatal for the invocation.
    #[snafu(display("task construction failed: {source}"))]
    Construction { source: sango_ir::Error },

    /// Producer invariant broken: every clear-list task must be
    /// immediately followed by the matching list-generation task.
    #[snafu(display("clear-list task for node {node} is not followed by its matching list-generation task"))]
    ListClearWithoutGen { node: NodeId },

    /// Lowering or code generation failed for a fragment. Propagated
    /// through the artifact cache slot so launches waiting on the
    /// fingerprint fail fast instead of hanging.
    #[snafu(display("compilation failed for fingerprint {fingerprint}: {source}"))]
    Compilation { fingerprint: Fingerprint, source: CodeGenError },

    /// A worker pool or thread could not be constructed.
    #[snafu(display("failed to build worker pool: {reason}"))]
    WorkerPool { reason: String },
}
