//! Engine configuration.

use std::sync::Arc;

use bon::Builder;

use crate::backend::{CodeGen, DefaultLowering, Lowering};

/// Configuration for an [`crate::engine::AsyncEngine`].
#[derive(Clone, Builder)]
pub struct EngineConfig {
    /// Number of parallel compile workers.
    #[builder(default = 4)]
    pub compile_workers: usize,

    /// Code generation backend.
    pub backend: Arc<dyn CodeGen>,

    /// Final-lowering pipeline applied before code generation.
    #[builder(default = Arc::new(DefaultLowering))]
    pub lowering: Arc<dyn Lowering>,
}
