//! Code generation and final-lowering seams.
//!
//! The engine treats both as opaque collaborators: `Lowering` turns a
//! fragment into a backend-ready equivalent immediately before code
//! generation, and `CodeGen` is a pure function of one fragment plus its
//! kernel, invoked at most once per distinct fingerprint.

use std::sync::Arc;

use snafu::Snafu;

use sango_ir::Fragment;

use crate::kernel::{Context, Kernel};

/// Invokable entry point produced by a backend.
pub type EntryPoint = Arc<dyn Fn(&Context) + Send + Sync>;

/// Failure raised by a code generation backend.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(display("code generation failed: {reason}"))]
pub struct CodeGenError {
    pub reason: String,
}

/// Machine-code generation backend.
pub trait CodeGen: Send + Sync {
    fn compile(&self, kernel: &Kernel, fragment: &Fragment) -> Result<EntryPoint, CodeGenError>;
}

/// Final-lowering pipeline applied to a fragment immediately before code
/// generation. Contract: produces a backend-ready equivalent fragment.
pub trait Lowering: Send + Sync {
    fn lower(&self, fragment: &mut Fragment);
}

/// Default final lowering: runs the IR simplification pass to a fixpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultLowering;

impl Lowering for DefaultLowering {
    fn lower(&self, fragment: &mut Fragment) {
        sango_ir::simplify(fragment);
    }
}
