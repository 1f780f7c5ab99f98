//! Intermediate representation for the sango kernel compiler.
//!
//! This crate defines the IR the dispatch engine operates on: task
//! fragments, the statement forms the engine inspects, the sparse
//! data-structure node registry, canonical printing, structural
//! fingerprinting, and the simplification pass shared by final lowering
//! and task fusion.
//!
//! # Module Organization
//!
//! - [`node`] - Sparse data-structure node registry
//! - [`stmt`] - Statement forms and task kinds
//! - [`fragment`] - Arena-backed task fragments
//! - [`print`] - Canonical textual rendering
//! - [`fingerprint`] - Structural hashing
//! - [`simplify`] - Constant folding and dead-statement elimination
//! - [`error`] - Error types and result handling

pub mod error;
pub mod fingerprint;
pub mod fragment;
pub mod node;
pub mod print;
pub mod simplify;
pub mod stmt;

pub use error::{Error, Result};
pub use fingerprint::{Fingerprint, fingerprint};
pub use fragment::{AnchorId, Fragment, FragmentBuilder, Parent};
pub use node::{NodeId, NodeKind, NodeTree};
pub use print::render;
pub use simplify::simplify;
pub use stmt::{BinOp, Bound, Stmt, StmtId, TaskKind};
