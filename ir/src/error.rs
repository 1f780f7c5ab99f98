use snafu::Snafu;

use crate::stmt::StmtId;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Fragment has no valid execution-unit root.
    #[snafu(display("fragment root {root} is not an offload statement"))]
    MissingOffloadRoot { root: StmtId },

    /// Statement reference points outside the fragment arena.
    #[snafu(display("statement reference {stmt} is outside the arena (len {len})"))]
    DanglingStmt { stmt: StmtId, len: usize },
}
