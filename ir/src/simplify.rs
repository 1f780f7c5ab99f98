//! Fragment simplification.
//!
//! The slice of the final-lowering pipeline that fusion re-runs after a
//! merge: constant folding over `Binary`, then elimination of body
//! statements that have no side effects and no uses. Runs to a local
//! fixpoint and renumbers the arena when anything changed.

use tracing::trace;

use crate::fragment::Fragment;
use crate::stmt::Stmt;

fn fold_constants(fragment: &mut Fragment) -> bool {
    let mut changed = false;
    for pos in 0..fragment.body.len() {
        let id = fragment.body[pos];
        let folded = match &fragment.stmts[id.0 as usize] {
            &Stmt::Binary { op, lhs, rhs } => {
                match (&fragment.stmts[lhs.0 as usize], &fragment.stmts[rhs.0 as usize]) {
                    (&Stmt::Const { value: a }, &Stmt::Const { value: b }) => Some(op.apply(a, b)),
                    _ => None,
                }
            }
            _ => None,
        };
        if let Some(value) = folded {
            fragment.stmts[id.0 as usize] = Stmt::Const { value };
            changed = true;
        }
    }
    changed
}

fn eliminate_dead(fragment: &mut Fragment) -> bool {
    let mut uses = vec![0u32; fragment.stmts.len()];
    for &id in &fragment.body {
        for op in fragment.stmts[id.0 as usize].operands() {
            uses[op.0 as usize] += 1;
        }
    }

    let before = fragment.body.len();
    let stmts = &fragment.stmts;
    fragment.body.retain(|&id| stmts[id.0 as usize].has_side_effect() || uses[id.0 as usize] > 0);
    fragment.body.len() != before
}

/// Simplify a fragment in place. Returns whether anything changed.
pub fn simplify(fragment: &mut Fragment) -> bool {
    let mut changed = false;
    loop {
        let folded = fold_constants(fragment);
        let pruned = eliminate_dead(fragment);
        if !folded && !pruned {
            break;
        }
        changed = true;
    }
    if changed {
        fragment.renumber();
        trace!(body_len = fragment.body().len(), "fragment simplified");
    }
    changed
}
