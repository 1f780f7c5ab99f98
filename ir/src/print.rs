//! Canonical textual rendering of fragments.
//!
//! Display ids are assigned sequentially in canonical order (root, then
//! body in program order) regardless of the arena slots the statements
//! happen to occupy, so two fragments identical up to internal numbering
//! render to the same text. The fingerprint is computed over this text.

use std::collections::HashMap;
use std::fmt::Write;

use crate::error::Result;
use crate::fragment::Fragment;
use crate::stmt::{Bound, Stmt, StmtId, TaskKind};

fn render_kind(out: &mut String, kind: &TaskKind) {
    match kind {
        TaskKind::Serial => out.push_str("serial"),
        TaskKind::Range { begin, end } => {
            let bound = |b: &Bound| match b {
                Bound::Const(v) => format!("const {v}"),
                Bound::Dynamic => "dyn".to_string(),
            };
            let _ = write!(out, "range_for begin={} end={}", bound(begin), bound(end));
        }
        TaskKind::Domain { node, block_dim } => {
            let _ = write!(out, "struct_for node={node} block={block_dim}");
        }
        TaskKind::ListGen { node } => {
            let _ = write!(out, "listgen node={node}");
        }
        TaskKind::ListClear { node } => {
            let _ = write!(out, "clear_list node={node}");
        }
        TaskKind::Gc { node } => {
            let _ = write!(out, "gc node={node}");
        }
    }
}

/// Render a fragment to its canonical textual form.
pub fn render(fragment: &Fragment) -> Result<String> {
    let kind = fragment.task_kind()?;

    let mut display: HashMap<StmtId, u32> = HashMap::with_capacity(fragment.body().len() + 1);
    display.insert(fragment.root(), 0);
    for (i, &id) in fragment.body().iter().enumerate() {
        display.insert(id, (i + 1) as u32);
    }
    let d = |id: StmtId| display.get(&id).copied().unwrap_or(u32::MAX);

    let mut out = String::new();
    out.push_str("$0 = offload ");
    render_kind(&mut out, &kind);
    out.push_str(" {\n");
    for (id, stmt) in fragment.walk() {
        let _ = write!(out, "  ${} = ", d(id));
        match stmt {
            Stmt::Offload { kind } => render_kind(&mut out, kind),
            Stmt::GlobalPtr { node, activate } => {
                let _ = write!(out, "ptr node={node} activate={activate}");
            }
            Stmt::Load { ptr } => {
                let _ = write!(out, "load ${}", d(*ptr));
            }
            Stmt::Store { ptr, value } => {
                let _ = write!(out, "store ${} ${}", d(*ptr), d(*value));
            }
            Stmt::AtomicAdd { ptr, value } => {
                let _ = write!(out, "atomic_add ${} ${}", d(*ptr), d(*value));
            }
            Stmt::Const { value } => {
                let _ = write!(out, "const {value}");
            }
            Stmt::Binary { op, lhs, rhs } => {
                let _ = write!(out, "{} ${} ${}", op.name(), d(*lhs), d(*rhs));
            }
            Stmt::LoopIndex { owner, dim } => {
                let _ = write!(out, "index ${} dim={dim}", d(*owner));
            }
        }
        out.push('\n');
    }
    out.push_str("}\n");
    Ok(out)
}
