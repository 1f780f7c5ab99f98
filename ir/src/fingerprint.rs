//! Structural fingerprints for compiled-artifact reuse.
//!
//! The fingerprint stands in for "compiles to an interchangeable
//! executable": fragments identical up to internal numbering collide, so a
//! computation re-issued every simulation step reuses its cached artifact.
//! This is an approximation of equivalence by construction, not a proof;
//! semantic comparison of fragments is out of scope.

use std::fmt;

use crate::error::Result;
use crate::fragment::Fragment;
use crate::print::render;

const HASH_MULTIPLIER: u64 = 100_000_007;

/// Structural hash of a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub u64);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Fingerprint a fragment: canonical render, folded through a polynomial
/// rolling hash. Fails when the fragment has no valid execution-unit root.
pub fn fingerprint(fragment: &Fragment) -> Result<Fingerprint> {
    let text = render(fragment)?;
    let mut hash = 0u64;
    for byte in text.bytes() {
        hash = hash.wrapping_mul(HASH_MULTIPLIER).wrapping_add(byte as u64);
    }
    Ok(Fingerprint(hash))
}
