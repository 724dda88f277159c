//! Search and verification of NTT-friendly primes.
//!
//! A prime `q` supports a negacyclic transform of size `n` when
//! `q = 1 mod 2n`: the multiplicative group then contains a primitive
//! `2n`-th root of unity `ψ`, with `ψ^n = -1`.

mod generation;
mod roots;

pub use generation::{NttFriendlyPrimes, is_ntt_friendly};
pub use roots::{negacyclic_psi, pow_mod, primitive_root, verify_roots};
