//! # ntt64
//!
//! Constant-time 64-point negacyclic Number Theoretic Transform over eight
//! fixed prime moduli ("layers"), with runtime selection of AVX2 or NEON
//! kernels that are bit-identical to the scalar reference.
//!
//! ## Ring
//!
//! Polynomials live in `Z_q[X]/(X^64 + 1)`. Every modulus satisfies
//! `q = 1 mod 128`, so a primitive 128th root of unity `ψ` exists with
//! `ψ^64 = -1`. The forward transform evaluates a polynomial at the odd
//! powers of `ψ`:
//!
//! ```text
//! A[k] = Σ_i a[i] · ψ^i · ω^(i·k),   ω = ψ²
//! ```
//!
//! so that pointwise products in the transform domain are negacyclic
//! products in the coefficient domain. Coefficients are kept in `[0, q)`
//! and in natural (not bit-reversed) order at every public boundary.
//!
//! ## Layout
//!
//! - [`layer`]: the [`Layer`] enum and the compile-time constant tables.
//! - [`arithmetic`]: branchless modular add/sub/mul/pow/inverse.
//! - [`reference`]: the scalar transform, always available.
//! - `avx2` / `neon`: vector kernels, compiled only on `x86_64` / `aarch64`.
//! - [`backend`]: the [`NttBackend`] trait with one marker type per instruction set.
//! - [`dispatch`]: CPU feature detection and the [`Dispatch`] strategy value.
//! - [`timing`]: statistical harness for the constant-time property.
//! - [`test_suite`]: backend-generic test bodies and the test-suite macros.
//!
//! ## Usage
//!
//! ```
//! use ntt64::{Dispatch, Layer, N};
//!
//! let ntt: Dispatch = Dispatch::detect();
//! let mut a: [u32; N] = [0u32; N];
//! a[0] = 1;
//! ntt.forward(&mut a, Layer::Q257);
//! assert!(a.iter().all(|&x| x == 1));
//! ntt.inverse(&mut a, Layer::Q257);
//! assert_eq!(a[0], 1);
//! ```

pub mod arithmetic;
pub mod backend;
pub mod dispatch;
pub mod error;
pub mod layer;
pub mod reference;
pub mod test_suite;
pub mod timing;

#[cfg(target_arch = "x86_64")]
pub mod avx2;

#[cfg(target_arch = "aarch64")]
pub mod neon;

pub use arithmetic::{add_mod, checked_inv_mod, inv_mod, mul_mod, neg_mod, pow_mod, sub_mod};
pub use backend::{NttBackend, NttRef};
#[cfg(target_arch = "x86_64")]
pub use backend::NttAvx2;
#[cfg(target_arch = "aarch64")]
pub use backend::NttNeon;
pub use dispatch::{
    Backend, CpuFeatures, Dispatch, Preference, detect_cpu_features, forward, implementation_name, init, inverse,
    pointwise_mul, pointwise_mul_inplace,
};
pub use error::NttError;
pub use layer::{Layer, LayerTable, modulus, n_inv, psi};
pub use reference::{negacyclic_mul_schoolbook, validate};

/// Transform size.
pub const N: usize = 64;

/// `log2(N)`, the number of butterfly stages.
pub const LOG_N: usize = 6;

/// A polynomial of `N` coefficients in `[0, q)`.
pub type Poly = [u32; N];
