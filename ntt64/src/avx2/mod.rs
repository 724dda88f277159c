//! AVX2 kernels.
//!
//! Coefficients are widened to four `u64` lanes per `__m256i`, so sums and
//! Barrett intermediates never overflow even for the 32-bit layer. Every
//! kernel returns exactly what [`crate::reference`] returns.
//!
//! All public functions here are `unsafe`: the caller must have confirmed
//! AVX2 support at runtime, which [`crate::NttAvx2::try_new`] does.

mod arithmetic;
mod ntt;

pub use ntt::{ntt_forward_avx2, ntt_inverse_avx2, pointwise_mul_avx2, pointwise_mul_inplace_avx2};
