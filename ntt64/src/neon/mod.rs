//! NEON kernels for aarch64.
//!
//! Additions and subtractions run on four `u32` lanes with explicit carry
//! and borrow masks; products widen to two `u64` lanes per half. The output
//! is bit-identical to [`crate::reference`].
//!
//! # Safety
//! NEON is part of the aarch64 baseline, but the kernels still carry
//! `#[target_feature(enable = "neon")]` and are only reached through
//! [`crate::NttNeon::try_new`], which checks for it.

mod arithmetic;
mod ntt;

pub use ntt::{ntt_forward_neon, ntt_inverse_neon, pointwise_mul_inplace_neon, pointwise_mul_neon};
