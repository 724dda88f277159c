//! Constant-time arithmetic in `Z_q`.
//!
//! No function in this module branches on, or indexes memory with, the value
//! of an operand. Conditional corrections are expressed as all-ones/all-zeros
//! masks derived from a borrow bit. Compilers may still lower a mask select
//! to a branch; the statistical check in [`crate::timing`] is what actually
//! gates the property.

use crate::{error::NttError, layer::Layer, layer::LayerTable};

/// `0` for `bit == 0`, all ones for `bit == 1`.
#[inline(always)]
pub fn ct_mask(bit: u64) -> u64 {
    core::hint::black_box(bit & 1).wrapping_neg()
}

/// Returns `a` where `mask` is all ones and `b` where it is zero.
#[inline(always)]
pub fn ct_select(mask: u64, a: u64, b: u64) -> u64 {
    b ^ (mask & (a ^ b))
}

/// Maps `x` in `[0, 2q)` to `[0, q)`. Requires `2q < 2^63`.
#[inline(always)]
pub fn reduce_once(x: u64, q: u64) -> u64 {
    debug_assert!(x < q << 1, "reduce_once: {x} >= 2q ({})", q << 1);
    let d: u64 = x.wrapping_sub(q);
    // borrow is 1 iff x < q
    let keep: u64 = 0u64.wrapping_sub(d >> 63);
    (d & !keep) | (x & keep)
}

impl LayerTable {
    #[inline(always)]
    pub fn add_mod(&self, a: u32, b: u32) -> u32 {
        debug_assert!(a < self.q && b < self.q);
        reduce_once(a as u64 + b as u64, self.q as u64) as u32
    }

    #[inline(always)]
    pub fn sub_mod(&self, a: u32, b: u32) -> u32 {
        debug_assert!(a < self.q && b < self.q);
        reduce_once(a as u64 + self.q as u64 - b as u64, self.q as u64) as u32
    }

    #[inline(always)]
    pub fn neg_mod(&self, a: u32) -> u32 {
        debug_assert!(a < self.q);
        reduce_once(self.q as u64 - a as u64, self.q as u64) as u32
    }

    /// Barrett multiplication with `floor(2^64 / q)`.
    ///
    /// The quotient estimate is at most one below `floor(ab / q)`, so a
    /// single conditional subtraction lands in `[0, q)`.
    #[inline(always)]
    pub fn mul_mod(&self, a: u32, b: u32) -> u32 {
        debug_assert!(a < self.q && b < self.q);
        let x: u64 = a as u64 * b as u64;
        let quotient: u64 = ((x as u128 * self.barrett as u128) >> 64) as u64;
        let r: u64 = x - quotient * self.q as u64;
        reduce_once(r, self.q as u64) as u32
    }

    /// `a^e mod q` with a fixed 32-step square-and-multiply schedule.
    pub fn pow_mod(&self, a: u32, e: u32) -> u32 {
        let mut acc: u32 = 1;
        let mut base: u32 = a;
        for i in 0..u32::BITS {
            let prod: u32 = self.mul_mod(acc, base);
            acc = ct_select(ct_mask(((e >> i) & 1) as u64), prod as u64, acc as u64) as u32;
            base = self.mul_mod(base, base);
        }
        acc
    }

    /// Fermat inverse `a^(q-2)`. Returns 0 for `a == 0`.
    #[inline(always)]
    pub fn inv_mod(&self, a: u32) -> u32 {
        self.pow_mod(a, self.q - 2)
    }
}

/// `(a + b) mod q`.
#[inline(always)]
pub fn add_mod(a: u32, b: u32, layer: Layer) -> u32 {
    layer.table().add_mod(a, b)
}

/// `(a - b) mod q`.
#[inline(always)]
pub fn sub_mod(a: u32, b: u32, layer: Layer) -> u32 {
    layer.table().sub_mod(a, b)
}

/// `-a mod q`.
#[inline(always)]
pub fn neg_mod(a: u32, layer: Layer) -> u32 {
    layer.table().neg_mod(a)
}

/// `a * b mod q`.
#[inline(always)]
pub fn mul_mod(a: u32, b: u32, layer: Layer) -> u32 {
    layer.table().mul_mod(a, b)
}

/// `a^e mod q`.
#[inline(always)]
pub fn pow_mod(a: u32, e: u32, layer: Layer) -> u32 {
    layer.table().pow_mod(a, e)
}

/// `a^-1 mod q`, computed as `a^(q-2)`.
///
/// The result for `a == 0` is 0, which is not an inverse; callers must
/// never pass a zero that derives from secret data.
#[inline(always)]
pub fn inv_mod(a: u32, layer: Layer) -> u32 {
    layer.table().inv_mod(a)
}

/// Like [`inv_mod`] but rejects zero. Branches on `a`: use on public values only.
pub fn checked_inv_mod(a: u32, layer: Layer) -> Result<u32, NttError> {
    if a == 0 {
        return Err(NttError::ZeroInverse);
    }
    Ok(inv_mod(a, layer))
}
