use core::arch::aarch64::{
    uint32x2_t, uint32x4_t, uint64x2_t, vaddq_u32, vaddq_u64, vandq_u32, vandq_u64, vcgeq_u32, vcgeq_u64, vcltq_u32,
    vcombine_u32, vdup_n_u32, vdupq_n_u32, vdupq_n_u64, vget_low_u32, vld1q_u32, vmovn_u64, vmull_high_u32, vmull_u32,
    vorrq_u32, vshrn_n_u64, vshrq_n_u64, vst1q_u32, vsubq_u32, vsubq_u64,
};

use crate::layer::LayerTable;

/// Broadcast modulus constants for one layer.
#[derive(Clone, Copy)]
pub(super) struct ModulusNeon {
    q: uint32x4_t,
    q_narrow: uint32x2_t,
    q_wide: uint64x2_t,
    two_q_wide: uint64x2_t,
    barrett_hi: uint32x2_t,
    barrett_lo: uint32x2_t,
}

impl ModulusNeon {
    #[inline(always)]
    pub(super) unsafe fn new(t: &LayerTable) -> Self {
        unsafe {
            ModulusNeon {
                q: vdupq_n_u32(t.q),
                q_narrow: vdup_n_u32(t.q),
                q_wide: vdupq_n_u64(t.q as u64),
                two_q_wide: vdupq_n_u64((t.q as u64) << 1),
                barrett_hi: vdup_n_u32((t.barrett >> 32) as u32),
                barrett_lo: vdup_n_u32(t.barrett as u32),
            }
        }
    }

    /// The 32-bit lane sum may wrap for moduli close to `2^32`; a wrapped
    /// lane is always above `q` and is corrected like one that did not wrap.
    #[inline(always)]
    pub(super) unsafe fn add(&self, a: uint32x4_t, b: uint32x4_t) -> uint32x4_t {
        unsafe {
            let sum: uint32x4_t = vaddq_u32(a, b);
            let carry: uint32x4_t = vcltq_u32(sum, a);
            let over: uint32x4_t = vcgeq_u32(sum, self.q);
            vsubq_u32(sum, vandq_u32(vorrq_u32(carry, over), self.q))
        }
    }

    #[inline(always)]
    pub(super) unsafe fn sub(&self, a: uint32x4_t, b: uint32x4_t) -> uint32x4_t {
        unsafe {
            let diff: uint32x4_t = vsubq_u32(a, b);
            let borrow: uint32x4_t = vcltq_u32(a, b);
            vaddq_u32(diff, vandq_u32(borrow, self.q))
        }
    }

    #[inline(always)]
    pub(super) unsafe fn mul(&self, a: uint32x4_t, b: uint32x4_t) -> uint32x4_t {
        unsafe {
            let lo: uint64x2_t = self.reduce_product(vmull_u32(vget_low_u32(a), vget_low_u32(b)));
            let hi: uint64x2_t = self.reduce_product(vmull_high_u32(a, b));
            vcombine_u32(vmovn_u64(lo), vmovn_u64(hi))
        }
    }

    /// Barrett reduction of a product `x < q^2` against `floor(2^64 / q)`,
    /// with the high product built from 32-bit halves. The remainder before
    /// correction lies in `[0, 4q)`.
    #[inline(always)]
    unsafe fn reduce_product(&self, x: uint64x2_t) -> uint64x2_t {
        unsafe {
            let x_hi: uint32x2_t = vshrn_n_u64::<32>(x);
            let x_lo: uint32x2_t = vmovn_u64(x);

            let hh: uint64x2_t = vmull_u32(x_hi, self.barrett_hi);
            let hl: uint64x2_t = vshrq_n_u64::<32>(vmull_u32(x_hi, self.barrett_lo));
            let lh: uint64x2_t = vshrq_n_u64::<32>(vmull_u32(x_lo, self.barrett_hi));
            let quotient: uint64x2_t = vaddq_u64(hh, vaddq_u64(hl, lh));

            let r: uint64x2_t = vsubq_u64(x, vmull_u32(vmovn_u64(quotient), self.q_narrow));
            cond_sub_wide(cond_sub_wide(r, self.two_q_wide), self.q_wide)
        }
    }
}

#[inline(always)]
unsafe fn cond_sub_wide(x: uint64x2_t, q: uint64x2_t) -> uint64x2_t {
    unsafe { vsubq_u64(x, vandq_u64(vcgeq_u64(x, q), q)) }
}

#[inline(always)]
pub(super) unsafe fn load4(src: &[u32]) -> uint32x4_t {
    debug_assert!(src.len() >= 4);
    unsafe { vld1q_u32(src.as_ptr()) }
}

#[inline(always)]
pub(super) unsafe fn store4(dst: &mut [u32], v: uint32x4_t) {
    debug_assert!(dst.len() >= 4);
    unsafe { vst1q_u32(dst.as_mut_ptr(), v) }
}

/// Loads `src[idx[0]], .., src[idx[3]]`. Indices are public.
#[inline(always)]
pub(super) unsafe fn gather4(src: &[u32], idx: [usize; 4]) -> uint32x4_t {
    let lanes: [u32; 4] = [src[idx[0]], src[idx[1]], src[idx[2]], src[idx[3]]];
    unsafe { vld1q_u32(lanes.as_ptr()) }
}

#[inline(always)]
pub(super) unsafe fn scatter4(dst: &mut [u32], idx: [usize; 4], v: uint32x4_t) {
    let mut lanes: [u32; 4] = [0u32; 4];
    unsafe { vst1q_u32(lanes.as_mut_ptr(), v) };
    for (&i, &x) in idx.iter().zip(lanes.iter()) {
        dst[i] = x;
    }
}

#[inline(always)]
pub(super) unsafe fn splat(x: u32) -> uint32x4_t {
    unsafe { vdupq_n_u32(x) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Layer;
    use sampling::Source;

    #[target_feature(enable = "neon")]
    unsafe fn lanes(t: &LayerTable, a: &[u32; 4], b: &[u32; 4]) -> [[u32; 4]; 3] {
        let mut out: [[u32; 4]; 3] = [[0u32; 4]; 3];
        unsafe {
            let m: ModulusNeon = ModulusNeon::new(t);
            let (va, vb) = (load4(a), load4(b));
            store4(&mut out[0], m.add(va, vb));
            store4(&mut out[1], m.sub(va, vb));
            store4(&mut out[2], m.mul(va, vb));
        }
        out
    }

    #[test]
    fn lanes_match_scalar_arithmetic() {
        if !std::arch::is_aarch64_feature_detected!("neon") {
            eprintln!("skipping: neon not detected");
            return;
        }
        let mut source: Source = Source::new([13u8; 32]);
        for layer in Layer::ALL {
            let t: &LayerTable = layer.table();
            let q: u32 = t.q;
            for round in 0..256 {
                let mut a: [u32; 4] = [0, 1, q - 1, q - 1];
                let mut b: [u32; 4] = [q - 1, q - 1, q - 1, 0];
                if round > 0 {
                    source.fill_uniform(&mut a, q);
                    source.fill_uniform(&mut b, q);
                }
                let [sum, diff, prod] = unsafe { lanes(t, &a, &b) };
                for i in 0..4 {
                    assert_eq!(sum[i], t.add_mod(a[i], b[i]), "{layer}");
                    assert_eq!(diff[i], t.sub_mod(a[i], b[i]), "{layer}");
                    assert_eq!(prod[i], t.mul_mod(a[i], b[i]), "{layer}");
                }
            }
        }
    }
}
