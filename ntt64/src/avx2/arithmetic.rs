use core::arch::x86_64::{
    __m128i, __m256i, _mm_loadu_si128, _mm_storeu_si128, _mm256_add_epi64, _mm256_and_si256, _mm256_andnot_si256,
    _mm256_castsi256_si128, _mm256_cmpgt_epi64, _mm256_cvtepu32_epi64, _mm256_mul_epu32, _mm256_permutevar8x32_epi32,
    _mm256_set1_epi64x, _mm256_setr_epi32, _mm256_setr_epi64x, _mm256_srli_epi64, _mm256_storeu_si256, _mm256_sub_epi64,
};

use crate::layer::LayerTable;

/// Broadcast modulus constants for one layer.
#[derive(Clone, Copy)]
pub(super) struct ModulusAvx {
    q: __m256i,
    two_q: __m256i,
    barrett_hi: __m256i,
    barrett_lo: __m256i,
    mask32: __m256i,
}

impl ModulusAvx {
    #[inline(always)]
    pub(super) unsafe fn new(t: &LayerTable) -> Self {
        unsafe {
            ModulusAvx {
                q: _mm256_set1_epi64x(t.q as i64),
                two_q: _mm256_set1_epi64x((t.q as i64) << 1),
                barrett_hi: _mm256_set1_epi64x((t.barrett >> 32) as i64),
                barrett_lo: _mm256_set1_epi64x((t.barrett & 0xffff_ffff) as i64),
                mask32: _mm256_set1_epi64x(u32::MAX as i64),
            }
        }
    }

    #[inline(always)]
    pub(super) unsafe fn add(&self, a: __m256i, b: __m256i) -> __m256i {
        unsafe { cond_sub(_mm256_add_epi64(a, b), self.q) }
    }

    #[inline(always)]
    pub(super) unsafe fn sub(&self, a: __m256i, b: __m256i) -> __m256i {
        unsafe { cond_sub(_mm256_add_epi64(a, _mm256_sub_epi64(self.q, b)), self.q) }
    }

    /// `a * b mod q` for lanes in `[0, q)`.
    ///
    /// The 64x64 high product against `floor(2^64 / q)` is assembled from
    /// 32-bit halves, dropping the low cross terms. The quotient estimate
    /// then undershoots by at most 3, leaving a remainder in `[0, 4q)`.
    #[inline(always)]
    pub(super) unsafe fn mul(&self, a: __m256i, b: __m256i) -> __m256i {
        unsafe {
            let x: __m256i = _mm256_mul_epu32(a, b);
            let x_hi: __m256i = _mm256_srli_epi64::<32>(x);
            let x_lo: __m256i = _mm256_and_si256(x, self.mask32);

            let hh: __m256i = _mm256_mul_epu32(x_hi, self.barrett_hi);
            let hl: __m256i = _mm256_srli_epi64::<32>(_mm256_mul_epu32(x_hi, self.barrett_lo));
            let lh: __m256i = _mm256_srli_epi64::<32>(_mm256_mul_epu32(x_lo, self.barrett_hi));
            let quotient: __m256i = _mm256_add_epi64(hh, _mm256_add_epi64(hl, lh));

            let r: __m256i = _mm256_sub_epi64(x, _mm256_mul_epu32(quotient, self.q));
            cond_sub(cond_sub(r, self.two_q), self.q)
        }
    }
}

/// `x - q` in lanes where `x >= q`. Valid while both stay below `2^63`.
#[inline(always)]
unsafe fn cond_sub(x: __m256i, q: __m256i) -> __m256i {
    unsafe {
        let lt: __m256i = _mm256_cmpgt_epi64(q, x);
        _mm256_sub_epi64(x, _mm256_andnot_si256(lt, q))
    }
}

/// Loads `src[0..4]` zero-extended into four `u64` lanes.
#[inline(always)]
pub(super) unsafe fn load4(src: &[u32]) -> __m256i {
    debug_assert!(src.len() >= 4);
    unsafe { _mm256_cvtepu32_epi64(_mm_loadu_si128(src.as_ptr() as *const __m128i)) }
}

/// Stores the low halves of the four lanes of `v` into `dst[0..4]`.
#[inline(always)]
pub(super) unsafe fn store4(dst: &mut [u32], v: __m256i) {
    debug_assert!(dst.len() >= 4);
    unsafe {
        let packed: __m256i = _mm256_permutevar8x32_epi32(v, _mm256_setr_epi32(0, 2, 4, 6, 1, 3, 5, 7));
        _mm_storeu_si128(dst.as_mut_ptr() as *mut __m128i, _mm256_castsi256_si128(packed));
    }
}

/// Loads `src[idx[0]], .., src[idx[3]]`. Indices are public.
#[inline(always)]
pub(super) unsafe fn gather4(src: &[u32], idx: [usize; 4]) -> __m256i {
    unsafe {
        _mm256_setr_epi64x(
            src[idx[0]] as i64,
            src[idx[1]] as i64,
            src[idx[2]] as i64,
            src[idx[3]] as i64,
        )
    }
}

/// Writes the four lanes of `v` to `dst[idx[0]], .., dst[idx[3]]`.
#[inline(always)]
pub(super) unsafe fn scatter4(dst: &mut [u32], idx: [usize; 4], v: __m256i) {
    let mut lanes: [u64; 4] = [0u64; 4];
    unsafe { _mm256_storeu_si256(lanes.as_mut_ptr() as *mut __m256i, v) };
    for (&i, &x) in idx.iter().zip(lanes.iter()) {
        dst[i] = x as u32;
    }
}

/// Lane-wise broadcast of a public constant.
#[inline(always)]
pub(super) unsafe fn splat(x: u32) -> __m256i {
    unsafe { _mm256_set1_epi64x(x as i64) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Layer;
    use sampling::Source;

    #[target_feature(enable = "avx2")]
    unsafe fn lanes(t: &LayerTable, a: &[u32; 4], b: &[u32; 4]) -> [[u32; 4]; 3] {
        let mut out: [[u32; 4]; 3] = [[0u32; 4]; 3];
        unsafe {
            let m: ModulusAvx = ModulusAvx::new(t);
            let (va, vb) = (load4(a), load4(b));
            store4(&mut out[0], m.add(va, vb));
            store4(&mut out[1], m.sub(va, vb));
            store4(&mut out[2], m.mul(va, vb));
        }
        out
    }

    #[test]
    fn lanes_match_scalar_arithmetic() {
        if !std::arch::is_x86_feature_detected!("avx2") {
            eprintln!("skipping: avx2 not detected");
            return;
        }
        let mut source: Source = Source::new([11u8; 32]);
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
