use core::arch::x86_64::__m256i;

use crate::{
    LOG_N, N, Poly,
    layer::{Layer, LayerTable},
    reference::bit_reverse,
};

use super::arithmetic::{ModulusAvx, gather4, load4, scatter4, splat, store4};

/// Stages whose butterfly span is below the vector width.
const GATHERED_STAGES: usize = 2;

#[inline(always)]
unsafe fn ct_butterfly(m: &ModulusAvx, a: __m256i, b: __m256i, w: __m256i) -> (__m256i, __m256i) {
    unsafe {
        let v: __m256i = m.mul(b, w);
        (m.add(a, v), m.sub(a, v))
    }
}

#[inline(always)]
unsafe fn gs_butterfly(m: &ModulusAvx, a: __m256i, b: __m256i, w: __m256i) -> (__m256i, __m256i) {
    unsafe { (m.add(a, b), m.mul(m.sub(a, b), w)) }
}

/// One butterfly stage with span `2^s >= 4`: both operands are contiguous.
#[inline(always)]
unsafe fn stage_contiguous<const INVERSE: bool>(poly: &mut Poly, m: &ModulusAvx, twiddles: &[u32], s: usize) {
    let half: usize = 1 << s;
    unsafe {
        for block in poly.chunks_exact_mut(half << 1) {
            let (lo, hi) = block.split_at_mut(half);
            for j in (0..half).step_by(4) {
                let a: __m256i = load4(&lo[j..]);
                let b: __m256i = load4(&hi[j..]);
                let w: __m256i = load4(&twiddles[j..]);
                let (a, b) = if INVERSE {
                    gs_butterfly(m, a, b, w)
                } else {
                    ct_butterfly(m, a, b, w)
                };
                store4(&mut lo[j..], a);
                store4(&mut hi[j..], b);
            }
        }
    }
}

/// One butterfly stage with span `2^s < 4`: four butterflies are packed
/// into the lanes through index loads. The indices depend only on `s`.
#[inline(always)]
unsafe fn stage_gathered<const INVERSE: bool>(poly: &mut Poly, m: &ModulusAvx, twiddles: &[u32], s: usize) {
    let half: usize = 1 << s;
    unsafe {
        for group in 0..N / 8 {
            let mut ia: [usize; 4] = [0usize; 4];
            let mut ib: [usize; 4] = [0usize; 4];
            let mut iw: [usize; 4] = [0usize; 4];
            for lane in 0..4 {
                let butterfly: usize = 4 * group + lane;
                let j: usize = butterfly & (half - 1);
                ia[lane] = ((butterfly >> s) << (s + 1)) + j;
                ib[lane] = ia[lane] + half;
                iw[lane] = j;
            }
            let a: __m256i = gather4(poly, ia);
            let b: __m256i = gather4(poly, ib);
            let w: __m256i = gather4(twiddles, iw);
            let (a, b) = if INVERSE {
                gs_butterfly(m, a, b, w)
            } else {
                ct_butterfly(m, a, b, w)
            };
            scatter4(poly, ia, a);
            scatter4(poly, ib, b);
        }
    }
}

#[inline(always)]
unsafe fn twist(poly: &mut Poly, m: &ModulusAvx, powers: &[u32; N]) {
    unsafe {
        for i in (0..N).step_by(4) {
            let v: __m256i = m.mul(load4(&poly[i..]), load4(&powers[i..]));
            store4(&mut poly[i..], v);
        }
    }
}

/// # Safety
/// Caller must ensure the CPU supports AVX2 (e.g., via `is_x86_feature_detected!("avx2")`).
#[target_feature(enable = "avx2")]
pub unsafe fn ntt_forward_avx2(poly: &mut Poly, layer: Layer) {
    let t: &LayerTable = layer.table();
    unsafe {
        let m: ModulusAvx = ModulusAvx::new(t);

        twist(poly, &m, &t.psi_powers);
        bit_reverse(poly);

        for s in 0..GATHERED_STAGES {
            stage_gathered::<false>(poly, &m, t.stage_fwd(s), s);
        }
        for s in GATHERED_STAGES..LOG_N {
            stage_contiguous::<false>(poly, &m, t.stage_fwd(s), s);
        }
    }
}

/// # Safety
/// Caller must ensure the CPU supports AVX2 (e.g., via `is_x86_feature_detected!("avx2")`).
#[target_feature(enable = "avx2")]
pub unsafe fn ntt_inverse_avx2(poly: &mut Poly, layer: Layer) {
    let t: &LayerTable = layer.table();
    unsafe {
        let m: ModulusAvx = ModulusAvx::new(t);

        for s in (GATHERED_STAGES..LOG_N).rev() {
            stage_contiguous::<true>(poly, &m, t.stage_inv(s), s);
        }
        for s in (0..GATHERED_STAGES).rev() {
            stage_gathered::<true>(poly, &m, t.stage_inv(s), s);
        }

        bit_reverse(poly);

        let n_inv: __m256i = splat(t.n_inv);
        for i in (0..N).step_by(4) {
            let v: __m256i = m.mul(load4(&poly[i..]), n_inv);
            store4(&mut poly[i..], v);
        }
        twist(poly, &m, &t.psi_inv_powers);
    }
}

/// # Safety
/// Caller must ensure the CPU supports AVX2 (e.g., via `is_x86_feature_detected!("avx2")`).
#[target_feature(enable = "avx2")]
pub unsafe fn pointwise_mul_avx2(res: &mut Poly, a: &Poly, b: &Poly, layer: Layer) {
    unsafe {
        let m: ModulusAvx = ModulusAvx::new(layer.table());
        for i in (0..N).step_by(4) {
            store4(&mut res[i..], m.mul(load4(&a[i..]), load4(&b[i..])));
        }
    }
}

/// # Safety
/// Caller must ensure the CPU supports AVX2 (e.g., via `is_x86_feature_detected!("avx2")`).
#[target_feature(enable = "avx2")]
pub unsafe fn pointwise_mul_inplace_avx2(res: &mut Poly, a: &Poly, layer: Layer) {
    unsafe {
        let m: ModulusAvx = ModulusAvx::new(layer.table());
        for i in (0..N).step_by(4) {
            let v: __m256i = m.mul(load4(&res[i..]), load4(&a[i..]));
            store4(&mut res[i..], v);
        }
    }
}
