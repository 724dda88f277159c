//! Scalar reference transform.
//!
//! This is the correctness oracle every vector kernel is compared against,
//! and the fallback that is always compiled in.
//!
//! Forward: twist by `ψ^i`, bit-reverse, then six Cooley-Tukey stages with
//! the stage roots of `ω = ψ²`. The output is in natural order.
//!
//! Inverse: six Gentleman-Sande stages with the inverse stage roots, bit
//! reversal, then scaling by `64^-1` and untwisting by `ψ^-i`.
//!
//! The sequence of operations and memory addresses depends only on the
//! layer, never on coefficient values.

use itertools::izip;

use crate::{
    LOG_N, N, Poly,
    error::NttError,
    layer::{Layer, LayerTable},
};

#[inline(always)]
const fn reverse_bits_msb(i: usize, n: u32) -> usize {
    i.reverse_bits() >> (usize::BITS - n)
}

/// `BIT_REVERSE[i]` is `i` with its 6 low bits reversed.
pub const BIT_REVERSE: [u8; N] = {
    let mut table: [u8; N] = [0u8; N];
    let mut i: usize = 0;
    while i < N {
        table[i] = reverse_bits_msb(i, LOG_N as u32) as u8;
        i += 1;
    }
    table
};

/// Applies the bit-reversal permutation in place.
#[inline(always)]
pub fn bit_reverse(poly: &mut Poly) {
    for i in 0..N {
        let j: usize = BIT_REVERSE[i] as usize;
        if i < j {
            poly.swap(i, j);
        }
    }
}

/// Multiplies `poly[i]` by `powers[i]`.
#[inline(always)]
pub(crate) fn twist_ref(poly: &mut Poly, powers: &[u32; N], t: &LayerTable) {
    izip!(poly.iter_mut(), powers.iter()).for_each(|(a, &w)| *a = t.mul_mod(*a, w));
}

pub fn ntt_forward_ref(poly: &mut Poly, layer: Layer) {
    let t: &LayerTable = layer.table();

    twist_ref(poly, &t.psi_powers, t);
    bit_reverse(poly);

    for s in 0..LOG_N {
        let half: usize = 1 << s;
        let twiddles: &[u32] = t.stage_fwd(s);
        for block in poly.chunks_exact_mut(half << 1) {
            let (lo, hi) = block.split_at_mut(half);
            izip!(lo.iter_mut(), hi.iter_mut(), twiddles.iter()).for_each(|(a, b, &w)| {
                let u: u32 = *a;
                let v: u32 = t.mul_mod(*b, w);
                *a = t.add_mod(u, v);
                *b = t.sub_mod(u, v);
            });
        }
    }
}

pub fn ntt_inverse_ref(poly: &mut Poly, layer: Layer) {
    let t: &LayerTable = layer.table();

    for s in (0..LOG_N).rev() {
        let half: usize = 1 << s;
        let twiddles: &[u32] = t.stage_inv(s);
        for block in poly.chunks_exact_mut(half << 1) {
            let (lo, hi) = block.split_at_mut(half);
            izip!(lo.iter_mut(), hi.iter_mut(), twiddles.iter()).for_each(|(a, b, &w)| {
                let u: u32 = *a;
                let v: u32 = *b;
                *a = t.add_mod(u, v);
                *b = t.mul_mod(t.sub_mod(u, v), w);
            });
        }
    }

    bit_reverse(poly);

    poly.iter_mut().for_each(|a| *a = t.mul_mod(*a, t.n_inv));
    twist_ref(poly, &t.psi_inv_powers, t);
}

pub fn pointwise_mul_ref(res: &mut Poly, a: &Poly, b: &Poly, layer: Layer) {
    let t: &LayerTable = layer.table();
    izip!(res.iter_mut(), a.iter(), b.iter()).for_each(|(r, &x, &y)| *r = t.mul_mod(x, y));
}

pub fn pointwise_mul_inplace_ref(res: &mut Poly, a: &Poly, layer: Layer) {
    let t: &LayerTable = layer.table();
    izip!(res.iter_mut(), a.iter()).for_each(|(r, &x)| *r = t.mul_mod(*r, x));
}

/// Negacyclic product `a * b mod (X^64 + 1)` by the O(N²) schoolbook method.
///
/// Terms whose degree reaches 64 wrap around with a sign flip.
pub fn negacyclic_mul_schoolbook(res: &mut Poly, a: &Poly, b: &Poly, layer: Layer) {
    let t: &LayerTable = layer.table();
    res.fill(0);
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            let p: u32 = t.mul_mod(x, y);
            let k: usize = i + j;
            if k < N {
                res[k] = t.add_mod(res[k], p);
            } else {
                res[k - N] = t.sub_mod(res[k - N], p);
            }
        }
    }
}

/// Checks that every coefficient of `poly` is reduced modulo the layer's modulus.
///
/// Harness-side validation: it returns at the first offending index and is
/// therefore not constant-time.
pub fn validate(poly: &[u32; N], layer: Layer) -> Result<(), NttError> {
    let q: u32 = layer.modulus();
    match poly.iter().position(|&c| c >= q) {
        Some(index) => Err(NttError::CoefficientOutOfRange {
            index,
            value: poly[index],
            modulus: q,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sampling::Source;

    #[test]
    fn bit_reverse_is_involution() {
        let mut a: Poly = std::array::from_fn(|i| i as u32);
        bit_reverse(&mut a);
        assert_eq!(a[1], 32);
        assert_eq!(a[3], 48);
        assert_eq!(a[63], 63);
        bit_reverse(&mut a);
        assert!(a.iter().enumerate().all(|(i, &x)| x == i as u32));
    }

    #[test]
    fn forward_evaluates_at_odd_powers_of_psi() {
        let mut source: Source = Source::new([3u8; 32]);
        for layer in Layer::ALL {
            let t: &LayerTable = layer.table();
            let mut a: Poly = [0u32; N];
            source.fill_uniform(&mut a, t.q);
            let mut hat: Poly = a;
            ntt_forward_ref(&mut hat, layer);
            for (k, &h) in hat.iter().enumerate() {
                let x: u32 = t.pow_mod(t.psi, (2 * k + 1) as u32);
                // Horner evaluation of a at ψ^(2k+1)
                let eval: u32 = a.iter().rev().fold(0u32, |acc, &c| t.add_mod(t.mul_mod(acc, x), c));
                assert_eq!(h, eval, "{layer} k={k}");
            }
        }
    }

    #[test]
    fn inverse_undoes_forward() {
        let mut source: Source = Source::new([4u8; 32]);
        for layer in Layer::ALL {
            let mut a: Poly = [0u32; N];
            source.fill_uniform(&mut a, layer.modulus());
            let mut b: Poly = a;
            ntt_forward_ref(&mut b, layer);
            ntt_inverse_ref(&mut b, layer);
            assert_eq!(a, b, "{layer}");
        }
    }

    #[test]
    fn schoolbook_wraps_with_sign() {
        let layer: Layer = Layer::Q257;
        let mut x63: Poly = [0u32; N];
        x63[63] = 1;
        let mut x1: Poly = [0u32; N];
        x1[1] = 1;
        let mut res: Poly = [0u32; N];
        // X^63 * X = X^64 = -1
        negacyclic_mul_schoolbook(&mut res, &x63, &x1, layer);
        assert_eq!(res[0], 256);
        assert!(res[1..].iter().all(|&c| c == 0));
    }

    #[test]
    fn pointwise_inplace_matches_out_of_place() {
        let mut source: Source = Source::new([5u8; 32]);
        let layer: Layer = Layer::Q786433;
        let mut a: Poly = [0u32; N];
        let mut b: Poly = [0u32; N];
        source.fill_uniform(&mut a, layer.modulus());
        source.fill_uniform(&mut b, layer.modulus());
        let mut res: Poly = [0u32; N];
        pointwise_mul_ref(&mut res, &a, &b, layer);
        pointwise_mul_inplace_ref(&mut a, &b, layer);
        assert_eq!(res, a);
    }

    #[test]
    fn validate_reports_first_offender() {
        let mut a: Poly = [0u32; N];
        assert_eq!(validate(&a, Layer::Q257), Ok(()));
        a[5] = 257;
        a[9] = 300;
        assert_eq!(
            validate(&a, Layer::Q257),
            Err(NttError::CoefficientOutOfRange {
                index: 5,
                value: 257,
                modulus: 257
            })
        );
        assert_eq!(validate(&a, Layer::Q3329), Ok(()));
    }
}
