//! One [`NttBackend`] implementation per instruction set.
//!
//! A vector backend value can only be obtained through its `try_new`
//! constructor, which performs the runtime feature check. Holding one is
//! therefore proof that its kernels may run on this CPU.

use crate::{
    Poly,
    layer::Layer,
    reference::{ntt_forward_ref, ntt_inverse_ref, pointwise_mul_inplace_ref, pointwise_mul_ref},
};

pub trait NttBackend {
    /// Lowercase diagnostic name.
    fn name(&self) -> &'static str;

    /// Coefficient domain to evaluation domain, in place.
    fn forward(&self, poly: &mut Poly, layer: Layer);

    /// Exact inverse of [`NttBackend::forward`], in place.
    fn inverse(&self, poly: &mut Poly, layer: Layer);

    /// `res[i] = a[i] * b[i] mod q`.
    fn pointwise_mul(&self, res: &mut Poly, a: &Poly, b: &Poly, layer: Layer);

    /// `res[i] = res[i] * a[i] mod q`.
    fn pointwise_mul_inplace(&self, res: &mut Poly, a: &Poly, layer: Layer);

    /// Negacyclic product `a * b mod (X^64 + 1, q)` through the transform.
    fn negacyclic_mul(&self, res: &mut Poly, a: &Poly, b: &Poly, layer: Layer) {
        let mut b_hat: Poly = *b;
        *res = *a;
        self.forward(res, layer);
        self.forward(&mut b_hat, layer);
        self.pointwise_mul_inplace(res, &b_hat, layer);
        self.inverse(res, layer);
    }
}

/// Portable scalar backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct NttRef;

impl NttRef {
    pub fn try_new() -> Option<Self> {
        Some(NttRef)
    }
}

impl NttBackend for NttRef {
    fn name(&self) -> &'static str {
        "scalar"
    }

    #[inline(always)]
    fn forward(&self, poly: &mut Poly, layer: Layer) {
        ntt_forward_ref(poly, layer)
    }

    #[inline(always)]
    fn inverse(&self, poly: &mut Poly, layer: Layer) {
        ntt_inverse_ref(poly, layer)
    }

    #[inline(always)]
    fn pointwise_mul(&self, res: &mut Poly, a: &Poly, b: &Poly, layer: Layer) {
        pointwise_mul_ref(res, a, b, layer)
    }

    #[inline(always)]
    fn pointwise_mul_inplace(&self, res: &mut Poly, a: &Poly, layer: Layer) {
        pointwise_mul_inplace_ref(res, a, layer)
    }
}

/// AVX2 backend. Only constructible on CPUs that report AVX2.
#[cfg(target_arch = "x86_64")]
#[derive(Clone, Copy, Debug)]
pub struct NttAvx2 {
    _detected: (),
}

#[cfg(target_arch = "x86_64")]
impl NttAvx2 {
    pub fn try_new() -> Option<Self> {
        std::arch::is_x86_feature_detected!("avx2").then_some(NttAvx2 { _detected: () })
    }
}

#[cfg(target_arch = "x86_64")]
impl NttBackend for NttAvx2 {
    fn name(&self) -> &'static str {
        "avx2"
    }

    #[inline(always)]
    fn forward(&self, poly: &mut Poly, layer: Layer) {
        unsafe { crate::avx2::ntt_forward_avx2(poly, layer) }
    }

    #[inline(always)]
    fn inverse(&self, poly: &mut Poly, layer: Layer) {
        unsafe { crate::avx2::ntt_inverse_avx2(poly, layer) }
    }

    #[inline(always)]
    fn pointwise_mul(&self, res: &mut Poly, a: &Poly, b: &Poly, layer: Layer) {
        unsafe { crate::avx2::pointwise_mul_avx2(res, a, b, layer) }
    }

    #[inline(always)]
    fn pointwise_mul_inplace(&self, res: &mut Poly, a: &Poly, layer: Layer) {
        unsafe { crate::avx2::pointwise_mul_inplace_avx2(res, a, layer) }
    }
}

/// NEON backend. Only constructible on CPUs that report NEON.
#[cfg(target_arch = "aarch64")]
#[derive(Clone, Copy, Debug)]
pub struct NttNeon {
    _detected: (),
}

#[cfg(target_arch = "aarch64")]
impl NttNeon {
    pub fn try_new() -> Option<Self> {
        std::arch::is_aarch64_feature_detected!("neon").then_some(NttNeon { _detected: () })
    }
}

#[cfg(target_arch = "aarch64")]
impl NttBackend for NttNeon {
    fn name(&self) -> &'static str {
        "neon"
    }

    #[inline(always)]
    fn forward(&self, poly: &mut Poly, layer: Layer) {
        unsafe { crate::neon::ntt_forward_neon(poly, layer) }
    }

    #[inline(always)]
    fn inverse(&self, poly: &mut Poly, layer: Layer) {
        unsafe { crate::neon::ntt_inverse_neon(poly, layer) }
    }

    #[inline(always)]
    fn pointwise_mul(&self, res: &mut Poly, a: &Poly, b: &Poly, layer: Layer) {
        unsafe { crate::neon::pointwise_mul_neon(res, a, b, layer) }
    }

    #[inline(always)]
    fn pointwise_mul_inplace(&self, res: &mut Poly, a: &Poly, layer: Layer) {
        unsafe { crate::neon::pointwise_mul_inplace_neon(res, a, layer) }
    }
}
