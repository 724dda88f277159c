//! CPU feature detection and backend selection.
//!
//! [`Dispatch`] is the strategy value: four operation handles and the tag
//! of the backend they belong to. It is `Copy` and can be threaded through
//! call sites explicitly. The free functions at the bottom of this module
//! offer the same operations through one process-wide selection made by
//! [`init`]; before `init` runs they use the scalar backend.

use std::{
    env::VarError,
    fmt,
    ops::{BitOr, BitOrAssign},
    str::FromStr,
    sync::OnceLock,
};

use tracing::{debug, info, warn};

use crate::{
    Poly,
    backend::NttBackend,
    error::NttError,
    layer::Layer,
    reference::{ntt_forward_ref, ntt_inverse_ref, pointwise_mul_inplace_ref, pointwise_mul_ref},
};

/// Environment variable read by [`init`] to override backend selection.
pub const BACKEND_ENV: &str = "NTT64_BACKEND";

/// Bitmask of vector instruction sets usable by this crate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CpuFeatures(u32);

impl CpuFeatures {
    pub const NONE: CpuFeatures = CpuFeatures(0);
    pub const AVX2: CpuFeatures = CpuFeatures(1 << 0);
    pub const NEON: CpuFeatures = CpuFeatures(1 << 1);

    #[inline(always)]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline(always)]
    pub const fn contains(self, other: CpuFeatures) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline(always)]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for CpuFeatures {
    type Output = CpuFeatures;

    fn bitor(self, rhs: CpuFeatures) -> CpuFeatures {
        CpuFeatures(self.0 | rhs.0)
    }
}

impl BitOrAssign for CpuFeatures {
    fn bitor_assign(&mut self, rhs: CpuFeatures) {
        self.0 |= rhs.0
    }
}

/// Probes the running CPU. Returns [`CpuFeatures::NONE`] on targets with
/// no supported vector extension.
pub fn detect_cpu_features() -> CpuFeatures {
    #[allow(unused_mut)]
    let mut features: CpuFeatures = CpuFeatures::NONE;

    #[cfg(target_arch = "x86_64")]
    if std::arch::is_x86_feature_detected!("avx2") {
        features |= CpuFeatures::AVX2;
    }

    #[cfg(target_arch = "aarch64")]
    if std::arch::is_aarch64_feature_detected!("neon") {
        features |= CpuFeatures::NEON;
    }

    debug!(
        avx2 = features.contains(CpuFeatures::AVX2),
        neon = features.contains(CpuFeatures::NEON),
        "detected cpu features"
    );
    features
}

/// The instruction set a [`Dispatch`] runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    Scalar,
    Avx2,
    Neon,
}

impl Backend {
    pub const fn name(self) -> &'static str {
        match self {
            Backend::Scalar => "scalar",
            Backend::Avx2 => "avx2",
            Backend::Neon => "neon",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Requested backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Preference {
    /// Fastest detected backend: AVX2, then NEON, then scalar.
    #[default]
    Auto,
    Scalar,
    Avx2,
    Neon,
}

impl FromStr for Preference {
    type Err = NttError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Preference::Auto),
            "scalar" => Ok(Preference::Scalar),
            "avx2" => Ok(Preference::Avx2),
            "neon" => Ok(Preference::Neon),
            _ => Err(NttError::InvalidPreference(s.to_string())),
        }
    }
}

impl Preference {
    /// Reads [`BACKEND_ENV`]. Unset means [`Preference::Auto`]; an
    /// unparsable value is logged and also means `Auto`.
    pub fn from_env() -> Self {
        Preference::from_env_value(std::env::var(BACKEND_ENV))
    }

    fn from_env_value(value: Result<String, VarError>) -> Self {
        match value {
            Ok(value) => value.parse().unwrap_or_else(|err: NttError| {
                warn!(%err, "ignoring {BACKEND_ENV}");
                Preference::Auto
            }),
            Err(VarError::NotPresent) => Preference::Auto,
            Err(VarError::NotUnicode(raw)) => {
                warn!(value = ?raw, "ignoring {BACKEND_ENV}: not valid unicode");
                Preference::Auto
            }
        }
    }
}

/// Selected implementation of the transform operations.
#[derive(Clone, Copy)]
pub struct Dispatch {
    backend: Backend,
    forward: fn(&mut Poly, Layer),
    inverse: fn(&mut Poly, Layer),
    pointwise_mul: fn(&mut Poly, &Poly, &Poly, Layer),
    pointwise_mul_inplace: fn(&mut Poly, &Poly, Layer),
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch").field("backend", &self.backend).finish_non_exhaustive()
    }
}

impl Dispatch {
    pub const fn scalar() -> Self {
        Dispatch {
            backend: Backend::Scalar,
            forward: ntt_forward_ref,
            inverse: ntt_inverse_ref,
            pointwise_mul: pointwise_mul_ref,
            pointwise_mul_inplace: pointwise_mul_inplace_ref,
        }
    }

    /// `Some` only when compiled for x86_64 and the CPU reports AVX2.
    #[cfg(target_arch = "x86_64")]
    pub fn avx2() -> Option<Self> {
        use crate::avx2::{ntt_forward_avx2, ntt_inverse_avx2, pointwise_mul_avx2, pointwise_mul_inplace_avx2};

        let _: crate::backend::NttAvx2 = crate::backend::NttAvx2::try_new()?;
        // The handles below are private to this value, which exists only
        // after the feature check above succeeded.
        Some(Dispatch {
            backend: Backend::Avx2,
            forward: |poly, layer| unsafe { ntt_forward_avx2(poly, layer) },
            inverse: |poly, layer| unsafe { ntt_inverse_avx2(poly, layer) },
            pointwise_mul: |res, a, b, layer| unsafe { pointwise_mul_avx2(res, a, b, layer) },
            pointwise_mul_inplace: |res, a, layer| unsafe { pointwise_mul_inplace_avx2(res, a, layer) },
        })
    }

    #[cfg(not(target_arch = "x86_64"))]
    pub fn avx2() -> Option<Self> {
        None
    }

    /// `Some` only when compiled for aarch64 and the CPU reports NEON.
    #[cfg(target_arch = "aarch64")]
    pub fn neon() -> Option<Self> {
        use crate::neon::{ntt_forward_neon, ntt_inverse_neon, pointwise_mul_inplace_neon, pointwise_mul_neon};

        let _: crate::backend::NttNeon = crate::backend::NttNeon::try_new()?;
        Some(Dispatch {
            backend: Backend::Neon,
            forward: |poly, layer| unsafe { ntt_forward_neon(poly, layer) },
            inverse: |poly, layer| unsafe { ntt_inverse_neon(poly, layer) },
            pointwise_mul: |res, a, b, layer| unsafe { pointwise_mul_neon(res, a, b, layer) },
            pointwise_mul_inplace: |res, a, layer| unsafe { pointwise_mul_inplace_neon(res, a, layer) },
        })
    }

    #[cfg(not(target_arch = "aarch64"))]
    pub fn neon() -> Option<Self> {
        None
    }

    /// Best available backend: AVX2, then NEON, then scalar.
    pub fn detect() -> Self {
        Dispatch::with_preference(Preference::Auto)
    }

    /// Honors `preference` when the backend is compiled in and supported;
    /// otherwise falls back to scalar.
    pub fn with_preference(preference: Preference) -> Self {
        let requested: Option<Dispatch> = match preference {
            Preference::Auto => Some(Dispatch::avx2().or_else(Dispatch::neon).unwrap_or_else(Dispatch::scalar)),
            Preference::Scalar => Some(Dispatch::scalar()),
            Preference::Avx2 => Dispatch::avx2(),
            Preference::Neon => Dispatch::neon(),
        };
        match requested {
            Some(dispatch) => {
                debug!(?preference, backend = dispatch.name(), "backend resolved");
                dispatch
            }
            None => {
                warn!(?preference, "requested backend unavailable, using scalar");
                Dispatch::scalar()
            }
        }
    }

    #[inline(always)]
    pub fn backend(&self) -> Backend {
        self.backend
    }

    #[inline(always)]
    pub fn name(&self) -> &'static str {
        self.backend.name()
    }

    #[inline(always)]
    pub fn forward(&self, poly: &mut Poly, layer: Layer) {
        (self.forward)(poly, layer)
    }

    #[inline(always)]
    pub fn inverse(&self, poly: &mut Poly, layer: Layer) {
        (self.inverse)(poly, layer)
    }

    #[inline(always)]
    pub fn pointwise_mul(&self, res: &mut Poly, a: &Poly, b: &Poly, layer: Layer) {
        (self.pointwise_mul)(res, a, b, layer)
    }

    #[inline(always)]
    pub fn pointwise_mul_inplace(&self, res: &mut Poly, a: &Poly, layer: Layer) {
        (self.pointwise_mul_inplace)(res, a, layer)
    }

    /// Negacyclic product `a * b mod (X^64 + 1, q)`.
    pub fn negacyclic_mul(&self, res: &mut Poly, a: &Poly, b: &Poly, layer: Layer) {
        NttBackend::negacyclic_mul(self, res, a, b, layer)
    }
}

impl NttBackend for Dispatch {
    fn name(&self) -> &'static str {
        Dispatch::name(self)
    }

    fn forward(&self, poly: &mut Poly, layer: Layer) {
        Dispatch::forward(self, poly, layer)
    }

    fn inverse(&self, poly: &mut Poly, layer: Layer) {
        Dispatch::inverse(self, poly, layer)
    }

    fn pointwise_mul(&self, res: &mut Poly, a: &Poly, b: &Poly, layer: Layer) {
        Dispatch::pointwise_mul(self, res, a, b, layer)
    }

    fn pointwise_mul_inplace(&self, res: &mut Poly, a: &Poly, layer: Layer) {
        Dispatch::pointwise_mul_inplace(self, res, a, layer)
    }
}

static SCALAR: Dispatch = Dispatch::scalar();
static SELECTED: OnceLock<Dispatch> = OnceLock::new();

/// Selects the process-wide backend on first call, honoring
/// [`BACKEND_ENV`]. Later calls return the same selection.
pub fn init() -> &'static Dispatch {
    SELECTED.get_or_init(|| {
        let dispatch: Dispatch = Dispatch::with_preference(Preference::from_env());
        info!(backend = dispatch.name(), "ntt64 backend selected");
        dispatch
    })
}

#[inline(always)]
fn current() -> &'static Dispatch {
    SELECTED.get().unwrap_or(&SCALAR)
}

/// Name of the process-wide backend: `"scalar"`, `"avx2"` or `"neon"`.
pub fn implementation_name() -> &'static str {
    current().name()
}

#[inline(always)]
pub fn forward(poly: &mut Poly, layer: Layer) {
    current().forward(poly, layer)
}

#[inline(always)]
pub fn inverse(poly: &mut Poly, layer: Layer) {
    current().inverse(poly, layer)
}

/// `res[i] = a[i] * b[i] mod q`. Use [`pointwise_mul_inplace`] when the
/// result should overwrite an operand.
#[inline(always)]
pub fn pointwise_mul(res: &mut Poly, a: &Poly, b: &Poly, layer: Layer) {
    current().pointwise_mul(res, a, b, layer)
}

#[inline(always)]
pub fn pointwise_mul_inplace(res: &mut Poly, a: &Poly, layer: Layer) {
    current().pointwise_mul_inplace(res, a, layer)
}
