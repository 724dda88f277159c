//! Modulus layers and their precomputed constants.
//!
//! Each [`Layer`] selects one prime `q = 1 mod 128` together with a primitive
//! 128th root of unity `ψ`. Every derived constant is evaluated by `const fn`
//! at compile time into the [`LAYERS`] table, so a malformed entry is a
//! build failure rather than a runtime surprise.
//!
//! The moduli and roots below are a fixed, versioned list: transform-domain
//! values produced under one table are meaningless under another. `ψ` is
//! `g^((q-1)/128) mod q` where `g` is the smallest primitive root of `q`.

use std::fmt;

use crate::{LOG_N, N, error::NttError};

/// One of the eight supported modulus configurations.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    Q257 = 0,
    Q3329 = 1,
    Q12289 = 2,
    Q40961 = 3,
    Q64513 = 4,
    Q786433 = 5,
    Q2013265921 = 6,
    Q4294955009 = 7,
}

impl Layer {
    pub const COUNT: usize = 8;

    /// All layers in index order.
    pub const ALL: [Layer; Layer::COUNT] = [
        Layer::Q257,
        Layer::Q3329,
        Layer::Q12289,
        Layer::Q40961,
        Layer::Q64513,
        Layer::Q786433,
        Layer::Q2013265921,
        Layer::Q4294955009,
    ];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline(always)]
    pub fn table(self) -> &'static LayerTable {
        &LAYERS[self as usize]
    }

    #[inline(always)]
    pub fn modulus(self) -> u32 {
        self.table().q
    }

    /// Primitive 128th root of unity of this layer.
    #[inline(always)]
    pub fn psi(self) -> u32 {
        self.table().psi
    }

    /// `64^-1 mod q`.
    #[inline(always)]
    pub fn n_inv(self) -> u32 {
        self.table().n_inv
    }
}

impl TryFrom<usize> for Layer {
    type Error = NttError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Layer::ALL.get(index).copied().ok_or(NttError::InvalidLayer(index))
    }
}

impl TryFrom<u8> for Layer {
    type Error = NttError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Layer::try_from(index as usize)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer {} (q = {})", self.index(), self.modulus())
    }
}

/// Returns the modulus of `layer`.
#[inline(always)]
pub fn modulus(layer: Layer) -> u32 {
    layer.modulus()
}

#[inline(always)]
pub fn psi(layer: Layer) -> u32 {
    layer.psi()
}

#[inline(always)]
pub fn n_inv(layer: Layer) -> u32 {
    layer.n_inv()
}

/// Per-layer constants, all reduced modulo `q`.
#[derive(Debug)]
pub struct LayerTable {
    /// The prime modulus.
    pub q: u32,
    /// Primitive 128th root of unity.
    pub psi: u32,
    pub psi_inv: u32,
    /// `64^-1 mod q`.
    pub n_inv: u32,
    /// Barrett constant `floor(2^64 / q)`.
    pub barrett: u64,
    /// `psi_powers[i] = ψ^i`.
    pub psi_powers: [u32; N],
    /// `psi_inv_powers[i] = ψ^-i`.
    pub psi_inv_powers: [u32; N],
    /// Forward stage roots: `twiddles_fwd[s] = ω^(64 / 2^(s+1))`, a primitive `2^(s+1)`-th root.
    pub twiddles_fwd: [u32; LOG_N],
    /// Inverses of `twiddles_fwd`.
    pub twiddles_inv: [u32; LOG_N],
    /// Powers of the forward stage roots, stage after stage: stage `s`
    /// occupies `[2^s - 1, 2^(s+1) - 1)` and holds `twiddles_fwd[s]^j` for `j < 2^s`.
    pub stage_fwd: [u32; N - 1],
    /// Same layout as `stage_fwd`, built from `twiddles_inv`.
    pub stage_inv: [u32; N - 1],
}

const fn mul_const(a: u64, b: u64, q: u64) -> u64 {
    (a * b) % q
}

const fn pow_const(mut x: u64, mut e: u64, q: u64) -> u64 {
    let mut y: u64 = 1;
    while e > 0 {
        if e & 1 == 1 {
            y = mul_const(y, x, q);
        }
        x = mul_const(x, x, q);
        e >>= 1;
    }
    y
}

const fn power_table(root: u64, q: u64) -> [u32; N] {
    let mut table: [u32; N] = [0u32; N];
    let mut w: u64 = 1;
    let mut i: usize = 0;
    while i < N {
        table[i] = w as u32;
        w = mul_const(w, root, q);
        i += 1;
    }
    table
}

const fn stage_roots(omega: u64, q: u64) -> [u32; LOG_N] {
    let mut roots: [u32; LOG_N] = [0u32; LOG_N];
    let mut s: usize = 0;
    while s < LOG_N {
        roots[s] = pow_const(omega, (N >> (s + 1)) as u64, q) as u32;
        s += 1;
    }
    roots
}

const fn stage_powers(roots: &[u32; LOG_N], q: u64) -> [u32; N - 1] {
    let mut table: [u32; N - 1] = [0u32; N - 1];
    let mut s: usize = 0;
    while s < LOG_N {
        let half: usize = 1 << s;
        let mut w: u64 = 1;
        let mut j: usize = 0;
        while j < half {
            table[half - 1 + j] = w as u32;
            w = mul_const(w, roots[s] as u64, q);
            j += 1;
        }
        s += 1;
    }
    table
}

impl LayerTable {
    /// Derives every constant from `(q, ψ)`. Panics, at compile time when
    /// used in a `static`, if `q` is not `1 mod 128` or `ψ^64 != -1`.
    pub const fn new(q: u32, psi: u32) -> Self {
        let q64: u64 = q as u64;

        assert!(q64 > 2 && q64 % (2 * N as u64) == 1, "modulus must be 1 mod 128");
        assert!((psi as u64) < q64, "psi must be reduced");
        assert!(pow_const(psi as u64, N as u64, q64) == q64 - 1, "psi^64 must be -1");
        assert!(pow_const(psi as u64, 2 * N as u64, q64) == 1, "psi^128 must be 1");

        let psi_inv: u64 = pow_const(psi as u64, q64 - 2, q64);
        let omega: u64 = mul_const(psi as u64, psi as u64, q64);
        let omega_inv: u64 = mul_const(psi_inv, psi_inv, q64);

        let twiddles_fwd: [u32; LOG_N] = stage_roots(omega, q64);
        let twiddles_inv: [u32; LOG_N] = stage_roots(omega_inv, q64);

        LayerTable {
            q,
            psi,
            psi_inv: psi_inv as u32,
            n_inv: pow_const(N as u64, q64 - 2, q64) as u32,
            barrett: ((1u128 << 64) / q64 as u128) as u64,
            psi_powers: power_table(psi as u64, q64),
            psi_inv_powers: power_table(psi_inv, q64),
            twiddles_fwd,
            twiddles_inv,
            stage_fwd: stage_powers(&twiddles_fwd, q64),
            stage_inv: stage_powers(&twiddles_inv, q64),
        }
    }

    /// Twiddles of stage `s`: `stage_fwd[2^s - 1 .. 2^(s+1) - 1]`.
    #[inline(always)]
    pub fn stage_fwd(&self, s: usize) -> &[u32] {
        &self.stage_fwd[(1 << s) - 1..(2 << s) - 1]
    }

    #[inline(always)]
    pub fn stage_inv(&self, s: usize) -> &[u32] {
        &self.stage_inv[(1 << s) - 1..(2 << s) - 1]
    }
}

/// Constant tables, indexed by [`Layer::index`].
pub static LAYERS: [LayerTable; Layer::COUNT] = [
    LayerTable::new(257, 9),
    LayerTable::new(3329, 1915),
    LayerTable::new(12289, 12149),
    LayerTable::new(40961, 19734),
    LayerTable::new(64513, 12565),
    LayerTable::new(786433, 381732),
    LayerTable::new(2013265921, 397765732),
    LayerTable::new(4294955009, 4270698452),
];
