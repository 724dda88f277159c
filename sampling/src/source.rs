use rand_chacha::{ChaCha8Rng, rand_core::SeedableRng};
use rand_core::RngCore;

/// ChaCha8-backed random source.
pub struct Source {
    source: ChaCha8Rng,
}

impl Source {
    pub fn new(seed: [u8; 32]) -> Source {
        Source {
            source: ChaCha8Rng::from_seed(seed),
        }
    }

    /// Builds a source from a small integer, padding the seed with zeros.
    pub fn from_u64(seed: u64) -> Source {
        let mut bytes: [u8; 32] = [0u8; 32];
        bytes[..8].copy_from_slice(&seed.to_le_bytes());
        Source::new(bytes)
    }

    /// Derives an independent child source and returns it with its seed.
    pub fn branch(&mut self) -> ([u8; 32], Self) {
        let seed: [u8; 32] = self.new_seed();
        (seed, Source::new(seed))
    }

    pub fn new_seed(&mut self) -> [u8; 32] {
        let mut seed: [u8; 32] = [0u8; 32];
        self.fill_bytes(&mut seed);
        seed
    }

    /// Uniform value in [0, max) by rejection sampling under `mask`.
    /// `mask` must cover `max - 1`.
    #[inline(always)]
    pub fn next_u64n(&mut self, max: u64, mask: u64) -> u64 {
        debug_assert!(max > 0 && mask >= max - 1);
        let mut x: u64 = self.next_u64() & mask;
        while x >= max {
            x = self.next_u64() & mask;
        }
        x
    }

    /// Uniform residue in [0, q).
    #[inline(always)]
    pub fn next_coeff(&mut self, q: u32) -> u32 {
        debug_assert!(q > 1);
        let q: u64 = q as u64;
        let mask: u64 = u64::MAX >> (q - 1).leading_zeros();
        self.next_u64n(q, mask) as u32
    }

    /// Fills `coeffs` with independent uniform residues in [0, q).
    pub fn fill_uniform(&mut self, coeffs: &mut [u32], q: u32) {
        coeffs.iter_mut().for_each(|c| *c = self.next_coeff(q));
    }

    /// Uniform residue in [1, q), for operands that must be invertible.
    #[inline(always)]
    pub fn next_nonzero_coeff(&mut self, q: u32) -> u32 {
        debug_assert!(q > 1);
        let max: u64 = q as u64 - 1;
        let mask: u64 = u64::MAX.checked_shr((max - 1).leading_zeros()).unwrap_or(0);
        1 + self.next_u64n(max, mask) as u32
    }
}

impl RngCore for Source {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        self.source.next_u32()
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        self.source.next_u64()
    }

    #[inline(always)]
    fn fill_bytes(&mut self, bytes: &mut [u8]) {
        self.source.fill_bytes(bytes)
    }
}
