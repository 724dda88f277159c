use primality_test::is_prime;

/// `true` when `q` is prime and `q = 1 mod 2n`.
pub fn is_ntt_friendly(q: u64, n: u64) -> bool {
    debug_assert!(n.is_power_of_two());
    q > 2 && q % (n << 1) == 1 && is_prime(q)
}

/// Ascending primes `q = 1 mod 2n`, starting from `2n + 1`.
pub struct NttFriendlyPrimes {
    next: Option<u64>,
    step: u64,
}

impl NttFriendlyPrimes {
    pub fn new(n: u64) -> Self {
        assert!(n.is_power_of_two(), "n = {n} is not a power of two");
        let step: u64 = n << 1;
        NttFriendlyPrimes {
            next: step.checked_add(1),
            step,
        }
    }

    /// Restarts the search at the first candidate `>= start`.
    pub fn starting_at(n: u64, start: u64) -> Self {
        let mut primes: NttFriendlyPrimes = NttFriendlyPrimes::new(n);
        let step: u64 = primes.step;
        primes.next = match start.saturating_sub(1).div_ceil(step).max(1).checked_mul(step) {
            Some(c) => c.checked_add(1),
            None => None,
        };
        primes
    }
}

impl Iterator for NttFriendlyPrimes {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        while let Some(candidate) = self.next {
            self.next = candidate.checked_add(self.step);
            if is_prime(candidate) {
                return Some(candidate);
            }
        }
        None
    }
}
