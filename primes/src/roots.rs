use prime_factorization::Factorization;
use primality_test::is_prime;

/// `x^e mod q` by square-and-multiply over `u128`.
pub fn pow_mod(x: u64, mut e: u64, q: u64) -> u64 {
    let q: u128 = q as u128;
    let mut base: u128 = x as u128 % q;
    let mut acc: u128 = 1 % q;
    while e > 0 {
        if e & 1 == 1 {
            acc = acc * base % q;
        }
        base = base * base % q;
        e >>= 1;
    }
    acc as u64
}

/// Smallest generator of the multiplicative group of `Z_q`, or `None`
/// when `q` is not an odd prime.
pub fn primitive_root(q: u64) -> Option<u64> {
    if q < 3 || !is_prime(q) {
        return None;
    }
    let factors: Vec<u64> = Factorization::run(q - 1)
        .prime_factor_repr()
        .iter()
        .map(|&(p, _)| p)
        .collect();
    (2..q).find(|&g| factors.iter().all(|&p| pow_mod(g, (q - 1) / p, q) != 1))
}

/// `g^((q-1)/2n)` for the smallest generator `g`: a primitive `2n`-th root
/// of unity. `None` when `q` is not prime or `q != 1 mod 2n`.
pub fn negacyclic_psi(q: u64, n: u64) -> Option<u64> {
    let two_n: u64 = n.checked_mul(2)?;
    if two_n == 0 || q % two_n != 1 {
        return None;
    }
    primitive_root(q).map(|g| pow_mod(g, (q - 1) / two_n, q))
}

/// Checks `ψ^n = -1`, `ψ^2n = 1` and `ω^n = 1` for `ω = ψ²`.
pub fn verify_roots(q: u64, psi: u64, n: u64) -> bool {
    if q < 3 || psi >= q {
        return false;
    }
    let omega: u64 = pow_mod(psi, 2, q);
    pow_mod(psi, n, q) == q - 1 && pow_mod(psi, 2 * n, q) == 1 && pow_mod(omega, n, q) == 1
}
