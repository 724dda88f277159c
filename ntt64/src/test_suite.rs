//! Backend-generic test bodies.
//!
//! Every function takes a backend value and panics on the first mismatch.
//! Instantiate them per backend with [`backend_test_suite!`] and against the
//! scalar reference with [`cross_backend_test_suite!`]. Randomness comes
//! from fixed-seed [`Source`]s so a failure reproduces exactly.

use sampling::Source;

use crate::{
    N, Poly,
    backend::NttBackend,
    layer::{Layer, LayerTable},
    reference::negacyclic_mul_schoolbook,
};

/// Random polynomials per layer in the round-trip and cross-backend tests.
pub const RANDOM_TRIALS: usize = 1000;

/// Random pairs per layer in the convolution test.
pub const CONVOLUTION_TRIALS: usize = 64;

fn random_poly(source: &mut Source, layer: Layer) -> Poly {
    let mut poly: Poly = [0u32; N];
    source.fill_uniform(&mut poly, layer.modulus());
    poly
}

/// `inverse(forward(p)) == p` and `forward(inverse(p)) == p`.
pub fn test_roundtrip<B: NttBackend>(backend: &B) {
    let mut root: Source = Source::new([0u8; 32]);
    for layer in Layer::ALL {
        let (seed, mut source) = root.branch();
        for trial in 0..RANDOM_TRIALS {
            let p: Poly = random_poly(&mut source, layer);

            let mut a: Poly = p;
            backend.forward(&mut a, layer);
            assert!(a.iter().all(|&c| c < layer.modulus()), "{}: forward output not reduced", layer);
            backend.inverse(&mut a, layer);
            assert_eq!(a, p, "{layer}: inverse(forward) trial {trial} seed {seed:?} on {}", backend.name());

            let mut b: Poly = p;
            backend.inverse(&mut b, layer);
            assert!(b.iter().all(|&c| c < layer.modulus()), "{}: inverse output not reduced", layer);
            backend.forward(&mut b, layer);
            assert_eq!(b, p, "{layer}: forward(inverse) trial {trial} seed {seed:?} on {}", backend.name());
        }
    }
}

/// `inverse(forward(a) ⊙ forward(b))` equals the schoolbook negacyclic product.
pub fn test_convolution<B: NttBackend>(backend: &B) {
    let mut source: Source = Source::new([1u8; 32]);
    for layer in Layer::ALL {
        for _ in 0..CONVOLUTION_TRIALS {
            let a: Poly = random_poly(&mut source, layer);
            let b: Poly = random_poly(&mut source, layer);

            let mut want: Poly = [0u32; N];
            negacyclic_mul_schoolbook(&mut want, &a, &b, layer);

            let mut a_hat: Poly = a;
            let mut b_hat: Poly = b;
            backend.forward(&mut a_hat, layer);
            backend.forward(&mut b_hat, layer);
            let mut have: Poly = [0u32; N];
            backend.pointwise_mul(&mut have, &a_hat, &b_hat, layer);
            backend.inverse(&mut have, layer);
            assert_eq!(have, want, "{}: convolution on {}", layer, backend.name());

            let mut fused: Poly = [0u32; N];
            backend.negacyclic_mul(&mut fused, &a, &b, layer);
            assert_eq!(fused, want, "{}: negacyclic_mul on {}", layer, backend.name());
        }
    }
}

/// Zero, all `q-1`, alternating `0/q-1`, the unit impulse, and linearity.
pub fn test_edge_cases<B: NttBackend>(backend: &B) {
    let mut source: Source = Source::new([2u8; 32]);
    for layer in Layer::ALL {
        let t: &LayerTable = layer.table();
        let q: u32 = t.q;

        let mut zero: Poly = [0u32; N];
        backend.forward(&mut zero, layer);
        assert_eq!(zero, [0u32; N], "{layer}: forward(0)");
        backend.inverse(&mut zero, layer);
        assert_eq!(zero, [0u32; N], "{layer}: inverse(0)");

        let max: Poly = [q - 1; N];
        let alternating: Poly = std::array::from_fn(|i| if i & 1 == 1 { q - 1 } else { 0 });
        for p in [max, alternating] {
            let mut a: Poly = p;
            backend.forward(&mut a, layer);
            backend.inverse(&mut a, layer);
            assert_eq!(a, p, "{layer}: structured round-trip");
        }

        // a constant polynomial evaluates to itself everywhere
        let mut impulse: Poly = [0u32; N];
        impulse[0] = 1;
        backend.forward(&mut impulse, layer);
        assert_eq!(impulse, [1u32; N], "{layer}: forward(1)");

        // X evaluates to ψ^(2k+1) at slot k
        let mut x: Poly = [0u32; N];
        x[1] = 1;
        backend.forward(&mut x, layer);
        for (k, &v) in x.iter().enumerate() {
            assert_eq!(v, t.pow_mod(t.psi, 2 * k as u32 + 1), "{layer}: forward(X)[{k}]");
        }

        let a: Poly = random_poly(&mut source, layer);
        let b: Poly = random_poly(&mut source, layer);
        let mut sum: Poly = std::array::from_fn(|i| t.add_mod(a[i], b[i]));
        let (mut a_hat, mut b_hat) = (a, b);
        backend.forward(&mut sum, layer);
        backend.forward(&mut a_hat, layer);
        backend.forward(&mut b_hat, layer);
        for i in 0..N {
            assert_eq!(sum[i], t.add_mod(a_hat[i], b_hat[i]), "{layer}: linearity at {i}");
        }
    }
}

/// Out-of-place and in-place pointwise products against scalar `mul_mod`.
pub fn test_pointwise<B: NttBackend>(backend: &B) {
    let mut source: Source = Source::new([3u8; 32]);
    for layer in Layer::ALL {
        let t: &LayerTable = layer.table();
        for _ in 0..64 {
            let a: Poly = random_poly(&mut source, layer);
            let b: Poly = random_poly(&mut source, layer);
            let want: Poly = std::array::from_fn(|i| t.mul_mod(a[i], b[i]));

            let mut res: Poly = [0u32; N];
            backend.pointwise_mul(&mut res, &a, &b, layer);
            assert_eq!(res, want, "{layer}: pointwise_mul on {}", backend.name());

            let mut acc: Poly = a;
            backend.pointwise_mul_inplace(&mut acc, &b, layer);
            assert_eq!(acc, want, "{layer}: pointwise_mul_inplace on {}", backend.name());
        }
        let max: Poly = [t.q - 1; N];
        let mut res: Poly = [0u32; N];
        backend.pointwise_mul(&mut res, &max, &max, layer);
        assert_eq!(res, [1u32; N], "{layer}: (q-1)^2");
    }
}

/// `test` produces exactly the outputs of `reference` on random inputs.
pub fn test_cross_backend<R: NttBackend, T: NttBackend>(reference: &R, test: &T) {
    let mut root: Source = Source::new([4u8; 32]);
    for layer in Layer::ALL {
        // one child stream per layer: a failure replays from `seed` alone
        let (seed, mut source) = root.branch();
        for trial in 0..RANDOM_TRIALS {
            let p: Poly = random_poly(&mut source, layer);
            let other: Poly = random_poly(&mut source, layer);

            let (mut want, mut have) = (p, p);
            reference.forward(&mut want, layer);
            test.forward(&mut have, layer);
            assert_eq!(want, have, "{layer}: forward trial {trial} seed {seed:?}, {} vs {}", reference.name(), test.name());

            let (mut want, mut have) = (p, p);
            reference.inverse(&mut want, layer);
            test.inverse(&mut have, layer);
            assert_eq!(want, have, "{layer}: inverse trial {trial} seed {seed:?}, {} vs {}", reference.name(), test.name());

            let (mut want, mut have) = ([0u32; N], [0u32; N]);
            reference.pointwise_mul(&mut want, &p, &other, layer);
            test.pointwise_mul(&mut have, &p, &other, layer);
            assert_eq!(want, have, "{layer}: pointwise trial {trial} seed {seed:?}, {} vs {}", reference.name(), test.name());
        }
    }
}

#[macro_export]
macro_rules! backend_test_suite {
    (
        mod $modname:ident,
        backend = $backend:ty,
        tests = {
            $( $(#[$attr:meta])* $test_name:ident => $impl:path ),+ $(,)?
        }
    ) => {
        mod $modname {
            use once_cell::sync::Lazy;

            static BACKEND: Lazy<Option<$backend>> = Lazy::new(<$backend>::try_new);

            $(
                $(#[$attr])*
                #[test]
                fn $test_name() {
                    match BACKEND.as_ref() {
                        Some(backend) => ($impl)(backend),
                        None => eprintln!("skipping: {} not supported on this cpu", stringify!($backend)),
                    }
                }
            )+
        }
    };
}

#[macro_export]
macro_rules! cross_backend_test_suite {
    (
        mod $modname:ident,
        backend_ref = $backend_ref:ty,
        backend_test = $backend_test:ty,
        tests = {
            $( $(#[$attr:meta])* $test_name:ident => $impl:path ),+ $(,)?
        }
    ) => {
        mod $modname {
            use once_cell::sync::Lazy;

            static BACKEND_REF: Lazy<Option<$backend_ref>> = Lazy::new(<$backend_ref>::try_new);
            static BACKEND_TEST: Lazy<Option<$backend_test>> = Lazy::new(<$backend_test>::try_new);

            $(
                $(#[$attr])*
                #[test]
                fn $test_name() {
                    match (BACKEND_REF.as_ref(), BACKEND_TEST.as_ref()) {
                        (Some(reference), Some(test)) => ($impl)(reference, test),
                        _ => eprintln!(
                            "skipping: {} or {} not supported on this cpu",
                            stringify!($backend_ref),
                            stringify!($backend_test)
                        ),
                    }
                }
            )+
        }
    };
}
