use ntt64::{
    Dispatch, Layer, N, NttError, Poly, Preference, add_mod, checked_inv_mod, forward, implementation_name, init,
    inv_mod, inverse, modulus, mul_mod, n_inv, neg_mod, negacyclic_mul_schoolbook, pointwise_mul,
    pointwise_mul_inplace, pow_mod, psi, sub_mod, validate,
};
use sampling::Source;

const FORWARD_X_Q257: Poly = [
    9, 215, 196, 199, 185, 79, 231, 207, 62, 139, 208, 143, 18, 173, 135, 141, 113, 158, 205, 157, 124, 21, 159, 29,
    36, 89, 13, 25, 226, 59, 153, 57, 248, 42, 61, 58, 72, 178, 26, 50, 195, 118, 49, 114, 239, 84, 122, 116, 144, 99,
    52, 100, 133, 236, 98, 228, 221, 168, 244, 232, 31, 198, 104, 200,
];

const FORWARD_RAMP_Q257: Poly = [
    177, 187, 141, 173, 9, 235, 58, 243, 220, 185, 198, 104, 192, 40, 78, 16, 63, 222, 160, 220, 194, 83, 102, 5, 19,
    21, 234, 175, 146, 246, 224, 42, 145, 113, 197, 206, 73, 223, 250, 94, 147, 105, 102, 188, 41, 144, 38, 18, 147,
    212, 39, 67, 187, 23, 19, 126, 113, 241, 70, 29, 139, 62, 254, 0,
];

fn every_dispatch() -> Vec<Dispatch> {
    [Some(Dispatch::scalar()), Dispatch::avx2(), Dispatch::neon()]
        .into_iter()
        .flatten()
        .collect()
}

#[test]
fn known_answers_q257() {
    for ntt in every_dispatch() {
        let mut x: Poly = [0u32; N];
        x[1] = 1;
        ntt.forward(&mut x, Layer::Q257);
        assert_eq!(x, FORWARD_X_Q257, "{}", ntt.name());

        let mut ramp: Poly = std::array::from_fn(|i| i as u32);
        ntt.forward(&mut ramp, Layer::Q257);
        assert_eq!(ramp, FORWARD_RAMP_Q257, "{}", ntt.name());
        ntt.inverse(&mut ramp, Layer::Q257);
        assert_eq!(ramp, std::array::from_fn::<u32, N, _>(|i| i as u32), "{}", ntt.name());
    }
}

#[test]
fn known_answers_largest_layer() {
    for ntt in every_dispatch() {
        let mut x: Poly = [0u32; N];
        x[1] = 1;
        ntt.forward(&mut x, Layer::Q4294955009);
        assert_eq!(x[0], 4270698452, "{}", ntt.name());
        assert_eq!(x[N - 1], 2359155086, "{}", ntt.name());
    }
}

#[test]
fn x_times_x63_is_minus_one() {
    for ntt in every_dispatch() {
        for layer in Layer::ALL {
            let q: u32 = layer.modulus();
            let mut a: Poly = [0u32; N];
            let mut b: Poly = [0u32; N];
            a[1] = 1;
            b[N - 1] = 1;
            let mut res: Poly = [0u32; N];
            ntt.negacyclic_mul(&mut res, &a, &b, layer);
            let mut want: Poly = [0u32; N];
            want[0] = q - 1;
            assert_eq!(res, want, "{layer} on {}", ntt.name());
        }
    }
}

#[test]
fn process_wide_selection() {
    let before: &str = implementation_name();
    assert!(["scalar", "avx2", "neon"].contains(&before));

    let selected: &'static Dispatch = init();
    let expected: Dispatch = Dispatch::with_preference(Preference::from_env());
    assert_eq!(selected.backend(), expected.backend());
    assert_eq!(implementation_name(), selected.name());
    assert!(std::ptr::eq(init(), selected));
    assert_eq!(implementation_name(), init().name());
}

#[test]
fn free_functions_agree_with_scalar() {
    let mut source: Source = Source::new([7u8; 32]);
    let scalar: Dispatch = Dispatch::scalar();
    for layer in Layer::ALL {
        let q: u32 = layer.modulus();
        let mut a: Poly = [0u32; N];
        let mut b: Poly = [0u32; N];
        source.fill_uniform(&mut a, q);
        source.fill_uniform(&mut b, q);

        let (mut have, mut want) = (a, a);
        forward(&mut have, layer);
        scalar.forward(&mut want, layer);
        assert_eq!(have, want, "{layer}");

        inverse(&mut have, layer);
        assert_eq!(have, a, "{layer}");

        let mut prod: Poly = [0u32; N];
        pointwise_mul(&mut prod, &a, &b, layer);
        let mut acc: Poly = a;
        pointwise_mul_inplace(&mut acc, &b, layer);
        assert_eq!(prod, acc, "{layer}");

        let mut fused: Poly = [0u32; N];
        negacyclic_mul_schoolbook(&mut want, &a, &b, layer);
        scalar.negacyclic_mul(&mut fused, &a, &b, layer);
        assert_eq!(fused, want, "{layer}");
    }
}

#[test]
fn field_laws() {
    let mut source: Source = Source::new([8u8; 32]);
    for layer in Layer::ALL {
        let q: u32 = layer.modulus();
        assert_eq!(add_mod(q - 1, 1, layer), 0);
        assert_eq!(sub_mod(0, 1, layer), q - 1);
        assert_eq!(mul_mod(q - 1, q - 1, layer), 1);
        assert_eq!(neg_mod(0, layer), 0);
        assert_eq!(pow_mod(q - 1, 2, layer), 1);
        assert_eq!(inv_mod(1, layer), 1);
        assert_eq!(inv_mod(q - 1, layer), q - 1);
        assert_eq!(checked_inv_mod(0, layer), Err(NttError::ZeroInverse));

        for _ in 0..256 {
            let a: u32 = source.next_nonzero_coeff(q);
            let b: u32 = source.next_coeff(q);
            assert_eq!(sub_mod(add_mod(a, b, layer), b, layer), a, "{layer}");
            assert_eq!(add_mod(a, neg_mod(a, layer), layer), 0, "{layer}");
            assert_eq!(mul_mod(a, b, layer), ((a as u64 * b as u64) % q as u64) as u32, "{layer}");
            assert_eq!(mul_mod(a, inv_mod(a, layer), layer), 1, "{layer}");
            assert_eq!(checked_inv_mod(a, layer), Ok(inv_mod(a, layer)), "{layer}");
        }
    }
}

#[test]
fn layer_accessors() {
    let moduli: [u32; 8] = [257, 3329, 12289, 40961, 64513, 786433, 2013265921, 4294955009];
    let psis: [u32; 8] = [9, 1915, 12149, 19734, 12565, 381732, 397765732, 4270698452];
    for (i, layer) in Layer::ALL.into_iter().enumerate() {
        assert_eq!(Layer::try_from(i), Ok(layer));
        assert_eq!(modulus(layer), moduli[i]);
        assert_eq!(psi(layer), psis[i]);
        assert_eq!(mul_mod(n_inv(layer), 64, layer), 1);
    }
    assert_eq!(Layer::try_from(8usize), Err(NttError::InvalidLayer(8)));
}

#[test]
fn validation() {
    let layer: Layer = Layer::Q3329;
    let mut poly: Poly = [3328u32; N];
    assert_eq!(validate(&poly, layer), Ok(()));
    poly[17] = 3329;
    poly[40] = u32::MAX;
    assert_eq!(
        validate(&poly, layer),
        Err(NttError::CoefficientOutOfRange {
            index: 17,
            value: 3329,
            modulus: 3329
        })
    );
}
