use ntt64::NttRef;
#[cfg(target_arch = "x86_64")]
use ntt64::NttAvx2;
#[cfg(target_arch = "aarch64")]
use ntt64::NttNeon;

ntt64::backend_test_suite! {
    mod scalar,
    backend = super::NttRef,
    tests = {
        roundtrip => ntt64::test_suite::test_roundtrip,
        convolution => ntt64::test_suite::test_convolution,
        edge_cases => ntt64::test_suite::test_edge_cases,
        pointwise => ntt64::test_suite::test_pointwise,
    }
}

#[cfg(target_arch = "x86_64")]
ntt64::backend_test_suite! {
    mod avx2,
    backend = super::NttAvx2,
    tests = {
        roundtrip => ntt64::test_suite::test_roundtrip,
        convolution => ntt64::test_suite::test_convolution,
        edge_cases => ntt64::test_suite::test_edge_cases,
        pointwise => ntt64::test_suite::test_pointwise,
    }
}

#[cfg(target_arch = "x86_64")]
ntt64::cross_backend_test_suite! {
    mod avx2_vs_scalar,
    backend_ref = super::NttRef,
    backend_test = super::NttAvx2,
    tests = {
        bit_identical => ntt64::test_suite::test_cross_backend,
    }
}

#[cfg(target_arch = "aarch64")]
ntt64::backend_test_suite! {
    mod neon,
    backend = super::NttNeon,
    tests = {
        roundtrip => ntt64::test_suite::test_roundtrip,
        convolution => ntt64::test_suite::test_convolution,
        edge_cases => ntt64::test_suite::test_edge_cases,
        pointwise => ntt64::test_suite::test_pointwise,
    }
}

#[cfg(target_arch = "aarch64")]
ntt64::cross_backend_test_suite! {
    mod neon_vs_scalar,
    backend_ref = super::NttRef,
    backend_test = super::NttNeon,
    tests = {
        bit_identical => ntt64::test_suite::test_cross_backend,
    }
}
