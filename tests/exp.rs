//! Precision and special-value tests for the exponential drivers.

use lanemath::{vdexp, vdexp2, vdexp_mut, vsexp, SimdMath};

/// Relative error against the standard library over curated ranges.
#[test]
fn test_exp_f64_precision_comparison() {
    let test_cases = [
        // near zero
        vec![0.0f64, 1e-10, -1e-10, 0.1, -0.1, 0.5],
        // unit range
        vec![1.0f64, -1.0, 2.0, -2.0, std::f64::consts::LN_2],
        // moderate magnitudes
        vec![10.0f64, -10.0, 50.0, -50.0, 100.0, -100.0],
        // close to the overflow/flush thresholds but still normal
        vec![700.0f64, -700.0, 709.0, -708.0],
    ];

    for test_case in &test_cases {
        let mut out = vec![0.0f64; test_case.len()];
        vdexp(test_case, &mut out).unwrap();

        for (&x, &y) in test_case.iter().zip(out.iter()) {
            let expected = x.exp();
            let rel = ((y - expected) / expected).abs();
            assert!(
                rel < 1e-15,
                "exp({x}) = {y:e}, expected {expected:e}, rel error {rel:.2e}"
            );
        }
    }
}

#[test]
fn test_exp_f64_random_sweep() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(42);
    let inputs: Vec<f64> = (0..2000).map(|_| rng.random_range(-700.0..=700.0)).collect();

    let mut out = vec![0.0f64; inputs.len()];
    vdexp(&inputs, &mut out).unwrap();

    let mut max_rel = 0.0f64;
    for (&x, &y) in inputs.iter().zip(out.iter()) {
        let expected = x.exp();
        let rel = ((y - expected) / expected).abs();
        max_rel = max_rel.max(rel);
    }
    println!("exp f64 max relative error over sweep: {max_rel:.2e}");
    assert!(max_rel < 1e-15);
}

#[test]
fn test_exp_f64_special_values() {
    let x = [
        f64::NAN,
        f64::INFINITY,
        f64::NEG_INFINITY,
        710.0,
        -746.0,
        0.0,
        -0.0,
    ];
    let mut out = vec![0.0f64; x.len()];
    vdexp(&x, &mut out).unwrap();

    assert!(out[0].is_nan());
    assert_eq!(out[1], f64::INFINITY);
    assert_eq!(out[2], 0.0);
    assert_eq!(out[3], f64::INFINITY);
    assert_eq!(out[4], 0.0);
    assert_eq!(out[5], 1.0);
    assert_eq!(out[6], 1.0);
}

/// Inputs between the flush threshold and the smallest normal exponent
/// must underflow gradually through the subnormal range.
#[test]
fn test_exp_f64_subnormal_outputs() {
    let x = [-709.0f64, -720.0, -740.0, -744.0];
    let mut out = vec![0.0f64; x.len()];
    vdexp(&x, &mut out).unwrap();

    for (&x, &y) in x.iter().zip(out.iter()) {
        let expected = x.exp();
        assert!(y > 0.0, "exp({x}) flushed to zero");
        // quantization to the subnormal grid dominates; compare in ulps
        let dist = (y.to_bits() as i64 - expected.to_bits() as i64).abs();
        assert!(dist <= 8, "exp({x}) = {y:e}, expected {expected:e}, {dist} ulp apart");
    }
}

#[test]
fn test_exp2_f64_matches_std() {
    let x = [0.0f64, 1.0, -1.0, 10.5, -20.25, 52.0];
    let mut out = vec![0.0f64; x.len()];
    vdexp2(&x, &mut out).unwrap();

    for (&x, &y) in x.iter().zip(out.iter()) {
        let expected = x.exp2();
        let rel = ((y - expected) / expected).abs();
        assert!(rel < 1e-14, "exp2({x}) = {y:e}, expected {expected:e}");
    }
}

#[test]
fn test_exp_f32_precision_and_specials() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(7);
    let mut inputs: Vec<f32> = (0..2000).map(|_| rng.random_range(-80.0..=80.0)).collect();
    inputs.extend_from_slice(&[0.0, 1.0, -1.0, 88.0, -87.0]);

    let mut out = vec![0.0f32; inputs.len()];
    vsexp(&inputs, &mut out).unwrap();

    for (&x, &y) in inputs.iter().zip(out.iter()) {
        let expected = x.exp();
        let rel = ((y - expected) / expected).abs();
        assert!(
            rel < 5e-7,
            "exp({x}) = {y:e}, expected {expected:e}, rel error {rel:.2e}"
        );
    }

    let specials = [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 89.0, -88.0];
    let mut out = vec![0.0f32; specials.len()];
    vsexp(&specials, &mut out).unwrap();
    assert!(out[0].is_nan());
    assert_eq!(out[1], f32::INFINITY);
    assert_eq!(out[2], 0.0);
    assert_eq!(out[3], f32::INFINITY);
    assert_eq!(out[4], 0.0);
}

#[test]
fn test_exp_in_place_is_bitwise_identical() {
    let x: Vec<f64> = (0..131).map(|i| (i as f64) * 0.11 - 7.0).collect();
    let mut out = vec![0.0f64; x.len()];
    vdexp(&x, &mut out).unwrap();

    let mut buf = x.clone();
    vdexp_mut(&mut buf);

    for (a, b) in out.iter().zip(buf.iter()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn test_exp_allocating_method() {
    let x = vec![0.0f64, 1.0, 2.0];
    let y = x.exp();
    assert_eq!(y.len(), 3);
    assert!((y[1] - std::f64::consts::E).abs() < 1e-15);
}
