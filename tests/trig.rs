//! Precision, periodicity and special-value tests for sin, cos and tan.

use lanemath::{vdcos, vdsin, vdtan, vscos, vssin};

#[test]
fn test_sin_f64_known_points() {
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, FRAC_PI_6, PI};

    let x = [
        0.0f64,
        FRAC_PI_6,
        FRAC_PI_4,
        FRAC_PI_2,
        PI,
        -FRAC_PI_2,
        2.0 * PI,
        1.0,
    ];
    let mut out = vec![0.0f64; x.len()];
    vdsin(&x, &mut out).unwrap();

    for (&x, &y) in x.iter().zip(out.iter()) {
        let expected = x.sin();
        assert!(
            (y - expected).abs() < 5e-15,
            "sin({x}) = {y}, expected {expected}"
        );
    }
}

#[test]
fn test_sin_cos_f64_random_sweep() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(1234);
    let inputs: Vec<f64> = (0..2000).map(|_| rng.random_range(-20.0..=20.0)).collect();

    let mut sines = vec![0.0f64; inputs.len()];
    let mut cosines = vec![0.0f64; inputs.len()];
    vdsin(&inputs, &mut sines).unwrap();
    vdcos(&inputs, &mut cosines).unwrap();

    for ((&x, &s), &c) in inputs.iter().zip(sines.iter()).zip(cosines.iter()) {
        assert!((s - x.sin()).abs() < 5e-15, "sin({x}) = {s}");
        assert!((c - x.cos()).abs() < 5e-15, "cos({x}) = {c}");
        // the pair must stay on the unit circle
        assert!((s * s + c * c - 1.0).abs() < 1e-14);
    }
}

#[test]
fn test_sin_f64_large_arguments() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(77);
    let inputs: Vec<f64> = (0..1000).map(|_| rng.random_range(-1e5..=1e5)).collect();

    let mut out = vec![0.0f64; inputs.len()];
    vdsin(&inputs, &mut out).unwrap();

    for (&x, &y) in inputs.iter().zip(out.iter()) {
        // reduction error grows with the ulp of the argument
        assert!((y - x.sin()).abs() < 1e-10, "sin({x}) = {y}");
    }
}

#[test]
fn test_sin_f64_periodicity() {
    use std::f64::consts::PI;

    let base = [0.3f64, 1.7, -2.9, 4.1, 100.25, -3000.75];
    let shifted: Vec<f64> = base.iter().map(|&x| x + 2.0 * PI).collect();

    let mut a = vec![0.0f64; base.len()];
    let mut b = vec![0.0f64; base.len()];
    vdsin(&base, &mut a).unwrap();
    vdsin(&shifted, &mut b).unwrap();

    for ((&x, &s0), &s1) in base.iter().zip(a.iter()).zip(b.iter()) {
        assert!(
            (s0 - s1).abs() < 1e-9,
            "sin({x}) = {s0} but sin(x + 2pi) = {s1}"
        );
    }
}

#[test]
fn test_trig_f64_special_values() {
    let x = [f64::NAN, f64::INFINITY, f64::NEG_INFINITY];
    let mut out = vec![0.0f64; x.len()];

    vdsin(&x, &mut out).unwrap();
    assert!(out.iter().all(|v| v.is_nan()));

    vdcos(&x, &mut out).unwrap();
    assert!(out.iter().all(|v| v.is_nan()));

    vdtan(&x, &mut out).unwrap();
    assert!(out.iter().all(|v| v.is_nan()));
}

#[test]
fn test_tan_f64_matches_ratio_and_is_increasing_near_zero() {
    let x = [0.07f64 - 1e-12, 0.07, 0.07 + 1e-12];
    let mut out = vec![0.0f64; x.len()];
    vdtan(&x, &mut out).unwrap();

    assert!(out[0] < out[1] && out[1] < out[2], "tan not increasing: {out:?}");

    let probe = [0.5f64, 1.0, -1.2, 3.0];
    let mut t = vec![0.0f64; probe.len()];
    vdtan(&probe, &mut t).unwrap();
    for (&x, &y) in probe.iter().zip(t.iter()) {
        let rel = ((y - x.tan()) / x.tan()).abs();
        assert!(rel < 1e-12, "tan({x}) = {y}, expected {}", x.tan());
    }
}

#[test]
fn test_sin_cos_f32_precision() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(3);
    let inputs: Vec<f32> = (0..2000).map(|_| rng.random_range(-50.0..=50.0)).collect();

    let mut sines = vec![0.0f32; inputs.len()];
    let mut cosines = vec![0.0f32; inputs.len()];
    vssin(&inputs, &mut sines).unwrap();
    vscos(&inputs, &mut cosines).unwrap();

    for ((&x, &s), &c) in inputs.iter().zip(sines.iter()).zip(cosines.iter()) {
        assert!((s - x.sin()).abs() < 1e-5, "sin({x}) = {s}");
        assert!((c - x.cos()).abs() < 1e-5, "cos({x}) = {c}");
    }
}
