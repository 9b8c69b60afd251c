//! Precision and special-value tests for the arctangent drivers.

use lanemath::{vdatan, vsatan};

#[test]
fn test_atan_f64_known_points() {
    use std::f64::consts::{FRAC_PI_4, FRAC_PI_6};

    let x = [
        0.0f64,
        1.0,
        -1.0,
        (std::f64::consts::FRAC_PI_6).tan(),
        0.5,
        2.0,
        -10.0,
        1e6,
    ];
    let mut out = vec![0.0f64; x.len()];
    vdatan(&x, &mut out).unwrap();

    assert_eq!(out[0], 0.0);
    assert!((out[1] - FRAC_PI_4).abs() < 2e-15);
    assert!((out[2] + FRAC_PI_4).abs() < 2e-15);
    assert!((out[3] - FRAC_PI_6).abs() < 2e-15);
    for (&x, &y) in x.iter().zip(out.iter()) {
        assert!((y - x.atan()).abs() < 2e-15, "atan({x}) = {y}");
    }
}

#[test]
fn test_atan_f64_random_sweep() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(21);

    // mix of small, unit-range and huge magnitudes
    let mut inputs: Vec<f64> = (0..1000).map(|_| rng.random_range(-2.0..=2.0)).collect();
    inputs.extend((0..1000).map(|_| rng.random_range(-1e8..=1e8)));

    let mut out = vec![0.0f64; inputs.len()];
    vdatan(&inputs, &mut out).unwrap();

    let mut max_err = 0.0f64;
    for (&x, &y) in inputs.iter().zip(out.iter()) {
        max_err = max_err.max((y - x.atan()).abs());
    }
    println!("atan f64 max absolute error: {max_err:.2e}");
    assert!(max_err < 2e-15);
}

#[test]
fn test_atan_f64_special_values_and_oddness() {
    use std::f64::consts::FRAC_PI_2;

    let x = [f64::INFINITY, f64::NEG_INFINITY, f64::NAN, 0.3, -0.3];
    let mut out = vec![0.0f64; x.len()];
    vdatan(&x, &mut out).unwrap();

    assert_eq!(out[0], FRAC_PI_2);
    assert_eq!(out[1], -FRAC_PI_2);
    assert!(out[2].is_nan());
    assert_eq!(out[3], -out[4]);
}

#[test]
fn test_atan_f32_precision() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(8);
    let mut inputs: Vec<f32> = (0..2000).map(|_| rng.random_range(-5.0..=5.0)).collect();
    inputs.extend_from_slice(&[1e10, -1e10, f32::INFINITY, f32::NEG_INFINITY]);

    let mut out = vec![0.0f32; inputs.len()];
    vsatan(&inputs, &mut out).unwrap();

    for (&x, &y) in inputs.iter().zip(out.iter()) {
        assert!((y - x.atan()).abs() < 1e-6, "atan({x}) = {y}");
    }
}
