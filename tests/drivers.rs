//! Driver block-schedule tests: boundary lengths, masked tails and in-place
//! aliasing across the whole unary surface.

use lanemath::{
    vdatan, vdatan_mut, vdcos, vdcos_mut, vderf, vderf_mut, vdexp, vdexp2, vdexp2_mut, vdexp_mut,
    vdln, vdln_mut, vdlog2, vdlog2_mut, vdsin, vdsin_mut, vdsqrt, vdsqrt_mut, vdtan, vdtan_mut,
    vsexp, SimdMath,
};

/// Lengths around the 4-lane (f64) and 8-lane (f32) block boundaries.
const LENGTHS: [usize; 10] = [0, 1, 3, 4, 5, 7, 8, 9, 31, 1003];

fn inputs(n: usize) -> Vec<f64> {
    (0..n).map(|i| (i as f64) * 0.173 - 50.0).collect()
}

#[test]
fn test_unary_drivers_at_boundary_lengths() {
    type Driver = fn(&[f64], &mut [f64]) -> lanemath::Result<()>;
    let cases: [(Driver, fn(f64) -> f64, f64); 6] = [
        (vdexp, f64::exp, 1e-13),
        (vdsin, f64::sin, 1e-13),
        (vdcos, f64::cos, 1e-13),
        (vdatan, f64::atan, 1e-13),
        (vdsqrt, f64::sqrt, 0.0),
        (vdexp2, f64::exp2, 1e-13),
    ];

    for n in LENGTHS {
        let x: Vec<f64> = inputs(n).iter().map(|v| v.abs() * 0.01).collect();
        for (driver, reference, tol) in cases {
            let mut out = vec![0.0f64; n];
            driver(&x, &mut out).unwrap();
            for (&x, &y) in x.iter().zip(out.iter()) {
                let expected = reference(x);
                let err = (y - expected).abs();
                let scale = expected.abs().max(1.0);
                assert!(
                    err <= tol * scale,
                    "n={n}: f({x}) = {y}, expected {expected}"
                );
            }
        }
    }
}

#[test]
fn test_log_drivers_at_boundary_lengths() {
    for n in LENGTHS {
        let x: Vec<f64> = (0..n).map(|i| 0.5 + i as f64 * 0.37).collect();

        let mut ln_out = vec![0.0f64; n];
        let mut log2_out = vec![0.0f64; n];
        vdln(&x, &mut ln_out).unwrap();
        vdlog2(&x, &mut log2_out).unwrap();

        for i in 0..n {
            assert!((ln_out[i] - x[i].ln()).abs() < 1e-13 * x[i].ln().abs().max(1.0));
            assert!((log2_out[i] - x[i].log2()).abs() < 1e-13 * x[i].log2().abs().max(1.0));
        }
    }
}

/// The masked short path must not write past the logical length.
#[test]
fn test_output_past_length_is_untouched() {
    for n in [1usize, 2, 3] {
        let x = vec![1.0f64; n];
        let mut backing = vec![-7.0f64; 8];
        vdexp(&x, &mut backing[..n]).unwrap();
        assert!(
            backing[n..].iter().all(|&v| v == -7.0),
            "n={n}: tail overwritten: {backing:?}"
        );
    }

    for n in [1usize, 5, 7] {
        let x = vec![1.0f32; n];
        let mut backing = vec![-7.0f32; 16];
        vsexp(&x, &mut backing[..n]).unwrap();
        assert!(backing[n..].iter().all(|&v| v == -7.0), "n={n}");
    }
}

/// Every `_mut` form must agree bit for bit with its two-buffer driver.
#[test]
fn test_in_place_forms_are_bitwise_identical() {
    type Driver = fn(&[f64], &mut [f64]) -> lanemath::Result<()>;
    type DriverMut = fn(&mut [f64]);
    let pairs: [(Driver, DriverMut); 10] = [
        (vdexp, vdexp_mut),
        (vdexp2, vdexp2_mut),
        (vdln, vdln_mut),
        (vdlog2, vdlog2_mut),
        (vdsin, vdsin_mut),
        (vdcos, vdcos_mut),
        (vdtan, vdtan_mut),
        (vdatan, vdatan_mut),
        (vdsqrt, vdsqrt_mut),
        (vderf, vderf_mut),
    ];

    for n in LENGTHS {
        let x: Vec<f64> = (0..n).map(|i| 0.01 + i as f64 * 0.093).collect();
        for (driver, driver_mut) in pairs {
            let mut out = vec![0.0f64; n];
            driver(&x, &mut out).unwrap();

            let mut buf = x.clone();
            driver_mut(&mut buf);

            for (a, b) in out.iter().zip(buf.iter()) {
                assert_eq!(a.to_bits(), b.to_bits(), "n={n}");
            }
        }
    }
}

#[test]
fn test_allocating_methods_cover_surface() {
    let x: Vec<f64> = (1..=13).map(|i| i as f64 * 0.2).collect();

    assert_eq!(x.exp().len(), 13);
    assert_eq!(x.ln().len(), 13);
    assert_eq!(x.sin().len(), 13);
    assert_eq!(x.sqrt().len(), 13);
    assert_eq!(x.erf().len(), 13);

    let y = x.tan();
    for (&x, &t) in x.iter().zip(y.iter()) {
        assert!((t - x.tan()).abs() < 1e-12 * x.tan().abs().max(1.0));
    }

    let empty: Vec<f64> = vec![];
    assert!(empty.exp().is_empty());

    let xf: Vec<f32> = vec![0.0, 0.5, 1.0];
    let yf = xf.atan();
    assert!((yf[2] - std::f32::consts::FRAC_PI_4).abs() < 1e-6);
}
