//! AVX2 math kernels for packed f32 values.
//!
//! Single-precision mirror of `math64`: one `__m256` in, one `__m256` out,
//! branch-free with compare + blend overlays for special values. Polynomial
//! degrees are trimmed to the f32 significand; accuracy targets are a few
//! ulp, with the error function capped at its formula's 1.5e-7 bound.

#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_2, FRAC_PI_4, LN_2, LOG2_E, PI};

use crate::simd::ChebyshevKind;

// ============================================================================
// Exponential
// ============================================================================

/// Inputs at or above this produce +inf: ln(f32::MAX).
const EXP_HI_F: f32 = 88.37626;

/// Inputs at or below this produce 0; the f32 path flushes instead of
/// entering the subnormal range.
const EXP_LO_F: f32 = -87.336544;

/// ln(2) split; the high part is exact in f32.
const LN2_HI_F: f32 = 0.693359375;
const LN2_LO_F: f32 = -2.1219444e-4;

/// Taylor coefficients 1/k!, k = 0..7, for e^r on |r| <= ln(2)/2.
const EXP_POLY_F: [f32; 8] = [
    1.0,
    1.0,
    0.5,
    0.16666667,
    0.041666668,
    0.008333334,
    0.0013888889,
    0.00019841270,
];

/// Evaluates a fixed polynomial in ascending-power coefficient order using
/// fused multiply-add Horner steps.
#[inline(always)]
pub unsafe fn _mm256_polyval_ps(x: __m256, coeffs: &[f32]) -> __m256 {
    let mut acc = _mm256_set1_ps(coeffs[coeffs.len() - 1]);
    for &c in coeffs[..coeffs.len() - 1].iter().rev() {
        acc = _mm256_fmadd_ps(acc, x, _mm256_set1_ps(c));
    }
    acc
}

/// Clears the sign bit of all eight lanes.
#[inline(always)]
pub unsafe fn _mm256_abs_ps(x: __m256) -> __m256 {
    _mm256_andnot_ps(_mm256_set1_ps(-0.0), x)
}

/// Computes the natural exponential e^x of 8 packed f32 values.
///
/// Range reduction n = round(x * log2(e)) with a split-ln(2) remainder,
/// degree-7 Taylor polynomial, and 2^n reconstruction through the IEEE
/// exponent field. Overlays: x >= EXP_HI_F gives +inf, x <= EXP_LO_F gives
/// 0, NaN propagates.
///
/// # Safety
///
/// Requires AVX2 and FMA.
pub unsafe fn _mm256_exp_ps(x: __m256) -> __m256 {
    let is_large = _mm256_cmp_ps(x, _mm256_set1_ps(EXP_HI_F), _CMP_GE_OQ);
    let is_small = _mm256_cmp_ps(x, _mm256_set1_ps(EXP_LO_F), _CMP_LE_OQ);
    let is_nan = _mm256_cmp_ps(x, x, _CMP_NEQ_UQ);

    let y = _mm256_mul_ps(x, _mm256_set1_ps(LOG2_E));
    let y = _mm256_max_ps(
        _mm256_min_ps(y, _mm256_set1_ps(127.0)),
        _mm256_set1_ps(-126.0),
    );
    let n = _mm256_round_ps(y, _MM_FROUND_TO_NEAREST_INT | _MM_FROUND_NO_EXC);

    let mut r = _mm256_fnmadd_ps(n, _mm256_set1_ps(LN2_HI_F), x);
    r = _mm256_fnmadd_ps(n, _mm256_set1_ps(LN2_LO_F), r);

    let poly = _mm256_polyval_ps(r, &EXP_POLY_F);

    // 2^n = (n + 127) << 23 reinterpreted as float bits
    let n_biased = _mm256_add_epi32(_mm256_cvtps_epi32(n), _mm256_set1_epi32(127));
    let scale = _mm256_castsi256_ps(_mm256_slli_epi32(n_biased, 23));
    let result = _mm256_mul_ps(poly, scale);

    let result = _mm256_blendv_ps(result, _mm256_setzero_ps(), is_small);
    let result = _mm256_blendv_ps(result, _mm256_set1_ps(f32::INFINITY), is_large);
    _mm256_blendv_ps(result, x, is_nan)
}

/// Computes the base-2 exponential 2^x as e^(x * ln 2).
#[inline(always)]
pub unsafe fn _mm256_exp2_ps(x: __m256) -> __m256 {
    _mm256_exp_ps(_mm256_mul_ps(x, _mm256_set1_ps(LN_2)))
}

// ============================================================================
// Logarithms
// ============================================================================

/// log2(3/2).
const LOG2_3_2_F: f32 = 0.5849625;

/// Series coefficients 2/(2k+1) for 2*atanh(u), k = 0..5, in u^2.
const ATANH_POLY_F: [f32; 6] = [2.0, 0.6666667, 0.4, 0.2857143, 0.22222222, 0.18181819];

/// Computes the base-2 logarithm of 8 packed f32 values.
///
/// Same reduction as the f64 kernel: exponent/mantissa bit split, mantissa
/// rescale by 2/3, odd atanh series in u = (d-1)/(d+1). Overlays: x < 0
/// gives NaN, x == 0 gives -inf, +inf and NaN propagate. Subnormal inputs
/// are clamped to the smallest normal before the bit split.
///
/// # Safety
///
/// Requires AVX2 and FMA.
pub unsafe fn _mm256_log2_ps(x: __m256) -> __m256 {
    let zero = _mm256_setzero_ps();
    let one = _mm256_set1_ps(1.0);

    let is_neg = _mm256_cmp_ps(x, zero, _CMP_LT_OQ);
    let is_zero = _mm256_cmp_ps(x, zero, _CMP_EQ_OQ);
    let is_inf = _mm256_cmp_ps(x, _mm256_set1_ps(f32::INFINITY), _CMP_EQ_OQ);
    let is_nan = _mm256_cmp_ps(x, x, _CMP_NEQ_UQ);

    let xc = _mm256_max_ps(x, _mm256_set1_ps(f32::MIN_POSITIVE));
    let bits = _mm256_castps_si256(xc);

    let m = _mm256_cvtepi32_ps(_mm256_sub_epi32(
        _mm256_srli_epi32(bits, 23),
        _mm256_set1_epi32(127),
    ));

    let mant = _mm256_or_si256(
        _mm256_and_si256(bits, _mm256_set1_epi32(0x007FFFFF)),
        _mm256_set1_epi32(0x3F800000),
    );
    let d = _mm256_mul_ps(_mm256_castsi256_ps(mant), _mm256_set1_ps(0.6666667));

    let u = _mm256_div_ps(_mm256_sub_ps(d, one), _mm256_add_ps(d, one));
    let u2 = _mm256_mul_ps(u, u);
    let t = _mm256_mul_ps(u, _mm256_polyval_ps(u2, &ATANH_POLY_F));

    let base = _mm256_add_ps(m, _mm256_set1_ps(LOG2_3_2_F));
    let result = _mm256_fmadd_ps(t, _mm256_set1_ps(LOG2_E), base);

    let result = _mm256_blendv_ps(result, _mm256_set1_ps(f32::NAN), is_neg);
    let result = _mm256_blendv_ps(result, _mm256_set1_ps(f32::NEG_INFINITY), is_zero);
    let result = _mm256_blendv_ps(result, _mm256_set1_ps(f32::INFINITY), is_inf);
    _mm256_blendv_ps(result, x, is_nan)
}

/// Computes the natural logarithm as log2(x) * ln(2).
#[inline(always)]
pub unsafe fn _mm256_ln_ps(x: __m256) -> __m256 {
    _mm256_mul_ps(_mm256_log2_ps(x), _mm256_set1_ps(LN_2))
}

// ============================================================================
// Trigonometry
// ============================================================================

/// 2*pi and its f32 residual.
const TWO_PI_F: f32 = 6.2831855;
const TWO_PI_LO_F: f32 = -1.7484555e-7;

/// Residual of pi beyond its f32 representation.
const PI_LO_F: f32 = -8.742278e-8;

/// 1/(2*pi).
const FRAC_1_TWO_PI_F: f32 = 0.15915494;

/// Taylor coefficients of cos(w) + sin(w) around 0, degree 11.
const SINCOS_POLY_F: [f32; 12] = [
    1.0,
    1.0,
    -0.5,
    -0.16666667,
    0.041666668,
    0.008333334,
    -0.0013888889,
    -0.00019841270,
    2.4801588e-5,
    2.7557319e-6,
    -2.7557319e-7,
    -2.5052108e-8,
];

/// Computes the sine of 8 packed f32 values.
///
/// Reduction to [0, 2*pi) with a two-part 2*pi, half-period sign flip, fold
/// around pi/2 into |w| <= pi/4, then the combined degree-11 polynomial for
/// (cos(w) + sin(w)) / sqrt(2). +-inf and NaN propagate as NaN.
///
/// # Safety
///
/// Requires AVX2 and FMA.
pub unsafe fn _mm256_sin_ps(x: __m256) -> __m256 {
    let q = _mm256_floor_ps(_mm256_mul_ps(x, _mm256_set1_ps(FRAC_1_TWO_PI_F)));
    let mut r = _mm256_fnmadd_ps(q, _mm256_set1_ps(TWO_PI_F), x);
    r = _mm256_fnmadd_ps(q, _mm256_set1_ps(TWO_PI_LO_F), r);

    let flip = _mm256_cmp_ps(r, _mm256_set1_ps(PI), _CMP_GT_OQ);
    let r_shifted = _mm256_sub_ps(_mm256_sub_ps(r, _mm256_set1_ps(PI)), _mm256_set1_ps(PI_LO_F));
    let r = _mm256_blendv_ps(r, r_shifted, flip);
    let sign_bits = _mm256_and_ps(flip, _mm256_set1_ps(-0.0));

    let h = _mm256_sub_ps(r, _mm256_set1_ps(FRAC_PI_2));
    let w = _mm256_sub_ps(_mm256_set1_ps(FRAC_PI_4), _mm256_abs_ps(h));

    let p = _mm256_polyval_ps(w, &SINCOS_POLY_F);
    let s = _mm256_mul_ps(p, _mm256_set1_ps(FRAC_1_SQRT_2));
    _mm256_xor_ps(s, sign_bits)
}

/// Computes the cosine as a quarter-period phase shift of the sine.
#[inline(always)]
pub unsafe fn _mm256_cos_ps(x: __m256) -> __m256 {
    _mm256_sin_ps(_mm256_add_ps(x, _mm256_set1_ps(FRAC_PI_2)))
}

/// Computes the tangent as sin(x)/cos(x) with a single IEEE division.
#[inline(always)]
pub unsafe fn _mm256_tan_ps(x: __m256) -> __m256 {
    _mm256_div_ps(_mm256_sin_ps(x), _mm256_cos_ps(x))
}

// ============================================================================
// Arctangent
// ============================================================================

/// Minimax coefficients for atan(z)/z in z^2 on [0, 1].
const ATAN_POLY_F: [f32; 9] = [
    0.9999999,
    -0.33332524,
    0.19984885,
    -0.14154807,
    0.10477539,
    -0.07194384,
    0.039345413,
    -0.014152348,
    0.002398139,
];

/// Computes the arctangent of 8 packed f32 values.
///
/// |x| > 1 folds through atan(y) = pi/2 - atan(1/y); the reduced argument in
/// [0, 1] feeds a degree-9 odd minimax polynomial. +-inf fold to exactly
/// +-pi/2; NaN propagates.
///
/// # Safety
///
/// Requires AVX2 and FMA.
pub unsafe fn _mm256_atan_ps(x: __m256) -> __m256 {
    let one = _mm256_set1_ps(1.0);
    let sign_bits = _mm256_and_ps(x, _mm256_set1_ps(-0.0));
    let y = _mm256_abs_ps(x);

    let big = _mm256_cmp_ps(y, one, _CMP_GT_OQ);
    let z = _mm256_blendv_ps(y, _mm256_div_ps(one, y), big);

    let z2 = _mm256_mul_ps(z, z);
    let t = _mm256_mul_ps(z, _mm256_polyval_ps(z2, &ATAN_POLY_F));

    let result = _mm256_blendv_ps(t, _mm256_sub_ps(_mm256_set1_ps(FRAC_PI_2), t), big);
    _mm256_or_ps(result, sign_bits)
}

// ============================================================================
// Error function and normal CDF
// ============================================================================

/// Abramowitz & Stegun 7.1.26 rational approximation parameters.
const ERF_P_F: f32 = 0.3275911;
const ERF_POLY_F: [f32; 6] = [
    0.0,
    0.254829592,
    -0.284496736,
    1.421413741,
    -1.453152027,
    1.061405429,
];

/// Computes the error function of 8 packed f32 values.
///
/// Abramowitz & Stegun 7.1.26 with t = 1/(1 + p|x|), extended to negative
/// arguments by oddness. Absolute error below 1.5e-7; erf(+-inf) = +-1 and
/// NaN propagation fall out of the formula.
///
/// # Safety
///
/// Requires AVX2 and FMA.
pub unsafe fn _mm256_erf_ps(x: __m256) -> __m256 {
    let one = _mm256_set1_ps(1.0);
    let sign_bits = _mm256_and_ps(x, _mm256_set1_ps(-0.0));
    let a = _mm256_abs_ps(x);

    let t = _mm256_div_ps(one, _mm256_fmadd_ps(_mm256_set1_ps(ERF_P_F), a, one));
    let poly = _mm256_polyval_ps(t, &ERF_POLY_F);

    let e = _mm256_exp_ps(_mm256_xor_ps(_mm256_mul_ps(a, a), _mm256_set1_ps(-0.0)));
    let r = _mm256_fnmadd_ps(poly, e, one);
    _mm256_or_ps(r, sign_bits)
}

/// Computes the standard normal CDF of 8 packed standardized values.
#[inline(always)]
pub unsafe fn _mm256_normcdf_ps(z: __m256) -> __m256 {
    let u = _mm256_mul_ps(z, _mm256_set1_ps(FRAC_1_SQRT_2));
    let e = _mm256_erf_ps(u);
    _mm256_mul_ps(_mm256_add_ps(e, _mm256_set1_ps(1.0)), _mm256_set1_ps(0.5))
}

// ============================================================================
// Chebyshev series
// ============================================================================

/// Evaluates a Chebyshev series and its derivative at 8 packed points.
/// Single-precision mirror of `_mm256_chebeval_pd`; see that kernel for the
/// recurrences and the smooth continuation outside [-1, 1].
///
/// # Safety
///
/// Requires AVX2 and FMA. `coeffs` must be non-empty.
pub unsafe fn _mm256_chebeval_ps(
    t: __m256,
    coeffs: &[f32],
    kind: ChebyshevKind,
) -> (__m256, __m256) {
    let one = _mm256_set1_ps(1.0);
    let tc = _mm256_max_ps(_mm256_min_ps(t, one), _mm256_set1_ps(-1.0));
    let two_t = _mm256_add_ps(tc, tc);

    let mut f_prev = one;
    let mut f_cur = match kind {
        ChebyshevKind::First => tc,
        ChebyshevKind::Second => two_t,
    };
    let mut g_prev = _mm256_setzero_ps();
    let mut g_cur = match kind {
        ChebyshevKind::First => one,
        ChebyshevKind::Second => _mm256_set1_ps(2.0),
    };

    let mut val = _mm256_set1_ps(coeffs[0]);
    let mut der = _mm256_setzero_ps();

    if coeffs.len() > 1 {
        val = _mm256_fmadd_ps(_mm256_set1_ps(coeffs[1]), f_cur, val);
        der = _mm256_fmadd_ps(_mm256_set1_ps(coeffs[1]), g_cur, der);
    }

    for &c in &coeffs[2.min(coeffs.len())..] {
        let f_next = _mm256_fmsub_ps(two_t, f_cur, f_prev);
        let g_next = _mm256_fmadd_ps(
            two_t,
            g_cur,
            _mm256_sub_ps(_mm256_add_ps(f_cur, f_cur), g_prev),
        );
        val = _mm256_fmadd_ps(_mm256_set1_ps(c), f_next, val);
        der = _mm256_fmadd_ps(_mm256_set1_ps(c), g_next, der);
        f_prev = f_cur;
        f_cur = f_next;
        g_prev = g_cur;
        g_cur = g_next;
    }

    let dist = _mm256_sub_ps(t, tc);
    let dist_sign = _mm256_and_ps(dist, _mm256_set1_ps(-0.0));
    let decay = _mm256_exp_ps(_mm256_xor_ps(_mm256_abs_ps(dist), _mm256_set1_ps(-0.0)));
    let grow = _mm256_or_ps(_mm256_sub_ps(one, decay), dist_sign);

    let val_out = _mm256_fmadd_ps(der, grow, val);
    let der_out = _mm256_mul_ps(der, decay);
    (val_out, der_out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(kernel: unsafe fn(__m256) -> __m256, input: [f32; 8]) -> [f32; 8] {
        let mut out = [0.0f32; 8];
        unsafe {
            let v = _mm256_loadu_ps(input.as_ptr());
            _mm256_storeu_ps(out.as_mut_ptr(), kernel(v));
        }
        out
    }

    #[test]
    fn test_exp_known_points() {
        let r = eval(
            _mm256_exp_ps,
            [0.0, 1.0, -1.0, 2.0, 10.0, -10.0, 0.5, 88.0],
        );
        assert_eq!(r[0], 1.0);
        for (i, &x) in [0.0f32, 1.0, -1.0, 2.0, 10.0, -10.0, 0.5, 88.0]
            .iter()
            .enumerate()
        {
            let expected = x.exp();
            assert!(
                ((r[i] - expected) / expected).abs() < 5e-7,
                "exp({x}) = {} vs {}",
                r[i],
                expected
            );
        }
    }

    #[test]
    fn test_exp_special_values() {
        let r = eval(
            _mm256_exp_ps,
            [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 89.0, -100.0, 0.0, 0.0, 0.0],
        );
        assert!(r[0].is_nan());
        assert_eq!(r[1], f32::INFINITY);
        assert_eq!(r[2], 0.0);
        assert_eq!(r[3], f32::INFINITY);
        assert_eq!(r[4], 0.0);
    }

    #[test]
    fn test_log2_and_specials() {
        let r = eval(
            _mm256_log2_ps,
            [1.0, 2.0, 8.0, 0.5, 0.0, -1.0, f32::INFINITY, f32::NAN],
        );
        assert!(r[0].abs() < 1e-6);
        assert!((r[1] - 1.0).abs() < 1e-6);
        assert!((r[2] - 3.0).abs() < 1e-6);
        assert!((r[3] + 1.0).abs() < 1e-6);
        assert_eq!(r[4], f32::NEG_INFINITY);
        assert!(r[5].is_nan());
        assert_eq!(r[6], f32::INFINITY);
        assert!(r[7].is_nan());
    }

    #[test]
    fn test_sin_known_points_and_specials() {
        let r = eval(
            _mm256_sin_ps,
            [0.0, FRAC_PI_2, PI, 1.0, -1.0, f32::INFINITY, f32::NEG_INFINITY, f32::NAN],
        );
        assert!(r[0].abs() < 1e-7);
        assert!((r[1] - 1.0).abs() < 1e-6);
        assert!(r[2].abs() < 1e-6);
        assert!((r[3] - 1.0f32.sin()).abs() < 1e-6);
        assert!((r[4] + 1.0f32.sin()).abs() < 1e-6);
        assert!(r[5].is_nan());
        assert!(r[6].is_nan());
        assert!(r[7].is_nan());
    }

    #[test]
    fn test_atan_special_values() {
        let r = eval(
            _mm256_atan_ps,
            [f32::INFINITY, f32::NEG_INFINITY, 1.0, -1.0, 0.0, 0.3, -5.0, f32::NAN],
        );
        assert_eq!(r[0], FRAC_PI_2);
        assert_eq!(r[1], -FRAC_PI_2);
        assert!((r[2] - FRAC_PI_4).abs() < 1e-6);
        assert!((r[3] + FRAC_PI_4).abs() < 1e-6);
        assert!((r[5] - 0.3f32.atan()).abs() < 1e-6);
        assert!((r[6] - (-5.0f32).atan()).abs() < 1e-6);
        assert!(r[7].is_nan());
    }

    #[test]
    fn test_erf_bounds_and_oddness() {
        let r = eval(
            _mm256_erf_ps,
            [f32::INFINITY, f32::NEG_INFINITY, 1.0, -1.0, 0.0, 2.0, -2.0, f32::NAN],
        );
        assert_eq!(r[0], 1.0);
        assert_eq!(r[1], -1.0);
        assert!((r[2] - 0.8427008).abs() < 1.5e-7 + 1e-6);
        assert!((r[2] + r[3]).abs() < 1e-7);
        assert!(r[4].abs() < 1e-6);
        assert!(r[7].is_nan());
    }
}
