//! AVX2 math kernels for packed f64 values.
//!
//! Every kernel maps one `__m256d` register to one `__m256d` register,
//! branch-free: range reduction and polynomial evaluation run on all lanes,
//! special values are folded in afterwards with compare + blend overlays.
//! Coefficient tables are `const` per function.
//!
//! | Kernel              | Domain     | Range      | Accuracy                        |
//! |---------------------|------------|------------|---------------------------------|
//! | `_mm256_exp_pd`     | All reals  | [0, +inf]  | ~1 ulp over the normal range    |
//! | `_mm256_log2_pd`    | [0, +inf]  | All reals  | abs ~1e-16 scaled by max(1,|y|) |
//! | `_mm256_sin_pd`     | All reals  | [-1, 1]    | abs ~1e-15, degrades ~eps(x)    |
//! | `_mm256_atan_pd`    | All reals  | (-pi/2, pi/2) | ~1 ulp                       |
//! | `_mm256_erf_pd`     | All reals  | [-1, 1]    | abs 1.5e-7 (A&S 7.1.26)         |

#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, FRAC_PI_4, LN_2, LOG2_E, PI};

use crate::simd::ChebyshevKind;

// ============================================================================
// Exponential
// ============================================================================

/// Inputs at or above this produce +inf: ln(f64::MAX).
const EXP_HI: f64 = 709.782712893384;

/// Inputs at or below this produce 0: below ln of half the smallest subnormal.
const EXP_LO: f64 = -745.1332191019412;

/// High part of ln(2); exactly representable product with small integers.
const LN2_HI: f64 = 0.693145751953125;

/// Low part of ln(2); LN2_HI + LN2_LO doubles the effective precision of the
/// base-e remainder in the range reduction.
const LN2_LO: f64 = 1.42860682030941723212e-6;

/// Taylor coefficients 1/k! for e^r on |r| <= ln(2)/2, even powers k = 0..12.
const EXP_POLY_EVEN: [f64; 7] = [
    1.0,
    0.5,
    0.041666666666666664,
    0.001388888888888889,
    2.48015873015873e-5,
    2.755731922398589e-7,
    2.08767569878681e-9,
];

/// Taylor coefficients 1/k! for e^r, odd powers k = 1..13.
const EXP_POLY_ODD: [f64; 7] = [
    1.0,
    0.16666666666666666,
    0.008333333333333333,
    0.0001984126984126984,
    2.7557319223985893e-6,
    2.505210838544172e-8,
    1.6059043836821613e-10,
];

/// Evaluates a fixed polynomial in ascending-power coefficient order using
/// fused multiply-add Horner steps.
#[inline(always)]
pub unsafe fn _mm256_polyval_pd(x: __m256d, coeffs: &[f64]) -> __m256d {
    let mut acc = _mm256_set1_pd(coeffs[coeffs.len() - 1]);
    for &c in coeffs[..coeffs.len() - 1].iter().rev() {
        acc = _mm256_fmadd_pd(acc, x, _mm256_set1_pd(c));
    }
    acc
}

/// Clears the sign bit of all four lanes.
#[inline(always)]
pub unsafe fn _mm256_abs_pd(x: __m256d) -> __m256d {
    _mm256_andnot_pd(_mm256_set1_pd(-0.0), x)
}

/// Builds 2^n by writing n + 1023 into the IEEE 754 exponent field.
/// Lanes must hold integral values in [-1022, 1023].
#[inline(always)]
unsafe fn _mm256_pow2_pd(n: __m256d) -> __m256d {
    let n32 = _mm256_cvtpd_epi32(n);
    let n64 = _mm256_cvtepi32_epi64(n32);
    let biased = _mm256_add_epi64(n64, _mm256_set1_epi64x(1023));
    _mm256_castsi256_pd(_mm256_slli_epi64(biased, 52))
}

/// Computes the natural exponential e^x of 4 packed f64 values.
///
/// # Algorithm
///
/// 1. Range reduction: n = round(x * log2(e)), clamped so the exponent
///    reconstruction stays representable.
/// 2. Base-e remainder r = (x - n*LN2_HI) - n*LN2_LO with |r| <= ln(2)/2.
/// 3. Degree-13 Taylor polynomial for e^r, split into even and odd chains in
///    r^2 joined by one final fused multiply-add.
/// 4. Reconstruction e^x = e^r * 2^n1 * 2^n2 where n = n1 + n2 and
///    n1 >= -1022; the second factor carries the result into the gradual
///    underflow range.
/// 5. Overlays: x >= EXP_HI gives +inf, x <= EXP_LO gives 0, NaN propagates.
///
/// # Safety
///
/// Requires AVX2 and FMA.
pub unsafe fn _mm256_exp_pd(x: __m256d) -> __m256d {
    let is_large = _mm256_cmp_pd(x, _mm256_set1_pd(EXP_HI), _CMP_GE_OQ);
    let is_small = _mm256_cmp_pd(x, _mm256_set1_pd(EXP_LO), _CMP_LE_OQ);
    let is_nan = _mm256_cmp_pd(x, x, _CMP_NEQ_UQ);

    // n = round(x / ln(2)), clamped to keep both 2^n factors constructible
    let y = _mm256_mul_pd(x, _mm256_set1_pd(LOG2_E));
    let y = _mm256_max_pd(
        _mm256_min_pd(y, _mm256_set1_pd(1023.0)),
        _mm256_set1_pd(-1075.0),
    );
    let n = _mm256_round_pd(y, _MM_FROUND_TO_NEAREST_INT | _MM_FROUND_NO_EXC);

    // r = x - n*ln(2) in split precision
    let mut r = _mm256_fnmadd_pd(n, _mm256_set1_pd(LN2_HI), x);
    r = _mm256_fnmadd_pd(n, _mm256_set1_pd(LN2_LO), r);

    // e^r = even(r^2) + r * odd(r^2)
    let r2 = _mm256_mul_pd(r, r);
    let even = _mm256_polyval_pd(r2, &EXP_POLY_EVEN);
    let odd = _mm256_polyval_pd(r2, &EXP_POLY_ODD);
    let poly = _mm256_fmadd_pd(r, odd, even);

    // Split n so each exponent field stays in range; n2 is nonpositive and
    // at least -53, so the second scale is exact.
    let n1 = _mm256_max_pd(n, _mm256_set1_pd(-1022.0));
    let n2 = _mm256_sub_pd(n, n1);
    let result = _mm256_mul_pd(_mm256_mul_pd(poly, _mm256_pow2_pd(n1)), _mm256_pow2_pd(n2));

    let result = _mm256_blendv_pd(result, _mm256_setzero_pd(), is_small);
    let result = _mm256_blendv_pd(result, _mm256_set1_pd(f64::INFINITY), is_large);
    _mm256_blendv_pd(result, x, is_nan)
}

/// Computes the base-2 exponential 2^x as e^(x * ln 2).
#[inline(always)]
pub unsafe fn _mm256_exp2_pd(x: __m256d) -> __m256d {
    _mm256_exp_pd(_mm256_mul_pd(x, _mm256_set1_pd(LN_2)))
}

// ============================================================================
// Logarithms
// ============================================================================

/// log2(3/2), the rescale correction in the mantissa reduction.
const LOG2_3_2: f64 = 0.5849625007211562;

/// Series coefficients 2/(2k+1) for 2*atanh(u) = ln((1+u)/(1-u)), k = 0..10,
/// evaluated in u^2.
const ATANH_POLY: [f64; 11] = [
    2.0,
    0.6666666666666666,
    0.4,
    0.2857142857142857,
    0.2222222222222222,
    0.18181818181818182,
    0.15384615384615385,
    0.13333333333333333,
    0.11764705882352941,
    0.10526315789473684,
    0.09523809523809523,
];

/// Bit pattern of 2^52; used to convert small nonnegative i64 lanes to f64.
const INT_CVT_MAGIC: i64 = 0x4330000000000000;

/// Computes the base-2 logarithm of 4 packed f64 values.
///
/// # Algorithm
///
/// 1. Split the IEEE bits into exponent m and mantissa d in [1, 2).
/// 2. Rescale d * (2/3) into [2/3, 4/3) so the reduced argument straddles 1.
/// 3. u = (d' - 1)/(d' + 1); ln(d') = 2*atanh(u) via an odd series in u^2.
/// 4. log2(x) = (m + log2(3/2)) + ln(d') * log2(e).
/// 5. Overlays: x < 0 gives NaN, x == 0 gives -inf, +inf and NaN propagate.
///
/// Subnormal inputs are clamped to the smallest normal before the bit split.
///
/// # Safety
///
/// Requires AVX2 and FMA.
pub unsafe fn _mm256_log2_pd(x: __m256d) -> __m256d {
    let zero = _mm256_setzero_pd();
    let one = _mm256_set1_pd(1.0);

    let is_neg = _mm256_cmp_pd(x, zero, _CMP_LT_OQ);
    let is_zero = _mm256_cmp_pd(x, zero, _CMP_EQ_OQ);
    let is_inf = _mm256_cmp_pd(x, _mm256_set1_pd(f64::INFINITY), _CMP_EQ_OQ);
    let is_nan = _mm256_cmp_pd(x, x, _CMP_NEQ_UQ);

    // Keep the bit split meaningful for nonpositive and subnormal lanes;
    // their results are overwritten by the overlays below.
    let xc = _mm256_max_pd(x, _mm256_set1_pd(f64::MIN_POSITIVE));
    let bits = _mm256_castpd_si256(xc);

    // Exponent field to f64 via the 2^52 magic-number trick
    let exp_raw = _mm256_srli_epi64(bits, 52);
    let m = _mm256_sub_pd(
        _mm256_castsi256_pd(_mm256_or_si256(exp_raw, _mm256_set1_epi64x(INT_CVT_MAGIC))),
        _mm256_set1_pd(4503599627370496.0 + 1023.0),
    );

    // Mantissa in [1, 2), rescaled to straddle 1
    let mant = _mm256_or_si256(
        _mm256_and_si256(bits, _mm256_set1_epi64x(0x000FFFFFFFFFFFFF)),
        _mm256_set1_epi64x(0x3FF0000000000000),
    );
    let d = _mm256_mul_pd(
        _mm256_castsi256_pd(mant),
        _mm256_set1_pd(0.6666666666666666),
    );

    let u = _mm256_div_pd(_mm256_sub_pd(d, one), _mm256_add_pd(d, one));
    let u2 = _mm256_mul_pd(u, u);
    let t = _mm256_mul_pd(u, _mm256_polyval_pd(u2, &ATANH_POLY));

    let base = _mm256_add_pd(m, _mm256_set1_pd(LOG2_3_2));
    let result = _mm256_fmadd_pd(t, _mm256_set1_pd(LOG2_E), base);

    let result = _mm256_blendv_pd(result, _mm256_set1_pd(f64::NAN), is_neg);
    let result = _mm256_blendv_pd(result, _mm256_set1_pd(f64::NEG_INFINITY), is_zero);
    let result = _mm256_blendv_pd(result, _mm256_set1_pd(f64::INFINITY), is_inf);
    _mm256_blendv_pd(result, x, is_nan)
}

/// Computes the natural logarithm as log2(x) * ln(2).
#[inline(always)]
pub unsafe fn _mm256_ln_pd(x: __m256d) -> __m256d {
    _mm256_mul_pd(_mm256_log2_pd(x), _mm256_set1_pd(LN_2))
}

// ============================================================================
// Trigonometry
// ============================================================================

/// 2*pi split into the double value and its residual.
const TWO_PI: f64 = 6.283185307179586;
const TWO_PI_LO: f64 = 2.4492935982947064e-16;

/// Residual of pi beyond its double representation.
const PI_LO: f64 = 1.2246467991473532e-16;

/// 1/(2*pi).
const FRAC_1_TWO_PI: f64 = 0.15915494309189535;

/// Taylor coefficients of cos(w) + sin(w) around 0, degree 15. The sign
/// pattern repeats + + - - with magnitudes 1/k!.
const SINCOS_POLY: [f64; 16] = [
    1.0,
    1.0,
    -0.5,
    -0.16666666666666666,
    0.041666666666666664,
    0.008333333333333333,
    -0.001388888888888889,
    -0.0001984126984126984,
    2.48015873015873e-5,
    2.7557319223985893e-6,
    -2.755731922398589e-7,
    -2.505210838544172e-8,
    2.08767569878681e-9,
    1.6059043836821613e-10,
    -1.1470745597729725e-11,
    -7.647163731819816e-13,
];

/// Computes the sine of 4 packed f64 values.
///
/// # Algorithm
///
/// 1. Reduce to r in [0, 2*pi) with a two-part 2*pi subtraction.
/// 2. Where r > pi, subtract pi and record a sign flip (sin(r) = -sin(r-pi)).
/// 3. Fold around pi/2: with w = pi/4 - |r - pi/2| and |w| <= pi/4,
///    sin(r) = (cos(w) + sin(w)) / sqrt(2).
/// 4. Evaluate the combined degree-15 Taylor polynomial and apply the sign.
///
/// +-inf reduce to inf - inf and propagate as NaN, as does NaN itself.
///
/// # Safety
///
/// Requires AVX2 and FMA.
pub unsafe fn _mm256_sin_pd(x: __m256d) -> __m256d {
    // r = x mod 2*pi, in split precision
    let q = _mm256_floor_pd(_mm256_mul_pd(x, _mm256_set1_pd(FRAC_1_TWO_PI)));
    let mut r = _mm256_fnmadd_pd(q, _mm256_set1_pd(TWO_PI), x);
    r = _mm256_fnmadd_pd(q, _mm256_set1_pd(TWO_PI_LO), r);

    // second half-period: sin(r) = -sin(r - pi)
    let flip = _mm256_cmp_pd(r, _mm256_set1_pd(PI), _CMP_GT_OQ);
    let r_shifted = _mm256_sub_pd(_mm256_sub_pd(r, _mm256_set1_pd(PI)), _mm256_set1_pd(PI_LO));
    let r = _mm256_blendv_pd(r, r_shifted, flip);
    let sign_bits = _mm256_and_pd(flip, _mm256_set1_pd(-0.0));

    // fold around pi/2 into |w| <= pi/4
    let h = _mm256_sub_pd(r, _mm256_set1_pd(FRAC_PI_2));
    let w = _mm256_sub_pd(_mm256_set1_pd(FRAC_PI_4), _mm256_abs_pd(h));

    let p = _mm256_polyval_pd(w, &SINCOS_POLY);
    let s = _mm256_mul_pd(p, _mm256_set1_pd(FRAC_1_SQRT_2));
    _mm256_xor_pd(s, sign_bits)
}

/// Computes the cosine as a quarter-period phase shift of the sine.
#[inline(always)]
pub unsafe fn _mm256_cos_pd(x: __m256d) -> __m256d {
    _mm256_sin_pd(_mm256_add_pd(x, _mm256_set1_pd(FRAC_PI_2)))
}

/// Computes the tangent as sin(x)/cos(x) with a single IEEE division.
/// Near odd multiples of pi/2 the quotient grows without bound; the division
/// itself supplies the correct signed overflow behavior.
#[inline(always)]
pub unsafe fn _mm256_tan_pd(x: __m256d) -> __m256d {
    _mm256_div_pd(_mm256_sin_pd(x), _mm256_cos_pd(x))
}

// ============================================================================
// Arctangent
// ============================================================================

/// Taylor coefficients (-1)^k/(2k+1) of atan(z)/z in z^2, k = 0..10. After
/// two half-angle reductions the argument satisfies z <= tan(pi/16), where
/// the truncation error is below 1 ulp.
const ATAN_POLY: [f64; 11] = [
    1.0,
    -0.3333333333333333,
    0.2,
    -0.14285714285714285,
    0.1111111111111111,
    -0.09090909090909091,
    0.07692307692307693,
    -0.06666666666666667,
    0.058823529411764705,
    -0.05263157894736842,
    0.047619047619047616,
];

/// Computes the arctangent of 4 packed f64 values.
///
/// # Algorithm
///
/// 1. Work on y = |x|; for y > 1 use atan(y) = pi/2 - atan(1/y).
/// 2. Halve the angle twice via z -> z / (1 + sqrt(1 + z^2)), bounding the
///    argument by tan(pi/16).
/// 3. Odd Taylor series in z^2, result scaled by 4.
/// 4. Undo the reciprocal fold and restore the sign of x.
///
/// +-inf fold to exactly +-pi/2 through the reciprocal branch; NaN
/// propagates through the arithmetic.
///
/// # Safety
///
/// Requires AVX2 and FMA.
pub unsafe fn _mm256_atan_pd(x: __m256d) -> __m256d {
    let one = _mm256_set1_pd(1.0);
    let sign_bits = _mm256_and_pd(x, _mm256_set1_pd(-0.0));
    let y = _mm256_abs_pd(x);

    let big = _mm256_cmp_pd(y, one, _CMP_GT_OQ);
    let z = _mm256_blendv_pd(y, _mm256_div_pd(one, y), big);

    // two half-angle reductions
    let z = _mm256_div_pd(
        z,
        _mm256_add_pd(one, _mm256_sqrt_pd(_mm256_fmadd_pd(z, z, one))),
    );
    let z = _mm256_div_pd(
        z,
        _mm256_add_pd(one, _mm256_sqrt_pd(_mm256_fmadd_pd(z, z, one))),
    );

    let z2 = _mm256_mul_pd(z, z);
    let t = _mm256_mul_pd(z, _mm256_polyval_pd(z2, &ATAN_POLY));
    let a = _mm256_mul_pd(t, _mm256_set1_pd(4.0));

    let result = _mm256_blendv_pd(a, _mm256_sub_pd(_mm256_set1_pd(FRAC_PI_2), a), big);
    _mm256_or_pd(result, sign_bits)
}

// ============================================================================
// Error function and normal CDF
// ============================================================================

/// Abramowitz & Stegun 7.1.26 rational approximation parameters.
const ERF_P: f64 = 0.3275911;
const ERF_POLY: [f64; 6] = [
    0.0,
    0.254829592,
    -0.284496736,
    1.421413741,
    -1.453152027,
    1.061405429,
];

/// Computes the error function of 4 packed f64 values.
///
/// Uses the Abramowitz & Stegun 7.1.26 rational approximation:
/// erf(a) = 1 - P5(t) * e^(-a^2) with t = 1/(1 + p*a) for a >= 0, extended
/// to negative arguments by oddness. Absolute error is bounded by 1.5e-7.
/// erf(+-inf) = +-1 and NaN propagation fall out of the formula.
///
/// # Safety
///
/// Requires AVX2 and FMA.
pub unsafe fn _mm256_erf_pd(x: __m256d) -> __m256d {
    let one = _mm256_set1_pd(1.0);
    let sign_bits = _mm256_and_pd(x, _mm256_set1_pd(-0.0));
    let a = _mm256_abs_pd(x);

    let t = _mm256_div_pd(one, _mm256_fmadd_pd(_mm256_set1_pd(ERF_P), a, one));
    let poly = _mm256_polyval_pd(t, &ERF_POLY);

    let e = _mm256_exp_pd(_mm256_xor_pd(_mm256_mul_pd(a, a), _mm256_set1_pd(-0.0)));
    // 1 - poly(t) * e^(-a^2), nonnegative for a >= 0
    let r = _mm256_fnmadd_pd(poly, e, one);
    _mm256_or_pd(r, sign_bits)
}

/// Computes the standard normal CDF of 4 packed standardized values:
/// Phi(z) = (1 + erf(z / sqrt(2))) / 2.
#[inline(always)]
pub unsafe fn _mm256_normcdf_pd(z: __m256d) -> __m256d {
    let u = _mm256_mul_pd(z, _mm256_set1_pd(FRAC_1_SQRT_2));
    let e = _mm256_erf_pd(u);
    _mm256_mul_pd(
        _mm256_add_pd(e, _mm256_set1_pd(1.0)),
        _mm256_set1_pd(0.5),
    )
}

// ============================================================================
// Chebyshev series
// ============================================================================

/// Evaluates a Chebyshev series and its derivative at 4 packed points.
///
/// `coeffs[k]` multiplies T_k (or U_k) of the requested kind. Both value and
/// derivative come from one pass of the two-term recurrences
/// f_{k+1} = 2t*f_k - f_{k-1} and f'_{k+1} = 2f_k + 2t*f'_k - f'_{k-1}.
///
/// Outside [-1, 1] the series is continued smoothly from the nearest
/// boundary c: value(c) + deriv(c) * sign(t - c) * (1 - e^(-|t - c|)) with
/// derivative deriv(c) * e^(-|t - c|). Both pieces agree with the interior
/// at the boundary through first order, and the correction vanishes on
/// interior lanes, so no blend is needed.
///
/// # Safety
///
/// Requires AVX2 and FMA. `coeffs` must be non-empty.
pub unsafe fn _mm256_chebeval_pd(
    t: __m256d,
    coeffs: &[f64],
    kind: ChebyshevKind,
) -> (__m256d, __m256d) {
    let one = _mm256_set1_pd(1.0);
    let tc = _mm256_max_pd(_mm256_min_pd(t, one), _mm256_set1_pd(-1.0));
    let two_t = _mm256_add_pd(tc, tc);

    // seeds: T0 = U0 = 1, T1 = t, U1 = 2t
    let mut f_prev = one;
    let mut f_cur = match kind {
        ChebyshevKind::First => tc,
        ChebyshevKind::Second => two_t,
    };
    let mut g_prev = _mm256_setzero_pd();
    let mut g_cur = match kind {
        ChebyshevKind::First => one,
        ChebyshevKind::Second => _mm256_set1_pd(2.0),
    };

    let mut val = _mm256_set1_pd(coeffs[0]);
    let mut der = _mm256_setzero_pd();

    if coeffs.len() > 1 {
        val = _mm256_fmadd_pd(_mm256_set1_pd(coeffs[1]), f_cur, val);
        der = _mm256_fmadd_pd(_mm256_set1_pd(coeffs[1]), g_cur, der);
    }

    for &c in &coeffs[2.min(coeffs.len())..] {
        let f_next = _mm256_fmsub_pd(two_t, f_cur, f_prev);
        let g_next = _mm256_fmadd_pd(
            two_t,
            g_cur,
            _mm256_sub_pd(_mm256_add_pd(f_cur, f_cur), g_prev),
        );
        val = _mm256_fmadd_pd(_mm256_set1_pd(c), f_next, val);
        der = _mm256_fmadd_pd(_mm256_set1_pd(c), g_next, der);
        f_prev = f_cur;
        f_cur = f_next;
        g_prev = g_cur;
        g_cur = g_next;
    }

    // smooth continuation; dist is zero on interior lanes
    let dist = _mm256_sub_pd(t, tc);
    let dist_sign = _mm256_and_pd(dist, _mm256_set1_pd(-0.0));
    let decay = _mm256_exp_pd(_mm256_xor_pd(_mm256_abs_pd(dist), _mm256_set1_pd(-0.0)));
    let grow = _mm256_or_pd(_mm256_sub_pd(one, decay), dist_sign);

    let val_out = _mm256_fmadd_pd(der, grow, val);
    let der_out = _mm256_mul_pd(der, decay);
    (val_out, der_out)
}
