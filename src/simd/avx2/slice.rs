//! AVX2 array drivers for f32 slices.
//!
//! Single-precision twin of `slice64`: the same generic block drivers over
//! `F32x8` (8 lanes instead of 4), the same masked short path and preloaded
//! overlapping final window, and the same `vs*`-named validated surface.

#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use crate::error::{ensure_coeffs, ensure_same_len, Result};
use crate::simd::avx2::f32x8::{F32x8, AVX_ALIGNMENT, LANE_COUNT};
use crate::simd::avx2::math::*;
use crate::simd::{ChebyshevKind, SimdLoad, SimdMath, SimdStore};
use crate::utils::alloc_uninit_vec;

/// Full vectors processed per iteration of the unrolled loop.
const UNROLL: usize = 4;

// ============================================================================
// Generic block drivers
// ============================================================================

/// Applies a one-register kernel to `n` elements at `x`, writing to `out`.
///
/// # Safety
///
/// `x` and `out` must each be valid for `n` elements. They may be the same
/// pointer (in-place) but must not partially overlap otherwise.
#[inline(always)]
unsafe fn map_unary<F>(x: *const f32, out: *mut f32, n: usize, f: F)
where
    F: Fn(__m256) -> __m256,
{
    if n == 0 {
        return;
    }

    if n < LANE_COUNT {
        let v = F32x8::load_partial(x, n);
        F32x8 {
            size: n,
            elements: f(v.elements),
        }
        .store_at_partial(out);
        return;
    }

    // Input for the overlapping final window, captured before any store can
    // clobber it when x == out.
    let tail = F32x8::load(x.add(n - LANE_COUNT), LANE_COUNT);

    let mut i = 0;
    while i + UNROLL * LANE_COUNT <= n {
        let v0 = F32x8::load(x.add(i), LANE_COUNT);
        let v1 = F32x8::load(x.add(i + LANE_COUNT), LANE_COUNT);
        let v2 = F32x8::load(x.add(i + 2 * LANE_COUNT), LANE_COUNT);
        let v3 = F32x8::load(x.add(i + 3 * LANE_COUNT), LANE_COUNT);

        full(f(v0.elements)).store_at(out.add(i));
        full(f(v1.elements)).store_at(out.add(i + LANE_COUNT));
        full(f(v2.elements)).store_at(out.add(i + 2 * LANE_COUNT));
        full(f(v3.elements)).store_at(out.add(i + 3 * LANE_COUNT));

        i += UNROLL * LANE_COUNT;
    }

    while i + LANE_COUNT <= n {
        let v = F32x8::load(x.add(i), LANE_COUNT);
        full(f(v.elements)).store_at(out.add(i));
        i += LANE_COUNT;
    }

    if i < n {
        full(f(tail.elements)).store_at(out.add(n - LANE_COUNT));
    }
}

/// Applies a two-register kernel elementwise over `a` and `b`.
///
/// # Safety
///
/// All pointers must be valid for `n` elements; `out` may alias `a` or `b`
/// exactly but must not partially overlap either.
#[inline(always)]
unsafe fn map_binary<F>(a: *const f32, b: *const f32, out: *mut f32, n: usize, f: F)
where
    F: Fn(__m256, __m256) -> __m256,
{
    if n == 0 {
        return;
    }

    if n < LANE_COUNT {
        let va = F32x8::load_partial(a, n);
        let vb = F32x8::load_partial(b, n);
        F32x8 {
            size: n,
            elements: f(va.elements, vb.elements),
        }
        .store_at_partial(out);
        return;
    }

    let tail_a = F32x8::load(a.add(n - LANE_COUNT), LANE_COUNT);
    let tail_b = F32x8::load(b.add(n - LANE_COUNT), LANE_COUNT);

    let mut i = 0;
    while i + LANE_COUNT <= n {
        let va = F32x8::load(a.add(i), LANE_COUNT);
        let vb = F32x8::load(b.add(i), LANE_COUNT);
        full(f(va.elements, vb.elements)).store_at(out.add(i));
        i += LANE_COUNT;
    }

    if i < n {
        full(f(tail_a.elements, tail_b.elements)).store_at(out.add(n - LANE_COUNT));
    }
}

/// Applies a three-register kernel elementwise over `a`, `b` and `c`.
///
/// # Safety
///
/// Same contract as [`map_binary`], extended to three inputs.
#[inline(always)]
unsafe fn map_ternary<F>(
    a: *const f32,
    b: *const f32,
    c: *const f32,
    out: *mut f32,
    n: usize,
    f: F,
) where
    F: Fn(__m256, __m256, __m256) -> __m256,
{
    if n == 0 {
        return;
    }

    if n < LANE_COUNT {
        let va = F32x8::load_partial(a, n);
        let vb = F32x8::load_partial(b, n);
        let vc = F32x8::load_partial(c, n);
        F32x8 {
            size: n,
            elements: f(va.elements, vb.elements, vc.elements),
        }
        .store_at_partial(out);
        return;
    }

    let tail_a = F32x8::load(a.add(n - LANE_COUNT), LANE_COUNT);
    let tail_b = F32x8::load(b.add(n - LANE_COUNT), LANE_COUNT);
    let tail_c = F32x8::load(c.add(n - LANE_COUNT), LANE_COUNT);

    let mut i = 0;
    while i + LANE_COUNT <= n {
        let va = F32x8::load(a.add(i), LANE_COUNT);
        let vb = F32x8::load(b.add(i), LANE_COUNT);
        let vc = F32x8::load(c.add(i), LANE_COUNT);
        full(f(va.elements, vb.elements, vc.elements)).store_at(out.add(i));
        i += LANE_COUNT;
    }

    if i < n {
        full(f(tail_a.elements, tail_b.elements, tail_c.elements))
            .store_at(out.add(n - LANE_COUNT));
    }
}

#[inline(always)]
fn full(elements: __m256) -> F32x8 {
    F32x8 {
        size: LANE_COUNT,
        elements,
    }
}

/// Reduces an 8-lane register to the sum of its lanes.
#[inline(always)]
unsafe fn hsum_ps(v: __m256) -> f32 {
    let lo = _mm256_castps256_ps128(v);
    let hi = _mm256_extractf128_ps(v, 1);
    let s = _mm_add_ps(lo, hi);
    let s = _mm_add_ps(s, _mm_movehl_ps(s, s));
    let s = _mm_add_ss(s, _mm_shuffle_ps(s, s, 1));
    _mm_cvtss_f32(s)
}

// ============================================================================
// Elementwise drivers
// ============================================================================

macro_rules! vs_unary {
    ($(#[$doc:meta])* $name:ident, $name_mut:ident, $kernel:ident) => {
        $(#[$doc])*
        ///
        /// Returns an error when `x` and `out` differ in length.
        pub fn $name(x: &[f32], out: &mut [f32]) -> Result<()> {
            ensure_same_len(x.len(), out.len())?;
            unsafe { map_unary(x.as_ptr(), out.as_mut_ptr(), x.len(), |v| $kernel(v)) };
            Ok(())
        }

        #[doc = concat!("In-place form of [`", stringify!($name), "`]: transforms `buf` elementwise.")]
        pub fn $name_mut(buf: &mut [f32]) {
            let ptr = buf.as_mut_ptr();
            unsafe { map_unary(ptr, ptr, buf.len(), |v| $kernel(v)) };
        }
    };
}

vs_unary!(
    /// Computes the natural exponential of each element of `x` into `out`.
    vsexp,
    vsexp_mut,
    _mm256_exp_ps
);
vs_unary!(
    /// Computes the base-2 exponential of each element of `x` into `out`.
    vsexp2,
    vsexp2_mut,
    _mm256_exp2_ps
);
vs_unary!(
    /// Computes the natural logarithm of each element of `x` into `out`.
    vsln,
    vsln_mut,
    _mm256_ln_ps
);
vs_unary!(
    /// Computes the base-2 logarithm of each element of `x` into `out`.
    vslog2,
    vslog2_mut,
    _mm256_log2_ps
);
vs_unary!(
    /// Computes the sine of each element of `x` into `out`.
    vssin,
    vssin_mut,
    _mm256_sin_ps
);
vs_unary!(
    /// Computes the cosine of each element of `x` into `out`.
    vscos,
    vscos_mut,
    _mm256_cos_ps
);
vs_unary!(
    /// Computes the tangent of each element of `x` into `out`.
    vstan,
    vstan_mut,
    _mm256_tan_ps
);
vs_unary!(
    /// Computes the arctangent of each element of `x` into `out`.
    vsatan,
    vsatan_mut,
    _mm256_atan_ps
);
vs_unary!(
    /// Computes the square root of each element of `x` into `out`.
    vssqrt,
    vssqrt_mut,
    _mm256_sqrt_ps
);
vs_unary!(
    /// Computes the error function of each element of `x` into `out`.
    vserf,
    vserf_mut,
    _mm256_erf_ps
);

// ============================================================================
// Normal CDF
// ============================================================================

/// Computes the normal CDF with scalar `mean` and `sigma` for each element
/// of `x` into `out`.
///
/// Returns an error when `x` and `out` differ in length.
pub fn vscdf(mean: f32, sigma: f32, x: &[f32], out: &mut [f32]) -> Result<()> {
    ensure_same_len(x.len(), out.len())?;
    let inv = 1.0 / sigma;
    unsafe {
        map_unary(x.as_ptr(), out.as_mut_ptr(), x.len(), |v| {
            let z = _mm256_mul_ps(_mm256_sub_ps(v, _mm256_set1_ps(mean)), _mm256_set1_ps(inv));
            _mm256_normcdf_ps(z)
        })
    };
    Ok(())
}

/// In-place form of [`vscdf`].
pub fn vscdf_mut(mean: f32, sigma: f32, buf: &mut [f32]) {
    let inv = 1.0 / sigma;
    let ptr = buf.as_mut_ptr();
    unsafe {
        map_unary(ptr, ptr, buf.len(), |v| {
            let z = _mm256_mul_ps(_mm256_sub_ps(v, _mm256_set1_ps(mean)), _mm256_set1_ps(inv));
            _mm256_normcdf_ps(z)
        })
    };
}

/// Computes the normal CDF with per-element `mean` and `sigma` into `out`.
///
/// Returns an error when any of the four slices differ in length.
pub fn vscdf_each(mean: &[f32], sigma: &[f32], x: &[f32], out: &mut [f32]) -> Result<()> {
    ensure_same_len(x.len(), mean.len())?;
    ensure_same_len(x.len(), sigma.len())?;
    ensure_same_len(x.len(), out.len())?;
    unsafe {
        map_ternary(
            mean.as_ptr(),
            sigma.as_ptr(),
            x.as_ptr(),
            out.as_mut_ptr(),
            x.len(),
            |m, s, v| _mm256_normcdf_ps(_mm256_div_ps(_mm256_sub_ps(v, m), s)),
        )
    };
    Ok(())
}

/// In-place form of [`vscdf_each`]: standardizes and transforms `buf`.
pub fn vscdf_each_mut(mean: &[f32], sigma: &[f32], buf: &mut [f32]) -> Result<()> {
    ensure_same_len(buf.len(), mean.len())?;
    ensure_same_len(buf.len(), sigma.len())?;
    let ptr = buf.as_mut_ptr();
    unsafe {
        map_ternary(mean.as_ptr(), sigma.as_ptr(), ptr, ptr, buf.len(), |m, s, v| {
            _mm256_normcdf_ps(_mm256_div_ps(_mm256_sub_ps(v, m), s))
        })
    };
    Ok(())
}

// ============================================================================
// Polynomial and Chebyshev evaluation
// ============================================================================

/// Evaluates the polynomial with ascending-power `coeffs` at each element of
/// `x` into `out`.
///
/// Returns an error when the lengths differ or `coeffs` is empty.
pub fn vspolyval(x: &[f32], coeffs: &[f32], out: &mut [f32]) -> Result<()> {
    ensure_same_len(x.len(), out.len())?;
    ensure_coeffs(coeffs.len())?;
    unsafe {
        map_unary(x.as_ptr(), out.as_mut_ptr(), x.len(), |v| {
            _mm256_polyval_ps(v, coeffs)
        })
    };
    Ok(())
}

/// In-place form of [`vspolyval`].
pub fn vspolyval_mut(buf: &mut [f32], coeffs: &[f32]) -> Result<()> {
    ensure_coeffs(coeffs.len())?;
    let ptr = buf.as_mut_ptr();
    unsafe { map_unary(ptr, ptr, buf.len(), |v| _mm256_polyval_ps(v, coeffs)) };
    Ok(())
}

/// Evaluates the first derivative of the polynomial with ascending-power
/// `coeffs` at each element of `x` into `out`.
///
/// Returns an error when the lengths differ or `coeffs` is empty.
pub fn vspolyderiv(x: &[f32], coeffs: &[f32], out: &mut [f32]) -> Result<()> {
    ensure_same_len(x.len(), out.len())?;
    let deriv = poly_derivative(coeffs)?;
    if deriv.is_empty() {
        out.fill(0.0);
        return Ok(());
    }
    unsafe {
        map_unary(x.as_ptr(), out.as_mut_ptr(), x.len(), |v| {
            _mm256_polyval_ps(v, &deriv)
        })
    };
    Ok(())
}

/// In-place form of [`vspolyderiv`].
pub fn vspolyderiv_mut(buf: &mut [f32], coeffs: &[f32]) -> Result<()> {
    let deriv = poly_derivative(coeffs)?;
    if deriv.is_empty() {
        buf.fill(0.0);
        return Ok(());
    }
    let ptr = buf.as_mut_ptr();
    unsafe { map_unary(ptr, ptr, buf.len(), |v| _mm256_polyval_ps(v, &deriv)) };
    Ok(())
}

/// Ascending-power coefficients of the derivative; empty for constants.
fn poly_derivative(coeffs: &[f32]) -> Result<Vec<f32>> {
    ensure_coeffs(coeffs.len())?;
    Ok(coeffs
        .iter()
        .enumerate()
        .skip(1)
        .map(|(k, &c)| c * k as f32)
        .collect())
}

/// Evaluates the Chebyshev series with the given `coeffs` at each element of
/// `x` into `out`, smoothly continued outside [-1, 1].
///
/// Returns an error when the lengths differ or `coeffs` is empty.
pub fn vschebyshev(kind: ChebyshevKind, x: &[f32], coeffs: &[f32], out: &mut [f32]) -> Result<()> {
    ensure_same_len(x.len(), out.len())?;
    ensure_coeffs(coeffs.len())?;
    unsafe {
        map_unary(x.as_ptr(), out.as_mut_ptr(), x.len(), |v| {
            _mm256_chebeval_ps(v, coeffs, kind).0
        })
    };
    Ok(())
}

/// Evaluates the derivative of the Chebyshev series with the given `coeffs`
/// at each element of `x` into `out`.
///
/// Returns an error when the lengths differ or `coeffs` is empty.
pub fn vschebyshev_deriv(
    kind: ChebyshevKind,
    x: &[f32],
    coeffs: &[f32],
    out: &mut [f32],
) -> Result<()> {
    ensure_same_len(x.len(), out.len())?;
    ensure_coeffs(coeffs.len())?;
    unsafe {
        map_unary(x.as_ptr(), out.as_mut_ptr(), x.len(), |v| {
            _mm256_chebeval_ps(v, coeffs, kind).1
        })
    };
    Ok(())
}

// ============================================================================
// Vector arithmetic
// ============================================================================

/// Elementwise `out[i] = x[i] + y[i]`.
pub fn vsadd(x: &[f32], y: &[f32], out: &mut [f32]) -> Result<()> {
    ensure_same_len(x.len(), y.len())?;
    ensure_same_len(x.len(), out.len())?;
    unsafe {
        map_binary(x.as_ptr(), y.as_ptr(), out.as_mut_ptr(), x.len(), |a, b| {
            _mm256_add_ps(a, b)
        })
    };
    Ok(())
}

/// Elementwise `out[i] = x[i] - y[i]`.
pub fn vssub(x: &[f32], y: &[f32], out: &mut [f32]) -> Result<()> {
    ensure_same_len(x.len(), y.len())?;
    ensure_same_len(x.len(), out.len())?;
    unsafe {
        map_binary(x.as_ptr(), y.as_ptr(), out.as_mut_ptr(), x.len(), |a, b| {
            _mm256_sub_ps(a, b)
        })
    };
    Ok(())
}

/// Elementwise `out[i] = x[i] * y[i]`.
pub fn vsmul(x: &[f32], y: &[f32], out: &mut [f32]) -> Result<()> {
    ensure_same_len(x.len(), y.len())?;
    ensure_same_len(x.len(), out.len())?;
    unsafe {
        map_binary(x.as_ptr(), y.as_ptr(), out.as_mut_ptr(), x.len(), |a, b| {
            _mm256_mul_ps(a, b)
        })
    };
    Ok(())
}

/// Elementwise `out[i] = alpha * x[i]`.
pub fn vsscal(alpha: f32, x: &[f32], out: &mut [f32]) -> Result<()> {
    ensure_same_len(x.len(), out.len())?;
    unsafe {
        map_unary(x.as_ptr(), out.as_mut_ptr(), x.len(), |v| {
            _mm256_mul_ps(v, _mm256_set1_ps(alpha))
        })
    };
    Ok(())
}

/// Elementwise fused `out[i] = a[i] * b[i] + c[i]`.
pub fn vsfma(a: &[f32], b: &[f32], c: &[f32], out: &mut [f32]) -> Result<()> {
    ensure_same_len(a.len(), b.len())?;
    ensure_same_len(a.len(), c.len())?;
    ensure_same_len(a.len(), out.len())?;
    unsafe {
        map_ternary(
            a.as_ptr(),
            b.as_ptr(),
            c.as_ptr(),
            out.as_mut_ptr(),
            a.len(),
            |va, vb, vc| _mm256_fmadd_ps(va, vb, vc),
        )
    };
    Ok(())
}

/// Dot product of `x` and `y`.
///
/// Accumulates lane-wise with FMA and reduces once at the end; the masked
/// tail lanes read as +0.0, which is sum-neutral.
pub fn vsdot(x: &[f32], y: &[f32]) -> Result<f32> {
    ensure_same_len(x.len(), y.len())?;
    let n = x.len();
    let (a, b) = (x.as_ptr(), y.as_ptr());

    unsafe {
        let mut acc = _mm256_setzero_ps();
        let mut i = 0;
        while i + LANE_COUNT <= n {
            let va = F32x8::load(a.add(i), LANE_COUNT);
            let vb = F32x8::load(b.add(i), LANE_COUNT);
            acc = _mm256_fmadd_ps(va.elements, vb.elements, acc);
            i += LANE_COUNT;
        }
        if i < n {
            let va = F32x8::load_partial(a.add(i), n - i);
            let vb = F32x8::load_partial(b.add(i), n - i);
            acc = _mm256_fmadd_ps(va.elements, vb.elements, acc);
        }
        Ok(hsum_ps(acc))
    }
}

/// Sum of absolute values of `x`.
pub fn vsasum(x: &[f32]) -> f32 {
    let n = x.len();
    let p = x.as_ptr();

    unsafe {
        let mut acc = _mm256_setzero_ps();
        let mut i = 0;
        while i + LANE_COUNT <= n {
            let v = F32x8::load(p.add(i), LANE_COUNT);
            acc = _mm256_add_ps(acc, _mm256_abs_ps(v.elements));
            i += LANE_COUNT;
        }
        if i < n {
            let v = F32x8::load_partial(p.add(i), n - i);
            acc = _mm256_add_ps(acc, _mm256_abs_ps(v.elements));
        }
        hsum_ps(acc)
    }
}

/// Sets every element of `out` to `alpha`.
pub fn vsfill(alpha: f32, out: &mut [f32]) {
    let ptr = out.as_mut_ptr();
    unsafe {
        map_unary(ptr, ptr, out.len(), |_| _mm256_set1_ps(alpha));
    }
}

/// Copies `x` into `out`.
pub fn vscopy(x: &[f32], out: &mut [f32]) -> Result<()> {
    ensure_same_len(x.len(), out.len())?;
    unsafe { map_unary(x.as_ptr(), out.as_mut_ptr(), x.len(), |v| v) };
    Ok(())
}

// ============================================================================
// Allocating trait surface
// ============================================================================

macro_rules! simd_math_method {
    ($name:ident, $kernel:ident) => {
        fn $name(&self) -> Self::Output {
            let mut out = alloc_uninit_vec::<f32>(self.len(), AVX_ALIGNMENT);
            unsafe {
                map_unary(self.as_ptr(), out.as_mut_ptr(), self.len(), |v| $kernel(v))
            };
            out
        }
    };
}

impl SimdMath for [f32] {
    type Output = Vec<f32>;

    simd_math_method!(exp, _mm256_exp_ps);
    simd_math_method!(exp2, _mm256_exp2_ps);
    simd_math_method!(ln, _mm256_ln_ps);
    simd_math_method!(log2, _mm256_log2_ps);
    simd_math_method!(sin, _mm256_sin_ps);
    simd_math_method!(cos, _mm256_cos_ps);
    simd_math_method!(tan, _mm256_tan_ps);
    simd_math_method!(atan, _mm256_atan_ps);
    simd_math_method!(sqrt, _mm256_sqrt_ps);
    simd_math_method!(erf, _mm256_erf_ps);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VectorMathError;

    #[test]
    fn test_length_mismatch_is_an_error() {
        let x = [1.0f32; 9];
        let mut out = [0.0f32; 8];
        assert_eq!(
            vsexp(&x, &mut out),
            Err(VectorMathError::LengthMismatch {
                expected: 9,
                found: 8
            })
        );
    }

    #[test]
    fn test_masked_path_never_touches_output_tail() {
        let x = [1.0f32, 2.0, 3.0, 4.0, 5.0];
        let mut out = [9.0f32; 8];
        vssqrt(&x, &mut out[..5]).unwrap();
        assert_eq!(&out[5..], &[9.0, 9.0, 9.0]);
    }

    #[test]
    fn test_in_place_matches_out_of_place() {
        let x: Vec<f32> = (0..37).map(|i| i as f32 * 0.21 - 3.0).collect();
        let mut out = vec![0.0f32; x.len()];
        vsexp(&x, &mut out).unwrap();

        let mut buf = x.clone();
        vsexp_mut(&mut buf);
        assert_eq!(out, buf);
    }

    #[test]
    fn test_dot_and_asum() {
        let x = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let y = [1.0f32; 9];
        assert_eq!(vsdot(&x, &y).unwrap(), 45.0);
        assert_eq!(vsasum(&[-1.0f32, 2.0, -3.0]), 6.0);
    }

    #[test]
    fn test_fill_and_copy() {
        let mut out = [0.0f32; 11];
        vsfill(2.5, &mut out);
        assert!(out.iter().all(|&v| v == 2.5));

        let mut dst = [0.0f32; 11];
        vscopy(&out, &mut dst).unwrap();
        assert_eq!(out, dst);
    }
}
