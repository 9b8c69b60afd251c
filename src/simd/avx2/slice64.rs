//! AVX2 array drivers for f64 slices.
//!
//! Every public function here follows the same block schedule, implemented
//! once in the generic `map_*` drivers and instantiated per kernel through a
//! closure:
//!
//! - empty input: no-op
//! - fewer than 4 elements: one masked load / kernel call / masked store,
//!   output positions past the length are never written
//! - otherwise: manually unrolled blocks of 16, then blocks of 4, then (for
//!   lengths that are not a multiple of 4) one full 4-wide window ending
//!   exactly at the last element
//!
//! The final window overlaps the last full block, so its input register is
//! loaded before the main loops run. That keeps the re-computation correct
//! for the `_mut` in-place forms, where the loops are rewriting the buffer
//! they read from. No scalar per-element loop exists on any path.
//!
//! Validated drivers use MKL-style `vd` names and return [`Result`]; the
//! allocating [`SimdMath`] methods wrap the same drivers over a fresh
//! aligned `Vec`.

#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use crate::error::{ensure_coeffs, ensure_same_len, Result};
use crate::simd::avx2::f64x4::{F64x4, AVX_ALIGNMENT, LANE_COUNT};
use crate::simd::avx2::math64::*;
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
unsafe fn map_unary<F>(x: *const f64, out: *mut f64, n: usize, f: F)
where
    F: Fn(__m256d) -> __m256d,
{
    if n == 0 {
        return;
    }

    if n < LANE_COUNT {
        let v = F64x4::load_partial(x, n);
        F64x4 {
            size: n,
            elements: f(v.elements),
        }
        .store_at_partial(out);
        return;
    }

    // Input for the overlapping final window, captured before any store can
    // clobber it when x == out.
    let tail = F64x4::load(x.add(n - LANE_COUNT), LANE_COUNT);

    let mut i = 0;
    while i + UNROLL * LANE_COUNT <= n {
        let v0 = F64x4::load(x.add(i), LANE_COUNT);
        let v1 = F64x4::load(x.add(i + LANE_COUNT), LANE_COUNT);
        let v2 = F64x4::load(x.add(i + 2 * LANE_COUNT), LANE_COUNT);
        let v3 = F64x4::load(x.add(i + 3 * LANE_COUNT), LANE_COUNT);

        full(f(v0.elements)).store_at(out.add(i));
        full(f(v1.elements)).store_at(out.add(i + LANE_COUNT));
        full(f(v2.elements)).store_at(out.add(i + 2 * LANE_COUNT));
        full(f(v3.elements)).store_at(out.add(i + 3 * LANE_COUNT));

        i += UNROLL * LANE_COUNT;
    }

    while i + LANE_COUNT <= n {
        let v = F64x4::load(x.add(i), LANE_COUNT);
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
unsafe fn map_binary<F>(a: *const f64, b: *const f64, out: *mut f64, n: usize, f: F)
where
    F: Fn(__m256d, __m256d) -> __m256d,
{
    if n == 0 {
        return;
    }

    if n < LANE_COUNT {
        let va = F64x4::load_partial(a, n);
        let vb = F64x4::load_partial(b, n);
        F64x4 {
            size: n,
            elements: f(va.elements, vb.elements),
        }
        .store_at_partial(out);
        return;
    }

    let tail_a = F64x4::load(a.add(n - LANE_COUNT), LANE_COUNT);
    let tail_b = F64x4::load(b.add(n - LANE_COUNT), LANE_COUNT);

    let mut i = 0;
    while i + LANE_COUNT <= n {
        let va = F64x4::load(a.add(i), LANE_COUNT);
        let vb = F64x4::load(b.add(i), LANE_COUNT);
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
    a: *const f64,
    b: *const f64,
    c: *const f64,
    out: *mut f64,
    n: usize,
    f: F,
) where
    F: Fn(__m256d, __m256d, __m256d) -> __m256d,
{
    if n == 0 {
        return;
    }

    if n < LANE_COUNT {
        let va = F64x4::load_partial(a, n);
        let vb = F64x4::load_partial(b, n);
        let vc = F64x4::load_partial(c, n);
        F64x4 {
            size: n,
            elements: f(va.elements, vb.elements, vc.elements),
        }
        .store_at_partial(out);
        return;
    }

    let tail_a = F64x4::load(a.add(n - LANE_COUNT), LANE_COUNT);
    let tail_b = F64x4::load(b.add(n - LANE_COUNT), LANE_COUNT);
    let tail_c = F64x4::load(c.add(n - LANE_COUNT), LANE_COUNT);

    let mut i = 0;
    while i + LANE_COUNT <= n {
        let va = F64x4::load(a.add(i), LANE_COUNT);
        let vb = F64x4::load(b.add(i), LANE_COUNT);
        let vc = F64x4::load(c.add(i), LANE_COUNT);
        full(f(va.elements, vb.elements, vc.elements)).store_at(out.add(i));
        i += LANE_COUNT;
    }

    if i < n {
        full(f(tail_a.elements, tail_b.elements, tail_c.elements))
            .store_at(out.add(n - LANE_COUNT));
    }
}

#[inline(always)]
fn full(elements: __m256d) -> F64x4 {
    F64x4 {
        size: LANE_COUNT,
        elements,
    }
}

/// Reduces a 4-lane register to the sum of its lanes.
#[inline(always)]
unsafe fn hsum_pd(v: __m256d) -> f64 {
    let lo = _mm256_castpd256_pd128(v);
    let hi = _mm256_extractf128_pd(v, 1);
    let s = _mm_add_pd(lo, hi);
    _mm_cvtsd_f64(_mm_add_sd(s, _mm_unpackhi_pd(s, s)))
}

// ============================================================================
// Elementwise drivers
// ============================================================================

macro_rules! vd_unary {
    ($(#[$doc:meta])* $name:ident, $name_mut:ident, $kernel:ident) => {
        $(#[$doc])*
        ///
        /// Returns an error when `x` and `out` differ in length.
        pub fn $name(x: &[f64], out: &mut [f64]) -> Result<()> {
            ensure_same_len(x.len(), out.len())?;
            unsafe { map_unary(x.as_ptr(), out.as_mut_ptr(), x.len(), |v| $kernel(v)) };
            Ok(())
        }

        #[doc = concat!("In-place form of [`", stringify!($name), "`]: transforms `buf` elementwise.")]
        pub fn $name_mut(buf: &mut [f64]) {
            let ptr = buf.as_mut_ptr();
            unsafe { map_unary(ptr, ptr, buf.len(), |v| $kernel(v)) };
        }
    };
}

vd_unary!(
    /// Computes the natural exponential of each element of `x` into `out`.
    vdexp,
    vdexp_mut,
    _mm256_exp_pd
);
vd_unary!(
    /// Computes the base-2 exponential of each element of `x` into `out`.
    vdexp2,
    vdexp2_mut,
    _mm256_exp2_pd
);
vd_unary!(
    /// Computes the natural logarithm of each element of `x` into `out`.
    vdln,
    vdln_mut,
    _mm256_ln_pd
);
vd_unary!(
    /// Computes the base-2 logarithm of each element of `x` into `out`.
    vdlog2,
    vdlog2_mut,
    _mm256_log2_pd
);
vd_unary!(
    /// Computes the sine of each element of `x` into `out`.
    vdsin,
    vdsin_mut,
    _mm256_sin_pd
);
vd_unary!(
    /// Computes the cosine of each element of `x` into `out`.
    vdcos,
    vdcos_mut,
    _mm256_cos_pd
);
vd_unary!(
    /// Computes the tangent of each element of `x` into `out`.
    vdtan,
    vdtan_mut,
    _mm256_tan_pd
);
vd_unary!(
    /// Computes the arctangent of each element of `x` into `out`.
    vdatan,
    vdatan_mut,
    _mm256_atan_pd
);
vd_unary!(
    /// Computes the square root of each element of `x` into `out`.
    vdsqrt,
    vdsqrt_mut,
    _mm256_sqrt_pd
);
vd_unary!(
    /// Computes the error function of each element of `x` into `out`.
    vderf,
    vderf_mut,
    _mm256_erf_pd
);

// ============================================================================
// Normal CDF
// ============================================================================

/// Computes the normal CDF with scalar `mean` and `sigma` for each element
/// of `x` into `out`.
///
/// Standardizes with one fused multiply per lane (inv = 1/sigma) and feeds
/// the standard-normal CDF kernel.
///
/// Returns an error when `x` and `out` differ in length.
pub fn vdcdf(mean: f64, sigma: f64, x: &[f64], out: &mut [f64]) -> Result<()> {
    ensure_same_len(x.len(), out.len())?;
    let inv = 1.0 / sigma;
    unsafe {
        map_unary(x.as_ptr(), out.as_mut_ptr(), x.len(), |v| {
            let z = _mm256_mul_pd(_mm256_sub_pd(v, _mm256_set1_pd(mean)), _mm256_set1_pd(inv));
            _mm256_normcdf_pd(z)
        })
    };
    Ok(())
}

/// In-place form of [`vdcdf`].
pub fn vdcdf_mut(mean: f64, sigma: f64, buf: &mut [f64]) {
    let inv = 1.0 / sigma;
    let ptr = buf.as_mut_ptr();
    unsafe {
        map_unary(ptr, ptr, buf.len(), |v| {
            let z = _mm256_mul_pd(_mm256_sub_pd(v, _mm256_set1_pd(mean)), _mm256_set1_pd(inv));
            _mm256_normcdf_pd(z)
        })
    };
}

/// Computes the normal CDF with per-element `mean` and `sigma` into `out`.
///
/// Returns an error when any of the four slices differ in length.
pub fn vdcdf_each(mean: &[f64], sigma: &[f64], x: &[f64], out: &mut [f64]) -> Result<()> {
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
            |m, s, v| _mm256_normcdf_pd(_mm256_div_pd(_mm256_sub_pd(v, m), s)),
        )
    };
    Ok(())
}

/// In-place form of [`vdcdf_each`]: standardizes and transforms `buf`.
pub fn vdcdf_each_mut(mean: &[f64], sigma: &[f64], buf: &mut [f64]) -> Result<()> {
    ensure_same_len(buf.len(), mean.len())?;
    ensure_same_len(buf.len(), sigma.len())?;
    let ptr = buf.as_mut_ptr();
    unsafe {
        map_ternary(mean.as_ptr(), sigma.as_ptr(), ptr, ptr, buf.len(), |m, s, v| {
            _mm256_normcdf_pd(_mm256_div_pd(_mm256_sub_pd(v, m), s))
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
pub fn vdpolyval(x: &[f64], coeffs: &[f64], out: &mut [f64]) -> Result<()> {
    ensure_same_len(x.len(), out.len())?;
    ensure_coeffs(coeffs.len())?;
    unsafe {
        map_unary(x.as_ptr(), out.as_mut_ptr(), x.len(), |v| {
            _mm256_polyval_pd(v, coeffs)
        })
    };
    Ok(())
}

/// In-place form of [`vdpolyval`].
pub fn vdpolyval_mut(buf: &mut [f64], coeffs: &[f64]) -> Result<()> {
    ensure_coeffs(coeffs.len())?;
    let ptr = buf.as_mut_ptr();
    unsafe { map_unary(ptr, ptr, buf.len(), |v| _mm256_polyval_pd(v, coeffs)) };
    Ok(())
}

/// Evaluates the first derivative of the polynomial with ascending-power
/// `coeffs` at each element of `x` into `out`.
///
/// Returns an error when the lengths differ or `coeffs` is empty.
pub fn vdpolyderiv(x: &[f64], coeffs: &[f64], out: &mut [f64]) -> Result<()> {
    ensure_same_len(x.len(), out.len())?;
    let deriv = poly_derivative(coeffs)?;
    if deriv.is_empty() {
        out.fill(0.0);
        return Ok(());
    }
    unsafe {
        map_unary(x.as_ptr(), out.as_mut_ptr(), x.len(), |v| {
            _mm256_polyval_pd(v, &deriv)
        })
    };
    Ok(())
}

/// In-place form of [`vdpolyderiv`].
pub fn vdpolyderiv_mut(buf: &mut [f64], coeffs: &[f64]) -> Result<()> {
    let deriv = poly_derivative(coeffs)?;
    if deriv.is_empty() {
        buf.fill(0.0);
        return Ok(());
    }
    let ptr = buf.as_mut_ptr();
    unsafe { map_unary(ptr, ptr, buf.len(), |v| _mm256_polyval_pd(v, &deriv)) };
    Ok(())
}

/// Ascending-power coefficients of the derivative; empty for constants.
fn poly_derivative(coeffs: &[f64]) -> Result<Vec<f64>> {
    ensure_coeffs(coeffs.len())?;
    Ok(coeffs
        .iter()
        .enumerate()
        .skip(1)
        .map(|(k, &c)| c * k as f64)
        .collect())
}

/// Evaluates the Chebyshev series with the given `coeffs` at each element of
/// `x` into `out`, smoothly continued outside [-1, 1].
///
/// Returns an error when the lengths differ or `coeffs` is empty.
pub fn vdchebyshev(kind: ChebyshevKind, x: &[f64], coeffs: &[f64], out: &mut [f64]) -> Result<()> {
    ensure_same_len(x.len(), out.len())?;
    ensure_coeffs(coeffs.len())?;
    unsafe {
        map_unary(x.as_ptr(), out.as_mut_ptr(), x.len(), |v| {
            _mm256_chebeval_pd(v, coeffs, kind).0
        })
    };
    Ok(())
}

/// Evaluates the derivative of the Chebyshev series with the given `coeffs`
/// at each element of `x` into `out`.
///
/// Returns an error when the lengths differ or `coeffs` is empty.
pub fn vdchebyshev_deriv(
    kind: ChebyshevKind,
    x: &[f64],
    coeffs: &[f64],
    out: &mut [f64],
) -> Result<()> {
    ensure_same_len(x.len(), out.len())?;
    ensure_coeffs(coeffs.len())?;
    unsafe {
        map_unary(x.as_ptr(), out.as_mut_ptr(), x.len(), |v| {
            _mm256_chebeval_pd(v, coeffs, kind).1
        })
    };
    Ok(())
}

// ============================================================================
// Vector arithmetic
// ============================================================================

/// Elementwise `out[i] = x[i] + y[i]`.
pub fn vdadd(x: &[f64], y: &[f64], out: &mut [f64]) -> Result<()> {
    ensure_same_len(x.len(), y.len())?;
    ensure_same_len(x.len(), out.len())?;
    unsafe {
        map_binary(x.as_ptr(), y.as_ptr(), out.as_mut_ptr(), x.len(), |a, b| {
            _mm256_add_pd(a, b)
        })
    };
    Ok(())
}

/// Elementwise `out[i] = x[i] - y[i]`.
pub fn vdsub(x: &[f64], y: &[f64], out: &mut [f64]) -> Result<()> {
    ensure_same_len(x.len(), y.len())?;
    ensure_same_len(x.len(), out.len())?;
    unsafe {
        map_binary(x.as_ptr(), y.as_ptr(), out.as_mut_ptr(), x.len(), |a, b| {
            _mm256_sub_pd(a, b)
        })
    };
    Ok(())
}

/// Elementwise `out[i] = x[i] * y[i]`.
pub fn vdmul(x: &[f64], y: &[f64], out: &mut [f64]) -> Result<()> {
    ensure_same_len(x.len(), y.len())?;
    ensure_same_len(x.len(), out.len())?;
    unsafe {
        map_binary(x.as_ptr(), y.as_ptr(), out.as_mut_ptr(), x.len(), |a, b| {
            _mm256_mul_pd(a, b)
        })
    };
    Ok(())
}

/// Elementwise `out[i] = alpha * x[i]`.
pub fn vdscal(alpha: f64, x: &[f64], out: &mut [f64]) -> Result<()> {
    ensure_same_len(x.len(), out.len())?;
    unsafe {
        map_unary(x.as_ptr(), out.as_mut_ptr(), x.len(), |v| {
            _mm256_mul_pd(v, _mm256_set1_pd(alpha))
        })
    };
    Ok(())
}

/// Elementwise fused `out[i] = a[i] * b[i] + c[i]`.
pub fn vdfma(a: &[f64], b: &[f64], c: &[f64], out: &mut [f64]) -> Result<()> {
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
            |va, vb, vc| _mm256_fmadd_pd(va, vb, vc),
        )
    };
    Ok(())
}

/// Dot product of `x` and `y`.
///
/// Accumulates lane-wise with FMA and reduces once at the end; the masked
/// tail lanes read as +0.0, which is sum-neutral.
pub fn vddot(x: &[f64], y: &[f64]) -> Result<f64> {
    ensure_same_len(x.len(), y.len())?;
    let n = x.len();
    let (a, b) = (x.as_ptr(), y.as_ptr());

    unsafe {
        let mut acc = _mm256_setzero_pd();
        let mut i = 0;
        while i + LANE_COUNT <= n {
            let va = F64x4::load(a.add(i), LANE_COUNT);
            let vb = F64x4::load(b.add(i), LANE_COUNT);
            acc = _mm256_fmadd_pd(va.elements, vb.elements, acc);
            i += LANE_COUNT;
        }
        if i < n {
            let va = F64x4::load_partial(a.add(i), n - i);
            let vb = F64x4::load_partial(b.add(i), n - i);
            acc = _mm256_fmadd_pd(va.elements, vb.elements, acc);
        }
        Ok(hsum_pd(acc))
    }
}

/// Sum of absolute values of `x`.
pub fn vdasum(x: &[f64]) -> f64 {
    let n = x.len();
    let p = x.as_ptr();

    unsafe {
        let mut acc = _mm256_setzero_pd();
        let mut i = 0;
        while i + LANE_COUNT <= n {
            let v = F64x4::load(p.add(i), LANE_COUNT);
            acc = _mm256_add_pd(acc, _mm256_abs_pd(v.elements));
            i += LANE_COUNT;
        }
        if i < n {
            let v = F64x4::load_partial(p.add(i), n - i);
            acc = _mm256_add_pd(acc, _mm256_abs_pd(v.elements));
        }
        hsum_pd(acc)
    }
}

/// Sets every element of `out` to `alpha`.
pub fn vdfill(alpha: f64, out: &mut [f64]) {
    let ptr = out.as_mut_ptr();
    unsafe {
        map_unary(ptr, ptr, out.len(), |_| _mm256_set1_pd(alpha));
    }
}

/// Copies `x` into `out`.
pub fn vdcopy(x: &[f64], out: &mut [f64]) -> Result<()> {
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
            let mut out = alloc_uninit_vec::<f64>(self.len(), AVX_ALIGNMENT);
            unsafe {
                map_unary(self.as_ptr(), out.as_mut_ptr(), self.len(), |v| $kernel(v))
            };
            out
        }
    };
}

impl SimdMath for [f64] {
    type Output = Vec<f64>;

    simd_math_method!(exp, _mm256_exp_pd);
    simd_math_method!(exp2, _mm256_exp2_pd);
    simd_math_method!(ln, _mm256_ln_pd);
    simd_math_method!(log2, _mm256_log2_pd);
    simd_math_method!(sin, _mm256_sin_pd);
    simd_math_method!(cos, _mm256_cos_pd);
    simd_math_method!(tan, _mm256_tan_pd);
    simd_math_method!(atan, _mm256_atan_pd);
    simd_math_method!(sqrt, _mm256_sqrt_pd);
    simd_math_method!(erf, _mm256_erf_pd);
}
