//! Portable fallback backend.
//!
//! Compiled when the build script finds no usable SIMD feature set. The
//! public surface is identical to the vectorized backend: the same `vd*` /
//! `vs*` validated drivers, `_mut` in-place forms and allocating [`SimdMath`]
//! methods, with the same length validation and the same IEEE special-value
//! behavior.
//!
//! Elementary functions defer to the standard library through the `num`
//! `Float` bound. The error function and the Chebyshev continuation have no
//! std counterpart, so they use the exact formulas of the vectorized kernels
//! to keep results comparable across backends.

use num::Float;

use crate::error::{ensure_coeffs, ensure_same_len, Result};
use crate::simd::{ChebyshevKind, SimdMath};
use crate::utils::alloc_uninit_vec;

// ============================================================================
// Generic element loops
// ============================================================================

fn unary_into<T: Float>(x: &[T], out: &mut [T], f: impl Fn(T) -> T) -> Result<()> {
    ensure_same_len(x.len(), out.len())?;
    for (o, &v) in out.iter_mut().zip(x.iter()) {
        *o = f(v);
    }
    Ok(())
}

fn unary_in_place<T: Float>(buf: &mut [T], f: impl Fn(T) -> T) {
    for v in buf.iter_mut() {
        *v = f(*v);
    }
}

fn dot<T: Float>(x: &[T], y: &[T]) -> Result<T> {
    ensure_same_len(x.len(), y.len())?;
    Ok(x
        .iter()
        .zip(y.iter())
        .fold(T::zero(), |acc, (&a, &b)| a.mul_add(b, acc)))
}

fn asum<T: Float>(x: &[T]) -> T {
    x.iter().fold(T::zero(), |acc, &v| acc + v.abs())
}

/// Horner evaluation of ascending-power coefficients.
fn polyval<T: Float>(x: T, coeffs: &[T]) -> T {
    coeffs
        .iter()
        .rev()
        .fold(T::zero(), |acc, &c| acc.mul_add(x, c))
}

/// Chebyshev series value and derivative, smoothly continued outside
/// [-1, 1]; same recurrences and continuation as the vectorized kernel.
fn chebeval<T: Float>(t: T, coeffs: &[T], kind: ChebyshevKind) -> (T, T) {
    let one = T::one();
    let two = one + one;
    let tc = t.min(one).max(-one);
    let two_t = tc + tc;

    let mut f_prev = one;
    let mut f_cur = match kind {
        ChebyshevKind::First => tc,
        ChebyshevKind::Second => two_t,
    };
    let mut g_prev = T::zero();
    let mut g_cur = match kind {
        ChebyshevKind::First => one,
        ChebyshevKind::Second => two,
    };

    let mut val = coeffs[0];
    let mut der = T::zero();

    if coeffs.len() > 1 {
        val = coeffs[1].mul_add(f_cur, val);
        der = coeffs[1].mul_add(g_cur, der);
    }

    for &c in &coeffs[2.min(coeffs.len())..] {
        let f_next = two_t.mul_add(f_cur, -f_prev);
        let g_next = two_t.mul_add(g_cur, two * f_cur - g_prev);
        val = c.mul_add(f_next, val);
        der = c.mul_add(g_next, der);
        f_prev = f_cur;
        f_cur = f_next;
        g_prev = g_cur;
        g_cur = g_next;
    }

    let dist = t - tc;
    let decay = (-dist.abs()).exp();
    let grow = if dist < T::zero() {
        decay - one
    } else {
        one - decay
    };

    (der.mul_add(grow, val), der * decay)
}

// ============================================================================
// Error function (Abramowitz & Stegun 7.1.26)
// ============================================================================

macro_rules! erf_impl {
    ($name:ident, $t:ty) => {
        fn $name(x: $t) -> $t {
            const P: $t = 0.3275911;
            const A: [$t; 5] = [
                0.254829592,
                -0.284496736,
                1.421413741,
                -1.453152027,
                1.061405429,
            ];

            let a = x.abs();
            let t = 1.0 / P.mul_add(a, 1.0);
            let poly = t * A.iter().rev().fold(0.0, |acc: $t, &c| acc.mul_add(t, c));
            (-(poly * (-a * a).exp()) + 1.0).copysign(x)
        }
    };
}

erf_impl!(erf64, f64);
erf_impl!(erf32, f32);

// ============================================================================
// Public surface
// ============================================================================

macro_rules! unary_driver {
    ($(#[$doc:meta])* $name:ident, $name_mut:ident, $t:ty, $f:expr) => {
        $(#[$doc])*
        ///
        /// Returns an error when `x` and `out` differ in length.
        pub fn $name(x: &[$t], out: &mut [$t]) -> Result<()> {
            unary_into(x, out, $f)
        }

        #[doc = concat!("In-place form of [`", stringify!($name), "`]: transforms `buf` elementwise.")]
        pub fn $name_mut(buf: &mut [$t]) {
            unary_in_place(buf, $f);
        }
    };
}

macro_rules! scalar_surface {
    (
        $t:ty, $erf:ident,
        $vexp:ident, $vexp_mut:ident, $vexp2:ident, $vexp2_mut:ident,
        $vln:ident, $vln_mut:ident, $vlog2:ident, $vlog2_mut:ident,
        $vsin:ident, $vsin_mut:ident, $vcos:ident, $vcos_mut:ident,
        $vtan:ident, $vtan_mut:ident, $vatan:ident, $vatan_mut:ident,
        $vsqrt:ident, $vsqrt_mut:ident, $verf:ident, $verf_mut:ident,
        $vcdf:ident, $vcdf_mut:ident, $vcdf_each:ident, $vcdf_each_mut:ident,
        $vpolyval:ident, $vpolyval_mut:ident, $vpolyderiv:ident, $vpolyderiv_mut:ident,
        $vcheb:ident, $vcheb_deriv:ident,
        $vadd:ident, $vsub:ident, $vmul:ident, $vscal:ident, $vfma:ident,
        $vdot:ident, $vasum:ident, $vfill:ident, $vcopy:ident
    ) => {
        unary_driver!(
            /// Computes the natural exponential of each element of `x` into `out`.
            $vexp, $vexp_mut, $t, |v: $t| v.exp()
        );
        unary_driver!(
            /// Computes the base-2 exponential of each element of `x` into `out`.
            $vexp2, $vexp2_mut, $t, |v: $t| v.exp2()
        );
        unary_driver!(
            /// Computes the natural logarithm of each element of `x` into `out`.
            $vln, $vln_mut, $t, |v: $t| v.ln()
        );
        unary_driver!(
            /// Computes the base-2 logarithm of each element of `x` into `out`.
            $vlog2, $vlog2_mut, $t, |v: $t| v.log2()
        );
        unary_driver!(
            /// Computes the sine of each element of `x` into `out`.
            $vsin, $vsin_mut, $t, |v: $t| v.sin()
        );
        unary_driver!(
            /// Computes the cosine of each element of `x` into `out`.
            $vcos, $vcos_mut, $t, |v: $t| v.cos()
        );
        unary_driver!(
            /// Computes the tangent of each element of `x` into `out`.
            $vtan, $vtan_mut, $t, |v: $t| v.tan()
        );
        unary_driver!(
            /// Computes the arctangent of each element of `x` into `out`.
            $vatan, $vatan_mut, $t, |v: $t| v.atan()
        );
        unary_driver!(
            /// Computes the square root of each element of `x` into `out`.
            $vsqrt, $vsqrt_mut, $t, |v: $t| v.sqrt()
        );
        unary_driver!(
            /// Computes the error function of each element of `x` into `out`.
            $verf, $verf_mut, $t, $erf
        );

        /// Computes the normal CDF with scalar `mean` and `sigma` for each
        /// element of `x` into `out`.
        ///
        /// Returns an error when `x` and `out` differ in length.
        pub fn $vcdf(mean: $t, sigma: $t, x: &[$t], out: &mut [$t]) -> Result<()> {
            let inv = 1.0 / (sigma * <$t>::sqrt(2.0));
            unary_into(x, out, |v| 0.5 * (1.0 + $erf((v - mean) * inv)))
        }

        #[doc = concat!("In-place form of [`", stringify!($vcdf), "`].")]
        pub fn $vcdf_mut(mean: $t, sigma: $t, buf: &mut [$t]) {
            let inv = 1.0 / (sigma * <$t>::sqrt(2.0));
            unary_in_place(buf, |v| 0.5 * (1.0 + $erf((v - mean) * inv)));
        }

        /// Computes the normal CDF with per-element `mean` and `sigma` into
        /// `out`.
        ///
        /// Returns an error when any of the four slices differ in length.
        pub fn $vcdf_each(mean: &[$t], sigma: &[$t], x: &[$t], out: &mut [$t]) -> Result<()> {
            ensure_same_len(x.len(), mean.len())?;
            ensure_same_len(x.len(), sigma.len())?;
            ensure_same_len(x.len(), out.len())?;
            let sqrt2 = <$t>::sqrt(2.0);
            for (((o, &m), &s), &v) in out
                .iter_mut()
                .zip(mean.iter())
                .zip(sigma.iter())
                .zip(x.iter())
            {
                *o = 0.5 * (1.0 + $erf((v - m) / (s * sqrt2)));
            }
            Ok(())
        }

        #[doc = concat!("In-place form of [`", stringify!($vcdf_each), "`].")]
        pub fn $vcdf_each_mut(mean: &[$t], sigma: &[$t], buf: &mut [$t]) -> Result<()> {
            ensure_same_len(buf.len(), mean.len())?;
            ensure_same_len(buf.len(), sigma.len())?;
            let sqrt2 = <$t>::sqrt(2.0);
            for ((v, &m), &s) in buf.iter_mut().zip(mean.iter()).zip(sigma.iter()) {
                *v = 0.5 * (1.0 + $erf((*v - m) / (s * sqrt2)));
            }
            Ok(())
        }

        /// Evaluates the polynomial with ascending-power `coeffs` at each
        /// element of `x` into `out`.
        ///
        /// Returns an error when the lengths differ or `coeffs` is empty.
        pub fn $vpolyval(x: &[$t], coeffs: &[$t], out: &mut [$t]) -> Result<()> {
            ensure_coeffs(coeffs.len())?;
            unary_into(x, out, |v| polyval(v, coeffs))
        }

        #[doc = concat!("In-place form of [`", stringify!($vpolyval), "`].")]
        pub fn $vpolyval_mut(buf: &mut [$t], coeffs: &[$t]) -> Result<()> {
            ensure_coeffs(coeffs.len())?;
            unary_in_place(buf, |v| polyval(v, coeffs));
            Ok(())
        }

        /// Evaluates the first derivative of the polynomial with
        /// ascending-power `coeffs` at each element of `x` into `out`.
        ///
        /// Returns an error when the lengths differ or `coeffs` is empty.
        pub fn $vpolyderiv(x: &[$t], coeffs: &[$t], out: &mut [$t]) -> Result<()> {
            ensure_coeffs(coeffs.len())?;
            let deriv: Vec<$t> = coeffs
                .iter()
                .enumerate()
                .skip(1)
                .map(|(k, &c)| c * k as $t)
                .collect();
            if deriv.is_empty() {
                ensure_same_len(x.len(), out.len())?;
                out.fill(0.0);
                return Ok(());
            }
            unary_into(x, out, |v| polyval(v, &deriv))
        }

        #[doc = concat!("In-place form of [`", stringify!($vpolyderiv), "`].")]
        pub fn $vpolyderiv_mut(buf: &mut [$t], coeffs: &[$t]) -> Result<()> {
            ensure_coeffs(coeffs.len())?;
            let deriv: Vec<$t> = coeffs
                .iter()
                .enumerate()
                .skip(1)
                .map(|(k, &c)| c * k as $t)
                .collect();
            if deriv.is_empty() {
                buf.fill(0.0);
                return Ok(());
            }
            unary_in_place(buf, |v| polyval(v, &deriv));
            Ok(())
        }

        /// Evaluates the Chebyshev series with the given `coeffs` at each
        /// element of `x` into `out`, smoothly continued outside [-1, 1].
        ///
        /// Returns an error when the lengths differ or `coeffs` is empty.
        pub fn $vcheb(kind: ChebyshevKind, x: &[$t], coeffs: &[$t], out: &mut [$t]) -> Result<()> {
            ensure_coeffs(coeffs.len())?;
            unary_into(x, out, |v| chebeval(v, coeffs, kind).0)
        }

        /// Evaluates the derivative of the Chebyshev series with the given
        /// `coeffs` at each element of `x` into `out`.
        ///
        /// Returns an error when the lengths differ or `coeffs` is empty.
        pub fn $vcheb_deriv(
            kind: ChebyshevKind,
            x: &[$t],
            coeffs: &[$t],
            out: &mut [$t],
        ) -> Result<()> {
            ensure_coeffs(coeffs.len())?;
            unary_into(x, out, |v| chebeval(v, coeffs, kind).1)
        }

        /// Elementwise `out[i] = x[i] + y[i]`.
        pub fn $vadd(x: &[$t], y: &[$t], out: &mut [$t]) -> Result<()> {
            ensure_same_len(x.len(), y.len())?;
            ensure_same_len(x.len(), out.len())?;
            for ((o, &a), &b) in out.iter_mut().zip(x.iter()).zip(y.iter()) {
                *o = a + b;
            }
            Ok(())
        }

        /// Elementwise `out[i] = x[i] - y[i]`.
        pub fn $vsub(x: &[$t], y: &[$t], out: &mut [$t]) -> Result<()> {
            ensure_same_len(x.len(), y.len())?;
            ensure_same_len(x.len(), out.len())?;
            for ((o, &a), &b) in out.iter_mut().zip(x.iter()).zip(y.iter()) {
                *o = a - b;
            }
            Ok(())
        }

        /// Elementwise `out[i] = x[i] * y[i]`.
        pub fn $vmul(x: &[$t], y: &[$t], out: &mut [$t]) -> Result<()> {
            ensure_same_len(x.len(), y.len())?;
            ensure_same_len(x.len(), out.len())?;
            for ((o, &a), &b) in out.iter_mut().zip(x.iter()).zip(y.iter()) {
                *o = a * b;
            }
            Ok(())
        }

        /// Elementwise `out[i] = alpha * x[i]`.
        pub fn $vscal(alpha: $t, x: &[$t], out: &mut [$t]) -> Result<()> {
            unary_into(x, out, |v| alpha * v)
        }

        /// Elementwise fused `out[i] = a[i] * b[i] + c[i]`.
        pub fn $vfma(a: &[$t], b: &[$t], c: &[$t], out: &mut [$t]) -> Result<()> {
            ensure_same_len(a.len(), b.len())?;
            ensure_same_len(a.len(), c.len())?;
            ensure_same_len(a.len(), out.len())?;
            for (((o, &va), &vb), &vc) in out.iter_mut().zip(a.iter()).zip(b.iter()).zip(c.iter()) {
                *o = va.mul_add(vb, vc);
            }
            Ok(())
        }

        /// Dot product of `x` and `y`.
        pub fn $vdot(x: &[$t], y: &[$t]) -> Result<$t> {
            dot(x, y)
        }

        /// Sum of absolute values of `x`.
        pub fn $vasum(x: &[$t]) -> $t {
            asum(x)
        }

        /// Sets every element of `out` to `alpha`.
        pub fn $vfill(alpha: $t, out: &mut [$t]) {
            out.fill(alpha);
        }

        /// Copies `x` into `out`.
        pub fn $vcopy(x: &[$t], out: &mut [$t]) -> Result<()> {
            ensure_same_len(x.len(), out.len())?;
            out.copy_from_slice(x);
            Ok(())
        }

        impl SimdMath for [$t] {
            type Output = Vec<$t>;

            fn exp(&self) -> Self::Output {
                alloc_map(self, |v: $t| v.exp())
            }
            fn exp2(&self) -> Self::Output {
                alloc_map(self, |v: $t| v.exp2())
            }
            fn ln(&self) -> Self::Output {
                alloc_map(self, |v: $t| v.ln())
            }
            fn log2(&self) -> Self::Output {
                alloc_map(self, |v: $t| v.log2())
            }
            fn sin(&self) -> Self::Output {
                alloc_map(self, |v: $t| v.sin())
            }
            fn cos(&self) -> Self::Output {
                alloc_map(self, |v: $t| v.cos())
            }
            fn tan(&self) -> Self::Output {
                alloc_map(self, |v: $t| v.tan())
            }
            fn atan(&self) -> Self::Output {
                alloc_map(self, |v: $t| v.atan())
            }
            fn sqrt(&self) -> Self::Output {
                alloc_map(self, |v: $t| v.sqrt())
            }
            fn erf(&self) -> Self::Output {
                alloc_map(self, $erf)
            }
        }
    };
}

/// 32-byte aligned output, for parity with the vectorized backend.
fn alloc_map<T: Float + Default>(x: &[T], f: impl Fn(T) -> T) -> Vec<T> {
    let mut out = alloc_uninit_vec::<T>(x.len(), 32);
    for (o, &v) in out.iter_mut().zip(x.iter()) {
        *o = f(v);
    }
    out
}

scalar_surface!(
    f64, erf64, vdexp, vdexp_mut, vdexp2, vdexp2_mut, vdln, vdln_mut, vdlog2, vdlog2_mut, vdsin,
    vdsin_mut, vdcos, vdcos_mut, vdtan, vdtan_mut, vdatan, vdatan_mut, vdsqrt, vdsqrt_mut, vderf,
    vderf_mut, vdcdf, vdcdf_mut, vdcdf_each, vdcdf_each_mut, vdpolyval, vdpolyval_mut, vdpolyderiv,
    vdpolyderiv_mut, vdchebyshev, vdchebyshev_deriv, vdadd, vdsub, vdmul, vdscal, vdfma, vddot,
    vdasum, vdfill, vdcopy
);

scalar_surface!(
    f32, erf32, vsexp, vsexp_mut, vsexp2, vsexp2_mut, vsln, vsln_mut, vslog2, vslog2_mut, vssin,
    vssin_mut, vscos, vscos_mut, vstan, vstan_mut, vsatan, vsatan_mut, vssqrt, vssqrt_mut, vserf,
    vserf_mut, vscdf, vscdf_mut, vscdf_each, vscdf_each_mut, vspolyval, vspolyval_mut, vspolyderiv,
    vspolyderiv_mut, vschebyshev, vschebyshev_deriv, vsadd, vssub, vsmul, vsscal, vsfma, vsdot,
    vsasum, vsfill, vscopy
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erf_reference_points() {
        assert!((erf64(1.0) - 0.8427007929497149).abs() < 1.5e-7);
        assert!((erf64(-1.0) + 0.8427007929497149).abs() < 1.5e-7);
        assert_eq!(erf64(f64::INFINITY), 1.0);
        assert_eq!(erf64(f64::NEG_INFINITY), -1.0);
        assert!(erf64(f64::NAN).is_nan());
    }

    #[test]
    fn test_chebyshev_matches_monomials() {
        // 1*T0 + 2*T1 + 3*T2 at t: 3*(2t^2 - 1) + 2t + 1
        let coeffs = [1.0f64, 2.0, 3.0];
        let t = 0.4;
        let (val, der) = chebeval(t, &coeffs, ChebyshevKind::First);
        assert!((val - (6.0 * t * t + 2.0 * t - 2.0)).abs() < 1e-14);
        assert!((der - (12.0 * t + 2.0)).abs() < 1e-14);
    }

    #[test]
    fn test_cdf_specials() {
        let x = [f64::NEG_INFINITY, 0.0, f64::INFINITY, f64::NAN];
        let mut out = [0.0f64; 4];
        vdcdf(0.0, 1.0, &x, &mut out).unwrap();
        assert_eq!(out[0], 0.0);
        assert!((out[1] - 0.5).abs() < 1e-9);
        assert_eq!(out[2], 1.0);
        assert!(out[3].is_nan());
    }

    #[test]
    fn test_dot_matches_fma_sum() {
        let x = [1.0f64, 2.0, 3.0];
        let y = [4.0f64, 5.0, 6.0];
        assert_eq!(vddot(&x, &y).unwrap(), 32.0);
    }
}
