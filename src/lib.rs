//! # lanemath
//!
//! Batch, SIMD-vectorized elementary math functions over `f32` and `f64`
//! slices: exponentials, logarithms, trigonometry, the error function and
//! normal CDF, square roots, polynomial and Chebyshev evaluation, plus basic
//! vector arithmetic (add, scale, dot, ...).
//!
//! Two API styles are offered:
//!
//! - **Validated drivers** with MKL-style names: `vd*` for `f64`, `vs*` for
//!   `f32`. These write into a caller-provided output slice and return
//!   [`Result`], e.g. [`vdexp`](crate::vdexp). Each has a `_mut` twin that
//!   transforms a buffer in place.
//! - **Allocating methods** through the [`SimdMath`] trait on slices, e.g.
//!   `data.sin()` returning a fresh `Vec`.
//!
//! The backend is chosen at build time: an AVX2 path processing 8 `f32` or
//! 4 `f64` lanes per instruction, or a portable scalar path with the same
//! semantics everywhere else.
//!
//! ```
//! use lanemath::{vdexp, SimdMath};
//!
//! let x = vec![0.0f64, 1.0, -1.0];
//! let mut y = vec![0.0f64; 3];
//! vdexp(&x, &mut y).unwrap();
//! assert!((y[1] - std::f64::consts::E).abs() < 1e-15);
//!
//! let s = x.sin();
//! assert_eq!(s.len(), 3);
//! ```

pub mod error;
pub mod simd;

pub(crate) mod utils;

pub use error::{Result, VectorMathError};
pub use simd::*;
