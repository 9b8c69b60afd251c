//! AVX2 backend: 256-bit vector kernels and slice drivers.
//!
//! Compiled only when the build script detects AVX2 (with FMA) on the host.
//! The layout mirrors the two supported precisions: `f32x8`/`math`/`slice`
//! carry the single-precision path, `f64x4`/`math64`/`slice64` the double
//! precision path. Kernels operate on raw `__m256`/`__m256d` registers; the
//! slice modules own memory traversal, validation and the public drivers.

pub mod f32x8;
pub mod f64x4;

#[allow(clippy::excessive_precision)]
pub mod math;

#[allow(clippy::excessive_precision)]
pub mod math64;

pub mod slice;
pub mod slice64;
