//! Backend selection and the shared public surface.
//!
//! Exactly one backend module is compiled per build. The build script probes
//! the host CPU and emits a `cfg` flag: `avx2` activates the 256-bit
//! vectorized backend, anything else falls back to the portable scalar
//! backend with identical semantics and API.

pub mod traits;

#[cfg(avx2)]
pub mod avx2;

#[cfg(not(avx2))]
pub mod scalar;

pub use traits::{Alignment, SimdLoad, SimdMath, SimdStore};

#[cfg(avx2)]
pub use avx2::slice::*;
#[cfg(avx2)]
pub use avx2::slice64::*;

#[cfg(not(avx2))]
pub use scalar::*;

/// Chebyshev polynomial family selector for the `*chebyshev*` drivers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChebyshevKind {
    /// Chebyshev polynomials of the first kind, T_k.
    First,
    /// Chebyshev polynomials of the second kind, U_k.
    Second,
}
