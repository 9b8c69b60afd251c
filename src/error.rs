//! Error types for lanemath operations.
//!
//! Drivers validate their arguments up front and report misuse through these
//! types instead of panicking or reading out of bounds. Numerical domain
//! issues (negative logarithms, overflowing exponentials, ...) are never
//! errors; they produce the IEEE 754 special values documented per kernel.

use std::fmt;

/// Errors that can occur during lanemath operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VectorMathError {
    /// Input and output slices disagree on length.
    LengthMismatch {
        /// Length of the reference (input) slice.
        expected: usize,
        /// Length of the offending slice.
        found: usize,
    },
    /// A polynomial or Chebyshev operation received no coefficients.
    EmptyCoefficients,
}

impl fmt::Display for VectorMathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorMathError::LengthMismatch { expected, found } => write!(
                f,
                "Slice length mismatch: expected {expected} elements, found {found}"
            ),
            VectorMathError::EmptyCoefficients => {
                write!(f, "Coefficient slice must contain at least one element")
            }
        }
    }
}

impl std::error::Error for VectorMathError {}

/// Result type alias for lanemath operations.
pub type Result<T> = std::result::Result<T, VectorMathError>;

/// Checks that two slice lengths agree before a driver touches memory.
#[inline(always)]
pub(crate) fn ensure_same_len(expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(VectorMathError::LengthMismatch { expected, found })
    }
}

/// Rejects empty coefficient slices for polynomial evaluation.
#[inline(always)]
pub(crate) fn ensure_coeffs(coeffs_len: usize) -> Result<()> {
    if coeffs_len > 0 {
        Ok(())
    } else {
        Err(VectorMathError::EmptyCoefficients)
    }
}
