//! AVX2 4-lane f64 SIMD vector implementation.
//!
//! `F64x4` wraps Intel's 256-bit `__m256d` register together with the number
//! of valid lanes, so slice tails shorter than four elements move through the
//! same type via masked loads and stores. Four packed double-precision values
//! are processed per instruction.
//!
//! # Architecture Requirements
//!
//! - **CPU Support**: Intel Haswell (2013+) or AMD Excavator (2015+)
//! - **Compilation**: AVX2 and FMA enabled by the build script

#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use std::ops::{Add, Div, Mul, Sub};

use crate::simd::{Alignment, SimdLoad, SimdStore};

/// AVX2 memory alignment requirement in bytes.
pub(crate) const AVX_ALIGNMENT: usize = 32;

/// Number of f64 elements that fit in an AVX2 256-bit vector.
pub(crate) const LANE_COUNT: usize = 4;

/// AVX2 SIMD vector containing 4 packed f64 values.
///
/// Maintains both the register and the count of valid elements so that
/// partial vectors at slice boundaries round-trip through masked memory
/// operations without touching adjacent memory.
#[derive(Copy, Clone, Debug)]
pub struct F64x4 {
    /// Number of valid elements in the vector (1-4)
    pub size: usize,
    /// AVX2 256-bit vector register containing 4 packed f64 values
    pub elements: __m256d,
}

impl Alignment<f64> for F64x4 {
    /// Checks if a pointer is 32-byte aligned for AVX2 operations.
    #[inline(always)]
    fn is_aligned(ptr: *const f64) -> bool {
        let ptr = ptr as usize;

        ptr % core::mem::align_of::<__m256d>() == 0
    }
}

impl From<&[f64]> for F64x4 {
    /// Creates an F64x4 from a slice, choosing a full or masked load based on
    /// the slice length.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the slice is empty.
    fn from(slice: &[f64]) -> Self {
        debug_assert!(!slice.is_empty(), "data pointer can't be NULL");

        let size = slice.len();

        match slice.len().cmp(&LANE_COUNT) {
            std::cmp::Ordering::Less => unsafe { Self::load_partial(slice.as_ptr(), size) },
            std::cmp::Ordering::Equal | std::cmp::Ordering::Greater => unsafe {
                Self::load(slice.as_ptr(), LANE_COUNT)
            },
        }
    }
}

impl SimdLoad<f64> for F64x4 {
    type Output = Self;

    /// Loads exactly 4 elements, dispatching on pointer alignment.
    #[inline(always)]
    unsafe fn load(ptr: *const f64, size: usize) -> Self::Output {
        debug_assert!(size == LANE_COUNT, "Size must be == {LANE_COUNT}");
        debug_assert!(!ptr.is_null(), "Pointer must not be null");

        match F64x4::is_aligned(ptr) {
            true => Self::load_aligned(ptr),
            false => Self::load_unaligned(ptr),
        }
    }

    /// Loads 4 elements from 32-byte aligned memory.
    #[inline(always)]
    unsafe fn load_aligned(ptr: *const f64) -> Self::Output {
        Self {
            elements: _mm256_load_pd(ptr),
            size: LANE_COUNT,
        }
    }

    /// Loads 4 elements from unaligned memory.
    #[inline(always)]
    unsafe fn load_unaligned(ptr: *const f64) -> Self::Output {
        Self {
            elements: _mm256_loadu_pd(ptr),
            size: LANE_COUNT,
        }
    }

    /// Loads fewer than 4 elements with a masked load. Lanes past `size`
    /// read as zero; memory past `size` is never dereferenced.
    #[inline(always)]
    unsafe fn load_partial(ptr: *const f64, size: usize) -> Self::Output {
        debug_assert!(size < LANE_COUNT, "Size must be < {LANE_COUNT}");
        debug_assert!(!ptr.is_null(), "Pointer must not be null");

        let mask = match size {
            1 => _mm256_setr_epi64x(-1, 0, 0, 0),
            2 => _mm256_setr_epi64x(-1, -1, 0, 0),
            3 => _mm256_setr_epi64x(-1, -1, -1, 0),
            _ => unreachable!(),
        };

        Self {
            elements: _mm256_maskload_pd(ptr, mask),
            size,
        }
    }
}

impl SimdStore<f64> for F64x4 {
    /// Stores the vector's valid elements, dispatching between partial,
    /// aligned and unaligned forms.
    #[inline(always)]
    unsafe fn store_at(&self, ptr: *mut f64) {
        debug_assert!(self.size <= LANE_COUNT, "Size must be <= {LANE_COUNT}");
        debug_assert!(!ptr.is_null(), "Pointer must not be null");

        match self.size.cmp(&LANE_COUNT) {
            std::cmp::Ordering::Less => self.store_at_partial(ptr),
            std::cmp::Ordering::Equal => match F64x4::is_aligned(ptr) {
                true => self.store_aligned_at(ptr),
                false => self.store_unaligned_at(ptr),
            },
            std::cmp::Ordering::Greater => unreachable!("Size cannot exceed LANE_COUNT"),
        }
    }

    /// Stores 4 elements to 32-byte aligned memory.
    #[inline(always)]
    unsafe fn store_aligned_at(&self, ptr: *mut f64) {
        _mm256_store_pd(ptr, self.elements)
    }

    /// Stores 4 elements to unaligned memory.
    #[inline(always)]
    unsafe fn store_unaligned_at(&self, ptr: *mut f64) {
        _mm256_storeu_pd(ptr, self.elements)
    }

    /// Stores only the valid elements with a masked store. Memory past
    /// `self.size` is never written.
    #[inline(always)]
    unsafe fn store_at_partial(&self, ptr: *mut f64) {
        debug_assert!(self.size < LANE_COUNT, "Size must be < {LANE_COUNT}");
        debug_assert!(!ptr.is_null(), "Pointer must not be null");

        let mask = match self.size {
            1 => _mm256_setr_epi64x(-1, 0, 0, 0),
            2 => _mm256_setr_epi64x(-1, -1, 0, 0),
            3 => _mm256_setr_epi64x(-1, -1, -1, 0),
            _ => unreachable!(),
        };

        _mm256_maskstore_pd(ptr, mask, self.elements);
    }
}

impl Add for F64x4 {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        debug_assert!(self.size == rhs.size, "Operands must have the same size");
        Self {
            size: self.size,
            elements: unsafe { _mm256_add_pd(self.elements, rhs.elements) },
        }
    }
}

impl Sub for F64x4 {
    type Output = Self;

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self::Output {
        debug_assert!(self.size == rhs.size, "Operands must have the same size");
        Self {
            size: self.size,
            elements: unsafe { _mm256_sub_pd(self.elements, rhs.elements) },
        }
    }
}

impl Mul for F64x4 {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self::Output {
        debug_assert!(self.size == rhs.size, "Operands must have the same size");
        Self {
            size: self.size,
            elements: unsafe { _mm256_mul_pd(self.elements, rhs.elements) },
        }
    }
}

impl Div for F64x4 {
    type Output = Self;

    #[inline(always)]
    fn div(self, rhs: Self) -> Self::Output {
        debug_assert!(self.size == rhs.size, "Operands must have the same size");
        Self {
            size: self.size,
            elements: unsafe { _mm256_div_pd(self.elements, rhs.elements) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_array(v: F64x4) -> [f64; 4] {
        let mut out = [0.0f64; 4];
        unsafe { _mm256_storeu_pd(out.as_mut_ptr(), v.elements) };
        out
    }

    #[test]
    fn test_from_full_slice() {
        let data = [1.0f64, 2.0, 3.0, 4.0];
        let v = F64x4::from(data.as_slice());
        assert_eq!(v.size, 4);
        assert_eq!(to_array(v), data);
    }

    #[test]
    fn test_load_partial_zero_fills() {
        let data = [7.0f64, 8.0];
        let v = unsafe { F64x4::load_partial(data.as_ptr(), 2) };
        assert_eq!(v.size, 2);
        assert_eq!(to_array(v), [7.0, 8.0, 0.0, 0.0]);
    }

    #[test]
    fn test_store_at_partial_leaves_tail_untouched() {
        let data = [1.0f64, 2.0, 3.0];
        let v = unsafe { F64x4::load_partial(data.as_ptr(), 3) };

        let mut out = [-1.0f64; 4];
        unsafe { v.store_at_partial(out.as_mut_ptr()) };
        assert_eq!(out, [1.0, 2.0, 3.0, -1.0]);
    }

    #[test]
    fn test_store_round_trip_unaligned() {
        let data = [0.5f64, -0.5, 1.5, -1.5, 9.0];
        let v = unsafe { F64x4::load(data[1..].as_ptr(), 4) };

        let mut out = [0.0f64; 4];
        unsafe { v.store_at(out.as_mut_ptr()) };
        assert_eq!(out, [-0.5, 1.5, -1.5, 9.0]);
    }

    #[test]
    fn test_arithmetic_operators() {
        let a = F64x4::from([1.0f64, 2.0, 3.0, 4.0].as_slice());
        let b = F64x4::from([4.0f64, 3.0, 2.0, 1.0].as_slice());

        assert_eq!(to_array(a + b), [5.0, 5.0, 5.0, 5.0]);
        assert_eq!(to_array(a - b), [-3.0, -1.0, 1.0, 3.0]);
        assert_eq!(to_array(a * b), [4.0, 6.0, 6.0, 4.0]);
        assert_eq!(to_array(a / b), [0.25, 2.0 / 3.0, 1.5, 4.0]);
    }
}
