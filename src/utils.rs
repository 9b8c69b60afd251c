//! Aligned memory allocation helpers.
//!
//! The allocating API variants hand back plain `Vec`s whose storage is
//! 32-byte aligned so that full-width AVX2 stores land on aligned addresses.

#[cfg(not(target_os = "windows"))]
use std::alloc::{alloc, handle_alloc_error, Layout};

/// Fast zero-copy aligned vector allocation for Linux/Mac platforms.
///
/// Returns a `Vec<T>` of length `len` whose backing storage honors `align`.
/// The memory is uninitialized; every element must be written before it is
/// read. The drivers in this crate write all `len` elements exactly once.
///
/// # Panics
///
/// Panics if `align` is not a power of two or if allocation fails.
#[cfg(not(target_os = "windows"))]
pub(crate) fn alloc_uninit_vec<T>(len: usize, align: usize) -> Vec<T> {
    if len == 0 {
        return Vec::new();
    }

    let layout = Layout::from_size_align(len * std::mem::size_of::<T>(), align)
        .expect("Invalid layout for aligned allocation");

    let ptr = unsafe { alloc(layout) as *mut T };

    if ptr.is_null() {
        handle_alloc_error(layout);
    }

    // SAFETY:
    // - ptr is non-null and properly aligned
    // - len elements of size T were allocated
    // - Memory is uninitialized - caller must initialize before use
    // - On Linux/Mac, Vec uses the same allocator as std::alloc::alloc
    unsafe { Vec::from_raw_parts(ptr, len, len) }
}

/// Windows cannot adopt storage from a foreign allocator into a `Vec`
/// without risking heap corruption, so pay for the zero fill instead.
#[cfg(target_os = "windows")]
pub(crate) fn alloc_uninit_vec<T: Default + Clone>(len: usize, _align: usize) -> Vec<T> {
    vec![T::default(); len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_empty() {
        let v: Vec<f64> = alloc_uninit_vec(0, 32);
        assert!(v.is_empty());
    }

    #[test]
    #[cfg(not(target_os = "windows"))]
    fn test_alloc_alignment() {
        let v: Vec<f32> = alloc_uninit_vec(17, 32);
        assert_eq!(v.len(), 17);
        assert_eq!(v.as_ptr() as usize % 32, 0);
    }
}
