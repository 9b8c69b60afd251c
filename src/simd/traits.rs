//! Traits shared by every backend.
//!
//! The register-level traits (`Alignment`, `SimdLoad`, `SimdStore`) describe
//! how a fixed-width vector type moves between memory and registers,
//! including the masked partial forms used for slice tails. `SimdMath` is the
//! slice-level allocating surface implemented by the active backend.

/// Alignment query for a backend's vector type.
pub trait Alignment<T> {
    /// Returns `true` when `ptr` satisfies the backend's preferred alignment.
    fn is_aligned(ptr: *const T) -> bool;
}

/// Loads a fixed-width vector from memory.
pub trait SimdLoad<T>: Sized {
    type Output;

    /// Loads exactly one full vector starting at `ptr`, dispatching on
    /// alignment.
    ///
    /// # Safety
    ///
    /// `ptr` must be non-null and point to at least `size` valid elements,
    /// where `size` equals the lane count.
    unsafe fn load(ptr: *const T, size: usize) -> Self::Output;

    /// Loads one full vector from aligned memory.
    ///
    /// # Safety
    ///
    /// `ptr` must satisfy the backend alignment and point to a full vector's
    /// worth of valid elements.
    unsafe fn load_aligned(ptr: *const T) -> Self::Output;

    /// Loads one full vector from unaligned memory.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a full vector's worth of valid elements.
    unsafe fn load_unaligned(ptr: *const T) -> Self::Output;

    /// Loads `size` elements (fewer than a full vector) with a masked load.
    /// Lanes past `size` read as zero and are never dereferenced.
    ///
    /// # Safety
    ///
    /// `ptr` must be non-null and point to at least `size` valid elements;
    /// `size` must be strictly less than the lane count.
    unsafe fn load_partial(ptr: *const T, size: usize) -> Self::Output;
}

/// Stores a fixed-width vector to memory.
pub trait SimdStore<T> {
    /// Stores the vector's valid elements at `ptr`, dispatching between the
    /// partial, aligned and unaligned forms based on `self`.
    ///
    /// # Safety
    ///
    /// `ptr` must be non-null and point to writable memory for the vector's
    /// `size` elements.
    unsafe fn store_at(&self, ptr: *mut T);

    /// Stores one full vector to aligned memory.
    ///
    /// # Safety
    ///
    /// `ptr` must satisfy the backend alignment and be writable for a full
    /// vector.
    unsafe fn store_aligned_at(&self, ptr: *mut T);

    /// Stores one full vector to unaligned memory.
    ///
    /// # Safety
    ///
    /// `ptr` must be writable for a full vector.
    unsafe fn store_unaligned_at(&self, ptr: *mut T);

    /// Stores only the vector's valid elements with a masked store. Memory
    /// past the valid count is never written.
    ///
    /// # Safety
    ///
    /// `ptr` must be non-null and writable for the vector's `size` elements,
    /// which must be strictly fewer than the lane count.
    unsafe fn store_at_partial(&self, ptr: *mut T);
}

/// Allocating elementwise math over slices.
///
/// Implemented for `[f32]` and `[f64]` by the active backend; every method
/// returns a freshly allocated `Vec` of the same length.
///
/// ```
/// use lanemath::SimdMath;
///
/// let x = vec![0.0f64, 1.0, 2.0];
/// let y = x.exp();
/// assert!((y[1] - std::f64::consts::E).abs() < 1e-15);
/// ```
pub trait SimdMath {
    type Output;

    /// Elementwise natural exponential.
    fn exp(&self) -> Self::Output;

    /// Elementwise base-2 exponential.
    fn exp2(&self) -> Self::Output;

    /// Elementwise natural logarithm.
    fn ln(&self) -> Self::Output;

    /// Elementwise base-2 logarithm.
    fn log2(&self) -> Self::Output;

    /// Elementwise sine.
    fn sin(&self) -> Self::Output;

    /// Elementwise cosine.
    fn cos(&self) -> Self::Output;

    /// Elementwise tangent.
    fn tan(&self) -> Self::Output;

    /// Elementwise arctangent.
    fn atan(&self) -> Self::Output;

    /// Elementwise square root.
    fn sqrt(&self) -> Self::Output;

    /// Elementwise error function.
    fn erf(&self) -> Self::Output;
}
