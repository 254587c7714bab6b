/// A fixed-width vector of `T` used by the tile kernels.
///
/// Every backend provides exactly the operations the depthwise kernels need:
/// unaligned load/store of one channel group, a multiply for the first kernel
/// tap, and a multiply-add for the others. `madd` must round the same way as
/// [`crate::simd::madd`] so vector and scalar paths agree bit-for-bit.
pub trait SimdVec<T>: Copy {
    /// Number of lanes in the vector.
    const LANES: usize;

    /// All lanes set to zero.
    ///
    /// # Safety
    ///
    /// The backend's instruction set must be available.
    unsafe fn zeros() -> Self;

    /// All lanes set to `value`.
    ///
    /// # Safety
    ///
    /// The backend's instruction set must be available.
    unsafe fn splat(value: T) -> Self;

    /// Loads `LANES` consecutive values.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reading `LANES` values. No alignment is required.
    unsafe fn load(ptr: *const T) -> Self;

    /// Stores all lanes to `LANES` consecutive values.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writing `LANES` values. No alignment is required.
    unsafe fn store_at(&self, ptr: *mut T);

    /// Lane-wise `self * rhs`.
    ///
    /// # Safety
    ///
    /// The backend's instruction set must be available.
    unsafe fn mul(&self, rhs: Self) -> Self;

    /// Lane-wise `self + a * b`.
    ///
    /// # Safety
    ///
    /// The backend's instruction set must be available.
    unsafe fn madd(&self, a: Self, b: Self) -> Self;

    fn to_vec(self) -> Vec<T>;
}
