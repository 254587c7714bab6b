//! x86 SSE backend for the tile kernels.
//!
//! SSE2 is baseline on x86-64, so 128-bit vectors are always available there.
//! When the crate is compiled with `-C target-feature=+fma` the multiply-add
//! uses `VFMADD`; otherwise it is a separate multiply and add, and the scalar
//! path does the same (see `build.rs`).

pub mod f32x4;

#[cfg(target_arch = "x86")]
use std::arch::x86::{_mm_prefetch, _MM_HINT_T0};

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::{_mm_prefetch, _MM_HINT_T0};

/// Hints the core to pull the cache line containing `ptr` into L1.
///
/// `ptr` does not have to be dereferenceable; a prefetch never faults.
#[inline(always)]
pub fn prefetch(ptr: *const f32) {
    unsafe { _mm_prefetch::<_MM_HINT_T0>(ptr as *const i8) };
}
