//! ARM NEON backend for the tile kernels.
//!
//! NEON is part of the AArch64 baseline, so this module is compiled whenever
//! the target is `aarch64` (see `build.rs`). `FMLA` is always available,
//! which is why NEON builds use a fused multiply-add in both the vector and
//! the scalar paths.

pub mod f32x4;

use std::arch::asm;

/// Hints the core to pull the cache line containing `ptr` into L1.
///
/// `ptr` does not have to be dereferenceable; a prefetch never faults.
#[inline(always)]
pub fn prefetch(ptr: *const f32) {
    unsafe {
        asm!(
            "prfm pldl1keep, [{0}]",
            in(reg) ptr,
            options(nostack, readonly, preserves_flags)
        );
    }
}
