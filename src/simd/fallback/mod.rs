//! Portable backend built on plain `[f32; 4]` arrays.
//!
//! Used when no vector instruction set was detected at build time, and as a
//! second opinion in tests on every target.

pub mod f32x4;

/// No-op prefetch.
#[inline(always)]
pub fn prefetch(_ptr: *const f32) {}
