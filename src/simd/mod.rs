//! SIMD backends for the tile kernels.
//!
//! `build.rs` enables exactly one of the `neon`, `sse` or `fallback` cfgs and
//! the matching [`F32x4`] and [`prefetch`] are re-exported here. The portable
//! backend is always compiled so tests can compare against it.

use num::Float;

#[cfg(neon)]
pub mod neon;

#[cfg(sse)]
pub mod sse;

pub mod fallback;

pub mod traits;

pub use traits::SimdVec;

#[cfg(neon)]
pub use neon::{f32x4::F32x4, prefetch};

#[cfg(sse)]
pub use sse::{f32x4::F32x4, prefetch};

#[cfg(fallback)]
pub use fallback::{f32x4::F32x4, prefetch};

/// Name of the backend selected at build time.
#[cfg(neon)]
pub const BACKEND: &str = "neon";

#[cfg(sse)]
pub const BACKEND: &str = "sse";

#[cfg(fallback)]
pub const BACKEND: &str = "fallback";

/// Whether [`madd`] rounds once (fused) or twice.
pub const FUSED_MADD: bool = cfg!(fused_madd);

/// Scalar `acc + a * b`, rounded exactly like the vector `madd` of the active
/// backend.
#[inline(always)]
pub fn madd<T: Float>(acc: T, a: T, b: T) -> T {
    if FUSED_MADD {
        a.mul_add(b, acc)
    } else {
        acc + a * b
    }
}
