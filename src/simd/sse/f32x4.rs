#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use crate::simd::traits::SimdVec;

pub const LANE_COUNT: usize = 4;

/// A SIMD vector of 4 32-bit floating point values held in an `XMM` register.
#[derive(Copy, Clone, Debug)]
pub struct F32x4 {
    pub elements: __m128,
}

impl SimdVec<f32> for F32x4 {
    const LANES: usize = LANE_COUNT;

    #[inline(always)]
    unsafe fn zeros() -> Self {
        Self {
            elements: _mm_setzero_ps(),
        }
    }

    #[inline(always)]
    unsafe fn splat(value: f32) -> Self {
        Self {
            elements: _mm_set1_ps(value),
        }
    }

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self {
        Self {
            elements: _mm_loadu_ps(ptr),
        }
    }

    #[inline(always)]
    unsafe fn store_at(&self, ptr: *mut f32) {
        _mm_storeu_ps(ptr, self.elements);
    }

    #[inline(always)]
    unsafe fn mul(&self, rhs: Self) -> Self {
        Self {
            elements: _mm_mul_ps(self.elements, rhs.elements),
        }
    }

    #[cfg(fused_madd)]
    #[inline(always)]
    unsafe fn madd(&self, a: Self, b: Self) -> Self {
        Self {
            elements: _mm_fmadd_ps(a.elements, b.elements, self.elements),
        }
    }

    #[cfg(not(fused_madd))]
    #[inline(always)]
    unsafe fn madd(&self, a: Self, b: Self) -> Self {
        Self {
            elements: _mm_add_ps(self.elements, _mm_mul_ps(a.elements, b.elements)),
        }
    }

    #[inline(always)]
    fn to_vec(self) -> Vec<f32> {
        let mut out = [0.0f32; LANE_COUNT];
        unsafe { _mm_storeu_ps(out.as_mut_ptr(), self.elements) };
        out.to_vec()
    }
}
