use std::arch::aarch64::*;

use crate::simd::traits::SimdVec;

pub const LANE_COUNT: usize = 4;

/// A SIMD vector of 4 32-bit floating point values
#[derive(Copy, Clone, Debug)]
pub struct F32x4 {
    pub elements: float32x4_t,
}

impl SimdVec<f32> for F32x4 {
    const LANES: usize = LANE_COUNT;

    #[inline(always)]
    unsafe fn zeros() -> Self {
        Self {
            elements: vdupq_n_f32(0.0),
        }
    }

    #[inline(always)]
    unsafe fn splat(value: f32) -> Self {
        Self {
            elements: vdupq_n_f32(value),
        }
    }

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self {
        Self {
            elements: vld1q_f32(ptr),
        }
    }

    #[inline(always)]
    unsafe fn store_at(&self, ptr: *mut f32) {
        vst1q_f32(ptr, self.elements);
    }

    #[inline(always)]
    unsafe fn mul(&self, rhs: Self) -> Self {
        Self {
            elements: vmulq_f32(self.elements, rhs.elements),
        }
    }

    /// `FMLA`: single rounding, same as `f32::mul_add`.
    #[inline(always)]
    unsafe fn madd(&self, a: Self, b: Self) -> Self {
        Self {
            elements: vfmaq_f32(self.elements, a.elements, b.elements),
        }
    }

    #[inline(always)]
    fn to_vec(self) -> Vec<f32> {
        let mut out = [0.0f32; LANE_COUNT];
        unsafe { vst1q_f32(out.as_mut_ptr(), self.elements) };
        out.to_vec()
    }
}
