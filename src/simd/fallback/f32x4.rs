use crate::simd::{madd, traits::SimdVec};

pub const LANE_COUNT: usize = 4;

/// Four `f32` lanes in an ordinary array.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct F32x4 {
    pub elements: [f32; LANE_COUNT],
}

impl SimdVec<f32> for F32x4 {
    const LANES: usize = LANE_COUNT;

    #[inline(always)]
    unsafe fn zeros() -> Self {
        Self {
            elements: [0.0; LANE_COUNT],
        }
    }

    #[inline(always)]
    unsafe fn splat(value: f32) -> Self {
        Self {
            elements: [value; LANE_COUNT],
        }
    }

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self {
        Self {
            elements: std::ptr::read_unaligned(ptr as *const [f32; LANE_COUNT]),
        }
    }

    #[inline(always)]
    unsafe fn store_at(&self, ptr: *mut f32) {
        std::ptr::write_unaligned(ptr as *mut [f32; LANE_COUNT], self.elements);
    }

    #[inline(always)]
    unsafe fn mul(&self, rhs: Self) -> Self {
        let mut elements = self.elements;
        for (e, r) in elements.iter_mut().zip(rhs.elements) {
            *e *= r;
        }
        Self { elements }
    }

    #[inline(always)]
    unsafe fn madd(&self, a: Self, b: Self) -> Self {
        let mut elements = self.elements;
        for i in 0..LANE_COUNT {
            elements[i] = madd(elements[i], a.elements[i], b.elements[i]);
        }
        Self { elements }
    }

    #[inline(always)]
    fn to_vec(self) -> Vec<f32> {
        self.elements.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_store_round_trip() {
        let data = [0.0f32, 1.0, -2.0, 3.5, f32::MIN_POSITIVE];
        let mut out = [9.0f32; 5];
        unsafe { F32x4::load(data.as_ptr().add(1)).store_at(out.as_mut_ptr().add(1)) };
        assert_eq!(out, [9.0, 1.0, -2.0, 3.5, f32::MIN_POSITIVE]);
    }

    #[test]
    fn test_mul_and_madd() {
        unsafe {
            let a = F32x4::load([1.0f32, 2.0, 3.0, 4.0].as_ptr());
            let b = F32x4::load([0.5f32, -1.0, 2.0, 0.25].as_ptr());
            let c = F32x4::splat(10.0);
            assert_eq!(a.mul(b).to_vec(), vec![0.5, -2.0, 6.0, 1.0]);
            assert_eq!(c.madd(a, b).to_vec(), vec![10.5, 8.0, 16.0, 11.0]);
        }
    }
}
