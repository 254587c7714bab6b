use crate::depthwise::{ConvImpl, Padding, Tile};
use crate::simd::{SimdVec, F32x4};
use crate::VECTOR_WIDTH;

impl<
        const OTR: usize,
        const OTC: usize,
        const KR: usize,
        const KC: usize,
        const SR: usize,
        const SC: usize,
    > ConvImpl<OTR, OTC, KR, KC, SR, SC>
{
    /// Tile kernel for any padding, selected when no specialised kernel
    /// covers the tile.
    ///
    /// Channels are processed [`VECTOR_WIDTH`] at a time and the remainder is
    /// handed to [`Self::process_tile_scalar`].
    ///
    /// # Safety
    ///
    /// Same contract as [`Self::process_tile_scalar`].
    pub unsafe fn process_tile_generic(tile: &Tile<f32>, padding: &Padding) {
        let n_groups = tile.n_channels / VECTOR_WIDTH;

        for group in 0..n_groups {
            Self::compute_groups::<1>(tile, padding, group * VECTOR_WIDTH);
        }

        let done = n_groups * VECTOR_WIDTH;
        if done < tile.n_channels {
            Self::process_tile_scalar(&tile.advance_channels(done, tile.n_channels - done), padding);
        }
    }

    /// Computes `G` adjacent channel groups starting at `channel`.
    ///
    /// Weights for all groups are loaded once; then each valid output cell is
    /// accumulated tap by tap with the groups interleaved, so `G = 2` gives
    /// two independent dependency chains per tap.
    #[inline(always)]
    pub(crate) unsafe fn compute_groups<const G: usize>(
        tile: &Tile<f32>,
        padding: &Padding,
        channel: usize,
    ) {
        let zero = F32x4::zeros();

        let mut w = [[[zero; KC]; KR]; G];
        for ki in 0..KR {
            for kj in 0..KC {
                let wptr = tile
                    .weights
                    .add(ki * tile.weight_row_stride + kj * tile.weight_col_stride + channel);
                for (g, wg) in w.iter_mut().enumerate() {
                    wg[ki][kj] = F32x4::load(wptr.add(g * VECTOR_WIDTH));
                }
            }
        }

        for out_i in 0..OTR - padding.out_bottom {
            for out_j in 0..OTC - padding.out_right {
                let mut acc = [zero; G];

                for ki in 0..KR {
                    let i = out_i * SR + ki;

                    for kj in 0..KC {
                        let j = out_j * SC + kj;

                        let mut u = [zero; G];
                        if !Self::is_padding(i, j, padding) {
                            let uptr = tile
                                .input
                                .add(Self::input_offset(tile, i, j, padding) + channel);
                            for (g, ug) in u.iter_mut().enumerate() {
                                *ug = F32x4::load(uptr.add(g * VECTOR_WIDTH));
                            }
                        }

                        for g in 0..G {
                            acc[g] = if ki == 0 && kj == 0 {
                                w[g][ki][kj].mul(u[g])
                            } else {
                                acc[g].madd(w[g][ki][kj], u[g])
                            };
                        }
                    }
                }

                let optr = tile
                    .output
                    .add(out_i * tile.out_row_stride + out_j * tile.out_col_stride + channel);
                for (g, a) in acc.iter().enumerate() {
                    a.store_at(optr.add(g * VECTOR_WIDTH));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::depthwise::{Padding, Tile, Tile3x3Kernel3x3Stride1};

    #[test]
    fn test_generic_matches_scalar_with_tail_channels() {
        let channels = 7;
        let input: Vec<f32> = (0..5 * 5 * channels).map(|v| (v % 13) as f32 * 0.25 - 1.0).collect();
        let weights: Vec<f32> = (0..9 * channels).map(|v| (v % 5) as f32 * 0.5 - 1.0).collect();
        let mut expected = vec![0.0f32; 9 * channels];
        let mut actual = vec![0.0f32; 9 * channels];

        let tile = |output: &mut Vec<f32>| Tile {
            n_channels: channels,
            weights: weights.as_ptr(),
            weight_row_stride: 3 * channels,
            weight_col_stride: channels,
            input: input.as_ptr(),
            in_row_stride: 5 * channels,
            in_col_stride: channels,
            output: output.as_mut_ptr(),
            out_row_stride: 3 * channels,
            out_col_stride: channels,
        };

        let padding = Padding::new(0, 1, 0, 0, 0, 0);
        unsafe {
            Tile3x3Kernel3x3Stride1::process_tile_scalar(&tile(&mut expected), &padding);
            Tile3x3Kernel3x3Stride1::process_tile_generic(&tile(&mut actual), &padding);
        }

        for (e, a) in expected.iter().zip(actual.iter()) {
            assert_eq!(e.to_bits(), a.to_bits(), "{} != {}", e, a);
        }
    }
}
