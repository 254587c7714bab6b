use num::Float;

use crate::depthwise::{ConvImpl, Padding, Tile};
use crate::simd::madd;

impl<
        const OTR: usize,
        const OTC: usize,
        const KR: usize,
        const KC: usize,
        const SR: usize,
        const SC: usize,
    > ConvImpl<OTR, OTC, KR, KC, SR, SC>
{
    /// Reference tile kernel: one channel at a time, any padding.
    ///
    /// For every valid output cell and channel `c` this computes
    /// `w[0][0][c] * u[0][0][c]` and then multiply-adds the remaining kernel
    /// taps in row-major order, with padding cells contributing `w * 0`.
    /// Every other kernel in this module performs the same operations in the
    /// same order and therefore produces identical bits.
    ///
    /// # Safety
    ///
    /// `tile` must cover every non-padding input cell, every weight and every
    /// valid output cell for `tile.n_channels` channels, and `padding` must
    /// satisfy the [`Padding`] invariants for this tile shape.
    pub unsafe fn process_tile_scalar<T: Float>(tile: &Tile<T>, padding: &Padding) {
        let out_rows = OTR - padding.out_bottom;
        let out_cols = OTC - padding.out_right;

        for c in 0..tile.n_channels {
            for out_i in 0..out_rows {
                for out_j in 0..out_cols {
                    let mut acc = T::zero();

                    for ki in 0..KR {
                        let i = out_i * SR + ki;

                        for kj in 0..KC {
                            let j = out_j * SC + kj;

                            let w = *tile
                                .weights
                                .add(ki * tile.weight_row_stride + kj * tile.weight_col_stride + c);

                            let u = if Self::is_padding(i, j, padding) {
                                T::zero()
                            } else {
                                *tile.input.add(Self::input_offset(tile, i, j, padding) + c)
                            };

                            acc = if ki == 0 && kj == 0 {
                                w * u
                            } else {
                                madd(acc, w, u)
                            };
                        }
                    }

                    *tile
                        .output
                        .add(out_i * tile.out_row_stride + out_j * tile.out_col_stride + c) = acc;
                }
            }
        }
    }
}
