use crate::depthwise::{ConvImpl, Padding, Tile};
use crate::simd::prefetch;
use crate::{PREFETCH_GROUPS, VECTOR_WIDTH};

impl<
        const OTR: usize,
        const OTC: usize,
        const KR: usize,
        const KC: usize,
        const SR: usize,
        const SC: usize,
    > ConvImpl<OTR, OTC, KR, KC, SR, SC>
{
    /// Specialised tile kernel with its padding fixed at compile time.
    ///
    /// Channels are consumed in pairs of vector groups (the "A" and "B"
    /// halves of each iteration), so two independent accumulator chains are
    /// in flight per tap. Before each pair the weights and input cells
    /// [`PREFETCH_GROUPS`] groups ahead are prefetched. An odd group left over
    /// is processed on its own and the last `n_channels % VECTOR_WIDTH`
    /// channels go through [`Self::process_tile_scalar`] with the same padding.
    ///
    /// The runtime padding argument is ignored.
    ///
    /// # Safety
    ///
    /// Same contract as [`Self::process_tile_scalar`].
    pub unsafe fn process_tile<
        const PT: usize,
        const PL: usize,
        const PB: usize,
        const PR: usize,
        const POB: usize,
        const POR: usize,
    >(
        tile: &Tile<f32>,
        _padding: &Padding,
    ) {
        let padding = Padding::new(PT, PL, PB, PR, POB, POR);

        let n_groups = tile.n_channels / VECTOR_WIDTH;
        let n_iters = n_groups / 2;
        let odd_tail = n_groups & 1 == 1;

        let mut channel = 0;
        for _ in 0..n_iters {
            Self::prefetch_ahead(tile, &padding, channel + PREFETCH_GROUPS * VECTOR_WIDTH);
            Self::compute_groups::<2>(tile, &padding, channel);
            channel += 2 * VECTOR_WIDTH;
        }

        if odd_tail {
            Self::compute_groups::<1>(tile, &padding, channel);
            channel += VECTOR_WIDTH;
        }

        if channel < tile.n_channels {
            Self::process_tile_scalar(
                &tile.advance_channels(channel, tile.n_channels - channel),
                &padding,
            );
        }
    }

    // Touches every weight and non-padding input cell at `channel`. The
    // address may be past the end of the buffers, so it is computed with
    // wrapping arithmetic and never dereferenced.
    #[inline(always)]
    fn prefetch_ahead(tile: &Tile<f32>, padding: &Padding, channel: usize) {
        for ki in 0..KR {
            for kj in 0..KC {
                let offset = ki * tile.weight_row_stride + kj * tile.weight_col_stride + channel;
                prefetch(tile.weights.wrapping_add(offset));
            }
        }

        for i in 0..Self::INNER_TILE_ROWS {
            for j in 0..Self::INNER_TILE_COLS {
                if !Self::is_padding(i, j, padding) {
                    let offset = Self::input_offset(tile, i, j, padding) + channel;
                    prefetch(tile.input.wrapping_add(offset));
                }
            }
        }
    }
}
