use crate::depthwise::dispatch::tile_fn_table;
use crate::depthwise::{ConvImpl, DepthwiseKernel, TileFn, TileFnTable};

/// 3x3 output tile, 3x3 kernel, stride 2. Reads a 7x7 input tile.
pub type Tile3x3Kernel3x3Stride2 = ConvImpl<3, 3, 3, 3, 2, 2>;

// Same padding puts at most one row/column of padding before a stride-2
// tensor, so top/left stop at 1 here as well.
static TILE_FNS: TileFnTable = tile_fn_table! {
    Tile3x3Kernel3x3Stride2,
    top: [0, 1],
    left: [0, 1],
    bottom: [0, 1, 2, 3, 4, 5, 6] x [0, 1, 2],
    right: [0, 1, 2, 3, 4, 5, 6] x [0, 1, 2],
};

impl DepthwiseKernel for Tile3x3Kernel3x3Stride2 {
    fn tile_fns() -> &'static TileFnTable {
        &TILE_FNS
    }

    fn scalar_fn() -> TileFn {
        Self::process_tile_scalar::<f32>
    }
}
