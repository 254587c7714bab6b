use crate::depthwise::dispatch::tile_fn_table;
use crate::depthwise::{ConvImpl, DepthwiseKernel, TileFn, TileFnTable};

/// 2x2 output tile, 3x3 kernel, stride 1. Reads a 4x4 input tile.
pub type Tile2x2Kernel3x3Stride1 = ConvImpl<2, 2, 3, 3, 1, 1>;

static TILE_FNS: TileFnTable = tile_fn_table! {
    Tile2x2Kernel3x3Stride1,
    top: [0, 1],
    left: [0, 1],
    bottom: [0, 1, 2, 3] x [0, 1],
    right: [0, 1, 2, 3] x [0, 1],
};

impl DepthwiseKernel for Tile2x2Kernel3x3Stride1 {
    fn tile_fns() -> &'static TileFnTable {
        &TILE_FNS
    }

    fn scalar_fn() -> TileFn {
        Self::process_tile_scalar::<f32>
    }
}
