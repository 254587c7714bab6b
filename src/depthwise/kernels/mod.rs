//! The kernel specialisations shipped with the crate and their tables.

mod tile_2x2_3x3_1x1;
mod tile_3x3_3x3_1x1;
mod tile_3x3_3x3_2x2;
mod tile_4x4_3x3_1x1;

pub use tile_2x2_3x3_1x1::Tile2x2Kernel3x3Stride1;
pub use tile_3x3_3x3_1x1::Tile3x3Kernel3x3Stride1;
pub use tile_3x3_3x3_2x2::Tile3x3Kernel3x3Stride2;
pub use tile_4x4_3x3_1x1::Tile4x4Kernel3x3Stride1;
