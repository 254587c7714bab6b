//! Tile-based depthwise convolution kernels.
//!
//! The crate is organised the same way the computation flows:
//!
//! - [`depthwise::DepthwiseConvolution`] walks an NHWC tensor in output tiles,
//!   classifies each tile's padding and looks up a kernel in a static
//!   [`depthwise::TileFnTable`];
//! - the selected [`depthwise::TileFn`] processes every channel of the tile,
//!   [`VECTOR_WIDTH`] channels at a time on the active [`simd`] backend, and
//!   hands the remaining channels to the scalar kernel.
//!
//! Kernels trust their caller completely. Only the driver validates shapes
//! and buffer sizes.

pub mod depthwise;
pub mod error;
pub mod simd;

pub use error::{DepthwiseError, Result};

/// Number of channels processed per vector register.
pub const VECTOR_WIDTH: usize = 4;

/// How many channel groups ahead the pipelined kernels prefetch.
pub const PREFETCH_GROUPS: usize = 4;
