//! Tile-based depthwise convolution.
//!
//! A depthwise convolution is evaluated one output tile at a time. Each
//! kernel specialisation ([`ConvImpl`]) is identified by its output tile
//! size, kernel size and stride; for every specialisation a static
//! [`TileFnTable`] maps the tile's [`Padding`] to the kernel that handles it.
//!
//! # Buffers
//!
//! Kernels receive a [`Tile`]: raw pointers and element strides for the
//! weights, input and output. Channels are the innermost (unit-stride)
//! dimension of all three. The input pointer addresses the first input cell
//! that is *not* padding, i.e. logical cell `(i, j)` of the inner tile lives
//! at `input + (i - in_top) * in_row_stride + (j - in_left) * in_col_stride`.
//! Padding cells are never read and always count as zero.

pub mod dispatch;
pub mod driver;
mod generic;
pub mod kernels;
mod pipelined;
pub mod reference;
mod scalar;

pub use dispatch::TileFnTable;
pub use driver::{DepthwiseConvolution, PaddingType};
pub use kernels::{
    Tile2x2Kernel3x3Stride1, Tile3x3Kernel3x3Stride1, Tile3x3Kernel3x3Stride2,
    Tile4x4Kernel3x3Stride1,
};

/// Pointers and strides for one kernel call.
///
/// All strides are in elements. The kernel reads `n_channels` consecutive
/// values at every weight and input position it visits and writes
/// `n_channels` consecutive values at every valid output position.
#[derive(Debug, Clone, Copy)]
pub struct Tile<T = f32> {
    pub n_channels: usize,
    pub weights: *const T,
    pub weight_row_stride: usize,
    pub weight_col_stride: usize,
    pub input: *const T,
    pub in_row_stride: usize,
    pub in_col_stride: usize,
    pub output: *mut T,
    pub out_row_stride: usize,
    pub out_col_stride: usize,
}

impl<T: Copy> Tile<T> {
    /// The same tile restricted to channels `offset..offset + n_channels`.
    ///
    /// # Safety
    ///
    /// `offset` must not move any pointer past the end of its buffer.
    #[inline(always)]
    pub unsafe fn advance_channels(&self, offset: usize, n_channels: usize) -> Self {
        Self {
            n_channels,
            weights: self.weights.add(offset),
            input: self.input.add(offset),
            output: self.output.add(offset),
            ..*self
        }
    }
}

/// How many rows/columns of a tile fall outside the tensor.
///
/// Input padding cells read as zero; output padding cells are neither
/// computed nor written. Valid descriptors satisfy `in_* < inner tile dim`
/// and `out_* < output tile dim`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Padding {
    pub in_top: usize,
    pub in_left: usize,
    pub in_bottom: usize,
    pub in_right: usize,
    pub out_bottom: usize,
    pub out_right: usize,
}

impl Padding {
    pub const NONE: Padding = Padding::new(0, 0, 0, 0, 0, 0);

    pub const fn new(
        in_top: usize,
        in_left: usize,
        in_bottom: usize,
        in_right: usize,
        out_bottom: usize,
        out_right: usize,
    ) -> Self {
        Self {
            in_top,
            in_left,
            in_bottom,
            in_right,
            out_bottom,
            out_right,
        }
    }

    #[inline]
    pub const fn has_input_padding(&self) -> bool {
        self.in_top > 0 || self.in_left > 0 || self.in_bottom > 0 || self.in_right > 0
    }

    #[inline]
    pub const fn has_output_padding(&self) -> bool {
        self.out_bottom > 0 || self.out_right > 0
    }
}

/// Uniform signature of every tile kernel.
///
/// Specialised kernels have their padding baked in and ignore the second
/// argument; the generic kernel reads it.
///
/// # Safety
///
/// Nothing is checked. The pointers, strides and padding must describe
/// buffers that cover every cell the kernel touches.
pub type TileFn = unsafe fn(&Tile<f32>, &Padding);

/// One depthwise kernel specialisation: output tile `OTR x OTC`, kernel
/// `KR x KC`, stride `SR x SC`.
///
/// The kernels themselves are associated functions:
/// `process_tile` (padding as const generics), `process_tile_generic`
/// (runtime padding) and `process_tile_scalar` (per-channel oracle).
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvImpl<
    const OTR: usize,
    const OTC: usize,
    const KR: usize,
    const KC: usize,
    const SR: usize,
    const SC: usize,
>;

/// Compile-time geometry of a kernel specialisation.
pub trait TileShape {
    const OUTPUT_TILE_ROWS: usize;
    const OUTPUT_TILE_COLS: usize;
    const KERNEL_ROWS: usize;
    const KERNEL_COLS: usize;
    const STRIDE_ROWS: usize;
    const STRIDE_COLS: usize;

    /// Input rows read by one output tile.
    const INNER_TILE_ROWS: usize =
        (Self::OUTPUT_TILE_ROWS - 1) * Self::STRIDE_ROWS + Self::KERNEL_ROWS;
    /// Input columns read by one output tile.
    const INNER_TILE_COLS: usize =
        (Self::OUTPUT_TILE_COLS - 1) * Self::STRIDE_COLS + Self::KERNEL_COLS;
}

impl<
        const OTR: usize,
        const OTC: usize,
        const KR: usize,
        const KC: usize,
        const SR: usize,
        const SC: usize,
    > TileShape for ConvImpl<OTR, OTC, KR, KC, SR, SC>
{
    const OUTPUT_TILE_ROWS: usize = OTR;
    const OUTPUT_TILE_COLS: usize = OTC;
    const KERNEL_ROWS: usize = KR;
    const KERNEL_COLS: usize = KC;
    const STRIDE_ROWS: usize = SR;
    const STRIDE_COLS: usize = SC;
}

/// A kernel specialisation with a populated dispatch table.
pub trait DepthwiseKernel: TileShape + Send + Sync + 'static {
    /// Dispatch table for this specialisation.
    fn tile_fns() -> &'static TileFnTable;

    /// The per-channel scalar kernel every table entry must agree with.
    fn scalar_fn() -> TileFn;
}

impl<
        const OTR: usize,
        const OTC: usize,
        const KR: usize,
        const KC: usize,
        const SR: usize,
        const SC: usize,
    > ConvImpl<OTR, OTC, KR, KC, SR, SC>
{
    pub const INNER_TILE_ROWS: usize = (OTR - 1) * SR + KR;
    pub const INNER_TILE_COLS: usize = (OTC - 1) * SC + KC;

    /// Whether logical inner-tile cell `(i, j)` is input padding.
    #[inline(always)]
    pub(crate) fn is_padding(i: usize, j: usize, padding: &Padding) -> bool {
        i < padding.in_top
            || i >= Self::INNER_TILE_ROWS - padding.in_bottom
            || j < padding.in_left
            || j >= Self::INNER_TILE_COLS - padding.in_right
    }

    /// Element offset of a non-padding inner-tile cell from `tile.input`.
    #[inline(always)]
    pub(crate) fn input_offset<T>(tile: &Tile<T>, i: usize, j: usize, padding: &Padding) -> usize {
        (i - padding.in_top) * tile.in_row_stride + (j - padding.in_left) * tile.in_col_stride
    }
}
