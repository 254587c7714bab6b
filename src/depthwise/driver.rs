//! Tile-iteration driver.
//!
//! [`DepthwiseConvolution`] owns the geometry of one convolution over dense
//! NHWC tensors. It splits the output into `OUTPUT_TILE_ROWS x
//! OUTPUT_TILE_COLS` tiles, works out the padding of each tile and calls the
//! kernel its [`TileFnTable`](crate::depthwise::TileFnTable) selects.
//!
//! A unit of work is one row of tiles of one batch. Units never share output
//! cells, which is what [`DepthwiseConvolution::run_window`] and
//! [`DepthwiseConvolution::par_run`] rely on to run them concurrently.

use std::cmp::min;
use std::marker::PhantomData;

use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::{ParallelSlice, ParallelSliceMut},
};

use crate::depthwise::{DepthwiseKernel, Padding, Tile};
use crate::error::{buffer_size_error, shape_error, window_error, Result};
use crate::simd::BACKEND;

/// How the input is padded before the convolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingType {
    /// Pad so that `output = ceil(input / stride)`. Odd padding goes to the
    /// bottom/right.
    Same,
    /// No padding; only windows that lie entirely inside the input.
    Valid,
}

/// A depthwise convolution planned for one tensor shape and one kernel
/// specialisation `K`.
///
/// Buffers are `f32` and dense: input `[batches][rows][cols][channels]`,
/// weights `[kernel_rows][kernel_cols][channels]`, output
/// `[batches][out_rows][out_cols][channels]`.
#[derive(Debug, Clone)]
pub struct DepthwiseConvolution<K: DepthwiseKernel> {
    n_batches: usize,
    n_input_rows: usize,
    n_input_cols: usize,
    n_channels: usize,
    n_output_rows: usize,
    n_output_cols: usize,
    pad_top: usize,
    pad_left: usize,
    pad_bottom: usize,
    pad_right: usize,
    n_tile_rows: usize,
    n_tile_cols: usize,
    _kernel: PhantomData<K>,
}

impl<K: DepthwiseKernel> DepthwiseConvolution<K> {
    /// Plans a convolution with `Same` or `Valid` padding.
    pub fn new(
        n_batches: usize,
        n_input_rows: usize,
        n_input_cols: usize,
        n_channels: usize,
        padding_type: PaddingType,
    ) -> Result<Self> {
        let (pad_top, pad_bottom) =
            Self::implicit_padding(n_input_rows, K::KERNEL_ROWS, K::STRIDE_ROWS, padding_type);
        let (pad_left, pad_right) =
            Self::implicit_padding(n_input_cols, K::KERNEL_COLS, K::STRIDE_COLS, padding_type);

        Self::with_padding(
            n_batches,
            n_input_rows,
            n_input_cols,
            n_channels,
            pad_top,
            pad_left,
            pad_bottom,
            pad_right,
        )
    }

    /// Plans a convolution with explicit zero padding on each edge.
    ///
    /// Each padding amount must be smaller than the kernel along that axis.
    #[allow(clippy::too_many_arguments)]
    pub fn with_padding(
        n_batches: usize,
        n_input_rows: usize,
        n_input_cols: usize,
        n_channels: usize,
        pad_top: usize,
        pad_left: usize,
        pad_bottom: usize,
        pad_right: usize,
    ) -> Result<Self> {
        if n_batches == 0 || n_input_rows == 0 || n_input_cols == 0 || n_channels == 0 {
            return Err(shape_error(format!(
                "tensor dimensions must be non-zero, got {}x{}x{}x{}",
                n_batches, n_input_rows, n_input_cols, n_channels
            )));
        }

        if pad_top >= K::KERNEL_ROWS
            || pad_bottom >= K::KERNEL_ROWS
            || pad_left >= K::KERNEL_COLS
            || pad_right >= K::KERNEL_COLS
        {
            return Err(shape_error(format!(
                "padding ({}, {}, {}, {}) must be smaller than the {}x{} kernel",
                pad_top, pad_left, pad_bottom, pad_right, K::KERNEL_ROWS, K::KERNEL_COLS
            )));
        }

        let padded_rows = n_input_rows + pad_top + pad_bottom;
        let padded_cols = n_input_cols + pad_left + pad_right;
        if padded_rows < K::KERNEL_ROWS || padded_cols < K::KERNEL_COLS {
            return Err(shape_error(format!(
                "padded input {}x{} is smaller than the {}x{} kernel",
                padded_rows, padded_cols, K::KERNEL_ROWS, K::KERNEL_COLS
            )));
        }

        let n_output_rows = (padded_rows - K::KERNEL_ROWS) / K::STRIDE_ROWS + 1;
        let n_output_cols = (padded_cols - K::KERNEL_COLS) / K::STRIDE_COLS + 1;
        let n_tile_rows = n_output_rows.div_ceil(K::OUTPUT_TILE_ROWS);
        let n_tile_cols = n_output_cols.div_ceil(K::OUTPUT_TILE_COLS);

        log::debug!(
            "depthwise {}x{} stride {}x{}: input {}x{}x{}x{}, output {}x{}, {}x{} tiles of {}x{}, {} specialised kernels, backend {}",
            K::KERNEL_ROWS,
            K::KERNEL_COLS,
            K::STRIDE_ROWS,
            K::STRIDE_COLS,
            n_batches,
            n_input_rows,
            n_input_cols,
            n_channels,
            n_output_rows,
            n_output_cols,
            n_tile_rows,
            n_tile_cols,
            K::OUTPUT_TILE_ROWS,
            K::OUTPUT_TILE_COLS,
            K::tile_fns().n_specialised(),
            BACKEND
        );

        Ok(Self {
            n_batches,
            n_input_rows,
            n_input_cols,
            n_channels,
            n_output_rows,
            n_output_cols,
            pad_top,
            pad_left,
            pad_bottom,
            pad_right,
            n_tile_rows,
            n_tile_cols,
            _kernel: PhantomData,
        })
    }

    /// Output extent along one axis.
    pub fn output_size(
        n_input: usize,
        kernel: usize,
        stride: usize,
        padding_type: PaddingType,
    ) -> usize {
        match padding_type {
            PaddingType::Same => n_input.div_ceil(stride),
            PaddingType::Valid if n_input < kernel => 0,
            PaddingType::Valid => (n_input - kernel + 1).div_ceil(stride),
        }
    }

    // (before, after) padding along one axis.
    fn implicit_padding(
        n_input: usize,
        kernel: usize,
        stride: usize,
        padding_type: PaddingType,
    ) -> (usize, usize) {
        match padding_type {
            PaddingType::Valid => (0, 0),
            PaddingType::Same => {
                let n_output = Self::output_size(n_input, kernel, stride, padding_type);
                let total = ((n_output.max(1) - 1) * stride + kernel).saturating_sub(n_input);
                (total / 2, total - total / 2)
            }
        }
    }

    /// `(batches, rows, cols, channels)` of the output tensor.
    pub fn output_shape(&self) -> (usize, usize, usize, usize) {
        (
            self.n_batches,
            self.n_output_rows,
            self.n_output_cols,
            self.n_channels,
        )
    }

    /// `(top, left, bottom, right)` input padding.
    pub fn padding(&self) -> (usize, usize, usize, usize) {
        (self.pad_top, self.pad_left, self.pad_bottom, self.pad_right)
    }

    pub fn input_len(&self) -> usize {
        self.n_batches * self.n_input_rows * self.n_input_cols * self.n_channels
    }

    pub fn weights_len(&self) -> usize {
        K::KERNEL_ROWS * K::KERNEL_COLS * self.n_channels
    }

    pub fn output_len(&self) -> usize {
        self.n_batches * self.n_output_rows * self.n_output_cols * self.n_channels
    }

    /// Number of independent work units: one per row of tiles per batch.
    pub fn window(&self) -> usize {
        self.n_batches * self.n_tile_rows
    }

    /// Runs the whole convolution on the calling thread.
    pub fn run(&self, input: &[f32], weights: &[f32], output: &mut [f32]) -> Result<()> {
        self.run_window(0, self.window(), input, weights, output)
    }

    /// Runs work units `start..stop` of [`Self::window`].
    ///
    /// Disjoint windows write disjoint parts of `output`, so a caller may
    /// split `0..window()` between threads.
    pub fn run_window(
        &self,
        start: usize,
        stop: usize,
        input: &[f32],
        weights: &[f32],
        output: &mut [f32],
    ) -> Result<()> {
        let window = self.window();
        if start > stop || stop > window {
            return Err(window_error(start, stop, window));
        }
        self.check_buffers(input, weights, output)?;

        log::debug!("depthwise run: units {}..{} of {}", start, stop, window);

        let in_batch_len = self.n_input_rows * self.n_input_cols * self.n_channels;
        let out_batch_len = self.n_output_rows * self.n_output_cols * self.n_channels;
        let out_row_len = self.n_output_cols * self.n_channels;

        for unit in start..stop {
            let batch = unit / self.n_tile_rows;
            let tile_i = unit % self.n_tile_rows;

            let first_row = tile_i * K::OUTPUT_TILE_ROWS;
            let n_rows = min(K::OUTPUT_TILE_ROWS, self.n_output_rows - first_row);
            let band_start = batch * out_batch_len + first_row * out_row_len;

            self.process_tile_row(
                &input[batch * in_batch_len..(batch + 1) * in_batch_len],
                weights,
                &mut output[band_start..band_start + n_rows * out_row_len],
                tile_i,
            );
        }

        Ok(())
    }

    /// Runs the whole convolution on the rayon thread pool.
    ///
    /// Produces exactly the same output as [`Self::run`].
    pub fn par_run(&self, input: &[f32], weights: &[f32], output: &mut [f32]) -> Result<()> {
        self.check_buffers(input, weights, output)?;

        log::debug!(
            "depthwise par_run: {} units on {} threads",
            self.window(),
            rayon::current_num_threads()
        );

        let in_batch_len = self.n_input_rows * self.n_input_cols * self.n_channels;
        let out_batch_len = self.n_output_rows * self.n_output_cols * self.n_channels;
        let band_len = K::OUTPUT_TILE_ROWS * self.n_output_cols * self.n_channels;

        output[..self.output_len()]
            .par_chunks_mut(out_batch_len)
            .zip(input[..self.input_len()].par_chunks(in_batch_len))
            .for_each(|(out_batch, in_batch)| {
                out_batch
                    .par_chunks_mut(band_len)
                    .enumerate()
                    .for_each(|(tile_i, band)| {
                        self.process_tile_row(in_batch, weights, band, tile_i)
                    });
            });

        Ok(())
    }

    fn check_buffers(&self, input: &[f32], weights: &[f32], output: &[f32]) -> Result<()> {
        if input.len() < self.input_len() {
            return Err(buffer_size_error("input", self.input_len(), input.len()));
        }
        if weights.len() < self.weights_len() {
            return Err(buffer_size_error("weights", self.weights_len(), weights.len()));
        }
        if output.len() < self.output_len() {
            return Err(buffer_size_error("output", self.output_len(), output.len()));
        }
        Ok(())
    }

    /// Padding of the tile that starts at output row/column `out_start`.
    ///
    /// Returns `(in_pad_before, in_pad_after, out_pad_after, first_input)`
    /// where `first_input` is the first row/column of the tensor the tile
    /// reads.
    fn axis_padding(
        out_start: usize,
        output_tile: usize,
        inner_tile: usize,
        stride: usize,
        pad_before: usize,
        n_input: usize,
        n_output: usize,
    ) -> (usize, usize, usize, usize) {
        let in_start = (out_start * stride) as isize - pad_before as isize;
        let in_end = in_start + inner_tile as isize;

        let in_pad_before = (-in_start).max(0) as usize;
        let in_pad_after = min((in_end - n_input as isize).max(0) as usize, inner_tile - 1);
        let out_pad_after = (out_start + output_tile).saturating_sub(n_output);

        (in_pad_before, in_pad_after, out_pad_after, in_start.max(0) as usize)
    }

    /// Number of tiles along the output rows and columns.
    pub fn n_tiles(&self) -> (usize, usize) {
        (self.n_tile_rows, self.n_tile_cols)
    }

    /// Padding of tile `(tile_i, tile_j)`, as passed to its kernel.
    pub fn tile_padding(&self, tile_i: usize, tile_j: usize) -> Padding {
        self.classify(tile_i, tile_j).0
    }

    // Padding of a tile plus the first input row and column it reads.
    fn classify(&self, tile_i: usize, tile_j: usize) -> (Padding, usize, usize) {
        let (in_pad_top, in_pad_bottom, out_pad_bottom, first_row) = Self::axis_padding(
            tile_i * K::OUTPUT_TILE_ROWS,
            K::OUTPUT_TILE_ROWS,
            K::INNER_TILE_ROWS,
            K::STRIDE_ROWS,
            self.pad_top,
            self.n_input_rows,
            self.n_output_rows,
        );
        let (in_pad_left, in_pad_right, out_pad_right, first_col) = Self::axis_padding(
            tile_j * K::OUTPUT_TILE_COLS,
            K::OUTPUT_TILE_COLS,
            K::INNER_TILE_COLS,
            K::STRIDE_COLS,
            self.pad_left,
            self.n_input_cols,
            self.n_output_cols,
        );

        let padding = Padding::new(
            in_pad_top,
            in_pad_left,
            in_pad_bottom,
            in_pad_right,
            out_pad_bottom,
            out_pad_right,
        );
        (padding, first_row, first_col)
    }

    /// Processes every tile of tile row `tile_i` of one batch. `output` is
    /// the band of output rows the tile row covers.
    fn process_tile_row(&self, input: &[f32], weights: &[f32], output: &mut [f32], tile_i: usize) {
        let channels = self.n_channels;
        let table = K::tile_fns();

        let mut n_generic = 0;
        for tile_j in 0..self.n_tile_cols {
            let out_col = tile_j * K::OUTPUT_TILE_COLS;
            let (padding, first_row, first_col) = self.classify(tile_i, tile_j);

            let tile = Tile {
                n_channels: channels,
                weights: weights.as_ptr(),
                weight_row_stride: K::KERNEL_COLS * channels,
                weight_col_stride: channels,
                input: input[(first_row * self.n_input_cols + first_col) * channels..].as_ptr(),
                in_row_stride: self.n_input_cols * channels,
                in_col_stride: channels,
                output: output[out_col * channels..].as_mut_ptr(),
                out_row_stride: self.n_output_cols * channels,
                out_col_stride: channels,
            };

            let tile_fn = match table.lookup(&padding) {
                Some(tile_fn) => tile_fn,
                None => {
                    n_generic += 1;
                    table.generic
                }
            };

            // SAFETY: the buffers were checked against the planned shape and
            // `padding` excludes every cell outside them.
            unsafe { tile_fn(&tile, &padding) };
        }

        log::trace!(
            "depthwise tile row {}: {} tiles, {} generic",
            tile_i,
            self.n_tile_cols,
            n_generic
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depthwise::{
        Tile2x2Kernel3x3Stride1, Tile3x3Kernel3x3Stride1, Tile3x3Kernel3x3Stride2,
    };
    use crate::DepthwiseError;

    #[test]
    fn test_output_size() {
        type Conv = DepthwiseConvolution<Tile2x2Kernel3x3Stride1>;
        assert_eq!(Conv::output_size(7, 3, 1, PaddingType::Same), 7);
        assert_eq!(Conv::output_size(7, 3, 2, PaddingType::Same), 4);
        assert_eq!(Conv::output_size(7, 3, 1, PaddingType::Valid), 5);
        assert_eq!(Conv::output_size(7, 3, 2, PaddingType::Valid), 3);
        assert_eq!(Conv::output_size(2, 3, 1, PaddingType::Valid), 0);
    }

    #[test]
    fn test_same_padding_amounts() {
        let conv = DepthwiseConvolution::<Tile3x3Kernel3x3Stride1>::new(1, 5, 6, 3, PaddingType::Same)
            .unwrap();
        assert_eq!(conv.padding(), (1, 1, 1, 1));
        assert_eq!(conv.output_shape(), (1, 5, 6, 3));

        // stride 2: even sizes need one row after, odd sizes one on each side
        let conv = DepthwiseConvolution::<Tile3x3Kernel3x3Stride2>::new(2, 8, 7, 1, PaddingType::Same)
            .unwrap();
        assert_eq!(conv.padding(), (0, 1, 1, 1));
        assert_eq!(conv.output_shape(), (2, 4, 4, 1));
    }

    #[test]
    fn test_window_and_lengths() {
        let conv = DepthwiseConvolution::<Tile3x3Kernel3x3Stride1>::new(2, 7, 4, 5, PaddingType::Valid)
            .unwrap();
        assert_eq!(conv.output_shape(), (2, 5, 2, 5));
        // 5 output rows in tiles of 3
        assert_eq!(conv.window(), 4);
        assert_eq!(conv.input_len(), 2 * 7 * 4 * 5);
        assert_eq!(conv.weights_len(), 9 * 5);
        assert_eq!(conv.output_len(), 2 * 5 * 2 * 5);
    }

    #[test]
    fn test_invalid_shapes() {
        type Conv = DepthwiseConvolution<Tile2x2Kernel3x3Stride1>;
        assert!(matches!(
            Conv::new(1, 0, 4, 1, PaddingType::Same),
            Err(DepthwiseError::ShapeError { .. })
        ));
        assert!(matches!(
            Conv::new(1, 2, 4, 1, PaddingType::Valid),
            Err(DepthwiseError::ShapeError { .. })
        ));
        assert!(matches!(
            Conv::with_padding(1, 4, 4, 1, 3, 0, 0, 0),
            Err(DepthwiseError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_axis_padding() {
        type Conv = DepthwiseConvolution<Tile2x2Kernel3x3Stride1>;
        // 5 inputs, same padding of 1: tiles start at outputs 0, 2, 4
        assert_eq!(Conv::axis_padding(0, 2, 4, 1, 1, 5, 5), (1, 0, 0, 0));
        assert_eq!(Conv::axis_padding(2, 2, 4, 1, 1, 5, 5), (0, 0, 0, 1));
        assert_eq!(Conv::axis_padding(4, 2, 4, 1, 1, 5, 5), (0, 2, 1, 3));
    }

    #[test]
    fn test_buffer_and_window_errors() {
        let conv = DepthwiseConvolution::<Tile2x2Kernel3x3Stride1>::new(1, 4, 4, 2, PaddingType::Same)
            .unwrap();
        let input = vec![0.0f32; conv.input_len()];
        let weights = vec![0.0f32; conv.weights_len()];
        let mut output = vec![0.0f32; conv.output_len()];

        assert!(matches!(
            conv.run(&input[1..], &weights, &mut output),
            Err(DepthwiseError::BufferSizeError { buffer: "input", .. })
        ));
        assert!(matches!(
            conv.par_run(&input, &weights[..3], &mut output),
            Err(DepthwiseError::BufferSizeError { buffer: "weights", .. })
        ));
        assert!(matches!(
            conv.run_window(1, conv.window() + 1, &input, &weights, &mut output),
            Err(DepthwiseError::WindowError { .. })
        ));
        assert!(conv.run_window(1, 1, &input, &weights, &mut output).is_ok());
    }
}
