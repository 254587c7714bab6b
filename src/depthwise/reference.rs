//! Whole-tensor depthwise convolution without tiling.
//!
//! Slow but obviously correct; the tiled driver is tested and benchmarked
//! against it. Taps are accumulated in the same order and with the same
//! [`madd`] as the tile kernels, so results match them bit for bit.

use ndarray::{Array4, ArrayView3, ArrayView4};
use num::Float;

use crate::error::{shape_error, Result};
use crate::simd::madd;

/// Depthwise convolution of an NHWC `input` with `[rows][cols][channels]`
/// `weights`.
///
/// `padding` is `(top, left, bottom, right)` and `stride` is `(rows, cols)`.
pub fn depthwise_conv<T: Float>(
    input: ArrayView4<T>,
    weights: ArrayView3<T>,
    stride: (usize, usize),
    padding: (usize, usize, usize, usize),
) -> Result<Array4<T>> {
    let (n_batches, n_rows, n_cols, n_channels) = input.dim();
    let (kernel_rows, kernel_cols, weight_channels) = weights.dim();
    let (stride_rows, stride_cols) = stride;
    let (pad_top, pad_left, pad_bottom, pad_right) = padding;

    if weight_channels != n_channels {
        return Err(shape_error(format!(
            "weights have {} channels, input has {}",
            weight_channels, n_channels
        )));
    }
    if kernel_rows == 0 || kernel_cols == 0 || stride_rows == 0 || stride_cols == 0 {
        return Err(shape_error("kernel and stride must be non-zero"));
    }

    let padded_rows = n_rows + pad_top + pad_bottom;
    let padded_cols = n_cols + pad_left + pad_right;
    if padded_rows < kernel_rows || padded_cols < kernel_cols {
        return Err(shape_error(format!(
            "padded input {}x{} is smaller than the {}x{} kernel",
            padded_rows, padded_cols, kernel_rows, kernel_cols
        )));
    }

    let out_rows = (padded_rows - kernel_rows) / stride_rows + 1;
    let out_cols = (padded_cols - kernel_cols) / stride_cols + 1;

    let mut output = Array4::zeros((n_batches, out_rows, out_cols, n_channels));

    for ((b, i, j, c), out) in output.indexed_iter_mut() {
        let mut acc = T::zero();

        for ki in 0..kernel_rows {
            for kj in 0..kernel_cols {
                let row = (i * stride_rows + ki).checked_sub(pad_top).filter(|&x| x < n_rows);
                let col = (j * stride_cols + kj).checked_sub(pad_left).filter(|&x| x < n_cols);

                let u = match (row, col) {
                    (Some(row), Some(col)) => input[[b, row, col, c]],
                    _ => T::zero(),
                };
                let w = weights[[ki, kj, c]];

                acc = if ki == 0 && kj == 0 { w * u } else { madd(acc, w, u) };
            }
        }

        *out = acc;
    }

    Ok(output)
}
