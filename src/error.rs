//! Error types for the depthwise convolution driver.
//!
//! Tile kernels never report errors; everything here is produced while the
//! driver validates a tensor shape or the buffers handed to it.

use std::fmt;

/// Errors that can occur while planning or running a depthwise convolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepthwiseError {
    /// The tensor shape or padding cannot produce an output.
    ShapeError {
        /// Human-readable error message.
        message: String,
    },
    /// A buffer is smaller than the tensor it is supposed to hold.
    BufferSizeError {
        /// Which buffer was rejected (`"input"`, `"weights"`, `"output"`).
        buffer: &'static str,
        /// Minimum number of elements required.
        expected: usize,
        /// Number of elements provided.
        actual: usize,
    },
    /// A work window outside `0..=window` or with `start > stop`.
    WindowError {
        start: usize,
        stop: usize,
        window: usize,
    },
}

impl fmt::Display for DepthwiseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepthwiseError::ShapeError { message } => {
                write!(f, "Invalid shape: {}", message)
            }
            DepthwiseError::BufferSizeError {
                buffer,
                expected,
                actual,
            } => write!(
                f,
                "Buffer too small: {} needs at least {} elements, got {}",
                buffer, expected, actual
            ),
            DepthwiseError::WindowError {
                start,
                stop,
                window,
            } => write!(
                f,
                "Invalid window: [{}, {}) is not within [0, {})",
                start, stop, window
            ),
        }
    }
}

impl std::error::Error for DepthwiseError {}

/// Result type alias for depthwise operations.
pub type Result<T> = std::result::Result<T, DepthwiseError>;

/// Creates a shape error.
pub fn shape_error(message: impl Into<String>) -> DepthwiseError {
    DepthwiseError::ShapeError {
        message: message.into(),
    }
}

/// Creates a buffer size error.
pub fn buffer_size_error(buffer: &'static str, expected: usize, actual: usize) -> DepthwiseError {
    DepthwiseError::BufferSizeError {
        buffer,
        expected,
        actual,
    }
}

/// Creates a window error.
pub fn window_error(start: usize, stop: usize, window: usize) -> DepthwiseError {
    DepthwiseError::WindowError {
        start,
        stop,
        window,
    }
}
