//! Padding-indexed tables of tile kernels.
//!
//! Every kernel specialisation owns one `static` [`TileFnTable`] built with
//! `tile_fn_table!`. The tables are plain function pointers, so a lookup is
//! a couple of bounds checks and a load.

use crate::depthwise::{Padding, TileFn};

/// Tile kernels of one specialisation, indexed by padding.
///
/// - `top[n]` / `left[n]`: only `n` rows (columns) of input padding on that
///   edge. Entry 0 is the unpadded kernel.
/// - `bottom[in][out]` / `right[in][out]`: input and output padding on the
///   far edge, which occur together near the end of a tensor.
/// - `generic`: any padding, used for everything the tables do not cover.
#[derive(Clone, Copy)]
pub struct TileFnTable {
    pub unpadded: TileFn,
    pub top: &'static [TileFn],
    pub left: &'static [TileFn],
    pub bottom: &'static [&'static [TileFn]],
    pub right: &'static [&'static [TileFn]],
    pub generic: TileFn,
}

impl TileFnTable {
    /// The specialised kernel for `padding`, if the table has one.
    ///
    /// Returns `None` when more than one edge is padded or an amount is past
    /// the end of its table.
    pub fn lookup(&self, padding: &Padding) -> Option<TileFn> {
        let top = padding.in_top > 0;
        let left = padding.in_left > 0;
        let bottom = padding.in_bottom > 0 || padding.out_bottom > 0;
        let right = padding.in_right > 0 || padding.out_right > 0;

        match (top, left, bottom, right) {
            (false, false, false, false) => Some(self.unpadded),
            (true, false, false, false) => self.top.get(padding.in_top).copied(),
            (false, true, false, false) => self.left.get(padding.in_left).copied(),
            (false, false, true, false) => self
                .bottom
                .get(padding.in_bottom)
                .and_then(|row| row.get(padding.out_bottom))
                .copied(),
            (false, false, false, true) => self
                .right
                .get(padding.in_right)
                .and_then(|row| row.get(padding.out_right))
                .copied(),
            _ => None,
        }
    }

    /// The kernel to run for a tile with `padding`: the specialised one when
    /// it exists, [`Self::generic`](TileFnTable::generic) otherwise.
    #[inline]
    pub fn select(&self, padding: &Padding) -> TileFn {
        self.lookup(padding).unwrap_or(self.generic)
    }

    /// Number of specialised entries, `unpadded` included once.
    pub fn n_specialised(&self) -> usize {
        let edge = |t: &[TileFn]| t.len().saturating_sub(1);
        let far = |t: &[&[TileFn]]| t.iter().map(|r| r.len()).sum::<usize>().saturating_sub(1);

        1 + edge(self.top) + edge(self.left) + far(self.bottom) + far(self.right)
    }
}

/// Builds a [`TileFnTable`] for a `ConvImpl` type.
///
/// ```ignore
/// static TILE_FNS: TileFnTable = tile_fn_table! {
///     Tile2x2Kernel3x3Stride1,
///     top: [0, 1],
///     left: [0, 1],
///     bottom: [0, 1, 2, 3] x [0, 1],
///     right: [0, 1, 2, 3] x [0, 1],
/// };
/// ```
///
/// `bottom` and `right` take the input padding amounts, then the output
/// padding amounts; one kernel is instantiated for each pair.
macro_rules! tile_fn_table {
    (
        $conv:ty,
        top: [$($pt:literal),* $(,)?],
        left: [$($pl:literal),* $(,)?],
        bottom: [$($pb:literal),* $(,)?] x $obs:tt,
        right: [$($pr:literal),* $(,)?] x $ors:tt $(,)?
    ) => {
        $crate::depthwise::TileFnTable {
            unpadded: <$conv>::process_tile::<0, 0, 0, 0, 0, 0> as $crate::depthwise::TileFn,
            top: &[$(<$conv>::process_tile::<$pt, 0, 0, 0, 0, 0> as $crate::depthwise::TileFn),*],
            left: &[$(<$conv>::process_tile::<0, $pl, 0, 0, 0, 0> as $crate::depthwise::TileFn),*],
            bottom: &[$($crate::depthwise::dispatch::tile_fn_row!($conv, bottom, $pb, $obs)),*],
            right: &[$($crate::depthwise::dispatch::tile_fn_row!($conv, right, $pr, $ors)),*],
            generic: <$conv>::process_tile_generic as $crate::depthwise::TileFn,
        }
    };
}

// One row of a bottom/right table. The output amounts arrive as a single
// token tree so the outer macro can repeat over input amounts only.
macro_rules! tile_fn_row {
    ($conv:ty, bottom, $pb:literal, [$($pob:literal),* $(,)?]) => {
        &[$(<$conv>::process_tile::<0, 0, $pb, 0, $pob, 0> as $crate::depthwise::TileFn),*]
    };
    ($conv:ty, right, $pr:literal, [$($por:literal),* $(,)?]) => {
        &[$(<$conv>::process_tile::<0, 0, 0, $pr, 0, $por> as $crate::depthwise::TileFn),*]
    };
}

pub(crate) use tile_fn_row;
pub(crate) use tile_fn_table;
