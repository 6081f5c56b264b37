//! Linearization orders.
//!
//! A [`Layout`] selects how a multi-dimensional range is flattened to one
//! dimension. Array metadata uses layouts at two levels at once: the order of
//! tiles within the tile domain, and the order of cells within a tile. Only
//! [`Layout::RowMajor`] and [`Layout::ColMajor`] are valid there;
//! [`Layout::GlobalOrder`] and [`Layout::Unordered`] exist for the query
//! layer and are rejected by the metadata builder.

use derive_more::Display;
use thiserror::Error;

/// A linearization order.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
#[repr(u8)]
pub enum Layout {
    /// Row-major (C order): the last dimension varies fastest.
    #[display("row-major")]
    RowMajor = 0,
    /// Column-major (Fortran order): the first dimension varies fastest.
    #[display("col-major")]
    ColMajor = 1,
    /// The global order of the array (tile order, then cell order).
    #[display("global-order")]
    GlobalOrder = 2,
    /// No particular order.
    #[display("unordered")]
    Unordered = 3,
}

impl Layout {
    /// The wire tag of the layout.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }
}

/// An unsupported layout tag error.
#[derive(Copy, Clone, Debug, Error)]
#[error("unsupported layout tag {0}")]
pub struct UnsupportedLayoutTagError(u8);

impl TryFrom<u8> for Layout {
    type Error = UnsupportedLayoutTagError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Self::RowMajor),
            1 => Ok(Self::ColMajor),
            2 => Ok(Self::GlobalOrder),
            3 => Ok(Self::Unordered),
            _ => Err(UnsupportedLayoutTagError(tag)),
        }
    }
}
