//! Hyperspaces.
//!
//! A [`Hyperspace`] is the ordered collection of [`Dimension`]s that defines
//! an array's coordinate space. All dimensions of a hyperspace share one
//! coordinate type, and either all of them carry a tile extent (regular
//! tiles) or none of them do (irregular tiles).

use std::io;

use thiserror::Error;

use crate::{
    binary::{DeserializeError, ReadLeExt, WriteLeExt},
    coordinate::{coordinate_type_dispatch, CoordinateBuffer, CoordinateType},
    datatype::Datatype,
    dimension::{Dimension, DimensionCheckError},
};

/// The ordered collection of dimensions of an array.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hyperspace {
    dimensions: Vec<Dimension>,
}

impl Hyperspace {
    /// Create a new hyperspace with no dimensions.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            dimensions: Vec::new(),
        }
    }

    /// Append a dimension.
    pub fn add_dimension(&mut self, dimension: Dimension) -> &mut Self {
        self.dimensions.push(dimension);
        self
    }

    /// The number of dimensions.
    #[must_use]
    pub fn dim_num(&self) -> usize {
        self.dimensions.len()
    }

    /// The `i`-th dimension.
    #[must_use]
    pub fn dimension(&self, i: usize) -> Option<&Dimension> {
        self.dimensions.get(i)
    }

    /// The dimensions in declaration order.
    #[must_use]
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// The coordinate datatype shared by the dimensions, or [`None`] for an
    /// empty hyperspace.
    #[must_use]
    pub fn datatype(&self) -> Option<Datatype> {
        self.dimensions.first().map(Dimension::datatype)
    }

    /// Returns true if every dimension carries a tile extent.
    #[must_use]
    pub fn has_tile_extents(&self) -> bool {
        !self.dimensions.is_empty()
            && self.dimensions.iter().all(Dimension::has_tile_extent)
    }

    /// The concatenated `[lo, hi]` domain of every dimension, in declaration
    /// order (`2 * dim_num` values). [`None`] for an empty hyperspace.
    #[must_use]
    pub fn domain_buffer(&self) -> Option<CoordinateBuffer> {
        let datatype = self.datatype()?;
        coordinate_type_dispatch!(datatype, T => {
            let mut values = Vec::with_capacity(2 * self.dimensions.len());
            for dimension in &self.dimensions {
                values.extend_from_slice(dimension.domain::<T>()?);
            }
            Some(T::into_buffer(values))
        }, _ => None)
    }

    /// The tile extents of every dimension, in declaration order (`dim_num`
    /// values). [`None`] unless every dimension carries an extent.
    #[must_use]
    pub fn tile_extents_buffer(&self) -> Option<CoordinateBuffer> {
        let datatype = self.datatype()?;
        coordinate_type_dispatch!(datatype, T => {
            let mut values = Vec::with_capacity(self.dimensions.len());
            for dimension in &self.dimensions {
                values.push(dimension.tile_extent::<T>()?);
            }
            Some(T::into_buffer(values))
        }, _ => None)
    }

    /// Check the hyperspace invariants.
    ///
    /// # Errors
    /// Returns the first violated invariant: no dimensions, a coordinate type
    /// mismatch across dimensions, mixed presence of tile extents, or a
    /// dimension-level violation.
    pub fn check(&self) -> Result<(), HyperspaceCheckError> {
        let Some(datatype) = self.datatype() else {
            return Err(HyperspaceCheckError::NoDimensions);
        };
        let has_extents = self.dimensions[0].has_tile_extent();
        for dimension in &self.dimensions {
            if dimension.datatype() != datatype {
                return Err(HyperspaceCheckError::CoordinateTypeMismatch {
                    name: dimension.name().to_string(),
                    got: dimension.datatype(),
                    expected: datatype,
                });
            }
            if dimension.has_tile_extent() != has_extents {
                return Err(HyperspaceCheckError::MixedTileExtents(
                    dimension.name().to_string(),
                ));
            }
            dimension.check()?;
        }
        Ok(())
    }

    /// Write the hyperspace to a stream.
    pub(crate) fn write_to(&self, w: &mut impl io::Write) -> io::Result<()> {
        let Some(datatype) = self.datatype() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "hyperspace has no dimensions",
            ));
        };
        let dim_num = u32::try_from(self.dimensions.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many dimensions"))?;
        w.write_u32_le(dim_num)?;
        w.write_u8_le(datatype.tag())?;
        for dimension in &self.dimensions {
            dimension.write_to(w)?;
        }
        Ok(())
    }

    /// Read a hyperspace from a stream.
    pub(crate) fn read_from(r: &mut impl io::Read) -> Result<Self, DeserializeError> {
        let dim_num = r.read_u32_le()?;
        let datatype = Datatype::try_from(r.read_u8_le()?)?;
        if !datatype.is_coordinate_type() {
            return Err(DeserializeError::NonCoordinateDatatype(datatype));
        }
        let mut hyperspace = Self::new();
        for _ in 0..dim_num {
            hyperspace.add_dimension(Dimension::read_from(r, datatype)?);
        }
        Ok(hyperspace)
    }
}

/// A hyperspace invariant violation.
#[derive(Clone, Debug, Error)]
pub enum HyperspaceCheckError {
    /// A hyperspace with no dimensions.
    #[error("hyperspace has no dimensions")]
    NoDimensions,
    /// A dimension whose coordinate type differs from the first dimension's.
    #[error("dimension {name} has coordinate type {got}, expected {expected}")]
    CoordinateTypeMismatch {
        /// The offending dimension name.
        name: String,
        /// The coordinate type of the offending dimension.
        got: Datatype,
        /// The coordinate type of the hyperspace.
        expected: Datatype,
    },
    /// Tile extents present on some dimensions but not all.
    #[error("tile extents must be set on all dimensions or none, dimension {0} differs")]
    MixedTileExtents(String),
    /// A dimension-level violation.
    #[error(transparent)]
    Dimension(#[from] DimensionCheckError),
}
