//! Array dimensions.
//!
//! A [`Dimension`] is one axis of the coordinate space: a name, a `[lo, hi]`
//! domain in the coordinate type, and an optional tile extent. Dimensions
//! with a tile extent partition their axis into regular tiles; dimensions
//! without one belong to sparse arrays with irregular (capacity-bound) tiles.

use std::io;

use thiserror::Error;

use crate::{
    binary::{read_string, write_string, DeserializeError, ReadLeExt, WriteLeExt},
    coordinate::{coordinate_type_dispatch, buffer_unary, CoordinateBuffer, CoordinateType},
    datatype::Datatype,
};

/// A dimension of a [`Hyperspace`](crate::hyperspace::Hyperspace).
#[derive(Clone, Debug, PartialEq)]
pub struct Dimension {
    name: String,
    domain: CoordinateBuffer,
    tile_extent: Option<CoordinateBuffer>,
}

impl Dimension {
    /// Create a new dimension with domain `[lo, hi]` and an optional tile
    /// extent.
    ///
    /// The dimension is not validated on construction; [`Dimension::check`]
    /// (called when array metadata is built) reports violations.
    pub fn new<T: CoordinateType>(
        name: impl Into<String>,
        domain: [T; 2],
        tile_extent: Option<T>,
    ) -> Self {
        Self {
            name: name.into(),
            domain: T::into_buffer(domain.to_vec()),
            tile_extent: tile_extent.map(|extent| T::into_buffer(vec![extent])),
        }
    }

    /// The dimension name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The coordinate datatype of the dimension.
    #[must_use]
    pub fn datatype(&self) -> Datatype {
        self.domain.datatype()
    }

    /// The `[lo, hi]` domain of the dimension, if it holds coordinate type
    /// `T`.
    #[must_use]
    pub fn domain<T: CoordinateType>(&self) -> Option<&[T]> {
        self.domain.as_slice::<T>()
    }

    /// The raw domain buffer.
    #[must_use]
    pub const fn domain_buffer(&self) -> &CoordinateBuffer {
        &self.domain
    }

    /// The tile extent of the dimension, if present and of coordinate type
    /// `T`.
    #[must_use]
    pub fn tile_extent<T: CoordinateType>(&self) -> Option<T> {
        match self.tile_extent.as_ref()?.as_slice::<T>() {
            Some([extent]) => Some(*extent),
            _ => None,
        }
    }

    /// The raw tile extent buffer, if present.
    #[must_use]
    pub const fn tile_extent_buffer(&self) -> Option<&CoordinateBuffer> {
        self.tile_extent.as_ref()
    }

    /// Returns true if the dimension has a tile extent.
    #[must_use]
    pub const fn has_tile_extent(&self) -> bool {
        self.tile_extent.is_some()
    }

    /// Check the dimension invariants.
    ///
    /// # Errors
    /// Returns the first violated invariant: an empty name, an inverted or
    /// non-finite domain, an integer domain wider than `u64`, or an invalid
    /// tile extent.
    pub fn check(&self) -> Result<(), DimensionCheckError> {
        if self.name.is_empty() {
            return Err(DimensionCheckError::EmptyName);
        }
        buffer_unary!(&self.domain, domain => {
            check_typed(&self.name, domain, self.tile_extent.as_ref())
        })
    }

    /// Write the dimension to a stream. The coordinate type is carried by the
    /// enclosing hyperspace and is not persisted per dimension.
    pub(crate) fn write_to(&self, w: &mut impl io::Write) -> io::Result<()> {
        write_string(w, &self.name)?;
        self.domain.write_values_le(w)?;
        match &self.tile_extent {
            Some(extent) => {
                w.write_u8_le(1)?;
                extent.write_values_le(w)
            }
            None => w.write_u8_le(0),
        }
    }

    /// Read a dimension of coordinate type `datatype` from a stream.
    pub(crate) fn read_from(
        r: &mut impl io::Read,
        datatype: Datatype,
    ) -> Result<Self, DeserializeError> {
        let name = read_string(r)?;
        coordinate_type_dispatch!(datatype, T => {
            let lo = T::read_le(r)?;
            let hi = T::read_le(r)?;
            let tile_extent = match r.read_u8_le()? {
                0 => None,
                _ => Some(T::read_le(r)?),
            };
            Ok(Self::new::<T>(name, [lo, hi], tile_extent))
        }, _ => Err(DeserializeError::NonCoordinateDatatype(datatype)))
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.name, self.datatype(), self.domain)?;
        if let Some(extent) = &self.tile_extent {
            write!(f, " extent {extent}")?;
        }
        Ok(())
    }
}

fn check_typed<T: CoordinateType>(
    name: &str,
    domain: &[T],
    tile_extent: Option<&CoordinateBuffer>,
) -> Result<(), DimensionCheckError> {
    let (lo, hi) = (domain[0], domain[1]);
    if !lo.is_finite_coord() || !hi.is_finite_coord() {
        return Err(DimensionCheckError::NonFiniteDomain(name.to_string()));
    }
    if lo > hi {
        return Err(DimensionCheckError::InvalidDomain {
            name: name.to_string(),
            lo: lo.to_string(),
            hi: hi.to_string(),
        });
    }
    if T::DATATYPE.is_integer() && T::span(lo, hi).is_none() {
        return Err(DimensionCheckError::DomainSpanOverflow(name.to_string()));
    }
    if let Some(buffer) = tile_extent {
        let Some([extent]) = buffer.as_slice::<T>() else {
            return Err(DimensionCheckError::InvalidTileExtent(name.to_string()));
        };
        if !T::is_valid_extent(*extent) || !T::extent_fits(*extent, lo, hi) {
            return Err(DimensionCheckError::InvalidTileExtent(name.to_string()));
        }
    }
    Ok(())
}

/// A dimension invariant violation.
#[derive(Clone, Debug, Error)]
pub enum DimensionCheckError {
    /// A dimension with an empty name.
    #[error("dimension names must be non-empty")]
    EmptyName,
    /// A domain whose lower bound exceeds its upper bound.
    #[error("invalid domain [{lo}, {hi}] on dimension {name}")]
    InvalidDomain {
        /// The dimension name.
        name: String,
        /// The lower domain bound.
        lo: String,
        /// The upper domain bound.
        hi: String,
    },
    /// A floating point domain bound that is infinite or NaN.
    #[error("domain of dimension {0} must be finite")]
    NonFiniteDomain(String),
    /// An integer domain with more cells than a `u64` can count.
    #[error("domain span of dimension {0} exceeds u64")]
    DomainSpanOverflow(String),
    /// A tile extent that is non-positive, non-finite, or wider than the
    /// domain.
    #[error("invalid tile extent on dimension {0}")]
    InvalidTileExtent(String),
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn dimension_accessors() {
        let dimension = Dimension::new("rows", [1i32, 4], Some(2));
        assert_eq!(dimension.name(), "rows");
        assert_eq!(dimension.datatype(), Datatype::Int32);
        assert_eq!(dimension.domain::<i32>(), Some(&[1, 4][..]));
        assert_eq!(dimension.domain::<i64>(), None);
        assert_eq!(dimension.tile_extent::<i32>(), Some(2));
        assert!(dimension.has_tile_extent());
        assert!(dimension.check().is_ok());
    }

    #[test]
    fn dimension_without_extent() {
        let dimension = Dimension::new("x", [0.0f64, 100.0], None);
        assert!(!dimension.has_tile_extent());
        assert_eq!(dimension.tile_extent::<f64>(), None);
        assert!(dimension.check().is_ok());
    }

    #[test]
    fn dimension_check_empty_name() {
        let dimension = Dimension::new("", [1i32, 4], None);
        assert!(matches!(
            dimension.check(),
            Err(DimensionCheckError::EmptyName)
        ));
    }

    #[test]
    fn dimension_check_inverted_domain() {
        let dimension = Dimension::new("rows", [4i32, 1], None);
        assert!(matches!(
            dimension.check(),
            Err(DimensionCheckError::InvalidDomain { .. })
        ));
    }

    #[test]
    fn dimension_check_non_finite_domain() {
        let dimension = Dimension::new("x", [0.0f32, f32::INFINITY], None);
        assert!(matches!(
            dimension.check(),
            Err(DimensionCheckError::NonFiniteDomain(_))
        ));
        let dimension = Dimension::new("x", [f64::NAN, 1.0], None);
        assert!(matches!(
            dimension.check(),
            Err(DimensionCheckError::NonFiniteDomain(_))
        ));
    }

    #[test]
    fn dimension_check_span_overflow() {
        let dimension = Dimension::new("rows", [i64::MIN, i64::MAX], None);
        assert!(matches!(
            dimension.check(),
            Err(DimensionCheckError::DomainSpanOverflow(_))
        ));
        // One cell short of 2^64 is representable.
        let dimension = Dimension::new("rows", [i64::MIN, i64::MAX - 1], None);
        assert!(dimension.check().is_ok());
    }

    #[test]
    fn dimension_check_invalid_extent() {
        let dimension = Dimension::new("rows", [1i32, 4], Some(0));
        assert!(matches!(
            dimension.check(),
            Err(DimensionCheckError::InvalidTileExtent(_))
        ));
        let dimension = Dimension::new("rows", [1i32, 4], Some(-2));
        assert!(dimension.check().is_err());
        let dimension = Dimension::new("rows", [1i32, 4], Some(5));
        assert!(dimension.check().is_err());
        let dimension = Dimension::new("x", [0.0f64, 10.0], Some(f64::NAN));
        assert!(dimension.check().is_err());
    }

    #[test]
    fn dimension_round_trip() {
        let dimension = Dimension::new("rows", [1i32, 4], Some(2));
        let mut bytes = Vec::new();
        dimension.write_to(&mut bytes).unwrap();
        // name_len + name + lo + hi + has_extent + extent
        assert_eq!(bytes.len(), 4 + 4 + 4 + 4 + 1 + 4);
        let decoded = Dimension::read_from(&mut Cursor::new(bytes), Datatype::Int32).unwrap();
        assert_eq!(decoded, dimension);
    }

    #[test]
    fn dimension_round_trip_no_extent() {
        let dimension = Dimension::new("x", [-1.5f64, 3.25], None);
        let mut bytes = Vec::new();
        dimension.write_to(&mut bytes).unwrap();
        let decoded = Dimension::read_from(&mut Cursor::new(bytes), Datatype::Float64).unwrap();
        assert_eq!(decoded, dimension);
    }

    #[test]
    fn dimension_read_non_coordinate_type() {
        let dimension = Dimension::new("rows", [1i8, 4], None);
        let mut bytes = Vec::new();
        dimension.write_to(&mut bytes).unwrap();
        assert!(matches!(
            Dimension::read_from(&mut Cursor::new(bytes), Datatype::Char),
            Err(DeserializeError::NonCoordinateDatatype(_))
        ));
    }
}
