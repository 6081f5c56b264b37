//! Coordinate types and coordinate buffers.
//!
//! Dimension domains and tile extents are stored as [`CoordinateBuffer`]s, a
//! tagged variant keyed by [`Datatype`]. Typed access goes through the sealed
//! [`CoordinateType`] trait, so a buffer can only ever be read as the type it
//! was built with.
//!
//! [`CoordinateType`] also carries the per-type arithmetic that the geometry
//! engine needs: tile indices, in-tile offsets, domain spans, and tile-grid
//! snapping. Integer arithmetic widens through `i128`/`u128` so that domains
//! spanning the full range of their type cannot overflow intermediates;
//! floating point arithmetic uses IEEE `floor` semantics.

use std::io;

use itertools::Itertools;
use num_traits::{Bounded, Num, NumCast, ToPrimitive};

use crate::datatype::Datatype;

mod sealed {
    pub trait Sealed {}
}

/// A coordinate type.
///
/// This trait is sealed and implemented for exactly `i8`, `u8`, `i16`, `u16`,
/// `i32`, `u32`, `i64`, `u64`, `f32`, and `f64`, matching the
/// [`Datatype`]s for which [`Datatype::is_coordinate_type`] holds.
pub trait CoordinateType:
    sealed::Sealed
    + Copy
    + PartialOrd
    + Num
    + NumCast
    + Bounded
    + std::fmt::Debug
    + std::fmt::Display
    + Send
    + Sync
    + 'static
{
    /// The datatype of this coordinate type.
    const DATATYPE: Datatype;

    /// Write the value to `w` in little-endian byte order.
    ///
    /// # Errors
    /// Returns an error if writing to `w` fails.
    fn write_le(self, w: &mut impl io::Write) -> io::Result<()>;

    /// Read a value from `r` in little-endian byte order.
    ///
    /// # Errors
    /// Returns an error if reading from `r` fails.
    fn read_le(r: &mut impl io::Read) -> io::Result<Self>;

    /// Borrow the values of `buffer` if it holds this coordinate type.
    fn from_buffer(buffer: &CoordinateBuffer) -> Option<&[Self]>;

    /// Wrap `values` into a [`CoordinateBuffer`].
    fn into_buffer(values: Vec<Self>) -> CoordinateBuffer;

    /// Returns true if the value is a valid domain bound.
    ///
    /// Always true for integers; finite (neither infinite nor NaN) for
    /// floating point.
    fn is_finite_coord(self) -> bool;

    /// The number of cells in `[lo, hi]`, if representable as a `u64`.
    fn span(lo: Self, hi: Self) -> Option<u64>;

    /// The offset of `self` from `lo`, in cells.
    fn offset_from(self, lo: Self) -> u64;

    /// The index of the tile containing `self` on an axis with lower domain
    /// bound `lo` and tile extent `extent`.
    fn tile_index(self, lo: Self, extent: Self) -> u64;

    /// The offset of `self` within its tile on an axis with lower domain
    /// bound `lo` and tile extent `extent`.
    fn in_tile_offset(self, lo: Self, extent: Self) -> u64;

    /// Snap `self` down to the tile boundary at or below it.
    fn tile_snap_down(self, lo: Self, extent: Self) -> Self;

    /// Snap `self` up to the last cell of its tile.
    fn tile_snap_up(self, lo: Self, extent: Self) -> Self;

    /// The next coordinate on the axis, or [`None`] at the type bound.
    fn step_forward(self) -> Option<Self>;

    /// The previous coordinate on the axis, or [`None`] at the type bound.
    fn step_backward(self) -> Option<Self>;

    /// Returns true if `extent` is a valid tile extent (positive and finite).
    fn is_valid_extent(extent: Self) -> bool;

    /// Returns true if `extent` is no larger than the span of `[lo, hi]`.
    fn extent_fits(extent: Self, lo: Self, hi: Self) -> bool;

    /// Returns true if `extent` divides the span of `[lo, hi]` a whole number
    /// of times. Always true for floating point extents.
    fn divides(extent: Self, lo: Self, hi: Self) -> bool;
}

/// A buffer of coordinate values, tagged by datatype.
#[derive(Clone, Debug, PartialEq, derive_more::From)]
pub enum CoordinateBuffer {
    /// `int8` values.
    Int8(Vec<i8>),
    /// `uint8` values.
    UInt8(Vec<u8>),
    /// `int16` values.
    Int16(Vec<i16>),
    /// `uint16` values.
    UInt16(Vec<u16>),
    /// `int32` values.
    Int32(Vec<i32>),
    /// `uint32` values.
    UInt32(Vec<u32>),
    /// `int64` values.
    Int64(Vec<i64>),
    /// `uint64` values.
    UInt64(Vec<u64>),
    /// `float32` values.
    Float32(Vec<f32>),
    /// `float64` values.
    Float64(Vec<f64>),
}

/// Run `$body` with `$values` bound to the typed values of `$buffer`.
macro_rules! buffer_unary {
    ($buffer:expr, $values:ident => $body:expr) => {
        match $buffer {
            $crate::coordinate::CoordinateBuffer::Int8($values) => $body,
            $crate::coordinate::CoordinateBuffer::UInt8($values) => $body,
            $crate::coordinate::CoordinateBuffer::Int16($values) => $body,
            $crate::coordinate::CoordinateBuffer::UInt16($values) => $body,
            $crate::coordinate::CoordinateBuffer::Int32($values) => $body,
            $crate::coordinate::CoordinateBuffer::UInt32($values) => $body,
            $crate::coordinate::CoordinateBuffer::Int64($values) => $body,
            $crate::coordinate::CoordinateBuffer::UInt64($values) => $body,
            $crate::coordinate::CoordinateBuffer::Float32($values) => $body,
            $crate::coordinate::CoordinateBuffer::Float64($values) => $body,
        }
    };
}
pub(crate) use buffer_unary;

/// Run `$body` with `$a` and `$b` bound to the typed values of two buffers of
/// the same coordinate type, or `$fallback` if their types differ.
macro_rules! buffer_binary {
    ($lhs:expr, $rhs:expr, ($a:ident, $b:ident) => $body:expr, _ => $fallback:expr) => {
        match ($lhs, $rhs) {
            (
                $crate::coordinate::CoordinateBuffer::Int8($a),
                $crate::coordinate::CoordinateBuffer::Int8($b),
            ) => $body,
            (
                $crate::coordinate::CoordinateBuffer::UInt8($a),
                $crate::coordinate::CoordinateBuffer::UInt8($b),
            ) => $body,
            (
                $crate::coordinate::CoordinateBuffer::Int16($a),
                $crate::coordinate::CoordinateBuffer::Int16($b),
            ) => $body,
            (
                $crate::coordinate::CoordinateBuffer::UInt16($a),
                $crate::coordinate::CoordinateBuffer::UInt16($b),
            ) => $body,
            (
                $crate::coordinate::CoordinateBuffer::Int32($a),
                $crate::coordinate::CoordinateBuffer::Int32($b),
            ) => $body,
            (
                $crate::coordinate::CoordinateBuffer::UInt32($a),
                $crate::coordinate::CoordinateBuffer::UInt32($b),
            ) => $body,
            (
                $crate::coordinate::CoordinateBuffer::Int64($a),
                $crate::coordinate::CoordinateBuffer::Int64($b),
            ) => $body,
            (
                $crate::coordinate::CoordinateBuffer::UInt64($a),
                $crate::coordinate::CoordinateBuffer::UInt64($b),
            ) => $body,
            (
                $crate::coordinate::CoordinateBuffer::Float32($a),
                $crate::coordinate::CoordinateBuffer::Float32($b),
            ) => $body,
            (
                $crate::coordinate::CoordinateBuffer::Float64($a),
                $crate::coordinate::CoordinateBuffer::Float64($b),
            ) => $body,
            _ => $fallback,
        }
    };
}
pub(crate) use buffer_binary;

/// Run `$body` with `$t` bound to the coordinate type of `$datatype`, or
/// `$fallback` if `$datatype` is not a coordinate type.
macro_rules! coordinate_type_dispatch {
    ($datatype:expr, $t:ident => $body:expr, _ => $fallback:expr) => {
        match $datatype {
            $crate::datatype::Datatype::Int8 => {
                type $t = i8;
                $body
            }
            $crate::datatype::Datatype::UInt8 => {
                type $t = u8;
                $body
            }
            $crate::datatype::Datatype::Int16 => {
                type $t = i16;
                $body
            }
            $crate::datatype::Datatype::UInt16 => {
                type $t = u16;
                $body
            }
            $crate::datatype::Datatype::Int32 => {
                type $t = i32;
                $body
            }
            $crate::datatype::Datatype::UInt32 => {
                type $t = u32;
                $body
            }
            $crate::datatype::Datatype::Int64 => {
                type $t = i64;
                $body
            }
            $crate::datatype::Datatype::UInt64 => {
                type $t = u64;
                $body
            }
            $crate::datatype::Datatype::Float32 => {
                type $t = f32;
                $body
            }
            $crate::datatype::Datatype::Float64 => {
                type $t = f64;
                $body
            }
            _ => $fallback,
        }
    };
}
pub(crate) use coordinate_type_dispatch;

fn datatype_of<T: CoordinateType>(_values: &[T]) -> Datatype {
    T::DATATYPE
}

fn write_values<T: CoordinateType>(values: &[T], w: &mut impl io::Write) -> io::Result<()> {
    for value in values {
        value.write_le(w)?;
    }
    Ok(())
}

impl CoordinateBuffer {
    /// The datatype of the values in the buffer.
    #[must_use]
    pub fn datatype(&self) -> Datatype {
        buffer_unary!(self, values => datatype_of(values))
    }

    /// The number of values in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        buffer_unary!(self, values => values.len())
    }

    /// Returns true if the buffer holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the values if the buffer holds coordinate type `T`.
    #[must_use]
    pub fn as_slice<T: CoordinateType>(&self) -> Option<&[T]> {
        T::from_buffer(self)
    }

    /// Write the raw values to `w` in little-endian byte order, tightly
    /// packed, without a length prefix or type tag.
    pub(crate) fn write_values_le(&self, w: &mut impl io::Write) -> io::Result<()> {
        buffer_unary!(self, values => write_values(values, w))
    }
}

impl std::fmt::Display for CoordinateBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        buffer_unary!(self, values => write!(f, "[{}]", values.iter().join(", ")))
    }
}

macro_rules! impl_coordinate_signed {
    ($($t:ty => $variant:ident),* $(,)?) => {$(
        impl sealed::Sealed for $t {}

        impl CoordinateType for $t {
            const DATATYPE: Datatype = Datatype::$variant;

            fn write_le(self, w: &mut impl io::Write) -> io::Result<()> {
                w.write_all(&self.to_le_bytes())
            }

            fn read_le(r: &mut impl io::Read) -> io::Result<Self> {
                let mut bytes = [0u8; std::mem::size_of::<$t>()];
                r.read_exact(&mut bytes)?;
                Ok(<$t>::from_le_bytes(bytes))
            }

            fn from_buffer(buffer: &CoordinateBuffer) -> Option<&[Self]> {
                match buffer {
                    CoordinateBuffer::$variant(values) => Some(values),
                    _ => None,
                }
            }

            fn into_buffer(values: Vec<Self>) -> CoordinateBuffer {
                CoordinateBuffer::$variant(values)
            }

            fn is_finite_coord(self) -> bool {
                true
            }

            fn span(lo: Self, hi: Self) -> Option<u64> {
                u64::try_from(<i128 as From<$t>>::from(hi) - <i128 as From<$t>>::from(lo) + 1).ok()
            }

            fn offset_from(self, lo: Self) -> u64 {
                (<i128 as From<$t>>::from(self) - <i128 as From<$t>>::from(lo)).max(0) as u64
            }

            fn tile_index(self, lo: Self, extent: Self) -> u64 {
                (<i128 as From<$t>>::from(self) - <i128 as From<$t>>::from(lo))
                    .div_euclid(<i128 as From<$t>>::from(extent))
                    .max(0) as u64
            }

            fn in_tile_offset(self, lo: Self, extent: Self) -> u64 {
                (<i128 as From<$t>>::from(self) - <i128 as From<$t>>::from(lo)).rem_euclid(<i128 as From<$t>>::from(extent)) as u64
            }

            fn tile_snap_down(self, lo: Self, extent: Self) -> Self {
                let lo = <i128 as From<$t>>::from(lo);
                let extent = <i128 as From<$t>>::from(extent);
                let snapped = lo + (<i128 as From<$t>>::from(self) - lo).div_euclid(extent) * extent;
                snapped.clamp(<i128 as From<$t>>::from(Self::MIN), <i128 as From<$t>>::from(Self::MAX)) as $t
            }

            fn tile_snap_up(self, lo: Self, extent: Self) -> Self {
                let lo = <i128 as From<$t>>::from(lo);
                let extent = <i128 as From<$t>>::from(extent);
                let snapped = lo + ((<i128 as From<$t>>::from(self) - lo).div_euclid(extent) + 1) * extent - 1;
                snapped.clamp(<i128 as From<$t>>::from(Self::MIN), <i128 as From<$t>>::from(Self::MAX)) as $t
            }

            fn step_forward(self) -> Option<Self> {
                self.checked_add(1)
            }

            fn step_backward(self) -> Option<Self> {
                self.checked_sub(1)
            }

            fn is_valid_extent(extent: Self) -> bool {
                extent > 0
            }

            fn extent_fits(extent: Self, lo: Self, hi: Self) -> bool {
                <i128 as From<$t>>::from(extent) <= <i128 as From<$t>>::from(hi) - <i128 as From<$t>>::from(lo) + 1
            }

            fn divides(extent: Self, lo: Self, hi: Self) -> bool {
                let span = <i128 as From<$t>>::from(hi) - <i128 as From<$t>>::from(lo) + 1;
                extent > 0 && span.rem_euclid(<i128 as From<$t>>::from(extent)) == 0
            }
        }
    )*};
}

macro_rules! impl_coordinate_unsigned {
    ($($t:ty => $variant:ident),* $(,)?) => {$(
        impl sealed::Sealed for $t {}

        impl CoordinateType for $t {
            const DATATYPE: Datatype = Datatype::$variant;

            fn write_le(self, w: &mut impl io::Write) -> io::Result<()> {
                w.write_all(&self.to_le_bytes())
            }

            fn read_le(r: &mut impl io::Read) -> io::Result<Self> {
                let mut bytes = [0u8; std::mem::size_of::<$t>()];
                r.read_exact(&mut bytes)?;
                Ok(<$t>::from_le_bytes(bytes))
            }

            fn from_buffer(buffer: &CoordinateBuffer) -> Option<&[Self]> {
                match buffer {
                    CoordinateBuffer::$variant(values) => Some(values),
                    _ => None,
                }
            }

            fn into_buffer(values: Vec<Self>) -> CoordinateBuffer {
                CoordinateBuffer::$variant(values)
            }

            fn is_finite_coord(self) -> bool {
                true
            }

            fn span(lo: Self, hi: Self) -> Option<u64> {
                u64::try_from(<u128 as From<$t>>::from(hi).saturating_sub(<u128 as From<$t>>::from(lo)) + 1).ok()
            }

            fn offset_from(self, lo: Self) -> u64 {
                <u128 as From<$t>>::from(self).saturating_sub(<u128 as From<$t>>::from(lo)) as u64
            }

            fn tile_index(self, lo: Self, extent: Self) -> u64 {
                (<u128 as From<$t>>::from(self).saturating_sub(<u128 as From<$t>>::from(lo)) / <u128 as From<$t>>::from(extent)) as u64
            }

            fn in_tile_offset(self, lo: Self, extent: Self) -> u64 {
                (<u128 as From<$t>>::from(self).saturating_sub(<u128 as From<$t>>::from(lo)) % <u128 as From<$t>>::from(extent)) as u64
            }

            fn tile_snap_down(self, lo: Self, extent: Self) -> Self {
                let lo = <u128 as From<$t>>::from(lo);
                let extent = <u128 as From<$t>>::from(extent);
                let snapped =
                    lo + <u128 as From<$t>>::from(self).saturating_sub(lo) / extent * extent;
                snapped.min(<u128 as From<$t>>::from(Self::MAX)) as $t
            }

            fn tile_snap_up(self, lo: Self, extent: Self) -> Self {
                let lo = <u128 as From<$t>>::from(lo);
                let extent = <u128 as From<$t>>::from(extent);
                let snapped =
                    lo + (<u128 as From<$t>>::from(self).saturating_sub(lo) / extent + 1) * extent - 1;
                snapped.min(<u128 as From<$t>>::from(Self::MAX)) as $t
            }

            fn step_forward(self) -> Option<Self> {
                self.checked_add(1)
            }

            fn step_backward(self) -> Option<Self> {
                self.checked_sub(1)
            }

            fn is_valid_extent(extent: Self) -> bool {
                extent > 0
            }

            fn extent_fits(extent: Self, lo: Self, hi: Self) -> bool {
                <u128 as From<$t>>::from(extent) <= <u128 as From<$t>>::from(hi).saturating_sub(<u128 as From<$t>>::from(lo)) + 1
            }

            fn divides(extent: Self, lo: Self, hi: Self) -> bool {
                let span = <u128 as From<$t>>::from(hi).saturating_sub(<u128 as From<$t>>::from(lo)) + 1;
                extent > 0 && span % <u128 as From<$t>>::from(extent) == 0
            }
        }
    )*};
}

macro_rules! impl_coordinate_float {
    ($($t:ty => $variant:ident),* $(,)?) => {$(
        impl sealed::Sealed for $t {}

        impl CoordinateType for $t {
            const DATATYPE: Datatype = Datatype::$variant;

            fn write_le(self, w: &mut impl io::Write) -> io::Result<()> {
                w.write_all(&self.to_le_bytes())
            }

            fn read_le(r: &mut impl io::Read) -> io::Result<Self> {
                let mut bytes = [0u8; std::mem::size_of::<$t>()];
                r.read_exact(&mut bytes)?;
                Ok(<$t>::from_le_bytes(bytes))
            }

            fn from_buffer(buffer: &CoordinateBuffer) -> Option<&[Self]> {
                match buffer {
                    CoordinateBuffer::$variant(values) => Some(values),
                    _ => None,
                }
            }

            fn into_buffer(values: Vec<Self>) -> CoordinateBuffer {
                CoordinateBuffer::$variant(values)
            }

            fn is_finite_coord(self) -> bool {
                self.is_finite()
            }

            fn span(lo: Self, hi: Self) -> Option<u64> {
                (hi - lo + 1.0).to_u64()
            }

            fn offset_from(self, lo: Self) -> u64 {
                (self - lo).floor().to_u64().unwrap_or(0)
            }

            fn tile_index(self, lo: Self, extent: Self) -> u64 {
                ((self - lo) / extent).floor().to_u64().unwrap_or(0)
            }

            fn in_tile_offset(self, lo: Self, extent: Self) -> u64 {
                let offset = self - lo;
                (offset - (offset / extent).floor() * extent)
                    .to_u64()
                    .unwrap_or(0)
            }

            fn tile_snap_down(self, lo: Self, extent: Self) -> Self {
                lo + ((self - lo) / extent).floor() * extent
            }

            fn tile_snap_up(self, lo: Self, extent: Self) -> Self {
                lo + (((self - lo) / extent).floor() + 1.0) * extent - 1.0
            }

            fn step_forward(self) -> Option<Self> {
                Some(self + 1.0)
            }

            fn step_backward(self) -> Option<Self> {
                Some(self - 1.0)
            }

            fn is_valid_extent(extent: Self) -> bool {
                extent.is_finite() && extent > 0.0
            }

            fn extent_fits(extent: Self, lo: Self, hi: Self) -> bool {
                extent <= hi - lo + 1.0
            }

            fn divides(_extent: Self, _lo: Self, _hi: Self) -> bool {
                true
            }
        }
    )*};
}

impl_coordinate_signed!(i8 => Int8, i16 => Int16, i32 => Int32, i64 => Int64);
impl_coordinate_unsigned!(u8 => UInt8, u16 => UInt16, u32 => UInt32, u64 => UInt64);
impl_coordinate_float!(f32 => Float32, f64 => Float64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_buffer_typed_access() {
        let buffer = CoordinateBuffer::from(vec![1i32, 4]);
        assert_eq!(buffer.datatype(), Datatype::Int32);
        assert_eq!(buffer.len(), 2);
        assert!(!buffer.is_empty());
        assert_eq!(buffer.as_slice::<i32>(), Some(&[1i32, 4][..]));
        assert_eq!(buffer.as_slice::<i64>(), None);
        assert_eq!(buffer.to_string(), "[1, 4]");
    }

    #[test]
    fn coordinate_buffer_values_le() {
        let buffer = CoordinateBuffer::from(vec![1u16, 256]);
        let mut bytes = Vec::new();
        buffer.write_values_le(&mut bytes).unwrap();
        assert_eq!(bytes, vec![1, 0, 0, 1]);
    }

    #[test]
    fn integer_tile_arithmetic() {
        assert_eq!(7i32.tile_index(1, 2), 3);
        assert_eq!(7i32.in_tile_offset(1, 2), 0);
        assert_eq!(8i32.in_tile_offset(1, 2), 1);
        assert_eq!(i32::span(1, 4), Some(4));
        assert_eq!(i64::span(i64::MIN, i64::MAX), None);
        assert_eq!(u64::span(0, u64::MAX - 1), Some(u64::MAX));
        assert_eq!((-3i32).tile_index(-5, 2), 1);
        assert_eq!(4i32.offset_from(1), 3);
    }

    #[test]
    fn integer_snapping() {
        // Domain lower bound 1, extent 2: boundaries at 1, 3, 5, ...
        assert_eq!(2i32.tile_snap_down(1, 2), 1);
        assert_eq!(4i32.tile_snap_up(1, 2), 4);
        assert_eq!(3i32.tile_snap_down(1, 2), 3);
        assert_eq!(5i32.tile_snap_up(1, 2), 6);
    }

    #[test]
    fn integer_steps() {
        assert_eq!(1i8.step_forward(), Some(2));
        assert_eq!(i8::MAX.step_forward(), None);
        assert_eq!(u8::MIN.step_backward(), None);
    }

    #[test]
    fn integer_extent_checks() {
        assert!(i32::is_valid_extent(2));
        assert!(!i32::is_valid_extent(0));
        assert!(!i32::is_valid_extent(-1));
        assert!(i32::extent_fits(4, 1, 4));
        assert!(!i32::extent_fits(5, 1, 4));
        assert!(i32::divides(2, 1, 4));
        assert!(!i32::divides(3, 1, 4));
    }

    #[test]
    fn float_tile_arithmetic() {
        assert_eq!(7.5f64.tile_index(1.0, 2.0), 3);
        assert!(1.0f64.is_finite_coord());
        assert!(!f64::NAN.is_finite_coord());
        assert!(!f64::INFINITY.is_finite_coord());
        assert!(f64::is_valid_extent(0.5));
        assert!(!f64::is_valid_extent(f64::NAN));
        assert!(f64::divides(0.3, 0.0, 1.0));
        assert_eq!(f64::span(1.0, 4.0), Some(4));
    }

    #[test]
    fn float_snapping() {
        assert_eq!(2.5f64.tile_snap_down(1.0, 2.0), 1.0);
        assert_eq!(3.0f64.tile_snap_down(1.0, 2.0), 3.0);
    }
}
