//! Array datatypes.
//!
//! A [`Datatype`] describes the physical type of an attribute value or of the
//! coordinates of a [`Hyperspace`](crate::hyperspace::Hyperspace) dimension.
//! The set of datatypes is closed; each has a fixed byte width and a stable
//! wire tag used by the [`binary`](crate::binary) codec.

use derive_more::Display;
use thiserror::Error;

/// An array datatype.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
#[repr(u8)]
pub enum Datatype {
    /// Integer in `[-2^7, 2^7-1]`.
    #[display("int8")]
    Int8 = 0,
    /// Integer in `[0, 2^8-1]`.
    #[display("uint8")]
    UInt8 = 1,
    /// Integer in `[-2^15, 2^15-1]`.
    #[display("int16")]
    Int16 = 2,
    /// Integer in `[0, 2^16-1]`.
    #[display("uint16")]
    UInt16 = 3,
    /// Integer in `[-2^31, 2^31-1]`.
    #[display("int32")]
    Int32 = 4,
    /// Integer in `[0, 2^32-1]`.
    #[display("uint32")]
    UInt32 = 5,
    /// Integer in `[-2^63, 2^63-1]`.
    #[display("int64")]
    Int64 = 6,
    /// Integer in `[0, 2^64-1]`.
    #[display("uint64")]
    UInt64 = 7,
    /// IEEE 754 single-precision floating point.
    #[display("float32")]
    Float32 = 8,
    /// IEEE 754 double-precision floating point.
    #[display("float64")]
    Float64 = 9,
    /// A single character.
    #[display("char")]
    Char = 10,
    /// ASCII string data, stored one byte per character.
    #[display("string_ascii")]
    StringAscii = 11,
}

impl Datatype {
    /// The size of one value of this datatype in bytes.
    #[must_use]
    pub const fn size(self) -> u64 {
        match self {
            Self::Int8 | Self::UInt8 | Self::Char | Self::StringAscii => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    /// Returns true if the datatype is a signed or unsigned integer type.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::UInt8
                | Self::Int16
                | Self::UInt16
                | Self::Int32
                | Self::UInt32
                | Self::Int64
                | Self::UInt64
        )
    }

    /// Returns true if the datatype is a floating point type.
    #[must_use]
    pub const fn is_real(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Returns true if the datatype may be used for dimension coordinates.
    ///
    /// Coordinates are numeric; `char` and `string_ascii` are attribute-only.
    #[must_use]
    pub const fn is_coordinate_type(self) -> bool {
        self.is_integer() || self.is_real()
    }

    /// The wire tag of the datatype.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }
}

/// An unsupported datatype tag error.
#[derive(Copy, Clone, Debug, Error)]
#[error("unsupported datatype tag {0}")]
pub struct UnsupportedDatatypeTagError(u8);

impl TryFrom<u8> for Datatype {
    type Error = UnsupportedDatatypeTagError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Self::Int8),
            1 => Ok(Self::UInt8),
            2 => Ok(Self::Int16),
            3 => Ok(Self::UInt16),
            4 => Ok(Self::Int32),
            5 => Ok(Self::UInt32),
            6 => Ok(Self::Int64),
            7 => Ok(Self::UInt64),
            8 => Ok(Self::Float32),
            9 => Ok(Self::Float64),
            10 => Ok(Self::Char),
            11 => Ok(Self::StringAscii),
            _ => Err(UnsupportedDatatypeTagError(tag)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datatype_sizes() {
        assert_eq!(Datatype::Int8.size(), 1);
        assert_eq!(Datatype::UInt16.size(), 2);
        assert_eq!(Datatype::Int32.size(), 4);
        assert_eq!(Datatype::Float32.size(), 4);
        assert_eq!(Datatype::UInt64.size(), 8);
        assert_eq!(Datatype::Float64.size(), 8);
        assert_eq!(Datatype::Char.size(), 1);
        assert_eq!(Datatype::StringAscii.size(), 1);
    }

    #[test]
    fn datatype_classification() {
        assert!(Datatype::Int64.is_integer());
        assert!(!Datatype::Int64.is_real());
        assert!(Datatype::Float32.is_real());
        assert!(Datatype::UInt8.is_coordinate_type());
        assert!(Datatype::Float64.is_coordinate_type());
        assert!(!Datatype::Char.is_coordinate_type());
        assert!(!Datatype::StringAscii.is_coordinate_type());
    }

    #[test]
    fn datatype_tag_round_trip() {
        for tag in 0..=11u8 {
            let datatype = Datatype::try_from(tag).unwrap();
            assert_eq!(datatype.tag(), tag);
        }
        assert!(Datatype::try_from(12).is_err());
        assert_eq!(
            Datatype::try_from(255).unwrap_err().to_string(),
            "unsupported datatype tag 255"
        );
    }

    #[test]
    fn datatype_display() {
        assert_eq!(Datatype::Int32.to_string(), "int32");
        assert_eq!(Datatype::Float64.to_string(), "float64");
        assert_eq!(Datatype::StringAscii.to_string(), "string_ascii");
    }
}
