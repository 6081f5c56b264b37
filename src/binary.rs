//! Binary serialization plumbing.
//!
//! Extends [`std::io::Read`] and [`std::io::Write`] with little-endian
//! convenience methods, and defines the [`BinarySerialize`] trait implemented
//! by the metadata entities that persist themselves with the tightly packed
//! little-endian layout described in [`array_metadata`](crate::array_metadata).

use std::io;
use std::io::Read;

use thiserror::Error;

use crate::{
    array_metadata::{ArrayMetadataCheckError, UnsupportedArrayTypeTagError},
    compressor::UnsupportedCompressorTagError,
    datatype::{Datatype, UnsupportedDatatypeTagError},
    layout::UnsupportedLayoutTagError,
};

/// Little-endian reads over [`io::Read`].
pub trait ReadLeExt: io::Read {
    /// Read a byte.
    ///
    /// # Errors
    /// Returns an error if reading fails, including on a truncated stream.
    fn read_u8_le(&mut self) -> io::Result<u8>;

    /// Read a little-endian `u32`.
    ///
    /// # Errors
    /// Returns an error if reading fails, including on a truncated stream.
    fn read_u32_le(&mut self) -> io::Result<u32>;

    /// Read a little-endian `u64`.
    ///
    /// # Errors
    /// Returns an error if reading fails, including on a truncated stream.
    fn read_u64_le(&mut self) -> io::Result<u64>;

    /// Read a little-endian `i32`.
    ///
    /// # Errors
    /// Returns an error if reading fails, including on a truncated stream.
    fn read_i32_le(&mut self) -> io::Result<i32>;
}

impl<R: io::Read> ReadLeExt for R {
    fn read_u8_le(&mut self) -> io::Result<u8> {
        let mut buffer = [0; 1];
        self.read_exact(&mut buffer)?;
        Ok(buffer[0])
    }

    fn read_u32_le(&mut self) -> io::Result<u32> {
        let mut buffer = [0; 4];
        self.read_exact(&mut buffer)?;
        Ok(u32::from_le_bytes(buffer))
    }

    fn read_u64_le(&mut self) -> io::Result<u64> {
        let mut buffer = [0; 8];
        self.read_exact(&mut buffer)?;
        Ok(u64::from_le_bytes(buffer))
    }

    fn read_i32_le(&mut self) -> io::Result<i32> {
        let mut buffer = [0; 4];
        self.read_exact(&mut buffer)?;
        Ok(i32::from_le_bytes(buffer))
    }
}

/// Little-endian writes over [`io::Write`].
pub trait WriteLeExt: io::Write {
    /// Write a byte.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    fn write_u8_le(&mut self, value: u8) -> io::Result<()>;

    /// Write a little-endian `u32`.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    fn write_u32_le(&mut self, value: u32) -> io::Result<()>;

    /// Write a little-endian `u64`.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    fn write_u64_le(&mut self, value: u64) -> io::Result<()>;

    /// Write a little-endian `i32`.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    fn write_i32_le(&mut self, value: i32) -> io::Result<()>;
}

impl<W: io::Write> WriteLeExt for W {
    fn write_u8_le(&mut self, value: u8) -> io::Result<()> {
        self.write_all(&[value])
    }

    fn write_u32_le(&mut self, value: u32) -> io::Result<()> {
        self.write_all(&value.to_le_bytes())
    }

    fn write_u64_le(&mut self, value: u64) -> io::Result<()> {
        self.write_all(&value.to_le_bytes())
    }

    fn write_i32_le(&mut self, value: i32) -> io::Result<()> {
        self.write_all(&value.to_le_bytes())
    }
}

/// A deserialization error.
#[derive(Debug, Error)]
pub enum DeserializeError {
    /// The byte stream was truncated or could not be read.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// A name was not valid UTF-8.
    #[error("name is not valid utf-8")]
    InvalidName(#[from] std::string::FromUtf8Error),
    /// An unknown datatype tag.
    #[error(transparent)]
    UnsupportedDatatypeTag(#[from] UnsupportedDatatypeTagError),
    /// An unknown compressor tag.
    #[error(transparent)]
    UnsupportedCompressorTag(#[from] UnsupportedCompressorTagError),
    /// An unknown layout tag.
    #[error(transparent)]
    UnsupportedLayoutTag(#[from] UnsupportedLayoutTagError),
    /// An unknown array type tag.
    #[error(transparent)]
    UnsupportedArrayTypeTag(#[from] UnsupportedArrayTypeTagError),
    /// A hyperspace coordinate type that is not numeric.
    #[error("datatype {0} is not a coordinate type")]
    NonCoordinateDatatype(Datatype),
    /// An attribute with zero values per cell.
    #[error("attribute cell_val_num must be non-zero")]
    ZeroCellValNum,
    /// The decoded metadata violates a metadata invariant.
    #[error(transparent)]
    Check(#[from] ArrayMetadataCheckError),
}

/// Serialization to and from the tightly packed little-endian wire layout.
pub trait BinarySerialize: Sized {
    /// Write `self` to a stream.
    ///
    /// # Errors
    /// Returns an error if writing to `w` fails.
    fn write_to(&self, w: &mut impl io::Write) -> io::Result<()>;

    /// Read a value from a stream.
    ///
    /// # Errors
    /// Returns a [`DeserializeError`] if the stream is truncated, holds an
    /// unknown tag, or decodes to an inconsistent value.
    fn read_from(r: &mut impl io::Read) -> Result<Self, DeserializeError>;
}

/// Write a string as a `u32` length prefix followed by its bytes.
pub(crate) fn write_string(w: &mut impl io::Write, value: &str) -> io::Result<()> {
    let length = u32::try_from(value.len()).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "string length exceeds u32")
    })?;
    w.write_u32_le(length)?;
    w.write_all(value.as_bytes())
}

/// Read a string written by [`write_string`].
pub(crate) fn read_string(r: &mut impl io::Read) -> Result<String, DeserializeError> {
    let length = u64::from(r.read_u32_le()?);
    let mut bytes = Vec::new();
    r.by_ref().take(length).read_to_end(&mut bytes)?;
    if bytes.len() as u64 != length {
        return Err(DeserializeError::Io(io::ErrorKind::UnexpectedEof.into()));
    }
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn le_round_trip() {
        let mut buffer: Vec<u8> = Vec::new();
        buffer.write_u8_le(42).unwrap();
        buffer.write_u32_le(31_441_968).unwrap();
        buffer.write_u64_le(u64::MAX - 1).unwrap();
        buffer.write_i32_le(-31_441_968).unwrap();

        let mut buffer = Cursor::new(buffer);
        assert_eq!(buffer.read_u8_le().unwrap(), 42);
        assert_eq!(buffer.read_u32_le().unwrap(), 31_441_968);
        assert_eq!(buffer.read_u64_le().unwrap(), u64::MAX - 1);
        assert_eq!(buffer.read_i32_le().unwrap(), -31_441_968);
    }

    #[test]
    fn le_is_little_endian() {
        let mut buffer: Vec<u8> = Vec::new();
        buffer.write_u32_le(1).unwrap();
        assert_eq!(buffer, vec![1, 0, 0, 0]);
    }

    #[test]
    fn string_round_trip() {
        let mut buffer: Vec<u8> = Vec::new();
        write_string(&mut buffer, "height").unwrap();
        assert_eq!(buffer.len(), 4 + 6);

        let mut cursor = Cursor::new(buffer);
        assert_eq!(read_string(&mut cursor).unwrap(), "height");
    }

    #[test]
    fn string_truncated() {
        let mut buffer: Vec<u8> = Vec::new();
        write_string(&mut buffer, "height").unwrap();
        buffer.truncate(7);

        let mut cursor = Cursor::new(buffer);
        assert!(matches!(
            read_string(&mut cursor),
            Err(DeserializeError::Io(_))
        ));
    }
}
