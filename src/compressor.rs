//! Compressor descriptors.
//!
//! A [`Compressor`] names the compression scheme applied to an attribute (or
//! to the coordinates) when tiles are written to storage. The metadata layer
//! only records the choice; codec implementations live with the tile I/O
//! paths.

use derive_more::Display;
use thiserror::Error;

/// The compression level at which a compressor picks its own default.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = -1;

/// A compressor.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
#[repr(u8)]
pub enum Compressor {
    /// No compression.
    #[display("no_compression")]
    None = 0,
    /// Gzip (DEFLATE).
    #[display("gzip")]
    Gzip = 1,
    /// Zstandard.
    #[display("zstd")]
    Zstd = 2,
    /// LZ4.
    #[display("lz4")]
    Lz4 = 3,
    /// Run-length encoding.
    #[display("rle")]
    Rle = 4,
    /// Bzip2.
    #[display("bzip2")]
    Bzip2 = 5,
    /// Double-delta encoding, suited to monotone integer sequences such as
    /// sorted coordinates.
    #[display("double_delta")]
    DoubleDelta = 6,
}

impl Compressor {
    /// The wire tag of the compressor.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }
}

/// An unsupported compressor tag error.
#[derive(Copy, Clone, Debug, Error)]
#[error("unsupported compressor tag {0}")]
pub struct UnsupportedCompressorTagError(u8);

impl TryFrom<u8> for Compressor {
    type Error = UnsupportedCompressorTagError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Self::None),
            1 => Ok(Self::Gzip),
            2 => Ok(Self::Zstd),
            3 => Ok(Self::Lz4),
            4 => Ok(Self::Rle),
            5 => Ok(Self::Bzip2),
            6 => Ok(Self::DoubleDelta),
            _ => Err(UnsupportedCompressorTagError(tag)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compressor_tag_round_trip() {
        for tag in 0..=6u8 {
            let compressor = Compressor::try_from(tag).unwrap();
            assert_eq!(compressor.tag(), tag);
        }
        assert!(Compressor::try_from(7).is_err());
    }

    #[test]
    fn compressor_display() {
        assert_eq!(Compressor::None.to_string(), "no_compression");
        assert_eq!(Compressor::DoubleDelta.to_string(), "double_delta");
    }
}
