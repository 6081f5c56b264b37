//! Array attributes.
//!
//! An [`Attribute`] is a named, typed value column stored once per cell. An
//! attribute holds either a fixed number of values per cell or a variable
//! number ([`CellValNum::Var`]), in which case the attribute's on-disk cell is
//! a `u64` offset into a companion variable-data stream.

use std::io;
use std::num::NonZeroU32;

use crate::{
    binary::{read_string, write_string, BinarySerialize, DeserializeError, ReadLeExt, WriteLeExt},
    compressor::{Compressor, DEFAULT_COMPRESSION_LEVEL},
    datatype::Datatype,
};

/// The wire sentinel marking a variable number of values per cell.
const CELL_VAL_NUM_VAR: u32 = u32::MAX;

/// The number of values an attribute stores per cell.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CellValNum {
    /// A fixed number of values per cell.
    Fixed(NonZeroU32),
    /// A variable number of values per cell.
    Var,
}

impl CellValNum {
    /// A single value per cell.
    #[must_use]
    pub const fn single() -> Self {
        Self::Fixed(NonZeroU32::MIN)
    }

    /// A fixed cell value count, or [`None`] for zero.
    #[must_use]
    pub fn fixed(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(Self::Fixed)
    }

    /// Returns true for [`CellValNum::Var`].
    #[must_use]
    pub const fn is_var(self) -> bool {
        matches!(self, Self::Var)
    }

    const fn to_wire(self) -> u32 {
        match self {
            Self::Fixed(n) => n.get(),
            Self::Var => CELL_VAL_NUM_VAR,
        }
    }

    fn from_wire(value: u32) -> Result<Self, DeserializeError> {
        if value == CELL_VAL_NUM_VAR {
            Ok(Self::Var)
        } else {
            Self::fixed(value).ok_or(DeserializeError::ZeroCellValNum)
        }
    }
}

/// An array attribute.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Attribute {
    name: String,
    datatype: Datatype,
    cell_val_num: CellValNum,
    compressor: Compressor,
    compression_level: i32,
}

impl Attribute {
    /// Create a new attribute with a single value per cell and no
    /// compression.
    pub fn new(name: impl Into<String>, datatype: Datatype) -> Self {
        Self {
            name: name.into(),
            datatype,
            cell_val_num: CellValNum::single(),
            compressor: Compressor::None,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }

    /// Set the number of values per cell.
    #[must_use]
    pub fn with_cell_val_num(mut self, cell_val_num: CellValNum) -> Self {
        self.cell_val_num = cell_val_num;
        self
    }

    /// Set the compressor and compression level.
    #[must_use]
    pub fn with_compression(mut self, compressor: Compressor, level: i32) -> Self {
        self.compressor = compressor;
        self.compression_level = level;
        self
    }

    /// The attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The attribute datatype.
    #[must_use]
    pub const fn datatype(&self) -> Datatype {
        self.datatype
    }

    /// The number of values per cell.
    #[must_use]
    pub const fn cell_val_num(&self) -> CellValNum {
        self.cell_val_num
    }

    /// Returns true if the attribute stores a variable number of values per
    /// cell.
    #[must_use]
    pub const fn var_size(&self) -> bool {
        self.cell_val_num.is_var()
    }

    /// The attribute compressor.
    #[must_use]
    pub const fn compressor(&self) -> Compressor {
        self.compressor
    }

    /// The attribute compression level.
    #[must_use]
    pub const fn compression_level(&self) -> i32 {
        self.compression_level
    }

    /// The size of one cell of this attribute in bytes.
    ///
    /// A variable-sized attribute cell is a `u64` offset into the attribute's
    /// variable-data stream.
    #[must_use]
    pub const fn cell_size(&self) -> u64 {
        match self.cell_val_num {
            CellValNum::Fixed(n) => self.datatype.size() * n.get() as u64,
            CellValNum::Var => std::mem::size_of::<u64>() as u64,
        }
    }
}

impl BinarySerialize for Attribute {
    fn write_to(&self, w: &mut impl io::Write) -> io::Result<()> {
        write_string(w, &self.name)?;
        w.write_u8_le(self.datatype.tag())?;
        w.write_u32_le(self.cell_val_num.to_wire())?;
        w.write_u8_le(self.compressor.tag())?;
        w.write_i32_le(self.compression_level)
    }

    fn read_from(r: &mut impl io::Read) -> Result<Self, DeserializeError> {
        let name = read_string(r)?;
        let datatype = Datatype::try_from(r.read_u8_le()?)?;
        let cell_val_num = CellValNum::from_wire(r.read_u32_le()?)?;
        let compressor = Compressor::try_from(r.read_u8_le()?)?;
        let compression_level = r.read_i32_le()?;
        Ok(Self {
            name,
            datatype,
            cell_val_num,
            compressor,
            compression_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn attribute_cell_size() {
        let attribute = Attribute::new("a", Datatype::Int32);
        assert_eq!(attribute.cell_size(), 4);
        assert!(!attribute.var_size());

        let attribute = Attribute::new("b", Datatype::Int32)
            .with_cell_val_num(CellValNum::fixed(2).unwrap());
        assert_eq!(attribute.cell_size(), 8);

        let attribute =
            Attribute::new("c", Datatype::StringAscii).with_cell_val_num(CellValNum::Var);
        assert_eq!(attribute.cell_size(), 8);
        assert!(attribute.var_size());
    }

    #[test]
    fn attribute_defaults() {
        let attribute = Attribute::new("a", Datatype::Float64);
        assert_eq!(attribute.cell_val_num(), CellValNum::single());
        assert_eq!(attribute.compressor(), Compressor::None);
        assert_eq!(attribute.compression_level(), DEFAULT_COMPRESSION_LEVEL);
    }

    #[test]
    fn attribute_round_trip() {
        let attribute = Attribute::new("humidity", Datatype::Float32)
            .with_cell_val_num(CellValNum::fixed(3).unwrap())
            .with_compression(Compressor::Zstd, 5);

        let mut bytes = Vec::new();
        attribute.write_to(&mut bytes).unwrap();
        let decoded = Attribute::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(decoded, attribute);
    }

    #[test]
    fn attribute_var_round_trip() {
        let attribute =
            Attribute::new("names", Datatype::StringAscii).with_cell_val_num(CellValNum::Var);

        let mut bytes = Vec::new();
        attribute.write_to(&mut bytes).unwrap();
        // name_len + name + datatype + cell_val_num + compressor + level
        assert_eq!(bytes.len(), 4 + 5 + 1 + 4 + 1 + 4);
        let decoded = Attribute::read_from(&mut Cursor::new(bytes)).unwrap();
        assert!(decoded.var_size());
        assert_eq!(decoded, attribute);
    }

    #[test]
    fn attribute_zero_cell_val_num() {
        let attribute = Attribute::new("a", Datatype::Int8);
        let mut bytes = Vec::new();
        attribute.write_to(&mut bytes).unwrap();
        // Corrupt the cell_val_num field (follows the name).
        let offset = 4 + 1 + 1;
        bytes[offset..offset + 4].copy_from_slice(&0u32.to_le_bytes());
        assert!(matches!(
            Attribute::read_from(&mut Cursor::new(bytes)),
            Err(DeserializeError::ZeroCellValNum)
        ));
    }
}
