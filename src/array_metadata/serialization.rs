//! The [`ArrayMetadata`] serialization codec.
//!
//! Writes the tightly packed little-endian layout documented in the
//! [module documentation](super). Derived tables are not persisted;
//! deserialization revalidates the decoded parts and recomputes them, so a
//! decoded value is sealed exactly like a built one.

use std::io;

use crate::{
    attribute::Attribute,
    binary::{read_string, write_string, BinarySerialize, DeserializeError, ReadLeExt, WriteLeExt},
    hyperspace::Hyperspace,
    layout::Layout,
};

use super::{ArrayMetadata, ArrayType};

impl BinarySerialize for ArrayMetadata {
    fn write_to(&self, w: &mut impl io::Write) -> io::Result<()> {
        write_string(w, &self.array_uri)?;
        w.write_u8_le(self.array_type.tag())?;
        w.write_u8_le(self.tile_order.tag())?;
        w.write_u8_le(self.cell_order.tag())?;
        w.write_u64_le(self.capacity)?;
        self.hyperspace.write_to(w)?;
        let attribute_num = u32::try_from(self.attributes.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many attributes"))?;
        w.write_u32_le(attribute_num)?;
        for attribute in &self.attributes {
            attribute.write_to(w)?;
        }
        Ok(())
    }

    fn read_from(r: &mut impl io::Read) -> Result<Self, DeserializeError> {
        let array_uri = read_string(r)?;
        let array_type = ArrayType::try_from(r.read_u8_le()?)?;
        let tile_order = Layout::try_from(r.read_u8_le()?)?;
        let cell_order = Layout::try_from(r.read_u8_le()?)?;
        let capacity = r.read_u64_le()?;
        let hyperspace = Hyperspace::read_from(r)?;
        let attribute_num = r.read_u32_le()?;
        let mut attributes = Vec::new();
        for _ in 0..attribute_num {
            attributes.push(Attribute::read_from(r)?);
        }
        Ok(Self::seal(
            array_uri,
            array_type,
            tile_order,
            cell_order,
            capacity,
            hyperspace,
            attributes,
        )?)
    }
}

impl ArrayMetadata {
    /// Serialize the metadata into a new byte buffer.
    ///
    /// # Panics
    /// Does not panic; writing to a `Vec<u8>` is infallible.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes)
            .expect("writing to a Vec<u8> is infallible");
        bytes
    }

    /// Deserialize metadata from `bytes`.
    ///
    /// Trailing bytes after the metadata are ignored.
    ///
    /// # Errors
    /// Returns a [`DeserializeError`] if `bytes` is truncated, holds an
    /// unknown tag, or decodes to metadata violating an invariant.
    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self, DeserializeError> {
        Self::read_from(&mut bytes)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        array_metadata::{ArrayMetadataBuilder, ArrayMetadataCheckError},
        attribute::CellValNum,
        compressor::Compressor,
        datatype::Datatype,
        dimension::Dimension,
    };

    use super::*;

    fn dense_metadata() -> ArrayMetadata {
        let mut hyperspace = Hyperspace::new();
        hyperspace
            .add_dimension(Dimension::new("rows", [1i32, 4], Some(2)))
            .add_dimension(Dimension::new("cols", [1i32, 4], Some(2)));
        ArrayMetadataBuilder::new("dense_array")
            .hyperspace(hyperspace)
            .add_attribute(Attribute::new("a", Datatype::Int32))
            .build()
            .unwrap()
    }

    #[test]
    fn round_trip_preserves_everything() {
        let metadata = dense_metadata();
        let decoded = ArrayMetadata::from_bytes(&metadata.to_bytes()).unwrap();
        assert_eq!(decoded, metadata);
        assert_eq!(decoded.tile_num().unwrap(), 4);
        assert_eq!(decoded.cell_num_per_tile(), Some(4));
    }

    #[test]
    fn wire_layout_is_fixed() {
        let metadata = dense_metadata();
        let bytes = metadata.to_bytes();
        // uri
        assert_eq!(bytes[0..4], 11u32.to_le_bytes());
        assert_eq!(bytes[4..15], *b"dense_array");
        // array_type, tile_order, cell_order
        assert_eq!(bytes[15], 0);
        assert_eq!(bytes[16], 0);
        assert_eq!(bytes[17], 0);
        // capacity
        assert_eq!(bytes[18..26], 10_000u64.to_le_bytes());
        // dim_num, coord_type
        assert_eq!(bytes[26..30], 2u32.to_le_bytes());
        assert_eq!(bytes[30], Datatype::Int32.tag());
        // first dimension: name, lo, hi, has_extent, extent
        assert_eq!(bytes[31..35], 4u32.to_le_bytes());
        assert_eq!(bytes[35..39], *b"rows");
        assert_eq!(bytes[39..43], 1i32.to_le_bytes());
        assert_eq!(bytes[43..47], 4i32.to_le_bytes());
        assert_eq!(bytes[47], 1);
        assert_eq!(bytes[48..52], 2i32.to_le_bytes());
    }

    #[test]
    fn truncated_buffer_is_rejected() {
        let bytes = dense_metadata().to_bytes();
        for length in [0, 3, 10, 20, bytes.len() - 1] {
            assert!(
                ArrayMetadata::from_bytes(&bytes[..length]).is_err(),
                "length {length} should not decode"
            );
        }
    }

    #[test]
    fn unknown_tags_are_rejected() {
        let mut bytes = dense_metadata().to_bytes();
        bytes[15] = 9; // array type
        assert!(matches!(
            ArrayMetadata::from_bytes(&bytes),
            Err(DeserializeError::UnsupportedArrayTypeTag(_))
        ));

        let mut bytes = dense_metadata().to_bytes();
        bytes[16] = 77; // tile order
        assert!(matches!(
            ArrayMetadata::from_bytes(&bytes),
            Err(DeserializeError::UnsupportedLayoutTag(_))
        ));

        let mut bytes = dense_metadata().to_bytes();
        bytes[30] = 200; // coordinate type
        assert!(matches!(
            ArrayMetadata::from_bytes(&bytes),
            Err(DeserializeError::UnsupportedDatatypeTag(_))
        ));
    }

    #[test]
    fn inconsistent_buffer_is_rejected() {
        // A persisted global-order tile order never round-trips from sealed
        // metadata; a buffer carrying one is inconsistent.
        let mut bytes = dense_metadata().to_bytes();
        bytes[16] = Layout::GlobalOrder.tag();
        assert!(matches!(
            ArrayMetadata::from_bytes(&bytes),
            Err(DeserializeError::Check(
                ArrayMetadataCheckError::InvalidTileOrder(Layout::GlobalOrder)
            ))
        ));

        // Inverted domain bounds on the first dimension.
        let mut bytes = dense_metadata().to_bytes();
        bytes[39..43].copy_from_slice(&9i32.to_le_bytes());
        assert!(matches!(
            ArrayMetadata::from_bytes(&bytes),
            Err(DeserializeError::Check(_))
        ));
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let metadata = dense_metadata();
        let mut bytes = metadata.to_bytes();
        bytes.extend_from_slice(&[0xAB; 7]);
        assert_eq!(ArrayMetadata::from_bytes(&bytes).unwrap(), metadata);
    }

    #[test]
    fn sparse_var_attribute_round_trip() {
        let mut hyperspace = Hyperspace::new();
        hyperspace
            .add_dimension(Dimension::new("x", [0.0f64, 100.0], None))
            .add_dimension(Dimension::new("y", [0.0f64, 100.0], None))
            .add_dimension(Dimension::new("z", [0.0f64, 100.0], None));
        let metadata = ArrayMetadataBuilder::new("sparse_array")
            .array_type(crate::array_metadata::ArrayType::Sparse)
            .capacity(500)
            .hyperspace(hyperspace)
            .add_attribute(
                Attribute::new("names", Datatype::StringAscii)
                    .with_cell_val_num(CellValNum::Var)
                    .with_compression(Compressor::Gzip, 6),
            )
            .add_attribute(
                Attribute::new("pairs", Datatype::Int32)
                    .with_cell_val_num(CellValNum::fixed(2).unwrap()),
            )
            .build()
            .unwrap();

        let decoded = ArrayMetadata::from_bytes(&metadata.to_bytes()).unwrap();
        assert_eq!(decoded, metadata);
        assert_eq!(decoded.capacity(), 500);
        assert_eq!(decoded.cell_size(0), Some(8));
        assert_eq!(decoded.cell_size(1), Some(8));
        assert_eq!(decoded.cell_val_num(0), Some(CellValNum::Var));
        assert_eq!(decoded.coords_size(), 24);
        assert_eq!(decoded.compression(0), Some(Compressor::Gzip));
        assert_eq!(decoded.compression_level(0), Some(6));
    }
}
