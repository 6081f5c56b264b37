//! Array metadata: the geometry engine of a tiled multidimensional array.
//!
//! [`ArrayMetadata`] combines an array's [`Hyperspace`], its [`Attribute`]s,
//! and its per-array policy (dense/sparse, tile order, cell order, sparse
//! tile capacity), and owns the derived tables that every coordinate
//! computation routes through: cell sizes, the tile domain, and the stride
//! tables for both linearization orders at both levels.
//!
//! Metadata is built with an [`ArrayMetadataBuilder`], which validates every
//! invariant and seals the result. A sealed [`ArrayMetadata`] is immutable;
//! all of its methods take `&self`, hold no interior mutability, and may be
//! called concurrently from any number of threads.
//!
//! The persisted layout (one metadata file per array, little-endian,
//! tightly packed) is:
//!
//! ```text
//! ArrayMetadata := uri_len:u32  uri_bytes
//!                  array_type:u8  tile_order:u8  cell_order:u8
//!                  capacity:u64
//!                  Hyperspace
//!                  attribute_num:u32  Attribute * attribute_num
//!
//! Hyperspace    := dim_num:u32  coord_type:u8
//!                  Dimension * dim_num
//!
//! Dimension     := name_len:u32  name_bytes
//!                  lo:T  hi:T
//!                  has_extent:u8  (extent:T)?
//!
//! Attribute     := name_len:u32  name_bytes
//!                  datatype:u8  cell_val_num:u32  (0xFFFFFFFF = var)
//!                  compressor:u8  compression_level:i32
//! ```
//!
//! Derived tables are never persisted; deserialization recomputes them.

mod array_metadata_builder;
mod array_metadata_errors;
mod geometry;
mod serialization;

use std::io;

use derive_more::Display;
use thiserror::Error;

use crate::{
    attribute::{Attribute, CellValNum},
    compressor::{Compressor, DEFAULT_COMPRESSION_LEVEL},
    coordinate::{CoordinateBuffer, CoordinateType},
    datatype::Datatype,
    dimension::Dimension,
    hyperspace::Hyperspace,
    layout::Layout,
};

pub use array_metadata_builder::ArrayMetadataBuilder;
pub use array_metadata_errors::{
    ArrayMetadataCheckError, GeometryError, IncompatibleDimensionalityError, UnknownAttributeError,
};
pub use geometry::{SubarrayOverlap, SubarrayTileDomain};

use geometry::RegularTables;

/// The reserved name of the coordinates pseudo-attribute.
pub const COORDS_NAME: &str = "__coords";

/// The default tile capacity for sparse arrays with irregular tiles.
pub const DEFAULT_CAPACITY: u64 = 10_000;

/// The compressor applied to coordinate tiles.
pub const COORDS_COMPRESSION: Compressor = Compressor::DoubleDelta;

/// The compression level applied to coordinate tiles.
pub const COORDS_COMPRESSION_LEVEL: i32 = DEFAULT_COMPRESSION_LEVEL;

/// The array type.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
#[repr(u8)]
pub enum ArrayType {
    /// Every cell of the domain is materialized.
    #[display("dense")]
    Dense = 0,
    /// Only explicitly written cells exist; coordinates are stored.
    #[display("sparse")]
    Sparse = 1,
}

impl ArrayType {
    /// The wire tag of the array type.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }
}

/// An unsupported array type tag error.
#[derive(Copy, Clone, Debug, Error)]
#[error("unsupported array type tag {0}")]
pub struct UnsupportedArrayTypeTagError(u8);

impl TryFrom<u8> for ArrayType {
    type Error = UnsupportedArrayTypeTagError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Self::Dense),
            1 => Ok(Self::Sparse),
            _ => Err(UnsupportedArrayTypeTagError(tag)),
        }
    }
}

/// Sealed array metadata.
///
/// Create with an [`ArrayMetadataBuilder`] or by deserializing with
/// [`BinarySerialize`](crate::binary::BinarySerialize). See the
/// [module documentation](self) for an overview.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayMetadata {
    array_uri: String,
    array_type: ArrayType,
    tile_order: Layout,
    cell_order: Layout,
    capacity: u64,
    attributes: Vec<Attribute>,
    hyperspace: Hyperspace,
    // Derived state, computed once when the metadata is sealed.
    datatype: Datatype,
    domain: CoordinateBuffer,
    tile_extents: Option<CoordinateBuffer>,
    cell_sizes: Vec<u64>,
    tile_domain_spans: Vec<u64>,
    tile_num: Option<u64>,
    tile_offsets_row: Vec<u64>,
    tile_offsets_col: Vec<u64>,
    cell_num_per_tile: Option<u64>,
    cell_offsets_row: Vec<u64>,
    cell_offsets_col: Vec<u64>,
}

impl ArrayMetadata {
    /// Validate the metadata parts and seal them into an [`ArrayMetadata`].
    pub(crate) fn seal(
        array_uri: String,
        array_type: ArrayType,
        tile_order: Layout,
        cell_order: Layout,
        capacity: u64,
        hyperspace: Hyperspace,
        attributes: Vec<Attribute>,
    ) -> Result<Self, ArrayMetadataCheckError> {
        check_parts(
            array_type,
            tile_order,
            cell_order,
            capacity,
            &hyperspace,
            &attributes,
        )?;
        let datatype = hyperspace
            .datatype()
            .ok_or(ArrayMetadataCheckError::MissingHyperspace)?;
        let domain = hyperspace
            .domain_buffer()
            .ok_or(ArrayMetadataCheckError::MissingHyperspace)?;
        let tile_extents = hyperspace.tile_extents_buffer();

        let tables = match &tile_extents {
            Some(extents) => Some(geometry::compute_regular_tables_dispatch(
                &hyperspace,
                &domain,
                extents,
                array_type == ArrayType::Dense,
            )?),
            None => None,
        };

        let dim_num = hyperspace.dim_num() as u64;
        let mut cell_sizes: Vec<u64> =
            attributes.iter().map(Attribute::cell_size).collect();
        cell_sizes.push(datatype.size() * dim_num);

        let tables = tables.unwrap_or_else(RegularTables::irregular);
        Ok(Self {
            array_uri,
            array_type,
            tile_order,
            cell_order,
            capacity,
            attributes,
            hyperspace,
            datatype,
            domain,
            tile_extents,
            cell_sizes,
            tile_domain_spans: tables.tile_domain_spans,
            tile_num: tables.tile_num,
            tile_offsets_row: tables.tile_offsets_row,
            tile_offsets_col: tables.tile_offsets_col,
            cell_num_per_tile: tables.cell_num_per_tile,
            cell_offsets_row: tables.cell_offsets_row,
            cell_offsets_col: tables.cell_offsets_col,
        })
    }

    /// Re-check the metadata invariants.
    ///
    /// Sealed metadata always satisfies them; this exists for callers that
    /// want to revalidate metadata read from storage.
    ///
    /// # Errors
    /// Returns the first violated invariant.
    pub fn check(&self) -> Result<(), ArrayMetadataCheckError> {
        check_parts(
            self.array_type,
            self.tile_order,
            self.cell_order,
            self.capacity,
            &self.hyperspace,
            &self.attributes,
        )?;
        if let Some(extents) = &self.tile_extents {
            geometry::compute_regular_tables_dispatch(
                &self.hyperspace,
                &self.domain,
                extents,
                self.dense(),
            )?;
        }
        Ok(())
    }

    /// The array URI.
    #[must_use]
    pub fn array_uri(&self) -> &str {
        &self.array_uri
    }

    /// The array type.
    #[must_use]
    pub const fn array_type(&self) -> ArrayType {
        self.array_type
    }

    /// Returns true if the array is dense.
    #[must_use]
    pub fn dense(&self) -> bool {
        self.array_type == ArrayType::Dense
    }

    /// The tile order.
    #[must_use]
    pub const fn tile_order(&self) -> Layout {
        self.tile_order
    }

    /// The cell order.
    #[must_use]
    pub const fn cell_order(&self) -> Layout {
        self.cell_order
    }

    /// The tile capacity for sparse arrays with irregular tiles.
    #[must_use]
    pub const fn capacity(&self) -> u64 {
        self.capacity
    }

    /// The number of attributes.
    #[must_use]
    pub fn attribute_num(&self) -> usize {
        self.attributes.len()
    }

    /// The attribute with the input id.
    #[must_use]
    pub fn attribute(&self, id: usize) -> Option<&Attribute> {
        self.attributes.get(id)
    }

    /// The attributes in declaration order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// The id of the attribute named `name`.
    #[must_use]
    pub fn attribute_id(&self, name: &str) -> Option<usize> {
        self.attributes
            .iter()
            .position(|attribute| attribute.name() == name)
    }

    /// The ids of the attributes named in `names`.
    ///
    /// # Errors
    /// Returns [`UnknownAttributeError`] naming the first attribute that does
    /// not exist.
    pub fn attribute_ids<I, S>(&self, names: I) -> Result<Vec<usize>, UnknownAttributeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| {
                self.attribute_id(name.as_ref())
                    .ok_or_else(|| UnknownAttributeError(name.as_ref().to_string()))
            })
            .collect()
    }

    /// The name of the attribute with the input id, or the coordinates name
    /// for `id == attribute_num()`.
    #[must_use]
    pub fn attribute_name(&self, id: usize) -> Option<&str> {
        if id == self.attributes.len() {
            Some(COORDS_NAME)
        } else {
            self.attributes.get(id).map(Attribute::name)
        }
    }

    /// The attribute names, with the coordinates name appended at the back.
    #[must_use]
    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .map(Attribute::name)
            .chain(std::iter::once(COORDS_NAME))
            .collect()
    }

    /// The cell size in bytes of the attribute with the input id, or of the
    /// coordinates for `id == attribute_num()`.
    #[must_use]
    pub fn cell_size(&self, id: usize) -> Option<u64> {
        self.cell_sizes.get(id).copied()
    }

    /// The number of values per cell of the attribute with the input id.
    #[must_use]
    pub fn cell_val_num(&self, id: usize) -> Option<CellValNum> {
        self.attributes.get(id).map(Attribute::cell_val_num)
    }

    /// Returns true if the attribute with the input id is variable-sized.
    #[must_use]
    pub fn var_size(&self, id: usize) -> Option<bool> {
        self.attributes.get(id).map(Attribute::var_size)
    }

    /// The compressor of the attribute with the input id, or of the
    /// coordinates for `id == attribute_num()`.
    #[must_use]
    pub fn compression(&self, id: usize) -> Option<Compressor> {
        if id == self.attributes.len() {
            Some(COORDS_COMPRESSION)
        } else {
            self.attributes.get(id).map(Attribute::compressor)
        }
    }

    /// The compression level of the attribute with the input id, or of the
    /// coordinates for `id == attribute_num()`.
    #[must_use]
    pub fn compression_level(&self, id: usize) -> Option<i32> {
        if id == self.attributes.len() {
            Some(COORDS_COMPRESSION_LEVEL)
        } else {
            self.attributes.get(id).map(Attribute::compression_level)
        }
    }

    /// The compressor of the coordinates.
    #[must_use]
    pub const fn coords_compression(&self) -> Compressor {
        COORDS_COMPRESSION
    }

    /// The compression level of the coordinates.
    #[must_use]
    pub const fn coords_compression_level(&self) -> i32 {
        COORDS_COMPRESSION_LEVEL
    }

    /// The size in bytes of one cell of coordinates.
    #[must_use]
    pub fn coords_size(&self) -> u64 {
        self.cell_sizes[self.attributes.len()]
    }

    /// The coordinate datatype.
    #[must_use]
    pub const fn coords_type(&self) -> Datatype {
        self.datatype
    }

    /// The datatype of the attribute with the input id, or of the coordinates
    /// for `id == attribute_num()`.
    #[must_use]
    pub fn datatype(&self, id: usize) -> Option<Datatype> {
        if id == self.attributes.len() {
            Some(self.datatype)
        } else {
            self.attributes.get(id).map(Attribute::datatype)
        }
    }

    /// The size in bytes of one value of the attribute with the input id, or
    /// of one coordinate value for `id == attribute_num()`.
    #[must_use]
    pub fn type_size(&self, id: usize) -> Option<u64> {
        self.datatype(id).map(Datatype::size)
    }

    /// The number of dimensions.
    #[must_use]
    pub fn dim_num(&self) -> usize {
        self.hyperspace.dim_num()
    }

    /// The `i`-th dimension.
    #[must_use]
    pub fn dimension(&self, i: usize) -> Option<&Dimension> {
        self.hyperspace.dimension(i)
    }

    /// The array domain (`2 * dim_num` values), if it holds coordinate type
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

    /// The tile extents (`dim_num` values), if present and of coordinate
    /// type `T`.
    #[must_use]
    pub fn tile_extents<T: CoordinateType>(&self) -> Option<&[T]> {
        self.tile_extents.as_ref()?.as_slice::<T>()
    }

    /// The raw tile extents buffer, if the array has regular tiles.
    #[must_use]
    pub const fn tile_extents_buffer(&self) -> Option<&CoordinateBuffer> {
        self.tile_extents.as_ref()
    }

    /// The array hyperspace.
    #[must_use]
    pub const fn hyperspace(&self) -> &Hyperspace {
        &self.hyperspace
    }

    /// The number of cells per tile. [`None`] unless the array is dense.
    #[must_use]
    pub const fn cell_num_per_tile(&self) -> Option<u64> {
        self.cell_num_per_tile
    }

    /// Dump the array metadata in ASCII format.
    ///
    /// The format is human-readable and not a compatibility surface.
    ///
    /// # Errors
    /// Returns an error if writing to `out` fails.
    pub fn dump(&self, out: &mut impl io::Write) -> io::Result<()> {
        writeln!(out, "- Array URI: {}", self.array_uri)?;
        writeln!(out, "- Array type: {}", self.array_type)?;
        writeln!(out, "- Tile order: {}", self.tile_order)?;
        writeln!(out, "- Cell order: {}", self.cell_order)?;
        writeln!(out, "- Capacity: {}", self.capacity)?;
        writeln!(out, "- Coordinates type: {}", self.datatype)?;
        writeln!(out, "- Coordinates size: {}", self.coords_size())?;
        writeln!(out)?;
        writeln!(out, "=== Hyperspace ===")?;
        for dimension in self.hyperspace.dimensions() {
            writeln!(out, "- Dimension: {dimension}")?;
        }
        for attribute in &self.attributes {
            writeln!(out)?;
            writeln!(out, "=== Attribute ===")?;
            writeln!(out, "- Name: {}", attribute.name())?;
            writeln!(out, "- Type: {}", attribute.datatype())?;
            match attribute.cell_val_num() {
                CellValNum::Fixed(n) => writeln!(out, "- Cell val num: {n}")?,
                CellValNum::Var => writeln!(out, "- Cell val num: var")?,
            }
            writeln!(out, "- Compressor: {}", attribute.compressor())?;
            writeln!(out, "- Compression level: {}", attribute.compression_level())?;
        }
        Ok(())
    }
}

/// Validate the static metadata invariants.
fn check_parts(
    array_type: ArrayType,
    tile_order: Layout,
    cell_order: Layout,
    capacity: u64,
    hyperspace: &Hyperspace,
    attributes: &[Attribute],
) -> Result<(), ArrayMetadataCheckError> {
    if !matches!(tile_order, Layout::RowMajor | Layout::ColMajor) {
        return Err(ArrayMetadataCheckError::InvalidTileOrder(tile_order));
    }
    if !matches!(cell_order, Layout::RowMajor | Layout::ColMajor) {
        return Err(ArrayMetadataCheckError::InvalidCellOrder(cell_order));
    }
    hyperspace.check()?;
    let datatype = hyperspace
        .datatype()
        .ok_or(ArrayMetadataCheckError::MissingHyperspace)?;
    match array_type {
        ArrayType::Dense => {
            if !datatype.is_integer() {
                return Err(ArrayMetadataCheckError::DenseNonIntegerCoordinates(
                    datatype,
                ));
            }
            if let Some(dimension) = hyperspace
                .dimensions()
                .iter()
                .find(|dimension| !dimension.has_tile_extent())
            {
                return Err(ArrayMetadataCheckError::MissingTileExtent(
                    dimension.name().to_string(),
                ));
            }
        }
        ArrayType::Sparse => {
            if !hyperspace.has_tile_extents() && capacity == 0 {
                return Err(ArrayMetadataCheckError::ZeroCapacity);
            }
        }
    }
    let mut names = std::collections::HashSet::with_capacity(attributes.len());
    for attribute in attributes {
        if attribute.name().is_empty() {
            return Err(ArrayMetadataCheckError::EmptyAttributeName);
        }
        if attribute.name() == COORDS_NAME {
            return Err(ArrayMetadataCheckError::ReservedAttributeName(
                attribute.name().to_string(),
            ));
        }
        if !names.insert(attribute.name()) {
            return Err(ArrayMetadataCheckError::DuplicateAttributeName(
                attribute.name().to_string(),
            ));
        }
    }
    Ok(())
}
