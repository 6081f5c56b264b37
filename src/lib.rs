//! A rust library for the array metadata and tile geometry of a tiled
//! multidimensional array storage engine.
//!
//! `tilegrid` defines an array's coordinate domain, its partitioning into
//! tiles, the linearization orders of tiles and of cells within tiles, and
//! its attribute layout, and implements the arithmetic that maps between
//! global coordinates, tile coordinates, positions of cells inside tiles,
//! and positions of tiles inside tile domains. A storage engine routes every
//! read path, write path, and on-disk offset computation through these calls;
//! the engine itself performs no I/O.
//!
//! The best docs to start with are
//! [`array_metadata::ArrayMetadataBuilder`] and [`array_metadata::ArrayMetadata`].
//!
//! ## Overview
//! - [x] Dense and sparse arrays, with regular (extent-based) or irregular
//!   (capacity-bound) tiles.
//! - [x] Signed/unsigned integer and floating point coordinate types behind
//!   a closed, sealed [`coordinate::CoordinateType`] trait; floating point
//!   coordinates are restricted to sparse arrays.
//! - [x] Row-major and column-major linearization at both levels (tile order
//!   and cell-within-tile order) simultaneously.
//! - [x] Coordinate arithmetic: order comparisons, tile ids, in-tile cell
//!   positions, successor/predecessor walks, tile subarrays, domain
//!   expansion, subarray intersection, and tile-slab cell counts.
//! - [x] A bit-exact little-endian serialization codec for persisting
//!   metadata; derived geometry tables are recomputed on load.
//!
//! Sealed [`array_metadata::ArrayMetadata`] is an immutable value: every
//! method takes `&self` and the type holds no interior mutability, so shared
//! references may be used freely across threads.
//!
//! ## Example
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use tilegrid::{
//!     array_metadata::ArrayMetadataBuilder,
//!     attribute::Attribute,
//!     datatype::Datatype,
//!     dimension::Dimension,
//!     hyperspace::Hyperspace,
//! };
//!
//! let mut hyperspace = Hyperspace::new();
//! hyperspace
//!     .add_dimension(Dimension::new("rows", [1i32, 4], Some(2)))
//!     .add_dimension(Dimension::new("cols", [1i32, 4], Some(2)));
//!
//! let metadata = ArrayMetadataBuilder::new("my_dense_array")
//!     .hyperspace(hyperspace)
//!     .add_attribute(Attribute::new("a", Datatype::Int32))
//!     .build()?;
//!
//! assert_eq!(metadata.tile_id(&[3i32, 3])?, 3);
//! assert_eq!(metadata.get_cell_pos(&[2i32, 2])?, 3);
//!
//! let bytes = metadata.to_bytes();
//! let decoded = tilegrid::array_metadata::ArrayMetadata::from_bytes(&bytes)?;
//! assert_eq!(decoded, metadata);
//! # Ok(())
//! # }
//! ```

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]

pub mod array_metadata;
pub mod attribute;
pub mod binary;
pub mod compressor;
pub mod coordinate;
pub mod datatype;
pub mod dimension;
pub mod hyperspace;
pub mod layout;
