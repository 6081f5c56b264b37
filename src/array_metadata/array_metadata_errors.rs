//! Array metadata errors.

use thiserror::Error;

use crate::{datatype::Datatype, hyperspace::HyperspaceCheckError, layout::Layout};

/// An incompatible dimensionality error.
#[derive(Copy, Clone, Debug, Error)]
#[error("incompatible dimensionality {0}, expected {1}")]
pub struct IncompatibleDimensionalityError(pub(crate) usize, pub(crate) usize);

impl IncompatibleDimensionalityError {
    /// Create a new incompatible dimensionality error.
    #[must_use]
    pub const fn new(got: usize, expected: usize) -> Self {
        Self(got, expected)
    }
}

/// An unknown attribute error.
#[derive(Clone, Debug, Error)]
#[error("attribute {0} does not exist")]
pub struct UnknownAttributeError(pub(crate) String);

/// An array metadata invariant violation, reported when metadata is built or
/// deserialized.
#[derive(Clone, Debug, Error)]
pub enum ArrayMetadataCheckError {
    /// No hyperspace was supplied.
    #[error("array metadata has no hyperspace")]
    MissingHyperspace,
    /// A hyperspace-level violation.
    #[error(transparent)]
    Hyperspace(#[from] HyperspaceCheckError),
    /// A tile order other than row-major or column-major.
    #[error("invalid tile order {0}")]
    InvalidTileOrder(Layout),
    /// A cell order other than row-major or column-major.
    #[error("invalid cell order {0}")]
    InvalidCellOrder(Layout),
    /// A dense array with a floating point coordinate type.
    #[error("dense arrays require an integer coordinate type, got {0}")]
    DenseNonIntegerCoordinates(Datatype),
    /// A dense array with a dimension lacking a tile extent.
    #[error("dense arrays require a tile extent on every dimension, missing on {0}")]
    MissingTileExtent(String),
    /// A tile extent that does not divide its dimension span.
    #[error("tile extent does not divide the domain span on dimension {0}")]
    ExtentDoesNotDivideSpan(String),
    /// A sparse array with irregular tiles and a zero capacity.
    #[error("sparse arrays with irregular tiles require a non-zero capacity")]
    ZeroCapacity,
    /// An attribute with an empty name.
    #[error("attribute names must be non-empty")]
    EmptyAttributeName,
    /// Two attributes sharing a name.
    #[error("duplicate attribute name {0}")]
    DuplicateAttributeName(String),
    /// An attribute named like the coordinates.
    #[error("attribute name {0} is reserved")]
    ReservedAttributeName(String),
    /// More tiles than a `u64` can count.
    #[error("number of tiles in the array domain exceeds u64")]
    TileDomainOverflow,
    /// More cells per tile than a `u64` can count.
    #[error("number of cells per tile exceeds u64")]
    CellNumPerTileOverflow,
}

/// A geometry query error.
#[derive(Clone, Debug, Error)]
pub enum GeometryError {
    /// An operation requiring regular tiles was invoked on an array with
    /// irregular tiles.
    #[error("operation requires regular tiles, but the array has no tile extents")]
    NoRegularTiles,
    /// An operation applicable only to dense arrays was invoked on a sparse
    /// array.
    #[error("operation is only applicable to dense arrays")]
    NotDense,
    /// Coordinates of a type other than the array coordinate type.
    #[error("incompatible coordinate type {got}, array coordinates are {expected}")]
    IncompatibleCoordinateType {
        /// The coordinate type of the call.
        got: Datatype,
        /// The coordinate type of the array.
        expected: Datatype,
    },
    /// An argument whose length does not match the array dimensionality.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
}
