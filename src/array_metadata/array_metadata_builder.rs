//! An [`ArrayMetadata`] builder.

use crate::{
    attribute::Attribute,
    hyperspace::Hyperspace,
    layout::Layout,
};

use super::{ArrayMetadata, ArrayMetadataCheckError, ArrayType, DEFAULT_CAPACITY};

/// An [`ArrayMetadata`] builder.
///
/// The builder is initialised from the array URI with a dense array type,
/// row-major tile and cell orders, the default sparse tile capacity, no
/// attributes, and no hyperspace. A hyperspace must be supplied before
/// [`build`](ArrayMetadataBuilder::build).
///
/// [`build`](ArrayMetadataBuilder::build) validates every metadata invariant
/// and computes the derived geometry tables; on error the builder is left
/// untouched, so the caller can adjust it and retry. The built
/// [`ArrayMetadata`] is immutable.
///
/// For example:
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use tilegrid::{
///     array_metadata::{ArrayMetadataBuilder, ArrayType},
///     attribute::Attribute,
///     datatype::Datatype,
///     dimension::Dimension,
///     hyperspace::Hyperspace,
///     layout::Layout,
/// };
///
/// let mut hyperspace = Hyperspace::new();
/// hyperspace
///     .add_dimension(Dimension::new("rows", [1i32, 4], Some(2)))
///     .add_dimension(Dimension::new("cols", [1i32, 4], Some(2)));
///
/// let metadata = ArrayMetadataBuilder::new("my_array")
///     .array_type(ArrayType::Dense)
///     .tile_order(Layout::RowMajor)
///     .cell_order(Layout::RowMajor)
///     .hyperspace(hyperspace)
///     .add_attribute(Attribute::new("a", Datatype::Int32))
///     .build()?;
///
/// assert_eq!(metadata.tile_num()?, 4);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ArrayMetadataBuilder {
    array_uri: String,
    array_type: ArrayType,
    tile_order: Layout,
    cell_order: Layout,
    capacity: u64,
    attributes: Vec<Attribute>,
    hyperspace: Option<Hyperspace>,
}

impl ArrayMetadataBuilder {
    /// Create a new builder for the array at `array_uri`.
    pub fn new(array_uri: impl Into<String>) -> Self {
        Self {
            array_uri: array_uri.into(),
            array_type: ArrayType::Dense,
            tile_order: Layout::RowMajor,
            cell_order: Layout::RowMajor,
            capacity: DEFAULT_CAPACITY,
            attributes: Vec::new(),
            hyperspace: None,
        }
    }

    /// Set the array type.
    pub fn array_type(&mut self, array_type: ArrayType) -> &mut Self {
        self.array_type = array_type;
        self
    }

    /// Set the tile order.
    ///
    /// Only [`Layout::RowMajor`] and [`Layout::ColMajor`] are accepted by
    /// [`build`](ArrayMetadataBuilder::build).
    pub fn tile_order(&mut self, tile_order: Layout) -> &mut Self {
        self.tile_order = tile_order;
        self
    }

    /// Set the cell order.
    ///
    /// Only [`Layout::RowMajor`] and [`Layout::ColMajor`] are accepted by
    /// [`build`](ArrayMetadataBuilder::build).
    pub fn cell_order(&mut self, cell_order: Layout) -> &mut Self {
        self.cell_order = cell_order;
        self
    }

    /// Set the tile capacity for sparse arrays with irregular tiles.
    pub fn capacity(&mut self, capacity: u64) -> &mut Self {
        self.capacity = capacity;
        self
    }

    /// Set the hyperspace.
    pub fn hyperspace(&mut self, hyperspace: Hyperspace) -> &mut Self {
        self.hyperspace = Some(hyperspace);
        self
    }

    /// Append an attribute.
    pub fn add_attribute(&mut self, attribute: Attribute) -> &mut Self {
        self.attributes.push(attribute);
        self
    }

    /// Validate the metadata invariants and build sealed [`ArrayMetadata`].
    ///
    /// # Errors
    /// Returns [`ArrayMetadataCheckError`] naming the first violated
    /// invariant. The builder is unchanged on error.
    pub fn build(&self) -> Result<ArrayMetadata, ArrayMetadataCheckError> {
        let hyperspace = self
            .hyperspace
            .clone()
            .ok_or(ArrayMetadataCheckError::MissingHyperspace)?;
        ArrayMetadata::seal(
            self.array_uri.clone(),
            self.array_type,
            self.tile_order,
            self.cell_order,
            self.capacity,
            hyperspace,
            self.attributes.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::{datatype::Datatype, dimension::Dimension};

    use super::*;

    fn hyperspace_2d() -> Hyperspace {
        let mut hyperspace = Hyperspace::new();
        hyperspace
            .add_dimension(Dimension::new("rows", [1i32, 4], Some(2)))
            .add_dimension(Dimension::new("cols", [1i32, 4], Some(2)));
        hyperspace
    }

    #[test]
    fn builder_defaults() {
        let metadata = ArrayMetadataBuilder::new("dense_array")
            .hyperspace(hyperspace_2d())
            .add_attribute(Attribute::new("a", Datatype::Int32))
            .build()
            .unwrap();
        assert_eq!(metadata.array_uri(), "dense_array");
        assert_eq!(metadata.array_type(), ArrayType::Dense);
        assert!(metadata.dense());
        assert_eq!(metadata.tile_order(), Layout::RowMajor);
        assert_eq!(metadata.cell_order(), Layout::RowMajor);
        assert_eq!(metadata.capacity(), DEFAULT_CAPACITY);
        assert_eq!(metadata.dim_num(), 2);
        assert_eq!(metadata.attribute_num(), 1);
    }

    #[test]
    fn builder_missing_hyperspace() {
        assert!(matches!(
            ArrayMetadataBuilder::new("a").build(),
            Err(ArrayMetadataCheckError::MissingHyperspace)
        ));
    }

    #[test]
    fn builder_rejects_global_order() {
        let mut builder = ArrayMetadataBuilder::new("a");
        builder
            .hyperspace(hyperspace_2d())
            .tile_order(Layout::GlobalOrder);
        assert!(matches!(
            builder.build(),
            Err(ArrayMetadataCheckError::InvalidTileOrder(
                Layout::GlobalOrder
            ))
        ));

        let mut builder = ArrayMetadataBuilder::new("a");
        builder
            .hyperspace(hyperspace_2d())
            .cell_order(Layout::Unordered);
        assert!(matches!(
            builder.build(),
            Err(ArrayMetadataCheckError::InvalidCellOrder(Layout::Unordered))
        ));
    }

    #[test]
    fn builder_dense_requires_extents() {
        let mut hyperspace = Hyperspace::new();
        hyperspace.add_dimension(Dimension::new("rows", [1i32, 4], None));
        let mut builder = ArrayMetadataBuilder::new("a");
        builder.hyperspace(hyperspace);
        assert!(matches!(
            builder.build(),
            Err(ArrayMetadataCheckError::MissingTileExtent(name)) if name == "rows"
        ));
    }

    #[test]
    fn builder_dense_requires_integer_coordinates() {
        let mut hyperspace = Hyperspace::new();
        hyperspace.add_dimension(Dimension::new("x", [0.0f64, 10.0], Some(2.0)));
        let mut builder = ArrayMetadataBuilder::new("a");
        builder.hyperspace(hyperspace);
        assert!(matches!(
            builder.build(),
            Err(ArrayMetadataCheckError::DenseNonIntegerCoordinates(
                Datatype::Float64
            ))
        ));
    }

    #[test]
    fn builder_dense_extent_must_divide_span() {
        let mut hyperspace = Hyperspace::new();
        hyperspace
            .add_dimension(Dimension::new("rows", [1i32, 4], Some(3)))
            .add_dimension(Dimension::new("cols", [1i32, 4], Some(2)));
        let mut builder = ArrayMetadataBuilder::new("a");
        builder.hyperspace(hyperspace);
        assert!(matches!(
            builder.build(),
            Err(ArrayMetadataCheckError::ExtentDoesNotDivideSpan(name)) if name == "rows"
        ));
    }

    #[test]
    fn builder_sparse_irregular_requires_capacity() {
        let mut hyperspace = Hyperspace::new();
        hyperspace.add_dimension(Dimension::new("x", [0.0f32, 10.0], None));
        let mut builder = ArrayMetadataBuilder::new("a");
        builder
            .array_type(ArrayType::Sparse)
            .hyperspace(hyperspace)
            .capacity(0);
        assert!(matches!(
            builder.build(),
            Err(ArrayMetadataCheckError::ZeroCapacity)
        ));
    }

    #[test]
    fn builder_attribute_name_checks() {
        let mut builder = ArrayMetadataBuilder::new("a");
        builder
            .hyperspace(hyperspace_2d())
            .add_attribute(Attribute::new("", Datatype::Int32));
        assert!(matches!(
            builder.build(),
            Err(ArrayMetadataCheckError::EmptyAttributeName)
        ));

        let mut builder = ArrayMetadataBuilder::new("a");
        builder
            .hyperspace(hyperspace_2d())
            .add_attribute(Attribute::new("a", Datatype::Int32))
            .add_attribute(Attribute::new("a", Datatype::Float32));
        assert!(matches!(
            builder.build(),
            Err(ArrayMetadataCheckError::DuplicateAttributeName(_))
        ));

        let mut builder = ArrayMetadataBuilder::new("a");
        builder
            .hyperspace(hyperspace_2d())
            .add_attribute(Attribute::new(super::super::COORDS_NAME, Datatype::Int32));
        assert!(matches!(
            builder.build(),
            Err(ArrayMetadataCheckError::ReservedAttributeName(_))
        ));
    }

    #[test]
    fn builder_retryable_after_error() {
        let mut builder = ArrayMetadataBuilder::new("a");
        builder.tile_order(Layout::GlobalOrder).hyperspace(hyperspace_2d());
        assert!(builder.build().is_err());
        builder.tile_order(Layout::RowMajor);
        assert!(builder.build().is_ok());
    }

    #[test]
    fn builder_sparse_regular_float() {
        let mut hyperspace = Hyperspace::new();
        hyperspace
            .add_dimension(Dimension::new("x", [0.0f64, 10.0], Some(2.5)))
            .add_dimension(Dimension::new("y", [0.0f64, 10.0], Some(2.5)));
        let mut builder = ArrayMetadataBuilder::new("a");
        builder.array_type(ArrayType::Sparse).hyperspace(hyperspace);
        let metadata = builder.build().unwrap();
        assert!(!metadata.dense());
        assert_eq!(metadata.cell_num_per_tile(), None);
        assert_eq!(metadata.tile_num().unwrap(), 25);
    }
}
