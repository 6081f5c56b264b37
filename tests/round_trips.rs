use std::error::Error;

use tilegrid::{
    array_metadata::{ArrayMetadata, ArrayMetadataBuilder, ArrayType, COORDS_NAME},
    attribute::{Attribute, CellValNum},
    binary::BinarySerialize,
    compressor::Compressor,
    coordinate::CoordinateType,
    datatype::Datatype,
    dimension::Dimension,
    hyperspace::Hyperspace,
    layout::Layout,
};

fn round_trip(metadata: &ArrayMetadata) -> ArrayMetadata {
    let mut bytes = Vec::new();
    metadata.write_to(&mut bytes).unwrap();
    let decoded = ArrayMetadata::from_bytes(&bytes).unwrap();
    assert_eq!(&decoded, metadata);
    decoded
}

fn dense_2d<T: CoordinateType>(domain: [T; 2], extent: T) -> ArrayMetadata {
    let mut hyperspace = Hyperspace::new();
    hyperspace
        .add_dimension(Dimension::new("rows", domain, Some(extent)))
        .add_dimension(Dimension::new("cols", domain, Some(extent)));
    ArrayMetadataBuilder::new("dense_2d")
        .hyperspace(hyperspace)
        .add_attribute(Attribute::new("a", Datatype::Float32))
        .build()
        .unwrap()
}

#[test]
fn dense_round_trip_every_integer_coordinate_type() {
    round_trip(&dense_2d([0i8, 7], 2));
    round_trip(&dense_2d([0u8, 7], 2));
    round_trip(&dense_2d([-8i16, 7], 4));
    round_trip(&dense_2d([0u16, 15], 4));
    round_trip(&dense_2d([1i32, 100], 10));
    round_trip(&dense_2d([0u32, 99], 10));
    round_trip(&dense_2d([-50i64, 49], 25));
    round_trip(&dense_2d([0u64, 1023], 256));
}

#[test]
fn sparse_round_trip_float_coordinate_types() -> Result<(), Box<dyn Error>> {
    for extent in [None, Some(0.5f32)] {
        let mut hyperspace = Hyperspace::new();
        hyperspace
            .add_dimension(Dimension::new("x", [-1.0f32, 1.0], extent))
            .add_dimension(Dimension::new("y", [-1.0f32, 1.0], extent));
        let metadata = ArrayMetadataBuilder::new("sparse_f32")
            .array_type(ArrayType::Sparse)
            .hyperspace(hyperspace)
            .build()?;
        round_trip(&metadata);
    }
    Ok(())
}

#[test]
fn geometry_survives_round_trip() -> Result<(), Box<dyn Error>> {
    let metadata = dense_2d([1i32, 4], 2);
    let decoded = round_trip(&metadata);
    assert_eq!(decoded.tile_num()?, 4);
    assert_eq!(decoded.tile_id(&[3i32, 3])?, metadata.tile_id(&[3i32, 3])?);
    assert_eq!(decoded.get_cell_pos(&[2i32, 2])?, 3);
    assert_eq!(decoded.get_tile_subarray(&[1i32, 1])?, vec![3, 4, 3, 4]);
    Ok(())
}

#[test]
fn sparse_3d_with_attributes_round_trip() -> Result<(), Box<dyn Error>> {
    let mut hyperspace = Hyperspace::new();
    hyperspace
        .add_dimension(Dimension::new("x", [0.0f64, 100.0], None))
        .add_dimension(Dimension::new("y", [0.0f64, 100.0], None))
        .add_dimension(Dimension::new("z", [0.0f64, 100.0], None));
    let metadata = ArrayMetadataBuilder::new("observations")
        .array_type(ArrayType::Sparse)
        .tile_order(Layout::ColMajor)
        .cell_order(Layout::ColMajor)
        .capacity(4_096)
        .hyperspace(hyperspace)
        .add_attribute(
            Attribute::new("label", Datatype::StringAscii)
                .with_cell_val_num(CellValNum::Var)
                .with_compression(Compressor::Gzip, 6),
        )
        .add_attribute(
            Attribute::new("pair", Datatype::Int32).with_cell_val_num(CellValNum::fixed(2).unwrap()),
        )
        .build()?;

    let decoded = round_trip(&metadata);

    assert_eq!(decoded.array_uri(), "observations");
    assert_eq!(decoded.array_type(), ArrayType::Sparse);
    assert!(!decoded.dense());
    assert_eq!(decoded.tile_order(), Layout::ColMajor);
    assert_eq!(decoded.cell_order(), Layout::ColMajor);
    assert_eq!(decoded.capacity(), 4_096);
    assert_eq!(decoded.dim_num(), 3);
    assert_eq!(decoded.coords_type(), Datatype::Float64);
    assert_eq!(decoded.coords_size(), 24);
    assert_eq!(decoded.attribute_num(), 2);
    assert_eq!(decoded.attribute(0).unwrap().name(), "label");
    assert_eq!(decoded.cell_val_num(0), Some(CellValNum::Var));
    assert_eq!(decoded.var_size(0), Some(true));
    assert_eq!(decoded.cell_size(0), Some(8));
    assert_eq!(decoded.cell_size(1), Some(8));
    assert_eq!(decoded.cell_size(2), Some(24));
    assert_eq!(decoded.datatype(0), Some(Datatype::StringAscii));
    assert_eq!(decoded.datatype(2), Some(Datatype::Float64));
    assert_eq!(decoded.compression(0), Some(Compressor::Gzip));
    assert_eq!(decoded.compression_level(0), Some(6));
    assert_eq!(decoded.compression(2), Some(Compressor::DoubleDelta));
    assert_eq!(decoded.coords_compression(), Compressor::DoubleDelta);
    assert_eq!(decoded.coords_compression_level(), -1);
    assert_eq!(decoded.cell_num_per_tile(), None);
    assert_eq!(decoded.attribute_names(), vec!["label", "pair", COORDS_NAME]);
    assert_eq!(decoded.attribute_ids(["pair", "label"])?, vec![1, 0]);
    assert!(decoded.attribute_ids(["missing"]).is_err());
    assert!(decoded.check().is_ok());
    Ok(())
}

#[test]
fn successor_closure_on_wide_domain() -> Result<(), Box<dyn Error>> {
    let metadata = dense_2d([0u16, 15], 4);
    let domain = [0u16, 15, 0, 15];
    let mut coords = [0u16, 0];
    let mut count = 1u32;
    while metadata.get_next_cell_coords(&domain, &mut coords)? {
        count += 1;
    }
    assert_eq!(count, 256);

    let mut coords = [15u16, 15];
    let mut count = 1u32;
    while metadata.get_previous_cell_coords(&domain, &mut coords)? {
        count += 1;
    }
    assert_eq!(count, 256);
    Ok(())
}

#[test]
fn dump_is_readable() -> Result<(), Box<dyn Error>> {
    let metadata = dense_2d([1i32, 4], 2);
    let mut out = Vec::new();
    metadata.dump(&mut out)?;
    let dump = String::from_utf8(out)?;
    assert!(dump.contains("- Array URI: dense_2d"));
    assert!(dump.contains("- Array type: dense"));
    assert!(dump.contains("- Tile order: row-major"));
    assert!(dump.contains("=== Hyperspace ==="));
    assert!(dump.contains("rows"));
    assert!(dump.contains("=== Attribute ==="));
    Ok(())
}
