#![allow(missing_docs)]

use serde_json::Value;

use geoarray::{
    Attributes, Coordinate, Crs, CrsInput, DataArray, Dataset, RenameCollisionError, WriteCrsError,
};

fn variable_with_crs(crs: &Crs) -> DataArray {
    DataArray::new(["y", "x"], [4, 6])
        .unwrap()
        .geo()
        .write_crs(crs)
        .unwrap()
}

fn wkt_coordinate(crs: &Crs) -> Coordinate {
    let mut attrs = Attributes::new();
    attrs.insert("crs_wkt".to_string(), Value::String(crs.to_wkt()));
    Coordinate::scalar().with_attributes(attrs)
}

#[test]
fn variables_with_the_same_crs_resolve() {
    let crs = Crs::from_epsg(3857).unwrap();
    let mut dataset = Dataset::new();
    dataset
        .insert_variable("t2m", variable_with_crs(&crs))
        .unwrap();
    dataset
        .insert_variable("u10", variable_with_crs(&crs))
        .unwrap();
    let resolved = dataset.geo().crs().unwrap().unwrap();
    assert_eq!(resolved, crs);
}

#[test]
fn variables_with_differing_crs_conflict() {
    let mut dataset = Dataset::new();
    dataset
        .insert_variable("a", variable_with_crs(&Crs::from_epsg(4326).unwrap()))
        .unwrap();
    dataset
        .insert_variable("b", variable_with_crs(&Crs::from_epsg(3413).unwrap()))
        .unwrap();
    dataset
        .insert_variable("c", variable_with_crs(&Crs::from_epsg(4326).unwrap()))
        .unwrap();
    let error = dataset.geo().crs().unwrap_err();
    // Variables resolve in name order, so "a" and "b" are the pair reported.
    assert_eq!(error.first_variable(), "a");
    assert_eq!(error.second_variable(), "b");

    assert!(matches!(
        dataset.geo().write_crs(CrsInput::Discovered),
        Err(WriteCrsError::MultipleCrs(_))
    ));
}

#[test]
fn variables_without_crs_metadata_do_not_conflict() {
    let mut dataset = Dataset::new();
    dataset
        .insert_variable("rad", variable_with_crs(&Crs::from_epsg(4326).unwrap()))
        .unwrap();
    dataset
        .insert_variable("dqf", DataArray::new(["y", "x"], [4, 6]).unwrap())
        .unwrap();
    let crs = dataset.geo().crs().unwrap().unwrap();
    assert_eq!(crs.to_epsg(), Some(4326));
}

#[test]
fn dataset_without_crs() {
    let mut dataset = Dataset::new();
    dataset
        .insert_variable("rad", DataArray::new(["y", "x"], [4, 6]).unwrap())
        .unwrap();
    assert!(dataset.geo().crs().unwrap().is_none());
    assert!(matches!(
        dataset.geo().write_crs(CrsInput::Discovered),
        Err(WriteCrsError::NotFound(_))
    ));
}

#[test]
fn variable_reference_to_a_dataset_level_coordinate() {
    let crs = Crs::from_epsg(4326).unwrap();
    let mut dataset = Dataset::new();
    let mut rad = DataArray::new(["y", "x"], [4, 6]).unwrap();
    rad.encoding_mut().insert(
        "grid_mapping".to_string(),
        Value::String("crs_def".to_string()),
    );
    dataset.insert_variable("rad", rad).unwrap();
    // The referenced coordinate lives on the dataset, not the variable.
    dataset.insert_coordinate("crs_def", wkt_coordinate(&crs));
    assert_eq!(dataset.geo().crs().unwrap().unwrap(), crs);
}

#[test]
fn dataset_level_grid_mapping_attribute() {
    let crs = Crs::from_epsg(4258).unwrap();
    let mut dataset = Dataset::new();
    dataset
        .insert_variable("rad", DataArray::new(["y", "x"], [4, 6]).unwrap())
        .unwrap();
    dataset.insert_coordinate("crs_def", wkt_coordinate(&crs));
    dataset.attributes_mut().insert(
        "grid_mapping".to_string(),
        Value::String("crs_def".to_string()),
    );
    // No variable references the grid mapping, so resolution falls back to
    // the dataset's own metadata.
    assert_eq!(dataset.geo().crs().unwrap().unwrap(), crs);
}

#[test]
fn write_crs_applies_to_every_variable() {
    let mut dataset = Dataset::new();
    dataset
        .insert_variable("rad", DataArray::new(["y", "x"], [4, 6]).unwrap())
        .unwrap();
    dataset
        .insert_variable("dqf", DataArray::new(["y", "x"], [4, 6]).unwrap())
        .unwrap();
    dataset.geo_mut().write_crs("EPSG:4326").unwrap();
    assert!(dataset.coordinate("spatial_ref").is_some());
    for variable in dataset.variables().values() {
        assert_eq!(
            variable.encoding().get("grid_mapping"),
            Some(&Value::String("spatial_ref".to_string()))
        );
    }
    assert_eq!(dataset.geo().crs().unwrap().unwrap().to_epsg(), Some(4326));
}

#[test]
fn geo_write_returns_a_copy() {
    let mut dataset = Dataset::new();
    dataset
        .insert_variable("rad", DataArray::new(["y", "x"], [4, 6]).unwrap())
        .unwrap();
    let written = dataset.geo().write_crs("EPSG:4326").unwrap();
    assert!(dataset.geo().crs().unwrap().is_none());
    assert!(written.geo().crs().unwrap().is_some());
}

#[test]
fn write_dims_renames_variables_and_coordinates() {
    let mut dataset = Dataset::new();
    dataset
        .insert_variable(
            "t2m",
            DataArray::new(["time", "lats", "lons"], [2, 4, 6]).unwrap(),
        )
        .unwrap();
    dataset
        .insert_variable("elevation", DataArray::new(["lats", "lons"], [4, 6]).unwrap())
        .unwrap();
    dataset.insert_coordinate("lats", Coordinate::new("lats", vec![0.0, 1.0, 2.0, 3.0]));
    dataset.geo_mut().write_dims().unwrap();
    assert_eq!(dataset.dims(), ["y", "x", "time"]);
    assert_eq!(dataset.variable("t2m").unwrap().dims(), ["time", "y", "x"]);
    assert_eq!(dataset.coordinate("y").unwrap().dims(), ["y"]);
    assert!(dataset.coordinate("lats").is_none());
}

#[test]
fn write_dims_sees_variable_coordinates() {
    let mut dataset = Dataset::new();
    let mut t2m = DataArray::new(["lats", "lons"], [4, 6]).unwrap();
    t2m.insert_coordinate("y", Coordinate::scalar());
    dataset.insert_variable("t2m", t2m).unwrap();
    // The colliding coordinate lives on the variable, not the dataset.
    let error = dataset.geo_mut().write_dims().unwrap_err();
    assert!(matches!(error, RenameCollisionError::Coordinate { .. }));
    assert_eq!(dataset.dims(), ["lats", "lons"]);
}
