#![allow(missing_docs)]

use std::sync::Arc;

use serde_json::Value;

use geoarray::{
    Attributes, Coordinate, Crs, CrsInput, DataArray, DimRole, HasCrs, RenameCollisionError,
    SpatialCoordsError, WriteCrsError,
};

const GOES_GRID_MAPPING: &str = r#"{
    "long_name": "GOES-R ABI fixed grid projection",
    "grid_mapping_name": "geostationary",
    "perspective_point_height": 35786023.0,
    "semi_major_axis": 6378137.0,
    "semi_minor_axis": 6356752.31414,
    "inverse_flattening": 298.2572221,
    "latitude_of_projection_origin": 0.0,
    "longitude_of_projection_origin": -89.5,
    "sweep_angle_axis": "x"
}"#;

fn attrs(json: &str) -> Attributes {
    serde_json::from_str(json).unwrap()
}

/// A GOES-R ABI radiance array as read from NetCDF: the variable references
/// its grid mapping coordinate through the encoding.
fn goes_radiances() -> DataArray {
    let mut array = DataArray::new(["y", "x"], [1500, 2500])
        .unwrap()
        .with_name("Rad");
    array.insert_coordinate(
        "goes_imager_projection",
        Coordinate::scalar().with_attributes(attrs(GOES_GRID_MAPPING)),
    );
    array.encoding_mut().insert(
        "grid_mapping".to_string(),
        Value::String("goes_imager_projection".to_string()),
    );
    array
}

#[test]
fn resolve_crs_from_encoding_grid_mapping() {
    let crs = goes_radiances().geo().crs().unwrap().unwrap();
    assert!(crs.is_projected());
    assert_eq!(crs.method_name(), Some("Geostationary Satellite (Sweep X)"));
    let [easting, northing] = crs.axes();
    assert_eq!(easting.unit(), "metre");
    assert_eq!(northing.unit(), "metre");
}

#[test]
fn write_crs_round_trips() {
    let array = DataArray::new(["y", "x"], [4, 6]).unwrap();
    for input in [
        "EPSG:4326",
        "+proj=longlat +datum=WGS84 +no_defs",
        "+proj=geos +lon_0=-75 +h=35786023 +sweep=x +ellps=GRS80 +units=m +no_defs",
    ] {
        let crs = Crs::from_user_input(input).unwrap();
        let written = array.geo().write_crs(&crs).unwrap();
        let resolved = written.geo().crs().unwrap().unwrap();
        assert_eq!(resolved, crs, "round trip of {input}");
    }
}

#[test]
fn write_crs_discovered_rewrites_existing_metadata() {
    let array = goes_radiances();
    let original = array.geo().crs().unwrap().unwrap();
    let written = array.geo().write_crs(CrsInput::Discovered).unwrap();
    assert!(written.coordinate("spatial_ref").is_some());
    assert_eq!(written.geo().crs().unwrap().unwrap(), original);
}

#[test]
fn write_crs_rejects_unparseable_text() {
    let array = DataArray::new(["y", "x"], [4, 6]).unwrap();
    assert!(matches!(
        array.geo().write_crs("not a crs"),
        Err(WriteCrsError::Parse(_))
    ));
}

#[test]
fn resolve_crs_from_implicit_spatial_ref_coordinate() {
    // rioxarray attaches the grid mapping as a "spatial_ref" coordinate
    // without referencing it from grid_mapping anywhere.
    let mut array = DataArray::new(["band", "y", "x"], [3, 256, 512]).unwrap();
    let mut crs_attrs = Attributes::new();
    crs_attrs.insert(
        "spatial_ref".to_string(),
        Value::String(Crs::from_epsg(32615).unwrap().to_wkt()),
    );
    array.insert_coordinate("spatial_ref", Coordinate::scalar().with_attributes(crs_attrs));
    let crs = array.geo().crs().unwrap().unwrap();
    assert_eq!(crs.to_epsg(), Some(32615));
    assert_eq!(crs.name(), "WGS 84 / UTM zone 15N");
}

#[derive(Debug)]
struct AreaDefinition {
    crs: Crs,
}

impl HasCrs for AreaDefinition {
    fn crs(&self) -> Option<Crs> {
        Some(self.crs.clone())
    }
}

#[test]
fn resolve_crs_from_area_definition() {
    let area = Arc::new(AreaDefinition {
        crs: Crs::from_epsg(3413).unwrap(),
    });
    let array = DataArray::new(["y", "x"], [4, 6]).unwrap().with_area(area);
    let crs = array.geo().crs().unwrap().unwrap();
    assert_eq!(crs.to_epsg(), Some(3413));
}

#[test]
fn grid_mapping_beats_area_definition() {
    let area = Arc::new(AreaDefinition {
        crs: Crs::from_epsg(3413).unwrap(),
    });
    let array = goes_radiances().with_area(area);
    let crs = array.geo().crs().unwrap().unwrap();
    assert_eq!(crs.method_name(), Some("Geostationary Satellite (Sweep X)"));
}

#[test]
fn resolve_crs_from_legacy_attribute() {
    let mut array = DataArray::new(["y", "x"], [4, 6]).unwrap();
    array
        .attributes_mut()
        .insert("crs".to_string(), Value::String("EPSG:4267".to_string()));
    let crs = array.geo().crs().unwrap().unwrap();
    assert_eq!(crs.name(), "NAD27");
}

#[test]
fn write_dims_renames_to_preferred_names() {
    let array = DataArray::new(["t", "lev", "lats", "lons"], [2, 5, 10, 20]).unwrap();
    let geo = array.geo();
    assert_eq!(geo.dims(), ["time", "vertical", "y", "x"]);
    let written = geo.write_dims().unwrap();
    assert_eq!(DataArray::dims(&written), ["time", "vertical", "y", "x"]);
    // Inference on the renamed object is a fixed point.
    assert_eq!(written.geo().dims(), ["time", "vertical", "y", "x"]);
}

#[test]
fn partial_match_disables_positional_fallback() {
    // "t" matches time, so the remaining 2-D shape must not trigger the
    // positional y/x guess and write_dims must agree with the display.
    let array = DataArray::new(["t", "foo"], [4, 8]).unwrap();
    let geo = array.geo();
    assert_eq!(geo.dims(), ["time", "foo"]);
    assert_eq!(geo.dim_name(DimRole::Time), Some("t"));
    assert_eq!(geo.dim_name(DimRole::Y), None);
    assert_eq!(geo.dim_name(DimRole::X), None);
    let written = geo.write_dims().unwrap();
    assert_eq!(DataArray::dims(&written), ["time", "foo"]);
}

#[test]
fn write_dims_rejects_coordinate_collision() {
    let mut array = DataArray::new(["lats", "lons"], [4, 6]).unwrap();
    array.insert_coordinate("lats", Coordinate::new("lats", vec![0.0, 1.0, 2.0, 3.0]));
    array.insert_coordinate("y", Coordinate::scalar());
    // Renaming lats to y would overwrite the unrelated y coordinate.
    let error = array.geo().write_dims().unwrap_err();
    assert!(matches!(error, RenameCollisionError::Coordinate { .. }));

    // The in-place form refuses before touching anything.
    let error = array.geo_mut().write_dims().unwrap_err();
    assert!(matches!(error, RenameCollisionError::Coordinate { .. }));
    assert_eq!(DataArray::dims(&array), ["lats", "lons"]);
    let lats = array.coordinate("lats").unwrap();
    assert_eq!(lats.values(), Some(&[0.0, 1.0, 2.0, 3.0][..]));
    assert!(array.coordinate("y").unwrap().values().is_none());
}

#[test]
fn unrecognised_dims_are_assigned_by_hand() {
    let array = DataArray::new(["dim_0", "dim_1", "dim_2"], [5, 20, 10]).unwrap();
    let mut geo = array.geo();
    // Nothing matches and a 3-D object gets no positional fallback.
    assert_eq!(geo.dims(), ["dim_0", "dim_1", "dim_2"]);
    assert_eq!(geo.dim_name(DimRole::Y), None);

    geo.set_dim(DimRole::Y, "dim_1").unwrap();
    geo.set_dim(DimRole::X, "dim_2").unwrap();
    assert_eq!(geo.dims(), ["dim_0", "y", "x"]);
    assert_eq!(geo.size(DimRole::Y), Some(20));
    assert_eq!(geo.size(DimRole::X), Some(10));

    let written = geo.write_dims().unwrap();
    assert_eq!(DataArray::dims(&written), ["dim_0", "y", "x"]);
}

#[test]
fn written_grid_mapping_attributes() {
    let array = DataArray::new(["y", "x"], [4, 6]).unwrap();
    let written = array.geo().write_crs("EPSG:4326").unwrap();
    let attrs = written.coordinate("spatial_ref").unwrap().attributes();
    assert_eq!(
        attrs.get("grid_mapping_name").and_then(Value::as_str),
        Some("latitude_longitude")
    );
    let datum = attrs
        .get("horizontal_datum_name")
        .and_then(Value::as_str)
        .unwrap();
    assert!(datum.contains("World Geodetic System 1984"));
    let wkt = attrs.get("crs_wkt").and_then(Value::as_str).unwrap();
    assert!(wkt.starts_with("GEOGCRS[\"WGS 84\""));
    assert_eq!(attrs.get("spatial_ref").and_then(Value::as_str), Some(wkt));
    // The reference moved into the encoding and off the attributes.
    assert_eq!(
        written.encoding().get("grid_mapping").and_then(Value::as_str),
        Some("spatial_ref")
    );
    assert!(!written.attributes().contains_key("grid_mapping"));
}

#[test]
fn set_dim_overrides_inference() {
    let array = DataArray::new(["bands", "y", "x"], [3, 4, 6]).unwrap();
    let mut geo = array.geo();
    assert_eq!(geo.dim_name(DimRole::Vertical), None);
    geo.set_dim(DimRole::Vertical, "bands").unwrap();
    assert_eq!(geo.dims(), ["vertical", "y", "x"]);
    assert_eq!(geo.size(DimRole::Vertical), Some(3));
    assert!(geo.set_dim(DimRole::Time, "missing").is_err());
}

const GCPS: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "properties": {"id": "1", "info": "", "row": 0.0, "col": 0.0},
            "geometry": {"type": "Point", "coordinates": [-17.924, 28.854, 0.0]}
        },
        {
            "type": "Feature",
            "properties": {"id": "2", "info": "", "row": 0.0, "col": 9.0},
            "geometry": {"type": "Point", "coordinates": [-17.922, 28.854, 0.0]}
        },
        {
            "type": "Feature",
            "properties": {"id": "3", "info": "", "row": 9.0, "col": 0.0},
            "geometry": {"type": "Point", "coordinates": [-17.924, 28.852, 0.0]}
        },
        {
            "type": "Feature",
            "properties": {"id": "4", "info": "", "row": 9.0, "col": 9.0},
            "geometry": {"type": "Point", "coordinates": [-17.922, 28.852, 0.0]}
        }
    ]
}"#;

#[test]
fn gcps_round_trip_is_byte_stable() {
    let array = DataArray::new(["y", "x"], [10, 10]).unwrap();
    let written = array.geo().write_gcps(GCPS).unwrap();
    // The stored text is exactly what was written, whitespace included.
    assert_eq!(written.geo().gcps(), Some(GCPS));
    let rewritten = written.geo().write_gcps(written.geo().gcps().unwrap()).unwrap();
    assert_eq!(rewritten.geo().gcps(), Some(GCPS));

    let points = written.geo().gcp_points().unwrap().unwrap();
    assert_eq!(points.len(), 4);
    assert_eq!(points[3].id, "4");
    assert_eq!(points[3].row, 9.0);
    assert_eq!(points[3].longitude, -17.922);
    assert_eq!(points[3].elevation, Some(0.0));
}

#[test]
fn gcps_missing() {
    let array = DataArray::new(["y", "x"], [4, 6]).unwrap();
    assert!(array.geo().gcps().is_none());
    assert!(array.geo().gcp_points().unwrap().is_none());
}

#[test]
fn spatial_coords_from_geotiff_tags() {
    let resolution = 1002.008_644;
    let corner = 5_434_894.885_056;
    let mut array = DataArray::new(["a", "b"], [2, 3]).unwrap();
    array.attributes_mut().insert(
        "ModelPixelScale".to_string(),
        serde_json::json!([resolution, resolution, 0.0]),
    );
    array.attributes_mut().insert(
        "ModelTiepoint".to_string(),
        serde_json::json!([0.0, 0.0, 0.0, -corner, corner, 0.0]),
    );
    // "a" and "b" fall back to the y and x roles positionally, and the
    // generated coordinates attach under those actual names.
    let written = array.geo().write_spatial_coords().unwrap();
    let y = written.coordinate("a").unwrap().values().unwrap();
    let x = written.coordinate("b").unwrap().values().unwrap();
    assert_eq!(x.len(), 3);
    assert_eq!(y.len(), 2);
    assert_eq!(x[0], -corner + resolution / 2.0);
    assert_eq!(y[0], corner - resolution / 2.0);
    assert!((x[1] - x[0] - resolution).abs() < 1e-6);
    assert!((y[0] - y[1] - resolution).abs() < 1e-6);
}

#[test]
fn spatial_coords_without_georeferencing() {
    let array = DataArray::new(["y", "x"], [4, 6]).unwrap();
    assert!(matches!(
        array.geo().spatial_coords(),
        Err(SpatialCoordsError::UnknownLayout)
    ));

    let array = DataArray::new(["time"], [5]).unwrap();
    assert!(matches!(
        array.geo().spatial_coords(),
        Err(SpatialCoordsError::MissingDimension(DimRole::Y))
    ));
}
