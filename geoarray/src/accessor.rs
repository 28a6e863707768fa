//! The geospatial accessor.
//!
//! [`Geo`] and [`GeoMut`] wrap a [`DataArray`] or [`Dataset`] and expose
//! the geospatial operations: dimension roles, CRS resolution and writing,
//! ground control points, and spatial coordinate generation. [`Geo`] write
//! operations return a modified clone; [`GeoMut`] applies them in place.

use std::collections::BTreeMap;

use serde_json::Value;

use geoarray_crs::Crs;

use crate::array::{Attributes, Coordinate, DataArray};
use crate::coords::{spatial_coord_values, SpatialCoordsError};
use crate::dataset::Dataset;
use crate::dims::{DimMap, DimRole, RenameCollisionError, UnknownDimensionError};
use crate::gcps::{gcps_text, parse_gcps, GcpFormatError, GroundControlPoint, GCPS_KEY};
use crate::grid_mapping::{
    apply_grid_mapping_to_array, apply_grid_mapping_to_dataset, discover_array_crs,
    discover_dataset_crs, grid_mapping_coordinate, CrsInput, CrsNotFoundError, HasCrs,
    MultipleCrsError, WriteCrsError, DEFAULT_GRID_MAPPING_NAME,
};

/// A container of geospatial metadata that the accessors can wrap.
///
/// Implemented by [`DataArray`] and [`Dataset`].
pub trait GeoObject {
    /// The dimension names in storage order.
    fn dims(&self) -> Vec<String>;

    /// The size of the named dimension.
    fn dimension_size(&self, dim: &str) -> Option<u64>;

    /// The attribute map.
    fn attributes(&self) -> &Attributes;

    /// The attribute map, mutably.
    fn attributes_mut(&mut self) -> &mut Attributes;

    /// The encoding map.
    fn encoding(&self) -> &Attributes;

    /// The encoding map, mutably.
    fn encoding_mut(&mut self) -> &mut Attributes;

    /// The named coordinate.
    fn coordinate(&self, name: &str) -> Option<&Coordinate>;

    /// The names of every coordinate reachable through the object.
    fn coordinate_names(&self) -> Vec<String>;

    /// Attach a coordinate, replacing any existing one of the same name.
    fn insert_coordinate(&mut self, name: &str, coordinate: Coordinate);

    /// The attached area definition.
    fn area(&self) -> Option<&dyn HasCrs>;

    /// Rename dimensions throughout the object.
    fn rename_dimensions(&mut self, renames: &BTreeMap<String, String>);

    /// Resolve the CRS from the object's metadata.
    ///
    /// # Errors
    /// Returns a [`MultipleCrsError`] if the object is a dataset whose
    /// variables carry differing CRS metadata.
    fn resolve_crs(&self) -> Result<Option<Crs>, MultipleCrsError>;

    /// Attach a grid mapping coordinate and reference it from the encoding.
    fn apply_grid_mapping(&mut self, name: &str, coordinate: Coordinate);
}

impl GeoObject for DataArray {
    fn dims(&self) -> Vec<String> {
        DataArray::dims(self).to_vec()
    }

    fn dimension_size(&self, dim: &str) -> Option<u64> {
        DataArray::dimension_size(self, dim)
    }

    fn attributes(&self) -> &Attributes {
        DataArray::attributes(self)
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        DataArray::attributes_mut(self)
    }

    fn encoding(&self) -> &Attributes {
        DataArray::encoding(self)
    }

    fn encoding_mut(&mut self) -> &mut Attributes {
        DataArray::encoding_mut(self)
    }

    fn coordinate(&self, name: &str) -> Option<&Coordinate> {
        DataArray::coordinate(self, name)
    }

    fn coordinate_names(&self) -> Vec<String> {
        DataArray::coordinates(self).keys().cloned().collect()
    }

    fn insert_coordinate(&mut self, name: &str, coordinate: Coordinate) {
        DataArray::insert_coordinate(self, name, coordinate);
    }

    fn area(&self) -> Option<&dyn HasCrs> {
        DataArray::area(self)
    }

    fn rename_dimensions(&mut self, renames: &BTreeMap<String, String>) {
        DataArray::rename_dimensions(self, renames);
    }

    fn resolve_crs(&self) -> Result<Option<Crs>, MultipleCrsError> {
        Ok(discover_array_crs(self))
    }

    fn apply_grid_mapping(&mut self, name: &str, coordinate: Coordinate) {
        apply_grid_mapping_to_array(self, name, coordinate);
    }
}

impl GeoObject for Dataset {
    fn dims(&self) -> Vec<String> {
        Dataset::dims(self)
    }

    fn dimension_size(&self, dim: &str) -> Option<u64> {
        Dataset::dimension_size(self, dim)
    }

    fn attributes(&self) -> &Attributes {
        Dataset::attributes(self)
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        Dataset::attributes_mut(self)
    }

    fn encoding(&self) -> &Attributes {
        Dataset::encoding(self)
    }

    fn encoding_mut(&mut self) -> &mut Attributes {
        Dataset::encoding_mut(self)
    }

    fn coordinate(&self, name: &str) -> Option<&Coordinate> {
        Dataset::coordinate(self, name)
    }

    fn coordinate_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Dataset::coordinates(self).keys().cloned().collect();
        for variable in Dataset::variables(self).values() {
            for name in variable.coordinates().keys() {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    fn insert_coordinate(&mut self, name: &str, coordinate: Coordinate) {
        Dataset::insert_coordinate(self, name, coordinate);
    }

    fn area(&self) -> Option<&dyn HasCrs> {
        Dataset::area(self)
    }

    fn rename_dimensions(&mut self, renames: &BTreeMap<String, String>) {
        Dataset::rename_dimensions(self, renames);
    }

    fn resolve_crs(&self) -> Result<Option<Crs>, MultipleCrsError> {
        discover_dataset_crs(self)
    }

    fn apply_grid_mapping(&mut self, name: &str, coordinate: Coordinate) {
        apply_grid_mapping_to_dataset(self, name, coordinate);
    }
}

fn write_crs_into<T: GeoObject>(
    object: &mut T,
    input: CrsInput,
    name: &str,
) -> Result<(), WriteCrsError> {
    let crs = match input {
        CrsInput::Discovered => object.resolve_crs()?.ok_or(CrsNotFoundError)?,
        CrsInput::Crs(crs) => crs,
        CrsInput::Text(text) => Crs::from_user_input(&text)?,
    };
    object.apply_grid_mapping(name, grid_mapping_coordinate(&crs));
    Ok(())
}

fn write_gcps_into<T: GeoObject>(object: &mut T, geojson: &str) -> Result<(), GcpFormatError> {
    parse_gcps(geojson)?;
    object
        .attributes_mut()
        .insert(GCPS_KEY.to_string(), Value::String(geojson.to_string()));
    Ok(())
}

type NamedValues = (String, Vec<f64>);

fn spatial_values<T: GeoObject>(
    object: &T,
    dim_map: &DimMap,
) -> Result<(NamedValues, NamedValues), SpatialCoordsError> {
    let y_dim = dim_map
        .get(DimRole::Y)
        .ok_or(SpatialCoordsError::MissingDimension(DimRole::Y))?;
    let x_dim = dim_map
        .get(DimRole::X)
        .ok_or(SpatialCoordsError::MissingDimension(DimRole::X))?;
    let y_size = object
        .dimension_size(y_dim)
        .ok_or(SpatialCoordsError::MissingDimension(DimRole::Y))?;
    let x_size = object
        .dimension_size(x_dim)
        .ok_or(SpatialCoordsError::MissingDimension(DimRole::X))?;
    let (y, x) = spatial_coord_values(object.attributes(), y_size, x_size)?;
    Ok(((y_dim.to_string(), y), (x_dim.to_string(), x)))
}

fn attach_spatial_coords<T: GeoObject>(object: &mut T, y: NamedValues, x: NamedValues) {
    let (y_dim, y_values) = y;
    let (x_dim, x_values) = x;
    object.insert_coordinate(&y_dim, Coordinate::new(y_dim.clone(), y_values));
    object.insert_coordinate(&x_dim, Coordinate::new(x_dim.clone(), x_values));
}

/// The read-only geospatial accessor, obtained from `geo()`.
///
/// The dimension role map is inferred once at construction. Write
/// operations return a modified clone and leave the wrapped object
/// untouched; see [`GeoMut`] for the in place counterpart.
#[derive(Debug)]
pub struct Geo<'a, T> {
    object: &'a T,
    dim_map: DimMap,
}

impl<'a, T: GeoObject> Geo<'a, T> {
    pub(crate) fn new(object: &'a T) -> Self {
        let dim_map = DimMap::infer(&object.dims());
        Self { object, dim_map }
    }

    /// The dimension role map.
    #[must_use]
    pub const fn dim_map(&self) -> &DimMap {
        &self.dim_map
    }

    /// Assign a dimension role by hand.
    ///
    /// The assignment lives on this accessor only. The wrapped object is
    /// not modified; use [`Geo::write_dims`] to persist preferred names.
    ///
    /// # Errors
    /// Returns an [`UnknownDimensionError`] if the object has no dimension
    /// named `dim`.
    pub fn set_dim(&mut self, role: DimRole, dim: &str) -> Result<(), UnknownDimensionError> {
        let dims = self.object.dims();
        if !dims.iter().any(|existing| existing == dim) {
            return Err(UnknownDimensionError::new(dim, dims));
        }
        self.dim_map.assign(role, dim);
        Ok(())
    }

    /// The dimension names with preferred role names substituted.
    #[must_use]
    pub fn dims(&self) -> Vec<String> {
        self.dim_map.apply(&self.object.dims())
    }

    /// Dimension sizes keyed by the substituted names, in storage order.
    #[must_use]
    pub fn sizes(&self) -> Vec<(String, u64)> {
        let dims = self.object.dims();
        self.dim_map
            .apply(&dims)
            .into_iter()
            .zip(dims)
            .map(|(substituted, actual)| {
                (substituted, self.object.dimension_size(&actual).unwrap_or(0))
            })
            .collect()
    }

    /// The actual name of the dimension with the given role.
    #[must_use]
    pub fn dim_name(&self, role: DimRole) -> Option<&str> {
        self.dim_map.get(role)
    }

    /// The size of the dimension with the given role.
    #[must_use]
    pub fn size(&self, role: DimRole) -> Option<u64> {
        self.dim_map
            .get(role)
            .and_then(|dim| self.object.dimension_size(dim))
    }

    /// Resolve the CRS from the object's metadata.
    ///
    /// `Ok(None)` means no CRS information was found, which is not an
    /// error.
    ///
    /// # Errors
    /// Returns a [`MultipleCrsError`] if the object is a dataset whose
    /// variables carry differing CRS metadata.
    pub fn crs(&self) -> Result<Option<Crs>, MultipleCrsError> {
        self.object.resolve_crs()
    }

    /// The stored GCP GeoJSON text, exactly as written.
    #[must_use]
    pub fn gcps(&self) -> Option<&'a str> {
        gcps_text(self.object.attributes())
    }

    /// The stored GCPs parsed into values.
    ///
    /// # Errors
    /// Returns a [`GcpFormatError`] if the stored text is malformed.
    pub fn gcp_points(&self) -> Result<Option<Vec<GroundControlPoint>>, GcpFormatError> {
        self.gcps().map(parse_gcps).transpose()
    }

    /// The y and x coordinate values generated from the object's
    /// georeferencing tags.
    ///
    /// # Errors
    /// Returns a [`SpatialCoordsError`] if the object has no y or x
    /// dimension or no usable georeferencing metadata.
    pub fn spatial_coords(&self) -> Result<(Vec<f64>, Vec<f64>), SpatialCoordsError> {
        let ((_, y), (_, x)) = spatial_values(self.object, &self.dim_map)?;
        Ok((y, x))
    }

    /// Write CRS metadata as a grid mapping coordinate named
    /// [`DEFAULT_GRID_MAPPING_NAME`], returning the modified copy.
    ///
    /// The coordinate carries the decomposed CF parameters plus the WKT
    /// under `crs_wkt` and `spatial_ref`, the encoding gains a
    /// `grid_mapping` reference, and any stale `grid_mapping` attribute is
    /// removed. For a dataset this applies to every data variable.
    ///
    /// # Errors
    /// Returns a [`WriteCrsError`] if the input fails to parse, or if
    /// [`CrsInput::Discovered`] was asked for and no CRS is discoverable or
    /// the dataset's variables disagree.
    pub fn write_crs(&self, crs: impl Into<CrsInput>) -> Result<T, WriteCrsError>
    where
        T: Clone,
    {
        self.write_crs_with_name(crs, DEFAULT_GRID_MAPPING_NAME)
    }

    /// Write CRS metadata under a caller chosen coordinate name, returning
    /// the modified copy.
    ///
    /// # Errors
    /// As [`Geo::write_crs`].
    pub fn write_crs_with_name(
        &self,
        crs: impl Into<CrsInput>,
        name: &str,
    ) -> Result<T, WriteCrsError>
    where
        T: Clone,
    {
        let mut object = self.object.clone();
        write_crs_into(&mut object, crs.into(), name)?;
        Ok(object)
    }

    /// Rename dimensions to their preferred role names, returning the
    /// modified copy.
    ///
    /// # Errors
    /// Returns a [`RenameCollisionError`] if a rename would collide with an
    /// existing dimension or coordinate.
    pub fn write_dims(&self) -> Result<T, RenameCollisionError>
    where
        T: Clone,
    {
        let renames = self
            .dim_map
            .rename_plan(&self.object.dims(), &self.object.coordinate_names())?;
        let mut object = self.object.clone();
        object.rename_dimensions(&renames);
        Ok(object)
    }

    /// Validate GCP GeoJSON and store it byte for byte, returning the
    /// modified copy.
    ///
    /// # Errors
    /// Returns a [`GcpFormatError`] describing the first invalid feature.
    /// Nothing is stored on error.
    pub fn write_gcps(&self, geojson: &str) -> Result<T, GcpFormatError>
    where
        T: Clone,
    {
        let mut object = self.object.clone();
        write_gcps_into(&mut object, geojson)?;
        Ok(object)
    }

    /// Generate spatial coordinates and attach them under the actual y and
    /// x dimension names, returning the modified copy.
    ///
    /// # Errors
    /// As [`Geo::spatial_coords`].
    pub fn write_spatial_coords(&self) -> Result<T, SpatialCoordsError>
    where
        T: Clone,
    {
        let (y, x) = spatial_values(self.object, &self.dim_map)?;
        let mut object = self.object.clone();
        attach_spatial_coords(&mut object, y, x);
        Ok(object)
    }
}

/// The in place geospatial accessor, obtained from `geo_mut()`.
///
/// Shares the read operations of [`Geo`]; write operations modify the
/// wrapped object directly.
#[derive(Debug)]
pub struct GeoMut<'a, T> {
    object: &'a mut T,
    dim_map: DimMap,
}

impl<'a, T: GeoObject> GeoMut<'a, T> {
    pub(crate) fn new(object: &'a mut T) -> Self {
        let dim_map = DimMap::infer(&object.dims());
        Self { object, dim_map }
    }

    /// The dimension role map.
    #[must_use]
    pub const fn dim_map(&self) -> &DimMap {
        &self.dim_map
    }

    /// Assign a dimension role by hand.
    ///
    /// # Errors
    /// Returns an [`UnknownDimensionError`] if the object has no dimension
    /// named `dim`.
    pub fn set_dim(&mut self, role: DimRole, dim: &str) -> Result<(), UnknownDimensionError> {
        let dims = self.object.dims();
        if !dims.iter().any(|existing| existing == dim) {
            return Err(UnknownDimensionError::new(dim, dims));
        }
        self.dim_map.assign(role, dim);
        Ok(())
    }

    /// The dimension names with preferred role names substituted.
    #[must_use]
    pub fn dims(&self) -> Vec<String> {
        self.dim_map.apply(&self.object.dims())
    }

    /// The actual name of the dimension with the given role.
    #[must_use]
    pub fn dim_name(&self, role: DimRole) -> Option<&str> {
        self.dim_map.get(role)
    }

    /// The size of the dimension with the given role.
    #[must_use]
    pub fn size(&self, role: DimRole) -> Option<u64> {
        self.dim_map
            .get(role)
            .and_then(|dim| self.object.dimension_size(dim))
    }

    /// Resolve the CRS from the object's metadata.
    ///
    /// # Errors
    /// Returns a [`MultipleCrsError`] if the object is a dataset whose
    /// variables carry differing CRS metadata.
    pub fn crs(&self) -> Result<Option<Crs>, MultipleCrsError> {
        self.object.resolve_crs()
    }

    /// The stored GCP GeoJSON text, exactly as written.
    #[must_use]
    pub fn gcps(&self) -> Option<&str> {
        gcps_text(self.object.attributes())
    }

    /// Write CRS metadata as a grid mapping coordinate named
    /// [`DEFAULT_GRID_MAPPING_NAME`].
    ///
    /// # Errors
    /// As [`Geo::write_crs`].
    pub fn write_crs(&mut self, crs: impl Into<CrsInput>) -> Result<(), WriteCrsError> {
        self.write_crs_with_name(crs, DEFAULT_GRID_MAPPING_NAME)
    }

    /// Write CRS metadata under a caller chosen coordinate name.
    ///
    /// # Errors
    /// As [`Geo::write_crs`].
    pub fn write_crs_with_name(
        &mut self,
        crs: impl Into<CrsInput>,
        name: &str,
    ) -> Result<(), WriteCrsError> {
        write_crs_into(self.object, crs.into(), name)
    }

    /// Rename dimensions to their preferred role names.
    ///
    /// The role map is re-inferred afterwards so the accessor keeps
    /// tracking the renamed dimensions.
    ///
    /// # Errors
    /// Returns a [`RenameCollisionError`] if a rename would collide with an
    /// existing dimension or coordinate. The object is untouched on error.
    pub fn write_dims(&mut self) -> Result<(), RenameCollisionError> {
        let renames = self
            .dim_map
            .rename_plan(&self.object.dims(), &self.object.coordinate_names())?;
        self.object.rename_dimensions(&renames);
        self.dim_map = DimMap::infer(&self.object.dims());
        Ok(())
    }

    /// Validate GCP GeoJSON and store it byte for byte.
    ///
    /// # Errors
    /// Returns a [`GcpFormatError`] describing the first invalid feature.
    /// Nothing is stored on error.
    pub fn write_gcps(&mut self, geojson: &str) -> Result<(), GcpFormatError> {
        write_gcps_into(self.object, geojson)
    }

    /// Generate spatial coordinates and attach them under the actual y and
    /// x dimension names.
    ///
    /// # Errors
    /// As [`Geo::spatial_coords`].
    pub fn write_spatial_coords(&mut self) -> Result<(), SpatialCoordsError> {
        let (y, x) = spatial_values(self.object, &self.dim_map)?;
        attach_spatial_coords(self.object, y, x);
        Ok(())
    }
}

impl DataArray {
    /// The geospatial accessor.
    #[must_use]
    pub fn geo(&self) -> Geo<'_, Self> {
        Geo::new(self)
    }

    /// The in place geospatial accessor.
    #[must_use]
    pub fn geo_mut(&mut self) -> GeoMut<'_, Self> {
        GeoMut::new(self)
    }
}

impl Dataset {
    /// The geospatial accessor.
    #[must_use]
    pub fn geo(&self) -> Geo<'_, Self> {
        Geo::new(self)
    }

    /// The in place geospatial accessor.
    #[must_use]
    pub fn geo_mut(&mut self) -> GeoMut<'_, Self> {
        GeoMut::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dims_substitute_roles() {
        let array = DataArray::new(["lats", "lons"], [4, 6]).unwrap();
        let geo = array.geo();
        assert_eq!(geo.dims(), ["y", "x"]);
        assert_eq!(geo.dim_name(DimRole::Y), Some("lats"));
        assert_eq!(
            geo.sizes(),
            vec![("y".to_string(), 4), ("x".to_string(), 6)]
        );
        assert_eq!(geo.size(DimRole::X), Some(6));
    }

    #[test]
    fn set_dim_unknown_dimension() {
        let array = DataArray::new(["y", "x"], [4, 6]).unwrap();
        let mut geo = array.geo();
        let error = geo.set_dim(DimRole::Vertical, "bands").unwrap_err();
        assert_eq!(
            error.to_string(),
            "\"bands\" is not a dimension of this object (dimensions: [\"y\", \"x\"])"
        );
    }

    #[test]
    fn write_crs_returns_a_copy() {
        let array = DataArray::new(["y", "x"], [4, 6]).unwrap();
        let written = array.geo().write_crs("EPSG:4326").unwrap();
        assert!(array.geo().crs().unwrap().is_none());
        let crs = written.geo().crs().unwrap().unwrap();
        assert_eq!(crs.to_epsg(), Some(4326));
        assert_eq!(
            written.encoding().get(crate::grid_mapping::GRID_MAPPING_KEY),
            Some(&Value::String(DEFAULT_GRID_MAPPING_NAME.to_string()))
        );
    }

    #[test]
    fn write_crs_discovered_without_crs() {
        let array = DataArray::new(["y", "x"], [4, 6]).unwrap();
        assert!(matches!(
            array.geo().write_crs(CrsInput::Discovered),
            Err(WriteCrsError::NotFound(_))
        ));
    }

    #[test]
    fn geo_mut_writes_in_place() {
        let mut array = DataArray::new(["lats", "lons"], [4, 6]).unwrap();
        array.geo_mut().write_crs("EPSG:4326").unwrap();
        array.geo_mut().write_dims().unwrap();
        assert_eq!(DataArray::dims(&array), ["y", "x"]);
        assert!(array.geo().crs().unwrap().is_some());
    }

    #[test]
    fn gcps_round_trip_is_byte_stable() {
        let geojson = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"id": "1", "row": 0.0, "col": 0.0},
             "geometry": {"type": "Point", "coordinates": [0.25, 51.5]}}]}"#;
        let array = DataArray::new(["y", "x"], [4, 6]).unwrap();
        let written = array.geo().write_gcps(geojson).unwrap();
        assert_eq!(written.geo().gcps(), Some(geojson));
        let points = written.geo().gcp_points().unwrap().unwrap();
        assert_eq!(points[0].longitude, 0.25);
    }

    #[test]
    fn write_gcps_rejects_invalid_without_storing() {
        let mut array = DataArray::new(["y", "x"], [4, 6]).unwrap();
        let error = array.geo_mut().write_gcps(r#"{"type": "nope"}"#).unwrap_err();
        assert!(matches!(error, GcpFormatError::NotFeatureCollection));
        assert!(array.geo().gcps().is_none());
    }
}
