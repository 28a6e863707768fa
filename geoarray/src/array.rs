//! Labelled N-dimensional data arrays and their coordinates.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::grid_mapping::HasCrs;

/// An ordered map of metadata attributes.
///
/// Keys keep their insertion order, matching how attributes are laid out in
/// the files they were read from or will be written to.
pub type Attributes = serde_json::Map<String, Value>;

/// A coordinate variable: metadata, and optionally values, attached to an
/// object under a name.
///
/// A scalar coordinate spans no dimensions and carries pure metadata. CF
/// grid mappings are stored this way.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Coordinate {
    dims: Vec<String>,
    values: Option<Vec<f64>>,
    attrs: Attributes,
}

impl Coordinate {
    /// Create a scalar coordinate.
    #[must_use]
    pub fn scalar() -> Self {
        Self::default()
    }

    /// Create a one dimensional coordinate over `dim` with the given values.
    #[must_use]
    pub fn new(dim: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            dims: vec![dim.into()],
            values: Some(values),
            attrs: Attributes::default(),
        }
    }

    /// Set the attributes of the coordinate.
    #[must_use]
    pub fn with_attributes(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    /// The dimensions the coordinate spans.
    #[must_use]
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    /// The coordinate values, if it has any.
    #[must_use]
    pub fn values(&self) -> Option<&[f64]> {
        self.values.as_deref()
    }

    /// The attributes of the coordinate.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attrs
    }

    /// The attributes of the coordinate, mutably.
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attrs
    }

    pub(crate) fn rename_dimensions(&mut self, renames: &BTreeMap<String, String>) {
        for dim in &mut self.dims {
            if let Some(renamed) = renames.get(dim) {
                *dim = renamed.clone();
            }
        }
    }
}

/// Rename coordinates in place, applying `renames` to both the coordinate
/// keys and the dimensions each coordinate spans.
pub(crate) fn rename_coordinates(
    coords: &mut BTreeMap<String, Coordinate>,
    renames: &BTreeMap<String, String>,
) {
    let renamed = std::mem::take(coords);
    *coords = renamed
        .into_iter()
        .map(|(name, mut coordinate)| {
            coordinate.rename_dimensions(renames);
            (renames.get(&name).cloned().unwrap_or(name), coordinate)
        })
        .collect();
}

/// An error creating a [`DataArray`].
#[derive(Debug, Error)]
pub enum DataArrayCreateError {
    /// The number of dimension names differs from the number of dimensions.
    #[error("got {names} dimension names for a shape of {dims} dimensions")]
    DimensionCountMismatch {
        /// The number of dimension names supplied.
        names: usize,
        /// The number of dimensions of the shape.
        dims: usize,
    },
    /// A dimension name appears more than once.
    #[error("duplicate dimension name {_0:?}")]
    DuplicateDimensionName(String),
}

/// A labelled N-dimensional data array.
///
/// Holds the geospatial metadata of an array: named dimensions and their
/// sizes, an attribute map, an encoding map, coordinates, and an optional
/// out of band area definition. The array values themselves live elsewhere
/// and are not represented here.
///
/// Use [`DataArray::geo`] or [`DataArray::geo_mut`] to obtain the
/// geospatial accessor.
#[derive(Clone)]
pub struct DataArray {
    name: Option<String>,
    dims: Vec<String>,
    shape: Vec<u64>,
    attrs: Attributes,
    encoding: Attributes,
    coords: BTreeMap<String, Coordinate>,
    area: Option<Arc<dyn HasCrs>>,
}

impl core::fmt::Debug for DataArray {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DataArray")
            .field("name", &self.name)
            .field("dims", &self.dims)
            .field("shape", &self.shape)
            .field("attrs", &self.attrs)
            .field("encoding", &self.encoding)
            .field("coords", &self.coords)
            .field("area", &self.area.as_ref().map(|_| ".."))
            .finish()
    }
}

impl DataArray {
    /// Create a data array from dimension names and a matching shape.
    ///
    /// # Errors
    /// Returns a [`DataArrayCreateError`] if the number of names differs
    /// from the number of dimensions or a name repeats.
    pub fn new<I, S>(dims: I, shape: S) -> Result<Self, DataArrayCreateError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        S: IntoIterator<Item = u64>,
    {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        let shape: Vec<u64> = shape.into_iter().collect();
        if dims.len() != shape.len() {
            return Err(DataArrayCreateError::DimensionCountMismatch {
                names: dims.len(),
                dims: shape.len(),
            });
        }
        for (index, dim) in dims.iter().enumerate() {
            if dims[..index].contains(dim) {
                return Err(DataArrayCreateError::DuplicateDimensionName(dim.clone()));
            }
        }
        Ok(Self {
            name: None,
            dims,
            shape,
            attrs: Attributes::default(),
            encoding: Attributes::default(),
            coords: BTreeMap::new(),
            area: None,
        })
    }

    /// Set the array name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the attributes.
    #[must_use]
    pub fn with_attributes(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    /// Set the encoding map.
    #[must_use]
    pub fn with_encoding(mut self, encoding: Attributes) -> Self {
        self.encoding = encoding;
        self
    }

    /// Attach an out of band area definition.
    #[must_use]
    pub fn with_area(mut self, area: Arc<dyn HasCrs>) -> Self {
        self.area = Some(area);
        self
    }

    /// The array name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The dimension names in storage order.
    #[must_use]
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    /// The dimension sizes in storage order.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// The size of the named dimension.
    #[must_use]
    pub fn dimension_size(&self, dim: &str) -> Option<u64> {
        self.dims
            .iter()
            .position(|name| name == dim)
            .map(|index| self.shape[index])
    }

    /// The attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attrs
    }

    /// The attributes, mutably.
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attrs
    }

    /// The encoding map.
    ///
    /// Encoding holds metadata consumed by the storage layer rather than
    /// written as plain attributes, such as the `grid_mapping` reference.
    #[must_use]
    pub const fn encoding(&self) -> &Attributes {
        &self.encoding
    }

    /// The encoding map, mutably.
    pub fn encoding_mut(&mut self) -> &mut Attributes {
        &mut self.encoding
    }

    /// The coordinates, keyed by name.
    #[must_use]
    pub const fn coordinates(&self) -> &BTreeMap<String, Coordinate> {
        &self.coords
    }

    /// The named coordinate.
    #[must_use]
    pub fn coordinate(&self, name: &str) -> Option<&Coordinate> {
        self.coords.get(name)
    }

    /// Attach a coordinate, replacing any existing coordinate of the same
    /// name.
    pub fn insert_coordinate(&mut self, name: impl Into<String>, coordinate: Coordinate) {
        self.coords.insert(name.into(), coordinate);
    }

    /// The attached area definition.
    #[must_use]
    pub fn area(&self) -> Option<&dyn HasCrs> {
        self.area.as_deref()
    }

    pub(crate) fn rename_dimensions(&mut self, renames: &BTreeMap<String, String>) {
        for dim in &mut self.dims {
            if let Some(renamed) = renames.get(dim) {
                *dim = renamed.clone();
            }
        }
        rename_coordinates(&mut self.coords, renames);
    }
}
