//! Datasets: named collections of data arrays sharing dimensions.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::array::{rename_coordinates, Attributes, Coordinate, DataArray};
use crate::grid_mapping::HasCrs;

/// The error raised when an inserted variable's dimension sizes conflict
/// with the dataset.
#[derive(Debug, Error)]
#[error("dimension {dim:?} has size {existing} in the dataset but size {incoming} in the inserted variable")]
pub struct DimensionConflictError {
    dim: String,
    existing: u64,
    incoming: u64,
}

/// A collection of named data arrays with shared dimensions, coordinates,
/// and dataset level metadata.
///
/// Use [`Dataset::geo`] or [`Dataset::geo_mut`] to obtain the geospatial
/// accessor.
#[derive(Clone, Default)]
pub struct Dataset {
    data_vars: BTreeMap<String, DataArray>,
    coords: BTreeMap<String, Coordinate>,
    attrs: Attributes,
    encoding: Attributes,
    area: Option<Arc<dyn HasCrs>>,
}

impl core::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dataset")
            .field("data_vars", &self.data_vars)
            .field("coords", &self.coords)
            .field("attrs", &self.attrs)
            .field("encoding", &self.encoding)
            .field("area", &self.area.as_ref().map(|_| ".."))
            .finish()
    }
}

impl Dataset {
    /// Create an empty dataset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dataset attributes.
    #[must_use]
    pub fn with_attributes(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    /// Attach an out of band area definition.
    #[must_use]
    pub fn with_area(mut self, area: Arc<dyn HasCrs>) -> Self {
        self.area = Some(area);
        self
    }

    /// Insert a data variable, replacing any existing variable of the same
    /// name.
    ///
    /// # Errors
    /// Returns a [`DimensionConflictError`] if one of the variable's
    /// dimensions already exists in the dataset with a different size.
    pub fn insert_variable(
        &mut self,
        name: impl Into<String>,
        variable: DataArray,
    ) -> Result<(), DimensionConflictError> {
        for (dim, size) in variable.dims().iter().zip(variable.shape()) {
            if let Some(existing) = self.dimension_size(dim) {
                if existing != *size {
                    return Err(DimensionConflictError {
                        dim: dim.clone(),
                        existing,
                        incoming: *size,
                    });
                }
            }
        }
        self.data_vars.insert(name.into(), variable);
        Ok(())
    }

    /// The data variables, keyed by name.
    #[must_use]
    pub const fn variables(&self) -> &BTreeMap<String, DataArray> {
        &self.data_vars
    }

    pub(crate) fn variables_mut(&mut self) -> &mut BTreeMap<String, DataArray> {
        &mut self.data_vars
    }

    /// The named data variable.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&DataArray> {
        self.data_vars.get(name)
    }

    /// The dataset level coordinates, keyed by name.
    #[must_use]
    pub const fn coordinates(&self) -> &BTreeMap<String, Coordinate> {
        &self.coords
    }

    /// The named dataset level coordinate.
    #[must_use]
    pub fn coordinate(&self, name: &str) -> Option<&Coordinate> {
        self.coords.get(name)
    }

    /// Attach a dataset level coordinate, replacing any existing coordinate
    /// of the same name.
    pub fn insert_coordinate(&mut self, name: impl Into<String>, coordinate: Coordinate) {
        self.coords.insert(name.into(), coordinate);
    }

    /// The union of the dimensions of all variables and coordinates, in
    /// first appearance order.
    #[must_use]
    pub fn dims(&self) -> Vec<String> {
        let mut dims: Vec<String> = Vec::new();
        for variable in self.data_vars.values() {
            for dim in variable.dims() {
                if !dims.contains(dim) {
                    dims.push(dim.clone());
                }
            }
        }
        for coordinate in self.coords.values() {
            for dim in coordinate.dims() {
                if !dims.contains(dim) {
                    dims.push(dim.clone());
                }
            }
        }
        dims
    }

    /// The size of the named dimension.
    #[must_use]
    pub fn dimension_size(&self, dim: &str) -> Option<u64> {
        for variable in self.data_vars.values() {
            if let Some(size) = variable.dimension_size(dim) {
                return Some(size);
            }
        }
        for coordinate in self.coords.values() {
            if coordinate.dims().len() == 1 && coordinate.dims()[0] == dim {
                if let Some(values) = coordinate.values() {
                    return Some(values.len() as u64);
                }
            }
        }
        None
    }

    /// The dataset attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attrs
    }

    /// The dataset attributes, mutably.
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attrs
    }

    /// The dataset encoding map.
    #[must_use]
    pub const fn encoding(&self) -> &Attributes {
        &self.encoding
    }

    /// The dataset encoding map, mutably.
    pub fn encoding_mut(&mut self) -> &mut Attributes {
        &mut self.encoding
    }

    /// The attached area definition.
    #[must_use]
    pub fn area(&self) -> Option<&dyn HasCrs> {
        self.area.as_deref()
    }

    pub(crate) fn rename_dimensions(&mut self, renames: &BTreeMap<String, String>) {
        for variable in self.data_vars.values_mut() {
            variable.rename_dimensions(renames);
        }
        rename_coordinates(&mut self.coords, renames);
    }
}
