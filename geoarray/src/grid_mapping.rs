//! CF grid mapping discovery and writing.
//!
//! A grid mapping is a scalar coordinate whose attributes describe a CRS,
//! referenced from a data variable through the `grid_mapping` attribute of
//! its encoding or attribute map. This module resolves a [`Crs`] from such
//! metadata and builds the coordinate written back out.

use derive_more::derive::From;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use geoarray_crs::{Crs, CrsParseError};

use crate::array::{Attributes, Coordinate, DataArray};
use crate::dataset::Dataset;

/// The attribute and encoding key referencing a grid mapping coordinate.
pub const GRID_MAPPING_KEY: &str = "grid_mapping";

/// The grid mapping attribute holding the CRS as WKT, preferred on read.
pub const CRS_WKT_KEY: &str = "crs_wkt";

/// The GDAL flavoured grid mapping attribute holding the CRS as WKT.
pub const SPATIAL_REF_KEY: &str = "spatial_ref";

/// The legacy attribute holding a CRS in any text form.
pub const CRS_ATTRIBUTE_KEY: &str = "crs";

/// The coordinate name used for written grid mappings, and looked up when
/// no `grid_mapping` reference names one explicitly.
pub const DEFAULT_GRID_MAPPING_NAME: &str = "spatial_ref";

/// A source of CRS information attached to an object out of band, such as
/// an area definition from a resampling library.
pub trait HasCrs: Send + Sync {
    /// The CRS, if the source has one.
    fn crs(&self) -> Option<Crs>;
}

/// The error raised when a CRS write is asked to reuse the CRS already in
/// the object's metadata and none is discoverable.
#[derive(Debug, Error)]
#[error("no CRS information found in the object's metadata")]
pub struct CrsNotFoundError;

/// The error raised when the variables of a dataset carry differing CRS
/// metadata.
#[derive(Debug, Error)]
#[error("variables {first_variable:?} and {second_variable:?} have different CRS metadata")]
pub struct MultipleCrsError {
    first_variable: String,
    second_variable: String,
}

impl MultipleCrsError {
    /// The first variable of the disagreeing pair.
    #[must_use]
    pub fn first_variable(&self) -> &str {
        &self.first_variable
    }

    /// The second variable of the disagreeing pair.
    #[must_use]
    pub fn second_variable(&self) -> &str {
        &self.second_variable
    }
}

/// An error writing CRS metadata.
#[derive(Debug, Error)]
pub enum WriteCrsError {
    /// No CRS was supplied and none is discoverable in the metadata.
    #[error(transparent)]
    NotFound(#[from] CrsNotFoundError),
    /// The dataset's variables carry differing CRS metadata.
    #[error(transparent)]
    MultipleCrs(#[from] MultipleCrsError),
    /// The supplied CRS text failed to parse.
    #[error(transparent)]
    Parse(#[from] CrsParseError),
}

/// The CRS input accepted by the write operations.
#[derive(Debug, Clone, From)]
pub enum CrsInput {
    /// Reuse the CRS already discoverable in the object's metadata.
    Discovered,
    /// A CRS value.
    Crs(Crs),
    /// Any text form accepted by [`Crs::from_user_input`].
    Text(String),
}

impl From<&Crs> for CrsInput {
    fn from(crs: &Crs) -> Self {
        Self::Crs(crs.clone())
    }
}

impl From<&str> for CrsInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Resolve a CRS from one object's metadata.
///
/// The sources are tried in priority order:
/// 1. A grid mapping coordinate, named by `grid_mapping` in the encoding or
///    attribute map, or found under [`DEFAULT_GRID_MAPPING_NAME`] when
///    nothing names one.
/// 2. The attached area definition.
/// 3. The legacy `crs` attribute.
///
/// Unusable metadata is logged and skipped rather than raised, so a
/// malformed source falls through to the next one.
pub(crate) fn discover_crs<'a, F>(
    attrs: &Attributes,
    encoding: &Attributes,
    lookup: F,
    area: Option<&dyn HasCrs>,
) -> Option<Crs>
where
    F: Fn(&str) -> Option<&'a Coordinate>,
{
    if let Some(crs) = grid_mapping_crs(attrs, encoding, &lookup) {
        return Some(crs);
    }
    if let Some(crs) = area.and_then(HasCrs::crs) {
        debug!("using the CRS of the attached area definition");
        return Some(crs);
    }
    if let Some(crs) = attrs.get(CRS_ATTRIBUTE_KEY).and_then(legacy_crs) {
        return Some(crs);
    }
    None
}

fn grid_mapping_crs<'a, F>(attrs: &Attributes, encoding: &Attributes, lookup: &F) -> Option<Crs>
where
    F: Fn(&str) -> Option<&'a Coordinate>,
{
    let referenced = encoding
        .get(GRID_MAPPING_KEY)
        .or_else(|| attrs.get(GRID_MAPPING_KEY))
        .and_then(Value::as_str);
    let name = referenced.unwrap_or(DEFAULT_GRID_MAPPING_NAME);
    let Some(coordinate) = lookup(name) else {
        if let Some(name) = referenced {
            warn!("grid_mapping references {name:?} but no such coordinate exists, trying other CRS sources");
        }
        return None;
    };
    coordinate_crs(coordinate.attributes(), name)
}

/// Read a CRS out of a grid mapping coordinate's attributes, preferring the
/// WKT forms over the decomposed CF parameters.
fn coordinate_crs(attrs: &Attributes, name: &str) -> Option<Crs> {
    for key in [CRS_WKT_KEY, SPATIAL_REF_KEY] {
        if let Some(wkt) = attrs.get(key).and_then(Value::as_str) {
            match Crs::from_wkt(wkt) {
                Ok(crs) => return Some(crs),
                Err(error) => {
                    warn!("ignoring unparseable {key} on grid mapping {name:?}: {error}");
                }
            }
        }
    }
    match Crs::from_cf(attrs) {
        Ok(crs) => Some(crs),
        Err(error) => {
            warn!("ignoring unusable grid mapping {name:?}: {error}");
            None
        }
    }
}

fn legacy_crs(value: &Value) -> Option<Crs> {
    let text = value.as_str()?;
    match Crs::from_user_input(text) {
        Ok(crs) => Some(crs),
        Err(error) => {
            warn!("ignoring unparseable crs attribute: {error}");
            None
        }
    }
}

pub(crate) fn discover_array_crs(array: &DataArray) -> Option<Crs> {
    discover_crs(
        array.attributes(),
        array.encoding(),
        |name| array.coordinate(name),
        array.area(),
    )
}

/// Resolve a single CRS for a dataset.
///
/// Every variable resolves independently, with dataset level coordinates
/// and the dataset area as fallbacks. All variables that resolve must agree.
/// When none resolves, the dataset's own metadata is tried.
pub(crate) fn discover_dataset_crs(dataset: &Dataset) -> Result<Option<Crs>, MultipleCrsError> {
    let mut found: Option<(&String, Crs)> = None;
    for (name, variable) in dataset.variables() {
        let lookup = |coordinate: &str| {
            variable
                .coordinate(coordinate)
                .or_else(|| dataset.coordinate(coordinate))
        };
        let area = variable.area().or_else(|| dataset.area());
        let Some(crs) = discover_crs(variable.attributes(), variable.encoding(), lookup, area)
        else {
            continue;
        };
        match &found {
            None => found = Some((name, crs)),
            Some((first, existing)) => {
                if *existing != crs {
                    return Err(MultipleCrsError {
                        first_variable: (*first).clone(),
                        second_variable: name.clone(),
                    });
                }
            }
        }
    }
    if let Some((_, crs)) = found {
        return Ok(Some(crs));
    }
    Ok(discover_crs(
        dataset.attributes(),
        dataset.encoding(),
        |name| dataset.coordinate(name),
        dataset.area(),
    ))
}

/// Build a scalar grid mapping coordinate describing `crs`.
///
/// The attributes are the decomposed CF parameters followed by the full WKT
/// under both `crs_wkt` and `spatial_ref`, so CF aware and GDAL aware
/// readers both find what they expect.
pub(crate) fn grid_mapping_coordinate(crs: &Crs) -> Coordinate {
    let mut attrs = crs.to_cf();
    let wkt = crs.to_wkt();
    attrs.insert(CRS_WKT_KEY.to_string(), Value::String(wkt.clone()));
    attrs.insert(SPATIAL_REF_KEY.to_string(), Value::String(wkt));
    Coordinate::scalar().with_attributes(attrs)
}

pub(crate) fn apply_grid_mapping_to_array(array: &mut DataArray, name: &str, coordinate: Coordinate) {
    array.insert_coordinate(name, coordinate);
    array
        .encoding_mut()
        .insert(GRID_MAPPING_KEY.to_string(), Value::String(name.to_string()));
    array.attributes_mut().remove(GRID_MAPPING_KEY);
}

pub(crate) fn apply_grid_mapping_to_dataset(
    dataset: &mut Dataset,
    name: &str,
    coordinate: Coordinate,
) {
    dataset.insert_coordinate(name, coordinate);
    dataset
        .encoding_mut()
        .insert(GRID_MAPPING_KEY.to_string(), Value::String(name.to_string()));
    dataset.attributes_mut().remove(GRID_MAPPING_KEY);
    for variable in dataset.variables_mut().values_mut() {
        variable
            .encoding_mut()
            .insert(GRID_MAPPING_KEY.to_string(), Value::String(name.to_string()));
        variable.attributes_mut().remove(GRID_MAPPING_KEY);
    }
}
