//! `geoarray` is a Rust library of geospatial metadata accessors for labelled N-dimensional arrays.
//!
//! It brings the georeferencing conventions of the Python geoscience stack
//! ([CF](https://cfconventions.org/), [rioxarray](https://corteva.github.io/rioxarray/),
//! GDAL) to array metadata handled in Rust:
//! - dimension role inference: recognising which dimensions are x, y, vertical, and time
//!   from their names, with explicit overrides,
//! - CRS resolution from grid mapping coordinates, area definitions, and legacy attributes,
//!   and CRS writing as CF grid mappings with `crs_wkt` and `spatial_ref` WKT,
//! - ground control points stored as GeoJSON, validated on write and byte stable on read, and
//! - spatial coordinate generation from GeoTIFF style georeferencing tags.
//!
//! Arrays are represented by their metadata alone ([`DataArray`], [`Dataset`]); the array
//! values live in whatever container the caller uses. The accessor obtained from
//! [`DataArray::geo`] or [`Dataset::geo`] never caches: every call re-reads the metadata
//! it operates on.
//!
//! CRS support itself (WKT, PROJ strings, CF attributes, EPSG codes) lives in the
//! [`geoarray_crs`] crate, re-exported here as [`crs`](mod@crs).
//!
//! ## Examples
//! ### Infer dimension roles and write a CRS
//! ```rust
//! use geoarray::{DataArray, DimRole};
//!
//! let array = DataArray::new(["lats", "lons"], [512, 1024])?;
//!
//! // Dimension roles are inferred from the names.
//! let geo = array.geo();
//! assert_eq!(geo.dims(), ["y", "x"]);
//! assert_eq!(geo.size(DimRole::X), Some(1024));
//!
//! // Write a CRS as a CF grid mapping coordinate named "spatial_ref".
//! let array = geo.write_crs("EPSG:4326")?;
//! let crs = array.geo().crs()?.expect("the CRS was just written");
//! assert!(crs.is_geographic());
//! assert_eq!(crs.name(), "WGS 84");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Licence
//! `geoarray` is licensed under either of
//!  - the Apache License, Version 2.0 [LICENSE-APACHE](https://docs.rs/crate/geoarray/latest/source/LICENCE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license [LICENSE-MIT](https://docs.rs/crate/geoarray/latest/source/LICENCE-MIT) or <http://opensource.org/licenses/MIT>, at your option.
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted for inclusion in the work by you, as defined in the Apache-2.0 license, shall be dual licensed as above, without any additional terms or conditions.

pub mod accessor;
pub mod array;
pub mod coords;
pub mod dataset;
pub mod dims;
pub mod gcps;
pub mod grid_mapping;

pub use geoarray_crs as crs;

pub use crate::accessor::{Geo, GeoMut, GeoObject};
pub use crate::array::{Attributes, Coordinate, DataArray, DataArrayCreateError};
pub use crate::coords::SpatialCoordsError;
pub use crate::dataset::{Dataset, DimensionConflictError};
pub use crate::dims::{
    DimMap, DimRole, DimRoleParseError, RenameCollisionError, UnknownDimensionError,
};
pub use crate::gcps::{GcpFormatError, GroundControlPoint};
pub use crate::grid_mapping::{
    CrsInput, CrsNotFoundError, HasCrs, MultipleCrsError, WriteCrsError,
};

pub use geoarray_crs::Crs;
