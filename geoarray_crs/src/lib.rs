//! Coordinate reference system (CRS) metadata support for the [`geoarray`](https://docs.rs/geoarray/latest/geoarray/index.html) crate.
//!
//! A [`Crs`] describes the coordinate reference system of a gridded
//! geospatial product: a geographic or projected system with its datum,
//! prime meridian, and projection parameters. It is descriptive metadata
//! only. No coordinate transformation is performed.
//!
//! Conversions cover the forms CRS metadata takes in practice:
//! - CF convention grid mapping attributes ([`Crs::from_cf`] / [`Crs::to_cf`]).
//! - Single line WKT2:2019, plus reading the common WKT1 subset
//!   ([`Crs::from_wkt`] / [`Crs::to_wkt`]).
//! - PROJ strings ([`Crs::from_proj_string`] / [`Crs::to_proj_string`]).
//! - A built-in registry of common EPSG codes ([`Crs::from_epsg`]).
//!
//! [`Crs::from_user_input`] dispatches between these forms on the shape of
//! the input.
//!
//! Reading is deliberately lenient where the conventions are lenient:
//! metadata without a named datum or ellipsoid still yields a usable [`Crs`]
//! with `"unknown"` names, matching how such files are produced in the wild.

mod cf;
mod crs;
mod ellipsoid;
mod epsg;
mod method;
mod proj;
mod wkt;

pub use cf::CfReadError;
pub use crs::{Authority, Axis, AxisDirection, Crs, CrsParseError};
pub use ellipsoid::{Datum, Ellipsoid, PrimeMeridian};
pub use epsg::UnknownEpsgCodeError;
pub use method::{ParamValue, Projection, ProjectionMethod};
pub use proj::{ProjStringParseError, UnsupportedProjectionError};
pub use wkt::WktParseError;
