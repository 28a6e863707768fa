//! The core CRS type and its conversions.

use derive_more::derive::Display;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::cf::{crs_from_cf, crs_to_cf, CfReadError};
use crate::ellipsoid::{Datum, Ellipsoid, PrimeMeridian};
use crate::epsg::{crs_from_epsg, UnknownEpsgCodeError};
use crate::method::Projection;
use crate::proj::{
    crs_from_proj_string, crs_to_proj_string, ProjStringParseError, UnsupportedProjectionError,
};
use crate::wkt::{crs_from_wkt, crs_to_wkt, WktParseError};

/// An error parsing a CRS from user input.
#[derive(Debug, Error)]
pub enum CrsParseError {
    /// The input is not in any recognised form.
    #[error("unrecognised CRS input {_0:?}, expected an EPSG code, WKT, or a PROJ string")]
    UnrecognisedFormat(String),
    /// An `EPSG:` input with a non-numeric code.
    #[error("invalid EPSG code in {_0:?}")]
    InvalidEpsgCode(String),
    /// Invalid WKT input.
    #[error(transparent)]
    Wkt(#[from] WktParseError),
    /// An invalid PROJ string.
    #[error(transparent)]
    Proj(#[from] ProjStringParseError),
    /// Invalid CF grid mapping attributes.
    #[error(transparent)]
    Cf(#[from] CfReadError),
    /// An EPSG code outside the built-in registry.
    #[error(transparent)]
    Epsg(#[from] UnknownEpsgCodeError),
}

/// An authority reference for a CRS, such as `EPSG:4326`.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{name}:{code}")]
pub struct Authority {
    name: String,
    code: u32,
}

impl Authority {
    /// Create an authority reference.
    #[must_use]
    pub fn new(name: impl Into<String>, code: u32) -> Self {
        Self {
            name: name.into(),
            code,
        }
    }

    /// The authority name, such as `"EPSG"`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The code within the authority.
    #[must_use]
    pub const fn code(&self) -> u32 {
        self.code
    }
}

/// The direction of increasing coordinate values along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AxisDirection {
    /// Towards the north pole.
    #[display("north")]
    North,
    /// Towards the south pole.
    #[display("south")]
    South,
    /// Eastwards.
    #[display("east")]
    East,
    /// Westwards.
    #[display("west")]
    West,
}

/// One axis of a coordinate system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Axis {
    name: &'static str,
    direction: AxisDirection,
    unit: &'static str,
}

impl Axis {
    /// The axis name, such as `"easting"` or `"geodetic latitude"`.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name
    }

    /// The direction of increasing values.
    #[must_use]
    pub const fn direction(&self) -> AxisDirection {
        self.direction
    }

    /// The axis unit, `"metre"` or `"degree"`.
    #[must_use]
    pub const fn unit(&self) -> &str {
        self.unit
    }
}

/// A coordinate reference system.
///
/// A `Crs` is either geographic (latitude/longitude on a datum) or projected
/// (a geographic base plus a [`Projection`]). It is a metadata value: it
/// describes coordinates but performs no coordinate transformation.
///
/// Instances come from [`Crs::from_user_input`] or one of the per-format
/// constructors, and convert losslessly to single line WKT2 via
/// [`Crs::to_wkt`] and to CF grid mapping attributes via [`Crs::to_cf`].
#[derive(Debug, Clone, PartialEq)]
pub struct Crs {
    name: String,
    base_name: Option<String>,
    datum: Datum,
    projection: Option<Projection>,
    authority: Option<Authority>,
}

impl Crs {
    /// Create a geographic (latitude/longitude) CRS on the given datum.
    #[must_use]
    pub fn geographic(name: impl Into<String>, datum: Datum) -> Self {
        Self {
            name: name.into(),
            base_name: None,
            datum,
            projection: None,
            authority: None,
        }
    }

    /// Create a projected CRS. `base_name` names the geographic CRS the
    /// projection is based on.
    #[must_use]
    pub fn projected(
        name: impl Into<String>,
        base_name: impl Into<String>,
        datum: Datum,
        projection: Projection,
    ) -> Self {
        Self {
            name: name.into(),
            base_name: Some(base_name.into()),
            datum,
            projection: Some(projection),
            authority: None,
        }
    }

    /// Set the authority reference.
    #[must_use]
    pub fn with_authority(mut self, authority: Authority) -> Self {
        self.authority = Some(authority);
        self
    }

    /// Create a CRS from any supported text form.
    ///
    /// Accepts an `EPSG:` prefixed or bare numeric EPSG code, WKT (WKT2 or
    /// the common WKT1 subset), or a PROJ string.
    ///
    /// ```
    /// # use geoarray_crs::Crs;
    /// let crs = Crs::from_user_input("EPSG:4326")?;
    /// assert!(crs.is_geographic());
    /// assert_eq!(crs.name(), "WGS 84");
    /// # Ok::<(), geoarray_crs::CrsParseError>(())
    /// ```
    ///
    /// # Errors
    /// Returns a [`CrsParseError`] if the form is not recognised or its
    /// parser rejects the input.
    pub fn from_user_input(input: &str) -> Result<Self, CrsParseError> {
        let input = input.trim();
        if let Some(code) = strip_epsg_prefix(input) {
            let code = code
                .trim()
                .parse::<u32>()
                .map_err(|_| CrsParseError::InvalidEpsgCode(input.to_string()))?;
            return Ok(Self::from_epsg(code)?);
        }
        if !input.is_empty() && input.bytes().all(|byte| byte.is_ascii_digit()) {
            let code = input
                .parse::<u32>()
                .map_err(|_| CrsParseError::InvalidEpsgCode(input.to_string()))?;
            return Ok(Self::from_epsg(code)?);
        }
        if input.starts_with('+') || input.contains("+proj=") {
            return Ok(Self::from_proj_string(input)?);
        }
        if has_wkt_keyword(input) {
            return Ok(Self::from_wkt(input)?);
        }
        Err(CrsParseError::UnrecognisedFormat(input.to_string()))
    }

    /// Create a CRS from an EPSG code.
    ///
    /// # Errors
    /// Returns an [`UnknownEpsgCodeError`] for a code outside the built-in
    /// registry.
    pub fn from_epsg(code: u32) -> Result<Self, UnknownEpsgCodeError> {
        crs_from_epsg(code)
    }

    /// Create a CRS from WKT.
    ///
    /// # Errors
    /// Returns a [`WktParseError`] if the input is not a readable geographic
    /// or projected CRS.
    pub fn from_wkt(wkt: &str) -> Result<Self, WktParseError> {
        crs_from_wkt(wkt)
    }

    /// Create a CRS from a PROJ string.
    ///
    /// # Errors
    /// Returns a [`ProjStringParseError`] if the projection or one of its
    /// parameters is not supported.
    pub fn from_proj_string(proj: &str) -> Result<Self, ProjStringParseError> {
        crs_from_proj_string(proj)
    }

    /// Create a CRS from CF grid mapping attributes.
    ///
    /// Reading is lenient: absent names become `"unknown"` and an absent
    /// ellipsoid takes the WGS 84 shape. Only a missing or malformed
    /// `grid_mapping_name` and malformed parameter values fail.
    ///
    /// # Errors
    /// Returns a [`CfReadError`] if `grid_mapping_name` is absent or a
    /// parameter value is unusable.
    pub fn from_cf(attrs: &Map<String, Value>) -> Result<Self, CfReadError> {
        crs_from_cf(attrs)
    }

    /// The CRS name, or `"unknown"`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name of the geographic base CRS of a projected CRS.
    #[must_use]
    pub fn base_name(&self) -> Option<&str> {
        self.base_name.as_deref()
    }

    /// Whether the CRS is projected.
    #[must_use]
    pub const fn is_projected(&self) -> bool {
        self.projection.is_some()
    }

    /// Whether the CRS is geographic.
    #[must_use]
    pub const fn is_geographic(&self) -> bool {
        !self.is_projected()
    }

    /// The geodetic datum.
    #[must_use]
    pub const fn datum(&self) -> &Datum {
        &self.datum
    }

    /// The reference ellipsoid of the datum.
    #[must_use]
    pub const fn ellipsoid(&self) -> &Ellipsoid {
        self.datum.ellipsoid()
    }

    /// The prime meridian of the datum.
    #[must_use]
    pub const fn prime_meridian(&self) -> &PrimeMeridian {
        self.datum.prime_meridian()
    }

    /// The projection of a projected CRS.
    #[must_use]
    pub const fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    /// The WKT name of the projection method, if projected.
    #[must_use]
    pub fn method_name(&self) -> Option<&str> {
        self.projection
            .as_ref()
            .map(|projection| projection.method().name())
    }

    /// The authority reference, if known.
    #[must_use]
    pub const fn authority(&self) -> Option<&Authority> {
        self.authority.as_ref()
    }

    /// The EPSG code, if the CRS carries an EPSG authority reference.
    #[must_use]
    pub fn to_epsg(&self) -> Option<u32> {
        self.authority
            .as_ref()
            .filter(|authority| authority.name.eq_ignore_ascii_case("EPSG"))
            .map(|authority| authority.code)
    }

    /// The two horizontal axes in definition order.
    ///
    /// Latitude then longitude in degrees for a geographic CRS, easting then
    /// northing in metres for a projected one.
    #[must_use]
    pub const fn axes(&self) -> [Axis; 2] {
        if self.is_projected() {
            [
                Axis {
                    name: "easting",
                    direction: AxisDirection::East,
                    unit: "metre",
                },
                Axis {
                    name: "northing",
                    direction: AxisDirection::North,
                    unit: "metre",
                },
            ]
        } else {
            [
                Axis {
                    name: "geodetic latitude",
                    direction: AxisDirection::North,
                    unit: "degree",
                },
                Axis {
                    name: "geodetic longitude",
                    direction: AxisDirection::East,
                    unit: "degree",
                },
            ]
        }
    }

    /// The CRS as single line WKT2:2019.
    #[must_use]
    pub fn to_wkt(&self) -> String {
        crs_to_wkt(self)
    }

    /// The CRS decomposed into CF grid mapping attributes, with
    /// `grid_mapping_name` first.
    #[must_use]
    pub fn to_cf(&self) -> Map<String, Value> {
        crs_to_cf(self)
    }

    /// The CRS as a PROJ string.
    ///
    /// # Errors
    /// Returns an [`UnsupportedProjectionError`] if the projection method has
    /// no PROJ counterpart.
    pub fn to_proj_string(&self) -> Result<String, UnsupportedProjectionError> {
        crs_to_proj_string(self)
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_wkt())
    }
}

impl TryFrom<&str> for Crs {
    type Error = CrsParseError;

    fn try_from(input: &str) -> Result<Self, Self::Error> {
        Self::from_user_input(input)
    }
}

fn strip_epsg_prefix(input: &str) -> Option<&str> {
    let prefix = input.get(..5)?;
    prefix.eq_ignore_ascii_case("EPSG:").then_some(&input[5..])
}

fn has_wkt_keyword(input: &str) -> bool {
    let keyword: String = input
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    matches!(
        keyword.to_ascii_uppercase().as_str(),
        "GEOGCRS" | "GEODCRS" | "PROJCRS" | "GEOGCS" | "PROJCS"
    )
}
