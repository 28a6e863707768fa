//! PROJ string reading and writing.

use thiserror::Error;

use crate::crs::Crs;
use crate::ellipsoid::{Datum, Ellipsoid, PrimeMeridian};
use crate::method::{utm_parameters, ParamValue, Projection, ProjectionMethod};

/// A PROJ string parse error.
#[derive(Debug, Error)]
pub enum ProjStringParseError {
    /// The string has no `+proj` parameter.
    #[error("PROJ string has no +proj parameter")]
    MissingProj,
    /// The `+proj` projection is not supported.
    #[error("unsupported projection {_0:?}")]
    UnsupportedProjection(String),
    /// A parameter required by the projection is absent.
    #[error("PROJ string is missing the +{_0} parameter")]
    MissingParameter(&'static str),
    /// A parameter value that does not parse.
    #[error("invalid value {value:?} for PROJ parameter +{key}")]
    InvalidValue {
        /// The parameter key.
        key: String,
        /// The offending value.
        value: String,
    },
    /// An `+ellps` name outside the supported set.
    #[error("unknown ellipsoid {_0:?}")]
    UnknownEllipsoid(String),
    /// A `+datum` name outside the supported set.
    #[error("unknown datum {_0:?}")]
    UnknownDatum(String),
}

/// The error raised when writing a PROJ string for an unsupported projection
/// method.
#[derive(Debug, Error)]
#[error("projection method {_0:?} cannot be expressed as a PROJ string")]
pub struct UnsupportedProjectionError(pub(crate) String);

struct ProjParams {
    pairs: Vec<(String, Option<String>)>,
}

impl ProjParams {
    fn parse(input: &str) -> Self {
        let mut pairs = Vec::new();
        for token in input.split_whitespace() {
            let token = token.strip_prefix('+').unwrap_or(token);
            if token.is_empty() {
                continue;
            }
            match token.split_once('=') {
                Some((key, value)) => pairs.push((key.to_string(), Some(value.to_string()))),
                None => pairs.push((token.to_string(), None)),
            }
        }
        Self { pairs }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find_map(|(k, value)| (k == key).then_some(value.as_deref()))
            .flatten()
    }

    fn has(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    fn number(&self, key: &str) -> Result<Option<f64>, ProjStringParseError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => {
                value
                    .parse()
                    .map(Some)
                    .map_err(|_| ProjStringParseError::InvalidValue {
                        key: key.to_string(),
                        value: value.to_string(),
                    })
            }
        }
    }
}

pub(crate) fn crs_from_proj_string(input: &str) -> Result<Crs, ProjStringParseError> {
    let params = ProjParams::parse(input);
    let Some(proj) = params.get("proj") else {
        return Err(ProjStringParseError::MissingProj);
    };
    let datum = datum_from_proj(&params)?;
    match proj {
        "longlat" | "latlong" | "lonlat" | "latlon" => Ok(Crs::geographic("unknown", datum)),
        "utm" => {
            let zone = utm_zone(&params)?;
            let projection = Projection::new(
                ProjectionMethod::TransverseMercator,
                utm_parameters(zone, params.has("south")),
            );
            Ok(Crs::projected("unknown", "unknown", datum, projection))
        }
        _ => {
            let method = method_from_proj(proj, &params)?;
            let parameters = parameters_from_proj(&method, &params)?;
            Ok(Crs::projected(
                "unknown",
                "unknown",
                datum,
                Projection::new(method, parameters),
            ))
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn utm_zone(params: &ProjParams) -> Result<u32, ProjStringParseError> {
    let zone = params
        .number("zone")?
        .ok_or(ProjStringParseError::MissingParameter("zone"))?;
    if zone.fract().abs() > 0.0 || !(1.0..=60.0).contains(&zone) {
        return Err(ProjStringParseError::InvalidValue {
            key: "zone".to_string(),
            value: zone.to_string(),
        });
    }
    Ok(zone as u32)
}

fn method_from_proj(
    proj: &str,
    params: &ProjParams,
) -> Result<ProjectionMethod, ProjStringParseError> {
    Ok(match proj {
        "geos" => match params.get("sweep").unwrap_or("y") {
            "x" => ProjectionMethod::GeostationarySweepX,
            "y" => ProjectionMethod::GeostationarySweepY,
            sweep => {
                return Err(ProjStringParseError::InvalidValue {
                    key: "sweep".to_string(),
                    value: sweep.to_string(),
                })
            }
        },
        "lcc" => {
            if params.has("lat_2") {
                ProjectionMethod::LambertConformalConic2Sp
            } else {
                ProjectionMethod::LambertConformalConic1Sp
            }
        }
        "merc" => {
            if params.has("lat_ts") {
                ProjectionMethod::MercatorVariantB
            } else {
                ProjectionMethod::MercatorVariantA
            }
        }
        "stere" => {
            let lat_0 = params.number("lat_0")?.unwrap_or(0.0);
            if params.has("lat_ts") {
                ProjectionMethod::PolarStereographicVariantB
            } else if (lat_0.abs() - 90.0).abs() < f64::EPSILON {
                ProjectionMethod::PolarStereographicVariantA
            } else {
                ProjectionMethod::Stereographic
            }
        }
        "tmerc" => ProjectionMethod::TransverseMercator,
        "aea" => ProjectionMethod::AlbersConicalEqualArea,
        "laea" => ProjectionMethod::LambertAzimuthalEqualArea,
        "aeqd" => ProjectionMethod::AzimuthalEquidistant,
        "ortho" => ProjectionMethod::Orthographic,
        "sinu" => ProjectionMethod::Sinusoidal,
        other => return Err(ProjStringParseError::UnsupportedProjection(other.to_string())),
    })
}

fn parameters_from_proj(
    method: &ProjectionMethod,
    params: &ProjParams,
) -> Result<Vec<(String, ParamValue)>, ProjStringParseError> {
    let Some(spec) = method.spec() else {
        return Ok(Vec::new());
    };
    let mut parameters = Vec::new();
    for param in spec.params {
        if param.cf == "standard_parallel" && param.proj == "lat_1" {
            match (params.number("lat_1")?, params.number("lat_2")?) {
                (Some(first), Some(second)) => parameters.push((
                    "standard_parallel".to_string(),
                    ParamValue::Numbers(vec![first, second]),
                )),
                (Some(first), None) => {
                    parameters.push(("standard_parallel".to_string(), ParamValue::Number(first)));
                }
                _ => {}
            }
            continue;
        }
        if let Some(value) = params.number(param.proj)? {
            parameters.push((param.cf.to_string(), ParamValue::Number(value)));
        }
    }
    Ok(parameters)
}

fn datum_from_proj(params: &ProjParams) -> Result<Datum, ProjStringParseError> {
    let datum = base_datum_from_proj(params)?;
    match params.number("pm")? {
        Some(longitude) => Ok(datum.with_prime_meridian(PrimeMeridian::new("unknown", longitude))),
        None => Ok(datum),
    }
}

fn base_datum_from_proj(params: &ProjParams) -> Result<Datum, ProjStringParseError> {
    if let Some(datum) = params.get("datum") {
        return match datum {
            "WGS84" => Ok(Datum::wgs84()),
            "NAD83" => Ok(Datum::nad83()),
            "NAD27" => Ok(Datum::nad27()),
            other => Err(ProjStringParseError::UnknownDatum(other.to_string())),
        };
    }
    if let Some(ellps) = params.get("ellps") {
        let ellipsoid = match ellps {
            "WGS84" => Ellipsoid::wgs84(),
            "GRS80" => Ellipsoid::grs80(),
            "clrk66" => Ellipsoid::clarke_1866(),
            "sphere" => Ellipsoid::sphere("sphere", 6_370_997.0),
            other => return Err(ProjStringParseError::UnknownEllipsoid(other.to_string())),
        };
        return Ok(Datum::new("unknown", ellipsoid));
    }
    if let Some(radius) = params.number("R")? {
        return Ok(Datum::new("unknown", Ellipsoid::sphere("unknown", radius)));
    }
    if let Some(semi_major) = params.number("a")? {
        let ellipsoid = if let Some(semi_minor) = params.number("b")? {
            Ellipsoid::from_semi_minor_axis("unknown", semi_major, semi_minor)
        } else if let Some(inverse_flattening) = params.number("rf")? {
            Ellipsoid::new("unknown", semi_major, inverse_flattening)
        } else {
            Ellipsoid::sphere("unknown", semi_major)
        };
        return Ok(Datum::new("unknown", ellipsoid));
    }
    Ok(Datum::unknown())
}

fn fmt(value: f64) -> String {
    format!("{value}")
}

pub(crate) fn crs_to_proj_string(crs: &Crs) -> Result<String, UnsupportedProjectionError> {
    let mut parts: Vec<String> = Vec::new();
    match crs.projection() {
        None => parts.push("+proj=longlat".to_string()),
        Some(projection) => {
            let Some(spec) = projection.method().spec() else {
                return Err(UnsupportedProjectionError(
                    projection.method().name().to_string(),
                ));
            };
            parts.push(format!("+proj={}", spec.proj));
            if matches!(
                projection.method(),
                ProjectionMethod::PolarStereographicVariantB
            ) {
                // +proj=stere needs the pole given explicitly.
                let sign = projection
                    .parameter("standard_parallel")
                    .and_then(ParamValue::as_f64)
                    .map_or(1.0, f64::signum);
                parts.push(format!("+lat_0={}", if sign < 0.0 { -90 } else { 90 }));
            }
            for (name, value) in projection.parameters() {
                let Some(param) = spec.params.iter().find(|param| param.cf == name.as_str())
                else {
                    continue;
                };
                match value {
                    ParamValue::Number(value) => {
                        parts.push(format!("+{}={}", param.proj, fmt(*value)));
                    }
                    ParamValue::Numbers(values) => {
                        if let Some(first) = values.first() {
                            parts.push(format!("+lat_1={}", fmt(*first)));
                        }
                        if let Some(second) = values.get(1) {
                            parts.push(format!("+lat_2={}", fmt(*second)));
                        }
                    }
                    ParamValue::Text(_) => {}
                }
            }
            match projection.method() {
                ProjectionMethod::GeostationarySweepX => parts.push("+sweep=x".to_string()),
                ProjectionMethod::GeostationarySweepY => parts.push("+sweep=y".to_string()),
                _ => {}
            }
        }
    }
    parts.extend(ellipsoid_proj_parts(crs.datum()));
    let prime_meridian = crs.datum().prime_meridian().longitude();
    if prime_meridian.abs() > 0.0 {
        parts.push(format!("+pm={}", fmt(prime_meridian)));
    }
    if crs.projection().is_some() {
        parts.push("+units=m".to_string());
    }
    parts.push("+no_defs".to_string());
    Ok(parts.join(" "))
}

fn ellipsoid_proj_parts(datum: &Datum) -> Vec<String> {
    match datum.name() {
        "World Geodetic System 1984" => return vec!["+datum=WGS84".to_string()],
        "North American Datum 1983" => return vec!["+datum=NAD83".to_string()],
        "North American Datum 1927" => return vec!["+datum=NAD27".to_string()],
        _ => {}
    }
    let ellipsoid = datum.ellipsoid();
    match ellipsoid.name() {
        "WGS 84" => return vec!["+ellps=WGS84".to_string()],
        "GRS 1980" => return vec!["+ellps=GRS80".to_string()],
        "Clarke 1866" => return vec!["+ellps=clrk66".to_string()],
        _ => {}
    }
    if ellipsoid.is_sphere() {
        return vec![format!("+R={}", fmt(ellipsoid.semi_major_axis()))];
    }
    let mut parts = vec![format!("+a={}", fmt(ellipsoid.semi_major_axis()))];
    if let Some(semi_minor) = ellipsoid.stored_semi_minor_axis() {
        parts.push(format!("+b={}", fmt(semi_minor)));
    } else {
        parts.push(format!("+rf={}", fmt(ellipsoid.inverse_flattening())));
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geostationary_round_trip() {
        // The projection of a GOES-East full disk area definition.
        let crs =
            crs_from_proj_string("+proj=geos +sweep=x +lon_0=-75 +h=35786023 +ellps=GRS80 +no_defs")
                .unwrap();
        assert_eq!(
            *crs.projection().unwrap().method(),
            ProjectionMethod::GeostationarySweepX
        );
        assert_eq!(
            crs.projection()
                .unwrap()
                .parameter("perspective_point_height")
                .and_then(ParamValue::as_f64),
            Some(35_786_023.0)
        );
        assert_eq!(crs.datum().ellipsoid(), &Ellipsoid::grs80());

        let written = crs_to_proj_string(&crs).unwrap();
        assert_eq!(
            written,
            "+proj=geos +lon_0=-75 +h=35786023 +sweep=x +ellps=GRS80 +units=m +no_defs"
        );
        assert_eq!(crs_from_proj_string(&written).unwrap(), crs);
    }

    #[test]
    fn utm_expansion() {
        let crs = crs_from_proj_string("+proj=utm +zone=15 +datum=WGS84").unwrap();
        let projection = crs.projection().unwrap();
        assert_eq!(*projection.method(), ProjectionMethod::TransverseMercator);
        assert_eq!(
            projection
                .parameter("longitude_of_central_meridian")
                .and_then(ParamValue::as_f64),
            Some(-93.0)
        );
        assert_eq!(
            projection.parameter("false_northing").and_then(ParamValue::as_f64),
            Some(0.0)
        );

        let south = crs_from_proj_string("+proj=utm +zone=33 +south +ellps=WGS84").unwrap();
        assert_eq!(
            south
                .projection()
                .unwrap()
                .parameter("false_northing")
                .and_then(ParamValue::as_f64),
            Some(10_000_000.0)
        );
    }

    #[test]
    fn geographic_datum_forms() {
        let wgs84 = crs_from_proj_string("+proj=longlat +datum=WGS84 +no_defs").unwrap();
        assert!(wgs84.is_geographic());
        assert_eq!(wgs84.datum().name(), "World Geodetic System 1984");
        assert_eq!(crs_to_proj_string(&wgs84).unwrap(), "+proj=longlat +datum=WGS84 +no_defs");

        let sphere = crs_from_proj_string("+proj=longlat +R=6371000").unwrap();
        assert!(sphere.datum().ellipsoid().is_sphere());

        let axes = crs_from_proj_string("+proj=longlat +a=6378137 +b=6356752.314245179").unwrap();
        assert_eq!(axes.datum().ellipsoid(), &Ellipsoid::wgs84());
    }

    #[test]
    fn two_standard_parallels() {
        let crs = crs_from_proj_string(
            "+proj=aea +lat_1=29.5 +lat_2=45.5 +lat_0=23 +lon_0=-96 +x_0=0 +y_0=0 +datum=NAD83",
        )
        .unwrap();
        assert_eq!(
            crs.projection().unwrap().parameter("standard_parallel"),
            Some(&ParamValue::Numbers(vec![29.5, 45.5]))
        );
        let written = crs_to_proj_string(&crs).unwrap();
        assert!(written.contains("+lat_1=29.5 +lat_2=45.5"));
        assert_eq!(crs_from_proj_string(&written).unwrap(), crs);
    }

    #[test]
    fn polar_stereographic_keeps_the_pole() {
        let crs = crs_from_proj_string(
            "+proj=stere +lat_0=90 +lat_ts=70 +lon_0=-45 +x_0=0 +y_0=0 +datum=WGS84",
        )
        .unwrap();
        assert_eq!(
            *crs.projection().unwrap().method(),
            ProjectionMethod::PolarStereographicVariantB
        );
        let written = crs_to_proj_string(&crs).unwrap();
        assert!(written.starts_with("+proj=stere +lat_0=90 "));
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            crs_from_proj_string("+ellps=WGS84"),
            Err(ProjStringParseError::MissingProj)
        ));
        assert!(matches!(
            crs_from_proj_string("+proj=igh"),
            Err(ProjStringParseError::UnsupportedProjection(_))
        ));
        assert!(matches!(
            crs_from_proj_string("+proj=geos +sweep=z +h=35786023"),
            Err(ProjStringParseError::InvalidValue { .. })
        ));
        assert!(matches!(
            crs_from_proj_string("+proj=utm +zone=0"),
            Err(ProjStringParseError::InvalidValue { .. })
        ));
        assert!(matches!(
            crs_from_proj_string("+proj=longlat +ellps=bessel"),
            Err(ProjStringParseError::UnknownEllipsoid(_))
        ));
    }
}
