//! A built-in registry of common EPSG definitions.
//!
//! This is not the EPSG database. It covers the geographic and projected
//! systems that routinely appear in satellite and reanalysis products:
//! the major geographic datums, web Mercator, the polar stereographic grids,
//! and the WGS 84 UTM zones.

use thiserror::Error;

use crate::crs::{Authority, Crs};
use crate::ellipsoid::Datum;
use crate::method::{utm_parameters, ParamValue, Projection, ProjectionMethod};

/// The error raised for an EPSG code outside the built-in registry.
#[derive(Debug, Error)]
#[error("EPSG code {_0} is not in the built-in registry")]
pub struct UnknownEpsgCodeError(pub(crate) u32);

pub(crate) fn crs_from_epsg(code: u32) -> Result<Crs, UnknownEpsgCodeError> {
    let crs = match code {
        4267 => Crs::geographic("NAD27", Datum::nad27()),
        4258 => Crs::geographic("ETRS89", Datum::etrs89()),
        4269 => Crs::geographic("NAD83", Datum::nad83()),
        4326 => Crs::geographic("WGS 84", Datum::wgs84()),
        3031 => polar_stereographic("WGS 84 / Antarctic Polar Stereographic", -71.0, 0.0),
        3413 => polar_stereographic(
            "WGS 84 / NSIDC Sea Ice Polar Stereographic North",
            70.0,
            -45.0,
        ),
        3857 => pseudo_mercator(),
        32601..=32660 => utm(code - 32600, false),
        32701..=32760 => utm(code - 32700, true),
        _ => return Err(UnknownEpsgCodeError(code)),
    };
    Ok(crs.with_authority(Authority::new("EPSG", code)))
}

// EPSG:3857 is formally "Popular Visualisation Pseudo Mercator". Variant A
// with all parameters zero carries the same metadata.
fn pseudo_mercator() -> Crs {
    let projection = Projection::new(
        ProjectionMethod::MercatorVariantA,
        vec![
            (
                "longitude_of_projection_origin".to_string(),
                ParamValue::Number(0.0),
            ),
            (
                "scale_factor_at_projection_origin".to_string(),
                ParamValue::Number(1.0),
            ),
            ("false_easting".to_string(), ParamValue::Number(0.0)),
            ("false_northing".to_string(), ParamValue::Number(0.0)),
        ],
    );
    Crs::projected(
        "WGS 84 / Pseudo-Mercator",
        "WGS 84",
        Datum::wgs84(),
        projection,
    )
}

fn polar_stereographic(name: &str, standard_parallel: f64, longitude: f64) -> Crs {
    let projection = Projection::new(
        ProjectionMethod::PolarStereographicVariantB,
        vec![
            (
                "standard_parallel".to_string(),
                ParamValue::Number(standard_parallel),
            ),
            (
                "straight_vertical_longitude_from_pole".to_string(),
                ParamValue::Number(longitude),
            ),
            ("false_easting".to_string(), ParamValue::Number(0.0)),
            ("false_northing".to_string(), ParamValue::Number(0.0)),
        ],
    );
    Crs::projected(name, "WGS 84", Datum::wgs84(), projection)
}

fn utm(zone: u32, south: bool) -> Crs {
    let hemisphere = if south { 'S' } else { 'N' };
    let projection = Projection::new(
        ProjectionMethod::TransverseMercator,
        utm_parameters(zone, south),
    );
    Crs::projected(
        format!("WGS 84 / UTM zone {zone}{hemisphere}"),
        "WGS 84",
        Datum::wgs84(),
        projection,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geographic_codes() {
        let wgs84 = crs_from_epsg(4326).unwrap();
        assert!(wgs84.is_geographic());
        assert_eq!(wgs84.name(), "WGS 84");
        assert_eq!(wgs84.datum().name(), "World Geodetic System 1984");
        assert_eq!(wgs84.authority().unwrap().code(), 4326);

        let nad27 = crs_from_epsg(4267).unwrap();
        assert_eq!(nad27.datum().ellipsoid().name(), "Clarke 1866");
    }

    #[test]
    fn utm_zones() {
        let north = crs_from_epsg(32615).unwrap();
        assert_eq!(north.name(), "WGS 84 / UTM zone 15N");
        assert_eq!(
            north
                .projection()
                .unwrap()
                .parameter("longitude_of_central_meridian")
                .and_then(ParamValue::as_f64),
            Some(-93.0)
        );
        let south = crs_from_epsg(32733).unwrap();
        assert_eq!(south.name(), "WGS 84 / UTM zone 33S");
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
    fn polar_codes() {
        let antarctic = crs_from_epsg(3031).unwrap();
        assert_eq!(
            *antarctic.projection().unwrap().method(),
            ProjectionMethod::PolarStereographicVariantB
        );
        assert_eq!(
            antarctic
                .projection()
                .unwrap()
                .parameter("standard_parallel")
                .and_then(ParamValue::as_f64),
            Some(-71.0)
        );
    }

    #[test]
    fn unknown_code() {
        let error = crs_from_epsg(2154).unwrap_err();
        assert_eq!(
            error.to_string(),
            "EPSG code 2154 is not in the built-in registry"
        );
    }
}
