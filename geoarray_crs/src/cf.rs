//! CF convention grid mapping attribute reading and writing.
//!
//! The CF convention decomposes a CRS into flat `grid_mapping` attributes:
//! a `grid_mapping_name` naming the projection method plus numeric
//! parameters. Reading is lenient, absent parameters fall back to documented
//! defaults rather than failing.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::crs::Crs;
use crate::ellipsoid::{Datum, Ellipsoid, PrimeMeridian};
use crate::method::{MethodSpec, ParamValue, Projection, ProjectionMethod};

/// A CF grid mapping read error.
#[derive(Debug, Error)]
pub enum CfReadError {
    /// The attributes have no `grid_mapping_name`.
    #[error("attributes have no grid_mapping_name")]
    MissingGridMappingName,
    /// A parameter with an unusable value.
    #[error("invalid value {value} for CF parameter {name}")]
    InvalidParameter {
        /// The parameter name.
        name: String,
        /// The offending value.
        value: Value,
    },
}

fn invalid(name: &str, value: &Value) -> CfReadError {
    CfReadError::InvalidParameter {
        name: name.to_string(),
        value: value.clone(),
    }
}

fn number(attrs: &Map<String, Value>, name: &str) -> Result<Option<f64>, CfReadError> {
    match attrs.get(name) {
        None => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| invalid(name, value)),
    }
}

fn text<'a>(attrs: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    attrs.get(name).and_then(Value::as_str)
}

pub(crate) fn crs_from_cf(attrs: &Map<String, Value>) -> Result<Crs, CfReadError> {
    let Some(value) = attrs.get("grid_mapping_name") else {
        return Err(CfReadError::MissingGridMappingName);
    };
    let Some(grid_mapping_name) = value.as_str() else {
        return Err(invalid("grid_mapping_name", value));
    };
    let datum = datum_from_cf(attrs)?;
    if grid_mapping_name == "latitude_longitude" {
        let name = text(attrs, "geographic_crs_name").unwrap_or("unknown");
        return Ok(Crs::geographic(name, datum));
    }
    let method = method_from_cf(grid_mapping_name, attrs)?;
    let parameters = match method.spec() {
        Some(spec) => parameters_from_cf(spec, attrs)?,
        None => opaque_parameters(attrs),
    };
    let name = text(attrs, "projected_crs_name").unwrap_or("unknown");
    let base_name = text(attrs, "geographic_crs_name").unwrap_or("unknown");
    Ok(Crs::projected(
        name,
        base_name,
        datum,
        Projection::new(method, parameters),
    ))
}

fn method_from_cf(name: &str, attrs: &Map<String, Value>) -> Result<ProjectionMethod, CfReadError> {
    Ok(match name {
        "albers_conical_equal_area" => ProjectionMethod::AlbersConicalEqualArea,
        "azimuthal_equidistant" => ProjectionMethod::AzimuthalEquidistant,
        "geostationary" => geostationary_variant(attrs)?,
        "lambert_azimuthal_equal_area" => ProjectionMethod::LambertAzimuthalEqualArea,
        "lambert_conformal_conic" => match attrs.get("standard_parallel") {
            Some(Value::Array(values)) if values.len() > 1 => {
                ProjectionMethod::LambertConformalConic2Sp
            }
            _ => ProjectionMethod::LambertConformalConic1Sp,
        },
        "mercator" => {
            if attrs.contains_key("standard_parallel") {
                ProjectionMethod::MercatorVariantB
            } else {
                ProjectionMethod::MercatorVariantA
            }
        }
        "orthographic" => ProjectionMethod::Orthographic,
        "polar_stereographic" => {
            if attrs.contains_key("scale_factor_at_projection_origin") {
                ProjectionMethod::PolarStereographicVariantA
            } else {
                ProjectionMethod::PolarStereographicVariantB
            }
        }
        "sinusoidal" => ProjectionMethod::Sinusoidal,
        "stereographic" => ProjectionMethod::Stereographic,
        "transverse_mercator" => ProjectionMethod::TransverseMercator,
        other => ProjectionMethod::Other(other.to_string()),
    })
}

fn geostationary_variant(attrs: &Map<String, Value>) -> Result<ProjectionMethod, CfReadError> {
    if let Some(value) = attrs.get("sweep_angle_axis") {
        return match value.as_str() {
            Some("x") => Ok(ProjectionMethod::GeostationarySweepX),
            Some("y") => Ok(ProjectionMethod::GeostationarySweepY),
            _ => Err(invalid("sweep_angle_axis", value)),
        };
    }
    if let Some(value) = attrs.get("fixed_angle_axis") {
        // The fixed axis is perpendicular to the sweep axis.
        return match value.as_str() {
            Some("x") => Ok(ProjectionMethod::GeostationarySweepY),
            Some("y") => Ok(ProjectionMethod::GeostationarySweepX),
            _ => Err(invalid("fixed_angle_axis", value)),
        };
    }
    Ok(ProjectionMethod::GeostationarySweepY)
}

fn parameters_from_cf(
    spec: &MethodSpec,
    attrs: &Map<String, Value>,
) -> Result<Vec<(String, ParamValue)>, CfReadError> {
    let mut parameters = Vec::new();
    for param in spec.params {
        if param.cf == "standard_parallel" {
            match attrs.get("standard_parallel") {
                None => {}
                Some(Value::Array(values)) => {
                    let mut numbers = Vec::with_capacity(values.len());
                    for value in values {
                        numbers
                            .push(value.as_f64().ok_or_else(|| invalid("standard_parallel", value))?);
                    }
                    let value = if numbers.len() == 1 {
                        ParamValue::Number(numbers[0])
                    } else {
                        ParamValue::Numbers(numbers)
                    };
                    parameters.push((param.cf.to_string(), value));
                }
                Some(value) => {
                    let number = value
                        .as_f64()
                        .ok_or_else(|| invalid("standard_parallel", value))?;
                    parameters.push((param.cf.to_string(), ParamValue::Number(number)));
                }
            }
            continue;
        }
        if let Some(value) = number(attrs, param.cf)? {
            parameters.push((param.cf.to_string(), ParamValue::Number(value)));
        }
    }
    Ok(parameters)
}

/// Attribute keys that describe the datum, the naming, or the delivery of a
/// grid mapping rather than its projection parameters.
const NON_PARAMETER_KEYS: &[&str] = &[
    "grid_mapping_name",
    "crs_wkt",
    "spatial_ref",
    "semi_major_axis",
    "semi_minor_axis",
    "inverse_flattening",
    "earth_radius",
    "reference_ellipsoid_name",
    "horizontal_datum_name",
    "prime_meridian_name",
    "longitude_of_prime_meridian",
    "geographic_crs_name",
    "projected_crs_name",
    "sweep_angle_axis",
    "fixed_angle_axis",
    "long_name",
    "standard_name",
    "units",
    "comment",
];

fn opaque_parameters(attrs: &Map<String, Value>) -> Vec<(String, ParamValue)> {
    let mut parameters = Vec::new();
    for (name, value) in attrs {
        if NON_PARAMETER_KEYS.contains(&name.as_str()) {
            continue;
        }
        match value {
            Value::Number(_) => {
                if let Some(number) = value.as_f64() {
                    parameters.push((name.clone(), ParamValue::Number(number)));
                }
            }
            Value::String(string) => {
                parameters.push((name.clone(), ParamValue::Text(string.clone())));
            }
            Value::Array(values) => {
                if let Some(numbers) = values.iter().map(Value::as_f64).collect::<Option<Vec<_>>>()
                {
                    parameters.push((name.clone(), ParamValue::Numbers(numbers)));
                }
            }
            _ => {}
        }
    }
    parameters
}

fn datum_from_cf(attrs: &Map<String, Value>) -> Result<Datum, CfReadError> {
    let ellipsoid_name = text(attrs, "reference_ellipsoid_name").unwrap_or("unknown");
    let semi_major_axis = number(attrs, "semi_major_axis")?;
    let semi_minor_axis = number(attrs, "semi_minor_axis")?;
    let inverse_flattening = number(attrs, "inverse_flattening")?;
    let earth_radius = number(attrs, "earth_radius")?;
    let ellipsoid = if let Some(radius) = earth_radius {
        Ellipsoid::sphere(ellipsoid_name, radius)
    } else if let Some(semi_major_axis) = semi_major_axis {
        if semi_minor_axis.is_none() && inverse_flattening.is_none() {
            Ellipsoid::sphere(ellipsoid_name, semi_major_axis)
        } else {
            Ellipsoid::from_parameters(
                ellipsoid_name,
                semi_major_axis,
                semi_minor_axis,
                inverse_flattening,
            )
        }
    } else {
        // No shape parameters. Use the named ellipsoid if it is well known,
        // else assume the WGS 84 shape.
        match ellipsoid_name {
            "WGS 84" => Ellipsoid::wgs84(),
            "GRS 1980" => Ellipsoid::grs80(),
            "Clarke 1866" => Ellipsoid::clarke_1866(),
            _ => Ellipsoid::unknown(),
        }
    };
    let datum_name = text(attrs, "horizontal_datum_name").unwrap_or("unknown");
    let prime_meridian_longitude = number(attrs, "longitude_of_prime_meridian")?.unwrap_or(0.0);
    let prime_meridian_name = text(attrs, "prime_meridian_name").unwrap_or(
        if prime_meridian_longitude.abs() > 0.0 {
            "unknown"
        } else {
            "Greenwich"
        },
    );
    Ok(Datum::new(datum_name, ellipsoid).with_prime_meridian(PrimeMeridian::new(
        prime_meridian_name,
        prime_meridian_longitude,
    )))
}

fn json_number(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

#[allow(clippy::too_many_lines)]
pub(crate) fn crs_to_cf(crs: &Crs) -> Map<String, Value> {
    let mut attrs = Map::new();
    let method_name = crs
        .projection()
        .map_or("latitude_longitude", |projection| {
            projection.method().cf_name()
        });
    attrs.insert(
        "grid_mapping_name".to_string(),
        Value::String(method_name.to_string()),
    );
    if let Some(projection) = crs.projection() {
        for (name, value) in projection.parameters() {
            let json = match value {
                ParamValue::Number(number) => json_number(*number),
                ParamValue::Numbers(numbers) => {
                    Value::Array(numbers.iter().map(|number| json_number(*number)).collect())
                }
                ParamValue::Text(string) => Value::String(string.clone()),
            };
            attrs.insert(name.clone(), json);
        }
        match projection.method() {
            ProjectionMethod::GeostationarySweepX => {
                attrs.insert(
                    "sweep_angle_axis".to_string(),
                    Value::String("x".to_string()),
                );
            }
            ProjectionMethod::GeostationarySweepY => {
                attrs.insert(
                    "sweep_angle_axis".to_string(),
                    Value::String("y".to_string()),
                );
            }
            ProjectionMethod::PolarStereographicVariantB => {
                // The pole is implied by the sign of the standard parallel.
                if !attrs.contains_key("latitude_of_projection_origin") {
                    let sign = projection
                        .parameter("standard_parallel")
                        .and_then(ParamValue::as_f64)
                        .map_or(1.0, f64::signum);
                    attrs.insert(
                        "latitude_of_projection_origin".to_string(),
                        json_number(if sign < 0.0 { -90.0 } else { 90.0 }),
                    );
                }
            }
            ProjectionMethod::LambertConformalConic1Sp => {
                if !attrs.contains_key("latitude_of_projection_origin") {
                    if let Some(parallel) = projection
                        .parameter("standard_parallel")
                        .and_then(ParamValue::as_f64)
                    {
                        attrs.insert(
                            "latitude_of_projection_origin".to_string(),
                            json_number(parallel),
                        );
                    }
                }
            }
            _ => {}
        }
    }
    let ellipsoid = crs.datum().ellipsoid();
    if ellipsoid.is_sphere() {
        attrs.insert(
            "earth_radius".to_string(),
            json_number(ellipsoid.semi_major_axis()),
        );
    } else {
        attrs.insert(
            "semi_major_axis".to_string(),
            json_number(ellipsoid.semi_major_axis()),
        );
        if let Some(semi_minor_axis) = ellipsoid.stored_semi_minor_axis() {
            attrs.insert("semi_minor_axis".to_string(), json_number(semi_minor_axis));
        }
        if let Some(inverse_flattening) = ellipsoid.stored_inverse_flattening() {
            attrs.insert(
                "inverse_flattening".to_string(),
                json_number(inverse_flattening),
            );
        }
    }
    let prime_meridian = crs.datum().prime_meridian();
    attrs.insert(
        "longitude_of_prime_meridian".to_string(),
        json_number(prime_meridian.longitude()),
    );
    attrs.insert(
        "prime_meridian_name".to_string(),
        Value::String(prime_meridian.name().to_string()),
    );
    attrs.insert(
        "reference_ellipsoid_name".to_string(),
        Value::String(ellipsoid.name().to_string()),
    );
    attrs.insert(
        "horizontal_datum_name".to_string(),
        Value::String(crs.datum().name().to_string()),
    );
    let geographic_name = if crs.is_projected() {
        crs.base_name().unwrap_or("unknown")
    } else {
        crs.name()
    };
    attrs.insert(
        "geographic_crs_name".to_string(),
        Value::String(geographic_name.to_string()),
    );
    if crs.is_projected() {
        attrs.insert(
            "projected_crs_name".to_string(),
            Value::String(crs.name().to_string()),
        );
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    // The grid mapping attributes of a GOES-R ABI fixed grid variable.
    const GOES_CF: &str = r#"{
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

    const SENTINEL_GEOGRAPHIC_CF: &str = r#"{
        "grid_mapping_name": "latitude_longitude",
        "horizontal_datum_name": "World Geodetic System 1984",
        "inverse_flattening": 298.257223563,
        "reference_ellipsoid_name": "WGS 84",
        "semi_major_axis": 6378137.0,
        "semi_minor_axis": 6356752.314245179,
        "prime_meridian_name": "Greenwich",
        "longitude_of_prime_meridian": 0.0
    }"#;

    fn attrs(json: &str) -> Map<String, Value> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn read_geostationary() {
        let crs = crs_from_cf(&attrs(GOES_CF)).unwrap();
        assert!(crs.is_projected());
        let projection = crs.projection().unwrap();
        assert_eq!(*projection.method(), ProjectionMethod::GeostationarySweepX);
        assert_eq!(
            projection.method().name(),
            "Geostationary Satellite (Sweep X)"
        );
        assert_eq!(
            projection
                .parameter("longitude_of_projection_origin")
                .and_then(ParamValue::as_f64),
            Some(-89.5)
        );
        assert_eq!(crs.datum().ellipsoid(), &Ellipsoid::grs80());
    }

    #[test]
    fn geostationary_round_trip() {
        let crs = crs_from_cf(&attrs(GOES_CF)).unwrap();
        let written = crs_to_cf(&crs);
        assert_eq!(crs_from_cf(&written).unwrap(), crs);
        // Every original parameter survives with its value.
        for key in [
            "grid_mapping_name",
            "perspective_point_height",
            "semi_major_axis",
            "semi_minor_axis",
            "inverse_flattening",
            "latitude_of_projection_origin",
            "longitude_of_projection_origin",
            "sweep_angle_axis",
        ] {
            assert_eq!(written[key], attrs(GOES_CF)[key], "mismatch for {key}");
        }
    }

    #[test]
    fn read_geographic() {
        let crs = crs_from_cf(&attrs(SENTINEL_GEOGRAPHIC_CF)).unwrap();
        assert!(crs.is_geographic());
        assert_eq!(crs.datum().name(), "World Geodetic System 1984");
        assert_eq!(crs.datum().ellipsoid(), &Ellipsoid::wgs84());
        let written = crs_to_cf(&crs);
        assert_eq!(
            written["grid_mapping_name"],
            Value::String("latitude_longitude".to_string())
        );
        assert_eq!(
            written["horizontal_datum_name"],
            Value::String("World Geodetic System 1984".to_string())
        );
    }

    #[test]
    fn fixed_angle_axis_is_perpendicular_to_sweep() {
        let mut goes = attrs(GOES_CF);
        goes.remove("sweep_angle_axis");
        goes.insert(
            "fixed_angle_axis".to_string(),
            Value::String("y".to_string()),
        );
        let crs = crs_from_cf(&goes).unwrap();
        assert_eq!(
            *crs.projection().unwrap().method(),
            ProjectionMethod::GeostationarySweepX
        );
    }

    #[test]
    fn missing_grid_mapping_name() {
        let mut goes = attrs(GOES_CF);
        goes.remove("grid_mapping_name");
        assert!(matches!(
            crs_from_cf(&goes),
            Err(CfReadError::MissingGridMappingName)
        ));
    }

    #[test]
    fn unknown_method_is_carried_through() {
        let oblique = attrs(
            r#"{
                "grid_mapping_name": "oblique_mercator",
                "azimuth_of_central_line": 25.7,
                "latitude_of_projection_origin": 40.0,
                "longitude_of_projection_origin": -80.0
            }"#,
        );
        let crs = crs_from_cf(&oblique).unwrap();
        assert_eq!(
            *crs.projection().unwrap().method(),
            ProjectionMethod::Other("oblique_mercator".to_string())
        );
        let written = crs_to_cf(&crs);
        assert_eq!(
            written["grid_mapping_name"],
            Value::String("oblique_mercator".to_string())
        );
        assert_eq!(written["azimuth_of_central_line"], oblique["azimuth_of_central_line"]);
        assert_eq!(crs_from_cf(&written).unwrap(), crs);
    }

    #[test]
    fn absent_shape_parameters_fall_back() {
        let bare = attrs(r#"{"grid_mapping_name": "latitude_longitude"}"#);
        let crs = crs_from_cf(&bare).unwrap();
        assert_eq!(crs.name(), "unknown");
        assert_eq!(crs.datum().name(), "unknown");
        assert_eq!(crs.datum().ellipsoid().semi_major_axis(), 6_378_137.0);
    }
}
