//! Spatial coordinate generation from georeferencing tags.

use serde_json::Value;
use thiserror::Error;

use crate::array::Attributes;
use crate::dims::DimRole;

/// The GeoTIFF tag holding the model pixel size.
pub const MODEL_PIXEL_SCALE_KEY: &str = "ModelPixelScale";

/// The GeoTIFF tag tying raster space to model space.
pub const MODEL_TIEPOINT_KEY: &str = "ModelTiepoint";

/// An error generating spatial coordinates.
#[derive(Debug, Error)]
pub enum SpatialCoordsError {
    /// The object carries no recognised georeferencing metadata.
    #[error("no recognised georeferencing metadata, expected ModelPixelScale and ModelTiepoint attributes")]
    UnknownLayout,
    /// A georeferencing tag that cannot be interpreted.
    #[error("malformed {name} tag: {reason}")]
    MalformedTag {
        /// The tag name.
        name: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// The object has no dimension with the required role.
    #[error("the object has no {_0} dimension")]
    MissingDimension(DimRole),
}

/// Generate x and y coordinate values from GeoTIFF style `ModelPixelScale`
/// and `ModelTiepoint` attributes.
///
/// The tie point names the outer corner of the first pixel, so coordinate
/// values are pixel centres half a pixel in from it. Returned as
/// `(y_values, x_values)` with y decreasing from the top edge.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn spatial_coord_values(
    attrs: &Attributes,
    y_size: u64,
    x_size: u64,
) -> Result<(Vec<f64>, Vec<f64>), SpatialCoordsError> {
    if !attrs.contains_key(MODEL_PIXEL_SCALE_KEY) {
        return Err(SpatialCoordsError::UnknownLayout);
    }
    let scale = tag_numbers(attrs, MODEL_PIXEL_SCALE_KEY, 2)?;
    let tiepoint = tag_numbers(attrs, MODEL_TIEPOINT_KEY, 5)?;
    let (x_resolution, y_resolution) = (scale[0], scale[1]);
    let (x_left, y_top) = (tiepoint[3], tiepoint[4]);
    let x = (0..x_size)
        .map(|i| x_left + x_resolution / 2.0 + i as f64 * x_resolution)
        .collect();
    let y = (0..y_size)
        .map(|j| y_top - y_resolution / 2.0 - j as f64 * y_resolution)
        .collect();
    Ok((y, x))
}

fn tag_numbers(
    attrs: &Attributes,
    name: &'static str,
    min_len: usize,
) -> Result<Vec<f64>, SpatialCoordsError> {
    let malformed = |reason: &'static str| SpatialCoordsError::MalformedTag { name, reason };
    let Some(value) = attrs.get(name) else {
        return Err(malformed("missing"));
    };
    let Some(values) = value.as_array() else {
        return Err(malformed("not an array"));
    };
    let Some(numbers) = values
        .iter()
        .map(Value::as_f64)
        .collect::<Option<Vec<_>>>()
    else {
        return Err(malformed("not numeric"));
    };
    if numbers.len() < min_len {
        return Err(malformed("too short"));
    }
    Ok(numbers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geotiff_attrs() -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert(
            MODEL_PIXEL_SCALE_KEY.to_string(),
            serde_json::json!([1002.008_644, 1002.008_644, 0.0]),
        );
        attrs.insert(
            MODEL_TIEPOINT_KEY.to_string(),
            serde_json::json!([0.0, 0.0, 0.0, -5_434_894.885_056, 5_434_894.885_056, 0.0]),
        );
        attrs
    }

    #[test]
    fn pixel_centre_coordinates() {
        let (y, x) = spatial_coord_values(&geotiff_attrs(), 3, 2).unwrap();
        let resolution = 1002.008_644;
        let x_left = -5_434_894.885_056;
        let y_top = 5_434_894.885_056;
        assert_eq!(
            x,
            vec![
                x_left + resolution / 2.0,
                x_left + resolution / 2.0 + resolution
            ]
        );
        assert_eq!(
            y,
            vec![
                y_top - resolution / 2.0,
                y_top - resolution / 2.0 - resolution,
                y_top - resolution / 2.0 - 2.0 * resolution
            ]
        );
    }

    #[test]
    fn missing_tags() {
        assert!(matches!(
            spatial_coord_values(&Attributes::new(), 2, 2),
            Err(SpatialCoordsError::UnknownLayout)
        ));
        let mut attrs = geotiff_attrs();
        attrs.remove(MODEL_TIEPOINT_KEY);
        assert!(matches!(
            spatial_coord_values(&attrs, 2, 2),
            Err(SpatialCoordsError::MalformedTag {
                name: MODEL_TIEPOINT_KEY,
                reason: "missing"
            })
        ));
    }

    #[test]
    fn malformed_tags() {
        let mut attrs = geotiff_attrs();
        attrs.insert(
            MODEL_PIXEL_SCALE_KEY.to_string(),
            Value::String("1002.0".to_string()),
        );
        let error = spatial_coord_values(&attrs, 2, 2).unwrap_err();
        assert_eq!(error.to_string(), "malformed ModelPixelScale tag: not an array");

        let mut attrs = geotiff_attrs();
        attrs.insert(MODEL_TIEPOINT_KEY.to_string(), serde_json::json!([0.0, 0.0]));
        let error = spatial_coord_values(&attrs, 2, 2).unwrap_err();
        assert_eq!(error.to_string(), "malformed ModelTiepoint tag: too short");
    }
}
