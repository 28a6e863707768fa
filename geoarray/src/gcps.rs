//! Ground control point (GCP) metadata.
//!
//! GCPs tie image pixels to geodetic positions and are stored as GeoJSON
//! text under the `gcps` attribute, one `Point` feature per control point.
//! The stored text is kept byte for byte so it survives a read and write
//! cycle unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::array::Attributes;

/// The attribute key holding GCPs as GeoJSON text.
pub const GCPS_KEY: &str = "gcps";

/// A ground control point tying an image row and column to a geodetic
/// position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundControlPoint {
    /// The point identifier.
    pub id: String,
    /// The zero based image row.
    pub row: f64,
    /// The zero based image column.
    pub col: f64,
    /// The longitude in degrees.
    pub longitude: f64,
    /// The latitude in degrees.
    pub latitude: f64,
    /// The elevation in metres, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
    /// A free text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

/// An error in GCP GeoJSON.
#[derive(Debug, Error)]
pub enum GcpFormatError {
    /// The text is not valid JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// The document is not a GeoJSON `FeatureCollection`.
    #[error("GCP document is not a GeoJSON FeatureCollection")]
    NotFeatureCollection,
    /// A feature that does not describe a ground control point.
    #[error("GCP feature {index} is invalid: {reason}")]
    Feature {
        /// The position of the feature in the collection.
        index: usize,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Parse GCP GeoJSON into control points.
///
/// The document must be a `FeatureCollection` of `Point` features, each
/// with `id`, `row`, and `col` properties and 2 or 3 coordinate values in
/// longitude, latitude, elevation order.
pub(crate) fn parse_gcps(geojson: &str) -> Result<Vec<GroundControlPoint>, GcpFormatError> {
    let document: Value = serde_json::from_str(geojson)?;
    let Some(object) = document.as_object() else {
        return Err(GcpFormatError::NotFeatureCollection);
    };
    if object.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(GcpFormatError::NotFeatureCollection);
    }
    let Some(features) = object.get("features").and_then(Value::as_array) else {
        return Err(GcpFormatError::NotFeatureCollection);
    };
    features
        .iter()
        .enumerate()
        .map(|(index, feature)| parse_feature(index, feature))
        .collect()
}

fn parse_feature(index: usize, feature: &Value) -> Result<GroundControlPoint, GcpFormatError> {
    let invalid = |reason: &'static str| GcpFormatError::Feature { index, reason };
    let object = feature
        .as_object()
        .ok_or_else(|| invalid("not a JSON object"))?;
    if object.get("type").and_then(Value::as_str) != Some("Feature") {
        return Err(invalid("not a Feature"));
    }
    let properties = object
        .get("properties")
        .and_then(Value::as_object)
        .ok_or_else(|| invalid("missing properties object"))?;
    let id = match properties.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => return Err(invalid("missing id property")),
    };
    let row = properties
        .get("row")
        .and_then(Value::as_f64)
        .ok_or_else(|| invalid("missing numeric row property"))?;
    let col = properties
        .get("col")
        .and_then(Value::as_f64)
        .ok_or_else(|| invalid("missing numeric col property"))?;
    let info = properties
        .get("info")
        .and_then(Value::as_str)
        .map(ToString::to_string);
    let geometry = object
        .get("geometry")
        .and_then(Value::as_object)
        .ok_or_else(|| invalid("missing geometry object"))?;
    if geometry.get("type").and_then(Value::as_str) != Some("Point") {
        return Err(invalid("geometry is not a Point"));
    }
    let coordinates = geometry
        .get("coordinates")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("missing Point coordinates"))?;
    if !(2..=3).contains(&coordinates.len()) {
        return Err(invalid("Point coordinates must have 2 or 3 values"));
    }
    let mut numbers = coordinates.iter().map(Value::as_f64);
    let longitude = numbers
        .next()
        .flatten()
        .ok_or_else(|| invalid("Point coordinates must be numeric"))?;
    let latitude = numbers
        .next()
        .flatten()
        .ok_or_else(|| invalid("Point coordinates must be numeric"))?;
    let elevation = match numbers.next() {
        None => None,
        Some(value) => Some(value.ok_or_else(|| invalid("Point coordinates must be numeric"))?),
    };
    Ok(GroundControlPoint {
        id,
        row,
        col,
        longitude,
        latitude,
        elevation,
        info,
    })
}

/// The stored GCP GeoJSON text, exactly as it was written.
pub(crate) fn gcps_text(attrs: &Attributes) -> Option<&str> {
    attrs.get(GCPS_KEY).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GCPS_GEOJSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": {"id": "1", "info": "corner", "row": 0.0, "col": 0.0},
      "geometry": {"type": "Point", "coordinates": [-122.4, 37.7, 10.0]}
    },
    {
      "type": "Feature",
      "properties": {"id": "2", "row": 511.5, "col": 1023.5},
      "geometry": {"type": "Point", "coordinates": [-121.9, 37.2]}
    }
  ]
}"#;

    #[test]
    fn parse_points() {
        let points = parse_gcps(GCPS_GEOJSON).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(
            points[0],
            GroundControlPoint {
                id: "1".to_string(),
                row: 0.0,
                col: 0.0,
                longitude: -122.4,
                latitude: 37.7,
                elevation: Some(10.0),
                info: Some("corner".to_string()),
            }
        );
        assert_eq!(points[1].id, "2");
        assert_eq!(points[1].elevation, None);
        assert_eq!(points[1].info, None);
    }

    #[test]
    fn parse_numeric_id() {
        let geojson = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"id": 7, "row": 1.0, "col": 2.0},
             "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}}]}"#;
        let points = parse_gcps(geojson).unwrap();
        assert_eq!(points[0].id, "7");
    }

    #[test]
    fn parse_rejects_non_feature_collection() {
        assert!(matches!(
            parse_gcps(r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#),
            Err(GcpFormatError::NotFeatureCollection)
        ));
        assert!(matches!(
            parse_gcps("[1, 2, 3]"),
            Err(GcpFormatError::NotFeatureCollection)
        ));
        assert!(matches!(parse_gcps("not json"), Err(GcpFormatError::Json(_))));
    }

    #[test]
    fn parse_reports_the_broken_feature() {
        let geojson = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"id": "1", "row": 0.0, "col": 0.0},
             "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}},
            {"type": "Feature", "properties": {"id": "2", "col": 0.0},
             "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}}]}"#;
        let error = parse_gcps(geojson).unwrap_err();
        assert_eq!(
            error.to_string(),
            "GCP feature 1 is invalid: missing numeric row property"
        );
    }

    #[test]
    fn parse_rejects_bad_geometry() {
        let geojson = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"id": "1", "row": 0.0, "col": 0.0},
             "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]}}]}"#;
        let error = parse_gcps(geojson).unwrap_err();
        assert_eq!(error.to_string(), "GCP feature 0 is invalid: geometry is not a Point");
    }
}
