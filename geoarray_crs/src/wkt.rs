//! Well-known text (WKT) reading and writing.
//!
//! Writing always produces single line WKT2:2019. Reading accepts the WKT2
//! produced here plus the WKT1 subset (`GEOGCS`/`PROJCS`) that commonly
//! appears in satellite product metadata.

use thiserror::Error;

use crate::crs::{Authority, Crs};
use crate::ellipsoid::{Datum, Ellipsoid, PrimeMeridian};
use crate::method::{ParamKind, ParamValue, Projection, ProjectionMethod};

/// A WKT parse error.
#[derive(Debug, Error)]
pub enum WktParseError {
    /// An unexpected character in the input.
    #[error("unexpected character {character:?} at offset {offset}")]
    UnexpectedCharacter {
        /// The offending character.
        character: char,
        /// Its byte offset in the input.
        offset: usize,
    },
    /// The input ended before the outermost node was closed.
    #[error("unexpected end of WKT input")]
    UnexpectedEnd,
    /// A numeric token that does not parse as a number.
    #[error("invalid number {text:?} at offset {offset}")]
    InvalidNumber {
        /// The offending token.
        text: String,
        /// Its byte offset in the input.
        offset: usize,
    },
    /// The outermost keyword is not a supported CRS node.
    #[error("unsupported WKT node {_0:?}, expected a geographic or projected CRS")]
    UnsupportedKeyword(String),
    /// A required element is absent from a node.
    #[error("{keyword} node is missing its {element}")]
    MissingElement {
        /// The keyword of the incomplete node.
        keyword: String,
        /// The element that was expected.
        element: &'static str,
    },
    /// Nodes nested beyond the supported depth.
    #[error("WKT nesting too deep at offset {offset}")]
    NestingTooDeep {
        /// The byte offset of the node that went too deep.
        offset: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WktNode {
    keyword: String,
    values: Vec<WktValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum WktValue {
    Node(WktNode),
    Text(String),
    Number(f64),
    Keyword(String),
}

impl WktNode {
    fn is(&self, keyword: &str) -> bool {
        self.keyword.eq_ignore_ascii_case(keyword)
    }

    fn child(&self, keyword: &str) -> Option<&WktNode> {
        self.values.iter().find_map(|value| match value {
            WktValue::Node(node) if node.is(keyword) => Some(node),
            _ => None,
        })
    }

    fn children<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a WktNode> + 'a {
        self.values.iter().filter_map(move |value| match value {
            WktValue::Node(node) if node.is(keyword) => Some(node),
            _ => None,
        })
    }

    fn missing(&self, element: &'static str) -> WktParseError {
        WktParseError::MissingElement {
            keyword: self.keyword.clone(),
            element,
        }
    }

    fn text(&self, index: usize, element: &'static str) -> Result<&str, WktParseError> {
        match self.values.get(index) {
            Some(WktValue::Text(text)) => Ok(text),
            _ => Err(self.missing(element)),
        }
    }

    fn number(&self, index: usize, element: &'static str) -> Result<f64, WktParseError> {
        match self.values.get(index) {
            Some(WktValue::Number(value)) => Ok(*value),
            // WKT1 writes some numeric elements as quoted strings.
            Some(WktValue::Text(text)) => text.trim().parse().map_err(|_| self.missing(element)),
            _ => Err(self.missing(element)),
        }
    }
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let character = self.peek()?;
        self.pos += character.len_utf8();
        Some(character)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }
}

/// The deepest node nesting accepted by the parser.
const MAX_NESTING_DEPTH: usize = 64;

pub(crate) fn parse_wkt(input: &str) -> Result<WktNode, WktParseError> {
    let mut cursor = Cursor { input, pos: 0 };
    cursor.skip_whitespace();
    let keyword = parse_keyword(&mut cursor)?;
    let node = parse_body(&mut cursor, keyword, 0)?;
    cursor.skip_whitespace();
    match cursor.peek() {
        Some(character) => Err(WktParseError::UnexpectedCharacter {
            character,
            offset: cursor.pos,
        }),
        None => Ok(node),
    }
}

fn parse_keyword(cursor: &mut Cursor) -> Result<String, WktParseError> {
    let start = cursor.pos;
    while cursor
        .peek()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        cursor.bump();
    }
    if cursor.pos == start {
        return Err(match cursor.peek() {
            Some(character) => WktParseError::UnexpectedCharacter {
                character,
                offset: cursor.pos,
            },
            None => WktParseError::UnexpectedEnd,
        });
    }
    Ok(cursor.input[start..cursor.pos].to_string())
}

fn parse_body(
    cursor: &mut Cursor,
    keyword: String,
    depth: usize,
) -> Result<WktNode, WktParseError> {
    cursor.skip_whitespace();
    if depth >= MAX_NESTING_DEPTH {
        return Err(WktParseError::NestingTooDeep { offset: cursor.pos });
    }
    let close = match cursor.bump() {
        Some('[') => ']',
        Some('(') => ')',
        Some(character) => {
            return Err(WktParseError::UnexpectedCharacter {
                character,
                offset: cursor.pos - character.len_utf8(),
            })
        }
        None => return Err(WktParseError::UnexpectedEnd),
    };
    let mut values = Vec::new();
    loop {
        cursor.skip_whitespace();
        values.push(parse_value(cursor, depth)?);
        cursor.skip_whitespace();
        match cursor.bump() {
            Some(',') => {}
            Some(character) if character == close => break,
            Some(character) => {
                return Err(WktParseError::UnexpectedCharacter {
                    character,
                    offset: cursor.pos - character.len_utf8(),
                })
            }
            None => return Err(WktParseError::UnexpectedEnd),
        }
    }
    Ok(WktNode { keyword, values })
}

fn parse_value(cursor: &mut Cursor, depth: usize) -> Result<WktValue, WktParseError> {
    match cursor.peek() {
        Some('"') => parse_text(cursor).map(WktValue::Text),
        Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => {
            parse_number(cursor).map(WktValue::Number)
        }
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            let keyword = parse_keyword(cursor)?;
            cursor.skip_whitespace();
            match cursor.peek() {
                Some('[' | '(') => parse_body(cursor, keyword, depth + 1).map(WktValue::Node),
                _ => Ok(WktValue::Keyword(keyword)),
            }
        }
        Some(character) => Err(WktParseError::UnexpectedCharacter {
            character,
            offset: cursor.pos,
        }),
        None => Err(WktParseError::UnexpectedEnd),
    }
}

fn parse_text(cursor: &mut Cursor) -> Result<String, WktParseError> {
    cursor.bump();
    let mut text = String::new();
    loop {
        match cursor.bump() {
            Some('"') => {
                // A doubled quote is an escaped quote.
                if cursor.peek() == Some('"') {
                    cursor.bump();
                    text.push('"');
                } else {
                    return Ok(text);
                }
            }
            Some(character) => text.push(character),
            None => return Err(WktParseError::UnexpectedEnd),
        }
    }
}

fn parse_number(cursor: &mut Cursor) -> Result<f64, WktParseError> {
    let start = cursor.pos;
    while cursor
        .peek()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
    {
        cursor.bump();
    }
    let text = &cursor.input[start..cursor.pos];
    text.parse().map_err(|_| WktParseError::InvalidNumber {
        text: text.to_string(),
        offset: start,
    })
}

pub(crate) fn crs_from_wkt(input: &str) -> Result<Crs, WktParseError> {
    let node = parse_wkt(input)?;
    if node.is("GEOGCRS") || node.is("GEODCRS") || node.is("GEOGCS") {
        read_geographic(&node)
    } else if node.is("PROJCRS") {
        read_projected_v2(&node)
    } else if node.is("PROJCS") {
        read_projected_v1(&node)
    } else {
        Err(WktParseError::UnsupportedKeyword(node.keyword))
    }
}

fn read_geographic(node: &WktNode) -> Result<Crs, WktParseError> {
    let name = node.text(0, "name")?;
    let datum = read_datum(node)?;
    let mut crs = Crs::geographic(name, datum);
    if let Some(authority) = read_authority(node) {
        crs = crs.with_authority(authority);
    }
    Ok(crs)
}

fn read_projected_v2(node: &WktNode) -> Result<Crs, WktParseError> {
    let name = node.text(0, "name")?;
    let base = node
        .child("BASEGEOGCRS")
        .or_else(|| node.child("BASEGEODCRS"))
        .ok_or_else(|| node.missing("BASEGEOGCRS"))?;
    let base_name = base.text(0, "name")?;
    let datum = read_datum(base)?;
    let conversion = node
        .child("CONVERSION")
        .ok_or_else(|| node.missing("CONVERSION"))?;
    let method_node = conversion
        .child("METHOD")
        .ok_or_else(|| conversion.missing("METHOD"))?;
    let method = ProjectionMethod::from_wkt_name(method_node.text(0, "name")?);
    let mut raw = Vec::new();
    for parameter in conversion.children("PARAMETER") {
        raw.push((
            parameter.text(0, "name")?.to_string(),
            parameter.number(1, "value")?,
        ));
    }
    let projection = Projection::new(method.clone(), params_from_wkt(&method, raw));
    let mut crs = Crs::projected(name, base_name, datum, projection);
    if let Some(authority) = read_authority(node) {
        crs = crs.with_authority(authority);
    }
    Ok(crs)
}

fn read_projected_v1(node: &WktNode) -> Result<Crs, WktParseError> {
    let name = node.text(0, "name")?;
    let geogcs = node.child("GEOGCS").ok_or_else(|| node.missing("GEOGCS"))?;
    let base_name = geogcs.text(0, "name")?;
    let datum = read_datum(geogcs)?;
    let projection_node = node
        .child("PROJECTION")
        .ok_or_else(|| node.missing("PROJECTION"))?;
    let method = ProjectionMethod::from_wkt1_name(projection_node.text(0, "name")?);
    let mut raw = Vec::new();
    for parameter in node.children("PARAMETER") {
        raw.push((
            parameter.text(0, "name")?.to_string(),
            parameter.number(1, "value")?,
        ));
    }
    let projection = Projection::new(method.clone(), params_from_wkt1(&method, raw));
    let mut crs = Crs::projected(name, base_name, datum, projection);
    if let Some(authority) = read_authority(node) {
        crs = crs.with_authority(authority);
    }
    Ok(crs)
}

fn read_datum(node: &WktNode) -> Result<Datum, WktParseError> {
    let datum_node = node
        .child("DATUM")
        .or_else(|| node.child("ENSEMBLE"))
        .ok_or_else(|| node.missing("DATUM"))?;
    let datum_name = datum_node.text(0, "name")?;
    let ellipsoid_node = datum_node
        .child("ELLIPSOID")
        .or_else(|| datum_node.child("SPHEROID"))
        .ok_or_else(|| datum_node.missing("ELLIPSOID"))?;
    let ellipsoid_name = ellipsoid_node.text(0, "name")?;
    let semi_major_axis = ellipsoid_node.number(1, "semi-major axis")?;
    let inverse_flattening = ellipsoid_node.number(2, "inverse flattening")?;
    let ellipsoid = if inverse_flattening.abs() < f64::EPSILON {
        Ellipsoid::sphere(ellipsoid_name, semi_major_axis)
    } else {
        Ellipsoid::new(ellipsoid_name, semi_major_axis, inverse_flattening)
    };
    let mut datum = Datum::new(datum_name, ellipsoid);
    if let Some(primem) = node.child("PRIMEM") {
        datum = datum.with_prime_meridian(PrimeMeridian::new(
            primem.text(0, "name")?,
            primem.number(1, "longitude")?,
        ));
    }
    Ok(datum)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn read_authority(node: &WktNode) -> Option<Authority> {
    let authority = node.child("ID").or_else(|| node.child("AUTHORITY"))?;
    let name = authority.text(0, "name").ok()?;
    let code = authority.number(1, "code").ok()?;
    if !code.is_finite() || code < 0.0 || code.fract().abs() > 0.0 {
        return None;
    }
    Some(Authority::new(name, code as u32))
}

fn params_from_wkt(method: &ProjectionMethod, raw: Vec<(String, f64)>) -> Vec<(String, ParamValue)> {
    let Some(spec) = method.spec() else {
        return raw
            .into_iter()
            .map(|(name, value)| (name, ParamValue::Number(value)))
            .collect();
    };
    let mut parameters = Vec::with_capacity(raw.len());
    let mut parallels: [Option<f64>; 2] = [None, None];
    for (name, value) in raw {
        if name.eq_ignore_ascii_case("Latitude of 1st standard parallel") {
            parallels[0] = Some(value);
            continue;
        }
        if name.eq_ignore_ascii_case("Latitude of 2nd standard parallel") {
            parallels[1] = Some(value);
            continue;
        }
        let cf = spec
            .params
            .iter()
            .find(|param| param.wkt.eq_ignore_ascii_case(&name))
            .map(|param| param.cf.to_string());
        parameters.push((cf.unwrap_or(name), ParamValue::Number(value)));
    }
    push_parallels(&mut parameters, parallels);
    parameters
}

fn params_from_wkt1(
    method: &ProjectionMethod,
    raw: Vec<(String, f64)>,
) -> Vec<(String, ParamValue)> {
    let Some(spec) = method.spec() else {
        return raw
            .into_iter()
            .map(|(name, value)| (name, ParamValue::Number(value)))
            .collect();
    };
    let mut parameters = Vec::with_capacity(raw.len());
    let mut parallels: [Option<f64>; 2] = [None, None];
    for (name, value) in raw {
        if name.eq_ignore_ascii_case("standard_parallel_1") {
            parallels[0] = Some(value);
            continue;
        }
        if name.eq_ignore_ascii_case("standard_parallel_2") {
            parallels[1] = Some(value);
            continue;
        }
        let cf = spec
            .params
            .iter()
            .find(|param| param.wkt1.eq_ignore_ascii_case(&name))
            .map(|param| param.cf.to_string());
        parameters.push((cf.unwrap_or(name), ParamValue::Number(value)));
    }
    push_parallels(&mut parameters, parallels);
    parameters
}

fn push_parallels(parameters: &mut Vec<(String, ParamValue)>, parallels: [Option<f64>; 2]) {
    match parallels {
        [Some(first), Some(second)] => parameters.push((
            "standard_parallel".to_string(),
            ParamValue::Numbers(vec![first, second]),
        )),
        [Some(first), None] => {
            parameters.push(("standard_parallel".to_string(), ParamValue::Number(first)));
        }
        _ => {}
    }
}

const DEGREE_UNIT: &str = "ANGLEUNIT[\"degree\",0.0174532925199433]";
const METRE_UNIT: &str = "LENGTHUNIT[\"metre\",1]";
const SCALE_UNIT: &str = "SCALEUNIT[\"unity\",1]";

pub(crate) fn crs_to_wkt(crs: &Crs) -> String {
    match crs.projection() {
        Some(projection) => projected_wkt(crs, projection),
        None => geographic_wkt(crs),
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn number(value: f64) -> String {
    // The shortest decimal form that parses back to the same value.
    format!("{value}")
}

fn ellipsoid_wkt(ellipsoid: &Ellipsoid) -> String {
    format!(
        "ELLIPSOID[{},{},{},{METRE_UNIT}]",
        quote(ellipsoid.name()),
        number(ellipsoid.semi_major_axis()),
        number(ellipsoid.inverse_flattening())
    )
}

fn datum_wkt(datum: &Datum) -> String {
    let prime_meridian = datum.prime_meridian();
    format!(
        "DATUM[{},{}],PRIMEM[{},{},{DEGREE_UNIT}]",
        quote(datum.name()),
        ellipsoid_wkt(datum.ellipsoid()),
        quote(prime_meridian.name()),
        number(prime_meridian.longitude())
    )
}

fn authority_wkt(authority: Option<&Authority>) -> String {
    authority.map_or_else(String::new, |authority| {
        format!(",ID[{},{}]", quote(authority.name()), authority.code())
    })
}

fn geographic_wkt(crs: &Crs) -> String {
    format!(
        "GEOGCRS[{},{},CS[ellipsoidal,2],\
         AXIS[\"geodetic latitude (Lat)\",north,ORDER[1],{DEGREE_UNIT}],\
         AXIS[\"geodetic longitude (Lon)\",east,ORDER[2],{DEGREE_UNIT}]{}]",
        quote(crs.name()),
        datum_wkt(crs.datum()),
        authority_wkt(crs.authority())
    )
}

fn projected_wkt(crs: &Crs, projection: &Projection) -> String {
    format!(
        "PROJCRS[{},BASEGEOGCRS[{},{}],CONVERSION[\"unknown\",METHOD[{}]{}],CS[Cartesian,2],\
         AXIS[\"(E)\",east,ORDER[1],{METRE_UNIT}],\
         AXIS[\"(N)\",north,ORDER[2],{METRE_UNIT}]{}]",
        quote(crs.name()),
        quote(crs.base_name().unwrap_or("unknown")),
        datum_wkt(crs.datum()),
        quote(projection.method().name()),
        parameters_wkt(projection),
        authority_wkt(crs.authority())
    )
}

const fn unit_wkt(kind: ParamKind) -> &'static str {
    match kind {
        ParamKind::Angle => DEGREE_UNIT,
        ParamKind::Length => METRE_UNIT,
        ParamKind::Scale => SCALE_UNIT,
    }
}

fn parameters_wkt(projection: &Projection) -> String {
    let mut out = String::new();
    let spec = projection.method().spec();
    for (name, value) in projection.parameters() {
        let param =
            spec.and_then(|spec| spec.params.iter().find(|param| param.cf == name.as_str()));
        match (param, value) {
            (Some(param), ParamValue::Numbers(values)) if param.cf == "standard_parallel" => {
                if let Some(first) = values.first() {
                    out.push_str(&format!(
                        ",PARAMETER[\"Latitude of 1st standard parallel\",{},{DEGREE_UNIT}]",
                        number(*first)
                    ));
                }
                if let Some(second) = values.get(1) {
                    out.push_str(&format!(
                        ",PARAMETER[\"Latitude of 2nd standard parallel\",{},{DEGREE_UNIT}]",
                        number(*second)
                    ));
                }
            }
            (Some(param), ParamValue::Number(value)) => {
                out.push_str(&format!(
                    ",PARAMETER[{},{},{}]",
                    quote(param.wkt),
                    number(*value),
                    unit_wkt(param.kind)
                ));
            }
            (None, ParamValue::Number(value)) => {
                out.push_str(&format!(",PARAMETER[{},{}]", quote(name), number(*value)));
            }
            // Text values and nonstandard lists have no WKT representation.
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // As carried in the GDAL metadata of a Sentinel-1 GRD product.
    const SENTINEL_WKT1: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AXIS["Latitude",NORTH],AXIS["Longitude",EAST],AUTHORITY["EPSG","4326"]]"#;

    #[test]
    fn parse_nodes() {
        let node = parse_wkt(r#"PRIMEM["Greenwich",0,ANGLEUNIT["degree",0.0174532925199433]]"#)
            .unwrap();
        assert!(node.is("primem"));
        assert_eq!(node.text(0, "name").unwrap(), "Greenwich");
        assert_eq!(node.number(1, "longitude").unwrap(), 0.0);
        assert!(node.child("ANGLEUNIT").is_some());

        let quoted = parse_wkt(r#"DATUM["Unknown ""local"" datum"]"#).unwrap();
        assert_eq!(quoted.text(0, "name").unwrap(), "Unknown \"local\" datum");

        let parens = parse_wkt("CS(ellipsoidal,2)").unwrap();
        assert_eq!(parens.number(1, "dimension").unwrap(), 2.0);
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            parse_wkt("GEOGCRS[\"truncated\""),
            Err(WktParseError::UnexpectedEnd)
        ));
        assert!(matches!(
            parse_wkt("GEOGCRS[\"a\"]trailing"),
            Err(WktParseError::UnexpectedCharacter { .. })
        ));
        assert!(matches!(
            crs_from_wkt(r#"VERTCRS["height"]"#),
            Err(WktParseError::UnsupportedKeyword(_))
        ));
    }

    #[test]
    fn nesting_depth_is_limited() {
        let mut deep = "A[".repeat(200);
        deep.push('1');
        deep.push_str(&"]".repeat(200));
        assert!(matches!(
            parse_wkt(&deep),
            Err(WktParseError::NestingTooDeep { .. })
        ));
    }

    #[test]
    fn read_wkt1_geographic() {
        let crs = crs_from_wkt(SENTINEL_WKT1).unwrap();
        assert!(crs.is_geographic());
        assert_eq!(crs.name(), "WGS 84");
        assert_eq!(crs.datum().name(), "World Geodetic System 1984");
        assert_eq!(crs.datum().ellipsoid().semi_major_axis(), 6_378_137.0);
        assert_eq!(crs.datum().prime_meridian().name(), "Greenwich");
        let authority = crs.authority().unwrap();
        assert_eq!(authority.name(), "EPSG");
        assert_eq!(authority.code(), 4326);
    }

    #[test]
    fn geographic_round_trip() {
        let crs = Crs::from_epsg(4326).unwrap();
        let wkt = crs_to_wkt(&crs);
        assert!(wkt.starts_with("GEOGCRS[\"WGS 84\""));
        assert!(wkt.ends_with("ID[\"EPSG\",4326]]"));
        assert_eq!(crs_from_wkt(&wkt).unwrap(), crs);
    }

    #[test]
    fn projected_round_trip() {
        let crs = Crs::from_epsg(32615).unwrap();
        let wkt = crs_to_wkt(&crs);
        assert!(wkt.contains("METHOD[\"Transverse Mercator\"]"));
        assert!(wkt.contains("PARAMETER[\"Scale factor at natural origin\",0.9996,SCALEUNIT[\"unity\",1]]"));
        assert_eq!(crs_from_wkt(&wkt).unwrap(), crs);
    }

    #[test]
    fn two_standard_parallels_round_trip() {
        let crs = Crs::from_proj_string("+proj=lcc +lat_1=33 +lat_2=45 +lat_0=40 +lon_0=-97 +x_0=0 +y_0=0 +ellps=GRS80")
            .unwrap();
        let wkt = crs_to_wkt(&crs);
        assert!(wkt.contains("PARAMETER[\"Latitude of 1st standard parallel\",33,"));
        assert!(wkt.contains("PARAMETER[\"Latitude of 2nd standard parallel\",45,"));
        assert_eq!(crs_from_wkt(&wkt).unwrap(), crs);
    }
}
