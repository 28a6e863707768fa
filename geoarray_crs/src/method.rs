//! Map projection methods and their parameters.
//!
//! Each supported method has a static table mapping its parameter names
//! between the CF, WKT2, WKT1, and PROJ conventions. Methods outside the
//! table are carried through opaquely as [`ProjectionMethod::Other`].

use derive_more::derive::From;

/// The unit class of a projection parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParamKind {
    /// Degrees.
    Angle,
    /// Metres.
    Length,
    /// Unitless scale factor.
    Scale,
}

/// One projection parameter under each naming convention.
#[derive(Debug)]
pub(crate) struct ParamSpec {
    /// CF grid mapping attribute name.
    pub(crate) cf: &'static str,
    /// WKT2 parameter name.
    pub(crate) wkt: &'static str,
    /// WKT1 parameter name.
    pub(crate) wkt1: &'static str,
    /// PROJ string key.
    pub(crate) proj: &'static str,
    pub(crate) kind: ParamKind,
}

/// A projection method under each naming convention, with its parameters in
/// canonical (CF appendix) order.
#[derive(Debug)]
pub(crate) struct MethodSpec {
    pub(crate) cf: &'static str,
    pub(crate) wkt: &'static str,
    pub(crate) wkt1: &'static str,
    pub(crate) proj: &'static str,
    pub(crate) params: &'static [ParamSpec],
}

const LAT_ORIGIN: ParamSpec = ParamSpec {
    cf: "latitude_of_projection_origin",
    wkt: "Latitude of natural origin",
    wkt1: "latitude_of_origin",
    proj: "lat_0",
    kind: ParamKind::Angle,
};
const LON_ORIGIN: ParamSpec = ParamSpec {
    cf: "longitude_of_projection_origin",
    wkt: "Longitude of natural origin",
    wkt1: "central_meridian",
    proj: "lon_0",
    kind: ParamKind::Angle,
};
const LON_CENTRAL_MERIDIAN: ParamSpec = ParamSpec {
    cf: "longitude_of_central_meridian",
    wkt: "Longitude of natural origin",
    wkt1: "central_meridian",
    proj: "lon_0",
    kind: ParamKind::Angle,
};
const LON_NATURAL_POLE: ParamSpec = ParamSpec {
    cf: "straight_vertical_longitude_from_pole",
    wkt: "Longitude of natural origin",
    wkt1: "central_meridian",
    proj: "lon_0",
    kind: ParamKind::Angle,
};
const LON_POLE_ORIGIN: ParamSpec = ParamSpec {
    cf: "straight_vertical_longitude_from_pole",
    wkt: "Longitude of origin",
    wkt1: "central_meridian",
    proj: "lon_0",
    kind: ParamKind::Angle,
};
const LAT_FALSE_ORIGIN: ParamSpec = ParamSpec {
    cf: "latitude_of_projection_origin",
    wkt: "Latitude of false origin",
    wkt1: "latitude_of_origin",
    proj: "lat_0",
    kind: ParamKind::Angle,
};
const LON_FALSE_ORIGIN: ParamSpec = ParamSpec {
    cf: "longitude_of_central_meridian",
    wkt: "Longitude of false origin",
    wkt1: "central_meridian",
    proj: "lon_0",
    kind: ParamKind::Angle,
};
const STANDARD_PARALLEL: ParamSpec = ParamSpec {
    cf: "standard_parallel",
    wkt: "Latitude of 1st standard parallel",
    wkt1: "standard_parallel_1",
    proj: "lat_1",
    kind: ParamKind::Angle,
};
const STANDARD_PARALLEL_NATURAL: ParamSpec = ParamSpec {
    cf: "standard_parallel",
    wkt: "Latitude of natural origin",
    wkt1: "latitude_of_origin",
    proj: "lat_1",
    kind: ParamKind::Angle,
};
const STANDARD_PARALLEL_TS: ParamSpec = ParamSpec {
    cf: "standard_parallel",
    wkt: "Latitude of standard parallel",
    wkt1: "standard_parallel_1",
    proj: "lat_ts",
    kind: ParamKind::Angle,
};
const SCALE_FACTOR_ORIGIN: ParamSpec = ParamSpec {
    cf: "scale_factor_at_projection_origin",
    wkt: "Scale factor at natural origin",
    wkt1: "scale_factor",
    proj: "k_0",
    kind: ParamKind::Scale,
};
const SCALE_FACTOR_CENTRAL_MERIDIAN: ParamSpec = ParamSpec {
    cf: "scale_factor_at_central_meridian",
    wkt: "Scale factor at natural origin",
    wkt1: "scale_factor",
    proj: "k_0",
    kind: ParamKind::Scale,
};
const SATELLITE_HEIGHT: ParamSpec = ParamSpec {
    cf: "perspective_point_height",
    wkt: "Satellite height",
    wkt1: "satellite_height",
    proj: "h",
    kind: ParamKind::Length,
};
const FALSE_EASTING: ParamSpec = ParamSpec {
    cf: "false_easting",
    wkt: "False easting",
    wkt1: "false_easting",
    proj: "x_0",
    kind: ParamKind::Length,
};
const FALSE_NORTHING: ParamSpec = ParamSpec {
    cf: "false_northing",
    wkt: "False northing",
    wkt1: "false_northing",
    proj: "y_0",
    kind: ParamKind::Length,
};
const EASTING_FALSE_ORIGIN: ParamSpec = ParamSpec {
    cf: "false_easting",
    wkt: "Easting at false origin",
    wkt1: "false_easting",
    proj: "x_0",
    kind: ParamKind::Length,
};
const NORTHING_FALSE_ORIGIN: ParamSpec = ParamSpec {
    cf: "false_northing",
    wkt: "Northing at false origin",
    wkt1: "false_northing",
    proj: "y_0",
    kind: ParamKind::Length,
};

static ALBERS: MethodSpec = MethodSpec {
    cf: "albers_conical_equal_area",
    wkt: "Albers Equal Area",
    wkt1: "Albers_Conic_Equal_Area",
    proj: "aea",
    params: &[
        STANDARD_PARALLEL,
        LAT_FALSE_ORIGIN,
        LON_FALSE_ORIGIN,
        EASTING_FALSE_ORIGIN,
        NORTHING_FALSE_ORIGIN,
    ],
};
static AZIMUTHAL_EQUIDISTANT: MethodSpec = MethodSpec {
    cf: "azimuthal_equidistant",
    wkt: "Azimuthal Equidistant",
    wkt1: "Azimuthal_Equidistant",
    proj: "aeqd",
    params: &[LAT_ORIGIN, LON_ORIGIN, FALSE_EASTING, FALSE_NORTHING],
};
static GEOS_SWEEP_X: MethodSpec = MethodSpec {
    cf: "geostationary",
    wkt: "Geostationary Satellite (Sweep X)",
    wkt1: "Geostationary_Satellite",
    proj: "geos",
    params: &[
        LAT_ORIGIN,
        LON_ORIGIN,
        SATELLITE_HEIGHT,
        FALSE_EASTING,
        FALSE_NORTHING,
    ],
};
static GEOS_SWEEP_Y: MethodSpec = MethodSpec {
    cf: "geostationary",
    wkt: "Geostationary Satellite (Sweep Y)",
    wkt1: "Geostationary_Satellite",
    proj: "geos",
    params: &[
        LAT_ORIGIN,
        LON_ORIGIN,
        SATELLITE_HEIGHT,
        FALSE_EASTING,
        FALSE_NORTHING,
    ],
};
static LAEA: MethodSpec = MethodSpec {
    cf: "lambert_azimuthal_equal_area",
    wkt: "Lambert Azimuthal Equal Area",
    wkt1: "Lambert_Azimuthal_Equal_Area",
    proj: "laea",
    params: &[LAT_ORIGIN, LON_ORIGIN, FALSE_EASTING, FALSE_NORTHING],
};
static LCC_1SP: MethodSpec = MethodSpec {
    cf: "lambert_conformal_conic",
    wkt: "Lambert Conic Conformal (1SP)",
    wkt1: "Lambert_Conformal_Conic_1SP",
    proj: "lcc",
    params: &[
        STANDARD_PARALLEL_NATURAL,
        LON_CENTRAL_MERIDIAN,
        SCALE_FACTOR_ORIGIN,
        FALSE_EASTING,
        FALSE_NORTHING,
    ],
};
static LCC_2SP: MethodSpec = MethodSpec {
    cf: "lambert_conformal_conic",
    wkt: "Lambert Conic Conformal (2SP)",
    wkt1: "Lambert_Conformal_Conic_2SP",
    proj: "lcc",
    params: &[
        STANDARD_PARALLEL,
        LAT_FALSE_ORIGIN,
        LON_FALSE_ORIGIN,
        EASTING_FALSE_ORIGIN,
        NORTHING_FALSE_ORIGIN,
    ],
};
static MERCATOR_A: MethodSpec = MethodSpec {
    cf: "mercator",
    wkt: "Mercator (variant A)",
    wkt1: "Mercator_1SP",
    proj: "merc",
    params: &[
        LON_ORIGIN,
        SCALE_FACTOR_ORIGIN,
        FALSE_EASTING,
        FALSE_NORTHING,
    ],
};
static MERCATOR_B: MethodSpec = MethodSpec {
    cf: "mercator",
    wkt: "Mercator (variant B)",
    wkt1: "Mercator_2SP",
    proj: "merc",
    params: &[
        STANDARD_PARALLEL_TS,
        LON_ORIGIN,
        FALSE_EASTING,
        FALSE_NORTHING,
    ],
};
static ORTHOGRAPHIC: MethodSpec = MethodSpec {
    cf: "orthographic",
    wkt: "Orthographic",
    wkt1: "Orthographic",
    proj: "ortho",
    params: &[LAT_ORIGIN, LON_ORIGIN, FALSE_EASTING, FALSE_NORTHING],
};
static POLAR_STEREOGRAPHIC_A: MethodSpec = MethodSpec {
    cf: "polar_stereographic",
    wkt: "Polar Stereographic (variant A)",
    wkt1: "Polar_Stereographic",
    proj: "stere",
    params: &[
        LAT_ORIGIN,
        LON_NATURAL_POLE,
        SCALE_FACTOR_ORIGIN,
        FALSE_EASTING,
        FALSE_NORTHING,
    ],
};
static POLAR_STEREOGRAPHIC_B: MethodSpec = MethodSpec {
    cf: "polar_stereographic",
    wkt: "Polar Stereographic (variant B)",
    wkt1: "Polar_Stereographic",
    proj: "stere",
    params: &[
        STANDARD_PARALLEL_TS,
        LON_POLE_ORIGIN,
        FALSE_EASTING,
        FALSE_NORTHING,
    ],
};
static SINUSOIDAL: MethodSpec = MethodSpec {
    cf: "sinusoidal",
    wkt: "Sinusoidal",
    wkt1: "Sinusoidal",
    proj: "sinu",
    params: &[LON_ORIGIN, FALSE_EASTING, FALSE_NORTHING],
};
static STEREOGRAPHIC: MethodSpec = MethodSpec {
    cf: "stereographic",
    wkt: "Stereographic",
    wkt1: "Stereographic",
    proj: "stere",
    params: &[
        LAT_ORIGIN,
        LON_ORIGIN,
        SCALE_FACTOR_ORIGIN,
        FALSE_EASTING,
        FALSE_NORTHING,
    ],
};
static TRANSVERSE_MERCATOR: MethodSpec = MethodSpec {
    cf: "transverse_mercator",
    wkt: "Transverse Mercator",
    wkt1: "Transverse_Mercator",
    proj: "tmerc",
    params: &[
        LAT_ORIGIN,
        LON_CENTRAL_MERIDIAN,
        SCALE_FACTOR_CENTRAL_MERIDIAN,
        FALSE_EASTING,
        FALSE_NORTHING,
    ],
};

/// A map projection method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionMethod {
    /// Albers Equal Area.
    AlbersConicalEqualArea,
    /// Azimuthal Equidistant.
    AzimuthalEquidistant,
    /// Geostationary Satellite with the scan sweep along the x axis (GOES-R).
    GeostationarySweepX,
    /// Geostationary Satellite with the scan sweep along the y axis (Meteosat).
    GeostationarySweepY,
    /// Lambert Azimuthal Equal Area.
    LambertAzimuthalEqualArea,
    /// Lambert Conic Conformal with one standard parallel.
    LambertConformalConic1Sp,
    /// Lambert Conic Conformal with two standard parallels.
    LambertConformalConic2Sp,
    /// Mercator parameterised by a scale factor at the natural origin.
    MercatorVariantA,
    /// Mercator parameterised by a standard parallel.
    MercatorVariantB,
    /// Orthographic.
    Orthographic,
    /// Polar Stereographic parameterised by a scale factor at the pole.
    PolarStereographicVariantA,
    /// Polar Stereographic parameterised by a standard parallel.
    PolarStereographicVariantB,
    /// Sinusoidal.
    Sinusoidal,
    /// Oblique Stereographic.
    Stereographic,
    /// Transverse Mercator.
    TransverseMercator,
    /// A method outside the supported set, carried through by name.
    Other(String),
}

impl ProjectionMethod {
    /// All methods with a parameter table.
    pub(crate) const TABLED: &'static [Self] = &[
        Self::AlbersConicalEqualArea,
        Self::AzimuthalEquidistant,
        Self::GeostationarySweepX,
        Self::GeostationarySweepY,
        Self::LambertAzimuthalEqualArea,
        Self::LambertConformalConic1Sp,
        Self::LambertConformalConic2Sp,
        Self::MercatorVariantA,
        Self::MercatorVariantB,
        Self::Orthographic,
        Self::PolarStereographicVariantA,
        Self::PolarStereographicVariantB,
        Self::Sinusoidal,
        Self::Stereographic,
        Self::TransverseMercator,
    ];

    pub(crate) fn spec(&self) -> Option<&'static MethodSpec> {
        match self {
            Self::AlbersConicalEqualArea => Some(&ALBERS),
            Self::AzimuthalEquidistant => Some(&AZIMUTHAL_EQUIDISTANT),
            Self::GeostationarySweepX => Some(&GEOS_SWEEP_X),
            Self::GeostationarySweepY => Some(&GEOS_SWEEP_Y),
            Self::LambertAzimuthalEqualArea => Some(&LAEA),
            Self::LambertConformalConic1Sp => Some(&LCC_1SP),
            Self::LambertConformalConic2Sp => Some(&LCC_2SP),
            Self::MercatorVariantA => Some(&MERCATOR_A),
            Self::MercatorVariantB => Some(&MERCATOR_B),
            Self::Orthographic => Some(&ORTHOGRAPHIC),
            Self::PolarStereographicVariantA => Some(&POLAR_STEREOGRAPHIC_A),
            Self::PolarStereographicVariantB => Some(&POLAR_STEREOGRAPHIC_B),
            Self::Sinusoidal => Some(&SINUSOIDAL),
            Self::Stereographic => Some(&STEREOGRAPHIC),
            Self::TransverseMercator => Some(&TRANSVERSE_MERCATOR),
            Self::Other(_) => None,
        }
    }

    /// The method name in WKT2 form, such as `"Transverse Mercator"`.
    ///
    /// [`ProjectionMethod::Other`] yields the name it was read with.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Other(name) => name,
            _ => self.spec().map_or("unknown", |spec| spec.wkt),
        }
    }

    /// The CF `grid_mapping_name` for the method.
    ///
    /// [`ProjectionMethod::Other`] yields the name it was read with.
    #[must_use]
    pub fn cf_name(&self) -> &str {
        match self {
            Self::Other(name) => name,
            _ => self.spec().map_or("unknown", |spec| spec.cf),
        }
    }

    /// Look up a method from its WKT2 name. Unrecognised names become
    /// [`ProjectionMethod::Other`].
    pub(crate) fn from_wkt_name(name: &str) -> Self {
        Self::TABLED
            .iter()
            .find(|method| {
                method
                    .spec()
                    .is_some_and(|spec| spec.wkt.eq_ignore_ascii_case(name))
            })
            .cloned()
            .unwrap_or_else(|| Self::Other(name.to_string()))
    }

    /// Look up a method from its WKT1 projection name.
    ///
    /// WKT1 cannot express the geostationary sweep axis or the polar
    /// stereographic variant, so those resolve to the PROJ defaults
    /// (sweep y, variant B).
    pub(crate) fn from_wkt1_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("Geostationary_Satellite") {
            return Self::GeostationarySweepY;
        }
        if name.eq_ignore_ascii_case("Polar_Stereographic") {
            return Self::PolarStereographicVariantB;
        }
        Self::TABLED
            .iter()
            .find(|method| {
                method
                    .spec()
                    .is_some_and(|spec| spec.wkt1.eq_ignore_ascii_case(name))
            })
            .cloned()
            .unwrap_or_else(|| Self::Other(name.to_string()))
    }
}

/// A projection parameter value.
#[derive(Debug, Clone, PartialEq, From)]
pub enum ParamValue {
    /// A single numeric value.
    Number(f64),
    /// Multiple numeric values, as used by methods with two standard
    /// parallels.
    Numbers(Vec<f64>),
    /// A text value carried through from an unrecognised grid mapping.
    Text(String),
}

impl ParamValue {
    /// The value as a number, if it is one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Numbers(_) | Self::Text(_) => None,
        }
    }
}

/// A map projection: a method with its parameter values, keyed by the CF
/// parameter names.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    method: ProjectionMethod,
    parameters: Vec<(String, ParamValue)>,
}

impl Projection {
    /// Create a projection.
    ///
    /// Parameters of a tabled method are reordered into the canonical table
    /// order so that projections compare equal regardless of the order their
    /// source metadata listed them in. Parameters outside the table keep
    /// their given order at the end.
    #[must_use]
    pub fn new(method: ProjectionMethod, parameters: Vec<(String, ParamValue)>) -> Self {
        let parameters = match method.spec() {
            Some(spec) => reorder_canonical(spec, parameters),
            None => parameters,
        };
        Self { method, parameters }
    }

    /// The projection method.
    #[must_use]
    pub const fn method(&self) -> &ProjectionMethod {
        &self.method
    }

    /// The parameters in canonical order, keyed by CF parameter name.
    #[must_use]
    pub fn parameters(&self) -> &[(String, ParamValue)] {
        &self.parameters
    }

    /// The value of the parameter with the given CF name.
    #[must_use]
    pub fn parameter(&self, cf_name: &str) -> Option<&ParamValue> {
        self.parameters
            .iter()
            .find_map(|(name, value)| (name == cf_name).then_some(value))
    }
}

/// The Transverse Mercator parameters of a UTM zone.
pub(crate) fn utm_parameters(zone: u32, south: bool) -> Vec<(String, ParamValue)> {
    vec![
        (
            "latitude_of_projection_origin".to_string(),
            ParamValue::Number(0.0),
        ),
        (
            "longitude_of_central_meridian".to_string(),
            ParamValue::Number(f64::from(zone) * 6.0 - 183.0),
        ),
        (
            "scale_factor_at_central_meridian".to_string(),
            ParamValue::Number(0.9996),
        ),
        ("false_easting".to_string(), ParamValue::Number(500_000.0)),
        (
            "false_northing".to_string(),
            ParamValue::Number(if south { 10_000_000.0 } else { 0.0 }),
        ),
    ]
}

fn reorder_canonical(
    spec: &MethodSpec,
    mut parameters: Vec<(String, ParamValue)>,
) -> Vec<(String, ParamValue)> {
    let mut ordered = Vec::with_capacity(parameters.len());
    for param in spec.params {
        if let Some(position) = parameters.iter().position(|(name, _)| name == param.cf) {
            ordered.push(parameters.remove(position));
        }
    }
    ordered.append(&mut parameters);
    ordered
}
