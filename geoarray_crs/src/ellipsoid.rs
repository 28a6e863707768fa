//! Reference ellipsoids, geodetic datums, and prime meridians.

/// A reference ellipsoid.
///
/// The shape is stored as the parameters it was defined with.
/// An ellipsoid defined by an inverse flattening keeps that value and derives
/// the semi minor axis on demand, and vice versa.
/// A sphere stores neither.
#[derive(Debug, Clone)]
pub struct Ellipsoid {
    name: String,
    semi_major_axis: f64,
    semi_minor_axis: Option<f64>,
    inverse_flattening: Option<f64>,
}

impl Ellipsoid {
    /// Create an ellipsoid from its semi major axis (in metres) and inverse flattening.
    #[must_use]
    pub fn new(name: impl Into<String>, semi_major_axis: f64, inverse_flattening: f64) -> Self {
        Self {
            name: name.into(),
            semi_major_axis,
            semi_minor_axis: None,
            inverse_flattening: Some(inverse_flattening),
        }
    }

    /// Create an ellipsoid from its semi major and semi minor axes (in metres).
    #[must_use]
    pub fn from_semi_minor_axis(
        name: impl Into<String>,
        semi_major_axis: f64,
        semi_minor_axis: f64,
    ) -> Self {
        Self {
            name: name.into(),
            semi_major_axis,
            semi_minor_axis: Some(semi_minor_axis),
            inverse_flattening: None,
        }
    }

    /// Create an ellipsoid from whichever shape parameters are available.
    #[must_use]
    pub fn from_parameters(
        name: impl Into<String>,
        semi_major_axis: f64,
        semi_minor_axis: Option<f64>,
        inverse_flattening: Option<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            semi_major_axis,
            semi_minor_axis,
            inverse_flattening,
        }
    }

    /// Create a sphere of the given radius (in metres).
    #[must_use]
    pub fn sphere(name: impl Into<String>, radius: f64) -> Self {
        Self {
            name: name.into(),
            semi_major_axis: radius,
            semi_minor_axis: None,
            inverse_flattening: None,
        }
    }

    /// The WGS 84 ellipsoid.
    #[must_use]
    pub fn wgs84() -> Self {
        Self::new("WGS 84", 6_378_137.0, 298.257_223_563)
    }

    /// The GRS 1980 ellipsoid.
    #[must_use]
    pub fn grs80() -> Self {
        Self::new("GRS 1980", 6_378_137.0, 298.257_222_101)
    }

    /// The Clarke 1866 ellipsoid.
    #[must_use]
    pub fn clarke_1866() -> Self {
        Self::from_semi_minor_axis("Clarke 1866", 6_378_206.4, 6_356_583.8)
    }

    /// An unnamed ellipsoid with the WGS 84 shape.
    ///
    /// Used when metadata describes a coordinate system without any shape
    /// parameters.
    #[must_use]
    pub fn unknown() -> Self {
        Self::new("unknown", 6_378_137.0, 298.257_223_563)
    }

    /// The ellipsoid name, or `"unknown"`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The semi major axis in metres.
    #[must_use]
    pub const fn semi_major_axis(&self) -> f64 {
        self.semi_major_axis
    }

    /// The semi minor axis in metres, derived from the inverse flattening if
    /// it was not stored directly.
    #[must_use]
    pub fn semi_minor_axis(&self) -> f64 {
        if let Some(semi_minor_axis) = self.semi_minor_axis {
            semi_minor_axis
        } else if let Some(inverse_flattening) = self.inverse_flattening {
            self.semi_major_axis * (1.0 - 1.0 / inverse_flattening)
        } else {
            self.semi_major_axis
        }
    }

    /// The inverse flattening, derived from the semi minor axis if it was not
    /// stored directly. Zero for a sphere.
    #[must_use]
    pub fn inverse_flattening(&self) -> f64 {
        if let Some(inverse_flattening) = self.inverse_flattening {
            inverse_flattening
        } else if let Some(semi_minor_axis) = self.semi_minor_axis {
            if (self.semi_major_axis - semi_minor_axis).abs() < f64::EPSILON {
                0.0
            } else {
                self.semi_major_axis / (self.semi_major_axis - semi_minor_axis)
            }
        } else {
            0.0
        }
    }

    /// Whether the ellipsoid is a sphere.
    #[must_use]
    pub fn is_sphere(&self) -> bool {
        self.inverse_flattening().abs() < f64::EPSILON
    }

    pub(crate) const fn stored_semi_minor_axis(&self) -> Option<f64> {
        self.semi_minor_axis
    }

    pub(crate) const fn stored_inverse_flattening(&self) -> Option<f64> {
        self.inverse_flattening
    }
}

impl PartialEq for Ellipsoid {
    /// Ellipsoids compare by shape, not by name or by how the shape was
    /// parameterised. The semi major axis must match exactly and the semi
    /// minor axis to within a millimetre, which tolerates inverse flattening
    /// values truncated during metadata round trips.
    #[allow(clippy::float_cmp)]
    fn eq(&self, other: &Self) -> bool {
        self.semi_major_axis == other.semi_major_axis
            && (self.semi_minor_axis() - other.semi_minor_axis()).abs() < 1e-3
    }
}

/// A prime meridian.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimeMeridian {
    name: String,
    longitude: f64,
}

impl PrimeMeridian {
    /// Create a prime meridian at the given longitude (in degrees).
    #[must_use]
    pub fn new(name: impl Into<String>, longitude: f64) -> Self {
        Self {
            name: name.into(),
            longitude,
        }
    }

    /// The Greenwich prime meridian.
    #[must_use]
    pub fn greenwich() -> Self {
        Self::new("Greenwich", 0.0)
    }

    /// The prime meridian name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The longitude of the prime meridian in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl Default for PrimeMeridian {
    fn default() -> Self {
        Self::greenwich()
    }
}

/// A geodetic datum: an ellipsoid positioned relative to a prime meridian.
#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    name: String,
    ellipsoid: Ellipsoid,
    prime_meridian: PrimeMeridian,
}

impl Datum {
    /// Create a datum with the Greenwich prime meridian.
    #[must_use]
    pub fn new(name: impl Into<String>, ellipsoid: Ellipsoid) -> Self {
        Self {
            name: resolve_datum_alias(&name.into()).to_string(),
            ellipsoid,
            prime_meridian: PrimeMeridian::greenwich(),
        }
    }

    /// Set the prime meridian.
    #[must_use]
    pub fn with_prime_meridian(mut self, prime_meridian: PrimeMeridian) -> Self {
        self.prime_meridian = prime_meridian;
        self
    }

    /// The World Geodetic System 1984 datum.
    #[must_use]
    pub fn wgs84() -> Self {
        Self::new("World Geodetic System 1984", Ellipsoid::wgs84())
    }

    /// The North American Datum 1983.
    #[must_use]
    pub fn nad83() -> Self {
        Self::new("North American Datum 1983", Ellipsoid::grs80())
    }

    /// The North American Datum 1927.
    #[must_use]
    pub fn nad27() -> Self {
        Self::new("North American Datum 1927", Ellipsoid::clarke_1866())
    }

    /// The European Terrestrial Reference System 1989 datum.
    #[must_use]
    pub fn etrs89() -> Self {
        Self::new("European Terrestrial Reference System 1989", Ellipsoid::grs80())
    }

    /// An unnamed datum on an [`Ellipsoid::unknown`] ellipsoid.
    #[must_use]
    pub fn unknown() -> Self {
        Self::new("unknown", Ellipsoid::unknown())
    }

    /// The datum name, or `"unknown"`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The reference ellipsoid.
    #[must_use]
    pub const fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    /// The prime meridian.
    #[must_use]
    pub const fn prime_meridian(&self) -> &PrimeMeridian {
        &self.prime_meridian
    }
}

/// Map the common aliases of well known datums to their canonical names.
///
/// ESRI style and underscore separated spellings are widespread in WKT1 and
/// CF attributes written by other software.
pub(crate) fn resolve_datum_alias(name: &str) -> &str {
    match name {
        "WGS_1984" | "D_WGS_1984" | "WGS84" | "WGS 1984"
        | "World Geodetic System 1984 ensemble" => "World Geodetic System 1984",
        "North_American_Datum_1983" | "D_North_American_1983" | "NAD83" | "NAD 83" => {
            "North American Datum 1983"
        }
        "North_American_Datum_1927" | "D_North_American_1927" | "NAD27" | "NAD 27" => {
            "North American Datum 1927"
        }
        "European_Terrestrial_Reference_System_1989" | "D_ETRS_1989" | "ETRS89"
        | "European Terrestrial Reference System 1989 ensemble" => {
            "European Terrestrial Reference System 1989"
        }
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ellipsoid_derived_parameters() {
        let wgs84 = Ellipsoid::wgs84();
        assert_eq!(wgs84.semi_major_axis(), 6_378_137.0);
        assert!((wgs84.semi_minor_axis() - 6_356_752.314_245).abs() < 1e-3);
        assert!(!wgs84.is_sphere());

        let clarke = Ellipsoid::clarke_1866();
        assert!((clarke.inverse_flattening() - 294.978_698).abs() < 1e-3);

        let sphere = Ellipsoid::sphere("sphere", 6_370_997.0);
        assert_eq!(sphere.semi_minor_axis(), 6_370_997.0);
        assert_eq!(sphere.inverse_flattening(), 0.0);
        assert!(sphere.is_sphere());
    }

    #[test]
    fn ellipsoid_equality_tolerates_truncated_flattening() {
        // Shape parameters as written by a satellite product generator.
        let from_axes = Ellipsoid::from_parameters(
            "unknown",
            6_378_137.0,
            Some(6_356_752.31414),
            Some(298.2572221),
        );
        let from_flattening = Ellipsoid::new("GRS 1980", 6_378_137.0, 298.2572221);
        assert_eq!(from_axes, from_flattening);
        assert_eq!(from_flattening, Ellipsoid::grs80());
        assert_ne!(Ellipsoid::grs80(), Ellipsoid::clarke_1866());
    }

    #[test]
    fn datum_aliases() {
        assert_eq!(
            Datum::new("WGS_1984", Ellipsoid::wgs84()),
            Datum::wgs84()
        );
        assert_eq!(
            resolve_datum_alias("D_North_American_1983"),
            "North American Datum 1983"
        );
        assert_eq!(resolve_datum_alias("Unknown datum"), "Unknown datum");
    }
}
