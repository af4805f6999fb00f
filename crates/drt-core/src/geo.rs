//! Geographic coordinates for network nodes and charger sites.

/// A WGS-84 coordinate in single precision (about 1 m at the equator).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f32,
    pub lon: f32,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f32, lon: f32) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance in metres (haversine, mean Earth radius).
    pub fn distance_m(self, other: GeoPoint) -> f32 {
        const EARTH_RADIUS_M: f32 = 6_371_000.0;

        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let half_dphi = (other.lat - self.lat).to_radians() * 0.5;
        let half_dlambda = (other.lon - self.lon).to_radians() * 0.5;

        let h = half_dphi.sin().powi(2) + phi1.cos() * phi2.cos() * half_dlambda.sin().powi(2);
        2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lon)
    }
}
