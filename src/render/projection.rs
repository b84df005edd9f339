use crate::country::centroid_table::LonLat;

/// Authalic sphere radius in metres.
pub const EARTH_RADIUS: f64 = 6_371_007.2;

/// Spherical Lambert azimuthal equal-area projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Laea {
    lon0: f64,
    sin_lat0: f64,
    cos_lat0: f64,
}

impl Laea {
    pub fn new(center: LonLat) -> Self {
        let lat0 = center.lat.to_radians();
        Self {
            lon0: center.lon.to_radians(),
            sin_lat0: lat0.sin(),
            cos_lat0: lat0.cos(),
        }
    }

    /// Projected `(x, y)` in metres, or NaN for the antipode of the centre.
    pub fn forward(&self, lonlat: LonLat) -> (f64, f64) {
        let lat = lonlat.lat.to_radians();
        let dlon = lonlat.lon.to_radians() - self.lon0;
        let (sin_lat, cos_lat) = lat.sin_cos();
        let cos_dlon = dlon.cos();

        let denom = 1.0 + self.sin_lat0 * sin_lat + self.cos_lat0 * cos_lat * cos_dlon;
        if denom <= f64::EPSILON {
            return (f64::NAN, f64::NAN);
        }
        let k = (2.0 / denom).sqrt();

        let x = EARTH_RADIUS * k * cos_lat * dlon.sin();
        let y = EARTH_RADIUS * k * (self.cos_lat0 * sin_lat - self.sin_lat0 * cos_lat * cos_dlon);
        (x, y)
    }
}

/// Projected rectangle spanned by the lower-left and upper-right map corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Extent {
    pub fn from_corners(projection: &Laea, lower_left: LonLat, upper_right: LonLat) -> Self {
        let (x_min, y_min) = projection.forward(lower_left);
        let (x_max, y_max) = projection.forward(upper_right);
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}
