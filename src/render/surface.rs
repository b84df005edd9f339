use crate::country::centroid_table::LonLat;

/// RGB colour with components in `0..=255`.
pub type Rgb = [u8; 3];

pub const LIGHT_GREEN: Rgb = [144, 238, 144];
pub const BLACK: Rgb = [0, 0, 0];
pub const WHITE: Rgb = [255, 255, 255];
pub const RED: Rgb = [255, 0, 0];

#[derive(Debug, Clone, PartialEq)]
pub struct PolygonStyle {
    pub face: Rgb,
    pub edge: Rgb,
    /// Edge width in points.
    pub edge_width: f32,
    pub alpha: f32,
    pub antialiased: bool,
}

/// Filled country boundary: translucent light green with a hairline black edge.
pub const COUNTRY_POLYGON: PolygonStyle = PolygonStyle {
    face: LIGHT_GREEN,
    edge: BLACK,
    edge_width: 0.1,
    alpha: 0.5,
    antialiased: true,
};

#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub color: Rgb,
    /// Font size in points.
    pub size: f32,
    pub halo: Rgb,
    /// Width of the halo stroke in points.
    pub halo_width: f32,
    /// Shadow offset in points, x to the right and y upwards.
    pub shadow_offset: (f32, f32),
    pub shadow_alpha: f32,
}

/// Country code label, readable over both land and water.
pub const COUNTRY_LABEL: LabelStyle = LabelStyle {
    color: RED,
    size: 10.0,
    halo: WHITE,
    halo_width: 3.0,
    shadow_offset: (2.0, -2.0),
    shadow_alpha: 0.3,
};

/// Something a map can be drawn onto.
///
/// Surfaces are append-only: shapes and labels are added, never removed.
pub trait MapSurface {
    /// Projects a geographic coordinate into surface coordinates.
    fn project(&self, lonlat: LonLat) -> (f64, f64);

    /// Adds filled polygons, one per ring, given in surface coordinates.
    fn add_polygons(&mut self, rings: &[&[(f64, f64)]], style: &PolygonStyle);

    /// Adds a text label centred on a point in surface coordinates.
    fn add_label(&mut self, text: &str, at: (f64, f64), style: &LabelStyle);
}
