use super::surface::{MapSurface, COUNTRY_LABEL, COUNTRY_POLYGON};
use crate::{
    country::lookup::CountryLookup,
    prelude::*,
    shape::shp_reader::{open_country_shapes, split_parts},
};
use itertools::Itertools;
use std::path::Path;

/// Draws one country's adm0 boundary and places its alpha-2 code at its centroid.
///
/// The boundary file is fully decoded before anything is drawn, so a country that
/// fails leaves the surface untouched. Returns the number of rings drawn.
pub fn render_country<S: MapSurface + ?Sized>(
    surface: &mut S,
    alpha2: &str,
    lookup: &CountryLookup,
    shape_dir: &Path,
) -> MapResult<usize> {
    let country = lookup.resolve(alpha2)?;
    let shapes = open_country_shapes(shape_dir, country.alpha3)?;

    let mut ring_count = 0;
    for shape in &shapes {
        let projected: Vec<(f64, f64)> = shape
            .points()
            .iter()
            .map(|&lonlat| surface.project(lonlat))
            .collect();
        let rings = split_parts(&projected, shape.parts());
        surface.add_polygons(&rings, &COUNTRY_POLYGON);
        ring_count += rings.len();
    }

    let at = surface.project(country.centroid);
    surface.add_label(alpha2, at, &COUNTRY_LABEL);
    tracing::debug!("Drew {} ({}) with {} rings", alpha2, country.alpha3, ring_count);

    Ok(ring_count)
}

/// Renders every code in turn, skipping countries that cannot be drawn.
///
/// Returns the sorted codes that were skipped. Only unrecoverable errors
/// (see [`MapError::is_recoverable`]) abort the loop.
pub fn render_countries<S: MapSurface + ?Sized>(
    surface: &mut S,
    codes: &[&str],
    lookup: &CountryLookup,
    shape_dir: &Path,
) -> MapResult<Vec<String>> {
    let mut missing = Vec::new();
    for &code in codes {
        match render_country(surface, code, lookup, shape_dir) {
            Ok(_) => {}
            Err(e) if e.is_recoverable() => {
                match &e {
                    MapError::MalformedShape { .. } => tracing::error!("{}", e),
                    _ => tracing::debug!("{}", e),
                }
                missing.push(code.to_string());
            }
            Err(e) => return Err(e),
        }
    }

    missing.sort();
    if !missing.is_empty() {
        tracing::warn!("No information for {}", missing.iter().join(","));
    }

    Ok(missing)
}

/// Rounds a coordinate to a multiple of ten, then steps `inc` outwards.
///
/// The division truncates toward zero, so `round_out(-48.0, true, 10.0)` is
/// `-30.0` rather than `-40.0`.
pub fn round_out(coord: f64, up: bool, inc: f64) -> f64 {
    let base = (coord / 10.0).trunc() * 10.0;
    match up {
        true => base + inc,
        false => base - inc,
    }
}

/// Values `start, start + step, ...` strictly below `stop`.
pub fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || stop <= start {
        return Vec::new();
    }

    let count = ((stop - start) / step).ceil() as usize;
    (0..count).map(|i| start + i as f64 * step).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_out_positive() {
        assert_eq!(round_out(28.0, true, 10.0), 30.0);
        assert_eq!(round_out(31.0, false, 10.0), 20.0);
        assert_eq!(round_out(61.0, false, 10.0), 50.0);
        assert_eq!(round_out(0.0, false, 10.0), -10.0);
    }

    #[test]
    fn test_round_out_truncates_negative_toward_zero() {
        assert_eq!(round_out(-70.0, false, 10.0), -80.0);
        assert_eq!(round_out(-48.0, true, 10.0), -30.0);
        assert_eq!(round_out(-48.0, false, 10.0), -50.0);
        assert_eq!(round_out(-92.0, false, 10.0), -100.0);
        assert_eq!(round_out(-5.0, false, 10.0), -10.0);
    }

    #[test]
    fn test_round_out_straddles_coordinate() {
        for x in [-87.0, -48.0, -12.5, 3.0, 28.0, 61.0, 67.0] {
            let low = round_out(x, false, 10.0);
            let high = round_out(x, true, 10.0);
            assert!(low <= x && high >= x, "{} not within [{}, {}]", x, low, high);
            assert!(high - low >= 10.0);
        }
    }

    #[test]
    fn test_arange_is_half_open() {
        assert_eq!(arange(-20.0, 50.0, 10.0), vec![-20.0, -10.0, 0.0, 10.0, 20.0, 30.0, 40.0]);
        assert_eq!(arange(20.0, 21.0, 10.0), vec![20.0]);
        assert!(arange(5.0, 5.0, 10.0).is_empty());
    }
}
