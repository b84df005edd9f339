use super::table_lines::read_table_lines;
use crate::prelude::*;
use once_cell::sync::Lazy;
use regex::Regex;
use std::{collections::HashMap, path::Path};

static QUOTES: Lazy<Regex> = Lazy::new(|| Regex::new("\"").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Reads the phys_geo centroid CSV into coordinates keyed by alpha-3.
///
/// Column 3 holds the latitude and column 4 the longitude.
pub fn load_centroid_table(path: &Path) -> MapResult<HashMap<String, LonLat>> {
    let mut centroids = HashMap::new();
    for (index, line) in read_table_lines(path)?.into_iter().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }

        let (alpha3, lonlat) =
            parse_centroid_line(&line).map_err(|reason| MapError::MalformedRecord {
                path: path.to_path_buf(),
                line: index + 1,
                reason,
            })?;
        centroids.insert(alpha3, lonlat);
    }

    tracing::debug!("Read {} centroids from {}", centroids.len(), path.display());
    Ok(centroids)
}

fn parse_centroid_line(line: &str) -> std::result::Result<(String, LonLat), String> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 5 {
        return Err(format!("expected at least 5 fields, found {}", fields.len()));
    }

    let alpha3 = QUOTES.replace_all(fields[0], "").trim().to_string();
    let lat = parse_degrees(fields[3])?;
    let lon = parse_degrees(fields[4])?;

    Ok((alpha3, LonLat::new(lon, lat)))
}

fn parse_degrees(field: &str) -> std::result::Result<f64, String> {
    field
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid coordinate {:?}: {}", field, e))
}
