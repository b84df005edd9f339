//! Reader for the geometry half (`.shp`) of an ESRI shapefile.
//!
//! Only what a boundary map needs is decoded: the part start indices and XY
//! vertices of polygon and polyline records. Z and M trailers are skipped,
//! and the `.dbf` attribute table is never opened.

use crate::{country::centroid_table::LonLat, prelude::*};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use itertools::Itertools;
use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

const FILE_CODE: i32 = 9994;
const FILE_VERSION: i32 = 1000;
const HEADER_LEN: usize = 100;
const RECORD_HEADER_LEN: usize = 8;
// shape type + bounding box + part count + point count
const MULTIPART_PREFIX_LEN: usize = 4 + 32 + 4 + 4;

const NULL_SHAPE: i32 = 0;

fn is_multipart(shape_type: i32) -> bool {
    // PolyLine, Polygon and their Z and M variants
    matches!(shape_type, 3 | 5 | 13 | 15 | 23 | 25)
}

/// One shapefile record: vertices plus the index at which each ring starts.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryShape {
    parts: Vec<usize>,
    points: Vec<LonLat>,
}

impl BoundaryShape {
    pub fn new(parts: Vec<usize>, points: Vec<LonLat>) -> std::result::Result<Self, String> {
        if let Some(&index) = parts.iter().find(|&&index| index >= points.len()) {
            return Err(format!(
                "part index {} out of range for {} points",
                index,
                points.len()
            ));
        }
        if let Some((a, b)) = parts.iter().tuple_windows().find(|(a, b)| a > b) {
            return Err(format!("part indices not ascending: {} before {}", a, b));
        }

        Ok(Self { parts, points })
    }

    pub fn parts(&self) -> &[usize] {
        &self.parts
    }

    pub fn points(&self) -> &[LonLat] {
        &self.points
    }
}

/// Splits a flattened vertex array into rings at the recorded part starts.
///
/// A shape with a single part (or none) is one ring spanning the whole array.
/// Otherwise ring `i` runs from `parts[i]` up to `parts[i + 1]` and the last ring
/// runs to the end of the array.
pub fn split_parts<'a, T>(coords: &'a [T], parts: &[usize]) -> Vec<&'a [T]> {
    if parts.len() <= 1 {
        return vec![coords];
    }

    let mut rings: Vec<&[T]> = parts
        .iter()
        .tuple_windows()
        .filter_map(|(&start, &end)| coords.get(start..end))
        .collect();
    if let Some(last) = parts.last().and_then(|&start| coords.get(start..)) {
        rings.push(last);
    }

    rings
}

pub fn shape_path(shape_dir: &Path, alpha3: &str) -> PathBuf {
    shape_dir.join(format!("{}_adm0.shp", alpha3))
}

/// Opens the adm0 boundary file of one country.
///
/// A missing file is reported as [`MapError::ShapeNotFound`]; not every country
/// has boundary data, and callers skip those.
pub fn open_country_shapes(shape_dir: &Path, alpha3: &str) -> MapResult<Vec<BoundaryShape>> {
    let path = shape_path(shape_dir, alpha3);
    if !path.is_file() {
        return Err(MapError::ShapeNotFound {
            alpha3: alpha3.to_string(),
            path,
        });
    }

    read_shapefile(&path)
}

pub fn read_shapefile(path: &Path) -> MapResult<Vec<BoundaryShape>> {
    let bytes = fs::read(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let shapes = decode_shapes(&bytes).map_err(|reason| MapError::MalformedShape {
        path: path.to_path_buf(),
        reason,
    })?;
    tracing::debug!("Decoded {} shapes from {}", shapes.len(), path.display());

    Ok(shapes)
}

pub fn decode_shapes(bytes: &[u8]) -> std::result::Result<Vec<BoundaryShape>, String> {
    if bytes.len() < HEADER_LEN {
        return Err(format!(
            "{} bytes is shorter than the {}-byte file header",
            bytes.len(),
            HEADER_LEN
        ));
    }

    let header_err = |e: std::io::Error| format!("file header: {}", e);
    let mut rdr = Cursor::new(bytes);
    let file_code = rdr.read_i32::<BigEndian>().map_err(header_err)?;
    if file_code != FILE_CODE {
        return Err(format!("file code {} is not {}", file_code, FILE_CODE));
    }
    rdr.set_position(24);
    let file_words = rdr.read_i32::<BigEndian>().map_err(header_err)?;
    let version = rdr.read_i32::<LittleEndian>().map_err(header_err)?;
    if version != FILE_VERSION {
        tracing::debug!("Unexpected shapefile version {}", version);
    }

    let declared_len = usize::try_from(file_words)
        .map_err(|_| format!("negative file length {}", file_words))?
        * 2;
    let end = declared_len.min(bytes.len());
    if declared_len > bytes.len() {
        tracing::debug!(
            "Header declares {} bytes but file holds {}",
            declared_len,
            bytes.len()
        );
    }

    rdr.set_position(HEADER_LEN as u64);
    let mut shapes = Vec::new();
    while rdr.position() as usize + RECORD_HEADER_LEN <= end {
        let number = rdr.read_i32::<BigEndian>().map_err(header_err)?;
        let content_words = rdr.read_i32::<BigEndian>().map_err(header_err)?;
        let content_len = usize::try_from(content_words)
            .ok()
            .filter(|&words| words >= 2)
            .ok_or_else(|| format!("record {}: invalid content length {}", number, content_words))?
            * 2;

        let start = rdr.position() as usize;
        let content = bytes
            .get(start..start + content_len)
            .ok_or_else(|| format!("record {}: truncated after {} bytes", number, bytes.len() - start))?;
        if let Some(shape) = decode_record(number, content)? {
            shapes.push(shape);
        }
        rdr.set_position((start + content_len) as u64);
    }

    Ok(shapes)
}

fn decode_record(number: i32, content: &[u8]) -> std::result::Result<Option<BoundaryShape>, String> {
    let read_err = |e: std::io::Error| format!("record {}: {}", number, e);
    let mut rdr = Cursor::new(content);

    let shape_type = rdr.read_i32::<LittleEndian>().map_err(read_err)?;
    if shape_type == NULL_SHAPE {
        return Ok(None);
    }
    if !is_multipart(shape_type) {
        tracing::debug!("Skipping record {} of shape type {}", number, shape_type);
        return Ok(None);
    }

    rdr.set_position(4 + 32);
    let num_parts = read_count(&mut rdr, number, "part")?;
    let num_points = read_count(&mut rdr, number, "point")?;
    let needed = MULTIPART_PREFIX_LEN + num_parts * 4 + num_points * 16;
    if needed > content.len() {
        return Err(format!(
            "record {}: {} parts and {} points need {} bytes, record has {}",
            number,
            num_parts,
            num_points,
            needed,
            content.len()
        ));
    }

    let mut parts = Vec::with_capacity(num_parts);
    for _ in 0..num_parts {
        parts.push(read_count(&mut rdr, number, "part index")?);
    }
    let mut points = Vec::with_capacity(num_points);
    for _ in 0..num_points {
        let lon = rdr.read_f64::<LittleEndian>().map_err(read_err)?;
        let lat = rdr.read_f64::<LittleEndian>().map_err(read_err)?;
        points.push(LonLat::new(lon, lat));
    }

    BoundaryShape::new(parts, points)
        .map(Some)
        .map_err(|reason| format!("record {}: {}", number, reason))
}

fn read_count(rdr: &mut Cursor<&[u8]>, number: i32, what: &str) -> std::result::Result<usize, String> {
    let value = rdr
        .read_i32::<LittleEndian>()
        .map_err(|e| format!("record {}: {}", number, e))?;
    usize::try_from(value).map_err(|_| format!("record {}: negative {} {}", number, what, value))
}
