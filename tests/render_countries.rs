use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use ramap::{
    country::{centroid_table::LonLat, lookup::CountryLookup, name_table::NAME_TABLE_HEADER_LINES},
    error::MapError,
    render::{
        country_renderer::{render_countries, render_country},
        surface::{LabelStyle, MapSurface, PolygonStyle, COUNTRY_POLYGON},
    },
    shape::shp_reader::shape_path,
};
use std::{fs, path::Path};
use tempfile::TempDir;

/// Surface that records what was drawn, projecting with plate carrée.
#[derive(Debug, Default)]
struct RecordingSurface {
    polygons: Vec<(Vec<Vec<(f64, f64)>>, PolygonStyle)>,
    labels: Vec<(String, (f64, f64))>,
}

impl MapSurface for RecordingSurface {
    fn project(&self, lonlat: LonLat) -> (f64, f64) {
        (lonlat.lon, lonlat.lat)
    }

    fn add_polygons(&mut self, rings: &[&[(f64, f64)]], style: &PolygonStyle) {
        let rings = rings.iter().map(|ring| ring.to_vec()).collect();
        self.polygons.push((rings, style.clone()));
    }

    fn add_label(&mut self, text: &str, at: (f64, f64), _style: &LabelStyle) {
        self.labels.push((text.to_string(), at));
    }
}

impl RecordingSurface {
    fn is_empty(&self) -> bool {
        self.polygons.is_empty() && self.labels.is_empty()
    }
}

fn write_polygon_shapefile(path: &Path, parts: &[i32], points: &[(f64, f64)]) {
    let mut content = Vec::new();
    content.write_i32::<LittleEndian>(5).unwrap();
    for _ in 0..4 {
        content.write_f64::<LittleEndian>(0.0).unwrap();
    }
    content.write_i32::<LittleEndian>(parts.len() as i32).unwrap();
    content.write_i32::<LittleEndian>(points.len() as i32).unwrap();
    for part in parts {
        content.write_i32::<LittleEndian>(*part).unwrap();
    }
    for (x, y) in points {
        content.write_f64::<LittleEndian>(*x).unwrap();
        content.write_f64::<LittleEndian>(*y).unwrap();
    }

    let mut bytes = Vec::new();
    bytes.write_i32::<BigEndian>(9994).unwrap();
    bytes.extend([0u8; 20]);
    bytes
        .write_i32::<BigEndian>(((100 + 8 + content.len()) / 2) as i32)
        .unwrap();
    bytes.write_i32::<LittleEndian>(1000).unwrap();
    bytes.write_i32::<LittleEndian>(5).unwrap();
    bytes.extend([0u8; 64]);
    bytes.write_i32::<BigEndian>(1).unwrap();
    bytes.write_i32::<BigEndian>((content.len() / 2) as i32).unwrap();
    bytes.extend(content);

    fs::write(path, bytes).unwrap();
}

fn square(x: f64, y: f64) -> Vec<(f64, f64)> {
    vec![(x, y), (x + 1.0, y), (x + 1.0, y + 1.0), (x, y + 1.0), (x, y)]
}

struct Fixture {
    dir: TempDir,
    lookup: CountryLookup,
}

impl Fixture {
    fn shape_dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Cuba and Jamaica have boundary files; Barbados is in the tables but has none.
fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();

    let mut names = String::new();
    for i in 0..NAME_TABLE_HEADER_LINES {
        names.push_str(&format!("# header {}\n", i));
    }
    names.push_str("CU; CUB; 192; Cuba; Republic of Cuba\n");
    names.push_str("JM; JAM; 388; Jamaica; Jamaica\n");
    names.push_str("BB; BRB; 052; Barbados; Barbados\n");
    names.push_str("AQ; ATA; 010; Antarctica; Antarctica\n");
    let name_path = dir.path().join("cow.txt");
    fs::write(&name_path, names).unwrap();

    let centroid_path = dir.path().join("phys_geo.csv");
    fs::write(
        &centroid_path,
        "\"ISO3\",\"name\",\"area\",\"lat\",\"lon\"\n\
         \"CUB\",Cuba,109884,21.5,-80.0\n\
         \"JAM\",Jamaica,10991,18.1,-77.3\n\
         \"BRB\",Barbados,430,13.2,-59.5\n",
    )
    .unwrap();

    let mut cuba = square(-84.0, 21.0);
    cuba.extend(square(-82.0, 21.5));
    cuba.extend(square(-78.0, 20.0));
    write_polygon_shapefile(&shape_path(dir.path(), "CUB"), &[0, 5, 10], &cuba);
    write_polygon_shapefile(&shape_path(dir.path(), "JAM"), &[0], &square(-78.0, 18.0));

    let lookup = CountryLookup::load(&name_path, &centroid_path, true).unwrap();
    Fixture { dir, lookup }
}

#[test]
fn test_lookup_drops_country_without_centroid() {
    let fixture = fixture();

    assert_eq!(fixture.lookup.len(), 3);
    assert!(fixture.lookup.get("AQ").is_none());
}

#[test]
fn test_render_country_draws_rings_and_label() {
    let fixture = fixture();
    let mut surface = RecordingSurface::default();

    let rings = render_country(&mut surface, "CU", &fixture.lookup, fixture.shape_dir()).unwrap();
    assert_eq!(rings, 3);
    assert_eq!(surface.polygons.len(), 1);

    let (drawn, style) = &surface.polygons[0];
    let lengths: Vec<usize> = drawn.iter().map(|ring| ring.len()).collect();
    assert_eq!(lengths, vec![5, 5, 5]);
    assert_eq!(drawn[2][0], (-78.0, 20.0));
    assert_eq!(style, &COUNTRY_POLYGON);

    assert_eq!(surface.labels, vec![("CU".to_string(), (-80.0, 21.5))]);
}

#[test]
fn test_unknown_country_leaves_surface_untouched() {
    let fixture = fixture();
    let mut surface = RecordingSurface::default();

    let err = render_country(&mut surface, "XX", &fixture.lookup, fixture.shape_dir()).unwrap_err();
    assert!(matches!(err, MapError::UnknownCountry(ref code) if code == "XX"));
    assert!(surface.is_empty());
}

#[test]
fn test_missing_shapefile_is_distinct_from_unknown_country() {
    let fixture = fixture();
    let mut surface = RecordingSurface::default();

    let err = render_country(&mut surface, "BB", &fixture.lookup, fixture.shape_dir()).unwrap_err();
    assert!(matches!(err, MapError::ShapeNotFound { ref alpha3, .. } if alpha3 == "BRB"));
    assert!(err.is_recoverable());
    assert!(surface.is_empty());
}

#[test]
fn test_render_countries_reports_only_missing_code() {
    let fixture = fixture();
    let mut surface = RecordingSurface::default();

    let missing =
        render_countries(&mut surface, &["JM", "BB", "CU"], &fixture.lookup, fixture.shape_dir()).unwrap();
    assert_eq!(missing, vec!["BB".to_string()]);
    assert_eq!(surface.polygons.len(), 2);

    let labels: Vec<&str> = surface.labels.iter().map(|(text, _)| text.as_str()).collect();
    assert_eq!(labels, vec!["JM", "CU"]);
}

#[test]
fn test_missing_list_is_sorted() {
    let fixture = fixture();
    let mut surface = RecordingSurface::default();

    let missing = render_countries(
        &mut surface,
        &["ZZ", "CU", "BB", "AQ"],
        &fixture.lookup,
        fixture.shape_dir(),
    )
    .unwrap();
    assert_eq!(missing, vec!["AQ", "BB", "ZZ"]);
    assert_eq!(surface.labels.len(), 1);
}

#[test]
fn test_corrupt_shapefile_is_skipped() {
    let fixture = fixture();
    fs::write(shape_path(fixture.shape_dir(), "BRB"), b"garbage").unwrap();
    let mut surface = RecordingSurface::default();

    let missing = render_countries(&mut surface, &["BB", "JM"], &fixture.lookup, fixture.shape_dir()).unwrap();
    assert_eq!(missing, vec!["BB"]);
    assert_eq!(surface.labels.len(), 1);
}
