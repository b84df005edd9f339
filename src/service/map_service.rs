use super::var_service::Settings;
use crate::{
    country::lookup::CountryLookup,
    prelude::*,
    region::regions::Region,
    render::{
        country_renderer::render_countries,
        raster_surface::{load_font, RasterSurface},
    },
};
use chrono::Local;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct MapReport {
    pub output: PathBuf,
    pub drawn: Vec<String>,
    pub missing: Vec<String>,
}

/// Suffix of the map title, e.g. `March 2017`.
pub fn title_date(settings: &Settings) -> String {
    match &settings.title_date {
        Some(date) => date.clone(),
        None => Local::now().format("%B %Y").to_string(),
    }
}

/// Draws one Regional Association map and writes it as `{output_dir}/{stem}.png`.
pub fn render_region_map(
    region: &Region,
    lookup: &CountryLookup,
    settings: &Settings,
    output: Option<PathBuf>,
) -> Result<MapReport> {
    let output = output.unwrap_or_else(|| {
        settings
            .output_dir
            .join(format!("{}.png", region.file_stem()))
    });
    let font = load_font(&settings.font_path)?;
    let mut surface = RasterSurface::new(region, font, &settings.figure)?;
    surface.set_title(&region.title(&title_date(settings)));
    surface.draw_graticule(&region.meridians(), &region.parallels());

    let codes = region.country_codes();
    tracing::info!("Rendering {} countries for {}", codes.len(), region.name);
    let missing = render_countries(&mut surface, &codes, lookup, &settings.shape_dir)?;
    let drawn = codes
        .iter()
        .filter(|code| !missing.iter().any(|m| m == *code))
        .map(|code| code.to_string())
        .collect();

    surface.save(&output, settings.trim)?;

    Ok(MapReport {
        output,
        drawn,
        missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        country::{centroid_table::LonLat, lookup::merge, name_table::NameRecord},
        region::regions::get_region,
        render::raster_surface::FigureSettings,
    };
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn settings(dir: &TempDir, font_path: PathBuf) -> Settings {
        Settings {
            name_table: dir.path().join("cow.txt"),
            centroid_table: dir.path().join("phys_geo.csv"),
            shape_dir: dir.path().join("gadm0"),
            font_path,
            output_dir: dir.path().to_path_buf(),
            figure: FigureSettings {
                width_in: 4.0,
                height_in: 3.0,
                dpi: 50.0,
            },
            trim: true,
            title_date: Some("March 2017".to_string()),
        }
    }

    fn cuba_lookup() -> CountryLookup {
        let names = HashMap::from([(
            "CUB".to_string(),
            NameRecord {
                alpha2: "CU".to_string(),
                alpha3: "CUB".to_string(),
                name: "Cuba".to_string(),
                full_name: "Republic of Cuba".to_string(),
            },
        )]);
        let centroids = HashMap::from([("CUB".to_string(), LonLat::new(-79.5, 21.5))]);
        merge(&names, &centroids, false)
    }

    #[test]
    fn test_title_date_override() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir, dir.path().join("font.ttf"));
        assert_eq!(title_date(&settings), "March 2017");
    }

    #[test]
    fn test_missing_font_fails_before_writing() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir, dir.path().join("missing.ttf"));
        let region = get_region("RAIVc").unwrap();

        assert!(render_region_map(region, &cuba_lookup(), &settings, None).is_err());
        assert!(!dir.path().join("RAIVc.png").exists());
    }

    #[test]
    fn test_region_without_shapes_reports_every_country_missing() {
        let font_path = PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf");
        if !font_path.is_file() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir, font_path);
        let region = get_region("RAIVc").unwrap();
        let output = dir.path().join("caribbean.png");

        let report = render_region_map(region, &cuba_lookup(), &settings, Some(output.clone())).unwrap();
        assert_eq!(report.output, output);
        assert!(report.drawn.is_empty());
        assert_eq!(report.missing.len(), region.country_codes().len());
        assert!(report.missing.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(output.is_file());
    }
}
