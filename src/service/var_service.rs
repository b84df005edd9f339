use crate::{prelude::*, render::raster_surface::FigureSettings};
use anyhow::anyhow;
use std::{env::var, path::PathBuf};

pub const NAME_TABLE_VAR: &str = "RAMAP_NAME_TABLE";
pub const CENTROID_TABLE_VAR: &str = "RAMAP_CENTROID_TABLE";
pub const SHAPE_DIR_VAR: &str = "RAMAP_SHAPE_DIR";
pub const FONT_PATH_VAR: &str = "RAMAP_FONT_PATH";
pub const OUTPUT_DIR_VAR: &str = "RAMAP_OUTPUT_DIR";
pub const DPI_VAR: &str = "RAMAP_DPI";
pub const TRIM_VAR: &str = "RAMAP_TRIM";
pub const TITLE_DATE_VAR: &str = "RAMAP_TITLE_DATE";

/// Every setting with its default, in the order written to a fresh `variables.env`.
pub const DEFAULTS: [(&str, &str); 8] = [
    (NAME_TABLE_VAR, "labels/cow.txt"),
    (CENTROID_TABLE_VAR, "labels/phys_geo.csv"),
    (SHAPE_DIR_VAR, "gadm0"),
    (FONT_PATH_VAR, "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
    (OUTPUT_DIR_VAR, "."),
    (DPI_VAR, "300"),
    (TRIM_VAR, "true"),
    (TITLE_DATE_VAR, ""),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub name_table: PathBuf,
    pub centroid_table: PathBuf,
    pub shape_dir: PathBuf,
    pub font_path: PathBuf,
    pub output_dir: PathBuf,
    pub figure: FigureSettings,
    pub trim: bool,
    pub title_date: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            name_table: get_path(NAME_TABLE_VAR)?,
            centroid_table: get_path(CENTROID_TABLE_VAR)?,
            shape_dir: get_path(SHAPE_DIR_VAR)?,
            font_path: get_path(FONT_PATH_VAR)?,
            output_dir: get_path(OUTPUT_DIR_VAR)?,
            figure: FigureSettings {
                dpi: get_dpi()?,
                ..FigureSettings::default()
            },
            trim: get_trim()?,
            title_date: get_title_date(),
        })
    }
}

fn default_for(key: &str) -> &'static str {
    DEFAULTS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .unwrap_or_default()
}

pub fn get_path(key: &str) -> Result<PathBuf> {
    match var(key) {
        Ok(path) => match path.is_empty() {
            true => {
                let err = format!("{} is empty", key);
                tracing::error!(err);
                Err(anyhow!(err))
            }
            false => Ok(PathBuf::from(path)),
        },
        Err(_) => Ok(PathBuf::from(default_for(key))),
    }
}

pub fn get_dpi() -> Result<f32> {
    match var(DPI_VAR) {
        Ok(dpi) => match dpi.trim().parse::<f32>() {
            Ok(dpi) if dpi > 0.0 => Ok(dpi),
            Ok(dpi) => {
                let err = format!("{} must be positive, got {}", DPI_VAR, dpi);
                tracing::error!(err);
                Err(anyhow!(err))
            }
            Err(e) => {
                let err = format!("Failed to parse {} to f32: {}", DPI_VAR, e);
                tracing::error!(err);
                Err(anyhow!(err))
            }
        },
        Err(_) => Ok(300.0),
    }
}

pub fn get_trim() -> Result<bool> {
    match var(TRIM_VAR) {
        Ok(trim) => parse_flag(&trim).ok_or_else(|| {
            let err = format!("Failed to parse {} to bool: {:?}", TRIM_VAR, trim);
            tracing::error!(err);
            anyhow!(err)
        }),
        Err(_) => Ok(true),
    }
}

pub fn get_title_date() -> Option<String> {
    match var(TITLE_DATE_VAR) {
        Ok(date) => match date.trim().is_empty() {
            true => None,
            false => Some(date.trim().to_string()),
        },
        Err(_) => None,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
