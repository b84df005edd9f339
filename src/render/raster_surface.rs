//! PNG map canvas: Lambert azimuthal equal-area map axes inside a figure with
//! a title and graticule labels, laid out like a default single-subplot figure.

use super::{
    projection::{Extent, Laea},
    surface::{LabelStyle, MapSurface, PolygonStyle, Rgb, BLACK},
};
use crate::{country::centroid_table::LonLat, prelude::*, region::regions::{Bounds, Region}};
use ab_glyph::{FontVec, PxScale};
use anyhow::{anyhow, Context};
use image::{imageops, GrayImage, Luma, Rgba, RgbaImage};
use imageproc::{
    drawing::{
        draw_antialiased_line_segment_mut, draw_filled_rect_mut, draw_polygon_mut,
        draw_text_mut, text_size, Blend,
    },
    point::Point,
    rect::Rect,
};
use itertools::Itertools;
use std::{fs, path::Path};

const PAPER: Rgb = [255, 255, 255];
const WATER: Rgb = [214, 234, 248];

// Subplot box as fractions of the figure, measured from the bottom left.
const AXES_LEFT: f64 = 0.125;
const AXES_RIGHT: f64 = 0.9;
const AXES_BOTTOM: f64 = 0.11;
const AXES_TOP: f64 = 0.88;

const GRATICULE_WIDTH: f32 = 0.2;
const FRAME_WIDTH: f32 = 0.8;
const TICK_LABEL_SIZE: f32 = 10.0;
const TICK_PAD: f32 = 3.5;
const TITLE_SIZE: f32 = 12.0;
const TITLE_PAD: f32 = 6.0;
const GRATICULE_SAMPLE_DEG: f64 = 0.25;
const GRATICULE_OVERSHOOT_DEG: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigureSettings {
    pub width_in: f32,
    pub height_in: f32,
    pub dpi: f32,
}

impl Default for FigureSettings {
    fn default() -> Self {
        Self {
            width_in: 8.0,
            height_in: 6.0,
            dpi: 300.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    /// Centred horizontally, hanging below the point.
    Below,
    /// Right-aligned, centred vertically, left of the point.
    LeftOf,
}

#[derive(Debug, Clone, PartialEq)]
struct TickLabel {
    text: String,
    x: f64,
    y: f64,
    anchor: Anchor,
}

pub struct RasterSurface {
    canvas: RgbaImage,
    map: RgbaImage,
    map_origin: (u32, u32),
    projection: Laea,
    extent: Extent,
    bounds: Bounds,
    /// Text is skipped when absent.
    font: Option<FontVec>,
    dpi: f32,
    title: Option<String>,
    ticks: Vec<TickLabel>,
}

pub fn load_font(path: &Path) -> Result<FontVec> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read font {}", path.display()))?;
    match FontVec::try_from_vec(bytes) {
        Ok(font) => Ok(font),
        Err(e) => {
            let err = format!("Invalid font {}: {}", path.display(), e);
            tracing::error!(err);
            Err(anyhow!(err))
        }
    }
}

impl RasterSurface {
    pub fn new(region: &Region, font: FontVec, figure: &FigureSettings) -> Result<Self> {
        Self::with_font(region, Some(font), figure)
    }

    fn with_font(region: &Region, font: Option<FontVec>, figure: &FigureSettings) -> Result<Self> {
        let projection = Laea::new(region.center);
        let extent = Extent::from_corners(
            &projection,
            region.bounds.lower_left(),
            region.bounds.upper_right(),
        );
        if !(extent.width() > 0.0 && extent.height() > 0.0) {
            let err = format!("Degenerate map extent for {}: {:?}", region.key, extent);
            tracing::error!(err);
            return Err(anyhow!(err));
        }

        let width = (figure.width_in * figure.dpi).round().max(1.0) as u32;
        let height = (figure.height_in * figure.dpi).round().max(1.0) as u32;
        let ((x, y), (map_width, map_height)) = fit_axes(width, height, extent.width() / extent.height());
        tracing::debug!(
            "Figure {}x{} px, map {}x{} px at ({}, {})",
            width,
            height,
            map_width,
            map_height,
            x,
            y
        );

        Ok(Self {
            canvas: RgbaImage::from_pixel(width, height, opaque(PAPER)),
            map: RgbaImage::from_pixel(map_width, map_height, opaque(WATER)),
            map_origin: (x, y),
            projection,
            extent,
            bounds: region.bounds,
            font,
            dpi: figure.dpi,
            title: None,
            ticks: Vec::new(),
        })
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    /// Draws meridians and parallels, labelling them where they leave the map
    /// along the bottom and left edges.
    pub fn draw_graticule(&mut self, meridians: &[f64], parallels: &[f64]) {
        let width = self.points_to_px(GRATICULE_WIDTH);
        let (lat_lo, lat_hi) = (
            (self.bounds.south - GRATICULE_OVERSHOOT_DEG).max(-89.9),
            (self.bounds.north + GRATICULE_OVERSHOOT_DEG).min(89.9),
        );
        let (lon_lo, lon_hi) = (
            self.bounds.west - GRATICULE_OVERSHOOT_DEG,
            self.bounds.east + GRATICULE_OVERSHOOT_DEG,
        );
        let (map_w, map_h) = (self.map.width() as f64, self.map.height() as f64);

        for &lon in meridians {
            let line = self.sample_line(|t| LonLat::new(lon, lat_lo + t * (lat_hi - lat_lo)), lat_hi - lat_lo);
            self.stroke_polyline(&line, BLACK, 1.0, width);
            if let Some(x) = crossing(&line, |p| p.1 - map_h).map(|p| p.0) {
                if (0.0..=map_w).contains(&x) {
                    self.ticks.push(TickLabel {
                        text: format_degrees(lon, 'E', 'W'),
                        x,
                        y: map_h,
                        anchor: Anchor::Below,
                    });
                }
            }
        }

        for &lat in parallels {
            let line = self.sample_line(|t| LonLat::new(lon_lo + t * (lon_hi - lon_lo), lat), lon_hi - lon_lo);
            self.stroke_polyline(&line, BLACK, 1.0, width);
            if let Some(y) = crossing(&line, |p| p.0).map(|p| p.1) {
                if (0.0..=map_h).contains(&y) {
                    self.ticks.push(TickLabel {
                        text: format_degrees(lat, 'N', 'S'),
                        x: 0.0,
                        y,
                        anchor: Anchor::LeftOf,
                    });
                }
            }
        }
    }

    /// Composites the map into the figure and adds frame, title and tick labels.
    pub fn finish(self, trim: bool) -> RgbaImage {
        let dpi = self.dpi;
        let points_to_px = |points: f32| points * dpi / 72.0;
        let mut canvas = self.canvas;
        let (ox, oy) = self.map_origin;
        imageops::overlay(&mut canvas, &self.map, ox as i64, oy as i64);

        let frame = points_to_px(FRAME_WIDTH).round().max(1.0) as u32;
        let (mw, mh) = self.map.dimensions();
        let black = opaque(BLACK);
        let left = ox as i32 - frame as i32;
        let top = oy as i32 - frame as i32;
        let outer_w = mw + 2 * frame;
        draw_filled_rect_mut(&mut canvas, Rect::at(left, top).of_size(outer_w, frame), black);
        draw_filled_rect_mut(&mut canvas, Rect::at(left, (oy + mh) as i32).of_size(outer_w, frame), black);
        draw_filled_rect_mut(&mut canvas, Rect::at(left, oy as i32).of_size(frame, mh), black);
        draw_filled_rect_mut(&mut canvas, Rect::at((ox + mw) as i32, oy as i32).of_size(frame, mh), black);

        if let Some(font) = &self.font {
            let tick_scale = PxScale::from(points_to_px(TICK_LABEL_SIZE));
            let pad = points_to_px(TICK_PAD) as f64 + frame as f64;
            for tick in &self.ticks {
                let mask = text_mask(font, tick_scale, &tick.text);
                let (w, h) = (mask.width() as f64, mask.height() as f64);
                let (x, y) = match tick.anchor {
                    Anchor::Below => (ox as f64 + tick.x - w / 2.0, oy as f64 + tick.y + pad),
                    Anchor::LeftOf => (ox as f64 + tick.x - pad - w, oy as f64 + tick.y - h / 2.0),
                };
                stamp(&mut canvas, &mask, x.round() as i64, y.round() as i64, BLACK, 1.0);
            }

            if let Some(title) = &self.title {
                let mask = text_mask(font, PxScale::from(points_to_px(TITLE_SIZE)), title);
                let x = ox as f64 + mw as f64 / 2.0 - mask.width() as f64 / 2.0;
                let y = oy as f64 - frame as f64 - points_to_px(TITLE_PAD) as f64 - mask.height() as f64;
                stamp(&mut canvas, &mask, x.round() as i64, y.round() as i64, BLACK, 1.0);
            }
        }

        match trim {
            true => trim_border(&canvas),
            false => canvas,
        }
    }

    pub fn save(self, path: &Path, trim: bool) -> Result<()> {
        let image = self.finish(trim);
        image
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Wrote {}x{} map to {}", image.width(), image.height(), path.display());

        Ok(())
    }

    fn points_to_px(&self, points: f32) -> f32 {
        points * self.dpi / 72.0
    }

    fn sample_line<F: Fn(f64) -> LonLat>(&self, at: F, span_deg: f64) -> Vec<(f64, f64)> {
        let samples = (span_deg / GRATICULE_SAMPLE_DEG).ceil().max(1.0) as usize;
        (0..=samples)
            .map(|i| self.project(at(i as f64 / samples as f64)))
            .collect()
    }

    fn stroke_polyline(&mut self, line: &[(f64, f64)], color: Rgb, alpha: f32, width_px: f32) {
        for (&a, &b) in line.iter().tuple_windows() {
            stroke_segment(&mut self.map, a, b, color, alpha, width_px);
        }
    }

    fn in_map(&self, (x, y): (f64, f64)) -> bool {
        x.is_finite()
            && y.is_finite()
            && (0.0..=self.map.width() as f64).contains(&x)
            && (0.0..=self.map.height() as f64).contains(&y)
    }
}

impl MapSurface for RasterSurface {
    fn project(&self, lonlat: LonLat) -> (f64, f64) {
        let (x, y) = self.projection.forward(lonlat);
        (
            (x - self.extent.x_min) / self.extent.width() * self.map.width() as f64,
            (self.extent.y_max - y) / self.extent.height() * self.map.height() as f64,
        )
    }

    fn add_polygons(&mut self, rings: &[&[(f64, f64)]], style: &PolygonStyle) {
        let fill = Rgba([style.face[0], style.face[1], style.face[2], unit_to_byte(style.alpha)]);
        let mut layer = Blend(std::mem::take(&mut self.map));
        for ring in rings {
            if let Some(points) = ring_points(ring) {
                draw_polygon_mut(&mut layer, &points, fill);
            }
        }
        self.map = layer.0;

        let width = self.points_to_px(style.edge_width);
        for ring in rings {
            let closing = ring.first().copied();
            for (&a, &b) in ring.iter().chain(closing.iter()).tuple_windows() {
                match style.antialiased {
                    true => stroke_segment(&mut self.map, a, b, style.edge, style.alpha, width),
                    false => stroke_segment_aliased(&mut self.map, a, b, style.edge, style.alpha),
                }
            }
        }
    }

    fn add_label(&mut self, text: &str, at: (f64, f64), style: &LabelStyle) {
        if !self.in_map(at) {
            tracing::debug!("Label {} at {:?} falls outside the map", text, at);
            return;
        }

        let mask = match &self.font {
            Some(font) => text_mask(font, PxScale::from(self.points_to_px(style.size)), text),
            None => return,
        };
        let x = (at.0 - mask.width() as f64 / 2.0).round() as i64;
        let y = (at.1 - mask.height() as f64 / 2.0).round() as i64;

        let radius = (self.points_to_px(style.halo_width) / 2.0).round() as i64;
        for (dx, dy) in (-radius..=radius).cartesian_product(-radius..=radius) {
            if dx * dx + dy * dy <= radius * radius {
                stamp(&mut self.map, &mask, x + dx, y + dy, style.halo, 1.0);
            }
        }

        let shadow = style.color.map(|c| (c as f32 * style.shadow_alpha) as u8);
        let sx = self.points_to_px(style.shadow_offset.0).round() as i64;
        let sy = -self.points_to_px(style.shadow_offset.1).round() as i64;
        stamp(&mut self.map, &mask, x + sx, y + sy, shadow, style.shadow_alpha);
        stamp(&mut self.map, &mask, x, y, style.color, 1.0);
    }
}

/// Places the largest box with the given aspect ratio inside the subplot area.
/// Returns the top-left corner and size in pixels.
fn fit_axes(width: u32, height: u32, aspect: f64) -> ((u32, u32), (u32, u32)) {
    let (w, h) = (width as f64, height as f64);
    let box_w = (AXES_RIGHT - AXES_LEFT) * w;
    let box_h = (AXES_TOP - AXES_BOTTOM) * h;
    let (map_w, map_h) = match box_w / box_h > aspect {
        true => (box_h * aspect, box_h),
        false => (box_w, box_w / aspect),
    };
    let x = AXES_LEFT * w + (box_w - map_w) / 2.0;
    let y = (1.0 - AXES_TOP) * h + (box_h - map_h) / 2.0;

    (
        (x.round() as u32, y.round() as u32),
        (map_w.round().max(1.0) as u32, map_h.round().max(1.0) as u32),
    )
}

/// Converts a ring to polygon vertices, dropping non-finite and repeated points
/// and the closing vertex. Returns `None` for rings with fewer than three.
fn ring_points(ring: &[(f64, f64)]) -> Option<Vec<Point<i32>>> {
    let mut points: Vec<Point<i32>> = ring
        .iter()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|&(x, y)| Point::new(x.round() as i32, y.round() as i32))
        .dedup()
        .collect();
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    match points.len() >= 3 {
        true => Some(points),
        false => None,
    }
}

/// First point where `side` changes sign along the polyline, linearly interpolated.
fn crossing<F: Fn((f64, f64)) -> f64>(line: &[(f64, f64)], side: F) -> Option<(f64, f64)> {
    line.iter().tuple_windows().find_map(|(&a, &b)| {
        let (sa, sb) = (side(a), side(b));
        if !(sa.is_finite() && sb.is_finite()) || sa.signum() == sb.signum() {
            return None;
        }
        let t = sa / (sa - sb);
        Some((a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1)))
    })
}

fn format_degrees(value: f64, positive: char, negative: char) -> String {
    match value {
        v if v > 0.0 => format!("{}°{}", v, positive),
        v if v < 0.0 => format!("{}°{}", -v, negative),
        _ => "0°".to_string(),
    }
}

fn opaque(color: Rgb) -> Rgba<u8> {
    Rgba([color[0], color[1], color[2], 255])
}

fn unit_to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Blends `over` onto `under` with the given weight in `0..=1`.
fn mix(over: Rgba<u8>, under: Rgba<u8>, weight: f32) -> Rgba<u8> {
    let w = weight.clamp(0.0, 1.0);
    let channel = |o: u8, u: u8| (o as f32 * w + u as f32 * (1.0 - w)).round() as u8;
    Rgba([
        channel(over[0], under[0]),
        channel(over[1], under[1]),
        channel(over[2], under[2]),
        channel(255, under[3]),
    ])
}

fn stroke_segment(
    image: &mut RgbaImage,
    a: (f64, f64),
    b: (f64, f64),
    color: Rgb,
    alpha: f32,
    width_px: f32,
) {
    if !(a.0.is_finite() && a.1.is_finite() && b.0.is_finite() && b.1.is_finite()) {
        return;
    }

    let strands = width_px.round().max(1.0) as i32;
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = (dx * dx + dy * dy).sqrt();
    let (nx, ny) = match len > 0.0 {
        true => (-dy / len, dx / len),
        false => (0.0, 0.0),
    };
    let line_color = opaque(color);
    for strand in 0..strands {
        let offset = strand as f64 - (strands - 1) as f64 / 2.0;
        let start = ((a.0 + nx * offset).round() as i32, (a.1 + ny * offset).round() as i32);
        let end = ((b.0 + nx * offset).round() as i32, (b.1 + ny * offset).round() as i32);
        draw_antialiased_line_segment_mut(image, start, end, line_color, |line, under, weight| {
            mix(line, under, weight * alpha)
        });
    }
}

fn stroke_segment_aliased(image: &mut RgbaImage, a: (f64, f64), b: (f64, f64), color: Rgb, alpha: f32) {
    if !(a.0.is_finite() && a.1.is_finite() && b.0.is_finite() && b.1.is_finite()) {
        return;
    }

    let line_color = opaque(color);
    let start = (a.0.round() as i32, a.1.round() as i32);
    let end = (b.0.round() as i32, b.1.round() as i32);
    // Coverage is thresholded instead of blended.
    draw_antialiased_line_segment_mut(image, start, end, line_color, |line, under, weight| {
        match weight >= 0.5 {
            true => mix(line, under, alpha),
            false => under,
        }
    });
}

/// Coverage mask of `text`, padded by one pixel on each side.
fn text_mask(font: &FontVec, scale: PxScale, text: &str) -> GrayImage {
    let (w, h) = text_size(scale, font, text);
    let mut mask = GrayImage::new(w + 2, h + 2);
    draw_text_mut(&mut mask, Luma([255u8]), 1, 1, scale, font, text);
    mask
}

/// Paints `color` through a coverage mask placed with its top-left at `(x, y)`.
fn stamp(target: &mut RgbaImage, mask: &GrayImage, x: i64, y: i64, color: Rgb, alpha: f32) {
    let (tw, th) = (target.width() as i64, target.height() as i64);
    let over = opaque(color);
    for (mx, my, coverage) in mask.enumerate_pixels() {
        let (tx, ty) = (x + mx as i64, y + my as i64);
        if coverage[0] == 0 || tx < 0 || ty < 0 || tx >= tw || ty >= th {
            continue;
        }
        let under = *target.get_pixel(tx as u32, ty as u32);
        let weight = coverage[0] as f32 / 255.0 * alpha;
        target.put_pixel(tx as u32, ty as u32, mix(over, under, weight));
    }
}

/// Crops away the border whose colour matches the top-left pixel.
pub fn trim_border(image: &RgbaImage) -> RgbaImage {
    let background = *image.get_pixel(0, 0);
    let content = image
        .enumerate_pixels()
        .filter(|(_, _, pixel)| **pixel != background)
        .fold(None, |bounds: Option<(u32, u32, u32, u32)>, (x, y, _)| match bounds {
            None => Some((x, y, x, y)),
            Some((x0, y0, x1, y1)) => Some((x0.min(x), y0.min(y), x1.max(x), y1.max(y))),
        });

    match content {
        Some((x0, y0, x1, y1)) => imageops::crop_imm(image, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image(),
        None => image.clone(),
    }
}
