use crate::{
    country::centroid_table::LonLat,
    render::country_renderer::{arange, round_out},
};

/// How far past the map bounds the graticule is extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraticuleRule {
    /// One extra step below and beyond the rounded bounds.
    Padded,
    /// Rounded bounds only.
    Tight,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl Bounds {
    pub fn lower_left(&self) -> LonLat {
        LonLat::new(self.west, self.south)
    }

    pub fn upper_right(&self) -> LonLat {
        LonLat::new(self.east, self.north)
    }
}

/// A WMO Regional Association map preset.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub key: &'static str,
    pub name: &'static str,
    pub countries: &'static str,
    pub bounds: Bounds,
    pub center: LonLat,
    pub step: f64,
    pub graticule: GraticuleRule,
}

pub const REGIONS: [Region; 2] = [
    Region {
        key: "RAIVc",
        name: "RA IV Caribbean",
        countries: "US,CU,VE,GY,SR,CW,BB,BZ,DO,GF,JM,MQ,TT,SX,GP,PR,BS",
        bounds: Bounds {
            west: -92.0,
            east: -48.0,
            south: 0.0,
            north: 28.0,
        },
        center: LonLat {
            lon: -70.0,
            lat: 15.0,
        },
        step: 10.0,
        graticule: GraticuleRule::Padded,
    },
    Region {
        key: "RAVI",
        name: "RA VI",
        countries: "IS,NO,SE,FI,EE,LV,LT,PL,DK,GB,JE,IE,NL,BE,ES,PT,FR,DE,BY,RU,UA,CH,AT,HU,CZ,SK,SI,HR,RS,RO,TR,IT,MT",
        bounds: Bounds {
            west: -10.0,
            east: 61.0,
            south: 31.0,
            north: 67.0,
        },
        center: LonLat {
            lon: 15.0,
            lat: 55.0,
        },
        step: 10.0,
        graticule: GraticuleRule::Tight,
    },
];

pub fn get_region(key: &str) -> Option<&'static Region> {
    REGIONS
        .iter()
        .find(|region| region.key.eq_ignore_ascii_case(key))
}

impl Region {
    pub fn country_codes(&self) -> Vec<&'static str> {
        self.countries.split(',').collect()
    }

    /// Output file name without extension.
    pub fn file_stem(&self) -> &'static str {
        self.key
    }

    pub fn title(&self, date: &str) -> String {
        format!("{}: {}", self.name, date)
    }

    /// Longitudes of the meridians to draw.
    pub fn meridians(&self) -> Vec<f64> {
        let step = self.step;
        let west = round_out(self.bounds.west, false, step);
        let east = round_out(self.bounds.east, false, step);
        match self.graticule {
            GraticuleRule::Padded => arange(west - step, east + 2.0 * step, step),
            GraticuleRule::Tight => arange(west, east, step),
        }
    }

    /// Latitudes of the parallels to draw.
    pub fn parallels(&self) -> Vec<f64> {
        let step = self.step;
        let south = round_out(self.bounds.south, false, step);
        let north = round_out(self.bounds.north, true, step);
        match self.graticule {
            GraticuleRule::Padded => arange(south - step, north + step, step),
            GraticuleRule::Tight => arange(south, north + step, step),
        }
    }
}
