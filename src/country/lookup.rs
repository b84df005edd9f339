use super::{
    centroid_table::{load_centroid_table, LonLat},
    name_table::{load_name_table, NameRecord},
};
use crate::prelude::*;
use itertools::Itertools;
use std::{collections::HashMap, path::Path};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountryEntry<'a> {
    pub alpha3: &'a str,
    pub centroid: LonLat,
}

/// ISO 3166-1 alpha-2 code to alpha-3 code and label centroid.
///
/// Every entry is guaranteed to have a centroid; countries missing from the
/// centroid table are dropped while merging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryLookup {
    entries: HashMap<String, (String, LonLat)>,
}

impl CountryLookup {
    /// Reads both reference tables and merges them. Called once by each driver.
    pub fn load(name_table: &Path, centroid_table: &Path, verbose: bool) -> MapResult<Self> {
        let names = load_name_table(name_table)?;
        let centroids = load_centroid_table(centroid_table)?;
        let lookup = merge(&names, &centroids, verbose);
        tracing::info!(
            "Merged {} of {} countries from {} and {}",
            lookup.len(),
            names.len(),
            name_table.display(),
            centroid_table.display()
        );

        Ok(lookup)
    }

    pub fn get(&self, alpha2: &str) -> Option<CountryEntry<'_>> {
        self.entries
            .get(alpha2)
            .map(|(alpha3, centroid)| CountryEntry {
                alpha3,
                centroid: *centroid,
            })
    }

    pub fn resolve(&self, alpha2: &str) -> MapResult<CountryEntry<'_>> {
        self.get(alpha2)
            .ok_or_else(|| MapError::UnknownCountry(alpha2.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, CountryEntry<'_>)> + '_ {
        self.entries.iter().map(|(alpha2, (alpha3, centroid))| {
            (
                alpha2.as_str(),
                CountryEntry {
                    alpha3,
                    centroid: *centroid,
                },
            )
        })
    }
}

/// Joins name records to centroids on alpha-3 and keys the result by alpha-2.
///
/// Records are visited in alpha-3 order, so when two records share an alpha-2
/// code the one with the greater alpha-3 code wins.
pub fn merge(
    names: &HashMap<String, NameRecord>,
    centroids: &HashMap<String, LonLat>,
    verbose: bool,
) -> CountryLookup {
    let mut entries: HashMap<String, (String, LonLat)> = HashMap::with_capacity(names.len());
    for (alpha3, record) in names.iter().sorted_by_key(|(alpha3, _)| *alpha3) {
        match centroids.get(alpha3) {
            Some(centroid) => {
                let previous = entries.insert(record.alpha2.clone(), (alpha3.clone(), *centroid));
                if let (Some((replaced, _)), true) = (previous, verbose) {
                    tracing::warn!("{} replaces {} for {}", alpha3, replaced, record.alpha2);
                }
            }
            None => {
                if verbose {
                    tracing::warn!("No matching key for {}: {}", alpha3, record.full_name);
                }
            }
        }
    }

    CountryLookup { entries }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(alpha2: &str, alpha3: &str, name: &str) -> (String, NameRecord) {
        (
            alpha3.to_string(),
            NameRecord {
                alpha2: alpha2.to_string(),
                alpha3: alpha3.to_string(),
                name: name.to_string(),
                full_name: format!("Republic of {}", name),
            },
        )
    }

    fn fixture() -> (HashMap<String, NameRecord>, HashMap<String, LonLat>) {
        let names = HashMap::from([
            record("SE", "SWE", "Sweden"),
            record("CU", "CUB", "Cuba"),
            record("AQ", "ATA", "Antarctica"),
        ]);
        let centroids = HashMap::from([
            ("SWE".to_string(), LonLat::new(15.0, 62.0)),
            ("CUB".to_string(), LonLat::new(-80.0, 21.5)),
            ("ZZZ".to_string(), LonLat::new(0.0, 0.0)),
        ]);
        (names, centroids)
    }

    #[test]
    fn test_merge_keys_by_alpha2() {
        let (names, centroids) = fixture();
        let lookup = merge(&names, &centroids, false);

        let sweden = lookup.get("SE").unwrap();
        assert_eq!(sweden.alpha3, "SWE");
        assert_eq!(sweden.centroid, LonLat::new(15.0, 62.0));
    }

    #[test]
    fn test_merge_omits_countries_without_centroid() {
        let (names, centroids) = fixture();
        let lookup = merge(&names, &centroids, true);

        assert_eq!(lookup.len(), 2);
        assert!(lookup.get("AQ").is_none());
    }

    #[test]
    fn test_every_entry_resolves_to_a_centroid() {
        let (names, centroids) = fixture();
        let lookup = merge(&names, &centroids, false);

        for (_, entry) in lookup.iter() {
            assert_eq!(centroids.get(entry.alpha3), Some(&entry.centroid));
        }
    }

    #[test]
    fn test_merge_is_idempotent() {
        let (names, centroids) = fixture();
        assert_eq!(
            merge(&names, &centroids, false),
            merge(&names, &centroids, true)
        );
    }

    #[test]
    fn test_shared_alpha2_resolves_to_greatest_alpha3() {
        let centroids: HashMap<String, LonLat> = ["AAA", "BBB", "CCC", "DDD", "EEE", "FFF"]
            .iter()
            .enumerate()
            .map(|(i, alpha3)| (alpha3.to_string(), LonLat::new(i as f64, 0.0)))
            .collect();

        for _ in 0..20 {
            let names: HashMap<String, NameRecord> = ["DDD", "CCC", "AAA", "FFF", "EEE", "BBB"]
                .iter()
                .map(|alpha3| record("XX", alpha3, alpha3))
                .collect();
            let lookup = merge(&names, &centroids, true);

            let winner = lookup.get("XX").unwrap();
            assert_eq!(winner.alpha3, "FFF");
            assert_eq!(winner.centroid, LonLat::new(5.0, 0.0));
            assert_eq!(lookup.len(), 1);
        }
    }

    #[test]
    fn test_resolve_unknown_code() {
        let (names, centroids) = fixture();
        let lookup = merge(&names, &centroids, false);

        match lookup.resolve("XX") {
            Err(MapError::UnknownCountry(code)) => assert_eq!(code, "XX"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
