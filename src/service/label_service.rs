use crate::{
    country::lookup::{CountryEntry, CountryLookup},
    prelude::*,
};
use anyhow::Context;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Code printed on labels; the United Kingdom goes by its ccTLD rather than ISO 3166.
pub fn display_code(alpha2: &str) -> &str {
    match alpha2 {
        "GB" => "UK",
        other => other,
    }
}

pub fn format_label_line(alpha2: &str, entry: &CountryEntry) -> String {
    format!(
        "{} ({:?}, {:?}) {}",
        entry.alpha3,
        entry.centroid.lon,
        entry.centroid.lat,
        display_code(alpha2)
    )
}

/// Writes one label line per known code in `codes` (comma separated).
/// Returns the number of lines written.
pub fn write_labels(codes: &str, output: &Path, lookup: &CountryLookup) -> Result<usize> {
    let file = File::create(output).with_context(|| format!("Failed to create {}", output.display()))?;
    let mut writer = BufWriter::new(file);

    let mut written = 0;
    for code in codes.split(',').map(str::trim).filter(|code| !code.is_empty()) {
        match lookup.get(code) {
            Some(entry) => {
                writeln!(writer, "{}", format_label_line(code, &entry))?;
                written += 1;
            }
            None => tracing::warn!("No look-up for {}", code),
        }
    }
    writer.flush()?;
    tracing::info!("Wrote {} labels to {}", written, output.display());

    Ok(written)
}
