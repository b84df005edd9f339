use super::table_lines::read_table_lines;
use crate::prelude::*;
use std::{collections::HashMap, path::Path};

/// Lines of preamble at the top of the Countries of the World table.
pub const NAME_TABLE_HEADER_LINES: usize = 29;
const FIELD_DELIMITER: &str = "; ";
const MIN_FIELDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRecord {
    pub alpha2: String,
    pub alpha3: String,
    pub name: String,
    pub full_name: String,
}

/// Reads the Countries of the World table into records keyed by ISO 3166-1 alpha-3.
pub fn load_name_table(path: &Path) -> MapResult<HashMap<String, NameRecord>> {
    let mut records = HashMap::new();
    for (index, line) in read_table_lines(path)?
        .into_iter()
        .enumerate()
        .skip(NAME_TABLE_HEADER_LINES)
    {
        if line.trim().is_empty() {
            continue;
        }

        let record = parse_name_line(&line).ok_or_else(|| MapError::MalformedRecord {
            path: path.to_path_buf(),
            line: index + 1,
            reason: format!(
                "expected at least {} '{}'-delimited fields in {:?}",
                MIN_FIELDS, FIELD_DELIMITER, line
            ),
        })?;
        records.insert(record.alpha3.clone(), record);
    }

    tracing::debug!("Read {} name records from {}", records.len(), path.display());
    Ok(records)
}

fn parse_name_line(line: &str) -> Option<NameRecord> {
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    if fields.len() < MIN_FIELDS {
        return None;
    }

    Some(NameRecord {
        alpha2: fields[0].trim().to_string(),
        alpha3: fields[1].trim().to_string(),
        name: fields[3].trim().to_string(),
        full_name: fields[4].trim().to_string(),
    })
}
