use crate::prelude::*;
use std::{
    fs::File,
    io::{self, BufRead},
    path::Path,
};

/// Reads a reference table line by line without requiring UTF-8.
///
/// Each line is decoded as UTF-8 when valid and as Latin-1 otherwise, with
/// any trailing carriage return removed.
pub fn read_table_lines(path: &Path) -> MapResult<Vec<String>> {
    let file = File::open(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut lines = Vec::new();
    for bytes in io::BufReader::new(file).split(b'\n') {
        let mut bytes = bytes.map_err(|source| MapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        lines.push(decode_line(bytes));
    }

    Ok(lines)
}

fn decode_line(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(line) => line,
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    }
}
