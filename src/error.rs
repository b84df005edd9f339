use std::path::PathBuf;
use thiserror::Error;

pub type MapResult<T> = std::result::Result<T, MapError>;

/// Failures raised while loading reference data or rendering a country.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("malformed record in {} at line {line}: {reason}", path.display())]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("no look-up entry for country code {0}")]
    UnknownCountry(String),

    #[error("no boundary shapefile for {alpha3} at {}", path.display())]
    ShapeNotFound { alpha3: String, path: PathBuf },

    #[error("malformed shapefile {}: {reason}", path.display())]
    MalformedShape { path: PathBuf, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MapError {
    /// Errors that only cost the current country; the run carries on with the next one.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MapError::UnknownCountry(_)
                | MapError::ShapeNotFound { .. }
                | MapError::MalformedShape { .. }
        )
    }
}
