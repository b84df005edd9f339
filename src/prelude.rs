pub use crate::error::{MapError, MapResult};
pub use anyhow::Result;
