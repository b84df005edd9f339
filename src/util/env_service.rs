use crate::{prelude::*, service::var_service::DEFAULTS};
use std::{
    env,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

pub const ENV_FILE: &str = "variables.env";

/// Loads `variables.env` into the process environment.
///
/// The working directory is searched first, then the executable's directory.
/// When neither has one, a template listing every setting with its default is
/// written to the working directory and the defaults apply.
pub fn load_env_file() -> Result<Option<PathBuf>> {
    let candidates = [
        env::current_dir().ok().map(|dir| dir.join(ENV_FILE)),
        env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(ENV_FILE))),
    ];

    match candidates.into_iter().flatten().find(|path| path.is_file()) {
        Some(path) => {
            apply_env_file(&path);
            Ok(Some(path))
        }
        None => {
            let template = env::current_dir()?.join(ENV_FILE);
            write_template(&template)?;
            tracing::info!(
                "{} not found. Generated template {} with default settings.",
                ENV_FILE,
                template.display()
            );
            Ok(None)
        }
    }
}

/// Returns false when the file could not be applied in full; settings it
/// did not set fall back to their defaults.
fn apply_env_file(path: &Path) -> bool {
    match dotenv::from_path(path) {
        Ok(()) => {
            tracing::debug!("Loaded settings from {}", path.display());
            true
        }
        Err(e) => {
            tracing::warn!("Failed to load {}, using defaults: {}", path.display(), e);
            false
        }
    }
}

pub fn write_template(path: &Path) -> Result<()> {
    let mut env_writer = BufWriter::new(File::create(path)?);
    for (key, value) in DEFAULTS {
        writeln!(env_writer, "{}={}", key, value)?;
    }
    env_writer.flush()?;

    Ok(())
}
