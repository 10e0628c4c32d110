//! The C runtime that defines the stdlib entry points.
//!
//! The sources are embedded in the driver and written next to the build
//! output before linking, so `stc build` works without an `stc.toml`.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Bundled runtime sources as `(file name, contents)`.
pub const SOURCES: &[(&str, &str)] = &[("console.c", include_str!("../runtime/console.c"))];

/// Write the bundled sources into `dir` and return their paths.
pub fn write_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(Error::io(dir))?;
    SOURCES
        .iter()
        .map(|(name, contents)| {
            let path = dir.join(name);
            std::fs::write(&path, contents).map_err(Error::io(&path))?;
            debug!(path = %path.display(), "wrote runtime source");
            Ok(path)
        })
        .collect()
}
