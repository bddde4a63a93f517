//! # File I/O Module
//!
//! Atomic report writes: output goes to a temporary sibling file which is
//! synced and then renamed over the target, so a failed run never leaves a
//! half-written report behind.
//!
//! ## Example
//!
//! ```rust,no_run
//! use plate_core::file_io::write_atomic;
//! use std::path::Path;
//!
//! write_atomic(Path::new("selection.json"), b"{}")?;
//! # Ok::<(), plate_core::errors::PlateError>(())
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::{PlateError, PlateResult};

/// Temporary sibling of `path`, keeping the extension so writers that pick a
/// format from it still work (`report.xlsx` -> `report.tmp.xlsx`)
pub fn tmp_path_for(path: &Path) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.tmp.{}", stem, ext),
        None => format!("{}.tmp", stem),
    };
    path.with_file_name(name)
}

/// Write `bytes` to `path` atomically
pub fn write_atomic(path: &Path, bytes: &[u8]) -> PlateResult<()> {
    write_atomic_with(path, |tmp_path| {
        let mut tmp_file = File::create(tmp_path).map_err(|e| {
            PlateError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
        })?;

        tmp_file.write_all(bytes).map_err(|e| {
            PlateError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
        })?;

        tmp_file.sync_all().map_err(|e| {
            PlateError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
        })
    })
}

/// Let `write` produce the temporary file, then rename it over `path`.
///
/// The temporary file is removed if either step fails.
pub fn write_atomic_with<F>(path: &Path, write: F) -> PlateResult<()>
where
    F: FnOnce(&Path) -> PlateResult<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            return Err(PlateError::file_error(
                "write",
                path.display().to_string(),
                "output directory does not exist",
            ));
        }
    }

    let tmp_path = tmp_path_for(path);

    if let Err(e) = write(&tmp_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        PlateError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    tracing::debug!(path = %path.display(), "wrote file");
    Ok(())
}
