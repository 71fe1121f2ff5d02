use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Writes `items` as a pretty-printed JSON array, replacing whatever was at
/// `path`. The content lands in a sibling `.tmp` file first and is renamed into
/// place, so readers see either the old file or the complete new one.
pub fn write_json<T: Serialize>(path: &Path, items: &[T]) -> Result<(), WriteError> {
    let json = serde_json::to_string_pretty(items)?;
    let io_err = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;

    log::info!("Wrote {} entries to {}", items.len(), path.display());
    Ok(())
}

/// Best-effort `[]` to every path. Returns how many writes succeeded.
pub fn write_empty(paths: &[&Path]) -> usize {
    paths
        .iter()
        .filter(|path| match write_json::<serde_json::Value>(path, &[]) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Fallback write failed: {e}");
                false
            }
        })
        .count()
}
