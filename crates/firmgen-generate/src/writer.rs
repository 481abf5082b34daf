//! Atomic output writes.

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::{GenerateError, Result};

/// What a write did to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteStatus {
    Created,
    Updated,
    /// The target already held exactly these bytes; nothing was written.
    Unchanged,
}

/// Write `contents` to `path` through a temporary file in the same directory.
///
/// The target is either left untouched or replaced whole. The temporary
/// file is removed on every error path.
pub fn write_atomic(path: &Path, contents: &str) -> Result<WriteStatus> {
    let write_err = |source| GenerateError::Write {
        path: path.to_path_buf(),
        source,
    };

    let existed = path.exists();
    if existed {
        let current = std::fs::read(path).map_err(|source| GenerateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if current == contents.as_bytes() {
            return Ok(WriteStatus::Unchanged);
        }
    }

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(if existed {
        WriteStatus::Updated
    } else {
        WriteStatus::Created
    })
}
