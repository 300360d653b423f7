//! Asset discovery: the directory is scanned once, before the release is
//! created, and the resulting list is the snapshot the batch uploads.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use crate::error::ReleaseError;

pub const DEFAULT_ASSET_DIR: &str = "build";
pub const DEFAULT_PATTERN: &str = "*";

/// Regular files in `dir` matching `pattern`, in glob (lexical) order.
/// Directories and other non-files that match are skipped.
pub fn discover_assets(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, ReleaseError> {
    if !dir.is_dir() {
        return Err(ReleaseError::AssetDirNotFound {
            path: dir.to_path_buf(),
        });
    }

    check_confined(pattern)?;

    let escaped_dir = glob::Pattern::escape(&dir.to_string_lossy());
    let full_pattern = Path::new(&escaped_dir).join(pattern);
    let full_pattern = full_pattern.to_string_lossy();

    let entries = glob::glob(&full_pattern).map_err(|source| ReleaseError::BadPattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            ReleaseError::AssetRead {
                path,
                source: e.into(),
            }
        })?;
        if path.is_file() {
            files.push(path);
        } else {
            debug!(path = %path.display(), "[DISCOVER] Skipping non-file match");
        }
    }

    info!(
        dir = %dir.display(),
        pattern,
        count = files.len(),
        "[DISCOVER] Discovered assets"
    );
    Ok(files)
}

/// Patterns are relative to the asset directory and may not leave it.
fn check_confined(pattern: &str) -> Result<(), ReleaseError> {
    let pattern_path = Path::new(pattern);
    let msg = if pattern_path.has_root() || pattern_path.is_absolute() {
        "pattern must be relative to the asset directory"
    } else if pattern_path.components().any(|c| c == Component::ParentDir) {
        "pattern must not contain `..`"
    } else {
        return Ok(());
    };
    Err(ReleaseError::BadPattern {
        pattern: pattern.to_string(),
        source: glob::PatternError { pos: 0, msg },
    })
}
