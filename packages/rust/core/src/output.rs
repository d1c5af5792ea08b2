//! Writing rendered bundles to disk.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use prompttree_shared::{PromptTreeError, Result};

/// Metadata for a written bundle file.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OutputMeta {
    pub path: PathBuf,
    pub sha256: String,
    pub size_bytes: usize,
}

/// Write `content` to `path` atomically (temp file, then rename).
///
/// Parent directories are created as needed. Any failure is returned with
/// the offending path.
#[instrument(skip(content), fields(path = %path.display(), bytes = content.len()))]
pub fn write_output(path: &Path, content: &str) -> Result<OutputMeta> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            PromptTreeError::config(format!("output path '{}' has no file name", path.display()))
        })?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(|e| PromptTreeError::io(&parent, e))?;

    let temp = parent.join(format!(".{file_name}.tmp"));

    // Write to temp file first
    std::fs::write(&temp, content).map_err(|e| PromptTreeError::io(&temp, e))?;

    // Atomic rename
    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(PromptTreeError::io(path, e));
    }

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let sha256 = format!("{:x}", hasher.finalize());

    debug!(sha256 = %sha256, "checksum computed");
    info!(path = %path.display(), size = content.len(), "wrote bundle");

    Ok(OutputMeta {
        path: path.to_path_buf(),
        sha256,
        size_bytes: content.len(),
    })
}
