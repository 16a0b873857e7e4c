use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tc_core::{Error, Result};
use tempfile::NamedTempFile;
use tracing::debug;

/// Writes `contents` to `path` through a sibling temporary file and a rename.
///
/// Readers of `path` see either the previous file or the complete new one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = parent_dir(path);
    fs::create_dir_all(&dir).map_err(|e| Error::write(&dir, e))?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| Error::write(path, e))?;
    debug!(tmp = %tmp.path().display(), target = %path.display(), "Writing feed to temporary file");

    tmp.write_all(contents).map_err(|e| Error::write(path, e))?;
    tmp.flush().map_err(|e| Error::write(path, e))?;
    tmp.as_file().sync_all().map_err(|e| Error::write(path, e))?;

    // Temporary files are created 0600; a published feed must be world-readable.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(|e| Error::write(path, e))?;
    }

    tmp.persist(path).map_err(|e| Error::write(path, e.error))?;
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
