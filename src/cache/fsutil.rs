//! Atomic file replacement for chunk files and manifests

use crate::error::{CacheError, CacheResult};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Infix of in-flight temp files, `{name}.tmp.{pid}.{n}`
const TMP_INFIX: &str = ".tmp.";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Replace `path` with `bytes` via a temp file and rename.
///
/// Readers see either the old file or the complete new one. The parent
/// directory is fsynced afterwards only when `sync_parent` is set; bulk
/// writers defer that to one sync at the end.
pub fn atomic_write(path: &Path, bytes: &[u8], sync_parent: bool) -> CacheResult<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let (tmp_path, mut file) = open_unique_tmp_file(path, parent)
        .map_err(|e| CacheError::io(format!("creating temp file for {}", path.display()), e))?;

    let written = file.write_all(bytes).and_then(|()| file.sync_all());
    drop(file);
    if let Err(err) = written {
        remove_best_effort(&tmp_path);
        return Err(CacheError::io(format!("writing {}", path.display()), err));
    }

    if let Err(err) = fs::rename(&tmp_path, path) {
        remove_best_effort(&tmp_path);
        return Err(CacheError::io(format!("renaming into {}", path.display()), err));
    }

    if sync_parent {
        sync_dir_best_effort(parent);
    }
    Ok(())
}

/// Remove a file, treating "already gone" as success
pub fn remove_if_exists(path: &Path) -> CacheResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CacheError::io(format!("removing {}", path.display()), e)),
    }
}

/// Flush directory metadata so renames survive a crash
pub fn sync_dir_best_effort(dir: &Path) {
    #[cfg(unix)]
    {
        if let Err(err) = fs::File::open(dir).and_then(|d| d.sync_all()) {
            debug!("Failed to sync directory {}: {}", dir.display(), err);
        }
    }

    #[cfg(not(unix))]
    let _ = dir;
}

fn remove_best_effort(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != io::ErrorKind::NotFound {
            debug!("Failed to remove temp file {}: {}", path.display(), err);
        }
    }
}

fn open_unique_tmp_file(dest: &Path, parent: &Path) -> io::Result<(PathBuf, fs::File)> {
    let file_name = dest
        .file_name()
        .ok_or_else(|| io::Error::other("destination path has no file name"))?;
    let pid = std::process::id();

    loop {
        let counter = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut tmp_name = file_name.to_os_string();
        tmp_name.push(format!("{TMP_INFIX}{pid}.{counter}"));
        let tmp_path = parent.join(tmp_name);

        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
        {
            Ok(file) => return Ok((tmp_path, file)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }
}
