use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

/// One regular file found directly inside a probed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub readable: bool,
    pub writable: bool,
}

/// Filesystem access used by the cleanup targets.
///
/// Listing is non-recursive: only the immediate children of a directory are
/// ever measured or deleted.
pub trait FileSystem: Send + Sync {
    /// Regular files directly inside `dir`. Errors when `dir` cannot be read.
    fn list_immediate_files(&self, dir: &Path) -> io::Result<Vec<FileEntry>>;

    /// Subdirectories directly inside `dir`.
    fn list_immediate_dirs(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Delete a single file. Returns false when the file could not be removed.
    fn delete_file(&self, path: &Path) -> bool;
}

/// The real filesystem.
pub struct LocalFs;

fn ensure_dir(dir: &Path) -> io::Result<()> {
    let meta = fs::metadata(dir)?;
    if meta.is_dir() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", dir.display()),
        ))
    }
}

fn children(dir: &Path) -> impl Iterator<Item = walkdir::DirEntry> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
}

impl FileSystem for LocalFs {
    fn list_immediate_files(&self, dir: &Path) -> io::Result<Vec<FileEntry>> {
        ensure_dir(dir)?;
        // Probe readability up front so an unreadable directory is an error
        // rather than an empty listing.
        fs::read_dir(dir)?;

        let entries = children(dir)
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let meta = e.metadata().ok()?;
                let path = e.path().to_path_buf();
                Some(FileEntry {
                    name: e.file_name().to_string_lossy().into_owned(),
                    readable: fs::File::open(&path).is_ok(),
                    writable: !meta.permissions().readonly(),
                    size_bytes: meta.len(),
                    path,
                })
            })
            .collect();
        Ok(entries)
    }

    fn list_immediate_dirs(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        ensure_dir(dir)?;
        fs::read_dir(dir)?;

        Ok(children(dir)
            .filter(|e| e.file_type().is_dir())
            .map(|e| e.path().to_path_buf())
            .collect())
    }

    fn delete_file(&self, path: &Path) -> bool {
        match fs::remove_file(path) {
            Ok(()) => true,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "delete failed");
                false
            }
        }
    }
}
