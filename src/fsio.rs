//! Filesystem boundary.
//!
//! The engine only touches the disk through the [`FileSystem`] trait: listing
//! a directory's immediate regular files, existence checks, renames, and
//! directory creation. Production code uses [`OsFileSystem`]; tests inject
//! failing or gated implementations to exercise the engine's failure paths.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The filesystem operations the organize/undo engine relies on.
pub trait FileSystem {
    /// Lists the immediate regular-file entries of `dir` (non-recursive,
    /// subdirectories omitted). Order is unspecified; callers sort.
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Returns true if `path` currently exists.
    fn exists(&self, path: &Path) -> bool;

    /// Moves `from` to `to` via rename. Must either fully succeed or fail
    /// cleanly; there is no copy fallback, so a cross-device move errors.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Creates `path` and any missing parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        Ok(files)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }
}
