//! Storage backends for vault files.
//!
//! Every component that touches persisted state goes through the
//! `Storage` trait, so a vault can live on disk (`FsStorage`) or in a
//! process-local map (`MemoryStorage`) used by tests and fixtures.

mod fs;
mod memory;

use std::path::Path;

use crate::errors::Result;

pub use fs::FsStorage;
pub use memory::MemoryStorage;

/// Minimal filesystem abstraction used by the vault core.
pub trait Storage {
    /// Read a whole file.  A missing file is `StrongboxError::NotFound`.
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Replace the contents of a file.  The parent directory must exist.
    fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Returns `true` if a file or directory exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Create a directory and all of its parents.  Idempotent.
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Remove a file.  A missing file is `StrongboxError::NotFound`.
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Names of the regular files directly inside `dir`, sorted.
    /// A missing directory lists as empty.
    fn list_dir(&self, dir: &Path) -> Result<Vec<String>>;

    /// Copy a file, replacing the destination if it exists.
    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        let data = self.read(from)?;
        self.write(to, &data)
    }
}

impl<S: Storage + ?Sized> Storage for &S {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        (**self).read(path)
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        (**self).write(path, data)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        (**self).create_dir_all(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        (**self).remove_file(path)
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<String>> {
        (**self).list_dir(dir)
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        (**self).copy(from, to)
    }
}
