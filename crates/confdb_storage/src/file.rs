//! The database file.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use parking_lot::RwLock;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A single database file.
///
/// Opening the file takes an exclusive advisory lock (`fs2`), so two
/// processes can never append interleaved journal frames to the same
/// database. The lock is released when the backend is dropped.
///
/// [`FileBackend::open_read_only`] takes a shared lock instead and refuses
/// every write, so inspection tools can read a database without changing
/// it.
///
/// `flush()` pushes to the OS, `sync()` calls `File::sync_all()`.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    file: RwLock<File>,
    size: RwLock<u64>,
    read_only: bool,
}

impl FileBackend {
    /// Opens or creates the database file at `path` and locks it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Locked`] if another handle holds the lock,
    /// or an I/O error if the file cannot be opened.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        if file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked {
                path: path.display().to_string(),
            });
        }

        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file: RwLock::new(file),
            size: RwLock::new(size),
            read_only: false,
        })
    }

    /// Opens an existing file for reading under a shared lock.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Locked`] if a writer holds the file, or an
    /// I/O error if it does not exist.
    pub fn open_read_only(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new().read(true).open(path)?;

        if file.try_lock_shared().is_err() {
            return Err(StorageError::Locked {
                path: path.display().to_string(),
            });
        }

        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file: RwLock::new(file),
            size: RwLock::new(size),
            read_only: true,
        })
    }

    /// Like [`FileBackend::open`], creating missing parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file
    /// cannot be opened and locked.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether writes are refused.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Moves the file to `path`, replacing whatever is there.
    ///
    /// The lock travels with the open file, so the handle keeps exclusive
    /// access under its new name.
    pub fn persist_as(&mut self, path: &Path) -> StorageResult<()> {
        self.check_writable()?;
        std::fs::rename(&self.path, path)?;
        self.path = path.to_path_buf();
        Ok(())
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.read_only {
            return Err(StorageError::ReadOnly {
                path: self.path.display().to_string(),
            });
        }
        Ok(())
    }
}

impl Drop for FileBackend {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&*self.file.read());
    }
}

impl StorageBackend for FileBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let size = *self.size.read();
        let end = offset.saturating_add(len as u64);

        if offset > size || end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        if len == 0 {
            return Ok(Vec::new());
        }

        let mut file = self.file.write();
        file.seek(SeekFrom::Start(offset))?;

        let mut buffer = vec![0u8; len];
        file.read_exact(&mut buffer)?;

        Ok(buffer)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        self.check_writable()?;
        let mut size = self.size.write();
        let offset = *size;

        if data.is_empty() {
            return Ok(offset);
        }

        let mut file = self.file.write();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        *size += data.len() as u64;

        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        if self.read_only {
            return Ok(());
        }
        self.file.write().flush()?;
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(*self.size.read())
    }

    fn sync(&mut self) -> StorageResult<()> {
        if self.read_only {
            return Ok(());
        }
        self.file.write().sync_all()?;
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        self.check_writable()?;
        let file = self.file.write();
        let mut size = self.size.write();

        if new_size > *size {
            return Err(StorageError::TruncatePastEnd {
                requested: new_size,
                size: *size,
            });
        }

        file.set_len(new_size)?;
        file.sync_all()?;
        *size = new_size;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf.db");

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 0);
        assert!(path.exists());
        assert_eq!(backend.path(), path);
    }

    #[test]
    fn appends_are_contiguous() {
        let dir = tempdir().unwrap();
        let mut backend = FileBackend::open(&dir.path().join("conf.db")).unwrap();

        assert_eq!(backend.append(b"head").unwrap(), 0);
        assert_eq!(backend.append(b"tail").unwrap(), 4);
        assert_eq!(backend.read_all().unwrap(), b"headtail");
        assert_eq!(backend.read_at(4, 4).unwrap(), b"tail");
    }

    #[test]
    fn read_past_end_fails() {
        let dir = tempdir().unwrap();
        let mut backend = FileBackend::open(&dir.path().join("conf.db")).unwrap();
        backend.append(b"abc").unwrap();

        let result = backend.read_at(2, 5);
        assert!(matches!(result, Err(StorageError::ReadPastEnd { .. })));
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf.db");

        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.append(b"durable").unwrap();
            backend.sync().unwrap();
        }

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.read_all().unwrap(), b"durable");
    }

    #[test]
    fn second_open_is_locked_out() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf.db");

        let _first = FileBackend::open(&path).unwrap();
        let second = FileBackend::open(&path);
        assert!(matches!(second, Err(StorageError::Locked { .. })));
    }

    #[test]
    fn truncate_then_append_overwrites_tail() {
        let dir = tempdir().unwrap();
        let mut backend = FileBackend::open(&dir.path().join("conf.db")).unwrap();
        backend.append(b"keep-drop").unwrap();

        backend.truncate(4).unwrap();
        backend.append(b"!").unwrap();
        assert_eq!(backend.read_all().unwrap(), b"keep!");

        let result = backend.truncate(100);
        assert!(matches!(result, Err(StorageError::TruncatePastEnd { .. })));
    }

    #[test]
    fn read_only_handle_refuses_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf.db");
        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.append(b"frame").unwrap();
        }

        let mut reader = FileBackend::open_read_only(&path).unwrap();
        assert!(reader.is_read_only());
        assert_eq!(reader.read_all().unwrap(), b"frame");
        assert!(matches!(reader.append(b"x"), Err(StorageError::ReadOnly { .. })));
        assert!(matches!(reader.truncate(0), Err(StorageError::ReadOnly { .. })));
        assert_eq!(std::fs::read(&path).unwrap(), b"frame");

        // Readers share; a writer is locked out while one is open.
        let _second = FileBackend::open_read_only(&path).unwrap();
        assert!(matches!(FileBackend::open(&path), Err(StorageError::Locked { .. })));
    }

    #[test]
    fn read_only_open_of_missing_file_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.db");
        assert!(FileBackend::open_read_only(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn persist_as_replaces_target() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("conf.db");
        let temp = dir.path().join("conf.compact");
        std::fs::write(&target, b"old journal").unwrap();

        let mut backend = FileBackend::open(&temp).unwrap();
        backend.append(b"new").unwrap();
        backend.persist_as(&target).unwrap();

        assert_eq!(backend.path(), target);
        assert!(!temp.exists());
        assert_eq!(std::fs::read(&target).unwrap(), b"new");
        backend.append(b"!").unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"new!");
    }

    #[test]
    fn nested_dirs_are_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("conf.db");

        let backend = FileBackend::open_with_create_dirs(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 0);
    }
}
