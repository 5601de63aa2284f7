//! Atomic JSON file operations with ACID guarantees.
//!
//! Provides a thin layer for safe concurrent access to the JSON state file.

use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use repomove_core::RepoMoveError;

/// Errors that can occur during atomic JSON operations.
#[derive(Debug)]
pub enum AtomicJsonError {
    /// File I/O error.
    IoError(std::io::Error),
    /// JSON serialization/deserialization error.
    JsonError(serde_json::Error),
    /// File locking error.
    LockError(String),
    /// The file changed underneath a locked update.
    RevisionConflict { expected: u64, found: u64 },
    /// The update function rejected the change.
    Rejected(RepoMoveError),
}

impl std::fmt::Display for AtomicJsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtomicJsonError::IoError(e) => write!(f, "I/O error: {}", e),
            AtomicJsonError::JsonError(e) => write!(f, "JSON error: {}", e),
            AtomicJsonError::LockError(e) => write!(f, "Lock error: {}", e),
            AtomicJsonError::RevisionConflict { expected, found } => write!(
                f,
                "revision changed during update (expected {}, found {})",
                expected, found
            ),
            AtomicJsonError::Rejected(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AtomicJsonError {}

impl From<std::io::Error> for AtomicJsonError {
    fn from(e: std::io::Error) -> Self {
        AtomicJsonError::IoError(e)
    }
}

impl From<serde_json::Error> for AtomicJsonError {
    fn from(e: serde_json::Error) -> Self {
        AtomicJsonError::JsonError(e)
    }
}

impl From<AtomicJsonError> for RepoMoveError {
    fn from(e: AtomicJsonError) -> Self {
        match e {
            AtomicJsonError::IoError(e) => e.into(),
            AtomicJsonError::JsonError(e) => e.into(),
            AtomicJsonError::LockError(msg) => RepoMoveError::io(msg),
            conflict @ AtomicJsonError::RevisionConflict { .. } => {
                RepoMoveError::conflict(conflict.to_string())
            }
            AtomicJsonError::Rejected(e) => e,
        }
    }
}

/// Documents that carry a write counter.
pub trait Revisioned {
    fn revision(&self) -> u64;
    fn set_revision(&mut self, revision: u64);
}

/// A handle to an atomic JSON file with ACID guarantees.
///
/// Provides:
/// - **Atomicity**: Updates are all-or-nothing via tmp file + atomic rename
/// - **Consistency**: Schema validation on load/save
/// - **Isolation**: File locking prevents concurrent modifications, and the
///   revision is re-read before commit to catch writers that skip the lock
/// - **Durability**: Explicit fsync before rename
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned + Revisioned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub fn load(&self) -> Result<Option<T>, AtomicJsonError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let data: T = serde_json::from_str(&content)?;
        Ok(Some(data))
    }

    /// Saves data to the file atomically.
    pub fn save(&self, data: &T) -> Result<(), AtomicJsonError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(data)?;

        // Write to temporary file in the same directory
        let tmp_path = self.get_temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(json.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    /// Performs a transactional update with file locking.
    ///
    /// The update function receives the current document (or `default_value`
    /// when the file is missing). If it returns `Ok`, the revision is bumped
    /// and the document is atomically written back.
    pub fn update<R, F>(&self, default_value: T, f: F) -> Result<R, AtomicJsonError>
    where
        F: FnOnce(&mut T) -> Result<R, RepoMoveError>,
    {
        let _lock = self.acquire_lock()?;

        let mut data = self.load()?.unwrap_or(default_value);
        let expected = data.revision();

        let result = f(&mut data).map_err(AtomicJsonError::Rejected)?;

        let found = self.load()?.map(|d| d.revision()).unwrap_or(expected);
        if found != expected {
            return Err(AtomicJsonError::RevisionConflict { expected, found });
        }

        data.set_revision(expected + 1);
        self.save(&data)?;

        Ok(result)
    }

    /// Reads the document under the lock without writing.
    pub fn read(&self) -> Result<Option<T>, AtomicJsonError> {
        let _lock = self.acquire_lock()?;
        self.load()
    }

    fn get_temp_path(&self) -> Result<PathBuf, AtomicJsonError> {
        let parent = self.path.parent().ok_or_else(|| {
            AtomicJsonError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no parent directory",
            ))
        })?;

        let file_name = self.path.file_name().ok_or_else(|| {
            AtomicJsonError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no file name",
            ))
        })?;

        let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
        Ok(parent.join(tmp_name))
    }

    fn acquire_lock(&self) -> Result<FileLock, AtomicJsonError> {
        FileLock::acquire(&self.path)
    }
}

/// A file lock guard that releases the lock when dropped.
///
/// The lock file itself is left in place so every writer locks the same inode.
struct FileLock {
    #[allow(dead_code)]
    file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, AtomicJsonError> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        use fs2::FileExt;
        file.lock_exclusive()
            .map_err(|e| AtomicJsonError::LockError(format!("Failed to acquire lock: {}", e)))?;

        Ok(FileLock { file })
    }
}
