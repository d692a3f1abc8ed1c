//! Disk space reservation for files.
//!
//! A reservation is either fully backed (`fallocate`, the blocks exist and
//! read as zeros) or sparse (`ftruncate`, only the logical size is set and
//! later writes may still run out of space).

use std::os::fd::AsFd;
use std::path::{Path, PathBuf};

use hostfs_common::{HostFsError, HostFsResult};
use rustix::fs::{Mode, OFlags};
use rustix::io::Errno;

use crate::sys;

/// Default permission bits for newly created files.
pub const DEFAULT_MODE: u32 = 0o644;

const MAX_MODE: u32 = 0o7777;

/// A request to create a file and reserve `size` bytes for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAllocation {
    path: PathBuf,
    size: u64,
    mode: u32,
    exclusive: bool,
}

impl FileAllocation {
    /// Sparse reservation of `size` bytes with [`DEFAULT_MODE`].
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
            mode: DEFAULT_MODE,
            exclusive: false,
        }
    }

    /// Permission bits used if the file has to be created.
    #[must_use]
    pub const fn mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    /// Require fully backed blocks instead of a sparse size.
    #[must_use]
    pub const fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    /// Path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Requested size in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Create the file if needed and set its size to exactly `size`.
    ///
    /// Calling this again with the same size is a no-op; a different size
    /// grows or truncates the file.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a size past the maximum file offset, mode bits
    ///   outside `0o7777`, or a path that is a directory
    /// - `InsufficientSpace` if an exclusive reservation cannot be backed
    /// - `Unsupported` if the filesystem cannot guarantee allocation; retry
    ///   with `exclusive(false)`
    /// - `PermissionDenied` if the file cannot be created or written
    ///
    /// A failed reservation is not rolled back: the file may have been
    /// created, or already truncated to a smaller `size`, before the error.
    pub fn allocate(&self) -> HostFsResult<()> {
        let path = self.path.as_path();
        if i64::try_from(self.size).is_err() {
            return Err(HostFsError::invalid_argument(format!(
                "size {} exceeds the maximum file offset",
                self.size
            )));
        }
        if self.mode & !MAX_MODE != 0 {
            return Err(HostFsError::invalid_argument(format!(
                "mode {:#o} has bits outside {MAX_MODE:#o}",
                self.mode
            )));
        }

        tracing::debug!(
            path = %path.display(),
            size = self.size,
            mode = %format!("{:#o}", self.mode),
            exclusive = self.exclusive,
            "Reserving file space"
        );

        let fd = rustix::fs::open(
            path,
            OFlags::WRONLY | OFlags::CREATE | OFlags::CLOEXEC,
            Mode::from_raw_mode(self.mode),
        )
        .map_err(|e| sys::translate(e, "open", path))?;

        if self.exclusive {
            self.reserve(&fd)
        } else {
            rustix::fs::ftruncate(&fd, self.size).map_err(|e| self.translate(e, "ftruncate"))
        }
    }

    fn reserve(&self, fd: impl AsFd) -> HostFsResult<()> {
        let current = rustix::fs::fstat(&fd)
            .map_err(|e| sys::translate(e, "fstat", &self.path))?
            .st_size;

        // fallocate never shrinks a file.
        if u64::try_from(current).is_ok_and(|len| len > self.size) {
            rustix::fs::ftruncate(&fd, self.size).map_err(|e| self.translate(e, "ftruncate"))?;
        }
        if self.size == 0 {
            return Ok(());
        }
        fallocate(&fd, self.size).map_err(|e| self.translate(e, "fallocate"))
    }

    fn translate(&self, errno: Errno, operation: &str) -> HostFsError {
        match errno {
            Errno::NOSPC | Errno::DQUOT => HostFsError::InsufficientSpace {
                path: self.path.clone(),
                requested: self.size,
            },
            _ => sys::translate(errno, operation, &self.path),
        }
    }
}

#[cfg(target_os = "linux")]
fn fallocate(fd: impl AsFd, len: u64) -> rustix::io::Result<()> {
    rustix::fs::fallocate(fd, rustix::fs::FallocateFlags::empty(), 0, len)
}

#[cfg(not(target_os = "linux"))]
fn fallocate(_fd: impl AsFd, _len: u64) -> rustix::io::Result<()> {
    Err(Errno::NOSYS)
}

/// Create `path` with `mode` and reserve `size` bytes.
///
/// With `exclusive` the blocks are fully backed; otherwise the file is sized
/// sparsely. See [`FileAllocation::allocate`].
///
/// # Errors
///
/// See [`FileAllocation::allocate`].
pub fn allocate(path: impl AsRef<Path>, size: u64, mode: u32, exclusive: bool) -> HostFsResult<()> {
    FileAllocation::new(path.as_ref(), size)
        .mode(mode)
        .exclusive(exclusive)
        .allocate()
}
