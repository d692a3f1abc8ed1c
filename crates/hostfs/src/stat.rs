//! Filesystem capacity statistics.

use std::path::Path;

use hostfs_common::HostFsResult;
use serde::{Deserialize, Serialize};

use crate::sys;

/// Capacity of the filesystem holding a path, in bytes.
///
/// `available <= free <= total` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityStats {
    /// Total size of the filesystem.
    pub total: u64,
    /// Free space, including blocks reserved for privileged users.
    pub free: u64,
    /// Free space usable by unprivileged callers.
    pub available: u64,
    /// Unit the block counts were reported in.
    pub block_size: u64,
    /// Total inodes.
    pub files: u64,
    /// Free inodes.
    pub files_free: u64,
}

impl CapacityStats {
    /// Bytes in use (`total - free`).
    #[must_use]
    pub const fn used(&self) -> u64 {
        self.total.saturating_sub(self.free)
    }

    fn from_blocks(vfs: &rustix::fs::StatVfs) -> Self {
        // f_frsize is the unit of the block counts; some filesystems leave it zero.
        let block_size = if vfs.f_frsize == 0 {
            vfs.f_bsize
        } else {
            vfs.f_frsize
        };

        let total = vfs.f_blocks.saturating_mul(block_size);
        let free = vfs.f_bfree.saturating_mul(block_size).min(total);
        let available = vfs.f_bavail.saturating_mul(block_size).min(free);

        Self {
            total,
            free,
            available,
            block_size,
            files: vfs.f_files,
            files_free: vfs.f_ffree,
        }
    }
}

/// Query the capacity of the filesystem containing `path`.
///
/// `path` does not need to be a mount root.
///
/// # Errors
///
/// Returns `NotFound` if `path` does not exist, `PermissionDenied` if it
/// cannot be statted, and `Unsupported` if the OS lacks the call.
pub fn fs_stat(path: impl AsRef<Path>) -> HostFsResult<CapacityStats> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "Querying filesystem capacity");

    let vfs = rustix::fs::statvfs(path).map_err(|e| sys::translate(e, "statvfs", path))?;
    Ok(CapacityStats::from_blocks(&vfs))
}
