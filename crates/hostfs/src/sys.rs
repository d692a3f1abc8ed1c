//! Translation of OS error codes into [`HostFsError`].

use std::path::Path;

use hostfs_common::HostFsError;
use rustix::io::Errno;

/// Translate an errno returned by `operation` on `path`.
///
/// Codes whose meaning depends on the operation (`EINVAL` from unmount,
/// `ENOSPC` from reservation) must be handled by the caller first.
pub(crate) fn translate(errno: Errno, operation: &str, path: &Path) -> HostFsError {
    match errno {
        Errno::NOENT => HostFsError::not_found(path),
        Errno::ACCESS | Errno::PERM => HostFsError::PermissionDenied {
            operation: operation.to_string(),
            path: path.to_path_buf(),
        },
        Errno::BUSY => HostFsError::Busy {
            path: path.to_path_buf(),
        },
        Errno::OPNOTSUPP | Errno::NOSYS => HostFsError::unsupported(operation),
        Errno::NOTDIR | Errno::ISDIR | Errno::INVAL => HostFsError::invalid_argument(format!(
            "{operation} {}: {}",
            path.display(),
            std::io::Error::from(errno)
        )),
        _ => HostFsError::Io {
            operation: operation.to_string(),
            path: path.to_path_buf(),
            source: errno.into(),
        },
    }
}

/// Translate a `std::io::Error` raised by `operation` on `path`.
pub(crate) fn translate_io(err: std::io::Error, operation: &str, path: &Path) -> HostFsError {
    match Errno::from_io_error(&err) {
        Some(errno) => translate(errno, operation, path),
        None => HostFsError::Io {
            operation: operation.to_string(),
            path: path.to_path_buf(),
            source: err,
        },
    }
}
